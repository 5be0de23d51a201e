//! Public interface for loading and running Rinha programs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    env::Environments,
    errors::{LoadError, RunResult},
    eval::evaluate,
    io::{PrintWriter, StdPrint},
    parse::parse_file,
    resource::{NoLimitTracker, ResourceTracker},
    terms::File,
    tracer::{EvalTracer, NoopTracer},
    value::Object,
};

/// A loaded program, ready to run any number of times.
///
/// Loading and running are separate so hosts can parse a document once and
/// evaluate it repeatedly, and so a loaded program can be cached in binary
/// form via [`Self::dump`]/[`Self::load`].
///
/// # Example
/// ```
/// use rinha::{CollectStringPrint, NoLimitTracker, NoopTracer, Object, Program};
///
/// let document = r#"{
///     "name": "add.rinha",
///     "expression": {
///         "kind": "Binary",
///         "lhs": {"kind": "Int", "value": 1, "location": {"start": 0, "end": 1, "filename": "add.rinha"}},
///         "op": "Add",
///         "rhs": {"kind": "Int", "value": 2, "location": {"start": 4, "end": 5, "filename": "add.rinha"}},
///         "location": {"start": 0, "end": 5, "filename": "add.rinha"}
///     },
///     "location": {"start": 0, "end": 5, "filename": "add.rinha"}
/// }"#;
/// let program = Program::load_str(document).unwrap();
/// let mut print = CollectStringPrint::new();
/// let result = program.run(NoLimitTracker, NoopTracer, &mut print).unwrap();
/// assert_eq!(result, Object::Int(3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    file: File,
}

impl Program {
    /// Loads a program from JSON document text.
    ///
    /// # Errors
    /// Returns [`LoadError`] if the text is not valid JSON or the document
    /// does not describe a well-formed AST.
    pub fn load_str(document: &str) -> Result<Self, LoadError> {
        let document: serde_json::Value =
            serde_json::from_str(document).map_err(|err| LoadError::Document(err.to_string()))?;
        Self::load_document(&document)
    }

    /// Loads a program from an already-deserialized JSON document.
    ///
    /// # Errors
    /// Returns [`LoadError`] if the document does not describe a well-formed
    /// AST.
    pub fn load_document(document: &serde_json::Value) -> Result<Self, LoadError> {
        parse_file(document).map(|file| Self { file })
    }

    /// Wraps an already-built AST.
    #[must_use]
    pub fn from_file(file: File) -> Self {
        Self { file }
    }

    /// The loaded AST.
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// The program's source name from the document root.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.file.name
    }

    /// Evaluates the program in a fresh global environment.
    ///
    /// Fresh environments are created per run and released when it returns;
    /// repeated runs of the same program are independent.
    ///
    /// # Arguments
    /// * `tracker` - Resource limits ([`NoLimitTracker`] for none)
    /// * `tracer` - Execution tracing ([`NoopTracer`](crate::NoopTracer) for none)
    /// * `print` - Sink for `print` output
    pub fn run(
        &self,
        mut tracker: impl ResourceTracker,
        mut tracer: impl EvalTracer,
        print: &mut impl PrintWriter,
    ) -> RunResult<Object> {
        let mut envs = Environments::with_global();
        let global = envs.global();
        evaluate(&mut envs, global, &self.file.expression, &mut tracker, &mut tracer, print)
            .map(crate::value::Value::into_object)
    }

    /// Evaluates the program with no resource limits, no tracing, and
    /// `print` output going to stdout.
    pub fn run_no_limits(&self) -> RunResult<Object> {
        let mut print = StdPrint;
        self.run(NoLimitTracker, NoopTracer, &mut print)
    }

    /// Serializes the loaded program to a compact binary format.
    ///
    /// The bytes can be stored and later restored with [`Self::load`],
    /// allowing hosts to cache loaded ASTs and skip the JSON document on
    /// subsequent runs.
    pub fn dump(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Restores a program serialized with [`Self::dump`].
    pub fn load(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

impl fmt::Display for Program {
    /// The pretty-printed rendering of the root expression.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.file.fmt(f)
    }
}
