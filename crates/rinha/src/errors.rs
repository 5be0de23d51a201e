use std::{fmt, rc::Rc};

use crate::{resource::ResourceError, terms::Location};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Failure while structuring an AST document, before any evaluation begins.
///
/// All variants are fatal: a document that does not load is never partially
/// evaluated. The offending node's location is attached when enough of the
/// node had been read to know it.
#[derive(Debug, Clone)]
pub enum LoadError {
    /// The document text is not valid JSON at all.
    Document(String),
    /// A `kind` discriminator named none of the term variants.
    UnknownKind {
        kind: String,
        location: Option<Location>,
    },
    /// A `Binary` node's `op` named none of the operators.
    UnknownOperator {
        name: String,
        location: Option<Location>,
    },
    /// A required field was absent.
    MissingField {
        field: &'static str,
        context: &'static str,
        location: Option<Location>,
    },
    /// A field held a value of the wrong shape.
    WrongType {
        field: &'static str,
        expected: &'static str,
        context: &'static str,
        location: Option<Location>,
    },
    /// The document nests terms deeper than [`crate::MAX_NESTING_DEPTH`].
    TooDeep { limit: u16 },
}

impl LoadError {
    /// The source span of the node that failed to load, when known.
    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::UnknownKind { location, .. }
            | Self::UnknownOperator { location, .. }
            | Self::MissingField { location, .. }
            | Self::WrongType { location, .. } => location.as_ref(),
            Self::Document(_) | Self::TooDeep { .. } => None,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(message) => write!(f, "malformed AST document: {message}"),
            Self::UnknownKind { kind, .. } => write!(f, "unknown term kind '{kind}'"),
            Self::UnknownOperator { name, .. } => write!(f, "unknown binary operator '{name}'"),
            Self::MissingField { field, context, .. } => {
                write!(f, "missing field '{field}' in {context}")
            }
            Self::WrongType {
                field,
                expected,
                context,
                ..
            } => write!(f, "field '{field}' in {context} is not {expected}"),
            Self::TooDeep { limit } => write!(f, "AST nests deeper than the {limit} level limit"),
        }?;
        if let Some(location) = self.location() {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

impl std::error::Error for LoadError {}

/// Failure during evaluation.
///
/// The object language has no exception handling, so none of these are
/// recoverable: every variant propagates to the top of the run. Each carries
/// the span of the node being evaluated when it was raised.
#[derive(Debug, Clone)]
pub enum RunError {
    /// A `Var` referenced a name absent from the active environment.
    UnknownVariable { name: Rc<str>, location: Location },
    /// An `if` condition was not boolean, or a binary operator was applied
    /// to an operand combination outside its table.
    TypeError { message: String, location: Location },
    /// `/` or `%` with a zero right operand.
    DivisionByZero { location: Location },
    /// The callee of a `Call` did not evaluate to a closure.
    NotCallable { location: Location },
    /// Argument count disagreed with the closure's parameter count.
    Arity {
        expected: usize,
        given: usize,
        location: Location,
    },
    /// An AST shape the evaluator does not handle, e.g. `Not` used as a
    /// binary operator.
    Unsupported { message: String, location: Location },
    /// A configured resource limit tripped.
    Resource(ResourceError),
}

impl RunError {
    /// The source span of the node being evaluated when the error was
    /// raised. Resource trips are not tied to a single node.
    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::UnknownVariable { location, .. }
            | Self::TypeError { location, .. }
            | Self::DivisionByZero { location }
            | Self::NotCallable { location }
            | Self::Arity { location, .. }
            | Self::Unsupported { location, .. } => Some(location),
            Self::Resource(_) => None,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVariable { name, .. } => write!(f, "unknown variable '{name}'"),
            Self::TypeError { message, .. } => f.write_str(message),
            Self::DivisionByZero { .. } => f.write_str("division by zero"),
            Self::NotCallable { .. } => f.write_str("value is not callable"),
            Self::Arity {
                expected, given, ..
            } => write!(
                f,
                "closure of {expected} parameter(s) called with {given} argument(s)"
            ),
            Self::Unsupported { message, .. } => f.write_str(message),
            Self::Resource(err) => write!(f, "{err}"),
        }?;
        if let Some(location) = self.location() {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RunError {}

impl From<ResourceError> for RunError {
    fn from(err: ResourceError) -> Self {
        Self::Resource(err)
    }
}
