#![doc = include_str!("../../../README.md")]

mod env;
mod errors;
mod eval;
mod intern;
mod io;
mod parse;
mod render;
mod resource;
mod run;
mod terms;
mod tracer;
mod value;

pub use crate::{
    errors::{LoadError, RunError, RunResult},
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    parse::MAX_NESTING_DEPTH,
    resource::{DEFAULT_MAX_CALL_DEPTH, LimitedTracker, NoLimitTracker, ResourceError, ResourceTracker},
    run::Program,
    terms::{Binary, BinaryOp, Call, File, Function, If, Let, Location, Operator, Print, Symbol, Term, TermKind},
    tracer::{EvalTracer, NoopTracer, StderrTracer},
    value::Object,
};
