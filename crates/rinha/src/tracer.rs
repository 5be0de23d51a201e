//! Evaluation tracing infrastructure.
//!
//! A trait-based tracing system for the work-stack evaluator with zero-cost
//! abstraction: with [`NoopTracer`] every hook compiles away through
//! monomorphization, the same way [`NoLimitTracker`](crate::NoLimitTracker)
//! eliminates resource checking overhead.

use std::fmt;

use crate::terms::Term;

/// Trait for evaluation tracing.
///
/// All methods have default no-op implementations, so [`NoopTracer`]
/// requires zero lines of code and compiles to zero instructions. The
/// evaluator carries the tracer as a type parameter, so implementations only
/// override the hooks they care about.
pub trait EvalTracer: fmt::Debug {
    /// Called each time the machine starts evaluating a term.
    ///
    /// This is the hottest hook; implementations should stay lightweight.
    ///
    /// # Arguments
    /// * `term` - The term about to be evaluated
    /// * `call_depth` - Number of closure frames currently on the stack
    #[inline(always)]
    fn on_step(&mut self, _term: &Term, _call_depth: usize) {}

    /// Called when a closure body frame is pushed.
    ///
    /// # Arguments
    /// * `callee_name` - The callee's variable name, when the call site is a
    ///   plain variable reference
    /// * `depth` - Call depth after the push
    #[inline(always)]
    fn on_call(&mut self, _callee_name: Option<&str>, _depth: usize) {}

    /// Called when a closure body frame is popped.
    ///
    /// # Arguments
    /// * `depth` - Call depth after the pop
    #[inline(always)]
    fn on_return(&mut self, _depth: usize) {}
}

/// Forwarding impl so hosts can pass `&mut tracer` and inspect the tracer
/// after the run.
impl<T: EvalTracer + ?Sized> EvalTracer for &mut T {
    #[inline(always)]
    fn on_step(&mut self, term: &Term, call_depth: usize) {
        (**self).on_step(term, call_depth);
    }

    #[inline(always)]
    fn on_call(&mut self, callee_name: Option<&str>, depth: usize) {
        (**self).on_call(callee_name, depth);
    }

    #[inline(always)]
    fn on_return(&mut self, depth: usize) {
        (**self).on_return(depth);
    }
}

/// Zero-cost no-op tracer, the production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Tracer that writes a human-readable execution log to stderr.
#[derive(Debug, Default)]
pub struct StderrTracer {
    steps: u64,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvalTracer for StderrTracer {
    fn on_step(&mut self, term: &Term, call_depth: usize) {
        self.steps += 1;
        eprintln!(
            "[rinha] step {:>6} depth {call_depth}: {} at {}",
            self.steps,
            term.kind(),
            term.location()
        );
    }

    fn on_call(&mut self, callee_name: Option<&str>, depth: usize) {
        eprintln!("[rinha] call {} -> depth {depth}", callee_name.unwrap_or("<closure>"));
    }

    fn on_return(&mut self, depth: usize) {
        eprintln!("[rinha] return -> depth {depth}");
    }
}
