//! End-to-end evaluation tests.
//!
//! Each test builds an AST document the way the upstream parser would emit
//! it, loads it, and runs it with a collecting print sink.

use pretty_assertions::assert_eq;
use rinha::{CollectStringPrint, NoLimitTracker, NoPrint, NoopTracer, Object, Program, RunError};
use serde_json::{Value as Json, json};

fn loc() -> Json {
    json!({"start": 0, "end": 0, "filename": "test.rinha"})
}

fn int(value: i64) -> Json {
    json!({"kind": "Int", "value": value, "location": loc()})
}

fn str_(value: &str) -> Json {
    json!({"kind": "Str", "value": value, "location": loc()})
}

fn var(text: &str) -> Json {
    json!({"kind": "Var", "text": text, "location": loc()})
}

fn symbol(text: &str) -> Json {
    json!({"text": text, "location": loc()})
}

fn let_(name: &str, value: Json, next: Json) -> Json {
    json!({"kind": "Let", "name": symbol(name), "value": value, "next": next, "location": loc()})
}

fn function(parameters: &[&str], value: Json) -> Json {
    let parameters: Vec<Json> = parameters.iter().map(|name| symbol(name)).collect();
    json!({"kind": "Function", "parameters": parameters, "value": value, "location": loc()})
}

fn if_(condition: Json, then: Json, otherwise: Json) -> Json {
    json!({"kind": "If", "condition": condition, "then": then, "otherwise": otherwise, "location": loc()})
}

fn call(callee: Json, arguments: Vec<Json>) -> Json {
    json!({"kind": "Call", "callee": callee, "arguments": arguments, "location": loc()})
}

fn binary(lhs: Json, op: &str, rhs: Json) -> Json {
    json!({"kind": "Binary", "lhs": lhs, "op": op, "rhs": rhs, "location": loc()})
}

fn print(value: Json) -> Json {
    json!({"kind": "Print", "value": value, "location": loc()})
}

fn load(expression: Json) -> Program {
    let document = json!({"name": "test.rinha", "expression": expression, "location": loc()});
    Program::load_document(&document).expect("document should load")
}

/// Runs an expression and returns everything it printed.
fn run_output(expression: Json) -> String {
    let program = load(expression);
    let mut sink = CollectStringPrint::new();
    program
        .run(NoLimitTracker, NoopTracer, &mut sink)
        .expect("evaluation should succeed");
    sink.into_output()
}

/// Runs an expression for its final value, discarding print output.
fn run_value(expression: Json) -> Result<Object, RunError> {
    load(expression).run(NoLimitTracker, NoopTracer, &mut NoPrint)
}

#[test]
fn prints_integer_addition() {
    assert_eq!(run_output(print(binary(int(1), "Add", int(2)))), "3");
}

#[test]
fn prints_string_concatenation() {
    assert_eq!(run_output(print(binary(str_("ab"), "Add", str_("cd")))), "abcd");
}

#[test]
fn let_binding_is_visible_in_next() {
    assert_eq!(run_output(let_("x", int(10), print(var("x")))), "10");
}

#[test]
fn calls_bind_parameters_in_order() {
    let f = function(&["a", "b"], binary(var("a"), "Mul", var("b")));
    let expr = let_("f", f, print(call(var("f"), vec![int(6), int(7)])));
    assert_eq!(run_output(expr), "42");
}

/// Recursive self-reference through a let-bound closure.
#[test]
fn fibonacci_of_ten() {
    let recurse = binary(
        call(var("fib"), vec![binary(var("n"), "Sub", int(1))]),
        "Add",
        call(var("fib"), vec![binary(var("n"), "Sub", int(2))]),
    );
    let body = if_(binary(var("n"), "Lt", int(2)), var("n"), recurse);
    let expr = let_(
        "fib",
        function(&["n"], body),
        print(call(var("fib"), vec![int(10)])),
    );
    assert_eq!(run_output(expr), "55");
}

#[test]
fn factorial_final_value() {
    let recurse = binary(
        var("n"),
        "Mul",
        call(var("f"), vec![binary(var("n"), "Sub", int(1))]),
    );
    let body = if_(binary(var("n"), "Eq", int(0)), int(1), recurse);
    let expr = let_("f", function(&["n"], body), call(var("f"), vec![int(5)]));
    assert_eq!(run_value(expr).unwrap(), Object::Int(120));
}

/// A closure sees the environment at its definition site, not its call site.
#[test]
fn closures_capture_lexically() {
    let expr = let_(
        "x",
        int(1),
        let_(
            "g",
            function(&[], var("x")),
            let_("x", int(99), print(call(var("g"), vec![]))),
        ),
    );
    assert_eq!(run_output(expr), "1");
}

/// Arguments evaluate left to right, in the caller's environment, before
/// the body runs.
#[test]
fn arguments_evaluate_left_to_right() {
    let f = function(&["a", "b"], print(str_("C")));
    let expr = let_(
        "f",
        f,
        call(var("f"), vec![print(str_("A")), print(str_("B"))]),
    );
    assert_eq!(run_output(expr), "ABC");
}

/// `print` evaluates to its argument, so it composes as an expression.
#[test]
fn print_returns_its_value() {
    let expr = let_("x", print(int(1)), print(var("x")));
    assert_eq!(run_output(expr), "11");
}

/// The same program gives the same output and value on every run.
#[test]
fn evaluation_is_deterministic() {
    let program = load(let_("x", int(3), print(binary(var("x"), "Mul", var("x")))));
    let mut first = CollectStringPrint::new();
    let mut second = CollectStringPrint::new();
    let a = program.run(NoLimitTracker, NoopTracer, &mut first).unwrap();
    let b = program.run(NoLimitTracker, NoopTracer, &mut second).unwrap();
    assert_eq!(a, b);
    assert_eq!(first.output(), second.output());
}

#[test]
fn division_floors_toward_negative_infinity() {
    assert_eq!(run_value(binary(int(7), "Div", int(2))).unwrap(), Object::Int(3));
    assert_eq!(run_value(binary(int(-7), "Div", int(2))).unwrap(), Object::Int(-4));
    assert_eq!(run_value(binary(int(-7), "Rem", int(2))).unwrap(), Object::Int(1));
    assert_eq!(run_value(binary(int(7), "Rem", int(-2))).unwrap(), Object::Int(-1));
}

#[test]
fn comparisons_work_on_strings() {
    assert_eq!(run_value(binary(str_("abc"), "Lt", str_("abd"))).unwrap(), Object::Bool(true));
    assert_eq!(run_value(binary(str_("b"), "Gte", str_("ab"))).unwrap(), Object::Bool(true));
}

/// `==` is structural across literal kinds: same kind and same scalar.
#[test]
fn equality_is_structural() {
    assert_eq!(run_value(binary(int(1), "Eq", int(1))).unwrap(), Object::Bool(true));
    assert_eq!(run_value(binary(str_("a"), "Eq", str_("b"))).unwrap(), Object::Bool(false));
    assert_eq!(run_value(binary(int(1), "Eq", str_("1"))).unwrap(), Object::Bool(false));
    assert_eq!(run_value(binary(int(1), "Neq", str_("1"))).unwrap(), Object::Bool(true));
}

#[test]
fn boolean_operators() {
    assert_eq!(
        run_value(binary(var("true"), "And", var("false"))).unwrap(),
        Object::Bool(false)
    );
    assert_eq!(
        run_value(binary(var("true"), "Or", var("false"))).unwrap(),
        Object::Bool(true)
    );
}

#[test]
fn closure_results_render_with_their_parameters() {
    let output = run_output(print(function(&["a", "b"], int(0))));
    assert!(output.starts_with("<Closure#"), "got: {output}");
    assert!(output.ends_with(" fn (a, b)>"), "got: {output}");
}

#[test]
fn closure_final_value_is_detached() {
    let result = run_value(function(&["x"], var("x"))).unwrap();
    let Object::Closure(rendered) = result else {
        panic!("expected a closure result, got {result:?}");
    };
    assert!(rendered.contains("fn (x)"), "got: {rendered}");
}

// === Execution errors ===

#[test]
fn unknown_variable_fails() {
    let err = run_value(var("missing")).unwrap_err();
    assert!(matches!(err, RunError::UnknownVariable { ref name, .. } if &**name == "missing"), "got: {err}");
}

#[test]
fn non_boolean_condition_fails() {
    let err = run_value(if_(int(1), int(2), int(3))).unwrap_err();
    assert!(matches!(err, RunError::TypeError { .. }), "got: {err}");
}

#[test]
fn division_by_zero_fails() {
    let err = run_value(binary(int(1), "Div", int(0))).unwrap_err();
    assert!(matches!(err, RunError::DivisionByZero { .. }), "got: {err}");
    let err = run_value(binary(int(1), "Rem", int(0))).unwrap_err();
    assert!(matches!(err, RunError::DivisionByZero { .. }), "got: {err}");
}

#[test]
fn calling_a_literal_fails() {
    let err = run_value(call(int(1), vec![])).unwrap_err();
    assert!(matches!(err, RunError::NotCallable { .. }), "got: {err}");
}

/// Wrong arity fails before any argument runs.
#[test]
fn wrong_arity_fails_before_argument_effects() {
    let f = function(&["a", "b"], int(0));
    let expr = let_("f", f, call(var("f"), vec![print(str_("A"))]));
    let program = load(expr);
    let mut sink = CollectStringPrint::new();
    let err = program.run(NoLimitTracker, NoopTracer, &mut sink).unwrap_err();
    assert!(
        matches!(err, RunError::Arity { expected: 2, given: 1, .. }),
        "got: {err}"
    );
    assert_eq!(sink.output(), "", "arity failure must precede argument effects");
}

#[test]
fn mixed_operand_kinds_fail() {
    let err = run_value(binary(int(1), "Add", str_("x"))).unwrap_err();
    assert!(matches!(err, RunError::TypeError { .. }), "got: {err}");
    let err = run_value(binary(var("true"), "Add", var("true"))).unwrap_err();
    assert!(matches!(err, RunError::TypeError { .. }), "got: {err}");
}

#[test]
fn closure_operands_fail() {
    let expr = binary(function(&[], int(0)), "Eq", function(&[], int(0)));
    let err = run_value(expr).unwrap_err();
    assert!(matches!(err, RunError::TypeError { .. }), "got: {err}");
}

/// `Not` loads (it is in the operator enumeration) but is not a binary
/// operation.
#[test]
fn not_operator_is_unsupported() {
    let err = run_value(binary(var("true"), "Not", var("false"))).unwrap_err();
    assert!(matches!(err, RunError::Unsupported { .. }), "got: {err}");
}

/// Errors point back at the offending node's source span.
#[test]
fn errors_carry_locations() {
    let err = run_value(var("missing")).unwrap_err();
    let location = err.location().expect("location should be attached");
    assert_eq!(&*location.filename, "test.rinha");
}

// === Tracing ===

/// Counts tracer hook invocations.
#[derive(Debug, Default)]
struct CountingTracer {
    steps: usize,
    calls: usize,
    returns: usize,
}

impl rinha::EvalTracer for CountingTracer {
    fn on_step(&mut self, _term: &rinha::Term, _call_depth: usize) {
        self.steps += 1;
    }

    fn on_call(&mut self, _callee_name: Option<&str>, _depth: usize) {
        self.calls += 1;
    }

    fn on_return(&mut self, _depth: usize) {
        self.returns += 1;
    }
}

/// Every closure frame pushed is popped, and steps are observed at all.
#[test]
fn tracer_sees_calls_balanced_by_returns() {
    let recurse = binary(
        var("n"),
        "Mul",
        call(var("f"), vec![binary(var("n"), "Sub", int(1))]),
    );
    let body = if_(binary(var("n"), "Eq", int(0)), int(1), recurse);
    let expr = let_("f", function(&["n"], body), call(var("f"), vec![int(5)]));
    let program = load(expr);

    let mut tracer = CountingTracer::default();
    let result = program.run(NoLimitTracker, &mut tracer, &mut NoPrint);
    drop(result.expect("evaluation should succeed"));

    assert_eq!(tracer.calls, 6, "f(5) recurses down to f(0)");
    assert_eq!(tracer.returns, tracer.calls);
    assert!(tracer.steps > tracer.calls);
}
