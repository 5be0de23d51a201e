//! The work-stack evaluator.
//!
//! Evaluation runs on an explicit stack of pending steps plus an operand
//! stack of produced values, never on the host call stack. The AST is
//! untrusted input and the object language has no tail calls, so both deep
//! trees and deep object-level recursion must cost heap, not stack frames.
//!
//! Each composite term pushes a resume step for itself followed by the entry
//! steps for its children (last child pushed first, so children complete
//! left to right). A resume step finds its children's values on top of the
//! operand stack.

use std::rc::Rc;

use crate::{
    env::{EnvId, Environments},
    errors::{RunError, RunResult},
    io::PrintWriter,
    resource::ResourceTracker,
    terms::{Binary, BinaryOp, Call, If, Let, Term},
    tracer::EvalTracer,
    value::{Closure, Value},
};

/// One pending unit of work on the machine's control stack.
enum Step<'a> {
    /// Start evaluating `term` in `env`.
    Enter { term: &'a Term, env: EnvId },
    /// A `let` value finished; extend the environment and enter the body.
    Bind { node: &'a Let, env: EnvId },
    /// An `if` condition finished; enter the selected branch.
    Branch { node: &'a If, env: EnvId },
    /// Both operands of a `Binary` finished; apply the operator.
    Combine { node: &'a Binary },
    /// A call's callee finished; check it and start on the arguments.
    Callee { node: &'a Call, env: EnvId },
    /// Argument `index` of a call finished; continue with the next one or
    /// bind parameters and enter the body.
    Argument {
        node: &'a Call,
        env: EnvId,
        closure: Rc<Closure<'a>>,
        index: usize,
    },
    /// A `print` argument finished; emit it and leave it as the result.
    Emit,
    /// A closure body finished; pop the call frame accounting.
    Return,
}

/// Evaluates `root` in `env`, producing the final value.
///
/// Generic over the tracker, tracer, and print sink so the no-op
/// implementations compile away entirely.
pub(crate) fn evaluate<'a>(
    envs: &mut Environments<'a>,
    env: EnvId,
    root: &'a Term,
    tracker: &mut impl ResourceTracker,
    tracer: &mut impl EvalTracer,
    print: &mut impl PrintWriter,
) -> RunResult<Value<'a>> {
    let mut work: Vec<Step<'a>> = vec![Step::Enter { term: root, env }];
    let mut values: Vec<Value<'a>> = Vec::new();
    let mut call_depth = 0usize;

    while let Some(step) = work.pop() {
        tracker.check_step()?;
        match step {
            Step::Enter { term, env } => {
                tracer.on_step(term, call_depth);
                match term {
                    Term::Int { value, .. } => values.push(Value::Int(*value)),
                    Term::Str { value, .. } => values.push(Value::Str(Rc::clone(value))),
                    Term::Var { text, location } => {
                        let Some(value) = envs.lookup(env, text) else {
                            return Err(RunError::UnknownVariable {
                                name: Rc::clone(text),
                                location: location.clone(),
                            });
                        };
                        values.push(value.clone());
                    }
                    Term::Function(node) => {
                        // Lexical capture: the closure carries the
                        // environment in effect at its definition site.
                        values.push(Value::Closure(Rc::new(Closure {
                            function: node.as_ref(),
                            env,
                        })));
                    }
                    Term::Let(node) => {
                        work.push(Step::Bind { node, env });
                        work.push(Step::Enter { term: &node.value, env });
                    }
                    Term::If(node) => {
                        work.push(Step::Branch { node, env });
                        work.push(Step::Enter {
                            term: &node.condition,
                            env,
                        });
                    }
                    Term::Binary(node) => {
                        work.push(Step::Combine { node });
                        work.push(Step::Enter { term: &node.rhs, env });
                        work.push(Step::Enter { term: &node.lhs, env });
                    }
                    Term::Call(node) => {
                        work.push(Step::Callee { node, env });
                        work.push(Step::Enter { term: &node.callee, env });
                    }
                    Term::Print(node) => {
                        work.push(Step::Emit);
                        work.push(Step::Enter { term: &node.value, env });
                    }
                }
            }
            Step::Bind { node, env } => {
                let value = pop(&mut values);
                // A let-bound closure must be able to call itself through
                // its binding name, so the binding is patched to a closure
                // whose captured environment is the extended frame. The
                // patch happens before any other code can observe the frame.
                let recursive_function = match &value {
                    Value::Closure(cell) => Some(cell.function),
                    _ => None,
                };
                let next_env = envs.with_values(env, [(Rc::clone(&node.name.text), value)]);
                if let Some(function) = recursive_function {
                    let patched = Value::Closure(Rc::new(Closure {
                        function,
                        env: next_env,
                    }));
                    envs.rebind(next_env, &node.name.text, patched);
                }
                work.push(Step::Enter {
                    term: &node.next,
                    env: next_env,
                });
            }
            Step::Branch { node, env } => {
                let branch = match pop(&mut values) {
                    Value::Bool(true) => &node.then,
                    Value::Bool(false) => &node.otherwise,
                    other => {
                        return Err(RunError::TypeError {
                            message: format!("condition in 'if' is not boolean, got {}", other.kind_name()),
                            location: node.location.clone(),
                        });
                    }
                };
                work.push(Step::Enter { term: branch, env });
            }
            Step::Combine { node } => {
                let rhs = pop(&mut values);
                let lhs = pop(&mut values);
                values.push(apply_binary(node, lhs, rhs)?);
            }
            Step::Callee { node, env } => {
                let Value::Closure(closure) = pop(&mut values) else {
                    return Err(RunError::NotCallable {
                        location: node.location.clone(),
                    });
                };
                // Arity is checked before any argument runs, so a bad call
                // fails without the arguments' side effects.
                let expected = closure.function.parameters.len();
                let given = node.arguments.len();
                if given != expected {
                    return Err(RunError::Arity {
                        expected,
                        given,
                        location: node.location.clone(),
                    });
                }
                if given == 0 {
                    invoke(node, &closure, envs, &mut values, &mut work, &mut call_depth, tracker, tracer)?;
                } else {
                    work.push(Step::Argument {
                        node,
                        env,
                        closure,
                        index: 0,
                    });
                    work.push(Step::Enter {
                        term: &node.arguments[0],
                        env,
                    });
                }
            }
            Step::Argument {
                node,
                env,
                closure,
                index,
            } => {
                let next = index + 1;
                if next < node.arguments.len() {
                    work.push(Step::Argument {
                        node,
                        env,
                        closure,
                        index: next,
                    });
                    work.push(Step::Enter {
                        term: &node.arguments[next],
                        env,
                    });
                } else {
                    invoke(node, &closure, envs, &mut values, &mut work, &mut call_depth, tracker, tracer)?;
                }
            }
            Step::Emit => {
                let value = values.last().expect("print resumed with an empty value stack");
                print.stdout_write(&value.to_string());
            }
            Step::Return => {
                call_depth -= 1;
                tracer.on_return(call_depth);
            }
        }
    }

    let result = pop(&mut values);
    debug_assert!(values.is_empty(), "evaluation left extra values on the operand stack");
    Ok(result)
}

/// Pops the value a resume step's child left on the operand stack.
fn pop<'a>(values: &mut Vec<Value<'a>>) -> Value<'a> {
    values
        .pop()
        .expect("operand stack underflow: step resumed without its child values")
}

/// Binds a finished call's arguments and schedules the closure body.
#[expect(clippy::too_many_arguments, reason = "machine state is threaded explicitly")]
fn invoke<'a>(
    node: &'a Call,
    closure: &Closure<'a>,
    envs: &mut Environments<'a>,
    values: &mut Vec<Value<'a>>,
    work: &mut Vec<Step<'a>>,
    call_depth: &mut usize,
    tracker: &impl ResourceTracker,
    tracer: &mut impl EvalTracer,
) -> RunResult<()> {
    let new_depth = *call_depth + 1;
    tracker.check_call_depth(new_depth)?;

    let argc = node.arguments.len();
    let first_arg = values.len() - argc;
    let arguments = values.drain(first_arg..);
    let bindings: Vec<(Rc<str>, Value<'a>)> = closure
        .function
        .parameters
        .iter()
        .zip(arguments)
        .map(|(parameter, value)| (Rc::clone(&parameter.text), value))
        .collect();
    let call_env = envs.with_values(closure.env, bindings);

    *call_depth = new_depth;
    let callee_name = match &node.callee {
        Term::Var { text, .. } => Some(&**text),
        _ => None,
    };
    tracer.on_call(callee_name, new_depth);

    work.push(Step::Return);
    work.push(Step::Enter {
        term: &closure.function.value,
        env: call_env,
    });
    Ok(())
}

/// Applies a binary operator to its evaluated operands.
///
/// Both operands must be literals; the admitted combinations follow the
/// operator table (ints for arithmetic, strings for `+` and the orderings,
/// booleans for `&`/`|`, any literal pair for `==`/`!=`). `Not` is carried
/// in the operator enumeration but is not a binary operation.
fn apply_binary<'a>(node: &'a Binary, lhs: Value<'a>, rhs: Value<'a>) -> RunResult<Value<'a>> {
    use BinaryOp as Op;

    if matches!(lhs, Value::Closure(_)) || matches!(rhs, Value::Closure(_)) {
        return Err(invalid_operands(node, &lhs, &rhs));
    }
    if matches!(node.op, Op::Not) {
        return Err(RunError::Unsupported {
            message: "'!' is not a binary operation".to_owned(),
            location: node.location.clone(),
        });
    }

    let value = match (node.op, &lhs, &rhs) {
        (Op::Add, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
        (Op::Add, Value::Str(a), Value::Str(b)) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Value::Str(Rc::from(joined))
        }
        (Op::Sub, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(*b)),
        (Op::Mul, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(*b)),
        (Op::Div, Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                return Err(RunError::DivisionByZero {
                    location: node.location.clone(),
                });
            }
            Value::Int(floor_div(*a, *b))
        }
        (Op::Rem, Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                return Err(RunError::DivisionByZero {
                    location: node.location.clone(),
                });
            }
            Value::Int(floor_rem(*a, *b))
        }
        (Op::Eq, _, _) => Value::Bool(lhs == rhs),
        (Op::Neq, _, _) => Value::Bool(lhs != rhs),
        (Op::Lt, Value::Int(a), Value::Int(b)) => Value::Bool(a < b),
        (Op::Lt, Value::Str(a), Value::Str(b)) => Value::Bool(a < b),
        (Op::Gt, Value::Int(a), Value::Int(b)) => Value::Bool(a > b),
        (Op::Gt, Value::Str(a), Value::Str(b)) => Value::Bool(a > b),
        (Op::Lte, Value::Int(a), Value::Int(b)) => Value::Bool(a <= b),
        (Op::Lte, Value::Str(a), Value::Str(b)) => Value::Bool(a <= b),
        (Op::Gte, Value::Int(a), Value::Int(b)) => Value::Bool(a >= b),
        (Op::Gte, Value::Str(a), Value::Str(b)) => Value::Bool(a >= b),
        (Op::And, Value::Bool(a), Value::Bool(b)) => Value::Bool(*a && *b),
        (Op::Or, Value::Bool(a), Value::Bool(b)) => Value::Bool(*a || *b),
        _ => return Err(invalid_operands(node, &lhs, &rhs)),
    };
    Ok(value)
}

fn invalid_operands(node: &Binary, lhs: &Value<'_>, rhs: &Value<'_>) -> RunError {
    RunError::TypeError {
        message: format!(
            "invalid operands for '{}': {} and {}",
            node.op.token(),
            lhs.kind_name(),
            rhs.kind_name()
        ),
        location: node.location.clone(),
    }
}

/// Integer division truncated toward negative infinity.
fn floor_div(a: i64, b: i64) -> i64 {
    let quotient = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && (a < 0) != (b < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// Remainder matching floor division: the result takes the divisor's sign.
fn floor_rem(a: i64, b: i64) -> i64 {
    let remainder = a.wrapping_rem(b);
    if remainder != 0 && (remainder < 0) != (b < 0) {
        remainder + b
    } else {
        remainder
    }
}
