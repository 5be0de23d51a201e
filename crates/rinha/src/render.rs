//! Pretty printing of AST nodes and runtime values.
//!
//! The rendered form stays close to surface syntax: block constructs indent
//! their bodies by two spaces, and a `Binary` operand is parenthesized only
//! when its operator binds more loosely than the surrounding one.

use std::{
    fmt::{self, Display as _, Write as _},
    rc::Rc,
};

use crate::{
    terms::{File, Symbol, Term},
    value::Value,
};

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expression.fmt(f)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Rendering precedence of a `Binary` operand: its operator's precedence
/// when the operand is itself a `Binary`, unbounded otherwise so that
/// non-binary operands are never parenthesized.
fn side_precedence(term: &Term) -> u8 {
    match term {
        Term::Binary(node) => node.op.precedence(),
        _ => u8::MAX,
    }
}

/// Writes one operand of a `Binary`, parenthesized iff it binds more
/// loosely than the parent operator.
fn fmt_side(f: &mut fmt::Formatter<'_>, side: &Term, parent_precedence: u8) -> fmt::Result {
    if side_precedence(side) < parent_precedence {
        write!(f, "({side})")
    } else {
        side.fmt(f)
    }
}

/// Writes `body` indented by two spaces, one trailing newline per line.
fn fmt_indented(f: &mut fmt::Formatter<'_>, body: &Term) -> fmt::Result {
    let rendered = body.to_string();
    for line in rendered.lines() {
        f.write_str("  ")?;
        f.write_str(line)?;
        f.write_char('\n')?;
    }
    Ok(())
}

/// Writes a string literal in its quoted source form, escaping the quote
/// character and backslash.
fn fmt_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

fn fmt_comma_separated<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.fmt(f)?;
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { value, .. } => write!(f, "{value}"),
            Self::Str { value, .. } => fmt_quoted(f, value),
            Self::Var { text, .. } => f.write_str(text),
            Self::Let(node) => {
                writeln!(f, "let {} = {};", node.name, node.value)?;
                node.next.fmt(f)
            }
            Self::Function(node) => {
                f.write_str("fn (")?;
                fmt_comma_separated(f, &node.parameters)?;
                f.write_str(") => {\n")?;
                fmt_indented(f, &node.value)?;
                f.write_char('}')
            }
            Self::If(node) => {
                writeln!(f, "if {} {{", node.condition)?;
                fmt_indented(f, &node.then)?;
                f.write_str("} else {\n")?;
                fmt_indented(f, &node.otherwise)?;
                f.write_char('}')
            }
            Self::Call(node) => {
                if matches!(node.callee, Self::Var { .. }) {
                    node.callee.fmt(f)?;
                } else {
                    write!(f, "({})", node.callee)?;
                }
                f.write_char('(')?;
                fmt_comma_separated(f, &node.arguments)?;
                f.write_char(')')
            }
            Self::Binary(node) => {
                fmt_side(f, &node.lhs, node.op.precedence())?;
                write!(f, " {} ", node.op.token())?;
                fmt_side(f, &node.rhs, node.op.precedence())
            }
            Self::Print(node) => write!(f, "print ({})", node.value),
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Closure(cell) => {
                // Short identity tag so distinct closures are tellable apart;
                // the rendering does not round-trip.
                let addr = Rc::as_ptr(cell) as usize;
                let hex = format!("{addr:06x}");
                write!(f, "<Closure#{} fn (", &hex[hex.len() - 6..])?;
                fmt_comma_separated(f, &cell.function.parameters)?;
                f.write_str(")>")
            }
        }
    }
}
