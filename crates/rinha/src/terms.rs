use std::{fmt, rc::Rc};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{Display, EnumString, IntoStaticStr};

/// Source span attached to every AST node.
///
/// The evaluator never reads it; it exists so load and execution errors can
/// point back at the offending piece of the original source file. The
/// filename is shared (`Rc<str>`) because every node of a document carries
/// the same one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset where the node starts in the original source.
    pub start: usize,
    /// Byte offset one past the node's end.
    pub end: usize,
    /// Name of the source file the offsets refer to.
    pub filename: Rc<str>,
}

impl Location {
    pub fn new(start: usize, end: usize, filename: impl Into<Rc<str>>) -> Self {
        Self {
            start,
            end,
            filename: filename.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}..{}", self.filename, self.start, self.end)
    }
}

/// A located identifier: the name introduced by a `let` binding or a
/// function parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// The identifier text, interned by the loader.
    pub text: Rc<str>,
    pub location: Location,
}

/// Static metadata for a binary operator.
///
/// `precedence` and `assoc` are consumed only by the renderer; the evaluator
/// dispatches on the operator variant itself. Precedence values are spaced
/// out so new levels can be slotted in between existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    /// Surface token, e.g. `+` or `<=`.
    pub token: &'static str,
    /// Rendering precedence; a side with strictly lower precedence than its
    /// parent is parenthesized.
    pub precedence: u8,
    /// Whether equally-precedented neighbors may be rendered without
    /// parentheses. Currently unused by the renderer.
    pub assoc: bool,
}

/// The closed set of binary operators.
///
/// Documents name operators by variant name (`"Add"`, `"eq"`, ...), matched
/// case-insensitively via the strum `EnumString` derive.
///
/// `Not` is carried in the enumeration for document compatibility but is not
/// a binary operation; the evaluator rejects it with an `Unsupported` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
    Not,
}

impl BinaryOp {
    /// Returns the static metadata record for this operator.
    #[must_use]
    pub const fn operator(self) -> &'static Operator {
        macro_rules! op {
            ($token:literal, $precedence:literal, $assoc:literal) => {
                &Operator {
                    token: $token,
                    precedence: $precedence,
                    assoc: $assoc,
                }
            };
        }
        match self {
            Self::Add => op!("+", 30, true),
            Self::Sub => op!("-", 30, true),
            Self::Mul => op!("*", 40, true),
            Self::Div => op!("/", 40, true),
            Self::Rem => op!("%", 40, true),
            Self::Eq => op!("==", 20, false),
            Self::Neq => op!("!=", 20, false),
            Self::Lt => op!("<", 20, true),
            Self::Gt => op!(">", 20, true),
            Self::Lte => op!("<=", 20, true),
            Self::Gte => op!(">=", 20, true),
            Self::And => op!("&", 10, true),
            Self::Or => op!("|", 5, true),
            Self::Not => op!("!", 25, true),
        }
    }

    /// The surface token for this operator.
    #[must_use]
    pub const fn token(self) -> &'static str {
        self.operator().token
    }

    /// The rendering precedence for this operator.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        self.operator().precedence
    }
}

/// Discriminator names for [`Term`] variants.
///
/// Used by the loader to dispatch on a document's `kind` field
/// (case-insensitively) and by tracing to label execution steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum TermKind {
    Int,
    Str,
    Var,
    Let,
    Function,
    If,
    Call,
    Binary,
    Print,
}

/// An expression node.
///
/// Every variant carries a [`Location`]; recursive variants box their
/// payload to keep the enum itself small. Nodes are immutable once built by
/// the loader, so the evaluator can hold plain shared references into the
/// tree for as long as a run lasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// Signed 64-bit integer literal.
    Int { value: i64, location: Location },
    /// UTF-8 string literal.
    Str { value: Rc<str>, location: Location },
    /// Variable reference.
    Var { text: Rc<str>, location: Location },
    Let(Box<Let>),
    Function(Box<Function>),
    If(Box<If>),
    Call(Box<Call>),
    Binary(Box<Binary>),
    Print(Box<Print>),
}

/// `let name = value; next`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Let {
    pub name: Symbol,
    pub value: Term,
    pub next: Term,
    pub location: Location,
}

/// `fn (p1, p2, ...) => { value }`
///
/// Parameter order is binding order: argument N of a call binds to
/// parameter N.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub parameters: SmallVec<[Symbol; 4]>,
    pub value: Term,
    pub location: Location,
}

/// `if condition { then } else { otherwise }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct If {
    pub condition: Term,
    pub then: Term,
    pub otherwise: Term,
    pub location: Location,
}

/// `callee(a1, a2, ...)`; arguments evaluate left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: Term,
    pub arguments: SmallVec<[Term; 4]>,
    pub location: Location,
}

/// `lhs op rhs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binary {
    pub lhs: Term,
    pub op: BinaryOp,
    pub rhs: Term,
    pub location: Location,
}

/// `print (value)`; evaluates to its argument, so `print` composes as an
/// expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Print {
    pub value: Term,
    pub location: Location,
}

impl Term {
    /// The source span of this node.
    #[must_use]
    pub fn location(&self) -> &Location {
        match self {
            Self::Int { location, .. } | Self::Str { location, .. } | Self::Var { location, .. } => location,
            Self::Let(node) => &node.location,
            Self::Function(node) => &node.location,
            Self::If(node) => &node.location,
            Self::Call(node) => &node.location,
            Self::Binary(node) => &node.location,
            Self::Print(node) => &node.location,
        }
    }

    /// The discriminator for this node, matching the document `kind` field.
    #[must_use]
    pub fn kind(&self) -> TermKind {
        match self {
            Self::Int { .. } => TermKind::Int,
            Self::Str { .. } => TermKind::Str,
            Self::Var { .. } => TermKind::Var,
            Self::Let(_) => TermKind::Let,
            Self::Function(_) => TermKind::Function,
            Self::If(_) => TermKind::If,
            Self::Call(_) => TermKind::Call,
            Self::Binary(_) => TermKind::Binary,
            Self::Print(_) => TermKind::Print,
        }
    }
}

/// A complete program: a source name plus the root expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    pub expression: Term,
    pub location: Location,
}
