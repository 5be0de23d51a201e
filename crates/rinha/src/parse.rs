//! Structures a generic JSON document into the typed AST.
//!
//! The document arrives from an upstream parser as nested mappings and
//! sequences of primitive scalars. Every term object carries a `kind`
//! discriminator and a `location`; `kind` and operator names are matched
//! case-insensitively. Any malformed node is a fatal [`LoadError`] and
//! nothing is ever evaluated from a document that did not load completely.

use std::str::FromStr as _;

use serde_json::{Map, Value as JsonValue};
use smallvec::SmallVec;

use crate::{
    errors::LoadError,
    intern::Interner,
    terms::{Binary, BinaryOp, Call, File, Function, If, Let, Location, Print, Symbol, Term, TermKind},
};

/// Maximum nesting depth for terms in a document.
///
/// The loader recurses on the host call stack, and the document is untrusted
/// input; a deliberately deep chain like `1 + 1 + 1 + ...` must fail with
/// [`LoadError::TooDeep`] rather than exhaust the stack. The cap also bounds
/// the renderer, which only ever sees trees that passed the loader.
#[cfg(not(debug_assertions))]
pub const MAX_NESTING_DEPTH: u16 = 2000;
/// In debug builds the limit is lower because stack frames are much larger
/// (no inlining, debug info, etc.).
#[cfg(debug_assertions)]
pub const MAX_NESTING_DEPTH: u16 = 400;

type JsonObject = Map<String, JsonValue>;

/// Structures a document rooted at a `File` object.
pub(crate) fn parse_file(document: &JsonValue) -> Result<File, LoadError> {
    Loader::default().file(document)
}

#[derive(Default)]
struct Loader {
    interner: Interner,
}

impl Loader {
    fn file(&mut self, document: &JsonValue) -> Result<File, LoadError> {
        let Some(obj) = document.as_object() else {
            return Err(LoadError::WrongType {
                field: "<root>",
                expected: "an object",
                context: "File",
                location: None,
            });
        };
        let location = self.location(obj, "File")?;
        let name = str_field(obj, "name", "File", Some(&location))?.to_owned();
        let expression = self.term(field(obj, "expression", "File", Some(&location))?, 0)?;
        Ok(File {
            name,
            expression,
            location,
        })
    }

    fn term(&mut self, document: &JsonValue, depth: u16) -> Result<Term, LoadError> {
        if depth >= MAX_NESTING_DEPTH {
            return Err(LoadError::TooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }
        let Some(obj) = document.as_object() else {
            return Err(LoadError::WrongType {
                field: "<term>",
                expected: "an object",
                context: "Term",
                location: None,
            });
        };
        let location = self.location(obj, "Term")?;
        let kind_text = str_field(obj, "kind", "Term", Some(&location))?;
        let Ok(kind) = TermKind::from_str(kind_text) else {
            return Err(LoadError::UnknownKind {
                kind: kind_text.to_owned(),
                location: Some(location),
            });
        };
        let context: &'static str = kind.into();
        match kind {
            TermKind::Int => {
                let value = int_field(obj, "value", context, Some(&location))?;
                Ok(Term::Int { value, location })
            }
            TermKind::Str => {
                let value = self.interner.intern(str_field(obj, "value", context, Some(&location))?);
                Ok(Term::Str { value, location })
            }
            TermKind::Var => {
                let text = self.interner.intern(str_field(obj, "text", context, Some(&location))?);
                Ok(Term::Var { text, location })
            }
            TermKind::Let => {
                let name = self.symbol(field(obj, "name", context, Some(&location))?)?;
                let value = self.term(field(obj, "value", context, Some(&location))?, depth + 1)?;
                let next = self.term(field(obj, "next", context, Some(&location))?, depth + 1)?;
                Ok(Term::Let(Box::new(Let {
                    name,
                    value,
                    next,
                    location,
                })))
            }
            TermKind::Function => {
                let parameters = array_field(obj, "parameters", context, Some(&location))?
                    .iter()
                    .map(|item| self.symbol(item))
                    .collect::<Result<SmallVec<_>, _>>()?;
                let value = self.term(field(obj, "value", context, Some(&location))?, depth + 1)?;
                Ok(Term::Function(Box::new(Function {
                    parameters,
                    value,
                    location,
                })))
            }
            TermKind::If => {
                let condition = self.term(field(obj, "condition", context, Some(&location))?, depth + 1)?;
                let then = self.term(field(obj, "then", context, Some(&location))?, depth + 1)?;
                let otherwise = self.term(field(obj, "otherwise", context, Some(&location))?, depth + 1)?;
                Ok(Term::If(Box::new(If {
                    condition,
                    then,
                    otherwise,
                    location,
                })))
            }
            TermKind::Call => {
                let callee = self.term(field(obj, "callee", context, Some(&location))?, depth + 1)?;
                let arguments = array_field(obj, "arguments", context, Some(&location))?
                    .iter()
                    .map(|item| self.term(item, depth + 1))
                    .collect::<Result<SmallVec<_>, _>>()?;
                Ok(Term::Call(Box::new(Call {
                    callee,
                    arguments,
                    location,
                })))
            }
            TermKind::Binary => {
                let lhs = self.term(field(obj, "lhs", context, Some(&location))?, depth + 1)?;
                let op_name = str_field(obj, "op", context, Some(&location))?;
                let Ok(op) = BinaryOp::from_str(op_name) else {
                    return Err(LoadError::UnknownOperator {
                        name: op_name.to_owned(),
                        location: Some(location),
                    });
                };
                let rhs = self.term(field(obj, "rhs", context, Some(&location))?, depth + 1)?;
                Ok(Term::Binary(Box::new(Binary { lhs, op, rhs, location })))
            }
            TermKind::Print => {
                let value = self.term(field(obj, "value", context, Some(&location))?, depth + 1)?;
                Ok(Term::Print(Box::new(Print { value, location })))
            }
        }
    }

    fn symbol(&mut self, document: &JsonValue) -> Result<Symbol, LoadError> {
        let Some(obj) = document.as_object() else {
            return Err(LoadError::WrongType {
                field: "<symbol>",
                expected: "an object",
                context: "Symbol",
                location: None,
            });
        };
        let location = self.location(obj, "Symbol")?;
        let text = self.interner.intern(str_field(obj, "text", "Symbol", Some(&location))?);
        Ok(Symbol { text, location })
    }

    fn location(&mut self, obj: &JsonObject, context: &'static str) -> Result<Location, LoadError> {
        let doc = field(obj, "location", context, None)?;
        let Some(loc) = doc.as_object() else {
            return Err(LoadError::WrongType {
                field: "location",
                expected: "an object",
                context,
                location: None,
            });
        };
        let start = offset_field(loc, "start")?;
        let end = offset_field(loc, "end")?;
        let filename = self.interner.intern(str_field(loc, "filename", "Location", None)?);
        Ok(Location { start, end, filename })
    }
}

fn field<'j>(
    obj: &'j JsonObject,
    field: &'static str,
    context: &'static str,
    location: Option<&Location>,
) -> Result<&'j JsonValue, LoadError> {
    obj.get(field).ok_or_else(|| LoadError::MissingField {
        field,
        context,
        location: location.cloned(),
    })
}

fn str_field<'j>(
    obj: &'j JsonObject,
    name: &'static str,
    context: &'static str,
    location: Option<&Location>,
) -> Result<&'j str, LoadError> {
    field(obj, name, context, location)?
        .as_str()
        .ok_or_else(|| LoadError::WrongType {
            field: name,
            expected: "a string",
            context,
            location: location.cloned(),
        })
}

fn int_field(
    obj: &JsonObject,
    name: &'static str,
    context: &'static str,
    location: Option<&Location>,
) -> Result<i64, LoadError> {
    field(obj, name, context, location)?
        .as_i64()
        .ok_or_else(|| LoadError::WrongType {
            field: name,
            expected: "an integer",
            context,
            location: location.cloned(),
        })
}

fn array_field<'j>(
    obj: &'j JsonObject,
    name: &'static str,
    context: &'static str,
    location: Option<&Location>,
) -> Result<&'j [JsonValue], LoadError> {
    field(obj, name, context, location)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| LoadError::WrongType {
            field: name,
            expected: "an array",
            context,
            location: location.cloned(),
        })
}

fn offset_field(obj: &JsonObject, name: &'static str) -> Result<usize, LoadError> {
    let wrong_type = || LoadError::WrongType {
        field: name,
        expected: "a non-negative integer",
        context: "Location",
        location: None,
    };
    let raw = field(obj, name, "Location", None)?.as_u64().ok_or_else(wrong_type)?;
    usize::try_from(raw).map_err(|_| wrong_type())
}
