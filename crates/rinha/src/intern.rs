use std::rc::Rc;

use ahash::AHashSet;

/// Load-time string interner.
///
/// Identifier texts and filenames repeat heavily across a document (every
/// node carries the filename, recursive programs mention the same names over
/// and over). The loader funnels them through here so equal strings share
/// one allocation and `Symbol` clones stay pointer-sized.
#[derive(Debug, Default)]
pub(crate) struct Interner {
    table: AHashSet<Rc<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared copy of `text`, allocating it on first sight.
    pub fn intern(&mut self, text: &str) -> Rc<str> {
        if let Some(existing) = self.table.get(text) {
            return Rc::clone(existing);
        }
        let entry: Rc<str> = Rc::from(text);
        self.table.insert(Rc::clone(&entry));
        entry
    }
}
