use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

/// Index of an environment frame inside [`Environments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EnvId(u32);

impl EnvId {
    pub fn new(index: usize) -> Self {
        Self(index.try_into().expect("environment arena overflowed u32"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena of environment frames for a single run.
///
/// Every frame is a full name→value mapping, extended copy-on-write by
/// `with_values`: frames never shrink and are never mutated after they
/// become visible to evaluation. The one sanctioned mutation is `rebind`,
/// used by `let` to patch a just-created frame so a recursive closure can
/// see its own binding; it runs before any other code observes the frame.
///
/// Closures refer to frames by [`EnvId`], so the arena owns every frame for
/// the whole run and the let-induced environment↔closure cycle is an index,
/// not a reference-count loop. Dropping the arena at the end of the run
/// releases everything at once.
#[derive(Debug)]
pub(crate) struct Environments<'a> {
    frames: Vec<Frame<'a>>,
}

#[derive(Debug)]
struct Frame<'a> {
    values: IndexMap<Rc<str>, Value<'a>>,
}

impl<'a> Environments<'a> {
    /// Creates the arena with the global frame at index 0, binding `true`
    /// and `false`. Those are ordinary bindings: the language has no boolean
    /// literals.
    pub fn with_global() -> Self {
        let mut values = IndexMap::with_capacity(2);
        values.insert(Rc::from("true"), Value::Bool(true));
        values.insert(Rc::from("false"), Value::Bool(false));
        Self {
            frames: vec![Frame { values }],
        }
    }

    /// The global frame created by [`Self::with_global`].
    pub fn global(&self) -> EnvId {
        EnvId(0)
    }

    /// Looks `name` up in the frame `env`.
    pub fn lookup(&self, env: EnvId, name: &str) -> Option<&Value<'a>> {
        self.frames[env.index()].values.get(name)
    }

    /// Creates a new frame whose bindings are the union of `base`'s bindings
    /// with `extra`, with `extra` winning on conflicts.
    pub fn with_values(&mut self, base: EnvId, extra: impl IntoIterator<Item = (Rc<str>, Value<'a>)>) -> EnvId {
        let mut values = self.frames[base.index()].values.clone();
        for (name, value) in extra {
            values.insert(name, value);
        }
        let id = EnvId::new(self.frames.len());
        self.frames.push(Frame { values });
        id
    }

    /// Replaces the binding of `name` in frame `env`.
    ///
    /// Only for the recursive-closure patch in `let`, on a frame no other
    /// code has seen yet.
    pub fn rebind(&mut self, env: EnvId, name: &Rc<str>, value: Value<'a>) {
        self.frames[env.index()].values.insert(Rc::clone(name), value);
    }
}
