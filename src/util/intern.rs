use std::{collections::HashMap, fmt, hash::Hash, marker::PhantomData, num::NonZeroU32, rc::Rc};

/// A handle to some interned value of type `T`. To retrieve a `&T`, use
/// [`Interner::get`].
pub struct Interned<T: ?Sized> {
    // NonZeroU32 so that `Option<Interned<_>>` stays four bytes wide.
    handle: NonZeroU32,
    _ty: PhantomData<T>,
}

impl<T: ?Sized> Interned<T> {
    const fn new(handle: NonZeroU32) -> Self {
        Interned {
            handle,
            _ty: PhantomData,
        }
    }

    fn index(self) -> usize {
        self.handle.get() as usize - 1
    }
}

impl<T: ?Sized> Copy for Interned<T> {}

impl<T: ?Sized> Clone for Interned<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Hash for Interned<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl<T: ?Sized> PartialEq for Interned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T: ?Sized> Eq for Interned<T> {}

impl<T: ?Sized> fmt::Debug for Interned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Interned({})", self.handle)
    }
}

/// Deduplicates identifier names for a single compilation unit.
pub struct Interner<T: ?Sized> {
    map: HashMap<Rc<T>, Interned<T>>,
    vec: Vec<Rc<T>>,
}

impl<T: ?Sized> Default for Interner<T> {
    fn default() -> Self {
        Interner {
            map: HashMap::new(),
            vec: Vec::new(),
        }
    }
}

impl fmt::Debug for Interner<str> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.vec).finish()
    }
}

impl<T: ?Sized + Eq + Hash> Interner<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            map: HashMap::with_capacity(capacity),
            vec: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Returns the handle of an already interned value, without interning it.
    pub fn lookup(&self, value: &T) -> Option<Interned<T>> {
        self.map.get(value).copied()
    }

    /// Returns the corresponding value for the provided [`Interned`] handle.
    ///
    /// Handles are only meaningful for the interner which produced them.
    /// Panics if not found.
    pub fn get(&self, handle: Interned<T>) -> &T {
        &self.vec[handle.index()]
    }
}

impl Interner<str> {
    /// Interns the provided name, returning a handle which can be used to
    /// retrieve it later.
    pub fn intern(&mut self, name: &str) -> Interned<str> {
        if let Some(handle) = self.lookup(name) {
            return handle;
        }
        let len = u32::try_from(self.vec.len()).expect("interner out of capacity");
        let handle = Interned::new(NonZeroU32::MIN.saturating_add(len));
        let key: Rc<str> = Rc::from(name);
        self.vec.push(Rc::clone(&key));
        self.map.insert(key, handle);
        handle
    }
}
