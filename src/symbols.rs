use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
};

use tracing::trace;

use crate::{ast::Ident, codegen, token::Spanned, types::Type, util::intern::Interned};

/// Size of every variable, in bytes. All values are 64-bit words.
pub const SLOT_SIZE: usize = 8;

/// Most variables a single frame holds.
pub const MAX_SLOTS: usize = 1 << 16;

/// Stack frames are kept aligned to 16 bytes.
const FRAME_ALIGNMENT: usize = 16;

/// A `rbp`-relative stack offset holding one variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Slot(i32);

impl Slot {
    pub fn offset(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Slot {
    /// Formats the slot as an Intel memory operand.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "qword ptr [rbp]"),
            o if o < 0 => write!(f, "qword ptr [rbp - {}]", o.unsigned_abs()),
            o => write!(f, "qword ptr [rbp + {o}]"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mutability {
    Mutable,
    Constant,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub name: Interned<str>,
    pub slot: Slot,
    pub mutability: Mutability,
    pub ty: Type,
    /// Source offset from which references may see this symbol.
    pub visible_from: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeclareError {
    /// The name is taken; holds the existing slot.
    Redeclared(Slot),
    /// Every one of the [`MAX_SLOTS`] slots is in use.
    FrameFull,
}

/// Maps names to stack slots for a single compilation.
///
/// There is one flat namespace: no nesting, no shadowing. Blocks of `if` and
/// loops declare into the same namespace.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<Interned<str>, Symbol>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Binds `name` to the next free slot.
    ///
    /// A name can only be declared once. On failure the table is left
    /// untouched.
    pub fn declare(
        &mut self,
        name: Interned<str>,
        mutability: Mutability,
        ty: Type,
        visible_from: usize,
    ) -> Result<Slot, DeclareError> {
        let next = self.next_slot();
        match self.symbols.entry(name) {
            Entry::Occupied(entry) => Err(DeclareError::Redeclared(entry.get().slot)),
            Entry::Vacant(entry) => {
                let slot = next.ok_or(DeclareError::FrameFull)?;
                trace!(?name, slot = slot.0, ?mutability, %ty, "declare");
                entry.insert(Symbol {
                    name,
                    slot,
                    mutability,
                    ty,
                    visible_from,
                });
                Ok(slot)
            }
        }
    }

    /// Returns the symbol declared under `name`, regardless of where in the
    /// source the declaration happened.
    pub fn get(&self, name: impl Into<Interned<str>>) -> Option<&Symbol> {
        self.symbols.get(&name.into())
    }

    /// Resolves a reference. Fails if the name was never declared, or if it is
    /// only declared after the reference.
    pub fn resolve(&self, ident: &Ident) -> Result<&Symbol, Spanned<codegen::Error>> {
        self.get(ident)
            .filter(|symbol| ident.span.lo >= symbol.visible_from)
            .ok_or_else(|| ident.span.wrap(codegen::Error::UndefinedIdentifier(ident.name)))
    }

    /// Bytes to reserve below `rbp` for every declared slot.
    pub fn frame_size(&self) -> usize {
        // At most `MAX_SLOTS` symbols, so this can't overflow.
        (self.symbols.len() * SLOT_SIZE).next_multiple_of(FRAME_ALIGNMENT)
    }

    fn next_slot(&self) -> Option<Slot> {
        let count = self.symbols.len();
        if count >= MAX_SLOTS {
            return None;
        }
        let bytes = i32::try_from((count + 1) * SLOT_SIZE).ok()?;
        Some(Slot(-bytes))
    }
}
