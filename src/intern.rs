//! Symbol table for string interning - enables O(1) identifier comparison.
//!
//! Every identifier the scanner sees is interned and assigned a unique
//! `SymbolId`. Two byte-identical strings always get the same id, so
//! identifiers and keywords compare by id instead of by content.

use ahash::RandomState;
use indexmap::IndexSet;

/// A unique identifier for an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

/// Owns the canonical copy of every interned string.
///
/// Entries are never removed individually; the storage of an entry does not
/// move once interned, so `get` returns the same address for the same id
/// until the table is cleared or dropped.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    strings: IndexSet<Box<str>, RandomState>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            strings: IndexSet::with_hasher(RandomState::new()),
        }
    }

    /// Intern a string and return its SymbolId.
    /// If the string already exists, returns the existing SymbolId.
    pub fn intern(&mut self, s: &str) -> SymbolId {
        if let Some(index) = self.strings.get_index_of(s) {
            return SymbolId(index as u32);
        }
        let (index, _) = self.strings.insert_full(Box::from(s));
        SymbolId(index as u32)
    }

    /// Get the string for a SymbolId.
    /// Returns None if the id was not issued by this table.
    pub fn get(&self, id: SymbolId) -> Option<&str> {
        self.strings.get_index(id.0 as usize).map(|s| &**s)
    }

    /// Get the SymbolId for a string, without interning.
    pub fn lookup(&self, s: &str) -> Option<SymbolId> {
        self.strings.get_index_of(s).map(|index| SymbolId(index as u32))
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Drop every interned string. Ids issued before this call are dangling.
    pub fn clear(&mut self) {
        self.strings.clear();
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Reserved words, interned up front so the scanner can recognize them by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keywords {
    pub if_kw: SymbolId,
    pub for_kw: SymbolId,
    pub while_kw: SymbolId,
}

impl Keywords {
    pub fn new(table: &mut SymbolTable) -> Self {
        Self {
            if_kw: table.intern("if"),
            for_kw: table.intern("for"),
            while_kw: table.intern("while"),
        }
    }

    pub fn contains(&self, id: SymbolId) -> bool {
        id == self.if_kw || id == self.for_kw || id == self.while_kw
    }
}
