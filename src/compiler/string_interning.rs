use crate::settings::MINIMUM_STRING_TABLE_CAPACITY;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// A unique identifier for an interned string, represented as a u32 for
/// memory efficiency. Identifiers, string literals and module names all
/// resolve through the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringId(u32);

impl StringId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Compare this interned string with a string slice without allocating.
    #[inline]
    pub fn eq_str(self, table: &StringTable, other: &str) -> bool {
        table.resolve(self) == other
    }
}

impl std::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringId({})", self.0)
    }
}

/// Centralized string interner storing each unique string once.
///
/// Storage is an `Rc<str>` shared between the id-indexed vec and the
/// reverse-lookup map, so resolution is O(1) and interning an existing
/// string allocates nothing. `Rc` is sufficient because the whole pipeline
/// is single threaded.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<Rc<str>>,
    string_to_id: FxHashMap<Rc<str>, StringId>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::with_capacity(MINIMUM_STRING_TABLE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            strings: Vec::with_capacity(capacity),
            string_to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Intern a string slice, returning its unique id. Returns the existing
    /// id when the string has been seen before.
    #[inline]
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&existing_id) = self.string_to_id.get(s) {
            return existing_id;
        }

        self.intern_new(s)
    }

    #[cold]
    #[inline(never)]
    fn intern_new(&mut self, s: &str) -> StringId {
        let new_id = StringId(self.strings.len() as u32);
        let shared: Rc<str> = Rc::from(s);

        self.string_to_id.insert(Rc::clone(&shared), new_id);
        self.strings.push(shared);

        new_id
    }

    /// Resolve an interned id back to its string content.
    #[inline]
    pub fn resolve(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }

    /// Look up a string without interning it.
    #[inline]
    pub fn get_existing(&self, s: &str) -> Option<StringId> {
        self.string_to_id.get(s).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut table = StringTable::new();
        let first = table.intern("delta_x");
        let second = table.intern("delta_x");
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn resolve_round_trips() {
        let mut table = StringTable::new();
        let id = table.intern("magnitude");
        assert_eq!(table.resolve(id), "magnitude");
        assert!(id.eq_str(&table, "magnitude"));
        assert!(!id.eq_str(&table, "Magnitude"));
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut table = StringTable::new();
        let a = table.intern("a");
        let b = table.intern("b");
        assert_ne!(a, b);
        assert_eq!(table.get_existing("a"), Some(a));
        assert_eq!(table.get_existing("c"), None);
    }
}
