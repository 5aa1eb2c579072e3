use crate::compiler::ast::NodeId;
use crate::compiler::source_registry::SourceId;
use crate::compiler::string_interning::{StringId, StringTable};

/// FNV-1a, 32 bit. Not the fastest hash in existence, but plenty for
/// identifier-sized keys and trivially stable across runs (the include
/// guards reuse it for path hashing).
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811C9DC5; // offset basis
    for &byte in bytes {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x01000193); // prime
    }
    hash
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// Declared but not yet given a definition.
    Undefined,
    Variable,
    Array,
    Procedure,
    Function,
}

/// A reference to an AST node in some module's arena. Symbols never own
/// nodes, so a symbol must not outlive the parser that created its
/// defining node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub module: SourceId,
    pub node: NodeId,
}

#[derive(Debug, Clone, Copy)]
pub struct Symbol {
    pub identifier: StringId,
    pub kind: SymbolKind,
    /// Parameter count for callables, rank for arrays, 0 otherwise.
    pub arity: u32,
    pub node: NodeRef,
}

impl Symbol {
    pub fn new(identifier: StringId, kind: SymbolKind, arity: u32, node: NodeRef) -> Symbol {
        Symbol {
            identifier,
            kind,
            arity,
            node,
        }
    }
}

#[derive(Debug, Clone)]
struct TableEntry {
    key: StringId,
    hash: u32,
    symbol: Symbol,
}

const INITIAL_CAPACITY: usize = 8;
const LOAD_FACTOR: f32 = 0.75;

/// Open-addressed hash map identifier -> symbol, FNV-1a over the resolved
/// identifier bytes with linear probing, doubling once the load factor
/// crosses 0.75. Key equality is `StringId` equality, which is sound
/// because every key goes through the same interner.
#[derive(Debug)]
pub struct Symboltable {
    slots: Vec<Option<TableEntry>>,
    load: usize,
}

impl Default for Symboltable {
    fn default() -> Self {
        Self::new()
    }
}

impl Symboltable {
    pub fn new() -> Symboltable {
        Symboltable {
            slots: vec![None; INITIAL_CAPACITY],
            load: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.load
    }

    pub fn is_empty(&self) -> bool {
        self.load == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn hash_key(strings: &StringTable, key: StringId) -> u32 {
        fnv1a_32(strings.resolve(key).as_bytes())
    }

    /// Insert or overwrite. Growth happens before probing so the walk
    /// always terminates.
    pub fn insert(&mut self, strings: &StringTable, key: StringId, symbol: Symbol) {
        if (self.load + 1) as f32 > self.slots.len() as f32 * LOAD_FACTOR {
            self.resize(self.slots.len() * 2);
        }

        let hash = Self::hash_key(strings, key);
        let mut offset = hash as usize % self.slots.len();

        loop {
            match &self.slots[offset] {
                Some(entry) if entry.key != key => {
                    offset = (offset + 1) % self.slots.len();
                }
                Some(_) => {
                    self.slots[offset] = Some(TableEntry { key, hash, symbol });
                    return;
                }
                None => {
                    self.slots[offset] = Some(TableEntry { key, hash, symbol });
                    self.load += 1;
                    return;
                }
            }
        }
    }

    pub fn contains(&self, strings: &StringTable, key: StringId) -> bool {
        self.get(strings, key).is_some()
    }

    pub fn get(&self, strings: &StringTable, key: StringId) -> Option<&Symbol> {
        let hash = Self::hash_key(strings, key);
        let mut offset = hash as usize % self.slots.len();

        while let Some(entry) = &self.slots[offset] {
            if entry.key == key {
                return Some(&entry.symbol);
            }
            offset = (offset + 1) % self.slots.len();
        }

        None
    }

    pub fn get_mut(&mut self, strings: &StringTable, key: StringId) -> Option<&mut Symbol> {
        let hash = Self::hash_key(strings, key);
        let mut offset = hash as usize % self.slots.len();

        loop {
            match &self.slots[offset] {
                Some(entry) if entry.key == key => break,
                Some(_) => offset = (offset + 1) % self.slots.len(),
                None => return None,
            }
        }

        self.slots[offset].as_mut().map(|entry| &mut entry.symbol)
    }

    fn resize(&mut self, new_capacity: usize) {
        let old_slots = std::mem::replace(&mut self.slots, vec![None; new_capacity]);

        for entry in old_slots.into_iter().flatten() {
            let mut offset = entry.hash as usize % new_capacity;
            while self.slots[offset].is_some() {
                offset = (offset + 1) % new_capacity;
            }
            self.slots[offset] = Some(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_ref() -> NodeRef {
        NodeRef {
            module: node_ref_source(),
            node: NodeId::from_usize(0),
        }
    }

    fn node_ref_source() -> SourceId {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.fox");
        std::fs::write(&path, "").unwrap();
        let mut registry = crate::compiler::source_registry::SourceRegistry::new(None);
        registry.create(&path).unwrap()
    }

    #[test]
    fn fnv1a_matches_reference_vectors() {
        // Known FNV-1a 32-bit results.
        assert_eq!(fnv1a_32(b""), 0x811C9DC5);
        assert_eq!(fnv1a_32(b"a"), 0xE40C292C);
        assert_eq!(fnv1a_32(b"foobar"), 0xBF9CF968);
    }

    #[test]
    fn insert_then_lookup() {
        let mut strings = StringTable::new();
        let mut table = Symboltable::new();
        let name = strings.intern("velocity");

        table.insert(
            &strings,
            name,
            Symbol::new(name, SymbolKind::Variable, 0, node_ref()),
        );

        assert!(table.contains(&strings, name));
        let symbol = table.get(&strings, name).unwrap();
        assert_eq!(symbol.kind, SymbolKind::Variable);

        let missing = strings.intern("acceleration");
        assert!(!table.contains(&strings, missing));
    }

    #[test]
    fn reinsertion_overwrites_without_growing_load() {
        let mut strings = StringTable::new();
        let mut table = Symboltable::new();
        let name = strings.intern("f");

        table.insert(
            &strings,
            name,
            Symbol::new(name, SymbolKind::Undefined, 0, node_ref()),
        );
        table.insert(
            &strings,
            name,
            Symbol::new(name, SymbolKind::Function, 2, node_ref()),
        );

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&strings, name).unwrap().arity, 2);
    }

    #[test]
    fn table_doubles_past_the_load_factor() {
        let mut strings = StringTable::new();
        let mut table = Symboltable::new();
        let start_capacity = table.capacity();

        let reference = node_ref();
        for index in 0..64 {
            let name = strings.intern(&format!("sym_{index}"));
            table.insert(
                &strings,
                name,
                Symbol::new(name, SymbolKind::Variable, 0, reference),
            );
        }

        assert_eq!(table.len(), 64);
        assert!(table.capacity() > start_capacity);
        assert!(table.len() as f32 <= table.capacity() as f32 * 0.75);

        // Everything survives the rehash.
        for index in 0..64 {
            let name = strings.get_existing(&format!("sym_{index}")).unwrap();
            assert!(table.contains(&strings, name));
        }
    }
}
