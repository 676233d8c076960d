//! The string table backing [`Symbol`] handles.
//!
//! A flat open-addressed hash table over a vector of string entries. Each
//! entry stores its bytes together with a precomputed 64-bit hash, so a
//! probe compares hash, then length, then bytes. The slot array is sized
//! in powers of two and rehashed when `count * 5 >= capacity * 3`.
//!
//! Hashing is AHash; the table itself never locks, because a VM is
//! single-threaded by contract.

use std::hash::{BuildHasher, Hash, Hasher};

use ahash::RandomState;

use super::{kw, Symbol};

/// Initial slot count. Must be a power of two.
const INIT_SLOTS: usize = 16384;

/// Load factor numerator/denominator: grow when `count * 5 >= slots * 3`.
const MAX_LOAD_NUM: usize = 3;
const MAX_LOAD_DEN: usize = 5;

/// Sentinel for an unoccupied slot.
const EMPTY: u32 = u32::MAX;

/// One interned string: its precomputed hash and its bytes.
struct Entry {
    hash: u64,
    text: Box<str>,
}

/// The per-VM string-interning table.
///
/// # Example
///
/// ```
/// use zeta_util::Interner;
///
/// let mut interner = Interner::new();
/// let a = interner.intern("foo");
/// let b = interner.intern("foo");
/// let c = interner.intern("bar");
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(interner.resolve(a), "foo");
/// ```
pub struct Interner {
    /// Open-addressed slot array holding entry indices (EMPTY = vacant).
    slots: Vec<u32>,
    /// Entry storage; a `Symbol` is an index into this vector.
    entries: Vec<Entry>,
    /// Hasher state, fixed for the lifetime of the table so stored hashes
    /// stay valid across rehashes.
    hasher: RandomState,
}

impl Interner {
    /// Create a table with all language keywords pre-interned at the
    /// indices published in [`kw`].
    pub fn new() -> Self {
        let mut interner = Self {
            slots: vec![EMPTY; INIT_SLOTS],
            entries: Vec::new(),
            hasher: RandomState::new(),
        };
        for (idx, spelling) in kw::SPELLINGS.iter().enumerate() {
            let sym = interner.intern(spelling);
            debug_assert_eq!(sym.as_u32() as usize, idx);
        }
        interner
    }

    /// Number of distinct strings interned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been interned (never the case after `new`,
    /// which pre-interns the keywords).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes of string payload held by the table.
    pub fn bytes(&self) -> usize {
        self.entries.iter().map(|e| e.text.len()).sum()
    }

    /// Look up or insert a string, returning its canonical symbol.
    pub fn intern(&mut self, text: &str) -> Symbol {
        let hash = self.hash_str(text);
        let mask = self.slots.len() - 1;
        let mut slot = hash as usize & mask;

        loop {
            let entry_idx = self.slots[slot];
            if entry_idx == EMPTY {
                break;
            }
            let entry = &self.entries[entry_idx as usize];
            if entry.hash == hash && entry.text.len() == text.len() && &*entry.text == text {
                return Symbol(entry_idx);
            }
            slot = (slot + 1) & mask;
        }

        let entry_idx = self.entries.len() as u32;
        assert!(entry_idx != EMPTY, "string table index space exhausted");
        self.entries.push(Entry {
            hash,
            text: text.into(),
        });
        self.slots[slot] = entry_idx;

        if self.entries.len() * MAX_LOAD_DEN >= self.slots.len() * MAX_LOAD_NUM {
            self.grow();
        }

        Symbol(entry_idx)
    }

    /// Resolve a symbol back to its string.
    ///
    /// # Panics
    ///
    /// Panics if the symbol did not come from this interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.entries[sym.0 as usize].text
    }

    /// Rehash into a slot array of twice the size.
    fn grow(&mut self) {
        let new_len = self.slots.len() * 2;
        let mask = new_len - 1;
        let mut slots = vec![EMPTY; new_len];

        for (entry_idx, entry) in self.entries.iter().enumerate() {
            let mut slot = entry.hash as usize & mask;
            while slots[slot] != EMPTY {
                slot = (slot + 1) & mask;
            }
            slots[slot] = entry_idx as u32;
        }

        self.slots = slots;
    }

    fn hash_str(&self, text: &str) -> u64 {
        let mut hasher = self.hasher.build_hasher();
        text.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
