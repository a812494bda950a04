//! String interning for property names
//!
//! Interned strings (atoms) compare by identity: interning equal text twice
//! yields handles to the same allocation. Symbols are allocated here too since
//! they are the other identity-compared kind of property key.

use rustc_hash::FxHashSet as HashSet;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// An interned string
///
/// Two atoms are equal exactly when they were produced by the same table from
/// equal text.
#[derive(Clone)]
pub struct Atom(Rc<str>);

impl Atom {
    /// The atom's text
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether both atoms point at the same interned string
    #[inline]
    pub fn ptr_eq(&self, other: &Atom) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Atom {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({:?})", &*self.0)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A table of interned strings
pub struct AtomTable {
    atoms: HashSet<Rc<str>>,
}

impl AtomTable {
    /// Create a new table pre-seeded with common property names
    pub fn new() -> Self {
        let mut table = Self::empty();

        let common_props = [
            // Object/prototype properties
            "prototype", "constructor", "__proto__", "length", "name",
            // Object methods
            "hasOwnProperty", "toString", "valueOf", "toJSON",
            // Function properties
            "call", "apply", "bind", "arguments", "caller",
            // Descriptor and iterator result fields
            "value", "done", "next", "return", "throw",
            "get", "set", "writable", "enumerable", "configurable",
            // Error fields
            "message", "stack", "cause",
            // Promise
            "then", "catch", "finally",
        ];

        for prop in common_props {
            table.intern(prop);
        }

        table
    }

    /// Create a table with nothing interned
    pub fn empty() -> Self {
        Self {
            atoms: HashSet::default(),
        }
    }

    /// Intern a string, returning its atom
    #[inline]
    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(existing) = self.atoms.get(s) {
            return Atom(existing.clone());
        }

        let atom: Rc<str> = Rc::from(s);
        self.atoms.insert(atom.clone());
        Atom(atom)
    }

    /// Get the atom for a string if it's already interned
    #[inline]
    pub fn get(&self, s: &str) -> Option<Atom> {
        self.atoms.get(s).map(|atom| Atom(atom.clone()))
    }

    /// Check if a string is interned
    #[inline]
    pub fn is_interned(&self, s: &str) -> bool {
        self.atoms.contains(s)
    }

    /// Number of interned strings
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Whether nothing has been interned
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

impl Default for AtomTable {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    /// Per-thread atom table
    static INTERNER: RefCell<AtomTable> = RefCell::new(AtomTable::new());
}

/// Intern a string using the thread's table
#[inline]
pub fn intern(s: &str) -> Atom {
    INTERNER.with(|interner| interner.borrow_mut().intern(s))
}

/// Check if a string is interned in the thread's table
#[inline]
pub fn is_interned(s: &str) -> bool {
    INTERNER.with(|interner| interner.borrow().is_interned(s))
}

struct SymbolData {
    description: Option<Rc<str>>,
}

/// A unique symbol key
///
/// Every call to [`Symbol::new`] produces a symbol distinct from all others,
/// even with the same description.
#[derive(Clone)]
pub struct Symbol(Rc<SymbolData>);

impl Symbol {
    /// Allocate a new symbol
    pub fn new(description: Option<&str>) -> Self {
        Symbol(Rc::new(SymbolData {
            description: description.map(Rc::from),
        }))
    }

    /// The symbol's description, if any
    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    /// Whether both handles refer to the same symbol
    #[inline]
    pub fn ptr_eq(&self, other: &Symbol) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Symbol {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

/// Classify a string as a canonical array index
///
/// Returns the index for `"0"`, `"1"`, … `"4294967294"`. Leading zeros, signs,
/// and the value `2^32 - 1` are not array indices.
pub fn is_array_index(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    let mut value: u64 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value * 10 + u64::from(b - b'0');
    }
    if value >= u64::from(u32::MAX) {
        return None;
    }
    Some(value as u32)
}
