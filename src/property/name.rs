//! Canonical property keys

use super::intern::{intern, is_array_index, Atom, Symbol};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A property key
///
/// Construction from text canonicalizes array-index strings into
/// [`PropertyName::Index`], so `"0"` and `0` are the same key and only one
/// representation of it can ever reach a shape.
#[derive(Clone)]
pub enum PropertyName {
    /// Interned string, compared by identity before text
    Atom(Atom),
    /// Array index in `0..u32::MAX`
    Index(u32),
    /// Symbol, compared by identity
    Symbol(Symbol),
    /// String that was never interned, compared by content
    String(Rc<str>),
}

impl PropertyName {
    /// Key for `s`, interning it unless it is an array index
    pub fn from_str(s: &str) -> Self {
        match is_array_index(s) {
            Some(index) => PropertyName::Index(index),
            None => PropertyName::Atom(intern(s)),
        }
    }

    /// Key for `s` without interning it
    pub fn non_interned(s: &str) -> Self {
        match is_array_index(s) {
            Some(index) => PropertyName::Index(index),
            None => PropertyName::String(Rc::from(s)),
        }
    }

    /// Key for an integer
    ///
    /// `u32::MAX` is not an array index and becomes a string key.
    pub fn from_index(index: u32) -> Self {
        if index == u32::MAX {
            PropertyName::Atom(intern(&index.to_string()))
        } else {
            PropertyName::Index(index)
        }
    }

    /// Whether the key is an array index
    #[inline]
    pub fn is_index_like(&self) -> bool {
        matches!(self, PropertyName::Index(_))
    }

    #[inline]
    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyName::Symbol(_))
    }

    /// Whether the key compares by identity or value without touching text
    #[inline]
    pub fn is_interned(&self) -> bool {
        !matches!(self, PropertyName::String(_))
    }

    /// The index, for index keys
    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyName::Index(index) => Some(*index),
            _ => None,
        }
    }

    /// The text, for string keys
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyName::Atom(atom) => Some(atom.as_str()),
            PropertyName::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for PropertyName {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Atoms from different tables still compare by text
            (PropertyName::Atom(a), PropertyName::Atom(b)) => {
                a.ptr_eq(b) || a.as_str() == b.as_str()
            }
            (PropertyName::Index(a), PropertyName::Index(b)) => a == b,
            (PropertyName::Symbol(a), PropertyName::Symbol(b)) => a.ptr_eq(b),
            // At least one side is not interned, compare text
            (PropertyName::Atom(a), PropertyName::String(b)) => a.as_str() == &**b,
            (PropertyName::String(a), PropertyName::Atom(b)) => &**a == b.as_str(),
            (PropertyName::String(a), PropertyName::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PropertyName {}

impl Hash for PropertyName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Atoms and plain strings hash alike since they can compare equal
        match self {
            PropertyName::Atom(atom) => {
                0u8.hash(state);
                atom.as_str().hash(state);
            }
            PropertyName::String(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            PropertyName::Index(index) => {
                1u8.hash(state);
                index.hash(state);
            }
            PropertyName::Symbol(symbol) => {
                2u8.hash(state);
                symbol.hash(state);
            }
        }
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyName::Atom(atom) => write!(f, "{}", atom),
            PropertyName::Index(index) => write!(f, "{}", index),
            PropertyName::Symbol(symbol) => write!(f, "{}", symbol),
            PropertyName::String(s) => f.write_str(s),
        }
    }
}

impl fmt::Debug for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyName::Atom(atom) => write!(f, "{:?}", atom.as_str()),
            PropertyName::Index(index) => write!(f, "{}", index),
            PropertyName::Symbol(symbol) => write!(f, "{}", symbol),
            PropertyName::String(s) => write!(f, "String({:?})", &**s),
        }
    }
}

impl From<&str> for PropertyName {
    fn from(s: &str) -> Self {
        PropertyName::from_str(s)
    }
}

impl From<u32> for PropertyName {
    fn from(index: u32) -> Self {
        PropertyName::from_index(index)
    }
}

impl From<Atom> for PropertyName {
    fn from(atom: Atom) -> Self {
        match is_array_index(atom.as_str()) {
            Some(index) => PropertyName::Index(index),
            None => PropertyName::Atom(atom),
        }
    }
}

impl From<Symbol> for PropertyName {
    fn from(symbol: Symbol) -> Self {
        PropertyName::Symbol(symbol)
    }
}
