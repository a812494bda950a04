//! Property keys and attributes
//!
//! These are the leaves of the shape graph: [`PropertyName`] identifies a
//! property, [`PropertyDescriptor`] says how it behaves. Both are small,
//! immutable, cheap to clone, and compare in O(1) for interned keys.

mod descriptor;
pub mod intern;
mod name;

pub use descriptor::{DescriptorKind, PropertyAttributes, PropertyDescriptor};
pub use intern::{intern, is_array_index, Atom, AtomTable, Symbol};
pub use name::PropertyName;
