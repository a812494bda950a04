//! Prelude module for convenient imports
//!
//! ```
//! use quicksilver_shape::prelude::*;
//!
//! let x = PropertyName::from("x");
//! let shape = Shape::empty().add_property(x, PropertyDescriptor::DEFAULT_DATA);
//! assert_eq!(shape.property_count(), 1);
//! ```

// Keys and attributes
pub use crate::property::{
    DescriptorKind, PropertyAttributes, PropertyDescriptor, PropertyName, Symbol,
};

// Shapes
pub use crate::shape::{Shape, ShapeConfig, ShapeFlags, ShapeId, ShapeKind, StructureItem};

// Objects and caching
pub use crate::cache::{CacheStats, PropertyCache};
pub use crate::object::ShapedObject;

// Diagnostics
pub use crate::gc::{ShapeCensus, ShapeStats, Traceable};

// Error handling
pub use crate::error::{Error, Result};
