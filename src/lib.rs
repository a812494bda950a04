//! Quicksilver Shape: the property-layout engine of the Quicksilver runtime
//!
//! Every object's own properties are described by a [`Shape`] (a "hidden
//! class"): an ordered list of property names and attributes where position
//! *i* names value slot *i* of the object. Objects built the same way share
//! the same shape instance, which is what lets inline caches turn a property
//! lookup into an identity check plus an array index.
//!
//! # Quick Start
//!
//! ```
//! use quicksilver_shape::{PropertyName, Shape, ShapedObject};
//!
//! let mut a: ShapedObject<f64> = ShapedObject::new(Shape::empty());
//! let mut b: ShapedObject<f64> = ShapedObject::new(Shape::empty());
//! for obj in [&mut a, &mut b] {
//!     obj.set(PropertyName::from("x"), 1.0);
//!     obj.set(PropertyName::from("y"), 2.0);
//! }
//! assert!(a.shape().ptr_eq(b.shape()));
//! ```
//!
//! # Module Overview
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Keys** | [`property`] |
//! | **Layout** | [`shape`], [`object`] |
//! | **Access** | [`cache`] |
//! | **Diagnostics** | [`gc`], [`error`](Error) |
#![allow(clippy::should_implement_trait)]

pub mod cache;
pub mod gc;
pub mod object;
pub mod prelude;
pub mod property;
pub mod shape;

mod error;

pub use cache::{CacheStats, PropertyCache};
pub use error::{messages, ConfigField, Error, Result};
pub use gc::{ShapeCensus, ShapeStats, Traceable};
pub use object::ShapedObject;
pub use property::{PropertyAttributes, PropertyDescriptor, PropertyName};
pub use shape::{Shape, ShapeConfig, ShapeId, ShapeKind, StructureItem};

/// Quicksilver Shape version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
