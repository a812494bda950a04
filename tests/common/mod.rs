//! Shared test helpers for integration tests

use quicksilver_shape::{PropertyDescriptor, PropertyName, Shape, ShapeConfig, StructureItem};
use std::rc::Rc;

/// Writable, enumerable, configurable data descriptor
#[allow(dead_code)]
pub const DW: PropertyDescriptor = PropertyDescriptor::DEFAULT_DATA;

/// Property key for `s`, canonicalized the way the runtime does
pub fn name(s: &str) -> PropertyName {
    PropertyName::from(s)
}

/// Item list for `names`, all with the default data descriptor
#[allow(dead_code)]
pub fn items(names: &[&str]) -> Vec<StructureItem> {
    names.iter().map(|n| StructureItem::new(name(n), DW)).collect()
}

/// Names of a shape's items, in slot order, as display strings
#[allow(dead_code)]
pub fn names_of(shape: &Shape) -> Vec<String> {
    shape.items().iter().map(|item| item.name.to_string()).collect()
}

/// Add each of `names` to `shape` in turn
#[allow(dead_code)]
pub fn add_all(shape: Shape, names: &[&str]) -> Shape {
    names
        .iter()
        .fold(shape, |shape, n| shape.add_property(name(n), DW))
}

/// Fresh root with small limits so tests can cross every threshold
#[allow(dead_code)]
pub fn small_root() -> Shape {
    Shape::root(Rc::new(ShapeConfig {
        transition_max_size: 4,
        index_threshold: 8,
        transition_table_map_threshold: 2,
    }))
}
