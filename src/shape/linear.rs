//! Array-backed shapes with a last-hit memo

use super::{Shape, ShapeConfig, ShapeFlags, ShapeRepr, StructureItem};
use crate::gc::{self, Traceable};
use crate::property::{PropertyDescriptor, PropertyName};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// Unshared shape searched by linear scan
///
/// Property access tends to repeat the same key back to back (a read followed
/// by a write), so the slot of the last successful lookup is checked first.
pub(crate) struct LinearShape {
    pub(super) items: Vec<StructureItem>,
    last_found: Cell<Option<usize>>,
}

impl LinearShape {
    pub(super) fn new(items: Vec<StructureItem>) -> Self {
        Self {
            items,
            last_found: Cell::new(None),
        }
    }

    /// Fresh linear shape for `items`
    pub(super) fn build(items: Vec<StructureItem>, config: Rc<ShapeConfig>) -> Shape {
        let flags = ShapeFlags::for_items(&items);
        Shape::from_repr(ShapeRepr::Linear(LinearShape::new(items)), flags, config)
    }

    pub(super) fn find_property(&self, name: &PropertyName) -> Option<(usize, &StructureItem)> {
        if let Some(slot) = self.last_found.get() {
            if let Some(item) = self.items.get(slot) {
                if item.name == *name {
                    return Some((slot, item));
                }
            }
        }

        let slot = self.items.iter().position(|item| item.name == *name)?;
        self.last_found.set(Some(slot));
        Some((slot, &self.items[slot]))
    }

    pub(super) fn add_property(
        mut shape: Shape,
        name: PropertyName,
        descriptor: PropertyDescriptor,
    ) -> Shape {
        let item = StructureItem::new(name, descriptor);
        let flags = shape.flags() | ShapeFlags::for_item(&item);
        let config = Rc::clone(shape.config());

        if shape.property_count() + 1 > config.index_threshold {
            let mut items = shape.into_items();
            items.push(item);
            debug!(count = items.len(), "promoting linear shape to indexed");
            gc::record(|stats| stats.promotions += 1);
            return Shape::unshared(items, flags, config);
        }

        if let Some(node) = shape.try_unique() {
            node.flags = flags;
            if let ShapeRepr::Linear(linear) = &mut node.repr {
                // Existing slots keep their numbers, so the memo stays valid
                linear.items.push(item);
            }
            gc::record(|stats| stats.in_place_updates += 1);
            return shape;
        }

        let mut items = Vec::with_capacity(shape.property_count() + 1);
        items.extend_from_slice(shape.items());
        items.push(item);
        Shape::from_repr(ShapeRepr::Linear(LinearShape::new(items)), flags, config)
    }
}

impl Traceable for LinearShape {
    fn trace(&self, _tracer: &mut dyn FnMut(&Shape)) {}
}
