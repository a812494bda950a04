//! Large shapes with a hashed name index

use super::{without_slot, LinearShape, Shape, ShapeFlags, ShapeRepr, StructureItem};
use crate::gc::{self, Traceable};
use crate::property::{PropertyDescriptor, PropertyName};
use rustc_hash::FxHashMap as HashMap;
use std::cell::OnceCell;
use std::rc::Rc;
use tracing::debug;

/// Name to slot map for one indexed shape
pub(crate) struct NameIndex {
    slots: HashMap<PropertyName, usize>,
}

impl NameIndex {
    fn build(items: &[StructureItem]) -> Self {
        let mut slots = HashMap::with_capacity_and_hasher(items.len(), Default::default());
        for (slot, item) in items.iter().enumerate() {
            slots.insert(item.name.clone(), slot);
        }
        Self { slots }
    }

    #[inline]
    fn get(&self, name: &PropertyName) -> Option<usize> {
        self.slots.get(name).copied()
    }

    fn insert(&mut self, name: PropertyName, slot: usize) {
        self.slots.insert(name, slot);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Unshared shape with a hash index for lookups
///
/// The index is built on the first lookup rather than at construction: many
/// large shapes are only ever appended to and then enumerated.
pub(crate) struct IndexedShape {
    pub(super) items: Vec<StructureItem>,
    index: OnceCell<NameIndex>,
}

impl IndexedShape {
    pub(super) fn new(items: Vec<StructureItem>) -> Self {
        Self {
            items,
            index: OnceCell::new(),
        }
    }

    fn build(items: Vec<StructureItem>, flags: ShapeFlags, shape: &Shape) -> Shape {
        Shape::from_repr(
            ShapeRepr::Indexed(IndexedShape::new(items)),
            flags,
            Rc::clone(shape.config()),
        )
    }

    pub(super) fn find_property(&self, name: &PropertyName) -> Option<(usize, &StructureItem)> {
        let index = self.index.get_or_init(|| NameIndex::build(&self.items));
        let slot = index.get(name)?;
        Some((slot, &self.items[slot]))
    }

    pub(super) fn add_property(
        mut shape: Shape,
        name: PropertyName,
        descriptor: PropertyDescriptor,
    ) -> Shape {
        let item = StructureItem::new(name, descriptor);
        let flags = shape.flags() | ShapeFlags::for_item(&item);

        if let Some(node) = shape.try_unique() {
            node.flags = flags;
            if let ShapeRepr::Indexed(indexed) = &mut node.repr {
                let slot = indexed.items.len();
                if let Some(index) = indexed.index.get_mut() {
                    index.insert(item.name.clone(), slot);
                }
                indexed.items.push(item);
            }
            gc::record(|stats| stats.in_place_updates += 1);
            return shape;
        }

        let mut items = Vec::with_capacity(shape.property_count() + 1);
        items.extend_from_slice(shape.items());
        items.push(item);
        Self::build(items, flags, &shape)
    }

    pub(super) fn remove_property(mut shape: Shape, slot: usize) -> Shape {
        let remaining = shape.property_count() - 1;

        if remaining <= shape.config().index_threshold {
            let config = Rc::clone(shape.config());
            let mut items = shape.into_items();
            items.remove(slot);
            debug!(count = remaining, "demoting indexed shape to linear");
            gc::record(|stats| stats.demotions += 1);
            return LinearShape::build(items, config);
        }

        if let Some(node) = shape.try_unique() {
            if let ShapeRepr::Indexed(indexed) = &mut node.repr {
                indexed.items.remove(slot);
                // Every later slot shifted; rebuild on the next lookup
                indexed.index.take();
                node.flags = ShapeFlags::for_items(&indexed.items);
            }
            gc::record(|stats| stats.in_place_updates += 1);
            return shape;
        }

        let items = without_slot(shape.items(), slot);
        let flags = ShapeFlags::for_items(&items);
        Self::build(items, flags, &shape)
    }

    pub(super) fn replace_property_descriptor(
        mut shape: Shape,
        slot: usize,
        descriptor: PropertyDescriptor,
    ) -> Shape {
        if let Some(node) = shape.try_unique() {
            if let ShapeRepr::Indexed(indexed) = &mut node.repr {
                indexed.items[slot].descriptor = descriptor;
                node.flags = ShapeFlags::for_items(&indexed.items);
            }
            gc::record(|stats| stats.in_place_updates += 1);
            return shape;
        }

        let mut items = shape.items().to_vec();
        items[slot].descriptor = descriptor;
        let flags = ShapeFlags::for_items(&items);
        Self::build(items, flags, &shape)
    }
}

impl Traceable for IndexedShape {
    fn trace(&self, tracer: &mut dyn FnMut(&Shape)) {
        if let Some(index) = self.index.get() {
            index.trace(tracer);
        }
    }
}

impl Traceable for NameIndex {
    fn trace(&self, _tracer: &mut dyn FnMut(&Shape)) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyAttributes;
    use crate::shape::{ShapeConfig, ShapeKind};

    const DW: PropertyDescriptor = PropertyDescriptor::DEFAULT_DATA;

    fn name(s: &str) -> PropertyName {
        PropertyName::from_str(s)
    }

    fn config() -> Rc<ShapeConfig> {
        Rc::new(ShapeConfig {
            transition_max_size: 2,
            index_threshold: 4,
            transition_table_map_threshold: 2,
        })
    }

    fn indexed_with(count: usize) -> Shape {
        let items = (0..count)
            .map(|i| StructureItem::new(name(&format!("k{}", i)), DW))
            .collect();
        let shape = Shape::create_with_config(items, config());
        assert_eq!(shape.kind(), ShapeKind::Indexed);
        shape
    }

    fn index_state(shape: &Shape) -> Option<usize> {
        match &shape.0.repr {
            ShapeRepr::Indexed(indexed) => indexed.index.get().map(NameIndex::len),
            _ => None,
        }
    }

    #[test]
    fn test_index_built_lazily() {
        let shape = indexed_with(6);
        assert_eq!(index_state(&shape), None);

        let (slot, item) = shape.find_property(&name("k4")).unwrap();
        assert_eq!(slot, 4);
        assert_eq!(item.name, name("k4"));
        assert_eq!(index_state(&shape), Some(6));
        assert!(shape.find_property(&name("missing")).is_none());
    }

    #[test]
    fn test_in_place_add_updates_built_index() {
        let shape = indexed_with(5);
        shape.find_property(&name("k0"));
        let id = shape.id();

        let grown = shape.add_property(name("extra"), DW);
        assert_eq!(grown.id(), id);
        assert_eq!(index_state(&grown), Some(6));
        assert_eq!(grown.find_property(&name("extra")).unwrap().0, 5);
    }

    #[test]
    fn test_copy_does_not_carry_index() {
        let shape = indexed_with(5);
        shape.find_property(&name("k0"));
        let alias = shape.clone();

        let grown = shape.add_property(name("extra"), DW);
        assert_ne!(grown.id(), alias.id());
        assert_eq!(index_state(&grown), None);
        assert_eq!(alias.property_count(), 5);
        assert!(alias.find_property(&name("extra")).is_none());
    }

    #[test]
    fn test_remove_above_threshold_stays_indexed() {
        let shape = indexed_with(6);
        shape.find_property(&name("k5"));
        let smaller = shape.remove_property(1);
        assert_eq!(smaller.kind(), ShapeKind::Indexed);
        assert_eq!(index_state(&smaller), None);
        assert_eq!(smaller.find_property(&name("k5")).unwrap().0, 4);
        assert!(smaller.find_property(&name("k1")).is_none());
    }

    #[test]
    fn test_remove_to_threshold_demotes() {
        let shape = indexed_with(5);
        let smaller = shape.remove_property(0);
        assert_eq!(smaller.kind(), ShapeKind::Linear);
        assert_eq!(smaller.property_count(), 4);
        assert_eq!(smaller.read_property(0).name, name("k1"));
    }

    #[test]
    fn test_replace_descriptor_recomputes_flags() {
        let items = (0..5)
            .map(|i| {
                StructureItem::new(
                    name(&format!("h{}", i)),
                    PropertyDescriptor::data(PropertyAttributes::WRITABLE),
                )
            })
            .collect();
        let shape = Shape::create_with_config(items, config());
        assert!(!shape.has_enumerable_property());

        let replaced = shape.replace_property_descriptor(2, DW);
        assert!(replaced.has_enumerable_property());
        assert_eq!(replaced.read_property(2).descriptor, DW);
    }

    #[test]
    fn test_shared_replace_leaves_original() {
        let shape = indexed_with(5);
        shape.mark_shared_by_cache();
        let keep = shape.clone();
        let frozen = PropertyDescriptor::data(PropertyAttributes::empty());

        let replaced = shape.replace_property_descriptor(0, frozen);
        assert_ne!(replaced.id(), keep.id());
        assert_eq!(keep.read_property(0).descriptor, DW);
        assert_eq!(replaced.read_property(0).descriptor, frozen);
    }
}
