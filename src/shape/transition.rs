//! Shared shapes linked by "add property" transitions

use super::{Shape, ShapeFlags, ShapeRepr, StructureItem};
use crate::gc::{self, Traceable};
use crate::property::{PropertyDescriptor, PropertyName};
use rustc_hash::FxHashMap as HashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Clone, PartialEq, Eq, Hash)]
struct TransitionKey {
    name: PropertyName,
    descriptor: PropertyDescriptor,
}

enum TransitionEdges {
    List(Vec<(TransitionKey, Shape)>),
    Map(HashMap<TransitionKey, Shape>),
}

/// Outgoing edges of one transition shape
///
/// Owns its children: a child stays alive as long as its parent does, so
/// siblings built later find it again. Starts as a short list and moves into
/// a hash map once it holds more edges than the configured threshold.
pub(crate) struct TransitionTable {
    edges: TransitionEdges,
}

impl TransitionTable {
    pub(crate) fn new() -> Self {
        Self {
            edges: TransitionEdges::List(Vec::new()),
        }
    }

    /// The child reached by adding `(name, descriptor)`, if one was registered
    pub(crate) fn find(
        &self,
        name: &PropertyName,
        descriptor: PropertyDescriptor,
    ) -> Option<Shape> {
        match &self.edges {
            TransitionEdges::List(list) => list
                .iter()
                .find(|(key, _)| key.descriptor == descriptor && key.name == *name)
                .map(|(_, child)| child.clone()),
            TransitionEdges::Map(map) => map
                .get(&TransitionKey {
                    name: name.clone(),
                    descriptor,
                })
                .cloned(),
        }
    }

    /// Register a child
    pub(crate) fn insert(
        &mut self,
        name: PropertyName,
        descriptor: PropertyDescriptor,
        child: Shape,
        map_threshold: usize,
    ) {
        let key = TransitionKey { name, descriptor };
        match &mut self.edges {
            TransitionEdges::List(list) => {
                list.push((key, child));
                if list.len() > map_threshold {
                    let map: HashMap<_, _> = std::mem::take(list).into_iter().collect();
                    debug!(edges = map.len(), "transition table moved to hash map");
                    gc::record(|stats| stats.table_migrations += 1);
                    self.edges = TransitionEdges::Map(map);
                }
            }
            TransitionEdges::Map(map) => {
                map.insert(key, child);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        match &self.edges {
            TransitionEdges::List(list) => list.len(),
            TransitionEdges::Map(map) => map.len(),
        }
    }

    #[cfg(test)]
    fn is_map(&self) -> bool {
        matches!(self.edges, TransitionEdges::Map(_))
    }
}

impl Traceable for TransitionTable {
    fn trace(&self, tracer: &mut dyn FnMut(&Shape)) {
        match &self.edges {
            TransitionEdges::List(list) => list.iter().for_each(|(_, child)| tracer(child)),
            TransitionEdges::Map(map) => map.values().for_each(|child| tracer(child)),
        }
    }
}

/// Shape that participates in the shared transition graph
pub(crate) struct TransitionShape {
    pub(super) items: Vec<StructureItem>,
    pub(super) transitions: RefCell<TransitionTable>,
}

impl TransitionShape {
    pub(super) fn new(items: Vec<StructureItem>) -> Self {
        Self {
            items,
            transitions: RefCell::new(TransitionTable::new()),
        }
    }

    pub(super) fn find_property(&self, name: &PropertyName) -> Option<(usize, &StructureItem)> {
        self.items
            .iter()
            .enumerate()
            .find(|(_, item)| item.name == *name)
    }

    /// Follow or create the edge for `(name, descriptor)`
    ///
    /// Index-like names and shapes past the size ceiling leave the graph: the
    /// result is an unshared shape and no edge is recorded for it.
    pub(super) fn add_property(
        &self,
        shape: &Shape,
        name: PropertyName,
        descriptor: PropertyDescriptor,
    ) -> Shape {
        if let Some(child) = self.transitions.borrow().find(&name, descriptor) {
            gc::record(|stats| stats.transition_hits += 1);
            return child;
        }

        let config = shape.config();
        let next_size = self.items.len() + 1;
        let index_like = name.is_index_like();

        let item = StructureItem::new(name.clone(), descriptor);
        let flags = shape.flags() | ShapeFlags::for_item(&item);
        let mut items = Vec::with_capacity(next_size);
        items.extend_from_slice(&self.items);
        items.push(item);

        if index_like || next_size > config.transition_max_size {
            trace!(
                parent = %shape.id(),
                size = next_size,
                index_like,
                "leaving transition graph"
            );
            gc::record(|stats| stats.demotions += 1);
            return Shape::unshared(items, flags, Rc::clone(config));
        }

        let child = Shape::from_repr(
            ShapeRepr::Transition(TransitionShape::new(items)),
            flags,
            Rc::clone(config),
        );
        self.transitions.borrow_mut().insert(
            name,
            descriptor,
            child.clone(),
            config.transition_table_map_threshold,
        );
        gc::record(|stats| stats.transition_edges_added += 1);
        child
    }
}

impl Traceable for TransitionShape {
    fn trace(&self, tracer: &mut dyn FnMut(&Shape)) {
        self.transitions.borrow().trace(tracer);
    }
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

    fn root() -> Shape {
        Shape::root(Rc::new(ShapeConfig {
            transition_max_size: 4,
            index_threshold: 6,
            transition_table_map_threshold: 2,
        }))
    }

    fn table_of(shape: &Shape) -> std::cell::Ref<'_, TransitionTable> {
        match &shape.0.repr {
            ShapeRepr::Transition(transition) => transition.transitions.borrow(),
            _ => panic!("not a transition shape"),
        }
    }

    #[test]
    fn test_same_edge_same_child() {
        let root = root();
        let a = root.clone().add_property(name("a"), DW);
        let b = root.clone().add_property(name("a"), DW);
        assert!(a.ptr_eq(&b));
        assert_eq!(root.transition_count(), 1);
    }

    #[test]
    fn test_descriptor_is_part_of_the_key() {
        let root = root();
        let plain = root.clone().add_property(name("a"), DW);
        let hidden = root
            .clone()
            .add_property(name("a"), PropertyDescriptor::data(PropertyAttributes::WRITABLE));
        assert!(!plain.ptr_eq(&hidden));
        assert_eq!(root.transition_count(), 2);
    }

    #[test]
    fn test_table_migrates_to_map() {
        let root = root();
        let children: Vec<Shape> = ["a", "b", "c"]
            .iter()
            .map(|n| root.clone().add_property(name(n), DW))
            .collect();
        assert!(table_of(&root).is_map());
        assert_eq!(table_of(&root).len(), 3);

        // Edges registered before the migration are still found
        for (n, child) in ["a", "b", "c"].iter().zip(&children) {
            assert!(root.clone().add_property(name(n), DW).ptr_eq(child));
        }
        assert_eq!(root.transition_count(), 3);
    }

    #[test]
    fn test_small_table_stays_a_list() {
        let root = root();
        root.clone().add_property(name("a"), DW);
        root.clone().add_property(name("b"), DW);
        assert!(!table_of(&root).is_map());
    }

    #[test]
    fn test_index_name_registers_no_edge() {
        let root = root();
        let shape = root.clone().add_property(name("7"), DW);
        assert_eq!(shape.kind(), ShapeKind::Linear);
        assert_eq!(root.transition_count(), 0);

        let again = root.clone().add_property(name("7"), DW);
        assert!(!again.ptr_eq(&shape));
    }

    #[test]
    fn test_size_ceiling_demotes() {
        let mut shape = root();
        for n in ["a", "b", "c", "d"] {
            shape = shape.add_property(name(n), DW);
            assert_eq!(shape.kind(), ShapeKind::Transition);
        }
        let parent = shape.clone();
        let over = shape.add_property(name("e"), DW);
        assert_eq!(over.kind(), ShapeKind::Linear);
        assert_eq!(parent.transition_count(), 0);
    }

    #[test]
    fn test_remove_demotes_to_linear() {
        let shape = root()
            .add_property(name("a"), DW)
            .add_property(name("b"), DW);
        let removed = shape.remove_property(0);
        assert_eq!(removed.kind(), ShapeKind::Linear);
        assert_eq!(removed.property_count(), 1);
        assert_eq!(removed.read_property(0).name, name("b"));
    }

    #[test]
    fn test_trace_visits_children() {
        let root = root();
        let a = root.clone().add_property(name("a"), DW);
        let b = root.clone().add_property(name("b"), DW);
        let mut seen = Vec::new();
        root.trace(&mut |child| seen.push(child.id()));
        seen.sort();
        let mut expected = vec![a.id(), b.id()];
        expected.sort();
        assert_eq!(seen, expected);
    }
}
