//! Object shapes (hidden classes)
//!
//! A [`Shape`] describes the property layout of an object: an ordered,
//! duplicate-free list of [`StructureItem`]s where position *i* is value slot
//! *i* of every object that currently has the shape.
//!
//! ## Representations
//!
//! | Kind       | Used for                              | Lookup                 |
//! |------------|---------------------------------------|------------------------|
//! | Transition | small shapes built by adds only       | linear scan            |
//! | Linear     | medium or unshared shapes             | scan + last-hit memo   |
//! | Indexed    | large shapes                          | lazily built hash map  |
//!
//! Transition shapes are shared: adding the same `(name, descriptor)` to the
//! same transition shape always returns the same child. Once a shape leaves
//! the transition graph (too large, index-like key, removal, attribute change)
//! it never re-enters it.
//!
//! ```text
//! Transition --add--> Transition       (within limits, non-index key)
//! Transition --add--> Linear | Indexed (over limit or index key)
//! Transition --remove/replace--> Linear
//! Linear --add over threshold--> Indexed
//! Indexed --remove under threshold--> Linear
//! ```
//!
//! ## Copy-on-write
//!
//! Mutating operations consume the caller's handle. A shape is updated in
//! place only when that handle is the sole reference *and* the shape has
//! never been observed by an inline cache ([`Shape::mark_shared_by_cache`]).
//! Otherwise a new instance is built and the original is left untouched.

mod config;
mod indexed;
mod linear;
mod transition;

pub use config::{
    ShapeConfig, DEFAULT_INDEX_THRESHOLD, DEFAULT_TRANSITION_MAX_SIZE,
    DEFAULT_TRANSITION_TABLE_MAP_THRESHOLD,
};
use indexed::IndexedShape;
use linear::LinearShape;
use transition::TransitionShape;

use crate::gc::{self, Traceable};
use crate::property::{PropertyDescriptor, PropertyName};
use bitflags::bitflags;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// One property of a shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructureItem {
    pub name: PropertyName,
    pub descriptor: PropertyDescriptor,
}

impl StructureItem {
    pub fn new(name: PropertyName, descriptor: PropertyDescriptor) -> Self {
        Self { name, descriptor }
    }
}

bitflags! {
    /// Summary of a shape's items, kept so fast paths can skip a scan
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShapeFlags: u8 {
        const HAS_INDEX_LIKE_NAME = 1 << 0;
        const HAS_SYMBOL_NAME = 1 << 1;
        const HAS_NON_INTERNED_NAME = 1 << 2;
        const HAS_ENUMERABLE_PROPERTY = 1 << 3;
    }
}

impl ShapeFlags {
    /// Flags contributed by a single item
    pub fn for_item(item: &StructureItem) -> Self {
        let mut flags = ShapeFlags::empty();
        flags.set(ShapeFlags::HAS_INDEX_LIKE_NAME, item.name.is_index_like());
        flags.set(ShapeFlags::HAS_SYMBOL_NAME, item.name.is_symbol());
        flags.set(ShapeFlags::HAS_NON_INTERNED_NAME, !item.name.is_interned());
        flags.set(
            ShapeFlags::HAS_ENUMERABLE_PROPERTY,
            item.descriptor.is_enumerable(),
        );
        flags
    }

    /// Flags for a whole item list, in one pass
    pub fn for_items(items: &[StructureItem]) -> Self {
        items
            .iter()
            .fold(ShapeFlags::empty(), |flags, item| flags | Self::for_item(item))
    }
}

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a shape instance
///
/// Ids are never reused, so a cache entry naming a reclaimed shape can never
/// match a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(u64);

impl ShapeId {
    fn next() -> Self {
        ShapeId(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which representation a shape uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Transition,
    Linear,
    Indexed,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Transition => write!(f, "transition"),
            ShapeKind::Linear => write!(f, "linear"),
            ShapeKind::Indexed => write!(f, "indexed"),
        }
    }
}

enum ShapeRepr {
    Transition(TransitionShape),
    Linear(LinearShape),
    Indexed(IndexedShape),
}

struct ShapeNode {
    id: ShapeId,
    flags: ShapeFlags,
    /// Sticky: once set, never cleared
    shared_by_cache: Cell<bool>,
    config: Rc<ShapeConfig>,
    repr: ShapeRepr,
}

/// Handle to a shape
///
/// Cloning a handle is cheap and yields the same instance. Equality is
/// instance identity, which is what inline caches validate against.
#[derive(Clone)]
pub struct Shape(Rc<ShapeNode>);

thread_local! {
    static EMPTY_ROOT: Shape = Shape::from_repr(
        ShapeRepr::Transition(TransitionShape::new(Vec::new())),
        ShapeFlags::empty(),
        ShapeConfig::shared_default(),
    );
}

impl Shape {
    /// The thread's shared empty root
    ///
    /// Every call returns the same transition shape, so objects started from
    /// it share the transition graph hanging off it.
    pub fn empty() -> Shape {
        EMPTY_ROOT.with(Shape::clone)
    }

    /// A fresh empty root using `config`
    ///
    /// `config` must pass [`ShapeConfig::validate`]; debug builds check it.
    pub fn root(config: Rc<ShapeConfig>) -> Shape {
        Self::create_with_config(Vec::new(), config)
    }

    /// Shape for a pre-built item list, using the default configuration
    ///
    /// An empty list yields [`Shape::empty`], so objects created through here
    /// share one transition graph.
    pub fn create(items: Vec<StructureItem>) -> Shape {
        if items.is_empty() {
            return Self::empty();
        }
        Self::create_with_config(items, ShapeConfig::shared_default())
    }

    /// Shape for a pre-built item list
    ///
    /// Lists that fit the transition graph become a transition shape with no
    /// parent edge. Lists that are too large or hold an index-like key get the
    /// representation `add_property` would have reached for them. Every call
    /// builds a new instance, even for an empty list.
    ///
    /// `config` must pass [`ShapeConfig::validate`]; debug builds check it.
    pub fn create_with_config(items: Vec<StructureItem>, config: Rc<ShapeConfig>) -> Shape {
        debug_assert!(config.validate().is_ok(), "invalid shape config {:?}", config);
        debug_assert!(has_unique_names(&items), "duplicate property in shape items");
        let flags = ShapeFlags::for_items(&items);
        if flags.contains(ShapeFlags::HAS_INDEX_LIKE_NAME)
            || items.len() > config.transition_max_size
        {
            return Self::unshared(items, flags, config);
        }
        Self::from_repr(
            ShapeRepr::Transition(TransitionShape::new(items)),
            flags,
            config,
        )
    }

    fn from_repr(repr: ShapeRepr, flags: ShapeFlags, config: Rc<ShapeConfig>) -> Shape {
        let shape = Shape(Rc::new(ShapeNode {
            id: ShapeId::next(),
            flags,
            shared_by_cache: Cell::new(false),
            config,
            repr,
        }));
        gc::record_allocation(shape.kind());
        shape
    }

    /// Linear or indexed shape for `items`, chosen by size
    fn unshared(items: Vec<StructureItem>, flags: ShapeFlags, config: Rc<ShapeConfig>) -> Shape {
        if items.len() > config.index_threshold {
            Self::from_repr(ShapeRepr::Indexed(IndexedShape::new(items)), flags, config)
        } else {
            Self::from_repr(ShapeRepr::Linear(LinearShape::new(items)), flags, config)
        }
    }

    /// Mutable access to the node, if this handle may be updated in place
    fn try_unique(&mut self) -> Option<&mut ShapeNode> {
        if self.0.shared_by_cache.get() {
            return None;
        }
        Rc::get_mut(&mut self.0)
    }

    /// The item list, moved out when unique and cloned otherwise
    fn into_items(mut self) -> Vec<StructureItem> {
        if let Some(node) = self.try_unique() {
            return match &mut node.repr {
                ShapeRepr::Transition(transition) => std::mem::take(&mut transition.items),
                ShapeRepr::Linear(linear) => std::mem::take(&mut linear.items),
                ShapeRepr::Indexed(indexed) => std::mem::take(&mut indexed.items),
            };
        }
        self.items().to_vec()
    }

    #[inline]
    pub fn id(&self) -> ShapeId {
        self.0.id
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match &self.0.repr {
            ShapeRepr::Transition(_) => ShapeKind::Transition,
            ShapeRepr::Linear(_) => ShapeKind::Linear,
            ShapeRepr::Indexed(_) => ShapeKind::Indexed,
        }
    }

    /// Configuration inherited from the root this shape was derived from
    pub fn config(&self) -> &Rc<ShapeConfig> {
        &self.0.config
    }

    #[inline]
    pub fn flags(&self) -> ShapeFlags {
        self.0.flags
    }

    #[inline]
    pub fn has_index_like_name(&self) -> bool {
        self.0.flags.contains(ShapeFlags::HAS_INDEX_LIKE_NAME)
    }

    #[inline]
    pub fn has_symbol_name(&self) -> bool {
        self.0.flags.contains(ShapeFlags::HAS_SYMBOL_NAME)
    }

    #[inline]
    pub fn has_non_interned_name(&self) -> bool {
        self.0.flags.contains(ShapeFlags::HAS_NON_INTERNED_NAME)
    }

    #[inline]
    pub fn has_enumerable_property(&self) -> bool {
        self.0.flags.contains(ShapeFlags::HAS_ENUMERABLE_PROPERTY)
    }

    /// Whether an inline cache has ever recorded this shape
    #[inline]
    pub fn is_shared_by_cache(&self) -> bool {
        self.0.shared_by_cache.get()
    }

    /// Record that an inline cache holds this shape's identity
    ///
    /// From now on no operation mutates this instance in place.
    #[inline]
    pub fn mark_shared_by_cache(&self) {
        self.0.shared_by_cache.set(true);
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Shape) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether this is a transition shape
    #[inline]
    pub fn in_transition_mode(&self) -> bool {
        matches!(self.0.repr, ShapeRepr::Transition(_))
    }

    /// Items in slot order
    #[inline]
    pub fn items(&self) -> &[StructureItem] {
        match &self.0.repr {
            ShapeRepr::Transition(transition) => &transition.items,
            ShapeRepr::Linear(linear) => &linear.items,
            ShapeRepr::Indexed(indexed) => &indexed.items,
        }
    }

    #[inline]
    pub fn property_count(&self) -> usize {
        self.items().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Number of outgoing transition edges (zero for non-transition shapes)
    pub fn transition_count(&self) -> usize {
        match &self.0.repr {
            ShapeRepr::Transition(transition) => transition.transitions.borrow().len(),
            _ => 0,
        }
    }

    /// Look up a property by name
    #[inline]
    pub fn find_property(&self, name: &PropertyName) -> Option<(usize, &StructureItem)> {
        match &self.0.repr {
            ShapeRepr::Transition(transition) => transition.find_property(name),
            ShapeRepr::Linear(linear) => linear.find_property(name),
            ShapeRepr::Indexed(indexed) => indexed.find_property(name),
        }
    }

    /// The item at `slot`
    ///
    /// `slot` must come from [`Shape::find_property`] or be below
    /// [`Shape::property_count`].
    #[inline]
    pub fn read_property(&self, slot: usize) -> &StructureItem {
        debug_assert!(
            slot < self.property_count(),
            "slot {} out of range for shape with {} properties",
            slot,
            self.property_count()
        );
        &self.items()[slot]
    }

    /// Append a property
    ///
    /// `name` must not already be present; callers check with
    /// [`Shape::find_property`] first.
    pub fn add_property(self, name: PropertyName, descriptor: PropertyDescriptor) -> Shape {
        debug_assert!(
            self.items().iter().all(|item| item.name != name),
            "property {:?} already present",
            name
        );
        if let ShapeRepr::Transition(transition) = &self.0.repr {
            return transition.add_property(&self, name, descriptor);
        }
        match self.kind() {
            ShapeKind::Linear => LinearShape::add_property(self, name, descriptor),
            _ => IndexedShape::add_property(self, name, descriptor),
        }
    }

    /// Delete the property at `slot`, keeping the order of the rest
    pub fn remove_property(self, slot: usize) -> Shape {
        debug_assert!(slot < self.property_count(), "slot {} out of range", slot);
        match self.kind() {
            ShapeKind::Transition | ShapeKind::Linear => {
                self.record_leaving_transition_graph();
                let items = without_slot(self.items(), slot);
                LinearShape::build(items, Rc::clone(self.config()))
            }
            ShapeKind::Indexed => IndexedShape::remove_property(self, slot),
        }
    }

    /// Swap the descriptor of the property at `slot`
    pub fn replace_property_descriptor(
        self,
        slot: usize,
        descriptor: PropertyDescriptor,
    ) -> Shape {
        debug_assert!(slot < self.property_count(), "slot {} out of range", slot);
        match self.kind() {
            ShapeKind::Transition | ShapeKind::Linear => {
                self.record_leaving_transition_graph();
                let mut items = self.items().to_vec();
                items[slot].descriptor = descriptor;
                LinearShape::build(items, Rc::clone(self.config()))
            }
            ShapeKind::Indexed => {
                IndexedShape::replace_property_descriptor(self, slot, descriptor)
            }
        }
    }

    /// Leave the transition graph
    ///
    /// For objects that will never share a layout with a sibling (prototypes,
    /// dictionaries). Non-transition shapes are returned as is.
    pub fn convert_to_non_transition_shape(self) -> Shape {
        if !self.in_transition_mode() {
            return self;
        }
        let config = Rc::clone(self.config());
        let flags = self.flags();
        self.record_leaving_transition_graph();
        Self::unshared(self.into_items(), flags, config)
    }

    fn record_leaving_transition_graph(&self) {
        if self.in_transition_mode() {
            tracing::trace!(shape = %self.id(), "leaving transition graph");
            gc::record(|stats| stats.demotions += 1);
        }
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Shape {}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field(
                "names",
                &self.items().iter().map(|item| &item.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Traceable for Shape {
    fn trace(&self, tracer: &mut dyn FnMut(&Shape)) {
        match &self.0.repr {
            ShapeRepr::Transition(transition) => transition.trace(tracer),
            ShapeRepr::Linear(linear) => linear.trace(tracer),
            ShapeRepr::Indexed(indexed) => indexed.trace(tracer),
        }
    }
}

fn without_slot(items: &[StructureItem], slot: usize) -> Vec<StructureItem> {
    let mut remaining = Vec::with_capacity(items.len().saturating_sub(1));
    remaining.extend_from_slice(&items[..slot]);
    remaining.extend_from_slice(&items[slot + 1..]);
    remaining
}

fn has_unique_names(items: &[StructureItem]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(i, item)| items[..i].iter().all(|earlier| earlier.name != item.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PropertyAttributes, Symbol};

    const DW: PropertyDescriptor = PropertyDescriptor::DEFAULT_DATA;

    fn name(s: &str) -> PropertyName {
        PropertyName::from_str(s)
    }

    fn small_config() -> Rc<ShapeConfig> {
        Rc::new(ShapeConfig {
            transition_max_size: 3,
            index_threshold: 5,
            transition_table_map_threshold: 2,
        })
    }

    #[test]
    fn test_empty_root_is_shared() {
        assert!(Shape::empty().ptr_eq(&Shape::empty()));
        assert_eq!(Shape::empty().property_count(), 0);
        assert_eq!(Shape::empty().kind(), ShapeKind::Transition);
    }

    #[test]
    fn test_create_computes_flags() {
        let shape = Shape::create(vec![
            StructureItem::new(name("a"), DW),
            StructureItem::new(PropertyName::from(Symbol::new(None)), DW),
            StructureItem::new(
                PropertyName::non_interned("b"),
                PropertyDescriptor::data(PropertyAttributes::empty()),
            ),
        ]);
        assert_eq!(shape.kind(), ShapeKind::Transition);
        assert!(shape.has_symbol_name());
        assert!(shape.has_non_interned_name());
        assert!(shape.has_enumerable_property());
        assert!(!shape.has_index_like_name());
    }

    #[test]
    fn test_create_with_index_name_is_not_transition() {
        let shape = Shape::create(vec![StructureItem::new(name("0"), DW)]);
        assert_eq!(shape.kind(), ShapeKind::Linear);
        assert!(shape.has_index_like_name());
    }

    #[test]
    fn test_create_oversized_picks_by_size() {
        let config = small_config();
        let items = |n: usize| {
            (0..n)
                .map(|i| StructureItem::new(name(&format!("c{}", i)), DW))
                .collect::<Vec<_>>()
        };
        let kind_of = |n: usize| Shape::create_with_config(items(n), config.clone()).kind();
        assert_eq!(kind_of(3), ShapeKind::Transition);
        assert_eq!(kind_of(4), ShapeKind::Linear);
        assert_eq!(kind_of(6), ShapeKind::Indexed);
    }

    #[test]
    fn test_create_empty_is_the_shared_root() {
        assert!(Shape::create(Vec::new()).ptr_eq(&Shape::empty()));
        let config = ShapeConfig::shared_default();
        let fresh = Shape::create_with_config(Vec::new(), config);
        assert!(!fresh.ptr_eq(&Shape::empty()));
    }

    #[test]
    #[should_panic(expected = "invalid shape config")]
    #[cfg(debug_assertions)]
    fn test_invalid_config_panics() {
        Shape::root(Rc::new(ShapeConfig {
            transition_max_size: 10,
            index_threshold: 5,
            transition_table_map_threshold: 2,
        }));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Shape::root(small_config());
        let b = Shape::root(small_config());
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_convert_to_non_transition() {
        let shape = Shape::root(small_config()).add_property(name("p"), DW);
        assert!(shape.in_transition_mode());
        let converted = shape.clone().convert_to_non_transition_shape();
        assert_eq!(converted.kind(), ShapeKind::Linear);
        assert_eq!(converted.items(), shape.items());

        let again = converted.clone().convert_to_non_transition_shape();
        assert!(again.ptr_eq(&converted));
    }

    #[test]
    fn test_replace_descriptor_leaves_transition_graph() {
        let shape = Shape::root(small_config()).add_property(name("q"), DW);
        let frozen = PropertyDescriptor::data(PropertyAttributes::empty());
        let replaced = shape.clone().replace_property_descriptor(0, frozen);
        assert_eq!(replaced.kind(), ShapeKind::Linear);
        assert_eq!(replaced.read_property(0).descriptor, frozen);
        assert!(!replaced.has_enumerable_property());
        assert_eq!(shape.read_property(0).descriptor, DW);
    }

    #[test]
    fn test_without_slot() {
        let items: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|s| StructureItem::new(name(s), DW))
            .collect();
        let rest = without_slot(&items, 1);
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].name, name("a"));
        assert_eq!(rest[1].name, name("c"));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    #[cfg(debug_assertions)]
    fn test_read_out_of_range_panics() {
        let shape = Shape::root(small_config());
        shape.read_property(0);
    }

    #[test]
    #[should_panic(expected = "already present")]
    #[cfg(debug_assertions)]
    fn test_duplicate_add_panics() {
        let shape = Shape::root(small_config()).add_property(name("dup"), DW);
        let _ = shape.add_property(name("dup"), DW);
    }
}
