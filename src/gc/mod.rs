//! Shape graph tracing and allocation statistics
//!
//! Shapes are reference counted: a shape lives as long as an object, a cache
//! or a parent's transition table holds it. Transition tables only point from
//! parent to child, so the graph is acyclic and `Rc` reclaims it without a
//! collector.
//!
//! ## Design
//!
//! What this module adds on top of reference counting is visibility:
//! - **Tracing**: every shape reports the shapes it keeps alive through
//!   [`Traceable`], which lets [`ShapeCensus`] walk the graph from a set of roots
//! - **Statistics**: the shape engine records allocations and representation
//!   changes into per-thread [`ShapeStats`] counters

use crate::shape::{Shape, ShapeId, ShapeKind};
use rustc_hash::FxHashSet as HashSet;
use std::cell::RefCell;

/// Shape engine counters for the current thread
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeStats {
    /// Transition shapes created
    pub transition_allocations: u64,
    /// Linear shapes created
    pub linear_allocations: u64,
    /// Indexed shapes created
    pub indexed_allocations: u64,
    /// Adds answered by an existing transition edge
    pub transition_hits: u64,
    /// Transition edges created
    pub transition_edges_added: u64,
    /// Shapes that left the transition graph, or indexed shapes that shrank to linear
    pub demotions: u64,
    /// Linear shapes that grew into indexed shapes
    pub promotions: u64,
    /// Mutations applied to an unshared instance without copying
    pub in_place_updates: u64,
    /// Transition tables moved from list to hash map storage
    pub table_migrations: u64,
}

impl ShapeStats {
    /// Total shapes created, across all representations
    pub fn total_allocations(&self) -> u64 {
        self.transition_allocations + self.linear_allocations + self.indexed_allocations
    }
}

thread_local! {
    static STATS: RefCell<ShapeStats> = RefCell::new(ShapeStats::default());
}

/// Snapshot of this thread's counters
pub fn stats() -> ShapeStats {
    STATS.with(|stats| stats.borrow().clone())
}

/// Zero this thread's counters
pub fn reset_stats() {
    STATS.with(|stats| *stats.borrow_mut() = ShapeStats::default());
}

/// Update this thread's counters
pub(crate) fn record(update: impl FnOnce(&mut ShapeStats)) {
    STATS.with(|stats| update(&mut stats.borrow_mut()));
}

pub(crate) fn record_allocation(kind: ShapeKind) {
    record(|stats| match kind {
        ShapeKind::Transition => stats.transition_allocations += 1,
        ShapeKind::Linear => stats.linear_allocations += 1,
        ShapeKind::Indexed => stats.indexed_allocations += 1,
    });
}

/// Something that keeps shapes alive
pub trait Traceable {
    /// Report every shape directly held by this value
    fn trace(&self, tracer: &mut dyn FnMut(&Shape));
}

/// Summary of the shapes reachable from a set of roots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeCensus {
    /// Distinct transition shapes reached
    pub transition_shapes: usize,
    /// Distinct linear shapes reached
    pub linear_shapes: usize,
    /// Distinct indexed shapes reached
    pub indexed_shapes: usize,
    /// Transition edges seen
    pub transition_edges: usize,
    /// Sum of property counts over all shapes reached
    pub total_items: usize,
    /// Shapes that an inline cache has recorded
    pub cache_shared: usize,
}

impl ShapeCensus {
    /// Walk the shape graph from `roots`, visiting each shape once
    pub fn collect<'a>(roots: impl IntoIterator<Item = &'a Shape>) -> Self {
        let mut census = ShapeCensus::default();
        let mut marked: HashSet<ShapeId> = HashSet::default();
        let mut worklist: Vec<Shape> = roots.into_iter().cloned().collect();

        while let Some(shape) = worklist.pop() {
            if !marked.insert(shape.id()) {
                continue;
            }
            census.count(&shape);
            shape.trace(&mut |child| {
                if !marked.contains(&child.id()) {
                    worklist.push(child.clone());
                }
            });
        }

        census
    }

    fn count(&mut self, shape: &Shape) {
        match shape.kind() {
            ShapeKind::Transition => self.transition_shapes += 1,
            ShapeKind::Linear => self.linear_shapes += 1,
            ShapeKind::Indexed => self.indexed_shapes += 1,
        }
        self.transition_edges += shape.transition_count();
        self.total_items += shape.property_count();
        if shape.is_shared_by_cache() {
            self.cache_shared += 1;
        }
    }

    /// Distinct shapes reached
    pub fn total_shapes(&self) -> usize {
        self.transition_shapes + self.linear_shapes + self.indexed_shapes
    }
}
