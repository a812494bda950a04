//! Inline cache for property access
//!
//! This module implements a polymorphic inline cache (PIC) keyed by property
//! name. Each entry remembers up to [`PIC_MAX_SHAPES`] `(shape, slot)` pairs.
//! A hit needs the object's current shape to be the very instance that was
//! recorded, so recording a shape marks it shared by cache: that instance is
//! never mutated in place again, and the remembered slot stays correct for
//! as long as an object has that shape.

use crate::object::ShapedObject;
use crate::property::PropertyName;
use crate::shape::{Shape, ShapeId};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Inline cache size for property access
pub const IC_SIZE: usize = 256;

/// Maximum number of shapes per polymorphic IC slot
pub const PIC_MAX_SHAPES: usize = 12;

/// A single shape-to-slot mapping in the polymorphic cache
#[derive(Debug, Clone, Copy)]
pub struct ShapeEntry {
    /// Identity of the recorded shape
    pub shape_id: ShapeId,
    /// Slot where the property was found
    pub slot: usize,
    /// Whether the property was a writable data property
    pub writable: bool,
    /// Hit count for this shape
    pub hits: u32,
}

/// Entry in the polymorphic inline cache for property access
#[derive(Debug, Clone, Default)]
pub struct InlineCacheEntry {
    /// Hash of the property name being cached
    pub name_hash: u64,
    /// Shape entries for polymorphic dispatch
    pub shapes: Vec<ShapeEntry>,
    /// Whether this cache site is megamorphic (too many shapes)
    pub is_megamorphic: bool,
    /// Total hit count
    pub total_hits: u32,
}

impl InlineCacheEntry {
    /// Look up the cached entry for `shape`
    #[inline]
    pub fn lookup(&mut self, shape: &Shape) -> Option<ShapeEntry> {
        if self.is_megamorphic {
            return None;
        }
        let id = shape.id();
        let entry = self.shapes.iter_mut().find(|entry| entry.shape_id == id)?;
        entry.hits = entry.hits.saturating_add(1);
        self.total_hits = self.total_hits.saturating_add(1);
        Some(*entry)
    }

    /// Record that `shape` holds the property at `slot`
    #[inline]
    pub fn update(&mut self, shape: &Shape, slot: usize, writable: bool) {
        if self.is_megamorphic {
            return;
        }
        let id = shape.id();
        if let Some(entry) = self.shapes.iter_mut().find(|entry| entry.shape_id == id) {
            entry.slot = slot;
            entry.writable = writable;
            return;
        }

        if self.shapes.len() < PIC_MAX_SHAPES {
            shape.mark_shared_by_cache();
            self.shapes.push(ShapeEntry {
                shape_id: id,
                slot,
                writable,
                hits: 0,
            });
        } else {
            tracing::debug!(name_hash = self.name_hash, "inline cache went megamorphic");
            self.is_megamorphic = true;
            self.shapes.clear();
        }
    }

    /// Number of shapes recorded
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }
}

/// Hash a property name for cache slot selection
#[inline]
pub fn hash_property_name(name: &PropertyName) -> u64 {
    let mut hasher = FxHasher::default();
    name.hash(&mut hasher);
    hasher.finish()
}

/// Hit and miss counters for a [`PropertyCache`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Property access through a polymorphic inline cache
pub struct PropertyCache {
    entries: Vec<InlineCacheEntry>,
    stats: CacheStats,
}

impl PropertyCache {
    pub fn new() -> Self {
        Self {
            entries: vec![InlineCacheEntry::default(); IC_SIZE],
            stats: CacheStats::default(),
        }
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Cache entry for `name`, reset if another name owned the slot
    fn entry_for<'e>(
        entries: &'e mut [InlineCacheEntry],
        name: &PropertyName,
    ) -> &'e mut InlineCacheEntry {
        let hash = hash_property_name(name);
        let entry = &mut entries[(hash as usize) % IC_SIZE];
        // If this is a new property name, reset the entry
        if entry.name_hash != hash {
            *entry = InlineCacheEntry {
                name_hash: hash,
                ..InlineCacheEntry::default()
            };
        }
        entry
    }

    /// Cached slot for `name` on `shape`, without touching counters
    pub fn probe(&self, name: &PropertyName, shape: &Shape) -> Option<usize> {
        let hash = hash_property_name(name);
        let entry = &self.entries[(hash as usize) % IC_SIZE];
        if entry.name_hash != hash || entry.is_megamorphic {
            return None;
        }
        entry
            .shapes
            .iter()
            .find(|cached| cached.shape_id == shape.id())
            .map(|cached| cached.slot)
    }

    /// Check if a cache slot is megamorphic (too many shapes)
    pub fn is_megamorphic(&self, name: &PropertyName) -> bool {
        let hash = hash_property_name(name);
        let entry = &self.entries[(hash as usize) % IC_SIZE];
        entry.name_hash == hash && entry.is_megamorphic
    }

    /// Read `name` from `object`, using and refreshing the cache
    pub fn get_property<'a, V>(
        &mut self,
        object: &'a ShapedObject<V>,
        name: &PropertyName,
    ) -> Option<&'a V> {
        let entry = Self::entry_for(&mut self.entries, name);
        if let Some(cached) = entry.lookup(object.shape()) {
            self.stats.hits += 1;
            return object.get_slot(cached.slot);
        }

        self.stats.misses += 1;
        let (slot, descriptor) = object.lookup(name)?;
        let writable = descriptor.is_data_descriptor() && descriptor.is_writable();
        entry.update(object.shape(), slot, writable);
        object.get_slot(slot)
    }

    /// Write `name` on `object`, using and refreshing the cache
    ///
    /// Cached writable slots are written directly. Anything else falls back to
    /// [`ShapedObject::set`], which may change the object's shape.
    pub fn set_property<V>(
        &mut self,
        object: &mut ShapedObject<V>,
        name: PropertyName,
        value: V,
    ) -> bool {
        let entry = Self::entry_for(&mut self.entries, &name);
        if let Some(cached) = entry.lookup(object.shape()) {
            if cached.writable {
                self.stats.hits += 1;
                return object.set_slot(cached.slot, value);
            }
        }

        self.stats.misses += 1;
        if !object.set(name.clone(), value) {
            return false;
        }
        if let Some((slot, descriptor)) = object.lookup(&name) {
            let writable = descriptor.is_data_descriptor() && descriptor.is_writable();
            Self::entry_for(&mut self.entries, &name).update(object.shape(), slot, writable);
        }
        true
    }
}

impl Default for PropertyCache {
    fn default() -> Self {
        Self::new()
    }
}
