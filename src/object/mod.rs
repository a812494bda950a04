//! Objects laid out by a shape
//!
//! A [`ShapedObject`] pairs one [`Shape`] with a value vector whose slot *i*
//! holds the value of the shape's item *i*. Every layout change goes through
//! the shape; the object installs whatever shape comes back and keeps the
//! value vector in step.

use crate::property::{PropertyDescriptor, PropertyName};
use crate::shape::Shape;
use std::mem;

/// An object whose property layout is described by a shape
#[derive(Debug, Clone)]
pub struct ShapedObject<V> {
    shape: Shape,
    slots: Vec<V>,
}

impl<V> ShapedObject<V> {
    /// Empty object starting at `root`
    ///
    /// `root` is normally [`Shape::empty`] or a [`Shape::root`] with a custom
    /// configuration; a non-empty root is accepted only if it has no items.
    pub fn new(root: Shape) -> Self {
        debug_assert!(root.is_empty(), "object root shape must be empty");
        Self {
            shape: root,
            slots: Vec::new(),
        }
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of own properties
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot and descriptor of `name`
    pub fn lookup(&self, name: &PropertyName) -> Option<(usize, PropertyDescriptor)> {
        self.shape
            .find_property(name)
            .map(|(slot, item)| (slot, item.descriptor))
    }

    /// Value of `name`
    pub fn get(&self, name: &PropertyName) -> Option<&V> {
        let (slot, _) = self.shape.find_property(name)?;
        self.slots.get(slot)
    }

    /// Value at `slot`, typically one remembered by an inline cache
    #[inline]
    pub fn get_slot(&self, slot: usize) -> Option<&V> {
        self.slots.get(slot)
    }

    /// Overwrite the value at `slot`; returns `false` if there is no such slot
    pub fn set_slot(&mut self, slot: usize, value: V) -> bool {
        match self.slots.get_mut(slot) {
            Some(existing) => {
                *existing = value;
                true
            }
            None => false,
        }
    }

    /// Define or redefine an own property
    ///
    /// Absent properties are added. A present property with the same
    /// descriptor just takes the new value. A present property with a
    /// different descriptor is redefined only if it is configurable.
    pub fn define(&mut self, name: PropertyName, descriptor: PropertyDescriptor, value: V) -> bool {
        match self.lookup(&name) {
            None => {
                self.update_shape(|shape| shape.add_property(name, descriptor));
                self.slots.push(value);
            }
            Some((slot, existing)) if existing == descriptor => {
                self.slots[slot] = value;
            }
            Some((slot, existing)) => {
                if !existing.is_configurable() {
                    return false;
                }
                self.update_shape(|shape| shape.replace_property_descriptor(slot, descriptor));
                self.slots[slot] = value;
            }
        }
        self.check_layout();
        true
    }

    /// Assign `name` the way plain assignment does
    ///
    /// Writes an existing writable data property, or adds a default data
    /// property. Read-only and accessor properties refuse.
    pub fn set(&mut self, name: PropertyName, value: V) -> bool {
        match self.lookup(&name) {
            Some((slot, descriptor)) => {
                if !descriptor.is_data_descriptor() || !descriptor.is_writable() {
                    return false;
                }
                self.slots[slot] = value;
                true
            }
            None => self.define(name, PropertyDescriptor::DEFAULT_DATA, value),
        }
    }

    /// Delete an own property
    ///
    /// Deleting an absent property succeeds; a non-configurable one refuses.
    pub fn delete(&mut self, name: &PropertyName) -> bool {
        let Some((slot, descriptor)) = self.lookup(name) else {
            return true;
        };
        if !descriptor.is_configurable() {
            return false;
        }
        self.update_shape(|shape| shape.remove_property(slot));
        self.slots.remove(slot);
        self.check_layout();
        true
    }

    /// Move this object off the shared transition graph
    pub fn prevent_sharing(&mut self) {
        self.update_shape(Shape::convert_to_non_transition_shape);
    }

    /// Own properties in slot order
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyName, PropertyDescriptor, &V)> + '_ {
        self.shape
            .items()
            .iter()
            .zip(&self.slots)
            .map(|(item, value)| (&item.name, item.descriptor, value))
    }

    /// Own property names in slot order
    pub fn keys(&self) -> impl Iterator<Item = &PropertyName> + '_ {
        self.shape.items().iter().map(|item| &item.name)
    }

    /// Run a shape operation and install its result
    ///
    /// The object's handle is moved into the operation so that an unshared
    /// shape owned only by this object can be updated without a copy.
    fn update_shape(&mut self, op: impl FnOnce(Shape) -> Shape) {
        let shape = mem::replace(&mut self.shape, Shape::empty());
        self.shape = op(shape);
    }

    #[inline]
    fn check_layout(&self) {
        debug_assert_eq!(
            self.slots.len(),
            self.shape.property_count(),
            "value slots out of step with shape"
        );
    }
}
