//! Property attributes as stored in a shape

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// The `[[Writable]]`, `[[Enumerable]]` and `[[Configurable]]` attributes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyAttributes: u8 {
        const WRITABLE = 1 << 0;
        const ENUMERABLE = 1 << 1;
        const CONFIGURABLE = 1 << 2;
    }
}

/// Whether a property holds a value or a getter/setter pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// Plain value slot
    Data,
    /// Accessor pair; records which halves are present
    Accessor { getter: bool, setter: bool },
}

/// Attributes and kind of one property
///
/// Two descriptors are equal when every attribute and the kind match; this is
/// the equality used to key transition edges.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyDescriptor {
    attributes: PropertyAttributes,
    kind: DescriptorKind,
}

impl PropertyDescriptor {
    /// Writable, enumerable, configurable data property; what plain
    /// assignment creates.
    pub const DEFAULT_DATA: Self = Self {
        attributes: PropertyAttributes::all(),
        kind: DescriptorKind::Data,
    };

    /// Data descriptor with the given attributes
    pub const fn data(attributes: PropertyAttributes) -> Self {
        Self {
            attributes,
            kind: DescriptorKind::Data,
        }
    }

    /// Accessor descriptor; accessors carry no writable bit
    pub fn accessor(attributes: PropertyAttributes, getter: bool, setter: bool) -> Self {
        Self {
            attributes: attributes.difference(PropertyAttributes::WRITABLE),
            kind: DescriptorKind::Accessor { getter, setter },
        }
    }

    #[inline]
    pub fn attributes(&self) -> PropertyAttributes {
        self.attributes
    }

    #[inline]
    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.attributes.contains(PropertyAttributes::WRITABLE)
    }

    #[inline]
    pub fn is_enumerable(&self) -> bool {
        self.attributes.contains(PropertyAttributes::ENUMERABLE)
    }

    #[inline]
    pub fn is_configurable(&self) -> bool {
        self.attributes.contains(PropertyAttributes::CONFIGURABLE)
    }

    #[inline]
    pub fn is_data_descriptor(&self) -> bool {
        matches!(self.kind, DescriptorKind::Data)
    }

    #[inline]
    pub fn is_accessor_descriptor(&self) -> bool {
        !self.is_data_descriptor()
    }

    /// Whether this is a writable, enumerable, configurable data property
    pub fn is_plain_data(&self) -> bool {
        *self == Self::DEFAULT_DATA
    }

    /// Copy with `attributes` in place of the current ones
    pub fn with_attributes(self, attributes: PropertyAttributes) -> Self {
        match self.kind {
            DescriptorKind::Data => Self::data(attributes),
            DescriptorKind::Accessor { getter, setter } => {
                Self::accessor(attributes, getter, setter)
            }
        }
    }
}

impl Default for PropertyDescriptor {
    fn default() -> Self {
        Self::DEFAULT_DATA
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        let kind = match self.kind {
            DescriptorKind::Data => "data".to_string(),
            DescriptorKind::Accessor { getter, setter } => format!(
                "accessor({}{})",
                if getter { "g" } else { "" },
                if setter { "s" } else { "" }
            ),
        };
        write!(
            f,
            "{}{}{} {}",
            flag(self.is_writable(), 'w'),
            flag(self.is_enumerable(), 'e'),
            flag(self.is_configurable(), 'c'),
            kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_data() {
        let desc = PropertyDescriptor::DEFAULT_DATA;
        assert!(desc.is_writable());
        assert!(desc.is_enumerable());
        assert!(desc.is_configurable());
        assert!(desc.is_data_descriptor());
        assert!(desc.is_plain_data());
        assert_eq!(PropertyDescriptor::default(), desc);
    }

    #[test]
    fn test_accessor_drops_writable() {
        let desc = PropertyDescriptor::accessor(PropertyAttributes::all(), true, false);
        assert!(!desc.is_writable());
        assert!(desc.is_accessor_descriptor());
        assert_eq!(desc.kind(), DescriptorKind::Accessor { getter: true, setter: false });
    }

    #[test]
    fn test_equality_covers_kind_and_attributes() {
        let frozen = PropertyDescriptor::data(PropertyAttributes::ENUMERABLE);
        assert_ne!(frozen, PropertyDescriptor::DEFAULT_DATA);
        assert_ne!(
            PropertyDescriptor::accessor(PropertyAttributes::ENUMERABLE, true, true),
            PropertyDescriptor::accessor(PropertyAttributes::ENUMERABLE, true, false)
        );
        assert_eq!(
            PropertyDescriptor::DEFAULT_DATA.with_attributes(PropertyAttributes::ENUMERABLE),
            frozen
        );
    }

    #[test]
    fn test_debug_format() {
        let desc = PropertyDescriptor::data(PropertyAttributes::WRITABLE);
        assert_eq!(format!("{:?}", desc), "w-- data");
    }
}
