//! Per-parameter marshalling hints
//!
//! Every parameter, field and return value carries an ordered,
//! duplicate-tolerant set of attributes from the type-metadata layer.
//! For the one *ordered* kind (`WideCharAllowed`) the highest-priority
//! instance wins; for flags and bindings the first occurrence wins; for
//! *exclusive* markers (`InterfaceKind`, `ObjectKind`) a second
//! occurrence is an error surfaced by the resolver. Unrecognized kinds
//! are carried but ignored, so new metadata stays forward compatible.

use crate::types::HostType;

/// Interface-kind marker values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceAttr {
    Abstract,
    Concrete,
    AbstractValue,
}

/// Object-kind marker values for the universal object type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAttr {
    Any,
    AbstractBase,
    ValueBase,
}

/// A single marshalling hint
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// Whether wide char/string encodings may be used (default true).
    /// Ordered kind: the highest-priority instance wins.
    WideCharAllowed(bool),
    /// Rewrite the declared type to the bound boxed type
    BoxedValueBinding(HostType),
    /// Exclusive marker choosing the wire kind of a polymorphic reference
    InterfaceKind(InterfaceAttr),
    /// Exclusive marker choosing the wire kind of the universal object type
    ObjectKind(ObjectAttr),
    /// Marshal a host array as a sequence instead of a boxed array
    SequenceMarker,
    /// Marshal the type field-by-field as a struct
    StructMarker,
    /// Map string to a boxed String/WString value wrapper
    StringAsValueType,
    /// Hint kind this layer does not know; preserved, never acted on
    Unrecognized { kind: u32 },
}

/// One attribute instance with its override priority
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEntry {
    pub attribute: Attribute,
    pub priority: u8,
}

/// Marker-conflict report from an exclusive-kind lookup; the resolver
/// attaches the offending type name before surfacing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictingMarker(pub &'static str);

/// Ordered, duplicate-tolerant set of marshalling hints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    entries: Vec<AttributeEntry>,
}

impl AttributeSet {
    /// The empty set: no hints, documented defaults apply
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append a hint at priority 0
    pub fn push(&mut self, attribute: Attribute) {
        self.push_with_priority(attribute, 0);
    }

    /// Append a hint with an explicit override priority
    pub fn push_with_priority(&mut self, attribute: Attribute, priority: u8) {
        self.entries.push(AttributeEntry {
            attribute,
            priority,
        });
    }

    /// Builder-style append
    pub fn with(mut self, attribute: Attribute) -> Self {
        self.push(attribute);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeEntry> {
        self.entries.iter()
    }

    /// Effective wide-char permission: highest priority wins, earliest
    /// occurrence breaks ties, absence defaults to true.
    pub fn wide_char_allowed(&self) -> bool {
        let mut best: Option<(u8, bool)> = None;
        for entry in &self.entries {
            if let Attribute::WideCharAllowed(allowed) = entry.attribute {
                match best {
                    Some((priority, _)) if priority >= entry.priority => {}
                    _ => best = Some((entry.priority, allowed)),
                }
            }
        }
        best.map(|(_, allowed)| allowed).unwrap_or(true)
    }

    /// First boxed-binding hint, if any
    pub fn boxed_value_binding(&self) -> Option<&HostType> {
        self.entries.iter().find_map(|e| match &e.attribute {
            Attribute::BoxedValueBinding(ty) => Some(ty),
            _ => None,
        })
    }

    /// Exclusive interface-kind marker; a second occurrence is an error
    pub fn interface_kind(&self) -> Result<Option<InterfaceAttr>, ConflictingMarker> {
        let mut found = None;
        for entry in &self.entries {
            if let Attribute::InterfaceKind(kind) = entry.attribute {
                if found.is_some() {
                    return Err(ConflictingMarker("interface-kind"));
                }
                found = Some(kind);
            }
        }
        Ok(found)
    }

    /// Exclusive object-kind marker; a second occurrence is an error
    pub fn object_kind(&self) -> Result<Option<ObjectAttr>, ConflictingMarker> {
        let mut found = None;
        for entry in &self.entries {
            if let Attribute::ObjectKind(kind) = entry.attribute {
                if found.is_some() {
                    return Err(ConflictingMarker("object-kind"));
                }
                found = Some(kind);
            }
        }
        Ok(found)
    }

    pub fn sequence_marker(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.attribute, Attribute::SequenceMarker))
    }

    pub fn struct_marker(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.attribute, Attribute::StructMarker))
    }

    pub fn string_as_value_type(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.attribute, Attribute::StringAsValueType))
    }
}
