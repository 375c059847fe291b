//! Type-mapping resolution
//!
//! Pure function from (host type, attribute set) to the wire category
//! that governs how a value of that type is put on the wire, possibly
//! rewriting the type along the way (boxed bindings, boxed arrays,
//! boxed string wrappers).
//!
//! The rule chain is strictly ordered and first-match-wins. The order is
//! load-bearing for wire compatibility, not incidental: the remotable
//! reference check must run before the generic serializable-value
//! fallback, the explicit boxed binding must run before everything else,
//! and arrays must be classified before the boxed-value catch. Reordering
//! silently changes what peers see on the wire.

use crate::attributes::{AttributeSet, InterfaceAttr, ObjectAttr};
use crate::error::MappingError;
use crate::types::{DeclKind, HostType, PrimitiveKind, TypeDescriptor, WireCategory};

/// Resolution result: the wire category plus the (possibly rewritten)
/// type the codec will actually work with
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub category: WireCategory,
    pub ty: HostType,
}

impl Mapping {
    fn unchanged(category: WireCategory, ty: &HostType) -> Self {
        Self {
            category,
            ty: ty.clone(),
        }
    }
}

/// Descriptor for the generated boxed-array value type wrapping a host
/// array that is not marshalled as a sequence
pub fn boxed_array_descriptor(element: &HostType) -> TypeDescriptor {
    TypeDescriptor::new(
        format!("boxed<{}[]>", element.type_name()),
        DeclKind::BoxedValue {
            inner: HostType::array_of(element.clone()),
        },
    )
}

fn boxed_string_descriptor(wide: bool) -> TypeDescriptor {
    let name = if wide {
        "::CORBA::WStringValue"
    } else {
        "::CORBA::StringValue"
    };
    TypeDescriptor::new(
        name,
        DeclKind::BoxedValue {
            inner: HostType::String,
        },
    )
}

/// Resolve a host type under its attribute set to exactly one wire
/// category. Deterministic and side-effect free; resolution is total
/// over supported types and fails with `MappingError` otherwise.
pub fn resolve(ty: &HostType, attrs: &AttributeSet) -> Result<Mapping, MappingError> {
    // An explicit boxed binding overrides everything: the declared type
    // is replaced by the bound boxed type.
    if let Some(bound) = attrs.boxed_value_binding() {
        return Ok(Mapping {
            category: WireCategory::BoxedValue {
                already_boxed: false,
            },
            ty: bound.clone(),
        });
    }

    // Polymorphic reference types pick their wire kind from the
    // interface-kind marker, abstract when unmarked.
    if let HostType::Named(desc) = ty {
        if desc.kind == DeclKind::Interface {
            let marker = attrs.interface_kind().map_err(|conflict| {
                MappingError::ConflictingMarkers {
                    type_name: ty.type_name(),
                    marker: conflict.0,
                }
            })?;
            let category = match marker.unwrap_or(InterfaceAttr::Abstract) {
                InterfaceAttr::Abstract => WireCategory::AbstractInterface,
                InterfaceAttr::Concrete => WireCategory::ConcreteInterface,
                InterfaceAttr::AbstractValue => WireCategory::AbstractValueType,
            };
            return Ok(Mapping::unchanged(category, ty));
        }

        // Remotable references are always concrete interfaces. This must
        // stay ahead of the serializable-value fallback below.
        if desc.kind == DeclKind::Remote {
            return Ok(Mapping::unchanged(WireCategory::ConcreteInterface, ty));
        }
    }

    // Fixed primitive host types
    if let Some(mapping) = resolve_primitive(ty, attrs) {
        return Ok(mapping);
    }

    if let HostType::Named(desc) = ty {
        if matches!(desc.kind, DeclKind::Enum { .. }) {
            return Ok(Mapping::unchanged(WireCategory::Enum, ty));
        }
    }

    // Arrays: a sequence hint keeps the type as-is; otherwise the array
    // is rewritten to its generated boxed-array value type. Sequences
    // and boxed arrays are distinct wire constructs even though the host
    // has one array construct.
    if let HostType::Array(element) = ty {
        if attrs.sequence_marker() {
            return Ok(Mapping::unchanged(WireCategory::Sequence, ty));
        }
        return Ok(Mapping {
            category: WireCategory::BoxedValue {
                already_boxed: false,
            },
            ty: HostType::named(boxed_array_descriptor(element)),
        });
    }

    // Types already derived from the boxed-value base need no rewrite
    if let HostType::Named(desc) = ty {
        if matches!(desc.kind, DeclKind::BoxedValue { .. }) {
            return Ok(Mapping::unchanged(
                WireCategory::BoxedValue { already_boxed: true },
                ty,
            ));
        }
    }

    // The universal object type sub-resolves through the object-kind
    // marker, Any when unmarked.
    if *ty == HostType::Object {
        let marker = attrs
            .object_kind()
            .map_err(|conflict| MappingError::ConflictingMarkers {
                type_name: ty.type_name(),
                marker: conflict.0,
            })?;
        let category = match marker.unwrap_or(ObjectAttr::Any) {
            ObjectAttr::Any => WireCategory::Any,
            ObjectAttr::AbstractBase => WireCategory::AbstractBase,
            ObjectAttr::ValueBase => WireCategory::ValueBase,
        };
        return Ok(Mapping::unchanged(category, ty));
    }

    if let HostType::Named(desc) = ty {
        if matches!(desc.kind, DeclKind::Exception { .. }) {
            return Ok(Mapping::unchanged(WireCategory::Exception, ty));
        }
    }

    if *ty == HostType::TypeDesc {
        return Ok(Mapping::unchanged(WireCategory::TypeDesc, ty));
    }
    if *ty == HostType::TypeCode {
        return Ok(Mapping::unchanged(WireCategory::TypeCode, ty));
    }

    if let HostType::Named(desc) = ty {
        // Declarative struct mapping, either on the declaration or via
        // the per-parameter marker
        if matches!(desc.kind, DeclKind::Struct { .. })
            || (attrs.struct_marker() && desc.kind == DeclKind::Opaque)
        {
            return Ok(Mapping::unchanged(WireCategory::Struct, ty));
        }

        if matches!(desc.kind, DeclKind::ValueSerializable { .. }) {
            return Ok(Mapping::unchanged(WireCategory::ConcreteValueType, ty));
        }

        // Open fallback: anything else declared by the host is marshalled
        // structurally through its most-derived mapped ancestor.
        if desc.kind == DeclKind::Opaque {
            return Ok(Mapping::unchanged(WireCategory::AbstractValueType, ty));
        }
    }

    // Host-only types with no wire representation land here, as does
    // anything the chain above does not recognize.
    Err(MappingError::Unmappable {
        type_name: ty.type_name(),
    })
}

/// Primitive sub-resolution: the fixed 1:1 table, with char and string
/// further split by the wide-char hint and string by the value-wrapper
/// hint. Returns `None` when the type is not a fixed primitive.
fn resolve_primitive(ty: &HostType, attrs: &AttributeSet) -> Option<Mapping> {
    use PrimitiveKind as P;
    let mapping = match ty {
        HostType::Void => Mapping::unchanged(WireCategory::Void, ty),
        HostType::Boolean => Mapping::unchanged(WireCategory::Primitive(P::Boolean), ty),
        HostType::Octet => Mapping::unchanged(WireCategory::Primitive(P::Octet), ty),
        HostType::Short => Mapping::unchanged(WireCategory::Primitive(P::Short), ty),
        HostType::Long => Mapping::unchanged(WireCategory::Primitive(P::Long), ty),
        HostType::LongLong => Mapping::unchanged(WireCategory::Primitive(P::LongLong), ty),
        HostType::Float => Mapping::unchanged(WireCategory::Primitive(P::Float), ty),
        HostType::Double => Mapping::unchanged(WireCategory::Primitive(P::Double), ty),
        HostType::Char => {
            let kind = if attrs.wide_char_allowed() {
                P::WChar
            } else {
                P::Char
            };
            Mapping::unchanged(WireCategory::Primitive(kind), ty)
        }
        HostType::String => {
            let wide = attrs.wide_char_allowed();
            if attrs.string_as_value_type() {
                let category = if wide {
                    WireCategory::WStringValue
                } else {
                    WireCategory::StringValue
                };
                Mapping {
                    category,
                    ty: HostType::named(boxed_string_descriptor(wide)),
                }
            } else {
                let kind = if wide { P::WString } else { P::String };
                Mapping::unchanged(WireCategory::Primitive(kind), ty)
            }
        }
        _ => return None,
    };
    Some(mapping)
}
