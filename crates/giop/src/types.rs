//! Host type model and wire categories
//!
//! `HostType` describes a native in-process type as the IDL compiler /
//! type-metadata layer hands it to us; `WireCategory` is the chosen
//! on-the-wire representation. Exactly one category exists per
//! (type, attributes) pair; picking it is the resolver's job
//! (`typemap::resolve`).

use std::fmt;
use std::sync::Arc;

/// Descriptor of a native in-process type
#[derive(Debug, Clone, PartialEq)]
pub enum HostType {
    Void,
    Boolean,
    /// 8-bit unsigned byte
    Octet,
    Short,
    Long,
    LongLong,
    Float,
    Double,
    Char,
    String,
    /// Unsigned 16-bit integer - host-only, no wire representation
    UShort,
    /// Unsigned 32-bit integer - host-only, no wire representation
    ULong,
    /// Unsigned 64-bit integer - host-only, no wire representation
    ULongLong,
    /// Raw platform handle - host-only, no wire representation
    RawHandle,
    /// The universal object base type
    Object,
    /// The reflective "type" metatype
    TypeDesc,
    /// The dedicated typecode-carrying type
    TypeCode,
    /// Host array; the wire distinguishes sequences from boxed arrays
    /// even though the host has one array construct
    Array(Box<HostType>),
    /// User-declared type
    Named(Arc<TypeDescriptor>),
}

impl HostType {
    /// Build an array of the given element type
    pub fn array_of(element: HostType) -> Self {
        Self::Array(Box::new(element))
    }

    /// Build a named type from a descriptor
    pub fn named(desc: TypeDescriptor) -> Self {
        Self::Named(Arc::new(desc))
    }

    /// Diagnostic name, used in error reporting
    pub fn type_name(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Octet => "octet".to_string(),
            Self::Short => "short".to_string(),
            Self::Long => "long".to_string(),
            Self::LongLong => "long long".to_string(),
            Self::Float => "float".to_string(),
            Self::Double => "double".to_string(),
            Self::Char => "char".to_string(),
            Self::String => "string".to_string(),
            Self::UShort => "unsigned short".to_string(),
            Self::ULong => "unsigned long".to_string(),
            Self::ULongLong => "unsigned long long".to_string(),
            Self::RawHandle => "raw handle".to_string(),
            Self::Object => "object".to_string(),
            Self::TypeDesc => "type".to_string(),
            Self::TypeCode => "typecode".to_string(),
            Self::Array(element) => format!("{}[]", element.type_name()),
            Self::Named(desc) => desc.name.clone(),
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// User-declared type with its marshalling-relevant classification
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Fully qualified host name, used for repository ids and diagnostics
    pub name: String,
    pub kind: DeclKind,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Classification of a user-declared type
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// Polymorphic reference type; the wire kind is picked by an
    /// `InterfaceKind` attribute (abstract by default)
    Interface,
    /// Remotable (proxyable) reference type
    Remote,
    Enum {
        variants: Vec<String>,
    },
    Exception {
        members: Vec<(String, HostType)>,
    },
    /// Declaratively struct-mapped
    Struct {
        fields: Vec<(String, HostType)>,
    },
    /// Serializable-by-value
    ValueSerializable {
        members: Vec<(String, HostType)>,
    },
    /// Derived from the boxed-value base; `inner` is the boxed content
    BoxedValue {
        inner: HostType,
    },
    /// None of the above; eligible for the structural fallback
    Opaque,
}

/// The chosen on-the-wire representation of a host type
///
/// Closed union: dispatch on it is exhaustive, so adding a category is a
/// compile-visible change everywhere a value is encoded or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireCategory {
    Primitive(PrimitiveKind),
    Struct,
    Enum,
    Sequence,
    /// Boxed value; `already_boxed` is set when the host type itself
    /// derives from the boxed-value base (no rewrite happened)
    BoxedValue { already_boxed: bool },
    ConcreteInterface,
    AbstractInterface,
    AbstractValueType,
    ConcreteValueType,
    Any,
    AbstractBase,
    ValueBase,
    Exception,
    /// Boxed narrow string wrapper
    StringValue,
    /// Boxed wide string wrapper
    WStringValue,
    TypeDesc,
    TypeCode,
    Void,
}

/// Wire primitive kinds (CDR chapter 15 primitive table)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Short,
    Long,
    LongLong,
    Boolean,
    Octet,
    Float,
    Double,
    Char,
    WChar,
    String,
    WString,
}
