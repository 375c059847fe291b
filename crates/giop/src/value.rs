//! Runtime values and their per-category CDR form
//!
//! `Value` is the in-process representation the marshaller moves across
//! the wire. Encoding always goes through type-mapping resolution first:
//! the wire category picked by `typemap::resolve` decides the byte
//! layout, and decoding replays the same resolution so both ends agree.
//!
//! Value-tag constants follow the CORBA valuetype encoding: 0 is the
//! null reference, 0x7fffff00 the bare value tag, 0x7fffff02 the value
//! tag announcing a single repository id.

use bytes::Bytes;
use giop_cdr::{CdrError, CdrReader, CdrWriter};

use crate::attributes::AttributeSet;
use crate::connection::CodeSetAssignment;
use crate::error::{GiopError, Result};
use crate::typemap::{self, Mapping};
use crate::types::{DeclKind, HostType, PrimitiveKind, WireCategory};

const NULL_TAG: u32 = 0;
const VALUE_TAG: u32 = 0x7fff_ff00;
const VALUE_TAG_SINGLE_ID: u32 = 0x7fff_ff02;

/// TypeCode kinds this layer can put on the wire (TCKind constants)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TcKind {
    Null = 0,
    Void = 1,
    Short = 2,
    Long = 3,
    Float = 6,
    Double = 7,
    Boolean = 8,
    Char = 9,
    Octet = 10,
    String = 18,
    LongLong = 23,
    WChar = 26,
    WString = 27,
}

impl TcKind {
    pub fn from_u32(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Null,
            1 => Self::Void,
            2 => Self::Short,
            3 => Self::Long,
            6 => Self::Float,
            7 => Self::Double,
            8 => Self::Boolean,
            9 => Self::Char,
            10 => Self::Octet,
            18 => Self::String,
            23 => Self::LongLong,
            26 => Self::WChar,
            27 => Self::WString,
            _ => return None,
        })
    }
}

/// One profile of an object reference; the body is opaque at this layer
/// (the transport/addressing layer produced it)
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedProfile {
    pub tag: u32,
    pub data: Bytes,
}

/// An interoperable object reference: repository id plus profiles
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRef {
    pub type_id: String,
    pub profiles: Vec<TaggedProfile>,
}

/// State of a valuetype or exception instance
#[derive(Debug, Clone, PartialEq)]
pub struct ValueState {
    /// Repository id, e.g. `IDL:acme/Snapshot:1.0`
    pub type_id: String,
    /// Member values in declaration order
    pub members: Vec<Value>,
}

/// An `any`: a value travelling with its own type
#[derive(Debug, Clone, PartialEq)]
pub struct AnyValue {
    pub ty: HostType,
    pub value: Value,
}

/// Runtime value as the marshaller sees it
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Octet(u8),
    Short(i16),
    Long(i32),
    LongLong(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
    /// Enum constant by ordinal
    Enum(u32),
    /// Struct members in declaration order
    Struct(Vec<Value>),
    Sequence(Vec<Value>),
    /// Boxed value; `None` is the null reference
    Boxed(Option<Box<Value>>),
    /// Object reference; `None` is the nil reference
    ObjectRef(Option<ObjectRef>),
    /// Valuetype instance; `None` is the null value
    ValueObj(Option<ValueState>),
    Exception(ValueState),
    Any(Box<AnyValue>),
    TypeCode(TcKind),
}

fn mismatch(ty: &HostType) -> GiopError {
    GiopError::ValueTypeMismatch {
        name: ty.type_name(),
    }
}

/// Encode one value under its declared type and attributes. Resolution
/// happens here; codec and mapping failures propagate unchanged.
pub fn encode_value(
    w: &mut CdrWriter<'_>,
    ty: &HostType,
    attrs: &AttributeSet,
    value: &Value,
    codesets: &CodeSetAssignment,
) -> Result<()> {
    let mapping = typemap::resolve(ty, attrs)?;
    encode_resolved(w, &mapping, value, codesets)
}

/// Decode one value under its declared type and attributes
pub fn decode_value(
    r: &mut CdrReader<'_>,
    ty: &HostType,
    attrs: &AttributeSet,
    codesets: &CodeSetAssignment,
) -> Result<Value> {
    let mapping = typemap::resolve(ty, attrs)?;
    decode_resolved(r, &mapping, codesets)
}

fn encode_resolved(
    w: &mut CdrWriter<'_>,
    mapping: &Mapping,
    value: &Value,
    cs: &CodeSetAssignment,
) -> Result<()> {
    let ty = &mapping.ty;
    match mapping.category {
        WireCategory::Void => Ok(()),

        WireCategory::Primitive(kind) => encode_primitive(w, kind, ty, value, cs),

        WireCategory::Enum => match value {
            Value::Enum(ordinal) => {
                check_ordinal(ty, *ordinal)?;
                w.write_u32(*ordinal);
                Ok(())
            }
            _ => Err(mismatch(ty)),
        },

        WireCategory::Struct => match value {
            Value::Struct(members) => {
                let fields = struct_fields(ty).ok_or_else(|| mismatch(ty))?;
                if fields.len() != members.len() {
                    return Err(mismatch(ty));
                }
                for ((_, field_ty), member) in fields.iter().zip(members) {
                    encode_value(w, field_ty, &AttributeSet::empty(), member, cs)?;
                }
                Ok(())
            }
            _ => Err(mismatch(ty)),
        },

        WireCategory::Sequence => match (ty, value) {
            (HostType::Array(element), Value::Sequence(items)) => {
                w.write_u32(items.len() as u32);
                for item in items {
                    encode_value(w, element, &AttributeSet::empty(), item, cs)?;
                }
                Ok(())
            }
            _ => Err(mismatch(ty)),
        },

        WireCategory::BoxedValue { .. } => match value {
            Value::Boxed(None) => {
                w.write_u32(NULL_TAG);
                Ok(())
            }
            Value::Boxed(Some(inner)) => {
                let inner_ty = boxed_inner(ty).ok_or_else(|| mismatch(ty))?;
                w.write_u32(VALUE_TAG);
                encode_boxed_state(w, &inner_ty, inner, cs)
            }
            _ => Err(mismatch(ty)),
        },

        WireCategory::StringValue | WireCategory::WStringValue => {
            let wide = mapping.category == WireCategory::WStringValue;
            match value {
                Value::Boxed(None) => {
                    w.write_u32(NULL_TAG);
                    Ok(())
                }
                Value::Boxed(Some(inner)) => match inner.as_ref() {
                    Value::String(s) => {
                        w.write_u32(VALUE_TAG);
                        if wide {
                            write_wstring(w, s)
                        } else {
                            write_narrow_string(w, s, cs)
                        }
                    }
                    _ => Err(mismatch(ty)),
                },
                _ => Err(mismatch(ty)),
            }
        }

        WireCategory::ConcreteInterface => match value {
            Value::ObjectRef(objref) => encode_objref(w, objref.as_ref()),
            _ => Err(mismatch(ty)),
        },

        WireCategory::AbstractInterface | WireCategory::AbstractBase => match value {
            Value::ObjectRef(objref) => {
                w.write_bool(true);
                encode_objref(w, objref.as_ref())
            }
            Value::ValueObj(state) => {
                w.write_bool(false);
                encode_valuetype(w, ty, state.as_ref(), cs)
            }
            _ => Err(mismatch(ty)),
        },

        WireCategory::ConcreteValueType
        | WireCategory::AbstractValueType
        | WireCategory::ValueBase => match value {
            Value::ValueObj(state) => encode_valuetype(w, ty, state.as_ref(), cs),
            _ => Err(mismatch(ty)),
        },

        WireCategory::Exception => match value {
            Value::Exception(state) => {
                let members = exception_members(ty).ok_or_else(|| mismatch(ty))?;
                if members.len() != state.members.len() {
                    return Err(mismatch(ty));
                }
                w.write_string_bytes(state.type_id.as_bytes())?;
                for ((_, member_ty), member) in members.iter().zip(&state.members) {
                    encode_value(w, member_ty, &AttributeSet::empty(), member, cs)?;
                }
                Ok(())
            }
            _ => Err(mismatch(ty)),
        },

        WireCategory::Any => match value {
            Value::Any(any) => {
                let kind = typecode_for(&any.ty)?;
                w.write_u32(kind as u32);
                encode_value(w, &any.ty, &AttributeSet::empty(), &any.value, cs)
            }
            _ => Err(mismatch(ty)),
        },

        WireCategory::TypeDesc | WireCategory::TypeCode => match value {
            Value::TypeCode(kind) => {
                w.write_u32(*kind as u32);
                Ok(())
            }
            _ => Err(mismatch(ty)),
        },
    }
}

fn decode_resolved(
    r: &mut CdrReader<'_>,
    mapping: &Mapping,
    cs: &CodeSetAssignment,
) -> Result<Value> {
    let ty = &mapping.ty;
    match mapping.category {
        WireCategory::Void => Ok(Value::Struct(Vec::new())),

        WireCategory::Primitive(kind) => decode_primitive(r, kind, cs),

        WireCategory::Enum => {
            let ordinal = r.read_u32()?;
            check_ordinal(ty, ordinal)?;
            Ok(Value::Enum(ordinal))
        }

        WireCategory::Struct => {
            let fields = struct_fields(ty).ok_or_else(|| mismatch(ty))?;
            let mut members = Vec::with_capacity(fields.len());
            for (_, field_ty) in &fields {
                members.push(decode_value(r, field_ty, &AttributeSet::empty(), cs)?);
            }
            Ok(Value::Struct(members))
        }

        WireCategory::Sequence => match ty {
            HostType::Array(element) => {
                let count = r.read_u32()? as usize;
                let mut items = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    items.push(decode_value(r, element, &AttributeSet::empty(), cs)?);
                }
                Ok(Value::Sequence(items))
            }
            _ => Err(mismatch(ty)),
        },

        WireCategory::BoxedValue { .. } => {
            let tag = r.read_u32()?;
            match tag {
                NULL_TAG => Ok(Value::Boxed(None)),
                VALUE_TAG => {
                    let inner_ty = boxed_inner(ty).ok_or_else(|| mismatch(ty))?;
                    let inner = decode_boxed_state(r, &inner_ty, cs)?;
                    Ok(Value::Boxed(Some(Box::new(inner))))
                }
                other => Err(bad_tag(other).into()),
            }
        }

        WireCategory::StringValue | WireCategory::WStringValue => {
            let wide = mapping.category == WireCategory::WStringValue;
            let tag = r.read_u32()?;
            match tag {
                NULL_TAG => Ok(Value::Boxed(None)),
                VALUE_TAG => {
                    let s = if wide {
                        read_wstring(r)?
                    } else {
                        read_narrow_string(r, cs)?
                    };
                    Ok(Value::Boxed(Some(Box::new(Value::String(s)))))
                }
                other => Err(bad_tag(other).into()),
            }
        }

        WireCategory::ConcreteInterface => Ok(Value::ObjectRef(decode_objref(r)?)),

        WireCategory::AbstractInterface | WireCategory::AbstractBase => {
            if r.read_bool()? {
                Ok(Value::ObjectRef(decode_objref(r)?))
            } else {
                Ok(Value::ValueObj(decode_valuetype(r, ty, cs)?))
            }
        }

        WireCategory::ConcreteValueType
        | WireCategory::AbstractValueType
        | WireCategory::ValueBase => Ok(Value::ValueObj(decode_valuetype(r, ty, cs)?)),

        WireCategory::Exception => {
            let type_id = String::from_utf8(r.read_string_bytes()?.to_vec())
                .map_err(CdrError::from)?;
            let member_types = exception_members(ty).ok_or_else(|| mismatch(ty))?;
            let mut members = Vec::with_capacity(member_types.len());
            for (_, member_ty) in &member_types {
                members.push(decode_value(r, member_ty, &AttributeSet::empty(), cs)?);
            }
            Ok(Value::Exception(ValueState { type_id, members }))
        }

        WireCategory::Any => {
            let raw = r.read_u32()?;
            let kind = TcKind::from_u32(raw).ok_or_else(|| GiopError::UnsupportedTypeCode {
                type_name: format!("typecode kind {raw}"),
            })?;
            let (ty, value) = decode_by_typecode(r, kind, cs)?;
            Ok(Value::Any(Box::new(AnyValue { ty, value })))
        }

        WireCategory::TypeDesc | WireCategory::TypeCode => {
            let raw = r.read_u32()?;
            let kind = TcKind::from_u32(raw).ok_or_else(|| GiopError::UnsupportedTypeCode {
                type_name: format!("typecode kind {raw}"),
            })?;
            Ok(Value::TypeCode(kind))
        }
    }
}

fn encode_primitive(
    w: &mut CdrWriter<'_>,
    kind: PrimitiveKind,
    ty: &HostType,
    value: &Value,
    cs: &CodeSetAssignment,
) -> Result<()> {
    match (kind, value) {
        (PrimitiveKind::Boolean, Value::Boolean(v)) => w.write_bool(*v),
        (PrimitiveKind::Octet, Value::Octet(v)) => w.write_u8(*v),
        (PrimitiveKind::Short, Value::Short(v)) => w.write_i16(*v),
        (PrimitiveKind::Long, Value::Long(v)) => w.write_i32(*v),
        (PrimitiveKind::LongLong, Value::LongLong(v)) => w.write_i64(*v),
        (PrimitiveKind::Float, Value::Float(v)) => w.write_f32(*v),
        (PrimitiveKind::Double, Value::Double(v)) => w.write_f64(*v),
        (PrimitiveKind::Char, Value::Char(c)) => w.write_u8(cs.encode_narrow_char(*c)?),
        (PrimitiveKind::WChar, Value::Char(c)) => write_wchar(w, *c),
        (PrimitiveKind::String, Value::String(s)) => return write_narrow_string(w, s, cs),
        (PrimitiveKind::WString, Value::String(s)) => return write_wstring(w, s),
        _ => return Err(mismatch(ty)),
    }
    Ok(())
}

fn decode_primitive(
    r: &mut CdrReader<'_>,
    kind: PrimitiveKind,
    cs: &CodeSetAssignment,
) -> Result<Value> {
    Ok(match kind {
        PrimitiveKind::Boolean => Value::Boolean(r.read_bool()?),
        PrimitiveKind::Octet => Value::Octet(r.read_u8()?),
        PrimitiveKind::Short => Value::Short(r.read_i16()?),
        PrimitiveKind::Long => Value::Long(r.read_i32()?),
        PrimitiveKind::LongLong => Value::LongLong(r.read_i64()?),
        PrimitiveKind::Float => Value::Float(r.read_f32()?),
        PrimitiveKind::Double => Value::Double(r.read_f64()?),
        PrimitiveKind::Char => Value::Char(r.read_u8()? as char),
        PrimitiveKind::WChar => Value::Char(read_wchar(r)?),
        PrimitiveKind::String => Value::String(read_narrow_string(r, cs)?),
        PrimitiveKind::WString => Value::String(read_wstring(r)?),
    })
}

// Narrow strings go through the negotiated char codeset; wide strings
// are UTF-16 big-endian per the GIOP 1.2 rules (u32 byte count, no
// terminator; wchar is a length octet followed by its code units).

fn write_narrow_string(w: &mut CdrWriter<'_>, s: &str, cs: &CodeSetAssignment) -> Result<()> {
    let bytes = cs.encode_narrow(s)?;
    w.write_string_bytes(&bytes)?;
    Ok(())
}

fn read_narrow_string(r: &mut CdrReader<'_>, cs: &CodeSetAssignment) -> Result<String> {
    let bytes = r.read_string_bytes()?;
    Ok(cs.decode_narrow(bytes)?)
}

fn utf16_be_bytes(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
}

fn write_wstring(w: &mut CdrWriter<'_>, s: &str) -> Result<()> {
    let bytes = utf16_be_bytes(s);
    w.write_octet_sequence(&bytes)?;
    Ok(())
}

fn read_wstring(r: &mut CdrReader<'_>) -> Result<String> {
    let bytes = r.read_octet_sequence()?;
    if bytes.len() % 2 != 0 {
        return Err(CdrError::InvalidString("odd wstring byte count".to_string()).into());
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let s = char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(CdrError::from)?;
    Ok(s)
}

fn write_wchar(w: &mut CdrWriter<'_>, c: char) {
    let mut units = [0u16; 2];
    let encoded = c.encode_utf16(&mut units);
    let bytes: Vec<u8> = encoded.iter().flat_map(|u| u.to_be_bytes()).collect();
    w.write_u8(bytes.len() as u8);
    w.write_slice(&bytes);
}

fn read_wchar(r: &mut CdrReader<'_>) -> Result<char> {
    let len = r.read_u8()? as usize;
    if len != 2 && len != 4 {
        return Err(CdrError::InvalidString(format!("bad wchar length {len}")).into());
    }
    let bytes = r.read_slice(len)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    let mut decoded = char::decode_utf16(units);
    let c = decoded
        .next()
        .ok_or_else(|| CdrError::InvalidString("empty wchar".to_string()))?
        .map_err(CdrError::from)?;
    if decoded.next().is_some() {
        return Err(CdrError::InvalidString("wchar holds more than one char".to_string()).into());
    }
    Ok(c)
}

fn encode_objref(w: &mut CdrWriter<'_>, objref: Option<&ObjectRef>) -> Result<()> {
    match objref {
        // Nil reference: empty repository id, zero profiles
        None => {
            w.write_string_bytes(b"")?;
            w.write_u32(0);
            Ok(())
        }
        Some(obj) => {
            w.write_string_bytes(obj.type_id.as_bytes())?;
            w.write_u32(obj.profiles.len() as u32);
            for profile in &obj.profiles {
                w.write_u32(profile.tag);
                w.write_octet_sequence(&profile.data)?;
            }
            Ok(())
        }
    }
}

fn decode_objref(r: &mut CdrReader<'_>) -> Result<Option<ObjectRef>> {
    let type_id =
        String::from_utf8(r.read_string_bytes()?.to_vec()).map_err(CdrError::from)?;
    let count = r.read_u32()? as usize;
    if type_id.is_empty() && count == 0 {
        return Ok(None);
    }
    let mut profiles = Vec::with_capacity(count.min(16));
    for _ in 0..count {
        let tag = r.read_u32()?;
        let data = Bytes::copy_from_slice(r.read_octet_sequence()?);
        profiles.push(TaggedProfile { tag, data });
    }
    Ok(Some(ObjectRef { type_id, profiles }))
}

fn encode_valuetype(
    w: &mut CdrWriter<'_>,
    ty: &HostType,
    state: Option<&ValueState>,
    cs: &CodeSetAssignment,
) -> Result<()> {
    match state {
        None => {
            w.write_u32(NULL_TAG);
            Ok(())
        }
        Some(state) => {
            w.write_u32(VALUE_TAG_SINGLE_ID);
            w.write_string_bytes(state.type_id.as_bytes())?;
            let member_types = value_members(ty);
            if member_types.len() != state.members.len() {
                return Err(mismatch(ty));
            }
            for ((_, member_ty), member) in member_types.iter().zip(&state.members) {
                encode_value(w, member_ty, &AttributeSet::empty(), member, cs)?;
            }
            Ok(())
        }
    }
}

fn decode_valuetype(
    r: &mut CdrReader<'_>,
    ty: &HostType,
    cs: &CodeSetAssignment,
) -> Result<Option<ValueState>> {
    let tag = r.read_u32()?;
    match tag {
        NULL_TAG => Ok(None),
        VALUE_TAG_SINGLE_ID => {
            let type_id =
                String::from_utf8(r.read_string_bytes()?.to_vec()).map_err(CdrError::from)?;
            let member_types = value_members(ty);
            let mut members = Vec::with_capacity(member_types.len());
            for (_, member_ty) in &member_types {
                members.push(decode_value(r, member_ty, &AttributeSet::empty(), cs)?);
            }
            Ok(Some(ValueState { type_id, members }))
        }
        other => Err(bad_tag(other).into()),
    }
}

fn encode_boxed_state(
    w: &mut CdrWriter<'_>,
    inner_ty: &HostType,
    value: &Value,
    cs: &CodeSetAssignment,
) -> Result<()> {
    match (inner_ty, value) {
        // Boxed arrays carry their length like a sequence; re-resolving
        // the array here would box it again, so the state is written
        // directly.
        (HostType::Array(element), Value::Sequence(items)) => {
            w.write_u32(items.len() as u32);
            for item in items {
                encode_value(w, element, &AttributeSet::empty(), item, cs)?;
            }
            Ok(())
        }
        _ => encode_value(w, inner_ty, &AttributeSet::empty(), value, cs),
    }
}

fn decode_boxed_state(
    r: &mut CdrReader<'_>,
    inner_ty: &HostType,
    cs: &CodeSetAssignment,
) -> Result<Value> {
    match inner_ty {
        HostType::Array(element) => {
            let count = r.read_u32()? as usize;
            let mut items = Vec::with_capacity(count.min(4096));
            for _ in 0..count {
                items.push(decode_value(r, element, &AttributeSet::empty(), cs)?);
            }
            Ok(Value::Sequence(items))
        }
        _ => decode_value(r, inner_ty, &AttributeSet::empty(), cs),
    }
}

fn typecode_for(ty: &HostType) -> Result<TcKind> {
    let mapping = typemap::resolve(ty, &AttributeSet::empty())?;
    let kind = match mapping.category {
        WireCategory::Void => TcKind::Void,
        WireCategory::Primitive(p) => match p {
            PrimitiveKind::Short => TcKind::Short,
            PrimitiveKind::Long => TcKind::Long,
            PrimitiveKind::LongLong => TcKind::LongLong,
            PrimitiveKind::Boolean => TcKind::Boolean,
            PrimitiveKind::Octet => TcKind::Octet,
            PrimitiveKind::Float => TcKind::Float,
            PrimitiveKind::Double => TcKind::Double,
            PrimitiveKind::Char => TcKind::Char,
            PrimitiveKind::WChar => TcKind::WChar,
            PrimitiveKind::String => TcKind::String,
            PrimitiveKind::WString => TcKind::WString,
        },
        _ => {
            return Err(GiopError::UnsupportedTypeCode {
                type_name: ty.type_name(),
            })
        }
    };
    Ok(kind)
}

fn decode_by_typecode(
    r: &mut CdrReader<'_>,
    kind: TcKind,
    cs: &CodeSetAssignment,
) -> Result<(HostType, Value)> {
    let (ty, value) = match kind {
        TcKind::Null | TcKind::Void => (HostType::Void, Value::Struct(Vec::new())),
        TcKind::Short => (HostType::Short, Value::Short(r.read_i16()?)),
        TcKind::Long => (HostType::Long, Value::Long(r.read_i32()?)),
        TcKind::LongLong => (HostType::LongLong, Value::LongLong(r.read_i64()?)),
        TcKind::Boolean => (HostType::Boolean, Value::Boolean(r.read_bool()?)),
        TcKind::Octet => (HostType::Octet, Value::Octet(r.read_u8()?)),
        TcKind::Float => (HostType::Float, Value::Float(r.read_f32()?)),
        TcKind::Double => (HostType::Double, Value::Double(r.read_f64()?)),
        TcKind::Char => (HostType::Char, Value::Char(r.read_u8()? as char)),
        TcKind::WChar => (HostType::Char, Value::Char(read_wchar(r)?)),
        TcKind::String => (HostType::String, Value::String(read_narrow_string(r, cs)?)),
        TcKind::WString => (HostType::String, Value::String(read_wstring(r)?)),
    };
    Ok((ty, value))
}

fn bad_tag(tag: u32) -> CdrError {
    CdrError::InvalidEncapsulation(format!("unexpected value tag {tag:#010x}"))
}

fn check_ordinal(ty: &HostType, ordinal: u32) -> Result<()> {
    if let HostType::Named(desc) = ty {
        if let DeclKind::Enum { variants } = &desc.kind {
            if (ordinal as usize) < variants.len() {
                return Ok(());
            }
            return Err(GiopError::InvalidEnumOrdinal {
                type_name: desc.name.clone(),
                ordinal,
            });
        }
    }
    Ok(())
}

fn struct_fields(ty: &HostType) -> Option<Vec<(String, HostType)>> {
    match ty {
        HostType::Named(desc) => match &desc.kind {
            DeclKind::Struct { fields } => Some(fields.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn exception_members(ty: &HostType) -> Option<Vec<(String, HostType)>> {
    match ty {
        HostType::Named(desc) => match &desc.kind {
            DeclKind::Exception { members } => Some(members.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Member layout of a valuetype, when the declaration carries one.
/// Opaque fallback types and the bare object base expose no members;
/// their state travels as the repository id alone.
fn value_members(ty: &HostType) -> Vec<(String, HostType)> {
    match ty {
        HostType::Named(desc) => match &desc.kind {
            DeclKind::ValueSerializable { members } => members.clone(),
            DeclKind::Struct { fields } => fields.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn boxed_inner(ty: &HostType) -> Option<HostType> {
    match ty {
        HostType::Named(desc) => match &desc.kind {
            DeclKind::BoxedValue { inner } => Some(inner.clone()),
            _ => None,
        },
        _ => None,
    }
}
