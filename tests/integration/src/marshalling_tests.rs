//! Marshalling Tests - Complex Data Exchange Scenarios
//!
//! These tests push complex parameter lists through the whole path:
//! type-mapping resolution, value encoding, request assembly, the
//! in-process echo transport and decoding on the far side:
//! - Nested structures
//! - Sequences and boxed arrays
//! - Narrow and wide strings
//! - Valuetypes, exceptions and object references
//! - Mixed parameter directions

mod common;

use bytes::Bytes;
use common::*;
use giop::attributes::{Attribute, AttributeSet};
use giop::connection::CodeSetAssignment;
use giop::error::GiopError;
use giop::marshal::{self, Direction, OperationSignature, ParameterDescriptor};
use giop::types::{DeclKind, HostType, TypeDescriptor};
use giop::value::{ObjectRef, TaggedProfile, Value, ValueState};
use giop_cdr::{BytesMut, CdrContext, CdrReader, CdrWriter};

fn narrow() -> AttributeSet {
    AttributeSet::empty().with(Attribute::WideCharAllowed(false))
}

fn point_type() -> HostType {
    HostType::named(TypeDescriptor::new(
        "geo::Point",
        DeclKind::Struct {
            fields: vec![("x".into(), HostType::Long), ("y".into(), HostType::Long)],
        },
    ))
}

fn rectangle_type() -> HostType {
    HostType::named(TypeDescriptor::new(
        "geo::Rectangle",
        DeclKind::Struct {
            fields: vec![
                ("top_left".into(), point_type()),
                ("bottom_right".into(), point_type()),
                ("color".into(), HostType::Long),
            ],
        },
    ))
}

fn point(x: i32, y: i32) -> Value {
    Value::Struct(vec![Value::Long(x), Value::Long(y)])
}

/// Marshal a request, run it through the echo server and unmarshal the
/// echoed bytes as a request again
async fn echo_roundtrip(
    client: &TestClient,
    sig: &OperationSignature,
    values: &[Option<Value>],
) -> Vec<Option<Value>> {
    let cs = CodeSetAssignment::DEFAULT;
    let mut buf = BytesMut::new();
    let mut w = CdrWriter::new(&mut buf, CdrContext::BIG_ENDIAN);
    marshal::marshal_request(sig, values, &mut w, &cs).unwrap();

    let reply = client.call("echo", buf.freeze()).await.unwrap();

    let mut r = CdrReader::new(&reply.body, CdrContext::BIG_ENDIAN);
    let slots = marshal::unmarshal_request(sig, &mut r, &cs).unwrap();
    assert_eq!(r.remaining(), 0, "trailing bytes after unmarshal");
    slots
}

fn echo_client() -> TestClient {
    connect_echo(
        registry_with_codesets(CodeSetAssignment::DEFAULT),
        registry_with_codesets(CodeSetAssignment::DEFAULT),
    )
}

#[tokio::test]
async fn test_echo_nested_struct() {
    init_logging();
    let client = echo_client();

    let sig = OperationSignature::with_return(
        HostType::Void,
        vec![ParameterDescriptor::new(
            "rect",
            rectangle_type(),
            Direction::In,
        )],
    );
    let rect = Value::Struct(vec![point(0, 0), point(640, 480), Value::Long(0x00ff_00)]);
    let values = vec![None, Some(rect.clone())];

    let slots = echo_roundtrip(&client, &sig, &values).await;
    assert_eq!(slots[1], Some(rect));
}

#[tokio::test]
async fn test_echo_sequence_of_structs() {
    init_logging();
    let client = echo_client();

    let seq_attrs = AttributeSet::empty().with(Attribute::SequenceMarker);
    let sig = OperationSignature::with_return(
        HostType::Void,
        vec![ParameterDescriptor::new(
            "points",
            HostType::array_of(point_type()),
            Direction::In,
        )
        .with_attributes(seq_attrs)],
    );
    let points = Value::Sequence((0..32).map(|i| point(i, -i)).collect());
    let values = vec![None, Some(points.clone())];

    let slots = echo_roundtrip(&client, &sig, &values).await;
    assert_eq!(slots[1], Some(points));
}

#[tokio::test]
async fn test_echo_boxed_array_without_sequence_hint() {
    init_logging();
    let client = echo_client();

    // No sequence marker: the array travels as a boxed value and null
    // is representable
    let sig = OperationSignature::with_return(
        HostType::Void,
        vec![
            ParameterDescriptor::new("data", HostType::array_of(HostType::Octet), Direction::In),
            ParameterDescriptor::new("gone", HostType::array_of(HostType::Octet), Direction::In),
        ],
    );
    let data = Value::Boxed(Some(Box::new(Value::Sequence(
        (0u8..64).map(Value::Octet).collect(),
    ))));
    let values = vec![None, Some(data.clone()), Some(Value::Boxed(None))];

    let slots = echo_roundtrip(&client, &sig, &values).await;
    assert_eq!(slots[1], Some(data));
    assert_eq!(slots[2], Some(Value::Boxed(None)));
}

#[tokio::test]
async fn test_echo_narrow_and_wide_strings() {
    init_logging();
    let client = echo_client();

    let sig = OperationSignature::with_return(
        HostType::Void,
        vec![
            ParameterDescriptor::new("label", HostType::String, Direction::In)
                .with_attributes(narrow()),
            ParameterDescriptor::new("title", HostType::String, Direction::In),
        ],
    );
    let values = vec![
        None,
        Some(Value::String("résumé".to_string())),
        Some(Value::String("日本語 ✓".to_string())),
    ];

    let slots = echo_roundtrip(&client, &sig, &values).await;
    assert_eq!(slots[1..], values[1..]);
}

#[tokio::test]
async fn test_echo_valuetype_and_exception() {
    init_logging();
    let client = echo_client();

    let snapshot = HostType::named(TypeDescriptor::new(
        "acme::Snapshot",
        DeclKind::ValueSerializable {
            members: vec![
                ("seq".into(), HostType::LongLong),
                ("label".into(), HostType::String),
            ],
        },
    ));
    let not_found = HostType::named(TypeDescriptor::new(
        "acme::NotFound",
        DeclKind::Exception {
            members: vec![("code".into(), HostType::Long)],
        },
    ));
    let sig = OperationSignature::with_return(
        HostType::Void,
        vec![
            ParameterDescriptor::new("snap", snapshot, Direction::In),
            ParameterDescriptor::new("last_error", not_found, Direction::In),
        ],
    );
    let values = vec![
        None,
        Some(Value::ValueObj(Some(ValueState {
            type_id: "IDL:acme/Snapshot:1.0".to_string(),
            members: vec![Value::LongLong(7), Value::String("nightly".to_string())],
        }))),
        Some(Value::Exception(ValueState {
            type_id: "IDL:acme/NotFound:1.0".to_string(),
            members: vec![Value::Long(404)],
        })),
    ];

    let slots = echo_roundtrip(&client, &sig, &values).await;
    assert_eq!(slots[1..], values[1..]);
}

#[tokio::test]
async fn test_echo_object_reference() {
    init_logging();
    let client = echo_client();

    let orders = HostType::named(TypeDescriptor::new("acme::Orders", DeclKind::Remote));
    let sig = OperationSignature::with_return(
        HostType::Void,
        vec![
            ParameterDescriptor::new("target", orders.clone(), Direction::In),
            ParameterDescriptor::new("fallback", orders, Direction::In),
        ],
    );
    let values = vec![
        None,
        Some(Value::ObjectRef(Some(ObjectRef {
            type_id: "IDL:acme/Orders:1.0".to_string(),
            profiles: vec![TaggedProfile {
                tag: 0,
                data: Bytes::from_static(&[0x01, 0x02, 0x00, 0x05]),
            }],
        }))),
        Some(Value::ObjectRef(None)),
    ];

    let slots = echo_roundtrip(&client, &sig, &values).await;
    assert_eq!(slots[1..], values[1..]);
}

#[tokio::test]
async fn test_echo_mixed_directions_request_side() {
    init_logging();
    let client = echo_client();

    // Only In/InOut travel; Out and the return slot stay unset on the
    // far side
    let sig = OperationSignature::with_return(
        HostType::Long,
        vec![
            ParameterDescriptor::new("a", HostType::Double, Direction::In),
            ParameterDescriptor::new("b", HostType::String, Direction::InOut)
                .with_attributes(narrow()),
            ParameterDescriptor::new("c", HostType::Long, Direction::Out),
        ],
    );
    let values = vec![
        None,
        Some(Value::Double(3.25)),
        Some(Value::String("state".to_string())),
        None,
    ];

    let slots = echo_roundtrip(&client, &sig, &values).await;
    assert_eq!(slots[0], None);
    assert_eq!(slots[1], Some(Value::Double(3.25)));
    assert_eq!(slots[2], Some(Value::String("state".to_string())));
    assert_eq!(slots[3], None);
}

#[tokio::test]
async fn test_narrow_string_rejects_unmappable_char() {
    init_logging();

    // Latin-1 is the default narrow codeset; CJK cannot be encoded
    let cs = CodeSetAssignment::DEFAULT;
    let sig = OperationSignature::with_return(
        HostType::Void,
        vec![
            ParameterDescriptor::new("s", HostType::String, Direction::In)
                .with_attributes(narrow()),
        ],
    );
    let values = vec![None, Some(Value::String("漢".to_string()))];

    let mut buf = BytesMut::new();
    let mut w = CdrWriter::new(&mut buf, CdrContext::BIG_ENDIAN);
    let err = marshal::marshal_request(&sig, &values, &mut w, &cs).unwrap_err();
    assert!(matches!(err, GiopError::Cdr(_)));
}

#[tokio::test]
async fn test_large_payload_survives_echo() {
    init_logging();
    let client = echo_client();

    let seq_attrs = AttributeSet::empty().with(Attribute::SequenceMarker);
    let sig = OperationSignature::with_return(
        HostType::Void,
        vec![ParameterDescriptor::new(
            "data",
            HostType::array_of(HostType::Long),
            Direction::In,
        )
        .with_attributes(seq_attrs)],
    );
    let data = Value::Sequence((0..16_384).map(Value::Long).collect());
    let values = vec![None, Some(data.clone())];

    let slots = echo_roundtrip(&client, &sig, &values).await;
    assert_eq!(slots[1], Some(data));
}
