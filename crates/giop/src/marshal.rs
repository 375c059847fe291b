//! Parameter marshalling
//!
//! Decides which parameters of an operation appear in a request or reply
//! body and in what order, delegating per-value work to type-mapping
//! resolution and the CDR codec. Requests carry every In and InOut
//! parameter in declaration order; replies carry the return value first
//! (when non-void), then every Out and InOut parameter in declaration
//! order. Parameters whose direction does not apply to a message kind
//! are skipped on the wire but keep their slot in the decoded result, so
//! callers can always index positionally.

use giop_cdr::{CdrReader, CdrWriter};

use crate::attributes::AttributeSet;
use crate::connection::CodeSetAssignment;
use crate::error::{GiopError, Result};
use crate::types::HostType;
use crate::value::{self, Value};

/// Parameter passing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    InOut,
    /// The return value, synthesized as a pseudo-parameter so it shares
    /// the codec path with real parameters
    Return,
}

impl Direction {
    /// Does a parameter of this direction travel in the request body?
    pub fn in_request(self) -> bool {
        matches!(self, Self::In | Self::InOut)
    }

    /// Does a parameter of this direction travel in the reply body?
    pub fn in_reply(self) -> bool {
        matches!(self, Self::Out | Self::InOut | Self::Return)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "inout",
            Self::Return => "return",
        }
    }
}

/// One declared parameter (or the synthesized return slot)
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: HostType,
    pub direction: Direction,
    pub attributes: AttributeSet,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, ty: HostType, direction: Direction) -> Self {
        Self {
            name: name.into(),
            ty,
            direction,
            attributes: AttributeSet::empty(),
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeSet) -> Self {
        self.attributes = attributes;
        self
    }
}

/// The ordered parameter list of one operation, return slot included
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSignature {
    params: Vec<ParameterDescriptor>,
    has_request_args: bool,
    has_response_args: bool,
}

impl OperationSignature {
    /// Build from an already complete parameter list (which may or may
    /// not contain a Return pseudo-parameter)
    pub fn new(params: Vec<ParameterDescriptor>) -> Self {
        let has_request_args = params.iter().any(|p| p.direction.in_request());
        let has_response_args = params.iter().any(|p| match p.direction {
            Direction::Return => p.ty != HostType::Void,
            other => other.in_reply(),
        });
        Self {
            params,
            has_request_args,
            has_response_args,
        }
    }

    /// Build from a return type and the real parameters; the return
    /// slot is synthesized at index 0
    pub fn with_return(return_ty: HostType, mut params: Vec<ParameterDescriptor>) -> Self {
        let mut all = vec![ParameterDescriptor::new(
            "__return",
            return_ty,
            Direction::Return,
        )];
        all.append(&mut params);
        Self::new(all)
    }

    pub fn params(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// O(1) pre-check, computed at construction: does a request for
    /// this operation carry any body at all? True iff at least one
    /// In/InOut parameter exists.
    pub fn has_request_args(&self) -> bool {
        self.has_request_args
    }

    /// O(1) pre-check, computed at construction: true iff the return
    /// type is non-void or at least one Out/InOut parameter exists
    pub fn has_response_args(&self) -> bool {
        self.has_response_args
    }
}

fn check_slots(sig: &OperationSignature, values: &[Option<Value>]) -> Result<()> {
    if values.len() != sig.len() {
        return Err(GiopError::SlotCountMismatch {
            expected: sig.len(),
            got: values.len(),
        });
    }
    Ok(())
}

fn require_value<'v>(
    param: &ParameterDescriptor,
    slot: &'v Option<Value>,
) -> Result<&'v Value> {
    slot.as_ref().ok_or_else(|| GiopError::MissingValue {
        name: param.name.clone(),
        direction: param.direction.as_str(),
    })
}

/// Serialize the request body: every In and InOut parameter in
/// declaration order. `values` must hold one slot per descriptor;
/// slots for inapplicable directions may be unset. Codec and mapping
/// failures propagate unchanged.
pub fn marshal_request(
    sig: &OperationSignature,
    values: &[Option<Value>],
    w: &mut CdrWriter<'_>,
    codesets: &CodeSetAssignment,
) -> Result<()> {
    check_slots(sig, values)?;
    for (param, slot) in sig.params().iter().zip(values) {
        if param.direction.in_request() {
            let v = require_value(param, slot)?;
            value::encode_value(w, &param.ty, &param.attributes, v, codesets)?;
        }
    }
    Ok(())
}

/// Decode a request body into one slot per descriptor; parameters that
/// do not travel in requests come back present-but-unset
pub fn unmarshal_request(
    sig: &OperationSignature,
    r: &mut CdrReader<'_>,
    codesets: &CodeSetAssignment,
) -> Result<Vec<Option<Value>>> {
    let mut slots = vec![None; sig.len()];
    for (param, slot) in sig.params().iter().zip(slots.iter_mut()) {
        if param.direction.in_request() {
            *slot = Some(value::decode_value(r, &param.ty, &param.attributes, codesets)?);
        }
    }
    Ok(slots)
}

/// Serialize the reply body: the return value first (when non-void),
/// then every Out and InOut parameter in declaration order
pub fn marshal_reply(
    sig: &OperationSignature,
    values: &[Option<Value>],
    w: &mut CdrWriter<'_>,
    codesets: &CodeSetAssignment,
) -> Result<()> {
    check_slots(sig, values)?;
    for (param, slot) in sig.params().iter().zip(values) {
        if param.direction == Direction::Return && param.ty != HostType::Void {
            let v = require_value(param, slot)?;
            value::encode_value(w, &param.ty, &param.attributes, v, codesets)?;
        }
    }
    for (param, slot) in sig.params().iter().zip(values) {
        if matches!(param.direction, Direction::Out | Direction::InOut) {
            let v = require_value(param, slot)?;
            value::encode_value(w, &param.ty, &param.attributes, v, codesets)?;
        }
    }
    Ok(())
}

/// Decode a reply body into one slot per descriptor; the void return
/// slot and request-only parameters come back present-but-unset
pub fn unmarshal_reply(
    sig: &OperationSignature,
    r: &mut CdrReader<'_>,
    codesets: &CodeSetAssignment,
) -> Result<Vec<Option<Value>>> {
    let mut slots = vec![None; sig.len()];
    for (index, param) in sig.params().iter().enumerate() {
        if param.direction == Direction::Return && param.ty != HostType::Void {
            slots[index] = Some(value::decode_value(
                r,
                &param.ty,
                &param.attributes,
                codesets,
            )?);
        }
    }
    for (index, param) in sig.params().iter().enumerate() {
        if matches!(param.direction, Direction::Out | Direction::InOut) {
            slots[index] = Some(value::decode_value(
                r,
                &param.ty,
                &param.attributes,
                codesets,
            )?);
        }
    }
    Ok(slots)
}
