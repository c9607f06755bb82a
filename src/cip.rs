//! CIP service requests and responses.
//!
//! Builders assemble the byte form of Read Tag / Write Tag service requests;
//! parsers validate replies and map general-status bytes into
//! [`EipError::CipStatus`]. The request bytes produced here are what goes
//! inside a Send RR Data encapsulation payload.

use crate::codec::{decode_scalar, CipType, PlcValue};
use crate::error::{EipError, Result};
use crate::tag_path::{build_symbolic_path, path_words};

/// Get Attribute All.
pub const SERVICE_GET_ATTRIBUTE_ALL: u8 = 0x01;
/// Get Attribute List.
pub const SERVICE_GET_ATTRIBUTE_LIST: u8 = 0x03;
/// Set Attribute List.
pub const SERVICE_SET_ATTRIBUTE_LIST: u8 = 0x04;
/// Reset.
pub const SERVICE_RESET: u8 = 0x05;
/// Start.
pub const SERVICE_START: u8 = 0x06;
/// Stop.
pub const SERVICE_STOP: u8 = 0x07;
/// Create.
pub const SERVICE_CREATE: u8 = 0x08;
/// Delete.
pub const SERVICE_DELETE: u8 = 0x09;
/// Multiple Service Packet.
pub const SERVICE_MULTIPLE_SERVICE: u8 = 0x0A;
/// Read Tag.
pub const SERVICE_READ_TAG: u8 = 0x4C;
/// Write Tag.
pub const SERVICE_WRITE_TAG: u8 = 0x4D;
/// Read Modify Write Tag.
pub const SERVICE_READ_MODIFY: u8 = 0x4E;

/// High bit of the service code; set in every reply, clear in every request.
pub const REPLY_BIT: u8 = 0x80;

/// Builds a Read Tag service request.
///
/// Layout: service code, request-path size in words, request path, element
/// count (u16 little-endian). `elements` is 1 for scalar reads.
pub fn build_read_request(tag_name: &str, elements: u16) -> Vec<u8> {
    let path = build_symbolic_path(tag_name);

    let mut request = Vec::with_capacity(4 + path.len());
    request.push(SERVICE_READ_TAG);
    request.push(path_words(path.len()));
    request.extend_from_slice(&path);
    request.extend_from_slice(&elements.to_le_bytes());
    request
}

/// Builds a Write Tag service request.
///
/// Layout: service code, request-path size in words, request path, data-type
/// code, element count (always 1), value bytes.
pub fn build_write_request(tag_name: &str, type_code: u8, data: &[u8]) -> Vec<u8> {
    let path = build_symbolic_path(tag_name);

    let mut request = Vec::with_capacity(4 + path.len() + data.len());
    request.push(SERVICE_WRITE_TAG);
    request.push(path_words(path.len()));
    request.extend_from_slice(&path);
    request.push(type_code);
    request.push(1);
    request.extend_from_slice(data);
    request
}

/// Parses a CIP reply and returns the service-specific tail.
///
/// Checks the reply bit in the service code and maps a non-zero general
/// status (at offset 1) through the status table. The tail starts at offset
/// 2: this is the simplified layout with zero extended-status words. For
/// controllers that transmit an extended-status count, use
/// [`parse_response_extended`].
pub fn parse_response(response: &[u8]) -> Result<&[u8]> {
    if response.len() < 2 {
        return Err(EipError::parse("response too short"));
    }
    if response[0] & REPLY_BIT == 0 {
        return Err(EipError::parse("not a response"));
    }

    let status = response[1];
    if status != 0 {
        return Err(EipError::CipStatus {
            code: status,
            description: status_description(status),
        });
    }

    Ok(&response[2..])
}

/// Parses a CIP reply whose byte at offset 2 is an extended-status word
/// count, followed by that many 16-bit status words, then the tail.
///
/// Some controllers transmit the count byte even on success; the default
/// [`parse_response`] would misread it as payload there. This variant is the
/// compatibility escape hatch and is otherwise identical.
pub fn parse_response_extended(response: &[u8]) -> Result<&[u8]> {
    if response.len() < 3 {
        return Err(EipError::parse("response too short"));
    }
    if response[0] & REPLY_BIT == 0 {
        return Err(EipError::parse("not a response"));
    }

    let status = response[1];
    if status != 0 {
        return Err(EipError::CipStatus {
            code: status,
            description: status_description(status),
        });
    }

    let tail = 3 + 2 * response[2] as usize;
    if response.len() < tail {
        return Err(EipError::parse(format!(
            "extended status overruns response: {} words in {} bytes",
            response[2],
            response.len()
        )));
    }
    Ok(&response[tail..])
}

/// Parses a Read Tag reply into a typed value.
///
/// After the generic parse, the tail must hold the data-type code, the
/// element count, and the value bytes. A data-type code different from
/// `expected` is a [`EipError::TypeMismatch`].
pub fn parse_read_response(response: &[u8], expected: CipType) -> Result<PlcValue> {
    let data = parse_response(response)?;

    if data.len() < 2 {
        return Err(EipError::parse("read reply too short for its type header"));
    }

    let actual = data[0];
    if actual != expected.code() {
        return Err(EipError::TypeMismatch {
            expected: expected.code(),
            actual,
        });
    }

    // data[1] is the element count; single-element reads don't consult it.
    decode_scalar(expected, &data[2..])
}

/// Human-readable description for a CIP general status code.
pub fn status_description(status: u8) -> &'static str {
    match status {
        0x00 => "Success",
        0x01 => "Connection failure",
        0x02 => "Resource unavailable",
        0x03 => "Invalid parameter value",
        0x04 => "Path segment error",
        0x05 => "Path destination unknown",
        0x06 => "Partial transfer",
        0x07 => "Connection lost",
        0x08 => "Service not supported",
        0x09 => "Invalid attribute value",
        0x0A => "Attribute list error",
        0x0B => "Already in requested mode/state",
        0x0C => "Object state conflict",
        0x0D => "Object already exists",
        0x0E => "Attribute not settable",
        0x0F => "Privilege violation",
        0x10 => "Device state conflict",
        0x11 => "Reply data too large",
        0x12 => "Fragmentation of a primitive value",
        0x13 => "Not enough data",
        0x14 => "Attribute not supported",
        0x15 => "Too much data",
        0x16 => "Object does not exist",
        0x17 => "Service fragmentation sequence not in progress",
        0x18 => "No stored attribute data",
        0x19 => "Store operation failure",
        0x1A => "Routing failure, request packet too large",
        0x1B => "Routing failure, response packet too large",
        0x1C => "Missing attribute list entry data",
        0x1D => "Invalid attribute value list",
        0x1E => "Embedded service error",
        0x1F => "Vendor specific error",
        0x20 => "Invalid parameter",
        0x21 => "Write-once value or medium already written",
        0x22 => "Invalid reply received",
        0x23 => "Buffer overflow",
        0x24 => "Invalid message format",
        0x25 => "Key failure in path",
        0x26 => "Path size invalid",
        0x27 => "Unexpected attribute in list",
        0x28 => "Invalid member ID",
        0x29 => "Member not settable",
        0xFF => "General Error",
        _ => "Unknown error",
    }
}
