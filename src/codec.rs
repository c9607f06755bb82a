//! Encoding and decoding of CIP scalar values.
//!
//! Everything here is a pure function over byte slices: no state, no
//! allocation beyond the returned buffers. Multi-byte integers are
//! little-endian on the wire, and REAL values travel as their IEEE-754
//! bit pattern in little-endian order.

use std::fmt;

use crate::error::{EipError, Result};

/// CIP elementary data types supported by the tag services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipType {
    /// 8-bit boolean (`0xC1`).
    Bool,
    /// Signed 8-bit integer (`0xC2`).
    Sint,
    /// Signed 16-bit integer (`0xC3`).
    Int,
    /// Signed 32-bit integer (`0xC4`).
    Dint,
    /// IEEE-754 single-precision float (`0xCA`).
    Real,
    /// Unsigned 32-bit integer (`0xD3`).
    Dword,
    /// Length-prefixed string (`0xD0`).
    String,
}

impl CipType {
    /// Wire code for this data type.
    pub const fn code(self) -> u8 {
        match self {
            CipType::Bool => 0xC1,
            CipType::Sint => 0xC2,
            CipType::Int => 0xC3,
            CipType::Dint => 0xC4,
            CipType::Real => 0xCA,
            CipType::Dword => 0xD3,
            CipType::String => 0xD0,
        }
    }

    /// Maps a wire code back to a type, if it is one this crate knows.
    pub const fn from_code(code: u8) -> Option<CipType> {
        match code {
            0xC1 => Some(CipType::Bool),
            0xC2 => Some(CipType::Sint),
            0xC3 => Some(CipType::Int),
            0xC4 => Some(CipType::Dint),
            0xCA => Some(CipType::Real),
            0xD3 => Some(CipType::Dword),
            0xD0 => Some(CipType::String),
            _ => None,
        }
    }
}

impl fmt::Display for CipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CipType::Bool => "BOOL",
            CipType::Sint => "SINT",
            CipType::Int => "INT",
            CipType::Dint => "DINT",
            CipType::Real => "REAL",
            CipType::Dword => "DWORD",
            CipType::String => "STRING",
        };
        f.write_str(name)
    }
}

/// A tag value, tagged with its CIP data type.
///
/// `Raw` holds the undecoded bytes of a data type this crate does not model;
/// it is produced by [`decode_value`] and cannot be written back without a
/// known type code.
#[derive(Debug, Clone, PartialEq)]
pub enum PlcValue {
    /// Boolean value.
    Bool(bool),
    /// 8-bit signed integer.
    Sint(i8),
    /// 16-bit signed integer.
    Int(i16),
    /// 32-bit signed integer.
    Dint(i32),
    /// 32-bit IEEE-754 float.
    Real(f32),
    /// 32-bit unsigned integer.
    Dword(u32),
    /// Text value.
    String(String),
    /// Undecoded bytes of an unknown data type.
    Raw(Vec<u8>),
}

impl PlcValue {
    /// The CIP type this value encodes as, or `None` for [`PlcValue::Raw`].
    pub fn cip_type(&self) -> Option<CipType> {
        match self {
            PlcValue::Bool(_) => Some(CipType::Bool),
            PlcValue::Sint(_) => Some(CipType::Sint),
            PlcValue::Int(_) => Some(CipType::Int),
            PlcValue::Dint(_) => Some(CipType::Dint),
            PlcValue::Real(_) => Some(CipType::Real),
            PlcValue::Dword(_) => Some(CipType::Dword),
            PlcValue::String(_) => Some(CipType::String),
            PlcValue::Raw(_) => None,
        }
    }

    /// Converts the value to its wire representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PlcValue::Bool(v) => encode_bool(*v),
            PlcValue::Sint(v) => encode_sint(*v),
            PlcValue::Int(v) => encode_int(*v),
            PlcValue::Dint(v) => encode_dint(*v),
            PlcValue::Real(v) => encode_real(*v),
            PlcValue::Dword(v) => encode_dword(*v),
            PlcValue::String(v) => encode_string(v),
            PlcValue::Raw(bytes) => bytes.clone(),
        }
    }
}

impl fmt::Display for PlcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlcValue::Bool(v) => write!(f, "{}", v),
            PlcValue::Sint(v) => write!(f, "{}", v),
            PlcValue::Int(v) => write!(f, "{}", v),
            PlcValue::Dint(v) => write!(f, "{}", v),
            PlcValue::Real(v) => write!(f, "{}", v),
            PlcValue::Dword(v) => write!(f, "{}", v),
            PlcValue::String(v) => f.write_str(v),
            PlcValue::Raw(bytes) => write!(f, "{:02X?}", bytes),
        }
    }
}

fn short(what: &str, need: usize, have: usize) -> EipError {
    EipError::parse(format!(
        "not enough data for {}: need {} bytes, have {}",
        what, need, have
    ))
}

/// Encodes a BOOL. True is `0x01`; the decoder accepts any non-zero byte.
pub fn encode_bool(value: bool) -> Vec<u8> {
    vec![u8::from(value)]
}

/// Decodes a BOOL: false iff the byte is zero.
pub fn decode_bool(data: &[u8]) -> Result<bool> {
    match data.first() {
        Some(b) => Ok(*b != 0),
        None => Err(short("BOOL", 1, 0)),
    }
}

/// Encodes a SINT.
pub fn encode_sint(value: i8) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decodes a SINT.
pub fn decode_sint(data: &[u8]) -> Result<i8> {
    match data.first() {
        Some(b) => Ok(*b as i8),
        None => Err(short("SINT", 1, 0)),
    }
}

/// Encodes an INT, little-endian.
pub fn encode_int(value: i16) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decodes an INT, little-endian.
pub fn decode_int(data: &[u8]) -> Result<i16> {
    if data.len() < 2 {
        return Err(short("INT", 2, data.len()));
    }
    Ok(i16::from_le_bytes([data[0], data[1]]))
}

/// Encodes a DINT, little-endian.
pub fn encode_dint(value: i32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decodes a DINT, little-endian.
pub fn decode_dint(data: &[u8]) -> Result<i32> {
    if data.len() < 4 {
        return Err(short("DINT", 4, data.len()));
    }
    Ok(i32::from_le_bytes([data[0], data[1], data[2], data[3]]))
}

/// Encodes a REAL as its IEEE-754 bit pattern, little-endian.
pub fn encode_real(value: f32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decodes a REAL from its IEEE-754 bit pattern, little-endian.
pub fn decode_real(data: &[u8]) -> Result<f32> {
    if data.len() < 4 {
        return Err(short("REAL", 4, data.len()));
    }
    Ok(f32::from_le_bytes([data[0], data[1], data[2], data[3]]))
}

/// Encodes a DWORD, little-endian.
pub fn encode_dword(value: u32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decodes a DWORD, little-endian.
pub fn decode_dword(data: &[u8]) -> Result<u32> {
    if data.len() < 4 {
        return Err(short("DWORD", 4, data.len()));
    }
    Ok(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
}

/// Encodes a STRING: u16 little-endian length prefix followed by the bytes.
pub fn encode_string(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(2 + bytes.len());
    out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    out.extend_from_slice(bytes);
    out
}

/// Decodes a STRING: u16 little-endian length prefix followed by the bytes.
///
/// Non-UTF-8 bytes are replaced rather than rejected; controllers are not
/// strict about their character sets.
pub fn decode_string(data: &[u8]) -> Result<String> {
    if data.len() < 2 {
        return Err(short("STRING header", 2, data.len()));
    }
    let len = u16::from_le_bytes([data[0], data[1]]) as usize;
    if data.len() < 2 + len {
        return Err(short("STRING", 2 + len, data.len()));
    }
    Ok(String::from_utf8_lossy(&data[2..2 + len]).into_owned())
}

/// Encodes a value to its wire bytes. Equivalent to [`PlcValue::to_bytes`].
pub fn encode_value(value: &PlcValue) -> Vec<u8> {
    value.to_bytes()
}

/// Decodes value bytes declared with the given [`CipType`].
pub fn decode_scalar(ty: CipType, data: &[u8]) -> Result<PlcValue> {
    match ty {
        CipType::Bool => decode_bool(data).map(PlcValue::Bool),
        CipType::Sint => decode_sint(data).map(PlcValue::Sint),
        CipType::Int => decode_int(data).map(PlcValue::Int),
        CipType::Dint => decode_dint(data).map(PlcValue::Dint),
        CipType::Real => decode_real(data).map(PlcValue::Real),
        CipType::Dword => decode_dword(data).map(PlcValue::Dword),
        CipType::String => decode_string(data).map(PlcValue::String),
    }
}

/// Decodes value bytes tagged with a raw data-type code.
///
/// Codes outside the table come back as [`PlcValue::Raw`] so callers can
/// still see what the controller sent.
pub fn decode_value(code: u8, data: &[u8]) -> Result<PlcValue> {
    match CipType::from_code(code) {
        Some(ty) => decode_scalar(ty, data),
        None => Ok(PlcValue::Raw(data.to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trips() {
        assert!(decode_bool(&encode_bool(true)).unwrap());
        assert!(!decode_bool(&encode_bool(false)).unwrap());
        for v in [i8::MIN, -1, 0, 1, i8::MAX] {
            assert_eq!(decode_sint(&encode_sint(v)).unwrap(), v);
        }
        for v in [i16::MIN, -257, 0, 1, i16::MAX] {
            assert_eq!(decode_int(&encode_int(v)).unwrap(), v);
        }
        for v in [i32::MIN, -70000, 0, 42, i32::MAX] {
            assert_eq!(decode_dint(&encode_dint(v)).unwrap(), v);
        }
        for v in [0.0f32, -1.5, 3.14159, f32::MIN, f32::MAX] {
            assert_eq!(decode_real(&encode_real(v)).unwrap(), v);
        }
        for v in [0u32, 1, 0xDEAD_BEEF, u32::MAX] {
            assert_eq!(decode_dword(&encode_dword(v)).unwrap(), v);
        }
        for v in ["", "a", "Counter", "position register"] {
            assert_eq!(decode_string(&encode_string(v)).unwrap(), v);
        }
    }

    #[test]
    fn wire_layout_is_little_endian() {
        assert_eq!(encode_dint(42), vec![0x2A, 0x00, 0x00, 0x00]);
        assert_eq!(encode_int(-2), vec![0xFE, 0xFF]);
        assert_eq!(encode_dword(0x0102_0304), vec![0x04, 0x03, 0x02, 0x01]);
        // 1.0f32 = 0x3F800000
        assert_eq!(encode_real(1.0), vec![0x00, 0x00, 0x80, 0x3F]);
        assert_eq!(encode_string("ab"), vec![0x02, 0x00, b'a', b'b']);
    }

    #[test]
    fn bool_decodes_nonzero_as_true() {
        assert!(decode_bool(&[0xFF]).unwrap());
        assert!(decode_bool(&[0x01]).unwrap());
        assert!(!decode_bool(&[0x00]).unwrap());
    }

    #[test]
    fn shortage_is_a_parse_error() {
        for err in [
            decode_int(&[0x01]).unwrap_err(),
            decode_dint(&[0x01, 0x02]).unwrap_err(),
            decode_real(&[]).unwrap_err(),
            decode_string(&[0x05, 0x00, b'a']).unwrap_err(),
        ] {
            assert!(matches!(err, EipError::Parse(_)), "got {:?}", err);
        }
    }

    #[test]
    fn value_round_trips_through_tagged_union() {
        let values = [
            PlcValue::Bool(true),
            PlcValue::Sint(-5),
            PlcValue::Int(1234),
            PlcValue::Dint(-123456),
            PlcValue::Real(2.5),
            PlcValue::Dword(0xCAFE_F00D),
            PlcValue::String("Hello PLC".to_string()),
        ];
        for value in values {
            let ty = value.cip_type().unwrap();
            let decoded = decode_value(ty.code(), &value.to_bytes()).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn unknown_type_code_decodes_raw() {
        let decoded = decode_value(0xA0, &[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(decoded, PlcValue::Raw(vec![0x01, 0x02, 0x03]));
        assert_eq!(decoded.cip_type(), None);
    }

    #[test]
    fn type_codes_round_trip() {
        for ty in [
            CipType::Bool,
            CipType::Sint,
            CipType::Int,
            CipType::Dint,
            CipType::Real,
            CipType::Dword,
            CipType::String,
        ] {
            assert_eq!(CipType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(CipType::from_code(0x00), None);
        assert_eq!(CipType::from_code(0xA0), None);
    }

    #[test]
    fn display_matches_monitor_expectations() {
        assert_eq!(PlcValue::Dint(42).to_string(), "42");
        assert_eq!(PlcValue::Bool(true).to_string(), "true");
        assert_eq!(PlcValue::String("run".into()).to_string(), "run");
    }
}
