//! Element data types
//!
//! Payloads are persisted as little-endian fixed-width elements. The
//! [`Element`] trait ties a Rust scalar to its [`DataType`] tag and its
//! byte encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Element type of a data array's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
}

impl DataType {
    /// Width of one element in bytes
    pub fn size(&self) -> usize {
        match self {
            DataType::Bool | DataType::Int8 | DataType::UInt8 => 1,
            DataType::Int16 | DataType::UInt16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float => 4,
            DataType::Int64 | DataType::UInt64 | DataType::Double => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Float => "float",
            DataType::Double => "double",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, DataType::Bool)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scalar that can be stored in a data array
pub trait Element: Copy + Default {
    const DATA_TYPE: DataType;

    /// Append the little-endian encoding of `self`
    fn encode(&self, out: &mut Vec<u8>);

    /// Decode from exactly `DATA_TYPE.size()` bytes
    fn decode(bytes: &[u8]) -> Self;

    /// Lossy view as `f64`, used for calibration
    fn to_f64(self) -> f64;
}

macro_rules! impl_element_numeric {
    ($ty:ty, $dtype:ident) => {
        impl Element for $ty {
            const DATA_TYPE: DataType = DataType::$dtype;

            fn encode(&self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn decode(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(bytes);
                <$ty>::from_le_bytes(buf)
            }

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_element_numeric!(i8, Int8);
impl_element_numeric!(i16, Int16);
impl_element_numeric!(i32, Int32);
impl_element_numeric!(i64, Int64);
impl_element_numeric!(u8, UInt8);
impl_element_numeric!(u16, UInt16);
impl_element_numeric!(u32, UInt32);
impl_element_numeric!(u64, UInt64);
impl_element_numeric!(f32, Float);
impl_element_numeric!(f64, Double);

impl Element for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn encode(&self, out: &mut Vec<u8>) {
        out.push(u8::from(*self));
    }

    fn decode(bytes: &[u8]) -> Self {
        bytes.first().map_or(false, |&b| b != 0)
    }

    fn to_f64(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}

/// Encode a slice of elements
pub fn encode_all<T: Element>(values: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * T::DATA_TYPE.size());
    for v in values {
        v.encode(&mut out);
    }
    out
}

/// Decode `bytes` into `out`; `bytes` must hold exactly `out.len()` elements
pub fn decode_into<T: Element>(bytes: &[u8], out: &mut [T]) {
    for (slot, chunk) in out
        .iter_mut()
        .zip(bytes.chunks_exact(T::DATA_TYPE.size()))
    {
        *slot = T::decode(chunk);
    }
}
