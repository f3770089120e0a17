//! Conversion between vector values and raw binary blocks.

use crate::buffer::is_empty_value;
use crate::error::{Error, Result};
use core::fmt;
use core::str::FromStr;

/// Element formats understood by [`decode`] and [`encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericFormat {
    /// Signed 8-bit integer.
    I1,
    /// Signed 16-bit integer.
    I2,
    /// Signed 32-bit integer.
    I4,
    /// Signed 64-bit integer.
    I8,
    /// Unsigned 8-bit integer.
    U1,
    /// Unsigned 16-bit integer.
    U2,
    /// Unsigned 32-bit integer.
    U4,
    /// Unsigned 64-bit integer.
    U8,
    /// IEEE single precision.
    R4,
    /// IEEE double precision.
    R8,
}

impl NumericFormat {
    /// Bytes per element.
    pub fn size(self) -> usize {
        match self {
            NumericFormat::I1 | NumericFormat::U1 => 1,
            NumericFormat::I2 | NumericFormat::U2 => 2,
            NumericFormat::I4 | NumericFormat::U4 | NumericFormat::R4 => 4,
            NumericFormat::I8 | NumericFormat::U8 | NumericFormat::R8 => 8,
        }
    }

    /// True for the floating point formats.
    pub fn is_real(self) -> bool {
        matches!(self, NumericFormat::R4 | NumericFormat::R8)
    }
}

impl FromStr for NumericFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "i1" => NumericFormat::I1,
            "i2" => NumericFormat::I2,
            "i4" => NumericFormat::I4,
            "i8" => NumericFormat::I8,
            "u1" => NumericFormat::U1,
            "u2" => NumericFormat::U2,
            "u4" => NumericFormat::U4,
            "u8" => NumericFormat::U8,
            "r4" => NumericFormat::R4,
            "r8" => NumericFormat::R8,
            other => {
                return Err(Error::invalid_arg(
                    other,
                    "expected one of i1 i2 i4 i8 u1 u2 u4 u8 r4 r8",
                ))
            }
        })
    }
}

impl fmt::Display for NumericFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            NumericFormat::I1 => "i1",
            NumericFormat::I2 => "i2",
            NumericFormat::I4 => "i4",
            NumericFormat::I8 => "i8",
            NumericFormat::U1 => "u1",
            NumericFormat::U2 => "u2",
            NumericFormat::U4 => "u4",
            NumericFormat::U8 => "u8",
            NumericFormat::R4 => "r4",
            NumericFormat::R8 => "r8",
        };
        f.write_str(tag)
    }
}

/// Byte order of a binary block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
    /// The byte order of this machine.
    #[default]
    Native,
}

impl ByteOrder {
    fn is_little(self) -> bool {
        match self {
            ByteOrder::Little => true,
            ByteOrder::Big => false,
            ByteOrder::Native => cfg!(target_endian = "little"),
        }
    }
}

impl FromStr for ByteOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "little" => Ok(ByteOrder::Little),
            "big" => Ok(ByteOrder::Big),
            "native" => Ok(ByteOrder::Native),
            other => Err(Error::invalid_arg(other, "expected little, big or native")),
        }
    }
}

macro_rules! read_as {
    ($ty:ty, $chunk:expr, $little:expr) => {{
        let mut raw = [0u8; core::mem::size_of::<$ty>()];
        raw.copy_from_slice($chunk);
        if $little {
            <$ty>::from_le_bytes(raw) as f64
        } else {
            <$ty>::from_be_bytes(raw) as f64
        }
    }};
}

macro_rules! write_as {
    ($out:expr, $value:expr, $little:expr) => {{
        let value = $value;
        if $little {
            $out.extend_from_slice(&value.to_le_bytes());
        } else {
            $out.extend_from_slice(&value.to_be_bytes());
        }
    }};
}

/// Convert a raw block into values. The block length must be a multiple of
/// the element size.
pub fn decode(bytes: &[u8], format: NumericFormat, order: ByteOrder) -> Result<Vec<f64>> {
    let size = format.size();
    if bytes.len() % size != 0 {
        return Err(Error::invalid_arg(
            "bytes",
            format!(
                "{} bytes is not a whole number of {format} elements",
                bytes.len()
            ),
        ));
    }
    let little = order.is_little();
    let values = bytes
        .chunks_exact(size)
        .map(|chunk| match format {
            NumericFormat::I1 => read_as!(i8, chunk, little),
            NumericFormat::I2 => read_as!(i16, chunk, little),
            NumericFormat::I4 => read_as!(i32, chunk, little),
            NumericFormat::I8 => read_as!(i64, chunk, little),
            NumericFormat::U1 => read_as!(u8, chunk, little),
            NumericFormat::U2 => read_as!(u16, chunk, little),
            NumericFormat::U4 => read_as!(u32, chunk, little),
            NumericFormat::U8 => read_as!(u64, chunk, little),
            NumericFormat::R4 => read_as!(f32, chunk, little),
            NumericFormat::R8 => read_as!(f64, chunk, little),
        })
        .collect();
    Ok(values)
}

/// Convert values into a raw block.
///
/// Integer formats round to the nearest integer and saturate at the
/// format's bounds. Empty elements are dropped when `skip_empty` is set and
/// rejected for integer formats otherwise.
pub fn encode(
    values: &[f64],
    format: NumericFormat,
    order: ByteOrder,
    skip_empty: bool,
) -> Result<Vec<u8>> {
    let little = order.is_little();
    let mut out = Vec::with_capacity(values.len() * format.size());
    for &value in values {
        if is_empty_value(value) {
            if skip_empty {
                continue;
            }
            if !format.is_real() {
                return Err(Error::invalid_arg(
                    format.to_string(),
                    "empty elements can't be stored as integers",
                ));
            }
        }
        let rounded = value.round();
        match format {
            NumericFormat::I1 => write_as!(out, rounded as i8, little),
            NumericFormat::I2 => write_as!(out, rounded as i16, little),
            NumericFormat::I4 => write_as!(out, rounded as i32, little),
            NumericFormat::I8 => write_as!(out, rounded as i64, little),
            NumericFormat::U1 => write_as!(out, rounded as u8, little),
            NumericFormat::U2 => write_as!(out, rounded as u16, little),
            NumericFormat::U4 => write_as!(out, rounded as u32, little),
            NumericFormat::U8 => write_as!(out, rounded as u64, little),
            NumericFormat::R4 => write_as!(out, value as f32, little),
            NumericFormat::R8 => write_as!(out, value, little),
        }
    }
    Ok(out)
}
