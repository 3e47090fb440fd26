use crate::specifier::{FloatWidth, IntWidth, ScalarKind};
use std::borrow::Cow;
use std::fmt;
use std::os::raw::{c_long, c_ulong};

/// A value extracted by a conversion directive
///
/// The variant follows directly from the directive's resolved target: `%hhd`
/// yields `I8`, `%lu` yields `ULong`, `%s` yields `Bytes`, `%ls` yields
/// `Wide`, and so on.
///
/// ```
/// use fmtscan::Value;
///
/// let values = fmtscan::scan("%d %s", b"42 abc").unwrap();
/// assert_eq!(values, vec![Value::I32(42), Value::Bytes(b"abc".to_vec())]);
/// assert_eq!(values[1].to_utf8().as_deref(), Some("abc"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    Long(c_long),
    ULong(c_ulong),
    I64(i64),
    U64(u64),
    Isize(isize),
    Usize(usize),
    F32(f32),
    F64(f64),

    /// `%p`
    Pointer(usize),

    /// Contents of a byte buffer up to its terminator
    Bytes(Vec<u8>),

    /// Contents of a wide character buffer up to its terminator
    Wide(String),
}

impl Value {
    /// The zero value a scratch slot of the given kind starts as
    pub(crate) fn zero(kind: ScalarKind) -> Value {
        match kind {
            ScalarKind::Float(width) => Value::float(width, 0.0),
            _ => Value::integer(kind, 0),
        }
    }

    /// Truncates the two's complement bit pattern to the given kind
    pub(crate) fn integer(kind: ScalarKind, bits: u64) -> Value {
        match kind {
            ScalarKind::Signed(width) => match width {
                IntWidth::Char => Value::I8(bits as i8),
                IntWidth::Short => Value::I16(bits as i16),
                IntWidth::Int => Value::I32(bits as i32),
                IntWidth::Long => Value::Long(bits as c_long),
                IntWidth::LongLong | IntWidth::Max => Value::I64(bits as i64),
                IntWidth::Size | IntWidth::PtrDiff => Value::Isize(bits as isize),
            },
            ScalarKind::Unsigned(width) => match width {
                IntWidth::Char => Value::U8(bits as u8),
                IntWidth::Short => Value::U16(bits as u16),
                IntWidth::Int => Value::U32(bits as u32),
                IntWidth::Long => Value::ULong(bits as c_ulong),
                IntWidth::LongLong | IntWidth::Max => Value::U64(bits),
                IntWidth::Size | IntWidth::PtrDiff => Value::Usize(bits as usize),
            },
            ScalarKind::Pointer => Value::Pointer(bits as usize),
            ScalarKind::Float(width) => Value::float(width, bits as f64),
        }
    }

    pub(crate) fn float(width: FloatWidth, value: f64) -> Value {
        match width {
            FloatWidth::Single => Value::F32(value as f32),
            FloatWidth::Double | FloatWidth::Extended => Value::F64(value),
        }
    }

    /// Returns the value as an `i64` if it is a signed integer
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(x) => Some(i64::from(x)),
            Value::I16(x) => Some(i64::from(x)),
            Value::I32(x) => Some(i64::from(x)),
            #[allow(clippy::unnecessary_cast)]
            Value::Long(x) => Some(x as i64),
            Value::I64(x) => Some(x),
            Value::Isize(x) => Some(x as i64),
            _ => None,
        }
    }

    /// Returns the value as a `u64` if it is an unsigned integer or pointer
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(x) => Some(u64::from(x)),
            Value::U16(x) => Some(u64::from(x)),
            Value::U32(x) => Some(u64::from(x)),
            #[allow(clippy::unnecessary_cast)]
            Value::ULong(x) => Some(x as u64),
            Value::U64(x) => Some(x),
            Value::Usize(x) | Value::Pointer(x) => Some(x as u64),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is a float
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(x) => Some(f64::from(x)),
            Value::F64(x) => Some(x),
            _ => None,
        }
    }

    /// Returns if the value came from a text buffer
    pub fn is_text(&self) -> bool {
        matches!(self, Value::Bytes(_) | Value::Wide(_))
    }

    /// Converts text values into utf8, replacing invalid byte sequences.
    /// Allocates only when the bytes are not valid utf8.
    ///
    /// ```
    /// use fmtscan::Value;
    ///
    /// assert_eq!(Value::Bytes(b"abc".to_vec()).to_utf8().as_deref(), Some("abc"));
    /// assert_eq!(Value::Bytes(vec![b'a', 0xff]).to_utf8().as_deref(), Some("a\u{fffd}"));
    /// assert_eq!(Value::Wide(String::from("äüöß")).to_utf8().as_deref(), Some("äüöß"));
    /// assert_eq!(Value::I32(1).to_utf8(), None);
    /// ```
    pub fn to_utf8(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Bytes(x) => Some(String::from_utf8_lossy(x)),
            Value::Wide(x) => Some(Cow::Borrowed(x.as_str())),
            _ => None,
        }
    }
}

#[cfg(feature = "faster_writer")]
fn write_int<I: itoa::Integer>(f: &mut fmt::Formatter<'_>, x: I) -> fmt::Result {
    let mut buffer = itoa::Buffer::new();
    f.write_str(buffer.format(x))
}

#[cfg(not(feature = "faster_writer"))]
fn write_int<I: fmt::Display>(f: &mut fmt::Formatter<'_>, x: I) -> fmt::Result {
    write!(f, "{}", x)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I8(x) => write_int(f, *x),
            Value::U8(x) => write_int(f, *x),
            Value::I16(x) => write_int(f, *x),
            Value::U16(x) => write_int(f, *x),
            Value::I32(x) => write_int(f, *x),
            Value::U32(x) => write_int(f, *x),
            Value::Long(x) => write_int(f, *x),
            Value::ULong(x) => write_int(f, *x),
            Value::I64(x) => write_int(f, *x),
            Value::U64(x) => write_int(f, *x),
            Value::Isize(x) => write_int(f, *x),
            Value::Usize(x) => write_int(f, *x),
            Value::F32(x) => write!(f, "{}", x),
            Value::F64(x) => write!(f, "{}", x),
            Value::Pointer(x) => write!(f, "{:#x}", x),
            Value::Bytes(x) => f.write_str(&String::from_utf8_lossy(x)),
            Value::Wide(x) => f.write_str(x),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Value::I8(x) => serializer.serialize_i8(*x),
            Value::U8(x) => serializer.serialize_u8(*x),
            Value::I16(x) => serializer.serialize_i16(*x),
            Value::U16(x) => serializer.serialize_u16(*x),
            Value::I32(x) => serializer.serialize_i32(*x),
            Value::U32(x) => serializer.serialize_u32(*x),
            #[allow(clippy::unnecessary_cast)]
            Value::Long(x) => serializer.serialize_i64(*x as i64),
            #[allow(clippy::unnecessary_cast)]
            Value::ULong(x) => serializer.serialize_u64(*x as u64),
            Value::I64(x) => serializer.serialize_i64(*x),
            Value::U64(x) => serializer.serialize_u64(*x),
            Value::Isize(x) => serializer.serialize_i64(*x as i64),
            Value::Usize(x) | Value::Pointer(x) => serializer.serialize_u64(*x as u64),
            Value::F32(x) => serializer.serialize_f32(*x),
            Value::F64(x) => serializer.serialize_f64(*x),
            Value::Bytes(x) => serializer.serialize_str(&String::from_utf8_lossy(x)),
            Value::Wide(x) => serializer.serialize_str(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(ScalarKind::Signed(IntWidth::Char), 0x1ff, Value::I8(-1))]
    #[case(ScalarKind::Unsigned(IntWidth::Char), 0x1ff, Value::U8(255))]
    #[case(ScalarKind::Signed(IntWidth::Short), (-2i64) as u64, Value::I16(-2))]
    #[case(ScalarKind::Unsigned(IntWidth::Int), u64::MAX, Value::U32(u32::MAX))]
    #[case(ScalarKind::Signed(IntWidth::LongLong), (-5i64) as u64, Value::I64(-5))]
    #[case(ScalarKind::Unsigned(IntWidth::Max), 7, Value::U64(7))]
    #[case(ScalarKind::Signed(IntWidth::PtrDiff), 3, Value::Isize(3))]
    #[case(ScalarKind::Unsigned(IntWidth::Size), 3, Value::Usize(3))]
    #[case(ScalarKind::Pointer, 0xdead, Value::Pointer(0xdead))]
    fn integer_truncation(#[case] kind: ScalarKind, #[case] bits: u64, #[case] expected: Value) {
        assert_eq!(Value::integer(kind, bits), expected);
    }

    #[test]
    fn zero_values() {
        assert_eq!(
            Value::zero(ScalarKind::Float(FloatWidth::Single)),
            Value::F32(0.0)
        );
        assert_eq!(
            Value::zero(ScalarKind::Float(FloatWidth::Extended)),
            Value::F64(0.0)
        );
        assert_eq!(Value::zero(ScalarKind::Signed(IntWidth::Long)), Value::Long(0));
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::I8(-8).to_string(), "-8");
        assert_eq!(Value::ULong(12).to_string(), "12");
        assert_eq!(Value::F64(1.5).to_string(), "1.5");
        assert_eq!(Value::Pointer(255).to_string(), "0xff");
        assert_eq!(Value::Bytes(b"abc".to_vec()).to_string(), "abc");
        assert_eq!(Value::Wide(String::from("äß")).to_string(), "äß");
    }

    #[test]
    fn value_accessors() {
        assert_eq!(Value::Long(-3).as_i64(), Some(-3));
        assert_eq!(Value::U16(3).as_i64(), None);
        assert_eq!(Value::Pointer(3).as_u64(), Some(3));
        assert_eq!(Value::F32(0.5).as_f64(), Some(0.5));
        assert!(Value::Wide(String::new()).is_text());
        assert!(!Value::U8(0).is_text());
    }
}
