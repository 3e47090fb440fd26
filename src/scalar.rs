//! Primitives that recognize the next numeric token at the start of a slice
//! of units. Each returns the converted value along with the number of units
//! consumed, or `None` when no valid token starts there. Width limits are
//! applied by the caller, which hands in an already truncated slice.

use crate::specifier::Radix;
use crate::text::Unit;

/// A recognized floating point token
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FloatToken {
    /// Decimal notation normalized to ascii so that it can be rounded
    /// directly to the target width
    Decimal(String),

    /// Hexadecimal notation: `mantissa * 2^exponent`, where `sticky` marks
    /// nonzero digits that did not fit in the mantissa
    Hex {
        negative: bool,
        mantissa: u64,
        sticky: bool,
        exponent: i64,
    },

    /// `inf`, `infinity` and `nan`
    Special(f64),
}

impl FloatToken {
    pub(crate) fn to_f64(&self) -> Option<f64> {
        match *self {
            FloatToken::Decimal(ref x) => x.parse().ok(),
            FloatToken::Hex {
                negative,
                mantissa,
                sticky,
                exponent,
            } => {
                let x = f64::from_bits(round_binary(mantissa, sticky, exponent, &DOUBLE));
                Some(if negative { -x } else { x })
            }
            FloatToken::Special(x) => Some(x),
        }
    }

    pub(crate) fn to_f32(&self) -> Option<f32> {
        match *self {
            FloatToken::Decimal(ref x) => x.parse().ok(),
            FloatToken::Hex {
                negative,
                mantissa,
                sticky,
                exponent,
            } => {
                let bits = round_binary(mantissa, sticky, exponent, &SINGLE);
                let x = f32::from_bits(bits as u32);
                Some(if negative { -x } else { x })
            }
            FloatToken::Special(x) => Some(x as f32),
        }
    }
}

/// Layout of an IEEE 754 binary format
struct BinaryFormat {
    /// Significand bits, the implicit leading bit included
    digits: i64,
    min_exp: i64,
    max_exp: i64,
}

const DOUBLE: BinaryFormat = BinaryFormat {
    digits: 53,
    min_exp: -1022,
    max_exp: 1023,
};

const SINGLE: BinaryFormat = BinaryFormat {
    digits: 24,
    min_exp: -126,
    max_exp: 127,
};

/// Rounds `mantissa * 2^exponent` to nearest, ties to even, and returns the
/// bit pattern of the positive result in the given format. Values below the
/// normal range round to subnormals and values above it become infinity.
fn round_binary(mantissa: u64, sticky: bool, exponent: i64, format: &BinaryFormat) -> u64 {
    let fraction_bits = (format.digits - 1) as u32;
    let infinity = ((format.max_exp - format.min_exp + 2) as u64) << fraction_bits;
    if mantissa == 0 {
        return 0;
    }

    let shift = mantissa.leading_zeros();
    let normalized = mantissa << shift;

    // Exponent of the leading one bit
    let mut top = exponent.saturating_add(63 - i64::from(shift));
    if top > format.max_exp {
        return infinity;
    }

    let keep = if top >= format.min_exp {
        format.digits
    } else {
        format.digits - (format.min_exp - top)
    };

    if keep < 0 {
        return 0;
    }

    let dropped = (64 - keep) as u32;
    let (kept, rest) = if dropped == 64 {
        (0, normalized)
    } else {
        (normalized >> dropped, normalized & ((1u64 << dropped) - 1))
    };

    let half = 1u64 << (dropped - 1);
    let round_up = rest > half || (rest == half && (sticky || kept & 1 == 1));
    let mut kept = kept + u64::from(round_up);

    if top < format.min_exp {
        // A carry out of the subnormal range lands on the smallest normal
        return kept;
    }

    if kept >> format.digits != 0 {
        kept >>= 1;
        top += 1;
        if top > format.max_exp {
            return infinity;
        }
    }

    let biased = (top - format.min_exp + 1) as u64;
    (biased << fraction_bits) | (kept & ((1u64 << fraction_bits) - 1))
}

#[inline]
fn sign<U: Unit>(d: &[U]) -> (bool, usize) {
    match d.first().and_then(|x| x.ascii()) {
        Some(b'-') => (true, 1),
        Some(b'+') => (false, 1),
        _ => (false, 0),
    }
}

#[inline]
fn is_hex_prefix<U: Unit>(d: &[U]) -> bool {
    d.len() >= 2 && d[0].is_ascii_byte(b'0') && matches!(d[1].ascii(), Some(b'x' | b'X'))
}

/// Case insensitive ascii prefix test
fn starts_with_ignore_case<U: Unit>(d: &[U], prefix: &[u8]) -> bool {
    d.len() >= prefix.len()
        && d
            .iter()
            .zip(prefix)
            .all(|(x, p)| x.ascii().map_or(false, |b| b.eq_ignore_ascii_case(p)))
}

/// Scans an integer token. The result is the two's complement bit pattern of
/// the value: signed conversions saturate at the `i64` range, unsigned ones
/// saturate the magnitude at `u64::MAX` before an optional negation wraps it.
/// Callers truncate to the target width.
pub(crate) fn scan_integer<U: Unit>(d: &[U], radix: Radix, signed: bool) -> Option<(u64, usize)> {
    let (negative, mut pos) = sign(d);
    let rest = &d[pos..];
    let radix = match radix {
        Radix::Decimal => 10,
        Radix::Octal => 8,
        Radix::Hex => {
            if is_hex_prefix(rest) && rest.get(2).and_then(|x| x.digit(16)).is_some() {
                pos += 2;
            }
            16
        }
        Radix::Auto => {
            if is_hex_prefix(rest) && rest.get(2).and_then(|x| x.digit(16)).is_some() {
                pos += 2;
                16
            } else if rest.first().map_or(false, |x| x.is_ascii_byte(b'0')) {
                8
            } else {
                10
            }
        }
    };

    let start = pos;
    let mut magnitude: u64 = 0;
    while let Some(digit) = d.get(pos).and_then(|x| x.digit(radix)) {
        magnitude = magnitude
            .saturating_mul(u64::from(radix))
            .saturating_add(u64::from(digit));
        pos += 1;
    }

    if pos == start {
        return None;
    }

    let bits = if signed {
        let value = if negative {
            if magnitude > i64::MIN.unsigned_abs() {
                i64::MIN
            } else {
                0i64.wrapping_sub(magnitude as i64)
            }
        } else {
            magnitude.min(i64::MAX as u64) as i64
        };
        value as u64
    } else if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    };

    Some((bits, pos))
}

/// Scans a floating point token: decimal notation, hexadecimal notation, or
/// one of `inf`, `infinity`, `nan`. An exponent marker that is not followed by
/// digits fails the whole token.
pub(crate) fn scan_float<U: Unit>(d: &[U]) -> Option<(FloatToken, usize)> {
    let (negative, pos) = sign(d);
    let rest = &d[pos..];
    let signum = if negative { -1.0 } else { 1.0 };

    if starts_with_ignore_case(rest, b"infinity") {
        return Some((FloatToken::Special(signum * f64::INFINITY), pos + 8));
    } else if starts_with_ignore_case(rest, b"inf") {
        return Some((FloatToken::Special(signum * f64::INFINITY), pos + 3));
    } else if starts_with_ignore_case(rest, b"nan") {
        return Some((FloatToken::Special(signum * f64::NAN), pos + 3));
    }

    if is_hex_prefix(rest) {
        return scan_hex_float(&rest[2..], negative).map(|(token, len)| (token, pos + 2 + len));
    }

    let mut text = String::with_capacity(d.len());
    if negative {
        text.push('-');
    }

    let mut pos = pos;
    let mut digits = 0;
    let mut seen_dot = false;
    while let Some(b) = d.get(pos).and_then(|x| x.ascii()) {
        match b {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        text.push(char::from(b));
        pos += 1;
    }

    if digits == 0 {
        return None;
    }

    if matches!(d.get(pos).and_then(|x| x.ascii()), Some(b'e' | b'E')) {
        text.push('e');
        pos += 1;
        let (exp_negative, sign_len) = sign(&d[pos..]);
        if exp_negative {
            text.push('-');
        }
        pos += sign_len;

        let exp_start = pos;
        while let Some(b) = d.get(pos).and_then(|x| x.ascii()).filter(u8::is_ascii_digit) {
            text.push(char::from(b));
            pos += 1;
        }

        if pos == exp_start {
            return None;
        }
    }

    Some((FloatToken::Decimal(text), pos))
}

/// Scans the part of a hexadecimal float after its `0x` prefix
fn scan_hex_float<U: Unit>(d: &[U], negative: bool) -> Option<(FloatToken, usize)> {
    // Keep 60 bits of mantissa and account for the dropped digits in the
    // binary exponent and the sticky bit.
    const MANTISSA_LIMIT: u64 = 1 << 60;

    let mut pos = 0;
    let mut mantissa: u64 = 0;
    let mut sticky = false;
    let mut exponent: i64 = 0;
    let mut digits = 0;
    let mut seen_dot = false;
    while let Some(x) = d.get(pos) {
        if !seen_dot && x.is_ascii_byte(b'.') {
            seen_dot = true;
        } else if let Some(digit) = x.digit(16) {
            digits += 1;
            if mantissa < MANTISSA_LIMIT {
                mantissa = mantissa * 16 + u64::from(digit);
                if seen_dot {
                    exponent -= 4;
                }
            } else {
                sticky |= digit != 0;
                if !seen_dot {
                    exponent += 4;
                }
            }
        } else {
            break;
        }
        pos += 1;
    }

    if digits == 0 {
        return None;
    }

    if matches!(d.get(pos).and_then(|x| x.ascii()), Some(b'p' | b'P')) {
        pos += 1;
        let (exp_negative, sign_len) = sign(&d[pos..]);
        pos += sign_len;

        let exp_start = pos;
        let mut binary: i64 = 0;
        while let Some(digit) = d.get(pos).and_then(|x| x.digit(10)) {
            binary = binary.saturating_mul(10).saturating_add(i64::from(digit));
            pos += 1;
        }

        if pos == exp_start {
            return None;
        }

        exponent = exponent.saturating_add(if exp_negative { -binary } else { binary });
    }

    let token = FloatToken::Hex {
        negative,
        mantissa,
        sticky,
        exponent,
    };

    Some((token, pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use rstest::*;

    #[rstest]
    #[case(b"123", Radix::Decimal, true, Some((123, 3)))]
    #[case(b"-123", Radix::Decimal, true, Some(((-123i64) as u64, 4)))]
    #[case(b"+7x", Radix::Decimal, true, Some((7, 2)))]
    #[case(b"abc", Radix::Decimal, true, None)]
    #[case(b"-", Radix::Decimal, true, None)]
    #[case(b"1b", Radix::Hex, false, Some((27, 2)))]
    #[case(b"0x1B", Radix::Hex, false, Some((27, 4)))]
    #[case(b"0xg", Radix::Hex, false, Some((0, 1)))]
    #[case(b"017", Radix::Octal, false, Some((15, 3)))]
    #[case(b"018", Radix::Octal, false, Some((1, 2)))]
    #[case(b"0x10", Radix::Auto, true, Some((16, 4)))]
    #[case(b"010", Radix::Auto, true, Some((8, 3)))]
    #[case(b"0", Radix::Auto, true, Some((0, 1)))]
    #[case(b"-10", Radix::Auto, true, Some(((-10i64) as u64, 3)))]
    #[case(b"-1", Radix::Decimal, false, Some((u64::MAX, 2)))]
    fn integers(
        #[case] input: &[u8],
        #[case] radix: Radix,
        #[case] signed: bool,
        #[case] expected: Option<(u64, usize)>,
    ) {
        assert_eq!(scan_integer(input, radix, signed), expected);
    }

    #[test]
    fn integer_saturation() {
        let (bits, _) = scan_integer(b"99999999999999999999999", Radix::Decimal, true).unwrap();
        assert_eq!(bits as i64, i64::MAX);

        let (bits, _) = scan_integer(b"-99999999999999999999999", Radix::Decimal, true).unwrap();
        assert_eq!(bits as i64, i64::MIN);

        let (bits, _) = scan_integer(b"99999999999999999999999", Radix::Decimal, false).unwrap();
        assert_eq!(bits, u64::MAX);
    }

    #[test]
    fn wide_integers() {
        let data: Vec<char> = "-42ä".chars().collect();
        assert_eq!(
            scan_integer(&data, Radix::Decimal, true),
            Some(((-42i64) as u64, 3))
        );
    }

    #[rstest]
    #[case(b"1.5", Some((1.5, 3)))]
    #[case(b"-123.12345e-12", Some((-123.12345e-12, 14)))]
    #[case(b"5.", Some((5.0, 2)))]
    #[case(b".25x", Some((0.25, 3)))]
    #[case(b"1E3", Some((1000.0, 3)))]
    #[case(b"0x1.8p3", Some((12.0, 7)))]
    #[case(b"0x10", Some((16.0, 4)))]
    #[case(b"-0X.8P1", Some((-1.0, 7)))]
    #[case(b"0x1p-1022", Some((f64::MIN_POSITIVE, 9)))]
    #[case(b"0x1p-1030", Some((f64::from_bits(1 << 44), 9)))]
    #[case(b"0x1p-1074", Some((5e-324, 9)))]
    #[case(b"0x1p-1075", Some((0.0, 9)))]
    #[case(b"0x1.8p-1075", Some((5e-324, 11)))]
    #[case(b"0x1.fffffffffffffp1023", Some((f64::MAX, 22)))]
    #[case(b"0x1p1024", Some((f64::INFINITY, 8)))]
    #[case(b"1e", None)]
    #[case(b"1e+", None)]
    #[case(b"0x1p", None)]
    #[case(b".", None)]
    #[case(b"-", None)]
    #[case(b"abc", None)]
    fn floats(#[case] input: &[u8], #[case] expected: Option<(f64, usize)>) {
        let actual = scan_float(input).map(|(token, len)| (token.to_f64().unwrap(), len));
        assert_eq!(actual, expected);
    }

    #[test]
    fn special_floats() {
        let (token, len) = scan_float(b"-Infinity").unwrap();
        assert_eq!((token.to_f64(), len), (Some(f64::NEG_INFINITY), 9));

        let (token, len) = scan_float(b"infx").unwrap();
        assert_eq!((token.to_f64(), len), (Some(f64::INFINITY), 3));

        let (token, len) = scan_float(b"NaN").unwrap();
        assert!(token.to_f64().unwrap().is_nan());
        assert_eq!(len, 3);
    }

    #[test]
    fn hex_float_rounding() {
        // 2^53 + 1 sits halfway between two doubles and ties to even
        let (token, _) = scan_float(b"0x20000000000001").unwrap();
        assert_eq!(token.to_f64(), Some(9007199254740992.0));

        // a nonzero digit beyond the kept mantissa breaks the tie upwards
        let (token, _) = scan_float(b"0x200000000000010000001").unwrap();
        assert_eq!(token.to_f64(), Some(9007199254740994.0 * 2f64.powi(28)));

        // rounding carries out of the mantissa into the exponent
        let (token, _) = scan_float(b"0x1.fffffffffffff8p0").unwrap();
        assert_eq!(token.to_f64(), Some(2.0));

        let (token, _) = scan_float(b"-0x1p-149").unwrap();
        assert_eq!(token.to_f32(), Some(-f32::from_bits(1)));

        let (token, _) = scan_float(b"0x1p-126").unwrap();
        assert_eq!(token.to_f32(), Some(f32::MIN_POSITIVE));

        let (token, _) = scan_float(b"0x1p128").unwrap();
        assert_eq!(token.to_f32(), Some(f32::INFINITY));
    }

    #[test]
    fn single_precision_rounds_once() {
        let (token, _) = scan_float(b"-123.12345e-12").unwrap();
        assert_eq!(token.to_f32(), Some(-123.12345e-12f32));
    }

    #[quickcheck]
    fn decimal_integer_equality(x: i64) -> bool {
        let data = x.to_string();
        scan_integer(data.as_bytes(), Radix::Decimal, true) == Some((x as u64, data.len()))
    }

    #[quickcheck]
    fn hex_integer_equality(x: u64) -> bool {
        let data = format!("{:#x}", x);
        scan_integer(data.as_bytes(), Radix::Hex, false) == Some((x, data.len()))
    }

    #[quickcheck]
    fn hex_float_equality(x: f64) -> bool {
        if !x.is_finite() || x == 0.0 {
            return true;
        }

        // Render the exact bits as an integer significand and binary exponent
        let bits = x.abs().to_bits();
        let biased = (bits >> 52) as i64;
        let fraction = bits & ((1u64 << 52) - 1);
        let (significand, exponent) = if biased == 0 {
            (fraction, -1074)
        } else {
            (fraction | (1u64 << 52), biased - 1075)
        };

        let sign = if x < 0.0 { "-" } else { "" };
        let data = format!("{}0x{:x}p{}", sign, significand, exponent);
        scan_float(data.as_bytes()).and_then(|(token, _)| token.to_f64()) == Some(x)
    }

    #[quickcheck]
    fn float_equality(x: f64) -> bool {
        if !x.is_finite() {
            return true;
        }

        let data = format!("{:e}", x);
        scan_float(data.as_bytes()).and_then(|(token, _)| token.to_f64()) == Some(x)
    }
}
