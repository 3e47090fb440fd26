use crate::scalar::{scan_float, scan_integer, FloatToken};
use crate::specifier::{
    Conversion, Directive, Element, ElementKind, FloatWidth, Program, Radix, ScalarKind,
    Specifiers, TargetType,
};
use crate::text::{Text, Unit};
use crate::Value;
use tracing::debug;

/// What a conversion extracted from the input before it is stored
#[derive(Debug)]
enum Token<'a, U> {
    Integer(u64),
    Float(FloatToken),
    Units(&'a [U]),
}

/// Scratch storage for one target. Scalars start at zero and buffers are
/// zero filled to their capacity.
#[derive(Debug)]
enum Slot {
    Scalar(ScalarKind, Value),
    Bytes(Vec<u8>),
    Wide(Vec<char>),
}

impl Slot {
    fn new(target: &TargetType) -> Slot {
        match *target {
            TargetType::Scalar(kind) => Slot::Scalar(kind, Value::zero(kind)),
            TargetType::TextBuffer {
                element: ElementKind::Byte,
                capacity,
            } => Slot::Bytes(vec![0; capacity]),
            TargetType::TextBuffer {
                element: ElementKind::Wide,
                capacity,
            } => Slot::Wide(vec!['\0'; capacity]),
        }
    }

    /// Writes the token into the slot. Returns false when the token can't be
    /// represented by the slot, which counts as a match failure.
    fn store<U: Unit>(&mut self, token: Token<'_, U>) -> bool {
        match (self, token) {
            (Slot::Scalar(kind, value), Token::Integer(bits)) => {
                *value = Value::integer(*kind, bits);
                true
            }
            (Slot::Scalar(ScalarKind::Float(width), value), Token::Float(token)) => {
                let converted = match width {
                    FloatWidth::Single => token.to_f32().map(Value::F32),
                    _ => token.to_f64().map(Value::F64),
                };

                match converted {
                    Some(x) => {
                        *value = x;
                        true
                    }
                    None => false,
                }
            }
            (Slot::Bytes(buf), Token::Units(units)) => {
                let mut encoded = Vec::with_capacity(units.len());
                U::encode_bytes(units, &mut encoded);
                terminate(buf, &encoded, 0);
                true
            }
            (Slot::Wide(buf), Token::Units(units)) => {
                let mut decoded = Vec::with_capacity(units.len());
                if !U::decode_wide(units, &mut decoded) {
                    return false;
                }
                terminate(buf, &decoded, '\0');
                true
            }
            _ => false,
        }
    }

    /// Reads the slot back, text up to its first terminator
    fn into_value(self) -> Value {
        match self {
            Slot::Scalar(_, value) => value,
            Slot::Bytes(mut buf) => {
                let end = buf.iter().position(|&x| x == 0).unwrap_or(buf.len());
                buf.truncate(end);
                Value::Bytes(buf)
            }
            Slot::Wide(buf) => Value::Wide(buf.into_iter().take_while(|&x| x != '\0').collect()),
        }
    }
}

/// Copies `data` to the front of the buffer followed by a terminator, growing
/// the buffer only when a cross mode conversion made the data outgrow it.
fn terminate<T: Copy>(buf: &mut Vec<T>, data: &[T], zero: T) {
    if data.len() >= buf.len() {
        buf.resize(data.len() + 1, zero);
    }

    buf[..data.len()].copy_from_slice(data);
    buf[data.len()] = zero;
}

#[derive(Debug)]
struct Cursor<'a, U> {
    data: &'a [U],
    pos: usize,
}

impl<'a, U: Unit> Cursor<'a, U> {
    fn new(data: &'a [U]) -> Self {
        Cursor { data, pos: 0 }
    }

    #[inline]
    fn skip_space(&mut self) {
        while self.data.get(self.pos).map_or(false, |x| x.is_space()) {
            self.pos += 1;
        }
    }

    #[inline]
    fn eat(&mut self, unit: U) -> bool {
        if self.data.get(self.pos) == Some(&unit) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    #[inline]
    fn eat_ascii(&mut self, b: u8) -> bool {
        if self.data.get(self.pos).map_or(false, |x| x.is_ascii_byte(b)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// The remaining input, limited to `width` units when given
    #[inline]
    fn window(&self, width: Option<usize>) -> &'a [U] {
        let data: &'a [U] = self.data;
        let rest = &data[self.pos..];
        match width {
            Some(w) if w < rest.len() => &rest[..w],
            _ => rest,
        }
    }

    /// Consumes `len` units of input previously handed out by `window`
    #[inline]
    fn advance(&mut self, len: usize) -> &'a [U] {
        let data: &'a [U] = self.data;
        let token = &data[self.pos..self.pos + len];
        self.pos += len;
        token
    }
}

/// Runs a conversion at the cursor. `None` is a match failure.
fn convert<'a, U: Unit>(
    directive: &Directive<U>,
    cursor: &mut Cursor<'a, U>,
) -> Option<Token<'a, U>> {
    let skips_space = !matches!(
        directive.conversion,
        Conversion::Chars | Conversion::Set(_) | Conversion::Count
    );

    if skips_space {
        cursor.skip_space();
    }

    let window = cursor.window(directive.width);
    match directive.conversion {
        Conversion::Integer { radix, signed } => {
            let (bits, len) = scan_integer(window, radix, signed)?;
            cursor.advance(len);
            Some(Token::Integer(bits))
        }
        Conversion::Pointer => {
            let (bits, len) = scan_integer(window, Radix::Hex, false)?;
            cursor.advance(len);
            Some(Token::Integer(bits))
        }
        Conversion::Float => {
            let (token, len) = scan_float(window)?;
            cursor.advance(len);
            Some(Token::Float(token))
        }
        Conversion::Count => Some(Token::Integer(cursor.pos as u64)),
        Conversion::Chars => {
            let len = directive.width.unwrap_or(1);
            if window.len() < len {
                return None;
            }
            Some(Token::Units(cursor.advance(len)))
        }
        Conversion::String => {
            let len = window.iter().take_while(|x| !x.is_space()).count();
            if len == 0 {
                return None;
            }
            Some(Token::Units(cursor.advance(len)))
        }
        Conversion::Set(ref set) => {
            let len = window.iter().take_while(|&&x| set.accepts(x)).count();
            if len == 0 {
                return None;
            }
            Some(Token::Units(cursor.advance(len)))
        }
    }
}

/// Scans `input` against the program, filling one slot per target until the
/// first element that fails to match. Returns the filled values in order.
fn extract<U: Unit>(program: &[Element<U>], targets: &[TargetType], input: &[U]) -> Vec<Value> {
    let mut slots: Vec<Slot> = targets.iter().map(Slot::new).collect();
    let mut cursor = Cursor::new(input);
    let mut filled = 0;

    for (index, element) in program.iter().enumerate() {
        let matched = match element {
            Element::Whitespace => {
                cursor.skip_space();
                true
            }
            Element::Literal(unit) => cursor.eat(*unit),
            Element::Percent => {
                cursor.skip_space();
                cursor.eat_ascii(b'%')
            }
            Element::Directive(directive) => match convert(directive, &mut cursor) {
                Some(_) if directive.suppress => true,
                Some(token) => {
                    let stored = slots[filled].store(token);
                    filled += stored as usize;
                    stored
                }
                None => false,
            },
        };

        if !matched {
            debug!(
                element = index,
                position = cursor.pos,
                filled,
                requested = targets.len(),
                "scan stopped before end of format"
            );
            break;
        }
    }

    slots.truncate(filled);
    slots.into_iter().map(Slot::into_value).collect()
}

impl Specifiers {
    /// Scans the input against the decoded format
    ///
    /// The input is converted to the mode the format was decoded for. A
    /// directive that fails to match ends the scan: the returned values are
    /// those filled before it, which may be fewer than
    /// [`targets`](Specifiers::targets) or none at all.
    ///
    /// ```
    /// use fmtscan::{Specifiers, TextMode, Value};
    ///
    /// let specs = Specifiers::decode("%d -%d", 16, TextMode::Byte).unwrap();
    /// assert_eq!(specs.scan(b"10-20"), vec![Value::I32(10), Value::I32(20)]);
    /// assert_eq!(specs.scan(b"10+20"), vec![Value::I32(10)]);
    /// assert!(specs.scan(b"x").is_empty());
    /// ```
    pub fn scan<'a>(&self, input: impl Into<Text<'a>>) -> Vec<Value> {
        let input = input.into();
        match &self.program {
            Program::Byte(program) => extract(program, &self.targets, &u8::from_text(input)),
            Program::Wide(program) => extract(program, &self.targets, &char::from_text(input)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextMode;

    fn scan_bytes(format: &str, input: &[u8]) -> Vec<Value> {
        Specifiers::decode(format.as_bytes(), input.len(), TextMode::Byte)
            .unwrap()
            .scan(input)
    }

    fn bytes(x: &str) -> Value {
        Value::Bytes(x.as_bytes().to_vec())
    }

    #[test]
    fn slots_start_zeroed() {
        let slot = Slot::new(&TargetType::TextBuffer {
            element: ElementKind::Byte,
            capacity: 4,
        });
        match slot {
            Slot::Bytes(ref x) => assert_eq!(x, &vec![0; 4]),
            ref x => panic!("unexpected slot: {:?}", x),
        }
        assert_eq!(slot.into_value(), bytes(""));
    }

    #[test]
    fn slot_grows_for_cross_mode_text() {
        let mut slot = Slot::new(&TargetType::TextBuffer {
            element: ElementKind::Byte,
            capacity: 2,
        });
        let units = ['ä', 'ö'];
        assert!(slot.store(Token::Units(&units[..])));
        assert_eq!(slot.into_value(), bytes("äö"));
    }

    #[test]
    fn text_reads_back_up_to_terminator() {
        assert_eq!(scan_bytes("%3c", b"a\0b"), vec![bytes("a")]);
    }

    #[test]
    fn literals_must_match() {
        assert_eq!(
            scan_bytes("%d ,%d", b"1,2"),
            vec![Value::I32(1), Value::I32(2)]
        );
        assert_eq!(scan_bytes("%d ,%d", b"1;2"), vec![Value::I32(1)]);
    }

    #[test]
    fn format_whitespace_matches_none() {
        assert_eq!(
            scan_bytes("%d %d", b"1\t\n 2"),
            vec![Value::I32(1), Value::I32(2)]
        );
        assert!(scan_bytes("a b", b"ab").is_empty());
        assert_eq!(scan_bytes("%s %s", b"ab"), vec![bytes("ab")]);
    }

    #[test]
    fn chars_do_not_skip_whitespace() {
        assert_eq!(scan_bytes("%c", b" x"), vec![bytes(" ")]);
        assert_eq!(scan_bytes(" %c", b" x"), vec![bytes("x")]);
        assert!(scan_bytes("%3c", b"ab").is_empty());
    }

    #[test]
    fn width_limits_conversions() {
        assert_eq!(
            scan_bytes("%2d%d", b"12345"),
            vec![Value::I32(12), Value::I32(345)]
        );
        assert_eq!(
            scan_bytes("%3s%s", b"abcdef"),
            vec![bytes("abc"), bytes("def")]
        );
        assert_eq!(
            scan_bytes("%3f%f", b"1.2345"),
            vec![Value::F32(1.2), Value::F32(345.0)]
        );
    }

    #[test]
    fn bracket_sets_scan() {
        assert_eq!(
            scan_bytes("%[a-c]%s", b"abcabd"),
            vec![bytes("abcab"), bytes("d")]
        );
        assert_eq!(
            scan_bytes("%[^,] ,%[^,]", b"one two,three"),
            vec![bytes("one two"), bytes("three")]
        );
        assert!(scan_bytes("%[a]", b"b").is_empty());
    }

    #[test]
    fn count_records_consumed_units() {
        assert_eq!(
            scan_bytes("%s%n %d%n", b"abc  12"),
            vec![bytes("abc"), Value::I32(3), Value::I32(12), Value::I32(7)]
        );
        assert_eq!(scan_bytes("%*s%hhn", b"abc"), vec![Value::I8(3)]);
    }

    #[test]
    fn integer_conversions() {
        assert_eq!(
            scan_bytes("%i %i %i %o %X %p", b"0x1f 017 -9 17 FF 0x10"),
            vec![
                Value::I32(31),
                Value::I32(15),
                Value::I32(-9),
                Value::U32(15),
                Value::U32(255),
                Value::Pointer(16),
            ]
        );
        assert_eq!(
            scan_bytes("%hhd %hu %lld %zu", b"300 70000 -9000000000 5"),
            vec![
                Value::I8(44),
                Value::U16(4464),
                Value::I64(-9000000000),
                Value::Usize(5),
            ]
        );
    }

    #[test]
    fn percent_escape() {
        assert_eq!(
            scan_bytes("%d%%%d", b"1 % 2"),
            vec![Value::I32(1), Value::I32(2)]
        );
        assert_eq!(scan_bytes("%d%%%d", b"1 2"), vec![Value::I32(1)]);
    }

    #[test]
    fn empty_input_fills_nothing() {
        assert!(scan_bytes("%d", b"").is_empty());
        assert_eq!(scan_bytes("%n", b""), vec![Value::I32(0)]);
    }

    #[test]
    fn invalid_utf8_fails_wide_slot_in_byte_mode() {
        assert_eq!(scan_bytes("%d %ls", b"1 a\xffb"), vec![Value::I32(1)]);
        assert_eq!(
            scan_bytes("%ls", "äö".as_bytes()),
            vec![Value::Wide(String::from("äö"))]
        );
    }
}
