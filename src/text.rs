use std::borrow::Cow;
use std::fmt;

/// Whether a scan operates over bytes or wide characters
///
/// The mode is resolved once per scan from the kind of the input text and
/// decides the unit that the format, the input, and width limits are
/// measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextMode {
    /// Byte oriented scanning. Whitespace follows the C locale.
    Byte,

    /// Wide character scanning over unicode scalar values.
    Wide,
}

/// Text handed to the scanner, either as raw bytes or as wide characters
///
/// A `&str` is considered wide character text while byte slices and arrays
/// are byte text:
///
/// ```
/// use fmtscan::{Text, TextMode};
///
/// assert_eq!(Text::from("äüöß").mode(), TextMode::Wide);
/// assert_eq!(Text::from("äüöß").len(), 4);
/// assert_eq!(Text::from(&b"abc"[..]).mode(), TextMode::Byte);
/// assert_eq!(Text::from("äüöß".as_bytes()).len(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text<'a> {
    /// Byte text
    Bytes(&'a [u8]),

    /// Wide character text
    Wide(&'a str),
}

impl<'a> Text<'a> {
    /// The text mode this text would be scanned in
    pub fn mode(&self) -> TextMode {
        match self {
            Text::Bytes(_) => TextMode::Byte,
            Text::Wide(_) => TextMode::Wide,
        }
    }

    /// Number of units in the text's own mode
    pub fn len(&self) -> usize {
        match self {
            Text::Bytes(x) => x.len(),
            Text::Wide(x) => x.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Text::Bytes(x) => x.is_empty(),
            Text::Wide(x) => x.is_empty(),
        }
    }

    /// Number of units the text occupies once converted to the given mode
    pub(crate) fn len_in(&self, mode: TextMode) -> usize {
        match (self, mode) {
            (Text::Wide(x), TextMode::Byte) => x.len(),
            (Text::Bytes(x), TextMode::Wide) => String::from_utf8_lossy(x).chars().count(),
            _ => self.len(),
        }
    }
}

impl<'a> From<&'a str> for Text<'a> {
    fn from(value: &'a str) -> Self {
        Text::Wide(value)
    }
}

impl<'a> From<&'a String> for Text<'a> {
    fn from(value: &'a String) -> Self {
        Text::Wide(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for Text<'a> {
    fn from(value: &'a [u8]) -> Self {
        Text::Bytes(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Text<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Text::Bytes(&value[..])
    }
}

impl<'a> From<&'a Vec<u8>> for Text<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Text::Bytes(value.as_slice())
    }
}

/// The element type a scan runs over: `u8` in byte mode and `char` in wide
/// mode.
pub(crate) trait Unit: Copy + Eq + Ord + fmt::Debug {
    /// Views or converts text into units of this mode
    fn from_text(text: Text<'_>) -> Cow<'_, [Self]>;

    /// Whitespace as understood by `isspace` / `iswspace`
    fn is_space(self) -> bool;

    /// The ascii byte of this unit, if it is one
    fn ascii(self) -> Option<u8>;

    fn to_char(self) -> char;

    /// Appends the multibyte (utf-8) form of the units to `out`
    fn encode_bytes(units: &[Self], out: &mut Vec<u8>);

    /// Appends the wide form of the units to `out`. Returns false if the
    /// units are not a valid multibyte sequence.
    fn decode_wide(units: &[Self], out: &mut Vec<char>) -> bool;

    #[inline]
    fn is_ascii_byte(self, b: u8) -> bool {
        self.ascii() == Some(b)
    }

    #[inline]
    fn digit(self, radix: u32) -> Option<u32> {
        self.ascii().and_then(|x| char::from(x).to_digit(radix))
    }
}

impl Unit for u8 {
    #[inline]
    fn from_text(text: Text<'_>) -> Cow<'_, [u8]> {
        match text {
            Text::Bytes(x) => Cow::Borrowed(x),
            Text::Wide(x) => Cow::Borrowed(x.as_bytes()),
        }
    }

    #[inline]
    fn is_space(self) -> bool {
        matches!(self, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
    }

    #[inline]
    fn ascii(self) -> Option<u8> {
        if self.is_ascii() {
            Some(self)
        } else {
            None
        }
    }

    #[inline]
    fn to_char(self) -> char {
        char::from(self)
    }

    fn encode_bytes(units: &[u8], out: &mut Vec<u8>) {
        out.extend_from_slice(units);
    }

    fn decode_wide(units: &[u8], out: &mut Vec<char>) -> bool {
        match std::str::from_utf8(units) {
            Ok(s) => {
                out.extend(s.chars());
                true
            }
            Err(_) => false,
        }
    }
}

impl Unit for char {
    fn from_text(text: Text<'_>) -> Cow<'_, [char]> {
        match text {
            Text::Wide(x) => Cow::Owned(x.chars().collect()),
            Text::Bytes(x) if x.is_ascii() => Cow::Owned(x.iter().map(|&b| char::from(b)).collect()),
            Text::Bytes(x) => Cow::Owned(String::from_utf8_lossy(x).chars().collect()),
        }
    }

    #[inline]
    fn is_space(self) -> bool {
        self.is_whitespace()
    }

    #[inline]
    fn ascii(self) -> Option<u8> {
        if self.is_ascii() {
            Some(self as u8)
        } else {
            None
        }
    }

    #[inline]
    fn to_char(self) -> char {
        self
    }

    fn encode_bytes(units: &[char], out: &mut Vec<u8>) {
        let mut buf = [0u8; 4];
        for c in units {
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }

    fn decode_wide(units: &[char], out: &mut Vec<char>) -> bool {
        out.extend_from_slice(units);
        true
    }
}
