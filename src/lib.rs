/*!

A format string driven text scanner with the semantics of C's `sscanf`.

Given a scanf style format and an input, fmtscan decodes the format's
conversion directives into typed targets, scans the input against the format,
and returns the values that were filled, in order.

## Features

- ✔ Typed: every directive resolves to exactly one target type, honoring the
  `hh`, `h`, `l`, `ll`, `j`, `z`, `t` and `L` length modifiers
- ✔ Two text modes: byte text and wide character text, with `%ls`, `%lc`
  and `%l[...]` for wide buffers
- ✔ Safe: text buffers are sized from the input, no native scanning library
  involved
- ✔ Honest: a bad format is an error, a partial match is a shorter result

## Quick Start

```rust
use fmtscan::Value;

let values = fmtscan::scan("%5c %s - %d %f %x", b"ttttt abc - 123 -123.12345e-12 1b").unwrap();
assert_eq!(values, vec![
    Value::Bytes(b"ttttt".to_vec()),
    Value::Bytes(b"abc".to_vec()),
    Value::I32(123),
    Value::F32(-123.12345e-12),
    Value::U32(0x1b),
]);
```

A `&str` input is wide character text. Use the `l` modifier for wide
buffers:

```rust
use fmtscan::Value;

let values = fmtscan::scan("%3l[ä]%*l[ä] %d", "ääääääääääää 1").unwrap();
assert_eq!(values, vec![Value::Wide(String::from("äää")), Value::I32(1)]);
```

## Partial Matches and Errors

Scanning stops at the first directive that does not match. Everything that
was filled before is returned, so a result may be shorter than the number of
directives, down to empty. Only a format that contains an unknown directive is
an error. A directive runs up to the next whitespace or `%`, so literal text
following a directive needs whitespace in between (`%d ,%d`, not `%d,%d`):

```rust
use fmtscan::{ErrorKind, Value};

assert_eq!(fmtscan::scan("%d %d", b"1 x").unwrap(), vec![Value::I32(1)]);
assert!(fmtscan::scan("%d %d", b"abc").unwrap().is_empty());

let err = fmtscan::scan("%hhhi", b"1").unwrap_err();
assert!(matches!(err.kind(), ErrorKind::IllegalSpecifier { .. }));

assert!(fmtscan::scan("%d,%d", b"1,2").is_err());
assert_eq!(fmtscan::scan("%d ,%d", b"1,2").unwrap(), vec![Value::I32(1), Value::I32(2)]);
```

## Reusing a Format

Decoding can be done once with [`Specifiers`] and applied to many inputs of
the same mode:

```rust
use fmtscan::{Specifiers, TextMode, Value};

let specs = Specifiers::decode("%u .%u .%u", 32, TextMode::Byte).unwrap();
assert_eq!(specs.scan(b"1.2.3").len(), 3);
assert_eq!(specs.scan(b"1.2").len(), 2);
```

*/

mod engine;
mod errors;
mod scalar;
mod specifier;
mod text;
mod value;

pub use self::errors::*;
pub use self::specifier::{
    ElementKind, FloatWidth, IntWidth, ScalarKind, Specifiers, TargetType,
};
pub use self::text::{Text, TextMode};
pub use self::value::Value;

/// Scans `input` according to `format`
///
/// The input's kind decides the text mode: `&str` is wide character text and
/// byte slices are byte text. Text buffers are sized to hold the entire input.
///
/// ```
/// use fmtscan::Value;
///
/// let values = fmtscan::scan("%*5c%s", b"tttttabc").unwrap();
/// assert_eq!(values, vec![Value::Bytes(b"abc".to_vec())]);
/// ```
pub fn scan<'f, 'i>(
    format: impl Into<Text<'f>>,
    input: impl Into<Text<'i>>,
) -> Result<Vec<Value>, Error> {
    Scanner::new().scan(format, input)
}

/// A configurable scanner
///
/// ```
/// use fmtscan::{Scanner, TextMode, Value};
///
/// let scanner = Scanner::builder().text_mode(TextMode::Byte).build();
/// let values = scanner.scan("%s", "äb").unwrap();
/// assert_eq!(values, vec![Value::Bytes("äb".as_bytes().to_vec())]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    mode: Option<TextMode>,
    buffer_capacity: Option<usize>,
}

impl Scanner {
    /// Creates a scanner that infers the text mode from the input
    pub fn new() -> Self {
        Scanner::default()
    }

    /// Initializes a default [ScannerBuilder]
    pub fn builder() -> ScannerBuilder {
        ScannerBuilder::default()
    }

    /// Decodes the format for the given input without scanning
    pub fn decode<'f, 'i>(
        &self,
        format: impl Into<Text<'f>>,
        input: impl Into<Text<'i>>,
    ) -> Result<Specifiers, Error> {
        let input = input.into();
        let mode = self.mode.unwrap_or_else(|| input.mode());
        let capacity = self
            .buffer_capacity
            .unwrap_or_else(|| input.len_in(mode).saturating_add(1));
        Specifiers::with_capacity(format, mode, capacity)
    }

    /// Scans `input` according to `format`
    pub fn scan<'f, 'i>(
        &self,
        format: impl Into<Text<'f>>,
        input: impl Into<Text<'i>>,
    ) -> Result<Vec<Value>, Error> {
        let input = input.into();
        let specs = self.decode(format, input)?;
        Ok(specs.scan(input))
    }
}

/// Builds a [Scanner]
#[derive(Debug, Clone, Default)]
pub struct ScannerBuilder {
    mode: Option<TextMode>,
    buffer_capacity: Option<usize>,
}

impl ScannerBuilder {
    /// Scan in the given mode regardless of the input's kind
    pub fn text_mode(mut self, mode: TextMode) -> ScannerBuilder {
        self.mode = Some(mode);
        self
    }

    /// Initial number of elements, terminator included, of every text
    /// buffer. Defaults to the input length plus one.
    pub fn buffer_capacity(mut self, capacity: usize) -> ScannerBuilder {
        self.buffer_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Scanner {
        Scanner {
            mode: self.mode,
            buffer_capacity: self.buffer_capacity,
        }
    }
}
