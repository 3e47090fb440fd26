use crate::text::{Text, TextMode, Unit};
use crate::Error;
use tracing::trace;

/// Width of an integer target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// `hh`: char
    Char,

    /// `h`: short
    Short,

    /// no modifier: int
    Int,

    /// `l`: long, which follows the platform's `c_long`
    Long,

    /// `ll`: long long
    LongLong,

    /// `j`: intmax_t
    Max,

    /// `z`: size_t
    Size,

    /// `t`: ptrdiff_t
    PtrDiff,
}

/// Width of a floating point target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    /// no modifier: float
    Single,

    /// `l`: double
    Double,

    /// `L`: long double. Rust has no extended precision float so these are
    /// carried as `f64`.
    Extended,
}

/// Scalar kinds a directive may resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Signed(IntWidth),
    Unsigned(IntWidth),
    Float(FloatWidth),
    Pointer,
}

/// Element kind of a text buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Holds bytes (`%c`, `%s`, `%[`)
    Byte,

    /// Holds wide characters (`%lc`, `%ls`, `%l[`)
    Wide,
}

/// The resolved storage a non-suppressed directive writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    Scalar(ScalarKind),

    /// A text buffer holding `capacity` elements, terminator included
    TextBuffer {
        element: ElementKind,
        capacity: usize,
    },
}

/// Base of an integer conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Radix {
    Decimal,
    Octal,
    Hex,

    /// `%i`: decided by the token's prefix
    Auto,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SetItem<U> {
    Single(U),
    Range(U, U),
}

/// Members of a `%[...]` directive
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CharSet<U> {
    negated: bool,
    items: Vec<SetItem<U>>,
}

impl<U: Unit> CharSet<U> {
    #[inline]
    pub(crate) fn accepts(&self, unit: U) -> bool {
        let member = self.items.iter().any(|item| match *item {
            SetItem::Single(x) => x == unit,
            SetItem::Range(lo, hi) => lo <= unit && unit <= hi,
        });
        member != self.negated
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Conversion<U> {
    Integer { radix: Radix, signed: bool },
    Float,
    Pointer,
    Chars,
    String,
    Set(CharSet<U>),
    Count,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Directive<U> {
    pub(crate) suppress: bool,
    pub(crate) width: Option<usize>,
    pub(crate) conversion: Conversion<U>,
}

/// One element of a decoded format
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Element<U> {
    /// A run of whitespace in the format
    Whitespace,
    Literal(U),

    /// `%%`
    Percent,
    Directive(Directive<U>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Program {
    Byte(Vec<Element<u8>>),
    Wide(Vec<Element<char>>),
}

/// A decoded format string
///
/// Holds the directive program that drives a scan and the ordered list of
/// targets, one per non-suppressed directive. Decoding once and scanning
/// many inputs avoids re-interpreting the format.
///
/// ```
/// use fmtscan::{Specifiers, TextMode, TargetType, ScalarKind, IntWidth};
///
/// let specs = Specifiers::decode("%hhi %*d %lu", 0, TextMode::Byte).unwrap();
/// assert_eq!(specs.targets(), &[
///     TargetType::Scalar(ScalarKind::Signed(IntWidth::Char)),
///     TargetType::Scalar(ScalarKind::Unsigned(IntWidth::Long)),
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Specifiers {
    pub(crate) program: Program,
    pub(crate) targets: Vec<TargetType>,
}

impl Specifiers {
    /// Decodes a format for inputs of up to `input_len` units in the given
    /// mode. Text buffers are sized to hold the entire input plus a
    /// terminator.
    pub fn decode<'a>(
        format: impl Into<Text<'a>>,
        input_len: usize,
        mode: TextMode,
    ) -> Result<Specifiers, Error> {
        Specifiers::with_capacity(format, mode, input_len.saturating_add(1))
    }

    /// Decodes a format with an explicit text buffer capacity
    pub(crate) fn with_capacity<'a>(
        format: impl Into<Text<'a>>,
        mode: TextMode,
        capacity: usize,
    ) -> Result<Specifiers, Error> {
        let format = format.into();
        let mut targets = Vec::new();
        let program = match mode {
            TextMode::Byte => {
                Program::Byte(decode_units(&u8::from_text(format), capacity, &mut targets)?)
            }
            TextMode::Wide => {
                Program::Wide(decode_units(&char::from_text(format), capacity, &mut targets)?)
            }
        };

        Ok(Specifiers { program, targets })
    }

    /// The mode the format was decoded for
    pub fn mode(&self) -> TextMode {
        match self.program {
            Program::Byte(_) => TextMode::Byte,
            Program::Wide(_) => TextMode::Wide,
        }
    }

    /// Targets of the non-suppressed directives in format order
    pub fn targets(&self) -> &[TargetType] {
        &self.targets
    }
}

/// Length modifier prefix of a core token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Hh,
    H,
    L,
    Ll,
    J,
    Z,
    T,
    BigL,
}

impl Modifier {
    fn from_bytes(data: &[u8]) -> Option<Modifier> {
        match data {
            b"" => Some(Modifier::None),
            b"hh" => Some(Modifier::Hh),
            b"h" => Some(Modifier::H),
            b"l" => Some(Modifier::L),
            b"ll" => Some(Modifier::Ll),
            b"j" => Some(Modifier::J),
            b"z" => Some(Modifier::Z),
            b"t" => Some(Modifier::T),
            b"L" => Some(Modifier::BigL),
            _ => None,
        }
    }

    fn int_width(self) -> Option<IntWidth> {
        match self {
            Modifier::None => Some(IntWidth::Int),
            Modifier::Hh => Some(IntWidth::Char),
            Modifier::H => Some(IntWidth::Short),
            Modifier::L => Some(IntWidth::Long),
            Modifier::Ll => Some(IntWidth::LongLong),
            Modifier::J => Some(IntWidth::Max),
            Modifier::Z => Some(IntWidth::Size),
            Modifier::T => Some(IntWidth::PtrDiff),
            Modifier::BigL => None,
        }
    }

    fn float_width(self) -> Option<FloatWidth> {
        match self {
            Modifier::None => Some(FloatWidth::Single),
            Modifier::L => Some(FloatWidth::Double),
            Modifier::BigL => Some(FloatWidth::Extended),
            _ => None,
        }
    }

    fn element(self) -> Option<ElementKind> {
        match self {
            Modifier::None => Some(ElementKind::Byte),
            Modifier::L => Some(ElementKind::Wide),
            _ => None,
        }
    }
}

/// What a table key resolves to before buffers are sized
#[derive(Debug, Clone, Copy, PartialEq)]
enum Resolved {
    Scalar(ScalarKind, Family),
    Text(ElementKind, Family),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Family {
    Integer(Radix, bool),
    Float,
    Pointer,
    Count,
    Chars,
    String,
    Set,
}

/// The specifier table: a length modifier followed by a conversion letter.
/// Bracket sets are keyed by their opening `[`.
fn lookup(key: &[u8]) -> Option<Resolved> {
    let (&letter, modifier) = key.split_last()?;
    let modifier = Modifier::from_bytes(modifier)?;
    let integer = |radix, signed| {
        let width = modifier.int_width()?;
        let kind = if signed {
            ScalarKind::Signed(width)
        } else {
            ScalarKind::Unsigned(width)
        };
        Some(Resolved::Scalar(kind, Family::Integer(radix, signed)))
    };

    match letter {
        b'd' => integer(Radix::Decimal, true),
        b'i' => integer(Radix::Auto, true),
        b'u' => integer(Radix::Decimal, false),
        b'o' => integer(Radix::Octal, false),
        b'x' | b'X' => integer(Radix::Hex, false),
        b'n' => modifier
            .int_width()
            .map(|w| Resolved::Scalar(ScalarKind::Signed(w), Family::Count)),
        b'f' | b'F' | b'e' | b'E' | b'g' | b'G' | b'a' | b'A' => modifier
            .float_width()
            .map(|w| Resolved::Scalar(ScalarKind::Float(w), Family::Float)),
        b'p' if modifier == Modifier::None => {
            Some(Resolved::Scalar(ScalarKind::Pointer, Family::Pointer))
        }
        b'c' => modifier.element().map(|e| Resolved::Text(e, Family::Chars)),
        b's' => modifier.element().map(|e| Resolved::Text(e, Family::String)),
        b'[' => modifier.element().map(|e| Resolved::Text(e, Family::Set)),
        _ => None,
    }
}

/// Resolves a core token by its longest suffix found in the table. The walk
/// starts from the one character suffix and stops at the first miss. The
/// hit must cover the whole token: leftover modifier characters are illegal.
fn resolve(core: &[u8]) -> Option<Resolved> {
    let mut best = None;
    for len in 1..=core.len() {
        match lookup(&core[core.len() - len..]) {
            Some(x) => best = Some((x, len)),
            None => break,
        }
    }

    match best {
        Some((resolved, len)) if len == core.len() => Some(resolved),
        _ => None,
    }
}

#[inline]
fn is_modifier(b: u8) -> bool {
    matches!(b, b'h' | b'l' | b'j' | b'z' | b't' | b'L')
}

/// End of the run of non-whitespace, non-`%` units starting at `pos`
fn token_end<U: Unit>(format: &[U], pos: usize) -> usize {
    let rest = format.get(pos..).unwrap_or_default();
    let len = rest
        .iter()
        .take_while(|x| !x.is_space() && !x.is_ascii_byte(b'%'))
        .count();
    pos + len
}

fn render<U: Unit>(units: &[U]) -> String {
    units.iter().map(|x| x.to_char()).collect()
}

fn decode_units<U: Unit>(
    format: &[U],
    capacity: usize,
    targets: &mut Vec<TargetType>,
) -> Result<Vec<Element<U>>, Error> {
    let mut elements = Vec::new();
    let mut pos = 0;
    while let Some(&unit) = format.get(pos) {
        if unit.is_space() {
            while format.get(pos).map_or(false, |x| x.is_space()) {
                pos += 1;
            }
            elements.push(Element::Whitespace);
        } else if !unit.is_ascii_byte(b'%') {
            elements.push(Element::Literal(unit));
            pos += 1;
        } else if format.get(pos + 1).map_or(false, |x| x.is_ascii_byte(b'%')) {
            elements.push(Element::Percent);
            pos += 2;
        } else {
            let start = pos;
            let (directive, end) = decode_directive(format, start, capacity, targets)?;
            elements.push(Element::Directive(directive));
            pos = end;
        }
    }

    Ok(elements)
}

/// Decodes the directive starting at the `%` found at `start`. Returns the
/// directive and the position just past it.
fn decode_directive<U: Unit>(
    format: &[U],
    start: usize,
    capacity: usize,
    targets: &mut Vec<TargetType>,
) -> Result<(Directive<U>, usize), Error> {
    let mut pos = start + 1;
    let suppress = format.get(pos).map_or(false, |x| x.is_ascii_byte(b'*'));
    if suppress {
        pos += 1;
    }

    let mut width: Option<usize> = None;
    while let Some(d) = format.get(pos).and_then(|x| x.digit(10)) {
        let w = width.unwrap_or(0);
        width = Some(w.saturating_mul(10).saturating_add(d as usize));
        pos += 1;
    }

    // A zero width is no width at all
    let width = width.filter(|&w| w != 0);

    let mut core = Vec::new();
    while let Some(b) = format.get(pos).and_then(|x| x.ascii()).filter(|&b| is_modifier(b)) {
        core.push(b);
        pos += 1;
    }

    let illegal = |end: usize| {
        let end = end.min(format.len());
        Error::illegal_specifier(render(&format[start + 1..end]), start)
    };

    let letter = format
        .get(pos)
        .and_then(|x| x.ascii())
        .ok_or_else(|| illegal(token_end(format, pos).max(pos + 1)))?;
    core.push(letter);
    pos += 1;

    let resolved = resolve(&core).ok_or_else(|| illegal(token_end(format, pos)))?;

    let set = if letter == b'[' {
        let (set, end) = decode_set(format, pos).ok_or_else(|| illegal(format.len()))?;
        pos = end;
        Some(set)
    } else {
        None
    };

    // Units left in the run after the conversion belong to the core token,
    // which then has no match in the table
    let end = token_end(format, pos);
    if end > pos {
        return Err(illegal(end));
    }

    let (target, family) = match resolved {
        Resolved::Scalar(kind, family) => (TargetType::Scalar(kind), family),
        Resolved::Text(element, family) => (TargetType::TextBuffer { element, capacity }, family),
    };

    let conversion = match (family, set) {
        (Family::Integer(radix, signed), _) => Conversion::Integer { radix, signed },
        (Family::Float, _) => Conversion::Float,
        (Family::Pointer, _) => Conversion::Pointer,
        (Family::Count, _) => Conversion::Count,
        (Family::Chars, _) => Conversion::Chars,
        (Family::String, _) => Conversion::String,
        (Family::Set, Some(set)) => Conversion::Set(set),
        (Family::Set, None) => return Err(illegal(pos)),
    };

    trace!(
        offset = start,
        specifier = %render(&format[start + 1..pos]),
        suppress,
        ?target,
        "decoded directive"
    );

    if !suppress {
        targets.push(target);
    }

    let directive = Directive {
        suppress,
        width,
        conversion,
    };

    Ok((directive, pos))
}

/// Decodes the members of a bracket set whose `[` ends just before `pos`.
/// A `]` directly after `[` or `[^` is a member. Returns `None` when the set
/// is never closed.
fn decode_set<U: Unit>(format: &[U], mut pos: usize) -> Option<(CharSet<U>, usize)> {
    let negated = format.get(pos).map_or(false, |x| x.is_ascii_byte(b'^'));
    if negated {
        pos += 1;
    }

    let mut members = Vec::new();
    if let Some(&x) = format.get(pos).filter(|x| x.is_ascii_byte(b']')) {
        members.push(x);
        pos += 1;
    }

    loop {
        let x = *format.get(pos)?;
        pos += 1;
        if x.is_ascii_byte(b']') {
            break;
        }
        members.push(x);
    }

    let mut items = Vec::with_capacity(members.len());
    let mut i = 0;
    while i < members.len() {
        let is_range = i + 2 < members.len()
            && members[i + 1].is_ascii_byte(b'-')
            && members[i] <= members[i + 2];
        if is_range {
            items.push(SetItem::Range(members[i], members[i + 2]));
            i += 3;
        } else {
            items.push(SetItem::Single(members[i]));
            i += 1;
        }
    }

    Some((CharSet { negated, items }, pos))
}
