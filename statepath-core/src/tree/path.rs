//! Path Expressions
//!
//! A path addresses one location in a [`StateTree`](super::StateTree). Paths
//! are parsed once, up front, into discrete segments so that reads and writes
//! never have to re-inspect the source string.
//!
//! # Grammar
//!
//! - Dot-separated names: `user.profile.name`
//! - Bracketed indices: `todos[0].title`
//! - Bracketed quoted keys, for names containing `.` or `[`: `files['a.txt']`
//!
//! A dot segment that is an index literal (`0`, or a non-zero digit followed
//! by digits) is treated as an index, so `todos.0` and `todos[0]` address the
//! same location. `todos.01` is a key.

use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Mapping key.
    Key(String),
    /// Sequence index.
    Index(usize),
}

impl Segment {
    fn from_name(name: String) -> Self {
        match index_literal(&name).and_then(|digits| digits.parse().ok()) {
            Some(index) => Segment::Index(index),
            None => Segment::Key(name),
        }
    }

    /// The mapping key this segment addresses when applied to a map.
    ///
    /// Index segments address the key spelled by their decimal form.
    pub fn map_key(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Segment::Key(key) => key.as_str().into(),
            Segment::Index(index) => index.to_string().into(),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A parsed path expression.
///
/// Keeps the source text for display (action names, error messages) next to
/// the parsed segments.
#[derive(Debug, Clone)]
pub struct Path {
    source: String,
    segments: SmallVec<[Segment; 4]>,
}

impl Path {
    /// Parse a path expression.
    pub fn parse(source: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(Error::malformed(source, "empty path"));
        }

        let mut segments = SmallVec::new();
        let mut chars = source.chars().peekable();
        let mut after_dot = false;

        loop {
            match chars.peek().copied() {
                None if after_dot => return Err(Error::malformed(source, "trailing `.`")),
                None => break,
                Some('.') => return Err(Error::malformed(source, "empty segment")),
                Some(']') => return Err(Error::malformed(source, "unmatched `]`")),
                Some('[') if after_dot => {
                    return Err(Error::malformed(source, "`[` directly after `.`"))
                }
                Some('[') => {
                    chars.next();
                    segments.push(parse_bracket(source, &mut chars)?);
                    match chars.peek() {
                        None | Some('[') => after_dot = false,
                        Some('.') => {
                            chars.next();
                            after_dot = true;
                        }
                        Some(_) => {
                            return Err(Error::malformed(source, "unexpected character after `]`"))
                        }
                    }
                }
                Some(_) => {
                    let mut name = String::new();
                    while let Some(&c) = chars.peek() {
                        if matches!(c, '.' | '[' | ']') {
                            break;
                        }
                        name.push(c);
                        chars.next();
                    }
                    segments.push(Segment::from_name(name));
                    match chars.peek() {
                        Some('.') => {
                            chars.next();
                            after_dot = true;
                        }
                        Some(']') => return Err(Error::malformed(source, "unmatched `]`")),
                        _ => after_dot = false,
                    }
                }
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The expression this path was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; parsing rejects empty paths.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render the first `depth` segments, for error messages.
    pub(crate) fn prefix(&self, depth: usize) -> String {
        let mut out = String::new();
        for segment in self.segments.iter().take(depth) {
            match segment {
                Segment::Index(index) => out.push_str(&format!("[{index}]")),
                Segment::Key(key) if key.contains(['.', '[', ']']) => {
                    out.push_str(&format!("['{key}']"))
                }
                Segment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
            }
        }
        out
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for Path {}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse the inside of a bracket segment; the opening `[` is already consumed.
fn parse_bracket(source: &str, chars: &mut Peekable<Chars<'_>>) -> Result<Segment> {
    if let Some(quote @ ('\'' | '"')) = chars.peek().copied() {
        chars.next();
        let mut key = String::new();
        loop {
            match chars.next() {
                None => return Err(Error::malformed(source, "unclosed quoted key")),
                Some(c) if c == quote => break,
                Some(c) => key.push(c),
            }
        }
        return match chars.next() {
            Some(']') => Ok(Segment::Key(key)),
            None => Err(Error::malformed(source, "unclosed `[`")),
            Some(_) => Err(Error::malformed(source, "expected `]` after quoted key")),
        };
    }

    let mut body = String::new();
    loop {
        match chars.next() {
            None => return Err(Error::malformed(source, "unclosed `[`")),
            Some(']') => break,
            Some(c) => body.push(c),
        }
    }

    let digits = index_literal(&body)
        .ok_or_else(|| Error::malformed(source, "brackets must hold an index or a quoted key"))?;
    digits
        .parse()
        .map(Segment::Index)
        .map_err(|_| Error::malformed(source, "index out of range"))
}

/// `Some(s)` if `s` is `0` or a non-zero digit followed by digits.
fn index_literal(s: &str) -> Option<&str> {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b'0') if s.len() == 1 => Some(s),
        Some(b'1'..=b'9') if bytes.all(|b| b.is_ascii_digit()) => Some(s),
        _ => None,
    }
}
