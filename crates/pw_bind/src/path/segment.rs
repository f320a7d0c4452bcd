use alloc::borrow::Cow;
use core::fmt;
use core::str::FromStr;

use pw_utils::vec::FastVec;

use crate::error::MalformedPathError;

// -----------------------------------------------------------------------------
// Segment

/// One component of a property path: a property name and its index/key list.
///
/// `items[0][name]` is a single segment with name `items` and keys `0`, `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    name: String,
    keys: Vec<String>,
}

impl Segment {
    /// Creates a segment from an unescaped name and unquoted keys.
    #[inline]
    pub fn new(name: impl Into<String>, keys: Vec<String>) -> Self {
        Self {
            name: name.into(),
            keys,
        }
    }

    /// Creates a segment without keys.
    #[inline]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// The bare property name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The index/key list, empty for a plain property.
    #[inline]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Returns this segment keeping only its first `len` keys.
    pub fn with_keys(&self, len: usize) -> Segment {
        Segment {
            name: self.name.clone(),
            keys: self.keys[..len.min(self.keys.len())].to_vec(),
        }
    }

    /// The escaped property name, as it appears in a canonical path.
    pub fn canonical_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        push_escaped_name(&mut out, &self.name);
        out
    }

    /// The canonical form of this segment, e.g. `map[key]`.
    pub fn canonical(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 4 * self.keys.len());
        self.write_canonical(&mut out);
        out
    }

    pub(crate) fn write_canonical(&self, out: &mut String) {
        push_escaped_name(out, &self.name);
        for key in &self.keys {
            push_canonical_key(out, key);
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

fn push_escaped_name(out: &mut String, name: &str) {
    for c in name.chars() {
        if matches!(c, '.' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
}

fn push_canonical_key(out: &mut String, key: &str) {
    out.push('[');
    if needs_quotes(key) {
        let quote = if key.contains("']") { '"' } else { '\'' };
        out.push(quote);
        out.push_str(key);
        out.push(quote);
    } else {
        out.push_str(key);
    }
    out.push(']');
}

/// A key must be quoted when plain bracket scanning would not read it back.
fn needs_quotes(key: &str) -> bool {
    if key.starts_with(['\'', '"']) {
        return true;
    }
    let mut depth = 0_usize;
    for c in key.chars() {
        match c {
            '[' => depth += 1,
            ']' => match depth.checked_sub(1) {
                Some(next) => depth = next,
                None => return true,
            },
            _ => {}
        }
    }
    depth != 0
}

// -----------------------------------------------------------------------------
// PropertyPath

/// A tokenized property path together with its canonical form.
///
/// # Syntax
///
/// - Segments are separated by `.` outside of brackets.
/// - Each segment may carry any number of `[key]` groups.
/// - A key may be quoted with `'` or `"`, one pair of quotes is stripped.
/// - Brackets nest, `map[a[0]]` has the single key `a[0]`.
/// - `\` escapes the next character of a property name.
///
/// Re-parsing the canonical form yields the same segments.
///
/// # Examples
///
/// ```
/// use pw_bind::path::PropertyPath;
///
/// let path = PropertyPath::parse("prices['EUR'].amount").unwrap();
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.canonical(), "prices[EUR].amount");
/// assert_eq!(path.segments()[0].keys(), ["EUR"]);
///
/// assert!(PropertyPath::parse("items[0").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Box<[Segment]>,
    canonical: String,
}

impl PropertyPath {
    /// Tokenizes `path`.
    pub fn parse(path: &str) -> Result<Self, MalformedPathError> {
        let mut vec: FastVec<Segment, 8> = FastVec::new();
        let data = vec.get();

        let chars: Vec<(usize, char)> = path.char_indices().collect();
        let mut name = String::new();
        let mut keys: Vec<String> = Vec::new();
        let mut after_key = false;
        let mut start = 0;
        let mut i = 0;

        while i < chars.len() {
            let (offset, c) = chars[i];
            match c {
                '.' => {
                    if name.is_empty() {
                        return Err(malformed(path, offset, "empty property name"));
                    }
                    data.push(Segment::new(core::mem::take(&mut name), core::mem::take(&mut keys)));
                    after_key = false;
                    start = i + 1;
                    i += 1;
                }
                '[' => {
                    if name.is_empty() {
                        return Err(malformed(path, offset, "index without property name"));
                    }
                    let (key, next) = scan_key(path, &chars, i)?;
                    keys.push(key);
                    after_key = true;
                    i = next;
                }
                ']' => return Err(malformed(path, offset, "unbalanced `]`")),
                _ if after_key => {
                    return Err(malformed(path, offset, "expected `.` or `[` after key"));
                }
                '\\' => {
                    let Some(&(_, escaped)) = chars.get(i + 1) else {
                        return Err(malformed(path, offset, "dangling escape"));
                    };
                    name.push(escaped);
                    i += 2;
                }
                _ => {
                    name.push(c);
                    i += 1;
                }
            }
        }

        if name.is_empty() {
            let offset = chars.get(start).map_or(path.len(), |&(offset, _)| offset);
            return Err(malformed(path, offset, "empty property name"));
        }
        data.push(Segment::new(name, keys));

        Ok(Self::from_segments(vec.into_boxed_slice()))
    }

    /// Builds a path from already tokenized segments.
    pub fn from_segments(segments: impl Into<Box<[Segment]>>) -> Self {
        let segments = segments.into();
        let canonical = join_canonical(&segments);
        Self {
            segments,
            canonical,
        }
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The normalized path string.
    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns the head segment and the remaining tail.
    #[inline]
    pub fn split_first(&self) -> Option<(&Segment, &[Segment])> {
        self.segments.split_first()
    }

    /// Whether this path has a single segment without keys.
    #[inline]
    pub fn is_simple(&self) -> bool {
        matches!(&*self.segments, [only] if !only.is_indexed())
    }
}

impl FromStr for PropertyPath {
    type Err = MalformedPathError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PropertyPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Joins segments into their canonical `a.b[0].c` form.
pub fn join_canonical(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            out.push('.');
        }
        segment.write_canonical(&mut out);
    }
    out
}

#[inline]
fn malformed(path: &str, offset: usize, reason: &'static str) -> MalformedPathError {
    MalformedPathError {
        path: path.into(),
        offset,
        reason: Cow::Borrowed(reason),
    }
}

/// Scans the key group opening at `chars[open]`, returns the key and the index
/// just past its closing bracket.
fn scan_key(
    path: &str,
    chars: &[(usize, char)],
    open: usize,
) -> Result<(String, usize), MalformedPathError> {
    let first = open + 1;

    if let Some(&(_, quote @ ('\'' | '"'))) = chars.get(first) {
        let mut j = first + 1;
        while j + 1 < chars.len() {
            if chars[j].1 == quote && chars[j + 1].1 == ']' {
                let key = chars[first + 1..j].iter().map(|&(_, c)| c).collect();
                return Ok((key, j + 2));
            }
            j += 1;
        }
    }

    let mut depth = 1_usize;
    let mut j = first;
    while j < chars.len() {
        match chars[j].1 {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let key = chars[first..j].iter().map(|&(_, c)| c).collect();
                    return Ok((key, j + 1));
                }
            }
            _ => {}
        }
        j += 1;
    }

    Err(malformed(path, chars[open].0, "unclosed `[`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(path: &PropertyPath, index: usize) -> Vec<&str> {
        path.segments()[index]
            .keys()
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn simple_and_nested() {
        let path = PropertyPath::parse("a.b[2].c").unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.segments()[0].name(), "a");
        assert_eq!(path.segments()[1].name(), "b");
        assert_eq!(keys(&path, 1), ["2"]);
        assert_eq!(path.canonical(), "a.b[2].c");
        assert!(!path.is_simple());
        assert!(PropertyPath::parse("name").unwrap().is_simple());
    }

    #[test]
    fn quotes_are_stripped() {
        let path = PropertyPath::parse("map['key'].x").unwrap();
        assert_eq!(keys(&path, 0), ["key"]);
        assert_eq!(path.canonical(), "map[key].x");

        let path = PropertyPath::parse("map[\"a.b\"]").unwrap();
        assert_eq!(keys(&path, 0), ["a.b"]);
        assert_eq!(path.canonical(), "map[a.b]");
    }

    #[test]
    fn nested_brackets_and_multiple_keys() {
        let path = PropertyPath::parse("m[a[0]][1]").unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(keys(&path, 0), ["a[0]", "1"]);

        let path = PropertyPath::parse("m['x]y']").unwrap();
        assert_eq!(keys(&path, 0), ["x]y"]);
        assert_eq!(path.canonical(), "m['x]y']");
    }

    #[test]
    fn dots_inside_keys_do_not_split() {
        let path = PropertyPath::parse("props[a.b.c].value").unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(keys(&path, 0), ["a.b.c"]);
    }

    #[test]
    fn canonical_is_idempotent() {
        for raw in [
            "a.b[2].c",
            "map['key']",
            "m['x]y'][\"q\"]",
            "m[a[0]]",
            "odd\\.name[k]",
            "m['\\'']",
            "m[]",
        ] {
            let first = PropertyPath::parse(raw).unwrap();
            let second = PropertyPath::parse(first.canonical()).unwrap();
            assert_eq!(first.segments(), second.segments(), "path {raw}");
            assert_eq!(first.canonical(), second.canonical());
        }
    }

    #[test]
    fn escaped_names() {
        let path = PropertyPath::parse("a\\.b.c").unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.segments()[0].name(), "a.b");
        assert_eq!(path.canonical(), "a\\.b.c");
    }

    #[test]
    fn malformed_paths() {
        let cases = [
            ("", 0),
            ("a.", 2),
            (".a", 0),
            ("a..b", 2),
            ("a[0", 1),
            ("a]0", 1),
            ("a[0]b", 4),
            ("[0]", 0),
            ("a\\", 1),
        ];
        for (raw, offset) in cases {
            let err = PropertyPath::parse(raw).unwrap_err();
            assert_eq!(err.offset, offset, "path {raw:?}: {err}");
            assert_eq!(err.path, raw);
        }
    }

    #[test]
    fn split_first_and_prefix_keys() {
        let path = PropertyPath::parse("a[1][2].b").unwrap();
        let (head, tail) = path.split_first().unwrap();
        assert_eq!(head.canonical(), "a[1][2]");
        assert_eq!(tail.len(), 1);
        assert_eq!(head.with_keys(1).canonical(), "a[1]");
        assert_eq!(head.with_keys(0).canonical(), "a");
        assert_eq!(join_canonical(path.segments()), "a[1][2].b");
    }
}
