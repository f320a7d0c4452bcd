use crate::path::{PropertyPath, Segment, join_canonical};

/// Returns every variant of `path` with one or more keys removed.
///
/// Used to find converters registered for a collection as a whole
/// (`items.price`) when converting one element of it (`items[0].price`).
/// Variants are produced in a stable order: the first key stripped,
/// then recursively the remaining keys with and without the first one.
///
/// # Examples
///
/// ```
/// use pw_bind::path::{PropertyPath, stripped_paths};
///
/// let path = PropertyPath::parse("a[0].b[1]").unwrap();
/// assert_eq!(stripped_paths(&path), ["a.b[1]", "a.b", "a[0].b"]);
/// ```
pub fn stripped_paths(path: &PropertyPath) -> Vec<String> {
    let positions: Vec<(usize, usize)> = path
        .segments()
        .iter()
        .enumerate()
        .flat_map(|(s, segment)| (0..segment.keys().len()).map(move |k| (s, k)))
        .collect();

    let mut out = Vec::new();
    let kept = vec![true; positions.len()];
    strip_from(path.segments(), &positions, kept, 0, &mut out);
    out
}

fn strip_from(
    segments: &[Segment],
    positions: &[(usize, usize)],
    kept: Vec<bool>,
    index: usize,
    out: &mut Vec<String>,
) {
    if index >= positions.len() {
        return;
    }
    let mut stripped = kept.clone();
    stripped[index] = false;
    out.push(render(segments, positions, &stripped));
    strip_from(segments, positions, stripped, index + 1, out);
    strip_from(segments, positions, kept, index + 1, out);
}

fn render(segments: &[Segment], positions: &[(usize, usize)], kept: &[bool]) -> String {
    let rebuilt: Vec<Segment> = segments
        .iter()
        .enumerate()
        .map(|(s, segment)| {
            let keys = segment
                .keys()
                .iter()
                .enumerate()
                .filter(|&(k, _)| {
                    positions
                        .iter()
                        .position(|&p| p == (s, k))
                        .is_none_or(|at| kept[at])
                })
                .map(|(_, key)| key.clone())
                .collect();
            Segment::new(segment.name(), keys)
        })
        .collect();
    join_canonical(&rebuilt)
}

/// Whether a converter registered for `registered` applies to the collection
/// at `path`, that is, `registered` is `path` itself or `path` plus one key.
///
/// # Examples
///
/// ```
/// use pw_bind::path::matches_property;
///
/// assert!(matches_property("items", "items"));
/// assert!(matches_property("items[0]", "items"));
/// assert!(!matches_property("items[0].price", "items"));
/// assert!(!matches_property("itemsx", "items"));
/// ```
pub fn matches_property(registered: &str, path: &str) -> bool {
    let Some(rest) = registered.strip_prefix(path) else {
        return false;
    };
    if rest.is_empty() {
        return true;
    }
    if !rest.starts_with('[') {
        return false;
    }
    rest.find(']') == Some(rest.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_keys_no_variants() {
        let path = PropertyPath::parse("a.b").unwrap();
        assert!(stripped_paths(&path).is_empty());
    }

    #[test]
    fn single_key() {
        let path = PropertyPath::parse("items[0].price").unwrap();
        assert_eq!(stripped_paths(&path), ["items.price"]);
    }

    #[test]
    fn two_keys_in_one_segment() {
        let path = PropertyPath::parse("m[a][0]").unwrap();
        assert_eq!(stripped_paths(&path), ["m[0]", "m", "m[a]"]);
    }
}
