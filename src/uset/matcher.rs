use crate::uset::ast::{Atom, Sequence};
use crate::uset::error::{Result, UsetError};

// Tries every member of `seq[pos]` at byte offset `at` of `text`, backtracking
// into later members when the rest of the sequence fails. `starts[p]` is the
// offset where position `p` began, which is all a backreference needs.
fn match_here(
    seq: &Sequence,
    pos: usize,
    text: &str,
    at: usize,
    starts: &mut Vec<usize>,
    whole: bool,
) -> Result<Option<usize>> {
    starts.truncate(pos);
    starts.push(at);

    if pos == seq.len() {
        // Sequence exhausted, we matched!
        return Ok(if !whole || at == text.len() { Some(at) } else { None });
    }

    let item = &seq[pos];
    let rest = &text[at..];

    if item.negative {
        // a complement consumes exactly one character outside its members
        return match rest.chars().next() {
            Some(c) if item.matches_char(c) => {
                match_here(seq, pos + 1, text, at + c.len_utf8(), starts, whole)
            }
            _ => Ok(None),
        };
    }

    for atom in &item.members {
        let needle = match atom {
            Atom::Char(c) => c.to_string(),
            Atom::Str(s) => s.clone(),
            Atom::BackRef(group) => {
                let (start, end) = seq
                    .group(*group)
                    .filter(|&(_, end)| end <= pos)
                    .ok_or(UsetError::UnresolvedReference { group: *group })?;
                text[starts[start]..starts[end]].to_string()
            }
        };
        if rest.starts_with(needle.as_str()) {
            let next = at + needle.len();
            if let Some(end) = match_here(seq, pos + 1, text, next, starts, whole)? {
                return Ok(Some(end));
            }
        }
    }
    Ok(None)
}

/// Anchors `seq` at the start of `text` and returns the length in bytes of
/// the first match found, trying members in their sorted order.
pub fn match_sequence(seq: &Sequence, text: &str) -> Result<Option<usize>> {
    let mut starts = Vec::with_capacity(seq.len() + 1);
    match_here(seq, 0, text, 0, &mut starts, false)
}

impl Sequence {
    /// Whether the whole of `text` is one of the strings this sequence denotes.
    pub fn is_match(&self, text: &str) -> Result<bool> {
        let mut starts = Vec::with_capacity(self.len() + 1);
        Ok(match_here(self, 0, text, 0, &mut starts, true)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::uset::{match_sequence, parse, UsetError};

    fn m(expr: &str, text: &str) -> Option<String> {
        let seq = parse(expr).unwrap();
        match_sequence(&seq, text)
            .unwrap()
            .map(|len| text[..len].to_string())
    }

    fn full(expr: &str, text: &str) -> bool {
        parse(expr).unwrap().is_match(text).unwrap()
    }

    #[test]
    fn matches_simple_prefix() {
        assert_eq!(m("abc", "abcdef"), Some("abc".into()));
        assert_eq!(m("abc", "ab"), None);
    }

    #[test]
    fn matches_classes_and_ranges() {
        assert_eq!(m("[a-c]x", "bx"), Some("bx".into()));
        assert_eq!(m("[a-c]x", "dx"), None);
        assert_eq!(m("[^a-c]x", "dx"), Some("dx".into()));
        assert_eq!(m("[^a-c]x", "ax"), None);
    }

    #[test]
    fn string_atoms_backtrack() {
        // "c" sorts first, so the match has to back off to "ch"
        assert!(full("[{ch}c]h", "chh"));
        assert!(full("[{ch}c]h", "ch"));
        assert!(!full("[{ch}c]h", "c"));
    }

    #[test]
    fn matches_group_and_backreference() {
        assert!(full(r"([ab]c)\1", "acac"));
        assert!(!full(r"([ab]c)\1", "acbc"));
        assert!(full(r"(é)\1", "éé"));
    }

    #[test]
    fn undefined_backreference_fails() {
        let seq = parse(r"a\3").unwrap();
        assert_eq!(
            match_sequence(&seq, "aa"),
            Err(UsetError::UnresolvedReference { group: 3 })
        );
    }

    #[test]
    fn agrees_with_flatten() {
        let seq = parse(r"([ab]{xy})[c\1]").unwrap();
        for s in seq.strings() {
            assert!(seq.is_match(&s.unwrap()).unwrap());
        }
        assert!(!seq.is_match("axyc_").unwrap());
    }
}
