use log::trace;

use crate::uset::error::{Result, UsetError};

/// Characters with structural meaning to the parser.
pub const METACHARS: &str = "[]{}\\&-|^$:()";

pub fn is_meta(c: char) -> bool {
    METACHARS.contains(c)
}

/// Pushes `c`, backslash-prefixed when the parser would read it as syntax.
pub fn push_escaped(out: &mut String, c: char) {
    if is_meta(c) {
        out.push('\\');
    }
    out.push(c);
}

pub fn named_escape(c: char) -> Option<char> {
    match c {
        'a' => Some('\u{07}'),
        'b' => Some('\u{08}'),
        't' => Some('\t'),
        'v' => Some('\u{0B}'),
        'f' => Some('\u{0C}'),
        'r' => Some('\r'),
        'n' => Some('\n'),
        '\\' => Some('\\'),
        _ => None,
    }
}

/// `\t` -> TAB, and any other escaped character stands for itself.
pub fn decode_named(c: char) -> char {
    named_escape(c).unwrap_or(c)
}

enum Decoded {
    Char(char),
    Chars(Vec<char>), // \u{61 62 63}
}

fn starts_with(chars: &[char], at: usize, prefix: &str) -> bool {
    let mut i = at;
    for p in prefix.chars() {
        if chars.get(i) != Some(&p) {
            return false;
        }
        i += 1;
    }
    true
}

fn escape_error(chars: &[char], start: usize, end: usize) -> UsetError {
    let end = end.min(chars.len());
    UsetError::Escape {
        text: chars[start..end].iter().collect(),
        position: start,
    }
}

fn to_char(chars: &[char], start: usize, end: usize, digits: &str) -> Result<char> {
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| escape_error(chars, start, end))
}

// `\uHHHH`, `\UHHHHHHHH`, `\xHH`
fn fixed_hex(chars: &[char], start: usize, width: usize) -> Option<String> {
    let from = start + 2;
    let digits = chars.get(from..from + width)?;
    if digits.iter().all(|c| c.is_ascii_hexdigit()) {
        Some(digits.iter().collect())
    } else {
        None
    }
}

// `\ux{H+}` (exactly one value) or `\u{H+ H+ ...}`
fn braced_hex(chars: &[char], start: usize, open: usize, single: bool) -> Result<(Decoded, usize)> {
    let close = chars[open..]
        .iter()
        .position(|&c| c == '}')
        .map(|p| open + p)
        .ok_or_else(|| escape_error(chars, start, chars.len()))?;
    let body: String = chars[open + 1..close].iter().collect();
    let tokens: Vec<&str> = body.split_whitespace().collect();

    if tokens.is_empty() || (single && tokens.len() > 1) {
        return Err(escape_error(chars, start, close + 1));
    }
    let mut decoded = Vec::with_capacity(tokens.len());
    for token in tokens {
        if !token.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(escape_error(chars, start, close + 1));
        }
        decoded.push(to_char(chars, start, close + 1, token)?);
    }

    let used = close + 1 - start;
    if decoded.len() == 1 {
        Ok((Decoded::Char(decoded[0]), used))
    } else {
        Ok((Decoded::Chars(decoded), used))
    }
}

// Tries each hex form at `start` (a backslash) in priority order.
fn hex_escape(chars: &[char], start: usize) -> Result<Option<(Decoded, usize)>> {
    if starts_with(chars, start + 1, "ux{") {
        return braced_hex(chars, start, start + 3, true).map(Some);
    }
    if starts_with(chars, start + 1, "u{") {
        return braced_hex(chars, start, start + 2, false).map(Some);
    }

    let width = match chars.get(start + 1) {
        Some('u') => 4,
        Some('U') => 8,
        Some('x') => 2,
        _ => return Ok(None),
    };
    match fixed_hex(chars, start, width) {
        Some(digits) => {
            let end = start + 2 + width;
            let c = to_char(chars, start, end, &digits)?;
            Ok(Some((Decoded::Char(c), end - start)))
        }
        None => Ok(None),
    }
}

/// Rewrites hex escapes into literal characters and drops layout whitespace.
///
/// Decoded characters that collide with syntax are re-escaped, and a
/// multi-value `\u{...}` becomes a `{...}` string block. Every other
/// backslash pair is copied through untouched for the parser.
pub fn normalize(raw: &str) -> Result<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    // inside a raw `{...}` block decoded text joins the open block
    let mut in_block = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            if let Some((decoded, used)) = hex_escape(&chars, i)? {
                match decoded {
                    Decoded::Char(d) => push_escaped(&mut out, d),
                    Decoded::Chars(ds) if in_block => {
                        for d in ds {
                            push_escaped(&mut out, d);
                        }
                    }
                    Decoded::Chars(ds) => {
                        out.push('{');
                        for d in ds {
                            push_escaped(&mut out, d);
                        }
                        out.push('}');
                    }
                }
                i += used;
                continue;
            }
            out.push('\\');
            if let Some(&next) = chars.get(i + 1) {
                out.push(next);
                i += 1;
            }
        } else if !c.is_whitespace() {
            match c {
                '{' => in_block = true,
                '}' => in_block = false,
                _ => {}
            }
            out.push(c);
        }
        i += 1;
    }

    trace!("normalized {raw:?} to {out:?}");
    Ok(out)
}

/// Decodes every escape in `text` to plain characters, replacing `\N` with
/// the text of group `N` taken from `groups`.
pub fn unescape(text: &str, groups: &[String]) -> Result<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        if let Some((decoded, used)) = hex_escape(&chars, i)? {
            match decoded {
                Decoded::Char(d) => out.push(d),
                Decoded::Chars(ds) => out.extend(ds),
            }
            i += used;
            continue;
        }
        match chars.get(i + 1) {
            Some(d) if d.is_ascii_digit() => {
                let group = d.to_digit(10).unwrap_or(0) as usize;
                let captured = group
                    .checked_sub(1)
                    .and_then(|n| groups.get(n))
                    .ok_or(UsetError::UnresolvedReference { group })?;
                out.push_str(captured);
            }
            Some(&e) => out.push(decode_named(e)),
            None => out.push('\\'),
        }
        i += 2;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hex_forms() {
        assert_eq!(normalize(r"a\x62\U00000063").unwrap(), "abc");
        assert_eq!(normalize(r"\ux{1F600}").unwrap(), "\u{1F600}");
        assert_eq!(normalize(r"\u{e9}").unwrap(), "é");
    }

    #[test]
    fn reescapes_metachars() {
        assert_eq!(normalize(r"\x5B\x5D").unwrap(), r"\[\]");
        assert_eq!(normalize(r"\x5B]").unwrap(), r"\[]");
        assert_eq!(normalize(r"\x2D").unwrap(), r"\-");
        assert_eq!(normalize(r"\x28").unwrap(), r"\(");
    }

    #[test]
    fn multi_value_brace_escape_becomes_string_block() {
        assert_eq!(normalize(r"\u{61 62}").unwrap(), "{ab}");
        assert_eq!(normalize(r"\u{61 7B}").unwrap(), r"{a\{}");
    }

    #[test]
    fn multi_value_escape_joins_an_open_block() {
        assert_eq!(normalize(r"{a\u{62 63}d}").unwrap(), "{abcd}");
        assert_eq!(normalize(r"{a\u{62 7D}}").unwrap(), r"{ab\}}");
        // an escaped brace does not open a block
        assert_eq!(normalize(r"\{\u{61 62}").unwrap(), r"\{{ab}");
    }

    #[test]
    fn strips_raw_whitespace_only() {
        assert_eq!(normalize("[a b]\t c").unwrap(), "[ab]c");
        assert_eq!(normalize(r"a\x20b").unwrap(), "a b");
        assert_eq!(normalize(r"a\ b").unwrap(), r"a\ b");
    }

    #[test]
    fn leaves_other_escapes_for_the_parser() {
        assert_eq!(normalize(r"(a)\1\t\[").unwrap(), r"(a)\1\t\[");
        // too few digits is not a hex escape
        assert_eq!(normalize(r"\u12").unwrap(), r"\u12");
    }

    #[test]
    fn rejects_bad_braced_digits() {
        let err = normalize(r"ab\u{12G}").unwrap_err();
        assert_eq!(
            err,
            UsetError::Escape {
                text: r"\u{12G}".into(),
                position: 2
            }
        );
        assert!(matches!(normalize(r"\u{}"), Err(UsetError::Escape { .. })));
        assert!(matches!(normalize(r"\ux{61 62}"), Err(UsetError::Escape { .. })));
        assert!(matches!(normalize(r"\u{61"), Err(UsetError::Escape { .. })));
    }

    #[test]
    fn rejects_out_of_range_code_points() {
        assert!(matches!(normalize(r"\U00110000"), Err(UsetError::Escape { .. })));
        assert!(matches!(normalize(r"\uD800"), Err(UsetError::Escape { .. })));
        assert!(matches!(normalize(r"\u{FFFFFFFFF}"), Err(UsetError::Escape { .. })));
    }

    #[test]
    fn named_escapes() {
        assert_eq!(decode_named('n'), '\n');
        assert_eq!(decode_named('t'), '\t');
        assert_eq!(decode_named('a'), '\u{07}');
        assert_eq!(decode_named('['), '[');
    }

    #[test]
    fn unescape_substitutes_groups() {
        let groups = vec!["xy".to_string()];
        assert_eq!(unescape(r"a\1b\t\[", &groups).unwrap(), "axyb\t[");
        assert_eq!(
            unescape(r"\2", &groups),
            Err(UsetError::UnresolvedReference { group: 2 })
        );
        assert_eq!(unescape("a b\\", &[]).unwrap(), "a b\\");
    }
}
