use std::fmt::Write;

// Printable ASCII passes through; everything else is written as an escape
// the expression syntax reads back.
pub fn maybe_escape(s: &str, escape: bool) -> String {
    if !escape {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' '..='~' => out.push(c),
            c if (c as u32) <= 0xFFFF => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => {
                let _ = write!(out, "\\U{:08X}", c as u32);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_unless_asked() {
        assert_eq!(maybe_escape("é\t", false), "é\t");
    }

    #[test]
    fn escapes_non_ascii_and_controls() {
        assert_eq!(maybe_escape("a é\t", true), r"a \u00E9\u0009");
        assert_eq!(maybe_escape("\u{1F600}\\", true), r"\U0001F600\\");
    }

    #[test]
    fn escaped_text_reads_back() {
        let s = "x\u{1F600}\\\n";
        assert_eq!(usets::unescape(&maybe_escape(s, true), &[]).unwrap(), s);
    }
}
