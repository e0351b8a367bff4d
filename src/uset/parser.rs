use log::debug;

use crate::uset::algebra::{difference, intersect, range, union};
use crate::uset::ast::{Atom, SetValue, Sequence};
use crate::uset::error::{Result, UsetError};
use crate::uset::escape::{decode_named, normalize};

/// Result of consuming one grammar unit: the position after it, the previous
/// item (`None` once an operator has consumed it) and the parsed value
/// (`None` at the end of input).
pub type Item = (usize, Option<SetValue>, Option<SetValue>);

/// Parses a UnicodeSet expression into a sequence of set values.
pub fn parse(expression: &str) -> Result<Sequence> {
    let normalized = normalize(expression)?;
    let input: Vec<char> = normalized.chars().collect();
    let end = input.len();

    let mut seq = Sequence::new();
    // (group slot, source position) of every group still open
    let mut open: Vec<(usize, usize)> = Vec::new();
    // the last value stays pending so a following operator can consume it
    let mut held: Option<SetValue> = None;
    let mut i = 0;

    while i < end {
        let start = i;
        let (next, previous, value) = parse_item(&input, i, held.take(), end)?;
        i = next;
        if let Some(previous) = previous {
            push_value(&mut seq, previous);
        }
        let Some(value) = value else { break };

        if value.start_group {
            open.push((seq.groups.len(), start));
            seq.groups.push((seq.len(), seq.len()));
        } else if value.end_group {
            let (slot, _) = open.pop().ok_or(UsetError::Syntax {
                delimiter: ')',
                position: start,
            })?;
            seq.groups[slot].1 = seq.len();
        } else {
            held = Some(value);
        }
    }
    if let Some(last) = held {
        push_value(&mut seq, last);
    }

    if let Some(&(_, position)) = open.first() {
        return Err(UsetError::Syntax {
            delimiter: '(',
            position,
        });
    }

    debug!(
        "parsed {expression:?} into {} positions and {} groups",
        seq.len(),
        seq.groups.len()
    );
    Ok(seq)
}

fn push_value(seq: &mut Sequence, value: SetValue) {
    // a negated value with no members still stands for every code point
    if !value.is_empty() || value.negative {
        seq.push(value);
    }
}

/// Consumes exactly one grammar unit of `input` starting at `position`,
/// never reading at or past `end`.
pub fn parse_item(
    input: &[char],
    position: usize,
    previous: Option<SetValue>,
    end: usize,
) -> Result<Item> {
    if position >= end {
        return Ok((end, previous, None));
    }

    match input[position] {
        '[' => {
            let (next, value) = parse_class(input, position, end)?;
            Ok((next, previous, Some(value)))
        }
        '|' | '&' | '-' => parse_operator(input, position, previous, end),
        '{' => {
            let (next, value) = parse_string_block(input, position, end)?;
            Ok((next, previous, Some(value)))
        }
        '\\' => {
            let value = match input.get(position + 1) {
                Some(d) if position + 1 < end && d.is_ascii_digit() => {
                    let group = d.to_digit(10).unwrap_or(0) as usize;
                    SetValue::from_atoms([Atom::BackRef(group)])
                }
                Some(&e) if position + 1 < end => SetValue::literal(decode_named(e)),
                // a trailing backslash is itself
                _ => return Ok((position + 1, previous, Some(SetValue::literal('\\')))),
            };
            Ok((position + 2, previous, Some(value)))
        }
        '(' => Ok((position + 1, previous, Some(SetValue::group_start()))),
        ')' => Ok((position + 1, previous, Some(SetValue::group_end()))),
        c => Ok((position + 1, previous, Some(SetValue::literal(c)))),
    }
}

// Index of the unescaped `}` closing the block opened at `open`.
fn brace_close(input: &[char], open: usize, end: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < end {
        match input[i] {
            '\\' => i += 1,
            '}' => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

// Index of the `]` closing the class opened at `open`, stepping over nested
// classes, escapes and string blocks. An unclosed block inside the class is
// reported against its own `{`.
fn bracket_close(input: &[char], open: usize, end: usize) -> Result<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < end {
        match input[i] {
            '\\' => i += 1,
            '{' => {
                i = brace_close(input, i, end).ok_or(UsetError::Syntax {
                    delimiter: '{',
                    position: i,
                })?
            }
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(UsetError::Syntax {
        delimiter: '[',
        position: open,
    })
}

fn parse_class(input: &[char], open: usize, end: usize) -> Result<(usize, SetValue)> {
    let close = bracket_close(input, open, end)?;

    let mut i = open + 1;
    let negate = i < close && input[i] == '^';
    if negate {
        i += 1;
    }

    let mut acc = SetValue::new();
    let mut held: Option<SetValue> = None;
    while i < close {
        let (next, previous, value) = parse_item(input, i, held.take(), close)?;
        if let Some(previous) = previous {
            acc = union(&acc, &previous);
        }
        // groups do not exist inside a class: `(` and `)` are plain members
        held = value.map(|v| if v.is_marker() { SetValue::literal(input[i]) } else { v });
        i = next;
    }
    if let Some(last) = held {
        acc = union(&acc, &last);
    }

    acc.is_class = true;
    acc.negative ^= negate;
    Ok((close + 1, acc))
}

fn parse_string_block(input: &[char], open: usize, end: usize) -> Result<(usize, SetValue)> {
    let close = brace_close(input, open, end).ok_or(UsetError::Syntax {
        delimiter: '{',
        position: open,
    })?;

    let mut text = String::new();
    let mut i = open + 1;
    while i < close {
        if input[i] == '\\' && i + 1 < close {
            text.push(decode_named(input[i + 1]));
            i += 2;
        } else {
            text.push(input[i]);
            i += 1;
        }
    }
    Ok((close + 1, SetValue::from_atoms([Atom::string(&text)])))
}

fn is_operator(c: char) -> bool {
    matches!(c, '|' | '&' | '-')
}

// Binary operators are left-associative: `previous` is the left operand and
// the right operand is parsed here. Wherever the operator cannot apply, it
// reads as a literal and the right operand is left for the next item.
fn parse_operator(
    input: &[char],
    position: usize,
    previous: Option<SetValue>,
    end: usize,
) -> Result<Item> {
    let op = input[position];
    let literal = Some(SetValue::literal(op));

    let left = match previous {
        Some(left) if !left.is_marker() => left,
        other => return Ok((position + 1, other, literal)),
    };
    if position + 1 >= end || is_operator(input[position + 1]) {
        return Ok((position + 1, Some(left), literal));
    }

    let (next, _, right) = parse_item(input, position + 1, None, end)?;
    let right = match right {
        Some(right) if !right.is_marker() => right,
        _ => return Ok((position + 1, Some(left), literal)),
    };

    let value = match op {
        '|' => union(&left, &right),
        '&' => intersect(&left, &right),
        _ if left.is_class && right.is_class => difference(&left, &right),
        _ => match (left.single_char(), right.single_char()) {
            (Some(lo), Some(hi)) => range(lo, hi).ok_or(UsetError::ReversedRange {
                start: lo,
                end: hi,
                position,
            })?,
            _ => return Ok((position + 1, Some(left), literal)),
        },
    };
    Ok((next, None, Some(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(v: &SetValue) -> String {
        v.members.iter().map(|a| a.to_string()).collect()
    }

    fn positions(expr: &str) -> Vec<String> {
        parse(expr).unwrap().iter().map(chars).collect()
    }

    #[test]
    fn literal_is_one_position() {
        for c in ['a', 'z', '0', 'é', '\u{1F600}', '.', '*'] {
            let seq = parse(&c.to_string()).unwrap();
            assert_eq!(seq.len(), 1);
            assert_eq!(seq[0], SetValue::literal(c));
        }
    }

    #[test]
    fn literals_make_a_sequence() {
        assert_eq!(positions("abc"), vec!["a", "b", "c"]);
        assert_eq!(positions("a b\tc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn negated_class_keeps_members() {
        let seq = parse("[^a-c]").unwrap();
        assert_eq!(seq.len(), 1);
        assert!(seq[0].negative);
        assert!(seq[0].is_class);
        assert_eq!(chars(&seq[0]), "abc");
    }

    #[test]
    fn class_members_are_ordered() {
        assert_eq!(positions("[ba]"), positions("[ab]"));
        assert_eq!(positions("[cab]"), vec!["abc"]);
    }

    #[test]
    fn range_outside_class() {
        let seq = parse("a-c").unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(chars(&seq[0]), "abc");
        assert!(!seq[0].is_class);
    }

    #[test]
    fn reversed_range_fails() {
        assert_eq!(
            parse("[c-a]"),
            Err(UsetError::ReversedRange {
                start: 'c',
                end: 'a',
                position: 2
            })
        );
    }

    #[test]
    fn class_difference_and_intersection() {
        assert_eq!(positions("[[a-e]-[bd]]"), vec!["ace"]);
        assert_eq!(positions("[a-e]-[bd]"), vec!["ace"]);
        assert_eq!(positions("[[a-e]&[b-z]]"), vec!["bcde"]);
        assert_eq!(positions("[a-c]|[x]"), vec!["abcx"]);
    }

    #[test]
    fn difference_with_negated_operands() {
        // ¬{a,b} minus ¬{b,c} is {c}
        let seq = parse("[^ab]-[^bc]").unwrap();
        assert_eq!(chars(&seq[0]), "c");
        assert!(!seq[0].negative);

        let seq = parse("[^ab]-[c]").unwrap();
        assert_eq!(chars(&seq[0]), "abc");
        assert!(seq[0].negative);
    }

    #[test]
    fn nested_negation_inside_class() {
        let seq = parse("[^[^b]]").unwrap();
        assert_eq!(chars(&seq[0]), "b");
        assert!(!seq[0].negative);
    }

    #[test]
    fn dangling_operators_are_literals() {
        assert_eq!(positions("-a"), vec!["-", "a"]);
        assert_eq!(positions("a-"), vec!["a", "-"]);
        assert_eq!(positions("a|"), vec!["a", "|"]);
        assert_eq!(positions("[a-]"), vec!["-a"]);
        assert_eq!(positions("&"), vec!["&"]);
    }

    #[test]
    fn inapplicable_minus_keeps_right_operand() {
        assert_eq!(positions("[ab]-c"), vec!["ab", "-", "c"]);
        assert_eq!(positions("a--"), vec!["a", "-", "-"]);
    }

    #[test]
    fn operator_after_group_marker_is_literal() {
        let seq = parse("(a)-b").unwrap();
        assert_eq!(seq.iter().map(chars).collect::<Vec<_>>(), vec!["a", "-", "b"]);
        assert_eq!(seq.groups, vec![(0, 1)]);
    }

    #[test]
    fn string_block_is_one_atom() {
        let seq = parse("[{ab}c]").unwrap();
        let members: Vec<Atom> = seq[0].members.iter().cloned().collect();
        assert_eq!(members, vec![Atom::Str("ab".into()), Atom::Char('c')]);
    }

    #[test]
    fn string_block_is_bounded() {
        assert_eq!(positions("{ab}c{d\\}}"), vec!["ab", "c", "d}"]);
        assert_eq!(positions("{a\\tb}"), vec!["a\tb"]);
    }

    #[test]
    fn multi_value_hex_escape_is_string() {
        let seq = parse(r"[\u{61 62}c]").unwrap();
        assert!(seq[0].members.contains(&Atom::Str("ab".into())));
    }

    #[test]
    fn escaped_metachars_are_data() {
        assert_eq!(positions(r"\[\-\]"), vec!["[", "-", "]"]);
        assert_eq!(positions(r"[\]a]"), vec!["]a"]);
        assert_eq!(positions(r"\x5B"), vec!["["]);
    }

    #[test]
    fn named_escapes_decode() {
        assert_eq!(positions(r"\t\n"), vec!["\t", "\n"]);
    }

    #[test]
    fn backreference_is_an_atom() {
        let seq = parse(r"(a)\1").unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[1], SetValue::from_atoms([Atom::BackRef(1)]));
        assert_eq!(seq.groups, vec![(0, 1)]);
    }

    #[test]
    fn groups_are_numbered_by_opening() {
        let seq = parse("(a(b)c)(d)").unwrap();
        assert_eq!(seq.groups, vec![(0, 3), (1, 2), (3, 4)]);
    }

    #[test]
    fn unmatched_delimiters_fail() {
        assert_eq!(
            parse("[ab"),
            Err(UsetError::Syntax {
                delimiter: '[',
                position: 0
            })
        );
        assert_eq!(
            parse("x{ab"),
            Err(UsetError::Syntax {
                delimiter: '{',
                position: 1
            })
        );
        assert_eq!(
            parse("(a(b)"),
            Err(UsetError::Syntax {
                delimiter: '(',
                position: 0
            })
        );
        assert_eq!(
            parse("a)"),
            Err(UsetError::Syntax {
                delimiter: ')',
                position: 1
            })
        );
    }

    #[test]
    fn unclosed_block_inside_class_is_reported_at_the_brace() {
        assert_eq!(
            parse("[{a]"),
            Err(UsetError::Syntax {
                delimiter: '{',
                position: 1
            })
        );
    }

    #[test]
    fn multi_value_escape_inside_block_stays_one_atom() {
        assert_eq!(positions(r"{a\u{62 63}d}"), vec!["abcd"]);
        assert_eq!(positions(r"[{x\u{79 7A}}]"), vec!["xyz"]);
    }

    #[test]
    fn parentheses_inside_class_are_members() {
        assert_eq!(positions("[a)]"), vec![")a"]);
        assert_eq!(positions("[(b]"), vec!["(b"]);
        assert!(parse("[a)]").unwrap().groups.is_empty());
    }

    #[test]
    fn empty_class_is_dropped() {
        assert_eq!(positions("a[]b"), vec!["a", "b"]);
        assert_eq!(parse("[^]").unwrap().len(), 1);
    }

    #[test]
    fn parse_item_threads_previous() {
        let input: Vec<char> = "a-c".chars().collect();
        let (next, previous, value) = parse_item(&input, 0, None, 3).unwrap();
        assert_eq!((next, previous), (1, None));
        let (next, previous, value) = parse_item(&input, next, value, 3).unwrap();
        assert_eq!((next, previous), (3, None));
        assert_eq!(chars(&value.unwrap()), "abc");
        assert_eq!(parse_item(&input, 3, None, 3).unwrap(), (3, None, None));
    }
}
