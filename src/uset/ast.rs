use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{self, Write};

use crate::uset::escape::push_escaped;

/// Smallest member of a [`SetValue`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    Char(char),
    Str(String),    // {abc}
    BackRef(usize), // \1, \2, etc.
}

impl Atom {
    /// Builds a string atom, collapsing single characters to `Atom::Char`.
    pub fn string(s: &str) -> Atom {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Atom::Char(c),
            _ => Atom::Str(s.to_string()),
        }
    }

    pub fn group(&self) -> Option<usize> {
        match self {
            Atom::BackRef(n) => Some(*n),
            _ => None,
        }
    }

    fn literal<'a>(&'a self, buf: &'a mut [u8; 4]) -> Option<&'a str> {
        match self {
            Atom::Char(c) => Some(c.encode_utf8(buf)),
            Atom::Str(s) => Some(s),
            Atom::BackRef(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Atom::Char(_) => 0,
            Atom::Str(_) => 1,
            Atom::BackRef(_) => 2,
        }
    }
}

// Literals sort by code point sequence (utf-8 byte order agrees with it),
// backreferences after every literal.
impl Ord for Atom {
    fn cmp(&self, other: &Self) -> Ordering {
        let (mut x, mut y) = ([0u8; 4], [0u8; 4]);
        let by_text = match (self.literal(&mut x), other.literal(&mut y)) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.group().cmp(&other.group()),
        };
        by_text.then_with(|| self.rank().cmp(&other.rank()))
    }
}

impl PartialOrd for Atom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Char(c) => write!(f, "{c}"),
            Atom::Str(s) => write!(f, "{s}"),
            Atom::BackRef(n) => write!(f, "\\{n}"),
        }
    }
}

/// One parsed unit: a literal, an escape, a bracketed class, or a group marker.
///
/// A negative value denotes every code point *not* in `members`; the
/// complement is never materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetValue {
    pub members: BTreeSet<Atom>,
    pub negative: bool,
    pub is_class: bool,
    pub start_group: bool,
    pub end_group: bool,
}

impl SetValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(c: char) -> Self {
        Self::from_atoms([Atom::Char(c)])
    }

    pub fn from_atoms<I: IntoIterator<Item = Atom>>(atoms: I) -> Self {
        SetValue {
            members: atoms.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn class<I: IntoIterator<Item = Atom>>(atoms: I, negative: bool) -> Self {
        SetValue {
            negative,
            is_class: true,
            ..Self::from_atoms(atoms)
        }
    }

    pub fn group_start() -> Self {
        SetValue {
            start_group: true,
            ..Self::default()
        }
    }

    pub fn group_end() -> Self {
        SetValue {
            end_group: true,
            ..Self::default()
        }
    }

    pub fn is_marker(&self) -> bool {
        self.start_group || self.end_group
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// The character of a bare single-character literal, the only shape that
    /// can bound a range.
    pub fn single_char(&self) -> Option<char> {
        if self.is_class || self.negative || self.members.len() != 1 {
            return None;
        }
        match self.members.first() {
            Some(Atom::Char(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn contains(&self, atom: &Atom) -> bool {
        self.members.contains(atom) != self.negative
    }

    pub fn matches_char(&self, c: char) -> bool {
        self.contains(&Atom::Char(c))
    }
}

/// Ordered positions plus the `(start, end)` spans of capture groups,
/// numbered from 1 in order of their opening parenthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    pub items: Vec<SetValue>,
    pub groups: Vec<(usize, usize)>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: SetValue) {
        self.items.push(item);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SetValue> {
        self.items.iter()
    }

    /// Span of group `n` (1-based).
    pub fn group(&self, n: usize) -> Option<(usize, usize)> {
        n.checked_sub(1).and_then(|i| self.groups.get(i)).copied()
    }

    pub fn reverse(&self) -> Sequence {
        let len = self.items.len();
        Sequence {
            items: self.items.iter().rev().cloned().collect(),
            groups: self
                .groups
                .iter()
                .map(|&(start, end)| (len - end, len - start))
                .collect(),
        }
    }
}

impl std::ops::Index<usize> for Sequence {
    type Output = SetValue;

    fn index(&self, index: usize) -> &SetValue {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a SetValue;
    type IntoIter = std::slice::Iter<'a, SetValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// Canonical notation: parsing the rendered text yields the same members.
fn write_literal(out: &mut String, c: char) {
    if c.is_whitespace() || c.is_control() {
        let _ = write!(out, "\\u{{{:X}}}", c as u32);
    } else {
        push_escaped(out, c);
    }
}

fn write_atom(out: &mut String, atom: &Atom) {
    match atom {
        Atom::Char(c) => write_literal(out, *c),
        Atom::Str(s) => {
            out.push('{');
            s.chars().for_each(|c| write_literal(out, c));
            out.push('}');
        }
        Atom::BackRef(n) => {
            let _ = write!(out, "\\{n}");
        }
    }
}

impl fmt::Display for SetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_group {
            return f.write_str("(");
        }
        if self.end_group {
            return f.write_str(")");
        }
        let mut out = String::new();
        let bare = !self.is_class && !self.negative && self.members.len() == 1;
        if !bare {
            out.push('[');
            if self.negative {
                out.push('^');
            }
        }
        for atom in &self.members {
            write_atom(&mut out, atom);
        }
        if !bare {
            out.push(']');
        }
        f.write_str(&out)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in 0..=self.items.len() {
            // inner groups close first
            let mut closing: Vec<&(usize, usize)> = self
                .groups
                .iter()
                .filter(|g| g.1 == p && g.0 < p)
                .collect();
            closing.sort_by(|a, b| b.0.cmp(&a.0));
            for _ in closing {
                f.write_str(")")?;
            }
            // in group order, so numbering survives a reparse
            for g in self.groups.iter().filter(|g| g.0 == p) {
                f.write_str(if g.1 == p { "()" } else { "(" })?;
            }
            if let Some(item) = self.items.get(p) {
                write!(f, "{item}")?;
            }
        }
        Ok(())
    }
}
