// Set algebra over finite member sets carrying a sign bit.
//
// A negative operand stands for the complement of its members, so every
// operator is rewritten through De Morgan into an operation on the finite
// member sets:
//
//   A | B    +,+ A∪B    -,+ ¬(A∖B)   +,- ¬(B∖A)   -,- ¬(A∩B)
//   A & B    +,+ A∩B    -,+ B∖A      +,- A∖B      -,- ¬(A∪B)
//   A - B    +,+ A∖B    -,+ ¬(A∪B)   +,- A∩B      -,- B∖A

use std::collections::BTreeSet;

use crate::uset::ast::{Atom, SetValue};

fn or(a: &SetValue, b: &SetValue) -> BTreeSet<Atom> {
    a.members.union(&b.members).cloned().collect()
}

fn and(a: &SetValue, b: &SetValue) -> BTreeSet<Atom> {
    a.members.intersection(&b.members).cloned().collect()
}

fn minus(a: &SetValue, b: &SetValue) -> BTreeSet<Atom> {
    a.members.difference(&b.members).cloned().collect()
}

fn combined(members: BTreeSet<Atom>, negative: bool, is_class: bool) -> SetValue {
    SetValue {
        members,
        negative,
        is_class,
        ..SetValue::default()
    }
}

pub fn union(a: &SetValue, b: &SetValue) -> SetValue {
    let (members, negative) = match (a.negative, b.negative) {
        (false, false) => (or(a, b), false),
        (true, false) => (minus(a, b), true),
        (false, true) => (minus(b, a), true),
        (true, true) => (and(a, b), true),
    };
    combined(members, negative, a.is_class || b.is_class)
}

pub fn intersect(a: &SetValue, b: &SetValue) -> SetValue {
    let (members, negative) = match (a.negative, b.negative) {
        (false, false) => (and(a, b), false),
        (true, false) => (minus(b, a), false),
        (false, true) => (minus(a, b), false),
        (true, true) => (or(a, b), true),
    };
    combined(members, negative, a.is_class || b.is_class)
}

pub fn difference(a: &SetValue, b: &SetValue) -> SetValue {
    let (members, negative) = match (a.negative, b.negative) {
        (false, false) => (minus(a, b), false),
        (true, false) => (or(a, b), true),
        (false, true) => (and(a, b), false),
        (true, true) => (minus(b, a), false),
    };
    combined(members, negative, true)
}

/// Every code point from `start` to `end` inclusive, surrogates skipped.
/// `None` when the bounds are reversed.
pub fn range(start: char, end: char) -> Option<SetValue> {
    if start > end {
        return None;
    }
    Some(SetValue::from_atoms((start..=end).map(Atom::Char)))
}
