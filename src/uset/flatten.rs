use std::iter::FusedIterator;

use log::{debug, trace};

use crate::uset::ast::{Atom, Sequence};
use crate::uset::error::{Result, UsetError};
use crate::uset::parser::parse;

/// Parses `expression` and returns the stream of every string it denotes.
///
/// Parse errors are returned immediately; errors met while enumerating end
/// the stream after the strings already produced.
pub fn flatten(expression: &str) -> Result<Flatten> {
    let seq = parse(expression)?;
    Ok(Flatten::new(&seq))
}

impl Sequence {
    pub fn strings(&self) -> Flatten {
        Flatten::new(self)
    }
}

/// Cartesian product of a sequence's positions, driven as a mixed-radix
/// counter whose least significant digit is the last position.
#[derive(Debug, Clone)]
pub struct Flatten {
    values: Vec<Vec<Atom>>,
    groups: Vec<(usize, usize)>,
    indices: Vec<usize>,
    total: Option<usize>,
    emitted: usize,
    has_backrefs: bool,
    pending: Option<UsetError>,
    done: bool,
}

impl Flatten {
    pub fn new(seq: &Sequence) -> Flatten {
        let values: Vec<Vec<Atom>> = seq
            .iter()
            .map(|v| v.members.iter().cloned().collect())
            .collect();
        let pending = seq
            .iter()
            .position(|v| v.negative)
            .map(|position| UsetError::Unbounded { position });
        let total = values
            .iter()
            .try_fold(1usize, |acc, v| acc.checked_mul(v.len()));
        let has_backrefs = values.iter().flatten().any(|a| a.group().is_some());

        debug!(
            "flattening {} positions into {} strings",
            values.len(),
            total.map_or_else(|| "too many".to_string(), |t| t.to_string())
        );

        Flatten {
            indices: vec![0; values.len()],
            done: pending.is_none() && total == Some(0),
            values,
            groups: seq.groups.clone(),
            total,
            emitted: 0,
            has_backrefs,
            pending,
        }
    }

    /// Number of strings the full product holds, `None` on overflow.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    fn fail(&mut self, err: UsetError) -> Option<Result<String>> {
        self.done = true;
        Some(Err(err))
    }

    // Text of group `group` from the outputs already chosen for this state.
    fn resolve(&self, group: usize, position: usize, outputs: &[String]) -> Result<String> {
        let (start, end) = group
            .checked_sub(1)
            .and_then(|g| self.groups.get(g))
            .copied()
            .ok_or(UsetError::UnresolvedReference { group })?;
        if end > position {
            return Err(UsetError::UnresolvedReference { group });
        }
        Ok(outputs[start..end].concat())
    }

    fn advance(&mut self) {
        for k in (0..self.indices.len()).rev() {
            self.indices[k] += 1;
            if self.indices[k] < self.values[k].len() {
                return;
            }
            self.indices[k] = 0;
        }
        // every digit wrapped
        self.done = true;
    }
}

impl Iterator for Flatten {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(err) = self.pending.take() {
            return self.fail(err);
        }

        // outputs are built left to right so a backreference sees the
        // choices already made for its group in this state
        let mut outputs: Vec<String> = Vec::with_capacity(self.indices.len());
        for position in 0..self.indices.len() {
            let digit = self.indices[position];
            let text = match self.values[position][digit] {
                Atom::BackRef(group) => match self.resolve(group, position, &outputs) {
                    Ok(text) => text,
                    Err(err) => return self.fail(err),
                },
                ref atom => atom.to_string(),
            };
            outputs.push(text);
        }

        let result = outputs.concat();
        trace!("state {:?} -> {result:?}", self.indices);
        self.emitted += 1;
        self.advance();
        Some(Ok(result))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        if self.pending.is_some() {
            return (1, Some(1));
        }
        match self.total {
            Some(total) => {
                let remaining = total - self.emitted;
                // an unresolved backreference can cut the stream short
                let lower = if self.has_backrefs { 1 } else { remaining };
                (lower, Some(remaining))
            }
            None if self.has_backrefs => (1, None),
            None => (usize::MAX, None),
        }
    }
}

impl FusedIterator for Flatten {}
