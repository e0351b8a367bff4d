use thiserror::Error;

pub type Result<T> = std::result::Result<T, UsetError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsetError {
    /// An opening delimiter with no partner, or a `)` with no open group.
    #[error("unmatched `{delimiter}` at position {position}")]
    Syntax { delimiter: char, position: usize },

    #[error("invalid escape `{text}` at position {position}")]
    Escape { text: String, position: usize },

    #[error("reversed range `{start}-{end}` at position {position}")]
    ReversedRange {
        start: char,
        end: char,
        position: usize,
    },

    #[error("backreference to undefined group {group}")]
    UnresolvedReference { group: usize },

    // a negated position stands for every code point except its members
    #[error("position {position} is negated and cannot be enumerated")]
    Unbounded { position: usize },
}
