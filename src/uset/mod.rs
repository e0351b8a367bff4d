pub mod algebra;
pub mod ast;
pub mod error;
pub mod escape;
pub mod flatten;
pub mod matcher;
pub mod parser;

pub use algebra::{difference, intersect, union};
pub use ast::{Atom, SetValue, Sequence};
pub use error::{Result, UsetError};
pub use escape::{normalize, unescape};
pub use flatten::{flatten, Flatten};
pub use matcher::match_sequence;
pub use parser::{parse, parse_item};
