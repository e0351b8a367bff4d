//! Parser, set algebra and flattener for UnicodeSet expressions such as
//! `[a-z]-[aeiou]`, `[{ch}c]` or `([ab])\1`.
//!
//! ```
//! let words: Vec<String> = usets::flatten("[ab][cd]")
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(words, ["ac", "ad", "bc", "bd"]);
//! ```

pub mod uset;

pub use uset::*;
