//! Lexical building blocks for the heuristic auto-edit engine.
//!
//! The engine never parses SQL. Everything it knows about the text comes from
//! the pieces in this module:
//!
//! Modules:
//! - `token`       : Closed token set (`BEGIN`, `END`, ...) plus the `Scan` span record.
//! - `token_table` : Arena of block keywords registered at runtime, interned to `TokenId`s.
//! - `keyword`     : Dialect keyword lookup (`KeywordClassifier`) and keyword casing.
//! - `partition`   : Lenient split of a buffer into code, comments and quoted runs.
//!
//! Design Principles:
//! 1. Accept incomplete / syntactically invalid SQL (robust for live editing).
//! 2. Compare keywords case-insensitively, but keep the lexeme as typed.
//! 3. Treat unterminated comments and strings as running to the end of the text.
//!
//! Public Re‑exports:
//! Everything is re-exported at the crate root, or pull the common items via
//! the `prelude` submodule.
//!
//! Example:
//! ```rust
//! use qindent::prelude::*;
//!
//! let chars: Vec<char> = "SELECT 1 /* note */".chars().collect();
//! let partitions = Partitions::scan(&chars);
//! assert_eq!(partitions.content_type_at(12), ContentType::BlockComment);
//! assert_eq!(Token::builtin("begin"), Some(Token::Begin));
//! ```

pub mod keyword;
pub mod partition;
pub mod token;
pub mod token_table;

pub use keyword::{AnsiDialect, KeywordCase, KeywordClassifier, KeywordType};
pub use partition::{ContentType, Partition, PartitionOracle, Partitions};
pub use token::{Scan, Token, TokenId, is_identifier, is_identifier_part};
pub use token_table::TokenTable;

/// Convenience prelude re‑exporting the most commonly used items.
///
/// Import with:
/// `use qindent::prelude::*;`
pub mod prelude {
    pub use super::{
        AnsiDialect, ContentType, KeywordCase, KeywordClassifier, Partition, PartitionOracle,
        Partitions, Scan, Token, TokenTable,
    };
}
