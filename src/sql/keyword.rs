//! Dialect keyword lookup used to classify lexemes and to re-case keywords.
//!
//! The engine only needs to know whether a word is a reserved keyword and how
//! the user prefers keywords to be spelled. [`KeywordClassifier`] is the seam
//! a host plugs its dialect into; [`AnsiDialect`] is the default, backed by the
//! keyword table of the `sqlparser` crate.

use sqlparser::keywords::ALL_KEYWORDS;

/// Result of a dialect keyword lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum KeywordType {
    #[display("keyword")]
    Keyword,
    #[display("other")]
    Other,
}

/// Preferred letter case for keywords.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, derive_more::Display, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum KeywordCase {
    #[default]
    #[display("upper")]
    Upper,
    #[display("lower")]
    Lower,
    /// First letter upper case, the rest lower case.
    #[display("mixed")]
    Mixed,
}

impl KeywordCase {
    pub fn transform(self, word: &str) -> String {
        match self {
            KeywordCase::Upper => word.to_uppercase(),
            KeywordCase::Lower => word.to_lowercase(),
            KeywordCase::Mixed => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                    None => String::new(),
                }
            }
        }
    }
}

/// Keyword knowledge the auto-edit engine needs from a SQL dialect.
pub trait KeywordClassifier {
    fn keyword_type(&self, lexeme: &str) -> KeywordType;

    /// The lexeme re-spelled in the preferred keyword case.
    fn preferred_case(&self, lexeme: &str) -> String;

    /// Indent delta (in units) for the line following `keyword`.
    fn next_line_indent(&self, _keyword: &str) -> i32 {
        0
    }

    /// Opening and closing quote strings of quoted identifiers.
    fn identifier_quotes(&self) -> &[(&str, &str)] {
        &[("\"", "\"")]
    }

    /// Chars that may prefix a client control command (e.g. `@set`).
    fn control_command_prefix(&self) -> &str {
        "@"
    }

    fn single_line_comments(&self) -> &[&str] {
        &["--"]
    }

    /// Called when the preferred keyword case changes.
    fn set_keyword_case(&mut self, _case: KeywordCase) {}

    /// True if the trimmed line is a comment line.
    fn is_comment_line(&self, line: &str) -> bool {
        let line = line.trim_start();
        line.starts_with("/*")
            || self
                .single_line_comments()
                .iter()
                .any(|prefix| line.starts_with(prefix))
    }
}

/// Generic SQL dialect using the `sqlparser` keyword list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnsiDialect {
    case: KeywordCase,
}

impl AnsiDialect {
    pub const fn new(case: KeywordCase) -> Self {
        Self { case }
    }

    pub const fn case(&self) -> KeywordCase {
        self.case
    }
}

impl KeywordClassifier for AnsiDialect {
    fn keyword_type(&self, lexeme: &str) -> KeywordType {
        // ALL_KEYWORDS is sorted, upper case.
        let upper = lexeme.to_ascii_uppercase();
        if ALL_KEYWORDS.binary_search(&upper.as_str()).is_ok() {
            KeywordType::Keyword
        } else {
            KeywordType::Other
        }
    }

    fn preferred_case(&self, lexeme: &str) -> String {
        self.case.transform(lexeme)
    }

    fn set_keyword_case(&mut self, case: KeywordCase) {
        self.case = case;
    }
}
