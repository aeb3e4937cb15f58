//! Token model for the heuristic scanner.
//!
//! A [`Token`] is a symbolic classification of one lexeme: the structural
//! block keywords get dedicated variants, registry-defined block keywords get
//! an interned [`TokenId`], and everything else collapses into `Keyword` or
//! `Other`. Comparing tokens is a plain integer comparison regardless of how
//! the keyword was spelled in the buffer.
//!
//! A [`Scan`] pairs a token with the raw lexeme and the char span it was read
//! from. Scans are returned by value from every scanner call; the scanner keeps
//! no "last token" state of its own.

/// Id of a block keyword registered at runtime in a
/// [`TokenTable`](crate::sql::token_table::TokenTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
#[display("#{_0}")]
pub struct TokenId(pub(crate) u32);

impl TokenId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Classification of a scanned lexeme.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, derive_more::IsVariant,
)]
pub enum Token {
    /// Nothing left before the scan bound.
    #[display("<eof>")]
    Eof,
    /// Punctuation, literals and identifiers that are not keywords.
    #[display("<other>")]
    Other,
    /// Any reserved word of the dialect without a structural meaning here.
    #[display("<keyword>")]
    Keyword,
    #[display("BEGIN")]
    Begin,
    #[display("END")]
    End,
    #[display("CASE")]
    Case,
    #[display("LOOP")]
    Loop,
    #[display("IF")]
    If,
    #[display("THEN")]
    Then,
    /// Block keyword registered at runtime.
    #[display("<block {_0}>")]
    Block(TokenId),
}

const BUILTINS: [(&str, Token); 6] = [
    ("BEGIN", Token::Begin),
    ("END", Token::End),
    ("CASE", Token::Case),
    ("LOOP", Token::Loop),
    ("IF", Token::If),
    ("THEN", Token::Then),
];

impl Token {
    /// Case-insensitive lookup of the structural keywords.
    pub fn builtin(word: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(word))
            .map(|(_, token)| *token)
    }

    /// Canonical upper-case spelling of a structural keyword.
    pub fn builtin_name(self) -> Option<&'static str> {
        BUILTINS
            .iter()
            .find(|(_, token)| *token == self)
            .map(|(name, _)| *name)
    }
}

/// True for chars that may appear inside an identifier or keyword.
pub fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// True if `word` is a non-empty run of identifier chars.
pub fn is_identifier(word: &str) -> bool {
    !word.is_empty() && word.chars().all(is_identifier_part)
}

/// A classified token together with its lexeme and `[start, end)` char span.
///
/// Invariants:
/// - `end >= start`
/// - an `Eof` scan is empty and sits at the bound the scan stopped at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub token: Token,
    pub lexeme: String,
    pub start: usize,
    pub end: usize,
}

impl Scan {
    pub fn new(token: Token, lexeme: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            token,
            lexeme: lexeme.into(),
            start,
            end,
        }
    }

    pub fn eof(at: usize) -> Self {
        Self::new(Token::Eof, String::new(), at, at)
    }

    pub fn is_eof(&self) -> bool {
        self.token.is_eof()
    }

    /// Char length of the scanned lexeme.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End is exclusive, so `offset == end` returns false.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    pub const fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}
