//! Interning of block keywords that are not part of the built-in token set.
//!
//! The table is an arena of canonical names indexed by [`TokenId`], plus a
//! lower-cased name index for case-insensitive lookup. Ids are handed out in
//! registration order and never reused, so a [`Token::Block`] stays valid for
//! the lifetime of the table.

use crate::sql::keyword::{KeywordClassifier, KeywordType};
use crate::sql::token::{Token, TokenId, is_identifier};
use crate::{Error, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    names: Vec<String>,
    index: HashMap<String, TokenId>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the token for `word`, allocating a new id on first sight.
    ///
    /// Built-in keywords resolve to their dedicated variants. Words that are
    /// not identifier-like are rejected.
    pub fn intern(&mut self, word: &str) -> Result<Token> {
        if !is_identifier(word) {
            return Err(Error::InvalidBlockToken(word.to_string()));
        }
        if let Some(token) = self.lookup(word) {
            return Ok(token);
        }
        let id = TokenId(
            u32::try_from(self.names.len())
                .map_err(|_| Error::Internal("token table is full".to_string()))?,
        );
        self.names.push(word.to_uppercase());
        self.index.insert(word.to_lowercase(), id);
        Ok(Token::Block(id))
    }

    /// Case-insensitive lookup of a built-in or registered block keyword.
    pub fn lookup(&self, word: &str) -> Option<Token> {
        Token::builtin(word).or_else(|| {
            self.index
                .get(&word.to_lowercase())
                .map(|id| Token::Block(*id))
        })
    }

    /// Canonical spelling of a block token.
    pub fn name(&self, token: Token) -> Option<&str> {
        match token {
            Token::Block(id) => self.names.get(id.index()).map(String::as_str),
            other => other.builtin_name(),
        }
    }

    /// Number of dynamically registered tokens.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Classify an identifier-like lexeme.
    pub fn classify(&self, lexeme: &str, keywords: &dyn KeywordClassifier) -> Token {
        if let Some(token) = self.lookup(lexeme) {
            return token;
        }
        match keywords.keyword_type(lexeme) {
            KeywordType::Keyword => Token::Keyword,
            KeywordType::Other => Token::Other,
        }
    }
}
