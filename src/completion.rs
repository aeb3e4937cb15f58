//! Registry of auto-closable blocks.
//!
//! Each [`BlockCompletionInfo`] ties a head keyword (`BEGIN`) to the tokens
//! that close it (`END`, or `END LOOP` as tail + tail end) and to the template
//! rendered when the block is auto-closed. The registry owns the
//! [`TokenTable`] so block keywords outside the built-in set get stable ids.

use crate::*;
use itertools::Itertools;
use std::collections::HashMap;

/// One element of a completion template.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum CompletionPart {
    /// Inserted verbatim, re-cased to match the triggering keyword.
    #[display("{_0:?}")]
    Literal(String),
    /// One indentation unit.
    #[display("<indent>")]
    Indent,
    /// Line delimiter followed by the reference indentation.
    #[display("<newline>")]
    NewLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCompletionInfo {
    head: Token,
    parts: Vec<CompletionPart>,
    tail: Token,
    tail_end: Option<Token>,
    head_cancel: Option<Token>,
}

impl BlockCompletionInfo {
    /// A `tail_end` equal to `head` makes `tail` the head-cancel token, so the
    /// closing clause (`END LOOP`) is never read as a fresh head.
    pub fn new(
        head: Token,
        parts: Vec<CompletionPart>,
        tail: Token,
        tail_end: Option<Token>,
    ) -> Self {
        let head_cancel = (tail_end == Some(head)).then_some(tail);
        Self {
            head,
            parts,
            tail,
            tail_end,
            head_cancel,
        }
    }

    pub fn head(&self) -> Token {
        self.head
    }

    pub fn parts(&self) -> &[CompletionPart] {
        &self.parts
    }

    pub fn tail(&self) -> Token {
        self.tail
    }

    pub fn tail_end(&self) -> Option<Token> {
        self.tail_end
    }

    pub fn head_cancel(&self) -> Option<Token> {
        self.head_cancel
    }

    /// The template continues the head clause on the current line.
    pub fn starts_with_literal(&self) -> bool {
        self.parts.first().is_some_and(CompletionPart::is_literal)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockCompletions {
    tokens: TokenTable,
    entries: Vec<BlockCompletionInfo>,
    by_head: HashMap<Token, usize>,
}

impl BlockCompletions {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// `BEGIN…END`, `CASE…END`, `LOOP…END LOOP` and `IF… THEN…END IF`.
    pub fn builtin() -> Self {
        use CompletionPart::*;
        let mut completions = Self::new();
        for head in [Token::Begin, Token::Case] {
            completions.insert(BlockCompletionInfo::new(
                head,
                vec![NewLine, Indent, NewLine, Literal("END".to_string())],
                Token::End,
                None,
            ));
        }
        completions.insert(BlockCompletionInfo::new(
            Token::Loop,
            vec![NewLine, Indent, NewLine, Literal("END LOOP".to_string())],
            Token::End,
            Some(Token::Loop),
        ));
        completions.insert(BlockCompletionInfo::new(
            Token::If,
            vec![
                Literal(" THEN".to_string()),
                NewLine,
                Indent,
                NewLine,
                Literal("END IF".to_string()),
            ],
            Token::End,
            Some(Token::If),
        ));
        completions
    }

    /// Built-in blocks plus the extra `block_pairs` of the preferences.
    pub fn from_preferences(preferences: &Preferences) -> Result<Self> {
        let mut completions = Self::builtin();
        for pair in &preferences.block_pairs {
            let words: Vec<&str> = pair.split_whitespace().collect();
            match words.as_slice() {
                [head, tail] => completions.register_pair(head, tail)?,
                [head, tail, tail_end] => completions.register_pair_with_end(head, tail, tail_end)?,
                _ => return Err(Error::InvalidBlockToken(pair.clone())),
            }
        }
        debug!("Block completions: {}", completions.iter().map(|info| completions.describe(info)).join("; "));
        Ok(completions)
    }

    /// Register a block by keyword spelling. A later registration for the
    /// same head replaces the earlier one.
    pub fn register(
        &mut self,
        head: &str,
        parts: Vec<CompletionPart>,
        tail: &str,
        tail_end: Option<&str>,
    ) -> Result {
        let head = self.tokens.intern(head)?;
        let tail = self.tokens.intern(tail)?;
        let tail_end = tail_end.map(|word| self.tokens.intern(word)).transpose()?;
        self.insert(BlockCompletionInfo::new(head, parts, tail, tail_end));
        Ok(())
    }

    /// `head` closed by `tail`, body on its own indented line.
    pub fn register_pair(&mut self, head: &str, tail: &str) -> Result {
        use CompletionPart::*;
        let parts = vec![NewLine, Indent, NewLine, Literal(tail.to_uppercase())];
        self.register(head, parts, tail, None)
    }

    /// `head` closed by the two words `tail tail_end`.
    pub fn register_pair_with_end(&mut self, head: &str, tail: &str, tail_end: &str) -> Result {
        use CompletionPart::*;
        let closing = format!("{} {}", tail.to_uppercase(), tail_end.to_uppercase());
        let parts = vec![NewLine, Indent, NewLine, Literal(closing)];
        self.register(head, parts, tail, Some(tail_end))
    }

    fn insert(&mut self, info: BlockCompletionInfo) {
        match self.by_head.get(&info.head) {
            Some(&index) => self.entries[index] = info,
            None => {
                self.by_head.insert(info.head, self.entries.len());
                self.entries.push(info);
            }
        }
    }

    pub fn find_by_head(&self, head: Token) -> Option<&BlockCompletionInfo> {
        self.by_head.get(&head).and_then(|&index| self.entries.get(index))
    }

    pub fn find_by_tail(&self, tail: Token) -> impl Iterator<Item = &BlockCompletionInfo> {
        self.entries.iter().filter(move |info| info.tail == tail)
    }

    pub fn is_tail(&self, token: Token) -> bool {
        self.find_by_tail(token).next().is_some()
    }

    /// Peer description used to match `info`'s blocks.
    ///
    /// Blocks sharing both tail and tail end are interchangeable openers
    /// (`BEGIN` and `CASE` both close with `END`). Tail ends of blocks that
    /// share only the tail (`END LOOP` for `BEGIN`) disqualify a closer.
    pub fn peers(&self, info: &BlockCompletionInfo) -> Peers {
        let mut peers = Peers::new(info.head, info.tail).with_open_cancel(info.head_cancel);
        if let Some(tail_end) = info.tail_end {
            peers = peers.with_close_end(tail_end);
        }
        for other in self.find_by_tail(info.tail).filter(|other| other.head != info.head) {
            if other.tail_end == info.tail_end {
                peers = peers.with_open(other.head, other.head_cancel);
            } else if let Some(foreign) = other.tail_end {
                peers = peers.with_foreign_close_end(foreign);
            }
        }
        peers
    }

    pub fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockCompletionInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every block; interned token ids stay valid.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_head.clear();
    }

    /// Human readable form, e.g. `LOOP -> END LOOP: <newline> <indent> ...`.
    pub fn describe(&self, info: &BlockCompletionInfo) -> String {
        let name = |token: Token| self.tokens.name(token).unwrap_or("?").to_string();
        let closing = match info.tail_end {
            Some(end) => format!("{} {}", name(info.tail), name(end)),
            None => name(info.tail),
        };
        format!("{} -> {closing}: {}", name(info.head), info.parts.iter().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn builtin_blocks() {
        let completions = BlockCompletions::builtin();
        assert_eq!(completions.len(), 4);

        let begin = completions.find_by_head(Token::Begin).expect("BEGIN is registered");
        assert_eq!(begin.tail(), Token::End);
        assert_eq!(begin.tail_end(), None);
        assert_eq!(begin.head_cancel(), None);
        assert!(!begin.starts_with_literal());

        let if_block = completions.find_by_head(Token::If).expect("IF is registered");
        assert!(if_block.starts_with_literal());
        assert_eq!(completions.find_by_tail(Token::End).count(), 4);
        assert!(completions.is_tail(Token::End));
        assert!(!completions.is_tail(Token::Then));
    }

    #[rstest]
    #[case(Token::Loop)]
    #[case(Token::If)]
    fn self_closing_tail_end_sets_head_cancel(#[case] head: Token) {
        let completions = BlockCompletions::builtin();
        let info = completions.find_by_head(head).expect("registered");
        assert_eq!(info.tail_end(), Some(head));
        assert_eq!(info.head_cancel(), Some(Token::End));
    }

    #[test]
    fn dynamic_registration() {
        let mut completions = BlockCompletions::builtin();
        completions
            .register_pair_with_end("while", "end", "while")
            .expect("identifier tokens");
        let while_token = completions.tokens().lookup("WHILE").expect("interned");
        let info = completions.find_by_head(while_token).expect("registered");
        assert_eq!(info.head_cancel(), Some(Token::End));
        assert_eq!(
            info.parts().last(),
            Some(&CompletionPart::Literal("END WHILE".to_string()))
        );
        assert_eq!(completions.describe(info), "WHILE -> END WHILE: <newline> <indent> <newline> \"END WHILE\"");
    }

    #[test]
    fn registering_same_head_replaces() {
        let mut completions = BlockCompletions::builtin();
        completions.register_pair("begin", "end").expect("valid");
        assert_eq!(completions.len(), 4);
    }

    #[test]
    fn rejects_non_identifier_tokens() {
        let mut completions = BlockCompletions::new();
        assert!(matches!(
            completions.register_pair("BEGIN;", "END"),
            Err(Error::InvalidBlockToken(_))
        ));
        assert!(completions.is_empty());
    }

    #[test]
    fn peers_group_openers_sharing_a_closer() {
        let completions = BlockCompletions::builtin();
        let begin = completions.find_by_head(Token::Begin).expect("registered");
        let peers = completions.peers(begin);
        assert!(peers.is_open(Token::Begin, Token::Other));
        assert!(peers.is_open(Token::Case, Token::Other));
        assert!(!peers.is_open(Token::Loop, Token::Other));
        assert!(peers.is_close(Token::End, Token::Other));
        assert!(!peers.is_close(Token::End, Token::Loop));
        assert!(!peers.is_close(Token::End, Token::If));

        let looping = completions.find_by_head(Token::Loop).expect("registered");
        let peers = completions.peers(looping);
        assert!(peers.is_open(Token::Loop, Token::Other));
        assert!(!peers.is_open(Token::Loop, Token::End));
        assert!(peers.is_close(Token::End, Token::Loop));
        assert!(!peers.is_close(Token::End, Token::Other));
    }

    #[test]
    fn from_preferences_adds_block_pairs() {
        let preferences = Preferences {
            block_pairs: vec!["REPEAT UNTIL".to_string()],
            ..Preferences::default()
        };
        let completions = BlockCompletions::from_preferences(&preferences).expect("valid pairs");
        assert_eq!(completions.len(), 5);
        let repeat = completions.tokens().lookup("repeat").expect("interned");
        assert!(completions.find_by_head(repeat).is_some());

        let broken = Preferences {
            block_pairs: vec!["ONLYHEAD".to_string()],
            ..Preferences::default()
        };
        assert!(BlockCompletions::from_preferences(&broken).is_err());
    }

    #[test]
    fn clear_keeps_token_ids() {
        let mut completions = BlockCompletions::builtin();
        completions.register_pair("repeat", "until").expect("valid");
        let repeat = completions.tokens().lookup("repeat");
        completions.clear();
        assert!(completions.is_empty());
        assert_eq!(completions.tokens().lookup("REPEAT"), repeat);
    }
}
