//! Position-addressable token reader over a [`SourceBuffer`].
//!
//! Every call is a pure function of `(buffer, position, bound)` returning a
//! [`Scan`]; the scanner keeps no cursor of its own, so one instance can serve
//! any number of lookups. Whitespace and everything outside code partitions
//! (comments, strings, quoted identifiers) is skipped. Identifier runs are one
//! token; any other char is a one char `Other` token.

use crate::*;

/// Limit of a scan. `Unbound` means the document start or end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bound {
    #[default]
    Unbound,
    Offset(usize),
}

impl Bound {
    /// Exclusive upper limit of a forward scan.
    fn upper(self, len: usize) -> usize {
        match self {
            Bound::Unbound => len,
            Bound::Offset(bound) => bound.min(len),
        }
    }

    /// Inclusive lower limit of a backward scan.
    fn lower(self) -> usize {
        match self {
            Bound::Unbound => 0,
            Bound::Offset(bound) => bound,
        }
    }
}

/// Tokens that open and close one kind of block.
///
/// An opener is cancelled when directly preceded by its cancel token
/// (`END LOOP` does not open a loop). A closer followed by a foreign close
/// end (`END IF` seen while matching `BEGIN`) belongs to another block kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peers {
    opens: Vec<(Token, Option<Token>)>,
    close: Token,
    close_end: Option<Token>,
    foreign_close_ends: Vec<Token>,
}

impl Peers {
    pub fn new(open: Token, close: Token) -> Self {
        Self {
            opens: vec![(open, None)],
            close,
            close_end: None,
            foreign_close_ends: Vec::new(),
        }
    }

    /// Set the cancel token of the first opener.
    pub fn with_open_cancel(mut self, cancel: Option<Token>) -> Self {
        if let Some(first) = self.opens.first_mut() {
            first.1 = cancel;
        }
        self
    }

    pub fn with_open(mut self, open: Token, cancel: Option<Token>) -> Self {
        if !self.opens.iter().any(|(token, _)| *token == open) {
            self.opens.push((open, cancel));
        }
        self
    }

    /// Require `end` right after the closer.
    pub fn with_close_end(mut self, end: Token) -> Self {
        self.close_end = Some(end);
        self
    }

    pub fn with_foreign_close_end(mut self, end: Token) -> Self {
        if !self.foreign_close_ends.contains(&end) {
            self.foreign_close_ends.push(end);
        }
        self
    }

    fn is_open_candidate(&self, token: Token) -> bool {
        self.opens.iter().any(|(open, _)| *open == token)
    }

    /// `token` opens a block given the token right before it.
    pub fn is_open(&self, token: Token, previous: Token) -> bool {
        self.opens
            .iter()
            .any(|(open, cancel)| *open == token && *cancel != Some(previous))
    }

    /// `token` closes a block given the token right after it.
    pub fn is_close(&self, token: Token, next: Token) -> bool {
        if token != self.close {
            return false;
        }
        match self.close_end {
            Some(end) => next == end,
            None => !self.foreign_close_ends.contains(&next),
        }
    }
}

pub struct HeuristicScanner<'a> {
    buffer: &'a dyn SourceBuffer,
    dialect: &'a dyn KeywordClassifier,
    completions: &'a BlockCompletions,
    delimiters: &'a [String],
}

impl<'a> HeuristicScanner<'a> {
    pub fn new(
        buffer: &'a dyn SourceBuffer,
        dialect: &'a dyn KeywordClassifier,
        completions: &'a BlockCompletions,
        delimiters: &'a [String],
    ) -> Self {
        Self {
            buffer,
            dialect,
            completions,
            delimiters,
        }
    }

    pub fn buffer(&self) -> &'a dyn SourceBuffer {
        self.buffer
    }

    pub fn completions(&self) -> &'a BlockCompletions {
        self.completions
    }

    /// True iff `offset` is in SQL code.
    pub fn is_default_partition(&self, offset: usize) -> bool {
        self.buffer.content_type_at(offset).is_code()
    }

    fn classify(&self, lexeme: &str) -> Token {
        self.completions.tokens().classify(lexeme, self.dialect)
    }

    fn is_identifier_at(&self, offset: usize) -> bool {
        self.buffer.char_at(offset).is_ok_and(is_identifier_part)
    }

    fn scan(&self, start: usize, end: usize) -> Scan {
        match self.buffer.get(start, end - start) {
            Ok(lexeme) => {
                let token = if end - start == 1 && !self.is_identifier_at(start) {
                    Token::Other
                } else {
                    self.classify(&lexeme)
                };
                Scan::new(token, lexeme, start, end)
            }
            Err(_) => Scan::eof(start),
        }
    }

    /// First token at or after `start`, ending before `bound`.
    pub fn next_token(&self, start: usize, bound: Bound) -> Scan {
        let upper = bound.upper(self.buffer.len());
        let mut pos = start;
        while pos < upper {
            let Ok(ch) = self.buffer.char_at(pos) else {
                break;
            };
            let partition = self.buffer.partition_at(pos);
            if !partition.content_type.is_code() {
                pos = partition.end().max(pos + 1);
                continue;
            }
            if ch.is_whitespace() {
                pos += 1;
                continue;
            }
            if is_identifier_part(ch) {
                let mut end = pos + 1;
                while end < upper && self.is_identifier_at(end) {
                    end += 1;
                }
                return self.scan(pos, end);
            }
            return self.scan(pos, pos + 1);
        }
        Scan::eof(pos.min(upper.max(start)))
    }

    /// Last token ending at or before `before`, starting at or after `bound`.
    pub fn previous_token(&self, before: usize, bound: Bound) -> Scan {
        let lower = bound.lower();
        let mut pos = before.min(self.buffer.len());
        while pos > lower {
            let at = pos - 1;
            let Ok(ch) = self.buffer.char_at(at) else {
                break;
            };
            let partition = self.buffer.partition_at(at);
            if !partition.content_type.is_code() {
                pos = partition.offset.clamp(lower, at);
                continue;
            }
            if ch.is_whitespace() {
                pos = at;
                continue;
            }
            if is_identifier_part(ch) {
                let mut start = at;
                while start > lower && self.is_identifier_at(start - 1) {
                    start -= 1;
                }
                return self.scan(start, pos);
            }
            return self.scan(at, pos);
        }
        Scan::eof(pos)
    }

    /// Offset of the next non-whitespace char in any partition.
    pub fn find_non_whitespace_forward(&self, start: usize, bound: Bound) -> Option<usize> {
        let upper = bound.upper(self.buffer.len());
        (start..upper).find(|&pos| {
            self.buffer
                .char_at(pos)
                .is_ok_and(|ch| !ch.is_whitespace())
        })
    }

    /// Search backward from `before` for the opener matching an unbalanced closer.
    pub fn find_opening_peer(&self, before: usize, peers: &Peers) -> Option<Scan> {
        let mut depth = 1usize;
        let mut pos = before;
        let mut next = self.next_token(before, Bound::Unbound).token;
        loop {
            let scan = self.previous_token(pos, Bound::Unbound);
            if scan.is_eof() {
                return None;
            }
            if peers.is_open_candidate(scan.token) {
                let previous = self.previous_token(scan.start, Bound::Unbound).token;
                if peers.is_open(scan.token, previous) {
                    depth -= 1;
                    if depth == 0 {
                        return Some(scan);
                    }
                }
            } else if peers.is_close(scan.token, next) {
                depth += 1;
            }
            pos = scan.start;
            next = scan.token;
        }
    }

    /// Search forward from `after` for the closer matching an unbalanced opener.
    /// The returned scan is the closer's first token (`END` of `END LOOP`).
    pub fn find_closing_peer(&self, after: usize, peers: &Peers) -> Option<Scan> {
        let mut depth = 1usize;
        let mut pos = after;
        let mut previous = self.previous_token(after, Bound::Unbound).token;
        loop {
            let scan = self.next_token(pos, Bound::Unbound);
            if scan.is_eof() {
                return None;
            }
            if scan.token == peers.close {
                let next = self.next_token(scan.end, Bound::Unbound).token;
                if peers.is_close(scan.token, next) {
                    depth -= 1;
                    if depth == 0 {
                        return Some(scan);
                    }
                }
            } else if peers.is_open(scan.token, previous) {
                depth += 1;
            }
            pos = scan.end;
            previous = scan.token;
        }
    }

    /// Net count of unmatched openers around `offset`: positive when a block
    /// is still open there, zero when balanced, negative when over-closed.
    ///
    /// `offset == 0` counts as over-closed and the document end as open.
    pub fn block_balance(&self, offset: usize, peers: &Peers) -> i32 {
        if offset < 1 {
            return -1;
        }
        if offset >= self.buffer.len() {
            return 1;
        }
        let mut before = offset;
        let mut after = offset;
        loop {
            let opener = self.find_opening_peer(before, peers);
            let closer = self.find_closing_peer(after, peers);
            match (opener, closer) {
                (None, None) => return 0,
                (None, Some(_)) => return -1,
                (Some(_), None) => return 1,
                (Some(opener), Some(closer)) => {
                    trace!(
                        "Matched {} at {} with {} at {}",
                        opener.lexeme, opener.start, closer.lexeme, closer.start
                    );
                    before = opener.start;
                    after = closer.end;
                }
            }
        }
    }

    /// Number of `token` occurrences in `[start, end)`.
    pub fn token_count(&self, start: usize, end: usize, token: Token) -> usize {
        let mut count = 0;
        let mut pos = start;
        while pos < end {
            let scan = self.next_token(pos, Bound::Offset(end));
            if scan.is_eof() {
                break;
            }
            if scan.token == token {
                count += 1;
            }
            pos = scan.end;
        }
        count
    }

    /// True iff the last token in `[from, to)` ends with a statement delimiter.
    pub fn ends_with_delimiter(&self, from: usize, to: usize) -> bool {
        let last = self.previous_token(to, Bound::Offset(from));
        if last.is_eof() {
            return false;
        }
        let Ok(text) = self.buffer.get(from, last.end - from) else {
            return false;
        };
        let text = text.to_lowercase();
        self.delimiters
            .iter()
            .filter(|delimiter| !delimiter.is_empty())
            .any(|delimiter| ends_with_word(&text, &delimiter.to_lowercase()))
    }
}

/// `text` ends with `suffix`, and a word-like suffix (`GO`) is not the tail
/// of a longer identifier.
fn ends_with_word(text: &str, suffix: &str) -> bool {
    let Some(head) = text.strip_suffix(suffix) else {
        return false;
    };
    let word_like = suffix.chars().next().is_some_and(is_identifier_part);
    !word_like || !head.chars().next_back().is_some_and(is_identifier_part)
}
