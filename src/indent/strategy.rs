use super::comment::customize_comment_command;
use super::indenter::opens_block;
use crate::*;
use std::cmp::Ordering;

/// What a customization did to the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, derive_more::Display, derive_more::IsVariant)]
pub enum EditAction {
    #[default]
    #[display("unchanged")]
    Unchanged,
    #[display("indented")]
    Indented,
    #[display("block completed")]
    BlockCompleted,
    #[display("source extracted")]
    SourceExtracted,
    #[display("comment continued")]
    CommentContinued,
    #[display("comment closed")]
    CommentClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    pub action: EditAction,
    /// An extra replacement re-cases the keyword before the cursor.
    pub keyword_recased: bool,
}

impl Outcome {
    pub fn is_changed(&self) -> bool {
        !self.action.is_unchanged() || self.keyword_recased
    }
}

impl From<EditAction> for Outcome {
    fn from(action: EditAction) -> Self {
        Self {
            action,
            keyword_recased: false,
        }
    }
}

/// Rewrites pending edits of a SQL buffer: indentation after a newline,
/// auto-closing of blocks, keyword re-casing, unwrapping of pasted source
/// literals and `/* */` comment continuation.
///
/// The strategy owns its block registry, which is rebuilt whenever the
/// preferences change, so one customization always sees one registry.
#[derive(Debug, Clone)]
pub struct AutoIndentStrategy<K = AnsiDialect, I = LineIndenter> {
    preferences: Preferences,
    completions: BlockCompletions,
    dialect: K,
    indenter: I,
}

impl Default for AutoIndentStrategy {
    fn default() -> Self {
        Self::with_preferences(preferences().clone())
    }
}

impl AutoIndentStrategy {
    pub fn with_preferences(preferences: Preferences) -> Self {
        let dialect = AnsiDialect::new(preferences.keyword_case);
        Self::with_parts(preferences, dialect, LineIndenter::default())
    }
}

impl<K: KeywordClassifier> AutoIndentStrategy<K> {
    /// Strategy for `dialect` with the process-wide preferences.
    pub fn new(dialect: K) -> Self {
        Self::with_parts(preferences().clone(), dialect, LineIndenter::default())
    }
}

impl<K: KeywordClassifier, I: Indenter> AutoIndentStrategy<K, I> {
    pub fn with_parts(preferences: Preferences, mut dialect: K, mut indenter: I) -> Self {
        dialect.set_keyword_case(preferences.keyword_case);
        indenter.set_indent_unit(&preferences.indent_unit());
        Self {
            completions: load_completions(&preferences),
            preferences,
            dialect,
            indenter,
        }
    }

    /// Replace the indenter, keeping the configured indent unit.
    pub fn with_indenter<J: Indenter>(self, mut indenter: J) -> AutoIndentStrategy<K, J> {
        indenter.set_indent_unit(&self.preferences.indent_unit());
        AutoIndentStrategy {
            preferences: self.preferences,
            completions: self.completions,
            dialect: self.dialect,
            indenter,
        }
    }

    /// Apply new preferences; the block registry is rebuilt from scratch.
    pub fn set_preferences(&mut self, preferences: Preferences) {
        self.dialect.set_keyword_case(preferences.keyword_case);
        self.indenter.set_indent_unit(&preferences.indent_unit());
        self.completions = load_completions(&preferences);
        self.preferences = preferences;
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn completions(&self) -> &BlockCompletions {
        &self.completions
    }

    /// Register extra blocks. They are dropped by the next `set_preferences`.
    pub fn completions_mut(&mut self) -> &mut BlockCompletions {
        &mut self.completions
    }

    pub fn dialect(&self) -> &K {
        &self.dialect
    }

    pub fn indenter(&self) -> &I {
        &self.indenter
    }

    /// Rewrite `command` before the host applies it to `document`.
    ///
    /// Never fails: on any buffer error the command is restored to what it
    /// was and the outcome is `Unchanged`.
    pub fn customize_document_command<D: SourceBuffer>(
        &self,
        document: &D,
        command: &mut DocumentCommand,
    ) -> Outcome {
        let original = command.clone();
        match self.customize(document, command) {
            Ok(outcome) => {
                if outcome.is_changed() {
                    debug!("Command at {}: {}", command.offset, outcome.action);
                }
                outcome
            }
            Err(e) => {
                error!("Auto edit at offset {} failed: {e}", original.offset);
                *command = original;
                Outcome::default()
            }
        }
    }

    fn customize(&self, document: &dyn SourceBuffer, command: &mut DocumentCommand) -> Result<Outcome> {
        if command.end()? > document.len() {
            return Err(Error::bad_location(command.offset, command.length));
        }

        let partition = document.partition_at(command.offset);
        if partition.content_type.is_block_comment() && command.offset > partition.offset {
            return customize_comment_command(document, partition, command, self.preferences.close_comments)
                .map(Outcome::from);
        }

        if command.text_len() > self.preferences.min_source_length {
            if self.preferences.extract_from_source {
                if let Some(sql) = extract_sql(&command.text) {
                    command.caret_offset = Some(command.offset + sql.chars().count());
                    command.shifts_caret = false;
                    command.text = sql;
                    return Ok(EditAction::SourceExtracted.into());
                }
            }
            return Ok(Outcome::default());
        }
        if command.length != 0 {
            return Ok(Outcome::default());
        }

        let scanner = HeuristicScanner::new(
            document,
            &self.dialect,
            &self.completions,
            &self.preferences.statement_delimiters,
        );
        let newline = is_line_delimiter(document, &command.text);
        let in_quotes = (partition.content_type.is_quoted_string()
            || partition.content_type.is_quoted_identifier())
            && command.offset > partition.offset;

        let recased = if in_quotes {
            None
        } else {
            self.update_keyword_case(&scanner, command, newline)
                .unwrap_or_else(|e| {
                    debug!("Keyword case not updated: {e}");
                    None
                })
        };
        let mut outcome = Outcome {
            action: EditAction::Unchanged,
            keyword_recased: recased.is_some(),
        };
        if newline {
            outcome.action = self.smart_indent_after_newline(&scanner, command, recased.as_deref())?;
        }
        Ok(outcome)
    }

    /// Re-case the word before the cursor when a word boundary is typed after
    /// a keyword. Returns the new spelling.
    fn update_keyword_case(
        &self,
        scanner: &HeuristicScanner<'_>,
        command: &mut DocumentCommand,
        newline: bool,
    ) -> Result<Option<String>> {
        if !self.preferences.keyword_case_auto || command.offset < 2 {
            return Ok(None);
        }
        let mut typed = command.text.chars();
        let boundary = matches!((typed.next(), typed.next()), (Some(ch), None) if !is_identifier_part(ch));
        if !(newline || boundary) || self.is_identifier_quote(&command.text) {
            return Ok(None);
        }

        let document = scanner.buffer();
        let end = command.offset;
        if !is_identifier_part(document.char_at(end - 1)?) || !scanner.is_default_partition(end - 1) {
            return Ok(None);
        }
        let line = document.line_information_of_offset(end)?;
        if self.dialect.is_comment_line(&document.get(line.offset, line.length)?) {
            return Ok(None);
        }

        let prefix = self.dialect.control_command_prefix();
        let mut start = end - 1;
        while start > line.offset {
            let ch = document.char_at(start - 1)?;
            if !is_identifier_part(ch) && !prefix.contains(ch) {
                break;
            }
            start -= 1;
        }

        let word = document.get(start, end - start)?;
        if self.dialect.keyword_type(&word) != KeywordType::Keyword {
            return Ok(None);
        }
        let fixed = self.dialect.preferred_case(&word);
        if fixed == word {
            return Ok(None);
        }
        command.add_replacement(start, end - start, fixed.clone())?;
        trace!("Re-cased {word:?} to {fixed:?}");
        Ok(Some(fixed))
    }

    fn is_identifier_quote(&self, text: &str) -> bool {
        text == "'"
            || self
                .dialect
                .identifier_quotes()
                .iter()
                .any(|(open, close)| text == *open || text == *close)
    }

    fn smart_indent_after_newline(
        &self,
        scanner: &HeuristicScanner<'_>,
        command: &mut DocumentCommand,
        recased: Option<&str>,
    ) -> Result<EditAction> {
        let document = scanner.buffer();
        if document.is_empty() {
            return Ok(EditAction::Unchanged);
        }
        let offset = command.offset;
        let line = document.line_information_of_offset(offset)?;
        let content_start = find_end_of_whitespace(document, offset, line.end())?;
        let covered = content_start - offset;

        let previous = scanner.previous_token(offset, Bound::Unbound);
        let next = scanner.next_token(offset, Bound::Offset(line.end()));

        if let Some(indent) = self.closer_alignment(scanner, &next)? {
            trace!("Aligning {} with its opener", next.lexeme);
            return Ok(indent_command(command, &indent, covered));
        }

        if let Some(info) = self.completion_candidate(scanner, &previous) {
            let peers = self.completions.peers(info);
            let start = statement_line_start(document, line.offset)?;
            if content_start == line.end()
                && scanner.block_balance(offset, &peers) > 0
                && scanner.token_count(start, offset, info.head()) > 0
            {
                let reference = self.indenter.reference_indentation(scanner, offset)?;
                let trigger = recased.unwrap_or(&previous.lexeme);
                let (text, caret) = self.render_completion(info, &command.text, &reference, trigger);
                debug!("Closing {} with {}", previous.lexeme, self.completions.describe(info));
                command.text = text;
                command.length = covered;
                command.caret_offset = Some(offset + caret);
                command.shifts_caret = false;
                return Ok(EditAction::BlockCompleted);
            }
        }

        let indent = match self.keyword_indentation(scanner, &previous, line.offset, offset)? {
            Some(indent) => indent,
            None => self.indenter.compute_indentation(scanner, offset)?,
        };
        if indent.is_empty() && covered == 0 {
            return Ok(EditAction::Unchanged);
        }
        Ok(indent_command(command, &indent, covered))
    }

    /// Indentation of the opener when the cursor sits right before its closer.
    fn closer_alignment(&self, scanner: &HeuristicScanner<'_>, next: &Scan) -> Result<Option<String>> {
        if next.is_eof() || !self.completions.is_tail(next.token) {
            return Ok(None);
        }
        let following = scanner.next_token(next.end, Bound::Unbound).token;
        for info in self.completions.find_by_tail(next.token) {
            let peers = self.completions.peers(info);
            if !peers.is_close(next.token, following) {
                continue;
            }
            if let Some(opener) = scanner.find_opening_peer(next.start, &peers) {
                return self.indenter.line_indentation(scanner.buffer(), opener.start).map(Some);
            }
        }
        Ok(None)
    }

    /// The block `previous` opens, if it may be auto-closed.
    fn completion_candidate(&self, scanner: &HeuristicScanner<'_>, previous: &Scan) -> Option<&BlockCompletionInfo> {
        if !self.preferences.close_blocks {
            return None;
        }
        let info = self.completions.find_by_head(previous.token)?;
        if let Some(cancel) = info.head_cancel() {
            if scanner.previous_token(previous.start, Bound::Unbound).token == cancel {
                return None;
            }
        }
        Some(info)
    }

    /// Completion text and the caret position inside it.
    fn render_completion(
        &self,
        info: &BlockCompletionInfo,
        delimiter: &str,
        reference: &str,
        trigger: &str,
    ) -> (String, usize) {
        let lower = !trigger.chars().any(char::is_uppercase);
        let unit = self.preferences.indent_unit();
        let mut text = String::new();
        let mut body = None;
        for part in info.parts() {
            match part {
                CompletionPart::NewLine => {
                    text.push_str(delimiter);
                    text.push_str(reference);
                }
                CompletionPart::Indent => {
                    text.push_str(&unit);
                    if body.is_none() {
                        body = Some(text.chars().count());
                    }
                }
                CompletionPart::Literal(literal) if lower => text.push_str(&literal.to_lowercase()),
                CompletionPart::Literal(literal) => text.push_str(&literal.to_uppercase()),
            }
        }
        let caret = if info.starts_with_literal() {
            0
        } else {
            body.unwrap_or_else(|| text.chars().count())
        };
        (text, caret)
    }

    /// Keyword driven indentation; `None` when the policy is off or does not apply.
    fn keyword_indentation(
        &self,
        scanner: &HeuristicScanner<'_>,
        previous: &Scan,
        line_start: usize,
        offset: usize,
    ) -> Result<Option<String>> {
        if !self.preferences.keyword_indent || opens_block(scanner, previous) {
            return Ok(None);
        }
        let unit = self.preferences.indent_unit();
        if previous.token == Token::Keyword {
            let reference = self.indenter.reference_indentation(scanner, offset)?;
            let delta = self.dialect.next_line_indent(&previous.lexeme);
            let levels = delta.unsigned_abs() as usize;
            return Ok(Some(match delta.cmp(&0) {
                Ordering::Greater => reference + &create_indent(levels, &unit),
                Ordering::Less => unindent(&reference, levels, &unit),
                Ordering::Equal => reference,
            }));
        }
        if previous.token == Token::Other {
            // Identifiers ending a line are usually followed by a keyword line.
            let continues = previous.lexeme.ends_with([',', ':', '-']);
            if !continues && !scanner.ends_with_delimiter(line_start, offset) {
                let reference = self.indenter.reference_indentation(scanner, offset)?;
                return Ok(Some(unindent(&reference, 1, &unit)));
            }
        }
        Ok(None)
    }
}

fn load_completions(preferences: &Preferences) -> BlockCompletions {
    BlockCompletions::from_preferences(preferences).unwrap_or_else(|e| {
        warn!("Ignoring configured block pairs: {e}");
        BlockCompletions::builtin()
    })
}

fn is_line_delimiter(document: &dyn SourceBuffer, text: &str) -> bool {
    document.legal_line_delimiters().contains(&text)
}

/// Start of the cursor line, or of the line a block comment covering it
/// starts on.
fn statement_line_start(document: &dyn SourceBuffer, line_start: usize) -> Result<usize> {
    let partition = document.partition_at(line_start);
    if partition.content_type.is_block_comment() && line_start > partition.offset {
        return Ok(document.line_information_of_offset(partition.offset)?.offset);
    }
    Ok(line_start)
}

fn indent_command(command: &mut DocumentCommand, indent: &str, covered: usize) -> EditAction {
    command.text.push_str(indent);
    command.length = covered;
    command.caret_offset = Some(command.offset + command.text_len());
    command.shifts_caret = false;
    EditAction::Indented
}
