use crate::*;

/// An extra edit carried by a [`DocumentCommand`] next to its main insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

impl Replacement {
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// A pending edit the host is about to apply to its buffer.
///
/// Strategies rewrite the command in place; they never touch the buffer.
/// `caret_offset` is expressed in buffer coordinates after the main edit and
/// ignores the extra replacements, which [`DocumentCommand::apply`] accounts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCommand {
    pub offset: usize,
    pub length: usize,
    pub text: String,
    pub caret_offset: Option<usize>,
    /// Without an explicit caret, move the caret past the inserted text.
    pub shifts_caret: bool,
    pub should_apply: bool,
    replacements: Vec<Replacement>,
}

/// `offset + length`, or `BadLocation` when it overflows.
fn range_end(offset: usize, length: usize) -> Result<usize> {
    offset
        .checked_add(length)
        .ok_or_else(|| Error::bad_location(offset, length))
}

impl DocumentCommand {
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(offset, 0, text)
    }

    pub fn replace(offset: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            text: text.into(),
            caret_offset: None,
            shifts_caret: true,
            should_apply: true,
            replacements: Vec::new(),
        }
    }

    /// Queue an edit that must not overlap the main one.
    pub fn add_replacement(&mut self, offset: usize, length: usize, text: impl Into<String>) -> Result {
        let end = range_end(offset, length)?;
        let main_end = self.end()?;
        if offset < main_end && self.offset < end {
            return Err(Error::bad_location(offset, length));
        }
        self.replacements.push(Replacement {
            offset,
            length,
            text: text.into(),
        });
        Ok(())
    }

    /// End of the range the main edit replaces.
    pub fn end(&self) -> Result<usize> {
        range_end(self.offset, self.length)
    }

    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    /// Char length of the main text.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Caret after the main edit, ignoring extra replacements.
    pub fn caret(&self) -> usize {
        match self.caret_offset {
            Some(caret) => caret,
            None if self.shifts_caret => self.offset.saturating_add(self.text_len()),
            None => self.offset,
        }
    }

    /// Apply the main edit and every replacement, returning the final caret.
    ///
    /// Edits are applied back to front so earlier offsets stay valid.
    pub fn apply(&self, buffer: &mut dyn TextBuffer) -> Result<usize> {
        if !self.should_apply {
            return Ok(self.offset);
        }
        let len = buffer.len();
        let main_end = self.end()?;
        if main_end > len {
            return Err(Error::bad_location(self.offset, self.length));
        }
        if let Some(bad) = self.replacements.iter().find(|r| r.end() > len) {
            return Err(Error::bad_location(bad.offset, bad.length));
        }

        let mut caret = self.caret();
        let main_delta = self.text_len() as isize - self.length as isize;
        for replacement in &self.replacements {
            // Position of the replacement once the main edit is in place.
            let end = if replacement.offset >= main_end {
                replacement.end().saturating_add_signed(main_delta)
            } else {
                replacement.end()
            };
            if end <= caret {
                let delta = replacement.text.chars().count() as isize - replacement.length as isize;
                caret = caret.saturating_add_signed(delta);
            }
        }

        let mut edits: Vec<(usize, usize, usize, &str)> = self
            .replacements
            .iter()
            .map(|r| (r.offset, 1, r.length, r.text.as_str()))
            .collect();
        edits.push((self.offset, 0, self.length, self.text.as_str()));
        edits.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
        for (offset, _, length, text) in edits {
            buffer.replace(offset, length, text)?;
        }

        trace!("Applied command at {} with caret {caret}", self.offset);
        Ok(caret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_insert_shifts_caret() {
        let mut doc = Document::new("ab");
        let command = DocumentCommand::insert(1, "XYZ");
        assert_eq!(command.apply(&mut doc).ok(), Some(4));
        assert_eq!(doc.text(), "aXYZb");
    }

    #[test]
    fn explicit_caret_wins() {
        let mut doc = Document::new("ab");
        let mut command = DocumentCommand::insert(2, "\n    \nEND");
        command.caret_offset = Some(7);
        command.shifts_caret = false;
        assert_eq!(command.apply(&mut doc).ok(), Some(7));
        assert_eq!(doc.text(), "ab\n    \nEND");
    }

    #[test]
    fn replacements_before_the_caret_move_it() {
        let mut doc = Document::new("sel x");
        let mut command = DocumentCommand::insert(3, "\n");
        command
            .add_replacement(0, 3, "SELECT")
            .expect("does not overlap");
        assert_eq!(command.apply(&mut doc).ok(), Some(7));
        assert_eq!(doc.text(), "SELECT\n x");
    }

    #[test]
    fn replacements_after_the_main_edit() {
        let mut doc = Document::new("a end");
        let mut command = DocumentCommand::replace(0, 1, "xyz");
        command.add_replacement(2, 3, "END").expect("does not overlap");
        assert_eq!(command.apply(&mut doc).ok(), Some(3));
        assert_eq!(doc.text(), "xyz END");
    }

    #[test]
    fn overlapping_replacement_is_rejected() {
        let mut command = DocumentCommand::replace(2, 3, "x");
        assert!(command.add_replacement(4, 2, "y").is_err());
        assert!(command.add_replacement(0, 2, "y").is_ok());
        assert!(command.add_replacement(5, 1, "y").is_ok());
        assert_eq!(command.replacements().len(), 2);
    }

    #[test]
    fn out_of_range_command_fails_without_editing() {
        let mut doc = Document::new("abc");
        let command = DocumentCommand::replace(2, 5, "x");
        assert!(matches!(command.apply(&mut doc), Err(Error::BadLocation { .. })));
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn overflowing_ranges_are_bad_locations() {
        let mut doc = Document::new("abc");
        let command = DocumentCommand::replace(usize::MAX, 2, "x");
        assert!(matches!(command.end(), Err(Error::BadLocation { .. })));
        assert!(matches!(command.apply(&mut doc), Err(Error::BadLocation { .. })));

        let mut command = DocumentCommand::insert(1, "x");
        assert!(command.add_replacement(usize::MAX, 1, "y").is_err());
        assert!(command.replacements().is_empty());
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn disabled_command_is_skipped() {
        let mut doc = Document::new("abc");
        let mut command = DocumentCommand::insert(1, "x");
        command.should_apply = false;
        assert_eq!(command.apply(&mut doc).ok(), Some(1));
        assert_eq!(doc.text(), "abc");
    }
}
