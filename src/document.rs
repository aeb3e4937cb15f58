use crate::*;

const LEGAL_LINE_DELIMITERS: [&str; 3] = ["\r\n", "\n", "\r"];

/// Offset and length of one line, delimiter excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("[{offset}, +{length}]")]
pub struct LineInfo {
    pub offset: usize,
    pub length: usize,
}

impl LineInfo {
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Editable text addressed by char offsets.
///
/// Every accessor fails with [`Error::BadLocation`] / [`Error::BadLine`]
/// instead of panicking when asked for something outside the text.
pub trait TextBuffer {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn char_at(&self, offset: usize) -> Result<char>;

    fn get(&self, offset: usize, length: usize) -> Result<String>;

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result;

    /// Number of lines; a text ending with a delimiter has a trailing empty line.
    fn line_count(&self) -> usize;

    /// Line containing `offset`; `offset == len()` belongs to the last line.
    fn line_of_offset(&self, offset: usize) -> Result<usize>;

    fn line_information(&self, line: usize) -> Result<LineInfo>;

    fn line_information_of_offset(&self, offset: usize) -> Result<LineInfo> {
        self.line_information(self.line_of_offset(offset)?)
    }

    /// Delimiter terminating `line`, `None` for the last line.
    fn line_delimiter(&self, line: usize) -> Result<Option<String>>;

    fn legal_line_delimiters(&self) -> &[&'static str] {
        &LEGAL_LINE_DELIMITERS
    }
}

/// A text buffer that can also classify its offsets.
pub trait SourceBuffer: TextBuffer + PartitionOracle {}

impl<T: TextBuffer + PartitionOracle + ?Sized> SourceBuffer for T {}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    info: LineInfo,
    delimiter: Option<&'static str>,
}

/// In-memory SQL document.
///
/// Lines and partitions are recomputed on every [`TextBuffer::replace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    chars: Vec<char>,
    lines: Vec<Line>,
    partitions: Partitions,
}

impl Document {
    pub fn new(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self {
            lines: split_lines(&chars),
            partitions: Partitions::scan(&chars),
            chars,
        }
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    fn reindex(&mut self) {
        self.lines = split_lines(&self.chars);
        self.partitions = Partitions::scan(&self.chars);
    }

    fn check_range(&self, offset: usize, length: usize) -> Result {
        match offset.checked_add(length) {
            Some(end) if end <= self.chars.len() => Ok(()),
            _ => Err(Error::bad_location(offset, length)),
        }
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.chars.iter().try_for_each(|ch| write!(f, "{ch}"))
    }
}

fn split_lines(chars: &[char]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < chars.len() {
        let delimiter = match (chars[i], chars.get(i + 1)) {
            ('\r', Some('\n')) => "\r\n",
            ('\r', _) => "\r",
            ('\n', _) => "\n",
            _ => {
                i += 1;
                continue;
            }
        };
        lines.push(Line {
            info: LineInfo {
                offset: start,
                length: i - start,
            },
            delimiter: Some(delimiter),
        });
        i += delimiter.len();
        start = i;
    }
    lines.push(Line {
        info: LineInfo {
            offset: start,
            length: chars.len() - start,
        },
        delimiter: None,
    });
    lines
}

impl TextBuffer for Document {
    fn len(&self) -> usize {
        self.chars.len()
    }

    fn char_at(&self, offset: usize) -> Result<char> {
        self.chars
            .get(offset)
            .copied()
            .ok_or_else(|| Error::bad_location(offset, 1))
    }

    fn get(&self, offset: usize, length: usize) -> Result<String> {
        self.check_range(offset, length)?;
        Ok(self.chars[offset..offset + length].iter().collect())
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result {
        self.check_range(offset, length)?;
        trace!("Replacing {length} chars at {offset} with {text:?}");
        self.chars.splice(offset..offset + length, text.chars());
        self.reindex();
        Ok(())
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_of_offset(&self, offset: usize) -> Result<usize> {
        if offset > self.chars.len() {
            return Err(Error::bad_location(offset, 0));
        }
        Ok(self
            .lines
            .partition_point(|line| line.info.offset <= offset)
            .saturating_sub(1))
    }

    fn line_information(&self, line: usize) -> Result<LineInfo> {
        self.lines
            .get(line)
            .map(|l| l.info)
            .ok_or(Error::BadLine(line))
    }

    fn line_delimiter(&self, line: usize) -> Result<Option<String>> {
        self.lines
            .get(line)
            .map(|l| l.delimiter.map(str::to_string))
            .ok_or(Error::BadLine(line))
    }
}

impl PartitionOracle for Document {
    fn partition_at(&self, offset: usize) -> Partition {
        self.partitions.at(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn lines_and_delimiters() {
        let doc = Document::new("a\r\nbc\rdef\n");
        assert_eq!(doc.line_count(), 4);
        assert_eq!(doc.line_information(0).ok(), Some(LineInfo { offset: 0, length: 1 }));
        assert_eq!(doc.line_information(1).ok(), Some(LineInfo { offset: 3, length: 2 }));
        assert_eq!(doc.line_information(2).ok(), Some(LineInfo { offset: 6, length: 3 }));
        assert_eq!(doc.line_information(3).ok(), Some(LineInfo { offset: 10, length: 0 }));
        assert_eq!(doc.line_delimiter(0).ok(), Some(Some("\r\n".to_string())));
        assert_eq!(doc.line_delimiter(1).ok(), Some(Some("\r".to_string())));
        assert_eq!(doc.line_delimiter(3).ok(), Some(None));
        assert!(matches!(doc.line_information(4), Err(Error::BadLine(4))));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(2, 0)]
    #[case(3, 1)]
    #[case(5, 1)]
    #[case(6, 2)]
    #[case(10, 3)]
    fn line_of_offset(#[case] offset: usize, #[case] expected: usize) {
        let doc = Document::new("a\r\nbc\rdef\n");
        assert_eq!(doc.line_of_offset(offset).ok(), Some(expected));
    }

    #[test]
    fn out_of_range_access_is_an_error() {
        let doc = Document::new("abc");
        assert!(matches!(doc.char_at(3), Err(Error::BadLocation { .. })));
        assert!(matches!(doc.get(2, 2), Err(Error::BadLocation { .. })));
        assert!(matches!(doc.line_of_offset(4), Err(Error::BadLocation { .. })));
        assert_eq!(doc.line_of_offset(3).ok(), Some(0));
    }

    #[test]
    fn replace_reindexes_lines_and_partitions() {
        let mut doc = Document::new("SELECT 1");
        assert_eq!(doc.line_count(), 1);
        doc.replace(8, 0, "\n/* c").expect("valid range");
        assert_eq!(doc.text(), "SELECT 1\n/* c");
        assert_eq!(doc.line_count(), 2);
        assert!(doc.partition_at(11).content_type.is_block_comment());
        assert!(doc.partition_at(13).open);

        doc.replace(0, 6, "select").expect("valid range");
        assert_eq!(doc.to_string(), "select 1\n/* c");
    }

    #[test]
    fn offsets_count_chars_not_bytes() {
        let doc = Document::new("ÄÖ\nü");
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.char_at(3).ok(), Some('ü'));
        assert_eq!(doc.line_information(1).ok(), Some(LineInfo { offset: 3, length: 1 }));
    }
}
