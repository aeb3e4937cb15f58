use derive_more::{Display, IsVariant};

/// Lexical content type of a buffer region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IsVariant)]
pub enum ContentType {
    #[display("code")]
    Code,
    #[display("line comment")]
    LineComment,
    #[display("block comment")]
    BlockComment,
    #[display("string")]
    QuotedString,
    #[display("quoted identifier")]
    QuotedIdentifier,
}

/// A maximal run of chars sharing one content type.
///
/// `open` is set for constructs that were not terminated before the end of
/// the text (`/* ...`, `'abc`), which then run to the end of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub content_type: ContentType,
    pub offset: usize,
    pub length: usize,
    pub open: bool,
}

impl Partition {
    pub const fn new(content_type: ContentType, offset: usize, length: usize) -> Self {
        Self {
            content_type,
            offset,
            length,
            open: false,
        }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.length
    }

    pub const fn contains(&self, offset: usize) -> bool {
        offset >= self.offset && offset < self.end()
    }
}

/// Classification oracle over buffer offsets.
pub trait PartitionOracle {
    fn partition_at(&self, offset: usize) -> Partition;

    fn content_type_at(&self, offset: usize) -> ContentType {
        self.partition_at(offset).content_type
    }
}

/// Partitioning of a whole text, as produced by [`Partitions::scan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitions {
    items: Vec<Partition>,
    len: usize,
}

impl Partitions {
    /// Lenient single pass partitioner.
    ///
    /// Behavior:
    /// - `--` comments run up to, but not including, the next line feed.
    /// - `/* */` comments include both markers; nesting is not tracked.
    /// - `'...'` strings and `"..."` identifiers treat a doubled quote as an
    ///   escaped one.
    /// - Anything unterminated runs to the end of the text and is marked open.
    /// - Code between those constructs is merged into single partitions.
    ///
    /// The partitions cover `[0, text.len())` without gaps; an empty text
    /// yields one empty code partition.
    pub fn scan(text: &[char]) -> Self {
        let len = text.len();
        let mut items = Vec::new();
        let mut code_start = 0;
        let mut i = 0;

        while i < len {
            let (content_type, end, open) = match (text[i], text.get(i + 1)) {
                ('-', Some('-')) => {
                    let end = (i + 2..len).find(|&j| text[j] == '\n');
                    (ContentType::LineComment, end.unwrap_or(len), end.is_none())
                }
                ('/', Some('*')) => {
                    let end = (i + 2..len.saturating_sub(1))
                        .find(|&j| text[j] == '*' && text[j + 1] == '/')
                        .map(|j| j + 2);
                    (ContentType::BlockComment, end.unwrap_or(len), end.is_none())
                }
                ('\'', _) => {
                    let (end, open) = quoted(text, i, '\'');
                    (ContentType::QuotedString, end, open)
                }
                ('"', _) => {
                    let (end, open) = quoted(text, i, '"');
                    (ContentType::QuotedIdentifier, end, open)
                }
                _ => {
                    i += 1;
                    continue;
                }
            };

            if code_start < i {
                items.push(Partition::new(ContentType::Code, code_start, i - code_start));
            }
            items.push(Partition {
                content_type,
                offset: i,
                length: end - i,
                open,
            });
            i = end;
            code_start = end;
        }

        if code_start < len || items.is_empty() {
            items.push(Partition::new(ContentType::Code, code_start, len - code_start));
        }

        Self { items, len }
    }

    /// Partition containing `offset`.
    ///
    /// At (or past) the end of the text this is the last partition when it is
    /// still open, otherwise an empty code partition sitting at the end.
    pub fn at(&self, offset: usize) -> Partition {
        if offset >= self.len {
            return match self.items.last() {
                Some(last) if last.open => *last,
                _ => Partition::new(ContentType::Code, self.len, 0),
            };
        }
        self.items
            .partition_point(|p| p.offset <= offset)
            .checked_sub(1)
            .and_then(|index| self.items.get(index).copied())
            .unwrap_or_else(|| Partition::new(ContentType::Code, offset, 0))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartitionOracle for Partitions {
    fn partition_at(&self, offset: usize) -> Partition {
        self.at(offset)
    }
}

/// End (exclusive) of the quoted run starting at `start`, and whether it is open.
fn quoted(text: &[char], start: usize, quote: char) -> (usize, bool) {
    let mut j = start + 1;
    while j < text.len() {
        if text[j] == quote {
            if text.get(j + 1) == Some(&quote) {
                j += 2;
                continue;
            }
            return (j + 1, false);
        }
        j += 1;
    }
    (text.len(), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scan(text: &str) -> Partitions {
        Partitions::scan(&text.chars().collect::<Vec<_>>())
    }

    fn kinds(text: &str) -> Vec<(ContentType, String)> {
        let chars: Vec<char> = text.chars().collect();
        scan(text)
            .iter()
            .map(|p| (p.content_type, chars[p.offset..p.end()].iter().collect()))
            .collect()
    }

    #[test]
    fn empty_text_is_one_code_partition() {
        let partitions = scan("");
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions.at(0), Partition::new(ContentType::Code, 0, 0));
    }

    #[test]
    fn splits_comments_and_literals() {
        assert_eq!(
            kinds("SELECT 'a''b', \"Col\" /* c */ FROM t -- tail\nWHERE"),
            vec![
                (ContentType::Code, "SELECT ".to_string()),
                (ContentType::QuotedString, "'a''b'".to_string()),
                (ContentType::Code, ", ".to_string()),
                (ContentType::QuotedIdentifier, "\"Col\"".to_string()),
                (ContentType::Code, " ".to_string()),
                (ContentType::BlockComment, "/* c */".to_string()),
                (ContentType::Code, " FROM t ".to_string()),
                (ContentType::LineComment, "-- tail".to_string()),
                (ContentType::Code, "\nWHERE".to_string()),
            ]
        );
    }

    #[rstest]
    #[case("/* never closed", ContentType::BlockComment)]
    #[case("SELECT 'abc", ContentType::QuotedString)]
    #[case("SELECT \"abc", ContentType::QuotedIdentifier)]
    #[case("SELECT 1 -- note", ContentType::LineComment)]
    fn unterminated_constructs_stay_open_at_end(#[case] text: &str, #[case] expected: ContentType) {
        let partitions = scan(text);
        let end = text.chars().count();
        let last = partitions.at(end);
        assert_eq!(last.content_type, expected);
        assert!(last.open);
        assert_eq!(last.end(), end);
    }

    #[test]
    fn closed_comment_at_end_is_followed_by_code() {
        let text = "SELECT 1 /* done */";
        let partitions = scan(text);
        let end = text.chars().count();
        assert_eq!(partitions.at(end - 1).content_type, ContentType::BlockComment);
        assert_eq!(partitions.at(end), Partition::new(ContentType::Code, end, 0));
    }

    #[test]
    fn lookup_by_offset() {
        let partitions = scan("a /* b */ c");
        assert!(partitions.at(0).content_type.is_code());
        assert!(partitions.at(2).content_type.is_block_comment());
        assert!(partitions.at(8).content_type.is_block_comment());
        assert!(partitions.at(9).content_type.is_code());
        assert_eq!(partitions.content_type_at(5), ContentType::BlockComment);
    }

    #[test]
    fn comment_markers_inside_strings_are_ignored() {
        assert_eq!(
            kinds("'--x' '/*'"),
            vec![
                (ContentType::QuotedString, "'--x'".to_string()),
                (ContentType::Code, " ".to_string()),
                (ContentType::QuotedString, "'/*'".to_string()),
            ]
        );
    }

    #[test]
    fn slash_star_slash_is_not_a_closed_comment() {
        let partitions = scan("/*/ x");
        let last = partitions.at(2);
        assert!(last.content_type.is_block_comment());
        assert!(last.open);
    }
}
