//! Unwrapping of SQL pasted as a host-language string literal.
//!
//! Pastes such as
//!
//! ```text
//! "SELECT *\n" +
//!     "FROM t\n"
//! ```
//!
//! are turned back into the SQL they spell. Anything that does not look like
//! a quoted literal is left alone.

use crate::*;

/// Minimum whitespace between the outer quotes for a paste to count as SQL.
const MIN_WHITESPACE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentKind {
    Unknown,
    Block,
    EndOfLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Literal { escaped: bool },
    Comment { kind: CommentKind, previous: char },
}

/// The SQL spelled by a quoted host-language literal, or `None` when `source`
/// is not one.
///
/// Outside the literals, line breaks are kept (unless the SQL already ends
/// with one) and `//` or `/* */` comments are dropped along with everything
/// else. Inside, `\n`, `\r` and `\t` are translated and any other escaped char
/// is kept as is.
pub fn extract_sql(source: &str) -> Option<String> {
    let chars: Vec<char> = source.chars().collect();

    let mut quote_start = None;
    for (i, &ch) in chars.iter().enumerate() {
        if ch == '"' {
            quote_start = Some(i);
            break;
        }
        if is_identifier_part(ch) || matches!(ch, '{' | '<' | '[') {
            return None;
        }
    }
    let mut quote_end = None;
    for (i, &ch) in chars.iter().enumerate().rev() {
        if ch == '"' {
            quote_end = Some(i);
            break;
        }
        if is_identifier_part(ch) {
            return None;
        }
    }
    let (start, end) = (quote_start?, quote_end?);
    if end <= start {
        return None;
    }
    let whitespace = chars[start + 1..end]
        .iter()
        .filter(|ch| ch.is_whitespace())
        .count();
    if whitespace < MIN_WHITESPACE {
        return None;
    }

    let mut result = String::with_capacity(end - start);
    let mut state = State::Code;
    for &ch in &chars[start..end] {
        state = match state {
            State::Literal { escaped: true } => {
                match ch {
                    'n' if !ends_with_line_feed(&result, '\n') => result.push('\n'),
                    'r' if !ends_with_line_feed(&result, '\r') => result.push('\r'),
                    'n' | 'r' => {}
                    't' => result.push('\t'),
                    other => result.push(other),
                }
                State::Literal { escaped: false }
            }
            State::Literal { escaped: false } => match ch {
                '\\' => State::Literal { escaped: true },
                '"' => State::Code,
                other => {
                    result.push(other);
                    State::Literal { escaped: false }
                }
            },
            State::Comment { kind, previous } => match (kind, previous, ch) {
                (CommentKind::Unknown, _, '*') => State::Comment {
                    kind: CommentKind::Block,
                    previous: ch,
                },
                (CommentKind::Unknown, _, '/') => State::Comment {
                    kind: CommentKind::EndOfLine,
                    previous: ch,
                },
                // A lone '/' is not a comment.
                (CommentKind::Unknown, _, _) => code(&mut result, ch),
                (CommentKind::Block, '*', '/') | (CommentKind::EndOfLine, _, '\n') => State::Code,
                _ => State::Comment { kind, previous: ch },
            },
            State::Code => code(&mut result, ch),
        };
    }

    trace!("Extracted {} chars of SQL from a {} char paste", result.len(), chars.len());
    Some(result)
}

/// Step the machine for `ch` seen outside literals and comments.
fn code(result: &mut String, ch: char) -> State {
    match ch {
        '/' => State::Comment {
            kind: CommentKind::Unknown,
            previous: ch,
        },
        '"' => State::Literal { escaped: false },
        '\n' | '\r' => {
            if !result.is_empty()
                && !ends_with_line_feed(result, '\n')
                && !ends_with_line_feed(result, '\r')
            {
                result.push(ch);
            }
            State::Code
        }
        _ => State::Code,
    }
}

/// True if `text` ends with `line_feed`, ignoring trailing whitespace.
pub fn ends_with_line_feed(text: &str, line_feed: char) -> bool {
    text.chars()
        .rev()
        .take_while(|ch| ch.is_whitespace())
        .any(|ch| ch == line_feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn unwraps_concatenated_literal() {
        let source = "\"SELECT *\\n\" +\n  \"FROM t\\n\"";
        assert_eq!(extract_sql(source).as_deref(), Some("SELECT *\nFROM t\n"));
    }

    #[test]
    fn keeps_line_breaks_between_literals() {
        let source = "\"SELECT a, b\" +\n  \" FROM t\" +\n  \" WHERE a = 1\"";
        assert_eq!(
            extract_sql(source).as_deref(),
            Some("SELECT a, b\n FROM t\n WHERE a = 1")
        );
    }

    #[test]
    fn translates_escapes() {
        let source = "\"SELECT \\\"Name\\\"\\tFROM t\\r\\nWHERE x = 'a\\\\b'\"";
        assert_eq!(
            extract_sql(source).as_deref(),
            Some("SELECT \"Name\"\tFROM t\r\nWHERE x = 'a\\b'")
        );
    }

    #[test]
    fn escaped_backslash_does_not_escape_the_next_char() {
        let source = "\"SELECT 'a\\\\' AS b, 1 FROM dual\"";
        assert_eq!(extract_sql(source).as_deref(), Some("SELECT 'a\\' AS b, 1 FROM dual"));
    }

    #[test]
    fn drops_comments_between_literals() {
        let source = "\"SELECT 1 \" + // first\n  /* second */ \"FROM dual \"";
        assert_eq!(extract_sql(source).as_deref(), Some("SELECT 1 FROM dual "));
    }

    #[test]
    fn lone_slash_leaves_comment_mode() {
        let source = "\"SELECT 1 \" / \"+ 2 FROM dual\"";
        assert_eq!(extract_sql(source).as_deref(), Some("SELECT 1 + 2 FROM dual"));
    }

    #[rstest]
    #[case::clean_sql("SELECT * FROM t WHERE a = 1")]
    #[case::assignment("String sql = \"SELECT * FROM t\";")]
    #[case::bracket_first("[\"SELECT * FROM t\"]")]
    #[case::brace_first("{ \"SELECT * FROM t\" }")]
    #[case::trailing_identifier("\"SELECT * FROM t\" + x")]
    #[case::too_little_whitespace("\"SELECT*FROM t\"")]
    #[case::single_quote("  \"SELECT * FROM t")]
    #[case::no_quotes("   ")]
    fn rejects_non_literals(#[case] source: &str) {
        assert_eq!(extract_sql(source), None);
    }

    #[rstest]
    #[case("abc\n  ", '\n', true)]
    #[case("abc\n  x", '\n', false)]
    #[case("abc\r\n", '\r', true)]
    #[case("abc", '\n', false)]
    fn line_feed_detection(#[case] text: &str, #[case] line_feed: char, #[case] expected: bool) {
        assert_eq!(ends_with_line_feed(text, line_feed), expected);
    }
}
