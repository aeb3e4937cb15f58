use crate::*;

/// Edits typed inside a `/* */` comment: continue the ` * ` prefix on a new
/// line, and turn `* ` + `/` into `*/`.
pub(crate) fn customize_comment_command(
    document: &dyn SourceBuffer,
    partition: Partition,
    command: &mut DocumentCommand,
    close_comments: bool,
) -> Result<EditAction> {
    if command.length == 0
        && document
            .legal_line_delimiters()
            .contains(&command.text.as_str())
    {
        return comment_indent_after_newline(document, partition, command, close_comments);
    }
    if command.text == "/" {
        return comment_end(document, command);
    }
    Ok(EditAction::Unchanged)
}

fn comment_indent_after_newline(
    document: &dyn SourceBuffer,
    partition: Partition,
    command: &mut DocumentCommand,
    close_comments: bool,
) -> Result<EditAction> {
    if document.is_empty() {
        return Ok(EditAction::Unchanged);
    }
    let offset = command.offset;
    let line_number = document.line_of_offset(offset)?;
    let line = document.line_information(line_number)?;
    let content_start = find_end_of_whitespace(document, line.offset, offset)?;
    let prefix = comment_line_prefix(document, line)?;

    let delimiter = command.text.clone();
    let mut text = format!("{delimiter}{prefix}");
    let mut closing = String::new();
    if content_start < offset
        && document.char_at(content_start)? == '/'
        && document.char_at(content_start + 1).ok() != Some('/')
    {
        // The comment starts on this line.
        text.push_str(" * ");
        if close_comments && is_new_comment(document, partition, line_number)? {
            closing = format!("{delimiter}{prefix} */");
        }
    }

    command.caret_offset = Some(offset + text.chars().count());
    command.shifts_caret = false;
    command.text = text + &closing;
    debug!("Continued comment at {offset} (closed: {})", !closing.is_empty());
    Ok(EditAction::CommentContinued)
}

/// Typing `/` right after `* ` replaces the space, closing the comment as `*/`.
fn comment_end(document: &dyn SourceBuffer, command: &mut DocumentCommand) -> Result<EditAction> {
    if command.offset < 2 || document.is_empty() {
        return Ok(EditAction::Unchanged);
    }
    if document.get(command.offset - 2, 2)? != "* " {
        return Ok(EditAction::Unchanged);
    }
    command.offset -= 1;
    command.length += 1;
    Ok(EditAction::CommentClosed)
}

/// Leading whitespace of `line`, plus a `*` and one space when present.
fn comment_line_prefix(document: &dyn SourceBuffer, line: LineInfo) -> Result<String> {
    let mut end = find_end_of_whitespace(document, line.offset, line.end())?;
    if end < line.end() && document.char_at(end)? == '*' {
        end += 1;
        if end < line.end() && document.char_at(end)? == ' ' {
            end += 1;
        }
    }
    document.get(line.offset, end - line.offset)
}

/// Guess whether the comment was just opened. In doubt it is new.
fn is_new_comment(document: &dyn SourceBuffer, partition: Partition, line: usize) -> Result<bool> {
    let next_line = line + 1;
    if next_line >= document.line_count() {
        return Ok(true);
    }
    if document.line_information(next_line)?.offset >= partition.end() {
        return Ok(false);
    }
    if partition.open || partition.end() == document.len() {
        return Ok(true);
    }
    let comment: String = document.get(partition.offset, partition.length)?;
    Ok(comment.chars().skip(2).collect::<String>().contains("/*"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn run(marked: &str, typed: &str, close_comments: bool) -> (String, EditAction) {
        let offset = marked.find('|').expect("cursor marker");
        let text = marked.replacen('|', "", 1);
        let offset = text[..offset].chars().count();
        let mut doc = Document::new(&text);
        let mut command = DocumentCommand::insert(offset, typed);
        let partition = doc.partition_at(offset);
        let action = customize_comment_command(&doc, partition, &mut command, close_comments)
            .expect("comment edit");
        let caret = command.apply(&mut doc).expect("command applies");
        let mut out: Vec<char> = doc.text().chars().collect();
        out.insert(caret, '|');
        (out.into_iter().collect(), action)
    }

    #[test]
    fn new_comment_is_continued_and_closed() {
        let (text, action) = run("  /* note|", "\n", true);
        assert_eq!(text, "  /* note\n   * |\n   */");
        assert_eq!(action, EditAction::CommentContinued);
    }

    #[test]
    fn closing_can_be_disabled() {
        let (text, _) = run("/* note|", "\n", false);
        assert_eq!(text, "/* note\n * |");
    }

    #[test]
    fn existing_comment_is_not_closed_again() {
        let (text, _) = run("/* note|\n */\nSELECT 1;", "\n", true);
        assert_eq!(text, "/* note\n * |\n */\nSELECT 1;");
    }

    #[rstest]
    #[case("/*\n * first|\n */", "/*\n * first\n * |\n */")]
    #[case("/*\n    * first|\n */", "/*\n    * first\n    * |\n */")]
    #[case("/*\n  plain|\n*/", "/*\n  plain\n  |\n*/")]
    fn continues_line_prefix(#[case] marked: &str, #[case] expected: &str) {
        let (text, action) = run(marked, "\n", true);
        assert_eq!(text, expected);
        assert_eq!(action, EditAction::CommentContinued);
    }

    #[test]
    fn slash_after_star_space_closes() {
        let (text, action) = run("/* note\n * |", "/", true);
        assert_eq!(text, "/* note\n */|");
        assert_eq!(action, EditAction::CommentClosed);
    }

    #[test]
    fn other_input_is_left_alone() {
        let (text, action) = run("/* no|te */", "x", true);
        assert_eq!(text, "/* nox|te */");
        assert_eq!(action, EditAction::Unchanged);

        let (text, action) = run("/* a *|", "/", true);
        assert_eq!(text, "/* a */|");
        assert_eq!(action, EditAction::Unchanged);
    }
}
