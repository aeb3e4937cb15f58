use crate::*;

/// Resolves the indentation strings the auto-indent strategy inserts.
pub trait Indenter {
    /// Indentation of the logical construct `offset` belongs to.
    fn reference_indentation(&self, scanner: &HeuristicScanner<'_>, offset: usize) -> Result<String>;

    /// Indentation for a new line started at `offset`; deeper than the
    /// reference when the text before `offset` opens a nesting level.
    fn compute_indentation(&self, scanner: &HeuristicScanner<'_>, offset: usize) -> Result<String>;

    /// Leading whitespace of the line containing `offset`.
    fn line_indentation(&self, buffer: &dyn SourceBuffer, offset: usize) -> Result<String> {
        let line = buffer.line_information_of_offset(offset)?;
        leading_whitespace(buffer, line.offset, line.end())
    }

    fn set_indent_unit(&mut self, _unit: &str) {}
}

/// Whitespace at `[from, to)` up to the first other char.
pub fn leading_whitespace<B: TextBuffer + ?Sized>(buffer: &B, from: usize, to: usize) -> Result<String> {
    let end = find_end_of_whitespace(buffer, from, to)?;
    buffer.get(from, end - from)
}

/// First offset in `[from, to)` that is neither a space nor a tab, or `to`.
pub fn find_end_of_whitespace<B: TextBuffer + ?Sized>(buffer: &B, from: usize, to: usize) -> Result<usize> {
    let mut offset = from;
    while offset < to {
        match buffer.char_at(offset)? {
            ' ' | '\t' => offset += 1,
            _ => break,
        }
    }
    Ok(offset)
}

pub fn create_indent(levels: usize, unit: &str) -> String {
    unit.repeat(levels)
}

/// Remove `levels` indentation units from the end of `indent`.
///
/// A trailing tab counts as one unit, as does a run of up to `unit` spaces.
pub fn unindent(indent: &str, levels: usize, unit: &str) -> String {
    let mut out = indent.to_string();
    for _ in 0..levels {
        if !unit.is_empty() && out.ends_with(unit) {
            out.truncate(out.len() - unit.len());
        } else if out.ends_with('\t') {
            out.pop();
        } else {
            let width = unit.chars().count().max(1);
            let trailing = out.chars().rev().take_while(|ch| *ch == ' ').count().min(width);
            out.truncate(out.len() - trailing);
        }
    }
    out
}

/// Indents relative to the cursor line; one unit deeper after a block head
/// or `THEN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndenter {
    unit: String,
}

impl LineIndenter {
    pub fn new(unit: impl Into<String>) -> Self {
        Self { unit: unit.into() }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }
}

impl Default for LineIndenter {
    fn default() -> Self {
        Self::new("    ")
    }
}

impl Indenter for LineIndenter {
    fn reference_indentation(&self, scanner: &HeuristicScanner<'_>, offset: usize) -> Result<String> {
        let buffer = scanner.buffer();
        let line = buffer.line_information_of_offset(offset)?;
        leading_whitespace(buffer, line.offset, offset)
    }

    fn compute_indentation(&self, scanner: &HeuristicScanner<'_>, offset: usize) -> Result<String> {
        let reference = self.reference_indentation(scanner, offset)?;
        let previous = scanner.previous_token(offset, Bound::Unbound);
        Ok(if opens_block(scanner, &previous) {
            reference + &self.unit
        } else {
            reference
        })
    }

    fn set_indent_unit(&mut self, unit: &str) {
        self.unit = unit.to_string();
    }
}

/// `THEN`, or a registered head that is not cancelled by the token before it.
pub(crate) fn opens_block(scanner: &HeuristicScanner<'_>, scan: &Scan) -> bool {
    if scan.token == Token::Then {
        return true;
    }
    let Some(info) = scanner.completions().find_by_head(scan.token) else {
        return false;
    };
    match info.head_cancel() {
        Some(cancel) => scanner.previous_token(scan.start, Bound::Unbound).token != cancel,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn with_scanner<T>(text: &str, f: impl FnOnce(&HeuristicScanner<'_>) -> T) -> T {
        let doc = Document::new(text);
        let dialect = AnsiDialect::default();
        let completions = BlockCompletions::builtin();
        let delimiters = vec![";".to_string()];
        f(&HeuristicScanner::new(&doc, &dialect, &completions, &delimiters))
    }

    #[rstest]
    #[case("  BEGIN", 7, "  ", "      ")]
    #[case("  x := 1;", 9, "  ", "  ")]
    #[case("\tIF a THEN", 10, "\t", "\t    ")]
    #[case("  END LOOP;", 10, "  ", "  ")]
    #[case("  END LOOP", 10, "  ", "  ")]
    #[case("    ", 2, "  ", "  ")]
    #[case("", 0, "", "")]
    fn indentation(
        #[case] text: &str,
        #[case] offset: usize,
        #[case] reference: &str,
        #[case] computed: &str,
    ) {
        let indenter = LineIndenter::default();
        with_scanner(text, |scanner| {
            assert_eq!(indenter.reference_indentation(scanner, offset).ok().as_deref(), Some(reference));
            assert_eq!(indenter.compute_indentation(scanner, offset).ok().as_deref(), Some(computed));
        });
    }

    #[test]
    fn line_indentation_of_other_lines() {
        let indenter = LineIndenter::default();
        with_scanner("BEGIN\n   x;\n", |scanner| {
            assert_eq!(indenter.line_indentation(scanner.buffer(), 8).ok().as_deref(), Some("   "));
            assert_eq!(indenter.line_indentation(scanner.buffer(), 2).ok().as_deref(), Some(""));
        });
    }

    #[rstest]
    #[case("        ", 1, "    ", "    ")]
    #[case("      ", 1, "    ", "  ")]
    #[case("\t\t", 1, "    ", "\t")]
    #[case("  ", 2, "    ", "")]
    #[case("", 1, "    ", "")]
    #[case("\t\t\t", 2, "\t", "\t")]
    fn unindent_levels(#[case] indent: &str, #[case] levels: usize, #[case] unit: &str, #[case] expected: &str) {
        assert_eq!(unindent(indent, levels, unit), expected);
    }

    #[test]
    fn create_indent_repeats_unit() {
        assert_eq!(create_indent(2, "  "), "    ");
        assert_eq!(create_indent(0, "\t"), "");
    }
}
