#![cfg(test)]
pub use rstest::*;

use crate::{AutoIndentStrategy, Document, DocumentCommand, Outcome, Preferences};

pub(crate) fn common_init() {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// Remove the `|` cursor marker, returning the text and the char offset it marked.
pub(crate) fn split_cursor(marked: &str) -> (String, usize) {
    let byte = marked.find('|').expect("text should contain a cursor marker");
    (marked.replacen('|', "", 1), marked[..byte].chars().count())
}

/// Put the `|` cursor marker at char offset `caret`.
pub(crate) fn mark_cursor(text: &str, caret: usize) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    chars.insert(caret, '|');
    chars.into_iter().collect()
}

/// Type `typed` at the marked cursor with a strategy built from `preferences`,
/// apply the customized command and return the marked result.
pub(crate) fn type_text(marked: &str, typed: &str, preferences: Preferences) -> (String, Outcome) {
    common_init();
    let strategy = AutoIndentStrategy::with_preferences(preferences);
    let (text, offset) = split_cursor(marked);
    let mut document = Document::new(&text);
    let mut command = DocumentCommand::insert(offset, typed);
    let outcome = strategy.customize_document_command(&document, &mut command);
    let caret = command.apply(&mut document).expect("customized command should apply");
    (mark_cursor(&document.text(), caret), outcome)
}

mod helpers {
    use super::*;

    #[test]
    fn cursor_marker_round_trip() {
        let (text, offset) = split_cursor("ab|c");
        assert_eq!((text.as_str(), offset), ("abc", 2));
        assert_eq!(mark_cursor(&text, offset), "ab|c");
    }

    #[test]
    fn plain_typing_is_applied() {
        let (text, outcome) = type_text("x = |", "1", Preferences::default());
        assert_eq!(text, "x = 1|");
        assert!(!outcome.is_changed());
    }
}
