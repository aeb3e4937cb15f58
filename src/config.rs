use crate::{Error, KeywordCase, Result, warn};
use confique::Config as _;
use std::path::Path;
use std::sync::OnceLock;

/// Editor preferences consulted by the auto-edit strategies.
///
/// Values come from `QINDENT_*` environment variables and, optionally, a TOML
/// file. Every field has a default so an empty environment is valid.
#[derive(Debug, Clone, PartialEq, Eq, confique::Config)]
pub struct Preferences {
    /// Auto-close `BEGIN`, `CASE`, `LOOP` and `IF` blocks on newline.
    #[config(env = "QINDENT_CLOSE_BLOCKS", default = true)]
    pub close_blocks: bool,
    /// Close a freshly opened `/*` comment on newline.
    #[config(env = "QINDENT_CLOSE_COMMENTS", default = true)]
    pub close_comments: bool,
    /// Re-case a keyword when a word boundary is typed after it.
    #[config(env = "QINDENT_KEYWORD_CASE_AUTO", default = true)]
    pub keyword_case_auto: bool,
    #[config(env = "QINDENT_KEYWORD_CASE", parse_env = parse_keyword_case, default = "upper")]
    pub keyword_case: KeywordCase,
    /// Unwrap SQL pasted as a host-language string literal.
    #[config(env = "QINDENT_EXTRACT_FROM_SOURCE", default = true)]
    pub extract_from_source: bool,
    /// Inserted text longer than this is treated as a paste.
    #[config(env = "QINDENT_MIN_SOURCE_LENGTH", default = 10)]
    pub min_source_length: usize,
    /// Keyword driven indentation and the identifier dedent heuristic.
    #[config(env = "QINDENT_KEYWORD_INDENT", default = false)]
    pub keyword_indent: bool,
    #[config(env = "QINDENT_INDENT_WIDTH", default = 4)]
    pub indent_width: usize,
    #[config(env = "QINDENT_INSERT_SPACES", default = true)]
    pub insert_spaces: bool,
    #[config(default = [";"])]
    pub statement_delimiters: Vec<String>,
    /// Extra auto-closable blocks, each `"HEAD TAIL"` or `"HEAD TAIL TAIL_END"`.
    #[config(default = [])]
    pub block_pairs: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            close_blocks: true,
            close_comments: true,
            keyword_case_auto: true,
            keyword_case: KeywordCase::Upper,
            extract_from_source: true,
            min_source_length: 10,
            keyword_indent: false,
            indent_width: 4,
            insert_spaces: true,
            statement_delimiters: vec![";".to_string()],
            block_pairs: Vec::new(),
        }
    }
}

impl Preferences {
    /// Load preferences from the current environment.
    pub fn load() -> Result<Self> {
        Ok(Self::builder().env().load()?)
    }

    /// Load preferences from the environment, falling back to a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::builder().env().file(path.as_ref()).load()?)
    }

    /// One level of indentation.
    pub fn indent_unit(&self) -> String {
        if self.insert_spaces {
            " ".repeat(self.indent_width)
        } else {
            "\t".to_string()
        }
    }
}

fn parse_keyword_case(value: &str) -> Result<KeywordCase> {
    match value.trim().to_ascii_lowercase().as_str() {
        "upper" => Ok(KeywordCase::Upper),
        "lower" => Ok(KeywordCase::Lower),
        "mixed" => Ok(KeywordCase::Mixed),
        _ => Err(Error::Config(format!("unknown keyword case {value:?}"))),
    }
}

/// Process-wide preferences, loaded from the environment on first use.
pub fn preferences() -> &'static Preferences {
    static PREFERENCES: OnceLock<Preferences> = OnceLock::new();
    PREFERENCES.get_or_init(|| {
        Preferences::load().unwrap_or_else(|e| {
            warn!("Falling back to default preferences: {e}");
            Preferences::default()
        })
    })
}
