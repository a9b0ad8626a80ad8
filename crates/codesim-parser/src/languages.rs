//! Language detection and per-dialect pattern sets.

use regex::Regex;
use std::path::Path;

/// Language dialects with distinct comment and string syntax.
///
/// `Generic` covers unknown extensions and borrows Python's patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Java,
    Cpp,
    JavaScript,
    Generic,
}

impl Language {
    /// Detect language from the file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match ext.as_deref() {
            Some("py") => Self::Python,
            Some("java") => Self::Java,
            Some("c" | "cpp" | "h" | "hpp") => Self::Cpp,
            Some("js" | "jsx" | "ts" | "tsx") => Self::JavaScript,
            _ => Self::Generic,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::JavaScript => "javascript",
            Self::Generic => "generic",
        }
    }
}

/// `#` line comments plus triple-quoted docstrings.
const PYTHON_COMMENT: &str = r#"(?ms)#.*?$|""".*?"""|'''.*?'''"#;
/// Double- or single-quoted strings with backslash escapes.
const PYTHON_STRING: &str = r#"(?ms)"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'"#;
/// `//` line comments plus `/* */` block comments.
const C_STYLE_COMMENT: &str = r"(?ms)//.*?$|/\*.*?\*/";
/// Double-quoted strings with backslash escapes.
const C_STYLE_STRING: &str = r#"(?ms)"(?:\\.|[^"\\])*""#;
/// Python's two quote forms plus backtick template literals.
const JAVASCRIPT_STRING: &str = r#"(?ms)"(?:\\.|[^"\\])*"|'(?:\\.|[^'\\])*'|`(?:\\.|[^`\\])*`"#;
/// Identifiers, integer literals, or any single non-space character.
const TOKEN: &str = r"[A-Za-z_][A-Za-z0-9_]*|\d+|\S";

/// Compiled pattern set for one dialect. Built once and treated as immutable
/// configuration thereafter.
#[derive(Debug)]
pub(crate) struct DialectPatterns {
    pub(crate) comment: Regex,
    pub(crate) string: Regex,
    pub(crate) token: Regex,
}

impl DialectPatterns {
    pub(crate) fn for_language(language: Language) -> Self {
        let (comment, string) = match language {
            Language::Python | Language::Generic => (PYTHON_COMMENT, PYTHON_STRING),
            Language::Java | Language::Cpp => (C_STYLE_COMMENT, C_STYLE_STRING),
            Language::JavaScript => (C_STYLE_COMMENT, JAVASCRIPT_STRING),
        };
        Self {
            comment: compile(comment),
            string: compile(string),
            token: compile(TOKEN),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("dialect pattern is valid")
}
