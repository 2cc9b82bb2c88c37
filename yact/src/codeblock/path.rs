//! File path recovery from comment lines
//!
//! Each block in a model response names its file with a comment on its first
//! content line. The recognised comment styles are tried in a fixed order and
//! the first style that accepts the line wins, even when a later style would
//! also match.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static DOUBLE_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*//\s*(.+?)(?:\s*//.*)?$").expect("double-slash pattern is valid"));

static HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s*(.+?)(?:\s*#.*)?$").expect("hash pattern is valid"));

static HASH_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s*//\s*(.+?)(?:\s*#.*)?$").expect("hash-slash pattern is valid"));

static BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*/\*\s*(.+?)\s*\*/$").expect("block comment pattern is valid"));

static SQL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*--\s*(.+?)(?:\s*--.*)?$").expect("sql pattern is valid"));

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<!--\s*(.+?)\s*-->$").expect("markup pattern is valid"));

static TRAILING_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\*+/$").expect("close marker pattern is valid"));

/// Comment syntaxes that can carry a file path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `// path`
    DoubleSlash,
    /// `# path`
    Hash,
    /// `# // path`
    HashSlash,
    /// `/* path */`
    Block,
    /// `-- path`
    Sql,
    /// `<!-- path -->`
    Markup,
}

impl CommentStyle {
    /// Every style, in the order they are tried
    pub const PRIORITY: [CommentStyle; 6] = [
        CommentStyle::DoubleSlash,
        CommentStyle::Hash,
        CommentStyle::HashSlash,
        CommentStyle::Block,
        CommentStyle::Sql,
        CommentStyle::Markup,
    ];

    fn pattern(self) -> &'static Regex {
        match self {
            CommentStyle::DoubleSlash => &DOUBLE_SLASH,
            CommentStyle::Hash => &HASH,
            CommentStyle::HashSlash => &HASH_SLASH,
            CommentStyle::Block => &BLOCK,
            CommentStyle::Sql => &SQL,
            CommentStyle::Markup => &MARKUP,
        }
    }

    /// Capture the path written in this style, if the line uses it
    ///
    /// A capture containing `!` is refused so shebangs and templated lines
    /// are never taken for paths.
    pub fn capture(self, line: &str) -> Option<String> {
        let captures = self.pattern().captures(line)?;
        let captured = captures.get(1)?.as_str().trim();
        if captured.contains('!') {
            debug!(style = ?self, %line, "capture: rejected '!' in capture");
            return None;
        }
        Some(TRAILING_CLOSE.replace(captured, "").into_owned())
    }
}

/// Extract a file path from a comment line
///
/// Returns `None` when no style accepts the line.
pub fn extract_path(line: &str) -> Option<String> {
    let (style, path) = CommentStyle::PRIORITY
        .iter()
        .find_map(|style| style.capture(line).map(|path| (*style, path)))?;

    if path.is_empty() {
        debug!(?style, %line, "extract_path: winning style captured nothing");
        return None;
    }

    debug!(?style, %path, "extract_path: matched");
    Some(path)
}
