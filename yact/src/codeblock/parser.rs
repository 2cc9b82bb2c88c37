//! Fenced code block parser
//!
//! Splits a model response into `CodeBlock`s. Blocks are delimited by lines
//! starting with [`FENCE`]; text outside any block is ignored. Text after the
//! opening fence is kept as the block header and used as the path when the
//! block carries no path comment.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::path::extract_path;

/// Four backticks; three-backtick fences inside a block are plain content
pub const FENCE: &str = "````";

/// A file recovered from a model response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Resolved file path
    pub path: String,
    /// Content lines joined with `\n`
    pub content: String,
}

impl CodeBlock {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Render this block as fenced text that parses back to the same block
    pub fn to_fenced(&self) -> String {
        render_fenced(&self.path, &self.content)
    }
}

/// Render file content as a fenced block with a `//` path comment
pub fn render_fenced(path: &str, content: &str) -> String {
    [FENCE, &format!("// {}", path), content, FENCE].join("\n")
}

/// Result of parsing one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Blocks in response order
    pub blocks: Vec<CodeBlock>,
    /// The response ended inside a block; that block is the last one
    pub truncated: bool,
}

impl ParsedResponse {
    /// Path of the block that was still open at end of input
    pub fn truncated_path(&self) -> Option<&str> {
        if self.truncated {
            self.blocks.last().map(|b| b.path.as_str())
        } else {
            None
        }
    }
}

/// Block being accumulated during the scan
struct OpenBlock<'a> {
    header: String,
    lines: Vec<&'a str>,
}

/// Parses responses, resolving absolute-looking paths against a working root
#[derive(Debug, Clone)]
pub struct CodeBlockParser {
    root: PathBuf,
}

impl Default for CodeBlockParser {
    fn default() -> Self {
        Self::new(".")
    }
}

impl CodeBlockParser {
    /// Create a parser whose path probes are relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Split a response into code blocks
    ///
    /// A response that ends inside a block still yields that block and is
    /// flagged as truncated; reporting it is up to the caller.
    pub fn parse(&self, response: &str) -> ParsedResponse {
        debug!(response_len = response.len(), "parse: called");
        let mut blocks = Vec::new();
        let mut unknown_count = 0usize;
        let mut open: Option<OpenBlock> = None;

        for line in response.split('\n') {
            if line.trim().starts_with(FENCE) {
                match open.take() {
                    Some(block) => {
                        if let Some(block) = self.close(block, &mut unknown_count) {
                            blocks.push(block);
                        }
                    }
                    None => {
                        let header = line.trim().replacen(FENCE, "", 1).trim().to_string();
                        debug!(%header, "parse: block opened");
                        open = Some(OpenBlock {
                            header,
                            lines: Vec::new(),
                        });
                    }
                }
            } else if let Some(block) = open.as_mut() {
                block.lines.push(line);
            }
        }

        let mut truncated = false;
        if let Some(block) = open
            && let Some(block) = self.close(block, &mut unknown_count)
        {
            debug!(path = %block.path, "parse: response ended inside a block");
            blocks.push(block);
            truncated = true;
        }

        debug!(block_count = blocks.len(), truncated, "parse: done");
        ParsedResponse { blocks, truncated }
    }

    fn close(&self, block: OpenBlock<'_>, unknown_count: &mut usize) -> Option<CodeBlock> {
        let OpenBlock { header, mut lines } = block;
        if lines.is_empty() {
            debug!("close: discarding empty block");
            return None;
        }

        let mut index = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
        if index < lines.len() && lines[index].trim().starts_with("#!") {
            index += 1;
        }

        let mut path = None;
        if index < lines.len()
            && let Some(extracted) = extract_path(lines[index])
        {
            lines.remove(index);
            path = Some(extracted);
        }

        let path = match path {
            Some(path) => path,
            None if !header.is_empty() => header,
            None => {
                *unknown_count += 1;
                format!("unknown{}", unknown_count)
            }
        };

        Some(CodeBlock {
            path: self.resolve_absolute(path),
            content: lines.join("\n"),
        })
    }

    /// Map `/x/y` onto the working root unless only the absolute file exists
    fn resolve_absolute(&self, path: String) -> String {
        let Some(relative) = path.strip_prefix('/') else {
            return path;
        };

        if self.root.join(relative).exists() {
            debug!(%relative, "resolve_absolute: relative form exists");
            relative.to_string()
        } else if Path::new(&path).exists() {
            debug!(%path, "resolve_absolute: keeping absolute path");
            path
        } else {
            relative.to_string()
        }
    }
}

/// Parse a response against the current directory
pub fn parse_code_blocks(response: &str) -> Vec<CodeBlock> {
    CodeBlockParser::default().parse(response).blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fenced(lines: &[&str]) -> String {
        lines.join("\n")
    }

    #[test]
    fn test_empty_response() {
        let parsed = CodeBlockParser::default().parse("");
        assert!(parsed.blocks.is_empty());
        assert!(!parsed.truncated);
    }

    #[test]
    fn test_text_outside_blocks_ignored() {
        let parsed = CodeBlockParser::default().parse("Here is the file you asked for.\nNo code.");
        assert!(parsed.blocks.is_empty());
    }

    #[test]
    fn test_path_comment_removed_from_content() {
        let response = fenced(&["intro", "````", "// src/main.rs", "fn main() {}", "````", "outro"]);
        let blocks = parse_code_blocks(&response);

        assert_eq!(blocks, vec![CodeBlock::new("src/main.rs", "fn main() {}")]);
    }

    #[test]
    fn test_leading_blank_lines_kept() {
        let response = fenced(&["````", "", "# notes.md", "hello", "````"]);
        let blocks = parse_code_blocks(&response);

        assert_eq!(blocks[0].path, "notes.md");
        assert_eq!(blocks[0].content, "\nhello");
    }

    #[test]
    fn test_shebang_skipped_before_path() {
        let response = fenced(&["````", "#!/bin/bash", "# scripts/run.sh", "echo hi", "````"]);
        let blocks = parse_code_blocks(&response);

        assert_eq!(blocks[0].path, "scripts/run.sh");
        assert_eq!(blocks[0].content, "#!/bin/bash\necho hi");
    }

    #[test]
    fn test_header_fallback() {
        let response = fenced(&["```` src/lib.rs", "pub fn answer() -> u32 { 42 }", "````"]);
        let blocks = parse_code_blocks(&response);

        assert_eq!(blocks[0].path, "src/lib.rs");
        assert_eq!(blocks[0].content, "pub fn answer() -> u32 { 42 }");
    }

    #[test]
    fn test_path_comment_beats_header() {
        let response = fenced(&["```` header.txt", "// real.txt", "body", "````"]);
        let blocks = parse_code_blocks(&response);

        assert_eq!(blocks[0].path, "real.txt");
    }

    #[test]
    fn test_unknown_placeholders_are_distinct() {
        let response = fenced(&["````", "first", "````", "````", "second", "````"]);
        let blocks = parse_code_blocks(&response);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].path, "unknown1");
        assert_eq!(blocks[1].path, "unknown2");
    }

    #[test]
    fn test_unknown_counter_is_per_parse() {
        let response = fenced(&["````", "body", "````"]);
        let parser = CodeBlockParser::default();

        assert_eq!(parser.parse(&response).blocks[0].path, "unknown1");
        assert_eq!(parser.parse(&response).blocks[0].path, "unknown1");
    }

    #[test]
    fn test_empty_block_discarded() {
        let response = fenced(&["````", "````", "````", "// a.txt", "a", "````"]);
        let blocks = parse_code_blocks(&response);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].path, "a.txt");
    }

    #[test]
    fn test_truncated_block_still_emitted() {
        let response = fenced(&["````", "// a.txt", "complete", "````", "````", "// b.txt", "cut off"]);
        let parsed = CodeBlockParser::default().parse(&response);

        assert_eq!(parsed.blocks.len(), 2);
        assert!(parsed.truncated);
        assert_eq!(parsed.truncated_path(), Some("b.txt"));
        assert_eq!(parsed.blocks[1].content, "cut off");
    }

    #[test]
    fn test_triple_backticks_are_content() {
        let response = fenced(&["````", "// README.md", "```rust", "fn x() {}", "```", "````"]);
        let blocks = parse_code_blocks(&response);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "```rust\nfn x() {}\n```");
    }

    #[test]
    fn test_trailing_blank_line_preserved() {
        let response = fenced(&["````", "// a.txt", "line", "", "````"]);
        let blocks = parse_code_blocks(&response);

        assert_eq!(blocks[0].content, "line\n");
    }

    #[test]
    fn test_render_fenced_round_trip() {
        let block = CodeBlock::new("src/x.go", "package main\n\nfunc main() {}\n");
        let blocks = parse_code_blocks(&block.to_fenced());

        assert_eq!(blocks, vec![block]);
    }

    #[test]
    fn test_absolute_path_prefers_existing_relative() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/a.rs"), "").unwrap();

        let parser = CodeBlockParser::new(temp.path());
        let parsed = parser.parse(&fenced(&["````", "// /src/a.rs", "x", "````"]));

        assert_eq!(parsed.blocks[0].path, "src/a.rs");
    }

    #[test]
    fn test_absolute_path_kept_when_only_absolute_exists() {
        let root = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let absolute = elsewhere.path().join("kept.txt");
        fs::write(&absolute, "").unwrap();
        let absolute = absolute.to_string_lossy().to_string();

        let parser = CodeBlockParser::new(root.path());
        let parsed = parser.parse(&fenced(&["````", &format!("// {}", absolute), "x", "````"]));

        assert_eq!(parsed.blocks[0].path, absolute);
    }

    #[test]
    fn test_absolute_path_defaults_to_relative() {
        let temp = TempDir::new().unwrap();
        let parser = CodeBlockParser::new(temp.path());
        let parsed = parser.parse(&fenced(&["````", "// /does/not/exist.rs", "x", "````"]));

        assert_eq!(parsed.blocks[0].path, "does/not/exist.rs");
    }
}
