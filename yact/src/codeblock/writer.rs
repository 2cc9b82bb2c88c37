//! Writes parsed code blocks to disk

use colored::*;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::WriteError;
use super::parser::{CodeBlock, CodeBlockParser};

/// Suffix appended to every target path in safe mode
pub const SAFE_SUFFIX: &str = ".new";

/// Materializes code blocks below a working root
#[derive(Debug, Clone)]
pub struct FileMaterializer {
    root: PathBuf,
    ensure_trailing_newline: bool,
}

impl Default for FileMaterializer {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FileMaterializer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ensure_trailing_newline: false,
        }
    }

    /// Append a final newline to content that lacks one
    pub fn with_trailing_newline(mut self, enabled: bool) -> Self {
        self.ensure_trailing_newline = enabled;
        self
    }

    /// Where `block` lands, with the safe-mode suffix applied
    pub fn target_path(&self, block: &CodeBlock, safe: bool) -> PathBuf {
        self.root.join(display_path(block, safe))
    }

    /// Write one block, creating parent directories as needed
    pub fn write(&self, block: &CodeBlock, safe: bool) -> Result<PathBuf, WriteError> {
        debug!(path = %block.path, safe, "write: called");
        let target = self.target_path(block, safe);

        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            create_parent(parent).map_err(|source| WriteError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut content = block.content.clone();
        if self.ensure_trailing_newline && !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }

        write_file(&target, content.as_bytes()).map_err(|source| WriteError::WriteFile {
            path: target.clone(),
            source,
        })?;

        info!(path = %target.display(), bytes = content.len(), "write: block materialized");
        println!("{} {}", "Written:".green(), display_path(block, safe));
        Ok(target)
    }

    /// Parse `response` and write every block
    ///
    /// Keeps going after a failed write; failures come back as one
    /// aggregate error once every block has been attempted. A response cut
    /// off inside a block is written and then reported as truncated; if that
    /// block could not be written, only the write failure is reported.
    pub fn process_all(&self, response: &str, safe: bool) -> Result<Vec<PathBuf>, WriteError> {
        let parsed = CodeBlockParser::new(&self.root).parse(response);
        debug!(block_count = parsed.blocks.len(), "process_all: parsed response");

        let mut written = Vec::new();
        let mut failures = Vec::new();
        let mut last_landed = false;
        for block in &parsed.blocks {
            last_landed = match self.write(block, safe) {
                Ok(path) => {
                    written.push(path);
                    true
                }
                Err(e) => {
                    warn!(path = %block.path, error = %e, "process_all: write failed");
                    failures.push(e);
                    false
                }
            };
        }

        if let Some(path) = parsed.truncated_path()
            && last_landed
        {
            failures.push(WriteError::Truncated { path: path.to_string() });
        }

        match failures.pop() {
            None => Ok(written),
            Some(only @ WriteError::Truncated { .. }) if failures.is_empty() => Err(only),
            Some(last) => {
                failures.push(last);
                Err(WriteError::Batch(failures))
            }
        }
    }
}

fn display_path(block: &CodeBlock, safe: bool) -> String {
    if safe {
        format!("{}{}", block.path, SAFE_SUFFIX)
    } else {
        block.path.clone()
    }
}

fn create_parent(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir)
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)?.write_all(bytes)
}
