//! Materialization error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing parsed blocks to disk
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("error creating directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error writing file {}: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("incomplete code block: file {path} was written but no closing fence was found")]
    Truncated { path: String },

    #[error("error processing code blocks: {}", join_errors(.0))]
    Batch(Vec<WriteError>),
}

fn join_errors(errors: &[WriteError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_message_joins_failures() {
        let err = WriteError::Batch(vec![
            WriteError::WriteFile {
                path: PathBuf::from("a.txt"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            },
            WriteError::Truncated {
                path: "b.txt".to_string(),
            },
        ]);

        let message = err.to_string();
        assert!(message.starts_with("error processing code blocks: "));
        assert!(message.contains("error writing file a.txt: denied"));
        assert!(message.contains("; incomplete code block: file b.txt"));
    }
}
