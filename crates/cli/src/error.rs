//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: editor error (undecodable image, encode failure, bad dimensions)
//! - 11: I/O error (reading input, writing output)
//! - 12: input error (bad config file, bad stroke script)
//! - 13: serialization error
//! - 14: the input is an image, but not one the editor reads (e.g. GIF)

use retouch_core::EditorError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
#[derive(Debug)]
pub enum CliError {
    /// An editor-level error (decode failure, encode failure, bad dimensions).
    Editor(EditorError),
    /// A recognised image format outside PNG and JPEG; carries the format name.
    UnsupportedFormat(String),
    /// An I/O error (file read or write).
    Io(String),
    /// A user input error (bad config JSON, bad stroke script).
    Input(String),
    /// A serialization error (JSON output failure).
    Serialization(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Editor(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
            CliError::UnsupportedFormat(_) => 14,
        }
    }

    /// Stable machine-readable category, reported as `kind` in `--json` mode.
    pub fn kind(&self) -> &'static str {
        match self {
            CliError::Editor(EditorError::Decode(_)) => "decode",
            CliError::Editor(EditorError::NotLoaded) => "not_loaded",
            CliError::Editor(_) => "editor",
            CliError::Io(_) => "io",
            CliError::Input(_) => "input",
            CliError::Serialization(_) => "serialization",
            CliError::UnsupportedFormat(_) => "unsupported_format",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Editor(e) => write!(f, "{e}"),
            CliError::UnsupportedFormat(format) => {
                write!(f, "unsupported image format: {format} (expected PNG or JPEG)")
            }
            CliError::Io(msg) | CliError::Input(msg) | CliError::Serialization(msg) => {
                write!(f, "{msg}")
            }
        }
    }
}

impl From<EditorError> for CliError {
    fn from(e: EditorError) -> Self {
        match e {
            EditorError::Io(msg) => CliError::Io(msg),
            EditorError::UnsupportedFormat(format) => CliError::UnsupportedFormat(format),
            other => CliError::Editor(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
