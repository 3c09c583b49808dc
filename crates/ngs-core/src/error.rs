use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::resolve::IdentityError;
use crate::scanner::{line_col, SyntaxError};

/// Per-unit conversion failure.
///
/// A unit without a legacy definition is not an error; it is reported as
/// [`Conversion::NotApplicable`](crate::Conversion::NotApplicable).
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The factory call or its property literal could not be parsed
    #[error("Malformed literal in {}:{line}:{column}: {reason}", .path.display())]
    MalformedLiteral {
        path: PathBuf,
        line: usize,
        column: usize,
        reason: String,
    },

    /// Reading or writing the unit failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Relative imports cannot be computed for a unit outside the module root
    #[error("{} is outside module root {}", .path.display(), .root.display())]
    OutsideModuleRoot { path: PathBuf, root: PathBuf },
}

impl ConvertError {
    pub fn syntax(path: &Path, source: &str, err: SyntaxError) -> Self {
        let (line, column) = err.line_col(source);
        Self::MalformedLiteral {
            path: path.to_path_buf(),
            line,
            column,
            reason: err.message,
        }
    }

    pub fn identity(path: &Path, source: &str, offset: usize, err: IdentityError) -> Self {
        let (line, column) = line_col(source, offset);
        Self::MalformedLiteral {
            path: path.to_path_buf(),
            line,
            column,
            reason: err.to_string(),
        }
    }

    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The unit this error belongs to
    pub fn path(&self) -> &Path {
        match self {
            Self::MalformedLiteral { path, .. } | Self::Io { path, .. } | Self::OutsideModuleRoot { path, .. } => path,
        }
    }
}

/// Run-level configuration failure; raised before any unit is touched
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Alias pattern error: {0}")]
    Pattern(#[from] regex::Error),
}
