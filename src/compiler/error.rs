//! Stage error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::StageKind;

/// Errors raised while building a stage.
///
/// A failed stage never touches its previous output.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("IO error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} failed in `{}`:\n{message}", path.display())]
    Compile {
        stage: StageKind,
        path: PathBuf,
        message: String,
    },

    #[error("invalid data context `{}`", path.display())]
    Data {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot resolve `{specifier}` required from `{}`", from.display())]
    Unresolved { specifier: String, from: PathBuf },

    #[error("{stage} entry `{}` does not exist", path.display())]
    MissingEntry { stage: StageKind, path: PathBuf },
}

impl StageError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn compile(stage: StageKind, path: &Path, message: impl Into<String>) -> Self {
        Self::Compile {
            stage,
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// File the error is attributed to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Compile { path, .. }
            | Self::Data { path, .. }
            | Self::MissingEntry { path, .. } => path,
            Self::Unresolved { from, .. } => from,
        }
    }

    /// Message including the underlying cause, for terminal output.
    pub fn detail(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        message
    }
}
