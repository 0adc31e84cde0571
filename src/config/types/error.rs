//! Configuration error types.

use super::FieldPath;
use owo_colors::OwoColorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading `pagesmith.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid config file")]
    Toml(#[from] toml::de::Error),

    // no #[from]: the diagnostics already print everything
    #[error("{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// One rejected field.
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub field: FieldPath,
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            "→".red(),
            self.field.as_str().cyan(),
            self.message
        )?;
        if let Some(hint) = &self.hint {
            write!(f, "\n    {} {}", "hint:".yellow(), hint)?;
        }
        Ok(())
    }
}

/// Validation results gathered across all sections before reporting.
///
/// Errors fail the load, warnings are printed and the load continues.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    errors: Vec<ConfigDiagnostic>,
    warnings: Vec<(FieldPath, String)>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: FieldPath, message: impl Into<String>) {
        self.push(field, message.into(), None);
    }

    pub fn error_with_hint(
        &mut self,
        field: FieldPath,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.push(field, message.into(), Some(hint.into()));
    }

    fn push(&mut self, field: FieldPath, message: String, hint: Option<String>) {
        self.errors.push(ConfigDiagnostic {
            field,
            message,
            hint,
        });
    }

    pub fn warn(&mut self, field: FieldPath, message: impl Into<String>) {
        self.warnings.push((field, message.into()));
    }

    pub fn print_warnings(&self) {
        for (field, message) in &self.warnings {
            crate::log!("config"; "{}: {}", field.as_str(), message);
        }
    }

    pub fn warnings(&self) -> &[(FieldPath, String)] {
        &self.warnings
    }

    pub fn errors(&self) -> &[ConfigDiagnostic] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.has_errors() { Err(self) } else { Ok(()) }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", "invalid configuration:".red().bold())?;
        for err in &self.errors {
            write!(f, "\n{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigDiagnostics {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_error_names_file() {
        let err = ConfigError::Io(
            PathBuf::from("pagesmith.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("pagesmith.toml"));
    }

    #[test]
    fn test_diagnostics_into_result() {
        assert!(ConfigDiagnostics::new().into_result().is_ok());

        let mut diag = ConfigDiagnostics::new();
        diag.error_with_hint(
            FieldPath::new("serve.port"),
            "port collides with reload_port",
            "pick another port",
        );
        diag.warn(FieldPath::new("style.browsers"), "empty");
        assert_eq!(diag.warnings().len(), 1);
        let err = diag.into_result().unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].hint.as_deref(), Some("pick another port"));
        assert!(err.to_string().contains("serve.port"));
    }
}
