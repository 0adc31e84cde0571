//! Type-safe config field path.

use owo_colors::OwoColorize;
use std::fmt;

/// A type-safe wrapper for config field paths.
///
/// Each section exposes its fields as associated constants so diagnostics
/// always point at a real key.
///
/// # Example
///
/// ```ignore
/// impl ScriptConfig {
///     pub const GLOBAL: FieldPath = FieldPath::new("script.global");
/// }
///
/// diag.error(ScriptConfig::GLOBAL, "must be a valid identifier");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_as_str() {
        const PORT: FieldPath = FieldPath::new("serve.port");
        assert_eq!(PORT.as_str(), "serve.port");
        assert_eq!(PORT.as_ref(), "serve.port");
        assert!(PORT.to_string().contains("serve.port"));
    }
}
