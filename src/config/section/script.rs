//! `[script]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [script]
//! entry = "entry.js"        # Relative to `build.scripts`
//! output = "bundle.js"      # Written to `<output>/js/`
//! global = "nodeModules"    # Global the entry exports are exposed as
//! target = "es2015"         # Syntax baseline the bundle is lowered to
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use oxc::transformer::TransformOptions;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub entry: PathBuf,
    pub output: PathBuf,
    pub global: String,
    pub target: String,
}

impl ScriptConfig {
    pub const GLOBAL: FieldPath = FieldPath::new("script.global");
    pub const TARGET: FieldPath = FieldPath::new("script.target");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !IDENTIFIER.is_match(&self.global) {
            diag.error_with_hint(
                Self::GLOBAL,
                format!("`{}` is not a valid JavaScript identifier", self.global),
                "use letters, digits, `_` or `$`, not starting with a digit",
            );
        }

        if let Err(err) = TransformOptions::from_target(&self.target) {
            diag.error_with_hint(
                Self::TARGET,
                format!("unsupported target `{}`: {err}", self.target),
                "use an ECMAScript version such as \"es2015\"",
            );
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            entry: "entry.js".into(),
            output: "bundle.js".into(),
            global: "nodeModules".into(),
            target: "es2015".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_script_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.script.global, "nodeModules");
        assert_eq!(config.script.target, "es2015");

        let mut diag = ConfigDiagnostics::new();
        config.script.validate(&mut diag);
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_script_invalid_global() {
        let config = test_parse_config("[script]\nglobal = \"9lives\"");
        let mut diag = ConfigDiagnostics::new();
        config.script.validate(&mut diag);
        assert_eq!(diag.errors().len(), 1);
        assert_eq!(diag.errors()[0].field, ScriptConfig::GLOBAL);
    }

    #[test]
    fn test_script_dollar_global() {
        let config = test_parse_config("[script]\nglobal = \"$app\"");
        let mut diag = ConfigDiagnostics::new();
        config.script.validate(&mut diag);
        assert!(!diag.has_errors());
    }
}
