//! `[style]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [style]
//! entry = "entry.scss"                     # Relative to `build.styles`
//! output = "global.min.css"                # Written to `<output>/css/`
//! browsers = ["last 2 versions", "> 10%"]  # Prefixing targets
//! compatibility = "ie 9"                   # Oldest browser still prefixed for
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use lightningcss::targets::Browsers;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub entry: PathBuf,
    pub output: PathBuf,
    pub browsers: Vec<String>,
    pub compatibility: Option<String>,
}

impl StyleConfig {
    pub const BROWSERS: FieldPath = FieldPath::new("style.browsers");
    pub const OUTPUT: FieldPath = FieldPath::new("style.output");

    /// Every browserslist query the stylesheet is prefixed for.
    pub fn queries(&self) -> Vec<&str> {
        self.browsers
            .iter()
            .map(String::as_str)
            .chain(self.compatibility.as_deref())
            .collect()
    }

    /// Resolve the queries into lightningcss browser versions.
    pub fn browsers(&self) -> Option<Browsers> {
        Browsers::from_browserslist(self.queries()).ok().flatten()
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(err) = Browsers::from_browserslist(self.queries()) {
            diag.error_with_hint(
                Self::BROWSERS,
                format!("invalid browserslist query: {err}"),
                "see https://browsersl.ist for the query syntax",
            );
        }

        if self.browsers.is_empty() && self.compatibility.is_none() {
            diag.warn(Self::BROWSERS, "no targets, vendor prefixes are disabled");
        }

        if self.output.extension().is_none_or(|ext| ext != "css") {
            diag.warn(Self::OUTPUT, "stylesheet output does not end in .css");
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            entry: "entry.scss".into(),
            output: "global.min.css".into(),
            browsers: vec!["last 2 versions".into(), "> 10%".into()],
            compatibility: Some("ie 9".into()),
        }
    }
}
