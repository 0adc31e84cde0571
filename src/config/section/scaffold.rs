//! `[scaffold]` section configuration.
//!
//! ```toml
//! [scaffold]
//! boilerplate = "bin/templates"   # Holds template.hbs / template.scss / template.js
//! ```
//!
//! Any boilerplate missing from the directory falls back to the built-in one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaffoldConfig {
    pub boilerplate: PathBuf,
}

impl ScaffoldConfig {
    pub fn normalize(&mut self, root: &Path) {
        self.boilerplate = crate::utils::path::normalize_path(&root.join(&self.boilerplate));
    }
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            boilerplate: "bin/templates".into(),
        }
    }
}
