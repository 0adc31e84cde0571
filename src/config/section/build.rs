//! `[build]` section configuration.
//!
//! Source and output locations, all relative to the project root.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "target"               # Build output directory
//! templates = "views"             # Handlebars views (`**/*.hbs`)
//! partials = "views/partials"     # Partials, excluded from page discovery
//! data = "bin/view_data.json"     # Shared data context for every view
//! styles = "styles"               # SCSS sources (holds `entry.scss`)
//! scripts = "js"                  # Script sources (holds `entry.js`)
//! public = "public"               # Copied verbatim into the output root
//! assets = "assets"               # Copied into `<output>/assets`, images shrunk
//! package = "package.json"        # Runtime dependency list
//! node_modules = "node_modules"   # Where runtime dependencies are installed
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    pub output: PathBuf,
    pub templates: PathBuf,
    pub partials: PathBuf,
    pub data: PathBuf,
    pub styles: PathBuf,
    pub scripts: PathBuf,
    pub public: PathBuf,
    pub assets: PathBuf,
    pub package: PathBuf,
    pub node_modules: PathBuf,
}

impl BuildSectionConfig {
    pub const OUTPUT: FieldPath = FieldPath::new("build.output");
    pub const PARTIALS: FieldPath = FieldPath::new("build.partials");

    /// Resolve every directory against `root`.
    pub fn normalize(&mut self, root: &Path) {
        for path in [
            &mut self.output,
            &mut self.templates,
            &mut self.partials,
            &mut self.data,
            &mut self.styles,
            &mut self.scripts,
            &mut self.public,
            &mut self.assets,
            &mut self.package,
            &mut self.node_modules,
        ] {
            *path = crate::utils::path::normalize_path(&root.join(&*path));
        }
    }

    /// Validate normalized paths.
    pub fn validate(&self, root: &Path, diag: &mut ConfigDiagnostics) {
        if self.output == root {
            diag.error_with_hint(
                Self::OUTPUT,
                "output directory must not be the project root",
                "use a dedicated directory such as \"target\"",
            );
        }

        for source in [&self.templates, &self.styles, &self.scripts] {
            if source.starts_with(&self.output) {
                diag.error(
                    Self::OUTPUT,
                    format!("output directory contains sources: {}", source.display()),
                );
            }
        }

        if !self.partials.starts_with(&self.templates) {
            diag.warn(
                Self::PARTIALS,
                "partials live outside the templates directory and will not be watched",
            );
        }
    }
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            output: "target".into(),
            templates: "views".into(),
            partials: "views/partials".into(),
            data: "bin/view_data.json".into(),
            styles: "styles".into(),
            scripts: "js".into(),
            public: "public".into(),
            assets: "assets".into(),
            package: "package.json".into(),
            node_modules: "node_modules".into(),
        }
    }
}
