//! Project configuration management for `pagesmith.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── scaffold   # [scaffold]
//! │   ├── script     # [script]
//! │   ├── serve      # [serve]
//! │   └── style      # [style]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! The config file is optional: without one every section uses its defaults
//! and the project root is the working directory.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{BuildSectionConfig, ScaffoldConfig, ScriptConfig, ServeConfig, StyleConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands},
    compiler::StageKind,
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing pagesmith.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file, empty when none was found
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file, else cwd
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub build: BuildSectionConfig,

    #[serde(default)]
    pub style: StyleConfig,

    #[serde(default)]
    pub script: ScriptConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub scaffold: ScaffoldConfig,
}

impl SiteConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory, or cwd when there is no config file.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, root) = match find_config_file(&cli.config) {
            Some(path) => {
                let config = Self::from_path(&path)?;
                let root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                (Self { config_path: path, ..config }, root)
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                (Self::default(), cwd)
            }
        };

        config.finalize(&root);
        config.apply_command_options(cli);
        config.validate()?;

        Ok(config)
    }

    /// Default configuration rooted at `root`, already normalized.
    pub fn for_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.finalize(root);
        config
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // derived locations
    // ========================================================================

    /// Absolute path of the SCSS entry point.
    pub fn style_entry(&self) -> PathBuf {
        self.build.styles.join(&self.style.entry)
    }

    /// Absolute path of the compiled stylesheet.
    pub fn style_output(&self) -> PathBuf {
        self.build.output.join("css").join(&self.style.output)
    }

    /// Absolute path of the script entry point.
    pub fn script_entry(&self) -> PathBuf {
        self.build.scripts.join(&self.script.entry)
    }

    /// Absolute path of the script bundle.
    pub fn script_output(&self) -> PathBuf {
        self.build.output.join("js").join(&self.script.output)
    }

    /// Stage to source-glob mapping, relative to the project root.
    ///
    /// Asset sources are copied once and have no subscription.
    pub fn source_roots(&self) -> Vec<(StageKind, String)> {
        let glob = |dir: &Path, ext: &str| {
            let dir = self.root_relative(dir);
            let dir = dir.to_string_lossy().replace('\\', "/");
            if dir.is_empty() {
                format!("**/*.{ext}")
            } else {
                format!("{}/**/*.{ext}", dir.trim_end_matches('/'))
            }
        };

        vec![
            (StageKind::Template, glob(&self.build.templates, "hbs")),
            (StageKind::Style, glob(&self.build.styles, "scss")),
            (StageKind::Script, glob(&self.build.scripts, "js")),
        ]
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        if let Commands::Build { args } = &cli.command {
            Self::update_option(&mut self.serve.interface, args.interface.as_ref());
            Self::update_option(&mut self.serve.port, args.port.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Set the root and normalize every path against it.
    fn finalize(&mut self, root: &Path) {
        let root = crate::utils::path::normalize_path(root);
        if !self.config_path.as_os_str().is_empty() {
            self.config_path = crate::utils::path::normalize_path(&self.config_path);
        }

        self.build.normalize(&root);
        self.scaffold.normalize(&root);
        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.build.validate(&self.root, &mut diag);
        self.style.validate(&mut diag);
        self.script.validate(&mut diag);
        self.serve.validate(&mut diag);

        diag.print_warnings();

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config text. Panics on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
