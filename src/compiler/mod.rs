//! Build stages.
//!
//! Every stage is independently re-runnable and only ever writes its own
//! outputs, so the orchestrator can run all of them concurrently.
//!
//! | Stage      | Sources                | Output                          |
//! |------------|------------------------|---------------------------------|
//! | `template` | `views/**/*.hbs`       | `<output>/**/*.html`            |
//! | `style`    | `styles/entry.scss`    | `<output>/css/global.min.css`   |
//! | `script`   | `js/entry.js`          | `<output>/js/bundle.js`         |
//! | asset      | `public/`, `assets/`   | `<output>/`, `<output>/assets/` |
//!
//! The asset stage lives in [`crate::asset`].

mod error;
pub mod script;
pub mod style;
pub mod template;

use jwalk::{Parallelism, WalkDir};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::core::BuildMode;

pub use error::StageError;
pub use script::ScriptStage;
pub use style::StyleStage;
pub use template::TemplateStage;

/// Identifies one build stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Template,
    Style,
    Script,
    Asset,
}

impl StageKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Style => "style",
            Self::Script => "script",
            Self::Asset => "asset",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Context shared by every stage invocation
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub mode: BuildMode,
    pub config: &'a SiteConfig,
}

impl<'a> StageContext<'a> {
    pub fn new(mode: BuildMode, config: &'a SiteConfig) -> Self {
        Self { mode, config }
    }
}

/// Outcome of one stage invocation.
///
/// Per-file failures do not abort the stage; they are collected here and
/// the remaining files still build.
#[derive(Debug)]
pub struct StageReport {
    pub stage: StageKind,
    pub written: Vec<PathBuf>,
    pub failures: Vec<StageError>,
    /// Per-file problems that do not fail the stage.
    pub warnings: Vec<StageError>,
}

impl StageReport {
    pub fn new(stage: StageKind) -> Self {
        Self {
            stage,
            written: Vec::new(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// One-line summary for logs and watch status.
    pub fn summary(&self) -> String {
        let files = if self.written.len() == 1 { "file" } else { "files" };
        let mut summary = format!("{}: {} {files} written", self.stage, self.written.len());
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} failed", self.failures.len()));
        }
        if !self.warnings.is_empty() {
            summary.push_str(&format!(", {} skipped", self.warnings.len()));
        }
        summary
    }

    /// Every failure, one per line.
    pub fn failure_detail(&self) -> String {
        self.failures
            .iter()
            .map(StageError::detail)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A re-runnable build step.
pub trait Stage: Send {
    fn kind(&self) -> StageKind;

    /// Build every source of this stage.
    fn run(&mut self, ctx: &StageContext<'_>) -> Result<StageReport, StageError>;

    /// Rebuild after `changed` was modified. Whole-stage by default.
    fn rebuild(
        &mut self,
        ctx: &StageContext<'_>,
        changed: &Path,
    ) -> Result<StageReport, StageError> {
        let _ = changed;
        self.run(ctx)
    }
}

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively.
///
/// The walk runs serially: stages call this from inside `rayon::scope`,
/// where jwalk's default pool refuses to start. Unreadable entries are
/// logged and skipped.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).parallelism(Parallelism::Serial) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                crate::log!("warning"; "cannot walk {}: {}", dir.display(), err);
                continue;
            }
        };
        let name = entry.file_name().to_str().unwrap_or_default();
        if entry.file_type().is_file() && !IGNORED_FILES.contains(&name) {
            files.push(entry.path());
        }
    }
    files.sort();
    files
}

/// Collect files with the given extension, sorted for stable output.
pub fn collect_files_with_ext(dir: &Path, ext: &str) -> Vec<PathBuf> {
    collect_all_files(dir)
        .into_iter()
        .filter(|path| path.extension().is_some_and(|e| e == ext))
        .collect()
}

/// Write a stage output, creating parent directories.
pub fn write_output(path: &Path, content: impl AsRef<[u8]>) -> Result<(), StageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StageError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| StageError::io(path, e))
}
