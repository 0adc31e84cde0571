//! Template stage: Handlebars views rendered to HTML documents.
//!
//! Every view under the templates directory (partials excluded) is rendered
//! against one shared JSON data context. Partials are re-read and
//! re-registered on every run so edits are picked up without a restart.

use std::fs;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use rayon::prelude::*;
use serde_json::Value;

use super::{
    Stage, StageContext, StageError, StageKind, StageReport, collect_files_with_ext, write_output,
};
use crate::config::SiteConfig;

const TEMPLATE_EXT: &str = "hbs";

/// Renders views; owns the partial registry and data context.
pub struct TemplateStage {
    registry: Handlebars<'static>,
    data: Value,
}

impl Default for TemplateStage {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateStage {
    pub fn new() -> Self {
        Self {
            registry: Handlebars::new(),
            data: Value::Object(Default::default()),
        }
    }

    /// Views to render: every `.hbs` outside the partials directory.
    pub fn discover(config: &SiteConfig) -> Vec<PathBuf> {
        collect_files_with_ext(&config.build.templates, TEMPLATE_EXT)
            .into_iter()
            .filter(|path| !Self::is_partial(config, path))
            .collect()
    }

    pub fn is_partial(config: &SiteConfig, path: &Path) -> bool {
        path.starts_with(&config.build.partials)
    }

    /// Output path of a view: `<output>/<relative path>.html`.
    ///
    /// Only the last extension is swapped: `a.b.hbs` → `a.b.html`.
    pub fn output_path(config: &SiteConfig, view: &Path) -> PathBuf {
        let relative = view
            .strip_prefix(&config.build.templates)
            .unwrap_or(view);
        config.build.output.join(relative).with_extension("html")
    }

    /// Partial name: path relative to the partials directory, no extension.
    ///
    /// `partials/header.hbs` → `header`, `partials/nav/top.hbs` → `nav/top`
    pub fn partial_name(partials: &Path, path: &Path) -> String {
        let relative = path.strip_prefix(partials).unwrap_or(path);
        relative
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Load the shared data context.
    ///
    /// A missing file renders against an empty object.
    fn load_data(&mut self, path: &Path) -> Result<(), StageError> {
        self.data = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| StageError::Data {
                path: path.to_path_buf(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                crate::log!("template"; "data file {} not found, rendering with empty data", path.display());
                Value::Object(Default::default())
            }
            Err(err) => return Err(StageError::io(path, err)),
        };
        Ok(())
    }

    /// Re-read every partial, replacing any previous binding of its name.
    fn register_partials(&mut self, dir: &Path, report: &mut StageReport) {
        for path in collect_files_with_ext(dir, TEMPLATE_EXT) {
            let name = Self::partial_name(dir, &path);
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(err) => {
                    report.failures.push(StageError::io(&path, err));
                    continue;
                }
            };

            self.registry.unregister_template(&name);
            if let Err(err) = self.registry.register_partial(&name, source) {
                report
                    .failures
                    .push(StageError::compile(StageKind::Template, &path, err.to_string()));
            } else {
                crate::debug!("template"; "registered partial {}", name);
            }
        }
    }

    /// Refresh data and partials for one run.
    fn prepare(&mut self, config: &SiteConfig) -> Result<StageReport, StageError> {
        let mut report = StageReport::new(StageKind::Template);
        self.load_data(&config.build.data)?;
        self.register_partials(&config.build.partials, &mut report);
        Ok(report)
    }

    /// Render one view and write its document.
    fn render_one(&self, config: &SiteConfig, view: &Path) -> Result<PathBuf, StageError> {
        let source = fs::read_to_string(view).map_err(|e| StageError::io(view, e))?;
        let html = self
            .registry
            .render_template(&source, &self.data)
            .map_err(|e| StageError::compile(StageKind::Template, view, e.to_string()))?;

        let output = Self::output_path(config, view);
        write_output(&output, html)?;
        Ok(output)
    }
}

impl Stage for TemplateStage {
    fn kind(&self) -> StageKind {
        StageKind::Template
    }

    fn run(&mut self, ctx: &StageContext<'_>) -> Result<StageReport, StageError> {
        let config = ctx.config;
        let mut report = self.prepare(config)?;

        let views = Self::discover(config);
        let results: Vec<_> = views
            .par_iter()
            .map(|view| self.render_one(config, view))
            .collect();

        for result in results {
            match result {
                Ok(path) => report.written.push(path),
                Err(err) => report.failures.push(err),
            }
        }

        Ok(report)
    }

    /// Re-render only the changed view.
    ///
    /// A changed partial is re-registered but dependent views are not
    /// re-rendered until they change themselves.
    fn rebuild(
        &mut self,
        ctx: &StageContext<'_>,
        changed: &Path,
    ) -> Result<StageReport, StageError> {
        let config = ctx.config;
        let mut report = self.prepare(config)?;

        if Self::is_partial(config, changed) {
            crate::debug!("template"; "partial {} changed, views keep their output", changed.display());
            return Ok(report);
        }

        if !changed.exists() {
            return Ok(report);
        }

        match self.render_one(config, changed) {
            Ok(path) => report.written.push(path),
            Err(err) => report.failures.push(err),
        }
        Ok(report)
    }
}
