//! Page scaffolding.
//!
//! Creates the view, style fragment and script fragment of a new page from
//! boilerplates, and registers the fragments in the aggregate entry files.
//!
//! # Module Structure
//!
//! - [`manifest`]: Entry files as append-only reference lists

pub mod manifest;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::SiteConfig;
use crate::embed::Template;
use crate::embed::scaffold::{PAGE_HBS, PAGE_JS, PAGE_SCSS, PageVars};
use crate::log;
use manifest::{EntryManifest, ManifestKind};

/// Scaffolding errors.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("no page name given")]
    MissingName,

    #[error("invalid page name `{0}`: {1}")]
    InvalidName(String, &'static str),

    #[error("`{}` already exists, not overwriting", .0.display())]
    Exists(PathBuf),

    #[error("IO error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScaffoldError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Usage errors abort before any file is touched.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::MissingName | Self::InvalidName(..))
    }
}

/// A validated request to scaffold one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScaffoldRequest {
    page_name: String,
    include_style: bool,
    include_script: bool,
}

impl PageScaffoldRequest {
    /// Validate the page name before anything is written.
    pub fn new(
        page_name: Option<&str>,
        include_style: bool,
        include_script: bool,
    ) -> Result<Self, ScaffoldError> {
        let page_name = page_name.ok_or(ScaffoldError::MissingName)?;
        if page_name.is_empty() {
            return Err(ScaffoldError::MissingName);
        }
        if page_name.trim().is_empty() {
            return Err(ScaffoldError::InvalidName(
                page_name.to_string(),
                "name is only whitespace",
            ));
        }
        if page_name.contains(['/', '\\']) {
            return Err(ScaffoldError::InvalidName(
                page_name.to_string(),
                "name must not contain path separators",
            ));
        }
        if page_name.contains(['\'', '"']) {
            return Err(ScaffoldError::InvalidName(
                page_name.to_string(),
                "name must not contain quotes",
            ));
        }
        if page_name == "." || page_name == ".." {
            return Err(ScaffoldError::InvalidName(
                page_name.to_string(),
                "name must be a file name",
            ));
        }

        Ok(Self {
            page_name: page_name.to_string(),
            include_style,
            include_script,
        })
    }

    pub fn page_name(&self) -> &str {
        &self.page_name
    }
}

/// The three independently scaffolded parts of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Template,
    Style,
    Script,
}

impl Resource {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Template => "view",
            Self::Style => "style",
            Self::Script => "script",
        }
    }
}

/// Result of scaffolding one resource.
#[derive(Debug)]
pub enum Outcome {
    /// File written; `registered` names the entry file it was appended to.
    Created {
        file: PathBuf,
        registered: Option<PathBuf>,
    },
    /// Excluded by the request.
    Skipped,
    Failed(ScaffoldError),
}

/// Per-resource outcomes of one request.
#[derive(Debug, Default)]
pub struct ScaffoldReport {
    pub outcomes: Vec<(Resource, Outcome)>,
}

impl ScaffoldReport {
    pub fn outcome(&self, resource: Resource) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(r, _)| *r == resource)
            .map(|(_, outcome)| outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = (Resource, &ScaffoldError)> {
        self.outcomes.iter().filter_map(|(resource, outcome)| match outcome {
            Outcome::Failed(err) => Some((*resource, err)),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Print one line per resource.
    pub fn log(&self, config: &SiteConfig) {
        for (resource, outcome) in &self.outcomes {
            match outcome {
                Outcome::Created { file, registered } => {
                    let file = config.root_relative(file);
                    match registered {
                        Some(entry) => log!(
                            "generate";
                            "{} {} (registered in {})",
                            resource.name(),
                            file.display(),
                            config.root_relative(entry).display()
                        ),
                        None => log!("generate"; "{} {}", resource.name(), file.display()),
                    }
                }
                Outcome::Skipped => log!("skip"; "{} not generated", resource.name()),
                Outcome::Failed(err) => log!("error"; "{}: {}", resource.name(), err),
            }
        }
    }
}

/// Generates page sources from boilerplates.
pub struct Scaffolder<'a> {
    config: &'a SiteConfig,
}

impl<'a> Scaffolder<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self { config }
    }

    /// Scaffold every requested resource; each is an independent attempt.
    pub fn scaffold(&self, request: &PageScaffoldRequest) -> ScaffoldReport {
        let build = &self.config.build;
        let name = request.page_name();
        let mut report = ScaffoldReport::default();

        let view = build.templates.join(format!("{name}.hbs"));
        let outcome = match self.create(&view, "template.hbs", &PAGE_HBS, name) {
            Ok(()) => Outcome::Created {
                file: view,
                registered: None,
            },
            Err(err) => Outcome::Failed(err),
        };
        report.outcomes.push((Resource::Template, outcome));

        let style = if request.include_style {
            let manifest = EntryManifest::new(self.config.style_entry(), ManifestKind::Style);
            self.fragment(&build.styles, &manifest, "template.scss", &PAGE_SCSS, name)
        } else {
            Outcome::Skipped
        };
        report.outcomes.push((Resource::Style, style));

        let script = if request.include_script {
            let manifest = EntryManifest::new(self.config.script_entry(), ManifestKind::Script);
            self.fragment(&build.scripts, &manifest, "template.js", &PAGE_JS, name)
        } else {
            Outcome::Skipped
        };
        report.outcomes.push((Resource::Script, script));

        report
    }

    /// Create a fragment, then register it in its entry manifest.
    fn fragment(
        &self,
        dir: &Path,
        manifest: &EntryManifest,
        boilerplate: &str,
        builtin: &Template<PageVars>,
        name: &str,
    ) -> Outcome {
        let kind = manifest.kind();
        let file = dir.join(kind.fragment_file(name));
        if let Err(err) = self.create(&file, boilerplate, builtin, name) {
            return Outcome::Failed(err);
        }

        match manifest.append(&kind.reference(name)) {
            Ok(_) => Outcome::Created {
                file,
                registered: Some(manifest.path().to_path_buf()),
            },
            Err(err) => Outcome::Failed(ScaffoldError::io(manifest.path(), err)),
        }
    }

    /// Render the boilerplate and write it to a new file.
    fn create(
        &self,
        target: &Path,
        boilerplate: &str,
        builtin: &Template<PageVars>,
        name: &str,
    ) -> Result<(), ScaffoldError> {
        let template = self.boilerplate(boilerplate, builtin)?;
        let content = template.render(&PageVars::new(name));

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| ScaffoldError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(target)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => ScaffoldError::Exists(target.to_path_buf()),
                _ => ScaffoldError::io(target, e),
            })?;
        file.write_all(content.as_bytes())
            .map_err(|e| ScaffoldError::io(target, e))
    }

    /// User boilerplate from the scaffold directory, else the built-in one.
    fn boilerplate(
        &self,
        file_name: &str,
        builtin: &Template<PageVars>,
    ) -> Result<Template<PageVars>, ScaffoldError> {
        let path = self.config.scaffold.boilerplate.join(file_name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Template::owned(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(builtin.clone()),
            Err(err) => Err(ScaffoldError::io(&path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::for_root(dir.path());
        fs::create_dir_all(&config.build.styles).unwrap();
        fs::create_dir_all(&config.build.scripts).unwrap();
        fs::write(config.style_entry(), "@import \"base.scss\";\n").unwrap();
        fs::write(config.script_entry(), "require('./base.js');\n").unwrap();
        (dir, config)
    }

    #[test]
    fn test_request_validation() {
        assert!(matches!(
            PageScaffoldRequest::new(None, true, true),
            Err(ScaffoldError::MissingName)
        ));
        assert!(matches!(
            PageScaffoldRequest::new(Some(""), true, true),
            Err(ScaffoldError::MissingName)
        ));
        for bad in ["  ", "a/b", "..\\x", "..", "it's", "say\"hi"] {
            let err = PageScaffoldRequest::new(Some(bad), true, true).unwrap_err();
            assert!(err.is_usage(), "{bad}");
        }
        let ok = PageScaffoldRequest::new(Some("lol"), false, true).unwrap();
        assert_eq!(ok.page_name(), "lol");
    }

    #[test]
    fn test_scaffold_full_page() {
        let (_dir, config) = site();
        let request = PageScaffoldRequest::new(Some("lol"), true, true).unwrap();
        let report = Scaffolder::new(&config).scaffold(&request);

        assert!(report.is_success());
        let build = &config.build;
        let view = fs::read_to_string(build.templates.join("lol.hbs")).unwrap();
        let style = fs::read_to_string(build.styles.join("view_lol.scss")).unwrap();
        let script = fs::read_to_string(build.scripts.join("view_lol.js")).unwrap();
        for content in [&view, &style, &script] {
            assert!(content.contains("lol"));
            assert!(!content.contains("NEW_PAGE_TITLE"));
        }

        let entry = fs::read_to_string(config.style_entry()).unwrap();
        assert!(entry.ends_with("@import \"view_lol.scss\";\n"));
        assert_eq!(entry.matches("view_lol.scss").count(), 1);
        let entry = fs::read_to_string(config.script_entry()).unwrap();
        assert!(entry.ends_with("require('./view_lol.js');\n"));
        assert_eq!(entry.matches("view_lol.js").count(), 1);
    }

    #[test]
    fn test_skip_style_leaves_manifest_untouched() {
        let (_dir, config) = site();
        let before = fs::read(config.style_entry()).unwrap();

        let request = PageScaffoldRequest::new(Some("lol"), false, true).unwrap();
        let report = Scaffolder::new(&config).scaffold(&request);

        assert!(matches!(report.outcome(Resource::Style), Some(Outcome::Skipped)));
        assert!(!config.build.styles.join("view_lol.scss").exists());
        assert_eq!(fs::read(config.style_entry()).unwrap(), before);
        assert!(config.build.scripts.join("view_lol.js").exists());
    }

    #[test]
    fn test_skip_script_leaves_manifest_untouched() {
        let (_dir, config) = site();
        let before = fs::read(config.script_entry()).unwrap();

        let request = PageScaffoldRequest::new(Some("lol"), true, false).unwrap();
        let report = Scaffolder::new(&config).scaffold(&request);

        assert!(matches!(report.outcome(Resource::Script), Some(Outcome::Skipped)));
        assert!(!config.build.scripts.join("view_lol.js").exists());
        assert_eq!(fs::read(config.script_entry()).unwrap(), before);
    }

    #[test]
    fn test_user_boilerplate_wins() {
        let (_dir, config) = site();
        fs::create_dir_all(&config.scaffold.boilerplate).unwrap();
        fs::write(
            config.scaffold.boilerplate.join("template.hbs"),
            "<main class=\"NEW_PAGE_TITLE\">NEW_PAGE_TITLE</main>",
        )
        .unwrap();

        let request = PageScaffoldRequest::new(Some("lol"), false, false).unwrap();
        Scaffolder::new(&config).scaffold(&request);

        assert_eq!(
            fs::read_to_string(config.build.templates.join("lol.hbs")).unwrap(),
            "<main class=\"lol\">lol</main>"
        );
    }

    #[test]
    fn test_existing_fragment_not_overwritten() {
        let (_dir, config) = site();
        let fragment = config.build.styles.join("view_lol.scss");
        fs::write(&fragment, "keep me").unwrap();
        let before = fs::read(config.style_entry()).unwrap();

        let request = PageScaffoldRequest::new(Some("lol"), true, true).unwrap();
        let report = Scaffolder::new(&config).scaffold(&request);

        assert!(!report.is_success());
        assert!(matches!(
            report.outcome(Resource::Style),
            Some(Outcome::Failed(ScaffoldError::Exists(_)))
        ));
        assert_eq!(fs::read_to_string(&fragment).unwrap(), "keep me");
        assert_eq!(fs::read(config.style_entry()).unwrap(), before);
        // The other resources are independent attempts
        assert!(config.build.templates.join("lol.hbs").exists());
        assert!(config.build.scripts.join("view_lol.js").exists());
    }

    #[test]
    fn test_two_pages_append_in_order() {
        let (_dir, config) = site();
        let scaffolder = Scaffolder::new(&config);
        for name in ["first", "second"] {
            let request = PageScaffoldRequest::new(Some(name), true, true).unwrap();
            assert!(scaffolder.scaffold(&request).is_success());
        }

        let manifest = EntryManifest::new(config.script_entry(), ManifestKind::Script);
        assert_eq!(
            manifest.read().unwrap(),
            vec!["./base.js", "./view_first.js", "./view_second.js"]
        );
    }
}
