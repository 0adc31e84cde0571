//! `build` command: the orchestrator.
//!
//! - **production**: every stage once, then the dependency copy, then exit
//! - **development**: every stage once, then the dev server, file watching
//!   and live reload until Ctrl+C

use std::sync::Arc;

use anyhow::{Result, bail};

use crate::asset::{AssetStage, deps::copy_dependencies};
use crate::cli::BuildArgs;
use crate::compiler::{
    ScriptStage, Stage, StageContext, StageError, StageReport, StyleStage, TemplateStage,
};
use crate::config::SiteConfig;
use crate::core::BuildMode;
use crate::log;

pub type StageResult = Result<StageReport, StageError>;

/// Entry point of `pagesmith build`.
pub fn build(args: &BuildArgs, config: &SiteConfig) -> Result<()> {
    let mode = BuildMode::from_flag(args.production);
    let failed = build_site(mode, config);

    if mode.is_production() {
        if failed > 0 {
            bail!("build finished with {} failed stage(s)", failed);
        }
        return Ok(());
    }

    let server = crate::cli::serve::bind_server(config)?;
    server.run(Arc::new(config.clone()), mode)
}

/// Run every stage once (plus the dependency copy in production) and log
/// the outcome. Returns the number of stages that reported failures.
pub fn build_site(mode: BuildMode, config: &SiteConfig) -> usize {
    log!("build"; "{} build", mode);
    let ctx = StageContext::new(mode, config);

    let mut results = run_stages(&ctx);
    if mode.copy_deps {
        results.push(copy_dependencies(config));
    }

    results.iter().filter(|result| !log_result(result)).count()
}

/// Run all four stages concurrently. Results come back in stage order.
pub fn run_stages(ctx: &StageContext<'_>) -> Vec<StageResult> {
    let mut stages: Vec<Box<dyn Stage>> = vec![
        Box::new(TemplateStage::new()),
        Box::new(StyleStage),
        Box::new(ScriptStage),
        Box::new(AssetStage),
    ];
    let mut results: Vec<Option<StageResult>> = stages.iter().map(|_| None).collect();

    rayon::scope(|s| {
        for (stage, slot) in stages.iter_mut().zip(results.iter_mut()) {
            s.spawn(move |_| *slot = Some(stage.run(ctx)));
        }
    });

    results.into_iter().flatten().collect()
}

/// Log one stage result. Returns `false` when the stage failed.
///
/// A missing entry file only means the project has no sources for that
/// stage, so it is reported as a warning.
fn log_result(result: &StageResult) -> bool {
    match result {
        Ok(report) => {
            let clean = report.is_clean();
            log!(if clean { "build" } else { "error" }; "{}", report.summary());
            for warning in &report.warnings {
                log!("warning"; "{}", warning.detail());
            }
            for failure in &report.failures {
                eprintln!("{}", failure.detail());
            }
            clean
        }
        Err(err @ StageError::MissingEntry { .. }) => {
            log!("warning"; "{}, skipped", err);
            true
        }
        Err(err) => {
            log!("error"; "{}", err.detail());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::StageKind;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::for_root(dir.path());
        let build = &config.build;
        for dir in [&build.templates, &build.styles, &build.scripts, &build.public] {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(build.templates.join("index.hbs"), "<h1>{{title}}</h1>").unwrap();
        fs::create_dir_all(build.data.parent().unwrap()).unwrap();
        fs::write(&build.data, r#"{"title": "Home"}"#).unwrap();
        fs::write(config.style_entry(), "@import \"view_index.scss\";\n").unwrap();
        fs::write(build.styles.join("view_index.scss"), "h1 { color: red; }\n").unwrap();
        fs::write(config.script_entry(), "require('./view_index.js');\n").unwrap();
        fs::write(build.scripts.join("view_index.js"), "module.exports = 1;\n").unwrap();
        fs::write(build.public.join("robots.txt"), "User-agent: *\n").unwrap();
        (dir, config)
    }

    #[test]
    fn test_run_stages_in_stage_order() {
        let (_dir, config) = site();
        let ctx = StageContext::new(BuildMode::PRODUCTION, &config);
        let results = run_stages(&ctx);

        let kinds: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().stage)
            .collect();
        assert_eq!(
            kinds,
            [StageKind::Template, StageKind::Style, StageKind::Script, StageKind::Asset]
        );
    }

    #[test]
    fn test_production_build_layout() {
        let (_dir, config) = site();
        assert_eq!(build_site(BuildMode::PRODUCTION, &config), 0);

        let out = &config.build.output;
        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "<h1>Home</h1>");
        assert!(out.join("css/global.min.css").is_file());
        assert!(!out.join("css/global.min.css.map").exists());
        assert!(out.join("js/bundle.js").is_file());
        assert!(out.join("robots.txt").is_file());
    }

    #[test]
    fn test_development_build_writes_style_map() {
        let (_dir, config) = site();
        assert_eq!(build_site(BuildMode::DEVELOPMENT, &config), 0);
        assert!(config.build.output.join("css/global.min.css.map").is_file());
    }

    #[test]
    fn test_broken_stage_does_not_stop_others() {
        let (_dir, config) = site();
        fs::write(config.build.styles.join("view_index.scss"), "h1 { color: red;\n").unwrap();

        assert_eq!(build_site(BuildMode::PRODUCTION, &config), 1);
        assert!(config.build.output.join("index.html").is_file());
        assert!(config.build.output.join("js/bundle.js").is_file());
        assert!(!config.build.output.join("css/global.min.css").exists());
    }

    #[test]
    fn test_corrupt_image_does_not_fail_build() {
        let (_dir, config) = site();
        let image = config.build.assets.join("img/broken.png");
        fs::create_dir_all(image.parent().unwrap()).unwrap();
        fs::write(&image, "not a png").unwrap();

        assert_eq!(build_site(BuildMode::PRODUCTION, &config), 0);
        assert!(config.build.output.join("assets/img/broken.png").is_file());
    }

    #[test]
    fn test_empty_project_only_warns() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::for_root(dir.path());
        assert_eq!(build_site(BuildMode::PRODUCTION, &config), 0);
    }
}
