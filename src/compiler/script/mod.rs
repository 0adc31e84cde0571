//! Script stage: the entry and everything it `require`s, bundled into one
//! script exposing a single global.
//!
//! - [`bundle`]: module graph + IIFE emission
//! - [`transpile`]: lowering to the configured target, minification, source maps

pub mod bundle;
pub mod transpile;

use super::{Stage, StageContext, StageError, StageKind, StageReport, write_output};
use bundle::Bundle;
use transpile::{Emit, transpile};

#[derive(Debug, Default)]
pub struct ScriptStage;

impl Stage for ScriptStage {
    fn kind(&self) -> StageKind {
        StageKind::Script
    }

    fn run(&mut self, ctx: &StageContext<'_>) -> Result<StageReport, StageError> {
        let config = ctx.config;
        let entry = config.script_entry();
        if !entry.is_file() {
            return Err(StageError::MissingEntry {
                stage: StageKind::Script,
                path: entry,
            });
        }

        let bundle = Bundle::collect(&entry, &config.build.node_modules)?;
        crate::debug!("script"; "bundling {} modules", bundle.modules.len());
        let code = bundle.emit(&config.script.global, config.get_root());

        let output = config.script_output();
        let emit = if ctx.mode.minify_scripts {
            Emit::Minified
        } else {
            Emit::WithSourceMap
        };
        let code = transpile(&code, &output, &config.script.target, emit)
            .map_err(|message| StageError::compile(StageKind::Script, &entry, message))?;

        write_output(&output, code)?;

        let mut report = StageReport::new(StageKind::Script);
        report.written.push(output);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::core::BuildMode;
    use std::fs;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::for_root(dir.path());
        for (name, content) in files {
            let path = config.build.scripts.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        (dir, config)
    }

    #[test]
    fn test_production_bundle_minified() {
        let (_dir, config) = site(&[
            ("entry.js", "require('./view_a.js');\nrequire('./view_b.js');\n"),
            ("view_a.js", "window.order = (window.order || []).concat('a');\n"),
            ("view_b.js", "window.order = (window.order || []).concat('b');\n"),
        ]);
        let ctx = StageContext::new(BuildMode::PRODUCTION, &config);
        let report = ScriptStage.run(&ctx).unwrap();

        assert_eq!(report.written, vec![config.script_output()]);
        let code = fs::read_to_string(config.script_output()).unwrap();
        assert!(!code.contains("sourceMappingURL"));
        assert!(code.contains("nodeModules"));
        let a = code.find("concat(\"a\")").unwrap();
        let b = code.find("concat(\"b\")").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_development_bundle_has_inline_map() {
        let (_dir, config) = site(&[("entry.js", "module.exports = { answer: 42 };\n")]);
        let ctx = StageContext::new(BuildMode::DEVELOPMENT, &config);
        ScriptStage.run(&ctx).unwrap();

        let code = fs::read_to_string(config.script_output()).unwrap();
        assert!(code.contains("sourceMappingURL=data:"));
        assert!(code.contains("answer: 42"));
    }

    #[test]
    fn test_custom_global() {
        let (_dir, mut config) = site(&[("entry.js", "module.exports = 1;\n")]);
        config.script.global = "App".into();
        let ctx = StageContext::new(BuildMode::DEVELOPMENT, &config);
        ScriptStage.run(&ctx).unwrap();

        let code = fs::read_to_string(config.script_output()).unwrap();
        assert!(code.contains("root.App = exported"));
    }

    #[test]
    fn test_syntax_error_keeps_previous_output() {
        let (_dir, config) = site(&[("entry.js", "require('./bad.js');\n"), ("bad.js", "var = ;\n")]);
        write_output(&config.script_output(), "previous").unwrap();

        let ctx = StageContext::new(BuildMode::PRODUCTION, &config);
        let err = ScriptStage.run(&ctx).unwrap_err();
        assert!(matches!(err, StageError::Compile { .. }));
        assert_eq!(fs::read_to_string(config.script_output()).unwrap(), "previous");
    }

    #[test]
    fn test_unresolved_module() {
        let (_dir, config) = site(&[("entry.js", "require('left-pad');\n")]);
        let ctx = StageContext::new(BuildMode::PRODUCTION, &config);
        assert!(matches!(
            ScriptStage.run(&ctx),
            Err(StageError::Unresolved { .. })
        ));
        assert!(!config.script_output().exists());
    }
}
