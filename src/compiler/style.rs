//! Style stage: one SCSS entry compiled into one prefixed, minified stylesheet.
//!
//! `styles/entry.scss` imports every page fragment, so the whole stage is
//! rebuilt on any style change.

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::Targets;
use parcel_sourcemap::SourceMap;
use regex::Regex;

use super::{Stage, StageContext, StageError, StageKind, StageReport, write_output};
use crate::config::SiteConfig;

/// A vendor-prefixed declaration name in property position.
static PREFIXED_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(^|[{;])([ \t]*)-(webkit|moz|ms|o)-([A-Za-z][A-Za-z-]*)([ \t]*):").unwrap()
});

/// Prefixed declarations are parked under this custom property name while
/// lightningcss runs, so its prefix merging cannot drop them.
const KEEP_MARK: &str = "--pagesmith-keep-";

/// Hide prefixed declarations already written in the source.
fn protect_prefixes(css: &str) -> Cow<'_, str> {
    PREFIXED_PROPERTY.replace_all(css, format!("${{1}}${{2}}{KEEP_MARK}${{3}}-${{4}}${{5}}:"))
}

fn restore_prefixes(css: &str) -> String {
    css.replace(KEEP_MARK, "-")
}

/// Compiled stylesheet plus its optional source map.
#[derive(Debug)]
pub struct CompiledStyle {
    pub css: String,
    pub map: Option<String>,
}

#[derive(Debug, Default)]
pub struct StyleStage;

impl StyleStage {
    /// Compile the SCSS entry. The styles directory is the load path.
    fn compile_scss(config: &SiteConfig, entry: &Path) -> Result<String, StageError> {
        let options = grass::Options::default().load_path(&config.build.styles);
        grass::from_path(entry, &options)
            .map_err(|e| StageError::compile(StageKind::Style, entry, e.to_string()))
    }

    /// Prefix for the configured browsers, then minify.
    ///
    /// Prefixes the source already carries are kept even when no target
    /// needs them.
    pub fn process(
        css: &str,
        filename: &str,
        targets: Targets,
        source_map: bool,
    ) -> Result<CompiledStyle, String> {
        let protected = protect_prefixes(css);
        let mut stylesheet = StyleSheet::parse(
            &protected,
            ParserOptions {
                filename: filename.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        stylesheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| e.to_string())?;

        let mut map = if source_map {
            let mut map = SourceMap::new("/");
            let index = map.add_source(filename);
            map.set_source_content(index as usize, css)
                .map_err(|e| e.to_string())?;
            Some(map)
        } else {
            None
        };

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                source_map: map.as_mut(),
                targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| e.to_string())?;

        let map = match map.as_mut() {
            Some(map) => Some(map.to_json(None).map_err(|e| e.to_string())?),
            None => None,
        };

        Ok(CompiledStyle {
            css: restore_prefixes(&result.code),
            map,
        })
    }

    fn targets(config: &SiteConfig) -> Targets {
        config
            .style
            .browsers()
            .map(Targets::from)
            .unwrap_or_default()
    }
}

impl Stage for StyleStage {
    fn kind(&self) -> StageKind {
        StageKind::Style
    }

    fn run(&mut self, ctx: &StageContext<'_>) -> Result<StageReport, StageError> {
        let config = ctx.config;
        let entry = config.style_entry();
        if !entry.is_file() {
            return Err(StageError::MissingEntry {
                stage: StageKind::Style,
                path: entry,
            });
        }

        let css = Self::compile_scss(config, &entry)?;
        let filename = config.root_relative(&entry).to_string_lossy().replace('\\', "/");
        let compiled = Self::process(&css, &filename, Self::targets(config), ctx.mode.source_maps)
            .map_err(|message| StageError::compile(StageKind::Style, &entry, message))?;

        let output = config.style_output();
        let map_path = output.with_extension("css.map");
        let mut report = StageReport::new(StageKind::Style);

        match compiled.map {
            Some(map) => {
                let map_name = map_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let css = format!("{}\n/*# sourceMappingURL={map_name} */\n", compiled.css);
                write_output(&output, css)?;
                write_output(&map_path, map)?;
                report.written.extend([output, map_path]);
            }
            None => {
                write_output(&output, compiled.css)?;
                if map_path.exists() {
                    fs::remove_file(&map_path).map_err(|e| StageError::io(&map_path, e))?;
                }
                report.written.push(output);
            }
        }

        Ok(report)
    }
}
