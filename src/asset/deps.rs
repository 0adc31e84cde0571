//! Runtime dependency copy (production only).
//!
//! Every package listed under `dependencies` in `package.json` is copied
//! from `node_modules/<name>` to `<output>/node_modules/<name>`.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Map;

use super::copy::copy_tree;
use crate::compiler::{StageError, StageKind, StageReport};
use crate::config::SiteConfig;

#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    dependencies: Map<String, serde_json::Value>,
}

/// Names under `dependencies`, in manifest order. A missing manifest has none.
pub fn dependency_names(package: &Path) -> Result<Vec<String>, StageError> {
    let content = match fs::read_to_string(package) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(StageError::io(package, err)),
    };

    let manifest: PackageManifest =
        serde_json::from_str(&content).map_err(|source| StageError::Data {
            path: package.to_path_buf(),
            source,
        })?;
    Ok(manifest.dependencies.keys().cloned().collect())
}

/// Copy every runtime dependency into the output tree.
///
/// A package missing from `node_modules` is logged and skipped.
pub fn copy_dependencies(config: &SiteConfig) -> Result<StageReport, StageError> {
    let mut report = StageReport::new(StageKind::Asset);
    let dest_root = config.build.output.join("node_modules");

    for name in dependency_names(&config.build.package)? {
        let src = config.build.node_modules.join(&name);
        if !src.is_dir() {
            crate::log!("deps"; "{} is not installed, skipping", name);
            continue;
        }

        let (written, failures) = copy_tree(&src, &dest_root.join(&name));
        crate::debug!("deps"; "{}: {} files", name, written.len());
        report.written.extend(written);
        report.failures.extend(failures);
    }

    Ok(report)
}
