//! Asset stage: static files copied into the output tree, images shrunk.
//!
//! - `public/` → `<output>/`
//! - `assets/` → `<output>/assets/`, then every PNG/JPEG re-encoded in place
//!   when that makes it smaller
//!
//! The production-only dependency copy lives in [`deps`].

mod copy;
pub mod deps;
mod shrink;

use rayon::prelude::*;

use crate::compiler::{Stage, StageContext, StageError, StageKind, StageReport};
use crate::logger::ProgressLine;

pub use copy::copy_tree;
pub use shrink::{Shrink, is_shrinkable, shrink_image};

#[derive(Debug, Default)]
pub struct AssetStage;

impl Stage for AssetStage {
    fn kind(&self) -> StageKind {
        StageKind::Asset
    }

    fn run(&mut self, ctx: &StageContext<'_>) -> Result<StageReport, StageError> {
        let config = ctx.config;
        let mut report = StageReport::new(StageKind::Asset);

        let (written, failures) = copy_tree(&config.build.public, &config.build.output);
        report.written.extend(written);
        report.failures.extend(failures);

        let assets_out = config.build.output.join("assets");
        let (written, failures) = copy_tree(&config.build.assets, &assets_out);
        report.failures.extend(failures);

        let images: Vec<_> = written
            .iter()
            .filter(|path| is_shrinkable(path))
            .filter_map(|dest| {
                let relative = dest.strip_prefix(&assets_out).ok()?;
                Some((config.build.assets.join(relative), dest.clone()))
            })
            .collect();
        report.written.extend(written);

        if images.is_empty() {
            return Ok(report);
        }

        let progress = ProgressLine::new("assets", "shrink", images.len());
        let results: Vec<_> = images
            .par_iter()
            .map(|(src, dest)| {
                let result = shrink_image(src, dest);
                progress.inc();
                (dest, result)
            })
            .collect();
        progress.finish();

        let mut saved = 0;
        for (dest, result) in results {
            match result {
                Ok(Shrink::Smaller { before, after }) => {
                    saved += before - after;
                    crate::debug!("assets"; "shrunk {} ({} -> {} bytes)", config.root_relative(dest).display(), before, after);
                }
                Ok(Shrink::Kept) => {}
                // the unshrunk copy is already in place
                Err(err) => report.warnings.push(err),
            }
        }

        if saved > 0 {
            crate::log!("assets"; "images shrunk, saved {} KiB", saved / 1024);
        }

        Ok(report)
    }
}
