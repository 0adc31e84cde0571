//! `generate` command: scaffold a new page.

use anyhow::Result;

use crate::cli::GenerateArgs;
use crate::config::SiteConfig;
use crate::log;
use crate::scaffold::{PageScaffoldRequest, Scaffolder};

const USAGE: &str = "pagesmith generate --page-name <name> [--skip-style] [--skip-script]";

/// Scaffold the page described by `args`.
///
/// Usage errors print guidance and return normally; per-file failures are
/// listed in the report and never abort the other files.
pub fn generate_page(args: &GenerateArgs, config: &SiteConfig) -> Result<()> {
    let request = match PageScaffoldRequest::new(
        args.page_name.as_deref(),
        !args.skip_style,
        !args.skip_script,
    ) {
        Ok(request) => request,
        Err(err) => {
            log!("generate"; "{}", err);
            log!("generate"; "usage: {}", USAGE);
            return Ok(());
        }
    };

    let report = Scaffolder::new(config).scaffold(&request);
    report.log(config);
    Ok(())
}
