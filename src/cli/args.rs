//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// pagesmith: scaffold pages, build once, or watch and serve with live reload
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the working directory (optional)
    #[arg(short = 'C', long, global = true, default_value = "pagesmith.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create the view, style and script files of a new page
    #[command(visible_alias = "g")]
    Generate {
        #[command(flatten)]
        args: GenerateArgs,
    },

    /// Build every stage once; without --production keep serving and watching
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },
}

/// Generate command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Name of the page to create (becomes the file names)
    #[arg(short = 'n', long = "page-name", visible_alias = "pagename")]
    pub page_name: Option<String>,

    /// Do not create a style fragment or touch the style entry
    #[arg(long = "skip-style", visible_aliases = ["skipless", "skip-less"])]
    pub skip_style: bool,

    /// Do not create a script fragment or touch the script entry
    #[arg(long = "skip-script", visible_alias = "skipjs")]
    pub skip_script: bool,
}

/// Build command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Optimized one-shot build: minified script, no source maps, runtime deps copied
    #[arg(short, long)]
    pub production: bool,

    /// Network interface to bind in development (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<std::net::IpAddr>,

    /// Port number the development server listens on
    #[arg(long)]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pagesmith").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_verbose_keeps_version_flag() {
        assert!(parse(&["-v", "build"]).verbose);
        let err = Cli::try_parse_from(["pagesmith", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_generate_flags() {
        let cli = parse(&["generate", "--page-name", "lol", "--skip-style"]);
        let Commands::Generate { args } = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.page_name.as_deref(), Some("lol"));
        assert!(args.skip_style);
        assert!(!args.skip_script);
    }

    #[test]
    fn test_generate_legacy_aliases() {
        let cli = parse(&["generate", "--pagename", "lol", "--skipless", "--skipjs"]);
        let Commands::Generate { args } = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.page_name.as_deref(), Some("lol"));
        assert!(args.skip_style);
        assert!(args.skip_script);

        let cli = parse(&["generate", "--skip-less"]);
        let Commands::Generate { args } = cli.command else {
            panic!("expected generate");
        };
        assert!(args.page_name.is_none());
        assert!(args.skip_style);
    }

    #[test]
    fn test_build_defaults_to_development() {
        let cli = parse(&["build"]);
        let Commands::Build { args } = cli.command else {
            panic!("expected build");
        };
        assert!(!args.production);
        assert_eq!(cli.config, PathBuf::from("pagesmith.toml"));
    }

    #[test]
    fn test_build_production_with_globals() {
        let cli = parse(&["--verbose", "build", "--production", "--port", "8080"]);
        assert!(cli.verbose);
        let Commands::Build { args } = cli.command else {
            panic!("expected build");
        };
        assert!(args.production);
        assert_eq!(args.port, Some(8080));
    }
}
