//! Build mode configuration for production/development builds.

use std::fmt;

/// Build mode configuration.
///
/// Fixed for the whole process run; selected from the `--production` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildMode {
    /// Minify the script bundle (stylesheets are always minified).
    pub minify_scripts: bool,

    /// Emit source maps (external for styles, inline for scripts).
    pub source_maps: bool,

    /// Copy runtime dependencies into the output tree.
    pub copy_deps: bool,

    /// Stay resident: dev server, file watching, live reload.
    pub watch: bool,
}

impl BuildMode {
    /// Production mode: optimized output, then exit.
    pub const PRODUCTION: Self = Self {
        minify_scripts: true,
        source_maps: false,
        copy_deps: true,
        watch: false,
    };

    /// Development mode: source maps, dev server and watch loop.
    pub const DEVELOPMENT: Self = Self {
        minify_scripts: false,
        source_maps: true,
        copy_deps: false,
        watch: true,
    };

    /// Select the mode from the single `--production` flag.
    pub const fn from_flag(production: bool) -> Self {
        if production {
            Self::PRODUCTION
        } else {
            Self::DEVELOPMENT
        }
    }

    #[inline]
    pub const fn is_production(&self) -> bool {
        !self.watch
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_production() {
            "production"
        } else {
            "development"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flag() {
        assert_eq!(BuildMode::from_flag(true), BuildMode::PRODUCTION);
        assert_eq!(BuildMode::from_flag(false), BuildMode::DEVELOPMENT);
    }

    #[test]
    fn test_production_never_watches() {
        let mode = BuildMode::PRODUCTION;
        assert!(mode.is_production());
        assert!(!mode.watch);
        assert!(!mode.source_maps);
        assert!(mode.copy_deps);
    }

    #[test]
    fn test_display() {
        assert_eq!(BuildMode::DEVELOPMENT.to_string(), "development");
        assert_eq!(BuildMode::PRODUCTION.to_string(), "production");
    }
}
