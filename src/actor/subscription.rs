//! Watch subscriptions: which stage a changed source belongs to.
//!
//! The table is built once from the configured source directories:
//!
//! | Pattern            | Stage      | Scope         |
//! |--------------------|------------|---------------|
//! | `views/**/*.hbs`   | template   | single file   |
//! | `styles/**/*.scss` | style      | whole stage   |
//! | `js/**/*.js`       | script     | whole stage   |
//!
//! Patterns are matched against paths relative to the project root.
//! The first matching subscription wins.

use std::fmt;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::compiler::StageKind;
use crate::config::SiteConfig;
use crate::utils::path::relative_slash;

/// How much of a stage a change invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchScope {
    /// Rebuild everything the stage produces
    WholeStage,
    /// Rebuild only the output of the changed file
    SingleFile,
}

impl WatchScope {
    /// Templates render one document per source; styles and scripts
    /// aggregate every fragment into a single output.
    pub const fn for_stage(stage: StageKind) -> Self {
        match stage {
            StageKind::Template => Self::SingleFile,
            _ => Self::WholeStage,
        }
    }
}

/// One pattern → stage binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSubscription {
    pub pattern: String,
    pub stage: StageKind,
    pub scope: WatchScope,
}

/// Compiled subscriptions for one project root.
#[derive(Clone)]
pub struct SubscriptionTable {
    subscriptions: Vec<WatchSubscription>,
    set: GlobSet,
}

impl fmt::Debug for SubscriptionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionTable")
            .field("subscriptions", &self.subscriptions)
            .finish_non_exhaustive()
    }
}

impl SubscriptionTable {
    pub fn new(subscriptions: Vec<WatchSubscription>) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for subscription in &subscriptions {
            builder.add(Glob::new(&subscription.pattern)?);
        }
        Ok(Self {
            subscriptions,
            set: builder.build()?,
        })
    }

    /// Subscriptions for the configured source directories.
    pub fn from_config(config: &SiteConfig) -> Result<Self, globset::Error> {
        let subscriptions = config
            .source_roots()
            .into_iter()
            .map(|(stage, pattern)| WatchSubscription {
                pattern,
                stage,
                scope: WatchScope::for_stage(stage),
            })
            .collect();
        Self::new(subscriptions)
    }

    pub fn subscriptions(&self) -> &[WatchSubscription] {
        &self.subscriptions
    }

    /// Find the subscription for a root-relative path like `styles/view_a.scss`.
    pub fn lookup(&self, rel_path: &str) -> Option<&WatchSubscription> {
        self.set
            .matches(rel_path)
            .into_iter()
            .min()
            .map(|index| &self.subscriptions[index])
    }

    /// Find the subscription for an absolute path under `root`.
    pub fn route(&self, root: &Path, path: &Path) -> Option<&WatchSubscription> {
        let rel = relative_slash(root, path)?;
        self.lookup(&rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn table() -> SubscriptionTable {
        let config = SiteConfig::for_root(Path::new("/site"));
        SubscriptionTable::from_config(&config).unwrap()
    }

    #[test]
    fn test_default_subscriptions() {
        let table = table();
        let patterns: Vec<_> = table
            .subscriptions()
            .iter()
            .map(|s| s.pattern.as_str())
            .collect();
        assert_eq!(patterns, ["views/**/*.hbs", "styles/**/*.scss", "js/**/*.js"]);
    }

    #[test]
    fn test_template_change_is_single_file() {
        let table = table();
        let sub = table.lookup("views/about.hbs").unwrap();
        assert_eq!(sub.stage, StageKind::Template);
        assert_eq!(sub.scope, WatchScope::SingleFile);

        let nested = table.lookup("views/partials/nav.hbs").unwrap();
        assert_eq!(nested.stage, StageKind::Template);
    }

    #[test]
    fn test_style_and_script_rebuild_whole_stage() {
        let table = table();
        let style = table.lookup("styles/view_about.scss").unwrap();
        assert_eq!(style.stage, StageKind::Style);
        assert_eq!(style.scope, WatchScope::WholeStage);

        let script = table.lookup("js/lib/util.js").unwrap();
        assert_eq!(script.stage, StageKind::Script);
        assert_eq!(script.scope, WatchScope::WholeStage);
    }

    #[test]
    fn test_unsubscribed_paths() {
        let table = table();
        assert!(table.lookup("views/notes.txt").is_none());
        assert!(table.lookup("target/index.html").is_none());
        assert!(table.lookup("README.md").is_none());
    }

    #[test]
    fn test_route_absolute() {
        let table = table();
        let root = PathBuf::from("/site");
        let sub = table.route(&root, &root.join("styles/entry.scss")).unwrap();
        assert_eq!(sub.stage, StageKind::Style);
        assert!(table.route(&root, Path::new("/other/styles/entry.scss")).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let table = SubscriptionTable::new(vec![
            WatchSubscription {
                pattern: "src/**/*.js".into(),
                stage: StageKind::Script,
                scope: WatchScope::WholeStage,
            },
            WatchSubscription {
                pattern: "src/**/*".into(),
                stage: StageKind::Template,
                scope: WatchScope::SingleFile,
            },
        ])
        .unwrap();
        assert_eq!(table.lookup("src/a.js").unwrap().stage, StageKind::Script);
        assert_eq!(table.lookup("src/a.hbs").unwrap().stage, StageKind::Template);
    }
}
