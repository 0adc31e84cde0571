//! FileSystem Actor
//!
//! Watches source directories and the output directory.
//!
//! ```text
//! notify → std mpsc → bridge thread → tokio channel → EventRouter
//!                                                      ├─ source change → BuildMsg::Rebuild
//!                                                      └─ output change → WsMsg::Reload
//! ```
//!
//! There is no debounce: every relevant event is forwarded as it arrives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::messages::{BuildMsg, WsMsg};
use super::subscription::{SubscriptionTable, WatchScope};
use crate::compiler::StageKind;
use crate::config::SiteConfig;
use crate::utils::path::normalize_path;

/// Check if path is a temporary/backup file that should be ignored
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// What a single changed path means for the dev loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Rebuild(BuildRequest),
    Reload(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub stage: StageKind,
    pub path: PathBuf,
    pub scope: WatchScope,
}

/// Pure classification of notify events.
pub struct EventRouter {
    root: PathBuf,
    output: PathBuf,
    ignored: Vec<String>,
    table: SubscriptionTable,
}

impl EventRouter {
    pub fn new(config: &SiteConfig) -> Result<Self, globset::Error> {
        Ok(Self {
            root: config.get_root().to_path_buf(),
            output: config.build.output.clone(),
            ignored: config.serve.ignored.clone(),
            table: SubscriptionTable::from_config(config)?,
        })
    }

    /// Route every path of one notify event.
    pub fn route(&self, event: &notify::Event) -> Vec<Routed> {
        let (is_source_change, is_output_change) = match event.kind {
            EventKind::Create(_) => (true, true),
            // Metadata-only changes (mtime/chmod) would loop on our own writes
            EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
            EventKind::Modify(_) => (true, true),
            EventKind::Remove(_) => (true, false),
            _ => return Vec::new(),
        };

        let mut routed = Vec::new();
        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }

            if path.starts_with(&self.output) {
                if is_output_change && !self.is_ignored_output(path) {
                    routed.push(Routed::Reload(path.clone()));
                }
                continue;
            }

            if !is_source_change {
                continue;
            }
            if let Some(sub) = self.table.route(&self.root, path) {
                routed.push(Routed::Rebuild(BuildRequest {
                    stage: sub.stage,
                    path: path.clone(),
                    scope: sub.scope,
                }));
            }
        }
        routed
    }

    /// Output paths under an ignored directory name never trigger a reload.
    fn is_ignored_output(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.output) else {
            return false;
        };
        relative.components().any(|c| {
            let name = c.as_os_str().to_string_lossy();
            self.ignored.iter().any(|ignored| *ignored == name)
        })
    }

    /// Directories to watch recursively.
    fn watch_paths(config: &SiteConfig) -> Vec<PathBuf> {
        let build = &config.build;
        let mut paths = Vec::new();
        for dir in [&build.templates, &build.styles, &build.scripts, &build.output] {
            let dir = normalize_path(dir);
            // Nested source dirs (partials inside templates) are covered by the parent
            if !paths.iter().any(|p: &PathBuf| dir.starts_with(p)) {
                paths.push(dir);
            }
        }
        paths
    }
}

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    build_tx: mpsc::Sender<BuildMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    router: EventRouter,
}

impl FsActor {
    /// Create the watcher and attach every existing watch root.
    ///
    /// Events start buffering immediately, before the actor runs.
    pub fn new(
        config: Arc<SiteConfig>,
        build_tx: mpsc::Sender<BuildMsg>,
        ws_tx: mpsc::Sender<WsMsg>,
    ) -> anyhow::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        // Output may not exist on a fresh project with no sources
        let _ = std::fs::create_dir_all(&config.build.output);

        for path in EventRouter::watch_paths(&config) {
            if !path.exists() {
                crate::debug!("watch"; "skipping missing {}", path.display());
                continue;
            }
            watcher.watch(&path, RecursiveMode::Recursive)?;
            crate::debug!("watch"; "watching {}", path.display());
        }

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            build_tx,
            ws_tx,
            router: EventRouter::new(&config)?,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        while let Some(event) = async_rx.recv().await {
            for routed in self.router.route(&event) {
                let sent = match routed {
                    Routed::Rebuild(BuildRequest { stage, path, scope }) => {
                        crate::debug!("watch"; "{} changed: {}", stage, path.display());
                        self.build_tx
                            .send(BuildMsg::Rebuild { stage, path, scope })
                            .await
                            .is_ok()
                    }
                    Routed::Reload(path) => {
                        let reason = format!("{} updated", path.display());
                        self.ws_tx.send(WsMsg::Reload { reason }).await.is_ok()
                    }
                };
                if !sent {
                    return;
                }
            }
        }
    }
}
