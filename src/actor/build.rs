//! Build Actor - serial stage rebuilds
//!
//! Requests are handled strictly in arrival order: a rebuild finishes (and
//! writes its outputs) before the next one starts, so two writes to the same
//! output never interleave and the latest edit always wins.
//!
//! The actor owns the watched stages, so the template stage's partial
//! registry lives for the whole session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::messages::BuildMsg;
use super::subscription::WatchScope;
use crate::compiler::{
    ScriptStage, Stage, StageContext, StageError, StageKind, StageReport, StyleStage,
    TemplateStage,
};
use crate::config::SiteConfig;
use crate::core::BuildMode;
use crate::logger::{status_error, status_success};

/// Stages reachable from the subscription table.
#[derive(Default)]
pub struct WatchedStages {
    template: TemplateStage,
    style: StyleStage,
    script: ScriptStage,
}

impl WatchedStages {
    fn get(&mut self, kind: StageKind) -> Option<&mut dyn Stage> {
        match kind {
            StageKind::Template => Some(&mut self.template),
            StageKind::Style => Some(&mut self.style),
            StageKind::Script => Some(&mut self.script),
            StageKind::Asset => None,
        }
    }

    /// Execute one rebuild request.
    pub fn rebuild(
        &mut self,
        ctx: &StageContext<'_>,
        kind: StageKind,
        path: &Path,
        scope: WatchScope,
    ) -> Result<StageReport, StageError> {
        let Some(stage) = self.get(kind) else {
            return Ok(StageReport::new(kind));
        };
        match scope {
            WatchScope::SingleFile => stage.rebuild(ctx, path),
            WatchScope::WholeStage => stage.run(ctx),
        }
    }
}

pub struct BuildActor {
    rx: mpsc::Receiver<BuildMsg>,
    config: Arc<SiteConfig>,
    mode: BuildMode,
    stages: Arc<Mutex<WatchedStages>>,
}

impl BuildActor {
    pub fn new(rx: mpsc::Receiver<BuildMsg>, config: Arc<SiteConfig>, mode: BuildMode) -> Self {
        Self {
            rx,
            config,
            mode,
            stages: Arc::new(Mutex::new(WatchedStages::default())),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                BuildMsg::Rebuild { stage, path, scope } => {
                    self.rebuild(stage, path, scope).await;
                }
                BuildMsg::Shutdown => {
                    crate::debug!("build"; "shutting down");
                    break;
                }
            }
        }
    }

    async fn rebuild(&self, kind: StageKind, path: PathBuf, scope: WatchScope) {
        let label = self.config.root_relative(&path).display().to_string();
        let config = Arc::clone(&self.config);
        let stages = Arc::clone(&self.stages);
        let mode = self.mode;

        let result = tokio::task::spawn_blocking(move || {
            let ctx = StageContext::new(mode, &config);
            stages.lock().rebuild(&ctx, kind, &path, scope)
        })
        .await;

        match result {
            Ok(Ok(report)) if report.is_clean() => {
                status_success(&format!("{label} → {}", report.summary()));
            }
            Ok(Ok(report)) => {
                status_error(&format!("{label} → {}", report.summary()), &report.failure_detail());
            }
            Ok(Err(err)) => {
                status_error(&format!("{label} → {kind} failed"), &err.detail());
            }
            Err(e) => {
                crate::debug!("build"; "spawn_blocking error: {}", e);
            }
        }
    }
}
