/// Audit-trail seam used to attribute structural changes.
pub mod audit;
/// Protected action categories.
pub mod category;
/// Engine tuning.
pub mod config;
/// Message content checks.
pub mod content;
/// Tumbling-window counter shared by both detectors.
pub mod counter;
/// Emoji/sticker list diffing.
pub mod inventory;
/// Guild policy model and the configuration read seam.
pub mod policy;
/// Remediation seam implemented by the platform client.
pub mod remediation;
/// Structural change detection.
pub mod structural;
/// Detector results.
pub mod verdict;

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

pub use audit::{AuditEntry, AuditKind, AuditTrail};
pub use category::{Category, CategoryParseError};
pub use config::GuardConfig;
pub use content::{ContentGuard, MessageEvent};
pub use counter::{ActionKey, Breach, WindowCounter};
pub use inventory::{AssetDiff, AssetInventory, AssetKind};
pub use policy::{GuildPolicy, PolicySource, Protection};
pub use remediation::{RemediationError, RemediationOutcome, Remediator, Reversal, Sanction};
pub use structural::{StructuralChange, StructuralEvent, StructuralGuard};
pub use verdict::{Skip, Verdict};

/// Both detectors wired to the same policy source and remediator.
pub struct Guard {
    config: GuardConfig,
    structural: StructuralGuard,
    content: ContentGuard,
}

impl Guard {
    pub fn new(
        config: GuardConfig,
        policies: Arc<dyn PolicySource>,
        audit: Arc<dyn AuditTrail>,
        remediator: Arc<dyn Remediator>,
    ) -> Self {
        let structural = StructuralGuard::new(
            policies.clone(),
            audit,
            remediator.clone(),
            config.structural_window,
        );
        let content = ContentGuard::new(
            policies,
            remediator,
            config.spam_window,
            config.spam_timeout,
        );

        Self {
            config,
            structural,
            content,
        }
    }

    /// Skip structural changes performed by the engine's own account.
    pub fn ignoring_actor(mut self, actor_id: u64) -> Self {
        self.structural = self.structural.ignoring_actor(actor_id);
        self
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub async fn on_structural(&self, event: StructuralEvent) -> Verdict {
        self.structural.handle(event).await
    }

    pub async fn on_message(&self, message: &MessageEvent) -> Verdict {
        self.content.handle(message).await
    }

    /// Start background sweeps of both counters.
    pub fn spawn_sweepers(&self) -> [JoinHandle<()>; 2] {
        let every = self.config.sweep_interval;
        [
            self.structural.counter().spawn_sweeper(every),
            self.content.counter().spawn_sweeper(every),
        ]
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("config", &self.config)
            .field("structural_windows", &self.structural.counter().len())
            .field("message_windows", &self.content.counter().len())
            .finish_non_exhaustive()
    }
}
