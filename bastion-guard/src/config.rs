use std::time::Duration;

pub const DEFAULT_STRUCTURAL_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_SPAM_WINDOW: Duration = Duration::from_secs(5);
pub const DEFAULT_SPAM_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Engine tuning supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuardConfig {
    /// Window for role/channel/emoji/sticker/ban/kick/settings actions.
    pub structural_window: Duration,
    /// Window for the per-author message counter.
    pub spam_window: Duration,
    /// How long a spammer is timed out.
    pub spam_timeout: Duration,
    /// Interval of the background sweep over closed windows.
    pub sweep_interval: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            structural_window: DEFAULT_STRUCTURAL_WINDOW,
            spam_window: DEFAULT_SPAM_WINDOW,
            spam_timeout: DEFAULT_SPAM_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}
