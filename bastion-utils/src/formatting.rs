use std::time::Duration;

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Format a duration as its non-zero units, largest first (e.g. `5m`, `1h 30m`).
/// Sub-second precision is dropped.
pub fn format_compact_duration(duration: Duration) -> String {
    let mut remaining = duration.as_secs();
    if remaining == 0 {
        return "0s".to_owned();
    }

    let mut parts = Vec::new();
    for (unit_seconds, suffix) in UNITS {
        let amount = remaining / unit_seconds;
        if amount > 0 {
            parts.push(format!("{amount}{suffix}"));
            remaining %= unit_seconds;
        }
    }

    parts.join(" ")
}

/// `Enabled` / `Disabled` label for status output.
pub fn status_label(enabled: bool) -> &'static str {
    if enabled { "Enabled" } else { "Disabled" }
}
