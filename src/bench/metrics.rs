use std::time::Duration;

/// Rough token count: one token per four bytes of text.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

/// Estimated output tokens per second over `duration`.
///
/// Durations under one millisecond yield `0.0`.
pub fn tokens_per_second(duration: Duration, text: &str) -> f64 {
    let millis = duration.as_millis();
    if millis == 0 {
        return 0.0;
    }
    1000.0 * estimate_tokens(text) as f64 / millis as f64
}

/// Formats a duration as `"1m 23.456s"` or `"23.456s"`.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    let total_seconds = millis / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let remaining_ms = millis % 1000;
    if minutes > 0 {
        format!("{minutes}m {seconds}.{remaining_ms:03}s")
    } else {
        format!("{seconds}.{remaining_ms:03}s")
    }
}

/// Wall-clock time of day used to prefix progress lines.
pub fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
