//! General time utility functions

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Sleep for the given number of seconds, waking early if `stop` returns true.
///
/// The sleep is broken into slices of at most `slice_s` so that long holds can be cancelled.
/// Returns `true` if the sleep was cut short.
pub fn interruptible_sleep<F>(duration_s: f64, slice_s: f64, mut stop: F) -> bool
where
    F: FnMut() -> bool,
{
    let end = std::time::Instant::now() + std::time::Duration::from_secs_f64(duration_s.max(0.0));

    loop {
        if stop() {
            return true;
        }

        let now = std::time::Instant::now();
        if now >= end {
            return false;
        }

        let remaining = end - now;
        std::thread::sleep(remaining.min(std::time::Duration::from_secs_f64(slice_s)));
    }
}
