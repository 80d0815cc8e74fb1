// Shared utility helpers for timestamps and sequencing.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::Instant;

pub fn monotonic_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

pub fn next_sequence(sequence: &AtomicU64) -> u64 {
    sequence.fetch_add(1, Ordering::Relaxed) + 1
}

/// True (and advances `last_ms`) when at least `interval_ms` passed since the last hit.
pub fn throttle_elapsed(last_ms: &mut Option<u64>, now_ms: u64, interval_ms: u64) -> bool {
    let due = match last_ms {
        Some(prev) => now_ms.saturating_sub(*prev) >= interval_ms,
        None => true,
    };
    if due {
        *last_ms = Some(now_ms);
    }
    due
}
