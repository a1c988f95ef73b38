//! Tick pacing helpers.

use std::time::Duration;

/// Tick period for `tick_ms`, clamped to at least 1 ms.
#[inline]
pub fn tick_period(tick_ms: u64) -> Duration {
    Duration::from_millis(tick_ms.max(1))
}

/// Time left in the current tick after `elapsed` of work; zero when overrun.
#[inline]
pub fn remaining_in_tick(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Ticks a fade needs to fall from `from` below `floor` with truncating `decay`.
///
/// Returns `None` if the volume would never drop (decay rounds back up to the
/// same integer).
pub fn fade_ticks(from: u8, floor: u8, decay: f32) -> Option<u32> {
    let mut v = from;
    let mut ticks = 0;
    while v >= floor {
        let next = (f32::from(v) * decay) as u8;
        if next >= v {
            return None;
        }
        v = next;
        ticks += 1;
    }
    // one more tick snaps to zero and stops playback
    Some(ticks + 1)
}
