// Focused tests for tick pacing and fade length helpers.
use std::time::Duration;

use bottles_core::util::{fade_ticks, remaining_in_tick, tick_period};

#[test]
fn tick_period_clamps_to_one_ms() {
    assert_eq!(tick_period(50), Duration::from_millis(50));
    assert_eq!(tick_period(1), Duration::from_millis(1));
    assert_eq!(tick_period(0), Duration::from_millis(1));
}

#[test]
fn remaining_in_tick_saturates_on_overrun() {
    let period = Duration::from_millis(50);
    assert_eq!(
        remaining_in_tick(period, Duration::from_millis(20)),
        Duration::from_millis(30)
    );
    assert_eq!(remaining_in_tick(period, period), Duration::ZERO);
    assert_eq!(
        remaining_in_tick(period, Duration::from_millis(80)),
        Duration::ZERO
    );
}

#[test]
fn default_fade_lasts_forty_nine_ticks() {
    // 105 decays by 0.96 until below 5, plus the tick that stops playback
    assert_eq!(fade_ticks(105, 5, 0.96), Some(49));
}

#[test]
fn fade_already_below_floor_takes_one_tick() {
    assert_eq!(fade_ticks(3, 5, 0.96), Some(1));
}

#[test]
fn decay_that_never_lowers_the_volume_is_reported() {
    assert_eq!(fade_ticks(10, 5, 1.0), None);
}
