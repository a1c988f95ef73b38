use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Block until `is_high` reports false or `timeout` elapses, sleeping
/// `poll_interval` between checks.
pub fn wait_until_low_with_timeout(
    mut is_high: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while is_high() {
        if Instant::now() >= deadline {
            return Err(HwError::DataReadyTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}

/// Sign-extend a 24-bit two's complement value held in the low bits of `raw`.
#[inline]
pub fn sign_extend_24(raw: u32) -> i32 {
    let v = raw & 0x00FF_FFFF;
    if v & 0x0080_0000 != 0 {
        (v | 0xFF00_0000) as i32
    } else {
        v as i32
    }
}

/// Buttons are wired to ground with pull-ups: a low line means pressed.
#[inline]
pub const fn pressed_from_level(is_high: bool) -> bool {
    !is_high
}
