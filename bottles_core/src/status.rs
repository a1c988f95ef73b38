//! Per-tick and per-run reports returned by the scheduler.

use bottles_traits::Button;

use crate::classifier::Classification;
use crate::fade::FadeStep;
use crate::state::OccupancyState;
use crate::transition::StateChangeEvent;

/// What one scheduler tick observed and did.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    /// Tared, scaled delta; `None` when the sensor read failed.
    pub delta: Option<i32>,
    pub smoothed: Option<i32>,
    /// `None` when the read failed or the settle gate held the reading back.
    pub classification: Option<Classification>,
    pub event: Option<StateChangeEvent>,
    pub button: Option<Button>,
    pub fade: FadeStep,
}

impl TickReport {
    pub const fn read_failed(&self) -> bool {
        self.delta.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop token was set.
    Signal,
    /// The configured tick limit was reached.
    TickLimit,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ticks: u64,
    pub events: u64,
    pub failed_reads: u64,
    pub stop: StopReason,
    pub final_state: OccupancyState,
}
