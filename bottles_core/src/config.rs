//! Runtime configuration for the engine.
//!
//! Separate from the TOML schema in `bottles_config`; see `conversions`.

/// What to do when several states are within tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    #[default]
    AcceptClosest,
    Reject,
}

#[derive(Debug, Clone)]
pub struct ClassifierCfg {
    /// Strict match margin in scaled units.
    pub tolerance: i32,
    pub ambiguity: AmbiguityPolicy,
}

impl Default for ClassifierCfg {
    fn default() -> Self {
        Self {
            tolerance: 43,
            ambiguity: AmbiguityPolicy::AcceptClosest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmoothingCfg {
    pub alpha: f32,
}

impl Default for SmoothingCfg {
    fn default() -> Self {
        Self { alpha: 0.85 }
    }
}

#[derive(Debug, Clone)]
pub struct SettleCfg {
    pub enabled: bool,
    pub unsettle_above: i32,
    pub settle_below: i32,
    pub required_ticks: u32,
}

impl Default for SettleCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            unsettle_above: 20,
            settle_below: 10,
            required_ticks: 1,
        }
    }
}

/// Sample averaging and tare parameters.
#[derive(Debug, Clone)]
pub struct AcquisitionCfg {
    pub sample_count: u32,
    pub averaging_passes: u32,
    pub divisor: i32,
    pub tare_samples: u32,
    pub tare_passes: u32,
    pub retare_samples: u32,
    pub retare_passes: u32,
}

impl Default for AcquisitionCfg {
    fn default() -> Self {
        Self {
            sample_count: 2,
            averaging_passes: 5,
            divisor: 100,
            tare_samples: 150,
            tare_passes: 4,
            retare_samples: 35,
            retare_passes: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FadeCfg {
    pub on_volume: u8,
    pub floor: u8,
    pub decay: f32,
    pub max_volume: u8,
}

impl Default for FadeCfg {
    fn default() -> Self {
        Self {
            on_volume: 105,
            floor: 5,
            decay: 0.96,
            max_volume: 128,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerCfg {
    pub tick_ms: u64,
    /// Stop after this many ticks; `None` runs until the stop token is set.
    pub max_ticks: Option<u64>,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            max_ticks: None,
        }
    }
}

/// Timeouts and watchdogs.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max sensor wait per read (ms).
    pub sensor_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { sensor_ms: 150 }
    }
}
