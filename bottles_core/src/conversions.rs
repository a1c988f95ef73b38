//! `From` implementations bridging `bottles_config` types to `bottles_core` types.

use std::path::PathBuf;

use crate::config::{
    AcquisitionCfg, AmbiguityPolicy, ClassifierCfg, FadeCfg, SchedulerCfg, SettleCfg,
    SmoothingCfg, Timeouts,
};
use crate::indicator::IndicatorPins;
use crate::state::ItemLayout;
use crate::targets::ItemWeight;

// ── Items ────────────────────────────────────────────────────────────────────

impl From<bottles_config::ItemLayout> for ItemLayout {
    fn from(l: bottles_config::ItemLayout) -> Self {
        match l {
            bottles_config::ItemLayout::CapOnly => Self::CapOnly,
            bottles_config::ItemLayout::BottleAndCap => Self::BottleAndCap,
        }
    }
}

impl From<&bottles_config::ItemWeight> for ItemWeight {
    fn from(w: &bottles_config::ItemWeight) -> Self {
        Self {
            bottle: w.bottle,
            cap: w.cap,
        }
    }
}

// ── ClassifierCfg ────────────────────────────────────────────────────────────

impl From<bottles_config::AmbiguityMode> for AmbiguityPolicy {
    fn from(m: bottles_config::AmbiguityMode) -> Self {
        match m {
            bottles_config::AmbiguityMode::AcceptClosest => Self::AcceptClosest,
            bottles_config::AmbiguityMode::Reject => Self::Reject,
        }
    }
}

impl From<&bottles_config::ClassifierCfg> for ClassifierCfg {
    fn from(c: &bottles_config::ClassifierCfg) -> Self {
        Self {
            tolerance: c.tolerance,
            ambiguity: c.ambiguity.into(),
        }
    }
}

// ── Signal conditioning ──────────────────────────────────────────────────────

impl From<&bottles_config::SmoothingCfg> for SmoothingCfg {
    fn from(c: &bottles_config::SmoothingCfg) -> Self {
        Self { alpha: c.alpha }
    }
}

impl From<&bottles_config::SettleCfg> for SettleCfg {
    fn from(c: &bottles_config::SettleCfg) -> Self {
        Self {
            enabled: c.enabled,
            unsettle_above: c.unsettle_above,
            settle_below: c.settle_below,
            required_ticks: c.required_ticks,
        }
    }
}

impl From<&bottles_config::AcquisitionCfg> for AcquisitionCfg {
    fn from(c: &bottles_config::AcquisitionCfg) -> Self {
        Self {
            sample_count: c.sample_count,
            averaging_passes: c.averaging_passes,
            divisor: c.divisor,
            tare_samples: c.tare_samples,
            tare_passes: c.tare_passes,
            retare_samples: c.retare_samples,
            retare_passes: c.retare_passes,
        }
    }
}

impl From<&bottles_config::Hardware> for Timeouts {
    fn from(c: &bottles_config::Hardware) -> Self {
        Self {
            sensor_ms: c.sensor_read_timeout_ms,
        }
    }
}

// ── Playback ─────────────────────────────────────────────────────────────────

impl From<&bottles_config::FadeCfg> for FadeCfg {
    fn from(c: &bottles_config::FadeCfg) -> Self {
        Self {
            on_volume: c.on_volume,
            floor: c.floor,
            decay: c.decay,
            max_volume: c.max_volume,
        }
    }
}

impl From<&bottles_config::SchedulerCfg> for SchedulerCfg {
    fn from(c: &bottles_config::SchedulerCfg) -> Self {
        Self {
            tick_ms: c.tick_ms,
            max_ticks: None,
        }
    }
}

impl From<&bottles_config::IndicatorPins> for IndicatorPins {
    fn from(p: &bottles_config::IndicatorPins) -> Self {
        Self {
            bottle: p.bottle,
            cap: p.cap,
        }
    }
}

/// Track set paths from the `[audio]` section.
pub fn track_sets(c: &bottles_config::AudioCfg) -> Vec<Vec<PathBuf>> {
    c.sets
        .iter()
        .map(|set| set.iter().map(PathBuf::from).collect())
        .collect()
}
