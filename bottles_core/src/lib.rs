#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Occupancy classification and fade control (hardware-agnostic).
//!
//! All hardware goes through the traits in `bottles_traits`: `Scale`,
//! `AudioBackend`, `IndicatorOutput`, `ButtonInput` and `Clock`.
//!
//! ## Pipeline, once per tick
//!
//! - **Acquisition**: clean-sample averaging, tare, divisor (`acquisition`)
//! - **Smoothing**: exponential moving average (`smoother`), optional settle gate (`settle`)
//! - **Classification**: nearest state within tolerance (`targets`, `classifier`)
//! - **Transition**: committed state and change events (`transition`)
//! - **Cues and fades**: per-channel targets and volume ramps (`cues`, `fade`)
//! - **Scheduler**: the loop tying it together, plus buttons (`scheduler`)
//!
//! Weights are integers in scaled sensor units: `(raw - tare) / divisor`.

pub mod acquisition;
pub mod builder;
pub mod classifier;
pub mod config;
pub mod conversions;
pub mod cues;
pub mod error;
pub mod fade;
pub mod hw_error;
pub mod indicator;
pub mod mocks;
pub mod scheduler;
pub mod settle;
pub mod smoother;
pub mod state;
pub mod status;
pub mod targets;
pub mod tracks;
pub mod transition;
pub mod util;

pub use acquisition::{WeightReader, clean_sample};
pub use builder::{Missing, SchedulerBuilder};
pub use classifier::{Classification, Classifier, classify};
pub use config::{
    AcquisitionCfg, AmbiguityPolicy, ClassifierCfg, FadeCfg, SchedulerCfg, SettleCfg,
    SmoothingCfg, Timeouts,
};
pub use cues::CuePlan;
pub use error::{BottlesError, BuildError, Result};
pub use fade::{ChannelState, FadeEngine, FadeStep};
pub use indicator::{IndicatorBank, IndicatorPins};
pub use scheduler::Scheduler;
pub use settle::SettleGate;
pub use smoother::Smoother;
pub use state::{ItemLayout, ItemState, OccupancyState, StateSpace};
pub use status::{RunSummary, StopReason, TickReport};
pub use targets::{ItemWeight, TargetTable};
pub use tracks::TrackLibrary;
pub use transition::{StateChangeEvent, TransitionController};
