//! Type-state builder for `Scheduler`.
//!
//! The scale and audio backend are type parameters that start as `Missing`;
//! `build()` only exists once both are concrete collaborators. Everything
//! that can be checked without touching hardware is validated before any
//! track is loaded or the sensor is read.

use std::path::PathBuf;
use std::time::Duration;

use bottles_traits::{AudioBackend, ButtonInput, Clock, IndicatorOutput, MonotonicClock, Scale};

use crate::acquisition::WeightReader;
use crate::classifier::Classifier;
use crate::config::{
    AcquisitionCfg, ClassifierCfg, FadeCfg, SchedulerCfg, SettleCfg, SmoothingCfg, Timeouts,
};
use crate::error::{BottlesError, BuildError, Result, config_err};
use crate::fade::{FadeEngine, validate_fade_cfg};
use crate::indicator::{IndicatorBank, IndicatorPins};
use crate::scheduler::Scheduler;
use crate::settle::SettleGate;
use crate::smoother::Smoother;
use crate::state::{ItemLayout, StateSpace};
use crate::targets::{ItemWeight, TargetTable};
use crate::tracks::TrackLibrary;
use crate::transition::TransitionController;

/// Type-state marker for a collaborator not yet supplied.
pub struct Missing;

#[derive(Default)]
struct Parts {
    items: Option<usize>,
    layout: ItemLayout,
    weights: Option<Vec<ItemWeight>>,
    classifier: ClassifierCfg,
    smoothing: SmoothingCfg,
    settle: SettleCfg,
    acquisition: AcquisitionCfg,
    timeouts: Timeouts,
    fade: FadeCfg,
    scheduler: SchedulerCfg,
    track_sets: Vec<Vec<PathBuf>>,
    override_track: Option<PathBuf>,
    tare: Option<i32>,
    indicators: Option<(Box<dyn IndicatorOutput>, Vec<IndicatorPins>)>,
    buttons: Option<Box<dyn ButtonInput>>,
    clock: Option<Box<dyn Clock>>,
}

pub struct SchedulerBuilder<S, A> {
    scale: S,
    audio: A,
    parts: Parts,
}

impl Scheduler<Missing, Missing> {
    pub fn builder() -> SchedulerBuilder<Missing, Missing> {
        SchedulerBuilder {
            scale: Missing,
            audio: Missing,
            parts: Parts::default(),
        }
    }
}

impl<A> SchedulerBuilder<Missing, A> {
    pub fn with_scale<S: Scale>(self, scale: S) -> SchedulerBuilder<S, A> {
        SchedulerBuilder {
            scale,
            audio: self.audio,
            parts: self.parts,
        }
    }
}

impl<S> SchedulerBuilder<S, Missing> {
    pub fn with_audio<A: AudioBackend>(self, audio: A) -> SchedulerBuilder<S, A> {
        SchedulerBuilder {
            scale: self.scale,
            audio,
            parts: self.parts,
        }
    }
}

/// Chainable setters that do not affect type-state.
impl<S, A> SchedulerBuilder<S, A> {
    /// Item count defaults to the number of weights.
    pub fn with_items(mut self, count: usize, layout: ItemLayout) -> Self {
        self.parts.items = Some(count);
        self.parts.layout = layout;
        self
    }
    pub fn with_layout(mut self, layout: ItemLayout) -> Self {
        self.parts.layout = layout;
        self
    }
    pub fn with_weights(mut self, weights: Vec<ItemWeight>) -> Self {
        self.parts.weights = Some(weights);
        self
    }
    pub fn with_classifier(mut self, cfg: ClassifierCfg) -> Self {
        self.parts.classifier = cfg;
        self
    }
    pub fn with_tolerance(mut self, tolerance: i32) -> Self {
        self.parts.classifier.tolerance = tolerance;
        self
    }
    pub fn with_smoothing(mut self, cfg: SmoothingCfg) -> Self {
        self.parts.smoothing = cfg;
        self
    }
    pub fn with_settle(mut self, cfg: SettleCfg) -> Self {
        self.parts.settle = cfg;
        self
    }
    pub fn with_acquisition(mut self, cfg: AcquisitionCfg) -> Self {
        self.parts.acquisition = cfg;
        self
    }
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.parts.timeouts = timeouts;
        self
    }
    pub fn with_fade(mut self, cfg: FadeCfg) -> Self {
        self.parts.fade = cfg;
        self
    }
    pub fn with_scheduler(mut self, cfg: SchedulerCfg) -> Self {
        self.parts.scheduler = cfg;
        self
    }
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.parts.scheduler.max_ticks = Some(max_ticks);
        self
    }
    pub fn with_track_sets(mut self, sets: Vec<Vec<PathBuf>>) -> Self {
        self.parts.track_sets = sets;
        self
    }
    pub fn with_override_track(mut self, path: Option<PathBuf>) -> Self {
        self.parts.override_track = path;
        self
    }
    /// Use a fixed tare instead of capturing one at startup.
    pub fn with_tare(mut self, tare: i32) -> Self {
        self.parts.tare = Some(tare);
        self
    }
    pub fn with_indicators(
        mut self,
        out: impl IndicatorOutput + 'static,
        pins: Vec<IndicatorPins>,
    ) -> Self {
        self.parts.indicators = Some((Box::new(out), pins));
        self
    }
    pub fn with_buttons(mut self, buttons: impl ButtonInput + 'static) -> Self {
        self.parts.buttons = Some(Box::new(buttons));
        self
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.parts.clock = Some(Box::new(clock));
        self
    }
}

impl<S: Scale, A: AudioBackend> SchedulerBuilder<S, A> {
    /// Validate, load tracks, establish the tare and write the initial indicators.
    pub fn build(self) -> Result<Scheduler<S, A>> {
        let Self {
            scale,
            mut audio,
            parts,
        } = self;

        // ── Validation (no hardware touched) ────────────────────────────────
        let weights = parts
            .weights
            .ok_or_else(|| eyre::Report::new(BuildError::MissingWeights))?;
        let items = parts.items.unwrap_or(weights.len());
        let space = StateSpace::new(items, parts.layout)?;
        let table = TargetTable::build(&space, &weights)?;
        let classifier = Classifier::new(table, parts.classifier.tolerance)?;
        let smoother = Smoother::new(parts.smoothing.alpha)?;
        validate_fade_cfg(&parts.fade)?;
        if parts.scheduler.tick_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "tick_ms must be >= 1",
            )));
        }
        if parts.timeouts.sensor_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sensor_ms must be >= 1",
            )));
        }
        let settle = if parts.settle.enabled {
            if parts.settle.settle_below > parts.settle.unsettle_above {
                return Err(eyre::Report::new(BuildError::InvalidConfig(
                    "settle_below must be <= unsettle_above",
                )));
            }
            Some(SettleGate::new(parts.settle))
        } else {
            None
        };
        if parts.track_sets.is_empty() {
            return Err(config_err("at least one track set is required"));
        }
        if let Some((n, set)) = parts
            .track_sets
            .iter()
            .enumerate()
            .find(|(_, set)| set.len() != items)
        {
            return Err(config_err(format!(
                "track set {n} has {} tracks for {items} items",
                set.len()
            )));
        }
        if let Some((_, pins)) = &parts.indicators
            && pins.len() > items
        {
            return Err(config_err(format!(
                "{} indicator pin pairs for {items} items",
                pins.len()
            )));
        }
        let mut reader = WeightReader::new(
            scale,
            parts.acquisition,
            Duration::from_millis(parts.timeouts.sensor_ms),
        )?;

        // ── Collaborators ───────────────────────────────────────────────────
        let library =
            TrackLibrary::load(&mut audio, &parts.track_sets, parts.override_track.as_deref())?;
        let mut fade = FadeEngine::new(audio, parts.fade, items + 1)?;
        for (ch, track) in library.channel_tracks().into_iter().enumerate() {
            fade.set_track(ch, track);
        }

        match parts.tare {
            Some(t) => {
                reader.set_tare(t);
                tracing::info!(tare = t, "using fixed tare");
            }
            None => {
                let (samples, passes) = (reader.cfg().tare_samples, reader.cfg().tare_passes);
                reader.tare(samples, passes).map_err(|e| {
                    eyre::Report::new(BottlesError::CollaboratorInit(format!(
                        "initial tare failed: {e}"
                    )))
                })?;
            }
        }

        let initial = space.all_present();
        let mut controller = TransitionController::new(initial, parts.classifier.ambiguity);
        if let Some((out, pins)) = parts.indicators {
            let mut bank = IndicatorBank::new(out, pins);
            bank.apply(&initial);
            controller.add_listener(move |ev| bank.apply(&ev.to));
        }

        tracing::info!(
            items,
            states = space.len(),
            tolerance = parts.classifier.tolerance,
            override_track = library.has_override(),
            "scheduler built"
        );

        Ok(Scheduler {
            reader,
            smoother,
            settle,
            classifier,
            controller,
            fade,
            library,
            buttons: parts.buttons,
            clock: parts.clock.unwrap_or_else(|| Box::new(MonotonicClock::new())),
            cfg: parts.scheduler,
            ticks: 0,
            held: None,
        })
    }
}
