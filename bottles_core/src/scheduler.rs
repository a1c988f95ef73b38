//! The polling loop: acquire, smooth, classify, transition, fade, sleep.

use std::sync::atomic::{AtomicBool, Ordering};

use bottles_traits::{AudioBackend, Button, ButtonInput, Clock, Scale};

use crate::acquisition::WeightReader;
use crate::classifier::{Classification, Classifier};
use crate::config::SchedulerCfg;
use crate::cues::CuePlan;
use crate::fade::FadeEngine;
use crate::settle::SettleGate;
use crate::smoother::Smoother;
use crate::state::OccupancyState;
use crate::status::{RunSummary, StopReason, TickReport};
use crate::tracks::TrackLibrary;
use crate::transition::{StateChangeEvent, TransitionController};
use crate::util::{remaining_in_tick, tick_period};

pub struct Scheduler<S, A> {
    pub(crate) reader: WeightReader<S>,
    pub(crate) smoother: Smoother,
    pub(crate) settle: Option<SettleGate>,
    pub(crate) classifier: Classifier,
    pub(crate) controller: TransitionController,
    pub(crate) fade: FadeEngine<A>,
    pub(crate) library: TrackLibrary,
    pub(crate) buttons: Option<Box<dyn ButtonInput>>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) cfg: SchedulerCfg,
    pub(crate) ticks: u64,
    pub(crate) held: Option<Button>,
}

impl<S, A> std::fmt::Debug for Scheduler<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("committed", &self.controller.committed())
            .field("track_set", &self.library.selected())
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl<S: Scale, A: AudioBackend> Scheduler<S, A> {
    /// One full tick without sleeping.
    ///
    /// A failed sensor read is logged and skips classification; fades and
    /// buttons are still serviced.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            tick: self.ticks,
            ..TickReport::default()
        };
        self.ticks += 1;

        match self.reader.read_delta() {
            Ok(delta) => self.sample_into(delta, &mut report),
            Err(e) => {
                tracing::warn!(tick = report.tick, error = %e, "sensor read failed, tick skipped");
            }
        }
        report.button = self.poll_buttons();
        report.fade = self.fade.advance();
        report
    }

    /// Feed one tared, scaled delta through smoother, settle gate and classifier.
    pub fn process_sample(&mut self, delta: i32) -> Option<StateChangeEvent> {
        let mut report = TickReport::default();
        self.sample_into(delta, &mut report);
        report.event
    }

    /// Classify an already smoothed value and commit any transition.
    pub fn process_smoothed(&mut self, smoothed: i32) -> Option<StateChangeEvent> {
        self.classify_and_commit(smoothed).1
    }

    fn sample_into(&mut self, delta: i32, report: &mut TickReport) {
        let smoothed = self.smoother.update(delta);
        report.delta = Some(delta);
        report.smoothed = Some(smoothed);
        if let Some(gate) = &mut self.settle
            && !gate.observe(smoothed)
        {
            tracing::trace!(smoothed, "reading not settled");
            return;
        }
        let (c, event) = self.classify_and_commit(smoothed);
        report.classification = Some(c);
        report.event = event;
    }

    fn classify_and_commit(
        &mut self,
        smoothed: i32,
    ) -> (Classification, Option<StateChangeEvent>) {
        let c = self.classifier.classify(smoothed);
        tracing::debug!(
            smoothed,
            best = %c.best,
            distance = c.distance,
            matches = c.matches,
            "classified"
        );
        if c.is_ambiguous() {
            tracing::debug!(matches = c.matches, policy = ?self.controller.policy(), "ambiguous reading");
        }
        let event = self.controller.on_tick(&c);
        if let Some(ev) = &event {
            tracing::info!(
                from = %ev.from,
                to = %ev.to,
                distance = ev.distance,
                low_confidence = ev.is_low_confidence(),
                "state change"
            );
            self.apply_cues(ev.to);
        }
        (c, event)
    }

    fn apply_cues(&mut self, state: OccupancyState) {
        CuePlan::for_state(&state, self.library.has_override()).apply(&mut self.fade);
    }

    fn poll_buttons(&mut self) -> Option<Button> {
        let buttons = self.buttons.as_mut()?;
        let now = match buttons.poll() {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "button poll failed");
                return None;
            }
        };
        let previous = std::mem::replace(&mut self.held, now);
        // a held button acts once
        let pressed = now.filter(|b| previous != Some(*b))?;
        self.press(pressed);
        Some(pressed)
    }

    /// Act on a button press.
    pub fn press(&mut self, button: Button) {
        match button {
            Button::Retare => self.retare(),
            Button::TrackSet(n) => {
                self.select_track_set(n);
            }
        }
    }

    fn retare(&mut self) {
        let (samples, passes) = {
            let cfg = self.reader.cfg();
            (cfg.retare_samples, cfg.retare_passes)
        };
        match self.reader.tare(samples, passes) {
            Ok(_) => {
                self.smoother.reset();
                if let Some(gate) = &mut self.settle {
                    gate.reset();
                }
            }
            Err(e) => tracing::warn!(error = %e, "retare failed, keeping previous tare"),
        }
    }

    /// Halt everything, switch to set `n` and replay the cues of the committed state.
    ///
    /// Unknown sets are logged and ignored; returns whether the switch happened.
    pub fn select_track_set(&mut self, n: usize) -> bool {
        if !self.library.select(n) {
            tracing::warn!(
                set = n,
                available = self.library.set_count(),
                "unknown track set ignored"
            );
            return false;
        }
        self.fade.halt_all();
        for (ch, track) in self.library.channel_tracks().into_iter().enumerate() {
            self.fade.set_track(ch, track);
        }
        let committed = self.controller.committed();
        self.controller.force(committed);
        self.apply_cues(committed);
        tracing::info!(set = n, "track set selected");
        true
    }

    /// Tick until `stop` is set or the tick limit is reached, sleeping the
    /// remainder of each tick. Stops all audio before returning.
    pub fn run(&mut self, stop: &AtomicBool) -> RunSummary {
        self.run_with(stop, |_| {})
    }

    /// Like `run`, handing every tick report to `on_tick`.
    pub fn run_with(
        &mut self,
        stop: &AtomicBool,
        mut on_tick: impl FnMut(&TickReport),
    ) -> RunSummary {
        let period = tick_period(self.cfg.tick_ms);
        let mut ticks = 0u64;
        let mut events = 0u64;
        let mut failed_reads = 0u64;
        tracing::info!(tick_ms = self.cfg.tick_ms, max_ticks = ?self.cfg.max_ticks, "scheduler started");

        let reason = loop {
            if stop.load(Ordering::Relaxed) {
                break StopReason::Signal;
            }
            if let Some(max) = self.cfg.max_ticks
                && ticks >= max
            {
                break StopReason::TickLimit;
            }
            let started = self.clock.now();
            let report = self.tick();
            ticks += 1;
            events += u64::from(report.event.is_some());
            failed_reads += u64::from(report.read_failed());
            on_tick(&report);
            let elapsed = self.clock.now().saturating_duration_since(started);
            self.clock.sleep(remaining_in_tick(period, elapsed));
        };

        self.fade.shutdown();
        let summary = RunSummary {
            ticks,
            events,
            failed_reads,
            stop: reason,
            final_state: self.controller.committed(),
        };
        tracing::info!(
            ticks,
            events,
            failed_reads,
            stop = ?reason,
            state = %summary.final_state,
            "scheduler stopped"
        );
        summary
    }

    pub const fn committed(&self) -> OccupancyState {
        self.controller.committed()
    }

    pub const fn fade(&self) -> &FadeEngine<A> {
        &self.fade
    }

    pub const fn audio(&self) -> &A {
        self.fade.audio()
    }

    pub const fn library(&self) -> &TrackLibrary {
        &self.library
    }

    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub const fn tare(&self) -> i32 {
        self.reader.tare_value()
    }

    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    pub const fn scale(&self) -> &S {
        self.reader.scale()
    }
}
