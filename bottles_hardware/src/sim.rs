//! Simulated collaborators for development hosts and tests.
//!
//! The scale and the buttons are driven by small text scripts so a whole
//! session can be described in one environment variable.
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bottles_traits::{
    AudioBackend, BoxError, Button, ButtonInput, IndicatorOutput, Scale, TrackHandle,
};

use crate::error::{HwError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Value(i32),
    Fail,
}

/// Scale that replays a scripted trace of raw readings.
///
/// Script grammar: comma separated `item[*repeat]` where `item` is an
/// integer raw reading or `err` for a failed read, e.g.
/// `0*40,-62900*60,err,0*40`. Once the script is exhausted the last value
/// repeats forever.
#[derive(Debug, Clone)]
pub struct SimulatedScale {
    steps: Vec<Step>,
    pos: usize,
    last: i32,
}

impl SimulatedScale {
    pub fn constant(raw: i32) -> Self {
        Self {
            steps: Vec::new(),
            pos: 0,
            last: raw,
        }
    }

    pub fn from_script(script: &str) -> Result<Self> {
        let mut steps = Vec::new();
        for tok in script.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (item, repeat) = match tok.split_once('*') {
                Some((item, n)) => {
                    let n: usize = n
                        .trim()
                        .parse()
                        .map_err(|_| HwError::Script(format!("bad repeat in {tok:?}")))?;
                    (item.trim(), n)
                }
                None => (tok, 1),
            };
            let step = if item.eq_ignore_ascii_case("err") {
                Step::Fail
            } else {
                Step::Value(
                    item.parse()
                        .map_err(|_| HwError::Script(format!("bad reading {item:?}")))?,
                )
            };
            steps.extend(std::iter::repeat_n(step, repeat));
        }
        Ok(Self {
            steps,
            pos: 0,
            last: 0,
        })
    }

    /// Readings left before the trace starts repeating.
    pub fn remaining(&self) -> usize {
        self.steps.len().saturating_sub(self.pos)
    }
}

impl Scale for SimulatedScale {
    fn read(&mut self, _timeout: Duration) -> std::result::Result<i32, BoxError> {
        let step = self.steps.get(self.pos).copied();
        if step.is_some() {
            self.pos += 1;
        }
        match step {
            Some(Step::Value(v)) => {
                self.last = v;
                tracing::trace!(raw = v, "simulated scale read");
                Ok(v)
            }
            Some(Step::Fail) => Err(Box::new(HwError::Timeout)),
            None => Ok(self.last),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SimChannel {
    track: Option<TrackHandle>,
    volume: u8,
    playing: bool,
    starts: u32,
}

/// In-memory mixer. Loading checks that the file exists; playback only
/// records channel state.
#[derive(Debug, Default)]
pub struct SimulatedMixer {
    tracks: Vec<PathBuf>,
    channels: HashMap<usize, SimChannel>,
    fail_starts: bool,
}

impl SimulatedMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `start_channel` fail, to exercise degraded playback.
    pub fn failing_starts(mut self) -> Self {
        self.fail_starts = true;
        self
    }

    pub fn is_playing(&self, channel: usize) -> bool {
        self.channels.get(&channel).is_some_and(|c| c.playing)
    }

    /// How many times the channel was started from the beginning.
    pub fn starts(&self, channel: usize) -> u32 {
        self.channels.get(&channel).map_or(0, |c| c.starts)
    }

    pub fn track_path(&self, handle: TrackHandle) -> Option<&Path> {
        self.tracks.get(handle.0 as usize).map(PathBuf::as_path)
    }
}

impl AudioBackend for SimulatedMixer {
    fn load_track(&mut self, path: &Path) -> std::result::Result<TrackHandle, BoxError> {
        if !path.is_file() {
            return Err(Box::new(HwError::Audio(format!(
                "cannot open track {}",
                path.display()
            ))));
        }
        let id = u32::try_from(self.tracks.len())?;
        self.tracks.push(path.to_path_buf());
        tracing::debug!(track = %path.display(), handle = id, "track loaded");
        Ok(TrackHandle(id))
    }

    fn start_channel(
        &mut self,
        channel: usize,
        track: TrackHandle,
    ) -> std::result::Result<(), BoxError> {
        if self.fail_starts {
            return Err(Box::new(HwError::Audio(format!(
                "channel {channel} refused to start"
            ))));
        }
        if self.track_path(track).is_none() {
            return Err(Box::new(HwError::Audio(format!(
                "unknown track handle {}",
                track.0
            ))));
        }
        let ch = self.channels.entry(channel).or_default();
        ch.track = Some(track);
        ch.playing = true;
        ch.starts += 1;
        tracing::info!(channel, track = track.0, "channel started");
        Ok(())
    }

    fn set_channel_volume(&mut self, channel: usize, volume: u8) {
        let ch = self.channels.entry(channel).or_default();
        if ch.volume != volume {
            tracing::trace!(channel, volume, "channel volume");
        }
        ch.volume = volume;
    }

    fn stop_channel(&mut self, channel: usize) -> std::result::Result<(), BoxError> {
        if let Some(ch) = self.channels.get_mut(&channel)
            && ch.playing
        {
            ch.playing = false;
            tracing::info!(channel, "channel stopped");
        }
        Ok(())
    }

    fn channel_volume(&self, channel: usize) -> u8 {
        self.channels.get(&channel).map_or(0, |c| c.volume)
    }
}

/// Output pins kept in memory.
#[derive(Debug, Default, Clone)]
pub struct SimulatedIndicators {
    levels: BTreeMap<u8, bool>,
    writes: usize,
}

impl SimulatedIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, pin: u8) -> Option<bool> {
        self.levels.get(&pin).copied()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl IndicatorOutput for SimulatedIndicators {
    fn write_output(&mut self, pin: u8, level: bool) -> std::result::Result<(), BoxError> {
        self.levels.insert(pin, level);
        self.writes += 1;
        tracing::trace!(pin, level, "indicator");
        Ok(())
    }
}

/// Buttons pressed at scripted poll counts.
///
/// Script grammar: comma separated `poll:button` where `button` is
/// `retare` or `set<N>`, e.g. `20:retare,60:set1`. Poll counts start at 0.
#[derive(Debug, Default, Clone)]
pub struct SimulatedButtons {
    presses: BTreeMap<u64, Button>,
    polls: u64,
}

impl SimulatedButtons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_script(script: &str) -> Result<Self> {
        let mut presses = BTreeMap::new();
        for tok in script.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (at, name) = tok
                .split_once(':')
                .ok_or_else(|| HwError::Script(format!("expected poll:button in {tok:?}")))?;
            let at: u64 = at
                .trim()
                .parse()
                .map_err(|_| HwError::Script(format!("bad poll index in {tok:?}")))?;
            presses.insert(at, parse_button(name.trim())?);
        }
        Ok(Self { presses, polls: 0 })
    }
}

fn parse_button(name: &str) -> Result<Button> {
    if name.eq_ignore_ascii_case("retare") {
        return Ok(Button::Retare);
    }
    name.strip_prefix("set")
        .and_then(|n| n.parse::<usize>().ok())
        .map(Button::TrackSet)
        .ok_or_else(|| HwError::Script(format!("unknown button {name:?}")))
}

impl ButtonInput for SimulatedButtons {
    fn poll(&mut self) -> std::result::Result<Option<Button>, BoxError> {
        let pressed = self.presses.get(&self.polls).copied();
        self.polls += 1;
        Ok(pressed)
    }
}
