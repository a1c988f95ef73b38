//! Test and helper mocks for bottles_core.
//!
//! Recording mocks share their state through `Rc<RefCell<..>>` so a test can
//! keep a handle after the mock has been moved into the scheduler.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use bottles_traits::{
    AudioBackend, BoxError, Button, ButtonInput, IndicatorOutput, Scale, TrackHandle,
};

/// Scale replaying a fixed list of raw readings.
///
/// When the list runs out it repeats the last reading, or fails every read
/// after `then_fail()`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedScale {
    queue: VecDeque<i32>,
    last: i32,
    fail_when_empty: bool,
    reads: usize,
}

impl ScriptedScale {
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            queue: values.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn then_fail(mut self) -> Self {
        self.fail_when_empty = true;
        self
    }

    pub fn push(&mut self, raw: i32) {
        self.queue.push_back(raw);
    }

    pub const fn reads(&self) -> usize {
        self.reads
    }
}

impl Scale for ScriptedScale {
    fn read(&mut self, _timeout: Duration) -> Result<i32, BoxError> {
        self.reads += 1;
        match self.queue.pop_front() {
            Some(v) => {
                self.last = v;
                Ok(v)
            }
            None if self.fail_when_empty => {
                Err(Box::new(std::io::Error::other("scripted scale timeout")))
            }
            None => Ok(self.last),
        }
    }
}

/// One call observed by `RecordingMixer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MixerCall {
    Start { channel: usize, track: TrackHandle },
    Stop { channel: usize },
}

#[derive(Debug, Default)]
pub struct MixerLog {
    pub loaded: Vec<PathBuf>,
    pub volumes: BTreeMap<usize, u8>,
    pub calls: Vec<MixerCall>,
    pub playing: BTreeMap<usize, TrackHandle>,
}

impl MixerLog {
    pub fn starts(&self, channel: usize) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, MixerCall::Start { channel: ch, .. } if *ch == channel))
            .count()
    }
}

/// Audio backend recording every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingMixer {
    log: Rc<RefCell<MixerLog>>,
    missing: Vec<PathBuf>,
    failing_channels: Vec<usize>,
}

impl RecordingMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail to load `path`.
    pub fn with_missing(mut self, path: impl Into<PathBuf>) -> Self {
        self.missing.push(path.into());
        self
    }

    /// Fail every start on `channel`.
    pub fn with_failing_channel(mut self, channel: usize) -> Self {
        self.failing_channels.push(channel);
        self
    }

    pub fn log(&self) -> Rc<RefCell<MixerLog>> {
        Rc::clone(&self.log)
    }
}

impl AudioBackend for RecordingMixer {
    fn load_track(&mut self, path: &Path) -> Result<TrackHandle, BoxError> {
        if self.missing.iter().any(|m| m == path) {
            return Err(format!("no such track: {}", path.display()).into());
        }
        let mut log = self.log.borrow_mut();
        log.loaded.push(path.to_path_buf());
        Ok(TrackHandle(u32::try_from(log.loaded.len() - 1)?))
    }

    fn start_channel(&mut self, channel: usize, track: TrackHandle) -> Result<(), BoxError> {
        if self.failing_channels.contains(&channel) {
            return Err(format!("channel {channel} cannot start").into());
        }
        let mut log = self.log.borrow_mut();
        log.calls.push(MixerCall::Start { channel, track });
        log.playing.insert(channel, track);
        Ok(())
    }

    fn set_channel_volume(&mut self, channel: usize, volume: u8) {
        self.log.borrow_mut().volumes.insert(channel, volume);
    }

    fn stop_channel(&mut self, channel: usize) -> Result<(), BoxError> {
        let mut log = self.log.borrow_mut();
        log.calls.push(MixerCall::Stop { channel });
        log.playing.remove(&channel);
        Ok(())
    }

    fn channel_volume(&self, channel: usize) -> u8 {
        self.log.borrow().volumes.get(&channel).copied().unwrap_or(0)
    }
}

/// Indicator outputs recording the last level per pin.
#[derive(Debug, Clone, Default)]
pub struct RecordingIndicators {
    levels: Rc<RefCell<BTreeMap<u8, bool>>>,
}

impl RecordingIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, pin: u8) -> Option<bool> {
        self.levels.borrow().get(&pin).copied()
    }
}

impl IndicatorOutput for RecordingIndicators {
    fn write_output(&mut self, pin: u8, level: bool) -> Result<(), BoxError> {
        self.levels.borrow_mut().insert(pin, level);
        Ok(())
    }
}

/// Buttons pressed on given poll counts (starting at 0).
#[derive(Debug, Clone, Default)]
pub struct ScriptedButtons {
    presses: BTreeMap<u64, Button>,
    polls: u64,
}

impl ScriptedButtons {
    pub fn new(presses: impl IntoIterator<Item = (u64, Button)>) -> Self {
        Self {
            presses: presses.into_iter().collect(),
            polls: 0,
        }
    }
}

impl ButtonInput for ScriptedButtons {
    fn poll(&mut self) -> Result<Option<Button>, BoxError> {
        let b = self.presses.get(&self.polls).copied();
        self.polls += 1;
        Ok(b)
    }
}
