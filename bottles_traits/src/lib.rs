//! Collaborator boundaries for the music bottles installation.
//!
//! The engine in `bottles_core` only ever talks to hardware through these
//! traits. Errors cross the boundary as `BoxError` and are mapped to typed
//! errors on the core side.

pub mod clock;

use std::path::Path;
use std::time::Duration;

pub use clock::{Clock, ManualClock, MonotonicClock};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Load cell ADC. One call yields one raw conversion.
pub trait Scale {
    fn read(&mut self, timeout: Duration) -> Result<i32, BoxError>;
}

impl<T: Scale + ?Sized> Scale for Box<T> {
    fn read(&mut self, timeout: Duration) -> Result<i32, BoxError> {
        (**self).read(timeout)
    }
}

/// Opaque handle to a track loaded into the audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackHandle(pub u32);

/// Channel mixer. Channels are small integers; volume is 0..=128.
pub trait AudioBackend {
    fn load_track(&mut self, path: &Path) -> Result<TrackHandle, BoxError>;
    /// Start looping `track` on `channel` from its beginning.
    fn start_channel(&mut self, channel: usize, track: TrackHandle) -> Result<(), BoxError>;
    fn set_channel_volume(&mut self, channel: usize, volume: u8);
    fn stop_channel(&mut self, channel: usize) -> Result<(), BoxError>;
    fn channel_volume(&self, channel: usize) -> u8;
}

impl<T: AudioBackend + ?Sized> AudioBackend for Box<T> {
    fn load_track(&mut self, path: &Path) -> Result<TrackHandle, BoxError> {
        (**self).load_track(path)
    }
    fn start_channel(&mut self, channel: usize, track: TrackHandle) -> Result<(), BoxError> {
        (**self).start_channel(channel, track)
    }
    fn set_channel_volume(&mut self, channel: usize, volume: u8) {
        (**self).set_channel_volume(channel, volume)
    }
    fn stop_channel(&mut self, channel: usize) -> Result<(), BoxError> {
        (**self).stop_channel(channel)
    }
    fn channel_volume(&self, channel: usize) -> u8 {
        (**self).channel_volume(channel)
    }
}

/// Digital outputs mirroring occupancy (lighting controller inputs).
pub trait IndicatorOutput {
    fn write_output(&mut self, pin: u8, level: bool) -> Result<(), BoxError>;
}

impl<T: IndicatorOutput + ?Sized> IndicatorOutput for Box<T> {
    fn write_output(&mut self, pin: u8, level: bool) -> Result<(), BoxError> {
        (**self).write_output(pin, level)
    }
}

/// Operator buttons on the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Capture a fresh tare with everything on the platform.
    Retare,
    /// Switch to the numbered track set.
    TrackSet(usize),
}

pub trait ButtonInput {
    /// Return the button held this tick, if any. Retare wins over track sets.
    fn poll(&mut self) -> Result<Option<Button>, BoxError>;
}

impl<T: ButtonInput + ?Sized> ButtonInput for Box<T> {
    fn poll(&mut self) -> Result<Option<Button>, BoxError> {
        (**self).poll()
    }
}
