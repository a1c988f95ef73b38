//! Per-channel volume ramps.
//!
//! Switching a channel on is immediate (on level, playback started if
//! needed). Switching it off only marks it fading; `advance()` then decays
//! the volume once per tick and stops playback below the floor.

use bottles_traits::{AudioBackend, TrackHandle};

use crate::config::FadeCfg;
use crate::error::{BottlesError, Result, config_err};
use crate::hw_error::map_hw_error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelState {
    pub volume: u8,
    pub fading: bool,
    pub active: bool,
}

impl ChannelState {
    pub const fn is_idle(&self) -> bool {
        !self.active && !self.fading
    }
}

/// What one `advance()` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FadeStep {
    /// Channels that reached silence and were stopped.
    pub finished: usize,
    /// The armed rewind completed.
    pub rewound: bool,
}

pub fn validate_fade_cfg(cfg: &FadeCfg) -> Result<()> {
    if cfg.max_volume == 0 || cfg.max_volume > 128 {
        return Err(config_err("fade max volume must be in [1, 128]"));
    }
    if cfg.on_volume == 0 || cfg.on_volume > cfg.max_volume {
        return Err(config_err("fade on volume must be in [1, max volume]"));
    }
    // a zero floor is never undershot, so the fade would never stop
    if cfg.floor == 0 || cfg.floor >= cfg.on_volume {
        return Err(config_err("fade floor must be in [1, on volume)"));
    }
    if !(cfg.decay.is_finite() && cfg.decay > 0.0 && cfg.decay < 1.0) {
        return Err(config_err("fade decay must be in (0.0, 1.0)"));
    }
    Ok(())
}

pub struct FadeEngine<A> {
    audio: A,
    cfg: FadeCfg,
    channels: Vec<ChannelState>,
    tracks: Vec<Option<TrackHandle>>,
    rewind_armed: bool,
}

impl<A: AudioBackend> FadeEngine<A> {
    /// Create `channels` silent, inactive channels.
    pub fn new(mut audio: A, cfg: FadeCfg, channels: usize) -> Result<Self> {
        validate_fade_cfg(&cfg)?;
        for ch in 0..channels {
            audio.set_channel_volume(ch, 0);
        }
        Ok(Self {
            audio,
            cfg,
            channels: vec![ChannelState::default(); channels],
            tracks: vec![None; channels],
            rewind_armed: false,
        })
    }

    pub fn set_track(&mut self, channel: usize, track: Option<TrackHandle>) {
        if let Some(slot) = self.tracks.get_mut(channel) {
            *slot = track;
        }
    }

    /// Switch a channel on (`true`) or start fading it out (`false`).
    pub fn set_target(&mut self, channel: usize, on: bool) {
        if channel >= self.channels.len() {
            tracing::warn!(channel, "fade target for unknown channel ignored");
            return;
        }
        if on {
            self.switch_on(channel);
        } else {
            let ch = &mut self.channels[channel];
            if ch.active || ch.volume > 0 {
                ch.fading = true;
            }
        }
    }

    fn switch_on(&mut self, channel: usize) {
        self.rewind_armed = false;
        let volume = self.cfg.on_volume.min(self.cfg.max_volume);
        {
            let ch = &mut self.channels[channel];
            ch.fading = false;
            ch.volume = volume;
        }
        self.apply_volume(channel);
        if self.channels[channel].active {
            return;
        }
        let started = match self.tracks[channel] {
            Some(track) => self
                .audio
                .start_channel(channel, track)
                .map_err(|e| map_hw_error(e.as_ref()).to_string()),
            None => Err("no track loaded".to_string()),
        };
        match started {
            Ok(()) => self.channels[channel].active = true,
            Err(reason) => {
                let err = BottlesError::Playback { channel, reason };
                tracing::warn!(error = %err, "channel left inactive");
                self.channels[channel].volume = 0;
                self.apply_volume(channel);
            }
        }
    }

    /// One fade step for every fading channel, then complete an armed rewind
    /// once everything is silent.
    pub fn advance(&mut self) -> FadeStep {
        let mut step = FadeStep::default();
        for channel in 0..self.channels.len() {
            if !self.channels[channel].fading {
                continue;
            }
            if self.channels[channel].volume < self.cfg.floor {
                self.silence(channel);
                step.finished += 1;
            } else {
                let v = f32::from(self.channels[channel].volume) * self.cfg.decay;
                // truncating, as the mixer takes integer volumes
                self.channels[channel].volume = v as u8;
                self.apply_volume(channel);
            }
        }
        if self.rewind_armed && self.channels.iter().all(ChannelState::is_idle) {
            self.rewind();
            step.rewound = true;
        }
        step
    }

    fn silence(&mut self, channel: usize) {
        let was_active = self.channels[channel].active;
        self.channels[channel] = ChannelState::default();
        self.apply_volume(channel);
        if was_active && let Err(e) = self.audio.stop_channel(channel) {
            let err = BottlesError::Playback {
                channel,
                reason: map_hw_error(e.as_ref()).to_string(),
            };
            tracing::warn!(error = %err, "stop failed");
        }
    }

    /// Request a reset to the start once all channels have gone silent.
    pub fn arm_rewind(&mut self) {
        self.rewind_armed = true;
    }

    pub const fn rewind_armed(&self) -> bool {
        self.rewind_armed
    }

    fn rewind(&mut self) {
        self.rewind_armed = false;
        for channel in 0..self.channels.len() {
            self.channels[channel] = ChannelState::default();
            self.apply_volume(channel);
        }
        tracing::info!("all channels rewound");
    }

    /// Stop every channel at once.
    pub fn halt_all(&mut self) {
        self.rewind_armed = false;
        for channel in 0..self.channels.len() {
            self.silence(channel);
        }
    }

    /// Graceful stop path at the end of a run.
    pub fn shutdown(&mut self) {
        let active = self.channels.iter().filter(|c| c.active).count();
        self.halt_all();
        tracing::info!(stopped = active, "audio shut down");
    }

    fn apply_volume(&mut self, channel: usize) {
        let v = self.channels[channel].volume.min(self.cfg.max_volume);
        self.audio.set_channel_volume(channel, v);
    }

    pub fn channel(&self, channel: usize) -> Option<&ChannelState> {
        self.channels.get(channel)
    }

    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    pub const fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MixerCall, RecordingMixer};

    fn engine(channels: usize) -> (FadeEngine<RecordingMixer>, RecordingMixer) {
        let mixer = RecordingMixer::new();
        let mut e = FadeEngine::new(mixer.clone(), FadeCfg::default(), channels).unwrap();
        for ch in 0..channels {
            e.set_track(ch, Some(TrackHandle(ch as u32)));
        }
        (e, mixer)
    }

    #[test]
    fn switching_on_starts_once_at_on_volume() {
        let (mut e, mixer) = engine(2);
        e.set_target(0, true);
        e.set_target(0, true);
        assert_eq!(e.channel(0).unwrap().volume, 105);
        assert!(e.channel(0).unwrap().active);
        assert_eq!(mixer.log().borrow().starts(0), 1);
        assert_eq!(mixer.channel_volume(0), 105);
    }

    #[test]
    fn one_decay_step_truncates() {
        let (mut e, _) = engine(1);
        e.set_target(0, true);
        e.set_target(0, false);
        e.advance();
        // 105 * 0.96 = 100.8
        assert_eq!(e.channel(0).unwrap().volume, 100);
    }

    #[test]
    fn fade_ends_silent_inactive_and_stopped() {
        let (mut e, mixer) = engine(1);
        e.set_target(0, true);
        e.set_target(0, false);
        let mut ticks = 0;
        while e.channel(0).unwrap().fading {
            e.advance();
            ticks += 1;
            assert!(ticks < 200, "fade never finished");
        }
        let ch = *e.channel(0).unwrap();
        assert_eq!(ch, ChannelState::default());
        assert_eq!(mixer.channel_volume(0), 0);
        assert!(mixer.log().borrow().calls.contains(&MixerCall::Stop { channel: 0 }));
    }

    #[test]
    fn switching_on_cancels_a_fade_in_progress() {
        let (mut e, mixer) = engine(1);
        e.set_target(0, true);
        e.set_target(0, false);
        e.advance();
        e.set_target(0, true);
        assert!(!e.channel(0).unwrap().fading);
        assert_eq!(e.channel(0).unwrap().volume, 105);
        // still playing, not restarted
        assert_eq!(mixer.log().borrow().starts(0), 1);
    }

    #[test]
    fn fading_an_idle_channel_is_a_no_op() {
        let (mut e, _) = engine(1);
        e.set_target(0, false);
        assert!(!e.channel(0).unwrap().fading);
        assert_eq!(e.advance(), FadeStep::default());
    }

    #[test]
    fn failed_start_leaves_channel_inactive_and_silent() {
        let mixer = RecordingMixer::new().with_failing_channel(1);
        let mut e = FadeEngine::new(mixer.clone(), FadeCfg::default(), 2).unwrap();
        e.set_track(1, Some(TrackHandle(0)));
        e.set_target(1, true);
        assert_eq!(*e.channel(1).unwrap(), ChannelState::default());
        assert_eq!(mixer.channel_volume(1), 0);
    }

    #[test]
    fn missing_track_leaves_channel_inactive() {
        let mixer = RecordingMixer::new();
        let mut e = FadeEngine::new(mixer, FadeCfg::default(), 1).unwrap();
        e.set_target(0, true);
        assert!(!e.channel(0).unwrap().active);
    }

    #[test]
    fn rewind_waits_for_silence_and_new_activation_disarms() {
        let (mut e, _) = engine(2);
        e.set_target(0, true);
        e.set_target(0, false);
        e.set_target(1, false);
        e.arm_rewind();
        assert!(!e.advance().rewound);
        e.set_target(1, true);
        assert!(!e.rewind_armed());

        e.set_target(0, false);
        e.set_target(1, false);
        e.arm_rewind();
        let mut rewound = false;
        for _ in 0..200 {
            if e.advance().rewound {
                rewound = true;
                break;
            }
        }
        assert!(rewound);
        assert!(e.channels().iter().all(|c| *c == ChannelState::default()));
    }

    #[test]
    fn shutdown_stops_active_channels() {
        let (mut e, mixer) = engine(3);
        e.set_target(0, true);
        e.set_target(2, true);
        e.shutdown();
        assert!(e.channels().iter().all(|c| *c == ChannelState::default()));
        let log = mixer.log();
        let log = log.borrow();
        assert!(log.playing.is_empty());
        assert_eq!(log.volumes.values().copied().max(), Some(0));
    }

    #[test]
    fn invalid_cfg_is_rejected() {
        let cfg = FadeCfg {
            decay: 1.0,
            ..FadeCfg::default()
        };
        assert!(FadeEngine::new(RecordingMixer::new(), cfg, 1).is_err());
    }

    #[test]
    fn zero_floor_is_rejected() {
        let cfg = FadeCfg {
            floor: 0,
            ..FadeCfg::default()
        };
        assert!(validate_fade_cfg(&cfg).is_err());
        assert!(FadeEngine::new(RecordingMixer::new(), cfg, 1).is_err());
    }
}
