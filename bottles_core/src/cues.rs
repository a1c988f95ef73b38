use bottles_traits::AudioBackend;

use crate::fade::FadeEngine;
use crate::state::{ItemState, OccupancyState};

/// Per-channel on/off targets for a committed state.
///
/// `targets` has one entry per item channel followed by the override channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuePlan {
    pub targets: Vec<bool>,
    pub arm_rewind: bool,
}

impl CuePlan {
    /// - everything present: fade all and arm the rewind
    /// - everything absent with an override track: override only
    /// - otherwise: item channel i plays iff item i has its cap off
    pub fn for_state(state: &OccupancyState, override_available: bool) -> Self {
        let items = state.item_count();
        if state.is_all_present() {
            return Self {
                targets: vec![false; items + 1],
                arm_rewind: true,
            };
        }
        if override_available && state.is_all_absent() {
            let mut targets = vec![false; items + 1];
            targets[items] = true;
            return Self {
                targets,
                arm_rewind: false,
            };
        }
        let targets = state
            .items()
            .map(|s| s == ItemState::CapOff)
            .chain(std::iter::once(false))
            .collect();
        Self {
            targets,
            arm_rewind: false,
        }
    }

    pub fn apply<A: AudioBackend>(&self, fade: &mut FadeEngine<A>) {
        // ons last: switching on disarms a pending rewind
        for (ch, _) in self.targets.iter().enumerate().filter(|(_, on)| !**on) {
            fade.set_target(ch, false);
        }
        if self.arm_rewind {
            fade.arm_rewind();
        }
        for (ch, _) in self.targets.iter().enumerate().filter(|(_, on)| **on) {
            fade.set_target(ch, true);
        }
    }
}
