use bottles_traits::IndicatorOutput;

use crate::state::{ItemState, OccupancyState};

/// Output pins mirroring one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorPins {
    /// High while the bottle is on the platform.
    pub bottle: Option<u8>,
    /// High while the cap is on the bottle.
    pub cap: Option<u8>,
}

/// Writes item occupancy to the lighting controller inputs.
pub struct IndicatorBank<O> {
    out: O,
    pins: Vec<IndicatorPins>,
}

impl<O: IndicatorOutput> IndicatorBank<O> {
    pub const fn new(out: O, pins: Vec<IndicatorPins>) -> Self {
        Self { out, pins }
    }

    /// Write every configured pin for `state`. Failures are logged and skipped.
    pub fn apply(&mut self, state: &OccupancyState) {
        for (i, pins) in self.pins.iter().enumerate() {
            let item = state.item(i);
            let levels = [
                (pins.bottle, item != ItemState::Removed),
                (pins.cap, item == ItemState::Present),
            ];
            for (pin, level) in levels {
                let Some(pin) = pin else { continue };
                if let Err(e) = self.out.write_output(pin, level) {
                    tracing::warn!(pin, level, error = %e, "indicator write failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingIndicators;
    use crate::state::{ItemLayout, StateSpace};

    fn pins() -> Vec<IndicatorPins> {
        [(18, 17), (27, 22), (23, 24)]
            .map(|(b, c)| IndicatorPins {
                bottle: Some(b),
                cap: Some(c),
            })
            .to_vec()
    }

    #[test]
    fn levels_follow_item_states() {
        let space = StateSpace::new(3, ItemLayout::BottleAndCap).unwrap();
        let rec = RecordingIndicators::new();
        let mut bank = IndicatorBank::new(rec.clone(), pins());
        let s = space
            .from_items(&[ItemState::Present, ItemState::CapOff, ItemState::Removed])
            .unwrap();
        bank.apply(&s);
        assert_eq!(rec.level(18), Some(true));
        assert_eq!(rec.level(17), Some(true));
        assert_eq!(rec.level(27), Some(true));
        assert_eq!(rec.level(22), Some(false));
        assert_eq!(rec.level(23), Some(false));
        assert_eq!(rec.level(24), Some(false));
    }

    #[test]
    fn unconfigured_pins_are_skipped() {
        let space = StateSpace::new(1, ItemLayout::CapOnly).unwrap();
        let rec = RecordingIndicators::new();
        let mut bank = IndicatorBank::new(
            rec.clone(),
            vec![IndicatorPins {
                bottle: None,
                cap: Some(4),
            }],
        );
        bank.apply(&space.state(1).unwrap());
        assert_eq!(rec.level(4), Some(false));
        assert_eq!(rec.level(0), None);
    }
}
