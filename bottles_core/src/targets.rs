//! Expected weight delta for every occupancy state.

use crate::error::{Result, config_err};
use crate::state::{ItemLayout, ItemState, OccupancyState, StateSpace};

/// Calibrated weight of one item in scaled sensor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemWeight {
    pub bottle: Option<u32>,
    pub cap: u32,
}

impl ItemWeight {
    pub const fn cap_only(cap: u32) -> Self {
        Self { bottle: None, cap }
    }

    pub const fn bottle_and_cap(bottle: u32, cap: u32) -> Self {
        Self {
            bottle: Some(bottle),
            cap,
        }
    }

    /// Signed contribution of this item in `state` to the total delta.
    pub fn contribution(&self, state: ItemState) -> i64 {
        match state {
            ItemState::Present => 0,
            ItemState::CapOff => -i64::from(self.cap),
            ItemState::Removed => -(i64::from(self.bottle.unwrap_or(0)) + i64::from(self.cap)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TargetTable {
    space: StateSpace,
    targets: Vec<i64>,
}

impl TargetTable {
    pub fn build(space: &StateSpace, weights: &[ItemWeight]) -> Result<Self> {
        if weights.len() != space.items() {
            return Err(config_err(format!(
                "{} item weights supplied for {} items",
                weights.len(),
                space.items()
            )));
        }
        for (i, w) in weights.iter().enumerate() {
            if w.cap == 0 {
                return Err(config_err(format!("item {} cap weight must be > 0", i + 1)));
            }
            match (space.layout(), w.bottle) {
                (ItemLayout::BottleAndCap, None) => {
                    return Err(config_err(format!(
                        "item {} needs a bottle weight for the bottle-and-cap layout",
                        i + 1
                    )));
                }
                (ItemLayout::BottleAndCap, Some(0)) => {
                    return Err(config_err(format!(
                        "item {} bottle weight must be > 0",
                        i + 1
                    )));
                }
                _ => {}
            }
        }

        let targets = space
            .iter()
            .map(|s| {
                weights
                    .iter()
                    .zip(s.items())
                    .map(|(w, st)| w.contribution(st))
                    .sum()
            })
            .collect();
        Ok(Self {
            space: *space,
            targets,
        })
    }

    pub const fn space(&self) -> &StateSpace {
        &self.space
    }

    pub fn target(&self, state: &OccupancyState) -> i64 {
        self.targets.get(state.index()).copied().unwrap_or(0)
    }

    /// (state, target) pairs in index order.
    pub fn entries(&self) -> impl Iterator<Item = (OccupancyState, i64)> + '_ {
        self.space.iter().zip(self.targets.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
