//! Occupancy state space.
//!
//! A state is one sub-state per item, packed little-endian in base C where
//! C is the per-item cardinality (item 0 is the least significant digit).

use std::fmt;

use crate::error::{Result, config_err};

/// Sub-state of one item on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemState {
    Present,
    /// Cap lifted, bottle still on the platform. This is the sounding state.
    CapOff,
    /// Bottle and cap both lifted.
    Removed,
}

impl ItemState {
    pub const fn digit(self) -> u32 {
        match self {
            Self::Present => 0,
            Self::CapOff => 1,
            Self::Removed => 2,
        }
    }

    const fn from_digit(d: u32) -> Self {
        match d {
            0 => Self::Present,
            1 => Self::CapOff,
            _ => Self::Removed,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::CapOff => "cap-off",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemLayout {
    /// present / cap-off
    CapOnly,
    /// present / cap-off / removed
    #[default]
    BottleAndCap,
}

impl ItemLayout {
    pub const fn cardinality(self) -> u32 {
        match self {
            Self::CapOnly => 2,
            Self::BottleAndCap => 3,
        }
    }

    /// The sub-state in which the item is off the platform as far as this layout can tell.
    pub const fn absent(self) -> ItemState {
        match self {
            Self::CapOnly => ItemState::CapOff,
            Self::BottleAndCap => ItemState::Removed,
        }
    }
}

pub const MAX_ITEMS: usize = 8;

/// The fixed set of states for a given item count and layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpace {
    items: u8,
    layout: ItemLayout,
}

impl StateSpace {
    pub fn new(items: usize, layout: ItemLayout) -> Result<Self> {
        if items == 0 || items > MAX_ITEMS {
            return Err(config_err(format!(
                "item count must be in 1..={MAX_ITEMS}, got {items}"
            )));
        }
        Ok(Self {
            items: items as u8,
            layout,
        })
    }

    pub const fn items(&self) -> usize {
        self.items as usize
    }

    pub const fn layout(&self) -> ItemLayout {
        self.layout
    }

    /// Number of states: C^K.
    pub const fn len(&self) -> usize {
        self.layout.cardinality().pow(self.items as u32) as usize
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    pub fn state(&self, index: usize) -> Option<OccupancyState> {
        (index < self.len()).then(|| OccupancyState {
            index: index as u32,
            items: self.items,
            cardinality: self.layout.cardinality() as u8,
        })
    }

    pub fn all_present(&self) -> OccupancyState {
        OccupancyState {
            index: 0,
            items: self.items,
            cardinality: self.layout.cardinality() as u8,
        }
    }

    pub fn from_items(&self, items: &[ItemState]) -> Result<OccupancyState> {
        if items.len() != self.items() {
            return Err(config_err(format!(
                "expected {} item states, got {}",
                self.items(),
                items.len()
            )));
        }
        let c = self.layout.cardinality();
        let mut index = 0u32;
        for item in items.iter().rev() {
            if item.digit() >= c {
                return Err(config_err(format!(
                    "{item} is not a valid sub-state for this layout"
                )));
            }
            index = index * c + item.digit();
        }
        Ok(OccupancyState {
            index,
            items: self.items,
            cardinality: c as u8,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = OccupancyState> + '_ {
        (0..self.len()).filter_map(|i| self.state(i))
    }
}

/// One combination of item sub-states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OccupancyState {
    index: u32,
    items: u8,
    cardinality: u8,
}

impl OccupancyState {
    pub const fn index(&self) -> usize {
        self.index as usize
    }

    pub const fn item_count(&self) -> usize {
        self.items as usize
    }

    /// Sub-state of item `i`. Items past the end read as present.
    pub fn item(&self, i: usize) -> ItemState {
        if i >= self.item_count() {
            return ItemState::Present;
        }
        let c = u32::from(self.cardinality);
        ItemState::from_digit((self.index / c.pow(i as u32)) % c)
    }

    pub fn items(&self) -> impl Iterator<Item = ItemState> + '_ {
        (0..self.item_count()).map(|i| self.item(i))
    }

    pub const fn is_all_present(&self) -> bool {
        self.index == 0
    }

    /// Every item is in its last sub-state.
    pub fn is_all_absent(&self) -> bool {
        let last = if self.cardinality == 2 {
            ItemState::CapOff
        } else {
            ItemState::Removed
        };
        self.items().all(|s| s == last)
    }
}

impl fmt::Display for OccupancyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, s) in self.items().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(s.as_str())?;
        }
        f.write_str("]")
    }
}
