//! Nearest-state classification of a smoothed weight delta.

use crate::error::{Result, config_err};
use crate::state::OccupancyState;
use crate::targets::TargetTable;

/// Outcome of one classification.
///
/// `best` is always the globally nearest state; it is only a candidate when
/// `matches > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub best: OccupancyState,
    pub distance: i64,
    pub matches: usize,
}

impl Classification {
    pub const fn is_confident(&self) -> bool {
        self.matches == 1
    }

    pub const fn is_ambiguous(&self) -> bool {
        self.matches > 1
    }

    pub const fn is_match(&self) -> bool {
        self.matches > 0
    }
}

/// Classify `smoothed` against every target.
///
/// A state is a candidate iff `|target - smoothed| < tolerance`. Ties on
/// distance go to the lowest state index.
pub fn classify(smoothed: i32, table: &TargetTable, tolerance: i32) -> Result<Classification> {
    if tolerance <= 0 {
        return Err(config_err(format!("tolerance must be > 0, got {tolerance}")));
    }
    Ok(scan(smoothed, table, i64::from(tolerance)))
}

fn scan(smoothed: i32, table: &TargetTable, tolerance: i64) -> Classification {
    let smoothed = i64::from(smoothed);
    let mut best = table.space().all_present();
    let mut best_distance = i64::MAX;
    let mut matches = 0;
    for (state, target) in table.entries() {
        let distance = (target - smoothed).abs();
        if distance < tolerance {
            matches += 1;
        }
        if distance < best_distance {
            best = state;
            best_distance = distance;
        }
    }
    Classification {
        best,
        distance: best_distance,
        matches,
    }
}

/// A target table bound to a validated tolerance.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: TargetTable,
    tolerance: i64,
}

impl Classifier {
    pub fn new(table: TargetTable, tolerance: i32) -> Result<Self> {
        if tolerance <= 0 {
            return Err(config_err(format!("tolerance must be > 0, got {tolerance}")));
        }
        Ok(Self {
            table,
            tolerance: i64::from(tolerance),
        })
    }

    pub fn classify(&self, smoothed: i32) -> Classification {
        scan(smoothed, &self.table, self.tolerance)
    }

    pub const fn table(&self) -> &TargetTable {
        &self.table
    }

    pub const fn tolerance(&self) -> i64 {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ItemLayout, StateSpace};
    use crate::targets::ItemWeight;

    fn table() -> TargetTable {
        let space = StateSpace::new(3, ItemLayout::CapOnly).unwrap();
        TargetTable::build(&space, &[629, 728, 426].map(ItemWeight::cap_only)).unwrap()
    }

    #[test]
    fn exact_target_is_confident() {
        let c = classify(-629, &table(), 43).unwrap();
        assert_eq!(c.best.index(), 1);
        assert_eq!(c.distance, 0);
        assert!(c.is_confident());
    }

    #[test]
    fn distance_equal_to_tolerance_never_matches() {
        let c = classify(-629 + 43, &table(), 43).unwrap();
        assert_eq!(c.matches, 0);
        // still reports the nearest state for logging
        assert_eq!(c.best.index(), 1);
        assert_eq!(c.distance, 43);
    }

    #[test]
    fn far_reading_has_no_match() {
        let c = classify(-10_000, &table(), 43).unwrap();
        assert!(!c.is_match());
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        assert!(classify(0, &table(), 0).is_err());
        assert!(Classifier::new(table(), -1).is_err());
    }

    #[test]
    fn ties_go_to_lowest_index() {
        // caps 100 and 100: cap1-off and cap2-off share target -100
        let space = StateSpace::new(2, ItemLayout::CapOnly).unwrap();
        let t = TargetTable::build(&space, &[100, 100].map(ItemWeight::cap_only)).unwrap();
        let c = classify(-100, &t, 10).unwrap();
        assert_eq!(c.best.index(), 1);
        assert_eq!(c.matches, 2);
        assert!(c.is_ambiguous());
    }
}
