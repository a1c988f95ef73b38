use crate::config::SettleCfg;

/// Holds readings back until consecutive samples agree.
///
/// A jump above `unsettle_above` clears the steady counter, a delta below
/// `settle_below` increments it, anything in between leaves it alone.
#[derive(Debug, Clone)]
pub struct SettleGate {
    cfg: SettleCfg,
    last: Option<i32>,
    steady: u32,
}

impl SettleGate {
    pub const fn new(cfg: SettleCfg) -> Self {
        Self {
            cfg,
            last: None,
            steady: 0,
        }
    }

    /// Record `sample` and report whether it may be classified.
    pub fn observe(&mut self, sample: i32) -> bool {
        if let Some(last) = self.last {
            let delta = (i64::from(sample) - i64::from(last)).abs();
            if delta > i64::from(self.cfg.unsettle_above) {
                self.steady = 0;
            } else if delta < i64::from(self.cfg.settle_below) {
                self.steady = self.steady.saturating_add(1);
            }
        }
        self.last = Some(sample);
        self.is_settled()
    }

    pub const fn is_settled(&self) -> bool {
        self.steady >= self.cfg.required_ticks
    }

    /// Forget history so the next readings must settle again.
    pub fn reset(&mut self) {
        self.last = None;
        self.steady = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(required_ticks: u32) -> SettleGate {
        SettleGate::new(SettleCfg {
            enabled: true,
            unsettle_above: 20,
            settle_below: 10,
            required_ticks,
        })
    }

    #[test]
    fn first_sample_is_never_settled() {
        let mut g = gate(1);
        assert!(!g.observe(0));
        assert!(g.observe(3));
    }

    #[test]
    fn jump_clears_and_middle_band_holds() {
        let mut g = gate(2);
        g.observe(0);
        g.observe(1);
        assert!(g.observe(2));
        // jump of 100 clears
        assert!(!g.observe(102));
        // delta 15 is in the middle band: no progress
        assert!(!g.observe(117));
        assert!(!g.observe(118));
        assert!(g.observe(119));
    }

    #[test]
    fn reset_requires_a_fresh_settle() {
        let mut g = gate(1);
        g.observe(0);
        assert!(g.observe(0));
        g.reset();
        assert!(!g.is_settled());
        assert!(!g.observe(0));
    }
}
