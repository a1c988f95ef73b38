//! Turning raw ADC reads into tared, scaled weight deltas.

use std::time::Duration;

use bottles_traits::Scale;

use crate::config::AcquisitionCfg;
use crate::error::{Result, config_err};
use crate::hw_error::map_hw_error;

/// Read `count` raw values, then `passes` times drop the value farthest from
/// the current mean (never below one value). Returns the rounded mean.
pub fn clean_sample<S: Scale + ?Sized>(
    scale: &mut S,
    count: u32,
    passes: u32,
    timeout: Duration,
) -> Result<i32> {
    let count = count.max(1);
    let mut values: Vec<i64> = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let raw = scale
            .read(timeout)
            .map_err(|e| eyre::Report::new(map_hw_error(e.as_ref())))?;
        values.push(i64::from(raw));
    }
    Ok(trimmed_mean(&mut values, passes))
}

pub(crate) fn trimmed_mean(values: &mut Vec<i64>, passes: u32) -> i32 {
    for _ in 0..passes {
        if values.len() <= 1 {
            break;
        }
        let mean = mean(values);
        let mut worst = 0;
        let mut worst_dev = -1.0f64;
        for (i, &v) in values.iter().enumerate() {
            let dev = (v as f64 - mean).abs();
            if dev > worst_dev {
                worst = i;
                worst_dev = dev;
            }
        }
        values.swap_remove(worst);
    }
    mean(values).round() as i32
}

fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

/// Load cell plus tare baseline.
pub struct WeightReader<S> {
    scale: S,
    cfg: AcquisitionCfg,
    timeout: Duration,
    tare: i32,
}

impl<S: Scale> WeightReader<S> {
    pub fn new(scale: S, cfg: AcquisitionCfg, timeout: Duration) -> Result<Self> {
        if cfg.divisor <= 0 {
            return Err(config_err("acquisition divisor must be > 0"));
        }
        Ok(Self {
            scale,
            cfg,
            timeout,
            tare: 0,
        })
    }

    /// Capture a clean sample as the new zero baseline and return it.
    pub fn tare(&mut self, samples: u32, passes: u32) -> Result<i32> {
        let t = clean_sample(&mut self.scale, samples, passes, self.timeout)?;
        tracing::info!(tare = t, samples, passes, "tare captured");
        self.tare = t;
        Ok(t)
    }

    pub fn set_tare(&mut self, tare: i32) {
        self.tare = tare;
    }

    pub const fn tare_value(&self) -> i32 {
        self.tare
    }

    pub const fn cfg(&self) -> &AcquisitionCfg {
        &self.cfg
    }

    /// `(clean_sample - tare) / divisor`, truncating toward zero.
    pub fn read_delta(&mut self) -> Result<i32> {
        let raw = clean_sample(
            &mut self.scale,
            self.cfg.sample_count,
            self.cfg.averaging_passes,
            self.timeout,
        )?;
        let delta = (i64::from(raw) - i64::from(self.tare)) / i64::from(self.cfg.divisor);
        tracing::trace!(raw, tare = self.tare, delta, "weight delta");
        Ok(i32::try_from(delta).unwrap_or(if delta < 0 { i32::MIN } else { i32::MAX }))
    }

    pub const fn scale(&self) -> &S {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ScriptedScale;

    const T: Duration = Duration::from_millis(10);

    #[test]
    fn trimming_drops_outliers_first() {
        let mut v = vec![100, 101, 99, 5000, 100];
        assert_eq!(trimmed_mean(&mut v, 1), 100);
        assert_eq!(v.len(), 4);
    }

    #[test]
    fn trimming_keeps_at_least_one_value() {
        let mut v = vec![10, 20];
        // equal deviations: the first one goes
        assert_eq!(trimmed_mean(&mut v, 5), 20);
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn clean_sample_reads_exactly_count_values() {
        let mut scale = ScriptedScale::new([1, 2, 3, 900, 4]);
        let v = clean_sample(&mut scale, 3, 0, T).unwrap();
        assert_eq!(v, 2);
        assert_eq!(scale.reads(), 3);
    }

    #[test]
    fn read_delta_subtracts_tare_then_divides() {
        let scale = ScriptedScale::new([50_000, 50_000, -12_900, -12_900]);
        let mut r = WeightReader::new(scale, AcquisitionCfg::default(), T).unwrap();
        r.tare(2, 0).unwrap();
        assert_eq!(r.tare_value(), 50_000);
        // (-12900 - 50000) / 100 = -629
        assert_eq!(r.read_delta().unwrap(), -629);
    }

    #[test]
    fn division_truncates_toward_zero() {
        let scale = ScriptedScale::new([-199, -199]);
        let mut r = WeightReader::new(scale, AcquisitionCfg::default(), T).unwrap();
        assert_eq!(r.read_delta().unwrap(), -1);
    }

    #[test]
    fn read_errors_propagate() {
        let mut scale = ScriptedScale::new([1]).then_fail();
        scale.read(T).unwrap();
        let err = clean_sample(&mut scale, 2, 0, T).unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }
}
