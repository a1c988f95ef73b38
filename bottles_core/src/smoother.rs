use crate::error::{Result, config_err};

/// Exponential moving average over weight-delta samples.
///
/// `alpha` is the retention factor: `s = s*alpha + raw*(1-alpha)`.
#[derive(Debug, Clone)]
pub struct Smoother {
    alpha: f32,
    value: f32,
}

impl Smoother {
    pub fn new(alpha: f32) -> Result<Self> {
        if !(alpha.is_finite() && (0.0..1.0).contains(&alpha)) {
            return Err(config_err(format!(
                "smoothing alpha must be in [0.0, 1.0), got {alpha}"
            )));
        }
        Ok(Self { alpha, value: 0.0 })
    }

    /// Fold in one sample and return the smoothed value rounded to the nearest integer.
    pub fn update(&mut self, raw: i32) -> i32 {
        self.value = self.value * self.alpha + raw as f32 * (1.0 - self.alpha);
        self.rounded()
    }

    pub fn rounded(&self) -> i32 {
        self.value.round() as i32
    }

    pub const fn value(&self) -> f32 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}
