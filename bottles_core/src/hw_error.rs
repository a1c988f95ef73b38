//! Maps `Box<dyn Error>` from trait boundaries to typed `BottlesError`.
//!
//! The traits in `bottles_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to the typed enum, with an optional feature-gated
//! path for `bottles_hardware::HwError` downcasting.

use crate::error::BottlesError;

/// Map a trait-boundary error to a typed `BottlesError`.
///
/// Known hardware error types are downcast first, then string heuristics apply.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> BottlesError {
    #[cfg(feature = "hardware-errors")]
    {
        use bottles_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout | HwError::DataReadyTimeout => BottlesError::Timeout,
                other => BottlesError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        BottlesError::Timeout
    } else {
        BottlesError::Hardware(s)
    }
}
