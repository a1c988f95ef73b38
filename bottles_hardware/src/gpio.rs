use std::collections::HashMap;
use std::time::Duration;

use bottles_traits::{BoxError, Button, ButtonInput, IndicatorOutput, Scale};
use rppal::gpio::{Gpio, InputPin, OutputPin};

use crate::error::{HwError, Result};
use crate::hx711::{Gain, Hx711};
use crate::util::pressed_from_level;

fn gpio() -> Result<Gpio> {
    Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))
}

pub struct HardwareScale {
    hx711: Hx711,
    max_retries: u32,
}

impl HardwareScale {
    pub fn try_new(dt_pin: u8, sck_pin: u8) -> Result<Self> {
        Ok(Self {
            hx711: Hx711::open(dt_pin, sck_pin, Gain::ChannelA128)?,
            max_retries: 3,
        })
    }
}

impl Scale for HardwareScale {
    fn read(&mut self, timeout: Duration) -> std::result::Result<i32, BoxError> {
        let mut attempts = 0;
        loop {
            match self.hx711.read_with_timeout(timeout) {
                Ok(raw) => return Ok(raw),
                Err(HwError::DataReadyTimeout) if attempts < self.max_retries => {
                    attempts += 1;
                    tracing::warn!(retries = attempts, "hx711 not ready, retrying");
                }
                Err(e) => return Err(Box::new(e)),
            }
        }
    }
}

/// Output pins opened on first write and held for the process lifetime.
pub struct GpioIndicators {
    gpio: Gpio,
    pins: HashMap<u8, OutputPin>,
}

impl GpioIndicators {
    pub fn try_new() -> Result<Self> {
        Ok(Self {
            gpio: gpio()?,
            pins: HashMap::new(),
        })
    }
}

impl IndicatorOutput for GpioIndicators {
    fn write_output(&mut self, pin: u8, level: bool) -> std::result::Result<(), BoxError> {
        let out = match self.pins.entry(pin) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(v) => {
                let p = self
                    .gpio
                    .get(pin)
                    .map_err(|e| HwError::Gpio(format!("output pin {pin}: {e}")))?
                    .into_output();
                v.insert(p)
            }
        };
        if level {
            out.set_high();
        } else {
            out.set_low();
        }
        Ok(())
    }
}

/// Active-low buttons with internal pull-ups.
pub struct GpioButtons {
    retare: Option<InputPin>,
    track_sets: Vec<InputPin>,
}

impl GpioButtons {
    pub fn try_new(retare: Option<u8>, track_sets: &[u8]) -> Result<Self> {
        let gpio = gpio()?;
        let open = |pin: u8| -> Result<InputPin> {
            Ok(gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(format!("input pin {pin}: {e}")))?
                .into_input_pullup())
        };
        let retare = retare.map(open).transpose()?;
        let track_sets = track_sets
            .iter()
            .map(|&p| open(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { retare, track_sets })
    }
}

impl ButtonInput for GpioButtons {
    fn poll(&mut self) -> std::result::Result<Option<Button>, BoxError> {
        if let Some(pin) = &self.retare
            && pressed_from_level(pin.is_high())
        {
            return Ok(Some(Button::Retare));
        }
        Ok(self
            .track_sets
            .iter()
            .position(|pin| pressed_from_level(pin.is_high()))
            .map(Button::TrackSet))
    }
}
