use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, OutputPin};
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::{sign_extend_24, wait_until_low_with_timeout};

/// Input channel and gain for the conversion that follows a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gain {
    #[default]
    ChannelA128,
    ChannelB32,
    ChannelA64,
}

impl Gain {
    /// Extra SCK pulses after the 24 data bits.
    pub const fn extra_pulses(self) -> u8 {
        match self {
            Self::ChannelA128 => 1,
            Self::ChannelB32 => 2,
            Self::ChannelA64 => 3,
        }
    }
}

/// Bit-banged HX711 load cell ADC.
pub struct Hx711 {
    dt: InputPin,
    sck: OutputPin,
    gain: Gain,
}

impl Hx711 {
    pub fn open(dt_pin: u8, sck_pin: u8, gain: Gain) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let dt = gpio
            .get(dt_pin)
            .map_err(|e| HwError::Gpio(format!("dt pin {dt_pin}: {e}")))?
            .into_input();
        let mut sck = gpio
            .get(sck_pin)
            .map_err(|e| HwError::Gpio(format!("sck pin {sck_pin}: {e}")))?
            .into_output();
        // Clock idles low; holding it high for >60us powers the chip down.
        sck.set_low();
        Ok(Self { dt, sck, gain })
    }

    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<i32> {
        let dt = &self.dt;
        wait_until_low_with_timeout(|| dt.is_high(), timeout, Duration::from_micros(200))?;

        let mut value: u32 = 0;
        for _ in 0..24 {
            self.pulse();
            value = (value << 1) | u32::from(self.dt.is_high());
        }
        for _ in 0..self.gain.extra_pulses() {
            self.pulse();
        }

        let raw = sign_extend_24(value);
        trace!(raw, "hx711 raw read");
        Ok(raw)
    }

    #[inline]
    fn pulse(&mut self) {
        self.sck.set_high();
        std::hint::spin_loop();
        self.sck.set_low();
        std::hint::spin_loop();
    }
}
