//! Hardware adapters for the music bottles installation.
//!
//! The default build only ships simulators and the board table. The
//! `hardware` feature adds the HX711 driver and GPIO indicators/buttons
//! over `rppal`.
pub mod board;
pub mod error;
pub mod sim;
pub mod util;

#[cfg(feature = "hardware")]
pub mod gpio;
#[cfg(feature = "hardware")]
pub mod hx711;

pub use board::{Board, PiModel, Peripherals};
pub use sim::{SimulatedButtons, SimulatedIndicators, SimulatedMixer, SimulatedScale};

#[cfg(feature = "hardware")]
pub use gpio::{GpioButtons, GpioIndicators, HardwareScale};
