//! Raspberry Pi model detection and peripheral address table.
//!
//! Detection works on the text of `/proc/cpuinfo` so it can be exercised
//! off-target. The address table is a static lookup keyed by model.
use std::fmt;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiModel {
    Pi1,
    Pi2Or3,
    Pi4,
    Unknown,
}

impl fmt::Display for PiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pi1 => "Raspberry Pi 1",
            Self::Pi2Or3 => "Raspberry Pi 2/3",
            Self::Pi4 => "Raspberry Pi 4",
            Self::Unknown => "unknown board",
        };
        f.write_str(s)
    }
}

/// Physical and bus addresses of the BCM peripheral block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peripherals {
    pub base: u32,
    pub bus_base: u32,
    pub gpio_offset: u32,
}

impl Peripherals {
    pub const fn gpio_base(&self) -> u32 {
        self.base + self.gpio_offset
    }
}

const GPIO_OFFSET: u32 = 0x0020_0000;

const PERIPHERALS: [(PiModel, Peripherals); 3] = [
    (
        PiModel::Pi1,
        Peripherals {
            base: 0x2000_0000,
            bus_base: 0x4000_0000,
            gpio_offset: GPIO_OFFSET,
        },
    ),
    (
        PiModel::Pi2Or3,
        Peripherals {
            base: 0x3F00_0000,
            bus_base: 0xC000_0000,
            gpio_offset: GPIO_OFFSET,
        },
    ),
    (
        PiModel::Pi4,
        Peripherals {
            base: 0xFE00_0000,
            bus_base: 0xC000_0000,
            gpio_offset: GPIO_OFFSET,
        },
    ),
];

pub fn peripherals(model: PiModel) -> Option<Peripherals> {
    PERIPHERALS
        .iter()
        .find(|(m, _)| *m == model)
        .map(|(_, p)| *p)
}

/// Revision type codes of the Pi 4 family: 4B, 400, CM4.
const PI4_TYPES: [u32; 3] = [0x11, 0x13, 0x14];

pub fn detect(model_name: Option<&str>, revision: Option<u32>) -> PiModel {
    if let Some(rev) = revision
        && rev & (1 << 23) != 0
        && PI4_TYPES.contains(&((rev >> 4) & 0xFF))
    {
        return PiModel::Pi4;
    }
    match model_name {
        Some(name) if name.contains("ARMv6") => PiModel::Pi1,
        Some(name) if name.contains("ARMv7") || name.contains("ARMv8") => PiModel::Pi2Or3,
        _ => PiModel::Unknown,
    }
}

/// The fields of `/proc/cpuinfo` that detection needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuInfo {
    pub model_name: Option<String>,
    pub revision: Option<u32>,
}

impl CpuInfo {
    pub fn parse(text: &str) -> Self {
        let mut info = Self::default();
        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            if key == "model name" && info.model_name.is_none() {
                info.model_name = Some(value.to_string());
            } else if key == "revision" && info.revision.is_none() {
                info.revision = u32::from_str_radix(value, 16).ok();
            }
        }
        info
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub model: PiModel,
    pub revision: Option<u32>,
    pub peripherals: Option<Peripherals>,
}

impl Board {
    pub fn from_cpuinfo(text: &str) -> Self {
        let info = CpuInfo::parse(text);
        let model = detect(info.model_name.as_deref(), info.revision);
        Self {
            model,
            revision: info.revision,
            peripherals: peripherals(model),
        }
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_cpuinfo(&text))
    }
}
