#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and weight calibration parsing for the music bottles installation.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section has defaults, so an empty file is a valid starting point.
//! - Item weights come from `[calibration].weights`, a CSV file with a strict
//!   header, or a flat list on the command line (`parse_weight_list`).
use serde::Deserialize;

/// How many physical sub-states each tracked item has.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ItemLayout {
    /// present / cap removed
    CapOnly,
    /// present / cap removed / bottle and cap removed
    #[default]
    BottleAndCap,
}

impl ItemLayout {
    pub fn needs_bottle_weight(self) -> bool {
        matches!(self, Self::BottleAndCap)
    }
}

/// Calibrated weight of one item, in scaled sensor units (raw delta / divisor).
///
/// Also the CSV row schema. Expected headers:
/// bottle,cap
///
/// Example:
/// bottle,cap
/// 1890,629
/// 1685,728
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ItemWeight {
    #[serde(default)]
    pub bottle: Option<u32>,
    pub cap: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Items {
    /// Number of independently removable items (one audio track each).
    pub count: usize,
    pub layout: ItemLayout,
}

impl Default for Items {
    fn default() -> Self {
        Self {
            count: 3,
            layout: ItemLayout::BottleAndCap,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Per-item weights in item order. May be left empty and supplied on the CLI.
    pub weights: Vec<ItemWeight>,
    /// Fixed tare in raw counts; when absent a tare is captured at startup.
    pub tare: Option<i32>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityMode {
    /// Accept the closest candidate when several states are within tolerance.
    #[default]
    AcceptClosest,
    /// Treat several candidates like no match and keep the committed state.
    Reject,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClassifierCfg {
    /// Match margin in scaled units; a state matches when distance < tolerance.
    pub tolerance: i32,
    pub ambiguity: AmbiguityMode,
}

impl Default for ClassifierCfg {
    fn default() -> Self {
        Self {
            tolerance: 43,
            ambiguity: AmbiguityMode::AcceptClosest,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SmoothingCfg {
    /// Weight of the previous smoothed value: s = s*alpha + raw*(1-alpha). Range [0.0, 1.0).
    pub alpha: f32,
}

impl Default for SmoothingCfg {
    fn default() -> Self {
        Self { alpha: 0.85 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SettleCfg {
    pub enabled: bool,
    /// Consecutive-sample jump that marks the platform as moving.
    pub unsettle_above: i32,
    /// Consecutive-sample delta counted as steady.
    pub settle_below: i32,
    /// Steady ticks needed before readings reach the classifier.
    pub required_ticks: u32,
}

impl Default for SettleCfg {
    fn default() -> Self {
        Self {
            enabled: false,
            unsettle_above: 20,
            settle_below: 10,
            required_ticks: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AcquisitionCfg {
    /// Raw reads combined into one tick sample.
    pub sample_count: u32,
    /// Outlier-trimming passes over those reads.
    pub averaging_passes: u32,
    /// (raw - tare) is divided by this before smoothing.
    pub divisor: i32,
    pub tare_samples: u32,
    pub tare_passes: u32,
    pub retare_samples: u32,
    pub retare_passes: u32,
}

impl Default for AcquisitionCfg {
    fn default() -> Self {
        Self {
            sample_count: 2,
            averaging_passes: 5,
            divisor: 100,
            tare_samples: 150,
            tare_passes: 4,
            retare_samples: 35,
            retare_passes: 4,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FadeCfg {
    /// Volume applied when a channel is switched on.
    pub on_volume: u8,
    /// A fading channel below this volume is stopped.
    pub floor: u8,
    /// Per-tick multiplicative decay while fading. Range (0.0, 1.0).
    pub decay: f32,
    /// Backend maximum volume.
    pub max_volume: u8,
}

impl Default for FadeCfg {
    fn default() -> Self {
        Self {
            on_volume: 105,
            floor: 5,
            decay: 0.96,
            max_volume: 128,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerCfg {
    pub tick_ms: u64,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self { tick_ms: 50 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AudioCfg {
    /// Track sets, each with one track path per item. Set 0 is active at startup.
    pub sets: Vec<Vec<String>>,
    /// Optional track that pre-empts the others while every item is off the platform.
    pub override_track: Option<String>,
}

impl Default for AudioCfg {
    fn default() -> Self {
        Self {
            sets: vec![vec![
                "music-files/classic1.wav".to_string(),
                "music-files/classic2.wav".to_string(),
                "music-files/classic3.wav".to_string(),
            ]],
            override_track: Some("music-files/birthday.wav".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndicatorPins {
    #[serde(default)]
    pub bottle: Option<u8>,
    #[serde(default)]
    pub cap: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pins {
    pub hx711_dt: u8,
    pub hx711_sck: u8,
    pub retare: Option<u8>,
    /// One input per track set, in set order.
    pub track_sets: Vec<u8>,
    /// One pin pair per item, in item order.
    pub indicators: Vec<IndicatorPins>,
}

impl Default for Pins {
    fn default() -> Self {
        let pair = |bottle, cap| IndicatorPins {
            bottle: Some(bottle),
            cap: Some(cap),
        };
        Self {
            hx711_dt: 5,
            hx711_sck: 6,
            retare: Some(26),
            track_sets: vec![19, 13, 16, 20],
            indicators: vec![pair(18, 17), pair(27, 22), pair(23, 24)],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// Max time to wait for HX711 data-ready (DT low) before failing a read
    pub sensor_read_timeout_ms: u64,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sensor_read_timeout_ms: 150,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub items: Items,
    pub calibration: CalibrationCfg,
    pub classifier: ClassifierCfg,
    pub smoothing: SmoothingCfg,
    pub settle: SettleCfg,
    pub acquisition: AcquisitionCfg,
    pub fade: FadeCfg,
    pub scheduler: SchedulerCfg,
    pub audio: AudioCfg,
    pub pins: Pins,
    pub hardware: Hardware,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Upper bound on tracked items; 3^8 states is still a trivial scan per tick.
pub const MAX_ITEMS: usize = 8;

/// Parse a flat weight list as given on the command line.
///
/// For `BottleAndCap` the values come in pairs `bottle,cap` per item (so
/// `1890,629,1685,728` is two items); for `CapOnly` every value is a cap.
/// Separators may be commas or whitespace.
pub fn parse_weight_list(s: &str, layout: ItemLayout) -> eyre::Result<Vec<ItemWeight>> {
    let mut values = Vec::new();
    for tok in s.split(|c: char| c == ',' || c.is_whitespace()) {
        let tok = tok.trim();
        if tok.is_empty() {
            continue;
        }
        let v: u32 = tok
            .parse()
            .map_err(|e| eyre::eyre!("invalid weight {tok:?}: {e}"))?;
        values.push(v);
    }
    if values.is_empty() {
        eyre::bail!("weight list is empty");
    }
    match layout {
        ItemLayout::CapOnly => Ok(values
            .into_iter()
            .map(|cap| ItemWeight { bottle: None, cap })
            .collect()),
        ItemLayout::BottleAndCap => {
            if values.len() % 2 != 0 {
                eyre::bail!(
                    "bottle-and-cap weights come in bottle,cap pairs, got {} values",
                    values.len()
                );
            }
            Ok(values
                .chunks_exact(2)
                .map(|pair| ItemWeight {
                    bottle: Some(pair[0]),
                    cap: pair[1],
                })
                .collect())
        }
    }
}

/// Load per-item weights from a CSV file with header `bottle,cap` or `cap`.
pub fn load_weights_csv(path: &std::path::Path) -> eyre::Result<Vec<ItemWeight>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open weights CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != ["bottle", "cap"] && actual != ["cap"] {
        eyre::bail!(
            "weights CSV must have headers 'bottle,cap' or 'cap', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ItemWeight>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    if rows.is_empty() {
        eyre::bail!("weights CSV {:?} has no rows", path);
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Items
        if self.items.count == 0 {
            eyre::bail!("items.count must be >= 1");
        }
        if self.items.count > MAX_ITEMS {
            eyre::bail!("items.count must be <= {MAX_ITEMS}");
        }

        // Calibration (weights may be supplied later on the CLI)
        if !self.calibration.weights.is_empty() {
            check_weights(&self.calibration.weights, &self.items)?;
        }

        // Classifier
        if self.classifier.tolerance <= 0 {
            eyre::bail!("classifier.tolerance must be > 0");
        }

        // Smoothing
        let alpha = self.smoothing.alpha;
        if !(alpha.is_finite() && (0.0..1.0).contains(&alpha)) {
            eyre::bail!("smoothing.alpha must be in [0.0, 1.0)");
        }

        // Settle gate
        if self.settle.settle_below < 0 || self.settle.unsettle_above < 0 {
            eyre::bail!("settle thresholds must be >= 0");
        }
        if self.settle.settle_below > self.settle.unsettle_above {
            eyre::bail!("settle.settle_below must be <= settle.unsettle_above");
        }
        if self.settle.required_ticks == 0 {
            eyre::bail!("settle.required_ticks must be >= 1");
        }

        // Acquisition
        if self.acquisition.sample_count == 0 {
            eyre::bail!("acquisition.sample_count must be >= 1");
        }
        if self.acquisition.divisor <= 0 {
            eyre::bail!("acquisition.divisor must be > 0");
        }
        if self.acquisition.tare_samples == 0 {
            eyre::bail!("acquisition.tare_samples must be >= 1");
        }
        if self.acquisition.retare_samples == 0 {
            eyre::bail!("acquisition.retare_samples must be >= 1");
        }

        // Fade
        let fade = &self.fade;
        if fade.max_volume == 0 || fade.max_volume > 128 {
            eyre::bail!("fade.max_volume must be in [1, 128]");
        }
        if fade.on_volume == 0 || fade.on_volume > fade.max_volume {
            eyre::bail!("fade.on_volume must be in [1, fade.max_volume]");
        }
        if fade.floor == 0 {
            eyre::bail!("fade.floor must be >= 1");
        }
        if fade.floor >= fade.on_volume {
            eyre::bail!("fade.floor must be < fade.on_volume");
        }
        if !(fade.decay.is_finite() && fade.decay > 0.0 && fade.decay < 1.0) {
            eyre::bail!("fade.decay must be in (0.0, 1.0)");
        }

        // Scheduler
        if self.scheduler.tick_ms == 0 {
            eyre::bail!("scheduler.tick_ms must be >= 1");
        }
        if self.scheduler.tick_ms > 60_000 {
            eyre::bail!("scheduler.tick_ms is unreasonably large (>60s)");
        }

        // Audio
        if self.audio.sets.is_empty() {
            eyre::bail!("audio.sets must contain at least one track set");
        }
        for (i, set) in self.audio.sets.iter().enumerate() {
            if set.len() != self.items.count {
                eyre::bail!(
                    "audio.sets[{i}] has {} tracks but items.count is {}",
                    set.len(),
                    self.items.count
                );
            }
        }

        // Pins
        if !self.pins.indicators.is_empty() && self.pins.indicators.len() != self.items.count {
            eyre::bail!(
                "pins.indicators has {} entries but items.count is {}",
                self.pins.indicators.len(),
                self.items.count
            );
        }
        let inputs = self.pins.retare.iter().chain(&self.pins.track_sets);
        if let Some(pin) = inputs
            .copied()
            .find(|&p| p == self.pins.hx711_dt || p == self.pins.hx711_sck)
        {
            eyre::bail!("pins: GPIO {pin} is used both by the HX711 and by a button");
        }

        // Hardware
        if self.hardware.sensor_read_timeout_ms == 0 {
            eyre::bail!("hardware.sensor_read_timeout_ms must be >= 1");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly (got {r:?})");
        }

        Ok(())
    }
}

/// Check a weight list against the configured item count and layout.
pub fn check_weights(weights: &[ItemWeight], items: &Items) -> eyre::Result<()> {
    if weights.len() != items.count {
        eyre::bail!(
            "calibration has {} item weights but items.count is {}",
            weights.len(),
            items.count
        );
    }
    if items.layout.needs_bottle_weight()
        && let Some(i) = weights.iter().position(|w| w.bottle.is_none())
    {
        eyre::bail!("item {} is missing a bottle weight (layout is bottle-and-cap)", i + 1);
    }
    if let Some(i) = weights
        .iter()
        .position(|w| w.cap == 0 || w.bottle == Some(0))
    {
        eyre::bail!("item {} has a zero weight; weights must be > 0", i + 1);
    }
    Ok(())
}
