use bottles_config::{AmbiguityMode, ItemLayout, load_toml};
use rstest::rstest;

const FULL: &str = r#"
[items]
count = 3
layout = "bottle-and-cap"

[calibration]
weights = [
  { bottle = 1890, cap = 629 },
  { bottle = 1685, cap = 728 },
  { bottle = 1561, cap = 426 },
]

[classifier]
tolerance = 43
ambiguity = "reject"

[scheduler]
tick_ms = 50

[audio]
sets = [["a.wav", "b.wav", "c.wav"], ["d.wav", "e.wav", "f.wav"]]
"#;

#[test]
fn accepts_full_installation_config() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.calibration.weights.len(), 3);
    assert_eq!(cfg.calibration.weights[2].bottle, Some(1561));
    assert_eq!(cfg.classifier.ambiguity, AmbiguityMode::Reject);
    assert_eq!(cfg.audio.sets.len(), 2);
}

#[test]
fn cap_only_layout_needs_no_bottle_weights() {
    let toml = r#"
[items]
count = 3
layout = "cap-only"

[calibration]
weights = [{ cap = 629 }, { cap = 728 }, { cap = 426 }]
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    assert_eq!(cfg.items.layout, ItemLayout::CapOnly);
    cfg.validate().expect("cap-only weights are enough");
}

#[rstest]
#[case("[items]\ncount = 0", "items.count must be >= 1")]
#[case("[items]\ncount = 9", "items.count must be <=")]
#[case("[classifier]\ntolerance = 0", "classifier.tolerance must be > 0")]
#[case("[smoothing]\nalpha = 1.0", "smoothing.alpha must be in")]
#[case("[smoothing]\nalpha = -0.1", "smoothing.alpha must be in")]
#[case(
    "[settle]\nsettle_below = 30\nunsettle_above = 20",
    "settle.settle_below must be <="
)]
#[case("[settle]\nrequired_ticks = 0", "settle.required_ticks must be >= 1")]
#[case("[acquisition]\nsample_count = 0", "acquisition.sample_count must be >= 1")]
#[case("[acquisition]\ndivisor = 0", "acquisition.divisor must be > 0")]
#[case("[fade]\ndecay = 1.0", "fade.decay must be in")]
#[case("[fade]\nfloor = 110", "fade.floor must be < fade.on_volume")]
#[case("[fade]\nfloor = 0", "fade.floor must be >= 1")]
#[case("[fade]\nmax_volume = 200", "fade.max_volume must be in")]
#[case("[scheduler]\ntick_ms = 0", "scheduler.tick_ms must be >= 1")]
#[case("[scheduler]\ntick_ms = 60001", "unreasonably large")]
#[case("[audio]\nsets = []", "audio.sets must contain at least one")]
#[case("[audio]\nsets = [[\"a.wav\"]]", "audio.sets[0] has 1 tracks")]
#[case(
    "[hardware]\nsensor_read_timeout_ms = 0",
    "hardware.sensor_read_timeout_ms must be >= 1"
)]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
#[case("[pins]\nhx711_dt = 19", "GPIO 19 is used both by the HX711")]
fn rejects_invalid_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "expected {needle:?} in {msg:?}");
}

#[test]
fn rejects_weight_count_mismatch() {
    let toml = r#"
[calibration]
weights = [{ bottle = 1890, cap = 629 }]
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("one weight for three items");
    assert!(format!("{err}").contains("1 item weights but items.count is 3"));
}

#[test]
fn rejects_missing_bottle_weight_for_bottle_and_cap() {
    let toml = r#"
[calibration]
weights = [{ bottle = 1890, cap = 629 }, { cap = 728 }, { bottle = 1561, cap = 426 }]
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("item 2 has no bottle weight");
    assert!(format!("{err}").contains("item 2 is missing a bottle weight"));
}

#[test]
fn rejects_indicator_pin_count_mismatch() {
    let toml = r#"
[pins]
indicators = [{ bottle = 18, cap = 17 }]
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("one indicator pair for three items");
    assert!(format!("{err}").contains("pins.indicators has 1 entries"));
}

#[test]
fn unknown_layout_fails_to_parse() {
    assert!(load_toml("[items]\nlayout = \"sideways\"").is_err());
}
