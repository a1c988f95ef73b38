//! Human-readable error descriptions and structured JSON error formatting.

use bottles_core::error::{BottlesError, BuildError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingWeights => {
                "What happened: No item weights were given to the classifier.\nLikely causes: [calibration].weights is empty and neither --weights-csv nor --weights was passed.\nHow to fix: Measure each item with `bottles measure`, then add the weights to the config.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BottlesError>() {
        return match be {
            BottlesError::Config(msg) => {
                if msg.contains("must have headers") {
                    return "What happened: Invalid headers in weights CSV.\nLikely causes: The first line is not a recognised header.\nHow to fix: Start the file with 'bottle,cap' (or 'cap' for the cap-only layout).".to_string();
                }
                format!(
                    "What happened: Invalid configuration ({msg}).\nLikely causes: Item weights, track sets and items.count disagree, or a value is out of range.\nHow to fix: Edit the config file (or the --weights/--tolerance flags), then rerun."
                )
            }
            BottlesError::CollaboratorInit(msg) => format!(
                "What happened: A collaborator failed to start ({msg}).\nLikely causes: A track file is missing, the HX711 is not answering, or GPIO access was denied.\nHow to fix: Check the [audio] paths and the [pins] wiring, then run `bottles self-check`."
            ),
            BottlesError::Timeout => {
                "What happened: Scale read timed out.\nLikely causes: HX711 not wired correctly, no power/ground, or timeout too low.\nHow to fix: Verify DT/SCK pins and power, and consider increasing hardware.sensor_read_timeout_ms in the config.".to_string()
            }
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from hardware init
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if (lower.contains("hx711") && lower.contains("timeout")) || lower.contains("data-ready") {
        return "What happened: HX711 did not produce data within the configured timeout.\nLikely causes: Wrong DT/SCK pins, wiring/power issues, or timeout configured too low.\nHow to fix: Check [pins] in the config, verify 5V/GND, and raise hardware.sensor_read_timeout_ms.".to_string();
    }

    if lower.contains("gpio") {
        return "What happened: Failed to initialize GPIO pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 configuration, 3 collaborator initialization, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<BottlesError>() {
        Some(BottlesError::Config(_)) => 2,
        Some(BottlesError::CollaboratorInit(_)) => 3,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<BottlesError>() {
        Some(BottlesError::Config(_)) => "Config",
        Some(BottlesError::CollaboratorInit(_)) => "CollaboratorInit",
        Some(BottlesError::Timeout) => "Timeout",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
