//! Command logic: config mapping, hardware assembly, and the player loop.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use bottles_config::{Config, ItemWeight as CfgWeight};
use bottles_core::error::{BottlesError, BuildError, Report};
use bottles_core::util::{fade_ticks, tick_period};
use bottles_core::{
    AcquisitionCfg, ClassifierCfg, IndicatorPins, ItemLayout, ItemWeight, RunSummary, Scheduler,
    SchedulerCfg, Smoother, StateSpace, StopReason, TargetTable, TickReport, Timeouts,
    TrackLibrary, WeightReader, conversions,
};
use bottles_hardware::{Board, SimulatedMixer};
use bottles_traits::{Button, ButtonInput, Clock, IndicatorOutput, MonotonicClock, Scale};
use serde_json::json;

fn config_error(msg: impl std::fmt::Display) -> Report {
    Report::new(BottlesError::Config(msg.to_string()))
}

fn init_error(what: &str, err: impl std::fmt::Display) -> Report {
    Report::new(BottlesError::CollaboratorInit(format!("{what}: {err}")))
}

/// Read, parse and validate the TOML config.
pub fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| config_error(format!("read config {}: {e}", path.display())))?;
    let cfg: Config = toml::from_str(&text)
        .map_err(|e| config_error(format!("parse config {}: {e}", path.display())))?;
    cfg.validate().map_err(|e| config_error(format!("{e:#}")))?;
    Ok(cfg)
}

/// Item weights from `--weights`, else the CSV, else `[calibration].weights`.
///
/// Checked against `[items]` before any hardware is opened.
pub fn resolve_weights(
    cfg: &Config,
    csv: Option<&Path>,
    cli: Option<&str>,
) -> eyre::Result<Vec<CfgWeight>> {
    let weights = if let Some(list) = cli {
        bottles_config::parse_weight_list(list, cfg.items.layout)
            .map_err(|e| config_error(format!("--weights: {e:#}")))?
    } else if let Some(path) = csv {
        bottles_config::load_weights_csv(path).map_err(|e| config_error(format!("{e:#}")))?
    } else {
        cfg.calibration.weights.clone()
    };
    if weights.is_empty() {
        return Err(Report::new(BuildError::MissingWeights));
    }
    bottles_config::check_weights(&weights, &cfg.items)
        .map_err(|e| config_error(format!("{e:#}")))?;
    Ok(weights)
}

/// Track paths, relative ones resolved against the config file's directory.
fn track_paths(cfg: &Config, base: &Path) -> (Vec<Vec<PathBuf>>, Option<PathBuf>) {
    let sets = conversions::track_sets(&cfg.audio)
        .into_iter()
        .map(|set| set.into_iter().map(|p| base.join(p)).collect())
        .collect();
    let override_track = cfg.audio.override_track.as_ref().map(|p| base.join(p));
    (sets, override_track)
}

fn open_scale(cfg: &Config) -> eyre::Result<Box<dyn Scale>> {
    #[cfg(feature = "hardware")]
    {
        let scale = bottles_hardware::HardwareScale::try_new(cfg.pins.hx711_dt, cfg.pins.hx711_sck)
            .map_err(|e| init_error("open HX711", e))?;
        tracing::info!(
            dt = cfg.pins.hx711_dt,
            sck = cfg.pins.hx711_sck,
            "HX711 opened"
        );
        Ok(Box::new(scale))
    }
    #[cfg(not(feature = "hardware"))]
    {
        let _ = cfg;
        let scale = match std::env::var("BOTTLES_SIM_SCRIPT") {
            Ok(script) => bottles_hardware::SimulatedScale::from_script(&script)
                .map_err(|e| init_error("simulated scale", e))?,
            Err(_) => bottles_hardware::SimulatedScale::constant(0),
        };
        tracing::info!("using simulated scale");
        Ok(Box::new(scale))
    }
}

fn open_indicators() -> eyre::Result<Box<dyn IndicatorOutput>> {
    #[cfg(feature = "hardware")]
    {
        let out = bottles_hardware::GpioIndicators::try_new()
            .map_err(|e| init_error("open indicator gpio", e))?;
        Ok(Box::new(out))
    }
    #[cfg(not(feature = "hardware"))]
    {
        Ok(Box::new(bottles_hardware::SimulatedIndicators::new()))
    }
}

fn open_buttons(cfg: &Config) -> eyre::Result<Box<dyn ButtonInput>> {
    #[cfg(feature = "hardware")]
    {
        let buttons = bottles_hardware::GpioButtons::try_new(cfg.pins.retare, &cfg.pins.track_sets)
            .map_err(|e| init_error("open button gpio", e))?;
        Ok(Box::new(buttons))
    }
    #[cfg(not(feature = "hardware"))]
    {
        let _ = cfg;
        let buttons = match std::env::var("BOTTLES_SIM_BUTTONS") {
            Ok(script) => bottles_hardware::SimulatedButtons::from_script(&script)
                .map_err(|e| init_error("simulated buttons", e))?,
            Err(_) => bottles_hardware::SimulatedButtons::new(),
        };
        Ok(Box::new(buttons))
    }
}

/// CLI overrides for `run`.
#[derive(Debug, Default, Clone)]
pub struct RunArgs {
    pub weights: Vec<CfgWeight>,
    pub tolerance: Option<i32>,
    pub tare: Option<i32>,
    pub max_ticks: Option<u64>,
}

pub fn run_player(
    cfg: &Config,
    base: &Path,
    args: RunArgs,
    stop: &AtomicBool,
    json: bool,
) -> eyre::Result<RunSummary> {
    let weights: Vec<ItemWeight> = args.weights.iter().map(Into::into).collect();
    let mut classifier: ClassifierCfg = (&cfg.classifier).into();
    if let Some(t) = args.tolerance {
        if t <= 0 {
            return Err(config_error(format!("--tolerance must be > 0, got {t}")));
        }
        classifier.tolerance = t;
    }
    let mut scheduler: SchedulerCfg = (&cfg.scheduler).into();
    scheduler.max_ticks = args.max_ticks;
    let (sets, override_track) = track_paths(cfg, base);
    let pins: Vec<IndicatorPins> = cfg.pins.indicators.iter().map(Into::into).collect();

    #[cfg(feature = "hardware")]
    tracing::warn!("no audio output device is wired; cues drive the in-memory mixer only");

    let mut builder = Scheduler::builder()
        .with_scale(open_scale(cfg)?)
        .with_audio(SimulatedMixer::new())
        .with_items(cfg.items.count, cfg.items.layout.into())
        .with_weights(weights)
        .with_classifier(classifier)
        .with_smoothing((&cfg.smoothing).into())
        .with_settle((&cfg.settle).into())
        .with_acquisition((&cfg.acquisition).into())
        .with_timeouts((&cfg.hardware).into())
        .with_fade((&cfg.fade).into())
        .with_scheduler(scheduler)
        .with_track_sets(sets)
        .with_override_track(override_track)
        .with_indicators(open_indicators()?, pins)
        .with_buttons(open_buttons(cfg)?);
    if let Some(tare) = args.tare.or(cfg.calibration.tare) {
        builder = builder.with_tare(tare);
    }
    let mut player = builder.build()?;
    tracing::info!(state = %player.committed(), tare = player.tare(), "player ready");

    let summary = player.run_with(stop, |report| print_tick(report, json));
    print_summary(&summary, json);
    Ok(summary)
}

fn button_name(b: Button) -> String {
    match b {
        Button::Retare => "retare".to_string(),
        Button::TrackSet(n) => format!("set{n}"),
    }
}

fn print_tick(report: &TickReport, json: bool) {
    if let Some(b) = report.button {
        if json {
            println!(
                "{}",
                json!({ "event": "button", "tick": report.tick, "button": button_name(b) })
            );
        } else {
            println!("tick {}: button {}", report.tick, button_name(b));
        }
    }
    let Some(ev) = &report.event else { return };
    if json {
        println!(
            "{}",
            json!({
                "event": "state_change",
                "tick": report.tick,
                "from": ev.from.to_string(),
                "to": ev.to.to_string(),
                "smoothed": report.smoothed,
                "distance": ev.distance,
                "matches": ev.matches,
                "low_confidence": ev.is_low_confidence(),
            })
        );
    } else {
        println!("tick {}: {} -> {}", report.tick, ev.from, ev.to);
    }
}

fn print_summary(summary: &RunSummary, json: bool) {
    let reason = match summary.stop {
        StopReason::Signal => "signal",
        StopReason::TickLimit => "tick_limit",
    };
    if json {
        println!(
            "{}",
            json!({
                "event": "stopped",
                "reason": reason,
                "ticks": summary.ticks,
                "state_changes": summary.events,
                "failed_reads": summary.failed_reads,
                "final_state": summary.final_state.to_string(),
            })
        );
    } else {
        println!(
            "stopped after {} ticks ({reason}): {} state changes, {} failed reads, final state {}",
            summary.ticks, summary.events, summary.failed_reads, summary.final_state
        );
    }
}

/// Tare, then print `ticks` scaled deltas and their smoothed values.
pub fn measure(cfg: &Config, ticks: u64, json: bool) -> eyre::Result<()> {
    let acquisition: AcquisitionCfg = (&cfg.acquisition).into();
    let timeouts: Timeouts = (&cfg.hardware).into();
    let (samples, passes) = (acquisition.tare_samples, acquisition.tare_passes);
    let mut reader = WeightReader::new(
        open_scale(cfg)?,
        acquisition,
        Duration::from_millis(timeouts.sensor_ms),
    )?;
    let tare = reader
        .tare(samples, passes)
        .map_err(|e| init_error("initial tare failed", e))?;
    let mut smoother = Smoother::new(cfg.smoothing.alpha)?;
    let clock = MonotonicClock::new();
    let period = tick_period(cfg.scheduler.tick_ms);

    if json {
        println!("{}", json!({ "event": "tare", "raw": tare }));
    } else {
        println!("tare: {tare}");
    }
    for tick in 0..ticks {
        match reader.read_delta() {
            Ok(delta) => {
                let smoothed = smoother.update(delta);
                if json {
                    println!(
                        "{}",
                        json!({ "event": "reading", "tick": tick, "delta": delta, "smoothed": smoothed })
                    );
                } else {
                    println!("tick {tick}: delta {delta} smoothed {smoothed}");
                }
            }
            Err(e) => {
                tracing::warn!(tick, error = %e, "sensor read failed");
                if json {
                    println!("{}", json!({ "event": "read_failed", "tick": tick }));
                } else {
                    println!("tick {tick}: read failed");
                }
            }
        }
        clock.sleep(period);
    }
    Ok(())
}

/// Print every state's target and the closest pair of targets.
pub fn print_targets(cfg: &Config, weights: &[CfgWeight], json: bool) -> eyre::Result<()> {
    let layout: ItemLayout = cfg.items.layout.into();
    let space = StateSpace::new(cfg.items.count, layout)?;
    let weights: Vec<ItemWeight> = weights.iter().map(Into::into).collect();
    let table = TargetTable::build(&space, &weights)?;

    for (state, target) in table.entries() {
        if json {
            println!(
                "{}",
                json!({ "index": state.index(), "state": state.to_string(), "target": target })
            );
        } else {
            println!("{:>4}  {state}  {target}", state.index());
        }
    }

    let mut sorted: Vec<_> = table.entries().collect();
    sorted.sort_by_key(|(_, t)| *t);
    let closest = sorted
        .windows(2)
        .map(|w| (w[0].0, w[1].0, w[1].1 - w[0].1))
        .min_by_key(|(_, _, gap)| *gap);
    if let Some((a, b, gap)) = closest {
        let tolerance = i64::from(cfg.classifier.tolerance);
        if gap < 2 * tolerance {
            tracing::warn!(
                %a, %b, gap, tolerance,
                "targets closer than twice the tolerance; readings between them may be ambiguous"
            );
        }
        if !json {
            println!("closest targets: {a} and {b}, {gap} apart (tolerance {tolerance})");
        }
    }
    Ok(())
}

/// Board detection, config summary, weights and track availability.
pub fn self_check(
    cfg: &Config,
    base: &Path,
    cpuinfo: &Path,
    weights: Option<&[CfgWeight]>,
    json: bool,
) -> eyre::Result<()> {
    let board = match Board::read_from(cpuinfo) {
        Ok(b) => Some(b),
        Err(e) => {
            tracing::warn!(path = %cpuinfo.display(), error = %e, "cannot read cpuinfo");
            None
        }
    };

    let (sets, override_track) = track_paths(cfg, base);
    let mut mixer = SimulatedMixer::new();
    let library = TrackLibrary::load(&mut mixer, &sets, override_track.as_deref())?;

    let fade = fade_ticks(cfg.fade.on_volume, cfg.fade.floor, cfg.fade.decay);
    let fade_ms = fade.map(|t| u64::from(t) * cfg.scheduler.tick_ms);

    if json {
        println!(
            "{}",
            json!({
                "ok": true,
                "board": board.as_ref().map(|b| b.model.to_string()),
                "gpio_base": board
                    .as_ref()
                    .and_then(|b| b.peripherals)
                    .map(|p| format!("{:#010x}", p.gpio_base())),
                "items": cfg.items.count,
                "weights_configured": weights.is_some(),
                "track_sets": library.set_count(),
                "override_track": library.has_override(),
                "fade_ticks": fade,
                "fade_ms": fade_ms,
            })
        );
        return Ok(());
    }

    match &board {
        Some(b) => {
            print!("board: {}", b.model);
            if let Some(rev) = b.revision {
                print!(" (revision {rev:#x})");
            }
            println!();
            if let Some(p) = b.peripherals {
                println!(
                    "peripherals: base {:#010x}, bus {:#010x}, gpio {:#010x}",
                    p.base,
                    p.bus_base,
                    p.gpio_base()
                );
            }
        }
        None => println!("board: unknown (cpuinfo unavailable)"),
    }
    println!(
        "items: {} ({:?}), tolerance {}",
        cfg.items.count, cfg.items.layout, cfg.classifier.tolerance
    );
    match weights {
        Some(w) => println!("weights: {} items ok", w.len()),
        None => println!("weights: not configured"),
    }
    println!(
        "tracks: {} set(s), override {}",
        library.set_count(),
        if library.has_override() { "available" } else { "unavailable" }
    );
    match (fade, fade_ms) {
        (Some(t), Some(ms)) => println!("fade: {t} ticks (~{ms} ms)"),
        _ => println!("fade: never completes with these settings"),
    }
    println!("self-check ok");
    Ok(())
}
