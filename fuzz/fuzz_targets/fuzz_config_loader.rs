#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = toml::from_str::<bottles_config::Config>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // A valid config must convert into core settings the engine accepts.
    let fade: bottles_core::FadeCfg = (&cfg.fade).into();
    assert!(bottles_core::fade::validate_fade_cfg(&fade).is_ok());
    assert!(bottles_core::Smoother::new(cfg.smoothing.alpha).is_ok());
});
