//! Classification through cues and fades, driven with pre-smoothed values.
use std::path::PathBuf;

use bottles_core::mocks::{MixerCall, RecordingIndicators, RecordingMixer, ScriptedScale};
use bottles_core::{
    AmbiguityPolicy, ChannelState, ClassifierCfg, IndicatorPins, ItemLayout, ItemState,
    ItemWeight, Scheduler, SchedulerBuilder,
};
use bottles_traits::{AudioBackend, TrackHandle};
use rstest::rstest;

fn set(name: &str, items: usize) -> Vec<PathBuf> {
    (1..=items)
        .map(|i| PathBuf::from(format!("{name}/track{i}.wav")))
        .collect()
}

fn caps() -> Vec<ItemWeight> {
    [629, 728, 426].map(ItemWeight::cap_only).to_vec()
}

fn cap_only(mixer: &RecordingMixer) -> SchedulerBuilder<ScriptedScale, RecordingMixer> {
    Scheduler::builder()
        .with_scale(ScriptedScale::new([]))
        .with_audio(mixer.clone())
        .with_items(3, ItemLayout::CapOnly)
        .with_weights(caps())
        .with_tolerance(43)
        .with_tare(0)
        .with_track_sets(vec![set("classic", 3)])
}

#[test]
fn lifting_and_replacing_one_cap() {
    let mixer = RecordingMixer::new();
    let mut s = cap_only(&mixer).build().expect("build");

    assert!(s.process_smoothed(0).is_none());

    let ev = s.process_smoothed(-629).expect("cap 1 lifted");
    assert!(ev.from.is_all_present());
    assert_eq!(ev.to.item(0), ItemState::CapOff);
    assert_eq!(ev.to.item(1), ItemState::Present);
    assert_eq!(ev.to.item(2), ItemState::Present);
    assert_eq!(ev.distance, 0);
    assert_eq!(s.fade().channel(0).unwrap().volume, 105);
    assert!(s.fade().channel(0).unwrap().active);
    assert_eq!(mixer.channel_volume(0), 105);
    assert!(!s.fade().channel(1).unwrap().active);

    assert!(s.process_smoothed(-629).is_none());
    assert_eq!(mixer.log().borrow().starts(0), 1);

    let ev = s.process_smoothed(0).expect("cap 1 replaced");
    assert!(ev.to.is_all_present());
    assert!(s.fade().channel(0).unwrap().fading);
    assert!(s.fade().rewind_armed());
}

#[test]
fn full_cycle_ends_rewound_and_silent() {
    let mixer = RecordingMixer::new();
    let mut s = cap_only(&mixer).build().expect("build");
    s.process_smoothed(-629);
    s.process_smoothed(-629 - 728);
    s.process_smoothed(0);

    let mut ticks = 0;
    loop {
        ticks += 1;
        assert!(ticks < 200, "rewind never completed");
        if s.tick().fade.rewound {
            break;
        }
    }
    assert!(s.committed().is_all_present());
    assert!(
        s.fade()
            .channels()
            .iter()
            .all(|c| *c == ChannelState::default())
    );
    let log = mixer.log();
    let log = log.borrow();
    assert!(log.playing.is_empty());
    assert!(log.calls.contains(&MixerCall::Stop { channel: 0 }));
    assert!(log.calls.contains(&MixerCall::Stop { channel: 1 }));
}

#[test]
fn two_caps_play_two_channels() {
    let mixer = RecordingMixer::new();
    let mut s = cap_only(&mixer).build().expect("build");
    let ev = s.process_smoothed(-629 - 426).expect("caps 1 and 3 lifted");
    assert_eq!(
        ev.to.items().collect::<Vec<_>>(),
        [ItemState::CapOff, ItemState::Present, ItemState::CapOff]
    );
    let active: Vec<bool> = s.fade().channels().iter().map(|c| c.active).collect();
    assert_eq!(active, [true, false, true, false]);
}

#[test]
fn reading_outside_tolerance_keeps_the_committed_state() {
    let mixer = RecordingMixer::new();
    let mut s = cap_only(&mixer).build().expect("build");
    // halfway between all present and cap 3 lifted
    assert!(s.process_smoothed(-213).is_none());
    assert!(s.committed().is_all_present());
    assert!(mixer.log().borrow().calls.is_empty());
}

#[rstest]
#[case::tolerance_minus_one(-629 + 42, true)]
#[case::exactly_tolerance(-629 + 43, false)]
fn match_margin_is_strict(#[case] smoothed: i32, #[case] matches: bool) {
    let mixer = RecordingMixer::new();
    let mut s = cap_only(&mixer).build().expect("build");
    assert_eq!(s.process_smoothed(smoothed).is_some(), matches);
}

#[rstest]
#[case::accept_closest(AmbiguityPolicy::AcceptClosest, true)]
#[case::reject(AmbiguityPolicy::Reject, false)]
fn ambiguous_reading_follows_policy(#[case] ambiguity: AmbiguityPolicy, #[case] commits: bool) {
    let mixer = RecordingMixer::new();
    let mut s = Scheduler::builder()
        .with_scale(ScriptedScale::new([]))
        .with_audio(mixer.clone())
        .with_items(2, ItemLayout::CapOnly)
        .with_weights([100, 120].map(ItemWeight::cap_only).to_vec())
        .with_classifier(ClassifierCfg {
            tolerance: 43,
            ambiguity,
        })
        .with_tare(0)
        .with_track_sets(vec![set("classic", 2)])
        .build()
        .expect("build");

    let ev = s.process_smoothed(-110);
    assert_eq!(ev.is_some(), commits);
    if let Some(ev) = ev {
        // equal distances resolve to the lowest state index
        assert_eq!(ev.to.index(), 1);
        assert!(ev.is_low_confidence());
    }
}

fn bottle_and_cap(
    mixer: &RecordingMixer,
    override_track: Option<PathBuf>,
) -> SchedulerBuilder<ScriptedScale, RecordingMixer> {
    Scheduler::builder()
        .with_scale(ScriptedScale::new([]))
        .with_audio(mixer.clone())
        .with_items(3, ItemLayout::BottleAndCap)
        .with_weights(vec![
            ItemWeight::bottle_and_cap(1890, 629),
            ItemWeight::bottle_and_cap(1685, 728),
            ItemWeight::bottle_and_cap(1561, 426),
        ])
        .with_tare(0)
        .with_track_sets(vec![set("classic", 3)])
        .with_override_track(override_track)
}

const ALL_REMOVED: i32 = -(1890 + 629 + 1685 + 728 + 1561 + 426);

#[test]
fn everything_removed_plays_the_override_track() {
    let mixer = RecordingMixer::new();
    let mut s = bottle_and_cap(&mixer, Some(PathBuf::from("birthday.wav")))
        .build()
        .expect("build");
    assert!(s.library().has_override());

    let ev = s.process_smoothed(ALL_REMOVED).expect("all removed");
    assert!(ev.to.is_all_absent());
    let volumes: Vec<u8> = s.fade().channels().iter().map(|c| c.volume).collect();
    assert_eq!(volumes, [0, 0, 0, 105]);
    assert!(
        mixer
            .log()
            .borrow()
            .calls
            .contains(&MixerCall::Start {
                channel: 3,
                track: TrackHandle(3),
            })
    );

    // one bottle back with its cap lifted: override fades, item 1 sounds
    let ev = s
        .process_smoothed(ALL_REMOVED + 1890)
        .expect("bottle 1 returned without cap");
    assert_eq!(ev.to.item(0), ItemState::CapOff);
    assert!(s.fade().channel(3).unwrap().fading);
    assert_eq!(s.fade().channel(0).unwrap().volume, 105);
}

#[test]
fn everything_removed_without_override_is_silent() {
    let mixer = RecordingMixer::new().with_missing("birthday.wav");
    let mut s = bottle_and_cap(&mixer, Some(PathBuf::from("birthday.wav")))
        .build()
        .expect("a missing override track is not fatal");
    assert!(!s.library().has_override());
    s.process_smoothed(ALL_REMOVED).expect("all removed");
    assert!(s.fade().channels().iter().all(|c| !c.active));
    assert!(mixer.log().borrow().calls.is_empty());
}

#[test]
fn removed_bottle_is_silent_cap_off_bottle_sounds() {
    let mixer = RecordingMixer::new();
    let mut s = bottle_and_cap(&mixer, None).build().expect("build");
    // item 1 removed entirely, item 2 cap off
    let ev = s
        .process_smoothed(-(1890 + 629) - 728)
        .expect("state change");
    assert_eq!(
        ev.to.items().collect::<Vec<_>>(),
        [ItemState::Removed, ItemState::CapOff, ItemState::Present]
    );
    let active: Vec<bool> = s.fade().channels().iter().map(|c| c.active).collect();
    assert_eq!(active, [false, true, false, false]);
}

#[test]
fn indicators_mirror_the_committed_state() {
    let mixer = RecordingMixer::new();
    let leds = RecordingIndicators::new();
    let pins = [(18, 17), (27, 22), (23, 24)]
        .map(|(b, c)| IndicatorPins {
            bottle: Some(b),
            cap: Some(c),
        })
        .to_vec();
    let mut s = bottle_and_cap(&mixer, None)
        .with_indicators(leds.clone(), pins)
        .build()
        .expect("build");

    // written at startup for the all-present state
    for pin in [18, 17, 27, 22, 23, 24] {
        assert_eq!(leds.level(pin), Some(true), "pin {pin}");
    }

    s.process_smoothed(-629).expect("cap 1 lifted");
    assert_eq!(leds.level(18), Some(true));
    assert_eq!(leds.level(17), Some(false));
    assert_eq!(leds.level(22), Some(true));

    s.process_smoothed(-(1890 + 629)).expect("bottle 1 removed");
    assert_eq!(leds.level(18), Some(false));
    assert_eq!(leds.level(17), Some(false));
}
