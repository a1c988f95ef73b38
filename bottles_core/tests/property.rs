use bottles_core::mocks::RecordingMixer;
use bottles_core::util::fade_ticks;
use bottles_core::{
    Classifier, FadeCfg, FadeEngine, ItemLayout, ItemState, ItemWeight, StateSpace, TargetTable,
};
use bottles_traits::{AudioBackend, TrackHandle};
use proptest::prelude::*;

fn cap_weights() -> impl Strategy<Value = Vec<ItemWeight>> {
    prop::collection::vec(1u32..5_000, 1..=4)
        .prop_map(|caps| caps.into_iter().map(ItemWeight::cap_only).collect())
}

fn bottle_weights() -> impl Strategy<Value = Vec<ItemWeight>> {
    prop::collection::vec((1u32..5_000, 1u32..2_000), 1..=3).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(b, c)| ItemWeight::bottle_and_cap(b, c))
            .collect()
    })
}

fn table(weights: &[ItemWeight], layout: ItemLayout) -> TargetTable {
    let space = StateSpace::new(weights.len(), layout).unwrap();
    TargetTable::build(&space, weights).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    // Removing more never makes the platform heavier.
    #[test]
    fn targets_are_monotone_per_item(weights in bottle_weights()) {
        let t = table(&weights, ItemLayout::BottleAndCap);
        for s in t.space().iter() {
            prop_assert!(t.target(&s) <= 0);
        }
        for w in &weights {
            prop_assert_eq!(w.contribution(ItemState::Present), 0);
            prop_assert!(w.contribution(ItemState::CapOff) < 0);
            prop_assert!(w.contribution(ItemState::Removed) < w.contribution(ItemState::CapOff));
        }
        prop_assert_eq!(t.target(&t.space().all_present()), 0);
    }

    // Reading exactly a state's target always yields a match at distance 0.
    #[test]
    fn exact_target_always_matches(
        weights in cap_weights(),
        tolerance in 1i32..200,
        pick in any::<prop::sample::Index>(),
    ) {
        let t = table(&weights, ItemLayout::CapOnly);
        let states: Vec<_> = t.space().iter().collect();
        let s = states[pick.index(states.len())];
        let target = i32::try_from(t.target(&s)).unwrap();
        let c = Classifier::new(t, tolerance).unwrap().classify(target);
        prop_assert!(c.is_match());
        prop_assert_eq!(c.distance, 0);
    }

    // The best state is the nearest target, lowest index on ties.
    #[test]
    fn best_is_the_nearest_target(weights in cap_weights(), smoothed in -25_000i32..1_000) {
        let t = table(&weights, ItemLayout::CapOnly);
        let expected = t
            .entries()
            .min_by_key(|(s, target)| ((target - i64::from(smoothed)).abs(), s.index()))
            .map(|(s, _)| s)
            .unwrap();
        let c = Classifier::new(t, 43).unwrap().classify(smoothed);
        prop_assert_eq!(c.best, expected);
    }

    // A reading exactly `tolerance` away from every target matches nothing.
    #[test]
    fn distance_equal_to_tolerance_is_not_a_match(cap in 200u32..5_000, tolerance in 1i32..100) {
        let t = table(&[ItemWeight::cap_only(cap)], ItemLayout::CapOnly);
        let c = Classifier::new(t, tolerance).unwrap().classify(tolerance);
        prop_assert_eq!(c.matches, 0);
        prop_assert!(!c.is_match());
    }

    // Every fade ends silent, stopped and within the predicted number of ticks.
    #[test]
    fn fades_converge(on in 6u8..=128, floor in 1u8..6, decay in 0.5f32..0.99) {
        let cfg = FadeCfg { on_volume: on, floor, decay, max_volume: 128 };
        let mixer = RecordingMixer::new();
        let mut e = FadeEngine::new(mixer.clone(), cfg, 1).unwrap();
        e.set_track(0, Some(TrackHandle(0)));
        e.set_target(0, true);
        e.set_target(0, false);

        let expected = fade_ticks(on, floor, decay).unwrap();
        let mut ticks = 0;
        let mut last = on;
        while e.channel(0).unwrap().fading {
            e.advance();
            ticks += 1;
            let v = e.channel(0).unwrap().volume;
            prop_assert!(v <= last);
            last = v;
            prop_assert!(ticks <= expected);
        }
        prop_assert_eq!(ticks, expected);
        prop_assert_eq!(mixer.channel_volume(0), 0);
        prop_assert!(mixer.log().borrow().playing.is_empty());
    }
}
