#![no_main]
use bottles_config::ItemLayout;
use bottles_core::{Classifier, ItemWeight, StateSpace, TargetTable};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (&str, bool, i32)| {
    let (list, cap_only, reading) = input;
    let layout = if cap_only {
        ItemLayout::CapOnly
    } else {
        ItemLayout::BottleAndCap
    };
    let Ok(weights) = bottles_config::parse_weight_list(list, layout) else {
        return;
    };
    let Ok(space) = StateSpace::new(weights.len(), layout.into()) else {
        return;
    };
    let weights: Vec<ItemWeight> = weights.iter().map(Into::into).collect();
    let Ok(table) = TargetTable::build(&space, &weights) else {
        return;
    };
    let Ok(classifier) = Classifier::new(table, 43) else {
        return;
    };
    let c = classifier.classify(reading);
    assert!(c.matches <= space.len());
    assert!(c.distance >= 0);
});
