use bottles_core::{Classifier, ItemLayout, ItemWeight, Smoother, StateSpace, TargetTable};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

// Noisy weight trace stepping between a few plateaus
fn synth_trace(n: usize, noise_amp: i32, seed: u32) -> Vec<i32> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    let plateaus = [0, -629, -1357, -1783, -426];
    (0..n)
        .map(|i| {
            let base = plateaus[(i / 500) % plateaus.len()];
            let noise = (next() % (2 * noise_amp as u32 + 1)) as i32 - noise_amp;
            base + noise
        })
        .collect()
}

fn classifier(items: usize, layout: ItemLayout) -> Classifier {
    let weights: Vec<ItemWeight> = (0..items)
        .map(|i| {
            let cap = 400 + 97 * i as u32;
            match layout {
                ItemLayout::CapOnly => ItemWeight::cap_only(cap),
                ItemLayout::BottleAndCap => ItemWeight::bottle_and_cap(1_500 + 113 * i as u32, cap),
            }
        })
        .collect();
    let space = StateSpace::new(items, layout).expect("space");
    let table = TargetTable::build(&space, &weights).expect("table");
    Classifier::new(table, 43).expect("classifier")
}

pub fn bench_classify(c: &mut Criterion) {
    let mut g = c.benchmark_group("classify");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p bottles_core --bench classify
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let trace = synth_trace(10_000, 15, 0xC0FFEE);

    for (items, layout, label) in [
        (3, ItemLayout::CapOnly, "cap_only_3"),
        (3, ItemLayout::BottleAndCap, "bottle_and_cap_3"),
        (6, ItemLayout::BottleAndCap, "bottle_and_cap_6"),
    ] {
        let cls = classifier(items, layout);
        g.bench_function(format!("smooth_and_classify_{label}"), |b| {
            b.iter_batched(
                || Smoother::new(0.85).expect("alpha"),
                |mut s| {
                    let mut matches = 0usize;
                    for &x in black_box(&trace) {
                        matches += cls.classify(s.update(x)).matches;
                    }
                    black_box(matches);
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(classify, bench_classify);
criterion_main!(classify);
