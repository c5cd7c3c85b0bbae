use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eyeos_cortex::config::ModesConfig;
use eyeos_cortex::landmarks::{self, SyntheticFace};
use eyeos_cortex::{Engine, EngineConfig, GestureToggles, RecordingEffector};
use std::sync::Arc;

fn bench_extract(c: &mut Criterion) {
    let frame = SyntheticFace::default().to_frame(0.0);
    c.bench_function("extract_features", |b| {
        b.iter(|| landmarks::extract(black_box(&frame)))
    });
}

fn bench_step(c: &mut Criterion) {
    let mut config = EngineConfig::default();
    config.modes = ModesConfig {
        dwell: true,
        blink: true,
        lip_scroll: true,
        ..Default::default()
    };
    let toggles = Arc::new(GestureToggles::from_config(&config.modes));
    let mut engine = Engine::new(config, toggles, RecordingEffector::new());
    let frame = SyntheticFace::default().to_frame(0.0);
    let mut t = 0.0;

    c.bench_function("engine_step_all_families", |b| {
        b.iter(|| {
            t += 1.0 / 30.0;
            let out = engine.step(Some(black_box(&frame)), t);
            engine.effector_mut().actions.clear();
            out
        })
    });
}

criterion_group!(benches, bench_extract, bench_step);
criterion_main!(benches);
