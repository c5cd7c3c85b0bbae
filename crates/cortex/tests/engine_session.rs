use eyeos_cortex::config::ModesConfig;
use eyeos_cortex::landmarks::SyntheticFace;
use eyeos_cortex::{
    Action, Clock, Engine, EngineConfig, GestureToggles, PedalRunner, PedalSignal,
    RecordingEffector, ScriptedSource, SharedEffector, SourceEvent,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

const FPS: f64 = 30.0;

fn config(modes: ModesConfig) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.runtime.frame_interval_ms = 0;
    config.modes = modes;
    config
}

fn frames(face: SyntheticFace, count: usize, source: u32, t: &mut f64) -> Vec<SourceEvent> {
    (0..count)
        .map(|_| {
            let mut frame = face.to_frame(*t);
            frame.source = source;
            *t += 1.0 / FPS;
            SourceEvent::Frame(frame)
        })
        .collect()
}

#[tokio::test]
async fn test_scripted_dwell_then_wink() {
    let config = config(ModesConfig {
        blink: true,
        ..Default::default()
    });
    let toggles = Arc::new(GestureToggles::from_config(&config.modes));
    let mut engine = Engine::new(config, toggles, RecordingEffector::new());

    let steady = SyntheticFace::default();
    let wink = SyntheticFace {
        ear_left: 0.05,
        ..steady
    };
    let mut t = 0.0;
    let mut events = frames(steady, 48, 0, &mut t);
    events.extend(frames(wink, 5, 0, &mut t));
    events.extend(frames(steady, 9, 0, &mut t));
    let mut source = ScriptedSource::new(events);

    engine
        .run(&mut source, &AtomicBool::new(false))
        .await
        .unwrap();

    assert_eq!(
        engine.effector().discrete(),
        vec![Action::left_click(), Action::left_click()]
    );
    assert_eq!(engine.stats().frames, 62);
    assert_eq!(engine.stats().actions, 2);
}

#[tokio::test]
async fn test_camera_switch_restarts_dwell() {
    let config = config(ModesConfig::default());
    let toggles = Arc::new(GestureToggles::from_config(&config.modes));
    let mut engine = Engine::new(config, toggles, RecordingEffector::new());

    let face = SyntheticFace::default();
    let mut t = 0.0;
    let mut events = frames(face, 30, 0, &mut t);
    events.push(SourceEvent::Switched { source: 1 });
    events.extend(frames(face, 30, 1, &mut t));
    let mut source = ScriptedSource::new(events);

    engine
        .run(&mut source, &AtomicBool::new(false))
        .await
        .unwrap();

    // Two seconds of steady gaze, but never 1.35 s on one camera
    assert!(engine.effector().discrete().is_empty());
    assert_eq!(engine.stats().resets, 1);
}

#[tokio::test]
async fn test_gap_in_frames_is_not_an_error() {
    let mut config = config(ModesConfig::default());
    config.runtime.mouse_fallback = false;
    let toggles = Arc::new(GestureToggles::from_config(&config.modes));
    let mut engine = Engine::new(config, toggles, RecordingEffector::new());

    let face = SyntheticFace::default();
    let mut t = 0.0;
    let mut events = frames(face, 24, 0, &mut t);
    for _ in 0..5 {
        events.push(SourceEvent::NoFace { timestamp: t });
        t += 1.0 / FPS;
    }
    events.push(SourceEvent::Pending);
    events.extend(frames(face, 24, 0, &mut t));
    let mut source = ScriptedSource::new(events);

    engine
        .run(&mut source, &AtomicBool::new(false))
        .await
        .unwrap();

    assert_eq!(engine.effector().discrete(), vec![Action::left_click()]);
    assert_eq!(engine.stats().faceless_frames, 5);
}

#[tokio::test]
async fn test_shutdown_flag_stops_loop() {
    let config = config(ModesConfig::default());
    let toggles = Arc::new(GestureToggles::from_config(&config.modes));
    let mut engine = Engine::new(config, toggles, RecordingEffector::new());
    let mut t = 0.0;
    let mut source = ScriptedSource::new(frames(SyntheticFace::default(), 10, 0, &mut t));

    engine
        .run(&mut source, &AtomicBool::new(true))
        .await
        .unwrap();
    assert_eq!(engine.stats().frames, 0);
    assert_eq!(source.remaining(), 10);
}

#[tokio::test]
async fn test_pedal_thread_and_engine_share_effector() {
    let shared = SharedEffector::new(RecordingEffector::new());
    let config = config(ModesConfig::default());
    let toggles = Arc::new(GestureToggles::from_config(&config.modes));
    let shutdown = Arc::new(AtomicBool::new(false));

    let (tx, rx) = crossbeam_channel::unbounded();
    let pedal_fx = shared.clone();
    let runner = PedalRunner::spawn(
        config.pedal.clone(),
        Arc::clone(&toggles),
        Clock::new(),
        rx,
        Arc::clone(&shutdown),
        move || Ok(pedal_fx),
    )
    .unwrap();

    tx.send(PedalSignal::Down).unwrap();
    tx.send(PedalSignal::Up).unwrap();

    let mut engine = Engine::new(config, toggles, shared.clone());
    let mut t = 0.0;
    let mut source = ScriptedSource::new(frames(SyntheticFace::default(), 48, 0, &mut t));
    engine.run(&mut source, &shutdown).await.unwrap();

    // The pedal tap lands on its own thread; give it a moment
    let start = Instant::now();
    while shared.lock().discrete().len() < 2 && start.elapsed() < Duration::from_secs(3) {
        std::thread::sleep(Duration::from_millis(10));
    }
    drop(tx);
    runner.join();

    let discrete = shared.lock().discrete();
    assert_eq!(discrete.len(), 2);
    assert!(discrete.iter().all(|a| *a == Action::left_click()));
}
