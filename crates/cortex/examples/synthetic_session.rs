//! Example: replay a scripted session through the engine
//!
//! Looks at the centre of the screen long enough to dwell-click, then winks
//! with the left eye. Actions are only logged.

use anyhow::Result;
use eyeos_cortex::config::ModesConfig;
use eyeos_cortex::landmarks::SyntheticFace;
use eyeos_cortex::{
    Engine, EngineConfig, GestureToggles, LogEffector, Point2, ScriptedSource, SourceEvent,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

const FPS: f64 = 30.0;

fn segment(face: SyntheticFace, seconds: f64, t: &mut f64) -> Vec<SourceEvent> {
    let frames = (seconds * FPS).round() as usize;
    (0..frames)
        .map(|_| {
            let ev = SourceEvent::Frame(face.to_frame(*t));
            *t += 1.0 / FPS;
            ev
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut config = EngineConfig::default();
    config.runtime.frame_interval_ms = 0;
    config.modes = ModesConfig {
        blink: true,
        ..Default::default()
    };

    let steady = SyntheticFace {
        gaze: Point2::new(0.5, 0.5),
        ..Default::default()
    };
    let wink = SyntheticFace {
        ear_left: 0.05,
        ..steady
    };
    let elsewhere = SyntheticFace {
        gaze: Point2::new(0.58, 0.45),
        ..steady
    };

    let mut t = 0.0;
    let mut events = Vec::new();
    events.extend(segment(steady, 1.6, &mut t));
    events.extend(segment(elsewhere, 0.3, &mut t));
    events.push(SourceEvent::NoFace { timestamp: t });
    events.extend(segment(elsewhere, 0.2, &mut t));
    events.extend(segment(wink, 0.15, &mut t));
    events.extend(segment(elsewhere, 0.3, &mut t));
    let mut source = ScriptedSource::new(events);

    let toggles = Arc::new(GestureToggles::from_config(&config.modes));
    let mut engine = Engine::new(config, toggles, LogEffector);
    engine.run(&mut source, &AtomicBool::new(false)).await?;

    println!("Session finished: {:?}", engine.stats());
    Ok(())
}
