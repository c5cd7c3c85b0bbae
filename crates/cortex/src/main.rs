//! EyeOS Cortex
//!
//! Hands-free mouse control. This binary:
//! - Listens for face landmarks, pedal signals and mode switches over UDP
//! - Runs the gesture engine on every frame
//! - Drives the pedal state machine on its own thread
//! - Injects the resulting mouse actions into the OS

use anyhow::Result;
use eyeos_cortex::source::udp_addr_from_env;
use eyeos_cortex::{
    Clock, CortexError, Effector, Engine, EngineConfig, GestureToggles, LogEffector, PedalRunner,
    UdpSource,
};
use log::LevelFilter;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn make_effector(dry_run: bool) -> Result<Box<dyn Effector>, CortexError> {
    if dry_run {
        return Ok(Box::new(LogEffector));
    }

    #[cfg(feature = "input")]
    let effector: Box<dyn Effector> = Box::new(eyeos_cortex::EnigoEffector::new()?);

    #[cfg(not(feature = "input"))]
    let effector: Box<dyn Effector> = {
        log::warn!("Built without the `input` feature, actions are only logged");
        Box::new(LogEffector)
    };

    Ok(effector)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    log::info!("═══════════════════════════════════════");
    log::info!("  EyeOS Cortex - hands-free input");
    log::info!("═══════════════════════════════════════");

    let mut config = match env::var("EYEOS_CONFIG") {
        Ok(path) => EngineConfig::load(&path)?,
        Err(_) => {
            log::info!("EYEOS_CONFIG not set, using defaults");
            EngineConfig::default()
        }
    };
    if let Some(addr) = udp_addr_from_env() {
        log::info!("UDP address overridden via EYEOS_UDP_ADDR={addr}");
        config.runtime.udp_addr = addr;
    }
    let dry_run = env::var("EYEOS_DRY_RUN").is_ok_and(|v| v != "0");
    if dry_run {
        log::info!("Dry run: actions are logged, not injected");
    }

    let mut effector = make_effector(dry_run)?;
    if config.screen.auto_detect {
        match effector.screen_size() {
            Some((w, h)) => {
                log::info!("Detected screen {w}x{h}");
                config.screen.width = w;
                config.screen.height = h;
            }
            None => log::info!(
                "Screen size unavailable, using {}x{}",
                config.screen.width,
                config.screen.height
            ),
        }
    }

    let clock = Clock::new();
    let toggles = Arc::new(GestureToggles::from_config(&config.modes));
    let shutdown = Arc::new(AtomicBool::new(false));

    let (pedal_tx, pedal_rx) = crossbeam_channel::unbounded();
    let pedal = PedalRunner::spawn(
        config.pedal.clone(),
        Arc::clone(&toggles),
        clock,
        pedal_rx,
        Arc::clone(&shutdown),
        move || make_effector(dry_run),
    )?;

    let mut source = UdpSource::bind(
        &config.runtime.udp_addr,
        clock,
        Some(pedal_tx),
        Some(Arc::clone(&toggles)),
    )
    .await?;

    // Set up Ctrl+C handler
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal...");
        flag.store(true, Ordering::Relaxed);
    })?;

    log::info!("Send landmarks to {} - press Ctrl+C to exit", source.local_addr());
    log::info!("───────────────────────────────────────");

    let mut engine = Engine::new(config, toggles, effector);
    let result = engine.run(&mut source, &shutdown).await;

    shutdown.store(true, Ordering::Relaxed);
    drop(source);
    pedal.join();

    log::info!("Session stats: {}", serde_json::to_string(&engine.stats())?);
    result?;
    log::info!("Cortex shutdown complete. Goodbye!");
    Ok(())
}
