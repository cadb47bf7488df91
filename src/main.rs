//! Anugami - follow-behavior controller for VacuumTiger
//!
//! Loads configuration, starts the control loop, and runs until
//! interrupted. With `--mock` a synthetic target drives the loop,
//! which is useful for hardware-free bring-up.

use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anugami::error::{FollowError, Result};
use anugami::mock::MockScenario;
use anugami::node::{NullMarkerSink, TracingCommandSink};
use anugami::FollowConfig;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `anugami <path>` (positional)
/// - `anugami --config <path>` (flag-based)
///
/// Falls back to `anugami.toml` in the working directory.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "anugami.toml".to_string()
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("anugami=info".parse().unwrap()),
        )
        .init();

    let mock_mode = env::args().any(|a| a == "--mock");

    let config_path = parse_config_path();
    let config = if Path::new(&config_path).exists() {
        tracing::info!("Loading configuration from {}", config_path);
        FollowConfig::load(Path::new(&config_path))?
    } else {
        tracing::info!("Using default configuration");
        FollowConfig::default()
    };

    tracing::info!("Anugami v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Tracking box: x [{:.2}, {:.2}], height [{:.2}, {:.2}], depth < {:.2}, goal_z {:.2}",
        config.tracking.params.min_x,
        config.tracking.params.max_x,
        config.tracking.params.min_y,
        config.tracking.params.max_y,
        config.tracking.params.max_z,
        config.tracking.params.goal_z
    );

    let handle = anugami::initialize(
        config,
        Box::new(TracingCommandSink),
        Box::new(NullMarkerSink),
    )?;

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        tracing::info!("Received shutdown signal");
        r.store(false, Ordering::Release);
    })
    .map_err(|e| FollowError::Channel(format!("Error setting Ctrl-C handler: {}", e)))?;

    if mock_mode {
        anugami::mock::run(&handle, &MockScenario::default(), &running)?;
    } else {
        // Monitor until interrupted
        let mut last_regime = handle.regime();
        while running.load(Ordering::Acquire) {
            std::thread::sleep(Duration::from_millis(500));

            let regime = handle.regime();
            if regime != last_regime {
                tracing::info!("Regime: {:?}", regime);
                last_regime = regime;
            }
        }
    }

    handle.shutdown();
    tracing::info!("Anugami finished");
    Ok(())
}
