use anyhow::{bail, Context, Result};
use humanoid_brain::config::BrainConfig;
use humanoid_brain::kernel::brain::load_brain;
use humanoid_brain::kernel::telemetry::logger::TelemetryLogger;
use humanoid_brain::planner::types::StateMap;
use humanoid_brain::vision::preprocess::ImageInput;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const ENV_IMAGES: &str = "HUMANOID_BRAIN_IMAGES";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging/tracing (telemetry records go to stdout, diagnostics to stderr)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("Humanoid Brain Booting...");

    let config = BrainConfig::from_env()?;
    let images: Vec<String> = std::env::var(ENV_IMAGES)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if images.is_empty() {
        bail!("set {} to one or more comma separated image paths", ENV_IMAGES);
    }

    let telemetry = Arc::new(TelemetryLogger::new(&config.telemetry)?);
    let brain = Arc::new(load_brain(&config, Some(telemetry.clone()))?);

    // One blocking worker per frame. decide() never suspends.
    let mut workers = Vec::with_capacity(images.len());
    for path in images {
        let brain = brain.clone();
        workers.push(tokio::task::spawn_blocking(move || -> Result<_> {
            let image = image::open(&path).with_context(|| format!("opening {}", path))?;
            let decision = brain.decide(&ImageInput::Decoded(image), &StateMap::new(), &StateMap::new())?;
            Ok((path, decision))
        }));
    }

    let mut failures = 0;
    for worker in workers {
        match worker.await? {
            Ok((path, decision)) => {
                tracing::info!(image = %path, task = %decision.task, unknown = decision.unknown, "decision");
                println!("{}", serde_json::to_string_pretty(&decision)?);
            }
            Err(err) => {
                failures += 1;
                tracing::error!("decision failed: {:#}", err);
            }
        }
    }

    telemetry.close()?;
    if failures > 0 {
        bail!("{} decision(s) failed", failures);
    }
    Ok(())
}
