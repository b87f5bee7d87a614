//! # Sensor Simulator
//!
//! Stands in for a field sensor: walks a GPS position randomly by up to
//! 0.0001 degrees per axis per step, rounds to 6 decimals and posts each
//! position as a detection to `POST /api/local-fires`.

use anyhow::{Context, Result};
use clap::Parser;
use lib_firewatch::loggers::setup_logging;
use lib_firewatch::model::DetectionPayload;
use lib_firewatch::retrieve::HttpFireFeed;
use rand::Rng;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio::time::interval;
use tracing::{info, warn};

const WALK_STEP_DEGREES: f64 = 0.0001;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Posts random-walk fire detections to a Firewatch server.")]
struct SensorConfig {
    #[clap(long, env = "FIREWATCH_SERVER_URL", default_value = "http://127.0.0.1:3000/")]
    server_url: String,

    /// Milliseconds between detections.
    #[clap(long, default_value_t = 2000)]
    interval_ms: u64,

    #[clap(long, default_value_t = 12.9716)]
    start_lat: f64,

    #[clap(long, default_value_t = 77.5946)]
    start_lon: f64,

    /// Detections to send before exiting (0 = until Ctrl-C).
    #[clap(long, default_value_t = 0)]
    count: u64,

    /// Send a detector confidence instead of letting the server synthesize one.
    #[clap(long)]
    with_confidence: bool,

    #[clap(long, env = "FIREWATCH_LOG_DIR", default_value = "./logs")]
    log_dir: PathBuf,

    #[clap(long, env = "FIREWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Random walk over GPS coordinates.
struct GpsWalk {
    lat: f64,
    lon: f64,
}

impl GpsWalk {
    fn step<R: Rng>(&mut self, rng: &mut R) -> (f64, f64) {
        self.lat = round6(self.lat + rng.random_range(-WALK_STEP_DEGREES..=WALK_STEP_DEGREES));
        self.lon = round6(self.lon + rng.random_range(-WALK_STEP_DEGREES..=WALK_STEP_DEGREES));
        (self.lat, self.lon)
    }
}

fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = SensorConfig::parse();
    let _log_guard = setup_logging(&config.log_dir, &config.log_level, "sensor_sim")
        .context("Failed to initialize logging")?;

    let feed = HttpFireFeed::new(&config.server_url)
        .with_context(|| format!("Invalid server URL {}", config.server_url))?;
    let mut walk = GpsWalk {
        lat: config.start_lat,
        lon: config.start_lon,
    };
    let mut ticker = interval(Duration::from_millis(config.interval_ms.max(1)));
    let mut sent = 0u64;

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Ctrl-C received, stopping sensor.");
                break;
            }
            _ = ticker.tick() => {
                let payload = {
                    let mut rng = rand::rng();
                    let (lat, lon) = walk.step(&mut rng);
                    let confidence = config
                        .with_confidence
                        .then(|| round6(rng.random_range(0.5..=0.99)));
                    DetectionPayload { lat, lon, confidence }
                };
                match feed.report_detection(&payload).await {
                    Ok(_) => info!("FIRE at {}, {}", payload.lat, payload.lon),
                    Err(e) => warn!("Failed to report detection: {}", e),
                }
                sent += 1;
                if config.count > 0 && sent >= config.count {
                    break;
                }
            }
        }
    }

    info!(sent, "Sensor stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_stays_within_step_and_six_decimals() {
        let mut walk = GpsWalk { lat: 12.9716, lon: 77.5946 };
        let mut rng = rand::rng();
        let mut prev = (walk.lat, walk.lon);
        for _ in 0..100 {
            let (lat, lon) = walk.step(&mut rng);
            assert!((lat - prev.0).abs() <= WALK_STEP_DEGREES + 1e-6);
            assert!((lon - prev.1).abs() <= WALK_STEP_DEGREES + 1e-6);
            assert_eq!(round6(lat), lat);
            prev = (lat, lon);
        }
    }
}
