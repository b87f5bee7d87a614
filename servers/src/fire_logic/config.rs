use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "server_firewatch.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Wildfire detection event store and API server", version)]
pub struct Config {
    #[clap(long, env = "FIREWATCH_PORT", help = "Port to listen on.")]
    pub port: Option<u16>,

    #[clap(long, env = "FIREWATCH_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "FIREWATCH_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "FIREWATCH_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "FIREWATCH_FIRE_LOG_PATH", help = "Legacy fire log replayed at startup.")]
    pub fire_log_path: Option<PathBuf>,

    #[clap(long, env = "FIREWATCH_FIRMS_PATH", help = "Satellite hotspot CSV file.")]
    pub firms_path: Option<PathBuf>,

    #[clap(long, env = "FIREWATCH_FIRMS_RELOAD_SECS", help = "Seconds between satellite dataset reloads (0 = never).")]
    pub firms_reload_secs: Option<u64>,

    #[clap(long, env = "FIREWATCH_JOURNAL_INGESTED", help = "Append accepted detections to the fire log.")]
    pub journal_ingested: Option<bool>,

    #[clap(long, env = "FIREWATCH_STORE_CAPACITY", help = "Local detections kept in memory.")]
    pub store_capacity: Option<usize>,

    #[clap(long, env = "FIREWATCH_HYDRATE_LINES", help = "Trailing fire log lines replayed at startup.")]
    pub hydrate_lines: Option<usize>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            fire_log_path: other.fire_log_path.or(self.fire_log_path),
            firms_path: other.firms_path.or(self.firms_path),
            firms_reload_secs: other.firms_reload_secs.or(self.firms_reload_secs),
            journal_ingested: other.journal_ingested.or(self.journal_ingested),
            store_capacity: other.store_capacity.or(self.store_capacity),
            hydrate_lines: other.hydrate_lines.or(self.hydrate_lines),
        }
    }

    fn defaults() -> Config {
        Config {
            port: Some(3000),
            config_path: None,
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            fire_log_path: Some(PathBuf::from("fire_log.txt")),
            firms_path: Some(PathBuf::from("firms_data/fire_nrt.csv")),
            firms_reload_secs: Some(0),
            journal_ingested: Some(false),
            store_capacity: Some(lib_firewatch::core::event_store::DEFAULT_CAPACITY),
            hydrate_lines: Some(lib_firewatch::ingestors::log_hydrator::HYDRATE_WINDOW_LINES),
        }
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub fire_log_path: PathBuf,
    pub firms_path: PathBuf,
    pub firms_reload_secs: u64,
    pub journal_ingested: bool,
    pub store_capacity: usize,
    pub hydrate_lines: usize,
}

impl From<Config> for Settings {
    fn from(config: Config) -> Self {
        let defaults = Config::defaults();
        let c = defaults.merge(config);
        Settings {
            port: c.port.unwrap_or(3000),
            log_dir: c.log_dir.unwrap_or_else(|| PathBuf::from("./logs")),
            log_level: c.log_level.unwrap_or_else(|| "info".to_string()),
            fire_log_path: c.fire_log_path.unwrap_or_default(),
            firms_path: c.firms_path.unwrap_or_default(),
            firms_reload_secs: c.firms_reload_secs.unwrap_or(0),
            journal_ingested: c.journal_ingested.unwrap_or(false),
            store_capacity: c.store_capacity.unwrap_or_default(),
            hydrate_lines: c.hydrate_lines.unwrap_or_default(),
        }
    }
}

/// Where the file layer came from, reported once logging is up.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    Loaded(PathBuf),
    NotFound(PathBuf),
    Invalid(PathBuf, String),
}

/// Defaults, then the JSON config file, then environment and CLI.
pub fn load_config() -> (Settings, FileSource) {
    let cli_args = Config::parse();
    resolve(cli_args)
}

fn resolve(cli_args: Config) -> (Settings, FileSource) {
    let config_file_path = cli_args
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current_config = Config::defaults();
    let source = if config_file_path.exists() {
        match fs::read_to_string(&config_file_path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Config>(&text).map_err(|e| e.to_string()))
        {
            Ok(file_config) => {
                current_config = current_config.merge(file_config);
                FileSource::Loaded(config_file_path)
            }
            Err(e) => FileSource::Invalid(config_file_path, e),
        }
    } else {
        FileSource::NotFound(config_file_path)
    };

    current_config = current_config.merge(cli_args);
    (Settings::from(current_config), source)
}
