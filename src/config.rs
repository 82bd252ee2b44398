//! Run configuration
//!
//! Settings are layered with increasing precedence:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config <path>`, or `hallsync.toml` in the working directory)
//! 3. Environment variables (`CONFERENCE_HALL`, `HALLSYNC_*`)
//! 4. Command-line flags
//!
//! Every layer is validated together and all problems are reported at once.

use crate::error::{Error, Result};
use crate::slug::CollisionPolicy;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the config file picked up from the working directory.
pub const CONFIG_FILE_NAME: &str = "hallsync.toml";

/// Environment variable holding the export endpoint.
pub const ENDPOINT_ENV: &str = "CONFERENCE_HALL";

/// Format of the talk `start`/`end` front-matter values.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

pub const DEFAULT_TALK_START: &str = "2023-10-26T08:00:00.000+0100";
pub const DEFAULT_TALK_END: &str = "2023-10-26T09:00:00.000+0100";

/// Valid log levels for configuration validation.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Address of the JSON export. Empty by default, which fails at fetch time.
    pub endpoint: String,

    /// Root under which `talks/`, `speakers/` and `images/` are written.
    pub output_dir: PathBuf,

    /// Value written as `start` in every talk file.
    pub talk_start: String,

    /// Value written as `end` in every talk file.
    pub talk_end: String,

    /// Number of talks or speakers processed at once.
    pub max_parallel: usize,

    pub slug_collisions: CollisionPolicy,

    pub log_level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            output_dir: PathBuf::from("."),
            talk_start: DEFAULT_TALK_START.to_string(),
            talk_end: DEFAULT_TALK_END.to_string(),
            max_parallel: 1,
            slug_collisions: CollisionPolicy::Suffix,
            log_level: "info".to_string(),
        }
    }
}

/// One partial layer of settings; unset fields leave lower layers untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub endpoint: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub talk_start: Option<String>,
    pub talk_end: Option<String>,
    pub max_parallel: Option<usize>,
    pub slug_collisions: Option<CollisionPolicy>,
    pub log_level: Option<String>,
}

impl SyncConfig {
    fn apply(&mut self, layer: ConfigLayer) {
        if let Some(endpoint) = layer.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(output_dir) = layer.output_dir {
            self.output_dir = output_dir;
        }
        if let Some(talk_start) = layer.talk_start {
            self.talk_start = talk_start;
        }
        if let Some(talk_end) = layer.talk_end {
            self.talk_end = talk_end;
        }
        if let Some(max_parallel) = layer.max_parallel {
            self.max_parallel = max_parallel;
        }
        if let Some(policy) = layer.slug_collisions {
            self.slug_collisions = policy;
        }
        if let Some(log_level) = layer.log_level {
            self.log_level = log_level;
        }
    }

    /// Check every field, returning all problems together.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let start = DateTime::parse_from_str(&self.talk_start, TIMESTAMP_FORMAT);
        let end = DateTime::parse_from_str(&self.talk_end, TIMESTAMP_FORMAT);
        if let Err(e) = &start {
            errors.push(format!(
                "talk_start '{}' does not match {TIMESTAMP_FORMAT}: {e}",
                self.talk_start
            ));
        }
        if let Err(e) = &end {
            errors.push(format!(
                "talk_end '{}' does not match {TIMESTAMP_FORMAT}: {e}",
                self.talk_end
            ));
        }
        if let (Ok(start), Ok(end)) = (start, end) {
            if end < start {
                errors.push(format!(
                    "talk_end '{}' is before talk_start '{}'",
                    self.talk_end, self.talk_start
                ));
            }
        }

        if self.max_parallel == 0 {
            errors.push("max_parallel must be at least 1".to_string());
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level '{}' is not one of {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(errors.join("; ")))
        }
    }
}

/// `hallsync.toml` in the working directory, if there is one.
pub fn default_config_file() -> Option<PathBuf> {
    let path = PathBuf::from(CONFIG_FILE_NAME);
    path.is_file().then_some(path)
}

/// Read a TOML config layer. The file must exist.
pub fn read_config_file(path: &Path) -> Result<ConfigLayer> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {e}", path.display())))
}

/// Build a config layer from an environment snapshot.
pub fn env_layer(env: &HashMap<String, String>) -> Result<ConfigLayer> {
    let mut errors = Vec::new();
    let mut layer = ConfigLayer {
        endpoint: env.get(ENDPOINT_ENV).cloned(),
        output_dir: env.get("HALLSYNC_OUTPUT_DIR").map(PathBuf::from),
        talk_start: env.get("HALLSYNC_TALK_START").cloned(),
        talk_end: env.get("HALLSYNC_TALK_END").cloned(),
        log_level: env.get("HALLSYNC_LOG_LEVEL").map(|l| l.to_lowercase()),
        ..ConfigLayer::default()
    };

    if let Some(raw) = env.get("HALLSYNC_MAX_PARALLEL") {
        match raw.trim().parse() {
            Ok(n) => layer.max_parallel = Some(n),
            Err(e) => errors.push(format!("HALLSYNC_MAX_PARALLEL '{raw}': {e}")),
        }
    }
    if let Some(raw) = env.get("HALLSYNC_SLUG_COLLISIONS") {
        match raw.trim().parse() {
            Ok(policy) => layer.slug_collisions = Some(policy),
            Err(e) => errors.push(format!("HALLSYNC_SLUG_COLLISIONS: {e}")),
        }
    }

    if errors.is_empty() {
        Ok(layer)
    } else {
        Err(Error::Config(errors.join("; ")))
    }
}

/// Layer defaults, the optional file, the environment and flag overrides,
/// then validate the result.
pub fn load_config(
    file: Option<&Path>,
    env: &HashMap<String, String>,
    overrides: ConfigLayer,
) -> Result<SyncConfig> {
    let mut config = SyncConfig::default();

    if let Some(path) = file {
        debug!("Loading config file {}", path.display());
        config.apply(read_config_file(path)?);
    }
    config.apply(env_layer(env)?);
    config.apply(overrides);

    config.validate()?;
    Ok(config)
}
