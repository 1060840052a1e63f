//! Configuration loading
//!
//! The console starts from an optional JSON file and then applies command
//! line overrides. A missing or broken file is not fatal: it is logged and
//! the defaults are used instead.

use std::path::Path;

use mdt_core::ConsoleConfig;

pub fn load_config(path: &Path) -> ConsoleConfig {
    match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str::<ConsoleConfig>(&json) {
            Ok(config) => {
                log::debug!("Loaded config from {}: {:?}", path.display(), config);
                return config;
            }
            Err(e) => {
                log::warn!(
                    "Failed to parse {}, using defaults: {}",
                    path.display(),
                    e
                );
            }
        },
        Err(e) => {
            log::warn!("Cannot read {}, using defaults: {}", path.display(), e);
        }
    }
    ConsoleConfig::default()
}

/// Command line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub capacity: Option<usize>,
    pub speed_limit: Option<f64>,
    pub no_auto_select: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut ConsoleConfig) {
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(speed_limit) = self.speed_limit {
            config.speed_limit = speed_limit;
        }
        if self.no_auto_select {
            config.auto_select_on_detect = false;
        }
    }
}

pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> ConsoleConfig {
    let mut config = path.map(load_config).unwrap_or_default();
    overrides.apply(&mut config);
    config
}
