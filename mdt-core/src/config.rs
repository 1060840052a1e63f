//! Console configuration
//!
//! One explicit configuration is handed to [`crate::Console::new`]. Every
//! field has a default so partial JSON files deserialize cleanly.

use serde::{Deserialize, Serialize};

/// Maximum number of plates kept in the recency list
pub const DEFAULT_CAPACITY: usize = 50;
/// Posted speed limit used for banding
pub const DEFAULT_SPEED_LIMIT: f64 = 35.0;
/// Half-width of the close-to-limit band
pub const DEFAULT_CLOSE_BAND: f64 = 5.0;
pub const DEFAULT_HIT_FLASH_MS: u64 = 700;
pub const DEFAULT_ALERT_BANNER_MS: u64 = 5_000;
pub const DEFAULT_ENRICHMENT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_UNIT_NAME: &str = "1-LINCOLN-18";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleConfig {
    /// Maximum tracked plates; the least recently detected is evicted beyond this
    pub capacity: usize,

    /// Speed limit for lane classification
    pub speed_limit: f64,

    /// Readings within `speed_limit ± close_band` are close-to-limit
    pub close_band: f64,

    /// Select every newly ingested plate, overriding a manual selection
    pub auto_select_on_detect: bool,

    /// Duration of the per-channel hit indicator
    pub hit_flash_ms: u64,

    /// How long a flagged-plate banner stays up
    pub alert_banner_ms: u64,

    /// Wait for a vehicle-info response before showing a timeout
    pub enrichment_timeout_ms: u64,

    /// Callsign shown in the scanner header
    pub unit_name: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            capacity: DEFAULT_CAPACITY,
            speed_limit: DEFAULT_SPEED_LIMIT,
            close_band: DEFAULT_CLOSE_BAND,
            auto_select_on_detect: true,
            hit_flash_ms: DEFAULT_HIT_FLASH_MS,
            alert_banner_ms: DEFAULT_ALERT_BANNER_MS,
            enrichment_timeout_ms: DEFAULT_ENRICHMENT_TIMEOUT_MS,
            unit_name: DEFAULT_UNIT_NAME.to_string(),
        }
    }
}
