//! Operator console detection core
//!
//! Aggregates plate-scanner and speed-radar detections for an in-vehicle
//! console. This crate has no I/O and no async; the caller feeds it events
//! and a millisecond clock, and reads back a snapshot for display.
//!
//! # Architecture
//!
//! - **gateway**: decodes wire messages into typed events
//! - **plates**: bounded, recency-ordered plate collection
//! - **radar**: lane speeds, banding, locks and laser correlation
//! - **selection**: selected plate and lane
//! - **channel**: front/rear plate previews
//! - **alert**: flagged-plate alerts and the banner
//! - **enrichment**: vehicle-info lookup status
//! - **scheduler**: delayed effects against a virtual clock
//! - **host**: outbound notifications
//! - **projection**: read-only snapshot for presentation adapters
//! - **console**: the service tying it all together
//!
//! # Usage
//!
//! ```rust,ignore
//! use mdt_core::{Console, ConsoleConfig, RecordingHost};
//!
//! let mut console = Console::new(ConsoleConfig::default());
//! let mut host = RecordingHost::new();
//!
//! console.handle_raw(&mut host, r#"{"action":"scan","plate":"abc-123","flags":["stolen"]}"#, now)?;
//! let snapshot = console.snapshot();
//! ```

pub mod alert;
pub mod channel;
pub mod config;
pub mod console;
pub mod enrichment;
pub mod error;
pub mod gateway;
pub mod host;
pub mod plate;
pub mod plates;
pub mod projection;
pub mod radar;
pub mod scheduler;
pub mod selection;

pub use config::ConsoleConfig;
pub use console::{Console, ScannerState};
pub use error::ConsoleError;
pub use gateway::{decode, InboundEvent};
pub use host::{HostNotifier, Notification, RecordingHost};
pub use plate::{Channel, PlateKey, PlateRecord};
pub use projection::{ConsoleSnapshot, DisplaySurface};
