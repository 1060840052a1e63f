//! Native runtime for the patrol console.
//!
//! Wires the platform-independent `mdt-core` service to real I/O: a
//! line-delimited JSON event feed, JSON-lines host notifications, snapshot
//! output and a tokio loop that drives the console's delayed effects.

pub mod config;
pub mod feed;
pub mod host_io;
pub mod session;

pub use session::{Session, SessionStats};
