//! JSON-lines adapters for the host and the display.
//!
//! Notifications and snapshots are written one JSON object per line. Write
//! failures are logged and dropped; the host link is fire-and-forget.

use std::io::Write;

use mdt_core::{ConsoleSnapshot, DisplaySurface, HostNotifier, Notification};
use serde::Serialize;

fn write_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Sends host notifications as JSON lines
pub struct JsonLinesHost<W: Write> {
    out: W,
    sent: u64,
}

impl<W: Write> JsonLinesHost<W> {
    pub fn new(out: W) -> Self {
        JsonLinesHost { out, sent: 0 }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> HostNotifier for JsonLinesHost<W> {
    fn notify(&mut self, notification: Notification) {
        log::trace!("-> host {:?}", notification);
        match write_line(&mut self.out, &notification) {
            Ok(()) => self.sent += 1,
            Err(e) => log::error!("Failed to send host notification: {}", e),
        }
    }
}

/// Writes every rendered snapshot as a JSON line
pub struct SnapshotWriter<W: Write> {
    out: W,
    frames: u64,
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(out: W) -> Self {
        SnapshotWriter { out, frames: 0 }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySurface for SnapshotWriter<W> {
    fn render(&mut self, snapshot: &ConsoleSnapshot) {
        match write_line(&mut self.out, snapshot) {
            Ok(()) => self.frames += 1,
            Err(e) => log::error!("Failed to write snapshot: {}", e),
        }
    }
}
