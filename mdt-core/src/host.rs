//! Host notifications
//!
//! One-way messages from the console to its host environment. The console
//! never waits on a reply; anything the host sends back arrives later as an
//! inbound event.
//!
//! Implement [`HostNotifier`] to deliver notifications over whatever
//! transport the host uses:
//!
//! ```rust,ignore
//! struct Stdout;
//!
//! impl HostNotifier for Stdout {
//!     fn notify(&mut self, notification: Notification) {
//!         println!("{}", serde_json::to_string(&notification).unwrap());
//!     }
//! }
//! ```

use serde::Serialize;

use crate::plate::Channel;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Notification {
    GetVehicleInfo {
        plate: String,
    },
    StartScanning,
    StopScanning,
    ScannerClosed,
    RadarOpened,
    RadarClosed,
    PowerToggle {
        active: bool,
    },
    LaserToggle {
        #[serde(rename = "laserMode")]
        laser_mode: bool,
    },
    LaneSelected {
        lane: Option<u8>,
    },
    LockToggle {
        direction: Channel,
        locked: bool,
    },
    FlaggedPlateDetected {
        plate: String,
        flags: Vec<String>,
    },
    SpeedDetected {
        lane: u8,
        speed: f64,
        direction: Channel,
    },
    LaserTarget {
        lane: u8,
        speed: f64,
        distance: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        plate: Option<String>,
    },
    RadarPlateDetected {
        plate: String,
        lane: u8,
    },
}

pub trait HostNotifier {
    fn notify(&mut self, notification: Notification);
}

/// Keeps every notification in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    pub sent: Vec<Notification>,
}

impl RecordingHost {
    pub fn new() -> Self {
        RecordingHost::default()
    }

    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.sent)
    }
}

impl HostNotifier for RecordingHost {
    fn notify(&mut self, notification: Notification) {
        self.sent.push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(Notification::LockToggle {
            direction: Channel::Rear,
            locked: true,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "lockToggle", "direction": "rear", "locked": true})
        );

        let json = serde_json::to_value(Notification::StartScanning).unwrap();
        assert_eq!(json, serde_json::json!({"action": "startScanning"}));

        let json = serde_json::to_value(Notification::LaserToggle { laser_mode: false }).unwrap();
        assert_eq!(json["laserMode"], false);
    }

    #[test]
    fn test_recording_host() {
        let mut host = RecordingHost::new();
        host.notify(Notification::StopScanning);
        assert_eq!(host.take(), vec![Notification::StopScanning]);
        assert!(host.sent.is_empty());
    }
}
