//! Alert Evaluator
//!
//! Plates with any raised flag produce a [`Alert`] on every ingestion.
//! Evaluation never mutates tracking state; the console forwards the alert
//! to the host and shows it on the banner board until its timer expires.
//!
//! A `boloAlert` from the host raises the banner directly for a plate that
//! need not be tracked at all.
//!
//! The radar has no separate alert path: the speed band of each lane is
//! already the alert signal.

use serde::Serialize;

use crate::plate::{FlagSet, PlateKey, PlateRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Flagged,
    Bolo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub plate: PlateKey,
    pub flags: Vec<String>,
}

/// Currently-true flags on the merged record, or nothing
pub fn evaluate(record: &PlateRecord) -> Option<Alert> {
    if record.flags.is_empty() {
        return None;
    }
    Some(Alert {
        kind: AlertKind::Flagged,
        plate: record.plate.clone(),
        flags: record.flags.to_vec(),
    })
}

/// Host-raised lookout banner. Falls back to a bare `bolo` flag.
pub fn bolo(plate: PlateKey, flags: &FlagSet) -> Alert {
    let flags = if flags.is_empty() {
        vec!["bolo".to_string()]
    } else {
        flags.to_vec()
    };
    Alert {
        kind: AlertKind::Bolo,
        plate,
        flags,
    }
}

/// Banner showing the most recent alert
#[derive(Debug, Clone, Default)]
pub struct AlertBoard {
    current: Option<Alert>,
}

impl AlertBoard {
    pub fn show(&mut self, alert: Alert) {
        self.current = Some(alert);
    }

    pub fn hide(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref()
    }
}
