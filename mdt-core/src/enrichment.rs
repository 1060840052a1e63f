//! Vehicle-info lookups
//!
//! The operator asks the host for the selected plate's vehicle record. The
//! response arrives later as its own event. If it does not arrive within the
//! configured wait the status flips to `TimedOut`; there is no retry.

use serde::Serialize;

use crate::plate::PlateKey;
use crate::scheduler::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EnrichmentStatus {
    Idle,
    Pending {
        plate: PlateKey,
        #[serde(skip)]
        timer: TaskId,
    },
    Received {
        plate: PlateKey,
    },
    NoData {
        plate: PlateKey,
    },
    TimedOut {
        plate: PlateKey,
    },
}

impl Default for EnrichmentStatus {
    fn default() -> Self {
        EnrichmentStatus::Idle
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnrichmentTracker {
    status: EnrichmentStatus,
}

impl EnrichmentTracker {
    pub fn status(&self) -> &EnrichmentStatus {
        &self.status
    }

    fn pending_timer(&self) -> Option<TaskId> {
        match &self.status {
            EnrichmentStatus::Pending { timer, .. } => Some(*timer),
            _ => None,
        }
    }

    /// Plate of the outstanding request, if any
    pub fn pending_plate(&self) -> Option<&PlateKey> {
        match &self.status {
            EnrichmentStatus::Pending { plate, .. } => Some(plate),
            _ => None,
        }
    }

    /// Start waiting for `plate`. Returns the timer of a request this one supersedes.
    pub fn request(&mut self, plate: PlateKey, timer: TaskId) -> Option<TaskId> {
        let superseded = self.pending_timer();
        self.status = EnrichmentStatus::Pending { plate, timer };
        superseded
    }

    /// A response arrived. Returns the pending timer to cancel.
    pub fn receive(&mut self, plate: PlateKey, found: bool) -> Option<TaskId> {
        let timer = self.pending_timer();
        self.status = if found {
            EnrichmentStatus::Received { plate }
        } else {
            EnrichmentStatus::NoData { plate }
        };
        timer
    }

    /// Timer fired. Stale timers (already answered or superseded) are ignored.
    pub fn time_out(&mut self, fired: TaskId) -> bool {
        match &self.status {
            EnrichmentStatus::Pending { plate, timer } if *timer == fired => {
                log::info!("{}: vehicle info request timed out", plate);
                self.status = EnrichmentStatus::TimedOut {
                    plate: plate.clone(),
                };
                true
            }
            _ => false,
        }
    }

    /// Close the status display. Returns the pending timer to cancel.
    pub fn dismiss(&mut self) -> Option<TaskId> {
        let timer = self.pending_timer();
        self.status = EnrichmentStatus::Idle;
        timer
    }
}
