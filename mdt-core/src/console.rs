//! Console service
//!
//! [`Console`] owns every aggregator and dispatches [`InboundEvent`]s to them.
//! It is the only writer; presentation adapters read it through
//! [`ConsoleSnapshot`].
//!
//! # Time
//!
//! The console never reads a clock. Every call takes `now` in milliseconds
//! from the caller, and delayed effects fire from [`Console::tick`]:
//!
//! ```rust,ignore
//! let mut console = Console::new(ConsoleConfig::default());
//! let mut host = RecordingHost::new();
//!
//! console.handle_raw(&mut host, r#"{"action":"scan","plate":"ABC123","source":"front"}"#, 0)?;
//! assert!(console.snapshot().front.hit);
//!
//! console.tick(700);
//! assert!(!console.snapshot().front.hit);
//! ```
//!
//! # Errors
//!
//! [`Console::handle`] logs every [`ConsoleError`] at its own level and
//! leaves state untouched, then returns it so the caller can count it.

use serde::Serialize;
use serde_json::Value;

use crate::alert::{self, Alert, AlertBoard};
use crate::channel::ChannelRouter;
use crate::config::ConsoleConfig;
use crate::enrichment::{EnrichmentStatus, EnrichmentTracker};
use crate::error::ConsoleError;
use crate::gateway::{self, InboundEvent};
use crate::host::{HostNotifier, Notification};
use crate::plate::{Channel, PlateDetails, PlateKey, PlateRecord, ScanEvent};
use crate::plates::PlateTracker;
use crate::projection::{ConsoleSnapshot, DisplaySurface, LastDetection};
use crate::radar::{LaserReading, RadarTracker, SpeedOutcome, SpeedReading};
use crate::scheduler::Scheduler;
use crate::selection::SelectionState;

/// Delayed effects owned by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    ClearHit(Channel),
    HideAlertBanner,
    EnrichmentTimeout,
}

impl Task {
    /// Display-only effects dropped when the scanner closes or clears
    fn is_transient(&self) -> bool {
        matches!(self, Task::ClearHit(_) | Task::HideAlertBanner)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScannerState {
    pub open: bool,
    pub scanning: bool,
    pub unit: String,
    /// Last position reported by the host, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<Value>,
}

pub struct Console {
    config: ConsoleConfig,
    plates: PlateTracker,
    radar: RadarTracker,
    selection: SelectionState,
    router: ChannelRouter,
    alerts: AlertBoard,
    enrichment: EnrichmentTracker,
    scheduler: Scheduler<Task>,
    scanner: ScannerState,
    last_detection: Option<LastDetection>,
}

impl Console {
    pub fn new(config: ConsoleConfig) -> Self {
        log::debug!(
            "Console: capacity {}, speed limit {}, auto-select {}",
            config.capacity,
            config.speed_limit,
            config.auto_select_on_detect
        );
        Console {
            plates: PlateTracker::new(config.capacity),
            radar: RadarTracker::new(config.speed_limit, config.close_band),
            selection: SelectionState::new(config.auto_select_on_detect),
            router: ChannelRouter::new(),
            alerts: AlertBoard::default(),
            enrichment: EnrichmentTracker::default(),
            scheduler: Scheduler::new(),
            scanner: ScannerState {
                open: false,
                scanning: false,
                unit: config.unit_name.clone(),
                gps: None,
            },
            last_detection: None,
            config,
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn plates(&self) -> &PlateTracker {
        &self.plates
    }

    pub fn radar(&self) -> &RadarTracker {
        &self.radar
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selected_plate(&self) -> Option<&PlateRecord> {
        self.selection.selected_plate(&self.plates)
    }

    pub fn router(&self) -> &ChannelRouter {
        &self.router
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alerts.current()
    }

    pub fn enrichment_status(&self) -> &EnrichmentStatus {
        self.enrichment.status()
    }

    pub fn scanner(&self) -> &ScannerState {
        &self.scanner
    }

    pub fn last_detection(&self) -> Option<LastDetection> {
        self.last_detection
    }

    /// Earliest pending delayed effect, for sizing the caller's timer
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        ConsoleSnapshot::capture(self)
    }

    pub fn render<S: DisplaySurface>(&self, surface: &mut S) {
        surface.render(&self.snapshot());
    }

    // =========================================================================
    // Event entry points
    // =========================================================================

    /// Decode one wire message and handle it
    pub fn handle_raw<H: HostNotifier>(
        &mut self,
        host: &mut H,
        text: &str,
        now: u64,
    ) -> Result<(), ConsoleError> {
        match gateway::decode(text) {
            Ok(event) => self.handle(host, event, now),
            Err(e) => {
                log::log!(e.level(), "{}", e);
                Err(e)
            }
        }
    }

    /// Apply one event. Due delayed effects fire first.
    pub fn handle<H: HostNotifier>(
        &mut self,
        host: &mut H,
        event: InboundEvent,
        now: u64,
    ) -> Result<(), ConsoleError> {
        self.tick(now);

        let result = self.dispatch(host, event, now);
        if let Err(e) = &result {
            log::log!(e.level(), "{}", e);
        }
        result
    }

    /// Run every delayed effect due at `now`. Returns how many fired.
    pub fn tick(&mut self, now: u64) -> usize {
        let fired = self.scheduler.due(now);
        for (id, task) in &fired {
            log::trace!("{:?} fired at {}", task, now);
            match task {
                Task::ClearHit(channel) => self.router.set_hit(*channel, false),
                Task::HideAlertBanner => self.alerts.hide(),
                Task::EnrichmentTimeout => {
                    self.enrichment.time_out(*id);
                }
            }
        }
        fired.len()
    }

    fn dispatch<H: HostNotifier>(
        &mut self,
        host: &mut H,
        event: InboundEvent,
        now: u64,
    ) -> Result<(), ConsoleError> {
        match event {
            InboundEvent::Scan(scan) => self.on_scan(host, scan, now),
            InboundEvent::Speed(reading) => {
                self.on_speed(host, reading);
                Ok(())
            }
            InboundEvent::Laser(reading) => {
                self.on_laser(host, reading);
                Ok(())
            }
            InboundEvent::PatrolSpeed { speed } => {
                self.radar.set_patrol_speed(speed);
                Ok(())
            }
            InboundEvent::RadarPlate { plate, lane } => self.on_radar_plate(host, &plate, lane),
            InboundEvent::Clear => {
                self.clear();
                Ok(())
            }
            InboundEvent::GpsUpdate { coords } => {
                if coords.is_some() {
                    self.scanner.gps = coords;
                }
                Ok(())
            }
            // The count is derived from the collection on every render
            InboundEvent::ScanCount => Ok(()),
            InboundEvent::VehicleInfoReceived { plate, data } => {
                self.on_vehicle_info(plate.as_deref(), data)
            }
            InboundEvent::Bolo(scan) => self.on_bolo(scan, now),
            InboundEvent::ScannerOpen { unit } => {
                self.open_scanner(unit);
                Ok(())
            }
            InboundEvent::ScannerClose => {
                self.close_scanner(host);
                Ok(())
            }
            InboundEvent::ScanToggle { enabled } => {
                self.toggle_scanning(host, enabled);
                Ok(())
            }
            InboundEvent::RadarOpen => {
                self.radar.open();
                log::info!("Radar opened");
                host.notify(Notification::RadarOpened);
                Ok(())
            }
            InboundEvent::RadarClose => {
                self.radar.close();
                self.selection.clear_lane();
                log::info!("Radar closed");
                host.notify(Notification::RadarClosed);
                Ok(())
            }
            InboundEvent::PowerToggle => {
                let active = self.radar.toggle_power();
                if !active {
                    self.selection.clear_lane();
                }
                host.notify(Notification::PowerToggle { active });
                Ok(())
            }
            InboundEvent::LaserToggle => {
                match self.radar.toggle_laser() {
                    Some(laser_mode) => host.notify(Notification::LaserToggle { laser_mode }),
                    None => log::debug!("Laser toggle ignored, radar is off"),
                }
                Ok(())
            }
            InboundEvent::LaneSelect { lane } => {
                let toggle = self.selection.toggle_lane(lane)?;
                if let Some(previous) = toggle.deselected {
                    self.radar.clear_correlation(previous);
                }
                host.notify(Notification::LaneSelected {
                    lane: toggle.selected,
                });
                Ok(())
            }
            InboundEvent::LockToggle { direction } => {
                let locked = self.radar.toggle_lock(direction);
                host.notify(Notification::LockToggle { direction, locked });
                Ok(())
            }
            InboundEvent::PlateSelect { plate } => {
                let record = self.selection.select_plate(&self.plates, &plate)?;
                self.router.route(record.plate.clone(), record.source);
                Ok(())
            }
            InboundEvent::VehicleInfoRequest => self.request_vehicle_info(host, now),
            InboundEvent::VehicleInfoDismiss => {
                if let Some(timer) = self.enrichment.dismiss() {
                    self.scheduler.cancel(timer);
                }
                Ok(())
            }
        }
    }

    // =========================================================================
    // Plates
    // =========================================================================

    fn on_scan<H: HostNotifier>(
        &mut self,
        host: &mut H,
        scan: ScanEvent,
        now: u64,
    ) -> Result<(), ConsoleError> {
        let ingested = self.plates.ingest(scan, now)?;
        for key in &ingested.evicted {
            self.selection.forget(key);
        }

        let Some(record) = self.plates.get(ingested.key.as_str()) else {
            return Ok(());
        };
        let source = record.source;
        let distance = record.distance;
        let alert = alert::evaluate(record);

        self.router.route(ingested.key.clone(), source);
        self.router.set_hit(source, true);
        self.scheduler
            .schedule(now, self.config.hit_flash_ms, Task::ClearHit(source));
        self.last_detection = Some(LastDetection { source, distance });

        self.selection.on_detected(&ingested.key);

        if let Some(alert) = alert {
            log::info!("{}: flagged {}", alert.plate, alert.flags.join(", "));
            host.notify(Notification::FlaggedPlateDetected {
                plate: alert.plate.to_string(),
                flags: alert.flags.clone(),
            });
            self.alerts.show(alert);
            self.scheduler
                .schedule(now, self.config.alert_banner_ms, Task::HideAlertBanner);
        }
        Ok(())
    }

    fn on_bolo(&mut self, scan: ScanEvent, now: u64) -> Result<(), ConsoleError> {
        let key = PlateKey::parse(&scan.plate).ok_or_else(|| {
            ConsoleError::InvalidEvent(format!("bolo alert without plate ({:?})", scan.plate))
        })?;
        let alert = alert::bolo(key, &scan.details.flags);
        log::warn!("{}: BOLO {}", alert.plate, alert.flags.join(", "));
        self.alerts.show(alert);
        self.scheduler
            .schedule(now, self.config.alert_banner_ms, Task::HideAlertBanner);
        Ok(())
    }

    /// Empty the collection and selection. Safe to call repeatedly.
    pub fn clear(&mut self) {
        self.plates.clear();
        self.selection.clear_plate();
        self.router.clear();
        self.alerts.hide();
        self.last_detection = None;
        self.scheduler.cancel_where(Task::is_transient);
        log::debug!("Plate collection cleared");
    }

    fn open_scanner(&mut self, unit: Option<String>) {
        self.scanner.open = true;
        if let Some(unit) = unit.filter(|u| !u.trim().is_empty()) {
            self.scanner.unit = unit;
        }
        log::info!("Scanner opened for unit {}", self.scanner.unit);
    }

    fn close_scanner<H: HostNotifier>(&mut self, host: &mut H) {
        if self.scanner.scanning {
            self.scanner.scanning = false;
            host.notify(Notification::StopScanning);
        }
        self.scanner.open = false;

        self.selection.clear_plate();
        self.router.clear();
        self.alerts.hide();
        self.scheduler.cancel_where(Task::is_transient);
        if let Some(timer) = self.enrichment.dismiss() {
            self.scheduler.cancel(timer);
        }

        log::info!("Scanner closed, {} plates kept", self.plates.len());
        host.notify(Notification::ScannerClosed);
    }

    fn toggle_scanning<H: HostNotifier>(&mut self, host: &mut H, enabled: Option<bool>) {
        let scanning = enabled.unwrap_or(!self.scanner.scanning);
        if scanning == self.scanner.scanning {
            return;
        }
        self.scanner.scanning = scanning;
        log::info!("Scanning {}", if scanning { "started" } else { "stopped" });
        host.notify(if scanning {
            Notification::StartScanning
        } else {
            Notification::StopScanning
        });
    }

    fn request_vehicle_info<H: HostNotifier>(
        &mut self,
        host: &mut H,
        now: u64,
    ) -> Result<(), ConsoleError> {
        let key = self
            .selection
            .plate_key()
            .cloned()
            .ok_or_else(|| ConsoleError::LookupMiss("no plate selected".to_string()))?;

        let timer = self.scheduler.schedule(
            now,
            self.config.enrichment_timeout_ms,
            Task::EnrichmentTimeout,
        );
        if let Some(superseded) = self.enrichment.request(key.clone(), timer) {
            self.scheduler.cancel(superseded);
        }
        log::debug!("{}: requesting vehicle info", key);
        host.notify(Notification::GetVehicleInfo {
            plate: key.to_string(),
        });
        Ok(())
    }

    fn on_vehicle_info(
        &mut self,
        plate: Option<&str>,
        data: Option<PlateDetails>,
    ) -> Result<(), ConsoleError> {
        let key = match plate {
            Some(plate) => PlateKey::parse(plate).ok_or_else(|| {
                ConsoleError::InvalidEvent(format!("vehicle info without plate ({:?})", plate))
            })?,
            None => self.enrichment.pending_plate().cloned().ok_or_else(|| {
                ConsoleError::LookupMiss("vehicle info with no pending request".to_string())
            })?,
        };

        if let Some(timer) = self.enrichment.receive(key.clone(), data.is_some()) {
            self.scheduler.cancel(timer);
        }

        match data {
            Some(details) => {
                if self.plates.apply_details(key.as_str(), details) {
                    Ok(())
                } else {
                    Err(ConsoleError::LookupMiss(format!(
                        "{} no longer tracked",
                        key
                    )))
                }
            }
            None => Ok(()),
        }
    }

    // =========================================================================
    // Radar
    // =========================================================================

    fn on_speed<H: HostNotifier>(&mut self, host: &mut H, reading: SpeedReading) {
        let outcome = self
            .radar
            .on_speed_detected(reading, self.selection.lane());
        if outcome == (SpeedOutcome::Updated { echo: true }) {
            host.notify(Notification::SpeedDetected {
                lane: reading.lane,
                speed: reading.speed,
                direction: reading.direction,
            });
        }
    }

    fn on_laser<H: HostNotifier>(&mut self, host: &mut H, reading: LaserReading) {
        if self.radar.on_laser_target(&reading) {
            host.notify(Notification::LaserTarget {
                lane: reading.lane,
                speed: reading.speed,
                distance: reading.distance,
                plate: reading.plate,
            });
        }
    }

    fn on_radar_plate<H: HostNotifier>(
        &mut self,
        host: &mut H,
        plate: &str,
        lane: u8,
    ) -> Result<(), ConsoleError> {
        let key = PlateKey::parse(plate).ok_or_else(|| {
            ConsoleError::InvalidEvent(format!("radar plate without text ({:?})", plate))
        })?;
        if !self.radar.on_plate_detected(lane, &key) {
            log::debug!("{}: no active target on lane {}", key, lane);
        }
        host.notify(Notification::RadarPlateDetected {
            plate: key.to_string(),
            lane,
        });
        Ok(())
    }
}
