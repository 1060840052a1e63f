//! Event Ingestion Gateway
//!
//! Decodes JSON messages from the sensor feed and operator input into
//! [`InboundEvent`]. Every message is an object carrying an `action`
//! discriminator plus the fields for that action:
//!
//! ```json
//! {"action": "scan", "plate": "abc-123", "source": "rear", "flags": {"stolen": true}}
//! {"action": "speed", "lane": 2, "speed": 41, "direction": "front"}
//! {"action": "laneSelect", "lane": 2}
//! ```
//!
//! The message names used by the older console windows (`ALPR_SCAN`,
//! `RADAR_SPEED_DETECTED`, ...) are accepted as aliases.
//!
//! Decoding never touches console state. A malformed message is an
//! [`ConsoleError::InvalidEvent`]; an unrecognised action is
//! [`ConsoleError::UnknownAction`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use strum::EnumString;

use crate::error::ConsoleError;
use crate::plate::{Channel, PlateDetails, ScanEvent};
use crate::radar::{LaserReading, SpeedReading};

/// Every event the console reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    // Sensor feed
    Scan(ScanEvent),
    Speed(SpeedReading),
    Laser(LaserReading),
    PatrolSpeed { speed: f64 },
    RadarPlate { plate: String, lane: u8 },
    Clear,
    GpsUpdate { coords: Option<Value> },
    ScanCount,

    // Host replies
    /// Without a plate the reply answers the outstanding request
    VehicleInfoReceived {
        plate: Option<String>,
        data: Option<PlateDetails>,
    },
    Bolo(ScanEvent),

    // Operator input
    ScannerOpen { unit: Option<String> },
    ScannerClose,
    ScanToggle { enabled: Option<bool> },
    RadarOpen,
    RadarClose,
    PowerToggle,
    LaserToggle,
    LaneSelect { lane: u8 },
    LockToggle { direction: Channel },
    PlateSelect { plate: String },
    VehicleInfoRequest,
    VehicleInfoDismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
enum Action {
    #[strum(serialize = "scan", serialize = "ALPR_SCAN")]
    Scan,
    /// Legacy wrapper: `{"action": "plateDetected", "plateData": {...}}`
    #[strum(serialize = "plateDetected")]
    PlateDetected,
    #[strum(serialize = "speed", serialize = "RADAR_SPEED_DETECTED")]
    Speed,
    #[strum(serialize = "laser", serialize = "RADAR_LASER_TARGET")]
    Laser,
    #[strum(serialize = "patrolSpeed", serialize = "RADAR_PATROL_SPEED")]
    PatrolSpeed,
    #[strum(serialize = "radarPlate", serialize = "RADAR_PLATE_DETECTED")]
    RadarPlate,
    #[strum(serialize = "clear", serialize = "ALPR_CLEAR")]
    Clear,
    #[strum(serialize = "updateGPS")]
    UpdateGps,
    #[strum(serialize = "updateScanCount")]
    UpdateScanCount,
    #[strum(serialize = "vehicleInfoReceived", serialize = "vehicleInfo")]
    VehicleInfoReceived,
    /// `{"action": "boloAlert", "plateData": {...}}`
    #[strum(serialize = "boloAlert")]
    BoloAlert,
    #[strum(serialize = "scannerOpen", serialize = "ALPR_OPEN")]
    ScannerOpen,
    #[strum(serialize = "scannerClose", serialize = "ALPR_CLOSE")]
    ScannerClose,
    #[strum(serialize = "scanToggle", serialize = "ALPR_TOGGLE")]
    ScanToggle,
    #[strum(serialize = "radarOpen", serialize = "ASE_OPEN")]
    RadarOpen,
    #[strum(serialize = "radarClose", serialize = "ASE_CLOSE")]
    RadarClose,
    #[strum(serialize = "powerToggle")]
    PowerToggle,
    #[strum(serialize = "laserToggle")]
    LaserToggle,
    #[strum(serialize = "laneSelect")]
    LaneSelect,
    #[strum(serialize = "lockToggle")]
    LockToggle,
    #[strum(serialize = "plateSelect")]
    PlateSelect,
    #[strum(serialize = "vehicleInfoRequest")]
    VehicleInfoRequest,
    #[strum(serialize = "vehicleInfoDismiss")]
    VehicleInfoDismiss,
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Deserialize)]
struct ScanPayload {
    #[serde(default)]
    plate: Option<String>,
    #[serde(default)]
    source: Option<Channel>,
    #[serde(flatten)]
    details: PlateDetails,
}

impl From<ScanPayload> for ScanEvent {
    fn from(p: ScanPayload) -> Self {
        ScanEvent {
            plate: p.plate.unwrap_or_default(),
            source: p.source,
            details: p.details,
        }
    }
}

#[derive(Deserialize)]
struct SpeedPayload {
    lane: u8,
    speed: f64,
    #[serde(default)]
    direction: Option<Channel>,
}

#[derive(Deserialize)]
struct LaserPayload {
    lane: u8,
    speed: f64,
    distance: f64,
    #[serde(default)]
    plate: Option<String>,
}

#[derive(Deserialize)]
struct SpeedOnly {
    speed: f64,
}

#[derive(Deserialize)]
struct RadarPlatePayload {
    plate: String,
    lane: u8,
}

#[derive(Deserialize)]
struct VehicleInfoPayload {
    #[serde(default)]
    plate: Option<String>,
    #[serde(default, alias = "vehicleData")]
    data: Option<PlateDetails>,
}

#[derive(Deserialize)]
struct GpsPayload {
    #[serde(default)]
    coords: Option<Value>,
}

#[derive(Deserialize)]
struct UnitPayload {
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Deserialize)]
struct TogglePayload {
    #[serde(default)]
    enabled: Option<bool>,
}

#[derive(Deserialize)]
struct LanePayload {
    lane: u8,
}

#[derive(Deserialize)]
struct LockPayload {
    direction: Channel,
}

#[derive(Deserialize)]
struct PlatePayload {
    plate: String,
}

fn payload<T: DeserializeOwned>(action: Action, value: Value) -> Result<T, ConsoleError> {
    serde_json::from_value(value)
        .map_err(|e| ConsoleError::InvalidEvent(format!("{:?}: {}", action, e)))
}

/// Scan fields nested under `plateData`
fn plate_data(action: Action, value: &mut Value) -> Result<ScanEvent, ConsoleError> {
    match value.get_mut("plateData").map(Value::take) {
        Some(inner @ Value::Object(_)) => Ok(payload::<ScanPayload>(action, inner)?.into()),
        _ => Err(ConsoleError::InvalidEvent(format!(
            "{:?} without plateData",
            action
        ))),
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode one line of JSON text
pub fn decode(text: &str) -> Result<InboundEvent, ConsoleError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ConsoleError::InvalidEvent(format!("malformed JSON: {}", e)))?;
    decode_value(value)
}

/// Decode an already-parsed JSON message
pub fn decode_value(mut value: Value) -> Result<InboundEvent, ConsoleError> {
    let name = match value.get("action") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(ConsoleError::InvalidEvent(format!(
                "action must be a string, got {}",
                other
            )))
        }
        None => return Err(ConsoleError::InvalidEvent("missing action".to_string())),
    };
    let action = Action::from_str(&name).map_err(|_| ConsoleError::UnknownAction(name))?;

    let event = match action {
        Action::Scan => InboundEvent::Scan(payload::<ScanPayload>(action, value)?.into()),
        Action::PlateDetected => InboundEvent::Scan(plate_data(action, &mut value)?),
        Action::BoloAlert => InboundEvent::Bolo(plate_data(action, &mut value)?),
        Action::Speed => {
            let p: SpeedPayload = payload(action, value)?;
            InboundEvent::Speed(SpeedReading {
                lane: p.lane,
                speed: p.speed,
                direction: p.direction.unwrap_or_else(|| Channel::for_lane(p.lane)),
            })
        }
        Action::Laser => {
            let p: LaserPayload = payload(action, value)?;
            InboundEvent::Laser(LaserReading {
                lane: p.lane,
                speed: p.speed,
                distance: p.distance,
                plate: p.plate,
            })
        }
        Action::PatrolSpeed => InboundEvent::PatrolSpeed {
            speed: payload::<SpeedOnly>(action, value)?.speed,
        },
        Action::RadarPlate => {
            let p: RadarPlatePayload = payload(action, value)?;
            InboundEvent::RadarPlate {
                plate: p.plate,
                lane: p.lane,
            }
        }
        Action::Clear => InboundEvent::Clear,
        Action::UpdateGps => InboundEvent::GpsUpdate {
            coords: payload::<GpsPayload>(action, value)?.coords,
        },
        Action::UpdateScanCount => InboundEvent::ScanCount,
        Action::VehicleInfoReceived => {
            let p: VehicleInfoPayload = payload(action, value)?;
            InboundEvent::VehicleInfoReceived {
                plate: p.plate,
                data: p.data,
            }
        }
        Action::ScannerOpen => InboundEvent::ScannerOpen {
            unit: payload::<UnitPayload>(action, value)?.unit,
        },
        Action::ScannerClose => InboundEvent::ScannerClose,
        Action::ScanToggle => InboundEvent::ScanToggle {
            enabled: payload::<TogglePayload>(action, value)?.enabled,
        },
        Action::RadarOpen => InboundEvent::RadarOpen,
        Action::RadarClose => InboundEvent::RadarClose,
        Action::PowerToggle => InboundEvent::PowerToggle,
        Action::LaserToggle => InboundEvent::LaserToggle,
        Action::LaneSelect => InboundEvent::LaneSelect {
            lane: payload::<LanePayload>(action, value)?.lane,
        },
        Action::LockToggle => InboundEvent::LockToggle {
            direction: payload::<LockPayload>(action, value)?.direction,
        },
        Action::PlateSelect => InboundEvent::PlateSelect {
            plate: payload::<PlatePayload>(action, value)?.plate,
        },
        Action::VehicleInfoRequest => InboundEvent::VehicleInfoRequest,
        Action::VehicleInfoDismiss => InboundEvent::VehicleInfoDismiss,
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_scan() {
        let event = decode(
            r#"{"action":"scan","plate":"abc-123","source":"Rear",
                "flags":{"stolen":true},"owner":"J. DOE","distance":14.5,
                "vehicle":{"make":"Vapid","model":"Stanier","color":"Black"}}"#,
        )
        .unwrap();

        let InboundEvent::Scan(scan) = event else {
            panic!("expected scan");
        };
        assert_eq!(scan.plate, "abc-123");
        assert_eq!(scan.source, Some(Channel::Rear));
        assert!(scan.details.flags.contains("stolen"));
        assert_eq!(scan.details.owner.as_deref(), Some("J. DOE"));
        assert_eq!(scan.details.distance, Some(14.5));
        assert_eq!(
            scan.details.vehicle.unwrap().model.as_deref(),
            Some("Stanier")
        );
    }

    #[test]
    fn test_decode_legacy_names() {
        assert!(matches!(
            decode(r#"{"action":"ALPR_SCAN","plate":"X1"}"#),
            Ok(InboundEvent::Scan(_))
        ));
        assert!(matches!(
            decode(r#"{"action":"plateDetected","plateData":{"plate":"X1","flags":["bolo"]}}"#),
            Ok(InboundEvent::Scan(ScanEvent { ref details, .. })) if details.flags.contains("bolo")
        ));
        assert_eq!(decode(r#"{"action":"ALPR_CLEAR"}"#), Ok(InboundEvent::Clear));
        assert_eq!(decode(r#"{"action":"ASE_CLOSE"}"#), Ok(InboundEvent::RadarClose));
    }

    #[test]
    fn test_decode_speed_infers_direction() {
        let event = decode(r#"{"action":"RADAR_SPEED_DETECTED","lane":5,"speed":47}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::Speed(SpeedReading {
                lane: 5,
                speed: 47.0,
                direction: Channel::Rear,
            })
        );
    }

    #[test]
    fn test_decode_operator_events() {
        assert_eq!(
            decode(r#"{"action":"laneSelect","lane":3}"#),
            Ok(InboundEvent::LaneSelect { lane: 3 })
        );
        assert_eq!(
            decode(r#"{"action":"lockToggle","direction":"rear"}"#),
            Ok(InboundEvent::LockToggle {
                direction: Channel::Rear
            })
        );
        assert_eq!(
            decode(r#"{"action":"scanToggle"}"#),
            Ok(InboundEvent::ScanToggle { enabled: None })
        );
        assert_eq!(
            decode(r#"{"action":"ALPR_TOGGLE","enabled":true}"#),
            Ok(InboundEvent::ScanToggle {
                enabled: Some(true)
            })
        );
    }

    #[test]
    fn test_decode_vehicle_info() {
        let event =
            decode(r#"{"action":"vehicleInfo","plate":"ABC123","vehicleData":{"owner":"A"}}"#)
                .unwrap();
        let InboundEvent::VehicleInfoReceived { plate, data } = event else {
            panic!("expected vehicle info");
        };
        assert_eq!(plate.as_deref(), Some("ABC123"));
        assert_eq!(data.unwrap().owner.as_deref(), Some("A"));

        assert_eq!(
            decode(r#"{"action":"vehicleInfoReceived","plate":"ABC123","data":null}"#),
            Ok(InboundEvent::VehicleInfoReceived {
                plate: Some("ABC123".to_string()),
                data: None
            })
        );
    }

    #[test]
    fn test_decode_vehicle_info_without_plate() {
        let event = decode(r#"{"action":"vehicleInfo","vehicleData":{"owner":"A"}}"#).unwrap();
        let InboundEvent::VehicleInfoReceived { plate, data } = event else {
            panic!("expected vehicle info");
        };
        assert_eq!(plate, None);
        assert_eq!(data.unwrap().owner.as_deref(), Some("A"));

        assert_eq!(
            decode(r#"{"action":"vehicleInfo","vehicleData":null}"#),
            Ok(InboundEvent::VehicleInfoReceived {
                plate: None,
                data: None
            })
        );
    }

    #[test]
    fn test_decode_bolo_alert() {
        let event =
            decode(r#"{"action":"boloAlert","plateData":{"plate":"ABC123","flags":["bolo"]}}"#)
                .unwrap();
        let InboundEvent::Bolo(scan) = event else {
            panic!("expected bolo alert");
        };
        assert_eq!(scan.plate, "ABC123");
        assert!(scan.details.flags.contains("bolo"));

        assert!(matches!(
            decode(r#"{"action":"boloAlert"}"#),
            Err(ConsoleError::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_decode_status_messages() {
        assert_eq!(
            decode(r#"{"action":"updateGPS","coords":{"x":1}}"#),
            Ok(InboundEvent::GpsUpdate {
                coords: Some(serde_json::json!({"x": 1}))
            })
        );
        assert_eq!(
            decode(r#"{"action":"updateGPS"}"#),
            Ok(InboundEvent::GpsUpdate { coords: None })
        );
        assert_eq!(
            decode(r#"{"action":"updateScanCount","count":3}"#),
            Ok(InboundEvent::ScanCount)
        );
    }

    #[test]
    fn test_unknown_action() {
        assert_eq!(
            decode(r#"{"action":"cameraTilt","angle":4}"#),
            Err(ConsoleError::UnknownAction("cameraTilt".to_string()))
        );
    }

    #[test]
    fn test_malformed_messages() {
        assert!(matches!(decode("{not json"), Err(ConsoleError::InvalidEvent(_))));
        assert!(matches!(decode(r#"{"plate":"X"}"#), Err(ConsoleError::InvalidEvent(_))));
        assert!(matches!(decode(r#"{"action":7}"#), Err(ConsoleError::InvalidEvent(_))));
        assert!(matches!(
            decode(r#"{"action":"speed","lane":"two","speed":30}"#),
            Err(ConsoleError::InvalidEvent(_))
        ));
        assert!(matches!(
            decode(r#"{"action":"plateDetected"}"#),
            Err(ConsoleError::InvalidEvent(_))
        ));
    }
}
