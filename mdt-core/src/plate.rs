//! Plate Records
//!
//! Types describing a tracked licence plate: its canonical key, the named
//! flags raised against it, and the vehicle details reported by the scanner
//! or returned by a vehicle-info lookup.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Channel
// =============================================================================

/// Sensor direction / display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Front,
    Rear,
}

impl Default for Channel {
    fn default() -> Self {
        Channel::Front
    }
}

impl Channel {
    /// Parse a wire label. Anything other than "rear" (any case) is front.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("rear") {
            Channel::Rear
        } else {
            Channel::Front
        }
    }

    /// Lanes 1-3 face forward, 4-6 face rearward
    pub fn for_lane(lane: u8) -> Self {
        if lane >= 4 {
            Channel::Rear
        } else {
            Channel::Front
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Channel::Front => Channel::Rear,
            Channel::Rear => Channel::Front,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Front => "front",
            Channel::Rear => "rear",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Channel::from_label(&label))
    }
}

// =============================================================================
// Canonical key
// =============================================================================

/// Uppercase, alphanumeric-only plate text used for identity and display
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PlateKey(String);

impl PlateKey {
    /// Canonicalize raw plate text. Returns `None` if nothing alphanumeric remains.
    pub fn parse(raw: &str) -> Option<PlateKey> {
        let key = canonicalize(raw);
        if key.is_empty() {
            None
        } else {
            Some(PlateKey(key))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PlateKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uppercase and strip everything that is not an ASCII letter or digit
pub fn canonicalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// =============================================================================
// Flags
// =============================================================================

pub const FLAG_STOLEN: &str = "stolen";
pub const FLAG_EXPIRED: &str = "expired";
pub const FLAG_WANTED: &str = "wanted";
pub const FLAG_UNINSURED: &str = "uninsured";

/// Set of currently-true named conditions on a plate
///
/// Accepts both wire forms seen from the feed:
/// `{"stolen": true, "wanted": false}` and `["stolen", "bolo"]`.
/// Names are lowercased; only true entries are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlagSet(BTreeSet<String>);

impl FlagSet {
    pub fn new() -> Self {
        FlagSet::default()
    }

    pub fn insert(&mut self, name: &str) {
        let name = name.trim().to_ascii_lowercase();
        if !name.is_empty() {
            self.0.insert(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Flags never clear once raised; the merged set is the union
    pub fn union_with(&mut self, other: &FlagSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<'a> FromIterator<&'a str> for FlagSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = FlagSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Null => false,
        _ => true,
    }
}

impl<'de> Deserialize<'de> for FlagSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;

        let mut set = FlagSet::new();
        match value {
            None | Some(serde_json::Value::Null) => {}
            Some(serde_json::Value::Object(map)) => {
                for (name, raised) in &map {
                    if is_truthy(raised) {
                        set.insert(name);
                    }
                }
            }
            Some(serde_json::Value::Array(items)) => {
                for item in &items {
                    match item {
                        serde_json::Value::String(name) => set.insert(name),
                        _ => return Err(D::Error::custom("flag names must be strings")),
                    }
                }
            }
            Some(_) => return Err(D::Error::custom("flags must be an object or an array")),
        }
        Ok(set)
    }
}

// =============================================================================
// Details
// =============================================================================

/// Empty strings on the wire mean "not reported"
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Vehicle {
    pub fn is_empty(&self) -> bool {
        self.make.is_none() && self.model.is_none() && self.color.is_none()
    }
}

/// Optional per-plate attributes carried by scans and vehicle-info responses
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlateDetails {
    pub flags: FlagSet,
    pub vehicle: Option<Vehicle>,
    #[serde(deserialize_with = "non_empty")]
    pub owner: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub insurance: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub expiry: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub notes: Option<String>,
    pub distance: Option<f64>,
}

/// A plate detection as decoded from the feed, before canonicalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanEvent {
    pub plate: String,
    pub source: Option<Channel>,
    pub details: PlateDetails,
}

impl ScanEvent {
    pub fn new(plate: &str, source: Channel) -> Self {
        ScanEvent {
            plate: plate.to_string(),
            source: Some(source),
            details: PlateDetails::default(),
        }
    }

    pub fn with_flags(mut self, flags: &[&str]) -> Self {
        self.details.flags = flags.iter().copied().collect();
        self
    }
}

// =============================================================================
// Record
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlateRecord {
    pub plate: PlateKey,
    pub source: Channel,
    pub flags: FlagSet,
    pub seen_count: u32,
    pub first_seen: u64,
    pub last_seen: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl PlateRecord {
    /// First sighting of `plate`
    pub fn new(plate: PlateKey, source: Option<Channel>, details: PlateDetails, now: u64) -> Self {
        let mut record = PlateRecord {
            plate,
            source: source.unwrap_or_default(),
            flags: FlagSet::new(),
            seen_count: 1,
            first_seen: now,
            last_seen: now,
            vehicle: None,
            owner: None,
            insurance: None,
            expiry: None,
            notes: None,
            distance: None,
        };
        record.merge_details(details);
        record
    }

    /// Repeat sighting: bump counters and merge
    pub fn observe(&mut self, source: Option<Channel>, details: PlateDetails, now: u64) {
        self.seen_count += 1;
        self.last_seen = now;
        if let Some(source) = source {
            self.source = source;
        }
        self.merge_details(details);
    }

    /// Flags are unioned; every other field is last-write-wins when present.
    pub fn merge_details(&mut self, details: PlateDetails) {
        self.flags.union_with(&details.flags);
        if let Some(vehicle) = details.vehicle.filter(|v| !v.is_empty()) {
            self.vehicle = Some(vehicle);
        }
        if details.owner.is_some() {
            self.owner = details.owner;
        }
        if details.insurance.is_some() {
            self.insurance = details.insurance;
        }
        if details.expiry.is_some() {
            self.expiry = details.expiry;
        }
        if details.notes.is_some() {
            self.notes = details.notes;
        }
        if details.distance.is_some() {
            self.distance = details.distance;
        }
    }
}
