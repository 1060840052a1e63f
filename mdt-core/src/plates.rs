//! Plate Track Aggregator
//!
//! Keeps the bounded, recency-ordered set of plates seen this session.
//! One record per canonical key; a repeat detection merges into the
//! existing record and moves it to the front. Once the list grows past
//! capacity the least recently detected plates are dropped.

use std::collections::{HashMap, VecDeque};

use crate::error::ConsoleError;
use crate::plate::{PlateDetails, PlateKey, PlateRecord, ScanEvent};

/// Result of a successful [`PlateTracker::ingest`]
#[derive(Debug, Clone, PartialEq)]
pub struct Ingested {
    pub key: PlateKey,
    /// True on first detection (Unseen -> Tracked)
    pub created: bool,
    /// Plates dropped from the tail to stay within capacity
    pub evicted: Vec<PlateKey>,
}

#[derive(Debug, Clone)]
pub struct PlateTracker {
    capacity: usize,
    records: HashMap<PlateKey, PlateRecord>,
    /// Most recently detected first
    order: VecDeque<PlateKey>,
}

impl PlateTracker {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        PlateTracker {
            capacity,
            records: HashMap::with_capacity(capacity + 1),
            order: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Merge a detection into the collection
    ///
    /// Fails with [`ConsoleError::InvalidEvent`] and leaves the collection
    /// untouched when the plate text has no alphanumeric characters.
    pub fn ingest(&mut self, scan: ScanEvent, now: u64) -> Result<Ingested, ConsoleError> {
        let key = PlateKey::parse(&scan.plate).ok_or_else(|| {
            ConsoleError::InvalidEvent(format!("scan without plate text ({:?})", scan.plate))
        })?;

        let created = match self.records.get_mut(&key) {
            Some(record) => {
                record.observe(scan.source, scan.details, now);
                log::trace!("{}: seen {} times", key, record.seen_count);
                self.promote(&key);
                false
            }
            None => {
                let record = PlateRecord::new(key.clone(), scan.source, scan.details, now);
                log::trace!("{}: new plate from {}", key, record.source);
                self.records.insert(key.clone(), record);
                self.order.push_front(key.clone());
                true
            }
        };

        let mut evicted = Vec::new();
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_back() {
                self.records.remove(&oldest);
                log::debug!("{}: evicted, capacity {} reached", oldest, self.capacity);
                evicted.push(oldest);
            }
        }

        Ok(Ingested {
            key,
            created,
            evicted,
        })
    }

    fn promote(&mut self, key: &PlateKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if pos != 0 {
                if let Some(k) = self.order.remove(pos) {
                    self.order.push_front(k);
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&PlateRecord> {
        self.records.get(key)
    }

    /// Look up by raw, uncanonicalized plate text
    pub fn find(&self, raw: &str) -> Option<&PlateRecord> {
        PlateKey::parse(raw).and_then(|key| self.records.get(&key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    /// Merge enrichment data without touching recency or seen count.
    ///
    /// Returns false if the plate is no longer tracked.
    pub fn apply_details(&mut self, key: &str, details: PlateDetails) -> bool {
        match self.records.get_mut(key) {
            Some(record) => {
                record.merge_details(details);
                true
            }
            None => false,
        }
    }

    /// Records in recency order, newest first
    pub fn iter(&self) -> impl Iterator<Item = &PlateRecord> {
        self.order.iter().filter_map(|key| self.records.get(key))
    }

    pub fn newest(&self) -> Option<&PlateRecord> {
        self.iter().next()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate::Channel;

    fn plates(tracker: &PlateTracker) -> Vec<&str> {
        tracker.iter().map(|r| r.plate.as_str()).collect()
    }

    #[test]
    fn test_repeat_detection_merges() {
        let mut tracker = PlateTracker::new(50);

        tracker
            .ingest(ScanEvent::new("ABC123", Channel::Front).with_flags(&["stolen"]), 1)
            .unwrap();
        let second = tracker
            .ingest(ScanEvent::new("ABC123", Channel::Front).with_flags(&["expired"]), 2)
            .unwrap();

        assert!(!second.created);
        assert_eq!(tracker.len(), 1);

        let record = tracker.get("ABC123").unwrap();
        assert_eq!(record.seen_count, 2);
        assert_eq!(record.flags.to_vec(), vec!["expired", "stolen"]);
    }

    #[test]
    fn test_format_insensitive_identity() {
        let mut tracker = PlateTracker::new(50);

        tracker.ingest(ScanEvent::new("abc-123", Channel::Front), 1).unwrap();
        tracker.ingest(ScanEvent::new("ABC123", Channel::Rear), 2).unwrap();

        assert_eq!(plates(&tracker), vec!["ABC123"]);
        assert_eq!(tracker.get("ABC123").unwrap().source, Channel::Rear);
        assert!(tracker.find("abc 123").is_some());
    }

    #[test]
    fn test_recency_order() {
        let mut tracker = PlateTracker::new(50);
        for (i, p) in ["P1", "P2", "P3"].iter().enumerate() {
            tracker.ingest(ScanEvent::new(p, Channel::Front), i as u64).unwrap();
        }
        assert_eq!(plates(&tracker), vec!["P3", "P2", "P1"]);

        // Repeat detection moves to the front
        tracker.ingest(ScanEvent::new("P1", Channel::Front), 10).unwrap();
        assert_eq!(plates(&tracker), vec!["P1", "P3", "P2"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut tracker = PlateTracker::new(50);
        let mut last = None;
        for i in 0..51 {
            last = Some(
                tracker
                    .ingest(ScanEvent::new(&format!("PL{:03}", i), Channel::Front), i)
                    .unwrap(),
            );
        }

        assert_eq!(tracker.len(), 50);
        assert!(!tracker.contains("PL000"));
        assert!(tracker.contains("PL001"));
        assert_eq!(last.unwrap().evicted, vec![PlateKey::parse("PL000").unwrap()]);
        assert_eq!(tracker.newest().unwrap().plate.as_str(), "PL050");
    }

    #[test]
    fn test_invalid_plate_does_not_mutate() {
        let mut tracker = PlateTracker::new(50);
        tracker.ingest(ScanEvent::new("KEEP1", Channel::Front), 1).unwrap();

        let err = tracker.ingest(ScanEvent::new(" -- ", Channel::Rear), 2);
        assert!(matches!(err, Err(ConsoleError::InvalidEvent(_))));
        assert_eq!(plates(&tracker), vec!["KEEP1"]);
        assert_eq!(tracker.get("KEEP1").unwrap().seen_count, 1);
    }

    #[test]
    fn test_clear_starts_fresh() {
        let mut tracker = PlateTracker::new(50);
        tracker.ingest(ScanEvent::new("ABC123", Channel::Front), 1).unwrap();
        tracker.ingest(ScanEvent::new("ABC123", Channel::Front), 2).unwrap();

        tracker.clear();
        tracker.clear();
        assert!(tracker.is_empty());

        let again = tracker.ingest(ScanEvent::new("ABC123", Channel::Front), 3).unwrap();
        assert!(again.created);
        assert_eq!(tracker.get("ABC123").unwrap().seen_count, 1);
    }

    #[test]
    fn test_apply_details_keeps_recency() {
        let mut tracker = PlateTracker::new(50);
        tracker.ingest(ScanEvent::new("OLD1", Channel::Front), 1).unwrap();
        tracker.ingest(ScanEvent::new("NEW1", Channel::Front), 2).unwrap();

        let details = PlateDetails {
            owner: Some("A. SMITH".into()),
            ..Default::default()
        };
        assert!(tracker.apply_details("OLD1", details.clone()));
        assert!(!tracker.apply_details("GONE1", details));

        assert_eq!(plates(&tracker), vec!["NEW1", "OLD1"]);
        let record = tracker.get("OLD1").unwrap();
        assert_eq!(record.owner.as_deref(), Some("A. SMITH"));
        assert_eq!(record.seen_count, 1);
    }
}
