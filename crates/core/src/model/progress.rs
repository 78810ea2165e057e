use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::model::label::Label;
use crate::time::{format_timestamp, parse_timestamp};

//
// ─── POLICY ────────────────────────────────────────────────────────────────────
//

/// What marking an already-recorded label does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MarkPolicy {
    /// Leave the existing entry untouched and report it as already recorded.
    #[default]
    Idempotent,
    /// Replace the existing timestamp with the new one.
    Overwrite,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown mark policy: {raw}")]
pub struct ParseMarkPolicyError {
    raw: String,
}

impl FromStr for MarkPolicy {
    type Err = ParseMarkPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idempotent" | "skip" => Ok(Self::Idempotent),
            "overwrite" => Ok(Self::Overwrite),
            _ => Err(ParseMarkPolicyError { raw: s.to_owned() }),
        }
    }
}

impl fmt::Display for MarkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkPolicy::Idempotent => f.write_str("idempotent"),
            MarkPolicy::Overwrite => f.write_str("overwrite"),
        }
    }
}

/// Result of applying a mark to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The label was not present and has been appended.
    Recorded,
    /// The label was present; nothing changed.
    AlreadyRecorded { recorded_at: NaiveDateTime },
    /// The label was present and its timestamp was replaced (`MarkPolicy::Overwrite`).
    Refreshed { previous: NaiveDateTime },
}

impl MarkOutcome {
    /// True when the store was mutated and needs persisting.
    #[must_use]
    pub fn changed_store(&self) -> bool {
        !matches!(self, MarkOutcome::AlreadyRecorded { .. })
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// One completed unit and the moment it was marked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    label: Label,
    completed_at: NaiveDateTime,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(label: Label, completed_at: NaiveDateTime) -> Self {
        Self {
            label,
            completed_at,
        }
    }

    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }

    #[must_use]
    pub fn completed_at(&self) -> NaiveDateTime {
        self.completed_at
    }

    /// Timestamp in the backing-file layout.
    #[must_use]
    pub fn timestamp_display(&self) -> String {
        format_timestamp(self.completed_at)
    }
}

//
// ─── STORE ─────────────────────────────────────────────────────────────────────
//

/// Ordered mapping of label to completion timestamp.
///
/// Each label appears at most once. Iteration follows first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressStore {
    records: Vec<ProgressRecord>,
}

impl ProgressStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&ProgressRecord> {
        self.position(label).map(|idx| &self.records[idx])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProgressRecord> {
        self.records.iter()
    }

    /// Labels in insertion order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.label.as_str()).collect()
    }

    /// Labels joined by `sep`, used for single-cell remote writes.
    #[must_use]
    pub fn joined_labels(&self, sep: &str) -> String {
        self.labels().join(sep)
    }

    /// Apply a mark for `label` at `at` following `policy`.
    pub fn mark(&mut self, label: Label, at: NaiveDateTime, policy: MarkPolicy) -> MarkOutcome {
        match self.position(label.as_str()) {
            None => {
                self.records.push(ProgressRecord::new(label, at));
                MarkOutcome::Recorded
            }
            Some(idx) => {
                let existing = &mut self.records[idx];
                match policy {
                    MarkPolicy::Idempotent => MarkOutcome::AlreadyRecorded {
                        recorded_at: existing.completed_at,
                    },
                    MarkPolicy::Overwrite => {
                        let previous = existing.completed_at;
                        existing.completed_at = at;
                        MarkOutcome::Refreshed { previous }
                    }
                }
            }
        }
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.records.iter().position(|r| r.label.as_str() == label)
    }
}

impl<'a> IntoIterator for &'a ProgressStore {
    type Item = &'a ProgressRecord;
    type IntoIter = std::slice::Iter<'a, ProgressRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

//
// ─── SERDE ─────────────────────────────────────────────────────────────────────
//

// Persisted as a JSON object `{ "label": "YYYY-MM-DD HH:MM", ... }` in insertion order.

impl Serialize for ProgressStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(record.label.as_str(), &record.timestamp_display())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProgressStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StoreVisitor)
    }
}

struct StoreVisitor;

impl<'de> Visitor<'de> for StoreVisitor {
    type Value = ProgressStore;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of label to completion timestamp")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut store = ProgressStore::new();
        while let Some((raw_label, raw_at)) = access.next_entry::<String, String>()? {
            let label = Label::parse(raw_label).map_err(de::Error::custom)?;
            let at = parse_timestamp(&raw_at).ok_or_else(|| {
                de::Error::custom(format!("invalid completion timestamp: {raw_at}"))
            })?;
            // Duplicate keys keep their first position; the later value wins.
            store.mark(label, at, MarkPolicy::Overwrite);
        }
        Ok(store)
    }
}
