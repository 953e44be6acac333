//! Per-fish, per-star-tier collection progress.
//!
//! Entries are keyed by the fish display name. Older versions stored a bare
//! boolean per fish; those are rewritten as tier records the first time the
//! checklist is loaded.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{GuideError, Result};
use crate::storage::{keys, KeyValueStore};

pub const TIERS: u8 = 5;

const TIER_KEYS: [&str; 5] = ["1", "2", "3", "4", "5"];

/// Caught flags for star tiers 1 through 5.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TierRecord([bool; 5]);

impl TierRecord {
    /// Record produced from a legacy boolean entry.
    pub fn from_legacy(caught: bool) -> Self {
        Self([caught, false, false, false, false])
    }

    pub fn from_tiers(tiers: [bool; 5]) -> Self {
        Self(tiers)
    }

    fn from_object(map: &serde_json::Map<String, Value>) -> Self {
        let mut tiers = [false; 5];
        for (slot, key) in tiers.iter_mut().zip(TIER_KEYS) {
            *slot = map.get(key).and_then(Value::as_bool).unwrap_or(false);
        }
        Self(tiers)
    }

    pub fn tiers(&self) -> [bool; 5] {
        self.0
    }

    /// `tier` is 1-based.
    pub fn is_caught(&self, tier: u8) -> bool {
        tier_slot(tier).map(|i| self.0[i]).unwrap_or(false)
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|caught| *caught)
    }

    /// `★` per caught tier, `☆` otherwise.
    pub fn stars(&self) -> String {
        self.0.iter().map(|c| if *c { '★' } else { '☆' }).collect()
    }
}

impl Serialize for TierRecord {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, caught) in TIER_KEYS.iter().zip(self.0) {
            map.serialize_entry(key, &caught)?;
        }
        map.end()
    }
}

fn tier_slot(tier: u8) -> Option<usize> {
    (1..=TIERS).contains(&tier).then(|| usize::from(tier - 1))
}

/// The result of toggling one tier, enough to update a single row in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TierChange {
    pub name: String,
    pub tier: u8,
    pub caught: bool,
    pub record: TierRecord,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChecklistState {
    entries: BTreeMap<String, TierRecord>,
}

impl ChecklistState {
    /// Reads the checklist, migrating legacy entries and writing the result back
    /// straight away when anything changed.
    pub fn load<S: KeyValueStore>(store: &mut S) -> Result<Self> {
        let raw: BTreeMap<String, Value> = store.get_json(keys::CHECKLIST).unwrap_or_default();

        let mut migrated = 0usize;
        let entries: BTreeMap<String, TierRecord> = raw
            .into_iter()
            .map(|(name, value)| {
                let record = match value {
                    Value::Object(map) => TierRecord::from_object(&map),
                    Value::Bool(caught) => {
                        migrated += 1;
                        TierRecord::from_legacy(caught)
                    }
                    _ => {
                        migrated += 1;
                        TierRecord::default()
                    }
                };
                (name, record)
            })
            .collect();

        let state = Self { entries };
        if migrated > 0 {
            tracing::info!("migrated {migrated} legacy checklist entries");
            state.save(store)?;
        }
        Ok(state)
    }

    pub fn save<S: KeyValueStore>(&self, store: &mut S) -> Result<()> {
        store.set_json(keys::CHECKLIST, &self.entries)
    }

    pub fn get(&self, name: &str) -> TierRecord {
        self.entries.get(name).copied().unwrap_or_default()
    }

    /// Every fish with a stored record, by name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, TierRecord)> {
        self.entries.iter().map(|(name, record)| (name.as_str(), *record))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flips one tier for `name` and persists the whole checklist immediately.
    pub fn toggle<S: KeyValueStore>(
        &mut self,
        store: &mut S,
        name: &str,
        tier: u8,
    ) -> Result<TierChange> {
        let slot = tier_slot(tier).ok_or_else(|| {
            GuideError::Validation(format!("tier must be between 1 and {TIERS}, got {tier}"))
        })?;
        let previous = self.entries.get(name).copied();
        let mut record = previous.unwrap_or_default();
        record.0[slot] = !record.0[slot];
        self.entries.insert(name.to_string(), record);

        if let Err(e) = self.save(store) {
            match previous {
                Some(old) => self.entries.insert(name.to_string(), old),
                None => self.entries.remove(name),
            };
            return Err(e);
        }
        let change = TierChange {
            name: name.to_string(),
            tier,
            caught: record.0[slot],
            record,
        };
        tracing::debug!("checklist {name} tier {tier} -> {}", change.caught);
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    struct FullDisk;

    impl KeyValueStore for FullDisk {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: String) -> Result<()> {
            Err(GuideError::Io(std::io::Error::other("disk full")))
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_save_leaves_memory_unchanged() {
        let mut store = MemoryStore::new();
        let mut checklist = ChecklistState::default();
        checklist.toggle(&mut store, "Trucha", 1).unwrap();

        assert!(checklist.toggle(&mut FullDisk, "Trucha", 2).is_err());
        assert!(checklist.toggle(&mut FullDisk, "Carpa", 1).is_err());
        assert_eq!(checklist.get("Trucha"), TierRecord::from_legacy(true));
        assert_eq!(checklist.len(), 1);
    }

    #[test]
    fn test_stars() {
        let record = TierRecord::from_tiers([true, false, true, false, false]);
        assert_eq!(record.stars(), "★☆★☆☆");
        assert_eq!(TierRecord::default().stars(), "☆☆☆☆☆");
    }

    fn stored(store: &MemoryStore) -> Value {
        store.get_json(keys::CHECKLIST).unwrap()
    }

    #[test]
    fn test_legacy_true_migrates() {
        let mut store = MemoryStore::new();
        store
            .set(keys::CHECKLIST, json!({"Trucha": true}).to_string())
            .unwrap();

        let state = ChecklistState::load(&mut store).unwrap();
        assert_eq!(state.get("Trucha").tiers(), [true, false, false, false, false]);
        assert_eq!(
            stored(&store),
            json!({"Trucha": {"1": true, "2": false, "3": false, "4": false, "5": false}})
        );
    }

    #[test]
    fn test_legacy_false_migrates() {
        let mut store = MemoryStore::new();
        store
            .set(keys::CHECKLIST, json!({"Carpa": false, "Lucio": {"3": true}}).to_string())
            .unwrap();

        let state = ChecklistState::load(&mut store).unwrap();
        assert_eq!(state.get("Carpa").tiers(), [false; 5]);
        assert_eq!(
            stored(&store),
            json!({
                "Carpa": {"1": false, "2": false, "3": false, "4": false, "5": false},
                "Lucio": {"1": false, "2": false, "3": true, "4": false, "5": false}
            })
        );
    }

    #[test]
    fn test_every_key_becomes_object() {
        let mut store = MemoryStore::new();
        store
            .set(keys::CHECKLIST, json!({"A": true, "B": 7, "C": null, "D": {}}).to_string())
            .unwrap();

        ChecklistState::load(&mut store).unwrap();
        let value = stored(&store);
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), 4);
        assert!(map.values().all(Value::is_object));
    }

    #[test]
    fn test_no_write_without_legacy_entries() {
        let mut store = MemoryStore::new();
        let state = ChecklistState::load(&mut store).unwrap();
        assert!(state.is_empty());
        assert_eq!(store.get(keys::CHECKLIST), None);
    }

    #[test]
    fn test_toggle_persists_immediately() {
        let mut store = MemoryStore::new();
        let mut state = ChecklistState::load(&mut store).unwrap();

        let change = state.toggle(&mut store, "Trucha", 3).unwrap();
        assert!(change.caught);
        assert!(change.record.is_caught(3));
        assert_eq!(stored(&store)["Trucha"]["3"], json!(true));

        let change = state.toggle(&mut store, "Trucha", 3).unwrap();
        assert!(!change.caught);
        assert!(!state.get("Trucha").any());
        assert_eq!(stored(&store)["Trucha"]["3"], json!(false));
    }

    #[test]
    fn test_toggle_rejects_bad_tier() {
        let mut store = MemoryStore::new();
        let mut state = ChecklistState::default();
        assert!(matches!(
            state.toggle(&mut store, "Trucha", 0),
            Err(GuideError::Validation(_))
        ));
        assert!(matches!(
            state.toggle(&mut store, "Trucha", 6),
            Err(GuideError::Validation(_))
        ));
        assert!(state.is_empty());
    }
}
