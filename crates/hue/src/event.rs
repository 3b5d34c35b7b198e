use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use crate::api::{RType, Record};
use crate::error::HueResult;
use crate::store::StateStore;

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Add,
    Update,
    Delete,
    Error,
    #[serde(other)]
    Unknown,
}

/// One envelope of an event-stream message
#[derive(Clone, Debug, Deserialize)]
pub struct EventBlock {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub evtype: EventType,
    pub data: Vec<Value>,
}

impl EventBlock {
    /// Light records carried by an update envelope; nothing for any other
    /// envelope type.
    pub fn light_updates(&self) -> impl Iterator<Item = Record> + '_ {
        self.data
            .iter()
            .filter(|_| self.evtype == EventType::Update)
            .filter_map(Record::from_value)
            .filter(|rec| rec.resource_type() == Some(RType::Light))
    }
}

/// Parse one event-stream message: a JSON array of envelopes.
///
/// Envelopes that do not have the expected shape are dropped; only a
/// message that is not JSON at all is an error.
pub fn parse_batch(payload: &str) -> HueResult<Vec<EventBlock>> {
    let value: Value = serde_json::from_str(payload)?;
    Ok(batch_from_value(value))
}

#[must_use]
pub fn batch_from_value(value: Value) -> Vec<EventBlock> {
    let Value::Array(items) = value else {
        return vec![];
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

impl StateStore {
    /// Merge the light updates of an event batch into the store.
    ///
    /// Returns the set of patched ids.
    pub fn apply_events(&mut self, batch: &[EventBlock]) -> BTreeSet<String> {
        batch
            .iter()
            .flat_map(EventBlock::light_updates)
            .filter_map(|rec| self.apply_update(&rec))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::event::{EventType, batch_from_value, parse_batch};
    use crate::store::StateStore;

    fn store() -> StateStore {
        StateStore::from_snapshot(&json!({
            "data": [
                {"id": "l1", "type": "light", "on": {"on": false}, "dimming": {"brightness": 10.0}},
                {"id": "l2", "type": "light", "on": {"on": false}},
                {"id": "r1", "type": "room", "metadata": {"name": "Hall"}},
            ]
        }))
    }

    #[test]
    fn parse_skips_malformed_envelopes() {
        let batch = parse_batch(
            r#"[
                {"id": "e1", "creationtime": "2024-01-01T00:00:00Z", "type": "update", "data": []},
                {"type": "update"},
                42,
                {"type": "mystery", "data": []}
            ]"#,
        )
        .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].evtype, EventType::Update);
        assert_eq!(batch[0].id.as_deref(), Some("e1"));
        assert_eq!(batch[1].evtype, EventType::Unknown);

        assert!(parse_batch("not json").is_err());
        assert!(batch_from_value(json!({"type": "update"})).is_empty());
    }

    #[test]
    fn only_light_updates_apply() {
        let mut store = store();
        let batch = batch_from_value(json!([
            {
                "type": "update",
                "data": [
                    {"id": "l1", "type": "light", "on": {"on": true}},
                    {"id": "r1", "type": "room", "metadata": {"name": "Renamed"}},
                    {"type": "light", "on": {"on": true}},
                ]
            },
            {
                "type": "add",
                "data": [{"id": "l2", "type": "light", "on": {"on": true}}]
            },
        ]));

        let ids = store.apply_events(&batch);

        assert_eq!(ids.into_iter().collect::<Vec<_>>(), ["l1"]);
        let l1 = store.light("l1").unwrap();
        assert!(l1.on);
        assert_eq!(l1.brightness, 10.0);
        assert!(!store.light("l2").unwrap().on);
        assert_eq!(store.group("r1").unwrap().name, "Hall");
    }

    #[test]
    fn duplicate_ids_coalesce() {
        let mut store = store();
        let batch = batch_from_value(json!([
            {"type": "update", "data": [{"id": "l1", "type": "light", "on": {"on": true}}]},
            {"type": "update", "data": [
                {"id": "l1", "type": "light", "dimming": {"brightness": 60.0}},
                {"id": "l2", "type": "light", "on": {"on": true}},
            ]},
        ]));

        let ids = store.apply_events(&batch);

        assert_eq!(ids.len(), 2);
        assert_eq!(store.light("l1").unwrap().brightness, 60.0);
    }
}
