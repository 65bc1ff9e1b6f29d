use std::hash::Hasher;

use serde_json::{Map, Value};
use statecraft_game::catalog::EventCatalog;
use statecraft_game::{GameSession, NationalState, RankingRecord, catalog};
use twox_hash::XxHash64;

#[test]
fn catalog_snapshot_survives_a_round_trip() {
    let original = serde_json::to_value(catalog()).unwrap();
    let restored: EventCatalog = serde_json::from_value(original.clone()).unwrap();
    assert_eq!(restored.events, catalog().events);

    let round_tripped = serde_json::to_value(&restored).unwrap();
    let canonical_a = serde_json::to_string_pretty(&canonicalize_value(original)).unwrap();
    let canonical_b = serde_json::to_string_pretty(&canonicalize_value(round_tripped)).unwrap();
    assert_eq!(
        snapshot_hash(canonical_a.as_bytes()),
        snapshot_hash(canonical_b.as_bytes()),
        "catalog digest changed across a serde round trip"
    );
}

#[test]
fn catalog_events_expose_the_wire_shape() {
    let value = serde_json::to_value(catalog()).unwrap();
    let events = value["events"].as_array().expect("events array");
    assert!(!events.is_empty());

    let event = &events[0];
    for key in ["id", "title", "description", "category", "urgency", "options"] {
        assert!(!event[key].is_null(), "missing key {key}");
    }
    assert!(event["urgency"].is_string(), "urgency serializes lowercase");

    let option = &event["options"].as_array().expect("options array")[0];
    for key in ["text", "ideology", "stance", "effects"] {
        assert!(!option[key].is_null(), "missing option key {key}");
    }
    let effects = option["effects"].as_object().expect("effects object");
    for key in [
        "approval",
        "gdp",
        "debt",
        "technology",
        "environment",
        "market_index",
        "exchange_rate",
        "diplomacy",
    ] {
        assert!(
            effects.get(key).is_some_and(Value::is_i64),
            "effects.{key} should be an integer"
        );
    }
}

#[tokio::test]
async fn state_and_history_round_trip_through_json() {
    let mut session = GameSession::from_seed(0xFACE_B00C).with_turn_limit(10);
    for _ in 0..3 {
        let event = session.next_event().await;
        assert!(session.apply_choice(&event, 0));
    }
    assert_eq!(session.history().len(), 3);

    let saved_state = serde_json::to_string(session.state()).unwrap();
    let restored_state: NationalState = serde_json::from_str(&saved_state).unwrap();
    assert_eq!(&restored_state, session.state());

    let saved_history = serde_json::to_string(session.history()).unwrap();
    let restored_history: Vec<statecraft_game::ChoiceRecord> =
        serde_json::from_str(&saved_history).unwrap();
    assert_eq!(restored_history.as_slice(), session.history());

    let original_value = serde_json::to_value(session.state()).unwrap();
    let restored_value = serde_json::to_value(&restored_state).unwrap();
    assert_eq!(original_value, restored_value, "round-trip mismatch");
}

#[test]
fn ranking_records_serialize_for_storage() {
    let mut session = GameSession::from_seed(0x5C0E);
    let result = session.score_policy("green industrial strategy with fiscal discipline");
    let record = RankingRecord::new("Adenauer", &result, session.state().clone());

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["player_name"], "Adenauer");
    assert_eq!(value["total_score"], Value::from(result.total_score));
    assert!(value["rank_label"].is_string(), "labels serialize snake_case");
    assert!(value["final_state"]["approval"].is_i64());

    let restored: RankingRecord = serde_json::from_value(value).unwrap();
    assert_eq!(restored, record);
}

fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(canonicalize_value)
                .collect::<Vec<_>>(),
        ),
        Value::Object(map) => {
            let mut result = Map::with_capacity(map.len());
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, value) in entries {
                result.insert(key, canonicalize_value(value));
            }
            Value::Object(result)
        }
        other => other,
    }
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}
