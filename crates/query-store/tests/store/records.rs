//! Local record primitives: add, edit, modified tracking, reject.

use serde_json::{json, Map, Value};

use query_store::{RecordId, StoreError, StoreEvent, UpdateOperation, WriteState};

use super::mock::{event_names, keys, loaded_people, people_response, record_events};

fn nth(store: &query_store::Store, index: usize) -> RecordId {
    store.records()[index].id()
}

// ============================================================================
// addRecord
// ============================================================================

#[tokio::test]
async fn added_record_has_every_declared_field_as_null() {
    let h = loaded_people().await;
    let id = h.store.add_record(None, None).unwrap();
    let record = h.store.record(id).unwrap();

    assert!(record.is_new());
    for field in ["Key", "Name", "Email", "Dept"] {
        assert_eq!(record.get(field), Some(&Value::Null), "field {field}");
    }
    assert_eq!(h.store.index_of(id), Some(3));
}

#[tokio::test]
async fn added_record_keeps_given_values() {
    let h = loaded_people().await;
    let mut data = Map::new();
    data.insert("Name".to_string(), json!("Dee"));
    let id = h.store.add_record(Some(data), Some(1)).unwrap();
    let record = h.store.record(id).unwrap();

    assert_eq!(record.get("Name"), Some(&json!("Dee")));
    assert_eq!(record.get("Email"), Some(&Value::Null));
    assert_eq!(h.store.index_of(id), Some(1));
    assert_eq!(h.transport.call_count(), 1, "adding never touches the network");
}

#[tokio::test]
async fn add_emits_add_event() {
    let h = loaded_people().await;
    let events = record_events(&h.store);
    let id = h.store.add_record(None, Some(0)).unwrap();

    assert_eq!(
        *events.lock(),
        vec![StoreEvent::Add {
            records: vec![id],
            index: 0
        }]
    );
}

// ============================================================================
// getModifiedRecords
// ============================================================================

#[tokio::test]
async fn modified_records_contains_each_edited_record_once() {
    let h = loaded_people().await;
    let second = nth(&h.store, 1);

    h.store.set_value(second, "Name", "Bobby").unwrap();
    h.store.set_value(second, "Email", "bobby@example.org").unwrap();
    assert_eq!(h.store.get_modified_records(), vec![second]);

    let added = h.store.add_record(None, None).unwrap();
    assert_eq!(h.store.get_modified_records(), vec![second, added]);
}

#[tokio::test]
async fn restoring_the_loaded_value_makes_the_record_clean() {
    let h = loaded_people().await;
    let second = nth(&h.store, 1);

    assert!(h.store.set_value(second, "Name", "Bobby").unwrap());
    assert!(h.store.set_value(second, "Name", "Bob").unwrap());
    assert!(h.store.get_modified_records().is_empty());
    assert_eq!(h.store.record(second).unwrap().write_state(), WriteState::Clean);
}

#[tokio::test]
async fn same_value_is_not_an_edit() {
    let h = loaded_people().await;
    let events = record_events(&h.store);
    let first = nth(&h.store, 0);

    assert!(!h.store.set_value(first, "Name", "Ann").unwrap());
    assert!(h.store.get_modified_records().is_empty());
    assert!(events.lock().is_empty());
}

#[tokio::test]
async fn edit_emits_update_with_field() {
    let h = loaded_people().await;
    let events = record_events(&h.store);
    let first = nth(&h.store, 0);
    h.store.set_value(first, "Email", json!(null)).unwrap();

    assert_eq!(
        *events.lock(),
        vec![StoreEvent::Update {
            record: first,
            operation: UpdateOperation::Edit {
                field: "Email".to_string()
            }
        }]
    );
}

#[tokio::test]
async fn set_value_on_unknown_record_is_an_error() {
    let h = loaded_people().await;
    let id = nth(&h.store, 0);
    h.transport.respond_json(200, people_response());
    h.store.reload().await;

    assert!(matches!(
        h.store.set_value(id, "Name", "x"),
        Err(StoreError::UnknownRecord(missing)) if missing == id
    ));
}

// ============================================================================
// rejectChanges
// ============================================================================

#[tokio::test]
async fn reject_changes_restores_loaded_values() {
    let h = loaded_people().await;
    let first = nth(&h.store, 0);
    let third = nth(&h.store, 2);
    h.store.set_value(first, "Name", "Annie").unwrap();
    h.store.set_value(third, "Email", "").unwrap();
    let added = h.store.add_record(None, None).unwrap();

    let events = record_events(&h.store);
    let rejected = h.store.reject_changes();

    assert_eq!(rejected, vec![first, third]);
    assert_eq!(h.store.record(first).unwrap().get("Name"), Some(&json!("Ann")));
    assert_eq!(
        h.store.record(third).unwrap().get("Email"),
        Some(&json!("cid@example.org"))
    );
    assert_eq!(event_names(&events), vec!["update", "update"]);
    assert_eq!(h.store.get_modified_records(), vec![added], "new records stay");
    assert_eq!(keys(&h.store).len(), 4);
}
