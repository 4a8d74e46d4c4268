//! Lookup stores: per-column memo, inherited container, null record.

use std::sync::Arc;

use serde_json::json;

use query_store::LoadOptions;

use super::mock::{harness, keys, loaded_people, people_config, people_response, query_value};

fn departments() -> serde_json::Value {
    json!({
        "metaData": {"id": "Id", "fields": [{"name": "Id"}, {"name": "Title"}]},
        "rows": [{"Id": 1, "Title": "Finance"}, {"Id": 2, "Title": "Research"}]
    })
}

#[tokio::test]
async fn lookup_store_is_memoized_per_column() {
    let h = loaded_people().await;
    let first = h.store.get_lookup_store("Dept", false).expect("Dept is a lookup");
    let second = h.store.get_lookup_store("Dept", true).expect("memoized");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.config().schema_name, "lists");
    assert_eq!(first.config().query_name.as_deref(), Some("Departments"));
    assert!(first.config().null_record.is_none());
    assert_eq!(first.count(), 0, "created, not loaded");
}

#[tokio::test]
async fn column_without_lookup_has_no_store() {
    let h = loaded_people().await;
    assert!(h.store.get_lookup_store("Name", true).is_none());
    assert!(h.store.get_lookup_store("NoSuchColumn", true).is_none());
}

#[tokio::test]
async fn lookup_store_inherits_container_and_shows_null_record() {
    let h = loaded_people().await;
    let lookup = h.store.get_lookup_store("Dept", true).unwrap();
    h.transport.respond_json(200, departments());

    assert!(lookup.load(LoadOptions::default()).await);

    let url = h.transport.last_call().url;
    assert!(url.contains("/labkey/query/home/selectRows.api?"), "{url}");
    assert_eq!(query_value(&url, "query.queryName").as_deref(), Some("Departments"));
    assert_eq!(keys(&lookup), vec!["", "1", "2"]);
    assert_eq!(
        lookup.get_by_id("").unwrap().get("Title"),
        Some(&json!("[none]"))
    );
}

#[tokio::test]
async fn lookup_null_caption_overrides_default() {
    let mut config = people_config();
    config.lookup_null_caption = Some("(no department)".to_string());
    let h = harness(config);
    h.transport.respond_json(200, people_response());
    h.store.load(LoadOptions::default()).await;

    let lookup = h.store.get_lookup_store("Dept", true).unwrap();
    h.transport.respond_json(200, departments());
    lookup.load(LoadOptions::default()).await;

    assert_eq!(
        lookup.get_by_id("").unwrap().get("Title"),
        Some(&json!("(no department)"))
    );
}

#[tokio::test]
async fn separate_stores_do_not_share_lookups() {
    let a = loaded_people().await;
    let b = loaded_people().await;
    let from_a = a.store.get_lookup_store("Dept", false).unwrap();
    let from_b = b.store.get_lookup_store("Dept", false).unwrap();
    assert!(!Arc::ptr_eq(&from_a, &from_b));
}
