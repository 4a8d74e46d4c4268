//! Deletes: one batched request, then a full reload.

use serde_json::json;

use query_store::{DeleteOutcome, HttpMethod, RecordId, StoreConfig, StoreError};

use super::mock::{event_names, harness, keys, loaded_people, people_response, record_events};

#[tokio::test]
async fn delete_posts_keys_then_reloads() {
    let h = loaded_people().await;
    let ids: Vec<RecordId> = h.store.records().iter().map(|r| r.id()).collect();
    let events = record_events(&h.store);

    h.transport.respond_json(200, json!({"rowsAffected": 2}));
    let mut reloaded = people_response();
    reloaded["rows"] = json!([{"Key": 2, "Name": "Bob", "Email": "bob@example.org", "Dept": null}]);
    h.transport.respond_json(200, reloaded);

    let outcome = h.store.delete_records(&[ids[0], ids[2]]).await.unwrap();
    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            records: vec![ids[0], ids[2]]
        }
    );

    let calls = h.transport.calls();
    assert_eq!(calls.len(), 3);
    let delete = &calls[1];
    assert_eq!(delete.method, HttpMethod::Post);
    assert_eq!(delete.url, "https://lk.example.org/labkey/query/home/deleteRows.api");
    assert_eq!(
        delete.body.as_ref().unwrap(),
        &json!({
            "schemaName": "lists",
            "queryName": "People",
            "containerPath": "/home",
            "rows": [{"Key": 1}, {"Key": 3}]
        })
    );
    assert_eq!(calls[2].method, HttpMethod::Get);

    assert_eq!(keys(&h.store), vec!["2"]);
    assert_eq!(
        event_names(&events),
        vec!["commitcomplete", "beforeload", "load"]
    );
}

#[tokio::test]
async fn delete_accepts_a_non_json_success() {
    let h = loaded_people().await;
    let first = h.store.records()[0].id();
    h.transport.respond(query_store::HttpResponse {
        status: 204,
        status_text: "No Content".to_string(),
        content_type: None,
        body: String::new(),
    });
    h.transport.respond_json(200, people_response());

    assert!(matches!(
        h.store.delete_records(&[first]).await.unwrap(),
        DeleteOutcome::Deleted { .. }
    ));
}

#[tokio::test]
async fn failed_delete_reports_and_keeps_cache() {
    let h = loaded_people().await;
    let first = h.store.records()[0].id();
    h.transport
        .respond_json(500, json!({"exception": "row is referenced"}));

    assert_eq!(
        h.store.delete_records(&[first]).await.unwrap(),
        DeleteOutcome::Failed {
            message: "row is referenced".to_string()
        }
    );
    assert_eq!(h.transport.call_count(), 2, "no reload after a failure");
    assert_eq!(keys(&h.store), vec!["1", "2", "3"]);
    assert_eq!(
        h.notifier.alerts(),
        vec![(
            "Error During Delete".to_string(),
            "Could not delete records due to the following error:\nrow is referenced".to_string()
        )]
    );
}

#[tokio::test]
async fn empty_delete_is_a_no_op() {
    let h = loaded_people().await;
    assert_eq!(
        h.store.delete_records(&[]).await.unwrap(),
        DeleteOutcome::NothingToDelete
    );
    assert_eq!(h.transport.call_count(), 1);
}

#[tokio::test]
async fn delete_rejects_unknown_records_before_sending() {
    let h = loaded_people().await;
    let stale = h.store.records()[0].id();
    h.transport.respond_json(200, people_response());
    h.store.reload().await;

    assert!(matches!(
        h.store.delete_records(&[stale]).await,
        Err(StoreError::UnknownRecord(id)) if id == stale
    ));
    assert_eq!(h.transport.call_count(), 2);
}

#[tokio::test]
async fn delete_needs_a_loaded_identity() {
    let h = harness(StoreConfig::new("lists", "People"));
    let id = h.store.add_record(None, None).unwrap();
    assert!(matches!(
        h.store.delete_records(&[id]).await,
        Err(StoreError::IdentityUnknown)
    ));
}
