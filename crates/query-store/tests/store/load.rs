//! Reads: request parameters, response parsing, failures and load events.

use serde_json::json;

use query_store::{
    FilterType, Flow, HttpMethod, LoadOptions, NullRecordConfig, QueryFilter, SortDirection,
    StoreConfig, StoreEvent, TransportError,
};

use super::mock::{
    event_names, harness, keys, loaded_people, people_config, people_response, query_pairs,
    query_value, record_events,
};

// ============================================================================
// Request
// ============================================================================

#[tokio::test]
async fn load_issues_get_with_base_params() {
    let h = loaded_people().await;
    let call = h.transport.last_call();

    assert_eq!(call.method, HttpMethod::Get);
    assert!(call.body.is_none());
    assert!(
        call.url
            .starts_with("https://lk.example.org/labkey/query/home/selectRows.api?"),
        "{}",
        call.url
    );
    assert_eq!(query_value(&call.url, "schemaName").as_deref(), Some("lists"));
    assert_eq!(query_value(&call.url, "query.queryName").as_deref(), Some("People"));
    assert_eq!(query_value(&call.url, "apiVersion").as_deref(), Some("9.1"));
    assert_eq!(query_value(&call.url, "minimalColumns").as_deref(), Some("false"));
}

#[tokio::test]
async fn descending_sort_becomes_minus_prefix() {
    let h = harness(people_config());
    h.transport.respond_json(200, people_response());
    h.transport.respond_json(200, people_response());

    h.store
        .load(LoadOptions::default().sorted("Name", SortDirection::Desc))
        .await;
    let desc = h.transport.last_call().url;
    assert_eq!(query_value(&desc, "query.sort").as_deref(), Some("-Name"));

    h.store
        .load(LoadOptions::default().sorted("Name", SortDirection::Asc))
        .await;
    let asc = h.transport.last_call().url;
    assert_eq!(query_value(&asc, "query.sort").as_deref(), Some("Name"));
}

#[tokio::test]
async fn paging_uses_server_vocabulary() {
    let h = harness(people_config());
    h.transport.respond_json(200, people_response());
    h.store.load(LoadOptions::page(40, 20)).await;

    let url = h.transport.last_call().url;
    assert_eq!(query_value(&url, "query.offset").as_deref(), Some("40"));
    assert_eq!(query_value(&url, "query.maxRows").as_deref(), Some("20"));
    assert!(query_value(&url, "start").is_none());
    assert!(query_value(&url, "limit").is_none());
}

#[tokio::test]
async fn base_filters_win_and_user_filters_are_rebuilt_each_load() {
    let h = harness(people_config().with_filter(QueryFilter::eq("Name", "Ann")));
    h.transport.respond_json(200, people_response());
    h.transport.respond_json(200, people_response());

    h.store.set_user_filters(vec![
        QueryFilter::eq("Name", "Bob"),
        QueryFilter::new("Key", 1, FilterType::GreaterThan),
    ]);
    h.store.load(LoadOptions::default()).await;
    let first = h.transport.last_call().url;
    let name_values: Vec<String> = query_pairs(&first)
        .into_iter()
        .filter(|(k, _)| k == "query.Name~eq")
        .map(|(_, v)| v)
        .collect();
    assert_eq!(name_values, vec!["Ann"]);
    assert_eq!(query_value(&first, "query.Key~gt").as_deref(), Some("1"));

    h.store.set_user_filters(Vec::new());
    h.store.reload().await;
    let second = h.transport.last_call().url;
    assert!(query_value(&second, "query.Key~gt").is_none(), "{second}");
    assert_eq!(query_value(&second, "query.Name~eq").as_deref(), Some("Ann"));
}

#[tokio::test]
async fn config_parameters_and_view_are_sent() {
    let config = people_config()
        .with_view("Active")
        .with_columns("Name,Dept/Title")
        .with_parameter("MinAge", 21);
    let h = harness(config);
    h.transport.respond_json(200, people_response());
    h.store.load(LoadOptions::default()).await;

    let url = h.transport.last_call().url;
    assert_eq!(query_value(&url, "query.viewName").as_deref(), Some("Active"));
    assert_eq!(query_value(&url, "query.columns").as_deref(), Some("Name,Dept/Title"));
    assert_eq!(query_value(&url, "query.param.MinAge").as_deref(), Some("21"));
}

#[tokio::test]
async fn sql_store_reads_from_execute_sql() {
    let h = harness(StoreConfig::from_sql("lists", "SELECT Name FROM People"));
    h.transport.respond_json(200, people_response());
    assert!(h.store.load(LoadOptions::default()).await);

    let url = h.transport.last_call().url;
    assert!(url.contains("/query/executeSql.api?"), "{url}");
    assert_eq!(
        query_value(&url, "sql").as_deref(),
        Some("SELECT Name FROM People")
    );
    assert!(query_value(&url, "query.queryName").is_none());
}

// ============================================================================
// Response
// ============================================================================

#[tokio::test]
async fn load_fills_cache_in_response_order() {
    let h = loaded_people().await;

    assert_eq!(keys(&h.store), vec!["1", "2", "3"]);
    assert_eq!(h.store.id_name().as_deref(), Some("Key"));
    assert_eq!(h.store.total_count(), Some(57));
    assert_eq!(h.store.count(), 3);
    assert_eq!(h.store.fields().len(), 4);
    assert!(h.store.get_modified_records().is_empty());
    assert!(h.store.load_error().is_none());
}

#[tokio::test]
async fn extended_values_are_unwrapped() {
    let h = harness(people_config());
    h.transport.respond_json(
        200,
        json!({
            "metaData": {"id": "Key", "fields": [{"name": "Key"}, {"name": "Dept"}]},
            "rows": [
                {"Key": {"value": 7}, "Dept": {"value": 2, "displayValue": "Finance", "url": "/dept/2"}}
            ]
        }),
    );
    h.store.load(LoadOptions::default()).await;

    let record = h.store.get_by_id("7").expect("record keyed by unwrapped value");
    assert_eq!(record.get("Dept"), Some(&json!(2)));
    let ext = record.extended("Dept").unwrap();
    assert_eq!(ext.display_value, Some(json!("Finance")));
    assert_eq!(ext.url.as_deref(), Some("/dept/2"));
}

#[tokio::test]
async fn null_record_is_prepended() {
    let config = people_config().with_null_record(NullRecordConfig {
        display_column: "Name".to_string(),
        null_caption: None,
    });
    let h = harness(config);
    h.transport.respond_json(200, people_response());
    h.store.load(LoadOptions::default()).await;

    assert_eq!(keys(&h.store), vec!["", "1", "2", "3"]);
    let blank = h.store.get_by_id("").unwrap();
    assert_eq!(blank.get("Name"), Some(&json!("[none]")));
    assert!(!blank.is_dirty());
}

// ============================================================================
// Failures and events
// ============================================================================

#[tokio::test]
async fn failed_load_keeps_error_and_emits_exception() {
    let h = harness(people_config());
    let events = record_events(&h.store);
    h.transport
        .respond_json(404, json!({"exception": "Query 'People' not found"}));

    assert!(!h.store.load(LoadOptions::default()).await);
    let error = h.store.load_error().unwrap();
    assert_eq!(error.message, "Query 'People' not found");
    assert_eq!(error.status, Some(404));
    assert_eq!(event_names(&events), vec!["beforeload", "loadexception"]);
    assert!(h.notifier.alerts().is_empty(), "loads never alert");
}

#[tokio::test]
async fn transport_failure_uses_error_text() {
    let h = harness(people_config());
    h.transport.fail(TransportError::Timeout);
    assert!(!h.store.load(LoadOptions::default()).await);
    assert_eq!(h.store.load_error().unwrap().message, "Request timed out");
}

#[tokio::test]
async fn successful_load_clears_previous_error() {
    let h = harness(people_config());
    h.transport.fail(TransportError::Timeout);
    h.transport.respond_json(200, people_response());

    h.store.load(LoadOptions::default()).await;
    assert!(h.store.load_error().is_some());
    h.store.reload().await;
    assert!(h.store.load_error().is_none());
}

#[tokio::test]
async fn canceled_before_load_sends_nothing() {
    let h = harness(people_config());
    h.store.events().on_cancelable(|event| match event {
        StoreEvent::BeforeLoad { .. } => Flow::Cancel,
        _ => Flow::Continue,
    });

    assert!(!h.store.load(LoadOptions::default()).await);
    assert_eq!(h.transport.call_count(), 0);
    assert!(!h.store.is_loading());
}

#[tokio::test]
async fn load_event_lists_records_in_order() {
    let h = harness(people_config());
    let events = record_events(&h.store);
    h.transport.respond_json(200, people_response());
    h.store.load(LoadOptions::default()).await;

    let log = events.lock();
    let StoreEvent::Load { records } = &log[1] else {
        panic!("expected load event, got {:?}", log[1]);
    };
    let ids: Vec<_> = h.store.records().iter().map(|r| r.id()).collect();
    assert_eq!(records, &ids);
}
