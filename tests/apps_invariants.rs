//! App Data Invariant Tests
//!
//! End-to-end behavior of `AppService`:
//! - Settings are validated before any request is served
//! - Items are validated before any store mutation
//! - Computed fields run in declaration order on every item before filtering
//! - Computed values never reach the store
//! - Script failures on the read path are isolated per item
//! - Undeclared actions never execute

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use walletapps::apps::{AppError, AppService};
use walletapps::schema::{Field, FieldType, Model, SchemaErrorCode, Settings, StaticSettings};
use walletapps::scripting::{NativeRuntime, ScriptError, Selector};
use walletapps::store::{ItemScope, ItemStore, MemoryItemStore};

const APP: &str = "https://counter.example";

// =============================================================================
// Helper Functions
// =============================================================================

fn counter_settings() -> Settings {
    Settings::new(vec![
        Model::new("owner", vec![Field::new("name", FieldType::String)]),
        Model::new(
            "counter",
            vec![
                Field::new("value", FieldType::Number),
                Field::new("doubled", FieldType::Number).computed(),
                Field::new("budget", FieldType::Msatoshi),
                Field::reference("owner", "owner"),
            ],
        )
        .filtered(),
    ])
    .with_action("reset")
}

fn counter_runtime() -> NativeRuntime {
    NativeRuntime::new()
        .with(APP, Selector::computed("counter", "doubled"), |scope| {
            let value = scope
                .item()?
                .get("value")
                .and_then(Value::as_i64)
                .ok_or_else(|| ScriptError::Runtime("value is not an integer".into()))?;
            Ok(json!(value * 2))
        })
        .with(APP, Selector::filter("counter"), |scope| {
            let doubled = scope.item()?.get("doubled").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!(doubled > 15))
        })
}

fn setup_with(runtime: NativeRuntime) -> (AppService, Arc<MemoryItemStore>) {
    let store = Arc::new(MemoryItemStore::new());
    let service = AppService::new(
        Arc::new(StaticSettings::new().with_app(APP, counter_settings())),
        store.clone(),
        Arc::new(runtime),
    );
    (service, store)
}

fn setup() -> (AppService, Arc<MemoryItemStore>) {
    setup_with(counter_runtime())
}

fn schema_code(err: AppError) -> SchemaErrorCode {
    match err {
        AppError::Validation(e) | AppError::Configuration(e) => e.code(),
        other => panic!("expected a schema error, got {:?}", other),
    }
}

// =============================================================================
// Settings Validation
// =============================================================================

/// Well-formed settings are served.
#[test]
fn test_valid_settings_are_served() {
    let (service, _) = setup();
    let settings = service.info(APP).unwrap();
    assert_eq!(settings.models.len(), 2);
}

/// Each structural violation is a configuration error.
#[test]
fn test_settings_violations() {
    let cases = vec![
        Settings::new(vec![Model::new("", vec![Field::new("a", FieldType::Number)])]),
        Settings::new(vec![
            Model::new("m", vec![Field::new("a", FieldType::Number)]),
            Model::new("m", vec![Field::new("b", FieldType::Number)]),
        ]),
        Settings::new(vec![Model::new("m", vec![Field::new("a", FieldType::Other("date".into()))])]),
        Settings::new(vec![Model::new("m", vec![Field::reference("r", "missing")])]),
    ];

    for settings in cases {
        let service = AppService::new(
            Arc::new(StaticSettings::new().with_app(APP, settings)),
            Arc::new(MemoryItemStore::new()),
            Arc::new(NativeRuntime::new()),
        );
        let err = service.info(APP).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(schema_code(err), SchemaErrorCode::InvalidSettings);
    }
}

// =============================================================================
// Write Path
// =============================================================================

/// add then get returns the value that was added.
#[test]
fn test_add_then_get() {
    let (service, _) = setup();
    let value = json!({"value": 3, "budget": 21000});

    let key = service.add_item("w1", APP, "counter", value.clone()).unwrap();
    let stored = service.get_item("w1", APP, "counter", &key).unwrap();
    assert_eq!(Value::Object(stored), value);
}

/// Undeclared fields are rejected and nothing is stored.
#[test]
fn test_unexpected_field_rejected() {
    let (service, store) = setup();
    let err = service
        .set_item("w1", APP, "counter", "k", json!({"value": 1, "color": "red"}))
        .unwrap_err();

    assert_eq!(schema_code(err), SchemaErrorCode::UnexpectedField);
    assert!(store.is_empty());
}

/// msatoshi boundary: the ceiling is accepted, one more is not, fractions never.
#[test]
fn test_msatoshi_boundaries() {
    let (service, _) = setup();

    assert!(service
        .add_item("w1", APP, "counter", json!({"budget": 100_000_000_000i64}))
        .is_ok());

    let err = service
        .add_item("w1", APP, "counter", json!({"budget": 100_000_000_001i64}))
        .unwrap_err();
    assert_eq!(schema_code(err), SchemaErrorCode::InvalidMsatoshi);

    let err = service.add_item("w1", APP, "counter", json!({"budget": 1.5})).unwrap_err();
    assert_eq!(schema_code(err), SchemaErrorCode::InvalidMsatoshi);
}

/// A ref must point at an existing item of the target model.
#[test]
fn test_dangling_ref_rejected() {
    let (service, _) = setup();

    let err = service
        .add_item("w1", APP, "counter", json!({"owner": "nobody"}))
        .unwrap_err();
    assert_eq!(schema_code(err), SchemaErrorCode::InvalidRef);

    let owner = service.add_item("w1", APP, "owner", json!({"name": "Ada"})).unwrap();
    assert!(service.add_item("w1", APP, "counter", json!({"owner": owner})).is_ok());
}

/// Deleting a missing key succeeds; a deleted key is gone.
#[test]
fn test_delete_is_idempotent() {
    let (service, _) = setup();
    service.delete_item("w1", APP, "counter", "never-existed").unwrap();

    let key = service.add_item("w1", APP, "counter", json!({"value": 1})).unwrap();
    service.delete_item("w1", APP, "counter", &key).unwrap();
    service.delete_item("w1", APP, "counter", &key).unwrap();

    assert!(matches!(
        service.get_item("w1", APP, "counter", &key),
        Err(AppError::NotFound(_))
    ));
}

// =============================================================================
// Read Path
// =============================================================================

/// Computed fields are visible in the list: {value: 5} lists as {value: 5, doubled: 10}.
#[test]
fn test_computed_field_in_list() {
    let settings = Settings::new(vec![Model::new(
        "counter",
        vec![
            Field::new("value", FieldType::Number),
            Field::new("doubled", FieldType::Number).computed(),
        ],
    )]);
    let service = AppService::new(
        Arc::new(StaticSettings::new().with_app(APP, settings)),
        Arc::new(MemoryItemStore::new()),
        Arc::new(counter_runtime()),
    );
    service.set_item("w1", APP, "counter", "a", json!({"value": 5})).unwrap();

    let items = service.list_items("w1", APP, "counter").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(Value::Object(items[0].value.clone()), json!({"value": 5, "doubled": 10}));
}

/// The filter sees computed values and keeps order.
#[test]
fn test_filter_after_compute() {
    let (service, _) = setup();
    for (key, value) in [("a", 5), ("b", 9), ("c", 2), ("d", 12)] {
        service.set_item("w1", APP, "counter", key, json!({"value": value})).unwrap();
    }

    let items = service.list_items("w1", APP, "counter").unwrap();
    let keys: Vec<&str> = items.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["b", "d"]);
    assert_eq!(items[0].value["doubled"], json!(18));
}

/// Computed fields run in declaration order on every item before any filter call.
#[test]
fn test_computed_fields_run_in_order_before_filter() {
    let settings = Settings::new(vec![Model::new(
        "counter",
        vec![
            Field::new("value", FieldType::Number),
            Field::new("a", FieldType::String).computed(),
            Field::new("b", FieldType::String).computed(),
        ],
    )
    .filtered()]);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let (on_a, on_b, on_filter) = (calls.clone(), calls.clone(), calls.clone());
    let runtime = NativeRuntime::new()
        .with(APP, Selector::computed("counter", "a"), move |scope| {
            on_a.lock().unwrap().push("a");
            Ok(json!(format!("a saw b: {}", scope.item()?.contains_key("b"))))
        })
        .with(APP, Selector::computed("counter", "b"), move |scope| {
            on_b.lock().unwrap().push("b");
            Ok(scope.item()?.get("a").cloned().unwrap_or(Value::Null))
        })
        .with(APP, Selector::filter("counter"), move |_| {
            on_filter.lock().unwrap().push("f");
            Ok(json!(true))
        });

    let service = AppService::new(
        Arc::new(StaticSettings::new().with_app(APP, settings)),
        Arc::new(MemoryItemStore::new()),
        Arc::new(runtime),
    );
    service.set_item("w1", APP, "counter", "x", json!({"value": 1})).unwrap();
    service.set_item("w1", APP, "counter", "y", json!({"value": 2})).unwrap();

    let items = service.list_items("w1", APP, "counter").unwrap();
    assert_eq!(*calls.lock().unwrap(), vec!["a", "b", "a", "b", "f", "f"]);

    assert_eq!(items.len(), 2);
    for item in &items {
        assert_eq!(item.value["a"], json!("a saw b: false"));
        assert_eq!(item.value["b"], item.value["a"]);
    }
}

/// Computed values are never written back.
#[test]
fn test_computed_values_not_persisted() {
    let (service, store) = setup();
    service.set_item("w1", APP, "counter", "b", json!({"value": 9})).unwrap();

    let listed = service.list_items("w1", APP, "counter").unwrap();
    assert_eq!(listed[0].value["doubled"], json!(18));

    let stored = store
        .get(&ItemScope::new("w1", APP, "counter"), "b")
        .unwrap()
        .unwrap();
    assert!(!stored.contains_key("doubled"));
}

/// A failed computed field leaves the item in the list with its stored value.
#[test]
fn test_computed_failure_is_isolated() {
    let settings = Settings::new(vec![Model::new(
        "counter",
        vec![
            Field::new("value", FieldType::Number),
            Field::new("doubled", FieldType::Number).computed(),
        ],
    )]);
    let runtime = NativeRuntime::new().with(APP, Selector::computed("counter", "doubled"), |scope| {
        match scope.item()?.get("value").and_then(Value::as_i64) {
            Some(v) => Ok(json!(v * 2)),
            None => Err(ScriptError::Runtime("not an integer".into())),
        }
    });
    let service = AppService::new(
        Arc::new(StaticSettings::new().with_app(APP, settings)),
        Arc::new(MemoryItemStore::new()),
        Arc::new(runtime),
    );
    service.set_item("w1", APP, "counter", "int", json!({"value": 4})).unwrap();
    service.set_item("w1", APP, "counter", "float", json!({"value": 4.5, "doubled": 0})).unwrap();

    let items = service.list_items("w1", APP, "counter").unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].value["doubled"], json!(8));
    assert_eq!(items[1].value["doubled"], json!(0));
}

/// An item whose filter call fails is not listed.
#[test]
fn test_filter_failure_excludes_item() {
    let runtime = counter_runtime().with(APP, Selector::filter("counter"), |scope| {
        let value = scope.item()?.get("value").and_then(Value::as_i64).unwrap_or(0);
        if value == 13 {
            Err(ScriptError::Runtime("unlucky".into()))
        } else {
            Ok(json!(true))
        }
    });
    let (service, _) = setup_with(runtime);
    service.set_item("w1", APP, "counter", "a", json!({"value": 1})).unwrap();
    service.set_item("w1", APP, "counter", "b", json!({"value": 13})).unwrap();

    let items = service.list_items("w1", APP, "counter").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].key, "a");
}

/// Wallets never see each other's items.
#[test]
fn test_wallet_isolation() {
    let (service, _) = setup();
    service.set_item("w1", APP, "counter", "x", json!({"value": 50})).unwrap();

    assert_eq!(service.list_items("w1", APP, "counter").unwrap().len(), 1);
    assert!(service.list_items("w2", APP, "counter").unwrap().is_empty());
}

// =============================================================================
// Actions
// =============================================================================

/// An undeclared action is NotFound and runs no script.
#[test]
fn test_unknown_action_never_executes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let runtime = counter_runtime().with(APP, Selector::action("launch"), move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Null)
    });
    let (service, _) = setup_with(runtime);

    let err = service.run_action("w1", APP, "launch", json!({})).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.status_code(), 404);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// A declared action receives params and the wallet, and its value is returned verbatim.
#[test]
fn test_declared_action_runs() {
    let runtime = counter_runtime().with(APP, Selector::action("reset"), |scope| {
        Ok(json!({
            "wallet": scope.wallet_id(),
            "params": scope.global("params").cloned().unwrap_or(Value::Null),
        }))
    });
    let (service, _) = setup_with(runtime);

    let result = service.run_action("w9", APP, "reset", json!({"to": 0})).unwrap();
    assert_eq!(result, json!({"wallet": "w9", "params": {"to": 0}}));
}

/// A failing action reports the script failure status.
#[test]
fn test_failing_action_status() {
    let runtime = counter_runtime().with(APP, Selector::action("reset"), |_| {
        Err(ScriptError::Runtime("cannot reset".into()))
    });
    let (service, _) = setup_with(runtime);

    let err = service.run_action("w1", APP, "reset", Value::Null).unwrap_err();
    assert_eq!(err.status_code(), 470);
    assert!(err.envelope().message.contains("cannot reset"));
}
