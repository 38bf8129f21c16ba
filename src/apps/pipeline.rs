//! # Read/Write Pipeline
//!
//! Stateless steps between the schema, the item store and the script runtime.
//! Settings are always passed in; nothing here caches them.
//!
//! Read path: `store.list` -> computed fields for every item -> filter.
//! Write path: validate -> `store.set` / `store.add`.

use serde_json::Value;

use super::errors::{AppError, AppResult};
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::schema::{ItemValidator, Model, Settings};
use crate::scripting::{Invocation, ScriptRuntime, Selector};
use crate::store::{Item, ItemScope, ItemStore, ItemValue};

/// The declared model, or NotFound. Never the empty sentinel.
pub fn resolve_model<'s>(settings: &'s Settings, name: &str) -> AppResult<&'s Model> {
    settings
        .model(name)
        .ok_or_else(|| AppError::not_found(format!("model '{}' is not declared", name)))
}

/// List a scope's items with computed fields applied and the model filter honored.
///
/// Computed values exist only on the returned copies.
pub fn list_items(
    settings: &Settings,
    store: &dyn ItemStore,
    runtime: &dyn ScriptRuntime,
    scope: &ItemScope,
) -> AppResult<Vec<Item>> {
    let model = resolve_model(settings, &scope.model)?;

    let observation = ObservationScope::with_fields(
        "LIST",
        &[("app", scope.app.as_str()), ("model", scope.model.as_str())],
    );

    let mut items = match store.list(scope) {
        Ok(items) => items,
        Err(e) => {
            observation.fail(&e.to_string());
            return Err(e.into());
        }
    };
    let stored = items.len();

    compute_fields(runtime, &scope.app, model, &mut items);
    let items = filter_items(runtime, &scope.app, model, items);

    observation.complete_with_fields(&[
        ("stored", &stored.to_string()),
        ("returned", &items.len().to_string()),
    ]);
    log_event_with_fields(
        Event::ListServed,
        &[
            ("app", &scope.app),
            ("model", &scope.model),
            ("items", &items.len().to_string()),
        ],
    );

    Ok(items)
}

/// Evaluate every computed field of `model` on every item, in declaration order.
///
/// A failed evaluation leaves that field as stored and is logged; the item
/// stays in the list.
pub fn compute_fields(runtime: &dyn ScriptRuntime, app: &str, model: &Model, items: &mut [Item]) {
    let computed: Vec<_> = model.computed_fields().collect();
    if computed.is_empty() {
        return;
    }

    for item in items.iter_mut() {
        for field in &computed {
            let key = field.output_key();
            let selector = Selector::computed(&model.name, key);
            let invocation =
                Invocation::new(app, &selector).with_global("item", Value::Object(item.value.clone()));

            match runtime.execute(invocation) {
                Ok(value) => {
                    item.value.insert(key.to_string(), value);
                }
                Err(e) => log_event_with_fields(
                    Event::ComputedFieldFailed,
                    &[
                        ("app", app),
                        ("model", &model.name),
                        ("field", key),
                        ("key", &item.key),
                        ("reason", &e.to_string()),
                    ],
                ),
            }
        }
    }
}

/// Keep the items for which the model's filter returns exactly `true`.
///
/// Order is preserved. Without a filter every item is kept; an item whose
/// filter call fails is dropped and logged.
pub fn filter_items(runtime: &dyn ScriptRuntime, app: &str, model: &Model, items: Vec<Item>) -> Vec<Item> {
    if model.filter.is_none() {
        return items;
    }

    let selector = Selector::filter(&model.name);
    items
        .into_iter()
        .filter(|item| {
            let invocation =
                Invocation::new(app, &selector).with_global("item", Value::Object(item.value.clone()));

            match runtime.execute(invocation) {
                Ok(keep) => keep == Value::Bool(true),
                Err(e) => {
                    log_event_with_fields(
                        Event::FilterFailed,
                        &[
                            ("app", app),
                            ("model", &model.name),
                            ("key", &item.key),
                            ("reason", &e.to_string()),
                        ],
                    );
                    false
                }
            }
        })
        .collect()
}

fn validate(settings: &Settings, store: &dyn ItemStore, scope: &ItemScope, value: &ItemValue) -> AppResult<()> {
    let model = resolve_model(settings, &scope.model)?;

    ItemValidator::new(store)
        .validate_item(model, scope, value)
        .map_err(|e| {
            log_event_with_fields(
                Event::ItemRejected,
                &[
                    ("app", &scope.app),
                    ("model", &scope.model),
                    ("code", e.code().code()),
                    ("reason", e.message()),
                ],
            );
            AppError::from_schema(e)
        })
}

/// Validate `value` and store it at `key`
pub fn write_item(
    settings: &Settings,
    store: &dyn ItemStore,
    scope: &ItemScope,
    key: &str,
    value: ItemValue,
) -> AppResult<()> {
    validate(settings, store, scope, &value)?;
    store.set(scope, key, value)?;

    log_event_with_fields(
        Event::ItemWritten,
        &[("app", &scope.app), ("model", &scope.model), ("key", key)],
    );
    Ok(())
}

/// Validate `value` and store it under a fresh key, which is returned
pub fn add_item(settings: &Settings, store: &dyn ItemStore, scope: &ItemScope, value: ItemValue) -> AppResult<String> {
    validate(settings, store, scope, &value)?;
    let key = store.add(scope, value)?;

    log_event_with_fields(
        Event::ItemWritten,
        &[("app", &scope.app), ("model", &scope.model), ("key", &key)],
    );
    Ok(key)
}

/// Run a declared action with `params`, returning the script's value verbatim.
///
/// Undeclared actions are NotFound and no script runs.
pub fn run_action(
    settings: &Settings,
    runtime: &dyn ScriptRuntime,
    app: &str,
    action: &str,
    wallet_id: &str,
    params: Value,
) -> AppResult<Value> {
    if settings.action(action).is_none() {
        return Err(AppError::not_found(format!("action '{}' not defined on app {}", action, app)));
    }

    let observation = ObservationScope::with_fields("ACTION", &[("app", app), ("action", action)]);

    let selector = Selector::action(action);
    let invocation = Invocation::new(app, &selector)
        .with_global("params", params)
        .with_wallet(wallet_id);

    match runtime.execute(invocation) {
        Ok(value) => {
            observation.complete();
            log_event_with_fields(Event::ActionInvoked, &[("app", app), ("action", action)]);
            Ok(value)
        }
        Err(e) => {
            let reason = e.to_string();
            observation.fail(&reason);
            log_event_with_fields(
                Event::ActionFailed,
                &[("app", app), ("action", action), ("reason", &reason)],
            );
            Err(AppError::Script(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, FieldType};
    use crate::scripting::{NativeRuntime, ScriptError};
    use crate::store::MemoryItemStore;
    use serde_json::json;

    const APP: &str = "https://ledger.example";

    fn settings() -> Settings {
        Settings::new(vec![Model::new(
            "entry",
            vec![
                Field::new("value", FieldType::Number),
                Field::new("doubled", FieldType::Number).computed(),
            ],
        )
        .filtered()])
    }

    fn doubling_runtime() -> NativeRuntime {
        NativeRuntime::new()
            .with(APP, Selector::computed("entry", "doubled"), |scope| {
                let value = scope.item()?.get("value").and_then(Value::as_f64).unwrap_or(0.0);
                Ok(json!(value * 2.0))
            })
            .with(APP, Selector::filter("entry"), |scope| {
                let doubled = scope.item()?.get("doubled").and_then(Value::as_f64).unwrap_or(0.0);
                Ok(json!(doubled > 15.0))
            })
    }

    fn value(v: Value) -> ItemValue {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_resolve_model_fails_closed() {
        let settings = settings();
        assert!(resolve_model(&settings, "entry").is_ok());
        assert!(matches!(resolve_model(&settings, "ghost"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_compute_then_filter() {
        let settings = settings();
        let store = MemoryItemStore::new();
        let scope = ItemScope::new("w1", APP, "entry");
        store.set(&scope, "a", value(json!({"value": 5}))).unwrap();
        store.set(&scope, "b", value(json!({"value": 9}))).unwrap();

        let items = list_items(&settings, &store, &doubling_runtime(), &scope).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].key, "b");
        assert_eq!(items[0].value["doubled"], json!(18.0));
    }

    #[test]
    fn test_computed_failure_leaves_field() {
        let model = Model::new(
            "entry",
            vec![
                Field::new("value", FieldType::Number),
                Field::new("label", FieldType::String).computed(),
            ],
        );
        let runtime = NativeRuntime::new().with(APP, Selector::computed("entry", "label"), |_| {
            Err(ScriptError::Runtime("boom".into()))
        });
        let scope = ItemScope::new("w1", APP, "entry");
        let mut items = vec![Item::new(&scope, "a", value(json!({"value": 1, "label": "stored"})))];

        compute_fields(&runtime, APP, &model, &mut items);
        assert_eq!(items[0].value["label"], json!("stored"));
    }

    #[test]
    fn test_filter_requires_literal_true() {
        let model = Model::new("entry", vec![Field::new("value", FieldType::Number)]).filtered();
        let runtime = NativeRuntime::new().with(APP, Selector::filter("entry"), |scope| {
            Ok(scope.item()?.get("value").cloned().unwrap_or(Value::Null))
        });
        let scope = ItemScope::new("w1", APP, "entry");
        let items = vec![
            Item::new(&scope, "t", value(json!({"value": true}))),
            Item::new(&scope, "one", value(json!({"value": 1}))),
            Item::new(&scope, "s", value(json!({"value": "true"}))),
        ];

        let kept = filter_items(&runtime, APP, &model, items);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].key, "t");
    }

    #[test]
    fn test_write_validates_before_storing() {
        let settings = settings();
        let store = MemoryItemStore::new();
        let scope = ItemScope::new("w1", APP, "entry");

        let err = write_item(&settings, &store, &scope, "k", value(json!({"value": "five"}))).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.get(&scope, "k").unwrap(), None);

        write_item(&settings, &store, &scope, "k", value(json!({"value": 5}))).unwrap();
        assert_eq!(store.get(&scope, "k").unwrap(), Some(value(json!({"value": 5}))));
    }

    #[test]
    fn test_add_returns_fresh_keys() {
        let settings = settings();
        let store = MemoryItemStore::new();
        let scope = ItemScope::new("w1", APP, "entry");

        let a = add_item(&settings, &store, &scope, value(json!({"value": 1}))).unwrap();
        let b = add_item(&settings, &store, &scope, value(json!({"value": 1}))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_run_action() {
        let settings = settings().with_action("sum");
        let runtime = NativeRuntime::new().with(APP, Selector::action("sum"), |scope| {
            let params = scope.global("params").cloned().unwrap_or(Value::Null);
            Ok(json!({"wallet": scope.wallet_id(), "params": params}))
        });

        let result = run_action(&settings, &runtime, APP, "sum", "w1", json!([1, 2])).unwrap();
        assert_eq!(result, json!({"wallet": "w1", "params": [1, 2]}));
    }

    #[test]
    fn test_action_failure_is_script_error() {
        let settings = settings().with_action("explode");
        let runtime = NativeRuntime::new().with(APP, Selector::action("explode"), |_| {
            Err(ScriptError::Runtime("nope".into()))
        });

        let err = run_action(&settings, &runtime, APP, "explode", "w1", Value::Null).unwrap_err();
        assert_eq!(err.status_code(), 470);
    }
}
