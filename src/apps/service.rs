//! # App Service
//!
//! Entry points a transport calls with a pre-resolved wallet id. Every call:
//! 1. resolves the app's settings through the injected `SettingsSource`
//! 2. validates them (ConfigurationError otherwise)
//! 3. resolves the model fail-closed (NotFound for undeclared models)
//! 4. runs the pipeline step

use std::sync::Arc;

use serde_json::Value;

use super::errors::{AppError, AppResult};
use super::pipeline;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{JsonKind, SchemaError, Settings, SettingsSource, ValidationDetails};
use crate::scripting::ScriptRuntime;
use crate::store::{Item, ItemScope, ItemStore, ItemValue};

/// App data service, shareable across threads
#[derive(Clone)]
pub struct AppService {
    settings: Arc<dyn SettingsSource>,
    store: Arc<dyn ItemStore>,
    runtime: Arc<dyn ScriptRuntime>,
}

impl AppService {
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        store: Arc<dyn ItemStore>,
        runtime: Arc<dyn ScriptRuntime>,
    ) -> Self {
        Self {
            settings,
            store,
            runtime,
        }
    }

    /// Validated settings for `app`
    pub fn info(&self, app: &str) -> AppResult<Settings> {
        self.settings_for(app)
    }

    /// Items of a model after computed fields and filtering
    pub fn list_items(&self, wallet_id: &str, app: &str, model: &str) -> AppResult<Vec<Item>> {
        let settings = self.settings_for(app)?;
        let scope = ItemScope::new(wallet_id, app, model);
        pipeline::list_items(&settings, self.store.as_ref(), self.runtime.as_ref(), &scope)
    }

    /// The stored value at `key`, without computed fields
    pub fn get_item(&self, wallet_id: &str, app: &str, model: &str, key: &str) -> AppResult<ItemValue> {
        let settings = self.settings_for(app)?;
        pipeline::resolve_model(&settings, model)?;

        self.store
            .get(&ItemScope::new(wallet_id, app, model), key)?
            .ok_or_else(|| AppError::not_found(format!("item '{}' in model '{}'", key, model)))
    }

    /// Validate and store `value` at `key`
    pub fn set_item(&self, wallet_id: &str, app: &str, model: &str, key: &str, value: Value) -> AppResult<()> {
        let settings = self.settings_for(app)?;
        let value = into_item_value(model, value)?;
        pipeline::write_item(
            &settings,
            self.store.as_ref(),
            &ItemScope::new(wallet_id, app, model),
            key,
            value,
        )
    }

    /// Validate and store `value` under a fresh key
    pub fn add_item(&self, wallet_id: &str, app: &str, model: &str, value: Value) -> AppResult<String> {
        let settings = self.settings_for(app)?;
        let value = into_item_value(model, value)?;
        pipeline::add_item(
            &settings,
            self.store.as_ref(),
            &ItemScope::new(wallet_id, app, model),
            value,
        )
    }

    /// Remove the item at `key`; removing a missing item succeeds
    pub fn delete_item(&self, wallet_id: &str, app: &str, model: &str, key: &str) -> AppResult<()> {
        let settings = self.settings_for(app)?;
        pipeline::resolve_model(&settings, model)?;

        self.store.delete(&ItemScope::new(wallet_id, app, model), key)?;
        log_event_with_fields(
            Event::ItemDeleted,
            &[("app", app), ("model", model), ("key", key)],
        );
        Ok(())
    }

    /// Run a declared action on behalf of `wallet_id`
    pub fn run_action(&self, wallet_id: &str, app: &str, action: &str, params: Value) -> AppResult<Value> {
        let settings = self.settings_for(app)?;
        pipeline::run_action(&settings, self.runtime.as_ref(), app, action, wallet_id, params)
    }

    fn settings_for(&self, app: &str) -> AppResult<Settings> {
        let settings = self
            .settings
            .settings(app)
            .map_err(AppError::Configuration)?
            .ok_or_else(|| AppError::not_found(format!("app {} is not installed", app)))?;

        if let Err(e) = settings.validate() {
            log_event_with_fields(Event::SettingsRejected, &[("app", app), ("reason", e.message())]);
            return Err(AppError::Configuration(e));
        }

        Ok(settings)
    }
}

fn into_item_value(model: &str, value: Value) -> AppResult<ItemValue> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Validation(SchemaError::type_mismatch(
            model,
            ValidationDetails::new("(item)", "object", JsonKind::of(&other).name()),
        ))),
    }
}
