//! Settings sources
//!
//! Settings are never looked up through process-wide state. Every entry point
//! receives a `SettingsSource` explicitly.
//!
//! `AppManifestLoader` reads app manifests from disk:
//! - One `*.json` file per app under the apps directory
//! - Each file holds `{ "url": ..., "settings": {...}, "module": "..." }`
//! - Malformed manifest files fail the load
//!
//! Invalidation: the loader serves the snapshot taken by the last
//! `load_all()`/`reload()`; nothing changes until `reload()` is called again.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::types::Settings;
use crate::observability::{log_event_with_fields, Event};

/// Resolves an app URL to its settings document.
pub trait SettingsSource: Send + Sync {
    /// Returns the app's settings, or `None` if the app is unknown.
    fn settings(&self, app: &str) -> SchemaResult<Option<Settings>>;
}

/// Fixed in-memory settings, keyed by app URL
#[derive(Debug, Default, Clone)]
pub struct StaticSettings {
    apps: HashMap<String, Settings>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app(mut self, app: impl Into<String>, settings: Settings) -> Self {
        self.insert(app, settings);
        self
    }

    pub fn insert(&mut self, app: impl Into<String>, settings: Settings) {
        self.apps.insert(app.into(), settings);
    }
}

impl SettingsSource for StaticSettings {
    fn settings(&self, app: &str) -> SchemaResult<Option<Settings>> {
        Ok(self.apps.get(app).cloned())
    }
}

/// On-disk description of one app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppManifest {
    /// Canonical app URL
    pub url: String,
    /// The app's settings document
    pub settings: Settings,
    /// Script module (.wasm or .wat), relative to the manifest file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<PathBuf>,
}

/// Loads app manifests from a directory into an in-memory snapshot.
#[derive(Debug)]
pub struct AppManifestLoader {
    apps_dir: PathBuf,
    snapshot: RwLock<HashMap<String, AppManifest>>,
}

impl AppManifestLoader {
    /// Creates a loader for `apps_dir`. Nothing is read until `load_all()`.
    pub fn new(apps_dir: impl AsRef<Path>) -> Self {
        Self {
            apps_dir: apps_dir.as_ref().to_path_buf(),
            snapshot: RwLock::new(HashMap::new()),
        }
    }

    pub fn apps_dir(&self) -> &Path {
        &self.apps_dir
    }

    /// Reads every manifest in the apps directory and replaces the snapshot.
    ///
    /// A missing directory yields an empty snapshot.
    pub fn load_all(&self) -> SchemaResult<usize> {
        let mut manifests = HashMap::new();

        if self.apps_dir.exists() {
            let entries = fs::read_dir(&self.apps_dir).map_err(|e| {
                SchemaError::invalid_settings(format!(
                    "failed to read apps directory '{}': {}",
                    self.apps_dir.display(),
                    e
                ))
            })?;

            let mut paths = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|e| {
                    SchemaError::invalid_settings(format!("failed to read directory entry: {}", e))
                })?;
                let path = entry.path();
                if path.extension().map_or(false, |ext| ext == "json") {
                    paths.push(path);
                }
            }
            // Later files win on duplicate URLs; sort so that is deterministic
            paths.sort();

            for path in paths {
                let manifest = Self::load_manifest(&path)?;
                manifests.insert(manifest.url.clone(), manifest);
            }
        }

        let count = manifests.len();
        *self
            .snapshot
            .write()
            .map_err(|_| SchemaError::invalid_settings("manifest snapshot lock poisoned"))? = manifests;

        log_event_with_fields(
            Event::SettingsLoaded,
            &[
                ("apps", &count.to_string()),
                ("dir", &self.apps_dir.display().to_string()),
            ],
        );

        Ok(count)
    }

    /// Re-reads the apps directory. Same as `load_all()`.
    pub fn reload(&self) -> SchemaResult<usize> {
        self.load_all()
    }

    /// Loads a single manifest file, resolving its module path.
    fn load_manifest(path: &Path) -> SchemaResult<AppManifest> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::invalid_settings(format!(
                "failed to read manifest '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut manifest: AppManifest = serde_json::from_str(&content).map_err(|e| {
            SchemaError::invalid_settings(format!(
                "invalid manifest JSON '{}': {}",
                path.display(),
                e
            ))
        })?;

        if let Some(module) = manifest.module.take() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            manifest.module = Some(base.join(module));
        }

        Ok(manifest)
    }

    /// All manifests in the current snapshot
    pub fn manifests(&self) -> Vec<AppManifest> {
        self.snapshot
            .read()
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl SettingsSource for AppManifestLoader {
    fn settings(&self, app: &str) -> SchemaResult<Option<Settings>> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|_| SchemaError::invalid_settings("manifest snapshot lock poisoned"))?;
        Ok(snapshot.get(app).map(|m| m.settings.clone()))
    }
}
