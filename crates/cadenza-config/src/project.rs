//! Project files: session settings plus captured mixer and automation state.
//!
//! Stored as pretty-printed JSON. The router and automation entries are the
//! `to_dict()` output of their objects, so a project written by one version
//! loads into the next with unknown or malformed parts falling back to
//! defaults.

use std::collections::BTreeMap;
use std::path::Path;

use cadenza_core::Stateful;
use cadenza_mixer::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SessionConfig;
use crate::error::{ConfigError, read_text, write_creating_dirs};

/// A saved project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    /// Project name.
    pub name: String,
    /// Engine settings.
    pub session: SessionConfig,
    /// Router state from [`Router::to_dict`](Stateful::to_dict).
    pub router: Value,
    /// Automation state keyed by owner, e.g. a track id.
    pub automation: BTreeMap<String, Value>,
}

impl Default for ProjectFile {
    fn default() -> Self {
        Self::new("Untitled", SessionConfig::default())
    }
}

impl ProjectFile {
    /// An empty project.
    pub fn new(name: impl Into<String>, session: SessionConfig) -> Self {
        Self {
            name: name.into(),
            session,
            router: Value::Null,
            automation: BTreeMap::new(),
        }
    }

    /// Captures the router's tracks and routing.
    pub fn capture_router(&mut self, router: &Router) {
        self.router = router.to_dict();
    }

    /// Captures one automation object under `key`, replacing any previous
    /// entry.
    pub fn capture_automation(&mut self, key: impl Into<String>, source: &impl Stateful) {
        self.automation.insert(key.into(), source.to_dict());
    }

    /// Rebuilds the router at the session's rate and block size.
    ///
    /// A project saved without a router yields the session's default layout.
    pub fn restore_router(&self) -> Result<Router, ConfigError> {
        if self.router.is_null() {
            return self.session.build_router();
        }
        let mut router = Router::new(self.session.sample_rate_hz(), self.session.block_size);
        router.load_dict(&self.router);
        Ok(router)
    }

    /// Loads the automation stored under `key` into `target`.
    ///
    /// Returns false, leaving `target` untouched, when there is no such entry.
    pub fn restore_automation(&self, key: &str, target: &mut impl Stateful) -> bool {
        match self.automation.get(key) {
            Some(dict) => {
                target.load_dict(dict);
                true
            }
            None => false,
        }
    }

    /// Load a project from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read_text(path)?;
        let project: Self = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            name = %project.name,
            automation = project.automation.len(),
            "project_load"
        );
        Ok(project)
    }

    /// Save the project as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        write_creating_dirs(path.as_ref(), &content)
    }
}
