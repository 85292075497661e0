//! Configuration for default params per resource.
//!
//! ```toml
//! base_url = "https://api.example.com"
//!
//! [defaults]
//! films = "select=id,title&order=title.asc&limit=25"
//! actors = "select=*&status=eq.active"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ast::Param;
use crate::error::{QueryError, QueryResult};
use crate::merge::combine_params;
use crate::parser;
use crate::transpiler::to_query_string;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "PGQ_CONFIG";

/// Defaults loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Base URL of the PostgREST server, without trailing slash
    #[serde(default)]
    pub base_url: Option<String>,

    /// Default query string per resource
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

impl QueryConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(content: &str) -> QueryResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from `path`, `$PGQ_CONFIG`, or the user config directory, in
    /// that order. A missing file in the user config directory is not an
    /// error.
    pub fn load(path: Option<&Path>) -> QueryResult<Self> {
        if let Some(path) = path {
            return Self::load_file(path);
        }
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            return Self::load_file(Path::new(&env_path));
        }
        match default_path() {
            Some(path) if path.exists() => Self::load_file(&path),
            _ => {
                tracing::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn load_file(path: &Path) -> QueryResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Self::from_toml(&content)
    }

    /// Default params configured for `resource`, empty if none.
    pub fn defaults_for(&self, resource: &str) -> QueryResult<Vec<Param>> {
        match self.defaults.get(resource) {
            Some(query) => parser::parse(query),
            None => Ok(Vec::new()),
        }
    }

    /// Merge the configured defaults for `resource` with `overrides`.
    pub fn params_for(&self, resource: &str, overrides: &[Param]) -> QueryResult<Vec<Param>> {
        Ok(combine_params(&self.defaults_for(resource)?, overrides))
    }

    /// Full request URL for `resource` with the given params.
    pub fn url_for(&self, resource: &str, params: &[Param]) -> QueryResult<String> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| QueryError::Config("base_url is not set".to_string()))?;
        let query = to_query_string(params);
        let base = base.trim_end_matches('/');
        if query.is_empty() {
            Ok(format!("{base}/{resource}"))
        } else {
            Ok(format!("{base}/{resource}?{query}"))
        }
    }
}

/// Read a JSON array of params from `path`.
pub fn load_params(path: &Path) -> QueryResult<Vec<Param>> {
    let content = std::fs::read_to_string(path)?;
    let params: Vec<Param> = serde_json::from_str(&content)?;
    tracing::debug!(path = %path.display(), params = params.len(), "loaded params");
    Ok(params)
}

/// `<config dir>/pgq/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pgq").join("config.toml"))
}
