//! Configuration repository.
//!
//! A [`Config`] layers one or more [`ConfigSource`]s. Bound under the
//! `"config"` abstract it backs `give_config` contextual bindings, and
//! [`ContainerOptions::load`](crate::ContainerOptions::load) reads container
//! settings from it.

use std::collections::HashMap;
use std::env;

use parking_lot::RwLock;
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::{DiError, DiResult};

/// A configuration value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(untagged))]
pub enum ConfigValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<ConfigValue>),
    Object(HashMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn as_str(&self) -> DiResult<&str> {
        match self {
            ConfigValue::String(s) => Ok(s),
            _ => Err(DiError::TypeMismatch("Config value is not a string")),
        }
    }

    pub fn as_i64(&self) -> DiResult<i64> {
        match self {
            ConfigValue::Integer(i) => Ok(*i),
            _ => Err(DiError::TypeMismatch("Config value is not an integer")),
        }
    }

    pub fn as_bool(&self) -> DiResult<bool> {
        match self {
            ConfigValue::Boolean(b) => Ok(*b),
            _ => Err(DiError::TypeMismatch("Config value is not a boolean")),
        }
    }

    /// Follows a dotted path into nested objects.
    fn lookup(&self, path: &[&str]) -> Option<&ConfigValue> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => match self {
                ConfigValue::Object(map) => map.get(*head)?.lookup(rest),
                _ => None,
            },
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

/// Source of configuration values
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// Value for a dotted key, if this source has it
    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// Top-level keys known to this source
    fn keys(&self) -> Vec<String>;
}

/// In-memory source backed by nested values.
#[derive(Debug, Default, Clone)]
pub struct MapConfigSource {
    values: HashMap<String, ConfigValue>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Parses a JSON object document.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        let values: HashMap<String, ConfigValue> = serde_json::from_str(json)
            .map_err(|e| DiError::Config(format!("invalid JSON configuration: {}", e)))?;
        Ok(Self { values })
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        if let Some(value) = self.values.get(key) {
            return Some(value.clone());
        }
        let path: Vec<&str> = key.split('.').collect();
        let (head, rest) = path.split_first()?;
        self.values.get(*head)?.lookup(rest).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// Environment variable source
///
/// `database.url` is looked up as `DATABASE_URL`, or `APP_DATABASE_URL`
/// with prefix `APP`.
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        let key = key.replace('.', "_").to_uppercase();
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key),
            None => key,
        }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        env::var(self.env_key(key)).ok().map(|value| {
            if let Ok(int_val) = value.parse::<i64>() {
                ConfigValue::Integer(int_val)
            } else if let Ok(float_val) = value.parse::<f64>() {
                ConfigValue::Float(float_val)
            } else if let Ok(bool_val) = value.parse::<bool>() {
                ConfigValue::Boolean(bool_val)
            } else {
                ConfigValue::String(value)
            }
        })
    }

    fn keys(&self) -> Vec<String> {
        env::vars()
            .filter_map(|(key, _)| match &self.prefix {
                Some(prefix) => {
                    let prefix_upper = format!("{}_", prefix.to_uppercase());
                    key.strip_prefix(&prefix_upper).map(str::to_lowercase)
                }
                None => Some(key.to_lowercase()),
            })
            .collect()
    }
}

/// Layered configuration repository
///
/// Sources are consulted in the order they were added.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::config::{Config, ConfigValue, MapConfigSource};
///
/// let mut nested = std::collections::HashMap::new();
/// nested.insert("driver".to_string(), ConfigValue::from("postgres"));
///
/// let config = Config::new().with_source(
///     MapConfigSource::new()
///         .set("app.name", "ioc")
///         .set("database", ConfigValue::Object(nested)),
/// );
///
/// assert_eq!(config.get("app.name"), Some(ConfigValue::from("ioc")));
/// assert_eq!(config.get("database.driver"), Some(ConfigValue::from("postgres")));
/// assert_eq!(config.get_or("missing", ConfigValue::from(3i64)), ConfigValue::Integer(3));
/// ```
#[derive(Default)]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
    cache: RwLock<HashMap<String, ConfigValue>>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("sources", &self.sources)
            .field("cached", &self.cache.read().len())
            .finish()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.add_source(Box::new(source));
        self
    }

    pub fn add_source(&mut self, source: Box<dyn ConfigSource>) {
        self.sources.push(source);
        self.cache.write().clear();
    }

    /// Repository over a single JSON document.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        Ok(Self::new().with_source(MapConfigSource::from_json(json)?))
    }

    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        if let Some(value) = self.cache.read().get(key) {
            return Some(value.clone());
        }
        let value = self.sources.iter().find_map(|source| source.get(key))?;
        self.cache.write().insert(key.to_string(), value.clone());
        Some(value)
    }

    pub fn get_or(&self, key: &str, default: ConfigValue) -> ConfigValue {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Required value, failing with a configuration error when absent.
    pub fn require(&self, key: &str) -> DiResult<ConfigValue> {
        self.get(key)
            .ok_or_else(|| DiError::Config(format!("configuration key [{}] is not set.", key)))
    }

    pub fn get_i64_or(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|v| v.as_i64().ok())
            .unwrap_or(default)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|v| v.as_bool().ok())
            .unwrap_or(default)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sources.iter().flat_map(|s| s.keys()).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}
