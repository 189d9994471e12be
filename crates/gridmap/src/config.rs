//! Bootstrap configuration.
//!
//! The host engine hands the core a flat string-keyed property map exactly
//! once, at bootstrap. [`ConfigurationProperties`] wraps that map with typed
//! readers; whatever is read from it feeds the global
//! [`OptionsContainerBuilder`](gridmap_options::OptionsContainerBuilder) and
//! is never consulted again - there is no ambient configuration state.

use std::collections::HashMap;

use thiserror::Error;

/// Errors raised while reading bootstrap properties.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A property value could not be parsed as the requested type.
    #[error("invalid value `{value}` for property `{key}`: expected {expected}")]
    InvalidPropertyValue {
        /// The property key.
        key: String,
        /// The raw value.
        value: String,
        /// The type that was requested.
        expected: &'static str,
    },
}

/// Result type alias for configuration reads.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// The flat string-keyed property map read once at bootstrap.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationProperties {
    properties: HashMap<String, String>,
}

impl ConfigurationProperties {
    /// Create an empty property map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a raw property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Whether a property is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Get a property as a boolean (`true`/`false`, case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPropertyValue`] if the value is present
    /// but not a boolean.
    pub fn get_bool(&self, key: &str) -> ConfigResult<Option<bool>> {
        self.parse_with(key, "a boolean", |raw| match raw.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    }

    /// Get a property as a signed integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPropertyValue`] if the value is present
    /// but not an integer.
    pub fn get_i64(&self, key: &str) -> ConfigResult<Option<i64>> {
        self.parse_with(key, "an integer", |raw| raw.parse().ok())
    }

    /// Get a property as a non-negative size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPropertyValue`] if the value is present
    /// but not a non-negative integer.
    pub fn get_usize(&self, key: &str) -> ConfigResult<Option<usize>> {
        self.parse_with(key, "a non-negative integer", |raw| raw.parse().ok())
    }

    /// Iterate over all keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the map holds no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn parse_with<T>(
        &self,
        key: &str,
        expected: &'static str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> ConfigResult<Option<T>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        parse(raw).map(Some).ok_or_else(|| ConfigError::InvalidPropertyValue {
            key: key.to_owned(),
            value: raw.to_owned(),
            expected,
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigurationProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { properties: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> ConfigurationProperties {
        ConfigurationProperties::from_iter([
            ("gridmap.batch.enabled", "true"),
            ("gridmap.batch.size", "64"),
            ("gridmap.store.name", "memory"),
            ("gridmap.broken", "maybe"),
        ])
    }

    #[test]
    fn typed_readers_parse_present_values() {
        let props = props();
        assert_eq!(props.get_bool("gridmap.batch.enabled"), Ok(Some(true)));
        assert_eq!(props.get_usize("gridmap.batch.size"), Ok(Some(64)));
        assert_eq!(props.get("gridmap.store.name"), Some("memory"));
    }

    #[test]
    fn missing_keys_read_as_none() {
        let props = props();
        assert_eq!(props.get_bool("gridmap.unset"), Ok(None));
        assert!(!props.contains("gridmap.unset"));
    }

    #[test]
    fn invalid_values_name_key_and_expectation() {
        let props = props();
        let err = props.get_bool("gridmap.broken").expect_err("not a boolean");
        assert_eq!(
            err,
            ConfigError::InvalidPropertyValue {
                key: "gridmap.broken".into(),
                value: "maybe".into(),
                expected: "a boolean",
            }
        );
    }
}
