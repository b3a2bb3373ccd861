//! Header maps sent with dictation requests.
//!
//! Names compare ignoring ASCII case, so `accept-topic` in a caller's
//! overrides replaces the default `Accept-Topic` instead of sitting next to it.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::NuanceError;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";
pub const ACCEPT_TOPIC: &str = "Accept-Topic";
pub const ACCEPT_LANGUAGE: &str = "Accept-Language";
pub const CONTENT_LANGUAGE: &str = "Content-Language";
pub const CONTENT_LENGTH: &str = "Content-Length";

/// A mutable header-name to header-value map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderSet(HashMap<String, String>);

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The headers every dictation upload starts from.
    pub fn dictation_defaults() -> Self {
        Self::new()
            .with(CONTENT_TYPE, "audio/amr")
            .with(ACCEPT, "text/plain")
            .with(ACCEPT_TOPIC, "Dictation")
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a header, replacing any existing entry with the same name.
    /// Returns the replaced value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let previous = self.remove(&name);
        self.0.insert(name, value.into());
        previous
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let key = self.0.keys().find(|key| key.eq_ignore_ascii_case(name))?.clone();
        self.0.remove(&key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Shallow merge: every override replaces the entry of the same name.
    #[must_use]
    pub fn merge(mut self, overrides: &HeaderSet) -> Self {
        for (name, value) in overrides.iter() {
            self.insert(name, value);
        }
        self
    }

    /// Convert into a reqwest header map, rejecting names or values HTTP cannot carry.
    pub(crate) fn to_header_map(&self) -> Result<HeaderMap, NuanceError> {
        let mut map = HeaderMap::with_capacity(self.len());
        for (name, value) in self.iter() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                NuanceError::invalid_options(format!("invalid header name `{name}`"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                NuanceError::invalid_options(format!("invalid value for header `{name}`"))
            })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

/// Copy every key of `overrides` into `base`; `overrides` wins on conflict.
#[must_use]
pub fn merge(base: HeaderSet, overrides: &HeaderSet) -> HeaderSet {
    base.merge(overrides)
}

impl From<HashMap<String, String>> for HeaderSet {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}
