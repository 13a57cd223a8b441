//! Scoped handle into one named container of a checkpoint

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A named container holding values and nested sections
///
/// Nodes receive a `Section` when they are saved or loaded and may lay out
/// their state inside it however they like. Values are any serde-serializable
/// type; nested sections give the store its hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    values: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    groups: BTreeMap<String, Section>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`, replacing any previous value
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Read the value stored under `key`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| Error::lookup(format!("section has no entry named {key}")))?;
        Ok(T::deserialize(value)?)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Open the nested section `name`, creating it if needed
    pub fn group(&mut self, name: &str) -> &mut Section {
        self.groups.entry(name.to_string()).or_default()
    }

    pub fn subsection(&self, name: &str) -> Option<&Section> {
        self.groups.get(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.groups.is_empty()
    }
}
