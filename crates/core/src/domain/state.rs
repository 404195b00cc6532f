// Persisted Workload State
// A named property bag with typed conversion at the boundary

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Result, WorkloadError};

/// Persisted key-value record scoped to one workload type.
///
/// A flag is present only once the setup step it guards has fully
/// completed; absence means "redo it". Records are read and written
/// whole - there are no partial-field updates and no expiry, so the
/// workload itself is responsible for invalidation.
///
/// Workloads keep a typed state struct in memory and convert it to/from
/// this generic record at the store boundary, which keeps the in-memory
/// invariants type-checked while the on-disk format stays a flexible map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub name: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl StateRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: serde_json::Map::new(),
        }
    }

    /// Serialize a typed state struct into a record. The struct must
    /// serialize to a JSON object.
    pub fn from_typed<T: Serialize>(name: impl Into<String>, value: &T) -> Result<Self> {
        let name = name.into();
        match serde_json::to_value(value)? {
            serde_json::Value::Object(properties) => Ok(Self { name, properties }),
            other => Err(WorkloadError::State(format!(
                "state for '{name}' must serialize to an object, got {other}"
            ))),
        }
    }

    /// Deserialize the property bag back into a typed state struct.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T> {
        let value = serde_json::Value::Object(self.properties.clone());
        Ok(serde_json::from_value(value)?)
    }
}
