// Environment Layout - declared multi-machine topology

use serde::{Deserialize, Serialize};

use crate::domain::Role;

/// The declared set of participating machines for a run.
///
/// Addresses stay as strings here; they are parsed and validated when the
/// layout is resolved into concrete instances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub instances: Vec<LayoutInstance>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// One declared machine: its name, role, and IP address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInstance {
    pub name: String,
    pub role: Role,
    pub address: String,
}

impl LayoutInstance {
    pub fn new(name: impl Into<String>, role: Role, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            address: address.into(),
        }
    }
}
