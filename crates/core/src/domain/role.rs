// Role Domain Model

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// A named participant type in a multi-machine benchmark.
///
/// A workload declares the subset of roles it supports; the layout assigns
/// one role to each participating machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Server,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Server => write!(f, "server"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::WorkloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "server" => Ok(Role::Server),
            other => Err(crate::error::WorkloadError::Config(format!(
                "unknown role '{other}' (expected 'client' or 'server')"
            ))),
        }
    }
}

/// One participating machine, resolved from the declared layout.
///
/// Immutable after creation; the address has already been parsed and
/// validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInstance {
    pub name: String,
    pub role: Role,
    pub address: IpAddr,
}

impl ClientInstance {
    pub fn new(name: impl Into<String>, role: Role, address: IpAddr) -> Self {
        Self {
            name: name.into(),
            role,
            address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [Role::Client, Role::Server] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        assert!("coordinator".parse::<Role>().is_err());
    }
}
