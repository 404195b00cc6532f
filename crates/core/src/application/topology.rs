// Topology Resolver
// Turns the declared layout into concrete peer instances for this run

use std::net::{IpAddr, Ipv4Addr};

use crate::domain::{ClientInstance, Layout, Role};
use crate::error::{Result, WorkloadError};

/// The resolved set of participating instances for the current run.
#[derive(Debug, Clone)]
pub struct ResolvedTopology {
    pub instances: Vec<ClientInstance>,
    /// False when the layout was absent/empty and a single loopback
    /// server instance was synthesized.
    pub multi_machine: bool,
}

impl ResolvedTopology {
    /// Resolve a declared layout.
    ///
    /// Single-machine mode (layout absent or empty) synthesizes exactly
    /// one instance with role Server at the loopback address.
    /// Multi-machine mode parses every declared instance and requires at
    /// least one instance per role in `required`; a role with zero
    /// matches fails with `PeerAddressNotFound`.
    pub fn resolve(layout: Option<&Layout>, required: &[Role]) -> Result<Self> {
        let layout = match layout {
            Some(layout) if !layout.is_empty() => layout,
            _ => {
                return Ok(Self {
                    instances: vec![ClientInstance::new(
                        "localhost",
                        Role::Server,
                        IpAddr::V4(Ipv4Addr::LOCALHOST),
                    )],
                    multi_machine: false,
                });
            }
        };

        let mut instances = Vec::with_capacity(layout.instances.len());
        for declared in &layout.instances {
            let address: IpAddr = declared.address.parse().map_err(|_| {
                WorkloadError::Config(format!(
                    "instance '{}' has an invalid IP address '{}'",
                    declared.name, declared.address
                ))
            })?;
            instances.push(ClientInstance::new(
                declared.name.clone(),
                declared.role,
                address,
            ));
        }

        for role in required {
            if !instances.iter().any(|i| i.role == *role) {
                return Err(WorkloadError::PeerAddressNotFound { role: *role });
            }
        }

        Ok(Self {
            instances,
            multi_machine: true,
        })
    }

    /// All instances carrying the given role, in declaration order.
    pub fn for_role(&self, role: Role) -> impl Iterator<Item = &ClientInstance> {
        self.instances.iter().filter(move |i| i.role == role)
    }

    /// The canonical instance for a role. When multiple instances share
    /// the role, the first in declaration order wins.
    pub fn canonical(&self, role: Role) -> Result<&ClientInstance> {
        self.for_role(role)
            .next()
            .ok_or(WorkloadError::PeerAddressNotFound { role })
    }

    /// The instance whose address matches the local machine, if declared.
    pub fn local(&self, address: IpAddr) -> Option<&ClientInstance> {
        self.instances.iter().find(|i| i.address == address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LayoutInstance;

    fn two_role_layout() -> Layout {
        Layout {
            instances: vec![
                LayoutInstance::new("vm-a", Role::Server, "10.0.0.1"),
                LayoutInstance::new("vm-b", Role::Client, "10.0.0.2"),
            ],
        }
    }

    #[test]
    fn test_absent_layout_synthesizes_loopback_server() {
        let topology = ResolvedTopology::resolve(None, &[]).unwrap();
        assert!(!topology.multi_machine);
        assert_eq!(topology.instances.len(), 1);
        assert_eq!(topology.instances[0].role, Role::Server);
        assert_eq!(
            topology.instances[0].address,
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
    }

    #[test]
    fn test_empty_layout_synthesizes_loopback_server() {
        let layout = Layout::default();
        let topology = ResolvedTopology::resolve(Some(&layout), &[Role::Server]).unwrap();
        assert!(!topology.multi_machine);
        assert_eq!(topology.instances.len(), 1);
    }

    #[test]
    fn test_resolves_declared_instances_in_order() {
        let layout = two_role_layout();
        let topology =
            ResolvedTopology::resolve(Some(&layout), &[Role::Client, Role::Server]).unwrap();
        assert!(topology.multi_machine);
        assert_eq!(topology.instances.len(), 2);
        assert_eq!(topology.instances[0].name, "vm-a");
    }

    #[test]
    fn test_missing_required_role_fails() {
        let layout = Layout {
            instances: vec![LayoutInstance::new("vm-a", Role::Server, "10.0.0.1")],
        };
        let err =
            ResolvedTopology::resolve(Some(&layout), &[Role::Client, Role::Server]).unwrap_err();
        assert!(matches!(
            err,
            WorkloadError::PeerAddressNotFound { role: Role::Client }
        ));
    }

    #[test]
    fn test_invalid_address_is_a_config_error() {
        let layout = Layout {
            instances: vec![LayoutInstance::new("vm-a", Role::Server, "not-an-ip")],
        };
        assert!(matches!(
            ResolvedTopology::resolve(Some(&layout), &[]),
            Err(WorkloadError::Config(_))
        ));
    }

    #[test]
    fn test_first_declared_instance_wins_the_tie_break() {
        let layout = Layout {
            instances: vec![
                LayoutInstance::new("s1", Role::Server, "10.0.0.1"),
                LayoutInstance::new("s2", Role::Server, "10.0.0.3"),
                LayoutInstance::new("c1", Role::Client, "10.0.0.2"),
            ],
        };
        let topology =
            ResolvedTopology::resolve(Some(&layout), &[Role::Client, Role::Server]).unwrap();
        assert_eq!(topology.canonical(Role::Server).unwrap().name, "s1");
    }

    #[test]
    fn test_local_lookup_by_address() {
        let layout = two_role_layout();
        let topology = ResolvedTopology::resolve(Some(&layout), &[]).unwrap();
        let local = topology.local("10.0.0.2".parse().unwrap()).unwrap();
        assert_eq!(local.role, Role::Client);
        assert!(topology.local("10.0.0.9".parse().unwrap()).is_none());
    }
}
