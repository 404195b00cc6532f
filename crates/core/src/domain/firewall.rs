// Firewall Rule Domain Model

use crate::error::WorkloadError;

/// Protocol selector for an inbound firewall rule.
///
/// The display forms are embedded verbatim in the host firewall tool's
/// command line, so the set is closed and validated at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Any,
    Tcp,
    Udp,
    TcpUdp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Any => "any",
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::TcpUdp => "tcp,udp",
        }
    }

    /// The concrete protocols covered by this selector, for tools that
    /// take one protocol per invocation.
    pub fn concrete(&self) -> &'static [&'static str] {
        match self {
            Protocol::Tcp => &["tcp"],
            Protocol::Udp => &["udp"],
            Protocol::Any | Protocol::TcpUdp => &["tcp", "udp"],
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Protocol {
    type Err = WorkloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Protocol::Any),
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "tcp,udp" => Ok(Protocol::TcpUdp),
            other => Err(WorkloadError::Config(format!(
                "invalid firewall protocol '{other}' (expected one of: any, tcp, udp, tcp,udp)"
            ))),
        }
    }
}

/// The ports a rule applies to: either an explicit set or a contiguous
/// range. The enum makes the two representations mutually exclusive by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSelection {
    List(Vec<u16>),
    Range { start: u16, end: u16 },
}

impl std::fmt::Display for PortSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortSelection::List(ports) => {
                let joined = ports
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                f.write_str(&joined)
            }
            PortSelection::Range { start, end } => write!(f, "{start}-{end}"),
        }
    }
}

/// A declarative inbound firewall rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallRule {
    pub name: String,
    pub description: String,
    pub protocol: Protocol,
    pub ports: PortSelection,
}

impl FirewallRule {
    /// Rule covering an explicit set of ports, kept in the given order.
    pub fn with_ports(
        name: impl Into<String>,
        description: impl Into<String>,
        protocol: Protocol,
        ports: impl IntoIterator<Item = u16>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            protocol,
            ports: PortSelection::List(ports.into_iter().collect()),
        }
    }

    /// Rule covering a contiguous port range, inclusive on both ends.
    pub fn with_port_range(
        name: impl Into<String>,
        description: impl Into<String>,
        protocol: Protocol,
        start: u16,
        end: u16,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            protocol,
            ports: PortSelection::Range { start, end },
        }
    }
}
