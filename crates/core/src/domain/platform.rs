// Platform Support Matrix
// Pure predicates - detection itself lives behind the PlatformProbe port

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkloadError};

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
    MacOs,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X64,
    Arm64,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X64 => "x64",
            Architecture::Arm64 => "arm64",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combined platform/architecture name used in error messages, e.g. "linux-x64".
pub fn platform_architecture_name(platform: Platform, architecture: Architecture) -> String {
    format!("{}-{}", platform, architecture)
}

/// Linux distribution as reported by the platform probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinuxDistribution {
    Ubuntu,
    Debian,
    CentOs,
    Rhel,
    Fedora,
    Suse,
    /// Anything the probe reported that we do not model explicitly.
    Other(String),
}

impl LinuxDistribution {
    /// Map an os-release style distribution id (e.g. "ubuntu") onto the enum.
    pub fn from_id(id: &str) -> Self {
        match id.to_ascii_lowercase().as_str() {
            "ubuntu" => LinuxDistribution::Ubuntu,
            "debian" => LinuxDistribution::Debian,
            "centos" => LinuxDistribution::CentOs,
            "rhel" => LinuxDistribution::Rhel,
            "fedora" => LinuxDistribution::Fedora,
            "sles" | "opensuse" | "opensuse-leap" => LinuxDistribution::Suse,
            other => LinuxDistribution::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LinuxDistribution::Ubuntu => "ubuntu",
            LinuxDistribution::Debian => "debian",
            LinuxDistribution::CentOs => "centos",
            LinuxDistribution::Rhel => "rhel",
            LinuxDistribution::Fedora => "fedora",
            LinuxDistribution::Suse => "suse",
            LinuxDistribution::Other(name) => name,
        }
    }
}

impl std::fmt::Display for LinuxDistribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the platform probe discovered about the machine we are running on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub platform: Platform,
    pub architecture: Architecture,
    /// Present only on Linux.
    pub distribution: Option<LinuxDistribution>,
}

impl PlatformInfo {
    pub fn new(platform: Platform, architecture: Architecture) -> Self {
        Self {
            platform,
            architecture,
            distribution: None,
        }
    }

    pub fn with_distribution(mut self, distribution: LinuxDistribution) -> Self {
        self.distribution = Some(distribution);
        self
    }
}

/// The set of platform/architecture pairs (and, for Linux, distributions)
/// a workload supports.
///
/// `check` must pass before any mutating action (process start, state
/// write) is attempted.
#[derive(Debug, Clone, Default)]
pub struct PlatformRequirements {
    platforms: Vec<(Platform, Architecture)>,
    distributions: Vec<LinuxDistribution>,
}

impl PlatformRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a supported platform/architecture pair.
    pub fn platform(mut self, platform: Platform, architecture: Architecture) -> Self {
        self.platforms.push((platform, architecture));
        self
    }

    /// Declare a supported Linux distribution. An empty set means any
    /// distribution is acceptable.
    pub fn distribution(mut self, distribution: LinuxDistribution) -> Self {
        self.distributions.push(distribution);
        self
    }

    /// Pure support predicate. The error messages enumerate the supported
    /// set so operators can self-diagnose.
    pub fn check(&self, info: &PlatformInfo) -> Result<()> {
        if !self
            .platforms
            .iter()
            .any(|(p, a)| *p == info.platform && *a == info.architecture)
        {
            return Err(WorkloadError::PlatformNotSupported {
                current: platform_architecture_name(info.platform, info.architecture),
                supported: self
                    .platforms
                    .iter()
                    .map(|(p, a)| platform_architecture_name(*p, *a))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        if info.platform == Platform::Linux && !self.distributions.is_empty() {
            let supported = || {
                self.distributions
                    .iter()
                    .map(|d| d.name().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            match &info.distribution {
                Some(distribution) if self.distributions.contains(distribution) => {}
                Some(distribution) => {
                    return Err(WorkloadError::DistributionNotSupported {
                        distribution: distribution.name().to_string(),
                        supported: supported(),
                    });
                }
                None => {
                    return Err(WorkloadError::DistributionNotSupported {
                        distribution: "unknown".to_string(),
                        supported: supported(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_requirements() -> PlatformRequirements {
        PlatformRequirements::new()
            .platform(Platform::Linux, Architecture::X64)
            .platform(Platform::Linux, Architecture::Arm64)
            .distribution(LinuxDistribution::Ubuntu)
            .distribution(LinuxDistribution::Debian)
    }

    #[test]
    fn test_supported_platform_passes() {
        let info = PlatformInfo::new(Platform::Linux, Architecture::X64)
            .with_distribution(LinuxDistribution::Ubuntu);
        assert!(linux_requirements().check(&info).is_ok());
    }

    #[test]
    fn test_unsupported_platform_enumerates_supported_set() {
        let info = PlatformInfo::new(Platform::Windows, Architecture::X64);
        let err = linux_requirements().check(&info).unwrap_err();
        match err {
            WorkloadError::PlatformNotSupported { current, supported } => {
                assert_eq!(current, "windows-x64");
                assert!(supported.contains("linux-x64"));
                assert!(supported.contains("linux-arm64"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unsupported_distribution_enumerates_supported_set() {
        let info = PlatformInfo::new(Platform::Linux, Architecture::X64)
            .with_distribution(LinuxDistribution::CentOs);
        let err = linux_requirements().check(&info).unwrap_err();
        match err {
            WorkloadError::DistributionNotSupported {
                distribution,
                supported,
            } => {
                assert_eq!(distribution, "centos");
                assert!(supported.contains("ubuntu"));
                assert!(supported.contains("debian"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_distribution_is_rejected_when_set_declared() {
        let info = PlatformInfo::new(Platform::Linux, Architecture::X64);
        assert!(matches!(
            linux_requirements().check(&info),
            Err(WorkloadError::DistributionNotSupported { .. })
        ));
    }

    #[test]
    fn test_distribution_set_ignored_off_linux() {
        let requirements = PlatformRequirements::new()
            .platform(Platform::Windows, Architecture::X64)
            .distribution(LinuxDistribution::Ubuntu);
        let info = PlatformInfo::new(Platform::Windows, Architecture::X64);
        assert!(requirements.check(&info).is_ok());
    }
}
