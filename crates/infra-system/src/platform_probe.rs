// Platform probe implementation
// sysinfo for distribution detection; std env consts for OS/arch

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use benchpress_core::domain::{Architecture, LinuxDistribution, Platform, PlatformInfo};
use benchpress_core::error::{Result, WorkloadError};
use benchpress_core::port::PlatformProbe;

/// Probe backed by the host OS.
#[derive(Default)]
pub struct SystemPlatformProbe;

impl SystemPlatformProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PlatformProbe for SystemPlatformProbe {
    async fn current(&self) -> Result<PlatformInfo> {
        let platform = match std::env::consts::OS {
            "linux" => Platform::Linux,
            "windows" => Platform::Windows,
            "macos" => Platform::MacOs,
            other => {
                return Err(WorkloadError::Config(format!(
                    "unrecognized operating system '{other}'"
                )))
            }
        };

        let architecture = match std::env::consts::ARCH {
            "x86_64" => Architecture::X64,
            "aarch64" => Architecture::Arm64,
            other => {
                return Err(WorkloadError::Config(format!(
                    "unrecognized CPU architecture '{other}'"
                )))
            }
        };

        let mut info = PlatformInfo::new(platform, architecture);
        if platform == Platform::Linux {
            let id = sysinfo::System::distribution_id();
            if !id.is_empty() {
                info = info.with_distribution(LinuxDistribution::from_id(&id));
            }
        }

        debug!(
            platform = %info.platform,
            architecture = %info.architecture,
            distribution = ?info.distribution,
            "Detected platform"
        );
        Ok(info)
    }

    #[cfg(unix)]
    async fn make_executable(&self, path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = tokio::fs::metadata(path).await?;
        let mut permissions = metadata.permissions();
        let mode = permissions.mode();
        if mode & 0o111 != 0o111 {
            permissions.set_mode(mode | 0o111);
            tokio::fs::set_permissions(path, permissions).await?;
            debug!(path = %path.display(), "Marked file executable");
        }
        Ok(())
    }

    #[cfg(not(unix))]
    async fn make_executable(&self, _path: &Path) -> Result<()> {
        // No executable bit to set on this platform.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_current_detects_host_platform() {
        let probe = SystemPlatformProbe::new();
        let info = probe.current().await.unwrap();

        #[cfg(target_os = "linux")]
        assert_eq!(info.platform, Platform::Linux);
        #[cfg(target_os = "windows")]
        assert_eq!(info.platform, Platform::Windows);
        #[cfg(target_os = "macos")]
        assert_eq!(info.platform, Platform::MacOs);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_make_executable_is_idempotent() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("setup.sh");
        tokio::fs::write(&script, "#!/bin/sh\nexit 0\n").await.unwrap();

        let probe = SystemPlatformProbe::new();
        probe.make_executable(&script).await.unwrap();
        probe.make_executable(&script).await.unwrap();

        let mode = tokio::fs::metadata(&script).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_make_executable_missing_file_is_an_io_error() {
        let probe = SystemPlatformProbe::new();
        let result = probe.make_executable(Path::new("/nonexistent/script.sh")).await;
        assert!(matches!(result, Err(WorkloadError::Io(_))));
    }
}
