// Platform Probe Port
// Discovers what machine we are on and prepares local executables

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::PlatformInfo;
use crate::error::Result;

/// Platform discovery and executable preparation.
#[async_trait]
pub trait PlatformProbe: Send + Sync {
    /// Identify the current platform, architecture, and (on Linux) the
    /// distribution.
    async fn current(&self) -> Result<PlatformInfo>;

    /// Mark a shipped helper script/binary as runnable. Idempotent and
    /// safe to repeat; a no-op on platforms without an executable bit.
    async fn make_executable(&self, path: &Path) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Mock probe reporting a fixed platform and recording chmod calls.
    pub struct MockPlatformProbe {
        info: PlatformInfo,
        chmod_calls: Mutex<Vec<PathBuf>>,
    }

    impl MockPlatformProbe {
        pub fn new(info: PlatformInfo) -> Self {
            Self {
                info,
                chmod_calls: Mutex::new(Vec::new()),
            }
        }

        pub fn chmod_calls(&self) -> Vec<PathBuf> {
            self.chmod_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PlatformProbe for MockPlatformProbe {
        async fn current(&self) -> Result<PlatformInfo> {
            Ok(self.info.clone())
        }

        async fn make_executable(&self, path: &Path) -> Result<()> {
            self.chmod_calls.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }
}
