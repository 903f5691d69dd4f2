//! Platform capability probing.

use std::future::Future;

use crate::config::Platform;
use crate::error::ProbeError;

/// Reports whether a platform supports live plane detection.
///
/// Invoked once per `start_detection`. Implementations may take as long as
/// they like; the session bounds the wait with the configured timeout.
pub trait CapabilityProbe: Send + Sync {
    /// `Ok(true)` when plane detection is available.
    fn probe_support(
        &self,
        platform: &Platform,
    ) -> impl Future<Output = Result<bool, ProbeError>> + Send;
}

/// Probe with a fixed answer, for hosts that already know their capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticProbe {
    supported: bool,
}

impl StaticProbe {
    /// Probe that always answers `supported`.
    pub fn new(supported: bool) -> Self {
        Self { supported }
    }

    /// Probe reporting support.
    pub fn supported() -> Self {
        Self::new(true)
    }

    /// Probe reporting no support.
    pub fn unsupported() -> Self {
        Self::new(false)
    }
}

impl CapabilityProbe for StaticProbe {
    async fn probe_support(&self, _platform: &Platform) -> Result<bool, ProbeError> {
        Ok(self.supported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_probe() {
        assert!(StaticProbe::supported()
            .probe_support(&Platform::Ios)
            .await
            .unwrap());
        assert!(!StaticProbe::unsupported()
            .probe_support(&Platform::Web)
            .await
            .unwrap());
    }
}
