use std::sync::Arc;

use uuid::Uuid;

use super::remote_tracker::RemoteTrackerFactory;
use super::stub_tracker::StubTrackerFactory;
use crate::configuration::{DetectorConfig, DetectorKind};
use crate::counting::Detection;
use crate::data_capture::Frame;
use crate::error_handling::types::{ConfigError, DetectorError};

/// Detector + multi-object tracker.
///
/// One instance serves exactly one session: track identifiers it returns are
/// expected to stay stable across the frames of that session. Calls are
/// synchronous and may be CPU-bound; the session runs them on the blocking pool
/// and never calls one instance concurrently.
pub trait ObjectTracker: Send {
    /// Tracker identifier, for logs.
    fn name(&self) -> &'static str;

    /// Detect and track objects in one frame.
    fn track(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectorError>;
}

/// Hands out a fresh tracker per session, so no tracking state is shared.
pub trait TrackerFactory: Send + Sync {
    fn create(&self, session_id: Uuid) -> Result<Box<dyn ObjectTracker>, DetectorError>;
}

pub fn factory_from_config(config: &DetectorConfig) -> Result<Arc<dyn TrackerFactory>, ConfigError> {
    match config.kind {
        DetectorKind::Stub => Ok(Arc::new(StubTrackerFactory)),
        DetectorKind::Remote => {
            let endpoint = config.endpoint.clone().ok_or_else(|| {
                ConfigError::NotInRange("detector.endpoint is required for the remote detector".to_string())
            })?;
            Ok(Arc::new(RemoteTrackerFactory::new(endpoint, config.timeout_ms)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_factory_per_kind() {
        let stub = factory_from_config(&DetectorConfig::default()).unwrap();
        assert_eq!(stub.create(Uuid::new_v4()).unwrap().name(), "stub");

        let remote = DetectorConfig {
            kind: DetectorKind::Remote,
            endpoint: Some("http://127.0.0.1:1/track".to_string()),
            ..DetectorConfig::default()
        };
        let factory = factory_from_config(&remote).unwrap();
        assert_eq!(factory.create(Uuid::new_v4()).unwrap().name(), "remote");

        let missing = DetectorConfig {
            kind: DetectorKind::Remote,
            endpoint: None,
            ..DetectorConfig::default()
        };
        assert!(factory_from_config(&missing).is_err());
    }
}
