use log::warn;
use uuid::Uuid;

use super::tracker::{ObjectTracker, TrackerFactory};
use crate::counting::Detection;
use crate::data_capture::Frame;
use crate::error_handling::types::DetectorError;

/// Tracker that never detects anything.
///
/// Lets the full session lifecycle (recording, logging, reporting) run without
/// an inference service.
#[derive(Default)]
pub struct StubTracker;

impl ObjectTracker for StubTracker {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn track(&mut self, _frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
        Ok(Vec::new())
    }
}

pub struct StubTrackerFactory;

impl TrackerFactory for StubTrackerFactory {
    fn create(&self, session_id: Uuid) -> Result<Box<dyn ObjectTracker>, DetectorError> {
        warn!("[{}] Using the stub tracker, no objects will be counted", session_id);
        Ok(Box::new(StubTracker))
    }
}
