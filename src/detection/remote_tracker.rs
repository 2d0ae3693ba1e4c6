//! Tracker backed by an HTTP inference service.
//!
//! Each frame is posted as a JPEG to `<endpoint>?session=<session id>`. The
//! service keeps one tracker state per `session` value, so identifiers stay
//! stable across the frames of one session and are never mixed between
//! sessions. The response is a JSON array:
//!
//! ```json
//! [{"track_id": 3, "label": "car", "confidence": 0.91, "bbox": [x1, y1, x2, y2]}]
//! ```
//!
//! `track_id` may be omitted or `null` for objects the service could not track.

use std::time::Duration;

use log::{debug, trace, warn};
use serde::Deserialize;
use uuid::Uuid;

use super::tracker::{ObjectTracker, TrackerFactory};
use crate::counting::{BoundingBox, Detection};
use crate::data_capture::Frame;
use crate::error_handling::types::DetectorError;

const UPLOAD_JPEG_QUALITY: u8 = 85;

#[derive(Debug, Deserialize)]
struct WireDetection {
    #[serde(default)]
    track_id: Option<u64>,
    label: String,
    confidence: f32,
    bbox: [f32; 4],
}

impl WireDetection {
    /// Values beyond `f32` range arrive as infinities.
    fn is_finite(&self) -> bool {
        self.confidence.is_finite() && self.bbox.iter().all(|v| v.is_finite())
    }
}

impl From<WireDetection> for Detection {
    fn from(w: WireDetection) -> Self {
        let [x1, y1, x2, y2] = w.bbox;
        Detection {
            track_id: w.track_id,
            label: w.label,
            confidence: w.confidence.clamp(0.0, 1.0),
            bbox: BoundingBox::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)),
        }
    }
}

pub struct RemoteTracker {
    agent: ureq::Agent,
    endpoint: String,
    session_key: String,
}

impl RemoteTracker {
    pub fn new(endpoint: String, session_id: Uuid, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            endpoint,
            session_key: session_id.to_string(),
        }
    }
}

impl ObjectTracker for RemoteTracker {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn track(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
        let jpeg = frame
            .to_jpeg(UPLOAD_JPEG_QUALITY)
            .map_err(|e| DetectorError::InferenceFailed(e.to_string()))?;
        trace!(
            "[{}] Posting {} byte frame to {}",
            self.session_key,
            jpeg.len(),
            self.endpoint
        );

        let response = self
            .agent
            .post(&self.endpoint)
            .query("session", &self.session_key)
            .set("Content-Type", "image/jpeg")
            .send_bytes(&jpeg)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    DetectorError::RemoteError(format!("inference service answered {}", code))
                }
                other => DetectorError::RemoteError(other.to_string()),
            })?;

        let wire: Vec<WireDetection> = response
            .into_json()
            .map_err(|e| DetectorError::BadResponse(e.to_string()))?;
        debug!("[{}] {} detections", self.session_key, wire.len());

        Ok(wire
            .into_iter()
            .filter(|w| {
                let keep = w.is_finite();
                if !keep {
                    warn!("[{}] Dropping non-finite detection {:?}", self.session_key, w);
                }
                keep
            })
            .map(Detection::from)
            .collect())
    }
}

pub struct RemoteTrackerFactory {
    endpoint: String,
    timeout: Duration,
}

impl RemoteTrackerFactory {
    pub fn new(endpoint: String, timeout_ms: u64) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_millis(timeout_ms),
        }
    }
}

impl TrackerFactory for RemoteTrackerFactory {
    fn create(&self, session_id: Uuid) -> Result<Box<dyn ObjectTracker>, DetectorError> {
        Ok(Box::new(RemoteTracker::new(
            self.endpoint.clone(),
            session_id,
            self.timeout,
        )))
    }
}
