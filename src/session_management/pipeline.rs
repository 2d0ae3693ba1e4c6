//! Frame processing stages of one session.
//!
//! `FramePipeline` bundles the session-owned pieces that touch pixels: the
//! tracker, the line zone, the annotator and the recorder. It is plain
//! synchronous code; the controller moves it onto the blocking pool for each
//! message and takes it back afterwards, so stages of one session never run
//! concurrently and never run on the async workers.

use log::{trace, warn};
use uuid::Uuid;

use crate::counting::{CrossingCounts, CrossingDelta, Detection, LineZone};
use crate::data_capture::{Annotator, Frame, SessionRecorder};
use crate::detection::ObjectTracker;
use crate::error_handling::types::{DetectorError, RecorderError};

/// Result of processing one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub delta: CrossingDelta,
    pub counts: CrossingCounts,
    pub labels: Vec<String>,
}

pub struct FramePipeline {
    session_id: Uuid,
    tracker: Box<dyn ObjectTracker>,
    zone: LineZone,
    annotator: Option<Annotator>,
    recorder: SessionRecorder,
}

impl FramePipeline {
    pub fn new(
        session_id: Uuid,
        tracker: Box<dyn ObjectTracker>,
        zone: LineZone,
        annotator: Option<Annotator>,
        recorder: SessionRecorder,
    ) -> Self {
        Self {
            session_id,
            tracker,
            zone,
            annotator,
            recorder,
        }
    }

    /// detect+track → count → annotate → record.
    ///
    /// A tracker failure aborts before anything is counted or recorded.
    /// Recorder failures are logged and do not fail the frame.
    pub fn process(&mut self, frame: &Frame) -> Result<FrameOutcome, DetectorError> {
        if let Err(e) = self.recorder.ensure_open(frame) {
            warn!("[{}] Recording disabled: {}", self.session_id, e);
        }

        let detections = self.tracker.track(frame)?;
        let delta = self.zone.trigger(&detections);
        if !delta.is_empty() {
            trace!(
                "[{}] crossings: +{} in, +{} out",
                self.session_id,
                delta.crossed_in,
                delta.crossed_out
            );
        }

        if self.recorder.is_open() {
            self.record(frame, &detections);
        }

        Ok(FrameOutcome {
            delta,
            counts: self.zone.counts(),
            labels: detections.iter().map(Detection::describe).collect(),
        })
    }

    fn record(&mut self, frame: &Frame, detections: &[Detection]) {
        let written = match &self.annotator {
            Some(annotator) => {
                let mut annotated = frame.clone();
                annotator.annotate(&mut annotated, detections);
                self.recorder.write_frame(&annotated)
            }
            None => self.recorder.write_frame(frame),
        };
        if let Err(e) = written {
            warn!("[{}] Frame not recorded: {}", self.session_id, e);
        }
    }

    /// File name of the recording, once it settled.
    pub fn recording_name(&self) -> &str {
        self.recorder.name()
    }

    pub fn frames_recorded(&self) -> u64 {
        self.recorder.frames_written()
    }

    pub fn close_recorder(&mut self) -> Result<(), RecorderError> {
        self.recorder.close()
    }
}
