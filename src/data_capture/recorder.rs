//! Video recording for a single session.
//!
//! `SessionRecorder` owns the output video of one session. The sink is opened
//! lazily from the first frame handed to [`SessionRecorder::ensure_open`], so
//! the output dimensions always come from real data; after that, every frame
//! must have the same dimensions (frames are normalized upstream).
//!
//! Lifecycle
//! - `Idle`: nothing opened yet; writes are dropped
//! - `Open`: frames go to the encoder
//! - `Closed`: the encoder was finished (or never could be opened); writes are dropped
//!
//! `close` may be called any number of times, including on a recorder that
//! never opened.

use std::io;
use std::sync::Arc;

use log::{debug, error, info, warn};
use uuid::Uuid;

use super::frame::Frame;
use super::video_encoder::{EncoderFactory, VideoEncoder};
use crate::error_handling::types::RecorderError;

enum RecorderState {
    Idle,
    Open {
        encoder: Box<dyn VideoEncoder>,
        width: u32,
        height: u32,
    },
    Closed,
}

pub struct SessionRecorder {
    /// Internal session identifier (used to correlate logs).
    session_id: Uuid,
    /// Output name handed to the encoder factory.
    name: String,
    factory: Arc<dyn EncoderFactory>,
    state: RecorderState,
    frames_written: u64,
    frames_dropped: u64,
}

impl SessionRecorder {
    pub fn new(session_id: Uuid, name: String, factory: Arc<dyn EncoderFactory>) -> Self {
        debug!("[{}] SessionRecorder created for `{}`", session_id, name);
        Self {
            session_id,
            name,
            factory,
            state: RecorderState::Idle,
            frames_written: 0,
            frames_dropped: 0,
        }
    }

    /// Opens the sink sized after `first_frame`. Only the first call has an effect.
    ///
    /// A failed open leaves the recorder closed, so later frames are dropped
    /// rather than retried.
    pub fn ensure_open(&mut self, first_frame: &Frame) -> Result<(), RecorderError> {
        if !matches!(self.state, RecorderState::Idle) {
            return Ok(());
        }

        let (width, height) = first_frame.dimensions();
        let created = match self.factory.create(&self.name, width, height) {
            Err(RecorderError::CreateFailed(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
                let fallback = format!("{}-{}", self.name, self.session_id);
                warn!(
                    "[{}] `{}` is already recorded, writing `{}` instead",
                    self.session_id, self.name, fallback
                );
                self.name = fallback;
                self.factory.create(&self.name, width, height)
            }
            other => other,
        };
        match created {
            Ok(encoder) => {
                info!(
                    "[{}] Recording `{}` at {}x{}",
                    self.session_id, self.name, width, height
                );
                self.state = RecorderState::Open {
                    encoder,
                    width,
                    height,
                };
                Ok(())
            }
            Err(e) => {
                error!("[{}] Unable to open recording: {}", self.session_id, e);
                self.state = RecorderState::Closed;
                Err(e)
            }
        }
    }

    /// Appends a frame. Dropped silently when the sink is not open, dropped with
    /// a warning when the dimensions differ from the opened ones.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), RecorderError> {
        let RecorderState::Open {
            encoder,
            width,
            height,
        } = &mut self.state
        else {
            self.frames_dropped += 1;
            return Ok(());
        };

        if frame.dimensions() != (*width, *height) {
            warn!(
                "[{}] Dropping {}x{} frame, recording is {}x{}",
                self.session_id,
                frame.width(),
                frame.height(),
                width,
                height
            );
            self.frames_dropped += 1;
            return Ok(());
        }

        encoder.write_frame(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Finishes the sink. Idempotent.
    pub fn close(&mut self) -> Result<(), RecorderError> {
        match std::mem::replace(&mut self.state, RecorderState::Closed) {
            RecorderState::Open { mut encoder, .. } => {
                info!(
                    "[{}] Closing recording: written={}, dropped={}",
                    self.session_id, self.frames_written, self.frames_dropped
                );
                encoder.finish()
            }
            RecorderState::Idle => {
                debug!("[{}] Recorder closed before any frame", self.session_id);
                Ok(())
            }
            RecorderState::Closed => Ok(()),
        }
    }

    /// Output name; differs from the requested one when that was taken.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, RecorderState::Open { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, RecorderState::Closed)
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }
}
