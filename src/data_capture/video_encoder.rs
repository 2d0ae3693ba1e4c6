//! Video sinks.
//!
//! The recorder only talks to [`VideoEncoder`]; which container and codec end
//! up on disk is the encoder's business. [`MjpegEncoder`] writes a Motion-JPEG
//! elementary stream (one baseline JPEG per frame, back to back), which ffmpeg,
//! ffplay and VLC play directly.
//!
//! The stream has no container, so it carries neither a frame rate nor
//! timestamps. Players fall back to their default rate (25 fps for ffmpeg);
//! pass the capture rate when remuxing, e.g.
//! `ffmpeg -framerate 30 -i rec.mjpeg -c copy rec.avi`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use log::{debug, info};

use super::frame::Frame;
use crate::error_handling::types::RecorderError;

/// Sink for one session's annotated frames.
pub trait VideoEncoder: Send {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), RecorderError>;

    /// Flushes and releases the output. Called exactly once by the recorder.
    fn finish(&mut self) -> Result<(), RecorderError>;
}

/// Creates one encoder per session, once the output dimensions are known.
pub trait EncoderFactory: Send + Sync {
    fn create(
        &self,
        name: &str,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn VideoEncoder>, RecorderError>;
}

pub struct MjpegEncoder {
    path: PathBuf,
    writer: BufWriter<File>,
    quality: u8,
    frames: u64,
}

impl MjpegEncoder {
    /// Creates `path`, never replacing an existing recording.
    pub fn create(path: &Path, quality: u8) -> Result<Self, RecorderError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(RecorderError::CreateFailed)?;
        debug!("Opened MJPEG sink {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            quality,
            frames: 0,
        })
    }
}

impl VideoEncoder for MjpegEncoder {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), RecorderError> {
        JpegEncoder::new_with_quality(&mut self.writer, self.quality)
            .encode_image(frame.image())
            .map_err(|e| RecorderError::EncodeFailed(e.to_string()))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), RecorderError> {
        self.writer.flush().map_err(RecorderError::WriteFailed)?;
        info!(
            "Wrote {} frames to {}",
            self.frames,
            self.path.display()
        );
        Ok(())
    }
}

/// Writes `<output_dir>/<name>.mjpeg`.
pub struct MjpegEncoderFactory {
    output_dir: PathBuf,
    quality: u8,
}

impl MjpegEncoderFactory {
    pub fn new<P: AsRef<Path>>(output_dir: P, quality: u8) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            quality,
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.mjpeg", name))
    }
}

impl EncoderFactory for MjpegEncoderFactory {
    fn create(
        &self,
        name: &str,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn VideoEncoder>, RecorderError> {
        let path = self.path_for(name);
        debug!("Creating {}x{} recording at {}", width, height, path.display());
        Ok(Box::new(MjpegEncoder::create(&path, self.quality)?))
    }
}
