use std::path::PathBuf;

use serde::Deserialize;

use crate::counting::{Anchor, Side};

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Seconds without an inbound message before a session is closed, `0` disables.
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0"),
            port: 8009,
            idle_timeout_secs: 0,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub anchor: Anchor,
    pub in_side: Side,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            start: [150.0, 1000.0],
            end: [1100.0, 100.0],
            anchor: Anchor::Center,
            in_side: Side::Above,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
    pub annotate: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("uploads"),
            width: 1920,
            height: 1080,
            jpeg_quality: 80,
            annotate: true,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    #[default]
    Stub,
    Remote,
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub kind: DetectorKind,
    /// Inference service URL, required for `remote`.
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    /// Upper bound on concurrently running CPU-bound frame jobs across all sessions.
    pub workers: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            kind: DetectorKind::Stub,
            endpoint: None,
            timeout_ms: 2000,
            workers: 4,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("http://localhost:8007/log/api/Log"),
            timeout_secs: 10,
        }
    }
}
