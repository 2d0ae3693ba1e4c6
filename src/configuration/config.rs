use super::types::*;
use crate::counting::{LineZone, Point, Side};
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Application configuration structure that defines all runtime parameters.
///
/// Loaded from a TOML file; every section and every key has a default matching
/// the reference deployment, so an empty file is a valid configuration.
///
/// # Sections Overview
///
/// - `server`: listen address, port and idle timeout of the WebSocket listener
/// - `line`: counting line endpoints, bounding-box anchor and "in" side
/// - `recorder`: output directory, normalized resolution and JPEG quality
/// - `detector`: which tracker adapter to use and the worker pool size
/// - `reporter`: backend endpoint receiving one summary per session
#[derive(Debug, PartialEq, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub line: LineConfig,
    pub recorder: RecorderConfig,
    pub detector: DetectorConfig,
    pub reporter: ReporterConfig,
}

impl Config {
    /// Reads and validates a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let config = Self::parse_toml(&raw)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parses and validates configuration text.
    pub fn parse_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind_address
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::BadIPFormatting(self.server.bind_address.clone()))?;

        if !self.line.start.iter().chain(self.line.end.iter()).all(|v| v.is_finite()) {
            return Err(ConfigError::NotInRange(format!(
                "line endpoints must be finite, got {:?} -> {:?}",
                self.line.start, self.line.end
            )));
        }
        if self.line.in_side == Side::Unknown {
            return Err(ConfigError::NotInRange(
                "line.in_side must be `above` or `below`".to_string(),
            ));
        }
        if self.line.start == self.line.end {
            return Err(ConfigError::NotInRange(
                "line start and end must differ".to_string(),
            ));
        }
        if self.recorder.width == 0 || self.recorder.height == 0 {
            return Err(ConfigError::NotInRange(format!(
                "recorder resolution {}x{}",
                self.recorder.width, self.recorder.height
            )));
        }
        if !(1..=100).contains(&self.recorder.jpeg_quality) {
            return Err(ConfigError::NotInRange(format!(
                "jpeg_quality {} not in 1..=100",
                self.recorder.jpeg_quality
            )));
        }
        if self.detector.workers == 0 {
            return Err(ConfigError::NotInRange("detector.workers must be > 0".to_string()));
        }
        if self.detector.kind == DetectorKind::Remote && self.detector.endpoint.is_none() {
            return Err(ConfigError::NotInRange(
                "detector.endpoint is required for the remote detector".to_string(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .server
            .bind_address
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::BadIPFormatting(self.server.bind_address.clone()))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Creates the recording directory if it does not exist yet.
    pub fn ensure_output_dir(&self) -> Result<(), ConfigError> {
        let dir = &self.recorder.output_dir;
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                ConfigError::DirectoryDoesNotExist(format!("{}: {}", dir.display(), e))
            })?;
            info!("Created recording directory {}", dir.display());
        }
        Ok(())
    }

    /// A fresh, empty line zone for one session.
    pub fn line_zone(&self) -> LineZone {
        LineZone::new(
            Point::new(self.line.start[0], self.line.start[1]),
            Point::new(self.line.end[0], self.line.end[1]),
            self.line.anchor,
            self.line.in_side,
        )
    }
}

/// Command-line arguments.
///
/// The configuration file is optional; the remaining flags override the
/// matching file values and may also be given through the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "linewatch")]
#[command(version)]
#[command(about = "Line-crossing counter for live WebSocket video streams")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    pub config_file: Option<PathBuf>,

    /// Address to bind the WebSocket listener to
    #[arg(long, env = "LINEWATCH_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Port of the WebSocket listener
    #[arg(long, env = "LINEWATCH_PORT")]
    pub port: Option<u16>,

    /// Directory where session recordings are written
    #[arg(long, env = "LINEWATCH_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Backend endpoint receiving session summaries
    #[arg(long, env = "LINEWATCH_REPORTER_ENDPOINT")]
    pub reporter_endpoint: Option<String>,
}

impl CliArgs {
    /// Builds the effective configuration: file (or defaults), then overrides.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => Config::from_file(path)?,
            None => {
                info!("No configuration file given, using defaults");
                Config::default()
            }
        };

        if let Some(addr) = &self.bind_address {
            config.server.bind_address = addr.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = &self.output_dir {
            config.recorder.output_dir = dir.clone();
        }
        if let Some(endpoint) = &self.reporter_endpoint {
            config.reporter.endpoint = endpoint.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
