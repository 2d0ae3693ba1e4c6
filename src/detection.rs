//! Detector/tracker adapters.
//!
//! The counting pipeline only sees [`ObjectTracker`]; the adapters here decide
//! where detections come from.
//!
//! - `stub`: detects nothing, for running without an inference service
//! - `remote`: posts frames to an HTTP inference service that tracks per session

pub mod remote_tracker;
pub mod stub_tracker;
pub mod tracker;

pub use remote_tracker::{RemoteTracker, RemoteTrackerFactory};
pub use stub_tracker::{StubTracker, StubTrackerFactory};
pub use tracker::{factory_from_config, ObjectTracker, TrackerFactory};
