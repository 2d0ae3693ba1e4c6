//! Line-crossing counting.
//!
//! - `types`: points, boxes, detections and crossing totals.
//! - `line_zone`: the per-session side-history state machine.

pub mod line_zone;
pub mod types;

pub use line_zone::LineZone;
pub use types::{Anchor, BoundingBox, CrossingCounts, CrossingDelta, Detection, Point, Side};
