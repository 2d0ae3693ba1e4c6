//! Geometry and detection types shared by the counter, the trackers and the annotator.

use serde::{Deserialize, Serialize};

/// A point in frame pixel space (origin top-left, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in frame pixels, `(x1, y1)` top-left and `(x2, y2)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Resolve an anchor position on this box.
    pub fn anchor(&self, anchor: Anchor) -> Point {
        let cx = (self.x1 + self.x2) / 2.0;
        let cy = (self.y1 + self.y2) / 2.0;
        match anchor {
            Anchor::Center => Point::new(cx, cy),
            Anchor::TopCenter => Point::new(cx, self.y1),
            Anchor::BottomCenter => Point::new(cx, self.y2),
            Anchor::TopLeft => Point::new(self.x1, self.y1),
            Anchor::TopRight => Point::new(self.x2, self.y1),
            Anchor::BottomLeft => Point::new(self.x1, self.y2),
            Anchor::BottomRight => Point::new(self.x2, self.y2),
        }
    }
}

/// Which point of a detection's bounding box is tested against the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    #[default]
    Center,
    TopCenter,
    BottomCenter,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Side of the counting line a point falls on.
///
/// `Above` is a negative cross product of the line vector with the vector from
/// the line start to the point, `Below` a positive one. A point exactly on the
/// line is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Above,
    Below,
    Unknown,
}

/// One detector/tracker result for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Persistent track identifier; `None` when the tracker lost the object.
    #[serde(default)]
    pub track_id: Option<u64>,
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    /// Human-readable label used in the session log, e.g. `"7 car 0.91"`.
    pub fn describe(&self) -> String {
        match self.track_id {
            Some(id) => format!("{} {} {:.2}", id, self.label, self.confidence),
            None => format!("{} {:.2}", self.label, self.confidence),
        }
    }
}

/// Crossings produced by one `trigger` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossingDelta {
    pub crossed_in: u64,
    pub crossed_out: u64,
}

impl CrossingDelta {
    pub fn is_empty(&self) -> bool {
        self.crossed_in == 0 && self.crossed_out == 0
    }
}

/// Running totals for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrossingCounts {
    #[serde(rename = "in")]
    pub in_count: u64,
    #[serde(rename = "out")]
    pub out_count: u64,
}
