//! Line-crossing counter.
//!
//! A [`LineZone`] remembers, for every track identifier it has seen, which side
//! of the counting line the track was last observed on. A crossing is counted
//! only when a track is seen on the opposite side of its stored side, so a track
//! that stays put never counts twice and a track's first sighting never counts.
//!
//! The zone belongs to exactly one session; track identifiers are only
//! meaningful within the tracker instance that produced them.

use std::collections::HashMap;

use log::trace;

use super::types::{Anchor, CrossingCounts, CrossingDelta, Detection, Point, Side};

pub struct LineZone {
    start: Point,
    end: Point,
    anchor: Anchor,
    /// Side a track must move onto for the crossing to count as "in".
    in_side: Side,
    track_sides: HashMap<u64, Side>,
    counts: CrossingCounts,
}

impl LineZone {
    pub fn new(start: Point, end: Point, anchor: Anchor, in_side: Side) -> Self {
        Self {
            start,
            end,
            anchor,
            in_side,
            track_sides: HashMap::new(),
            counts: CrossingCounts::default(),
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn counts(&self) -> CrossingCounts {
        self.counts
    }

    pub fn in_count(&self) -> u64 {
        self.counts.in_count
    }

    pub fn out_count(&self) -> u64 {
        self.counts.out_count
    }

    /// Number of tracks with a recorded side.
    pub fn tracked(&self) -> usize {
        self.track_sides.len()
    }

    /// Which side of the line `point` falls on.
    pub fn side_of(&self, point: Point) -> Side {
        let lx = self.end.x - self.start.x;
        let ly = self.end.y - self.start.y;
        let px = point.x - self.start.x;
        let py = point.y - self.start.y;
        let cross = lx * py - ly * px;

        if cross < 0.0 {
            Side::Above
        } else if cross > 0.0 {
            Side::Below
        } else {
            Side::Unknown
        }
    }

    /// Feed one frame's detections and return the crossings they produced.
    pub fn trigger(&mut self, detections: &[Detection]) -> CrossingDelta {
        let mut delta = CrossingDelta::default();

        for detection in detections {
            let Some(track_id) = detection.track_id else {
                continue;
            };

            let current = self.side_of(detection.bbox.anchor(self.anchor));
            if current == Side::Unknown {
                continue;
            }

            match self.track_sides.insert(track_id, current) {
                None => {
                    trace!("track {} first seen {:?}", track_id, current);
                }
                Some(previous) if previous == current => {}
                Some(previous) => {
                    if current == self.in_side {
                        delta.crossed_in += 1;
                    } else {
                        delta.crossed_out += 1;
                    }
                    trace!("track {} crossed {:?} -> {:?}", track_id, previous, current);
                }
            }
        }

        self.counts.in_count += delta.crossed_in;
        self.counts.out_count += delta.crossed_out;
        delta
    }
}
