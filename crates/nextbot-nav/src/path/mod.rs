//! Built paths: an ordered run of segments from the agent to its goal.
//!
//! A [`Path`] is filled atomically by one of the `compute*` calls (see `build.rs`), optionally
//! optimized (`optimize.rs`), and read incrementally through its cursor (`cursor.rs`).

mod build;
mod cursor;
mod optimize;

use core::cell::Cell;

use nextbot_core::{EntityHandle, IntervalTimer};

use crate::{AreaId, LadderId, MoverProfile, NavMesh, PathConfig, TraversalQuery, TraverseKind, Vec3};

pub use build::{ComputeOptions, PathGoal, PathOutcome};
pub use cursor::{CursorData, CursorMove, Seek};

/// How a segment is traversed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    #[default]
    OnGround,
    DropDown,
    ClimbUp,
    JumpOverGap,
    LadderUp,
    LadderDown,
}

impl SegmentKind {
    pub fn is_ground(self) -> bool {
        self == SegmentKind::OnGround
    }
}

/// One traversal step of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// The area this segment enters.
    pub area: AreaId,
    /// How `area` is entered from the previous segment. `None` on the first segment and on the
    /// appended terminus.
    pub how: Option<TraverseKind>,
    /// Movement goal within `area`.
    pub pos: Vec3,
    pub ladder: Option<LadderId>,
    pub kind: SegmentKind,
    /// Unit vector toward the next segment.
    pub forward: Vec3,
    pub length: f32,
    pub distance_from_start: f32,
    /// Signed turn in the XY plane at this point: 0 straight, magnitude 1 a full reversal.
    pub curvature: f32,
    pub portal_center: Vec3,
    pub portal_half_width: f32,
}

impl Segment {
    pub(crate) fn new(area: AreaId, how: Option<TraverseKind>) -> Self {
        Self {
            area,
            how,
            pos: Vec3::ZERO,
            ladder: None,
            kind: SegmentKind::OnGround,
            forward: Vec3::ZERO,
            length: 0.0,
            distance_from_start: 0.0,
            curvature: 0.0,
            portal_center: Vec3::ZERO,
            portal_half_width: 0.0,
        }
    }
}

/// Shared inputs of path computation.
#[derive(Clone, Copy)]
pub struct PathContext<'a> {
    /// Current simulation time, used to stamp the path's age.
    pub now: f32,
    pub mesh: &'a NavMesh,
    pub world: &'a dyn TraversalQuery,
    pub mover: &'a MoverProfile,
    pub config: &'a PathConfig,
}

/// A route through the mesh plus a lazily evaluated cursor.
///
/// The cursor lives in `Cell`s so that read-only holders can move it; it is a memo of where a
/// follower is sampling, not part of the route. Cloning copies both.
#[derive(Debug, Clone)]
pub struct Path {
    segments: Vec<Segment>,
    capacity: usize,
    cursor_pos: Cell<f32>,
    cursor_data: Cell<CursorData>,
    cursor_dirty: Cell<bool>,
    age: IntervalTimer,
    subject: Option<EntityHandle>,
}

impl Default for Path {
    fn default() -> Self {
        Self::with_capacity(crate::MAX_PATH_SEGMENTS)
    }
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(2, crate::MAX_PATH_SEGMENTS);
        Self {
            segments: Vec::with_capacity(capacity),
            capacity,
            cursor_pos: Cell::new(0.0),
            cursor_data: Cell::new(CursorData::default()),
            cursor_dirty: Cell::new(true),
            age: IntervalTimer::default(),
            subject: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.segments.is_empty()
    }

    /// Clear the path. The buffer keeps its capacity.
    pub fn invalidate(&mut self) {
        self.segments.clear();
        self.cursor_pos.set(0.0);
        self.cursor_data.set(CursorData::default());
        self.cursor_dirty.set(true);
        self.subject = None;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn first_segment(&self) -> Option<&Segment> {
        self.segments.first()
    }

    pub fn last_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn next_segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index.checked_add(1)?)
    }

    pub fn prior_segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index.checked_sub(1)?)
    }

    pub fn length(&self) -> f32 {
        self.segments.last().map_or(0.0, |s| s.distance_from_start)
    }

    pub fn start_position(&self) -> Option<Vec3> {
        self.segments.first().map(|s| s.pos)
    }

    pub fn end_position(&self) -> Option<Vec3> {
        self.segments.last().map(|s| s.pos)
    }

    /// The entity this path leads to, if it was computed toward one. The handle may dangle.
    pub fn subject(&self) -> Option<EntityHandle> {
        self.subject
    }

    /// Seconds since the path was last (re)computed.
    pub fn age(&self, now: f32) -> f32 {
        self.age.elapsed(now)
    }

    /// Crossing point from `from` (standing at `from_pos`) into `to` through the `dir` edge.
    pub fn compute_area_crossing(
        &self,
        mesh: &NavMesh,
        config: &PathConfig,
        from: AreaId,
        from_pos: Vec3,
        to: AreaId,
        dir: crate::NavDir,
    ) -> Option<Vec3> {
        let from = mesh.area(from)?;
        let to = mesh.area(to)?;
        Some(from.closest_point_in_portal(to, dir, from_pos, config.portal_margin))
    }

    pub(crate) fn segments_mut(&mut self) -> &mut Vec<Segment> {
        &mut self.segments
    }

    pub(crate) fn mark_cursor_dirty(&self) {
        self.cursor_dirty.set(true);
    }

    /// Fill in direction, length, distance, and curvature for every segment, and restart the
    /// age timer.
    pub(crate) fn post_process(&mut self, now: f32) {
        self.age.start(now);
        self.mark_cursor_dirty();

        let count = self.segments.len();
        if count == 0 {
            return;
        }
        if count == 1 {
            let s = &mut self.segments[0];
            s.forward = Vec3::ZERO;
            s.length = 0.0;
            s.distance_from_start = 0.0;
            s.curvature = 0.0;
            return;
        }

        let mut distance = 0.0;
        for i in 0..count - 1 {
            let next = self.segments[i + 1].pos;
            let s = &mut self.segments[i];
            let (forward, length) = (next - s.pos).normalize_with_length();
            s.forward = forward;
            s.length = length;
            s.distance_from_start = distance;
            distance += length;
        }

        for i in 1..count - 1 {
            let curvature = if self.segments[i].kind.is_ground() {
                let from = self.segments[i - 1].forward.xy().normalized();
                let to = self.segments[i].forward.xy().normalized();
                let magnitude = 0.5 * (1.0 - from.dot(to));
                if to.dot(from.perp()) < 0.0 {
                    -magnitude
                } else {
                    magnitude
                }
            } else {
                0.0
            };
            self.segments[i].curvature = curvature;
        }
        self.segments[0].curvature = 0.0;

        let prior_forward = self.segments[count - 2].forward;
        let last = &mut self.segments[count - 1];
        last.forward = prior_forward;
        last.length = 0.0;
        last.distance_from_start = distance;
        last.curvature = 0.0;
    }
}
