use super::Path;
use crate::math::closest_point_on_segment;
use crate::Vec3;

/// Path state at the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CursorData {
    pub pos: Vec3,
    pub forward: Vec3,
    pub curvature: f32,
    /// Index of the segment the cursor is on or just past.
    pub segment_prior: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    Absolute,
    Relative,
}

/// Portion of the path searched by [`Path::move_cursor_to_closest_position`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Seek {
    #[default]
    EntirePath,
    /// From the cursor toward the end.
    Ahead,
    /// From the cursor back toward the start.
    Behind,
}

const CURSOR_EPSILON: f32 = 0.0001;

impl Path {
    pub fn move_cursor_to_start(&self) {
        self.cursor_pos.set(0.0);
        self.mark_cursor_dirty();
    }

    pub fn move_cursor_to_end(&self) {
        self.cursor_pos.set(self.length());
        self.mark_cursor_dirty();
    }

    /// Move the cursor, clamped to the path.
    pub fn move_cursor(&self, value: f32, how: CursorMove) {
        let target = match how {
            CursorMove::Absolute => value,
            CursorMove::Relative => self.cursor_pos.get() + value,
        };
        self.cursor_pos.set(target.clamp(0.0, self.length()));
        self.mark_cursor_dirty();
    }

    /// Distance along the path of the cursor.
    pub fn cursor_position(&self) -> f32 {
        self.cursor_pos.get()
    }

    /// Position, heading, and curvature at the cursor, recomputed only after the cursor moved.
    pub fn cursor_data(&self) -> CursorData {
        if !self.is_valid() {
            return CursorData::default();
        }
        if self.cursor_dirty.get() {
            self.cursor_data.set(self.sample(self.cursor_pos.get()));
            self.cursor_dirty.set(false);
        }
        self.cursor_data.get()
    }

    fn sample(&self, at: f32) -> CursorData {
        let segments = self.segments();
        let count = segments.len();

        if at < CURSOR_EPSILON || count < 2 {
            let first = &segments[0];
            return CursorData {
                pos: first.pos,
                forward: first.forward,
                curvature: first.curvature,
                segment_prior: Some(0),
            };
        }
        if at > self.length() - CURSOR_EPSILON {
            let last = &segments[count - 1];
            return CursorData {
                pos: last.pos,
                forward: last.forward,
                curvature: last.curvature,
                segment_prior: Some(count - 1),
            };
        }

        let mut so_far = 0.0;
        for (i, pair) in segments.windows(2).enumerate() {
            let (seg, next) = (&pair[0], &pair[1]);
            if so_far + seg.length >= at {
                // Zero-length segments count as complete.
                let t = if seg.length > 0.0 {
                    (at - so_far) / seg.length
                } else {
                    1.0
                };
                // Curvature peaks at segment ends and fades out toward the middle.
                let curvature = if t < 0.5 {
                    seg.curvature * (1.0 - 2.0 * t)
                } else {
                    next.curvature * (2.0 * t - 1.0)
                };
                return CursorData {
                    pos: seg.pos.lerp(next.pos, t),
                    forward: seg.forward.lerp(next.forward, t).normalized(),
                    curvature,
                    segment_prior: Some(i),
                };
            }
            so_far += seg.length;
        }

        let last = &segments[count - 1];
        CursorData {
            pos: last.pos,
            forward: last.forward,
            curvature: last.curvature,
            segment_prior: Some(count - 1),
        }
    }

    /// Move the cursor to the point of the path closest to `pos`.
    ///
    /// `along_limit` bounds how much path length is examined; 0 means no bound.
    pub fn move_cursor_to_closest_position(&self, pos: Vec3, seek: Seek, along_limit: f32) {
        if !self.is_valid() {
            return;
        }
        let segments = self.segments();
        let count = segments.len();
        let within = |examined: f32| along_limit <= 0.0 || examined <= along_limit;

        let mut best: Option<(f32, usize, Vec3)> = None;
        let mut consider = |i: usize, a: Vec3, b: Vec3| {
            let close = closest_point_on_segment(pos, a, b);
            let range = (close - pos).length_sqr();
            if best.is_none_or(|(r, _, _)| range < r) {
                best = Some((range, i, close));
            }
        };

        match seek {
            Seek::EntirePath => {
                let mut examined = 0.0;
                let mut i = 0;
                while i + 1 < count && within(examined) {
                    consider(i, segments[i].pos, segments[i + 1].pos);
                    examined += segments[i].length;
                    i += 1;
                }
            }
            Seek::Ahead => {
                // The cursor's own leg only counts from the cursor onward.
                let here = self.cursor_data();
                let mut i = here.segment_prior.unwrap_or(0).min(count.saturating_sub(2));
                let mut from = here.pos;
                let mut examined = 0.0;
                while i + 1 < count && within(examined) {
                    consider(i, from, segments[i + 1].pos);
                    examined += segments[i].length;
                    i += 1;
                    from = segments[i].pos;
                }
            }
            Seek::Behind => {
                // The cursor's own leg only counts up to the cursor.
                let here = self.cursor_data();
                let mut i = here.segment_prior.unwrap_or(0).min(count.saturating_sub(2));
                let mut to = here.pos;
                let mut examined = 0.0;
                while count >= 2 && within(examined) {
                    consider(i, segments[i].pos, to);
                    examined += segments[i].length;
                    if i == 0 {
                        break;
                    }
                    to = segments[i].pos;
                    i -= 1;
                }
            }
        }

        let Some((_, index, close)) = best else {
            return;
        };
        let seg = &segments[index];
        let along = if seg.length > 0.0 {
            (close - seg.pos).length().min(seg.length)
        } else {
            0.0
        };
        self.cursor_pos.set(seg.distance_from_start + along);
        self.mark_cursor_dirty();
    }

    /// Position `distance` along the path, without touching the cursor.
    ///
    /// Starts walking at segment `start` when given. Distances outside the path clamp to its
    /// ends.
    pub fn get_position(&self, distance: f32, start: Option<usize>) -> Vec3 {
        let segments = self.segments();
        let first = start.unwrap_or(0);
        let Some(seg) = segments.get(first) else {
            return Vec3::ZERO;
        };
        if seg.distance_from_start > distance {
            return seg.pos;
        }

        let mut so_far = seg.distance_from_start;
        for pair in segments[first..].windows(2) {
            let (seg, next) = (&pair[0], &pair[1]);
            if so_far + seg.length >= distance {
                let t = if seg.length > 0.0 {
                    (distance - so_far) / seg.length
                } else {
                    0.0
                };
                return seg.pos.lerp(next.pos, t);
            }
            so_far += seg.length;
        }
        segments[segments.len() - 1].pos
    }

    /// Point on the path closest to `pos`, without touching the cursor.
    pub fn get_closest_position(&self, pos: Vec3, start: Option<usize>, along_limit: f32) -> Vec3 {
        let segments = self.segments();
        let first = start.unwrap_or(0);
        if first >= segments.len() {
            return pos;
        }

        let mut best = pos;
        let mut best_range = f32::MAX;
        let mut examined = 0.0;
        for pair in segments[first..].windows(2) {
            if along_limit > 0.0 && examined > along_limit {
                break;
            }
            let close = closest_point_on_segment(pos, pair[0].pos, pair[1].pos);
            let range = (close - pos).length_sqr();
            if range < best_range {
                best = close;
                best_range = range;
            }
            examined += pair[0].length;
        }
        best
    }
}
