use super::{Path, PathContext};
use crate::{AreaFlags, TraverseKind};

impl Path {
    /// Remove segments that can be skipped by walking straight past them.
    ///
    /// Works in place: survivors are shifted down over removed ones and the buffer never grows.
    /// The first and last segments are always kept, and nothing is collapsed across a segment
    /// that is not plain ground, that is entered by ladder or elevator, or that enters a precise
    /// area. Does nothing when `PathConfig::optimize` is off.
    pub fn optimize(&mut self, cx: &PathContext<'_>) {
        if !cx.config.optimize || self.segments.len() < 3 {
            return;
        }

        let before = self.segments.len();
        let mut anchor = 0;
        while anchor < self.segments.len() {
            if !self.segments[anchor].kind.is_ground() {
                anchor += 1;
                continue;
            }

            let occluded = self.find_next_occluded(cx, anchor);
            let next_anchor = occluded - 1;
            if next_anchor > anchor + 1 {
                let remove = next_anchor - anchor - 1;
                let count = self.segments.len();
                self.segments.copy_within(next_anchor..count, anchor + 1);
                self.segments.truncate(count - remove);
            }
            anchor += 1;
        }

        if self.segments.len() != before {
            self.mark_cursor_dirty();
            tracing::debug!(
                removed = before - self.segments.len(),
                remaining = self.segments.len(),
                "path optimized"
            );
        }
    }

    // Index of the first segment after `anchor` that cannot be reached directly from it, or the
    // segment count when all can.
    fn find_next_occluded(&self, cx: &PathContext<'_>, anchor: usize) -> usize {
        let from = self.segments[anchor].pos;
        for (i, to) in self.segments.iter().enumerate().skip(anchor + 1) {
            let precise = cx
                .mesh
                .area(to.area)
                .is_none_or(|a| a.has_flags(AreaFlags::PRECISE));
            let off_floor = matches!(
                to.how,
                Some(
                    TraverseKind::LadderUp
                        | TraverseKind::LadderDown
                        | TraverseKind::ElevatorUp
                        | TraverseKind::ElevatorDown
                )
            );
            if !to.kind.is_ground() || off_floor || precise {
                return i;
            }
            if !cx.world.is_potentially_traversable(from, to.pos) {
                return i;
            }
            if cx.world.has_potential_gap(from, to.pos) {
                return i;
            }
        }
        self.segments.len()
    }
}
