//! Edge costs for the area search.

use crate::{Area, AreaFlags, Ladder, MoverProfile, Team};

/// One candidate step of the search: entering `area`, coming from `from`.
#[derive(Debug, Clone, Copy)]
pub struct CostEdge<'a> {
    pub area: &'a Area,
    /// `None` when scoring the start area itself.
    pub from: Option<&'a Area>,
    pub ladder: Option<&'a Ladder>,
    pub elevator: bool,
    /// Cached connection length, when the connection carries one.
    pub length: Option<f32>,
}

/// Scores the incremental cost of a step.
///
/// A negative result forbids entering the area along this edge. Implementations must be pure for
/// the duration of one search.
pub trait CostEvaluator {
    fn cost(&self, edge: &CostEdge<'_>) -> f32;
}

impl<F> CostEvaluator for F
where
    F: Fn(&CostEdge<'_>) -> f32,
{
    fn cost(&self, edge: &CostEdge<'_>) -> f32 {
        self(edge)
    }
}

const JUMP_PENALTY: f32 = 5.0;
const AVOID_PENALTY: f32 = 20.0;

/// Travel distance, with climbs the mover cannot make and drops it would not survive forbidden.
#[derive(Debug, Clone, Copy)]
pub struct ShortestPathCost {
    pub step_height: f32,
    pub max_jump_height: f32,
    pub death_drop_height: f32,
    pub team: Team,
}

impl ShortestPathCost {
    pub fn new(mover: &MoverProfile, team: Team) -> Self {
        Self {
            step_height: mover.step_height,
            max_jump_height: mover.max_jump_height,
            death_drop_height: mover.death_drop_height,
            team,
        }
    }
}

impl CostEvaluator for ShortestPathCost {
    fn cost(&self, edge: &CostEdge<'_>) -> f32 {
        let Some(from) = edge.from else {
            return 0.0;
        };

        if edge.area.is_blocked(self.team, false) {
            return -1.0;
        }

        let mut dist = match (edge.ladder, edge.length) {
            (Some(ladder), _) => ladder.length(),
            (None, Some(length)) if length > 0.0 => length,
            _ => edge.area.center().distance(from.center()),
        };

        if edge.ladder.is_none() && !edge.elevator {
            let rise = from.adjacent_height_change(edge.area);
            if rise >= self.step_height {
                if rise >= self.max_jump_height {
                    return -1.0;
                }
                dist += JUMP_PENALTY * dist;
            } else if rise < -self.death_drop_height {
                return -1.0;
            }
        }

        if edge.area.has_flags(AreaFlags::AVOID) {
            dist *= AVOID_PENALTY;
        }

        dist
    }
}
