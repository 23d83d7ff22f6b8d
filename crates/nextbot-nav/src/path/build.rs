use super::{Path, PathContext, Segment, SegmentKind};
use crate::error::{GeometryError, PathError, Result};
use crate::search::{GoalSelector, SearchRequest, SearchScratch};
use crate::{ActorState, AreaId, CostEvaluator, Hull, NavDir, TraverseKind, Vec3};

/// Where a path should lead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathGoal {
    Position(Vec3),
    /// Pursue an actor: its area is the goal area and its position the endpoint.
    Subject(ActorState),
}

/// Successful compute result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOutcome {
    Complete,
    /// The goal was unreachable; the path leads to the area closest to it.
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputeOptions {
    /// Give up on routes longer than this (measured between area centers).
    pub max_path_length: Option<f32>,
    /// Append the goal position even when the search fell short of the goal.
    pub include_goal_if_path_fails: bool,
    /// Accept partial routes. When false an unreachable goal is an error.
    pub allow_partial: bool,
    pub ignore_blockers: bool,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            max_path_length: None,
            include_goal_if_path_fails: true,
            allow_partial: true,
            ignore_blockers: false,
        }
    }
}

// Search radius used to place the endpoints of a trivial path.
const TRIVIAL_AREA_RANGE: f32 = 10_000.0;
// Added to the hull width when probing for clearance.
const HULL_SAFETY_MARGIN: f32 = 5.0;
// Step between clearance traces when pushing a drop point past a ledge.
const DROP_PUSH_INCREMENT: f32 = 10.0;

impl Path {
    /// Compute a path for `agent` toward `goal`.
    ///
    /// The path is invalidated first and stays invalid on every error.
    pub fn compute(
        &mut self,
        cx: &PathContext<'_>,
        scratch: &mut SearchScratch,
        agent: &ActorState,
        goal: PathGoal,
        cost: &dyn CostEvaluator,
        options: &ComputeOptions,
    ) -> Result<PathOutcome> {
        let result = self.compute_inner(cx, scratch, agent, goal, cost, options);
        match &result {
            Ok(outcome) => tracing::debug!(
                segments = self.segment_count(),
                length = self.length(),
                ?outcome,
                "path computed"
            ),
            Err(PathError::Geometry(err)) => {
                tracing::warn!(%err, "path geometry failed");
                self.invalidate();
            }
            Err(err) => {
                tracing::debug!(%err, "no path");
                self.invalidate();
            }
        }
        result
    }

    pub fn compute_to_position(
        &mut self,
        cx: &PathContext<'_>,
        scratch: &mut SearchScratch,
        agent: &ActorState,
        goal: Vec3,
        cost: &dyn CostEvaluator,
        options: &ComputeOptions,
    ) -> Result<PathOutcome> {
        self.compute(cx, scratch, agent, PathGoal::Position(goal), cost, options)
    }

    pub fn compute_to_subject(
        &mut self,
        cx: &PathContext<'_>,
        scratch: &mut SearchScratch,
        agent: &ActorState,
        subject: &ActorState,
        cost: &dyn CostEvaluator,
        options: &ComputeOptions,
    ) -> Result<PathOutcome> {
        self.compute(cx, scratch, agent, PathGoal::Subject(*subject), cost, options)
    }

    fn compute_inner(
        &mut self,
        cx: &PathContext<'_>,
        scratch: &mut SearchScratch,
        agent: &ActorState,
        goal: PathGoal,
        cost: &dyn CostEvaluator,
        options: &ComputeOptions,
    ) -> Result<PathOutcome> {
        self.invalidate();

        let start_area = agent
            .last_known_area
            .filter(|id| cx.mesh.area(*id).is_some())
            .ok_or(PathError::NoStartArea)?;

        let (goal_area, goal_pos, end_pos, subject) = match goal {
            PathGoal::Subject(subject) => {
                let area = subject
                    .last_known_area
                    .filter(|id| cx.mesh.area(*id).is_some())
                    .ok_or(PathError::NoGoalArea)?;
                (Some(area), subject.position, subject.position, Some(subject.handle))
            }
            PathGoal::Position(pos) => {
                let area = cx
                    .mesh
                    .nearest_area(pos, cx.config.goal_area_search_radius);
                let z = match area.and_then(|id| cx.mesh.area(id)) {
                    Some(a) => a.z_at_pos(pos),
                    None => cx.mesh.ground_height(pos).unwrap_or(pos.z),
                };
                (area, pos, pos.with_z(z), None)
            }
        };

        if goal_area == Some(start_area) {
            self.build_trivial(cx, agent.position, goal_pos)?;
            self.subject = subject;
            return Ok(PathOutcome::Complete);
        }

        // A goal area nobody may enter is approached by position instead.
        let search_goal = goal_area.filter(|id| {
            cx.mesh
                .area(*id)
                .is_some_and(|a| !a.is_blocked(agent.team, options.ignore_blockers))
        });

        let mut request = SearchRequest::new(start_area)
            .toward(goal_pos)
            .with_team(agent.team)
            .ignoring_blockers(options.ignore_blockers);
        request.goal = search_goal;
        request.max_path_length = options.max_path_length;

        let result = scratch.search(cx.mesh, &request, cost);
        let closest = result.closest.ok_or(PathError::StartForbidden)?;
        if !result.reached && !options.allow_partial {
            return Err(PathError::Unreachable);
        }

        let include_end = result.reached || options.include_goal_if_path_fails;
        let assembled = self.assemble(cx, scratch, start_area, closest, end_pos, include_end)?;
        if !assembled {
            if result.reached {
                self.build_trivial(cx, agent.position, goal_pos)?;
                self.subject = subject;
                return Ok(PathOutcome::Complete);
            }
            return Err(PathError::Unreachable);
        }

        self.finish(cx, agent.position)?;
        self.subject = subject;
        Ok(if result.reached {
            PathOutcome::Complete
        } else {
            PathOutcome::Partial
        })
    }

    /// Explore outward from the agent and build a path to whichever reached area `selector`
    /// settles on.
    pub fn compute_with_open_goal(
        &mut self,
        cx: &PathContext<'_>,
        scratch: &mut SearchScratch,
        agent: &ActorState,
        cost: &dyn CostEvaluator,
        selector: &mut dyn GoalSelector,
        max_search_radius: Option<f32>,
    ) -> Result<PathOutcome> {
        self.invalidate();
        let result = self.open_goal_inner(cx, scratch, agent, cost, selector, max_search_radius);
        if let Err(err) = &result {
            tracing::debug!(%err, "no open-goal path");
            self.invalidate();
        }
        result
    }

    fn open_goal_inner(
        &mut self,
        cx: &PathContext<'_>,
        scratch: &mut SearchScratch,
        agent: &ActorState,
        cost: &dyn CostEvaluator,
        selector: &mut dyn GoalSelector,
        max_search_radius: Option<f32>,
    ) -> Result<PathOutcome> {
        let start_area = agent
            .last_known_area
            .filter(|id| cx.mesh.area(*id).is_some())
            .ok_or(PathError::NoStartArea)?;
        let goal = scratch
            .search_open_goal(
                cx.mesh,
                start_area,
                agent.position,
                max_search_radius,
                agent.team,
                cost,
                selector,
            )
            .ok_or(PathError::Unreachable)?;
        let end = cx.mesh.area(goal).ok_or(PathError::NoGoalArea)?.center();
        if !self.assemble(cx, scratch, start_area, goal, end, true)? {
            return Err(PathError::Unreachable);
        }
        self.finish(cx, agent.position)?;
        Ok(PathOutcome::Complete)
    }

    // Walk parent links from `end_area` back to `start_area` into segments, reserving a slot for
    // the endpoint. Returns false when the route is a single area.
    fn assemble(
        &mut self,
        cx: &PathContext<'_>,
        scratch: &SearchScratch,
        start_area: AreaId,
        end_area: AreaId,
        end_pos: Vec3,
        include_end: bool,
    ) -> Result<bool> {
        let capacity = self.capacity.min(cx.config.capacity());
        let segments = self.segments_mut();
        segments.clear();

        let mut area = Some(end_area);
        let mut how = scratch.parent(end_area).map(|(_, how)| how);
        while let Some(id) = area {
            segments.push(Segment::new(id, how));
            if id == start_area || segments.len() >= capacity - 1 {
                break;
            }
            let parent = scratch.parent(id);
            area = parent.map(|(p, _)| p);
            how = area.and_then(|p| scratch.parent(p)).map(|(_, h)| h);
        }

        if segments.len() <= 1 {
            segments.clear();
            return Ok(false);
        }
        segments.reverse();
        // The first segment is where the agent stands; nothing leads into it.
        segments[0].how = None;

        if include_end {
            let mut terminus = Segment::new(end_area, None);
            terminus.pos = end_pos;
            segments.push(terminus);
        }
        Ok(true)
    }

    fn finish(&mut self, cx: &PathContext<'_>, start: Vec3) -> Result<()> {
        self.compute_details(cx, start)?;
        self.optimize(cx);
        self.post_process(cx.now);
        Ok(())
    }

    /// Two-segment path straight from `start` to `goal`, both snapped onto their areas' floors.
    pub(crate) fn build_trivial(&mut self, cx: &PathContext<'_>, start: Vec3, goal: Vec3) -> Result<()> {
        self.segments_mut().clear();
        let start_area = cx
            .mesh
            .nearest_area(start, TRIVIAL_AREA_RANGE)
            .and_then(|id| cx.mesh.area(id))
            .ok_or(PathError::NoStartArea)?;
        let goal_area = cx
            .mesh
            .nearest_area(goal, TRIVIAL_AREA_RANGE)
            .and_then(|id| cx.mesh.area(id))
            .ok_or(PathError::NoGoalArea)?;

        let mut first = Segment::new(start_area.id(), None);
        first.pos = start.with_z(start_area.z_at_pos(start));
        let mut last = Segment::new(goal_area.id(), None);
        last.pos = goal.with_z(goal_area.z_at_pos(goal));

        let segments = self.segments_mut();
        segments.push(first);
        segments.push(last);
        self.post_process(cx.now);
        Ok(())
    }

    fn insert_segment(&mut self, cx: &PathContext<'_>, index: usize, segment: Segment) -> core::result::Result<(), GeometryError> {
        let capacity = self.capacity.min(cx.config.capacity());
        let segments = self.segments_mut();
        if segments.len() >= capacity {
            return Err(GeometryError::CapacityExceeded);
        }
        segments.insert(index, segment);
        Ok(())
    }

    /// Place each segment's movement goal and classify how it is traversed.
    fn compute_details(&mut self, cx: &PathContext<'_>, start: Vec3) -> core::result::Result<(), GeometryError> {
        let mesh = cx.mesh;
        let area_of = |id: AreaId| mesh.area(id).ok_or(GeometryError::UnknownArea(id));

        let Some(first) = self.segments.first_mut() else {
            return Ok(());
        };
        let first_area = area_of(first.area)?;
        first.pos = if first_area.contains(start, crate::mesh::FLOOR_TOLERANCE) {
            start
        } else {
            first_area.center()
        };
        first.how = None;
        first.ladder = None;
        first.kind = SegmentKind::OnGround;

        let mut i = 1;
        while i < self.segments.len() {
            let from = self.segments[i - 1];
            let to = self.segments[i];
            let from_area = area_of(from.area)?;
            let to_area = area_of(to.area)?;

            match (to.how, to.how.and_then(TraverseKind::dir)) {
                (_, Some(dir)) => {
                    if !from_area.is_connected(to.area, dir) {
                        return Err(GeometryError::SeveredConnection {
                            from: from.area,
                            to: to.area,
                        });
                    }
                    let portal = from_area.compute_portal(to_area, dir);
                    let mut pos = from_area.closest_point_in_portal(to_area, dir, from.pos, cx.config.portal_margin);
                    pos += dir.vector() * cx.config.step_in_distance;
                    pos.z = from_area.z_at_pos(pos);

                    let seg = &mut self.segments[i];
                    seg.portal_center = portal.center;
                    seg.portal_half_width = portal.half_width;
                    seg.ladder = None;
                    seg.pos = pos;

                    let drop = from_area.z_at_pos(from.pos) - to_area.z_at_pos(pos);
                    if drop > cx.mover.step_height {
                        if let Some(landing) = self.place_drop(cx, i, dir, to_area.z_at_pos(pos)) {
                            self.insert_segment(cx, i + 1, landing)?;
                            i += 1;
                        }
                    }
                }
                (Some(TraverseKind::LadderUp), _) => {
                    let ladder = from_area
                        .ladders_up()
                        .iter()
                        .filter_map(|l| mesh.ladder(*l))
                        .find(|l| l.leads_up_to(to.area))
                        .ok_or(GeometryError::MissingLadder {
                            from: from.area,
                            to: to.area,
                            up: true,
                        })?;
                    let seg = &mut self.segments[i];
                    seg.ladder = Some(ladder.id());
                    seg.pos = ladder.bottom() + ladder.normal() * cx.config.ladder_offset;
                    seg.kind = SegmentKind::LadderUp;
                }
                (Some(TraverseKind::LadderDown), _) => {
                    let ladder = from_area
                        .ladders_down()
                        .iter()
                        .filter_map(|l| mesh.ladder(*l))
                        .find(|l| l.bottom_area() == Some(to.area))
                        .ok_or(GeometryError::MissingLadder {
                            from: from.area,
                            to: to.area,
                            up: false,
                        })?;
                    let seg = &mut self.segments[i];
                    seg.ladder = Some(ladder.id());
                    seg.pos = ladder.top() - ladder.normal() * cx.config.ladder_offset;
                    seg.kind = SegmentKind::LadderDown;
                }
                (Some(TraverseKind::ElevatorUp | TraverseKind::ElevatorDown), _) => {
                    let seg = &mut self.segments[i];
                    seg.pos = to_area.center();
                    seg.ladder = None;
                }
                (Some(_), None) => {
                    let seg = &mut self.segments[i];
                    seg.pos = to_area.closest_point(from.pos);
                    seg.ladder = None;
                }
                (None, None) => {}
            }
            i += 1;
        }

        self.insert_gap_and_climb_points(cx)
    }

    // The crossing at `index` drops more than a step: push it out past the ledge until the hull
    // clears, tag it, and return the landing segment to insert after it.
    fn place_drop(&mut self, cx: &PathContext<'_>, index: usize, dir: NavDir, landing_z: f32) -> Option<Segment> {
        let hull_width = cx.mover.hull_width + HULL_SAFETY_MARGIN;
        let half = hull_width * 0.5;
        let hull = Hull {
            mins: Vec3::new(-half, -half, cx.mover.step_height),
            maxs: Vec3::new(half, half, cx.mover.crouch_hull_height),
        };
        let to = self.segments[index];
        let push_dir = dir.vector();

        let mut push = 0.0;
        while push <= 2.0 * hull_width {
            let pos = to.pos + push_dir * push;
            let lower = pos.with_z(landing_z);
            if cx.world.trace_hull(pos, lower, &hull, None).is_clear() {
                break;
            }
            push += DROP_PUSH_INCREMENT;
        }
        let push = push.min(2.0 * hull_width);

        let start_drop = to.pos + push_dir * push;
        let ground = cx.mesh.ground_height(start_drop)?;
        if start_drop.z <= ground + cx.mover.step_height {
            return None;
        }

        let seg = &mut self.segments[index];
        seg.pos = start_drop;
        seg.kind = SegmentKind::DropDown;

        let mut landing = Segment::new(to.area, to.how);
        landing.pos = start_drop.with_z(ground);
        landing.portal_center = to.portal_center;
        landing.portal_half_width = to.portal_half_width;
        Some(landing)
    }

    // Consecutive ground segments whose areas are far apart get a gap-jump launch point; ones
    // whose floor rises more than a step get a climb launch point.
    fn insert_gap_and_climb_points(&mut self, cx: &PathContext<'_>) -> core::result::Result<(), GeometryError> {
        let mesh = cx.mesh;
        let half_width = (cx.mover.hull_width + HULL_SAFETY_MARGIN) * 0.5;

        let mut i = 0;
        while i + 1 < self.segments.len() {
            let from = self.segments[i];
            let to = self.segments[i + 1];

            let from_on_floor = from.how.is_none_or(TraverseKind::is_floor);
            let to_on_floor = to.how.is_some_and(TraverseKind::is_floor) && to.kind.is_ground();
            if !from_on_floor || !to_on_floor {
                i += 1;
                continue;
            }

            let from_area = mesh.area(from.area).ok_or(GeometryError::UnknownArea(from.area))?;
            let to_area = mesh.area(to.area).ok_or(GeometryError::UnknownArea(to.area))?;

            let close_to = to_area.closest_point(from.pos);
            let close_from = from_area.closest_point(close_to);
            let separation = (close_from - close_to).length_2d();
            let rise = close_to.z - close_from.z;

            if separation > cx.config.gap_separation_tolerance && separation > 0.5 * rise.abs() {
                let landing = to_area.closest_point(to.pos);
                let launch = from_area.closest_point(landing);
                let forward = (landing - launch).normalized();

                self.segments[i + 1].pos = landing + forward * half_width;

                let mut jump = from;
                jump.pos = launch - forward * half_width;
                jump.kind = SegmentKind::JumpOverGap;
                self.insert_segment(cx, i + 1, jump)?;
                i += 1;
            } else if rise > cx.mover.step_height {
                let top = to_area.center();
                self.segments[i + 1].pos = top;

                let mut climb = from;
                climb.pos = from_area.closest_point(top);
                climb.kind = SegmentKind::ClimbUp;
                self.insert_segment(cx, i + 1, climb)?;
                i += 1;
            }
            i += 1;
        }
        Ok(())
    }
}
