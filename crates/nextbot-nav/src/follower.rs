//! Drives a bot along a [`Path`] one tick at a time.

use nextbot_core::{CountdownTimer, EntityHandle, IntervalTimer, TickContext};

use crate::bot::{Bot, BotEvent, MoveFailure, QueryAnswer};
use crate::error::Result;
use crate::path::{ComputeOptions, PathContext, PathGoal, PathOutcome, Seek, Segment, SegmentKind};
use crate::search::{GoalSelector, SearchScratch};
use crate::{
    ActorState, AreaFlags, CostEvaluator, FollowerConfig, Hull, NavMesh, Path, TraversalQuery, Vec3,
};

// Goals closer than this (horizontally) are not re-targeted by avoidance near a ledge.
const NEAR_LEDGE_RANGE: f32 = 50.0;
const LADDER_MOUNT_RANGE: f32 = 25.0;
// Horizontal range to a goal high above us at which we decide we fell off the path.
const FELL_OFF_RANGE: f32 = 25.0;
const AVOID_STEER_DISTANCE: f32 = 100.0;
const HINDRANCE_RNG_STREAM: u64 = 0x4849_4e44;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowerState {
    NoGoal,
    Seeking,
    Blocked,
    Arrived,
}

/// A non-ground segment ahead on the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discontinuity {
    pub kind: SegmentKind,
    pub segment: usize,
    /// Distance from the bot to the start of the discontinuity, along the path.
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HindranceReport {
    pub entity: EntityHandle,
    pub waited: f32,
    /// The wait ran out; call [`PathFollower::resolve_hindrance`].
    pub needs_decision: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HindranceDecision {
    WaitLonger,
    /// Drop the path; the owner recomputes it.
    Repath,
    /// Ignore this hindrance from now on.
    PushThrough,
}

/// Geometry of the most recent avoidance traces, kept for debug drawing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AvoidTraces {
    pub checked: bool,
    pub left_from: Vec3,
    pub left_to: Vec3,
    pub left_clear: bool,
    pub right_from: Vec3,
    pub right_to: Vec3,
    pub right_clear: bool,
    pub hull_min: Vec3,
    pub hull_max: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowReport {
    pub state: FollowerState,
    /// Index of the segment currently being approached.
    pub goal: Option<usize>,
    /// Where the bot was steered this tick.
    pub move_target: Option<Vec3>,
    pub discontinuity: Option<Discontinuity>,
    pub hindrance: Option<HindranceReport>,
}

impl FollowReport {
    fn bare(state: FollowerState, goal: Option<usize>) -> Self {
        Self {
            state,
            goal,
            move_target: None,
            discontinuity: None,
            hindrance: None,
        }
    }
}

/// Per-tick inputs of [`PathFollower::update`].
#[derive(Clone, Copy)]
pub struct FollowContext<'a> {
    pub tick: TickContext,
    pub mesh: &'a NavMesh,
    pub world: &'a dyn TraversalQuery,
}

#[derive(Debug, Clone)]
pub struct PathFollower {
    path: Path,
    goal: Option<usize>,
    config: FollowerConfig,
    avoid_timer: CountdownTimer,
    wait_timer: CountdownTimer,
    hindrance: Option<EntityHandle>,
    hindrance_since: IntervalTimer,
    pushing_through: Option<EntityHandle>,
    traces: AvoidTraces,
    stuck: bool,
    arrived: bool,
}

impl Default for PathFollower {
    fn default() -> Self {
        Self::new(FollowerConfig::default())
    }
}

impl PathFollower {
    pub fn new(config: FollowerConfig) -> Self {
        Self {
            path: Path::new(),
            goal: None,
            config,
            avoid_timer: CountdownTimer::default(),
            wait_timer: CountdownTimer::default(),
            hindrance: None,
            hindrance_since: IntervalTimer::default(),
            pushing_through: None,
            traces: AvoidTraces::default(),
            stuck: false,
            arrived: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &FollowerConfig {
        &self.config
    }

    pub fn goal_index(&self) -> Option<usize> {
        self.goal
    }

    pub fn current_goal(&self) -> Option<&Segment> {
        self.path.segment(self.goal?)
    }

    pub fn hindrance(&self) -> Option<EntityHandle> {
        self.hindrance
    }

    pub fn avoid_traces(&self) -> &AvoidTraces {
        &self.traces
    }

    pub fn min_look_ahead(&self) -> f32 {
        self.config.min_look_ahead
    }

    pub fn set_min_look_ahead(&mut self, value: f32) {
        self.config.min_look_ahead = value;
    }

    pub fn goal_tolerance(&self) -> f32 {
        self.config.goal_tolerance
    }

    pub fn set_goal_tolerance(&mut self, value: f32) {
        self.config.goal_tolerance = value;
    }

    pub fn compute(
        &mut self,
        cx: &PathContext<'_>,
        scratch: &mut SearchScratch,
        agent: &ActorState,
        goal: PathGoal,
        cost: &dyn CostEvaluator,
        options: &ComputeOptions,
    ) -> Result<PathOutcome> {
        let result = self.path.compute(cx, scratch, agent, goal, cost, options);
        self.on_path_changed();
        result
    }

    pub fn compute_with_open_goal(
        &mut self,
        cx: &PathContext<'_>,
        scratch: &mut SearchScratch,
        agent: &ActorState,
        cost: &dyn CostEvaluator,
        selector: &mut dyn GoalSelector,
        max_search_radius: Option<f32>,
    ) -> Result<PathOutcome> {
        let result = self
            .path
            .compute_with_open_goal(cx, scratch, agent, cost, selector, max_search_radius);
        self.on_path_changed();
        result
    }

    /// Follow a copy of `path` instead.
    pub fn set_path(&mut self, path: &Path) {
        self.path = path.clone();
        self.on_path_changed();
    }

    pub fn invalidate(&mut self) {
        self.path.invalidate();
        self.on_path_changed();
    }

    fn on_path_changed(&mut self) {
        self.goal = self.path.is_valid().then_some(0);
        self.avoid_timer.invalidate();
        self.wait_timer.invalidate();
        self.hindrance = None;
        self.pushing_through = None;
        self.traces = AvoidTraces::default();
        self.arrived = false;
    }

    fn fail(&mut self, bot: &mut Bot, reason: MoveFailure) -> FollowReport {
        tracing::debug!(?reason, "path following failed");
        self.path.invalidate();
        self.goal = None;
        self.hindrance = None;
        bot.locomotion.stop();
        bot.dispatch(BotEvent::MoveToFailure(reason));
        FollowReport::bare(FollowerState::NoGoal, None)
    }

    pub fn on_event(&mut self, event: &BotEvent) {
        match event {
            BotEvent::Stuck => {
                self.stuck = true;
                self.avoid_timer.invalidate();
            }
            BotEvent::UnStuck => self.stuck = false,
            BotEvent::LandOnGround => self.avoid_timer.invalidate(),
            _ => {}
        }
    }

    /// Apply the owner's decision about the current hindrance.
    pub fn resolve_hindrance(&mut self, decision: HindranceDecision, now: f32) {
        let Some(entity) = self.hindrance else {
            return;
        };
        tracing::debug!(entity = entity.index, ?decision, "hindrance resolved");
        match decision {
            HindranceDecision::WaitLonger => self.wait_timer.start(now, self.config.hindrance_wait),
            HindranceDecision::Repath => {
                self.path.invalidate();
                self.goal = None;
                self.hindrance = None;
                self.wait_timer.invalidate();
            }
            HindranceDecision::PushThrough => {
                self.pushing_through = self.hindrance.take();
                self.wait_timer.invalidate();
                self.avoid_timer.invalidate();
            }
        }
    }

    /// Move the bot one tick along the path.
    pub fn update(&mut self, cx: &FollowContext<'_>, bot: &mut Bot) -> FollowReport {
        if !self.path.is_valid() {
            let state = if self.arrived {
                FollowerState::Arrived
            } else {
                FollowerState::NoGoal
            };
            return FollowReport::bare(state, None);
        }
        let Some(mut goal) = self.goal else {
            return FollowReport::bare(FollowerState::NoGoal, None);
        };

        let feet = bot.feet();
        if bot.locomotion.is_using_ladder() || self.ladder_update(bot, feet, goal) {
            return FollowReport::bare(FollowerState::Seeking, self.goal);
        }

        if !self.check_progress(cx, bot, feet) {
            tracing::debug!("path complete");
            self.path.invalidate();
            self.goal = None;
            self.arrived = true;
            bot.locomotion.stop();
            bot.dispatch(BotEvent::MoveToSuccess);
            return FollowReport::bare(FollowerState::Arrived, None);
        }
        if let Some(g) = self.goal {
            goal = g;
        }

        let Some(seg) = self.path.segment(goal).copied() else {
            return self.fail(bot, MoveFailure::InvalidPath);
        };
        let (forward, goal_range) = (seg.pos - feet).with_z(0.0).normalize_with_length();

        self.climb_or_jump(bot, goal, &seg, forward, goal_range);
        let Some(seg) = self.current_goal().copied() else {
            return FollowReport::bare(FollowerState::NoGoal, None);
        };
        let goal = self.goal.unwrap_or(goal);

        if self.fell_off_path(cx, bot, feet, goal, &seg) {
            bot.locomotion.clear_stuck_status();
            return self.fail(bot, MoveFailure::FellOff);
        }

        let mut report = FollowReport::bare(FollowerState::Seeking, Some(goal));
        report.discontinuity = self.next_discontinuity(feet, self.config.discontinuity_scan_range);
        if report.discontinuity.is_none()
            && !self.config.authoritative_mesh
            && seg.kind.is_ground()
            && cx.world.has_potential_gap(feet, seg.pos)
        {
            report.discontinuity = Some(Discontinuity {
                kind: SegmentKind::JumpOverGap,
                segment: goal,
                distance: goal_range,
            });
        }

        let mut target = seg.pos;
        if goal_range > NEAR_LEDGE_RANGE || seg.kind != SegmentKind::ClimbUp {
            target = self.avoid(cx, bot, feet, target, forward);
        }

        if let Some(entity) = self.hindrance {
            let now = cx.tick.time_seconds;
            report.state = FollowerState::Blocked;
            report.hindrance = Some(HindranceReport {
                entity,
                waited: self.hindrance_since.elapsed(now),
                needs_decision: self.wait_timer.is_elapsed(now),
            });
            return report;
        }

        if bot.locomotion.is_on_ground() {
            bot.locomotion.face_towards(target);
        }
        let walk = [bot.actor.last_known_area, Some(seg.area)]
            .into_iter()
            .flatten()
            .filter_map(|id| cx.mesh.area(id))
            .any(|a| a.has_flags(AreaFlags::WALK));
        if walk {
            bot.locomotion.walk();
        } else {
            bot.locomotion.run();
        }
        bot.locomotion.approach(target);
        report.move_target = Some(target);
        report
    }

    // Hand ladder segments to locomotion once the bot stands at the mount point.
    fn ladder_update(&mut self, bot: &mut Bot, feet: Vec3, goal: usize) -> bool {
        let Some(seg) = self.path.segment(goal).copied() else {
            return false;
        };
        let Some(ladder) = seg.ladder else {
            return false;
        };
        if (seg.pos - feet).length_2d() >= LADDER_MOUNT_RANGE {
            return false;
        }
        match seg.kind {
            SegmentKind::LadderUp => bot.locomotion.climb_ladder(ladder, seg.area),
            SegmentKind::LadderDown => bot.locomotion.descend_ladder(ladder, seg.area),
            _ => return false,
        }
        tracing::debug!(ladder = ladder.0, kind = ?seg.kind, "ladder handed to locomotion");
        if self.path.next_segment(goal).is_some() {
            self.goal = Some(goal + 1);
        }
        true
    }

    // Advance the goal when reached. Returns false once the end of the path is reached.
    fn check_progress(&mut self, cx: &FollowContext<'_>, bot: &Bot, feet: Vec3) -> bool {
        let Some(goal) = self.goal else {
            return true;
        };

        let mut skip_to = None;
        if self.config.min_look_ahead > 0.0 {
            let mut candidate = goal;
            while let Some(seg) = self.path.segment(candidate) {
                if !seg.kind.is_ground() || !bot.locomotion.is_on_ground() {
                    break;
                }
                if (seg.pos - feet).length() >= self.config.min_look_ahead {
                    break;
                }
                let Some(next) = self.path.next_segment(candidate) else {
                    break;
                };
                if !next.kind.is_ground() {
                    break;
                }
                // Skipping uphill tends to cut corners the bot cannot climb.
                if next.pos.z > feet.z + bot.profile.step_height {
                    break;
                }
                if cx.world.is_potentially_traversable(feet, next.pos)
                    && !cx.world.has_potential_gap(feet, next.pos)
                {
                    candidate += 1;
                } else {
                    break;
                }
            }
            if candidate != goal {
                skip_to = Some(candidate);
            }
        }

        if self.is_at_goal(cx, bot, feet, goal) {
            let next = skip_to.or_else(|| self.path.next_segment(goal).map(|_| goal + 1));
            match next {
                None => {
                    if bot.locomotion.is_on_ground() {
                        return false;
                    }
                }
                Some(next) => {
                    tracing::trace!(goal = next, "advanced path goal");
                    self.goal = Some(next);
                }
            }
        }
        true
    }

    /// Whether the bot has reached segment `goal`.
    fn is_at_goal(&self, cx: &FollowContext<'_>, bot: &Bot, feet: Vec3, goal: usize) -> bool {
        let Some(seg) = self.path.segment(goal) else {
            return true;
        };
        let Some(current) = self.path.prior_segment(goal) else {
            return true;
        };
        let next = self.path.next_segment(goal);
        let to_goal = seg.pos - feet;
        let step = bot.profile.step_height;

        match seg.kind {
            SegmentKind::DropDown => match next {
                None => true,
                Some(landing) => feet.z - landing.pos.z < step,
            },
            SegmentKind::ClimbUp => match next {
                None => true,
                Some(_) => feet.z > seg.pos.z + step,
            },
            _ => {
                if let Some(next) = next {
                    // The bot may be off the path; passing the plane dividing the segments
                    // before and after the goal also counts.
                    let plane = if current.ladder.is_some() {
                        seg.forward.xy()
                    } else {
                        current.forward.xy() + seg.forward.xy()
                    };
                    if to_goal.xy().dot(plane) < 0.0001
                        && to_goal.z.abs() < bot.profile.stand_hull_height
                        && to_goal.z < step
                        && cx.world.is_potentially_traversable(feet, next.pos)
                        && !cx.world.has_potential_gap(feet, next.pos)
                    {
                        return true;
                    }
                }
                to_goal.length_2d() < self.config.goal_tolerance
            }
        }
    }

    fn climb_or_jump(&mut self, bot: &mut Bot, goal: usize, seg: &Segment, forward: Vec3, goal_range: f32) {
        if bot.locomotion.is_climbing_or_jumping() || !bot.locomotion.is_on_ground() {
            return;
        }

        if seg.kind == SegmentKind::ClimbUp && goal_range < NEAR_LEDGE_RANGE {
            if let Some(top) = self.path.next_segment(goal) {
                if bot.locomotion.climb_up_to_ledge(top.pos, forward) {
                    tracing::debug!(goal, "climbing ledge");
                }
            }
            return;
        }

        let min_gap_jump = 2.0 * bot.profile.hull_width;
        let gap = match self.path.prior_segment(goal) {
            Some(prior) if prior.kind == SegmentKind::JumpOverGap => Some(goal - 1),
            _ if seg.kind == SegmentKind::JumpOverGap && goal_range < min_gap_jump => Some(goal),
            _ => None,
        };
        let Some(gap) = gap else {
            return;
        };
        if let Some(landing) = self.path.next_segment(gap).copied() {
            bot.locomotion.jump_across_gap(landing.pos, landing.forward);
            self.goal = Some(gap + 1);
            tracing::debug!(landing = gap + 1, "jumping gap");
        }
    }

    // The goal is far above the bot and the next segment is no better: it fell off the path.
    fn fell_off_path(&self, cx: &FollowContext<'_>, bot: &Bot, feet: Vec3, goal: usize, seg: &Segment) -> bool {
        let jump = bot.profile.max_jump_height;
        let on_stairs = bot
            .actor
            .last_known_area
            .and_then(|id| cx.mesh.area(id))
            .is_some_and(|a| a.has_flags(AreaFlags::STAIRS));
        if seg.ladder.is_some()
            || bot.locomotion.is_climbing_or_jumping()
            || on_stairs
            || seg.pos.z <= feet.z + jump
        {
            return false;
        }

        let stuck = self.stuck || bot.locomotion.is_stuck();
        if !stuck && (feet - seg.pos).length_2d() >= FELL_OFF_RANGE {
            return false;
        }
        match self.path.next_segment(goal) {
            None => true,
            Some(next) => {
                stuck
                    || next.pos.z - feet.z > jump
                    || !cx.world.is_potentially_traversable(feet, next.pos)
            }
        }
    }

    /// First discontinuity within `range` of the bot along the remaining path; a negative range
    /// scans the whole path. A discontinuity the bot is already on counts, at distance zero.
    pub fn next_discontinuity(&self, feet: Vec3, range: f32) -> Option<Discontinuity> {
        let goal = self.goal?;
        if let Some(current) = self.path.prior_segment(goal) {
            if !current.kind.is_ground() {
                return Some(Discontinuity {
                    kind: current.kind,
                    segment: goal - 1,
                    distance: 0.0,
                });
            }
        }

        let mut so_far = (self.path.segment(goal)?.pos - feet).length();
        for (i, seg) in self.path.segments().iter().enumerate().skip(goal) {
            if range >= 0.0 && so_far >= range {
                break;
            }
            if !seg.kind.is_ground() {
                return Some(Discontinuity {
                    kind: seg.kind,
                    segment: i,
                    distance: so_far,
                });
            }
            so_far += seg.length;
        }
        None
    }

    /// Whether a discontinuity of `kind` lies within `range` ahead.
    pub fn is_discontinuity_ahead(&self, feet: Vec3, kind: SegmentKind, range: f32) -> bool {
        let Some(goal) = self.goal else {
            return false;
        };
        if self.path.prior_segment(goal).is_some_and(|s| s.kind == kind) {
            return true;
        }
        let Some(seg) = self.path.segment(goal) else {
            return false;
        };
        let mut so_far = (seg.pos - feet).length();
        for seg in self.path.segments().iter().skip(goal) {
            if range >= 0.0 && so_far >= range {
                break;
            }
            if seg.kind == kind {
                return true;
            }
            so_far += seg.length;
        }
        false
    }

    // Timer-gated hindrance check and lateral traces. Returns the (possibly adjusted) steering
    // target.
    fn avoid(&mut self, cx: &FollowContext<'_>, bot: &Bot, feet: Vec3, goal_pos: Vec3, forward: Vec3) -> Vec3 {
        let now = cx.tick.time_seconds;
        if !self.avoid_timer.is_elapsed(now) {
            return if self.hindrance.is_some() { feet } else { goal_pos };
        }
        self.avoid_timer.start(now, self.config.avoid_interval);

        if bot.locomotion.is_climbing_or_jumping() || !bot.locomotion.is_on_ground() {
            return goal_pos;
        }
        let precise = bot
            .actor
            .last_known_area
            .and_then(|id| cx.mesh.area(id))
            .is_some_and(|a| a.has_flags(AreaFlags::PRECISE));
        if precise {
            return goal_pos;
        }

        self.traces.checked = true;

        let blocker = self.find_blocker(cx, bot, feet);
        self.track_hindrance(cx, bot, blocker);
        if self.hindrance.is_some() {
            return feet;
        }

        let profile = &bot.profile;
        let size = profile.hull_width / 4.0;
        let offset = size + 2.0;
        let range = if bot.locomotion.is_running() { 50.0 } else { 30.0 };
        let hull = Hull {
            mins: Vec3::new(-size, -size, profile.step_height + 0.1),
            maxs: Vec3::new(size, size, bot.body.hull_height(profile)),
        };
        let left = Vec3::new(-forward.y, forward.x, 0.0);

        let trace_side = |from: Vec3| -> (Vec3, bool, f32) {
            let to = from + forward * range;
            let trace = cx.world.trace_hull(from, to, &hull, Some(bot.actor.handle));
            if trace.is_clear() {
                (to, true, 0.0)
            } else {
                let fraction = if trace.start_solid { 0.0 } else { trace.fraction };
                (to, false, (1.0 - fraction).clamp(0.0, 1.0))
            }
        };

        let left_from = feet + left * offset;
        let (left_to, left_clear, left_avoid) = trace_side(left_from);
        let right_from = feet - left * offset;
        let (right_to, right_clear, right_avoid) = trace_side(right_from);

        self.traces = AvoidTraces {
            checked: true,
            left_from,
            left_to,
            left_clear,
            right_from,
            right_to,
            right_clear,
            hull_min: hull.mins,
            hull_max: hull.maxs,
        };

        if left_clear && right_clear {
            return goal_pos;
        }
        let avoid = if left_clear {
            -right_avoid
        } else if right_clear {
            left_avoid
        } else if (right_avoid - left_avoid).abs() < 0.01 {
            return goal_pos;
        } else if right_avoid > left_avoid {
            -right_avoid
        } else {
            left_avoid
        };

        let steer = (forward * 0.5 - left * avoid).normalized();
        // Keep probing every tick while steering around something.
        self.avoid_timer.invalidate();
        feet + steer * AVOID_STEER_DISTANCE
    }

    fn track_hindrance(&mut self, cx: &FollowContext<'_>, bot: &Bot, blocker: Option<EntityHandle>) {
        let now = cx.tick.time_seconds;
        match blocker {
            None => {
                if let Some(old) = self.hindrance.take() {
                    tracing::debug!(entity = old.index, "hindrance cleared");
                }
                self.wait_timer.invalidate();
            }
            Some(entity) if self.hindrance == Some(entity) => {}
            Some(entity) => {
                let jitter = cx
                    .tick
                    .rng_for_agent(bot.actor.handle, HINDRANCE_RNG_STREAM)
                    .range_f32(0.0, self.config.hindrance_wait_jitter);
                self.hindrance = Some(entity);
                self.hindrance_since.start(now);
                self.wait_timer.start(now, self.config.hindrance_wait + jitter);
                tracing::debug!(entity = entity.index, "hindrance detected");
            }
        }
    }

    // Sweep a small hull along the path ahead looking for an entity the intention cares about.
    fn find_blocker(&self, cx: &FollowContext<'_>, bot: &Bot, feet: Vec3) -> Option<EntityHandle> {
        if bot.intention.is_hindrance(None) != QueryAnswer::Yes {
            return None;
        }

        let profile = &bot.profile;
        let size = profile.hull_width / 4.0;
        let hull = Hull {
            mins: Vec3::new(-size, -size, profile.step_height),
            maxs: Vec3::new(size, size, bot.body.hull_height(profile)),
        };
        let min_trace = 2.0 * profile.hull_width;

        self.path
            .move_cursor_to_closest_position(feet, Seek::EntirePath, 0.0);
        let start = self.path.cursor_data().segment_prior.unwrap_or(0);

        let mut from = feet;
        let mut range = 0.0;
        for seg in self.path.segments().iter().skip(start) {
            if range >= self.config.max_hindrance_range {
                break;
            }
            let (dir, len) = (seg.pos - from).normalize_with_length();
            let to = from + dir * len.max(min_trace);
            let trace = cx.world.trace_hull(from, to, &hull, Some(bot.actor.handle));
            if let Some(hit) = trace.hit {
                let ahead = (hit.origin - feet).dot((seg.pos - from).with_z(0.0)) > 0.0;
                if ahead
                    && self.pushing_through != Some(hit.entity)
                    && bot.intention.is_hindrance(Some(hit.entity)) == QueryAnswer::Yes
                {
                    return Some(hit.entity);
                }
            }
            from = seg.pos;
            range += seg.length;
        }
        None
    }
}
