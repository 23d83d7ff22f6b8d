//! Headless follow simulation: a bot with straight-line locomotion walks a computed path.

use std::rc::Rc;

use nextbot_core::{Component, EntityHandle, TickContext};
use nextbot_nav::{
    ActorState, AreaId, Bot, BotEvent, FollowContext, FollowerState, HindranceDecision, LadderId,
    Locomotion, MeshTraversal, MoverProfile, NavMesh, NavSettings, PathFollower, Vec3,
};

/// What the locomotion is doing besides walking.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Transit {
    Ladder(Vec3),
    Airborne(Vec3),
}

/// Walks at a fixed speed toward the last requested point and drops straight onto the floor
/// below its feet. Collision is ignored. Ladders and jumps are flown in a straight line to
/// their far end.
#[derive(Debug, Clone)]
pub struct SimpleLocomotion {
    mesh: Rc<NavMesh>,
    position: Vec3,
    target: Option<Vec3>,
    transit: Option<Transit>,
    speed: f32,
    run_speed: f32,
    walk_speed: f32,
}

impl SimpleLocomotion {
    pub fn new(mesh: Rc<NavMesh>, position: Vec3, profile: &MoverProfile) -> Self {
        Self {
            mesh,
            position,
            target: None,
            transit: None,
            speed: profile.run_speed,
            run_speed: profile.run_speed,
            walk_speed: profile.walk_speed,
        }
    }

    // Where a climb ends: on the dismount area next to the ladder end, or the end itself.
    fn ladder_exit(&self, ladder: LadderId, dismount: AreaId, up: bool) -> Option<Vec3> {
        let ladder = self.mesh.ladder(ladder)?;
        let end = if up { ladder.top() } else { ladder.bottom() };
        Some(self.mesh.area(dismount).map_or(end, |a| a.closest_point(end)))
    }

    fn settle(&mut self) {
        if let Some(z) = self.mesh.ground_height(self.position) {
            self.position = self.position.with_z(z);
        }
    }
}

impl Component<BotEvent> for SimpleLocomotion {
    fn reset(&mut self) {
        self.target = None;
        self.transit = None;
    }

    fn update(&mut self, ctx: &TickContext) {
        let step = self.speed * ctx.dt_seconds;
        if let Some(Transit::Ladder(end) | Transit::Airborne(end)) = self.transit {
            let (dir, range) = (end - self.position).normalize_with_length();
            if range <= step {
                self.position = end;
                self.transit = None;
            } else {
                self.position += dir * step;
            }
            return;
        }

        if let Some(goal) = self.target.take() {
            let (dir, range) = (goal - self.position).with_z(0.0).normalize_with_length();
            self.position += dir * range.min(step);
        }
        self.settle();
    }
}

impl Locomotion for SimpleLocomotion {
    fn feet(&self) -> Vec3 {
        self.position
    }

    fn approach(&mut self, goal: Vec3) {
        self.target = Some(goal);
    }

    fn run(&mut self) {
        self.set_desired_speed(self.run_speed);
    }

    fn walk(&mut self) {
        self.set_desired_speed(self.walk_speed);
    }

    fn stop(&mut self) {
        self.target = None;
    }

    fn set_desired_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn jump_across_gap(&mut self, landing: Vec3, _forward: Vec3) {
        self.transit = Some(Transit::Airborne(landing));
    }

    fn climb_up_to_ledge(&mut self, landing: Vec3, _forward: Vec3) -> bool {
        self.transit = Some(Transit::Airborne(landing));
        true
    }

    fn climb_ladder(&mut self, ladder: LadderId, dismount: AreaId) {
        self.transit = self.ladder_exit(ladder, dismount, true).map(Transit::Ladder);
    }

    fn descend_ladder(&mut self, ladder: LadderId, dismount: AreaId) {
        self.transit = self.ladder_exit(ladder, dismount, false).map(Transit::Ladder);
    }

    fn is_climbing_or_jumping(&self) -> bool {
        matches!(self.transit, Some(Transit::Airborne(_)))
    }

    fn is_using_ladder(&self) -> bool {
        matches!(self.transit, Some(Transit::Ladder(_)))
    }

    fn is_running(&self) -> bool {
        self.speed >= self.run_speed
    }
}

/// How a simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEnd {
    Arrived,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimSummary {
    pub end: SimEnd,
    pub ticks: u64,
    pub time_seconds: f32,
    pub distance_travelled: f32,
    pub final_position: Vec3,
}

pub struct SimSetup<'a> {
    pub mesh: &'a NavMesh,
    pub settings: &'a NavSettings,
    pub from: Vec3,
    pub dt_seconds: f32,
    pub seed: u64,
    pub max_ticks: u64,
}

/// Build a bot standing at `setup.from` driven by [`SimpleLocomotion`].
pub fn spawn_bot(setup: &SimSetup<'_>) -> Bot {
    let actor = ActorState::new(EntityHandle::new(1, 0), setup.from).located(setup.mesh);
    let mesh = Rc::new(setup.mesh.clone());
    let locomotion = SimpleLocomotion::new(mesh, setup.from, &setup.settings.mover);
    Bot::new(actor, setup.settings.mover.clone()).with_locomotion(Box::new(locomotion))
}

/// Tick `bot` along the follower's path until it arrives, fails, or runs out of ticks.
pub fn run(setup: &SimSetup<'_>, follower: &mut PathFollower, bot: &mut Bot) -> SimSummary {
    let world = MeshTraversal::new(setup.mesh, setup.settings.mover.step_height);
    let mut tick = TickContext::new(setup.dt_seconds, setup.seed);
    let mut travelled = 0.0;

    let end = loop {
        if tick.tick >= setup.max_ticks {
            break SimEnd::TimedOut;
        }
        tick = tick.next();

        let before = bot.feet();
        bot.update(&tick);
        travelled += before.distance(bot.feet());
        bot.update_last_known_area(setup.mesh);

        let cx = FollowContext {
            tick,
            mesh: setup.mesh,
            world: &world,
        };
        let report = follower.update(&cx, bot);
        if let Some(hindrance) = report.hindrance {
            if hindrance.needs_decision {
                follower.resolve_hindrance(HindranceDecision::PushThrough, tick.time_seconds);
            }
        }
        tracing::trace!(tick = tick.tick, state = ?report.state, goal = ?report.goal, "follow tick");

        match report.state {
            FollowerState::Arrived => break SimEnd::Arrived,
            FollowerState::NoGoal => break SimEnd::Failed,
            FollowerState::Seeking | FollowerState::Blocked => {}
        }
    };

    SimSummary {
        end,
        ticks: tick.tick,
        time_seconds: tick.time_seconds,
        distance_travelled: travelled,
        final_position: bot.feet(),
    }
}
