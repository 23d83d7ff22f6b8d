//! The bot capability set: locomotion, body, and intention, plus extra components.
//!
//! Each capability is a trait with no-op defaults. A [`Bot`] holds one boxed instance of each,
//! chosen at construction, and forwards updates and events to all of them in a fixed order.

use nextbot_core::{Component, ComponentId, ComponentList, EntityHandle, TickContext};

use crate::{ActorState, AreaId, LadderId, MoverProfile, NavMesh, Vec3};

/// Why a move along a path was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFailure {
    Stuck,
    FellOff,
    InvalidPath,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BotEvent {
    LeaveGround,
    LandOnGround,
    Stuck,
    UnStuck,
    MoveToSuccess,
    MoveToFailure(MoveFailure),
    NavAreaChanged { from: Option<AreaId>, to: Option<AreaId> },
    Contact(EntityHandle),
}

/// Three-valued answer to a capability query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryAnswer {
    Yes,
    No,
    #[default]
    DontCare,
}

/// Moves the bot's body through the world.
pub trait Locomotion: Component<BotEvent> {
    /// Position of the bot's feet.
    fn feet(&self) -> Vec3;

    /// Move toward `goal` this tick.
    fn approach(&mut self, _goal: Vec3) {}

    /// Move at the profile's run speed from now on.
    fn run(&mut self) {}

    fn walk(&mut self) {}

    /// Drop any pending move and stand still.
    fn stop(&mut self) {}

    fn set_desired_speed(&mut self, _speed: f32) {}

    fn face_towards(&mut self, _target: Vec3) {}

    fn jump_across_gap(&mut self, _landing: Vec3, _forward: Vec3) {}

    /// Start climbing onto a ledge. Returns whether a climb began.
    fn climb_up_to_ledge(&mut self, _landing: Vec3, _forward: Vec3) -> bool {
        false
    }

    fn climb_ladder(&mut self, _ladder: LadderId, _dismount: AreaId) {}

    fn descend_ladder(&mut self, _ladder: LadderId, _dismount: AreaId) {}

    fn is_on_ground(&self) -> bool {
        true
    }

    fn is_climbing_or_jumping(&self) -> bool {
        false
    }

    fn is_using_ladder(&self) -> bool {
        false
    }

    fn is_stuck(&self) -> bool {
        false
    }

    fn clear_stuck_status(&mut self) {}

    fn is_running(&self) -> bool {
        true
    }
}

/// Posture and gaze.
pub trait Body: Component<BotEvent> {
    fn is_crouching(&self) -> bool {
        false
    }

    fn look_at(&mut self, _target: Vec3) {}

    fn hull_height(&self, profile: &MoverProfile) -> f32 {
        if self.is_crouching() {
            profile.crouch_hull_height
        } else {
            profile.stand_hull_height
        }
    }
}

/// Decision making.
pub trait Intention: Component<BotEvent> {
    /// Whether `blocker` should hold up path following. `None` asks whether any entity could.
    fn is_hindrance(&self, _blocker: Option<EntityHandle>) -> QueryAnswer {
        QueryAnswer::DontCare
    }
}

/// Locomotion that only remembers where it was put.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLocomotion {
    pub position: Vec3,
}

impl Component<BotEvent> for NullLocomotion {}

impl Locomotion for NullLocomotion {
    fn feet(&self) -> Vec3 {
        self.position
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullBody;

impl Component<BotEvent> for NullBody {}

impl Body for NullBody {}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullIntention;

impl Component<BotEvent> for NullIntention {}

impl Intention for NullIntention {}

pub struct Bot {
    pub actor: ActorState,
    pub profile: MoverProfile,
    pub locomotion: Box<dyn Locomotion>,
    pub body: Box<dyn Body>,
    pub intention: Box<dyn Intention>,
    components: ComponentList<BotEvent>,
}

impl Bot {
    pub fn new(actor: ActorState, profile: MoverProfile) -> Self {
        Self {
            locomotion: Box::new(NullLocomotion {
                position: actor.position,
            }),
            body: Box::new(NullBody),
            intention: Box::new(NullIntention),
            components: ComponentList::new(),
            actor,
            profile,
        }
    }

    pub fn with_locomotion(mut self, locomotion: Box<dyn Locomotion>) -> Self {
        self.locomotion = locomotion;
        self
    }

    pub fn with_body(mut self, body: Box<dyn Body>) -> Self {
        self.body = body;
        self
    }

    pub fn with_intention(mut self, intention: Box<dyn Intention>) -> Self {
        self.intention = intention;
        self
    }

    pub fn register_component(&mut self, component: Box<dyn Component<BotEvent>>) -> ComponentId {
        self.components.register(component)
    }

    pub fn unregister_component(&mut self, id: ComponentId) -> Option<Box<dyn Component<BotEvent>>> {
        self.components.unregister(id)
    }

    pub fn components(&self) -> &ComponentList<BotEvent> {
        &self.components
    }

    pub fn feet(&self) -> Vec3 {
        self.locomotion.feet()
    }

    /// Update every capability, then extra components in registration order.
    pub fn update(&mut self, ctx: &TickContext) {
        self.locomotion.update(ctx);
        self.body.update(ctx);
        self.intention.update(ctx);
        self.components.update_all(ctx);
        self.actor.position = self.locomotion.feet();
    }

    pub fn dispatch(&mut self, event: BotEvent) {
        tracing::trace!(?event, "bot event");
        self.locomotion.on_event(&event);
        self.body.on_event(&event);
        self.intention.on_event(&event);
        self.components.dispatch(&event);
    }

    pub fn reset(&mut self) {
        self.locomotion.reset();
        self.body.reset();
        self.intention.reset();
        self.components.reset_all();
    }

    /// Re-resolve the area under the bot's feet, dispatching `NavAreaChanged` when it changes.
    /// Off-mesh positions keep the last known area.
    pub fn update_last_known_area(&mut self, mesh: &NavMesh) {
        let Some(area) = mesh.area_at(self.feet()) else {
            return;
        };
        let previous = self.actor.last_known_area;
        if previous != Some(area) {
            self.actor.last_known_area = Some(area);
            self.dispatch(BotEvent::NavAreaChanged {
                from: previous,
                to: Some(area),
            });
        }
    }
}
