//! Collaborator interfaces toward the host world.

use nextbot_core::EntityHandle;

use crate::{AreaId, NavMesh, Team, Vec3};

/// Axis-aligned box relative to a trace position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hull {
    pub mins: Vec3,
    pub maxs: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    pub entity: EntityHandle,
    pub origin: Vec3,
}

/// Result of sweeping a [`Hull`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullTrace {
    /// Fraction of the sweep completed before hitting something; 1.0 when clear.
    pub fraction: f32,
    pub start_solid: bool,
    /// The entity hit, when the obstruction is an entity rather than world geometry.
    pub hit: Option<TraceHit>,
}

impl HullTrace {
    pub const CLEAR: Self = Self {
        fraction: 1.0,
        start_solid: false,
        hit: None,
    };

    pub fn is_clear(&self) -> bool {
        self.fraction >= 1.0 && !self.start_solid
    }
}

/// Geometric queries answered by the host world.
///
/// Every method has a permissive default, so a host can start with an empty implementation.
pub trait TraversalQuery {
    /// Whether a mover could plausibly walk straight from `from` to `to`.
    fn is_potentially_traversable(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }

    /// Whether the floor drops away somewhere between `from` and `to`.
    fn has_potential_gap(&self, _from: Vec3, _to: Vec3) -> bool {
        false
    }

    /// Sweep `hull` from `from` to `to`, ignoring `ignore`.
    fn trace_hull(&self, _from: Vec3, _to: Vec3, _hull: &Hull, _ignore: Option<EntityHandle>) -> HullTrace {
        HullTrace::CLEAR
    }
}

/// A world with no obstacles beyond the mesh itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenWorld;

impl TraversalQuery for OpenWorld {}

/// Answers traversal queries from the mesh alone: a straight move is traversable when it stays
/// over walkable areas and arrives on the floor of its target, and a gap is any step down
/// deeper than `step_height`.
#[derive(Debug, Clone, Copy)]
pub struct MeshTraversal<'a> {
    pub mesh: &'a NavMesh,
    pub step_height: f32,
}

const GAP_SAMPLE_SPACING: f32 = 10.0;

impl<'a> MeshTraversal<'a> {
    pub fn new(mesh: &'a NavMesh, step_height: f32) -> Self {
        Self { mesh, step_height }
    }

    fn covered_fraction(&self, from: Vec3, to: Vec3) -> f32 {
        let mut spans: Vec<(f32, f32)> = self
            .mesh
            .areas()
            .iter()
            .filter_map(|a| clip_to_rect(from, to, a.nw_corner(), a.se_corner()))
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut reach = 0.0_f32;
        for (t0, t1) in spans {
            if t0 > reach + 1e-4 {
                break;
            }
            reach = reach.max(t1);
        }
        reach
    }
}

impl TraversalQuery for MeshTraversal<'_> {
    fn is_potentially_traversable(&self, from: Vec3, to: Vec3) -> bool {
        if self.covered_fraction(from, to) < 1.0 - 1e-4 {
            return false;
        }
        // Follow the floor from `from`; it must end within a step of `to`, so stacked floors
        // never count as walkable into each other.
        let len = from.xy().distance(to.xy());
        let steps = (len / GAP_SAMPLE_SPACING).ceil().max(1.0) as usize;
        let mut floor = self.mesh.ground_height(from).unwrap_or(from.z);
        for i in 1..=steps {
            let p = from.lerp(to, i as f32 / steps as f32);
            match self.mesh.ground_height(p.with_z(floor)) {
                Some(z) => floor = z,
                None => return false,
            }
        }
        (to.z - floor).abs() <= self.step_height
    }

    fn has_potential_gap(&self, from: Vec3, to: Vec3) -> bool {
        let len = from.xy().distance(to.xy());
        let steps = (len / GAP_SAMPLE_SPACING).ceil().max(1.0) as usize;
        let mut prev = self.mesh.ground_height(from);
        for i in 1..=steps {
            let p = from.lerp(to, i as f32 / steps as f32);
            let sample = p.with_z(prev.unwrap_or(p.z));
            let ground = self.mesh.ground_height(sample);
            match (prev, ground) {
                (Some(a), Some(b)) if a - b > self.step_height => return true,
                (Some(_), None) => return true,
                _ => {}
            }
            prev = ground;
        }
        false
    }
}

// Parametric interval of the 2D segment `from..to` inside the rectangle, if any.
fn clip_to_rect(from: Vec3, to: Vec3, nw: Vec3, se: Vec3) -> Option<(f32, f32)> {
    let d = to - from;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;
    for (p, q) in [
        (-d.x, from.x - nw.x),
        (d.x, se.x - from.x),
        (-d.y, from.y - nw.y),
        (d.y, se.y - from.y),
    ] {
        if p.abs() <= f32::EPSILON {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Snapshot of an actor as the entity provider sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorState {
    pub handle: EntityHandle,
    pub position: Vec3,
    pub last_known_area: Option<AreaId>,
    pub team: Team,
}

impl ActorState {
    pub fn new(handle: EntityHandle, position: Vec3) -> Self {
        Self {
            handle,
            position,
            last_known_area: None,
            team: Team::Any,
        }
    }

    /// Same actor with `last_known_area` resolved from the mesh.
    pub fn located(mut self, mesh: &NavMesh) -> Self {
        self.last_known_area = mesh.area_at(self.position);
        self
    }
}
