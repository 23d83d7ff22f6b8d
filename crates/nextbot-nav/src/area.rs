//! Navigation areas: axis-aligned convex regions with per-corner floor heights.

use core::fmt;

use crate::{LadderId, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense index of an area inside its [`NavMesh`](crate::NavMesh).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct AreaId(pub u32);

impl AreaId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "area #{}", self.0)
    }
}

/// Compass direction of a floor connection. North is `-y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum NavDir {
    North,
    East,
    South,
    West,
}

impl NavDir {
    pub const ALL: [NavDir; 4] = [NavDir::North, NavDir::East, NavDir::South, NavDir::West];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Self {
        match self {
            NavDir::North => NavDir::South,
            NavDir::East => NavDir::West,
            NavDir::South => NavDir::North,
            NavDir::West => NavDir::East,
        }
    }

    pub fn vector(self) -> Vec3 {
        match self {
            NavDir::North => Vec3::new(0.0, -1.0, 0.0),
            NavDir::East => Vec3::new(1.0, 0.0, 0.0),
            NavDir::South => Vec3::new(0.0, 1.0, 0.0),
            NavDir::West => Vec3::new(-1.0, 0.0, 0.0),
        }
    }
}

/// How an area is entered from the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum TraverseKind {
    North,
    East,
    South,
    West,
    LadderUp,
    LadderDown,
    Jump,
    ElevatorUp,
    ElevatorDown,
}

impl TraverseKind {
    /// The floor direction, for walking connections.
    pub fn dir(self) -> Option<NavDir> {
        match self {
            TraverseKind::North => Some(NavDir::North),
            TraverseKind::East => Some(NavDir::East),
            TraverseKind::South => Some(NavDir::South),
            TraverseKind::West => Some(NavDir::West),
            _ => None,
        }
    }

    pub fn is_floor(self) -> bool {
        self.dir().is_some()
    }
}

impl From<NavDir> for TraverseKind {
    fn from(dir: NavDir) -> Self {
        match dir {
            NavDir::North => TraverseKind::North,
            NavDir::East => TraverseKind::East,
            NavDir::South => TraverseKind::South,
            NavDir::West => TraverseKind::West,
        }
    }
}

/// Area attribute bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct AreaFlags(u32);

impl AreaFlags {
    pub const CROUCH: Self = Self(1 << 0);
    pub const JUMP: Self = Self(1 << 1);
    pub const PRECISE: Self = Self(1 << 2);
    pub const NO_JUMP: Self = Self(1 << 3);
    pub const STOP: Self = Self(1 << 4);
    pub const RUN: Self = Self(1 << 5);
    pub const WALK: Self = Self(1 << 6);
    pub const AVOID: Self = Self(1 << 7);
    pub const TRANSIENT: Self = Self(1 << 8);
    pub const STAIRS: Self = Self(1 << 13);
    pub const CLIFF: Self = Self(1 << 15);
    pub const HAS_ELEVATOR: Self = Self(1 << 30);
    pub const NAV_BLOCKER: Self = Self(1 << 31);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl core::ops::BitOr for AreaFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Team affiliation used for per-team area blocking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum Team {
    #[default]
    Any,
    Team(u8),
}

pub(crate) const BLOCK_TEAMS: usize = 2;

impl Team {
    pub(crate) fn slot(self) -> Option<usize> {
        match self {
            Team::Any => None,
            Team::Team(t) => Some(t as usize % BLOCK_TEAMS),
        }
    }
}

/// Floor connection to a neighbor, with the cached center-to-center length.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavConnect {
    pub area: AreaId,
    pub length: f32,
}

/// Shared boundary between two neighboring areas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Portal {
    pub center: Vec3,
    pub half_width: f32,
}

/// How far inside a portal the crossing point stays from a wall.
pub const PORTAL_MARGIN: f32 = 12.5;

#[derive(Debug, Clone)]
pub struct Area {
    pub(crate) id: AreaId,
    pub(crate) nw: Vec3,
    pub(crate) se: Vec3,
    pub(crate) ne_z: f32,
    pub(crate) sw_z: f32,
    pub(crate) center: Vec3,
    pub(crate) flags: AreaFlags,
    pub(crate) connect: [Vec<NavConnect>; 4],
    pub(crate) ladders_up: Vec<LadderId>,
    pub(crate) ladders_down: Vec<LadderId>,
    pub(crate) elevator: Vec<NavConnect>,
    pub(crate) blocked: [bool; BLOCK_TEAMS],
}

impl Area {
    pub(crate) fn new(id: AreaId, nw: Vec3, se: Vec3, ne_z: f32, sw_z: f32) -> Self {
        let mut area = Self {
            id,
            nw,
            se,
            ne_z,
            sw_z,
            center: Vec3::ZERO,
            flags: AreaFlags::empty(),
            connect: Default::default(),
            ladders_up: Vec::new(),
            ladders_down: Vec::new(),
            elevator: Vec::new(),
            blocked: [false; BLOCK_TEAMS],
        };
        let cx = (nw.x + se.x) * 0.5;
        let cy = (nw.y + se.y) * 0.5;
        area.center = Vec3::new(cx, cy, area.z_at(cx, cy));
        area
    }

    pub fn id(&self) -> AreaId {
        self.id
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn nw_corner(&self) -> Vec3 {
        self.nw
    }

    pub fn se_corner(&self) -> Vec3 {
        self.se
    }

    pub fn size_x(&self) -> f32 {
        self.se.x - self.nw.x
    }

    pub fn size_y(&self) -> f32 {
        self.se.y - self.nw.y
    }

    pub fn flags(&self) -> AreaFlags {
        self.flags
    }

    pub fn has_flags(&self, flags: AreaFlags) -> bool {
        self.flags.intersects(flags)
    }

    pub fn adjacent(&self, dir: NavDir) -> &[NavConnect] {
        &self.connect[dir.index()]
    }

    pub fn ladders_up(&self) -> &[LadderId] {
        &self.ladders_up
    }

    pub fn ladders_down(&self) -> &[LadderId] {
        &self.ladders_down
    }

    pub fn elevator_areas(&self) -> &[NavConnect] {
        &self.elevator
    }

    /// An edge has no floor connections leaving through it.
    pub fn is_edge(&self, dir: NavDir) -> bool {
        self.connect[dir.index()].is_empty()
    }

    /// Floor height at `(x, y)`, interpolated bilinearly over the corners and clamped to the
    /// area's extent.
    pub fn z_at(&self, x: f32, y: f32) -> f32 {
        let dx = self.se.x - self.nw.x;
        let dy = self.se.y - self.nw.y;
        if dx <= 0.0 || dy <= 0.0 {
            return self.ne_z;
        }
        let u = ((x - self.nw.x) / dx).clamp(0.0, 1.0);
        let v = ((y - self.nw.y) / dy).clamp(0.0, 1.0);
        let north = self.nw.z + u * (self.ne_z - self.nw.z);
        let south = self.sw_z + u * (self.se.z - self.sw_z);
        north + v * (south - north)
    }

    pub fn z_at_pos(&self, pos: Vec3) -> f32 {
        self.z_at(pos.x, pos.y)
    }

    pub fn contains_xy(&self, pos: Vec3) -> bool {
        pos.x >= self.nw.x && pos.x <= self.se.x && pos.y >= self.nw.y && pos.y <= self.se.y
    }

    /// `pos` lies over this area and not below its floor by more than `tolerance`.
    pub fn contains(&self, pos: Vec3, tolerance: f32) -> bool {
        self.contains_xy(pos) && pos.z >= self.z_at_pos(pos) - tolerance
    }

    pub fn closest_point(&self, pos: Vec3) -> Vec3 {
        let x = pos.x.clamp(self.nw.x, self.se.x);
        let y = pos.y.clamp(self.nw.y, self.se.y);
        Vec3::new(x, y, self.z_at(x, y))
    }

    pub fn is_connected(&self, to: AreaId, dir: NavDir) -> bool {
        self.connect[dir.index()].iter().any(|c| c.area == to)
    }

    /// Direction of the floor connection to `to`, if any.
    pub fn connection_dir(&self, to: AreaId) -> Option<NavDir> {
        NavDir::ALL.into_iter().find(|dir| self.is_connected(to, *dir))
    }

    pub fn is_blocked(&self, team: Team, ignore_nav_blockers: bool) -> bool {
        if ignore_nav_blockers && self.flags.contains(AreaFlags::NAV_BLOCKER) {
            return false;
        }
        match team.slot() {
            Some(slot) => self.blocked[slot],
            None => self.blocked.iter().any(|b| *b),
        }
    }

    /// Portal on this area's `dir` edge, limited to the extent shared with `to`.
    ///
    /// Disjoint or partially overlapping neighbors yield a clamped portal, never a negative width.
    pub fn compute_portal(&self, to: &Area, dir: NavDir) -> Portal {
        let (lo, hi, fixed) = self.shared_span(to, dir);
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let mid = (lo + hi) * 0.5;
        let (x, y) = match dir {
            NavDir::North | NavDir::South => (mid, fixed),
            NavDir::East | NavDir::West => (fixed, mid),
        };
        Portal {
            center: Vec3::new(x, y, self.z_at(x, y)),
            half_width: ((hi - lo) * 0.5).max(0.0),
        }
    }

    /// Point on the shared edge with `to` closest to `from`, kept `margin` away from walls of `to`.
    pub fn closest_point_in_portal(&self, to: &Area, dir: NavDir, from: Vec3, margin: f32) -> Vec3 {
        let (lo, hi, fixed) = self.shared_span(to, dir);
        let (lo_wall, hi_wall, along) = match dir {
            NavDir::North | NavDir::South => (NavDir::West, NavDir::East, from.x),
            NavDir::East | NavDir::West => (NavDir::North, NavDir::South, from.y),
        };
        let mut lo_margin = if to.is_edge(lo_wall) { lo + margin } else { lo };
        let mut hi_margin = if to.is_edge(hi_wall) { hi - margin } else { hi };
        if lo_margin > hi_margin {
            let mid = (lo + hi) * 0.5;
            lo_margin = mid;
            hi_margin = mid;
        }
        let t = along.clamp(lo_margin, hi_margin);
        let (x, y) = match dir {
            NavDir::North | NavDir::South => (t, fixed),
            NavDir::East | NavDir::West => (fixed, t),
        };
        Vec3::new(x, y, self.z_at(x, y))
    }

    /// Floor rise when stepping from this area onto a floor-connected `to`.
    ///
    /// Returns `f32::MAX` when the areas are not floor-connected.
    pub fn adjacent_height_change(&self, to: &Area) -> f32 {
        let Some(dir) = self.connection_dir(to.id) else {
            return f32::MAX;
        };
        let portal = self.compute_portal(to, dir);
        to.closest_point(portal.center).z - portal.center.z
    }

    // Span of the edge in `dir` shared with `to`, clamped to this area's edge, plus the fixed
    // coordinate of that edge.
    fn shared_span(&self, to: &Area, dir: NavDir) -> (f32, f32, f32) {
        match dir {
            NavDir::North | NavDir::South => {
                let fixed = if dir == NavDir::North { self.nw.y } else { self.se.y };
                let lo = self.nw.x.max(to.nw.x).clamp(self.nw.x, self.se.x);
                let hi = self.se.x.min(to.se.x).clamp(self.nw.x, self.se.x);
                (lo, hi, fixed)
            }
            NavDir::East | NavDir::West => {
                let fixed = if dir == NavDir::West { self.nw.x } else { self.se.x };
                let lo = self.nw.y.max(to.nw.y).clamp(self.nw.y, self.se.y);
                let hi = self.se.y.min(to.se.y).clamp(self.nw.y, self.se.y);
                (lo, hi, fixed)
            }
        }
    }
}
