//! Tuning for path building, movement, and path following.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hard upper bound on segments in one path.
pub const MAX_PATH_SEGMENTS: usize = 256;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PathConfig {
    /// Collapse redundant segments after building.
    pub optimize: bool,
    /// Segment capacity, clamped to [`MAX_PATH_SEGMENTS`].
    pub max_segments: usize,
    /// How far from a goal position its area may be.
    pub goal_area_search_radius: f32,
    /// How far past a portal each crossing point is placed.
    pub step_in_distance: f32,
    /// Clearance kept from walls when crossing a portal.
    pub portal_margin: f32,
    /// Horizontal separation above which consecutive areas are jumped, not walked.
    pub gap_separation_tolerance: f32,
    /// Stand-off from a ladder's surface at its mount points.
    pub ladder_offset: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            max_segments: MAX_PATH_SEGMENTS,
            goal_area_search_radius: 200.0,
            step_in_distance: 5.0,
            portal_margin: crate::area::PORTAL_MARGIN,
            gap_separation_tolerance: 47.5,
            ladder_offset: 32.0,
        }
    }
}

impl PathConfig {
    pub fn capacity(&self) -> usize {
        self.max_segments.clamp(2, MAX_PATH_SEGMENTS)
    }
}

/// Locomotion and body dimensions of one kind of bot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct MoverProfile {
    pub step_height: f32,
    pub max_jump_height: f32,
    pub death_drop_height: f32,
    pub run_speed: f32,
    pub walk_speed: f32,
    pub max_acceleration: f32,
    pub max_deceleration: f32,
    pub hull_width: f32,
    pub stand_hull_height: f32,
    pub crouch_hull_height: f32,
}

impl Default for MoverProfile {
    fn default() -> Self {
        Self {
            step_height: 18.0,
            max_jump_height: 180.0,
            death_drop_height: 200.0,
            run_speed: 150.0,
            walk_speed: 75.0,
            max_acceleration: 500.0,
            max_deceleration: 500.0,
            hull_width: 26.0,
            stand_hull_height: 72.0,
            crouch_hull_height: 36.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct FollowerConfig {
    /// Horizontal distance at which a segment goal counts as reached.
    pub goal_tolerance: f32,
    /// Goals closer than this are skipped when the next one is directly reachable. 0 disables.
    pub min_look_ahead: f32,
    /// Seconds between avoidance traces.
    pub avoid_interval: f32,
    /// Seconds to wait on a hindrance before asking for a decision.
    pub hindrance_wait: f32,
    /// Upper bound of the random extra wait added per hindrance.
    pub hindrance_wait_jitter: f32,
    /// How far ahead to report discontinuities. Negative scans the whole remaining path.
    pub discontinuity_scan_range: f32,
    /// How far along the path to look for blockers.
    pub max_hindrance_range: f32,
    /// Trust the mesh's segment kinds; when false the world is also checked for unmarked gaps.
    pub authoritative_mesh: bool,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            goal_tolerance: 25.0,
            min_look_ahead: 0.0,
            avoid_interval: 0.5,
            hindrance_wait: 1.0,
            hindrance_wait_jitter: 0.5,
            discontinuity_scan_range: -1.0,
            max_hindrance_range: 750.0,
            authoritative_mesh: false,
        }
    }
}

/// Everything a host needs to configure navigation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct NavSettings {
    pub path: PathConfig,
    pub mover: MoverProfile,
    pub follower: FollowerConfig,
}
