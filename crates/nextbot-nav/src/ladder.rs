use core::fmt;

use crate::{AreaId, NavDir, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct LadderId(pub u32);

impl LadderId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LadderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ladder #{}", self.0)
    }
}

/// Areas reachable from the top of a ladder, relative to its facing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct LadderTop {
    pub forward: Option<AreaId>,
    pub left: Option<AreaId>,
    pub right: Option<AreaId>,
    pub behind: Option<AreaId>,
}

impl LadderTop {
    /// Areas a climber can step onto when ascending. The area behind is excluded.
    pub fn ascend_targets(&self) -> impl Iterator<Item = AreaId> {
        [self.forward, self.left, self.right].into_iter().flatten()
    }

    pub fn all(&self) -> impl Iterator<Item = AreaId> {
        [self.forward, self.left, self.right, self.behind]
            .into_iter()
            .flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ladder {
    pub(crate) id: LadderId,
    pub(crate) top: Vec3,
    pub(crate) bottom: Vec3,
    pub(crate) width: f32,
    pub(crate) dir: NavDir,
    pub(crate) top_areas: LadderTop,
    pub(crate) bottom_area: Option<AreaId>,
}

impl Ladder {
    pub fn id(&self) -> LadderId {
        self.id
    }

    pub fn top(&self) -> Vec3 {
        self.top
    }

    pub fn bottom(&self) -> Vec3 {
        self.bottom
    }

    pub fn length(&self) -> f32 {
        (self.top.z - self.bottom.z).abs()
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn dir(&self) -> NavDir {
        self.dir
    }

    /// Unit vector pointing off the climbing surface, toward the climber.
    pub fn normal(&self) -> Vec3 {
        self.dir.vector()
    }

    pub fn top_areas(&self) -> &LadderTop {
        &self.top_areas
    }

    pub fn bottom_area(&self) -> Option<AreaId> {
        self.bottom_area
    }

    pub fn leads_up_to(&self, area: AreaId) -> bool {
        self.top_areas.ascend_targets().any(|a| a == area)
    }
}
