use core::fmt::Debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable identifier for an agent.
///
/// Deterministic simulation requires:
/// - stable ordering (`Ord`)
/// - a stable numeric ID (`stable_id`) for seeding and logs
pub trait AgentId: Copy + Ord + Eq + Debug {
    fn stable_id(self) -> u64;
}

impl AgentId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl AgentId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

/// Weak reference to a world entity.
///
/// The host reuses entity slots; `serial` is bumped every time a slot is recycled, so a handle
/// captured before the recycle no longer compares equal to the new occupant. Holding a handle
/// never keeps the entity alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityHandle {
    pub index: u32,
    pub serial: u32,
}

impl EntityHandle {
    pub const fn new(index: u32, serial: u32) -> Self {
        Self { index, serial }
    }

    /// Handle for the same slot after the host recycled it.
    pub fn recycled(self) -> Self {
        Self {
            index: self.index,
            serial: self.serial.wrapping_add(1),
        }
    }
}

impl AgentId for EntityHandle {
    fn stable_id(self) -> u64 {
        ((self.serial as u64) << 32) | self.index as u64
    }
}
