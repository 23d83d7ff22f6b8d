//! Simulation-clock timers.
//!
//! Both timers store absolute timestamps and take the current time as an argument, so they are
//! plain `Copy` data and cost nothing while idle.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counts down a duration from the moment it is started.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CountdownTimer {
    expires_at: Option<f32>,
    duration: f32,
}

impl CountdownTimer {
    pub fn start(&mut self, now: f32, duration: f32) {
        self.duration = duration.max(0.0);
        self.expires_at = Some(now + self.duration);
    }

    pub fn invalidate(&mut self) {
        self.expires_at = None;
    }

    pub fn has_started(&self) -> bool {
        self.expires_at.is_some()
    }

    /// An unstarted (or invalidated) timer counts as elapsed.
    pub fn is_elapsed(&self, now: f32) -> bool {
        match self.expires_at {
            Some(at) => now >= at,
            None => true,
        }
    }

    pub fn remaining(&self, now: f32) -> f32 {
        match self.expires_at {
            Some(at) => (at - now).max(0.0),
            None => 0.0,
        }
    }

    pub fn elapsed_time(&self, now: f32) -> f32 {
        match self.expires_at {
            Some(at) => (now - (at - self.duration)).max(0.0),
            None => 0.0,
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}

/// Measures time since it was last started.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntervalTimer {
    started_at: Option<f32>,
}

impl IntervalTimer {
    pub fn start(&mut self, now: f32) {
        self.started_at = Some(now);
    }

    pub fn invalidate(&mut self) {
        self.started_at = None;
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Zero when never started.
    pub fn elapsed(&self, now: f32) -> f32 {
        self.started_at.map_or(0.0, |at| (now - at).max(0.0))
    }
}
