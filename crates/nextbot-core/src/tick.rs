use crate::{AgentId, SimRng};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-frame scheduling context handed to every update.
///
/// `time_seconds` is the absolute simulation clock; timers and path ages are measured against it,
/// never against wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
    pub time_seconds: f32,
    pub seed: u64,
}

impl TickContext {
    pub fn new(dt_seconds: f32, seed: u64) -> Self {
        Self {
            tick: 0,
            dt_seconds,
            time_seconds: 0.0,
            seed,
        }
    }

    /// Context for the following frame.
    pub fn next(&self) -> Self {
        Self {
            tick: self.tick + 1,
            dt_seconds: self.dt_seconds,
            time_seconds: self.time_seconds + self.dt_seconds.max(0.0),
            seed: self.seed,
        }
    }

    /// RNG stream private to `agent` for this tick.
    ///
    /// The same `(seed, tick, agent, stream)` always produces the same sequence.
    pub fn rng_for_agent<A: AgentId>(&self, agent: A, stream: u64) -> SimRng {
        SimRng::for_stream(self.seed ^ self.tick, agent.stable_id(), stream)
    }
}
