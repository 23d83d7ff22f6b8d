//! Deterministic, engine-agnostic kernel primitives for navigating bots.
//!
//! Everything here is driven by an external per-frame scheduler: a [`TickContext`] carries the
//! simulation clock, timers compare against it, and components are updated in registration
//! order. Nothing in this crate suspends or spawns.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod component;
pub mod entity;
pub mod rng;
pub mod tick;
pub mod timer;

pub use component::{Component, ComponentId, ComponentList};
pub use entity::{AgentId, EntityHandle};
pub use rng::SimRng;
pub use tick::TickContext;
pub use timer::{CountdownTimer, IntervalTimer};
