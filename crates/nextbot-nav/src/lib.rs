//! Navigation-mesh pathfinding and path following for bots.
//!
//! A [`NavMesh`] is a graph of axis-aligned areas joined by floor connections, ladders and
//! elevators. [`SearchScratch::search`] runs A* over it under a caller-supplied
//! [`CostEvaluator`]; [`Path::compute`] turns the resulting area chain into a geometric route
//! and [`PathFollower`] steers a [`Bot`] along it every tick.
//!
//! The host engine stays behind [`TraversalQuery`] (hull traces and walkability checks) and the
//! bot capability traits in [`bot`]; nothing here owns a world.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod area;
pub mod bot;
pub mod config;
pub mod cost;
pub mod error;
pub mod follower;
pub mod ladder;
pub mod math;
pub mod mesh;
pub mod path;
pub mod search;
pub mod world;

pub use area::{Area, AreaFlags, AreaId, NavConnect, NavDir, Portal, Team, TraverseKind, PORTAL_MARGIN};
pub use bot::{
    Body, Bot, BotEvent, Intention, Locomotion, MoveFailure, NullBody, NullIntention, NullLocomotion,
    QueryAnswer,
};
pub use config::{FollowerConfig, MoverProfile, NavSettings, PathConfig, MAX_PATH_SEGMENTS};
pub use cost::{CostEdge, CostEvaluator, ShortestPathCost};
pub use error::{GeometryError, MeshError, PathError, Result};
pub use follower::{
    AvoidTraces, Discontinuity, FollowContext, FollowReport, FollowerState, HindranceDecision,
    HindranceReport, PathFollower,
};
pub use ladder::{Ladder, LadderId, LadderTop};
pub use math::{Vec2, Vec3};
pub use mesh::{
    Adjacent, AreaDesc, ConnectDesc, LadderDesc, NavMesh, NavMeshBuilder, NavMeshDesc, FLOOR_TOLERANCE,
};
pub use path::{
    ComputeOptions, CursorData, CursorMove, Path, PathContext, PathGoal, PathOutcome, Seek, Segment,
    SegmentKind,
};
pub use search::{GoalSelector, SearchRequest, SearchResult, SearchScratch};
pub use world::{ActorState, Hull, HullTrace, MeshTraversal, OpenWorld, TraceHit, TraversalQuery};
