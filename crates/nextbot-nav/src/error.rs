use thiserror::Error;

use crate::AreaId;

/// Invalid mesh description.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("{0} does not exist")]
    UnknownArea(AreaId),

    #[error("{0} has an empty or inverted extent")]
    DegenerateArea(AreaId),

    #[error("{0} is connected to itself")]
    SelfConnection(AreaId),

    #[error("ladder has no areas at either end")]
    DanglingLadder,
}

/// Failure while turning a search result into segment geometry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("path references {0}, which is not in the mesh")]
    UnknownArea(AreaId),

    #[error("connection from {from} to {to} no longer exists")]
    SeveredConnection { from: AreaId, to: AreaId },

    #[error("no ladder leads {} from {from} to {to}", ladder_dir(.up))]
    MissingLadder { from: AreaId, to: AreaId, up: bool },

    #[error("path segment capacity exceeded")]
    CapacityExceeded,
}

/// Why a path could not be computed. The path is always left invalid.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    #[error("agent is not on the navigation mesh")]
    NoStartArea,

    #[error("goal is not on the navigation mesh")]
    NoGoalArea,

    #[error("cost evaluator forbids the start area")]
    StartForbidden,

    #[error("goal is unreachable from the start area")]
    Unreachable,

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

fn ladder_dir(up: &bool) -> &'static str {
    if *up {
        "up"
    } else {
        "down"
    }
}

pub type Result<T> = core::result::Result<T, PathError>;
