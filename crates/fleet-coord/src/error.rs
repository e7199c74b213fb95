use thiserror::Error;

use fleet_core::{AgentId, FleetError, VertexId};

/// Rejections returned by coordinator commands.
///
/// None of these leave the coordinator in a different state than before the
/// call.  Blocked lanes are not an error: see
/// [`Assignment::Waiting`][crate::Assignment::Waiting].
#[derive(Debug, Error)]
pub enum CoordError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("vertex {0} not found in graph")]
    VertexNotFound(VertexId),

    #[error("vertex {vertex} is occupied by {by}")]
    VertexOccupied { vertex: VertexId, by: AgentId },

    #[error("agent {agent} is already at {vertex}")]
    AlreadyAtDestination { agent: AgentId, vertex: VertexId },

    #[error("destination {vertex} is occupied by {by}")]
    DestinationOccupied { vertex: VertexId, by: AgentId },

    #[error("no path from {from} to {to}")]
    NoPath { from: VertexId, to: VertexId },

    #[error("agent {agent} is not at a charger ({vertex})")]
    NotAtCharger { agent: AgentId, vertex: VertexId },

    #[error("agent {0} is already charging")]
    AlreadyCharging(AgentId),

    #[error("agent {0} is moving")]
    InTransit(AgentId),

    #[error(transparent)]
    Config(#[from] FleetError),
}

pub type CoordResult<T> = Result<T, CoordError>;
