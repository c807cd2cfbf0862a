//! Error types for the connection engine.

use thiserror::Error;

use crate::block::BlockId;
use crate::connection::ConnectionId;
use crate::manager::GroupId;

/// Reasons a pair of connections cannot be linked.
///
/// These are normal negative answers from the compatibility predicates, not
/// failures of the engine itself.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionError {
    #[error("target connection is missing")]
    TargetNull,

    #[error("cannot connect a block to itself")]
    SelfConnection,

    #[error("connection types are not complementary")]
    WrongType,

    #[error("connection is already linked and must be disconnected first")]
    MustDisconnect,

    #[error("type checks do not intersect")]
    ChecksFailed,

    /// Only shadow blocks may be attached through a shadow link.
    #[error("only a shadow block can be attached as a shadow")]
    CannotSetShadowForTarget,

    /// A non-shadow block cannot be attached below a shadow block.
    #[error("cannot attach a non-shadow block to a shadow block")]
    InferiorBlockShadowMismatch,

    #[error("shadow connection is missing")]
    ShadowNull,
}

/// Misuse of the connection manager's group bookkeeping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    #[error("the default group cannot be deleted")]
    CannotDeleteDefaultGroup,

    #[error("group {0:?} still holds {1} connections")]
    GroupNotEmpty(GroupId, usize),

    #[error("unknown group: {0:?}")]
    UnknownGroup(GroupId),
}

/// Errors raised by workspace level operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("unknown block: {0:?}")]
    UnknownBlock(BlockId),

    #[error("unknown connection: {0:?}")]
    UnknownConnection(ConnectionId),

    #[error("a block cannot have both a previous and an output connection")]
    PreviousAndOutput,

    #[error("linking {0:?} would make a block its own ancestor")]
    WouldCreateCycle(BlockId),

    #[error("block {0:?} is not movable")]
    NotMovable(BlockId),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Manager(#[from] ManagerError),
}

/// Invalid layout configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a finite, non-negative distance (got {value})")]
    InvalidDistance { name: &'static str, value: f64 },
}
