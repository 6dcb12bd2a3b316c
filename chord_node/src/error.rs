//! The closed error taxonomy surfaced by ring operations.

use thiserror::Error;
use tonic::{Code, Status};

#[derive(Debug, Error, Clone)]
pub enum ChordError {
    /// Queried state absent (predecessor unset, id not resolvable).
    #[error("not found")]
    NotFound,

    /// Finger table not yet fully initialised.
    #[error("stabilize not completed")]
    StabilizeNotCompleted,

    /// Every entry in the successor list failed `ping`.
    #[error("no successor alive")]
    NoSuccessorAlive,

    /// Target node is shutting down or unreachable.
    #[error("node unavailable")]
    NodeUnavailable,

    /// Dial or RPC failure outside the above.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<Status> for ChordError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::Unavailable => ChordError::NodeUnavailable,
            // Only `closest_preceding_node` should surface `NotFound` as
            // `StabilizeNotCompleted`; callers that need the distinction
            // use `ChordError::from_closest_preceding_status` instead.
            Code::NotFound => ChordError::NotFound,
            _ => ChordError::Transport(status.message().to_string()),
        }
    }
}

impl ChordError {
    /// `closest_preceding_node`'s RPC maps `NotFound` to
    /// `StabilizeNotCompleted`, unlike every other verb.
    pub fn from_closest_preceding_status(status: Status) -> Self {
        match status.code() {
            Code::NotFound => ChordError::StabilizeNotCompleted,
            other => ChordError::from(Status::new(other, status.message())),
        }
    }
}

impl From<tonic::transport::Error> for ChordError {
    fn from(err: tonic::transport::Error) -> Self {
        ChordError::Transport(err.to_string())
    }
}

impl From<ChordError> for Status {
    fn from(err: ChordError) -> Self {
        match err {
            ChordError::NotFound => Status::not_found(err.to_string()),
            ChordError::StabilizeNotCompleted => Status::not_found(err.to_string()),
            ChordError::NoSuccessorAlive => Status::unavailable(err.to_string()),
            ChordError::NodeUnavailable => Status::unavailable(err.to_string()),
            ChordError::Transport(msg) => Status::internal(msg),
        }
    }
}
