use crate::database::{Frame, Position, ResumeError};
use bytes::Bytes;

/// Request to stream one database's frames after `resume`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamRequest {
    pub database: String,
    pub resume: Position,
    /// Ask for a full snapshot instead of resuming incrementally.
    pub resync: bool,
    pub client_hostname: String,
}

/// The position a replica has applied for one database. History after it stays retained on
/// the primary for as long as the replica's session is protected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Acknowledgement {
    pub database: String,
    pub client_hostname: String,
    pub applied: Position,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreamMessage {
    Frame(Frame),
    /// Full image of the database as of `position`. Frames after it follow.
    Snapshot { position: Position, image: Bytes },
    /// The primary is shutting down cleanly.
    End,
    Error(StreamErrorCode),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DatabaseInfo {
    pub name: String,
    pub position: Position,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CatalogMessage {
    /// Every database the primary knows about, with its position at the time of sending.
    Databases(Vec<DatabaseInfo>),
    Error(StreamErrorCode),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum StreamErrorCode {
    #[error("position too old")]
    PositionTooOld,
    #[error("unknown database")]
    UnknownDatabase,
    #[error("not primary")]
    NotPrimary,
    #[error("desync")]
    Desync,
    #[error("resync unavailable")]
    ResyncUnavailable,
}

impl From<&ResumeError> for StreamErrorCode {
    fn from(e: &ResumeError) -> Self {
        match e {
            ResumeError::PositionTooOld { .. } => StreamErrorCode::PositionTooOld,
            ResumeError::Desync { .. } => StreamErrorCode::Desync,
        }
    }
}
