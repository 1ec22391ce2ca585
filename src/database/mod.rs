mod database;
mod frame_log;
mod position;
mod registry;

pub use position::Frame;
pub use position::Position;

pub(crate) use database::ApplyError;
pub(crate) use database::ApplyOutcome;
pub(crate) use database::Database;
pub(crate) use database::PruneReport;
pub(crate) use database::ResumeError;
pub(crate) use database::RetentionPolicy;
pub(crate) use database::SessionId;
pub(crate) use registry::DatabaseRegistry;
