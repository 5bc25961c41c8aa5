//! Maps GitLab issues onto generic task records and pushes record edits
//! back to GitLab.

pub mod builder;
pub mod connection;
pub mod error;
pub mod handler;
pub mod mapper;
pub mod progress;
pub mod submitter;
mod telemetry;

#[cfg(test)]
mod fake;

pub use builder::{build_task_record, initialize_task_record};
pub use connection::Connection;
pub use error::{ConnectorError, Result};
pub use handler::TaskDataHandler;
pub use mapper::AttributeMapper;
pub use progress::{NullProgress, ProgressMonitor};
pub use submitter::{submit_task_record, RepositoryResponse, ResponseKind};
pub use tasklab_gitlab::AssigneeUpdate;
