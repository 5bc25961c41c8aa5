//! Tool-agnostic task model for GitLab issues: the field schema, label
//! heuristics, and the table of state transitions.

pub mod actions;
pub mod labels;
pub mod record;
pub mod schema;

pub use actions::{actions_for, IssueAction, IssueState, UnknownActionError};
pub use labels::{derive_priority, derive_type, join_labels, PriorityLevel};
pub use record::{define_fields, CommentRecord, TaskAttribute, TaskRecord};
pub use schema::{FieldKind, FieldSection, FieldSpec, TaskField};
