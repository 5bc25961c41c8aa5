use chrono::{DateTime, Utc};
use tasklab_domain::{
    actions_for, define_fields, derive_priority, derive_type, join_labels, CommentRecord,
    IssueAction, IssueState, TaskField, TaskRecord,
};
use tasklab_gitlab::{Issue, Note};

use crate::connection::Connection;

/// Builds the task record for a downloaded issue and its notes.
pub fn build_task_record(issue: &Issue, connection: &Connection, notes: Vec<Note>) -> TaskRecord {
    build_task_record_at(issue, connection, notes, Utc::now())
}

pub(crate) fn build_task_record_at(
    issue: &Issue,
    connection: &Connection,
    mut notes: Vec<Note>,
    now: DateTime<Utc>,
) -> TaskRecord {
    let mut record = TaskRecord::existing(&connection.repository_url, issue.iid.to_string());
    define_fields(&mut record, true, now);

    let labels = join_labels(&issue.labels);

    record.set_value(TaskField::Author, &issue.author.name);
    record.set_value(
        TaskField::Body,
        issue.description.as_deref().unwrap_or_default(),
    );
    record.set_value(TaskField::Project, &connection.project.name);
    record.set_value(TaskField::Status, &issue.state);
    record.set_value(TaskField::Title, &issue.title);
    record.set_value(TaskField::Iid, issue.iid.to_string());
    record.set_value(TaskField::Priority, derive_priority(&labels).as_str());
    record.set_value(TaskField::Type, derive_type(&labels));
    record.set_value(TaskField::Labels, labels);

    if let Some(created_at) = issue.created_at {
        record.set_date(TaskField::Created, created_at);
    }
    if let Some(updated_at) = issue.updated_at {
        record.set_date(TaskField::Updated, updated_at);
    }

    let state = IssueState::from_remote(&issue.state);
    // GitLab's closed_at is not read; the last update stands in for it.
    if state == IssueState::Closed {
        if let Some(updated_at) = issue.updated_at {
            record.set_date(TaskField::Completed, updated_at);
        }
    }

    if let Some(milestone) = &issue.milestone {
        record.set_value(TaskField::Milestone, &milestone.title);
    }
    if let Some(assignee) = &issue.assignee {
        record.set_value(TaskField::Assignee, &assignee.name);
    }

    notes.sort_by_key(|note| note.created_at);
    for (index, note) in notes.into_iter().enumerate() {
        record.push_comment(CommentRecord {
            number: index + 1,
            author: note.author.name,
            created: note.created_at,
            text: note.body,
        });
    }

    let actions = actions_for(state);
    record.set_operations(actions);
    record.set_value(TaskField::Operation, IssueAction::Leave.label());

    record
}

/// A blank record for an issue about to be created in the connected project.
pub fn initialize_task_record(connection: &Connection) -> TaskRecord {
    initialize_task_record_at(connection, Utc::now())
}

pub(crate) fn initialize_task_record_at(connection: &Connection, now: DateTime<Utc>) -> TaskRecord {
    let mut record = TaskRecord::new_task(&connection.repository_url);
    define_fields(&mut record, false, now);

    record.set_value(TaskField::Project, &connection.project.name);
    record.set_value(TaskField::Labels, "");
    record.set_value(TaskField::Status, IssueState::Open.as_remote());
    record.set_value(TaskField::Milestone, "");

    record
}
