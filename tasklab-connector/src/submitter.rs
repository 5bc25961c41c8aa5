use std::collections::HashSet;

use tasklab_domain::{IssueAction, TaskField, TaskRecord};
use tasklab_gitlab::{AssigneeUpdate, GitlabApi, IssueEdit, NewIssue};

use crate::{
    connection::Connection,
    error::{ConnectorError, Result},
    mapper::AttributeMapper,
    progress::ProgressMonitor,
    telemetry::timed,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseKind {
    TaskCreated,
    TaskUpdated,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositoryResponse {
    pub kind: ResponseKind,
    pub task_id: String,
}

/// Pushes a locally edited record to GitLab, creating the issue when the
/// record is new.
///
/// `changed` holds the fields the user edited in this round; the assignee is
/// only written when it is among them.
pub fn submit_task_record<A: GitlabApi + ?Sized>(
    api: &A,
    connection: &Connection,
    record: &TaskRecord,
    changed: &HashSet<TaskField>,
    monitor: &mut dyn ProgressMonitor,
) -> Result<RepositoryResponse> {
    let mapper = &connection.mapper;
    let assignee = resolve_assignee(mapper, record, changed);
    let milestone_id = mapper
        .find_milestone_by_name(record.text(TaskField::Milestone))
        .map(|milestone| milestone.id);

    let title = record.text(TaskField::Title).to_string();
    let description = record.text(TaskField::Body).to_string();
    let labels = record.text(TaskField::Labels).to_string();
    let project_id = connection.project.id;

    let Some(task_id) = record.task_id() else {
        let issue = NewIssue {
            title,
            description,
            labels,
            assignee,
            milestone_id,
        };
        monitor.begin_task("Uploading task");
        let created = timed("issue.create", None, || api.create_issue(project_id, &issue));
        monitor.done();
        let created = created.map_err(|error| ConnectorError::remote("creating issue", error))?;

        return Ok(RepositoryResponse {
            kind: ResponseKind::TaskCreated,
            task_id: created.iid.to_string(),
        });
    };

    let iid = parse_task_id(task_id)?;
    let action = selected_action(record)?;
    let edit = IssueEdit {
        title,
        description,
        labels,
        assignee,
        milestone_id,
        state_event: action.state_event(),
    };

    monitor.begin_task("Uploading task");
    let result = post_edit(api, project_id, iid, record, &edit);
    monitor.done();
    let updated = result?;

    Ok(RepositoryResponse {
        kind: ResponseKind::TaskUpdated,
        task_id: updated.to_string(),
    })
}

fn post_edit<A: GitlabApi + ?Sized>(
    api: &A,
    project_id: u64,
    iid: u64,
    record: &TaskRecord,
    edit: &IssueEdit,
) -> Result<u64> {
    let comment = record.text(TaskField::NewComment);
    if !comment.is_empty() {
        timed("note.create", Some(iid), || {
            api.create_note(project_id, iid, comment)
        })
        .map_err(|error| ConnectorError::remote("adding comment", error))?;
    }

    let issue = timed("issue.edit", Some(iid), || api.edit_issue(project_id, iid, edit))
        .map_err(|error| ConnectorError::remote("updating issue", error))?;
    Ok(issue.iid)
}

fn resolve_assignee(
    mapper: &AttributeMapper,
    record: &TaskRecord,
    changed: &HashSet<TaskField>,
) -> AssigneeUpdate {
    if !changed.contains(&TaskField::Assignee) {
        return AssigneeUpdate::NoChange;
    }

    match mapper.find_project_member_by_name(record.text(TaskField::Assignee)) {
        Some(member) => AssigneeUpdate::AssignTo(member.id),
        None => AssigneeUpdate::Unassign,
    }
}

// An unset operation means the user never picked one.
fn selected_action(record: &TaskRecord) -> Result<IssueAction> {
    match record.value(TaskField::Operation) {
        None | Some("") => Ok(IssueAction::Leave),
        Some(label) => Ok(IssueAction::find(label)?),
    }
}

pub(crate) fn parse_task_id(task_id: &str) -> Result<u64> {
    task_id
        .trim()
        .parse::<u64>()
        .map_err(|_| ConnectorError::InvalidTaskId(task_id.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::{TimeZone, Utc};
    use tasklab_domain::{TaskField, TaskRecord};
    use tasklab_gitlab::{AssigneeUpdate, Milestone, Project};

    use super::{submit_task_record, ResponseKind};
    use crate::{
        builder::{build_task_record_at, initialize_task_record_at},
        connection::Connection,
        error::ConnectorError,
        fake::{sample_issue, user, FakeGitlab},
        mapper::AttributeMapper,
        progress::{NullProgress, ProgressMonitor},
    };

    fn connection() -> Connection {
        Connection {
            repository_url: "https://gitlab.example.com".to_string(),
            project: Project {
                id: 12,
                name: "Backend".to_string(),
                path_with_namespace: "platform/backend".to_string(),
            },
            mapper: AttributeMapper::new(
                vec![user(11, "Grace Hopper"), user(12, "Alan Turing")],
                vec![Milestone {
                    id: 30,
                    title: "v1.0".to_string(),
                    state: None,
                }],
            ),
        }
    }

    fn existing_record() -> TaskRecord {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        build_task_record_at(&sample_issue(7), &connection(), Vec::new(), now)
    }

    fn changed(fields: &[TaskField]) -> HashSet<TaskField> {
        fields.iter().copied().collect()
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Vec<String>,
    }

    impl ProgressMonitor for RecordingProgress {
        fn begin_task(&mut self, name: &str) {
            self.events.push(format!("begin {name}"));
        }

        fn done(&mut self) {
            self.events.push("done".to_string());
        }
    }

    #[test]
    fn new_record_with_empty_fields_is_created() {
        let api = FakeGitlab::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let record = initialize_task_record_at(&connection(), now);

        let response = submit_task_record(
            &api,
            &connection(),
            &record,
            &HashSet::new(),
            &mut NullProgress,
        )
        .expect("response");

        assert_eq!(response.kind, ResponseKind::TaskCreated);
        assert_eq!(response.task_id, "42");
        let created = api.created.borrow();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].title, "");
        assert_eq!(created[0].description, "");
        assert_eq!(created[0].assignee, AssigneeUpdate::NoChange);
        assert_eq!(created[0].milestone_id, None);
        assert_eq!(api.calls(), vec!["create_issue 12"]);
    }

    #[test]
    fn new_record_resolves_assignee_and_milestone() {
        let api = FakeGitlab::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut record = initialize_task_record_at(&connection(), now);
        record.set_value(TaskField::Title, "Add SSO");
        record.set_value(TaskField::Assignee, "Alan Turing");
        record.set_value(TaskField::Milestone, "v1.0");

        submit_task_record(
            &api,
            &connection(),
            &record,
            &changed(&[TaskField::Title, TaskField::Assignee, TaskField::Milestone]),
            &mut NullProgress,
        )
        .expect("response");

        let created = api.created.borrow();
        assert_eq!(created[0].title, "Add SSO");
        assert_eq!(created[0].assignee, AssigneeUpdate::AssignTo(12));
        assert_eq!(created[0].milestone_id, Some(30));
    }

    #[test]
    fn untouched_assignee_is_never_resolved() {
        let api = FakeGitlab::default();
        let mut record = existing_record();
        record.set_value(TaskField::Assignee, "Former Employee");

        submit_task_record(
            &api,
            &connection(),
            &record,
            &changed(&[TaskField::Title]),
            &mut NullProgress,
        )
        .expect("response");

        let edits = api.edits.borrow();
        assert_eq!(edits[0].assignee, AssigneeUpdate::NoChange);
        assert_eq!(edits[0].assignee.as_wire().expect("wire"), 0);
    }

    #[test]
    fn changed_assignee_resolves_or_unassigns() {
        let api = FakeGitlab::default();
        let mut record = existing_record();

        record.set_value(TaskField::Assignee, "Grace Hopper");
        submit_task_record(
            &api,
            &connection(),
            &record,
            &changed(&[TaskField::Assignee]),
            &mut NullProgress,
        )
        .expect("assign");

        record.set_value(TaskField::Assignee, "");
        submit_task_record(
            &api,
            &connection(),
            &record,
            &changed(&[TaskField::Assignee]),
            &mut NullProgress,
        )
        .expect("unassign");

        let edits = api.edits.borrow();
        assert_eq!(edits[0].assignee, AssigneeUpdate::AssignTo(11));
        assert_eq!(edits[1].assignee, AssigneeUpdate::Unassign);
        assert_eq!(edits[1].assignee.as_wire().expect("wire"), -1);
    }

    #[test]
    fn unknown_milestone_clears_it() {
        let api = FakeGitlab::default();
        let mut record = existing_record();
        record.set_value(TaskField::Milestone, "v9.9");

        submit_task_record(
            &api,
            &connection(),
            &record,
            &HashSet::new(),
            &mut NullProgress,
        )
        .expect("response");

        assert_eq!(api.edits.borrow()[0].milestone_id, None);
    }

    #[test]
    fn new_comment_is_posted_before_the_edit() {
        let api = FakeGitlab::default();
        let mut record = existing_record();
        record.set_value(TaskField::NewComment, "Reproduced on main");

        let response = submit_task_record(
            &api,
            &connection(),
            &record,
            &changed(&[TaskField::NewComment]),
            &mut NullProgress,
        )
        .expect("response");

        assert_eq!(response.kind, ResponseKind::TaskUpdated);
        assert_eq!(response.task_id, "7");
        assert_eq!(
            api.calls(),
            vec!["create_note 12 7 Reproduced on main", "edit_issue 12 7"]
        );
    }

    #[test]
    fn empty_comment_is_not_posted() {
        let api = FakeGitlab::default();
        let mut record = existing_record();
        record.set_value(TaskField::NewComment, "");

        submit_task_record(
            &api,
            &connection(),
            &record,
            &HashSet::new(),
            &mut NullProgress,
        )
        .expect("response");

        assert_eq!(api.calls(), vec!["edit_issue 12 7"]);
    }

    #[test]
    fn selected_operation_becomes_state_event() {
        let api = FakeGitlab::default();
        let mut record = existing_record();

        submit_task_record(
            &api,
            &connection(),
            &record,
            &HashSet::new(),
            &mut NullProgress,
        )
        .expect("leave");

        record.set_value(TaskField::Operation, "close");
        submit_task_record(
            &api,
            &connection(),
            &record,
            &changed(&[TaskField::Operation]),
            &mut NullProgress,
        )
        .expect("close");

        let edits = api.edits.borrow();
        assert_eq!(edits[0].state_event, None);
        assert_eq!(edits[1].state_event, Some("close"));
        assert_eq!(edits[1].title, "Login fails");
        assert_eq!(edits[1].labels, "priority:high, type:bug");
    }

    #[test]
    fn unknown_operation_fails_before_any_call() {
        let api = FakeGitlab::default();
        let mut record = existing_record();
        record.set_value(TaskField::Operation, "resolve");

        let error = submit_task_record(
            &api,
            &connection(),
            &record,
            &HashSet::new(),
            &mut NullProgress,
        )
        .expect_err("expected error");

        assert!(matches!(error, ConnectorError::UnknownOperation(_)));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn remote_failures_surface_as_unavailable() {
        let api = FakeGitlab {
            fail: true,
            ..FakeGitlab::default()
        };
        let mut record = existing_record();
        record.set_value(TaskField::NewComment, "hello");
        let mut progress = RecordingProgress::default();

        let error = submit_task_record(
            &api,
            &connection(),
            &record,
            &HashSet::new(),
            &mut progress,
        )
        .expect_err("expected error");

        assert!(matches!(
            error,
            ConnectorError::RemoteUnavailable {
                operation: "adding comment",
                ..
            }
        ));
        assert!(error.to_string().contains("connection refused"));
        assert_eq!(progress.events, vec!["begin Uploading task", "done"]);
        assert_eq!(api.calls(), vec!["create_note 12 7 hello"]);
    }

    #[test]
    fn reports_progress_around_upload() {
        let api = FakeGitlab::default();
        let mut progress = RecordingProgress::default();

        submit_task_record(
            &api,
            &connection(),
            &existing_record(),
            &HashSet::new(),
            &mut progress,
        )
        .expect("response");

        assert_eq!(progress.events, vec!["begin Uploading task", "done"]);
    }

    #[test]
    fn rejects_non_numeric_task_ids() {
        let api = FakeGitlab::default();
        let mut record = TaskRecord::existing("https://gitlab.example.com", "PROJ-7");
        record.set_value(TaskField::Title, "x");

        let error = submit_task_record(
            &api,
            &connection(),
            &record,
            &HashSet::new(),
            &mut NullProgress,
        )
        .expect_err("expected error");

        assert!(matches!(error, ConnectorError::InvalidTaskId(id) if id == "PROJ-7"));
    }
}
