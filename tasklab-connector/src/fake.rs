use std::cell::RefCell;

use anyhow::{bail, Result};
use chrono::{TimeZone, Utc};
use tasklab_gitlab::{GitlabApi, Issue, IssueEdit, Milestone, NewIssue, Note, Project, User};

/// In-memory GitLab that records every call it receives.
#[derive(Default)]
pub(crate) struct FakeGitlab {
    pub(crate) fail: bool,
    pub(crate) issue: Option<Issue>,
    pub(crate) notes: Vec<Note>,
    pub(crate) calls: RefCell<Vec<String>>,
    pub(crate) created: RefCell<Vec<NewIssue>>,
    pub(crate) edits: RefCell<Vec<IssueEdit>>,
}

impl FakeGitlab {
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.borrow_mut().push(call);
        if self.fail {
            bail!("connection refused");
        }
        Ok(())
    }
}

pub(crate) fn user(id: u64, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
        username: name.to_ascii_lowercase().replace(' ', "."),
    }
}

pub(crate) fn sample_issue(iid: u64) -> Issue {
    Issue {
        iid,
        title: "Login fails".to_string(),
        description: Some("Steps to reproduce".to_string()),
        labels: vec!["priority:high".to_string(), "type:bug".to_string()],
        state: "opened".to_string(),
        author: user(11, "Grace Hopper"),
        assignee: None,
        milestone: None,
        created_at: Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).single(),
        updated_at: Utc.with_ymd_and_hms(2026, 1, 6, 11, 30, 0).single(),
    }
}

impl GitlabApi for FakeGitlab {
    fn get_project(&self, project: &str) -> Result<Project> {
        self.record(format!("get_project {project}"))?;
        Ok(Project {
            id: 12,
            name: "Backend".to_string(),
            path_with_namespace: project.to_string(),
        })
    }

    fn get_issue(&self, project_id: u64, iid: u64) -> Result<Issue> {
        self.record(format!("get_issue {project_id} {iid}"))?;
        Ok(self.issue.clone().unwrap_or_else(|| sample_issue(iid)))
    }

    fn list_notes(&self, project_id: u64, iid: u64) -> Result<Vec<Note>> {
        self.record(format!("list_notes {project_id} {iid}"))?;
        Ok(self.notes.clone())
    }

    fn create_issue(&self, project_id: u64, issue: &NewIssue) -> Result<Issue> {
        self.record(format!("create_issue {project_id}"))?;
        self.created.borrow_mut().push(issue.clone());
        Ok(Issue {
            title: issue.title.clone(),
            ..sample_issue(42)
        })
    }

    fn edit_issue(&self, project_id: u64, iid: u64, edit: &IssueEdit) -> Result<Issue> {
        self.record(format!("edit_issue {project_id} {iid}"))?;
        self.edits.borrow_mut().push(edit.clone());
        Ok(sample_issue(iid))
    }

    fn create_note(&self, project_id: u64, iid: u64, body: &str) -> Result<Note> {
        self.record(format!("create_note {project_id} {iid} {body}"))?;
        Ok(Note {
            id: 500,
            author: user(11, "Grace Hopper"),
            body: body.to_string(),
            created_at: None,
        })
    }

    fn list_project_members(&self, project_id: u64) -> Result<Vec<User>> {
        self.record(format!("list_project_members {project_id}"))?;
        Ok(vec![user(11, "Grace Hopper"), user(12, "Alan Turing")])
    }

    fn list_milestones(&self, project_id: u64) -> Result<Vec<Milestone>> {
        self.record(format!("list_milestones {project_id}"))?;
        Ok(vec![Milestone {
            id: 30,
            title: "v1.0".to_string(),
            state: Some("active".to_string()),
        }])
    }
}
