use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};
use tasklab_config::{AuthMethod, TasklabConfig};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const PAGE_SIZE: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub path_with_namespace: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub username: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Milestone {
    pub id: u64,
    pub title: String,
    pub state: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub iid: u64,
    pub title: String,
    pub description: Option<String>,
    pub labels: Vec<String>,
    pub state: String,
    pub author: User,
    pub assignee: Option<User>,
    pub milestone: Option<Milestone>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub id: u64,
    pub author: User,
    pub body: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Assignee change carried by an issue write.
///
/// `NoChange` must be used whenever the user did not touch the assignee:
/// writing the assignee at all makes GitLab record a history entry even when
/// the value is the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssigneeUpdate {
    NoChange,
    Unassign,
    AssignTo(u64),
}

impl AssigneeUpdate {
    /// Integer encoding of the legacy issues API: `0` leaves the assignee
    /// alone, `-1` unassigns, anything else is a user id.
    pub fn as_wire(self) -> Result<i64> {
        match self {
            Self::NoChange => Ok(0),
            Self::Unassign => Ok(-1),
            Self::AssignTo(id) => i64::try_from(id)
                .map_err(|_| anyhow!("assignee id {id} does not fit the issues API")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub labels: String,
    pub assignee: AssigneeUpdate,
    pub milestone_id: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueEdit {
    pub title: String,
    pub description: String,
    pub labels: String,
    pub assignee: AssigneeUpdate,
    pub milestone_id: Option<u64>,
    pub state_event: Option<&'static str>,
}

/// The remote calls the task connector relies on.
pub trait GitlabApi {
    fn get_project(&self, project: &str) -> Result<Project>;
    fn get_issue(&self, project_id: u64, iid: u64) -> Result<Issue>;
    fn list_notes(&self, project_id: u64, iid: u64) -> Result<Vec<Note>>;
    fn create_issue(&self, project_id: u64, issue: &NewIssue) -> Result<Issue>;
    fn edit_issue(&self, project_id: u64, iid: u64, edit: &IssueEdit) -> Result<Issue>;
    fn create_note(&self, project_id: u64, iid: u64, body: &str) -> Result<Note>;
    fn list_project_members(&self, project_id: u64) -> Result<Vec<User>>;
    fn list_milestones(&self, project_id: u64) -> Result<Vec<Milestone>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum AuthMode {
    PrivateToken { token: String },
    Bearer { token: String },
}

pub struct GitlabClient {
    base_url: String,
    http: Client,
    auth_mode: AuthMode,
}

#[derive(Default, Deserialize)]
struct ProjectPayload {
    id: u64,
    name: Option<String>,
    path_with_namespace: Option<String>,
}

#[derive(Default, Deserialize)]
struct UserPayload {
    #[serde(default)]
    id: u64,
    name: Option<String>,
    username: Option<String>,
}

#[derive(Default, Deserialize)]
struct MilestonePayload {
    id: u64,
    title: Option<String>,
    state: Option<String>,
}

#[derive(Default, Deserialize)]
struct IssuePayload {
    iid: u64,
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    labels: Vec<String>,
    state: Option<String>,
    author: Option<UserPayload>,
    assignee: Option<UserPayload>,
    milestone: Option<MilestonePayload>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Default, Deserialize)]
struct NotePayload {
    id: u64,
    author: Option<UserPayload>,
    body: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl GitlabClient {
    pub fn from_config(config: &TasklabConfig) -> Result<Self> {
        let server = config.server()?;
        let auth_mode = parse_auth_mode(config)?;

        let http = Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .with_context(|| "failed to build GitLab HTTP client")?;

        Ok(Self {
            base_url: format!("{server}/api/v4"),
            http,
            auth_mode,
        })
    }

    fn project_endpoint(&self, project_id: u64) -> String {
        format!("{}/projects/{}", self.base_url, project_id)
    }

    fn issue_endpoint(&self, project_id: u64, iid: u64) -> String {
        format!("{}/issues/{}", self.project_endpoint(project_id), iid)
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: String, what: &str) -> Result<T> {
        let response = self
            .with_auth(self.http.get(endpoint))
            .send()
            .with_context(|| format!("failed to fetch {what}"))?;
        decode(response, what)
    }

    fn get_all<T: DeserializeOwned>(&self, endpoint: String, what: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let response = self
                .with_auth(self.http.get(&endpoint))
                .query(&[
                    ("page", page.to_string()),
                    ("per_page", PAGE_SIZE.to_string()),
                ])
                .send()
                .with_context(|| format!("failed to fetch {what}"))?;
            let batch: Vec<T> = decode(response, what)?;
            let batch_len = batch.len();
            items.extend(batch);

            if batch_len < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_mode {
            AuthMode::PrivateToken { token } => request.header("PRIVATE-TOKEN", token),
            AuthMode::Bearer { token } => request.bearer_auth(token),
        }
    }
}

impl GitlabApi for GitlabClient {
    fn get_project(&self, project: &str) -> Result<Project> {
        let endpoint = format!("{}/projects/{}", self.base_url, encode_project(project));
        let payload: ProjectPayload = self.get_json(endpoint, &format!("project {project}"))?;
        Ok(into_project(payload))
    }

    fn get_issue(&self, project_id: u64, iid: u64) -> Result<Issue> {
        let payload: IssuePayload =
            self.get_json(self.issue_endpoint(project_id, iid), &format!("issue #{iid}"))?;
        Ok(into_issue(payload))
    }

    fn list_notes(&self, project_id: u64, iid: u64) -> Result<Vec<Note>> {
        let endpoint = format!("{}/notes", self.issue_endpoint(project_id, iid));
        let payload: Vec<NotePayload> = self.get_all(endpoint, &format!("notes for #{iid}"))?;
        Ok(payload.into_iter().map(into_note).collect())
    }

    fn create_issue(&self, project_id: u64, issue: &NewIssue) -> Result<Issue> {
        let endpoint = format!("{}/issues", self.project_endpoint(project_id));
        let response = self
            .with_auth(self.http.post(endpoint))
            .json(&new_issue_body(issue)?)
            .send()
            .with_context(|| "failed to create issue")?;
        let payload: IssuePayload = decode(response, "issue create")?;
        Ok(into_issue(payload))
    }

    fn edit_issue(&self, project_id: u64, iid: u64, edit: &IssueEdit) -> Result<Issue> {
        let response = self
            .with_auth(self.http.put(self.issue_endpoint(project_id, iid)))
            .json(&issue_edit_body(edit)?)
            .send()
            .with_context(|| format!("failed to edit issue #{iid}"))?;
        let payload: IssuePayload = decode(response, "issue edit")?;
        Ok(into_issue(payload))
    }

    fn create_note(&self, project_id: u64, iid: u64, body: &str) -> Result<Note> {
        let endpoint = format!("{}/notes", self.issue_endpoint(project_id, iid));
        let response = self
            .with_auth(self.http.post(endpoint))
            .json(&json!({ "body": body }))
            .send()
            .with_context(|| format!("failed to add note to #{iid}"))?;
        let payload: NotePayload = decode(response, "note create")?;
        Ok(into_note(payload))
    }

    fn list_project_members(&self, project_id: u64) -> Result<Vec<User>> {
        let endpoint = format!("{}/members/all", self.project_endpoint(project_id));
        let payload: Vec<UserPayload> = self.get_all(endpoint, "project members")?;
        Ok(payload.into_iter().map(into_user).collect())
    }

    fn list_milestones(&self, project_id: u64) -> Result<Vec<Milestone>> {
        let endpoint = format!("{}/milestones", self.project_endpoint(project_id));
        let payload: Vec<MilestonePayload> = self.get_all(endpoint, "milestones")?;
        Ok(payload.into_iter().map(into_milestone).collect())
    }
}

fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        bail!(
            "gitlab {} request failed: status={} body={}",
            what,
            status,
            body
        );
    }

    response
        .json()
        .with_context(|| format!("failed to decode GitLab {what} response"))
}

fn parse_auth_mode(config: &TasklabConfig) -> Result<AuthMode> {
    let token = config
        .gitlab_token
        .as_deref()
        .ok_or_else(|| anyhow!("gitlab_token not configured"))?
        .to_string();

    Ok(match config.auth_method() {
        AuthMethod::PrivateToken => AuthMode::PrivateToken { token },
        AuthMethod::Bearer => AuthMode::Bearer { token },
    })
}

/// Numeric ids pass through; namespaced paths are URL-encoded.
fn encode_project(project: &str) -> String {
    if project.chars().all(|c| c.is_ascii_digit()) {
        return project.to_string();
    }
    urlencoding::encode(project).into_owned()
}

fn write_fields(
    body: &mut Map<String, Value>,
    title: &str,
    description: &str,
    labels: &str,
    assignee: AssigneeUpdate,
) -> Result<()> {
    body.insert("title".to_string(), json!(title));
    body.insert("description".to_string(), json!(description));
    body.insert("labels".to_string(), json!(labels));

    // The v4 API unassigns with an empty id list and has no "leave as is"
    // value, so the no-change sentinel omits the key entirely.
    match assignee.as_wire()? {
        0 => {}
        -1 => {
            body.insert("assignee_ids".to_string(), json!([]));
        }
        id => {
            body.insert("assignee_ids".to_string(), json!([id]));
        }
    }
    Ok(())
}

fn new_issue_body(issue: &NewIssue) -> Result<Value> {
    let mut body = Map::new();
    write_fields(
        &mut body,
        &issue.title,
        &issue.description,
        &issue.labels,
        issue.assignee,
    )?;
    if let Some(milestone_id) = issue.milestone_id {
        body.insert("milestone_id".to_string(), json!(milestone_id));
    }
    Ok(Value::Object(body))
}

fn issue_edit_body(edit: &IssueEdit) -> Result<Value> {
    let mut body = Map::new();
    write_fields(
        &mut body,
        &edit.title,
        &edit.description,
        &edit.labels,
        edit.assignee,
    )?;
    // 0 clears the milestone on edit.
    body.insert(
        "milestone_id".to_string(),
        json!(edit.milestone_id.unwrap_or(0)),
    );
    if let Some(state_event) = edit.state_event {
        body.insert("state_event".to_string(), json!(state_event));
    }
    Ok(Value::Object(body))
}

fn into_project(payload: ProjectPayload) -> Project {
    let path_with_namespace = payload
        .path_with_namespace
        .and_then(non_empty)
        .unwrap_or_else(|| payload.id.to_string());
    Project {
        id: payload.id,
        name: payload
            .name
            .and_then(non_empty)
            .unwrap_or_else(|| path_with_namespace.clone()),
        path_with_namespace,
    }
}

fn into_user(payload: UserPayload) -> User {
    let username = payload.username.and_then(non_empty).unwrap_or_default();
    User {
        id: payload.id,
        name: payload
            .name
            .and_then(non_empty)
            .unwrap_or_else(|| username.clone()),
        username,
    }
}

fn into_milestone(payload: MilestonePayload) -> Milestone {
    Milestone {
        id: payload.id,
        title: payload.title.unwrap_or_default(),
        state: payload.state.and_then(non_empty),
    }
}

fn into_issue(payload: IssuePayload) -> Issue {
    Issue {
        iid: payload.iid,
        title: payload.title.unwrap_or_default(),
        description: payload.description,
        labels: payload
            .labels
            .into_iter()
            .filter_map(non_empty)
            .collect::<Vec<_>>(),
        state: payload
            .state
            .and_then(non_empty)
            .unwrap_or_else(|| "opened".to_string()),
        author: into_user(payload.author.unwrap_or_default()),
        assignee: payload.assignee.map(into_user),
        milestone: payload.milestone.map(into_milestone),
        created_at: payload.created_at,
        updated_at: payload.updated_at,
    }
}

fn into_note(payload: NotePayload) -> Note {
    Note {
        id: payload.id,
        author: into_user(payload.author.unwrap_or_default()),
        body: payload.body.unwrap_or_default(),
        created_at: payload.created_at,
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
