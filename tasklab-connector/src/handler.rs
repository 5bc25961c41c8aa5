use std::collections::HashSet;

use tasklab_config::TasklabConfig;
use tasklab_domain::{TaskField, TaskRecord};
use tasklab_gitlab::{GitlabApi, GitlabClient};

use crate::{
    builder::{build_task_record, initialize_task_record},
    connection::Connection,
    error::{ConnectorError, Result},
    mapper::AttributeMapper,
    progress::ProgressMonitor,
    submitter::{submit_task_record, RepositoryResponse},
    telemetry::timed,
};

/// Entry point for a host task framework: downloads issues as task records,
/// prepares new ones, and posts edits back.
pub struct TaskDataHandler<A = GitlabClient> {
    api: A,
    connection: Connection,
}

impl TaskDataHandler<GitlabClient> {
    pub fn from_config(config: &TasklabConfig) -> Result<Self> {
        let api = GitlabClient::from_config(config)
            .map_err(|error| ConnectorError::Configuration(format!("{error:#}")))?;
        Self::connect(api, config)
    }
}

impl<A: GitlabApi> TaskDataHandler<A> {
    pub fn connect(api: A, config: &TasklabConfig) -> Result<Self> {
        let connection = Connection::open(&api, config)?;
        Ok(Self { api, connection })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn attribute_mapper(&self) -> &AttributeMapper {
        &self.connection.mapper
    }

    pub fn refresh_attributes(&mut self) -> Result<()> {
        self.connection.refresh(&self.api)
    }

    pub fn download_task_record(&self, iid: u64) -> Result<TaskRecord> {
        let project_id = self.connection.project.id;
        let issue = timed("issue.get", Some(iid), || self.api.get_issue(project_id, iid))
            .map_err(|error| ConnectorError::remote("downloading issue", error))?;
        let notes = timed("notes.list", Some(iid), || self.api.list_notes(project_id, iid))
            .map_err(|error| ConnectorError::remote("downloading comments", error))?;

        Ok(build_task_record(&issue, &self.connection, notes))
    }

    pub fn initialize_task_record(&self) -> TaskRecord {
        initialize_task_record(&self.connection)
    }

    pub fn post_task_record(
        &self,
        record: &TaskRecord,
        changed: &HashSet<TaskField>,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<RepositoryResponse> {
        submit_task_record(&self.api, &self.connection, record, changed, monitor)
    }
}
