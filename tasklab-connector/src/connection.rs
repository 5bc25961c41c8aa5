use tasklab_config::TasklabConfig;
use tasklab_gitlab::{GitlabApi, Project};

use crate::{
    error::{ConnectorError, Result},
    mapper::AttributeMapper,
    telemetry::timed,
};

/// The GitLab project a task repository points at, with the lookups needed
/// to resolve assignee and milestone names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub repository_url: String,
    pub project: Project,
    pub mapper: AttributeMapper,
}

impl Connection {
    pub fn open<A: GitlabApi + ?Sized>(api: &A, config: &TasklabConfig) -> Result<Self> {
        let repository_url = config
            .server()
            .map_err(|error| ConnectorError::Configuration(error.to_string()))?
            .to_string();
        let project_ref = config
            .project()
            .map_err(|error| ConnectorError::Configuration(error.to_string()))?;

        let project = timed("project.get", None, || api.get_project(project_ref))
            .map_err(|error| ConnectorError::remote("loading project", error))?;

        let mut connection = Self {
            repository_url,
            project,
            mapper: AttributeMapper::default(),
        };
        connection.refresh(api)?;
        Ok(connection)
    }

    /// Reloads project members and milestones.
    pub fn refresh<A: GitlabApi + ?Sized>(&mut self, api: &A) -> Result<()> {
        let project_id = self.project.id;
        let members = timed("members.list", Some(project_id), || {
            api.list_project_members(project_id)
        })
        .map_err(|error| ConnectorError::remote("loading project members", error))?;
        let milestones = timed("milestones.list", Some(project_id), || {
            api.list_milestones(project_id)
        })
        .map_err(|error| ConnectorError::remote("loading milestones", error))?;

        self.mapper = AttributeMapper::new(members, milestones);
        Ok(())
    }
}
