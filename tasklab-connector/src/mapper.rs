use tasklab_gitlab::{Milestone, User};

/// Resolves the display names held in task fields back to GitLab entities.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeMapper {
    members: Vec<User>,
    milestones: Vec<Milestone>,
}

impl AttributeMapper {
    pub fn new(members: Vec<User>, milestones: Vec<Milestone>) -> Self {
        Self {
            members,
            milestones,
        }
    }

    pub fn find_project_member_by_name(&self, name: &str) -> Option<&User> {
        if name.is_empty() {
            return None;
        }
        self.members.iter().find(|member| member.name == name)
    }

    pub fn find_milestone_by_name(&self, title: &str) -> Option<&Milestone> {
        if title.is_empty() {
            return None;
        }
        self.milestones
            .iter()
            .find(|milestone| milestone.title == title)
    }

    /// Member display names, for host-side completion.
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|member| member.name.as_str()).collect()
    }

    pub fn milestone_titles(&self) -> Vec<&str> {
        self.milestones
            .iter()
            .map(|milestone| milestone.title.as_str())
            .collect()
    }
}
