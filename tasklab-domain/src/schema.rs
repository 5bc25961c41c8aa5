use std::fmt;

/// Value type of a task field, which decides how a host renders and edits it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    ShortText,
    ShortRichText,
    LongRichText,
    Date,
    Person,
    SingleSelect,
    Operation,
}

/// Where a host should place a field. `Hidden` fields are carried but not
/// shown in the attribute section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldSection {
    Attributes,
    People,
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskField {
    Title,
    Body,
    Labels,
    Status,
    Project,
    Created,
    Completed,
    Updated,
    Assignee,
    Milestone,
    Iid,
    Priority,
    Type,
    Author,
    NewComment,
    Operation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub section: FieldSection,
    pub read_only: bool,
}

/// Fields present on every task record, new or downloaded.
pub const DEFAULT_FIELDS: [TaskField; 13] = [
    TaskField::Body,
    TaskField::Title,
    TaskField::Labels,
    TaskField::Status,
    TaskField::Project,
    TaskField::Created,
    TaskField::Completed,
    TaskField::Updated,
    TaskField::Assignee,
    TaskField::Milestone,
    TaskField::Iid,
    TaskField::Priority,
    TaskField::Type,
];

/// Fields that only make sense once the issue exists remotely.
pub const EXISTING_TASK_FIELDS: [TaskField; 2] = [TaskField::NewComment, TaskField::Author];

impl TaskField {
    pub const fn spec(self) -> FieldSpec {
        use FieldKind::*;
        use FieldSection::*;

        let (key, label, kind, section, read_only) = match self {
            Self::Title => ("task.title", "Summary", ShortRichText, Hidden, false),
            Self::Body => ("task.description", "Description", LongRichText, Hidden, false),
            Self::Labels => ("gitlab.labels", "Labels", ShortText, Attributes, false),
            Self::Status => ("task.status", "Status", ShortText, Attributes, true),
            Self::Project => ("task.project", "Project", ShortText, Attributes, true),
            Self::Created => ("task.date.created", "Created", Date, Hidden, true),
            Self::Completed => ("task.date.completed", "Completed", Date, Hidden, true),
            Self::Updated => ("task.date.updated", "Updated", Date, Hidden, true),
            Self::Assignee => ("task.user.assigned", "Assignee", Person, People, false),
            Self::Milestone => ("gitlab.milestone", "Milestone", SingleSelect, Attributes, false),
            Self::Iid => ("gitlab.iid", "IID", ShortText, Hidden, true),
            Self::Priority => ("task.priority", "Priority", ShortText, Hidden, true),
            Self::Type => ("task.kind", "Type", ShortText, Hidden, true),
            Self::Author => ("task.user.reporter", "Author", Person, People, true),
            Self::NewComment => ("task.comment.new", "New Comment", LongRichText, Hidden, false),
            Self::Operation => ("task.operation", "Operation", Operation, Hidden, false),
        };

        FieldSpec {
            key,
            label,
            kind,
            section,
            read_only,
        }
    }

    pub const fn key(self) -> &'static str {
        self.spec().key
    }

    pub fn from_key(key: &str) -> Option<Self> {
        DEFAULT_FIELDS
            .iter()
            .chain(EXISTING_TASK_FIELDS.iter())
            .chain(std::iter::once(&TaskField::Operation))
            .copied()
            .find(|field| field.key() == key)
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().label)
    }
}
