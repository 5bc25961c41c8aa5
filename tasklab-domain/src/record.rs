use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};

use crate::{
    actions::IssueAction,
    schema::{FieldSpec, TaskField, DEFAULT_FIELDS, EXISTING_TASK_FIELDS},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskAttribute {
    pub spec: FieldSpec,
    value: Option<String>,
}

impl TaskAttribute {
    fn new(field: TaskField) -> Self {
        Self {
            spec: field.spec(),
            value: None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentRecord {
    pub number: usize,
    pub author: String,
    pub created: Option<DateTime<Utc>>,
    pub text: String,
}

/// Local, tool-agnostic view of one issue plus its pending edits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskRecord {
    repository_url: String,
    task_id: Option<String>,
    fields: BTreeMap<TaskField, TaskAttribute>,
    comments: Vec<CommentRecord>,
    operations: Vec<IssueAction>,
}

impl TaskRecord {
    /// A record for an issue that does not exist remotely yet.
    pub fn new_task(repository_url: impl Into<String>) -> Self {
        Self {
            repository_url: repository_url.into(),
            task_id: None,
            fields: BTreeMap::new(),
            comments: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn existing(repository_url: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            ..Self::new_task(repository_url)
        }
    }

    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn is_new(&self) -> bool {
        self.task_id.is_none()
    }

    pub fn has_field(&self, field: TaskField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn attribute(&self, field: TaskField) -> Option<&TaskAttribute> {
        self.fields.get(&field)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (TaskField, &TaskAttribute)> + '_ {
        self.fields.iter().map(|(field, attribute)| (*field, attribute))
    }

    pub fn value(&self, field: TaskField) -> Option<&str> {
        self.fields.get(&field).and_then(TaskAttribute::value)
    }

    /// Value of `field`, with unset and missing fields read as empty.
    pub fn text(&self, field: TaskField) -> &str {
        self.value(field).unwrap_or_default()
    }

    /// Sets the value of a field, creating the field if the schema did not.
    pub fn set_value(&mut self, field: TaskField, value: impl Into<String>) {
        self.fields
            .entry(field)
            .or_insert_with(|| TaskAttribute::new(field))
            .value = Some(value.into());
    }

    pub fn clear_value(&mut self, field: TaskField) {
        if let Some(attribute) = self.fields.get_mut(&field) {
            attribute.value = None;
        }
    }

    /// Stores a timestamp as milliseconds since the Unix epoch.
    pub fn set_date(&mut self, field: TaskField, value: DateTime<Utc>) {
        self.set_value(field, value.timestamp_millis().to_string());
    }

    pub fn date(&self, field: TaskField) -> Option<DateTime<Utc>> {
        let millis = self.value(field)?.parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    pub fn comments(&self) -> &[CommentRecord] {
        &self.comments
    }

    pub fn push_comment(&mut self, comment: CommentRecord) {
        self.comments.push(comment);
    }

    pub fn operations(&self) -> &[IssueAction] {
        &self.operations
    }

    pub fn set_operations(&mut self, operations: &[IssueAction]) {
        self.operations = operations.to_vec();
    }

    fn create_field(&mut self, field: TaskField) {
        self.fields.insert(field, TaskAttribute::new(field));
    }
}

/// Creates every schema field on `record`, unset, and stamps `Created`
/// with `now`.
///
/// `existing_task` adds the new-comment and author fields, which have no
/// meaning before the issue exists remotely. The operation field is always
/// created.
pub fn define_fields(record: &mut TaskRecord, existing_task: bool, now: DateTime<Utc>) {
    for field in DEFAULT_FIELDS {
        record.create_field(field);
    }

    record.set_date(TaskField::Created, now);

    if existing_task {
        for field in EXISTING_TASK_FIELDS {
            record.create_field(field);
        }
    }

    record.create_field(TaskField::Operation);
}
