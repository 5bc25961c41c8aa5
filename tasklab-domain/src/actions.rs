use std::fmt;

use thiserror::Error;

/// Remote issue state as far as transitions are concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// Reads a remote state string. Anything other than `closed` (`opened`,
    /// the legacy `reopened`, or unknown values) is treated as open.
    pub fn from_remote(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("closed") {
            Self::Closed
        } else {
            Self::Open
        }
    }

    pub const fn as_remote(self) -> &'static str {
        match self {
            Self::Open => "opened",
            Self::Closed => "closed",
        }
    }
}

/// A state transition offered for an issue, presented to the user as an
/// operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueAction {
    Leave,
    Close,
    Reopen,
}

const OPEN_ACTIONS: [IssueAction; 2] = [IssueAction::Leave, IssueAction::Close];
const CLOSED_ACTIONS: [IssueAction; 2] = [IssueAction::Leave, IssueAction::Reopen];
const ALL_ACTIONS: [IssueAction; 3] = [IssueAction::Leave, IssueAction::Close, IssueAction::Reopen];

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("no issue action labelled '{0}'")]
pub struct UnknownActionError(pub String);

impl IssueAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Leave => "leave",
            Self::Close => "close",
            Self::Reopen => "reopen",
        }
    }

    /// GitLab `state_event` for this action; `Leave` sends none.
    pub const fn state_event(self) -> Option<&'static str> {
        match self {
            Self::Leave => None,
            Self::Close => Some("close"),
            Self::Reopen => Some("reopen"),
        }
    }

    pub fn find(label: &str) -> Result<Self, UnknownActionError> {
        ALL_ACTIONS
            .into_iter()
            .find(|action| action.label() == label)
            .ok_or_else(|| UnknownActionError(label.to_string()))
    }
}

impl fmt::Display for IssueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transitions available for an issue in `state`, `Leave` first.
pub fn actions_for(state: IssueState) -> &'static [IssueAction] {
    match state {
        IssueState::Open => &OPEN_ACTIONS,
        IssueState::Closed => &CLOSED_ACTIONS,
    }
}
