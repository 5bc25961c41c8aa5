use std::{fmt, sync::OnceLock};

use regex::Regex;

static PRIORITY_PATTERN: OnceLock<Regex> = OnceLock::new();
static TYPE_PATTERN: OnceLock<Regex> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityLevel {
    P1,
    P2,
    P3,
    P4,
    P5,
}

impl PriorityLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
            Self::P5 => "P5",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives a priority from a comma-joined label list.
///
/// The first `high`, `normal` or `low` token wins, optionally prefixed with
/// `priority:`. Matching is case-sensitive; no match yields `P3`.
pub fn derive_priority(labels: &str) -> PriorityLevel {
    let pattern = PRIORITY_PATTERN
        .get_or_init(|| Regex::new(r"(?:priority:)?(high|normal|low)").expect("regex"));

    match pattern
        .captures(labels)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str())
    {
        Some("high") => PriorityLevel::P1,
        Some("low") => PriorityLevel::P5,
        _ => PriorityLevel::P3,
    }
}

/// Returns the first `bug`, `feature` or `story` token in the label list,
/// optionally prefixed with `type:`, or an empty string.
pub fn derive_type(labels: &str) -> String {
    let pattern =
        TYPE_PATTERN.get_or_init(|| Regex::new(r"(?:type:)?(bug|feature|story)").expect("regex"));

    pattern
        .captures(labels)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
        .unwrap_or_default()
}

pub fn join_labels<S: AsRef<str>>(labels: &[S]) -> String {
    labels
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}
