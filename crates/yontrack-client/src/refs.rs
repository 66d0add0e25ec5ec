use serde::{Deserialize, Serialize};
use std::fmt;

/// Replaces every character outside `[A-Za-z0-9._-]` with `-`.
///
/// ```
/// assert_eq!(yontrack_client::normalize_branch_name("feature/abc"), "feature-abc");
/// assert_eq!(yontrack_client::normalize_branch_name("release-1.2_x"), "release-1.2_x");
/// ```
pub fn normalize_branch_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// A branch in a project. The branch name is normalized on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub project: String,
    pub branch: String,
}

impl BranchRef {
    pub fn new(project: impl Into<String>, branch: &str) -> Self {
        Self {
            project: project.into(),
            branch: normalize_branch_name(branch),
        }
    }
}

/// A build in a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRef {
    pub project: String,
    pub branch: String,
    pub build: String,
}

impl BuildRef {
    pub fn new(project: impl Into<String>, branch: &str, build: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            branch: normalize_branch_name(branch),
            build: build.into(),
        }
    }

    pub fn branch_ref(&self) -> BranchRef {
        BranchRef {
            project: self.project.clone(),
            branch: self.branch.clone(),
        }
    }
}

/// Entity identifier. Depending on the server version, IDs come back either
/// as numbers or as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Int(i64),
    Str(String),
}

impl Default for Id {
    fn default() -> Self {
        Id::Int(0)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(id) => write!(f, "{id}"),
            Id::Str(id) => f.write_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_replaces_each_char() {
        assert_eq!(normalize_branch_name("a b/c#d"), "a-b-c-d");
        assert_eq!(normalize_branch_name("été"), "-t-");
        assert_eq!(normalize_branch_name(""), "");
    }

    #[test]
    fn test_refs_normalize_branch() {
        let build = BuildRef::new("p", "feature/x", "1");
        assert_eq!(build.branch, "feature-x");
        assert_eq!(build.branch_ref(), BranchRef::new("p", "feature/x"));
    }

    #[test]
    fn test_id_accepts_numbers_and_strings() {
        let ids: Vec<Id> = serde_json::from_str(r#"[12, "34"]"#).unwrap();
        assert_eq!(ids, [Id::Int(12), Id::Str("34".into())]);
        assert_eq!(ids[0].to_string(), "12");
        assert_eq!(ids[1].to_string(), "34");
    }
}
