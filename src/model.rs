use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// A repository as returned by `GET /secure/repos`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    #[serde(rename = "Owner")]
    pub owner: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(rename = "FullName", default, skip_serializing_if = "String::is_empty")]
    pub full_name: String,
}

impl Repo {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            url: None,
            full_name: String::new(),
        }
        .annotate()
    }

    /// Fills in `full_name` from owner and name.
    pub fn annotate(mut self) -> Self {
        self.full_name = format!("{}/{}", self.owner, self.name);
        self
    }

    pub fn is_same(&self, other: &Repo) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

pub fn parse_full_name(full_name: &str) -> Result<(String, String)> {
    let Some((owner, name)) = full_name.split_once('/') else {
        anyhow::bail!("expected OWNER/NAME, got {:?}", full_name);
    };
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        anyhow::bail!("expected OWNER/NAME, got {:?}", full_name);
    }
    Ok((owner.to_string(), name.to_string()))
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStatus {
    #[serde(rename = "SHA", default, deserialize_with = "empty_as_none")]
    pub sha: Option<String>,

    #[serde(rename = "ParentSHA", default, deserialize_with = "empty_as_none")]
    pub parent_sha: Option<String>,
}

/// Repository detail payload, also returned by the reset endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkStatus {
    #[serde(rename = "Owner", default)]
    pub owner: String,

    #[serde(rename = "Repo", default)]
    pub repo: String,

    #[serde(rename = "ParentOwner", default, deserialize_with = "empty_as_none")]
    pub parent_owner: Option<String>,

    #[serde(rename = "ParentRepo", default, deserialize_with = "empty_as_none")]
    pub parent_repo: Option<String>,

    #[serde(rename = "Branches", default)]
    pub branches: BTreeMap<String, BranchStatus>,
}

impl ForkStatus {
    pub fn parent_full_name(&self) -> Option<String> {
        match (&self.parent_owner, &self.parent_repo) {
            (Some(owner), Some(repo)) => Some(format!("{}/{}", owner, repo)),
            _ => None,
        }
    }
}

// The upstream server encodes a missing side as "".
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<String>::deserialize(deserializer)?;
    Ok(v.filter(|s| !s.is_empty()))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Branch {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "SHA")]
    pub sha: Option<String>,

    #[serde(rename = "ParentSHA")]
    pub parent_sha: Option<String>,
}

impl Branch {
    pub fn state(&self) -> BranchState {
        classify(self.sha.as_deref(), self.parent_sha.as_deref())
    }
}

/// Details for the selected repository, with the branch map flattened into a list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoDetails {
    pub status: ForkStatus,
    pub branch_list: Vec<Branch>,
}

impl RepoDetails {
    pub fn from_status(status: ForkStatus) -> Self {
        let branch_list = status
            .branches
            .iter()
            .map(|(name, b)| Branch {
                name: name.clone(),
                sha: b.sha.clone(),
                parent_sha: b.parent_sha.clone(),
            })
            .collect();
        Self {
            status,
            branch_list,
        }
    }

    pub fn summary(&self) -> DiffSummary {
        summarize(&self.branch_list)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchState {
    Unchanged,
    Created,
    Deleted,
    Reset,
}

impl BranchState {
    pub fn css_class(self) -> &'static str {
        match self {
            BranchState::Unchanged => "success",
            BranchState::Created => "info",
            BranchState::Deleted => "danger",
            BranchState::Reset => "warning",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BranchState::Unchanged => "unchanged",
            BranchState::Created => "created",
            BranchState::Deleted => "deleted",
            BranchState::Reset => "reset",
        }
    }
}

/// Classifies a branch by comparing its tip with the parent's tip.
///
/// Equality is checked first so a branch missing on both sides counts as unchanged.
pub fn classify(sha: Option<&str>, parent_sha: Option<&str>) -> BranchState {
    match (sha, parent_sha) {
        (a, b) if a == b => BranchState::Unchanged,
        (None, Some(_)) => BranchState::Created,
        (Some(_), None) => BranchState::Deleted,
        _ => BranchState::Reset,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub unchanged: usize,
    pub created: usize,
    pub deleted: usize,
    pub reset: usize,
}

impl DiffSummary {
    pub fn has_changes(&self) -> bool {
        self.created + self.deleted + self.reset > 0
    }

    pub fn total(&self) -> usize {
        self.unchanged + self.created + self.deleted + self.reset
    }

    fn record(mut self, state: BranchState) -> Self {
        match state {
            BranchState::Unchanged => self.unchanged += 1,
            BranchState::Created => self.created += 1,
            BranchState::Deleted => self.deleted += 1,
            BranchState::Reset => self.reset += 1,
        }
        self
    }
}

pub fn summarize(branches: &[Branch]) -> DiffSummary {
    branches
        .iter()
        .fold(DiffSummary::default(), |summary, b| summary.record(b.state()))
}

pub fn in_sync(details: Option<&RepoDetails>) -> bool {
    details.is_some_and(|d| !d.summary().has_changes())
}

#[cfg(test)]
#[path = "tests/model_tests.rs"]
mod tests;
