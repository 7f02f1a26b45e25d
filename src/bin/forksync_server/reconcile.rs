//! Resetting a fork's branches to its parent.

use forksync::model::{BranchState, classify};

use super::*;

pub(super) const DEFAULT_MAX_BRANCH_COUNT: usize = 25;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum BranchAction {
    Noop,
    Create { to: String },
    Update { from: String, to: String },
    Delete { from: String },
}

#[derive(Debug, thiserror::Error)]
pub(super) enum ResetError {
    #[error("repository not found")]
    NotFound,

    #[error("repository has no parent to reset to")]
    NoParent,

    #[error(
        "too many branches found ({count}); max {max} for the unique sum of the repo and parent branches"
    )]
    TooManyBranches { count: usize, max: usize },

    #[error("backup ref {0} already exists")]
    BackupExists(String),

    #[error(transparent)]
    Forge(#[from] anyhow::Error),
}

/// What each branch needs so the fork matches its parent.
pub(super) fn plan_reset(status: &ForkStatus) -> Vec<(String, BranchAction)> {
    status
        .branches
        .iter()
        .map(|(name, b)| {
            let action = match (
                classify(b.sha.as_deref(), b.parent_sha.as_deref()),
                &b.sha,
                &b.parent_sha,
            ) {
                (BranchState::Created, _, Some(to)) => BranchAction::Create { to: to.clone() },
                (BranchState::Reset, Some(from), Some(to)) => BranchAction::Update {
                    from: from.clone(),
                    to: to.clone(),
                },
                (BranchState::Deleted, Some(from), _) => BranchAction::Delete { from: from.clone() },
                _ => BranchAction::Noop,
            };
            (name.clone(), action)
        })
        .collect()
}

pub(super) fn backup_stamp() -> String {
    let fmt = time::macros::format_description!("[year][month][day][hour][minute][second]");
    time::OffsetDateTime::now_utc()
        .format(&fmt)
        .unwrap_or_else(|_| "00000000000000".to_string())
}

/// Backs up every existing branch under `refs/backups/<stamp>/` and then moves, creates or
/// deletes branches until they match the parent. Returns the resulting status.
pub(super) fn reset_fork(
    forge: &mut ForgeState,
    owner: &str,
    name: &str,
    max_branch_count: usize,
    stamp: &str,
) -> Result<ForkStatus, ResetError> {
    let status = forge
        .fork_status(owner, name)?
        .ok_or(ResetError::NotFound)?;
    if status.parent_owner.is_none() {
        return Err(ResetError::NoParent);
    }
    if status.branches.len() > max_branch_count {
        return Err(ResetError::TooManyBranches {
            count: status.branches.len(),
            max: max_branch_count,
        });
    }

    let plan = plan_reset(&status);
    let repo = forge.find_mut(owner, name).ok_or(ResetError::NotFound)?;

    let backups = repo
        .heads
        .iter()
        .map(|(branch, sha)| (format!("refs/backups/{}/{}", stamp, branch), sha.clone()))
        .collect::<Vec<_>>();
    if let Some((path, _)) = backups.iter().find(|(p, _)| repo.backups.contains_key(p)) {
        return Err(ResetError::BackupExists(path.clone()));
    }
    for (path, sha) in backups {
        tracing::debug!(%path, %sha, "backup");
        repo.backups.insert(path, sha);
    }

    for (branch, action) in plan {
        match action {
            BranchAction::Noop => {}
            BranchAction::Create { to } => {
                tracing::info!(%branch, %to, "create");
                repo.heads.insert(branch, to);
            }
            BranchAction::Update { from, to } => {
                tracing::info!(%branch, %from, %to, "update");
                repo.heads.insert(branch, to);
            }
            BranchAction::Delete { from } => {
                tracing::info!(%branch, %from, "delete");
                repo.heads.remove(&branch);
            }
        }
    }

    forge.fork_status(owner, name)?.ok_or(ResetError::NotFound)
}

#[cfg(test)]
#[path = "../../tests/bin/forksync_server/reconcile_tests.rs"]
mod tests;
