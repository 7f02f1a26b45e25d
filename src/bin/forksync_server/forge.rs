//! File-backed stand-in for the hosted Git provider: repositories, their parent links,
//! and branch heads.

use std::collections::BTreeMap;

use forksync::model::BranchStatus;

use super::*;

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub(super) struct ForgeState {
    #[serde(default)]
    pub(super) repos: Vec<ForgeRepo>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub(super) struct ForgeRepo {
    pub(super) owner: String,
    pub(super) name: String,

    #[serde(default)]
    pub(super) url: Option<String>,

    #[serde(default)]
    pub(super) fork: bool,

    // Whether the signed-in user may push.
    #[serde(default = "default_true")]
    pub(super) push: bool,

    // "owner/name" of the repository this one was forked from.
    #[serde(default)]
    pub(super) parent: Option<String>,

    // Branch name -> commit.
    #[serde(default)]
    pub(super) heads: BTreeMap<String, String>,

    // Full ref path -> commit, written before every reset.
    #[serde(default)]
    pub(super) backups: BTreeMap<String, String>,
}

impl ForgeRepo {
    fn matches(&self, owner: &str, name: &str) -> bool {
        self.owner == owner && self.name == name
    }
}

impl ForgeState {
    pub(super) fn find(&self, owner: &str, name: &str) -> Option<&ForgeRepo> {
        self.repos.iter().find(|r| r.matches(owner, name))
    }

    pub(super) fn find_mut(&mut self, owner: &str, name: &str) -> Option<&mut ForgeRepo> {
        self.repos.iter_mut().find(|r| r.matches(owner, name))
    }

    /// Forks the user can push to; only those can be reset.
    pub(super) fn list_resettable(&self) -> Vec<Repo> {
        self.repos
            .iter()
            .filter(|r| r.fork && r.push)
            .map(|r| Repo {
                url: r.url.clone(),
                ..Repo::new(r.owner.clone(), r.name.clone())
            })
            .collect()
    }

    /// Pairs every branch of the repository with the same branch on its parent.
    pub(super) fn fork_status(&self, owner: &str, name: &str) -> Result<Option<ForkStatus>> {
        let Some(repo) = self.find(owner, name) else {
            return Ok(None);
        };

        let mut status = ForkStatus {
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
            ..ForkStatus::default()
        };
        for (branch, sha) in &repo.heads {
            status.branches.insert(
                branch.clone(),
                BranchStatus {
                    sha: Some(sha.clone()),
                    parent_sha: None,
                },
            );
        }

        if let Some(parent) = &repo.parent {
            let (parent_owner, parent_name) = forksync::model::parse_full_name(parent)
                .with_context(|| format!("bad parent reference on {}/{}", owner, name))?;
            let parent_repo = self
                .find(&parent_owner, &parent_name)
                .with_context(|| format!("parent repository {} not found", parent))?;

            status.parent_owner = Some(parent_repo.owner.clone());
            status.parent_repo = Some(parent_repo.name.clone());
            for (branch, sha) in &parent_repo.heads {
                status
                    .branches
                    .entry(branch.clone())
                    .or_default()
                    .parent_sha = Some(sha.clone());
            }
        }

        Ok(Some(status))
    }
}

pub(super) fn forge_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("forks.json")
}

pub(super) fn load_forge(data_dir: &std::path::Path) -> Result<ForgeState> {
    let path = forge_path(data_dir);
    if !path.exists() {
        return Ok(ForgeState::default());
    }
    let bytes = std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
}

pub(super) fn persist_forge(data_dir: &std::path::Path, forge: &ForgeState) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(forge).context("serialize forge state")?;
    write_atomic_overwrite(&forge_path(data_dir), &bytes).context("write forks.json")
}

pub(super) fn write_atomic_overwrite(path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    std::fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
