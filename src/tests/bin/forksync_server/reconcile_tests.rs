use std::collections::BTreeMap;

use tempfile::tempdir;

use super::*;

fn heads(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(b, s)| (b.to_string(), s.to_string()))
        .collect()
}

fn repo(owner: &str, name: &str, parent: Option<&str>, pairs: &[(&str, &str)]) -> ForgeRepo {
    ForgeRepo {
        owner: owner.to_string(),
        name: name.to_string(),
        url: None,
        fork: parent.is_some(),
        push: true,
        parent: parent.map(str::to_string),
        heads: heads(pairs),
        backups: BTreeMap::new(),
    }
}

fn forge() -> ForgeState {
    ForgeState {
        repos: vec![
            repo(
                "upstream",
                "widget",
                None,
                &[("main", "p1"), ("feature", "p2"), ("next", "p3")],
            ),
            repo(
                "alice",
                "widget",
                Some("upstream/widget"),
                &[("main", "p1"), ("feature", "a2"), ("scratch", "a9")],
            ),
        ],
    }
}

#[test]
fn plan_covers_every_branch_state() {
    let status = forge()
        .fork_status("alice", "widget")
        .expect("status")
        .expect("repo exists");

    let plan: BTreeMap<_, _> = plan_reset(&status).into_iter().collect();

    assert_eq!(plan["main"], BranchAction::Noop);
    assert_eq!(
        plan["feature"],
        BranchAction::Update {
            from: "a2".to_string(),
            to: "p2".to_string()
        }
    );
    assert_eq!(
        plan["next"],
        BranchAction::Create {
            to: "p3".to_string()
        }
    );
    assert_eq!(
        plan["scratch"],
        BranchAction::Delete {
            from: "a9".to_string()
        }
    );
}

#[test]
fn reset_fork_matches_parent_and_backs_up_old_heads() {
    let mut forge = forge();

    let status = reset_fork(&mut forge, "alice", "widget", 25, "20240102030405").expect("reset");

    assert_eq!(status.branches.len(), 3);
    assert!(
        status
            .branches
            .values()
            .all(|b| b.sha.is_some() && b.sha == b.parent_sha)
    );

    let fork = forge.find("alice", "widget").expect("fork");
    assert_eq!(fork.heads, heads(&[("main", "p1"), ("feature", "p2"), ("next", "p3")]));
    assert_eq!(
        fork.backups,
        heads(&[
            ("refs/backups/20240102030405/feature", "a2"),
            ("refs/backups/20240102030405/main", "p1"),
            ("refs/backups/20240102030405/scratch", "a9"),
        ])
    );

    // The parent is never touched.
    let parent = forge.find("upstream", "widget").expect("parent");
    assert_eq!(parent.heads.len(), 3);
    assert!(parent.backups.is_empty());
}

#[test]
fn reset_fork_refuses_to_overwrite_a_backup() {
    let mut forge = forge();
    reset_fork(&mut forge, "alice", "widget", 25, "20240102030405").expect("first reset");

    let err = reset_fork(&mut forge, "alice", "widget", 25, "20240102030405")
        .expect_err("same stamp should collide");
    assert!(matches!(err, ResetError::BackupExists(_)));
}

#[test]
fn reset_fork_rejects_repos_without_parent() {
    let mut forge = forge();
    let err = reset_fork(&mut forge, "upstream", "widget", 25, "x").expect_err("no parent");
    assert!(matches!(err, ResetError::NoParent));
}

#[test]
fn reset_fork_reports_unknown_repos() {
    let mut forge = forge();
    let err = reset_fork(&mut forge, "bob", "widget", 25, "x").expect_err("missing");
    assert!(matches!(err, ResetError::NotFound));
}

#[test]
fn reset_fork_counts_union_of_branches_against_limit() {
    let mut forge = forge();
    // Four distinct names across fork and parent.
    let err = reset_fork(&mut forge, "alice", "widget", 3, "x").expect_err("too many");
    match err {
        ResetError::TooManyBranches { count, max } => {
            assert_eq!(count, 4);
            assert_eq!(max, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
    let fork = forge.find("alice", "widget").expect("fork");
    assert!(fork.backups.is_empty(), "nothing written on refusal");
}

#[test]
fn dangling_parent_reference_is_a_forge_error() {
    let mut forge = forge();
    forge.repos.push(repo("carol", "widget", Some("gone/widget"), &[("main", "c1")]));

    let err = reset_fork(&mut forge, "carol", "widget", 25, "x").expect_err("dangling");
    assert!(matches!(err, ResetError::Forge(_)));
}

#[test]
fn forge_state_round_trips_through_data_dir() {
    let temp = tempdir().expect("create temp dir");
    let mut state = forge();
    reset_fork(&mut state, "alice", "widget", 25, "20240102030405").expect("reset");

    persist_forge(temp.path(), &state).expect("persist");
    let loaded = load_forge(temp.path()).expect("load");

    let fork = loaded.find("alice", "widget").expect("fork");
    assert_eq!(fork.backups.len(), 3);
    assert_eq!(fork.heads["feature"], "p2");
}

#[test]
fn missing_forge_file_loads_empty() {
    let temp = tempdir().expect("create temp dir");
    let loaded = load_forge(temp.path()).expect("load");
    assert!(loaded.repos.is_empty());
}

#[test]
fn list_resettable_keeps_pushable_forks_only() {
    let mut state = forge();
    let mut readonly = repo("dave", "widget", Some("upstream/widget"), &[]);
    readonly.push = false;
    state.repos.push(readonly);

    let listed = state.list_resettable();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].full_name, "alice/widget");
}

#[test]
fn backup_stamp_is_fourteen_digits() {
    let stamp = backup_stamp();
    assert_eq!(stamp.len(), 14);
    assert!(stamp.chars().all(|c| c.is_ascii_digit()));
}
