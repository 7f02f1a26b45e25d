use anyhow::{Context, Result};

use forksync::model::{Branch, BranchState, DiffSummary, Repo, RepoDetails, parse_full_name};
use forksync::remote::ApiClient;
use forksync::view_model::{Model, drive};

use crate::Commands;

#[derive(serde::Serialize)]
struct BranchRow<'a> {
    #[serde(flatten)]
    branch: &'a Branch,
    state: BranchState,
}

#[derive(serde::Serialize)]
struct StatusOutput<'a> {
    repo: String,
    parent: Option<String>,
    summary: DiffSummary,
    in_sync: bool,
    branches: Vec<BranchRow<'a>>,
}

pub(crate) fn handle_command(client: &ApiClient, command: Commands) -> Result<()> {
    match command {
        Commands::Tui => forksync::tui::run(client.clone())?,
        Commands::Repos { json } => {
            let model = load_model(client)?;
            let repos = model.repos.get();
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&repos).context("serialize repos json")?
                );
            } else if repos.is_empty() {
                println!("No forks found");
            } else {
                for r in repos {
                    println!("{}", r.full_name);
                }
            }
        }
        Commands::Status { repo, json } => {
            let mut model = load_model(client)?;
            let details = select_and_load(&mut model, client, &repo)?;
            print_status(&model, &details, json)?;
        }
        Commands::Reset {
            repo,
            confirm,
            json,
        } => {
            let (owner, name) = parse_full_name(&repo)?;
            if confirm != format!("{}/{}", owner, name) {
                anyhow::bail!(
                    "confirmation {:?} does not match {}/{}; nothing was reset",
                    confirm,
                    owner,
                    name
                );
            }

            let mut model = load_model(client)?;
            select_and_load(&mut model, client, &repo)?;
            model.set_confirmation(Some(confirm));
            model.reset().context("reset")?;
            drive(&mut model, client);
            settle(&model)?;

            let details = model
                .selected_repo_details
                .get()
                .context("server returned no repository details after reset")?;
            if !json {
                if model.selected_repo_in_sync.get() {
                    println!("Reset {}: in sync with parent", repo);
                } else {
                    println!("Reset {}: still out of sync", repo);
                }
            }
            print_status(&model, &details, json)?;
        }
    }

    Ok(())
}

fn load_model(client: &ApiClient) -> Result<Model> {
    let mut model = Model::new(client.config().clone());
    drive(&mut model, client);
    settle(&model)?;
    Ok(model)
}

fn select_and_load(model: &mut Model, client: &ApiClient, full_name: &str) -> Result<RepoDetails> {
    let (owner, name) = parse_full_name(full_name)?;
    model.select_repo(Some(Repo::new(owner, name)));
    drive(model, client);
    settle(model)?;
    model
        .selected_repo_details
        .get()
        .with_context(|| format!("no details for {}", full_name))
}

fn settle(model: &Model) -> Result<()> {
    if !model.logged_in.get() {
        anyhow::bail!("not logged in (pass --login-token or set FORKSYNC_LOGIN_TOKEN)");
    }
    if let Some(err) = model.last_error.get() {
        anyhow::bail!(err);
    }
    Ok(())
}

fn print_status(model: &Model, details: &RepoDetails, json: bool) -> Result<()> {
    let summary = details.summary();
    if json {
        let out = StatusOutput {
            repo: format!("{}/{}", details.status.owner, details.status.repo),
            parent: details.status.parent_full_name(),
            summary,
            in_sync: model.selected_repo_in_sync.get(),
            branches: details
                .branch_list
                .iter()
                .map(|b| BranchRow {
                    branch: b,
                    state: b.state(),
                })
                .collect(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("serialize status json")?
        );
        return Ok(());
    }

    println!("repo: {}/{}", details.status.owner, details.status.repo);
    println!(
        "parent: {}",
        details
            .status
            .parent_full_name()
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!(
        "branches: unchanged={} created={} deleted={} reset={}",
        summary.unchanged, summary.created, summary.deleted, summary.reset
    );
    for b in &details.branch_list {
        println!(
            "{:<10} {:<24} {} -> {}",
            b.state().label(),
            b.name,
            b.sha.as_deref().unwrap_or("-"),
            b.parent_sha.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
