use super::*;

pub(super) async fn list_repos(State(state): State<Arc<AppState>>) -> Response {
    let forge = state.forge.read().await;
    Json(forge.list_resettable()).into_response()
}

pub(super) async fn get_repo(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
) -> Response {
    let forge = state.forge.read().await;
    match forge.fork_status(&owner, &name) {
        Ok(Some(status)) => Json(status).into_response(),
        Ok(None) => not_found("repository not found"),
        Err(err) => internal_error(err),
    }
}

pub(super) async fn reset_repo(
    State(state): State<Arc<AppState>>,
    Path((owner, name)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !csrf_ok(&headers) {
        tracing::warn!(%owner, %name, "reset rejected: CSRF failure");
        return unauthorized("CSRF failure");
    }

    let mut forge = state.forge.write().await;
    // Work on a copy so a failed persist leaves the served state untouched.
    let mut next = forge.clone();
    let status = match reset_fork(
        &mut next,
        &owner,
        &name,
        state.max_branch_count,
        &backup_stamp(),
    ) {
        Ok(status) => status,
        Err(ResetError::NotFound) => return not_found("repository not found"),
        Err(err @ (ResetError::NoParent
        | ResetError::TooManyBranches { .. }
        | ResetError::BackupExists(_))) => return conflict(&err.to_string()),
        Err(ResetError::Forge(err)) => return internal_error(err),
    };

    if let Err(err) = persist_forge(&state.data_dir, &next) {
        return internal_error(err);
    }
    *forge = next;
    tracing::info!(%owner, %name, branches = status.branches.len(), "reset complete");

    Json(status).into_response()
}
