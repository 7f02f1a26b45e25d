//! Session-protected routes, mounted under `/secure`.

use super::*;

pub(super) fn secure_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/repos", get(list_repos))
        .route("/repos/:owner/:name", get(get_repo))
        .route("/repos/:owner/:name/resets", post(reset_repo))
        .layer(middleware::from_fn_with_state(state, require_session))
}
