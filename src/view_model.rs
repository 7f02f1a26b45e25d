//! View-model for browsing forks and resetting them to their parent.
//!
//! [`Model`] owns the state cells. Operations update cells synchronously and queue
//! [`Effect`]s; whoever drives the model runs those effects against a [`Transport`] and
//! hands the resulting [`Completion`]s back to [`Model::apply`]. Each detail load and reset
//! carries a ticket, and a completion whose ticket is no longer current is dropped, so a
//! slow response for a previous selection never replaces the details of the current one.

use std::collections::VecDeque;

use crate::model::{BranchState, DiffSummary, ForkStatus, Repo, RepoDetails};
use crate::remote::{ApiError, ApiRequest, ClientConfig, Transport};
use crate::state::Observable;

pub type Ticket = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Purpose {
    Repos,
    Details,
    Reset,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Effect {
    pub ticket: Ticket,
    pub purpose: Purpose,
    pub repo: Option<Repo>,
    pub request: ApiRequest,
}

impl Effect {
    pub fn run<T: Transport + ?Sized>(self, transport: &T) -> Completion {
        let outcome = transport.send(&self.request);
        Completion {
            ticket: self.ticket,
            purpose: self.purpose,
            repo: self.repo,
            outcome,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Completion {
    pub ticket: Ticket,
    pub purpose: Purpose,
    pub repo: Option<Repo>,
    pub outcome: Result<serde_json::Value, ApiError>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("reset requested while the confirmation does not match the selected repository")]
    ResetNotEnabled,
}

/// Where the view has to send the user to flip the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionNavigation {
    Login(String),
    Logout(String),
}

impl SessionNavigation {
    pub fn url(&self) -> &str {
        match self {
            SessionNavigation::Login(url) | SessionNavigation::Logout(url) => url,
        }
    }
}

pub struct Model {
    config: ClientConfig,

    pub ready: Observable<bool>,
    pub logged_in: Observable<bool>,
    pub repos: Observable<Vec<Repo>>,
    pub selected_repo: Observable<Option<Repo>>,
    pub selected_repo_details: Observable<Option<RepoDetails>>,
    pub view_selected_repo_details: Observable<bool>,
    pub user_entered_full_name: Observable<Option<String>>,
    pub last_error: Observable<Option<String>>,

    // Derived; recomputed after every mutation.
    pub loading_repo_details: Observable<bool>,
    pub reset_enabled: Observable<bool>,
    pub selected_repo_summary: Observable<Option<DiffSummary>>,
    pub selected_repo_has_changes: Observable<bool>,
    pub selected_repo_in_sync: Observable<bool>,

    effects: VecDeque<Effect>,
    next_ticket: Ticket,
    repos_ticket: Option<Ticket>,
    details_ticket: Option<Ticket>,
}

impl Model {
    /// Creates the model and queues the initial repository refresh.
    pub fn new(config: ClientConfig) -> Self {
        let mut model = Self {
            config,
            ready: Observable::new(false),
            logged_in: Observable::new(false),
            repos: Observable::new(Vec::new()),
            selected_repo: Observable::new(None),
            selected_repo_details: Observable::new(None),
            view_selected_repo_details: Observable::new(false),
            user_entered_full_name: Observable::new(None),
            last_error: Observable::new(None),
            loading_repo_details: Observable::new(false),
            reset_enabled: Observable::new(false),
            selected_repo_summary: Observable::new(None),
            selected_repo_has_changes: Observable::new(false),
            selected_repo_in_sync: Observable::new(false),
            effects: VecDeque::new(),
            next_ticket: 0,
            repos_ticket: None,
            details_ticket: None,
        };
        model.refresh_repos();
        model
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn refresh_repos(&mut self) -> Ticket {
        let ticket = self.issue(Purpose::Repos, None, ApiRequest::get(self.config.repos_url()));
        self.repos_ticket = Some(ticket);
        ticket
    }

    /// Changes the selection. A new selection starts a detail load; clearing it drops
    /// whatever was shown. Selecting the current repository again reloads its details when
    /// none are shown and no load is in flight, e.g. after a failed load or reset.
    pub fn select_repo(&mut self, repo: Option<Repo>) {
        if self.selected_repo.set(repo.map(Repo::annotate)) {
            self.load_selected_repo_details();
        } else if self.details_stalled() {
            self.load_selected_repo_details();
        }
    }

    fn details_stalled(&self) -> bool {
        self.details_ticket.is_none()
            && self.selected_repo.with(Option::is_some)
            && self.selected_repo_details.with(Option::is_none)
    }

    /// Clears the current details and, if a repository is selected, fetches them again.
    pub fn load_selected_repo_details(&mut self) -> Option<Ticket> {
        self.selected_repo_details.set(None);
        self.details_ticket = None;
        let ticket = self.selected_repo.get().map(|repo| {
            let request = ApiRequest::get(self.config.repo_url(&repo));
            self.issue(Purpose::Details, Some(repo), request)
        });
        self.details_ticket = ticket;
        self.recompute();
        ticket
    }

    pub fn set_confirmation(&mut self, text: Option<String>) {
        self.user_entered_full_name.set(text);
        self.recompute();
    }

    pub fn toggle_selected_repo_details(&mut self) {
        let shown = self.view_selected_repo_details.get();
        self.view_selected_repo_details.set(!shown);
    }

    pub fn toggle_session(&self) -> SessionNavigation {
        if self.logged_in.get() {
            SessionNavigation::Logout(self.config.logout_url())
        } else {
            SessionNavigation::Login(self.config.login_url())
        }
    }

    pub fn branch_class_name(&self, state: BranchState) -> &'static str {
        state.css_class()
    }

    /// Resets the selected repository to its parent.
    ///
    /// Only valid while `reset_enabled` holds; otherwise nothing is queued and
    /// [`ModelError::ResetNotEnabled`] is returned.
    pub fn reset(&mut self) -> Result<Ticket, ModelError> {
        let repo = match self.selected_repo.get() {
            Some(repo) if self.reset_enabled.get() => repo,
            _ => {
                tracing::error!("reset invoked while the confirmation gate is closed");
                return Err(ModelError::ResetNotEnabled);
            }
        };

        self.user_entered_full_name.set(None);
        self.selected_repo_details.set(None);
        let request = ApiRequest::post(self.config.resets_url(&repo));
        let ticket = self.issue(Purpose::Reset, Some(repo), request);
        self.details_ticket = Some(ticket);
        self.recompute();
        Ok(ticket)
    }

    pub fn next_effect(&mut self) -> Option<Effect> {
        self.effects.pop_front()
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        self.effects.drain(..).collect()
    }

    pub fn has_pending_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    /// Publishes the result of an effect.
    pub fn apply(&mut self, completion: Completion) {
        let Completion {
            ticket,
            purpose,
            repo,
            outcome,
        } = completion;

        match &outcome {
            Ok(_) => {
                self.logged_in.set(true);
            }
            Err(ApiError::NotAuthenticated { .. }) => {
                self.logged_in.set(false);
            }
            Err(_) => {}
        }

        match purpose {
            Purpose::Repos => {
                self.ready.set(true);
                if self.repos_ticket != Some(ticket) {
                    tracing::debug!(ticket, "dropping superseded repo list");
                    return;
                }
                self.repos_ticket = None;
                match outcome.and_then(|v| decode::<Vec<Repo>>(v, "repository list")) {
                    Ok(repos) => {
                        self.repos
                            .set(repos.into_iter().map(Repo::annotate).collect());
                        self.last_error.set(None);
                    }
                    Err(err) => self.report(err),
                }
            }
            Purpose::Details | Purpose::Reset => {
                let current = self.details_ticket == Some(ticket)
                    && match (&repo, self.selected_repo.get()) {
                        (Some(a), Some(b)) => a.is_same(&b),
                        _ => false,
                    };
                if !current {
                    tracing::debug!(ticket, ?purpose, "dropping stale repository details");
                    return;
                }
                self.details_ticket = None;
                match outcome.and_then(|v| decode::<ForkStatus>(v, "repository details")) {
                    Ok(status) => {
                        self.selected_repo_details
                            .set(Some(RepoDetails::from_status(status)));
                        self.last_error.set(None);
                    }
                    Err(err) => self.report(err),
                }
            }
        }

        self.recompute();
    }

    fn issue(&mut self, purpose: Purpose, repo: Option<Repo>, request: ApiRequest) -> Ticket {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        tracing::debug!(ticket, ?purpose, url = %request.url, "queue request");
        self.effects.push_back(Effect {
            ticket,
            purpose,
            repo,
            request,
        });
        ticket
    }

    fn report(&mut self, err: ApiError) {
        match err {
            ApiError::NotAuthenticated { .. } => {
                self.last_error.set(None);
            }
            err => {
                self.last_error.set(Some(err.to_string()));
            }
        }
    }

    fn recompute(&mut self) {
        let selected = self.selected_repo.get();
        let details = self.selected_repo_details.get();

        self.loading_repo_details
            .set(selected.is_some() && details.is_none() && self.details_ticket.is_some());

        let enabled = match (&selected, self.user_entered_full_name.get()) {
            (Some(repo), Some(typed)) => typed == format!("{}/{}", repo.owner, repo.name),
            _ => false,
        };
        self.reset_enabled.set(enabled);

        let summary = details.as_ref().map(RepoDetails::summary);
        self.selected_repo_summary.set(summary);
        let has_changes = summary.is_some_and(|s| s.has_changes());
        self.selected_repo_has_changes.set(has_changes);
        self.selected_repo_in_sync
            .set(details.is_some() && !has_changes);
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    what: &str,
) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::Server {
        status: 200,
        message: format!("parse {}: {}", what, err),
    })
}

/// Runs queued effects inline until the model has nothing left to do.
pub fn drive<T: Transport + ?Sized>(model: &mut Model, transport: &T) {
    while let Some(effect) = model.next_effect() {
        let completion = effect.run(transport);
        model.apply(completion);
    }
}

#[cfg(test)]
#[path = "tests/view_model_tests.rs"]
mod tests;
