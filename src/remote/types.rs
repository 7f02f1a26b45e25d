//! Request descriptions, endpoint layout and the classified error type.

use std::time::Duration;

use crate::model::Repo;

/// Upper bound for one request, connect included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub login_token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(super::DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            login_token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_login_token(mut self, token: Option<String>) -> Self {
        self.login_token = token;
        self
    }

    pub fn repos_url(&self) -> String {
        self.endpoint(&["secure", "repos"], None)
    }

    pub fn repo_url(&self, repo: &Repo) -> String {
        self.endpoint(&["secure", "repos", &repo.owner, &repo.name], None)
    }

    pub fn resets_url(&self, repo: &Repo) -> String {
        self.endpoint(&["secure", "repos", &repo.owner, &repo.name, "resets"], None)
    }

    pub fn login_url(&self) -> String {
        let token = self.login_token.as_deref().map(|t| ("token", t));
        self.endpoint(&["login"], token)
    }

    pub fn logout_url(&self) -> String {
        self.endpoint(&["logout"], None)
    }

    // Segments and query values are percent-encoded. A base that does not parse as a URL
    // is joined verbatim and the request will fail when sent.
    fn endpoint(&self, segments: &[&str], query: Option<(&str, &str)>) -> String {
        let parsed = reqwest::Url::parse(&self.base_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base());
        let Some(mut url) = parsed else {
            let mut out = format!("{}/{}", self.base_url, segments.join("/"));
            if let Some((k, v)) = query {
                out.push_str(&format!("?{}={}", k, v));
            }
            return out;
        };
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if let Some((k, v)) = query {
            url.query_pairs_mut().append_pair(k, v);
        }
        url.to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Status 0 (no response) or 401.
    #[error("not logged in (status {status})")]
    NotAuthenticated { status: u16 },

    #[error("request failed (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("no session cookie to take a CSRF token from; log in first")]
    MissingCsrfToken,
}

impl ApiError {
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, ApiError::NotAuthenticated { .. })
    }
}

#[cfg(test)]
#[path = "../tests/remote/types_tests.rs"]
mod tests;
