//! HTTP client adapter for the fork reset API.
//!
//! Every request carries the session cookie jar. Failures never escape as anything other
//! than a classified [`ApiError`].

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::cookie::Jar;

mod http_client;
pub use self::http_client::{StatusClass, classify_status, csrf_token_from_cookies};

mod types;
pub use self::types::*;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const CSRF_HEADER: &str = "X-Csrf-Token";
pub const SESSION_COOKIE: &str = "session";

/// Anything that can execute an [`ApiRequest`] and hand back the decoded JSON body.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<serde_json::Value, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &ApiRequest) -> Result<serde_json::Value, ApiError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &ApiRequest) -> Result<serde_json::Value, ApiError> {
        (**self).send(request)
    }
}

#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    jar: Arc<Jar>,
    client: reqwest::blocking::Client,
    navigator: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = reqwest::blocking::Client::builder()
            .user_agent("forksync")
            .cookie_provider(jar.clone())
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .context("build reqwest client")?;
        // Login/logout answer with a redirect that carries the cookie; stop there.
        let navigator = reqwest::blocking::Client::builder()
            .user_agent("forksync")
            .cookie_provider(jar.clone())
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.timeout)
            .build()
            .context("build navigation client")?;
        Ok(Self {
            config,
            jar,
            client,
            navigator,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full-page style navigation, used for `/login` and `/logout`.
    pub fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!(url, "navigate");
        let resp = self
            .navigator
            .get(url)
            .send()
            .with_context(|| format!("navigate to {}", url))?;
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            anyhow::bail!("login rejected (check --login-token)");
        }
        if !(status.is_success() || status.is_redirection()) {
            anyhow::bail!("navigate to {} failed with status {}", url, status);
        }
        Ok(())
    }

    pub fn login(&self) -> Result<()> {
        self.navigate(&self.config.login_url())
    }

    pub fn logout(&self) -> Result<()> {
        self.navigate(&self.config.logout_url())
    }

    /// Reads the anti-forgery token from the `session` cookie for the API origin.
    pub fn csrf_token(&self) -> Option<String> {
        use reqwest::cookie::CookieStore;

        let url = reqwest::Url::parse(&self.config.base_url).ok()?;
        let header = self.jar.cookies(&url)?;
        csrf_token_from_cookies(header.to_str().ok()?)
    }
}

impl Transport for ApiClient {
    fn send(&self, request: &ApiRequest) -> Result<serde_json::Value, ApiError> {
        let outcome = match request.method {
            Method::Get => self.execute(self.client.get(&request.url)),
            Method::Post => match self.csrf_token() {
                Some(token) => self.execute(
                    self.client
                        .post(&request.url)
                        .header(CSRF_HEADER, token),
                ),
                None => Err(ApiError::MissingCsrfToken),
            },
        };
        if let Err(err) = &outcome {
            tracing::warn!(method = ?request.method, url = %request.url, error = %err, "request failed");
        }
        outcome
    }
}
