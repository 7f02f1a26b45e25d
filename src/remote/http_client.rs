use std::sync::OnceLock;

use regex::Regex;

use super::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Ok,
    NotAuthenticated,
    ServerError,
}

pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Ok,
        0 | 401 => StatusClass::NotAuthenticated,
        _ => StatusClass::ServerError,
    }
}

/// Extracts the `session` cookie value from a `Cookie` header string.
pub fn csrf_token_from_cookies(header: &str) -> Option<String> {
    static SESSION_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = SESSION_RE
        .get_or_init(|| Regex::new(r"(?:^|;\s*)session=([^;]+)").ok())
        .as_ref()?;
    re.captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub(super) fn error_for(status: u16, body: &[u8]) -> ApiError {
    match classify_status(status) {
        StatusClass::NotAuthenticated => ApiError::NotAuthenticated { status },
        _ => ApiError::Server {
            status,
            message: error_message(status, body),
        },
    }
}

fn error_message(status: u16, body: &[u8]) -> String {
    let from_json = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s),
            v => v.get("error").and_then(|e| e.as_str()).map(str::to_string),
        });
    from_json.unwrap_or_else(|| {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("unexpected response")
            .to_string()
    })
}

impl ApiClient {
    pub(super) fn execute(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, ApiError> {
        let resp = match builder
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
        {
            Ok(resp) => resp,
            Err(err) => {
                tracing::debug!(error = %err, "transport failure");
                return Err(ApiError::NotAuthenticated { status: 0 });
            }
        };

        let status = resp.status().as_u16();
        let body = match resp.bytes() {
            Ok(body) => body,
            Err(err) => {
                return Err(ApiError::Server {
                    status,
                    message: format!("read body: {}", err),
                });
            }
        };

        if classify_status(status) != StatusClass::Ok {
            return Err(error_for(status, &body));
        }

        serde_json::from_slice(&body).map_err(|err| ApiError::Server {
            status,
            message: format!("parse response: {}", err),
        })
    }
}

#[cfg(test)]
#[path = "../tests/remote/http_client_tests.rs"]
mod tests;
