use super::*;

#[test]
fn classify_status_maps_zero_and_401_to_not_authenticated() {
    assert_eq!(classify_status(0), StatusClass::NotAuthenticated);
    assert_eq!(classify_status(401), StatusClass::NotAuthenticated);
    assert_eq!(classify_status(200), StatusClass::Ok);
    assert_eq!(classify_status(500), StatusClass::ServerError);
    assert_eq!(classify_status(403), StatusClass::ServerError);
    assert_eq!(classify_status(409), StatusClass::ServerError);
}

#[test]
fn csrf_token_is_read_from_session_cookie() {
    assert_eq!(
        csrf_token_from_cookies("session=abc123"),
        Some("abc123".to_string())
    );
    assert_eq!(
        csrf_token_from_cookies("theme=dark; session=abc123; other=1"),
        Some("abc123".to_string())
    );
    assert_eq!(csrf_token_from_cookies("theme=dark"), None);
    assert_eq!(csrf_token_from_cookies("oldsession=nope"), None);
    assert_eq!(csrf_token_from_cookies(""), None);
}

#[test]
fn error_for_prefers_error_field_from_body() {
    let err = error_for(409, br#"{"error":"too many branches"}"#);
    assert_eq!(
        err,
        ApiError::Server {
            status: 409,
            message: "too many branches".to_string(),
        }
    );
}

#[test]
fn error_for_accepts_bare_json_strings_and_falls_back_to_reason() {
    let err = error_for(500, br#""boom""#);
    assert!(err.to_string().contains("boom"), "{}", err);

    let err = error_for(502, b"<html>");
    assert!(err.to_string().contains("Bad Gateway"), "{}", err);

    let err = error_for(401, b"");
    assert!(err.is_not_authenticated());
}

#[test]
fn silent_server_times_out_as_no_response() {
    use std::time::{Duration, Instant};

    use crate::remote::{ApiClient, ApiRequest, ClientConfig, Transport};

    // Accepts connections into the backlog but never answers.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let client =
        ApiClient::new(ClientConfig::new(base).with_timeout(Duration::from_millis(200))).unwrap();

    let started = Instant::now();
    let err = client
        .send(&ApiRequest::get(client.config().repos_url()))
        .unwrap_err();

    assert_eq!(err, ApiError::NotAuthenticated { status: 0 });
    assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());
    drop(listener);
}
