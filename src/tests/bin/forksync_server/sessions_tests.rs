use axum::http::HeaderValue;

use super::*;

fn headers(cookie: Option<&str>, csrf: Option<&str>) -> HeaderMap {
    let mut map = HeaderMap::new();
    if let Some(c) = cookie {
        map.insert(header::COOKIE, HeaderValue::from_str(c).expect("cookie"));
    }
    if let Some(t) = csrf {
        map.insert(CSRF_HEADER, HeaderValue::from_str(t).expect("csrf"));
    }
    map
}

#[test]
fn session_secrets_are_unique_hex() {
    let a = generate_session_secret().expect("secret");
    let b = generate_session_secret().expect("secret");
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
}

#[test]
fn hash_token_is_stable_and_hides_input() {
    assert_eq!(hash_token("dev"), hash_token("dev"));
    assert_ne!(hash_token("dev"), "dev");
    assert_ne!(hash_token("dev"), hash_token("dev2"));
}

#[test]
fn session_secret_reads_named_cookie() {
    let h = headers(Some("theme=dark; session=abc123; other=1"), None);
    assert_eq!(session_secret(&h).as_deref(), Some("abc123"));

    let h = headers(Some("oldsession=zzz"), None);
    assert_eq!(session_secret(&h), None);
}

#[test]
fn csrf_requires_header_equal_to_cookie() {
    assert!(csrf_ok(&headers(Some("session=abc"), Some("abc"))));
    assert!(!csrf_ok(&headers(Some("session=abc"), Some("abd"))));
    assert!(!csrf_ok(&headers(Some("session=abc"), None)));
    assert!(!csrf_ok(&headers(None, Some("abc"))));
}

#[test]
fn sessions_expire_after_ttl() {
    let now = std::time::Instant::now();
    let mut store = SessionStore::new(Duration::from_secs(60), 8);
    store.insert(hash_token("a"), now);

    assert!(store.is_live(&hash_token("a"), now + Duration::from_secs(59)));
    assert!(!store.is_live(&hash_token("a"), now + Duration::from_secs(60)));
    assert!(!store.is_live(&hash_token("b"), now));

    // Expired entries are dropped on the next login.
    store.insert(hash_token("b"), now + Duration::from_secs(61));
    assert_eq!(store.len(), 1);
}

#[test]
fn session_store_is_bounded() {
    let now = std::time::Instant::now();
    let mut store = SessionStore::new(Duration::from_secs(60), 3);
    for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
        store.insert(hash_token(name), now + Duration::from_secs(i as u64));
    }

    assert_eq!(store.len(), 3);
    let later = now + Duration::from_secs(4);
    assert!(!store.is_live(&hash_token("a"), later), "oldest evicted");
    assert!(store.is_live(&hash_token("d"), later));
}

#[test]
fn logout_removes_session() {
    let now = std::time::Instant::now();
    let mut store = SessionStore::new(Duration::from_secs(60), 8);
    store.insert(hash_token("a"), now);
    assert!(store.remove(&hash_token("a")));
    assert!(!store.remove(&hash_token("a")));
    assert!(!store.is_live(&hash_token("a"), now));
}
