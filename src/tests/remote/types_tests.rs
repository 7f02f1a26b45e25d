use super::*;

#[test]
fn endpoints_hang_off_base_url() {
    let config = ClientConfig::new("http://api.test/");
    let repo = Repo::new("acme", "widgets");

    assert_eq!(config.repos_url(), "http://api.test/secure/repos");
    assert_eq!(config.repo_url(&repo), "http://api.test/secure/repos/acme/widgets");
    assert_eq!(
        config.resets_url(&repo),
        "http://api.test/secure/repos/acme/widgets/resets"
    );
    assert_eq!(config.login_url(), "http://api.test/login");
    assert_eq!(config.logout_url(), "http://api.test/logout");
}

#[test]
fn base_path_is_kept() {
    let config = ClientConfig::new("http://api.test/forksync");
    assert_eq!(config.repos_url(), "http://api.test/forksync/secure/repos");
}

#[test]
fn login_token_is_query_encoded() {
    let config =
        ClientConfig::new("http://api.test").with_login_token(Some("a&b=c#d+e f".to_string()));
    assert_eq!(
        config.login_url(),
        "http://api.test/login?token=a%26b%3Dc%23d%2Be+f"
    );

    let plain = ClientConfig::new("http://api.test").with_login_token(Some("dev".to_string()));
    assert_eq!(plain.login_url(), "http://api.test/login?token=dev");
}

#[test]
fn repo_segments_are_path_encoded() {
    let config = ClientConfig::new("http://api.test");
    let repo = Repo::new("ac me", "wid?gets#1");
    assert_eq!(
        config.repo_url(&repo),
        "http://api.test/secure/repos/ac%20me/wid%3Fgets%231"
    );
}

#[test]
fn unparseable_base_is_joined_verbatim() {
    let config = ClientConfig::new("localhost:3000");
    assert_eq!(config.repos_url(), "localhost:3000/secure/repos");
}

#[test]
fn timeout_defaults_and_overrides() {
    let config = ClientConfig::new("http://api.test");
    assert_eq!(config.timeout, DEFAULT_REQUEST_TIMEOUT);
    let short = config.with_timeout(std::time::Duration::from_millis(200));
    assert_eq!(short.timeout, std::time::Duration::from_millis(200));
}
