use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

pub const LOGIN_TOKEN: &str = "dev";

pub struct ServerGuard {
    pub base_url: String,
    data_dir: tempfile::TempDir,
    child: Child,
}

impl ServerGuard {
    #[allow(dead_code)]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.path().to_path_buf()
    }
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// An upstream with three branches, a fork that has drifted from it, a read-only fork
/// and a plain repository.
pub fn seed_forge() -> serde_json::Value {
    serde_json::json!({
        "repos": [
            {
                "owner": "upstream",
                "name": "widget",
                "heads": {"main": "p1", "feature": "p2", "next": "p3"}
            },
            {
                "owner": "alice",
                "name": "widget",
                "url": "https://forge.test/alice/widget",
                "fork": true,
                "parent": "upstream/widget",
                "heads": {"main": "p1", "feature": "a2", "scratch": "a9"}
            },
            {
                "owner": "alice",
                "name": "readonly",
                "fork": true,
                "push": false,
                "parent": "upstream/widget",
                "heads": {"main": "p1"}
            },
            {
                "owner": "alice",
                "name": "notes",
                "heads": {"main": "n1"}
            }
        ]
    })
}

pub fn spawn_server() -> Result<ServerGuard> {
    spawn_server_with(&seed_forge())
}

pub fn spawn_server_with(forge: &serde_json::Value) -> Result<ServerGuard> {
    let data_dir = tempfile::tempdir().context("create server tempdir")?;
    std::fs::write(
        data_dir.path().join("forks.json"),
        serde_json::to_vec_pretty(forge).context("serialize seed forge")?,
    )
    .context("write seed forks.json")?;

    let addr_file = data_dir.path().join("addr.txt");

    let child = Command::new(env!("CARGO_BIN_EXE_forksync-server"))
        .args([
            "--addr",
            "127.0.0.1:0",
            "--addr-file",
            addr_file.to_str().unwrap(),
            "--data-dir",
            data_dir.path().to_str().unwrap(),
            "--login-token",
            LOGIN_TOKEN,
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("spawn forksync-server")?;

    let base_url = read_addr_file(&addr_file)?;
    wait_for_healthz(&base_url)?;

    Ok(ServerGuard {
        base_url,
        data_dir,
        child,
    })
}

fn read_addr_file(addr_file: &Path) -> Result<String> {
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("addr file not written at {}", addr_file.display());
        }

        if let Ok(s) = std::fs::read_to_string(addr_file) {
            let s = s.trim();
            if !s.is_empty() {
                return Ok(format!("http://{}", s));
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
}

pub fn wait_for_healthz(base_url: &str) -> Result<()> {
    let client = reqwest::blocking::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("server did not become healthy at {}/healthz", base_url);
        }
        match client.get(format!("{}/healthz", base_url)).send() {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => {
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

/// A client that keeps cookies but does not follow redirects, so `/login` responses can be
/// inspected directly.
#[allow(dead_code)]
pub fn cookie_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("build cookie client")
}

/// Logs `client` in and returns the session secret from the `Set-Cookie` header.
#[allow(dead_code)]
pub fn login(client: &reqwest::blocking::Client, base_url: &str) -> Result<String> {
    let resp = client
        .get(format!("{}/login?token={}", base_url, LOGIN_TOKEN))
        .send()
        .context("login")?;
    anyhow::ensure!(
        resp.status() == reqwest::StatusCode::SEE_OTHER,
        "login returned {}",
        resp.status()
    );
    let cookie = resp
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .context("login set no cookie")?
        .to_str()
        .context("cookie header")?;
    forksync::remote::csrf_token_from_cookies(cookie).context("no session cookie")
}
