use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use rocketbox::model::RemoteConfig;
use rocketbox::remote::RemoteClient;

pub const DEV_EMAIL: &str = "dev@rocketbox.local";
pub const DEV_PASSWORD: &str = "dev";

pub struct ServerGuard {
    pub base_url: String,
    _data_dir: tempfile::TempDir,
    child: Child,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl ServerGuard {
    pub fn remote(&self) -> RemoteConfig {
        RemoteConfig {
            base_url: self.base_url.clone(),
        }
    }
}

/// Starts the dev server on an ephemeral port with the built-in sample data.
pub fn spawn_server(extra: &[&str]) -> Result<ServerGuard> {
    let data_dir = tempfile::tempdir().context("create server tempdir")?;
    let addr_file = data_dir.path().join("addr.txt");

    let child = Command::new(env!("CARGO_BIN_EXE_rocketbox-devserver"))
        .args([
            "--addr",
            "127.0.0.1:0",
            "--addr-file",
            addr_file.to_str().unwrap(),
        ])
        .args(extra)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("spawn rocketbox-devserver")?;

    let base_url = read_addr_file(&addr_file)?;
    wait_for_healthz(&base_url)?;

    Ok(ServerGuard {
        base_url,
        _data_dir: data_dir,
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

/// Client logged in as the development member.
#[allow(dead_code)]
pub fn dev_client(server: &ServerGuard) -> Result<RemoteClient> {
    let credentials = RemoteClient::login(&server.remote(), DEV_EMAIL, DEV_PASSWORD)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    RemoteClient::new(server.remote(), credentials).map_err(|e| anyhow::anyhow!(e.to_string()))
}

/// Raw access token for direct HTTP checks.
#[allow(dead_code)]
pub fn dev_token(server: &ServerGuard) -> Result<String> {
    Ok(dev_client(server)?.credentials().access_token)
}

#[allow(dead_code)]
pub fn auth_header(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Runs the `rocketbox` binary against `state_dir`.
#[allow(dead_code)]
pub fn rocketbox(state_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rocketbox"))
        .arg("--state-dir")
        .arg(state_dir)
        .args(args)
        .env_remove("ROCKETBOX_LOG")
        .output()
        .unwrap()
}

#[allow(dead_code)]
pub fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

#[allow(dead_code)]
pub fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}
