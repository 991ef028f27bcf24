use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::model::{ClientConfig, Credentials, Profile, SessionRecord};

mod unlocked;
pub use self::unlocked::UnlockedSet;

const STORE_DIR: &str = ".rocketbox";
const HOME_ENV: &str = "ROCKETBOX_HOME";

/// Client state directory: `config.json`, `session.json`, `unlocked.json`.
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// `$ROCKETBOX_HOME`, else `$HOME/.rocketbox`.
    pub fn default_dir() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(HOME_ENV) {
            return Ok(PathBuf::from(dir));
        }
        let home = std::env::var_os("HOME")
            .with_context(|| format!("neither {} nor HOME is set", HOME_ENV))?;
        Ok(PathBuf::from(home).join(STORE_DIR))
    }

    pub fn open_or_init(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("create state dir {}", root.display()))?;
        let store = Self {
            root: root.to_path_buf(),
        };
        if !store.config_path().exists() {
            store.write_config(&ClientConfig::default())?;
        }
        Ok(store)
    }

    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(anyhow!(
                "no state directory at {} (run `rocketbox login`)",
                root.display()
            ));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }

    pub fn unlocked_path(&self) -> PathBuf {
        self.root.join("unlocked.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join("rocketbox.log")
    }

    pub fn read_config(&self) -> Result<ClientConfig> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(ClientConfig::default());
        }
        let bytes = fs::read(&path).context("read config.json")?;
        let cfg: ClientConfig = serde_json::from_slice(&bytes).context("parse config.json")?;
        if cfg.version != 1 {
            anyhow::bail!("unsupported config.json version {}", cfg.version);
        }
        Ok(cfg)
    }

    pub fn write_config(&self, cfg: &ClientConfig) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(cfg).context("serialize config")?;
        write_atomic(&self.config_path(), &bytes).context("write config.json")?;
        Ok(())
    }

    pub fn read_session(&self) -> Result<SessionRecord> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(SessionRecord::default());
        }
        let bytes = fs::read(&path).context("read session.json")?;
        let rec: SessionRecord = serde_json::from_slice(&bytes).context("parse session.json")?;
        Ok(rec)
    }

    pub fn write_session(&self, rec: &SessionRecord) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(rec).context("serialize session")?;
        write_atomic(&self.session_path(), &bytes).context("write session.json")?;
        Ok(())
    }

    pub fn set_credentials(&self, credentials: &Credentials) -> Result<()> {
        let mut rec = self.read_session()?;
        rec.credentials = Some(credentials.clone());
        self.write_session(&rec)
    }

    pub fn set_profile(&self, profile: &Profile) -> Result<()> {
        let mut rec = self.read_session()?;
        rec.profile = Some(profile.clone());
        self.write_session(&rec)
    }

    pub fn clear_session(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            fs::remove_file(&path).context("remove session.json")?;
        }
        Ok(())
    }

    pub fn unlocked_set(&self) -> Result<UnlockedSet> {
        UnlockedSet::open(&self.unlocked_path())
    }
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create parent directories")?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
