use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_LOGIN_DELAY_MS: u64 = 800;

#[derive(Debug, Clone)]
pub struct Config {
    /// Cosmetic pause before credentials are checked. Zero disables it.
    pub login_delay: Duration,
    /// Workspace to open at startup, as if `workspace.select` had been sent.
    pub workspace: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_delay: Duration::from_millis(DEFAULT_LOGIN_DELAY_MS),
            workspace: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Config::default();
        if let Some(raw) = get("CAMPUSD_LOGIN_DELAY_MS") {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("CAMPUSD_LOGIN_DELAY_MS must be an integer, got {raw:?}"))?;
            cfg.login_delay = Duration::from_millis(ms);
        }
        if let Some(raw) = get("CAMPUSD_WORKSPACE") {
            let t = raw.trim();
            if !t.is_empty() {
                cfg.workspace = Some(PathBuf::from(t));
            }
        }
        Ok(cfg)
    }
}
