// Configuration: service URLs and protocol profile from the environment, and
// an upload token persisted in the user's home directory.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::Profile;
use crate::{data, icdn, static_host};

const TOKEN_FILE: &str = ".icdn_token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub icdn_url: String,
    pub static_url: String,
    pub data_url: String,
    pub profile: Profile,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            icdn_url: icdn::DEFAULT_URL.into(),
            static_url: static_host::DEFAULT_URL.into(),
            data_url: data::DEFAULT_URL.into(),
            profile: Profile::default(),
        }
    }
}

impl Config {
    /// Read `ICDN_URL`, `STATIC_URL`, `DATA_URL` and `ICDN_PROFILE`, falling
    /// back to the public deployment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let profile = match lookup("ICDN_PROFILE") {
            Some(raw) => raw
                .parse::<Profile>()
                .map_err(anyhow::Error::msg)
                .context("Invalid ICDN_PROFILE")?,
            None => defaults.profile,
        };
        Ok(Config {
            icdn_url: lookup("ICDN_URL").unwrap_or(defaults.icdn_url),
            static_url: lookup("STATIC_URL").unwrap_or(defaults.static_url),
            data_url: lookup("DATA_URL").unwrap_or(defaults.data_url),
            profile,
        })
    }
}

fn token_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Persist an upload token in the user's home directory.
pub fn persist_token(token: &str) -> Result<PathBuf> {
    persist_token_in(&token_dir(), token)
}

/// Saved token, if any.
pub fn load_token() -> Option<String> {
    load_token_from(&token_dir())
}

/// Remove the saved token. Returns whether one existed.
pub fn clear_token() -> Result<bool> {
    clear_token_in(&token_dir())
}

// The token file is readable by its owner only.
fn persist_token_in(dir: &Path, token: &str) -> Result<PathBuf> {
    let path = dir.join(TOKEN_FILE);
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        // `mode` only applies when the file is created.
        if path.exists() {
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict {}", path.display()))?;
        }
    }
    let mut file = options
        .open(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.write_all(token.trim().as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn load_token_from(dir: &Path) -> Option<String> {
    let data = std::fs::read_to_string(dir.join(TOKEN_FILE)).ok()?;
    let token = data.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn clear_token_in(dir: &Path) -> Result<bool> {
    let path = dir.join(TOKEN_FILE);
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.icdn_url, "https://dmmdgm.dev");
    }

    #[test]
    fn environment_overrides_urls_and_profile() {
        let config = Config::from_lookup(lookup(&[
            ("ICDN_URL", "http://localhost:3000"),
            ("ICDN_PROFILE", "status"),
        ]))
        .unwrap();
        assert_eq!(config.icdn_url, "http://localhost:3000");
        assert_eq!(config.profile, Profile::StatusDriven);
        assert_eq!(config.static_url, "https://static.dmmdgm.dev");
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(Config::from_lookup(lookup(&[("ICDN_PROFILE", "v9")])).is_err());
    }

    #[test]
    fn token_round_trips_through_the_token_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_token_from(dir.path()), None);

        persist_token_in(dir.path(), "secret\n").unwrap();
        assert_eq!(load_token_from(dir.path()).as_deref(), Some("secret"));

        assert!(clear_token_in(dir.path()).unwrap());
        assert!(!clear_token_in(dir.path()).unwrap());
        assert_eq!(load_token_from(dir.path()), None);
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private_to_its_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join(TOKEN_FILE);
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        persist_token_in(dir.path(), "secret").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(load_token_from(dir.path()).as_deref(), Some("secret"));
    }
}
