//! Layered settings: built-in defaults, then `<config dir>/ocrd/config.toml`,
//! then `OCRD_*` environment variables (`OCRD_HTTP__TIMEOUT_SECS=30`).

use crate::Result;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use ocrd_fetch::ClientSetting;
use ocrd_fs::dirs::user_config;
use ocrd_fs::env::{Environment, OsEnvironment};
use ocrd_fs::{AtomicWriteOptions, atomic_write};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "OCRD_";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Descriptor file name used when none is given.
    pub mets_basename: String,
    /// Initial backup policy of resolved workspaces.
    pub automatic_backup: bool,
    /// Prefix of fresh temporary workspace directories.
    pub tmp_prefix: String,
    /// Backup directory, relative to the workspace.
    pub backup_dir: String,
    pub http: ClientSetting,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mets_basename: "mets.xml".to_string(),
            automatic_backup: false,
            tmp_prefix: "ocrd-".to_string(),
            backup_dir: ".backup".to_string(),
            http: ClientSetting::default(),
        }
    }
}

impl Config {
    /// `<user config dir>/ocrd/config.toml`.
    pub fn default_path(env: &dyn Environment) -> Option<PathBuf> {
        user_config(env).map(|dir| dir.join("ocrd").join("config.toml"))
    }

    /// Defaults merged with the TOML file at `path` (if given and present).
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) => figment.merge(Toml::file(path)),
            None => figment,
        }
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    /// Defaults, the user config file and the environment.
    pub fn load() -> Result<Self> {
        let path = Self::default_path(&OsEnvironment);
        Self::load_from(path.as_deref())
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path).merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Write these settings as TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        atomic_write(path, text.as_bytes(), AtomicWriteOptions::new().create_parents(true))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocrd_fs::env::MapEnvironment;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let config = Config::from_figment(Config::figment(None)).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.mets_basename, "mets.xml");
        assert!(!config.automatic_backup);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let toml = r#"
automatic_backup = true

[http]
proxies = ["http://proxy:3128"]
timeout_secs = 5
"#;
        std::fs::write(&path, toml).unwrap();

        let config = Config::from_figment(Config::figment(Some(&path))).unwrap();
        assert!(config.automatic_backup);
        assert_eq!(config.mets_basename, "mets.xml");
        assert_eq!(config.http.proxies, vec!["http://proxy:3128".to_string()]);
        assert_eq!(config.http.timeout_secs, Some(5));
    }

    #[test]
    fn missing_file_is_ignored() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let config = Config::from_figment(Config::figment(Some(&missing))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn invalid_value_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "automatic_backup = \"sometimes\"\n").unwrap();

        let err = Config::from_figment(Config::figment(Some(&path))).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ocrd").join("config.toml");
        let config = Config {
            backup_dir: "backups".to_string(),
            ..Config::default()
        };
        config.save(&path).unwrap();

        assert_eq!(Config::from_figment(Config::figment(Some(&path))).unwrap(), config);
    }

    #[test]
    fn default_path_follows_xdg() {
        let env = MapEnvironment::new().with_var("XDG_CONFIG_HOME", "/cfg");
        assert_eq!(Config::default_path(&env), Some(PathBuf::from("/cfg/ocrd/config.toml")));
    }
}
