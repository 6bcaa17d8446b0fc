use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

/// Subdirectory of the app-data root holding the config file.
pub const APP_DIR_NAME: &str = "VroidRSS";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[cfg(windows)]
pub const DEFAULT_EXECUTABLE_PATH: &str = "C:\\Program Files";
#[cfg(not(windows))]
pub const DEFAULT_EXECUTABLE_PATH: &str = "/usr/bin/vrx";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub vrx: Vrx,
    pub rss: Vec<Rss>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vrx {
    /// Executable launched once per title and once per description
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rss {
    pub name: String,
    pub url: String,
}

impl Rss {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl Default for Vrx {
    fn default() -> Self {
        Self {
            path: DEFAULT_EXECUTABLE_PATH.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vrx: Vrx::default(),
            rss: known_feeds(),
        }
    }
}

/// Feeds offered on first launch.
pub fn known_feeds() -> Vec<Rss> {
    vec![Rss::new("NHK", "https://www3.nhk.or.jp/rss/news/cat0.xml")]
}

impl Config {
    /// Parse config from a TOML string. Absent keys keep their defaults.
    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}

/// Resolve the per-user config directory from environment lookups.
///
/// `%APPDATA%` wins, then `%USERPROFILE%\Application Data`, then the
/// platform config directory.
pub fn resolve_config_dir<F>(lookup: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<OsString>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

    let root = match non_empty("APPDATA") {
        Some(dir) => PathBuf::from(dir),
        None => match non_empty("USERPROFILE") {
            Some(profile) => PathBuf::from(profile).join("Application Data"),
            None => dirs::config_dir().ok_or(ConfigError::NoAppDataDir)?,
        },
    };

    Ok(root.join(APP_DIR_NAME))
}

/// Location of the persisted [`Config`] on disk.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let dir = resolve_config_dir(|key| std::env::var_os(key))?;
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    /// Load the config, creating the directory and a default file on first run.
    pub fn load(&self) -> Result<Config, ConfigError> {
        create_private_dir(&self.dir)?;
        let file = self.file();

        match fs::read_to_string(&file) {
            Ok(content) => {
                let config = Config::from_str(&content).map_err(|source| ConfigError::Decode {
                    path: file.clone(),
                    source,
                })?;
                info!(
                    "Loaded config from {} ({} feeds)",
                    file.display(),
                    config.rss.len()
                );
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Config::default();
                let content = config.to_toml()?;
                fs::write(&file, content).map_err(|source| ConfigError::Write {
                    path: file.clone(),
                    source,
                })?;
                info!("Created default config at {}", file.display());
                Ok(config)
            }
            Err(source) => Err(ConfigError::Read { path: file, source }),
        }
    }

    /// Overwrite the existing config file. The file must already exist.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let file = self.file();
        let content = config.to_toml()?;

        let write_err = |source| ConfigError::Write {
            path: file.clone(),
            source,
        };
        let mut f = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&file)
            .map_err(write_err)?;
        f.write_all(content.as_bytes()).map_err(write_err)?;

        debug!("Saved config to {}", file.display());
        Ok(())
    }
}

fn create_private_dir(dir: &Path) -> Result<(), ConfigError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|source| ConfigError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> ConfigStore {
        ConfigStore::new(temp.path().join(APP_DIR_NAME))
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.vrx.path, DEFAULT_EXECUTABLE_PATH);
        assert_eq!(config.rss.len(), 1);
        assert_eq!(config.rss[0].name, "NHK");
        assert_eq!(config.rss[0].url, "https://www3.nhk.or.jp/rss/news/cat0.xml");
    }

    #[test]
    fn test_parse_valid_config() {
        let content = r#"
            [vrx]
            path = "C:\\Tools\\vrx.exe"

            [[rss]]
            name = "NHK"
            url = "https://www3.nhk.or.jp/rss/news/cat0.xml"

            [[rss]]
            name = "Blog"
            url = "https://blog.example.com/feed"
        "#;

        let config = Config::from_str(content).unwrap();

        assert_eq!(config.vrx.path, "C:\\Tools\\vrx.exe");
        assert_eq!(config.rss.len(), 2);
        assert_eq!(config.rss[1], Rss::new("Blog", "https://blog.example.com/feed"));
    }

    #[test]
    fn test_missing_sections_keep_defaults() {
        let content = r#"
            [vrx]
            path = "/opt/vrx"
        "#;

        let config = Config::from_str(content).unwrap();
        assert_eq!(config.vrx.path, "/opt/vrx");
        assert_eq!(config.rss, known_feeds());

        let config = Config::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_feed_missing_url_is_rejected() {
        let content = r#"
            [[rss]]
            name = "Broken"
        "#;

        assert!(Config::from_str(content).is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let config = Config {
            vrx: Vrx {
                path: "/usr/bin/vrx".to_string(),
            },
            rss: vec![Rss::new("A", "https://a.example/rss")],
        };

        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[vrx]"));
        assert!(toml.contains("path = \"/usr/bin/vrx\""));
        assert!(toml.contains("[[rss]]"));
        assert!(toml.find("[vrx]").unwrap() < toml.find("[[rss]]").unwrap());
    }

    #[test]
    fn test_first_load_creates_default_file() {
        let temp = tempfile::tempdir().unwrap();
        let store = store_in(&temp);

        let config = store.load().unwrap();

        assert_eq!(config, Config::default());
        assert!(store.file().exists());
        let on_disk = Config::from_str(&fs::read_to_string(store.file()).unwrap()).unwrap();
        assert_eq!(on_disk, config);
    }

    #[cfg(unix)]
    #[test]
    fn test_config_dir_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let store = store_in(&temp);
        store.load().unwrap();

        let mode = fs::metadata(store.dir()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let store = store_in(&temp);
        store.load().unwrap();

        let config = Config {
            vrx: Vrx {
                path: "/usr/bin/vrx".to_string(),
            },
            rss: vec![
                Rss::new("NHK", "https://www3.nhk.or.jp/rss/news/cat0.xml"),
                Rss::new("Second", "https://example.com/second.xml"),
            ],
        };
        store.save(&config).unwrap();

        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_save_shorter_document_leaves_no_trailing_bytes() {
        let temp = tempfile::tempdir().unwrap();
        let store = store_in(&temp);
        let mut config = store.load().unwrap();

        config.rss.push(Rss::new("Long", "https://example.com/".repeat(20)));
        store.save(&config).unwrap();

        config.rss.truncate(1);
        store.save(&config).unwrap();

        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_save_before_load_fails() {
        let temp = tempfile::tempdir().unwrap();
        let store = store_in(&temp);

        let result = store.save(&Config::default());
        assert!(matches!(result, Err(ConfigError::Write { .. })));
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_load_invalid_toml_is_decode_error() {
        let temp = tempfile::tempdir().unwrap();
        let store = store_in(&temp);
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.file(), "this is not valid toml {{{").unwrap();

        let result = store.load();
        assert!(matches!(result, Err(ConfigError::Decode { .. })));
    }

    #[test]
    fn test_resolve_prefers_appdata() {
        let env: HashMap<&str, &str> =
            HashMap::from([("APPDATA", "/roaming"), ("USERPROFILE", "/home/user")]);

        let dir = resolve_config_dir(|k| env.get(k).map(OsString::from)).unwrap();
        assert_eq!(dir, PathBuf::from("/roaming").join(APP_DIR_NAME));
    }

    #[test]
    fn test_resolve_falls_back_to_user_profile() {
        let env: HashMap<&str, &str> = HashMap::from([("APPDATA", ""), ("USERPROFILE", "/home/user")]);

        let dir = resolve_config_dir(|k| env.get(k).map(OsString::from)).unwrap();
        assert_eq!(
            dir,
            PathBuf::from("/home/user")
                .join("Application Data")
                .join(APP_DIR_NAME)
        );
    }

    #[test]
    fn test_resolve_without_env_uses_platform_dir() {
        let resolved = resolve_config_dir(|_| None);
        match dirs::config_dir() {
            Some(root) => assert_eq!(resolved.unwrap(), root.join(APP_DIR_NAME)),
            None => assert!(matches!(resolved, Err(ConfigError::NoAppDataDir))),
        }
    }
}
