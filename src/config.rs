//! Where passgen keeps its data, and the optional `config.yaml` inside that directory.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use crate::clipboard::SystemClipboard;
use crate::history::{HistoryStore, DEFAULT_TIMESTAMP_FORMAT};
use crate::password_generation::{clamp_length, CharacterClasses, DEFAULT_LENGTH};
use crate::storage::FileStore;

pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub default_length: usize,
    pub default_classes: CharacterClasses,
    pub copy_on_generate: bool,
    /// A chrono `strftime` pattern for history timestamps.
    pub timestamp_format: String,
    /// Program and arguments to pipe passwords into; the platform's clipboard tool if unset.
    pub clipboard_command: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            data_dir: PathBuf::new(),
            default_length: DEFAULT_LENGTH,
            default_classes: CharacterClasses::all(),
            copy_on_generate: false,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_owned(),
            clipboard_command: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HOME is not set; pass --data-dir or set PASSGEN_HOME")]
    NoHome,
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid timestamp_format {0:?}")]
    InvalidTimestampFormat(String),
}

impl Config {
    /// Load `config.yaml` from `data_dir`, falling back to defaults if there isn't one.
    pub fn load(data_dir: PathBuf) -> Result<Config, ConfigError> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        let mut config = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Config::default(),
            Ok(raw) => {
                serde_yaml::from_str::<Config>(&raw).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no config file at {}; using defaults", path.display());
                Config::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        config.data_dir = data_dir;
        config.default_length = clamp_length(config.default_length);
        if !is_valid_timestamp_format(&config.timestamp_format) {
            return Err(ConfigError::InvalidTimestampFormat(config.timestamp_format));
        }
        Ok(config)
    }

    pub fn file_store(&self) -> FileStore {
        FileStore::new(self.data_dir.clone())
    }

    pub fn history(&self) -> HistoryStore<FileStore> {
        let mut history = HistoryStore::open(self.file_store());
        history.set_timestamp_format(self.timestamp_format.clone());
        history
    }

    pub fn clipboard(&self) -> SystemClipboard {
        match &self.clipboard_command {
            Some(argv) => SystemClipboard::with_command(argv.clone()),
            None => SystemClipboard::platform_default(),
        }
    }
}

/// Pick the data directory: an explicit path, then `$PASSGEN_HOME`, then `$HOME/.passgen`.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    resolve_data_dir_from(
        explicit,
        std::env::var_os("PASSGEN_HOME"),
        std::env::var_os("HOME"),
    )
}

fn resolve_data_dir_from(
    explicit: Option<PathBuf>,
    passgen_home: Option<OsString>,
    home: Option<OsString>,
) -> Result<PathBuf, ConfigError> {
    if let Some(p) = explicit {
        return Ok(p);
    }
    if let Some(p) = passgen_home.filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let home = home.ok_or(ConfigError::NoHome)?;
    let default_path = {
        let mut p = PathBuf::from(home);
        p.push(".passgen");
        p
    };
    Ok(default_path)
}

fn is_valid_timestamp_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password_generation::CharacterClass;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().to_owned()).unwrap();
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.default_length, 12);
        assert_eq!(config.default_classes, CharacterClasses::all());
        assert!(!config.copy_on_generate);
        assert_eq!(config.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(config.clipboard_command, None);
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "default_length: 20\n\
             default_classes: [lower, digits]\n\
             copy_on_generate: true\n\
             clipboard_command: [wl-copy]\n",
        )
        .unwrap();
        let config = Config::load(dir.path().to_owned()).unwrap();
        assert_eq!(config.default_length, 20);
        assert_eq!(
            config.default_classes,
            CharacterClasses::empty()
                .with(CharacterClass::Lower)
                .with(CharacterClass::Digits)
        );
        assert!(config.copy_on_generate);
        assert_eq!(config.clipboard_command, Some(vec!["wl-copy".to_owned()]));
    }

    #[test]
    fn out_of_range_length_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "default_length: 64\n").unwrap();
        let config = Config::load(dir.path().to_owned()).unwrap();
        assert_eq!(config.default_length, 32);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "default_lenght: 10\n").unwrap();
        assert!(matches!(
            Config::load(dir.path().to_owned()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn bad_timestamp_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "timestamp_format: \"%Q\"\n").unwrap();
        assert!(matches!(
            Config::load(dir.path().to_owned()),
            Err(ConfigError::InvalidTimestampFormat(_))
        ));
    }

    #[test]
    fn data_dir_resolution_order() {
        let explicit = resolve_data_dir_from(
            Some(PathBuf::from("/explicit")),
            Some("/env".into()),
            Some("/home/u".into()),
        )
        .unwrap();
        assert_eq!(explicit, PathBuf::from("/explicit"));

        let env = resolve_data_dir_from(None, Some("/env".into()), Some("/home/u".into())).unwrap();
        assert_eq!(env, PathBuf::from("/env"));

        let home = resolve_data_dir_from(None, None, Some("/home/u".into())).unwrap();
        assert_eq!(home, PathBuf::from("/home/u/.passgen"));

        assert!(matches!(
            resolve_data_dir_from(None, None, None),
            Err(ConfigError::NoHome)
        ));
    }
}
