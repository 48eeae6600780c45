use serde::{Deserialize, Serialize};

pub mod app;
pub mod clipboard;
pub mod config;
pub mod history;
pub mod password_generation;
pub mod storage;

pub use app::{Action, App, AppState, GeneratorOptions, Notice, Tab};
pub use clipboard::{Clipboard, ClipboardError, SystemClipboard};
pub use config::{Config, ConfigError};
pub use history::{Clock, HistoryEntry, HistoryError, HistoryStore, SystemClock, HISTORY_KEY};
pub use password_generation::{CharacterClass, CharacterClasses, GenerateError};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

/// A generated password. Its `Debug` output is opaque so it never ends up in logs.
#[derive(Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Secret(String);

opaque_debug::implement!(Secret);

impl Secret {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Secret {
        Secret(s)
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Secret {
        Secret(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_does_not_show_the_password() {
        let secret = Secret::from("hunter22");
        let debugged = format!("{:?}", secret);
        assert!(!debugged.contains("hunter22"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let secret = Secret::from("a$B1");
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"a$B1\"");
    }
}
