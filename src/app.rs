//! Application state for the generator and history screens.
//!
//! Front ends never mutate state directly: they turn user input into an [`Action`], hand it to
//! [`App::dispatch`], and render from [`App::state`] and [`App::history`] afterwards. Actions are
//! applied one at a time by the single owner of the history, so nothing here needs locking.

use std::fmt;

use rand::{CryptoRng, Rng};

use crate::clipboard::Clipboard;
use crate::history::{Clock, HistoryEntry, HistoryStore, SystemClock};
use crate::password_generation::{
    clamp_length, generate_random_password, CharacterClass, CharacterClasses, GenerateError,
    DEFAULT_LENGTH,
};
use crate::storage::KeyValueStore;
use crate::Secret;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tab {
    Generator,
    History,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub classes: CharacterClasses,
}

impl Default for GeneratorOptions {
    fn default() -> GeneratorOptions {
        GeneratorOptions {
            length: DEFAULT_LENGTH,
            classes: CharacterClasses::all(),
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub options: GeneratorOptions,
    /// The password shown on the generator screen, if one has been generated.
    pub current_password: Option<Secret>,
    pub active_tab: Tab,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
    IncrementLength,
    DecrementLength,
    SetLength(usize),
    ToggleClass(CharacterClass),
    Generate,
    CopyCurrent,
    CopyEntry(String),
    ClearHistory,
    SelectTab(Tab),
}

/// Something the front end should tell the user.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Notice {
    Generated { copied: bool },
    /// A password was generated and recorded, but copying it to the clipboard failed.
    GeneratedCopyFailed(String),
    EmptySelection,
    InvalidLength(usize),
    Copied,
    NothingToCopy,
    CopyFailed(String),
    EntryNotFound(String),
    HistoryCleared,
    ClearFailed(String),
}

impl Notice {
    /// Whether this reports something the user has to act on.
    pub fn is_problem(&self) -> bool {
        !matches!(
            self,
            Notice::Generated { .. } | Notice::Copied | Notice::HistoryCleared
        )
    }
}

impl From<GenerateError> for Notice {
    fn from(err: GenerateError) -> Notice {
        match err {
            GenerateError::EmptySelection => Notice::EmptySelection,
            GenerateError::InvalidLength(len) => Notice::InvalidLength(len),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Generated { copied: false } => write!(f, "Password generated."),
            Notice::Generated { copied: true } => {
                write!(f, "Password generated and copied to the clipboard.")
            }
            Notice::GeneratedCopyFailed(reason) => write!(
                f,
                "Password generated, but it could not be copied: {}",
                reason
            ),
            Notice::EmptySelection => write!(f, "{}", GenerateError::EmptySelection),
            Notice::InvalidLength(len) => write!(f, "{}", GenerateError::InvalidLength(*len)),
            Notice::Copied => write!(f, "Password copied!"),
            Notice::NothingToCopy => write!(f, "Generate a password first."),
            Notice::CopyFailed(reason) => write!(f, "Could not copy the password: {}", reason),
            Notice::EntryNotFound(id) => write!(f, "No history entry with id {}.", id),
            Notice::HistoryCleared => write!(f, "History cleared."),
            Notice::ClearFailed(reason) => write!(f, "Could not clear the history: {}", reason),
        }
    }
}

pub struct App<S, K, R, C = SystemClock> {
    state: AppState,
    history: HistoryStore<S, C>,
    clipboard: K,
    rng: R,
    copy_on_generate: bool,
}

impl<S, K, R, C> App<S, K, R, C>
where
    S: KeyValueStore,
    K: Clipboard,
    R: Rng + CryptoRng,
    C: Clock,
{
    pub fn new(
        history: HistoryStore<S, C>,
        clipboard: K,
        rng: R,
        options: GeneratorOptions,
    ) -> App<S, K, R, C> {
        App {
            state: AppState {
                options: GeneratorOptions {
                    length: clamp_length(options.length),
                    classes: options.classes,
                },
                current_password: None,
                active_tab: Tab::Generator,
            },
            history,
            clipboard,
            rng,
            copy_on_generate: false,
        }
    }

    /// Copy every newly generated password to the clipboard.
    pub fn with_copy_on_generate(mut self, copy_on_generate: bool) -> App<S, K, R, C> {
        self.copy_on_generate = copy_on_generate;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    pub fn dispatch(&mut self, action: Action) -> Option<Notice> {
        log::debug!("dispatching {:?}", action);
        match action {
            Action::IncrementLength => {
                self.set_length(self.state.options.length.saturating_add(1));
                None
            }
            Action::DecrementLength => {
                self.set_length(self.state.options.length.saturating_sub(1));
                None
            }
            Action::SetLength(length) => {
                self.set_length(length);
                None
            }
            Action::ToggleClass(class) => {
                self.state.options.classes.toggle(class);
                None
            }
            Action::Generate => Some(self.generate()),
            Action::CopyCurrent => match self.state.current_password.clone() {
                Some(password) => Some(self.copy(&password)),
                None => Some(Notice::NothingToCopy),
            },
            Action::CopyEntry(id) => match self.history.get(&id).map(|e| e.password.clone()) {
                Some(password) => Some(self.copy(&password)),
                None => Some(Notice::EntryNotFound(id)),
            },
            Action::ClearHistory => match self.history.try_clear() {
                Ok(()) => Some(Notice::HistoryCleared),
                Err(err) => {
                    log::error!("failed to clear password history: {}", err);
                    Some(Notice::ClearFailed(err.to_string()))
                }
            },
            Action::SelectTab(tab) => {
                self.state.active_tab = tab;
                if tab == Tab::History {
                    self.history.load();
                }
                None
            }
        }
    }

    fn set_length(&mut self, length: usize) {
        self.state.options.length = clamp_length(length);
    }

    fn generate(&mut self) -> Notice {
        let GeneratorOptions { length, classes } = self.state.options;
        let password = match generate_random_password(&mut self.rng, length, classes) {
            Ok(p) => p,
            Err(err) => return err.into(),
        };
        self.state.current_password = Some(password.clone());
        self.history.append(password.clone());

        if self.copy_on_generate {
            match self.copy(&password) {
                Notice::CopyFailed(reason) => Notice::GeneratedCopyFailed(reason),
                _ => Notice::Generated { copied: true },
            }
        } else {
            Notice::Generated { copied: false }
        }
    }

    fn copy(&mut self, password: &Secret) -> Notice {
        match self.clipboard.copy(password.as_str()) {
            Ok(()) => Notice::Copied,
            Err(err) => {
                log::error!("failed to copy password: {}", err);
                Notice::CopyFailed(err.to_string())
            }
        }
    }
}
