//! Utilities for generating passwords.

use std::fmt;

use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};

/// Shortest length the front ends offer.
pub const MIN_LENGTH: usize = 8;
/// Longest length the front ends offer.
pub const MAX_LENGTH: usize = 32;
pub const DEFAULT_LENGTH: usize = 12;

pub static UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub static LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub static DIGITS: &str = "0123456789";
pub static SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterClass {
    Upper,
    Lower,
    Digits,
    Symbols,
}

impl CharacterClass {
    /// Every class, in the order their characters appear in an alphabet.
    pub const ALL: [CharacterClass; 4] = [
        CharacterClass::Upper,
        CharacterClass::Lower,
        CharacterClass::Digits,
        CharacterClass::Symbols,
    ];

    pub fn chars(self) -> &'static str {
        match self {
            CharacterClass::Upper => UPPERCASE,
            CharacterClass::Lower => LOWERCASE,
            CharacterClass::Digits => DIGITS,
            CharacterClass::Symbols => SYMBOLS,
        }
    }

    fn bit(self) -> u8 {
        match self {
            CharacterClass::Upper => 0b0001,
            CharacterClass::Lower => 0b0010,
            CharacterClass::Digits => 0b0100,
            CharacterClass::Symbols => 0b1000,
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CharacterClass::Upper => "Uppercase",
            CharacterClass::Lower => "Lowercase",
            CharacterClass::Digits => "Numbers",
            CharacterClass::Symbols => "Symbols",
        };
        f.write_str(label)
    }
}

/// The set of character classes enabled for generation.
///
/// In the config file this is written as a list of class names, e.g. `[upper, digits]`.
#[derive(Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
#[serde(from = "Vec<CharacterClass>", into = "Vec<CharacterClass>")]
pub struct CharacterClasses(u8);

impl CharacterClasses {
    pub fn all() -> CharacterClasses {
        CharacterClass::ALL
            .into_iter()
            .fold(CharacterClasses::empty(), CharacterClasses::with)
    }

    pub fn empty() -> CharacterClasses {
        CharacterClasses(0)
    }

    pub fn with(self, class: CharacterClass) -> CharacterClasses {
        CharacterClasses(self.0 | class.bit())
    }

    pub fn toggle(&mut self, class: CharacterClass) {
        self.0 ^= class.bit();
    }

    pub fn contains(self, class: CharacterClass) -> bool {
        self.0 & class.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = CharacterClass> {
        CharacterClass::ALL
            .into_iter()
            .filter(move |class| self.contains(*class))
    }

    /// The characters of every enabled class, concatenated in class order.
    pub fn alphabet(self) -> Vec<char> {
        let mut abc = Vec::new();
        for class in self.iter() {
            abc.extend(class.chars().chars());
        }
        abc
    }
}

impl Default for CharacterClasses {
    fn default() -> CharacterClasses {
        CharacterClasses::all()
    }
}

impl fmt::Debug for CharacterClasses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<Vec<CharacterClass>> for CharacterClasses {
    fn from(classes: Vec<CharacterClass>) -> CharacterClasses {
        classes
            .into_iter()
            .fold(CharacterClasses::empty(), CharacterClasses::with)
    }
}

impl From<CharacterClasses> for Vec<CharacterClass> {
    fn from(classes: CharacterClasses) -> Vec<CharacterClass> {
        classes.iter().collect()
    }
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum GenerateError {
    #[error("Select at least one character class.")]
    EmptySelection,
    #[error("a password must be at least one character long (got {0})")]
    InvalidLength(usize),
}

/// Clamp a requested length into the range the front ends allow.
pub fn clamp_length(length: usize) -> usize {
    length.clamp(MIN_LENGTH, MAX_LENGTH)
}

/// Generate a password by independently sampling the alphabet of `classes` for each position.
///
/// There is no guarantee that every enabled class shows up in the result; each position is an
/// independent, uniform draw from the whole alphabet.
///
/// Note that `rand`'s underlying uniform sampler does the right thing to prevent bias: if it can't
/// generate a value that is within the given range (or really, a multiple of the range), it
/// re-samples.
pub fn generate_random_password<R>(
    rng: &mut R,
    length: usize,
    classes: CharacterClasses,
) -> Result<crate::Secret, GenerateError>
where
    R: Rng + CryptoRng,
{
    let alphabet = classes.alphabet();
    if alphabet.is_empty() {
        return Err(GenerateError::EmptySelection);
    }
    if length < 1 {
        return Err(GenerateError::InvalidLength(length));
    }
    log::debug!(
        "generating a {}-character password from {:?} ({} symbols)",
        length,
        classes,
        alphabet.len()
    );

    let mut secret = String::with_capacity(length);
    for _ in 0..length {
        let ch = alphabet.choose(rng).ok_or(GenerateError::EmptySelection)?;
        secret.push(*ch);
    }
    Ok(crate::Secret(secret))
}
