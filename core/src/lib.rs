//! libformosa-core
//!
//! Core composition engine shared by the Bopomofo-specific crate
//! (`libformosa`): language-model facade, reading grid, Viterbi walker,
//! user-override cache, candidate controller, state types and configuration.
//!
//! This crate is deliberately language-agnostic: readings are opaque string
//! keys here, and everything Bopomofo-specific (syllable assembly, keyboard
//! layouts, the key-handler state machine) lives in `libformosa`.
//!
//! Public API:
//! - `Model` - Language-model facade merging user phrases over a static lexicon
//! - `Lexicon` - Reading-key → phrase dictionary with FST fast path
//! - `UserPhrases` - Session phrase store with optional redb persistence
//! - `ReadingGrid` / `Walker` - Candidate lattice and maximum-likelihood walk
//! - `UserOverrideModel` - Recency-decayed user choice cache
//! - `CandidateController` - Candidate pagination and hotkey mapping
//! - `InputState` - The engine's observable states
//! - `Config` - Configuration and feature flags
use serde::{Deserialize, Serialize};

pub mod lm;
pub use lm::{LanguageModel, Model, Unigram, UserPhraseAdder};

pub mod lexicon;
pub use lexicon::{LexEntry, Lexicon};

pub mod user_phrases;
pub use user_phrases::UserPhrases;

pub mod grid;
pub use grid::{Node, ReadingGrid, SELECTED_CANDIDATE_SCORE};

pub mod walker;
pub use walker::{NodeAnchor, WalkedPath, Walker};

pub mod user_override;
pub use user_override::UserOverrideModel;

pub mod candidates;
pub use candidates::{Arrow, Candidate, CandidateController, CandidatePageEntry};

pub mod states;
pub use states::{ChoosingCandidate, Committing, Composing, InputState, Inputting, Marking};

pub mod conversion;

/// Which side of the cursor candidate lookup favors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectPhrase {
    BeforeCursor,
    AfterCursor,
}

/// How plain letter keys are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterMode {
    /// Commit the letter directly (committing the composing buffer first).
    Upper,
    /// Put the letter into the composing buffer as a `_letter_…` reading.
    Lower,
}

/// Engine configuration.
///
/// All fields are per-handler-instance; a host that wants per-context
/// behavior instantiates one handler (and thus one config) per context.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Candidate lookup direction relative to the grid cursor.
    pub select_phrase: SelectPhrase,

    /// Letter key behavior. `Lower` keeps letters in the composing buffer.
    pub letter_mode: LetterMode,

    /// Move the grid cursor to the end of a phrase after selecting it.
    pub move_cursor_after_selection: bool,

    /// ESC discards the whole composing buffer instead of just the
    /// in-progress syllable.
    pub esc_clears_entire_buffer: bool,

    /// Hotkeys for candidate selection. 4-15 unique lowercase keys;
    /// invalid values are rejected by `set_candidate_keys`.
    pub candidate_keys: String,

    /// Maximum number of readings held in the grid before head eviction.
    /// Clamped to [4, 100].
    pub composing_buffer_size: usize,

    /// Convert engine output between Traditional and Simplified Chinese.
    pub chinese_conversion: bool,

    /// One-syllable-at-a-time mode: every composed syllable immediately
    /// offers candidates and commits.
    pub traditional_mode: bool,

    /// Language code used for tooltip strings ("en", "zh-TW").
    pub language: String,
}

pub const MIN_COMPOSING_BUFFER_SIZE: usize = 4;
pub const MAX_COMPOSING_BUFFER_SIZE: usize = 100;

const MIN_CANDIDATE_KEYS: usize = 4;
const MAX_CANDIDATE_KEYS: usize = 15;

impl Default for Config {
    fn default() -> Self {
        Self {
            select_phrase: SelectPhrase::BeforeCursor,
            letter_mode: LetterMode::Upper,
            move_cursor_after_selection: false,
            esc_clears_entire_buffer: false,
            candidate_keys: "123456789".to_string(),
            composing_buffer_size: 20,
            chinese_conversion: false,
            traditional_mode: false,
            language: "en".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.composing_buffer_size = clamp_buffer_size(config.composing_buffer_size);
        if !candidate_keys_valid(&config.candidate_keys) {
            config.candidate_keys = Config::default().candidate_keys;
        }
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Set the composing-buffer size, clamped to [4, 100].
    pub fn set_composing_buffer_size(&mut self, size: usize) {
        self.composing_buffer_size = clamp_buffer_size(size);
    }

    /// Set the candidate selection keys.
    ///
    /// The keys are lowercased first. Returns false (and keeps the previous
    /// keys) unless the result is 4-15 unique ASCII graphic characters.
    pub fn set_candidate_keys(&mut self, keys: &str) -> bool {
        let keys = keys.to_lowercase();
        if candidate_keys_valid(&keys) {
            self.candidate_keys = keys;
            true
        } else {
            false
        }
    }

    /// Check if a character is a candidate hotkey and return its index.
    pub fn candidate_key_index(&self, ch: char) -> Option<usize> {
        self.candidate_keys.chars().position(|c| c == ch)
    }
}

fn clamp_buffer_size(size: usize) -> usize {
    size.clamp(MIN_COMPOSING_BUFFER_SIZE, MAX_COMPOSING_BUFFER_SIZE)
}

fn candidate_keys_valid(keys: &str) -> bool {
    let chars: Vec<char> = keys.chars().collect();
    if chars.len() < MIN_CANDIDATE_KEYS || chars.len() > MAX_CANDIDATE_KEYS {
        return false;
    }
    if chars
        .iter()
        .any(|c| !c.is_ascii_graphic() || c.is_ascii_uppercase())
    {
        return false;
    }
    let mut seen = std::collections::HashSet::new();
    chars.iter().all(|c| seen.insert(*c))
}

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_clamped() {
        let mut config = Config::default();
        config.set_composing_buffer_size(1);
        assert_eq!(config.composing_buffer_size, 4);
        config.set_composing_buffer_size(1000);
        assert_eq!(config.composing_buffer_size, 100);
        config.set_composing_buffer_size(42);
        assert_eq!(config.composing_buffer_size, 42);
    }

    #[test]
    fn test_candidate_keys_validation() {
        let mut config = Config::default();
        assert!(config.set_candidate_keys("asdfghjkl"));
        assert_eq!(config.candidate_keys, "asdfghjkl");

        // Too short, too long, duplicates: all rejected.
        assert!(!config.set_candidate_keys("abc"));
        assert!(!config.set_candidate_keys("abcdefghijklmnop"));
        assert!(!config.set_candidate_keys("aabbccdd"));
        assert_eq!(config.candidate_keys, "asdfghjkl");

        // Uppercase input is lowercased before validation.
        assert!(config.set_candidate_keys("QWERTY"));
        assert_eq!(config.candidate_keys, "qwerty");
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let mut config = Config::default();
        config.traditional_mode = true;
        config.language = "zh-TW".to_string();
        let s = config.to_toml_string().expect("serialize");
        let back = Config::from_toml_str(&s).expect("parse");
        assert!(back.traditional_mode);
        assert_eq!(back.language, "zh-TW");
        assert_eq!(back.candidate_keys, "123456789");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(utils::normalize("  你好  "), "你好");
    }
}
