//! Language-model facade.
//!
//! The engine consumes a narrow capability surface: `unigrams_for` and
//! `has_unigrams_for`, with phrase learning as an optional extension.
//! `Model` is the standard composition: user phrases (score 0, newest
//! first) merged over the static lexicon, with optional output/input
//! converters and a reading-key transform for compiled dictionaries.

use crate::lexicon::Lexicon;
use crate::user_phrases::UserPhrases;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reserved-key prefix for letter readings (`_letter_a` …).
pub const LETTER_KEY_PREFIX: &str = "_letter_";

/// A scored phrase candidate. Scores are log probabilities; user phrases
/// use 0.0 so they outrank every dictionary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unigram {
    pub value: String,
    pub score: f64,
}

impl Unigram {
    pub fn new<T: Into<String>>(value: T, score: f64) -> Self {
        Self {
            value: value.into(),
            score,
        }
    }
}

/// Read-only language-model capability.
pub trait LanguageModel {
    /// All unigrams for a reading key, preferred first.
    fn unigrams_for(&self, key: &str) -> Vec<Unigram>;

    /// True if `unigrams_for` would return at least one entry.
    fn has_unigrams_for(&self, key: &str) -> bool {
        !self.unigrams_for(key).is_empty()
    }
}

/// Optional phrase-learning capability.
pub trait UserPhraseAdder {
    fn add_user_phrase(&mut self, key: &str, phrase: &str);
}

impl LanguageModel for Lexicon {
    fn unigrams_for(&self, key: &str) -> Vec<Unigram> {
        self.unigrams(key)
    }

    fn has_unigrams_for(&self, key: &str) -> bool {
        self.contains_key(key)
    }
}

impl LanguageModel for UserPhrases {
    fn unigrams_for(&self, key: &str) -> Vec<Unigram> {
        self.phrases(key)
            .iter()
            .map(|p| Unigram::new(p.clone(), 0.0))
            .collect()
    }

    fn has_unigrams_for(&self, key: &str) -> bool {
        self.contains_key(key)
    }
}

/// String-to-string transform used for output conversion and key encoding.
pub type Transform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Callback invoked after a user phrase is stored.
pub type PhraseChangeCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// The standard language-model composition.
pub struct Model {
    lexicon: Lexicon,
    user_phrases: UserPhrases,
    key_transform: Option<Transform>,
    output_converter: Option<Transform>,
    input_converter: Option<Transform>,
    on_phrase_change: Option<PhraseChangeCallback>,
}

impl Model {
    pub fn new(lexicon: Lexicon, user_phrases: UserPhrases) -> Self {
        Self {
            lexicon,
            user_phrases,
            key_transform: None,
            output_converter: None,
            input_converter: None,
            on_phrase_change: None,
        }
    }

    /// Transform applied to every reading key before lookup and storage
    /// (e.g. the absolute-order encoding of a compiled dictionary).
    pub fn set_key_transform(&mut self, transform: Option<Transform>) {
        self.key_transform = transform;
    }

    /// Converter applied to every returned value (e.g. Traditional →
    /// Simplified).
    pub fn set_output_converter(&mut self, converter: Option<Transform>) {
        self.output_converter = converter;
    }

    /// Converter applied to phrases before storage (the inverse direction
    /// of the output converter).
    pub fn set_input_converter(&mut self, converter: Option<Transform>) {
        self.input_converter = converter;
    }

    pub fn set_phrase_change_callback(&mut self, callback: Option<PhraseChangeCallback>) {
        self.on_phrase_change = callback;
    }

    pub fn user_phrases(&self) -> &UserPhrases {
        &self.user_phrases
    }

    /// True if the exact (key, value) pair is already known, post-merge.
    pub fn phrase_exists(&self, key: &str, value: &str) -> bool {
        self.unigrams_for(key).iter().any(|u| u.value == value)
    }

    fn encode_key(&self, key: &str) -> String {
        match &self.key_transform {
            Some(t) => t(key),
            None => key.to_string(),
        }
    }

    fn convert_output(&self, value: String) -> String {
        match &self.output_converter {
            Some(c) => c(&value),
            None => value,
        }
    }
}

impl LanguageModel for Model {
    fn unigrams_for(&self, key: &str) -> Vec<Unigram> {
        // The space reading (Shift+Space) maps to itself.
        if key == " " {
            return vec![Unigram::new(" ", 0.0)];
        }
        // Letter readings are identity mappings; they need no dictionary.
        if let Some(letter) = key.strip_prefix(LETTER_KEY_PREFIX) {
            return vec![Unigram::new(letter, 0.0)];
        }

        let encoded = self.encode_key(key);
        let mut out: Vec<Unigram> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for unigram in self
            .user_phrases
            .unigrams_for(&encoded)
            .into_iter()
            .chain(self.lexicon.unigrams_for(&encoded))
        {
            let value = self.convert_output(unigram.value);
            if seen.insert(value.clone()) {
                out.push(Unigram::new(value, unigram.score));
            }
        }
        out
    }

    fn has_unigrams_for(&self, key: &str) -> bool {
        if key == " " || key.starts_with(LETTER_KEY_PREFIX) {
            return true;
        }
        let encoded = self.encode_key(key);
        self.user_phrases.has_unigrams_for(&encoded)
            || self.lexicon.has_unigrams_for(&encoded)
    }
}

impl UserPhraseAdder for Model {
    fn add_user_phrase(&mut self, key: &str, phrase: &str) {
        let phrase = utils::normalize(phrase);
        let phrase = match &self.input_converter {
            Some(c) => c(&phrase),
            None => phrase,
        };
        let encoded = self.encode_key(key);
        self.user_phrases.add(&encoded, &phrase);
        if let Some(callback) = &self.on_phrase_change {
            callback(&encoded, &phrase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_model() -> Model {
        let mut lex = Lexicon::new();
        lex.insert("ㄋㄧˇ", "你", -3.0);
        lex.insert("ㄋㄧˇ", "妳", -4.0);
        Model::new(lex, UserPhrases::new())
    }

    #[test]
    fn test_user_phrases_win_merge() {
        let mut model = test_model();
        model.add_user_phrase("ㄋㄧˇ", "妳");
        let u = model.unigrams_for("ㄋㄧˇ");
        // User entry first with score 0; the dictionary duplicate is dropped.
        assert_eq!(u[0].value, "妳");
        assert_eq!(u[0].score, 0.0);
        assert_eq!(u.len(), 2);
        assert_eq!(u[1].value, "你");
    }

    #[test]
    fn test_space_and_letter_identities() {
        let model = test_model();
        assert!(model.has_unigrams_for(" "));
        assert_eq!(model.unigrams_for(" ")[0].value, " ");
        assert!(model.has_unigrams_for("_letter_a"));
        assert_eq!(model.unigrams_for("_letter_a")[0].value, "a");
    }

    #[test]
    fn test_output_converter_applies() {
        let mut model = test_model();
        model.set_output_converter(Some(Arc::new(|s: &str| {
            crate::conversion::to_simplified(s)
        })));
        // 妳 has no common simplified form; 你 maps to itself.
        let u = model.unigrams_for("ㄋㄧˇ");
        assert_eq!(u[0].value, "你");
    }

    #[test]
    fn test_phrase_change_callback() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let mut model = test_model();
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        model.set_phrase_change_callback(Some(Arc::new(move |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        })));
        model.add_user_phrase("ㄋㄧˇ-ㄏㄠˇ", "你好");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(model.phrase_exists("ㄋㄧˇ-ㄏㄠˇ", "你好"));
    }
}
