//! # libformosa
//!
//! Bopomofo/Zhuyin input method engine built on libformosa-core: syllable
//! assembly over six keyboard layouts, and the key-handler state machine
//! that drives the core composition engine.

pub mod bopomofo;
pub mod config;
pub mod keyhandler;
pub mod layout;
pub mod reading;

pub use bopomofo::{maybe_absolute_order_key, Bopomofo, Syllable};
pub use config::BopomofoConfig;
pub use keyhandler::{KeyEvent, KeyHandler, KeyName};
pub use layout::KeyboardLayout;
pub use reading::ReadingBuffer;

// Re-export the core surface hosts interact with.
pub use libformosa_core::{
    Arrow, Candidate, CandidateController, ChoosingCandidate, Committing, Composing, Config,
    InputState, Inputting, Lexicon, Marking, Model, UserOverrideModel, UserPhrases,
};
