//! Observable engine states.
//!
//! The key handler communicates with its host exclusively through these
//! values: every accepted key produces zero or more state emissions via the
//! state callback. The non-empty states share the `Composing` record
//! (buffer, UTF-8 cursor, tooltip).

use crate::candidates::Candidate;

/// Shared fields of the non-empty states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Composing {
    /// The pre-commit text shown to the user.
    pub buffer: String,
    /// Cursor within `buffer`, in codepoints.
    pub cursor_index: usize,
    pub tooltip: String,
}

/// Text ready to be committed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committing {
    pub text: String,
}

/// Actively composing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inputting {
    pub composing: Composing,
    /// Text pushed out of the head of the grid by the buffer bound; the
    /// host commits it ahead of the buffer.
    pub evicted_text: String,
}

/// The candidate window is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoosingCandidate {
    pub composing: Composing,
    pub candidates: Vec<Candidate>,
}

/// A reading range is being marked for phrase learning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marking {
    pub composing: Composing,
    /// Where the marking started, in grid readings.
    pub mark_start_grid_index: usize,
    /// Buffer text before, inside and after the marked range.
    pub head: String,
    pub marked: String,
    pub tail: String,
    /// Reading keys of the marked range joined with `-` (storage form).
    pub reading: String,
    /// The same readings joined with spaces (display form).
    pub reading_ui: String,
    /// True if the range can be stored as a user phrase.
    pub acceptable: bool,
}

/// The engine's state, emitted through the state callback.
#[derive(Debug, Clone, PartialEq)]
pub enum InputState {
    /// Nothing composed; keys pass through.
    Empty,
    /// Like `Empty`, but the host must not run commit-on-exit side effects.
    EmptyIgnoringPrevious,
    Committing(Committing),
    Inputting(Inputting),
    ChoosingCandidate(ChoosingCandidate),
    Marking(Marking),
}

impl InputState {
    /// True for both empty variants.
    pub fn is_empty(&self) -> bool {
        matches!(self, InputState::Empty | InputState::EmptyIgnoringPrevious)
    }

    /// The shared composing record of the non-empty states.
    pub fn composing(&self) -> Option<&Composing> {
        match self {
            InputState::Inputting(s) => Some(&s.composing),
            InputState::ChoosingCandidate(s) => Some(&s.composing),
            InputState::Marking(s) => Some(&s.composing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_classification() {
        assert!(InputState::Empty.is_empty());
        assert!(InputState::EmptyIgnoringPrevious.is_empty());
        let inputting = InputState::Inputting(Inputting {
            composing: Composing {
                buffer: "你".to_string(),
                cursor_index: 1,
                tooltip: String::new(),
            },
            evicted_text: String::new(),
        });
        assert!(!inputting.is_empty());
        assert_eq!(inputting.composing().unwrap().cursor_index, 1);
        assert!(InputState::Empty.composing().is_none());
    }
}
