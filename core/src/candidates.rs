//! Candidate list pagination and hotkey mapping.
//!
//! The key handler produces a flat candidate list; `CandidateController`
//! turns it into pages sized by the configured hotkeys and resolves
//! navigation and hotkey presses into selections. The host owns the window
//! orientation: in a vertical window the item/page axes swap, which
//! `handle_arrow` accounts for.

use serde::{Deserialize, Serialize};

/// A selectable candidate: the reading key it came from and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub reading: String,
    pub value: String,
}

impl Candidate {
    pub fn new<R: Into<String>, V: Into<String>>(reading: R, value: V) -> Self {
        Self {
            reading: reading.into(),
            value: value.into(),
        }
    }
}

/// One row of the currently visible candidate page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePageEntry {
    pub key_cap: char,
    pub candidate: Candidate,
    pub selected: bool,
}

/// Arrow-key input for `handle_arrow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Up,
    Down,
    Left,
    Right,
}

/// Paginates candidates over a configurable hotkey set.
#[derive(Debug, Clone)]
pub struct CandidateController {
    candidates: Vec<Candidate>,
    key_caps: Vec<char>,
    selected: usize,
    vertical: bool,
}

impl Default for CandidateController {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateController {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            key_caps: "123456789".chars().collect(),
            selected: 0,
            vertical: false,
        }
    }

    pub fn with_key_caps(keys: &str) -> Self {
        let mut controller = Self::new();
        controller.set_key_caps(keys);
        controller
    }

    /// Replace the hotkeys. Returns false (keeping the previous keys) unless
    /// given 4-15 unique keys; input is lowercased first.
    pub fn set_key_caps(&mut self, keys: &str) -> bool {
        let keys: Vec<char> = keys.to_lowercase().chars().collect();
        if keys.len() < 4 || keys.len() > 15 {
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        if !keys.iter().all(|c| seen.insert(*c)) {
            return false;
        }
        self.key_caps = keys;
        self.selected = 0;
        true
    }

    pub fn key_caps(&self) -> &[char] {
        &self.key_caps
    }

    /// Whether the host renders the window vertically (flips arrow axes).
    pub fn set_vertical(&mut self, vertical: bool) {
        self.vertical = vertical;
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.selected = 0;
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn page_size(&self) -> usize {
        self.key_caps.len()
    }

    pub fn num_pages(&self) -> usize {
        self.candidates.len().div_ceil(self.page_size())
    }

    pub fn current_page(&self) -> usize {
        self.selected / self.page_size()
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.candidates.is_empty()).then_some(self.selected)
    }

    pub fn selected_candidate(&self) -> Option<&Candidate> {
        self.candidates.get(self.selected)
    }

    /// Move the selection one item forward. False at the end of the list.
    pub fn select_next_item(&mut self) -> bool {
        if self.candidates.is_empty() || self.selected + 1 >= self.candidates.len() {
            return false;
        }
        self.selected += 1;
        true
    }

    /// Move the selection one item back. False at the start of the list.
    pub fn select_previous_item(&mut self) -> bool {
        if self.selected == 0 {
            return false;
        }
        self.selected -= 1;
        true
    }

    /// Jump a page forward, keeping the slot. False on the last page.
    pub fn select_next_page(&mut self) -> bool {
        if self.num_pages() == 0 || self.current_page() + 1 >= self.num_pages() {
            return false;
        }
        self.selected = (self.selected + self.page_size()).min(self.candidates.len() - 1);
        true
    }

    /// Jump a page back, keeping the slot. False on the first page.
    pub fn select_previous_page(&mut self) -> bool {
        if self.current_page() == 0 {
            return false;
        }
        self.selected -= self.page_size();
        true
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.candidates.len().saturating_sub(1);
    }

    /// Resolve an arrow key against the window orientation: the item axis
    /// runs along the window, the page axis across it.
    pub fn handle_arrow(&mut self, arrow: Arrow) -> bool {
        let (item_prev, item_next) = if self.vertical {
            (Arrow::Up, Arrow::Down)
        } else {
            (Arrow::Left, Arrow::Right)
        };
        if arrow == item_prev {
            self.select_previous_item()
        } else if arrow == item_next {
            self.select_next_item()
        } else if (self.vertical && arrow == Arrow::Left) || (!self.vertical && arrow == Arrow::Up) {
            self.select_previous_page()
        } else {
            self.select_next_page()
        }
    }

    /// The candidate a hotkey press selects on the current page, if the key
    /// is one of the configured caps and the slot is occupied.
    pub fn selected_candidate_with_key(&self, key: char) -> Option<&Candidate> {
        let slot = self.key_caps.iter().position(|c| *c == key)?;
        let index = self.current_page() * self.page_size() + slot;
        self.candidates.get(index)
    }

    /// The visible page, with key caps and the selection mark.
    pub fn current_page_entries(&self) -> Vec<CandidatePageEntry> {
        let start = self.current_page() * self.page_size();
        let end = (start + self.page_size()).min(self.candidates.len());
        self.candidates[start..end]
            .iter()
            .enumerate()
            .map(|(i, candidate)| CandidatePageEntry {
                key_cap: self.key_caps[i],
                candidate: candidate.clone(),
                selected: start + i == self.selected,
            })
            .collect()
    }
}
