//! The key-handler state machine.
//!
//! `KeyHandler` consumes `(KeyEvent, current state)` pairs and emits new
//! states through a callback, orchestrating the reading assembler, the
//! grid, the walker and the user-override cache. It is single-threaded and
//! synchronous: every `handle` call runs to completion, and the state
//! callback must not re-enter `handle`.
//!
//! Errors never cross this boundary as values; recoverable problems (an
//! illegal key, a blocked cursor move, an unknown reading) fire the error
//! callback and re-emit a state that preserves the user's data.

use crate::config::BopomofoConfig;
use crate::layout::KeyboardLayout;
use crate::reading::ReadingBuffer;
use libformosa_core::grid::MAX_SPAN_LENGTH;
use libformosa_core::{
    Candidate, ChoosingCandidate, Committing, Composing, InputState, Inputting, LanguageModel,
    LetterMode, Marking, Model, NodeAnchor, ReadingGrid, SelectPhrase, UserOverrideModel,
    UserPhraseAdder, Walker, SELECTED_CANDIDATE_SCORE,
};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Named keys delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyName {
    Ascii,
    Unknown,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Backspace,
    Delete,
    Return,
    Esc,
    Space,
    Tab,
    PageUp,
    PageDown,
}

/// One keystroke: the printable character (if any), the key name, and the
/// modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub ascii: char,
    pub name: KeyName,
    pub shift: bool,
    pub ctrl: bool,
}

impl KeyEvent {
    pub fn ascii(ch: char) -> Self {
        Self {
            ascii: ch,
            name: KeyName::Ascii,
            shift: false,
            ctrl: false,
        }
    }

    pub fn named(name: KeyName) -> Self {
        Self {
            ascii: '\0',
            name,
            shift: false,
            ctrl: false,
        }
    }

    pub fn shifted(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }
}

/// Injectable wall-clock, in seconds. Tests supply a deterministic one.
pub type Clock = Arc<dyn Fn() -> f64 + Send + Sync>;

const EPSILON: f64 = 0.000001;
// Candidates at or below this score are never recorded as overrides.
const NO_OVERRIDE_THRESHOLD: f64 = -8.0;
// Anchors whose left edge is further than this from the grid tail get
// their current selection pinned after each compose.
const WALK_FREEZE_WINDOW: usize = 10;
const PUNCTUATION_LIST_KEY: &str = "_punctuation_list";

/// The composition engine's central actor.
pub struct KeyHandler {
    model: Model,
    config: BopomofoConfig,
    grid: ReadingGrid,
    reading: ReadingBuffer,
    user_override: UserOverrideModel,
    latest_walk: Vec<NodeAnchor>,
    clock: Clock,
}

impl KeyHandler {
    pub fn new(model: Model, config: BopomofoConfig) -> Self {
        let reading = ReadingBuffer::new(config.keyboard_layout);
        Self {
            model,
            config,
            grid: ReadingGrid::new(),
            reading,
            user_override: UserOverrideModel::new(),
            latest_walk: Vec::new(),
            clock: Arc::new(|| {
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0)
            }),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn config(&self) -> &BopomofoConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BopomofoConfig {
        &mut self.config
    }

    pub fn user_override(&self) -> &UserOverrideModel {
        &self.user_override
    }

    pub fn latest_walk(&self) -> &[NodeAnchor] {
        &self.latest_walk
    }

    pub fn grid_cursor_index(&self) -> usize {
        self.grid.cursor_index()
    }

    /// Switch keyboard layouts, dropping any partial syllable.
    pub fn set_keyboard_layout(&mut self, layout: KeyboardLayout) {
        self.config.keyboard_layout = layout;
        self.reading.set_layout(layout);
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    /// Drop the grid, the partial reading and the cached walk. The model
    /// and the override cache persist across resets.
    pub fn reset(&mut self) {
        self.reading.clear();
        self.grid.clear();
        self.latest_walk.clear();
    }

    /// Process one keystroke against the current state. Returns false only
    /// when the key was not consumed (the host should handle it itself).
    pub fn handle(
        &mut self,
        key: &KeyEvent,
        state: &InputState,
        state_callback: &mut dyn FnMut(InputState),
        error_callback: &mut dyn FnMut(),
    ) -> bool {
        let engine_empty = self.grid.is_empty() && self.reading.is_empty();

        // Shift+Space: a literal space, either into the buffer or committed.
        if key.name == KeyName::Space && key.shift {
            if self.config.base.letter_mode == LetterMode::Lower {
                self.compose_key_into_grid(" ", state_callback);
            } else {
                if !engine_empty {
                    let buffer = self.composing_state().buffer;
                    self.reset();
                    state_callback(InputState::Committing(Committing { text: buffer }));
                }
                state_callback(InputState::Committing(Committing {
                    text: " ".to_string(),
                }));
                state_callback(InputState::Empty);
            }
            return true;
        }

        // Space with an active syllable composes it with the first tone.
        if key.name == KeyName::Space && !self.reading.is_empty() {
            if self.reading.has_tone_marker_only() {
                error_callback();
                state_callback(self.build_inputting(String::new()));
                return true;
            }
            return self.compose_reading(state_callback, error_callback);
        }

        // Reading-legal keys feed the syllable assembler.
        if key.name == KeyName::Ascii && !key.ctrl && self.reading.is_valid_key(key.ascii) {
            self.reading.combine(key.ascii);
            if !self.reading.has_tone_marker() {
                state_callback(self.build_inputting(String::new()));
                return true;
            }
            return self.compose_reading(state_callback, error_callback);
        }

        // Space or Down with nothing half-typed opens the candidate window.
        if key.name == KeyName::Space || key.name == KeyName::Down {
            if engine_empty {
                return false;
            }
            if !self.reading.is_empty() {
                error_callback();
                state_callback(self.build_inputting(String::new()));
                return true;
            }
            state_callback(self.build_choosing_candidate());
            return true;
        }

        match key.name {
            KeyName::Esc => return self.handle_esc(engine_empty, state_callback),
            KeyName::Tab => {
                return self.handle_tab(key.shift, state, engine_empty, state_callback, error_callback)
            }
            KeyName::Left | KeyName::Right | KeyName::Home | KeyName::End => {
                if engine_empty {
                    return false;
                }
                return self.handle_cursor_key(key, state, state_callback, error_callback);
            }
            KeyName::Backspace => {
                if engine_empty {
                    return false;
                }
                return self.handle_backspace(state, state_callback, error_callback);
            }
            KeyName::Delete => {
                if engine_empty {
                    return false;
                }
                return self.handle_delete(state, state_callback, error_callback);
            }
            KeyName::Return => {
                if engine_empty {
                    return false;
                }
                return self.handle_enter(state, state_callback, error_callback);
            }
            _ => {}
        }

        if key.name == KeyName::Ascii && !key.ctrl {
            if key.ascii == '`' {
                return self.handle_punctuation_list(engine_empty, state_callback, error_callback);
            }
            if key.ascii.is_ascii_graphic() {
                return self.handle_other_ascii(key.ascii, engine_empty, state_callback, error_callback);
            }
        }

        // Anything else: consumed (with an error) while composing, passed
        // through otherwise.
        if engine_empty {
            return false;
        }
        error_callback();
        self.re_emit_current(state, state_callback);
        true
    }

    /// The host's candidate window reports a selection.
    pub fn candidate_selected(
        &mut self,
        candidate: &Candidate,
        state_callback: &mut dyn FnMut(InputState),
    ) {
        if self.config.base.traditional_mode {
            let text = candidate.value.clone();
            self.reset();
            state_callback(InputState::Committing(Committing { text }));
            state_callback(InputState::Empty);
            return;
        }
        self.pin_node(candidate, true);
        state_callback(self.build_inputting(String::new()));
    }

    /// The host's candidate window was dismissed without a choice.
    pub fn candidate_panel_cancelled(&mut self, state_callback: &mut dyn FnMut(InputState)) {
        if self.config.base.traditional_mode {
            self.reset();
            state_callback(InputState::EmptyIgnoringPrevious);
            return;
        }
        state_callback(self.build_inputting(String::new()));
    }

    // ---------- key-specific handlers ----------

    fn handle_esc(
        &mut self,
        engine_empty: bool,
        state_callback: &mut dyn FnMut(InputState),
    ) -> bool {
        if engine_empty {
            return false;
        }
        if self.config.base.esc_clears_entire_buffer {
            self.reset();
            state_callback(InputState::EmptyIgnoringPrevious);
            return true;
        }
        if !self.reading.is_empty() {
            self.reading.clear();
            if self.grid.is_empty() {
                self.reset();
                state_callback(InputState::EmptyIgnoringPrevious);
                return true;
            }
        }
        state_callback(self.build_inputting(String::new()));
        true
    }

    fn handle_tab(
        &mut self,
        shift: bool,
        state: &InputState,
        engine_empty: bool,
        state_callback: &mut dyn FnMut(InputState),
        error_callback: &mut dyn FnMut(),
    ) -> bool {
        if engine_empty {
            return false;
        }
        if !matches!(state, InputState::Inputting(_)) || !self.reading.is_empty() {
            error_callback();
            self.re_emit_current(state, state_callback);
            return true;
        }

        let cursor = self.actual_candidate_cursor_index();
        let candidates = self.candidates_at(cursor);
        let anchor = anchor_at(&self.latest_walk, cursor).cloned();
        let (candidates, anchor) = match (candidates.is_empty(), anchor) {
            (false, Some(anchor)) => (candidates, anchor),
            _ => {
                error_callback();
                state_callback(self.build_inputting(String::new()));
                return true;
            }
        };

        let pinned = anchor.score >= SELECTED_CANDIDATE_SCORE;
        let index = if !pinned {
            // First rotation: take the head of the list, unless that is
            // what the walk already shows.
            if candidates[0].value == anchor.value {
                if shift {
                    candidates.len() - 1
                } else {
                    1 % candidates.len()
                }
            } else {
                0
            }
        } else {
            let position = candidates
                .iter()
                .position(|c| c.value == anchor.value)
                .unwrap_or(0);
            if shift {
                (position + candidates.len() - 1) % candidates.len()
            } else {
                (position + 1) % candidates.len()
            }
        };

        let candidate = candidates[index].clone();
        self.pin_node(&candidate, false);
        state_callback(self.build_inputting(String::new()));
        true
    }

    fn handle_cursor_key(
        &mut self,
        key: &KeyEvent,
        state: &InputState,
        state_callback: &mut dyn FnMut(InputState),
        error_callback: &mut dyn FnMut(),
    ) -> bool {
        if !self.reading.is_empty() {
            error_callback();
            state_callback(self.build_inputting(String::new()));
            return true;
        }

        let cursor = self.grid.cursor_index();
        let w = self.grid.length();
        let target = match key.name {
            KeyName::Left => {
                if cursor == 0 {
                    None
                } else {
                    Some(cursor - 1)
                }
            }
            KeyName::Right => {
                if cursor == w {
                    None
                } else {
                    Some(cursor + 1)
                }
            }
            KeyName::Home => {
                if cursor == 0 {
                    None
                } else {
                    Some(0)
                }
            }
            _ => {
                if cursor == w {
                    None
                } else {
                    Some(w)
                }
            }
        };

        let Some(target) = target else {
            error_callback();
            self.re_emit_current(state, state_callback);
            return true;
        };
        self.grid.set_cursor_index(target);

        if key.shift {
            let anchor = match state {
                InputState::Marking(m) => m.mark_start_grid_index,
                _ => cursor,
            };
            if target == anchor {
                state_callback(self.build_inputting(String::new()));
            } else {
                state_callback(self.build_marking(anchor));
            }
            return true;
        }

        state_callback(self.build_inputting(String::new()));
        true
    }

    fn handle_backspace(
        &mut self,
        state: &InputState,
        state_callback: &mut dyn FnMut(InputState),
        error_callback: &mut dyn FnMut(),
    ) -> bool {
        if self.reading.has_tone_marker_only() {
            self.reading.clear_tone();
        } else if self.reading.is_empty() {
            if self.grid.cursor_index() == 0 {
                error_callback();
                self.re_emit_current(state, state_callback);
                return true;
            }
            self.grid.delete_reading_before_cursor(&self.model);
            self.walk();
        } else {
            self.reading.backspace();
        }

        self.emit_after_deletion(state_callback);
        true
    }

    fn handle_delete(
        &mut self,
        state: &InputState,
        state_callback: &mut dyn FnMut(InputState),
        error_callback: &mut dyn FnMut(),
    ) -> bool {
        if !self.reading.is_empty() {
            error_callback();
            state_callback(self.build_inputting(String::new()));
            return true;
        }
        if self.grid.cursor_index() == self.grid.length() {
            error_callback();
            self.re_emit_current(state, state_callback);
            return true;
        }
        self.grid.delete_reading_after_cursor(&self.model);
        self.walk();
        self.emit_after_deletion(state_callback);
        true
    }

    fn emit_after_deletion(&mut self, state_callback: &mut dyn FnMut(InputState)) {
        if self.grid.is_empty() && self.reading.is_empty() {
            self.reset();
            state_callback(InputState::EmptyIgnoringPrevious);
        } else {
            state_callback(self.build_inputting(String::new()));
        }
    }

    fn handle_enter(
        &mut self,
        state: &InputState,
        state_callback: &mut dyn FnMut(InputState),
        error_callback: &mut dyn FnMut(),
    ) -> bool {
        if let InputState::Marking(marking) = state {
            if !marking.acceptable {
                error_callback();
                state_callback(self.build_marking(marking.mark_start_grid_index));
                return true;
            }
            self.model.add_user_phrase(&marking.reading, &marking.marked);
            self.walk();
            state_callback(self.build_inputting(String::new()));
            return true;
        }

        let buffer = self.composing_state().buffer;
        self.reset();
        state_callback(InputState::Committing(Committing { text: buffer }));
        state_callback(InputState::Empty);
        true
    }

    fn handle_punctuation_list(
        &mut self,
        engine_empty: bool,
        state_callback: &mut dyn FnMut(InputState),
        error_callback: &mut dyn FnMut(),
    ) -> bool {
        if !self.model.has_unigrams_for(PUNCTUATION_LIST_KEY) {
            if engine_empty {
                return false;
            }
            error_callback();
            state_callback(self.build_inputting(String::new()));
            return true;
        }
        if !self.reading.is_empty() {
            error_callback();
            state_callback(self.build_inputting(String::new()));
            return true;
        }
        self.grid
            .insert_reading_at_cursor(PUNCTUATION_LIST_KEY, &self.model);
        let evicted = self.pop_evicted_text_and_walk();
        state_callback(self.build_inputting(evicted));
        state_callback(self.build_choosing_candidate());
        true
    }

    fn handle_other_ascii(
        &mut self,
        ch: char,
        engine_empty: bool,
        state_callback: &mut dyn FnMut(InputState),
        error_callback: &mut dyn FnMut(),
    ) -> bool {
        let layout_key = format!(
            "_punctuation_{}_{}",
            self.config.keyboard_layout.name(),
            ch
        );
        let generic_key = format!("_punctuation_{}", ch);

        let punctuation_key = if self.model.has_unigrams_for(&layout_key) {
            Some(layout_key)
        } else if self.model.has_unigrams_for(&generic_key) {
            Some(generic_key)
        } else {
            None
        };

        if let Some(key) = punctuation_key {
            if !self.reading.is_empty() {
                error_callback();
                state_callback(self.build_inputting(String::new()));
                return true;
            }
            self.compose_key_into_grid(&key, state_callback);
            return true;
        }

        if ch.is_ascii_alphabetic() {
            if self.config.base.letter_mode == LetterMode::Lower {
                let key = format!("_letter_{}", ch);
                if !self.reading.is_empty() {
                    error_callback();
                    state_callback(self.build_inputting(String::new()));
                    return true;
                }
                self.compose_key_into_grid(&key, state_callback);
                return true;
            }
            // Upper mode: flush the buffer, then the letter itself.
            if engine_empty {
                return false;
            }
            let buffer = self.composing_state().buffer;
            self.reset();
            state_callback(InputState::Committing(Committing { text: buffer }));
            state_callback(InputState::Committing(Committing {
                text: ch.to_string(),
            }));
            state_callback(InputState::Empty);
            return true;
        }

        if engine_empty {
            return false;
        }
        error_callback();
        state_callback(self.build_inputting(String::new()));
        true
    }

    // ---------- composition ----------

    fn compose_reading(
        &mut self,
        state_callback: &mut dyn FnMut(InputState),
        error_callback: &mut dyn FnMut(),
    ) -> bool {
        let reading_key = self.reading.composed_string();
        self.reading.clear();

        if !self.model.has_unigrams_for(&reading_key) {
            error_callback();
            if self.grid.is_empty() {
                state_callback(InputState::EmptyIgnoringPrevious);
            } else {
                state_callback(self.build_inputting(String::new()));
            }
            return true;
        }

        self.compose_key_into_grid(&reading_key, state_callback);
        true
    }

    // Shared tail of every successful composition: insert, evict, walk,
    // apply a cached override if one fits, freeze settled history, emit.
    fn compose_key_into_grid(&mut self, key: &str, state_callback: &mut dyn FnMut(InputState)) {
        self.grid.insert_reading_at_cursor(key, &self.model);
        let evicted = self.pop_evicted_text_and_walk();

        let cursor = self.actual_candidate_cursor_index();
        let now = (self.clock)();
        if let Some(suggestion) = self.user_override.suggest(&self.latest_walk, cursor, now) {
            let score = self.grid.highest_unigram_score_at(cursor) + EPSILON;
            self.grid
                .override_node_score_for_selected_candidate(cursor, &suggestion, score);
            self.walk();
        }
        self.freeze_distant_anchors();

        if self.config.base.traditional_mode {
            let candidates = self.candidates_at(cursor);
            if candidates.len() == 1 {
                let text = candidates.into_iter().next().map(|c| c.value).unwrap_or_default();
                self.reset();
                state_callback(InputState::Committing(Committing { text }));
                state_callback(InputState::Empty);
            } else {
                state_callback(self.build_inputting(evicted));
                state_callback(self.build_choosing_candidate());
            }
            return;
        }

        state_callback(self.build_inputting(evicted));
    }

    fn walk(&mut self) {
        self.latest_walk = Walker::new(&self.grid).walk();
    }

    fn pop_evicted_text_and_walk(&mut self) -> String {
        let mut evicted = String::new();
        if self.grid.length() > self.config.base.composing_buffer_size {
            if let Some(head) = self.latest_walk.first() {
                evicted = head.value.clone();
                self.grid.remove_head_readings(head.spanning_length);
            } else {
                self.grid.remove_head_readings(1);
            }
        }
        self.walk();
        evicted
    }

    // Selections far from the tail are pinned so
    // later walks cannot rewrite what the user has already read past.
    fn freeze_distant_anchors(&mut self) {
        let w = self.grid.length();
        if w <= WALK_FREEZE_WINDOW {
            return;
        }
        let limit = w - WALK_FREEZE_WINDOW;
        let anchors = self.latest_walk.clone();
        let mut changed = false;
        for anchor in &anchors {
            if anchor.location >= limit {
                break;
            }
            if anchor.score >= SELECTED_CANDIDATE_SCORE {
                continue;
            }
            self.grid.fix_node_selected_candidate(
                anchor.location + anchor.spanning_length,
                &anchor.value,
            );
            changed = true;
        }
        if changed {
            self.walk();
        }
    }

    fn pin_node(&mut self, candidate: &Candidate, use_move_cursor: bool) {
        let cursor = self.actual_candidate_cursor_index();
        let score = self.candidate_score(cursor, candidate);
        let fixed = self.grid.fix_node_selected_candidate(cursor, &candidate.value);
        if let Some(score) = score {
            if score > NO_OVERRIDE_THRESHOLD {
                self.user_override
                    .observe(&self.latest_walk, cursor, &candidate.value, (self.clock)());
            }
        }
        self.walk();
        if use_move_cursor && self.config.base.move_cursor_after_selection {
            if let Some((begin, length)) = fixed {
                self.grid.set_cursor_index(begin + length);
            }
        }
    }

    fn candidate_score(&self, cursor: usize, candidate: &Candidate) -> Option<f64> {
        for node in self.grid.nodes_crossing_or_ending_at(cursor) {
            if node.reading() != candidate.reading {
                continue;
            }
            if let Some(unigram) = node.unigrams().iter().find(|u| u.value == candidate.value) {
                return Some(unigram.score);
            }
        }
        None
    }

    // Shift the lookup index so it always lies
    // inside or at the right edge of some node.
    fn actual_candidate_cursor_index(&self) -> usize {
        let cursor = self.grid.cursor_index();
        let w = self.grid.length();
        match self.config.base.select_phrase {
            SelectPhrase::AfterCursor => {
                if cursor < w {
                    cursor + 1
                } else {
                    cursor
                }
            }
            SelectPhrase::BeforeCursor => {
                if cursor == 0 && w > 0 {
                    1
                } else {
                    cursor
                }
            }
        }
    }

    fn candidates_at(&self, i: usize) -> Vec<Candidate> {
        let mut out = Vec::new();
        for node in self.grid.nodes_crossing_or_ending_at(i) {
            for unigram in node.unigrams() {
                out.push(Candidate::new(node.reading(), unigram.value.clone()));
            }
        }
        out
    }

    // ---------- state construction ----------

    fn build_inputting(&self, evicted_text: String) -> InputState {
        InputState::Inputting(Inputting {
            composing: self.composing_state(),
            evicted_text,
        })
    }

    fn build_choosing_candidate(&self) -> InputState {
        let cursor = self.actual_candidate_cursor_index();
        InputState::ChoosingCandidate(ChoosingCandidate {
            composing: self.composing_state(),
            candidates: self.candidates_at(cursor),
        })
    }

    // Walk the anchors accumulating text and the
    // UTF-8 cursor, splicing the unfinished syllable in at the grid cursor.
    fn composing_state(&self) -> Composing {
        let cursor = self.grid.cursor_index();
        let mut composed = String::new();
        let mut head_codepoints = 0usize;
        let mut tooltip = String::new();
        let mut grid_pos = 0usize;

        for anchor in &self.latest_walk {
            composed.push_str(&anchor.value);
            let codepoints = anchor.value.chars().count();
            let end = grid_pos + anchor.spanning_length;
            if end <= cursor {
                head_codepoints += codepoints;
            } else if grid_pos < cursor {
                let distance = cursor - grid_pos;
                head_codepoints += distance.min(codepoints);
                if codepoints < anchor.spanning_length {
                    tooltip = self.cursor_tooltip(cursor);
                }
            }
            grid_pos = end;
        }

        let reading_display = self.reading.display();
        let head: String = composed.chars().take(head_codepoints).collect();
        let tail: String = composed.chars().skip(head_codepoints).collect();
        let cursor_index = head_codepoints + reading_display.chars().count();
        Composing {
            buffer: format!("{}{}{}", head, reading_display, tail),
            cursor_index,
            tooltip,
        }
    }

    // Codepoint offset of grid index `i` within the walked text.
    fn composed_codepoint_offset(&self, i: usize) -> usize {
        let mut offset = 0usize;
        let mut grid_pos = 0usize;
        for anchor in &self.latest_walk {
            let codepoints = anchor.value.chars().count();
            let end = grid_pos + anchor.spanning_length;
            if end <= i {
                offset += codepoints;
            } else if grid_pos < i {
                offset += (i - grid_pos).min(codepoints);
            }
            grid_pos = end;
        }
        offset
    }

    // Split the buffer at the marker and the cursor, and judge
    // whether the delta can become a user phrase.
    fn build_marking(&self, mark_start_grid_index: usize) -> InputState {
        let cursor = self.grid.cursor_index();
        let composing = self.composing_state();
        let chars: Vec<char> = composing.buffer.chars().collect();

        let a = self.composed_codepoint_offset(mark_start_grid_index);
        let b = self.composed_codepoint_offset(cursor);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let head: String = chars[..lo].iter().collect();
        let marked: String = chars[lo..hi].iter().collect();
        let tail: String = chars[hi..].iter().collect();

        let (reading_lo, reading_hi) = if mark_start_grid_index <= cursor {
            (mark_start_grid_index, cursor)
        } else {
            (cursor, mark_start_grid_index)
        };
        let readings = &self.grid.readings()[reading_lo..reading_hi];
        let reading = readings.join("-");
        let reading_ui = readings.join(" ");
        let syllables = reading_hi - reading_lo;

        let exists = self.model.phrase_exists(&reading, &marked);
        let acceptable = (2..=MAX_SPAN_LENGTH).contains(&syllables) && !exists;
        let tooltip = self.marking_tooltip(syllables, exists);

        InputState::Marking(Marking {
            composing: Composing {
                buffer: composing.buffer,
                cursor_index: composing.cursor_index,
                tooltip,
            },
            mark_start_grid_index,
            head,
            marked,
            tail,
            reading,
            reading_ui,
            acceptable,
        })
    }

    fn re_emit_current(&self, state: &InputState, state_callback: &mut dyn FnMut(InputState)) {
        match state {
            InputState::Marking(marking) => {
                state_callback(self.build_marking(marking.mark_start_grid_index))
            }
            _ => state_callback(self.build_inputting(String::new())),
        }
    }

    // ---------- tooltips ----------

    fn uses_chinese_ui(&self) -> bool {
        self.config.base.language.starts_with("zh")
    }

    fn cursor_tooltip(&self, cursor: usize) -> String {
        let readings = self.grid.readings();
        let before = &readings[cursor - 1];
        let after = &readings[cursor];
        if self.uses_chinese_ui() {
            format!("游標位於 {} 與 {} 之間", before, after)
        } else {
            format!("Cursor is between syllables {} and {}.", before, after)
        }
    }

    fn marking_tooltip(&self, syllables: usize, exists: bool) -> String {
        if self.uses_chinese_ui() {
            if syllables < 2 {
                "標記的詞太短，至少需要兩個音節".to_string()
            } else if syllables > MAX_SPAN_LENGTH {
                "標記的詞太長，最多六個音節".to_string()
            } else if exists {
                "該詞已存在".to_string()
            } else {
                "按 Enter 加入新詞".to_string()
            }
        } else if syllables < 2 {
            "Marked phrase is too short; mark at least 2 syllables.".to_string()
        } else if syllables > MAX_SPAN_LENGTH {
            "Marked phrase is too long; mark at most 6 syllables.".to_string()
        } else if exists {
            "The phrase already exists.".to_string()
        } else {
            "Press Enter to add the phrase.".to_string()
        }
    }
}

// The walked anchor whose span contains grid index `cursor` (crossing or
// ending at it).
fn anchor_at(path: &[NodeAnchor], cursor: usize) -> Option<&NodeAnchor> {
    path.iter()
        .find(|a| a.location < cursor && cursor <= a.location + a.spanning_length)
}
