//! Reading grid.
//!
//! An ordered sequence of reading keys plus the candidate lattice built over
//! them: for every run of up to `MAX_SPAN_LENGTH` consecutive readings that
//! the language model knows, a `Node` carries the scored candidates for that
//! span. The grid is updated incrementally around the mutation point, so
//! selections and pins on untouched nodes survive edits elsewhere.

use crate::lm::{LanguageModel, Unigram};

/// Longest phrase span, in readings.
pub const MAX_SPAN_LENGTH: usize = 6;

/// Sentinel score marking a candidate the user selected by hand. A node at
/// or above this score is "pinned": re-walks cannot silently change it.
pub const SELECTED_CANDIDATE_SCORE: f64 = 99.0;

// Score of the literal fallback unigram on unit nodes the language model
// has no entry for. Low enough that real phrases always win, and below the
// override-recording floor so literals never enter the override cache.
const LITERAL_NODE_SCORE: f64 = -10.0;

/// A candidate span over `spanning_length` consecutive readings.
#[derive(Debug, Clone)]
pub struct Node {
    reading: String,
    spanning_length: usize,
    unigrams: Vec<Unigram>,
    selected: usize,
    override_score: Option<f64>,
}

impl Node {
    fn new(reading: String, spanning_length: usize, unigrams: Vec<Unigram>) -> Self {
        debug_assert!(!unigrams.is_empty());
        let mut selected = 0;
        for (i, u) in unigrams.iter().enumerate() {
            if u.score > unigrams[selected].score {
                selected = i;
            }
        }
        Self {
            reading,
            spanning_length,
            unigrams,
            selected,
            override_score: None,
        }
    }

    /// The joined reading key this node spans.
    pub fn reading(&self) -> &str {
        &self.reading
    }

    pub fn spanning_length(&self) -> usize {
        self.spanning_length
    }

    /// Candidate list, in language-model order.
    pub fn unigrams(&self) -> &[Unigram] {
        &self.unigrams
    }

    pub fn selected_unigram(&self) -> &Unigram {
        &self.unigrams[self.selected]
    }

    pub fn selected_value(&self) -> &str {
        &self.unigrams[self.selected].value
    }

    /// Walk score: the override score if one is set, else the selected
    /// candidate's score.
    pub fn score(&self) -> f64 {
        self.override_score
            .unwrap_or_else(|| self.unigrams[self.selected].score)
    }

    /// True once the user has fixed this node's candidate by hand.
    pub fn is_pinned(&self) -> bool {
        self.score() >= SELECTED_CANDIDATE_SCORE
    }

    fn index_of(&self, value: &str) -> Option<usize> {
        self.unigrams.iter().position(|u| u.value == value)
    }

    fn select_pinned(&mut self, index: usize) {
        self.selected = index;
        self.override_score = Some(SELECTED_CANDIDATE_SCORE);
    }

    fn select_floating(&mut self, index: usize, score: f64) {
        self.selected = index;
        self.override_score = Some(score);
    }
}

/// The reading sequence, its candidate lattice and the grid cursor.
#[derive(Debug, Default)]
pub struct ReadingGrid {
    readings: Vec<String>,
    // spans[i]: nodes starting at reading i, sorted by ascending length
    spans: Vec<Vec<Node>>,
    cursor: usize,
}

impl ReadingGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of readings (the grid width W).
    pub fn length(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> &[String] {
        &self.readings
    }

    /// Grid cursor, in readings, always within [0, W].
    pub fn cursor_index(&self) -> usize {
        self.cursor
    }

    /// Move the grid cursor; out-of-range values are clamped to [0, W].
    pub fn set_cursor_index(&mut self, index: usize) {
        self.cursor = index.min(self.readings.len());
    }

    /// Drop all readings, nodes and the cursor.
    pub fn clear(&mut self) {
        self.readings.clear();
        self.spans.clear();
        self.cursor = 0;
    }

    /// Nodes starting at reading `begin`, shortest first.
    pub fn span(&self, begin: usize) -> &[Node] {
        &self.spans[begin]
    }

    /// Insert a reading at the cursor and materialize every node whose span
    /// contains it. The cursor advances past the new reading.
    pub fn insert_reading_at_cursor(&mut self, reading: &str, lm: &dyn LanguageModel) {
        let p = self.cursor;
        self.readings.insert(p, reading.to_string());
        self.spans.insert(p, Vec::new());

        // Nodes that used to span across the insertion point no longer
        // describe contiguous readings.
        let lo = p.saturating_sub(MAX_SPAN_LENGTH - 1);
        for begin in lo..p {
            self.spans[begin].retain(|n| begin + n.spanning_length <= p);
        }

        self.build_nodes_containing(p, lm);
        self.cursor += 1;
    }

    /// Delete the reading before the cursor. Returns false at the left edge.
    pub fn delete_reading_before_cursor(&mut self, lm: &dyn LanguageModel) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let p = self.cursor - 1;
        self.readings.remove(p);
        self.spans.remove(p);
        self.cursor -= 1;
        self.rebuild_junction(p, lm);
        true
    }

    /// Delete the reading after the cursor. Returns false at the right edge.
    pub fn delete_reading_after_cursor(&mut self, lm: &dyn LanguageModel) -> bool {
        if self.cursor >= self.readings.len() {
            return false;
        }
        let p = self.cursor;
        self.readings.remove(p);
        self.spans.remove(p);
        self.rebuild_junction(p, lm);
        true
    }

    /// Evict `n` readings from the head, pulling the cursor along.
    pub fn remove_head_readings(&mut self, n: usize) {
        let n = n.min(self.readings.len());
        if n == 0 {
            return;
        }
        self.readings.drain(0..n);
        self.spans.drain(0..n);
        self.cursor = self.cursor.saturating_sub(n);
        // Any node that contained an evicted reading started before index n
        // and was dropped with its span; the survivors only shift.
    }

    /// All nodes whose span crosses or ends at grid index `i` (that is,
    /// nodes [b, e) with b < i ≤ e). Ordered by ascending start position,
    /// longest span first within a position.
    pub fn nodes_crossing_or_ending_at(&self, i: usize) -> Vec<&Node> {
        let mut out = Vec::new();
        let w = self.readings.len();
        if i == 0 || i > w {
            return out;
        }
        let lo = i.saturating_sub(MAX_SPAN_LENGTH);
        for begin in lo..i {
            for node in self.spans[begin].iter().rev() {
                if begin + node.spanning_length >= i {
                    out.push(node);
                }
            }
        }
        out
    }

    /// Select `value` on the first node crossing or ending at `i` that
    /// carries it, and pin the choice so later walks keep it. Returns the
    /// pinned node's (start, spanning length).
    pub fn fix_node_selected_candidate(&mut self, i: usize, value: &str) -> Option<(usize, usize)> {
        let w = self.readings.len();
        if i == 0 || i > w {
            return None;
        }
        let lo = i.saturating_sub(MAX_SPAN_LENGTH);
        for begin in lo..i {
            for node in self.spans[begin].iter_mut().rev() {
                if begin + node.spanning_length < i {
                    continue;
                }
                if let Some(idx) = node.index_of(value) {
                    node.select_pinned(idx);
                    return Some((begin, node.spanning_length));
                }
            }
        }
        None
    }

    /// Give `value` a floating override score on every node crossing or
    /// ending at `i` that carries it. Used to bias a single walk without
    /// pinning.
    pub fn override_node_score_for_selected_candidate(
        &mut self,
        i: usize,
        value: &str,
        score: f64,
    ) {
        let w = self.readings.len();
        if i == 0 || i > w {
            return;
        }
        let lo = i.saturating_sub(MAX_SPAN_LENGTH);
        for begin in lo..i {
            for node in self.spans[begin].iter_mut() {
                if begin + node.spanning_length < i {
                    continue;
                }
                if let Some(idx) = node.index_of(value) {
                    node.select_floating(idx, score);
                }
            }
        }
    }

    /// Highest unigram score among the nodes around grid index `i`.
    pub fn highest_unigram_score_at(&self, i: usize) -> f64 {
        self.nodes_crossing_or_ending_at(i)
            .iter()
            .flat_map(|n| n.unigrams().iter())
            .map(|u| u.score)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    fn join_readings(&self, begin: usize, len: usize) -> String {
        self.readings[begin..begin + len].join("-")
    }

    // Materialize nodes for every span [begin, begin+len) containing reading
    // index p. Unit nodes always exist: the literal fallback keeps the
    // lattice connected when the language model has no entry.
    fn build_nodes_containing(&mut self, p: usize, lm: &dyn LanguageModel) {
        let w = self.readings.len();
        let lo = p.saturating_sub(MAX_SPAN_LENGTH - 1);
        for begin in lo..=p {
            let max_len = MAX_SPAN_LENGTH.min(w - begin);
            for len in 1..=max_len {
                if begin + len <= p {
                    continue;
                }
                let key = self.join_readings(begin, len);
                let mut unigrams = lm.unigrams_for(&key);
                if unigrams.is_empty() {
                    if len != 1 {
                        continue;
                    }
                    unigrams.push(Unigram::new(key.clone(), LITERAL_NODE_SCORE));
                }
                self.spans[begin].push(Node::new(key, len, unigrams));
            }
            self.spans[begin].sort_by_key(|n| n.spanning_length);
        }
    }

    // Rebuild the nodes bridging the junction left behind at index p after
    // a deletion.
    fn rebuild_junction(&mut self, p: usize, lm: &dyn LanguageModel) {
        let w = self.readings.len();
        let lo = p.saturating_sub(MAX_SPAN_LENGTH - 1);
        for begin in lo..p.min(w) {
            self.spans[begin].retain(|n| begin + n.spanning_length <= p);
        }
        if p >= w {
            return;
        }
        for begin in lo..p {
            let max_len = MAX_SPAN_LENGTH.min(w - begin);
            for len in (p - begin + 1)..=max_len {
                let key = self.join_readings(begin, len);
                let unigrams = lm.unigrams_for(&key);
                if unigrams.is_empty() {
                    continue;
                }
                self.spans[begin].push(Node::new(key, len, unigrams));
            }
            self.spans[begin].sort_by_key(|n| n.spanning_length);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::lm::Model;
    use crate::user_phrases::UserPhrases;

    fn test_model() -> Model {
        let mut lex = Lexicon::new();
        lex.insert("ㄋㄧˇ", "你", -3.0);
        lex.insert("ㄋㄧˇ", "妳", -4.0);
        lex.insert("ㄏㄠˇ", "好", -2.5);
        lex.insert("ㄋㄧˇ-ㄏㄠˇ", "你好", -4.5);
        Model::new(lex, UserPhrases::new())
    }

    #[test]
    fn test_insert_builds_unit_and_phrase_nodes() {
        let lm = test_model();
        let mut grid = ReadingGrid::new();
        grid.insert_reading_at_cursor("ㄋㄧˇ", &lm);
        grid.insert_reading_at_cursor("ㄏㄠˇ", &lm);

        assert_eq!(grid.length(), 2);
        assert_eq!(grid.cursor_index(), 2);
        // Start 0 has the unit node and the two-reading phrase node.
        let lens: Vec<usize> = grid.span(0).iter().map(|n| n.spanning_length()).collect();
        assert_eq!(lens, vec![1, 2]);
        assert_eq!(grid.span(1).len(), 1);

        let nodes = grid.nodes_crossing_or_ending_at(2);
        let readings: Vec<&str> = nodes.iter().map(|n| n.reading()).collect();
        assert_eq!(readings, vec!["ㄋㄧˇ-ㄏㄠˇ", "ㄏㄠˇ"]);
    }

    #[test]
    fn test_literal_fallback_on_unknown_unit() {
        let lm = test_model();
        let mut grid = ReadingGrid::new();
        grid.insert_reading_at_cursor("ㄇㄚ", &lm);
        let node = &grid.span(0)[0];
        assert_eq!(node.selected_value(), "ㄇㄚ");
        assert!(node.score() < -8.0);
    }

    #[test]
    fn test_delete_before_cursor_rebuilds_junction() {
        let lm = test_model();
        let mut grid = ReadingGrid::new();
        grid.insert_reading_at_cursor("ㄋㄧˇ", &lm);
        grid.insert_reading_at_cursor("ㄏㄠˇ", &lm);
        grid.set_cursor_index(1);
        assert!(grid.delete_reading_before_cursor(&lm));

        assert_eq!(grid.length(), 1);
        assert_eq!(grid.cursor_index(), 0);
        assert_eq!(grid.readings(), &["ㄏㄠˇ"]);
        // The phrase node over the removed reading is gone.
        assert_eq!(grid.span(0).len(), 1);

        assert!(!grid.delete_reading_before_cursor(&lm));
    }

    #[test]
    fn test_middle_insert_drops_stale_phrase_nodes() {
        let lm = test_model();
        let mut grid = ReadingGrid::new();
        grid.insert_reading_at_cursor("ㄋㄧˇ", &lm);
        grid.insert_reading_at_cursor("ㄏㄠˇ", &lm);
        grid.set_cursor_index(1);
        grid.insert_reading_at_cursor("ㄇㄚ", &lm);

        // ㄋㄧˇ-ㄏㄠˇ is no longer contiguous, so no node spans it.
        assert_eq!(grid.readings(), &["ㄋㄧˇ", "ㄇㄚ", "ㄏㄠˇ"]);
        for node in grid.span(0) {
            assert_eq!(node.spanning_length(), 1);
        }
    }

    #[test]
    fn test_fix_and_override() {
        let lm = test_model();
        let mut grid = ReadingGrid::new();
        grid.insert_reading_at_cursor("ㄋㄧˇ", &lm);

        let fixed = grid.fix_node_selected_candidate(1, "妳");
        assert_eq!(fixed, Some((0, 1)));
        let node = &grid.span(0)[0];
        assert_eq!(node.selected_value(), "妳");
        assert!(node.is_pinned());
        assert_eq!(node.score(), SELECTED_CANDIDATE_SCORE);

        // Unknown values change nothing.
        assert_eq!(grid.fix_node_selected_candidate(1, "您"), None);
    }

    #[test]
    fn test_floating_override_is_not_pinned() {
        let lm = test_model();
        let mut grid = ReadingGrid::new();
        grid.insert_reading_at_cursor("ㄋㄧˇ", &lm);
        grid.override_node_score_for_selected_candidate(1, "妳", -2.9);
        let node = &grid.span(0)[0];
        assert_eq!(node.selected_value(), "妳");
        assert_eq!(node.score(), -2.9);
        assert!(!node.is_pinned());
    }

    #[test]
    fn test_cursor_clamped() {
        let lm = test_model();
        let mut grid = ReadingGrid::new();
        grid.insert_reading_at_cursor("ㄋㄧˇ", &lm);
        grid.set_cursor_index(99);
        assert_eq!(grid.cursor_index(), 1);
    }

    #[test]
    fn test_remove_head_readings() {
        let lm = test_model();
        let mut grid = ReadingGrid::new();
        grid.insert_reading_at_cursor("ㄋㄧˇ", &lm);
        grid.insert_reading_at_cursor("ㄏㄠˇ", &lm);
        grid.remove_head_readings(1);
        assert_eq!(grid.readings(), &["ㄏㄠˇ"]);
        assert_eq!(grid.cursor_index(), 1);
        assert_eq!(grid.span(0).len(), 1);
        assert_eq!(grid.span(0)[0].reading(), "ㄏㄠˇ");
    }
}
