//! Maximum-likelihood walk over the reading grid.
//!
//! A dynamic program over span start positions finds the node sequence with
//! the highest summed score covering [0, W). Ties are broken explicitly so
//! results are reproducible: the longer span wins, then the node whose
//! selected candidate is lexicographically smaller.

use crate::grid::ReadingGrid;
use std::cmp::Ordering;

/// One walked node at a fixed grid position.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAnchor {
    /// Start position, in readings.
    pub location: usize,
    pub spanning_length: usize,
    pub reading: String,
    /// The node's selected candidate at walk time.
    pub value: String,
    pub score: f64,
}

/// A complete path through the grid, as returned by `dump_paths`.
#[derive(Debug, Clone)]
pub struct WalkedPath {
    pub score: f64,
    pub anchors: Vec<NodeAnchor>,
}

/// Walks a borrowed grid. Stateless; create one per walk.
pub struct Walker<'a> {
    grid: &'a ReadingGrid,
}

impl<'a> Walker<'a> {
    pub fn new(grid: &'a ReadingGrid) -> Self {
        Self { grid }
    }

    /// The best anchored node sequence, head to tail. The anchors partition
    /// [0, W); an empty grid yields an empty path.
    pub fn walk(&self) -> Vec<NodeAnchor> {
        let w = self.grid.length();
        if w == 0 {
            return Vec::new();
        }

        let mut best = vec![f64::NEG_INFINITY; w + 1];
        // (span start, node index within span) of the best incoming edge
        let mut edge: Vec<Option<(usize, usize)>> = vec![None; w + 1];
        best[0] = 0.0;

        for begin in 0..w {
            if best[begin] == f64::NEG_INFINITY {
                continue;
            }
            for (ni, node) in self.grid.span(begin).iter().enumerate() {
                let end = begin + node.spanning_length();
                let score = best[begin] + node.score();
                let replace = match score.partial_cmp(&best[end]) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => match edge[end] {
                        Some((pb, pn)) => {
                            let prev = &self.grid.span(pb)[pn];
                            match node.spanning_length().cmp(&prev.spanning_length()) {
                                Ordering::Greater => true,
                                Ordering::Less => false,
                                Ordering::Equal => node.selected_value() < prev.selected_value(),
                            }
                        }
                        None => true,
                    },
                    _ => false,
                };
                if replace {
                    best[end] = score;
                    edge[end] = Some((begin, ni));
                }
            }
        }

        let mut anchors = Vec::new();
        let mut pos = w;
        while pos > 0 {
            let (begin, ni) = match edge[pos] {
                Some(e) => e,
                // Unreachable while unit nodes keep the lattice connected.
                None => return Vec::new(),
            };
            let node = &self.grid.span(begin)[ni];
            anchors.push(NodeAnchor {
                location: begin,
                spanning_length: node.spanning_length(),
                reading: node.reading().to_string(),
                value: node.selected_value().to_string(),
                score: node.score(),
            });
            pos = begin;
        }
        anchors.reverse();
        anchors
    }

    /// Every complete path through the grid, best first. Debugging aid;
    /// cost is exponential in W, so only call on small grids.
    pub fn dump_paths(&self) -> Vec<WalkedPath> {
        let w = self.grid.length();
        let mut out = Vec::new();
        if w == 0 {
            return out;
        }
        let mut stack = Vec::new();
        self.collect_paths(0, w, 0.0, &mut stack, &mut out);
        out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        out
    }

    fn collect_paths(
        &self,
        pos: usize,
        w: usize,
        score: f64,
        stack: &mut Vec<NodeAnchor>,
        out: &mut Vec<WalkedPath>,
    ) {
        if pos == w {
            out.push(WalkedPath {
                score,
                anchors: stack.clone(),
            });
            return;
        }
        for node in self.grid.span(pos) {
            stack.push(NodeAnchor {
                location: pos,
                spanning_length: node.spanning_length(),
                reading: node.reading().to_string(),
                value: node.selected_value().to_string(),
                score: node.score(),
            });
            self.collect_paths(pos + node.spanning_length(), w, score + node.score(), stack, out);
            stack.pop();
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

    fn grid_with(readings: &[&str]) -> ReadingGrid {
        let lm = test_model();
        let mut grid = ReadingGrid::new();
        for r in readings {
            grid.insert_reading_at_cursor(r, &lm);
        }
        grid
    }

    #[test]
    fn test_walk_prefers_phrase() {
        let grid = grid_with(&["ㄋㄧˇ", "ㄏㄠˇ"]);
        let path = Walker::new(&grid).walk();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].value, "你好");
        assert_eq!(path[0].spanning_length, 2);
    }

    #[test]
    fn test_walk_partitions_grid() {
        let grid = grid_with(&["ㄋㄧˇ", "ㄇㄚ", "ㄏㄠˇ"]);
        let path = Walker::new(&grid).walk();
        let mut pos = 0;
        for anchor in &path {
            assert_eq!(anchor.location, pos);
            pos += anchor.spanning_length;
        }
        assert_eq!(pos, grid.length());
    }

    #[test]
    fn test_walk_respects_pinned_candidate() {
        let lm = test_model();
        let mut grid = ReadingGrid::new();
        grid.insert_reading_at_cursor("ㄋㄧˇ", &lm);
        grid.insert_reading_at_cursor("ㄏㄠˇ", &lm);
        grid.fix_node_selected_candidate(1, "妳");
        let path = Walker::new(&grid).walk();
        // The pinned unit node outweighs the phrase node.
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].value, "妳");
        assert_eq!(path[1].value, "好");
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        let mut lex = Lexicon::new();
        lex.insert("ㄅ", "乙", -1.0);
        lex.insert("ㄅ", "甲", -1.0);
        let lm = Model::new(lex, UserPhrases::new());
        let mut grid = ReadingGrid::new();
        grid.insert_reading_at_cursor("ㄅ", &lm);
        // Equal scores: the selected candidate is still the first maximum,
        // and repeated walks agree.
        let a = Walker::new(&grid).walk();
        let b = Walker::new(&grid).walk();
        assert_eq!(a, b);
        assert_eq!(a[0].value, "乙");
    }

    #[test]
    fn test_dump_paths_sorted_and_complete() {
        let grid = grid_with(&["ㄋㄧˇ", "ㄏㄠˇ"]);
        let paths = Walker::new(&grid).dump_paths();
        // The phrase node, and the two unit nodes.
        assert_eq!(paths.len(), 2);
        assert!(paths.windows(2).all(|p| p[0].score >= p[1].score));
        assert_eq!(paths[0].anchors[0].value, "你好");
        let best = Walker::new(&grid).walk();
        assert_eq!(paths[0].anchors, best);
    }
}
