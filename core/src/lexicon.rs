//! Static dictionary lookup.
//!
//! The lexicon maps a reading key to scored phrases. Two storage paths:
//! an in-memory map fed by the plain-text format (`key value score value
//! score …` per line), and a compiled fast path backed by an FST key index
//! with a bincode payload vector (see `libformosa-tools build-lexicon`).

use crate::lm::Unigram;
use fst::Map;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;

/// One scored phrase in a compiled lexicon payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LexEntry {
    pub value: String,
    pub score: f64,
}

/// Reading-key → scored phrase dictionary.
#[derive(Debug, Default)]
pub struct Lexicon {
    // In-memory entries (plain-text loads and dynamic inserts)
    map: HashMap<String, Vec<LexEntry>>,
    // FST map for key → payload-index lookups
    fst_map: Option<Map<Vec<u8>>>,
    // Bincode-serialized payload vector (index → Vec<LexEntry>)
    payloads: Option<Vec<Vec<LexEntry>>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a scored phrase for a reading key.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V, score: f64) {
        let entry = LexEntry {
            value: value.into(),
            score,
        };
        self.map.entry(key.into()).or_default().push(entry);
    }

    /// Look up unigrams for a reading key, best score first.
    pub fn unigrams(&self, key: &str) -> Vec<Unigram> {
        let mut out: Vec<Unigram> = Vec::new();

        if let Some(entries) = self.map.get(key) {
            out.extend(entries.iter().map(|e| Unigram::new(&e.value, e.score)));
        } else if let (Some(map), Some(payloads)) = (&self.fst_map, &self.payloads) {
            if let Some(idx) = map.get(key) {
                if let Some(entries) = payloads.get(idx as usize) {
                    out.extend(entries.iter().map(|e| Unigram::new(&e.value, e.score)));
                }
            }
        }

        out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        out
    }

    /// True if the key has at least one entry in either storage path.
    pub fn contains_key(&self, key: &str) -> bool {
        if self.map.contains_key(key) {
            return true;
        }
        if let Some(map) = &self.fst_map {
            return map.get(key).is_some();
        }
        false
    }

    /// Load the plain-text dictionary format.
    ///
    /// Each non-empty, non-`#` line is `key value score value score …`,
    /// whitespace-separated. A trailing value without a score is a format
    /// error, as is an unparsable score.
    pub fn load_from_text<P: AsRef<std::path::Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("read {}: {}", path.display(), e))?;
        Self::parse_text(&content)
    }

    /// Parse the plain-text dictionary format from a string.
    pub fn parse_text(content: &str) -> Result<Self, String> {
        let mut lex = Self::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let key = parts
                .next()
                .ok_or_else(|| format!("line {}: missing key", lineno + 1))?;
            let rest: Vec<&str> = parts.collect();
            if rest.is_empty() || rest.len() % 2 != 0 {
                return Err(format!("line {}: expected value/score pairs", lineno + 1));
            }
            for pair in rest.chunks(2) {
                let score: f64 = pair[1]
                    .parse()
                    .map_err(|e| format!("line {}: bad score {:?}: {}", lineno + 1, pair[1], e))?;
                lex.insert(key, pair[0], score);
            }
        }
        Ok(lex)
    }

    /// Load a compiled lexicon from FST + bincode artifacts.
    ///
    /// - `fst_path`: key → payload-index map
    /// - `bincode_path`: `Vec<Vec<LexEntry>>` payload vector
    pub fn load_from_fst_bincode<P: AsRef<std::path::Path>>(
        fst_path: P,
        bincode_path: P,
    ) -> Result<Self, String> {
        let fst_path = fst_path.as_ref();
        let bincode_path = bincode_path.as_ref();

        let mut f =
            File::open(fst_path).map_err(|e| format!("open fst {}: {}", fst_path.display(), e))?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)
            .map_err(|e| format!("read fst: {}", e))?;
        let map = Map::new(buf).map_err(|e| format!("fst map: {}", e))?;

        let mut f = File::open(bincode_path)
            .map_err(|e| format!("open bincode {}: {}", bincode_path.display(), e))?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)
            .map_err(|e| format!("read bincode: {}", e))?;
        let payloads: Vec<Vec<LexEntry>> =
            bincode::deserialize(&buf).map_err(|e| format!("deserialize bincode: {}", e))?;

        Ok(Self {
            map: HashMap::new(),
            fst_map: Some(map),
            payloads: Some(payloads),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_and_lookup() {
        let lex = Lexicon::parse_text(
            "# comment\n\
             ㄋㄧˇ 你 -3.5 妳 -4.2\n\
             ㄏㄠˇ 好 -2.1\n",
        )
        .expect("parse");
        let u = lex.unigrams("ㄋㄧˇ");
        assert_eq!(u.len(), 2);
        assert_eq!(u[0].value, "你");
        assert_eq!(u[1].value, "妳");
        assert!(lex.contains_key("ㄏㄠˇ"));
        assert!(!lex.contains_key("ㄇㄚ"));
    }

    #[test]
    fn test_unigrams_sorted_by_score() {
        let mut lex = Lexicon::new();
        lex.insert("k", "low", -9.0);
        lex.insert("k", "high", -1.0);
        let u = lex.unigrams("k");
        assert_eq!(u[0].value, "high");
        assert_eq!(u[1].value, "low");
    }

    #[test]
    fn test_parse_text_rejects_odd_pairs() {
        assert!(Lexicon::parse_text("k 你\n").is_err());
        assert!(Lexicon::parse_text("k 你 x\n").is_err());
    }

    #[test]
    fn test_fst_bincode_roundtrip() {
        // Build a tiny compiled lexicon in a temp dir, then load it back.
        let dir = std::env::temp_dir().join(format!(
            "libformosa_lexicon_test_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let fst_path = dir.join("lexicon.fst");
        let bin_path = dir.join("lexicon.bin");

        // FST keys must be inserted in sorted order.
        let mut keys: Vec<(String, Vec<LexEntry>)> = vec![
            (
                "ㄏㄠˇ".to_string(),
                vec![LexEntry {
                    value: "好".to_string(),
                    score: -2.0,
                }],
            ),
            (
                "ㄋㄧˇ".to_string(),
                vec![
                    LexEntry {
                        value: "你".to_string(),
                        score: -3.0,
                    },
                    LexEntry {
                        value: "妳".to_string(),
                        score: -4.0,
                    },
                ],
            ),
        ];
        keys.sort_by(|a, b| a.0.cmp(&b.0));

        let writer = std::io::BufWriter::new(File::create(&fst_path).expect("create fst"));
        let mut builder = fst::MapBuilder::new(writer).expect("builder");
        let mut payloads = Vec::new();
        for (i, (key, entries)) in keys.into_iter().enumerate() {
            builder.insert(key.as_bytes(), i as u64).expect("insert");
            payloads.push(entries);
        }
        builder.finish().expect("finish");
        std::fs::write(&bin_path, bincode::serialize(&payloads).expect("serialize"))
            .expect("write bincode");

        let lex = Lexicon::load_from_fst_bincode(&fst_path, &bin_path).expect("load");
        let u = lex.unigrams("ㄋㄧˇ");
        assert_eq!(u.len(), 2);
        assert_eq!(u[0].value, "你");
        assert!(lex.contains_key("ㄏㄠˇ"));
        assert!(lex.unigrams("ㄇㄚ").is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
