//! Per-syllable reading assembler.
//!
//! `ReadingBuffer` accumulates keystrokes into one Bopomofo syllable for
//! the active keyboard layout. Component layouts resolve each key against
//! the partial syllable (overloaded Hsu/ETen26 keys pick the first
//! candidate that fits); Hanyu Pinyin accumulates letters and converts the
//! whole romanized syllable once a tone digit arrives.

use crate::bopomofo::{Bopomofo, Kind, Syllable};
use crate::layout::KeyboardLayout;
use once_cell::sync::Lazy;
use std::collections::HashMap;

// Longest first so "zh" wins over "z".
const PINYIN_INITIALS: &[(&str, Bopomofo)] = &[
    ("zh", Bopomofo::Zh),
    ("ch", Bopomofo::Ch),
    ("sh", Bopomofo::Sh),
    ("b", Bopomofo::B),
    ("p", Bopomofo::P),
    ("m", Bopomofo::M),
    ("f", Bopomofo::F),
    ("d", Bopomofo::D),
    ("t", Bopomofo::T),
    ("n", Bopomofo::N),
    ("l", Bopomofo::L),
    ("g", Bopomofo::G),
    ("k", Bopomofo::K),
    ("h", Bopomofo::H),
    ("j", Bopomofo::J),
    ("q", Bopomofo::Q),
    ("x", Bopomofo::X),
    ("r", Bopomofo::R),
    ("z", Bopomofo::Z),
    ("c", Bopomofo::C),
    ("s", Bopomofo::S),
];

// Final spellings (after y/w rewrites and ü-normalization to 'v') mapped to
// (medial, final) component pairs.
static PINYIN_FINALS: Lazy<HashMap<&'static str, (Option<Bopomofo>, Option<Bopomofo>)>> =
    Lazy::new(|| {
        use Bopomofo::*;
        let mut map: HashMap<&'static str, (Option<Bopomofo>, Option<Bopomofo>)> = HashMap::new();
        let entries: &[(&str, Option<Bopomofo>, Option<Bopomofo>)] = &[
            ("a", None, Some(A)),
            ("o", None, Some(O)),
            ("e", None, Some(E)),
            ("ai", None, Some(Ai)),
            ("ei", None, Some(Ei)),
            ("ao", None, Some(Ao)),
            ("ou", None, Some(Ou)),
            ("an", None, Some(An)),
            ("en", None, Some(En)),
            ("ang", None, Some(Ang)),
            ("eng", None, Some(Eng)),
            ("er", None, Some(Er)),
            ("i", Some(I), None),
            ("ia", Some(I), Some(A)),
            ("ie", Some(I), Some(Eh)),
            ("iao", Some(I), Some(Ao)),
            ("iu", Some(I), Some(Ou)),
            ("iou", Some(I), Some(Ou)),
            ("ian", Some(I), Some(An)),
            ("in", Some(I), Some(En)),
            ("iang", Some(I), Some(Ang)),
            ("ing", Some(I), Some(Eng)),
            ("iong", Some(Yu), Some(Eng)),
            ("u", Some(U), None),
            ("ua", Some(U), Some(A)),
            ("uo", Some(U), Some(O)),
            ("uai", Some(U), Some(Ai)),
            ("ui", Some(U), Some(Ei)),
            ("uei", Some(U), Some(Ei)),
            ("uan", Some(U), Some(An)),
            ("un", Some(U), Some(En)),
            ("uen", Some(U), Some(En)),
            ("uang", Some(U), Some(Ang)),
            ("ueng", Some(U), Some(Eng)),
            ("ong", Some(U), Some(Eng)),
            ("v", Some(Yu), None),
            ("ve", Some(Yu), Some(Eh)),
            ("van", Some(Yu), Some(An)),
            ("vn", Some(Yu), Some(En)),
        ];
        for &(spelling, medial, rime) in entries {
            map.insert(spelling, (medial, rime));
        }
        map
    });

/// Convert a toneless pinyin spelling plus tone digit into a syllable.
/// Returns None for spellings outside the syllabary.
pub fn pinyin_to_syllable(pinyin: &str, tone: u8) -> Option<Syllable> {
    if pinyin.is_empty() || !(1..=5).contains(&tone) {
        return None;
    }

    let mut initial: Option<Bopomofo> = None;
    let rest: String;

    if let Some(after) = pinyin.strip_prefix('y') {
        rest = if let Some(tail) = pinyin.strip_prefix("yu") {
            format!("v{}", tail)
        } else if let Some(tail) = pinyin.strip_prefix("yi") {
            format!("i{}", tail)
        } else {
            format!("i{}", after)
        };
    } else if pinyin == "wu" {
        rest = "u".to_string();
    } else if let Some(after) = pinyin.strip_prefix('w') {
        rest = format!("u{}", after);
    } else if matches!(pinyin.chars().next(), Some('a' | 'e' | 'o')) {
        // Zero-initial syllables (a, ou, er, …).
        rest = pinyin.to_string();
    } else {
        let &(prefix, component) = PINYIN_INITIALS
            .iter()
            .find(|(prefix, _)| pinyin.starts_with(prefix))?;
        initial = Some(component);
        let mut tail = pinyin[prefix.len()..].to_string();
        // After j/q/x the letter u spells ü.
        if matches!(component, Bopomofo::J | Bopomofo::Q | Bopomofo::X) && tail.starts_with('u') {
            tail.replace_range(0..1, "v");
        }
        // The empty rime of the retroflex and sibilant rows is spelled i.
        if tail == "i"
            && matches!(
                component,
                Bopomofo::Zh
                    | Bopomofo::Ch
                    | Bopomofo::Sh
                    | Bopomofo::R
                    | Bopomofo::Z
                    | Bopomofo::C
                    | Bopomofo::S
            )
        {
            tail.clear();
        }
        rest = tail;
    }

    let mut syllable = Syllable::new();
    if let Some(component) = initial {
        syllable.insert(component);
    }
    if !rest.is_empty() {
        let (medial, rime) = PINYIN_FINALS.get(rest.as_str())?;
        if let Some(component) = medial {
            syllable.insert(*component);
        }
        if let Some(component) = rime {
            syllable.insert(*component);
        }
    } else if initial.is_none() {
        return None;
    }

    match tone {
        2 => syllable.insert(Bopomofo::Tone2),
        3 => syllable.insert(Bopomofo::Tone3),
        4 => syllable.insert(Bopomofo::Tone4),
        5 => syllable.insert(Bopomofo::Tone5),
        _ => {}
    }
    Some(syllable)
}

/// Accumulates keystrokes into one syllable for the active layout.
#[derive(Debug, Clone)]
pub struct ReadingBuffer {
    layout: KeyboardLayout,
    syllable: Syllable,
    pinyin: String,
    pinyin_tone: Option<u8>,
}

impl ReadingBuffer {
    pub fn new(layout: KeyboardLayout) -> Self {
        Self {
            layout,
            syllable: Syllable::new(),
            pinyin: String::new(),
            pinyin_tone: None,
        }
    }

    pub fn layout(&self) -> KeyboardLayout {
        self.layout
    }

    /// Switch layouts; any partial syllable is dropped.
    pub fn set_layout(&mut self, layout: KeyboardLayout) {
        self.layout = layout;
        self.clear();
    }

    pub fn is_empty(&self) -> bool {
        if self.layout.is_component_layout() {
            self.syllable.is_empty()
        } else {
            self.pinyin.is_empty() && self.pinyin_tone.is_none()
        }
    }

    pub fn syllable(&self) -> &Syllable {
        &self.syllable
    }

    /// True if `combine` would accept this key right now.
    pub fn is_valid_key(&self, ch: char) -> bool {
        if self.layout.is_component_layout() {
            self.resolve(ch).is_some()
        } else if ch.is_ascii_lowercase() {
            self.pinyin.len() < 8
        } else {
            ('1'..='5').contains(&ch) && !self.pinyin.is_empty()
        }
    }

    /// Append a keystroke. Returns false if the key is not legal here.
    pub fn combine(&mut self, ch: char) -> bool {
        if self.layout.is_component_layout() {
            match self.resolve(ch) {
                Some(component) => {
                    self.syllable.insert(component);
                    true
                }
                None => false,
            }
        } else if ch.is_ascii_lowercase() && self.pinyin.len() < 8 {
            self.pinyin.push(ch);
            true
        } else if ('1'..='5').contains(&ch) && !self.pinyin.is_empty() {
            self.pinyin_tone = Some(ch as u8 - b'0');
            true
        } else {
            false
        }
    }

    // Pick the first candidate that fits the partial syllable: initials
    // only at the start, medials before the final, tones only once there
    // is something to intone. An overloaded key whose candidates all
    // collide falls back to its first candidate, replacing in place.
    fn resolve(&self, ch: char) -> Option<Bopomofo> {
        let candidates = self.layout.key_components(ch);
        if candidates.is_empty() {
            return None;
        }
        for component in candidates {
            let fits = match component.kind() {
                Kind::Initial => {
                    self.syllable.initial().is_none()
                        && self.syllable.medial().is_none()
                        && self.syllable.rime().is_none()
                }
                Kind::Medial => {
                    self.syllable.medial().is_none() && self.syllable.rime().is_none()
                }
                Kind::Final => self.syllable.rime().is_none(),
                Kind::Tone => !self.syllable.is_empty(),
            };
            if fits {
                return Some(*component);
            }
        }
        let first = candidates[0];
        // Tones on an empty syllable stay invalid even as a fallback.
        if first.kind() == Kind::Tone && self.syllable.is_empty() {
            return None;
        }
        Some(first)
    }

    pub fn has_tone_marker(&self) -> bool {
        if self.layout.is_component_layout() {
            self.syllable.has_tone()
        } else {
            self.pinyin_tone.is_some()
        }
    }

    pub fn has_tone_marker_only(&self) -> bool {
        if self.layout.is_component_layout() {
            self.syllable.has_tone_only()
        } else {
            self.pinyin_tone.is_some() && self.pinyin.is_empty()
        }
    }

    /// The reading key of the finished syllable, in displayed Bopomofo.
    /// Pinyin spellings outside the syllabary come back verbatim, which no
    /// dictionary key matches, so the caller's no-unigram path handles them.
    pub fn composed_string(&self) -> String {
        if self.layout.is_component_layout() {
            self.syllable.to_string()
        } else {
            match pinyin_to_syllable(&self.pinyin, self.pinyin_tone.unwrap_or(1)) {
                Some(syllable) => syllable.to_string(),
                None => self.pinyin.clone(),
            }
        }
    }

    /// What the composing buffer shows while the syllable is unfinished.
    pub fn display(&self) -> String {
        if self.layout.is_component_layout() {
            self.syllable.to_string()
        } else {
            self.pinyin.clone()
        }
    }

    /// Undo the last keystroke. Returns false when already empty.
    pub fn backspace(&mut self) -> bool {
        if self.layout.is_component_layout() {
            self.syllable.remove_last()
        } else if self.pinyin_tone.is_some() {
            self.pinyin_tone = None;
            true
        } else {
            self.pinyin.pop().is_some()
        }
    }

    pub fn clear_tone(&mut self) {
        self.syllable.clear_tone();
        self.pinyin_tone = None;
    }

    pub fn clear(&mut self) {
        self.syllable.clear();
        self.pinyin.clear();
        self.pinyin_tone = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout_assembles_syllable() {
        let mut reading = ReadingBuffer::new(KeyboardLayout::Standard);
        assert!(reading.is_valid_key('s'));
        assert!(reading.combine('s'));
        assert!(reading.combine('u'));
        assert_eq!(reading.display(), "ㄋㄧ");
        assert!(!reading.has_tone_marker());
        assert!(reading.combine('3'));
        assert!(reading.has_tone_marker());
        assert_eq!(reading.composed_string(), "ㄋㄧˇ");
    }

    #[test]
    fn test_tone_rejected_on_empty_syllable() {
        let reading = ReadingBuffer::new(KeyboardLayout::Standard);
        assert!(!reading.is_valid_key('3'));
        assert!(!reading.is_valid_key('!'));
    }

    #[test]
    fn test_backspace_and_clear() {
        let mut reading = ReadingBuffer::new(KeyboardLayout::Standard);
        reading.combine('s');
        reading.combine('u');
        assert!(reading.backspace());
        assert_eq!(reading.display(), "ㄋ");
        reading.clear();
        assert!(reading.is_empty());
        assert!(!reading.backspace());
    }

    #[test]
    fn test_hsu_overloaded_key_resolution() {
        let mut reading = ReadingBuffer::new(KeyboardLayout::Hsu);
        // 'j' at the start is the initial ㄐ.
        assert!(reading.combine('j'));
        assert_eq!(reading.syllable().initial(), Some(Bopomofo::J));
        // 'e' after an initial is the medial ㄧ.
        assert!(reading.combine('e'));
        assert_eq!(reading.syllable().medial(), Some(Bopomofo::I));
        // Another 'j' can no longer be an initial: it lands as the tone.
        assert!(reading.combine('j'));
        assert_eq!(reading.syllable().tone(), Some(Bopomofo::Tone4));
        assert_eq!(reading.composed_string(), "ㄐㄧˋ");
    }

    #[test]
    fn test_pinyin_accumulates_and_composes() {
        let mut reading = ReadingBuffer::new(KeyboardLayout::HanyuPinyin);
        assert!(!reading.is_valid_key('3'));
        for ch in "ni".chars() {
            assert!(reading.combine(ch));
        }
        assert_eq!(reading.display(), "ni");
        assert!(reading.combine('3'));
        assert!(reading.has_tone_marker());
        assert_eq!(reading.composed_string(), "ㄋㄧˇ");
    }

    #[test]
    fn test_pinyin_backspace_removes_tone_first() {
        let mut reading = ReadingBuffer::new(KeyboardLayout::HanyuPinyin);
        for ch in "hao".chars() {
            reading.combine(ch);
        }
        reading.combine('3');
        assert!(reading.backspace());
        assert!(!reading.has_tone_marker());
        assert_eq!(reading.display(), "hao");
    }

    #[test]
    fn test_pinyin_table_conversions() {
        let cases = [
            ("ni", 3, "ㄋㄧˇ"),
            ("hao", 3, "ㄏㄠˇ"),
            ("zhong", 1, "ㄓㄨㄥ"),
            ("guo", 2, "ㄍㄨㄛˊ"),
            ("xue", 2, "ㄒㄩㄝˊ"),
            ("yu", 3, "ㄩˇ"),
            ("wo", 3, "ㄨㄛˇ"),
            ("you", 3, "ㄧㄡˇ"),
            ("yuan", 2, "ㄩㄢˊ"),
            ("er", 4, "ㄦˋ"),
            ("shi", 4, "ㄕˋ"),
            ("si", 4, "ㄙˋ"),
            ("lun", 2, "ㄌㄨㄣˊ"),
            ("jiu", 3, "ㄐㄧㄡˇ"),
            ("ying", 1, "ㄧㄥ"),
        ];
        for (pinyin, tone, expected) in cases {
            let syllable = pinyin_to_syllable(pinyin, tone).expect(pinyin);
            assert_eq!(syllable.to_string(), expected, "pinyin {}", pinyin);
        }
        assert!(pinyin_to_syllable("blorp", 1).is_none());
        assert!(pinyin_to_syllable("", 1).is_none());
    }
}
