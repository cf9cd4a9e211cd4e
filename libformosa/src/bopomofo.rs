//! Bopomofo symbols and syllables.
//!
//! The 37 phonetic symbols plus the tone marks, a `Syllable` that holds at
//! most one component of each kind in canonical order, and the
//! absolute-order encoding used as the compiled-dictionary key space.

use std::fmt;

/// A single Bopomofo component or tone mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bopomofo {
    // Initials
    B,
    P,
    M,
    F,
    D,
    T,
    N,
    L,
    G,
    K,
    H,
    J,
    Q,
    X,
    Zh,
    Ch,
    Sh,
    R,
    Z,
    C,
    S,
    // Medials
    I,
    U,
    Yu,
    // Finals
    A,
    O,
    E,
    Eh,
    Ai,
    Ei,
    Ao,
    Ou,
    An,
    En,
    Ang,
    Eng,
    Er,
    // Tones; the first tone has no written mark.
    Tone1,
    Tone2,
    Tone3,
    Tone4,
    Tone5,
}

/// Component classification within a syllable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Initial,
    Medial,
    Final,
    Tone,
}

const INITIALS: [Bopomofo; 21] = [
    Bopomofo::B,
    Bopomofo::P,
    Bopomofo::M,
    Bopomofo::F,
    Bopomofo::D,
    Bopomofo::T,
    Bopomofo::N,
    Bopomofo::L,
    Bopomofo::G,
    Bopomofo::K,
    Bopomofo::H,
    Bopomofo::J,
    Bopomofo::Q,
    Bopomofo::X,
    Bopomofo::Zh,
    Bopomofo::Ch,
    Bopomofo::Sh,
    Bopomofo::R,
    Bopomofo::Z,
    Bopomofo::C,
    Bopomofo::S,
];

const MEDIALS: [Bopomofo; 3] = [Bopomofo::I, Bopomofo::U, Bopomofo::Yu];

const FINALS: [Bopomofo; 13] = [
    Bopomofo::A,
    Bopomofo::O,
    Bopomofo::E,
    Bopomofo::Eh,
    Bopomofo::Ai,
    Bopomofo::Ei,
    Bopomofo::Ao,
    Bopomofo::Ou,
    Bopomofo::An,
    Bopomofo::En,
    Bopomofo::Ang,
    Bopomofo::Eng,
    Bopomofo::Er,
];

impl Bopomofo {
    pub fn kind(self) -> Kind {
        use Bopomofo::*;
        match self {
            B | P | M | F | D | T | N | L | G | K | H | J | Q | X | Zh | Ch | Sh | R | Z | C
            | S => Kind::Initial,
            I | U | Yu => Kind::Medial,
            A | O | E | Eh | Ai | Ei | Ao | Ou | An | En | Ang | Eng | Er => Kind::Final,
            Tone1 | Tone2 | Tone3 | Tone4 | Tone5 => Kind::Tone,
        }
    }

    /// The written form. The first tone is unwritten.
    pub fn to_char(self) -> Option<char> {
        use Bopomofo::*;
        Some(match self {
            B => 'ㄅ',
            P => 'ㄆ',
            M => 'ㄇ',
            F => 'ㄈ',
            D => 'ㄉ',
            T => 'ㄊ',
            N => 'ㄋ',
            L => 'ㄌ',
            G => 'ㄍ',
            K => 'ㄎ',
            H => 'ㄏ',
            J => 'ㄐ',
            Q => 'ㄑ',
            X => 'ㄒ',
            Zh => 'ㄓ',
            Ch => 'ㄔ',
            Sh => 'ㄕ',
            R => 'ㄖ',
            Z => 'ㄗ',
            C => 'ㄘ',
            S => 'ㄙ',
            I => 'ㄧ',
            U => 'ㄨ',
            Yu => 'ㄩ',
            A => 'ㄚ',
            O => 'ㄛ',
            E => 'ㄜ',
            Eh => 'ㄝ',
            Ai => 'ㄞ',
            Ei => 'ㄟ',
            Ao => 'ㄠ',
            Ou => 'ㄡ',
            An => 'ㄢ',
            En => 'ㄣ',
            Ang => 'ㄤ',
            Eng => 'ㄥ',
            Er => 'ㄦ',
            Tone2 => 'ˊ',
            Tone3 => 'ˇ',
            Tone4 => 'ˋ',
            Tone5 => '˙',
            Tone1 => return None,
        })
    }

    pub fn from_char(ch: char) -> Option<Bopomofo> {
        use Bopomofo::*;
        Some(match ch {
            'ㄅ' => B,
            'ㄆ' => P,
            'ㄇ' => M,
            'ㄈ' => F,
            'ㄉ' => D,
            'ㄊ' => T,
            'ㄋ' => N,
            'ㄌ' => L,
            'ㄍ' => G,
            'ㄎ' => K,
            'ㄏ' => H,
            'ㄐ' => J,
            'ㄑ' => Q,
            'ㄒ' => X,
            'ㄓ' => Zh,
            'ㄔ' => Ch,
            'ㄕ' => Sh,
            'ㄖ' => R,
            'ㄗ' => Z,
            'ㄘ' => C,
            'ㄙ' => S,
            'ㄧ' => I,
            'ㄨ' => U,
            'ㄩ' => Yu,
            'ㄚ' => A,
            'ㄛ' => O,
            'ㄜ' => E,
            'ㄝ' => Eh,
            'ㄞ' => Ai,
            'ㄟ' => Ei,
            'ㄠ' => Ao,
            'ㄡ' => Ou,
            'ㄢ' => An,
            'ㄣ' => En,
            'ㄤ' => Ang,
            'ㄥ' => Eng,
            'ㄦ' => Er,
            'ˊ' => Tone2,
            'ˇ' => Tone3,
            'ˋ' => Tone4,
            '˙' => Tone5,
            'ˉ' => Tone1,
            _ => return None,
        })
    }

    fn initial_index(self) -> Option<u16> {
        INITIALS.iter().position(|b| *b == self).map(|i| i as u16 + 1)
    }

    fn medial_index(self) -> Option<u16> {
        MEDIALS.iter().position(|b| *b == self).map(|i| i as u16 + 1)
    }

    fn final_index(self) -> Option<u16> {
        FINALS.iter().position(|b| *b == self).map(|i| i as u16 + 1)
    }

    fn tone_index(self) -> Option<u16> {
        use Bopomofo::*;
        match self {
            Tone1 => Some(0),
            Tone2 => Some(1),
            Tone3 => Some(2),
            Tone4 => Some(3),
            Tone5 => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for Bopomofo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_char() {
            Some(ch) => write!(f, "{}", ch),
            None => Ok(()),
        }
    }
}

// Base-79 digits starting at '0' keep the two-character encoding printable
// and free of the '-' join separator.
const ORDER_BASE: u16 = 79;
const ORDER_ORIGIN: u8 = b'0';

/// One syllable: at most one component of each kind, in canonical order
/// (initial, medial, final, tone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Syllable {
    initial: Option<Bopomofo>,
    medial: Option<Bopomofo>,
    rime: Option<Bopomofo>,
    tone: Option<Bopomofo>,
}

impl Syllable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.initial.is_none() && self.medial.is_none() && self.rime.is_none() && self.tone.is_none()
    }

    pub fn initial(&self) -> Option<Bopomofo> {
        self.initial
    }

    pub fn medial(&self) -> Option<Bopomofo> {
        self.medial
    }

    pub fn rime(&self) -> Option<Bopomofo> {
        self.rime
    }

    pub fn tone(&self) -> Option<Bopomofo> {
        self.tone
    }

    pub fn has_tone(&self) -> bool {
        self.tone.is_some()
    }

    /// True if the syllable consists of nothing but a tone mark.
    pub fn has_tone_only(&self) -> bool {
        self.tone.is_some() && self.initial.is_none() && self.medial.is_none() && self.rime.is_none()
    }

    /// True if a component of this kind is already present.
    pub fn has_kind(&self, kind: Kind) -> bool {
        match kind {
            Kind::Initial => self.initial.is_some(),
            Kind::Medial => self.medial.is_some(),
            Kind::Final => self.rime.is_some(),
            Kind::Tone => self.tone.is_some(),
        }
    }

    /// Place a component, replacing any existing component of its kind.
    pub fn insert(&mut self, component: Bopomofo) {
        match component.kind() {
            Kind::Initial => self.initial = Some(component),
            Kind::Medial => self.medial = Some(component),
            Kind::Final => self.rime = Some(component),
            Kind::Tone => self.tone = Some(component),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn clear_tone(&mut self) {
        self.tone = None;
    }

    /// Remove the last component in display order. Returns false when the
    /// syllable is already empty.
    pub fn remove_last(&mut self) -> bool {
        if self.tone.is_some() {
            self.tone = None;
        } else if self.rime.is_some() {
            self.rime = None;
        } else if self.medial.is_some() {
            self.medial = None;
        } else if self.initial.is_some() {
            self.initial = None;
        } else {
            return false;
        }
        true
    }

    /// Parse a displayed syllable ("ㄋㄧˇ") back into components.
    pub fn parse(s: &str) -> Result<Self, String> {
        let mut syllable = Self::new();
        for ch in s.chars() {
            let component =
                Bopomofo::from_char(ch).ok_or_else(|| format!("not a bopomofo symbol: {:?}", ch))?;
            if syllable.has_kind(component.kind()) {
                return Err(format!("duplicate {:?} component in {:?}", component.kind(), s));
            }
            syllable.insert(component);
        }
        Ok(syllable)
    }

    /// Pack the component indices into a single ordinal. Unset components
    /// (and the first tone) contribute zero.
    pub fn absolute_order(&self) -> u16 {
        let ini = self.initial.and_then(Bopomofo::initial_index).unwrap_or(0);
        let med = self.medial.and_then(Bopomofo::medial_index).unwrap_or(0);
        let fin = self.rime.and_then(Bopomofo::final_index).unwrap_or(0);
        let tone = self.tone.and_then(Bopomofo::tone_index).unwrap_or(0);
        ini + 22 * (med + 4 * (fin + 14 * tone))
    }

    /// Two printable ASCII characters encoding `absolute_order`.
    pub fn absolute_order_string(&self) -> String {
        let order = self.absolute_order();
        let lo = (ORDER_ORIGIN + (order % ORDER_BASE) as u8) as char;
        let hi = (ORDER_ORIGIN + (order / ORDER_BASE) as u8) as char;
        let mut out = String::with_capacity(2);
        out.push(lo);
        out.push(hi);
        out
    }
}

impl fmt::Display for Syllable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for component in [self.initial, self.medial, self.rime, self.tone].into_iter().flatten() {
            if let Some(ch) = component.to_char() {
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}

// Private-use stand-in for the protected "_-" sequence while splitting.
const SEPARATOR_GUARD: char = '\u{F8FF}';

/// Encode a user-level reading key into the compiled dictionary's key space.
///
/// The key is split on `-`; segments beginning with `_` pass through
/// verbatim, everything else is parsed as a displayed syllable and replaced
/// by its absolute-order string. The literal sequence `_-` never acts as a
/// separator. Unparsable segments pass through unchanged.
pub fn maybe_absolute_order_key(key: &str) -> String {
    let guarded = key.replace("_-", &SEPARATOR_GUARD.to_string());
    let segments: Vec<String> = guarded
        .split('-')
        .map(|segment| {
            let segment = segment.replace(SEPARATOR_GUARD, "_-");
            if segment.starts_with('_') {
                return segment;
            }
            match Syllable::parse(&segment) {
                Ok(syllable) => syllable.absolute_order_string(),
                Err(_) => segment,
            }
        })
        .collect();
    segments.join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllable_display_canonical_order() {
        let mut s = Syllable::new();
        s.insert(Bopomofo::Tone3);
        s.insert(Bopomofo::I);
        s.insert(Bopomofo::N);
        assert_eq!(s.to_string(), "ㄋㄧˇ");
    }

    #[test]
    fn test_parse_roundtrip() {
        for text in ["ㄋㄧˇ", "ㄏㄠˇ", "ㄓㄨㄥ", "ㄍㄨㄛˊ", "ㄦˋ", "˙"] {
            let s = Syllable::parse(text).expect("parse");
            assert_eq!(s.to_string(), text);
        }
        assert!(Syllable::parse("x").is_err());
        assert!(Syllable::parse("ㄅㄆ").is_err());
    }

    #[test]
    fn test_tone_predicates() {
        let mut s = Syllable::parse("ˇ").expect("parse");
        assert!(s.has_tone_only());
        s.insert(Bopomofo::N);
        assert!(s.has_tone());
        assert!(!s.has_tone_only());
    }

    #[test]
    fn test_remove_last_walks_backwards() {
        let mut s = Syllable::parse("ㄋㄧˇ").expect("parse");
        assert!(s.remove_last());
        assert_eq!(s.to_string(), "ㄋㄧ");
        assert!(s.remove_last());
        assert_eq!(s.to_string(), "ㄋ");
        assert!(s.remove_last());
        assert!(s.is_empty());
        assert!(!s.remove_last());
    }

    #[test]
    fn test_absolute_order_distinct_and_printable() {
        let texts = ["ㄋㄧˇ", "ㄋㄧˊ", "ㄋㄧ", "ㄏㄠˇ", "ㄓㄨㄥ", "ㄨㄛˇ", "ㄦˋ"];
        let mut seen = std::collections::HashSet::new();
        for text in texts {
            let s = Syllable::parse(text).expect("parse");
            let encoded = s.absolute_order_string();
            assert_eq!(encoded.len(), 2);
            assert!(encoded.chars().all(|c| c.is_ascii_graphic() && c != '-'));
            assert!(seen.insert(encoded), "collision on {}", text);
        }
    }

    #[test]
    fn test_absolute_order_key_transform() {
        let encoded = maybe_absolute_order_key("ㄋㄧˇ-ㄏㄠˇ");
        assert_eq!(encoded.len(), 5);
        assert_eq!(encoded.chars().nth(2), Some('-'));
        assert_ne!(encoded, "ㄋㄧˇ-ㄏㄠˇ");

        // Reserved keys pass through verbatim, including a protected "_-".
        assert_eq!(
            maybe_absolute_order_key("_punctuation_Hsu_-"),
            "_punctuation_Hsu_-"
        );
        assert_eq!(
            maybe_absolute_order_key("_punctuation_list"),
            "_punctuation_list"
        );
        assert_eq!(
            maybe_absolute_order_key("_punctuation_,-ㄋㄧˇ").starts_with("_punctuation_,-"),
            true
        );
    }
}
