//! Keyboard layouts.
//!
//! Each component layout maps a key to one or more Bopomofo candidates; the
//! reading assembler resolves overloaded keys (Hsu, ETen26) against the
//! partial syllable. Hanyu Pinyin is not a component layout: the assembler
//! accumulates letters and converts whole romanized syllables instead.

use crate::bopomofo::Bopomofo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum KeyboardLayout {
    Standard,
    #[serde(rename = "ETen")]
    Eten,
    Hsu,
    #[serde(rename = "ETen26")]
    Eten26,
    HanyuPinyin,
    #[serde(rename = "IBM")]
    Ibm,
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        Self::Standard
    }
}

impl KeyboardLayout {
    /// Name used in reserved punctuation keys (`_punctuation_<name>_<ch>`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Eten => "ETen",
            Self::Hsu => "Hsu",
            Self::Eten26 => "ETen26",
            Self::HanyuPinyin => "HanyuPinyin",
            Self::Ibm => "IBM",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Standard" => Self::Standard,
            "ETen" => Self::Eten,
            "Hsu" => Self::Hsu,
            "ETen26" => Self::Eten26,
            "HanyuPinyin" => Self::HanyuPinyin,
            "IBM" => Self::Ibm,
            _ => return None,
        })
    }

    /// False for Hanyu Pinyin, which has no per-key component table.
    pub fn is_component_layout(&self) -> bool {
        !matches!(self, Self::HanyuPinyin)
    }

    /// The Bopomofo candidates a key can produce, most specific first.
    /// Empty for keys the layout does not use.
    pub fn key_components(&self, ch: char) -> &'static [Bopomofo] {
        match self {
            Self::Standard => standard_key(ch),
            Self::Eten => eten_key(ch),
            Self::Hsu => hsu_key(ch),
            Self::Eten26 => eten26_key(ch),
            Self::HanyuPinyin => &[],
            Self::Ibm => ibm_key(ch),
        }
    }
}

fn standard_key(ch: char) -> &'static [Bopomofo] {
    use Bopomofo::*;
    match ch {
        '1' => &[B],
        'q' => &[P],
        'a' => &[M],
        'z' => &[F],
        '2' => &[D],
        'w' => &[T],
        's' => &[N],
        'x' => &[L],
        'e' => &[G],
        'd' => &[K],
        'c' => &[H],
        'r' => &[J],
        'f' => &[Q],
        'v' => &[X],
        '5' => &[Zh],
        't' => &[Ch],
        'g' => &[Sh],
        'b' => &[R],
        'y' => &[Z],
        'h' => &[C],
        'n' => &[S],
        'u' => &[I],
        'j' => &[U],
        'm' => &[Yu],
        '8' => &[A],
        'i' => &[O],
        'k' => &[E],
        ',' => &[Eh],
        '9' => &[Ai],
        'o' => &[Ei],
        'l' => &[Ao],
        '.' => &[Ou],
        '0' => &[An],
        'p' => &[En],
        ';' => &[Ang],
        '/' => &[Eng],
        '-' => &[Er],
        '6' => &[Tone2],
        '3' => &[Tone3],
        '4' => &[Tone4],
        '7' => &[Tone5],
        _ => &[],
    }
}

fn eten_key(ch: char) -> &'static [Bopomofo] {
    use Bopomofo::*;
    match ch {
        'b' => &[B],
        'p' => &[P],
        'm' => &[M],
        'f' => &[F],
        'd' => &[D],
        't' => &[T],
        'n' => &[N],
        'l' => &[L],
        'v' => &[G],
        'k' => &[K],
        'h' => &[H],
        'g' => &[J],
        '7' => &[Q],
        'c' => &[X],
        ',' => &[Zh],
        '.' => &[Ch],
        '/' => &[Sh],
        'j' => &[R],
        ';' => &[Z],
        '\'' => &[C],
        's' => &[S],
        'e' => &[I],
        'x' => &[U],
        'u' => &[Yu],
        'a' => &[A],
        'o' => &[O],
        'r' => &[E],
        'w' => &[Eh],
        'i' => &[Ai],
        'q' => &[Ei],
        'z' => &[Ao],
        'y' => &[Ou],
        '8' => &[An],
        '9' => &[En],
        '0' => &[Ang],
        '-' => &[Eng],
        '=' => &[Er],
        '2' => &[Tone2],
        '3' => &[Tone3],
        '4' => &[Tone4],
        '1' => &[Tone5],
        _ => &[],
    }
}

fn ibm_key(ch: char) -> &'static [Bopomofo] {
    use Bopomofo::*;
    match ch {
        '1' => &[B],
        '2' => &[P],
        '3' => &[M],
        '4' => &[F],
        '5' => &[D],
        '6' => &[T],
        '7' => &[N],
        '8' => &[L],
        '9' => &[G],
        '0' => &[K],
        '-' => &[H],
        'q' => &[J],
        'w' => &[Q],
        'e' => &[X],
        'r' => &[Zh],
        't' => &[Ch],
        'y' => &[Sh],
        'u' => &[R],
        'i' => &[Z],
        'o' => &[C],
        'p' => &[S],
        'a' => &[I],
        's' => &[U],
        'd' => &[Yu],
        'f' => &[A],
        'g' => &[O],
        'h' => &[E],
        'j' => &[Eh],
        'k' => &[Ai],
        'l' => &[Ei],
        ';' => &[Ao],
        'z' => &[Ou],
        'x' => &[An],
        'c' => &[En],
        'v' => &[Ang],
        'b' => &[Eng],
        'n' => &[Er],
        'm' => &[Tone2],
        ',' => &[Tone3],
        '.' => &[Tone4],
        '/' => &[Tone5],
        _ => &[],
    }
}

fn hsu_key(ch: char) -> &'static [Bopomofo] {
    use Bopomofo::*;
    match ch {
        'a' => &[A],
        'b' => &[B],
        'c' => &[X, Sh],
        'd' => &[D, Tone2],
        'e' => &[I, Eh],
        'f' => &[F, Tone3],
        'g' => &[G, E],
        'h' => &[H, O],
        'i' => &[Ai],
        'j' => &[J, Zh, Tone4],
        'k' => &[K, Ang],
        'l' => &[L, Eng],
        'm' => &[M, An],
        'n' => &[N, En],
        'o' => &[Ou],
        'p' => &[P],
        'q' => &[C],
        'r' => &[R, Er],
        's' => &[S, Tone5],
        't' => &[T],
        'u' => &[Yu],
        'v' => &[Q, Ch],
        'w' => &[Ei],
        'x' => &[U],
        'y' => &[Ao],
        'z' => &[Z],
        _ => &[],
    }
}

fn eten26_key(ch: char) -> &'static [Bopomofo] {
    use Bopomofo::*;
    match ch {
        'a' => &[A],
        'b' => &[B],
        'c' => &[X, Sh],
        'd' => &[D, Tone2],
        'e' => &[I],
        'f' => &[F, Tone3],
        'g' => &[J, Zh],
        'h' => &[H, Er],
        'i' => &[Ai],
        'j' => &[R, Tone4],
        'k' => &[K, Ang],
        'l' => &[L, Eng],
        'm' => &[M, An],
        'n' => &[N, En],
        'o' => &[O],
        'p' => &[P, Ou],
        'q' => &[Z, Ei],
        'r' => &[E],
        's' => &[S, Tone5],
        't' => &[T],
        'u' => &[Yu],
        'v' => &[G, Q],
        'w' => &[C, Eh],
        'x' => &[U],
        'y' => &[Ch],
        'z' => &[Ao],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bopomofo::Kind;

    fn covers_all_symbols(layout: KeyboardLayout) {
        let mut seen = std::collections::HashSet::new();
        for code in 0x20u8..0x7f {
            for component in layout.key_components(code as char) {
                seen.insert(*component);
            }
        }
        // 37 symbols + tones 2-5.
        let missing: Vec<_> = all_symbols().into_iter().filter(|s| !seen.contains(s)).collect();
        assert!(missing.is_empty(), "{:?} missing {:?}", layout, missing);
    }

    fn all_symbols() -> Vec<Bopomofo> {
        use Bopomofo::*;
        vec![
            B, P, M, F, D, T, N, L, G, K, H, J, Q, X, Zh, Ch, Sh, R, Z, C, S, I, U, Yu, A, O, E,
            Eh, Ai, Ei, Ao, Ou, An, En, Ang, Eng, Er, Tone2, Tone3, Tone4, Tone5,
        ]
    }

    #[test]
    fn test_component_layouts_cover_every_symbol() {
        for layout in [
            KeyboardLayout::Standard,
            KeyboardLayout::Eten,
            KeyboardLayout::Hsu,
            KeyboardLayout::Eten26,
            KeyboardLayout::Ibm,
        ] {
            covers_all_symbols(layout);
        }
    }

    #[test]
    fn test_standard_sample_keys() {
        use Bopomofo::*;
        let layout = KeyboardLayout::Standard;
        assert_eq!(layout.key_components('s'), &[N]);
        assert_eq!(layout.key_components('u'), &[I]);
        assert_eq!(layout.key_components('3'), &[Tone3]);
        assert!(layout.key_components('!').is_empty());
    }

    #[test]
    fn test_overloaded_keys_list_candidates() {
        let layout = KeyboardLayout::Hsu;
        assert_eq!(layout.key_components('j').len(), 3);
        assert_eq!(layout.key_components('j')[0].kind(), Kind::Initial);
    }

    #[test]
    fn test_pinyin_has_no_component_table() {
        let layout = KeyboardLayout::HanyuPinyin;
        assert!(!layout.is_component_layout());
        assert!(layout.key_components('a').is_empty());
    }

    #[test]
    fn test_names_roundtrip() {
        for layout in [
            KeyboardLayout::Standard,
            KeyboardLayout::Eten,
            KeyboardLayout::Hsu,
            KeyboardLayout::Eten26,
            KeyboardLayout::HanyuPinyin,
            KeyboardLayout::Ibm,
        ] {
            assert_eq!(KeyboardLayout::from_name(layout.name()), Some(layout));
        }
        assert_eq!(KeyboardLayout::from_name("Dvorak"), None);
    }
}
