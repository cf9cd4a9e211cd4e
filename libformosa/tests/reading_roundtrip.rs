//! Layout round-trip properties: composing a syllable from keystrokes and
//! re-parsing its displayed form must agree on the absolute-order key.

use libformosa::reading::ReadingBuffer;
use libformosa::{maybe_absolute_order_key, KeyboardLayout, Syllable};

fn roundtrip(layout: KeyboardLayout, keys: &str) {
    let mut reading = ReadingBuffer::new(layout);
    for ch in keys.chars() {
        assert!(reading.combine(ch), "layout {:?} rejected {:?}", layout, ch);
    }
    let composed = reading.composed_string();
    let parsed = Syllable::parse(&composed)
        .unwrap_or_else(|e| panic!("{:?} from {:?}: {}", composed, keys, e));
    assert_eq!(parsed.to_string(), composed);
    let reparsed = Syllable::parse(&parsed.to_string()).expect("reparse");
    assert_eq!(reparsed.absolute_order_string(), parsed.absolute_order_string());
}

#[test]
fn test_standard_layout_roundtrip() {
    for keys in ["su3", "cl3", "5j/", "ek6", "2k4", "xu4", "1j4", "m,4"] {
        roundtrip(KeyboardLayout::Standard, keys);
    }
}

#[test]
fn test_eten_layout_roundtrip() {
    for keys in ["ne3", "hz3", ",x-", "vxo2", "lu4"] {
        roundtrip(KeyboardLayout::Eten, keys);
    }
}

#[test]
fn test_ibm_layout_roundtrip() {
    for keys in ["7a,", "-;,", "rsb", "9sg."] {
        roundtrip(KeyboardLayout::Ibm, keys);
    }
}

#[test]
fn test_hanyu_pinyin_roundtrip() {
    for keys in ["ni3", "hao3", "zhong1", "guo2", "xue2", "yuan2", "er4", "shi4"] {
        roundtrip(KeyboardLayout::HanyuPinyin, keys);
    }
}

#[test]
fn test_distinct_syllables_get_distinct_keys() {
    let mut seen = std::collections::HashSet::new();
    for keys in ["su3", "cl3", "5j/", "ek6", "2k4", "xu4"] {
        let mut reading = ReadingBuffer::new(KeyboardLayout::Standard);
        for ch in keys.chars() {
            reading.combine(ch);
        }
        let syllable = Syllable::parse(&reading.composed_string()).expect("parse");
        assert!(seen.insert(syllable.absolute_order_string()));
    }
}

#[test]
fn test_absolute_order_key_protects_reserved_segments() {
    assert_eq!(
        maybe_absolute_order_key("_punctuation_Hsu_-"),
        "_punctuation_Hsu_-"
    );
    let mixed = maybe_absolute_order_key("ㄋㄧˇ-_letter_a-ㄏㄠˇ");
    let segments: Vec<&str> = mixed.split('-').collect();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[1], "_letter_a");
    assert!(segments[0].len() == 2 && segments[0].is_ascii());
}
