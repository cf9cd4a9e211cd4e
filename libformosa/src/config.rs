//! Bopomofo-specific configuration that extends the base `Config` from core.
//!
//! The base carries the engine options (candidate keys, buffer bound,
//! selection behavior, conversion toggles); this adds the keyboard layout.

use crate::layout::KeyboardLayout;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BopomofoConfig {
    /// Base configuration fields (candidate keys, buffer size, etc.)
    #[serde(flatten)]
    pub base: libformosa_core::Config,

    /// Active keyboard layout.
    pub keyboard_layout: KeyboardLayout,
}

impl BopomofoConfig {
    /// Convert into the base config for use with the core types.
    pub fn into_base(self) -> libformosa_core::Config {
        self.base
    }

    pub fn base(&self) -> &libformosa_core::Config {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut libformosa_core::Config {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_roundtrip_with_flattened_base() {
        let mut config = BopomofoConfig::default();
        config.keyboard_layout = KeyboardLayout::Hsu;
        config.base.traditional_mode = true;
        let s = toml::to_string_pretty(&config).expect("serialize");
        let back: BopomofoConfig = toml::from_str(&s).expect("parse");
        assert_eq!(back.keyboard_layout, KeyboardLayout::Hsu);
        assert!(back.base.traditional_mode);
        assert_eq!(back.base.candidate_keys, "123456789");
    }
}
