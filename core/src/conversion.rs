//! Traditional↔Simplified character conversion.
//!
//! A character-level converter over a common-use pair table. It covers the
//! high-frequency regularized characters; hosts that need full coverage can
//! install their own converter on the model facade instead.

use once_cell::sync::Lazy;
use std::collections::HashMap;

// (traditional, simplified)
const PAIRS: &[(char, char)] = &[
    ('愛', '爱'),
    ('貝', '贝'),
    ('筆', '笔'),
    ('邊', '边'),
    ('變', '变'),
    ('車', '车'),
    ('長', '长'),
    ('場', '场'),
    ('處', '处'),
    ('從', '从'),
    ('東', '东'),
    ('動', '动'),
    ('對', '对'),
    ('兒', '儿'),
    ('發', '发'),
    ('飛', '飞'),
    ('風', '风'),
    ('個', '个'),
    ('給', '给'),
    ('國', '国'),
    ('過', '过'),
    ('漢', '汉'),
    ('號', '号'),
    ('華', '华'),
    ('話', '话'),
    ('會', '会'),
    ('機', '机'),
    ('幾', '几'),
    ('記', '记'),
    ('見', '见'),
    ('間', '间'),
    ('講', '讲'),
    ('進', '进'),
    ('經', '经'),
    ('舊', '旧'),
    ('開', '开'),
    ('來', '来'),
    ('樂', '乐'),
    ('裡', '里'),
    ('連', '连'),
    ('兩', '两'),
    ('馬', '马'),
    ('媽', '妈'),
    ('嗎', '吗'),
    ('買', '买'),
    ('賣', '卖'),
    ('門', '门'),
    ('們', '们'),
    ('難', '难'),
    ('鳥', '鸟'),
    ('氣', '气'),
    ('錢', '钱'),
    ('親', '亲'),
    ('請', '请'),
    ('讓', '让'),
    ('熱', '热'),
    ('誰', '谁'),
    ('師', '师'),
    ('時', '时'),
    ('實', '实'),
    ('書', '书'),
    ('術', '术'),
    ('雙', '双'),
    ('說', '说'),
    ('歲', '岁'),
    ('聽', '听'),
    ('頭', '头'),
    ('圖', '图'),
    ('萬', '万'),
    ('為', '为'),
    ('問', '问'),
    ('無', '无'),
    ('習', '习'),
    ('現', '现'),
    ('寫', '写'),
    ('興', '兴'),
    ('學', '学'),
    ('訊', '讯'),
    ('業', '业'),
    ('葉', '叶'),
    ('醫', '医'),
    ('藝', '艺'),
    ('億', '亿'),
    ('陰', '阴'),
    ('應', '应'),
    ('語', '语'),
    ('員', '员'),
    ('遠', '远'),
    ('雲', '云'),
    ('運', '运'),
    ('這', '这'),
    ('證', '证'),
    ('隻', '只'),
    ('鐘', '钟'),
    ('種', '种'),
    ('眾', '众'),
    ('專', '专'),
    ('轉', '转'),
    ('準', '准'),
];

static TRAD_TO_SIMP: Lazy<HashMap<char, char>> =
    Lazy::new(|| PAIRS.iter().copied().collect());

static SIMP_TO_TRAD: Lazy<HashMap<char, char>> =
    Lazy::new(|| PAIRS.iter().map(|(t, s)| (*s, *t)).collect());

/// Convert Traditional characters to their Simplified forms. Characters
/// without a mapping pass through unchanged.
pub fn to_simplified(s: &str) -> String {
    s.chars()
        .map(|ch| *TRAD_TO_SIMP.get(&ch).unwrap_or(&ch))
        .collect()
}

/// Convert Simplified characters to their Traditional forms. Characters
/// without a mapping pass through unchanged.
pub fn to_traditional(s: &str) -> String {
    s.chars()
        .map(|ch| *SIMP_TO_TRAD.get(&ch).unwrap_or(&ch))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_common_pairs() {
        assert_eq!(to_simplified("學習漢語"), "学习汉语");
        assert_eq!(to_traditional("学习汉语"), "學習漢語");
    }

    #[test]
    fn test_unmapped_passthrough() {
        assert_eq!(to_simplified("你好 abc"), "你好 abc");
        assert_eq!(to_traditional("你好 abc"), "你好 abc");
    }
}
