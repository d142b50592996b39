use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::util::char_len;
use crate::workflow::platform::PlatformTemplate;

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[\p{L}\p{N}_]+").expect("hashtag pattern compiles"));

const EMOTION_WORDS: [&str; 12] = [
    "최고", "행복", "감동", "사랑", "추천", "맛있", "완벽", "amazing", "love", "best", "happy",
    "delicious",
];

const EMOTION_BONUS_CAP: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptionScores {
    pub engagement: u32,
    pub readability: u32,
    pub platform_optimization: u32,
}

impl CaptionScores {
    pub fn compute(text: &str, platform: &PlatformTemplate) -> Self {
        Self {
            engagement: calculate_engagement_score(text, platform),
            readability: calculate_readability_score(text),
            platform_optimization: calculate_platform_optimization(text, platform),
        }
    }
}

pub fn count_hashtags(text: &str) -> usize {
    HASHTAG.find_iter(text).count()
}

fn is_emoji(c: char) -> bool {
    matches!(
        c as u32,
        0x1F300..=0x1F5FF
            | 0x1F600..=0x1F64F
            | 0x1F680..=0x1F6FF
            | 0x1F900..=0x1F9FF
            | 0x1FA70..=0x1FAFF
            | 0x2600..=0x26FF
            | 0x2700..=0x27BF
    )
}

pub fn has_emoji(text: &str) -> bool {
    text.chars().any(is_emoji)
}

fn emotion_words(text: &str) -> u32 {
    let lowered = text.to_lowercase();
    EMOTION_WORDS.iter().filter(|w| lowered.contains(*w)).count() as u32
}

pub fn calculate_engagement_score(text: &str, platform: &PlatformTemplate) -> u32 {
    let mut score = 40;

    if platform.ideal_length.contains(char_len(text)) {
        score += 20;
    }
    if platform.hashtags.contains(count_hashtags(text)) {
        score += 15;
    }
    if text.contains('?') {
        score += 10;
    }
    score += (emotion_words(text) * 5).min(EMOTION_BONUS_CAP);
    if platform.emoji_friendly && has_emoji(text) {
        score += 10;
    }

    score.min(100)
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n' | '。' | '！' | '？')
}

pub fn calculate_readability_score(text: &str) -> u32 {
    let total = char_len(text);
    if text.trim().is_empty() {
        return 0;
    }

    let sentences: Vec<usize> = text
        .split(is_sentence_end)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(char_len)
        .collect();

    let avg = if sentences.is_empty() {
        total
    } else {
        sentences.iter().sum::<usize>() / sentences.len()
    };

    let mut score: i64 = if avg <= 40 {
        100
    } else {
        (100 - (avg as i64 - 40)).max(20)
    };

    if total > 300 && !text.contains('\n') {
        score -= 10;
    }

    score.clamp(0, 100) as u32
}

pub fn calculate_platform_optimization(text: &str, platform: &PlatformTemplate) -> u32 {
    let mut score = 0;
    let len = char_len(text);

    if platform.ideal_length.contains(len) {
        score += 40;
    } else if len <= platform.max_length {
        score += 20;
    }
    if platform.hashtags.contains(count_hashtags(text)) {
        score += 30;
    }
    if has_emoji(text) == platform.emoji_friendly {
        score += 30;
    }

    score
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::prelude::PlatformId;
    use crate::workflow::platform::PlatformRegistry;

    fn platform(id: &str) -> PlatformTemplate {
        PlatformRegistry::builtin()
            .get(&PlatformId::from(id))
            .cloned()
            .unwrap()
    }

    /// Pads `head` with filler so the result is exactly `len` chars.
    fn sized(head: &str, len: usize) -> String {
        let mut out = head.to_string();
        while char_len(&out) < len {
            out.push('a');
        }
        out
    }

    #[test]
    fn test_hashtag_and_emoji_detection() {
        assert_eq!(count_hashtags("#맛집 #cafe_day 그리고 # 공백"), 2);
        assert!(has_emoji("좋아요 😀"));
        assert!(!has_emoji("좋아요 :)"));
    }

    #[test]
    fn test_engagement_sums_bonuses() {
        let head = "#a #b #c #d #e #f #g #h 최고 행복 어때요? ";
        let text = sized(head, 140);
        assert_eq!(char_len(&text), 140);

        // 40 base + 20 length + 15 hashtags + 10 question + 10 emotion
        assert_eq!(calculate_engagement_score(&text, &platform("instagram")), 95);
    }

    #[test]
    fn test_engagement_caps_at_100() {
        let head = "#a #b #c #d #e #f #g #h 최고 행복 감동 사랑 어때요? 😀 ";
        let text = sized(head, 140);
        assert_eq!(calculate_engagement_score(&text, &platform("instagram")), 100);
    }

    #[test]
    fn test_engagement_emoji_only_counts_when_friendly() {
        let naver = platform("naver");
        assert_eq!(calculate_engagement_score("😀", &naver), 40 + 15);
    }

    #[test]
    fn test_readability() {
        assert_eq!(calculate_readability_score(""), 0);
        assert_eq!(calculate_readability_score("짧은 문장. 또 짧은 문장!"), 100);

        let fifty = "가".repeat(50);
        assert_eq!(calculate_readability_score(&fifty), 90);

        let huge = "가".repeat(400);
        // floor 20, then the no-linebreak penalty
        assert_eq!(calculate_readability_score(&huge), 10);
    }

    #[test]
    fn test_platform_optimization() {
        let insta = platform("instagram");
        let text = sized("#a #b #c #d #e 😀 ", 150);
        assert_eq!(calculate_platform_optimization(&text, &insta), 100);

        assert_eq!(calculate_platform_optimization("짧다", &insta), 20);

        let naver = platform("naver");
        assert_eq!(calculate_platform_optimization("짧다", &naver), 20 + 30 + 30);
    }
}
