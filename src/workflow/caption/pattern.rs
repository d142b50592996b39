use std::collections::HashMap;

use serde::Serialize;

use super::scores::{count_hashtags, has_emoji};
use crate::db::prelude::{GeneratedCaption, PlatformId, PointEntry, Review};
use crate::util::char_len;

const FAVOURITE_KEYWORDS: usize = 3;
const SHARE_SUFFIX: &str = "_share";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionStyle {
    Concise,
    Balanced,
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
}

/// Classifies past captions by average length in chars.
pub fn analyze_caption_style<S: AsRef<str>>(captions: &[S]) -> CaptionStyle {
    if captions.is_empty() {
        return CaptionStyle::Balanced;
    }

    let total: usize = captions.iter().map(|c| char_len(c.as_ref())).sum();
    let avg = total / captions.len();

    match avg {
        a if a < 100 => CaptionStyle::Concise,
        a if a > 300 => CaptionStyle::Detailed,
        _ => CaptionStyle::Balanced,
    }
}

/// Share of ledger rows that came from platform shares.
fn engagement_level(points: &[PointEntry]) -> EngagementLevel {
    if points.is_empty() {
        return EngagementLevel::Low;
    }

    let shares = points
        .iter()
        .filter(|p| p.source.ends_with(SHARE_SUFFIX))
        .count();
    let ratio = shares as f64 / points.len() as f64;

    if ratio >= 0.5 {
        EngagementLevel::High
    } else if ratio >= 0.2 {
        EngagementLevel::Medium
    } else {
        EngagementLevel::Low
    }
}

/// Most frequent entries, ties broken alphabetically.
fn ranked<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        *counts.entry(item).or_default() += 1;
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ranked.into_iter().map(|(k, _)| k.to_string()).collect()
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }

    values.sum::<f64>() / n as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPattern {
    pub style: CaptionStyle,
    pub engagement: EngagementLevel,
    pub avg_caption_length: f64,
    pub avg_hashtags: f64,
    pub uses_emoji: bool,
    pub favourite_platform: Option<PlatformId>,
    pub favourite_keywords: Vec<String>,
    pub avg_rating: Option<f64>,
}

impl Default for UserPattern {
    fn default() -> Self {
        Self::from_history(&[], &[], &[])
    }
}

impl UserPattern {
    pub fn from_history(
        captions: &[GeneratedCaption],
        points: &[PointEntry],
        reviews: &[Review],
    ) -> Self {
        let texts: Vec<&str> = captions.iter().map(|c| c.caption.as_str()).collect();
        let with_emoji = texts.iter().filter(|t| has_emoji(t)).count();

        let favourite_platform = ranked(
            points
                .iter()
                .filter_map(|p| p.source.strip_suffix(SHARE_SUFFIX)),
        )
        .into_iter()
        .next()
        .map(PlatformId::from);

        let mut favourite_keywords =
            ranked(reviews.iter().flat_map(|r| r.keywords.iter().map(String::as_str)));
        favourite_keywords.truncate(FAVOURITE_KEYWORDS);

        let avg_rating = (!reviews.is_empty())
            .then(|| mean(reviews.iter().map(|r| f64::from(r.rating.value()))));

        Self {
            style: analyze_caption_style(&texts),
            engagement: engagement_level(points),
            avg_caption_length: mean(texts.iter().map(|t| char_len(t) as f64)),
            avg_hashtags: mean(texts.iter().map(|t| count_hashtags(t) as f64)),
            uses_emoji: !texts.is_empty() && with_emoji * 2 >= texts.len(),
            favourite_platform,
            favourite_keywords,
            avg_rating,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::prelude::*;
    use chrono::Utc;

    fn caption(text: &str) -> GeneratedCaption {
        GeneratedCaption {
            id: crate::db::models::caption::CaptionId::new_v4(),
            user_id: None,
            review_id: None,
            platform_id: PlatformId::from("instagram"),
            caption: text.to_string(),
            created_at: Utc::now(),
        }
    }

    fn points(source: &str) -> PointEntry {
        PointEntry {
            id: crate::db::models::points::PointEntryId::new_v4(),
            user_id: UserId::new_v4(),
            points: 10,
            source: source.to_string(),
            description: String::new(),
            idempotency_key: None,
            created_at: Utc::now(),
        }
    }

    fn review(rating: i16, keywords: &[&str]) -> Review {
        Review {
            id: ReviewId::new_v4(),
            branch_id: BranchId::new_v4(),
            user_id: None,
            rating: Rating::try_from(rating).unwrap(),
            keyword_ids: Vec::new(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            media_urls: Vec::new(),
            draft_content: None,
            final_content: String::new(),
            status: ReviewStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_caption_style_thresholds() {
        let empty: [&str; 0] = [];
        assert_eq!(analyze_caption_style(&empty), CaptionStyle::Balanced);
        assert_eq!(analyze_caption_style(&["짧다"]), CaptionStyle::Concise);

        let mid = "가".repeat(150);
        assert_eq!(analyze_caption_style(&[mid.as_str()]), CaptionStyle::Balanced);

        let long = "가".repeat(301);
        assert_eq!(analyze_caption_style(&[long.as_str()]), CaptionStyle::Detailed);
    }

    #[test]
    fn test_caption_style_averages_five_captions() {
        let history = |lens: [usize; 5]| -> Vec<String> {
            lens.iter().map(|n| "가".repeat(*n)).collect()
        };

        // two long captions do not outweigh a short average
        let short = history([40, 60, 80, 120, 150]);
        assert_eq!(analyze_caption_style(&short), CaptionStyle::Concise);

        let long = history([250, 280, 320, 350, 400]);
        assert_eq!(analyze_caption_style(&long), CaptionStyle::Detailed);

        let edge = history([100, 100, 100, 100, 100]);
        assert_eq!(analyze_caption_style(&edge), CaptionStyle::Balanced);
    }

    #[test]
    fn test_empty_history_defaults() {
        let pattern = UserPattern::default();
        assert_eq!(pattern.style, CaptionStyle::Balanced);
        assert_eq!(pattern.engagement, EngagementLevel::Low);
        assert_eq!(pattern.avg_caption_length, 0.0);
        assert!(!pattern.uses_emoji);
        assert_eq!(pattern.favourite_platform, None);
        assert_eq!(pattern.avg_rating, None);
    }

    #[test]
    fn test_pattern_from_history() {
        let captions = [caption("좋아요 😀 #a #b"), caption("최고 😀")];
        let ledger = [
            points("instagram_share"),
            points("instagram_share"),
            points("naver_share"),
            points("review_submit"),
        ];
        let reviews = [
            review(5, &["맛있어요", "친절해요"]),
            review(4, &["맛있어요", "깨끗해요"]),
            review(3, &["맛있어요", "친절해요", "조용해요"]),
        ];

        let pattern = UserPattern::from_history(&captions, &ledger, &reviews);

        assert_eq!(pattern.style, CaptionStyle::Concise);
        assert_eq!(pattern.engagement, EngagementLevel::High);
        assert_eq!(pattern.avg_hashtags, 1.0);
        assert!(pattern.uses_emoji);
        assert_eq!(pattern.favourite_platform, Some(PlatformId::from("instagram")));
        assert_eq!(
            pattern.favourite_keywords,
            vec!["맛있어요", "친절해요", "깨끗해요"]
        );
        assert_eq!(pattern.avg_rating, Some(4.0));
    }

    #[test]
    fn test_engagement_levels() {
        let medium = [points("kakao_share"), points("review_submit"), points("review_submit")];
        assert_eq!(engagement_level(&medium), EngagementLevel::Medium);

        let low = [points("review_submit"), points("kakao_copy")];
        assert_eq!(engagement_level(&low), EngagementLevel::Low);
    }
}
