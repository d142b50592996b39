//! Levels, badges and posting streaks derived from a user's full history.
//!
//! Everything here is recomputed from scratch on each request.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::constants::STREAK_BONUS_CAP;
use crate::db::prelude::{PointEntry, PostingStatus, PostingTracker, Review};

const LEVELS: [(i64, &str); 5] = [
    (0, "새싹 리뷰어"),
    (500, "탐험가"),
    (2000, "단골 리뷰어"),
    (5000, "인플루언서"),
    (10000, "레전드"),
];

const MAX_MULTIPLIER: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    pub level: usize,
    pub name: &'static str,
    pub min_points: i64,
    pub next_threshold: Option<i64>,
    /// Percent of the way to the next level; 100 at the top level.
    pub progress: f64,
}

pub fn level_for(total_points: i64) -> LevelInfo {
    let idx = LEVELS
        .iter()
        .rposition(|(min, _)| total_points >= *min)
        .unwrap_or(0);
    let (min_points, name) = LEVELS[idx];
    let next_threshold = LEVELS.get(idx + 1).map(|(min, _)| *min);

    let progress = match next_threshold {
        Some(next) => {
            let span = (next - min_points) as f64;
            (((total_points - min_points).max(0) as f64 / span) * 100.0).clamp(0.0, 100.0)
        }
        None => 100.0,
    };

    LevelInfo {
        level: idx + 1,
        name,
        min_points,
        next_threshold,
        progress,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreakInfo {
    pub current_streak: u32,
    pub max_streak: u32,
    pub next_bonus: u32,
    pub bonus_multiplier: f64,
}

/// Streaks over calendar days with at least one posting. The current streak only counts when its
/// last day is `today` or the day before.
pub fn calculate_streak_bonus(dates: &[NaiveDate], today: NaiveDate) -> StreakInfo {
    let mut days = dates.to_vec();
    days.sort_unstable();
    days.dedup();

    let mut max_streak = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for day in &days {
        run = match prev {
            Some(p) if *day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        max_streak = max_streak.max(run);
        prev = Some(*day);
    }

    let current_streak = match days.last() {
        Some(last) if today - *last <= Duration::days(1) && *last <= today => run,
        _ => 0,
    };

    StreakInfo {
        current_streak,
        max_streak,
        next_bonus: (current_streak + 1).min(STREAK_BONUS_CAP),
        bonus_multiplier: (1.0 + 0.5 * f64::from(current_streak / 7)).min(MAX_MULTIPLIER),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub earned: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct BadgeInputs {
    reviews: usize,
    posted: usize,
    platforms: usize,
    points: i64,
    max_streak: u32,
}

fn badges(inputs: BadgeInputs) -> Vec<Badge> {
    let badge = |id, name, description, earned| Badge {
        id,
        name,
        description,
        earned,
    };

    vec![
        badge("first_review", "첫 리뷰", "첫 리뷰를 작성했어요", inputs.reviews >= 1),
        badge("review_10", "리뷰 마니아", "리뷰 10개를 작성했어요", inputs.reviews >= 10),
        badge("first_post", "첫 게시", "처음으로 플랫폼에 게시했어요", inputs.posted >= 1),
        badge("multi_platform", "멀티 플랫폼", "3개 이상의 플랫폼에 게시했어요", inputs.platforms >= 3),
        badge("points_1000", "포인트 부자", "1000 포인트를 모았어요", inputs.points >= 1000),
        badge("streak_7", "일주일 연속", "7일 연속으로 게시했어요", inputs.max_streak >= 7),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamificationSummary {
    pub total_points: i64,
    pub level: LevelInfo,
    pub badges: Vec<Badge>,
    pub streak: StreakInfo,
}

impl GamificationSummary {
    pub fn compute(
        points: &[PointEntry],
        reviews: &[Review],
        trackers: &[PostingTracker],
        today: NaiveDate,
    ) -> Self {
        let total_points: i64 = points.iter().map(|p| i64::from(p.points)).sum();

        let posted: Vec<&PostingTracker> = trackers
            .iter()
            .filter(|t| t.status == PostingStatus::Posted)
            .collect();
        let platforms: HashSet<_> = posted.iter().map(|t| &t.platform_id).collect();
        let dates: Vec<NaiveDate> = posted
            .iter()
            .map(|t| t.completed_at.unwrap_or(t.created_at).date_naive())
            .collect();

        let streak = calculate_streak_bonus(&dates, today);

        Self {
            total_points,
            level: level_for(total_points),
            badges: badges(BadgeInputs {
                reviews: reviews.len(),
                posted: posted.len(),
                platforms: platforms.len(),
                points: total_points,
                max_streak: streak.max_streak,
            }),
            streak,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_empty_streak() {
        assert_eq!(
            calculate_streak_bonus(&[], day(10)),
            StreakInfo {
                current_streak: 0,
                max_streak: 0,
                next_bonus: 1,
                bonus_multiplier: 1.0,
            }
        );
    }

    #[test]
    fn test_streak_counts_through_yesterday() {
        let dates = [day(7), day(8), day(9), day(8)];
        let info = calculate_streak_bonus(&dates, day(10));

        assert_eq!(info.current_streak, 3);
        assert_eq!(info.max_streak, 3);
        assert_eq!(info.next_bonus, 4);
    }

    #[test]
    fn test_stale_streak_resets_current_only() {
        let dates = [day(1), day(2), day(3), day(4), day(6)];
        let info = calculate_streak_bonus(&dates, day(9));

        assert_eq!(info.current_streak, 0);
        assert_eq!(info.max_streak, 4);
        assert_eq!(info.bonus_multiplier, 1.0);
    }

    #[test]
    fn test_multiplier_and_bonus_caps() {
        let long: Vec<NaiveDate> = (1..=31).map(day).collect();
        let info = calculate_streak_bonus(&long, day(31));

        assert_eq!(info.current_streak, 31);
        assert_eq!(info.next_bonus, 30);
        assert_eq!(info.bonus_multiplier, 3.0);

        let two_weeks: Vec<NaiveDate> = (1..=14).map(day).collect();
        assert_eq!(calculate_streak_bonus(&two_weeks, day(14)).bonus_multiplier, 2.0);
    }

    #[test]
    fn test_levels() {
        let start = level_for(0);
        assert_eq!((start.level, start.next_threshold), (1, Some(500)));
        assert_eq!(start.progress, 0.0);

        let mid = level_for(1250);
        assert_eq!(mid.level, 2);
        assert_eq!(mid.progress, 50.0);

        let top = level_for(25_000);
        assert_eq!((top.level, top.next_threshold, top.progress), (5, None, 100.0));
    }

    #[test]
    fn test_badge_thresholds() {
        let earned: Vec<&str> = badges(BadgeInputs {
            reviews: 10,
            posted: 1,
            platforms: 2,
            points: 999,
            max_streak: 7,
        })
        .into_iter()
        .filter(|b| b.earned)
        .map(|b| b.id)
        .collect();

        assert_eq!(earned, vec!["first_review", "review_10", "first_post", "streak_7"]);
        assert!(badges(BadgeInputs::default()).iter().all(|b| !b.earned));
    }
}
