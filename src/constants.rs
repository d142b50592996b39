// COMPLETION PARAMETERS
pub const DRAFT_MAX_TOKENS: u32 = 500;
pub const CAPTION_MAX_TOKENS: u32 = 800;
pub const ANALYSIS_MAX_TOKENS: u32 = 400;

// HISTORY WINDOWS FOR CAPTION PERSONALIZATION
pub const HISTORY_CAPTION_LIMIT: i64 = 10;
pub const HISTORY_POINTS_LIMIT: i64 = 20;
pub const HISTORY_REVIEW_LIMIT: i64 = 10;

// POINT AMOUNTS
pub const POINTS_REVIEW_SUBMIT: i32 = 50;
pub const POINTS_CAPTION_COPY: i32 = 10;

pub const RATING_MIN: i16 = 1;
pub const RATING_MAX: i16 = 5;

/// Message returned for every QR resolution failure, whatever the cause.
pub const INVALID_QR_MESSAGE: &str = "invalid QR code";

/// Capacity of the tracker event channel; slow feed subscribers past this many events lag and
/// are resynced with a fresh snapshot.
pub const TRACKER_FEED_CAPACITY: usize = 256;

/// Ceiling on streak bonus points and on the advertised next bonus.
pub const STREAK_BONUS_CAP: u32 = 30;
