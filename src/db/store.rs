//! Persistence seam used by the API layer.
//!
//! [`PgStore`] is the production implementation, composing the table repositories over one
//! shared pool.

use core::fmt;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use crate::db::PgResult;
use crate::db::prelude::*;
use crate::db::repositories::Repository;
use crate::db::repositories::Tx;
use crate::db::repositories::branch::BranchRepository;
use crate::db::repositories::caption::CaptionRepository;
use crate::db::repositories::keyword::KeywordRepository;
use crate::db::repositories::platform::PlatformRepository;
use crate::db::repositories::points::PointsRepository;
use crate::db::repositories::review::ReviewRepository;
use crate::db::repositories::tracker::TrackerRepository;

#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
    async fn branch_with_agency(&self, id: &BranchId) -> PgResult<Option<BranchWithAgency>>;
    async fn branch(&self, id: &BranchId) -> PgResult<Option<Branch>>;
    async fn branch_exists(&self, id: &BranchId) -> PgResult<bool>;

    async fn keywords_for_rating(&self, rating: Rating) -> PgResult<Vec<ReviewKeyword>>;
    async fn keywords_by_ids(&self, ids: &[KeywordId]) -> PgResult<Vec<ReviewKeyword>>;

    async fn insert_review(&self, review: &NewReview) -> PgResult<Review>;
    async fn review(&self, id: &ReviewId) -> PgResult<Option<Review>>;
    async fn store_draft(&self, id: &ReviewId, draft: &str) -> PgResult<Option<Review>>;
    async fn update_final_content(&self, id: &ReviewId, content: &str)
    -> PgResult<Option<Review>>;
    async fn set_review_status(&self, id: &ReviewId, status: ReviewStatus)
    -> PgResult<Option<Review>>;
    async fn reviews_for_user(&self, user_id: &UserId, limit: Option<i64>) -> PgResult<Vec<Review>>;

    /// Atomically creates one pending tracker per entry and moves the review to `pending`,
    /// replacing its final text when `final_content` is given.
    async fn publish(
        &self,
        review_id: &ReviewId,
        final_content: Option<&str>,
        trackers: &[NewTracker],
    ) -> PgResult<(Review, Vec<PostingTracker>)>;
    async fn tracker(&self, id: &TrackerId) -> PgResult<Option<PostingTracker>>;
    async fn transition_tracker(
        &self,
        id: &TrackerId,
        from: PostingStatus,
        to: PostingStatus,
        engagement: Option<Engagement>,
    ) -> PgResult<Option<PostingTracker>>;
    async fn trackers_for_review(&self, review_id: &ReviewId) -> PgResult<Vec<PostingTracker>>;
    async fn trackers_for_user(&self, user_id: &UserId) -> PgResult<Vec<PostingTracker>>;

    async fn insert_points(&self, entry: &NewPointEntry) -> PgResult<Option<PointEntry>>;
    async fn points_for_user(&self, user_id: &UserId, limit: Option<i64>)
    -> PgResult<Vec<PointEntry>>;

    async fn insert_caption(&self, caption: &NewCaption) -> PgResult<GeneratedCaption>;
    async fn recent_captions(&self, user_id: &UserId, limit: i64)
    -> PgResult<Vec<GeneratedCaption>>;

    async fn platforms(&self) -> PgResult<Vec<PlatformRow>>;
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn branches(&self) -> BranchRepository {
        BranchRepository::new(self.pool.clone())
    }

    fn keywords(&self) -> KeywordRepository {
        KeywordRepository::new(self.pool.clone())
    }

    fn reviews(&self) -> ReviewRepository {
        ReviewRepository::new(self.pool.clone())
    }

    fn trackers(&self) -> TrackerRepository {
        TrackerRepository::new(self.pool.clone())
    }

    fn points(&self) -> PointsRepository {
        PointsRepository::new(self.pool.clone())
    }

    fn captions(&self) -> CaptionRepository {
        CaptionRepository::new(self.pool.clone())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn branch_with_agency(&self, id: &BranchId) -> PgResult<Option<BranchWithAgency>> {
        Ok(self.branches().get_with_agency(id).await?)
    }

    async fn branch(&self, id: &BranchId) -> PgResult<Option<Branch>> {
        Ok(self.branches().get_by_id(id).await?)
    }

    async fn branch_exists(&self, id: &BranchId) -> PgResult<bool> {
        Ok(self.branches().exists(id).await?)
    }

    async fn keywords_for_rating(&self, rating: Rating) -> PgResult<Vec<ReviewKeyword>> {
        Ok(self.keywords().for_rating(rating).await?)
    }

    async fn keywords_by_ids(&self, ids: &[KeywordId]) -> PgResult<Vec<ReviewKeyword>> {
        Ok(self.keywords().get_many(ids).await?)
    }

    async fn insert_review(&self, review: &NewReview) -> PgResult<Review> {
        Ok(self.reviews().insert(review).await?)
    }

    async fn review(&self, id: &ReviewId) -> PgResult<Option<Review>> {
        Ok(self.reviews().get_by_id(id).await?)
    }

    async fn store_draft(&self, id: &ReviewId, draft: &str) -> PgResult<Option<Review>> {
        Ok(self.reviews().store_draft(id, draft).await?)
    }

    async fn update_final_content(
        &self,
        id: &ReviewId,
        content: &str,
    ) -> PgResult<Option<Review>> {
        Ok(self.reviews().update_final_content(id, content).await?)
    }

    async fn set_review_status(
        &self,
        id: &ReviewId,
        status: ReviewStatus,
    ) -> PgResult<Option<Review>> {
        Ok(self.reviews().set_status(id, status).await?)
    }

    async fn reviews_for_user(
        &self,
        user_id: &UserId,
        limit: Option<i64>,
    ) -> PgResult<Vec<Review>> {
        Ok(self.reviews().for_user(user_id, limit).await?)
    }

    #[instrument(skip(self, final_content, trackers), fields(count = trackers.len()))]
    async fn publish(
        &self,
        review_id: &ReviewId,
        final_content: Option<&str>,
        trackers: &[NewTracker],
    ) -> PgResult<(Review, Vec<PostingTracker>)> {
        let result = Tx::with_tx(&self.pool, |mut tx| async move {
            let result: sqlx::Result<(Review, Vec<PostingTracker>)> = async {
                let review = tx
                    .update_review_status(review_id, ReviewStatus::Pending, final_content)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;

                let mut inserted = Vec::with_capacity(trackers.len());
                for item in trackers {
                    inserted.push(tx.insert_tracker(item).await?);
                }

                Ok((review, inserted))
            }
            .await;

            (tx, result)
        })
        .await?;

        Ok(result)
    }

    async fn tracker(&self, id: &TrackerId) -> PgResult<Option<PostingTracker>> {
        Ok(self.trackers().get_by_id(id).await?)
    }

    async fn transition_tracker(
        &self,
        id: &TrackerId,
        from: PostingStatus,
        to: PostingStatus,
        engagement: Option<Engagement>,
    ) -> PgResult<Option<PostingTracker>> {
        Ok(self.trackers().transition(id, from, to, engagement).await?)
    }

    async fn trackers_for_review(&self, review_id: &ReviewId) -> PgResult<Vec<PostingTracker>> {
        Ok(self.trackers().for_review(review_id).await?)
    }

    async fn trackers_for_user(&self, user_id: &UserId) -> PgResult<Vec<PostingTracker>> {
        Ok(self.trackers().for_user(user_id).await?)
    }

    async fn insert_points(&self, entry: &NewPointEntry) -> PgResult<Option<PointEntry>> {
        Ok(self.points().insert(entry).await?)
    }

    async fn points_for_user(
        &self,
        user_id: &UserId,
        limit: Option<i64>,
    ) -> PgResult<Vec<PointEntry>> {
        Ok(self.points().for_user(user_id, limit).await?)
    }

    async fn insert_caption(&self, caption: &NewCaption) -> PgResult<GeneratedCaption> {
        Ok(self.captions().insert(caption).await?)
    }

    async fn recent_captions(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> PgResult<Vec<GeneratedCaption>> {
        Ok(self.captions().recent_for_user(user_id, limit).await?)
    }

    async fn platforms(&self) -> PgResult<Vec<PlatformRow>> {
        Ok(PlatformRepository::new(self.pool.clone()).all().await?)
    }
}
