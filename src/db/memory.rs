//! In-memory [`Store`] for handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::db::PgResult;
use crate::db::prelude::*;

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub agencies: Mutex<Vec<Agency>>,
    pub branches: Mutex<Vec<Branch>>,
    pub keywords: Mutex<Vec<ReviewKeyword>>,
    pub reviews: Mutex<Vec<Review>>,
    pub trackers: Mutex<Vec<PostingTracker>>,
    pub points: Mutex<Vec<PointEntry>>,
    pub captions: Mutex<Vec<GeneratedCaption>>,
    pub platforms: Mutex<Vec<PlatformRow>>,
}

impl MemoryStore {
    pub fn with_branch(name: &str) -> (Self, Branch) {
        let agency = Agency {
            id: AgencyId::new_v4(),
            name: String::from("Test Agency"),
        };
        let branch = Branch {
            id: BranchId::new_v4(),
            agency_id: agency.id,
            name: name.to_string(),
            address: String::from("서울 마포구 양화로 1"),
            industry: Some(String::from("cafe")),
            latitude: Some(37.5563),
            longitude: Some(126.9220),
            created_at: Utc::now(),
        };

        let store = Self::default();
        store.agencies.lock().unwrap().push(agency);
        store.branches.lock().unwrap().push(branch.clone());
        (store, branch)
    }

    pub fn add_keyword(&self, rating: i16, keyword: &str) -> ReviewKeyword {
        let kw = ReviewKeyword {
            id: KeywordId::new_v4(),
            rating: Rating::try_from(rating).unwrap(),
            keyword: keyword.to_string(),
            sort_order: self.keywords.lock().unwrap().len() as i32,
            is_active: true,
        };
        self.keywords.lock().unwrap().push(kw.clone());
        kw
    }
}

fn update_review<F>(store: &MemoryStore, id: &ReviewId, f: F) -> Option<Review>
where
    F: FnOnce(&mut Review),
{
    let mut reviews = store.reviews.lock().unwrap();
    let review = reviews.iter_mut().find(|r| &r.id == id)?;
    f(review);
    review.updated_at = Utc::now();
    Some(review.clone())
}

#[async_trait]
impl Store for MemoryStore {
    async fn branch_with_agency(&self, id: &BranchId) -> PgResult<Option<BranchWithAgency>> {
        let branch = self.branches.lock().unwrap().iter().find(|b| &b.id == id).cloned();
        Ok(branch.and_then(|branch| {
            let agency = self
                .agencies
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == branch.agency_id)
                .cloned()?;
            Some(BranchWithAgency { branch, agency })
        }))
    }

    async fn branch(&self, id: &BranchId) -> PgResult<Option<Branch>> {
        Ok(self.branches.lock().unwrap().iter().find(|b| &b.id == id).cloned())
    }

    async fn branch_exists(&self, id: &BranchId) -> PgResult<bool> {
        Ok(self.branches.lock().unwrap().iter().any(|b| &b.id == id))
    }

    async fn keywords_for_rating(&self, rating: Rating) -> PgResult<Vec<ReviewKeyword>> {
        let mut pool: Vec<_> = self
            .keywords
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.rating == rating && k.is_active)
            .cloned()
            .collect();
        pool.sort_by_key(|k| k.sort_order);
        Ok(pool)
    }

    async fn keywords_by_ids(&self, ids: &[KeywordId]) -> PgResult<Vec<ReviewKeyword>> {
        Ok(self
            .keywords
            .lock()
            .unwrap()
            .iter()
            .filter(|k| ids.contains(&k.id))
            .cloned()
            .collect())
    }

    async fn insert_review(&self, review: &NewReview) -> PgResult<Review> {
        let now = Utc::now();
        let row = Review {
            id: ReviewId::new_v4(),
            branch_id: review.branch_id,
            user_id: review.user_id,
            rating: review.rating,
            keyword_ids: review.keyword_ids.clone(),
            keywords: review.keywords.clone(),
            media_urls: review.media_urls.clone(),
            draft_content: None,
            final_content: String::new(),
            status: ReviewStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.reviews.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn review(&self, id: &ReviewId) -> PgResult<Option<Review>> {
        Ok(self.reviews.lock().unwrap().iter().find(|r| &r.id == id).cloned())
    }

    async fn store_draft(&self, id: &ReviewId, draft: &str) -> PgResult<Option<Review>> {
        Ok(update_review(self, id, |r| {
            r.draft_content = Some(draft.to_string());
            r.final_content = draft.to_string();
        }))
    }

    async fn update_final_content(
        &self,
        id: &ReviewId,
        content: &str,
    ) -> PgResult<Option<Review>> {
        Ok(update_review(self, id, |r| r.final_content = content.to_string()))
    }

    async fn set_review_status(
        &self,
        id: &ReviewId,
        status: ReviewStatus,
    ) -> PgResult<Option<Review>> {
        Ok(update_review(self, id, |r| r.status = status))
    }

    async fn reviews_for_user(
        &self,
        user_id: &UserId,
        limit: Option<i64>,
    ) -> PgResult<Vec<Review>> {
        let mut rows: Vec<_> = self
            .reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id.as_ref() == Some(user_id))
            .cloned()
            .collect();
        rows.reverse();
        rows.truncate(limit.map(|l| l as usize).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn publish(
        &self,
        review_id: &ReviewId,
        final_content: Option<&str>,
        trackers: &[NewTracker],
    ) -> PgResult<(Review, Vec<PostingTracker>)> {
        let review = update_review(self, review_id, |r| {
            if r.status != ReviewStatus::Published {
                r.status = ReviewStatus::Pending;
            }
            if let Some(content) = final_content {
                r.final_content = content.to_string();
            }
        })
        .ok_or(sqlx::Error::RowNotFound)?;

        let inserted: Vec<_> = trackers
            .iter()
            .map(|t| PostingTracker {
                id: TrackerId::new_v4(),
                user_id: t.user_id,
                review_id: t.review_id,
                platform_id: t.platform_id.clone(),
                status: PostingStatus::Pending,
                caption: t.caption.clone(),
                likes: None,
                comments: None,
                shares: None,
                created_at: Utc::now(),
                shared_at: None,
                completed_at: None,
            })
            .collect();

        self.trackers.lock().unwrap().extend(inserted.iter().cloned());
        Ok((review, inserted))
    }

    async fn tracker(&self, id: &TrackerId) -> PgResult<Option<PostingTracker>> {
        Ok(self.trackers.lock().unwrap().iter().find(|t| &t.id == id).cloned())
    }

    async fn transition_tracker(
        &self,
        id: &TrackerId,
        from: PostingStatus,
        to: PostingStatus,
        engagement: Option<Engagement>,
    ) -> PgResult<Option<PostingTracker>> {
        let mut trackers = self.trackers.lock().unwrap();
        let Some(row) = trackers.iter_mut().find(|t| &t.id == id && t.status == from) else {
            return Ok(None);
        };

        let now = Utc::now();
        row.status = to;
        match to {
            PostingStatus::Shared => row.shared_at = Some(now),
            PostingStatus::Posted | PostingStatus::Failed => row.completed_at = Some(now),
            PostingStatus::Pending => {}
        }
        if let Some(e) = engagement {
            row.likes = e.likes.or(row.likes);
            row.comments = e.comments.or(row.comments);
            row.shares = e.shares.or(row.shares);
        }

        Ok(Some(row.clone()))
    }

    async fn trackers_for_review(&self, review_id: &ReviewId) -> PgResult<Vec<PostingTracker>> {
        Ok(self
            .trackers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| &t.review_id == review_id)
            .cloned()
            .collect())
    }

    async fn trackers_for_user(&self, user_id: &UserId) -> PgResult<Vec<PostingTracker>> {
        let mut rows: Vec<_> = self
            .trackers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id.as_ref() == Some(user_id))
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn insert_points(&self, entry: &NewPointEntry) -> PgResult<Option<PointEntry>> {
        let mut points = self.points.lock().unwrap();
        if let Some(key) = &entry.idempotency_key
            && points.iter().any(|p| p.idempotency_key.as_ref() == Some(key))
        {
            return Ok(None);
        }

        let row = PointEntry {
            id: crate::db::models::points::PointEntryId::new_v4(),
            user_id: entry.user_id,
            points: entry.points,
            source: entry.source.clone(),
            description: entry.description.clone(),
            idempotency_key: entry.idempotency_key.clone(),
            created_at: Utc::now(),
        };
        points.push(row.clone());
        Ok(Some(row))
    }

    async fn points_for_user(
        &self,
        user_id: &UserId,
        limit: Option<i64>,
    ) -> PgResult<Vec<PointEntry>> {
        let mut rows: Vec<_> = self
            .points
            .lock()
            .unwrap()
            .iter()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect();
        rows.reverse();
        rows.truncate(limit.map(|l| l as usize).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn insert_caption(&self, caption: &NewCaption) -> PgResult<GeneratedCaption> {
        let row = GeneratedCaption {
            id: crate::db::models::caption::CaptionId::new_v4(),
            user_id: caption.user_id,
            review_id: caption.review_id,
            platform_id: caption.platform_id.clone(),
            caption: caption.caption.clone(),
            created_at: Utc::now(),
        };
        self.captions.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn recent_captions(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> PgResult<Vec<GeneratedCaption>> {
        let mut rows: Vec<_> = self
            .captions
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id.as_ref() == Some(user_id))
            .cloned()
            .collect();
        rows.reverse();
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn platforms(&self) -> PgResult<Vec<PlatformRow>> {
        Ok(self.platforms.lock().unwrap().clone())
    }
}
