//! Rewarded actions and the ledger writes behind them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::constants::{POINTS_CAPTION_COPY, POINTS_REVIEW_SUBMIT, STREAK_BONUS_CAP};
use crate::db::prelude::{NewPointEntry, PgError, PlatformId, PointEntry, Store, UserId};
use crate::workflow::platform::PlatformRegistry;

/// Request-side name of a [`PointAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ReviewSubmit,
    CaptionCopy,
    PlatformShare,
    StreakBonus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointAction {
    ReviewSubmit,
    CaptionCopy { platform: PlatformId },
    PlatformShare { platform: PlatformId },
    StreakBonus { days: u32 },
}

#[derive(Debug, Error)]
pub enum AwardError {
    #[error("unknown platform '{0}'")]
    UnknownPlatform(PlatformId),

    #[error("action '{0:?}' needs {1}")]
    MissingParam(ActionKind, &'static str),

    #[error(transparent)]
    Store(#[from] PgError),
}

impl PointAction {
    pub fn from_parts(
        kind: ActionKind,
        platform: Option<PlatformId>,
        days: Option<u32>,
    ) -> Result<Self, AwardError> {
        let platform = || platform.clone().ok_or(AwardError::MissingParam(kind, "platform_id"));

        Ok(match kind {
            ActionKind::ReviewSubmit => PointAction::ReviewSubmit,
            ActionKind::CaptionCopy => PointAction::CaptionCopy {
                platform: platform()?,
            },
            ActionKind::PlatformShare => PointAction::PlatformShare {
                platform: platform()?,
            },
            ActionKind::StreakBonus => PointAction::StreakBonus {
                days: days.ok_or(AwardError::MissingParam(kind, "days"))?,
            },
        })
    }

    pub fn points(&self, registry: &PlatformRegistry) -> Result<i32, AwardError> {
        match self {
            PointAction::ReviewSubmit => Ok(POINTS_REVIEW_SUBMIT),
            PointAction::CaptionCopy { .. } => Ok(POINTS_CAPTION_COPY),
            PointAction::PlatformShare { platform } => registry
                .reward(platform)
                .ok_or_else(|| AwardError::UnknownPlatform(platform.clone())),
            PointAction::StreakBonus { days } => Ok((*days).min(STREAK_BONUS_CAP) as i32),
        }
    }

    pub fn source(&self) -> String {
        match self {
            PointAction::ReviewSubmit => String::from("review_submit"),
            PointAction::CaptionCopy { platform } => format!("{platform}_copy"),
            PointAction::PlatformShare { platform } => format!("{platform}_share"),
            PointAction::StreakBonus { .. } => String::from("streak_bonus"),
        }
    }

    pub fn description(&self) -> String {
        match self {
            PointAction::ReviewSubmit => String::from("리뷰 작성"),
            PointAction::CaptionCopy { platform } => format!("{platform} 캡션 복사"),
            PointAction::PlatformShare { platform } => format!("{platform} 게시 완료"),
            PointAction::StreakBonus { days } => format!("{days}일 연속 게시 보너스"),
        }
    }
}

/// A ledger write request. `idempotency_key` makes repeated awards for the same event no-ops.
#[derive(Debug, Clone)]
pub struct Award {
    pub user_id: UserId,
    pub action: PointAction,
    pub description: Option<String>,
    pub idempotency_key: Option<String>,
}

impl Award {
    pub fn new(user_id: UserId, action: PointAction) -> Self {
        Self {
            user_id,
            action,
            description: None,
            idempotency_key: None,
        }
    }

    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Inserts the ledger row; `Ok(None)` when the idempotency key was already used.
#[instrument(skip(store, registry), fields(user = %award.user_id, source = award.action.source()))]
pub async fn award(
    store: &dyn Store,
    registry: &PlatformRegistry,
    award: Award,
) -> Result<Option<PointEntry>, AwardError> {
    let entry = NewPointEntry {
        user_id: award.user_id,
        points: award.action.points(registry)?,
        source: award.action.source(),
        description: award
            .description
            .unwrap_or_else(|| award.action.description()),
        idempotency_key: award.idempotency_key,
    };

    let row = store.insert_points(&entry).await?;
    if row.is_none() {
        tracing::info!(key = ?entry.idempotency_key, "duplicate award ignored");
    }

    Ok(row)
}

/// Awards as a side effect of another action: failures are logged and swallowed.
pub async fn award_logged(store: &dyn Store, registry: &PlatformRegistry, award: Award) {
    let source = award.action.source();
    if let Err(e) = self::award(store, registry, award).await {
        tracing::error!(error = ?e, source, "failed to award points");
    }
}
