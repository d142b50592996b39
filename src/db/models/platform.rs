use core::fmt;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(from = "String", into = "String")]
pub struct PlatformId(pub String);

impl PlatformId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlatformId {
    fn from(value: &str) -> Self {
        PlatformId(value.trim().to_lowercase())
    }
}

impl From<String> for PlatformId {
    fn from(value: String) -> Self {
        PlatformId::from(value.as_str())
    }
}

impl From<PlatformId> for String {
    fn from(value: PlatformId) -> Self {
        value.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog row; `template` (when set) replaces the built-in template for this id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlatformRow {
    pub id: PlatformId,
    pub name: String,
    pub default_points: i32,
    pub template: Option<Json<serde_json::Value>>,
}
