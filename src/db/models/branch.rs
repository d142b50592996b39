use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::uuid_id;

uuid_id!(AgencyId);
uuid_id!(BranchId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
}

/// Base branch table model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Branch {
    pub id: BranchId,
    pub agency_id: AgencyId,
    pub name: String,
    pub address: String,
    pub industry: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// What a scanned QR code resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchWithAgency {
    #[serde(flatten)]
    pub branch: Branch,
    pub agency: Agency,
}

/// Flat row of `branch JOIN agency`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BranchAgencyRow {
    pub id: BranchId,
    pub agency_id: AgencyId,
    pub name: String,
    pub address: String,
    pub industry: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub agency_name: String,
}

impl From<BranchAgencyRow> for BranchWithAgency {
    fn from(row: BranchAgencyRow) -> Self {
        Self {
            agency: Agency {
                id: row.agency_id,
                name: row.agency_name,
            },
            branch: Branch {
                id: row.id,
                agency_id: row.agency_id,
                name: row.name,
                address: row.address,
                industry: row.industry,
                latitude: row.latitude,
                longitude: row.longitude,
                created_at: row.created_at,
            },
        }
    }
}
