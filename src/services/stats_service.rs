//! Statistics aggregator.
//!
//! Derives the dashboard counts entirely from current artifact state. The
//! "on loan" bucket is not stored anywhere; it is inferred from the other
//! two inventory fields: physically existing, not under restoration, yet
//! nothing displayable.

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::artifact::{Artifact, PreservationStatus, ValueLevel};

/// How many recent acquisitions the dashboard shows.
const RECENT_LIMIT: i64 = 5;

/// Per-level record count. Ordered by rarity rank when queried (the enum is
/// declared in rank order).
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct ValueLevelCount {
    pub value_level: Option<ValueLevel>,
    pub count: i64,
}

/// Display-friendly projection of a recently catalogued artifact.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecentArtifact {
    pub artifact_code: String,
    pub name: String,
    pub era: Option<String>,
    pub category: Option<String>,
    pub value_level: Option<ValueLevel>,
    pub preservation_status: PreservationStatus,
    pub total_amount: i32,
    pub available_amount: i32,
    /// Formatted "available/total 件" string for direct rendering.
    pub inventory_status: String,
}

impl From<&Artifact> for RecentArtifact {
    fn from(artifact: &Artifact) -> Self {
        Self {
            artifact_code: artifact.artifact_code.clone(),
            name: artifact.name.clone(),
            era: artifact.era.clone(),
            category: artifact.category.clone(),
            value_level: artifact.value_level,
            preservation_status: artifact.preservation_status,
            total_amount: artifact.total_amount,
            available_amount: artifact.available_amount,
            inventory_status: format!(
                "{}/{} 件",
                artifact.available_amount, artifact.total_amount
            ),
        }
    }
}

/// Dashboard statistics payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Count of all artifact records (records, not pieces).
    pub total: i64,
    /// Records with at least one displayable piece.
    pub available: i64,
    #[serde(rename = "onLoan")]
    pub on_loan: i64,
    #[serde(rename = "underRestoration")]
    pub under_restoration: i64,
    /// Count of distinct non-null categories.
    pub categories: i64,
    #[serde(rename = "valueLevels")]
    pub value_levels: Vec<ValueLevelCount>,
    #[serde(rename = "recentArtifacts")]
    pub recent_artifacts: Vec<RecentArtifact>,
}

/// Statistics service
pub struct StatsService {
    db: PgPool,
}

impl StatsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Compute the dashboard aggregates.
    ///
    /// The three classification buckets partition the records with
    /// `total_amount > 0`; a record with a zero total falls in none of them
    /// (such records cannot be produced through the rule engine, but the
    /// aggregator does not assume that).
    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artifacts")
            .fetch_one(&self.db)
            .await?;

        let available: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM artifacts WHERE available_amount > 0")
                .fetch_one(&self.db)
                .await?;

        let under_restoration: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM artifacts WHERE preservation_status = $1")
                .bind(PreservationStatus::UnderRestoration)
                .fetch_one(&self.db)
                .await?;

        let on_loan: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM artifacts \
             WHERE preservation_status <> $1 AND available_amount = 0 AND total_amount > 0",
        )
        .bind(PreservationStatus::UnderRestoration)
        .fetch_one(&self.db)
        .await?;

        let categories: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT category) FROM artifacts WHERE category IS NOT NULL",
        )
        .fetch_one(&self.db)
        .await?;

        // Enum order is rarity order, so a plain sort yields 一级 first.
        let value_levels = sqlx::query_as::<_, ValueLevelCount>(
            "SELECT value_level, COUNT(*) AS count FROM artifacts \
             GROUP BY value_level ORDER BY value_level",
        )
        .fetch_all(&self.db)
        .await?;

        let recent = sqlx::query_as::<_, Artifact>(
            "SELECT * FROM artifacts ORDER BY created_at DESC, id LIMIT $1",
        )
        .bind(RECENT_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(DashboardStats {
            total,
            available,
            on_loan,
            under_restoration,
            categories,
            value_levels,
            recent_artifacts: recent.iter().map(RecentArtifact::from).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_artifact(available: i32, total: i32) -> Artifact {
        Artifact {
            id: Uuid::new_v4(),
            artifact_code: "MW001".to_string(),
            name: "青铜鼎".to_string(),
            era: Some("商代".to_string()),
            category: Some("青铜器".to_string()),
            material: None,
            size_spec: None,
            weight: None,
            discovery_place: None,
            discovery_date: None,
            source: None,
            value_level: Some(ValueLevel::GradeOne),
            preservation_status: PreservationStatus::Intact,
            location: None,
            description: None,
            image_url: None,
            total_amount: total,
            available_amount: available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_inventory_status_formatting() {
        let recent = RecentArtifact::from(&sample_artifact(3, 5));
        assert_eq!(recent.inventory_status, "3/5 件");
    }

    #[test]
    fn test_dashboard_stats_serialization_uses_camel_case_keys() {
        let stats = DashboardStats {
            total: 2,
            available: 1,
            on_loan: 1,
            under_restoration: 0,
            categories: 1,
            value_levels: vec![ValueLevelCount {
                value_level: Some(ValueLevel::GradeOne),
                count: 2,
            }],
            recent_artifacts: vec![RecentArtifact::from(&sample_artifact(0, 2))],
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["onLoan"], 1);
        assert_eq!(json["underRestoration"], 0);
        assert_eq!(json["valueLevels"][0]["value_level"], "一级");
        assert_eq!(json["recentArtifacts"][0]["inventory_status"], "0/2 件");
    }
}
