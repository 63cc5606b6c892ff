//! Artifact catalog service.
//!
//! CRUD over the artifact table. Every create and update passes through the
//! inventory rule engine; corrections are applied silently and logged. The
//! update path runs its read-modify-write inside a transaction with a row
//! lock so concurrent editors cannot compute from a stale read.

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::artifact::{Artifact, PreservationStatus, ValueLevel};
use crate::services::artifact_filter::ArtifactFilter;
use crate::services::inventory::{self, InventoryPatch, InventoryState};

const ARTIFACT_COLUMNS: &str = "id, artifact_code, name, era, category, material, size_spec, \
     weight, discovery_place, discovery_date, source, value_level, preservation_status, \
     location, description, image_url, total_amount, available_amount, created_at, updated_at";

/// Candidate fields for a new artifact record.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewArtifact {
    pub artifact_code: String,
    pub name: String,
    pub era: Option<String>,
    pub category: Option<String>,
    pub material: Option<String>,
    #[serde(rename = "size")]
    pub size_spec: Option<String>,
    pub weight: Option<String>,
    pub discovery_place: Option<String>,
    pub discovery_date: Option<NaiveDate>,
    pub source: Option<String>,
    pub value_level: Option<ValueLevel>,
    pub preservation_status: Option<PreservationStatus>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub total_amount: Option<i32>,
    pub available_amount: Option<i32>,
}

/// Partial update to an artifact. Absent keys leave the stored value alone.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ArtifactUpdate {
    pub artifact_code: Option<String>,
    pub name: Option<String>,
    pub era: Option<String>,
    pub category: Option<String>,
    pub material: Option<String>,
    #[serde(rename = "size")]
    pub size_spec: Option<String>,
    pub weight: Option<String>,
    pub discovery_place: Option<String>,
    pub discovery_date: Option<NaiveDate>,
    pub source: Option<String>,
    pub value_level: Option<ValueLevel>,
    pub preservation_status: Option<PreservationStatus>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub total_amount: Option<i32>,
    pub available_amount: Option<i32>,
}

impl ArtifactUpdate {
    /// True when the payload carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.artifact_code.is_none()
            && self.name.is_none()
            && self.era.is_none()
            && self.category.is_none()
            && self.material.is_none()
            && self.size_spec.is_none()
            && self.weight.is_none()
            && self.discovery_place.is_none()
            && self.discovery_date.is_none()
            && self.source.is_none()
            && self.value_level.is_none()
            && self.preservation_status.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.image_url.is_none()
            && self.total_amount.is_none()
            && self.available_amount.is_none()
    }
}

/// Artifact service
pub struct ArtifactService {
    db: PgPool,
}

impl ArtifactService {
    /// Create a new artifact service
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an artifact. The artifact code must be unused; inventory
    /// fields are normalized before persisting.
    pub async fn create(&self, req: NewArtifact) -> Result<Artifact> {
        if req.artifact_code.trim().is_empty() || req.name.trim().is_empty() {
            return Err(AppError::Validation(
                "artifact_code and name are required".to_string(),
            ));
        }

        // Checked before normalization so a duplicate never triggers the
        // silent corrections.
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM artifacts WHERE artifact_code = $1")
                .bind(&req.artifact_code)
                .fetch_optional(&self.db)
                .await?;
        if existing.is_some() {
            return Err(AppError::Conflict("Artifact code already exists".to_string()));
        }

        let (inv, adjustments) = inventory::normalize_create(
            req.preservation_status,
            req.total_amount,
            req.available_amount,
        );
        log_adjustments(&req.artifact_code, &adjustments);

        let sql = format!(
            "INSERT INTO artifacts (artifact_code, name, era, category, material, size_spec, \
             weight, discovery_place, discovery_date, source, value_level, preservation_status, \
             location, description, image_url, total_amount, available_amount) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {ARTIFACT_COLUMNS}"
        );
        let artifact = sqlx::query_as::<_, Artifact>(&sql)
            .bind(&req.artifact_code)
            .bind(&req.name)
            .bind(&req.era)
            .bind(&req.category)
            .bind(&req.material)
            .bind(&req.size_spec)
            .bind(&req.weight)
            .bind(&req.discovery_place)
            .bind(req.discovery_date)
            .bind(&req.source)
            .bind(req.value_level)
            .bind(inv.preservation_status)
            .bind(&req.location)
            .bind(&req.description)
            .bind(&req.image_url)
            .bind(inv.total_amount)
            .bind(inv.available_amount)
            .fetch_one(&self.db)
            .await
            .map_err(duplicate_code_error)?;

        info!(artifact_code = %artifact.artifact_code, id = %artifact.id, "artifact created");
        Ok(artifact)
    }

    /// Get artifact by ID
    pub async fn get(&self, id: Uuid) -> Result<Artifact> {
        let sql = format!("SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE id = $1");
        sqlx::query_as::<_, Artifact>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))
    }

    /// Apply a partial update. The current row is locked for the duration of
    /// the read-modify-write so two racing updates serialize instead of both
    /// computing from the same stale state.
    pub async fn update(&self, id: Uuid, req: ArtifactUpdate) -> Result<Artifact> {
        let mut tx = self.db.begin().await?;

        let sql = format!("SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, Artifact>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Artifact not found".to_string()))?;

        // Renaming the code must not collide with a different record.
        if let Some(code) = &req.artifact_code {
            if code != &current.artifact_code {
                let clash: Option<(Uuid,)> =
                    sqlx::query_as("SELECT id FROM artifacts WHERE artifact_code = $1 AND id <> $2")
                        .bind(code)
                        .bind(id)
                        .fetch_optional(&mut *tx)
                        .await?;
                if clash.is_some() {
                    return Err(AppError::Conflict(
                        "Artifact code already exists".to_string(),
                    ));
                }
            }
        }

        let normalized = inventory::normalize_update(
            InventoryState {
                preservation_status: current.preservation_status,
                total_amount: current.total_amount,
                available_amount: current.available_amount,
            },
            InventoryPatch {
                preservation_status: req.preservation_status,
                total_amount: req.total_amount,
                available_amount: req.available_amount,
            },
        );
        log_adjustments(&current.artifact_code, &normalized.adjustments);

        let wrote = !req.is_empty()
            || normalized.write_status
            || normalized.write_total
            || normalized.write_available;
        if !wrote {
            // Nothing to persist; the unchanged record is not an error.
            tx.rollback().await?;
            return Ok(current);
        }

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE artifacts SET ");
        {
            let mut set = qb.separated(", ");

            if let Some(code) = req.artifact_code {
                set.push("artifact_code = ").push_bind_unseparated(code);
            }
            if let Some(name) = req.name {
                set.push("name = ").push_bind_unseparated(name);
            }
            if let Some(era) = req.era {
                set.push("era = ").push_bind_unseparated(era);
            }
            if let Some(category) = req.category {
                set.push("category = ").push_bind_unseparated(category);
            }
            if let Some(material) = req.material {
                set.push("material = ").push_bind_unseparated(material);
            }
            if let Some(size_spec) = req.size_spec {
                set.push("size_spec = ").push_bind_unseparated(size_spec);
            }
            if let Some(weight) = req.weight {
                set.push("weight = ").push_bind_unseparated(weight);
            }
            if let Some(place) = req.discovery_place {
                set.push("discovery_place = ").push_bind_unseparated(place);
            }
            if let Some(date) = req.discovery_date {
                set.push("discovery_date = ").push_bind_unseparated(date);
            }
            if let Some(source) = req.source {
                set.push("source = ").push_bind_unseparated(source);
            }
            if let Some(level) = req.value_level {
                set.push("value_level = ").push_bind_unseparated(level);
            }
            if let Some(location) = req.location {
                set.push("location = ").push_bind_unseparated(location);
            }
            if let Some(description) = req.description {
                set.push("description = ").push_bind_unseparated(description);
            }
            if let Some(image_url) = req.image_url {
                set.push("image_url = ").push_bind_unseparated(image_url);
            }
            if normalized.write_status {
                set.push("preservation_status = ")
                    .push_bind_unseparated(normalized.state.preservation_status);
            }
            if normalized.write_total {
                set.push("total_amount = ")
                    .push_bind_unseparated(normalized.state.total_amount);
            }
            if normalized.write_available {
                set.push("available_amount = ")
                    .push_bind_unseparated(normalized.state.available_amount);
            }
        }

        qb.push(", updated_at = now() WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {ARTIFACT_COLUMNS}"));

        let updated = qb
            .build_query_as::<Artifact>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(duplicate_code_error)?
            .ok_or_else(|| {
                AppError::UpdateFailed(format!("no rows affected updating artifact {}", id))
            })?;

        tx.commit().await?;

        info!(artifact_code = %updated.artifact_code, id = %id, "artifact updated");
        Ok(updated)
    }

    /// Delete an artifact by ID. Hard delete, no referential checks.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM artifacts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Artifact not found".to_string()));
        }

        info!(id = %id, "artifact deleted");
        Ok(())
    }

    /// List artifacts matching the filter, newest first, with the total
    /// match count for the same predicate (ignoring pagination).
    pub async fn list(
        &self,
        filter: &ArtifactFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Artifact>, i64)> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE 1=1"));
        filter.push_predicates(&mut qb);
        qb.push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset);
        let artifacts = qb.build_query_as::<Artifact>().fetch_all(&self.db).await?;

        let mut count_qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM artifacts WHERE 1=1");
        filter.push_predicates(&mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.db)
            .await?;

        Ok((artifacts, total))
    }

    /// Distinct non-null categories, for filter UIs.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT category FROM artifacts WHERE category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    /// Distinct non-null eras, for filter UIs.
    pub async fn eras(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT era FROM artifacts WHERE era IS NOT NULL ORDER BY era",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(|(e,)| e).collect())
    }
}

fn log_adjustments(artifact_code: &str, adjustments: &[inventory::Adjustment]) {
    for adjustment in adjustments {
        info!(
            artifact_code = %artifact_code,
            adjustment = ?adjustment,
            "inventory field silently corrected"
        );
    }
}

/// Map a unique-constraint violation from a racing insert/rename to the
/// same conflict error as the pre-check.
fn duplicate_code_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Artifact code already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_detected() {
        assert!(ArtifactUpdate::default().is_empty());
        let patch = ArtifactUpdate {
            total_amount: Some(3),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_update_deserializes_partial_payload() {
        let patch: ArtifactUpdate =
            serde_json::from_str(r#"{"preservation_status": "修复中"}"#).unwrap();
        assert_eq!(
            patch.preservation_status,
            Some(PreservationStatus::UnderRestoration)
        );
        assert!(patch.total_amount.is_none());
        assert!(patch.artifact_code.is_none());
    }
}
