//! Artifact list filtering.
//!
//! Translates the optional, independently-combinable filter criteria into
//! SQL predicates. One filter value feeds both the page query and the count
//! query so the reported total always matches the predicate.

use sqlx::{Postgres, QueryBuilder};

use crate::models::artifact::{PreservationStatus, ValueLevel};

/// Optional filter criteria for artifact listing. All present filters are
/// combined with AND. Empty strings are treated as "not supplied" and must
/// be normalized away before constructing this value (see
/// [`ArtifactFilter::new`]).
#[derive(Debug, Clone, Default)]
pub struct ArtifactFilter {
    /// Case-insensitive substring match against name, artifact_code or
    /// description.
    pub search: Option<String>,
    pub category: Option<String>,
    pub era: Option<String>,
    pub value_level: Option<ValueLevel>,
    pub preservation_status: Option<PreservationStatus>,
    /// `available_amount >= n`
    pub available_min: Option<i32>,
    /// `available_amount = n`. May be combined with `available_min`; a
    /// contradictory combination is the caller's responsibility.
    pub available_exact: Option<i32>,
}

impl ArtifactFilter {
    /// Build a filter from raw optional inputs, dropping empty strings.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        search: Option<String>,
        category: Option<String>,
        era: Option<String>,
        value_level: Option<ValueLevel>,
        preservation_status: Option<PreservationStatus>,
        available_min: Option<i32>,
        available_exact: Option<i32>,
    ) -> Self {
        Self {
            search: non_empty(search),
            category: non_empty(category),
            era: non_empty(era),
            value_level,
            preservation_status,
            available_min,
            available_exact,
        }
    }

    /// Append the `AND …` predicates to a query that already ends in a
    /// `WHERE` clause (conventionally `WHERE 1=1`).
    pub fn push_predicates(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR artifact_code ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(category) = &self.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }

        if let Some(era) = &self.era {
            qb.push(" AND era = ").push_bind(era.clone());
        }

        if let Some(level) = self.value_level {
            qb.push(" AND value_level = ").push_bind(level);
        }

        if let Some(status) = self.preservation_status {
            qb.push(" AND preservation_status = ").push_bind(status);
        }

        if let Some(min) = self.available_min {
            qb.push(" AND available_amount >= ").push_bind(min);
        }

        if let Some(exact) = self.available_exact {
            qb.push(" AND available_amount = ").push_bind(exact);
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(filter: &ArtifactFilter) -> String {
        let mut qb = QueryBuilder::new("SELECT * FROM artifacts WHERE 1=1");
        filter.push_predicates(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn test_empty_filter_adds_no_predicates() {
        let sql = sql_for(&ArtifactFilter::default());
        assert_eq!(sql, "SELECT * FROM artifacts WHERE 1=1");
    }

    #[test]
    fn test_search_matches_three_columns() {
        let filter = ArtifactFilter::new(
            Some("青铜".into()),
            None,
            None,
            None,
            None,
            None,
            None,
        );
        let sql = sql_for(&filter);
        assert!(sql.contains("name ILIKE $1"));
        assert!(sql.contains("artifact_code ILIKE $2"));
        assert!(sql.contains("description ILIKE $3"));
    }

    #[test]
    fn test_empty_strings_mean_not_supplied() {
        let filter = ArtifactFilter::new(
            Some("".into()),
            Some("  ".into()),
            Some(String::new()),
            None,
            None,
            None,
            None,
        );
        assert_eq!(sql_for(&filter), "SELECT * FROM artifacts WHERE 1=1");
    }

    #[test]
    fn test_all_filters_combine_with_and() {
        let filter = ArtifactFilter::new(
            Some("鼎".into()),
            Some("青铜器".into()),
            Some("商代".into()),
            Some(ValueLevel::GradeOne),
            Some(PreservationStatus::Intact),
            Some(1),
            Some(3),
        );
        let sql = sql_for(&filter);
        assert!(sql.contains(" AND category = "));
        assert!(sql.contains(" AND era = "));
        assert!(sql.contains(" AND value_level = "));
        assert!(sql.contains(" AND preservation_status = "));
        assert!(sql.contains(" AND available_amount >= "));
        assert!(sql.contains(" AND available_amount = "));
        // Nine bind parameters: three for search plus one per exact filter.
        assert!(sql.contains("$9"));
        assert!(!sql.contains("$10"));
    }

    #[test]
    fn test_min_and_exact_are_distinct_predicates() {
        let min_only = ArtifactFilter {
            available_min: Some(2),
            ..Default::default()
        };
        let exact_only = ArtifactFilter {
            available_exact: Some(2),
            ..Default::default()
        };
        assert!(sql_for(&min_only).contains("available_amount >= $1"));
        assert!(sql_for(&exact_only).contains("available_amount = $1"));
    }
}
