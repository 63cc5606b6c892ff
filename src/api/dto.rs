//! Shared Data Transfer Objects (DTOs) for API handlers.
//!
//! Every endpoint responds with the same envelope:
//! `{success: bool, data?: ..., message?: string}` — for errors the envelope
//! is produced by `AppError::into_response`.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::IntoParams;

/// Uniform success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Envelope carrying data only.
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Envelope carrying data and a human-readable message.
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    /// Envelope carrying a message only (e.g. deletions).
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Query parameters for paginated list requests.
///
/// Provides optional page and limit parameters with sensible defaults.
/// Can be used with `#[serde(flatten)]` in handler-specific query structs.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Requested page number, 1-indexed (default: 1)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    /// Requested items per page (default: 10, capped at 100)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<u32>,
}

impl PaginationQuery {
    /// Get the page number, defaulting to 1 if not specified.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the page size, defaulting to 10 and capped at 100.
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

/// Total pages for a match count at the given page size.
pub fn total_pages(total: i64, limit: u32) -> u32 {
    if total == 0 {
        0
    } else {
        ((total as f64) / (limit as f64)).ceil() as u32
    }
}

/// Deserialize an optional query parameter, treating an empty string as
/// "not supplied" rather than as a parse error or an empty match.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let query = PaginationQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 10);
    }

    #[test]
    fn test_pagination_page_zero_is_page_one() {
        let query = PaginationQuery {
            page: Some(0),
            limit: None,
        };
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_pagination_limit_capped() {
        let query = PaginationQuery {
            page: None,
            limit: Some(5000),
        };
        assert_eq!(query.limit(), 100);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn test_envelope_skips_absent_fields() {
        let body = serde_json::to_string(&ApiResponse::data(42)).unwrap();
        assert_eq!(body, r#"{"success":true,"data":42}"#);

        let body = serde_json::to_string(&ApiResponse::message("deleted")).unwrap();
        assert_eq!(body, r#"{"success":true,"message":"deleted"}"#);
    }

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "empty_string_as_none")]
        n: Option<i32>,
    }

    #[test]
    fn test_empty_string_as_none() {
        let probe: Probe = serde_json::from_str(r#"{"n": ""}"#).unwrap();
        assert!(probe.n.is_none());
        let probe: Probe = serde_json::from_str(r#"{"n": "7"}"#).unwrap();
        assert_eq!(probe.n, Some(7));
        let probe: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert!(probe.n.is_none());
        assert!(serde_json::from_str::<Probe>(r#"{"n": "x"}"#).is_err());
    }
}
