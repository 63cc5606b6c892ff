//! Artifact model and catalog enums.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Ordinal rarity/importance classification. Variants are declared in
/// descending rank so the Postgres enum (and plain sorts) order by rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "value_level")]
pub enum ValueLevel {
    #[sqlx(rename = "一级")]
    #[serde(rename = "一级")]
    GradeOne,
    #[sqlx(rename = "二级")]
    #[serde(rename = "二级")]
    GradeTwo,
    #[sqlx(rename = "三级")]
    #[serde(rename = "三级")]
    GradeThree,
    #[sqlx(rename = "一般")]
    #[serde(rename = "一般")]
    General,
}

impl ValueLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueLevel::GradeOne => "一级",
            ValueLevel::GradeTwo => "二级",
            ValueLevel::GradeThree => "三级",
            ValueLevel::General => "一般",
        }
    }
}

impl fmt::Display for ValueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "一级" => Ok(ValueLevel::GradeOne),
            "二级" => Ok(ValueLevel::GradeTwo),
            "三级" => Ok(ValueLevel::GradeThree),
            "一般" => Ok(ValueLevel::General),
            other => Err(format!("unknown value level: {}", other)),
        }
    }
}

/// Preservation/condition state. `修复中` (under restoration) is the only
/// state with a side effect: it forces `available_amount` to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "preservation_status")]
pub enum PreservationStatus {
    #[sqlx(rename = "完好")]
    #[serde(rename = "完好")]
    Intact,
    #[sqlx(rename = "轻度损坏")]
    #[serde(rename = "轻度损坏")]
    MinorDamage,
    #[sqlx(rename = "中度损坏")]
    #[serde(rename = "中度损坏")]
    ModerateDamage,
    #[sqlx(rename = "严重损坏")]
    #[serde(rename = "严重损坏")]
    SevereDamage,
    #[sqlx(rename = "修复中")]
    #[serde(rename = "修复中")]
    UnderRestoration,
}

impl PreservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreservationStatus::Intact => "完好",
            PreservationStatus::MinorDamage => "轻度损坏",
            PreservationStatus::ModerateDamage => "中度损坏",
            PreservationStatus::SevereDamage => "严重损坏",
            PreservationStatus::UnderRestoration => "修复中",
        }
    }
}

impl fmt::Display for PreservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "完好" => Ok(PreservationStatus::Intact),
            "轻度损坏" => Ok(PreservationStatus::MinorDamage),
            "中度损坏" => Ok(PreservationStatus::ModerateDamage),
            "严重损坏" => Ok(PreservationStatus::SevereDamage),
            "修复中" => Ok(PreservationStatus::UnderRestoration),
            other => Err(format!("unknown preservation status: {}", other)),
        }
    }
}

/// Artifact entity - one catalogued item or item-group.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Artifact {
    pub id: Uuid,
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
    pub preservation_status: PreservationStatus,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Count of physical pieces the record represents.
    pub total_amount: i32,
    /// Count currently displayable/loanable. Never negative, never above total.
    pub available_amount: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
