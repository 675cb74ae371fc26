//! Tool (peralatan) model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::AppResult,
    validation::{RequiredFields, CODE_PATTERN},
};

/// Equipment condition, stored and transmitted as B / RR / RB
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum ToolCondition {
    /// Baik
    #[serde(rename = "B")]
    Good,
    /// Rusak ringan
    #[serde(rename = "RR")]
    LightlyDamaged,
    /// Rusak berat
    #[serde(rename = "RB")]
    HeavilyDamaged,
}

impl ToolCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCondition::Good => "B",
            ToolCondition::LightlyDamaged => "RR",
            ToolCondition::HeavilyDamaged => "RB",
        }
    }

    /// Label printed on reports
    pub fn label(&self) -> &'static str {
        match self {
            ToolCondition::Good => "Baik",
            ToolCondition::LightlyDamaged => "Rusak Ringan",
            ToolCondition::HeavilyDamaged => "Rusak Berat",
        }
    }
}

impl std::fmt::Display for ToolCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ToolCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "B" => Ok(ToolCondition::Good),
            "RR" => Ok(ToolCondition::LightlyDamaged),
            "RB" => Ok(ToolCondition::HeavilyDamaged),
            _ => Err(format!("Invalid condition: {} (expected B, RR or RB)", s)),
        }
    }
}

impl sqlx::Type<Postgres> for ToolCondition {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for ToolCondition {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for ToolCondition {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Tool record as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub tool_code: String,
    pub name: String,
    pub brand: String,
    /// Maximum usable hours over the tool's lifetime
    pub max_hour_usage: i32,
    pub condition: ToolCondition,
    /// Relative path of the stored image, served under /uploads
    pub image: Option<String>,
    pub crea_date: Option<DateTime<Utc>>,
    pub modif_date: Option<DateTime<Utc>>,
}

/// One activity's charge against a tool
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCharge {
    pub activity_code: String,
    pub name: String,
    pub date: NaiveDate,
    pub operator_name: String,
    pub tool_usage: i32,
}

/// A tool together with every activity linked to it.
///
/// Only built by the repository's eager-loading queries, so the usage
/// history is never silently absent.
#[derive(Debug, Clone)]
pub struct ToolUsage {
    pub tool: Tool,
    pub activities: Vec<ActivityCharge>,
}

impl ToolUsage {
    pub(crate) fn new(tool: Tool, activities: Vec<ActivityCharge>) -> Self {
        Self { tool, activities }
    }
}

/// Tool with its derived usage figures, as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolView {
    #[serde(flatten)]
    pub tool: Tool,
    pub used_hours: i64,
    pub remaining_hours: i64,
    pub over_allocated: bool,
    pub activity_count: usize,
}

/// Tool detail including its activity history
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolDetail {
    #[serde(flatten)]
    pub summary: ToolView,
    pub activities: Vec<ActivityCharge>,
}

/// Create tool request (multipart text fields)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTool {
    #[validate(
        regex(path = *CODE_PATTERN, message = "Invalid tool code"),
        length(max = 64, message = "Tool code is too long")
    )]
    pub tool_code: Option<String>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub brand: Option<String>,
    #[validate(range(min = 0, message = "Maximum hours cannot be negative"))]
    pub max_hour_usage: Option<i32>,
    pub condition: Option<ToolCondition>,
}

impl CreateTool {
    pub fn require_fields(&self) -> AppResult<()> {
        RequiredFields::new()
            .text("toolCode", self.tool_code.as_deref())
            .text("name", self.name.as_deref())
            .text("brand", self.brand.as_deref())
            .value("maxHourUsage", self.max_hour_usage.as_ref())
            .value("condition", self.condition.as_ref())
            .check()
    }
}

/// Update tool request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTool {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub brand: Option<String>,
    #[validate(range(min = 0, message = "Maximum hours cannot be negative"))]
    pub max_hour_usage: Option<i32>,
    pub condition: Option<ToolCondition>,
}

impl UpdateTool {
    /// Trim text fields so a blank name or brand fails validation
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|v| v.trim().to_string()),
            brand: self.brand.map(|v| v.trim().to_string()),
            ..self
        }
    }
}

/// Tool list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolQuery {
    /// Case-insensitive match on code, name or brand
    pub search: Option<String>,
    pub condition: Option<ToolCondition>,
    /// toolCode, name, brand, maxHourUsage, remainingHours, condition
    pub sort: Option<String>,
    /// asc or desc
    pub order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_wire_format() {
        assert_eq!(serde_json::to_string(&ToolCondition::LightlyDamaged).unwrap(), "\"RR\"");
        let c: ToolCondition = serde_json::from_str("\"RB\"").unwrap();
        assert_eq!(c, ToolCondition::HeavilyDamaged);
        assert!(serde_json::from_str::<ToolCondition>("\"X\"").is_err());
        assert_eq!("rr".parse::<ToolCondition>().unwrap(), ToolCondition::LightlyDamaged);
        assert_eq!(ToolCondition::Good.label(), "Baik");
    }

    #[test]
    fn test_create_without_tool_code_is_missing_fields() {
        let data = CreateTool {
            tool_code: None,
            name: Some("Excavator".into()),
            brand: Some("Komatsu".into()),
            max_hour_usage: Some(2000),
            condition: Some(ToolCondition::Good),
        };
        match data.require_fields() {
            Err(crate::error::AppError::MissingFields(fields)) => assert_eq!(fields, vec!["toolCode"]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_negative_max_hours_rejected() {
        let data = CreateTool {
            tool_code: Some("EXC-01".into()),
            name: Some("Excavator".into()),
            brand: Some("Komatsu".into()),
            max_hour_usage: Some(-5),
            condition: Some(ToolCondition::Good),
        };
        assert!(data.require_fields().is_ok());
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_overlong_tool_code_rejected() {
        let data = CreateTool {
            tool_code: Some("X".repeat(65)),
            name: Some("Excavator".into()),
            brand: Some("Komatsu".into()),
            max_hour_usage: Some(2000),
            condition: Some(ToolCondition::Good),
        };
        assert!(data.require_fields().is_ok());
        assert!(data.validate().is_err());

        let data = CreateTool { tool_code: Some("X".repeat(64)), ..data };
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_update_text_fields_are_trimmed() {
        let data = UpdateTool {
            name: Some("  Excavator PC200 ".into()),
            brand: Some("\tKomatsu".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(data.name.as_deref(), Some("Excavator PC200"));
        assert_eq!(data.brand.as_deref(), Some("Komatsu"));
        assert!(data.validate().is_ok());

        let blank = UpdateTool { name: Some("   ".into()), ..Default::default() }.normalized();
        assert!(blank.validate().is_err());
    }
}
