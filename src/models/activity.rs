//! Activity (kegiatan) model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{formats::CommaSeparator, serde_as, StringWithSeparator};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::AppResult,
    validation::{RequiredFields, CODE_PATTERN},
};

/// Activity record as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub activity_code: String,
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
    /// Free-text operator name
    pub operator_name: String,
    /// Hours charged against every linked tool
    pub tool_usage: i32,
    pub crea_date: Option<DateTime<Utc>>,
    pub modif_date: Option<DateTime<Utc>>,
}

/// Tool summary attached to an activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkedTool {
    pub tool_code: String,
    pub name: String,
    pub brand: String,
}

/// Activity with its linked tools
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWithTools {
    #[serde(flatten)]
    pub activity: Activity,
    pub tools: Vec<LinkedTool>,
}

impl ActivityWithTools {
    pub fn tool_codes(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.tool_code.as_str()).collect()
    }

    pub fn tool_names(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Create activity request.
///
/// `toolCode` is a comma-joined list of tool codes (`"EXC-01,GEN-02"`).
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivity {
    #[validate(
        regex(path = *CODE_PATTERN, message = "Invalid activity code"),
        length(max = 64, message = "Activity code is too long")
    )]
    pub activity_code: Option<String>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    /// YYYY-MM-DD
    pub date: Option<String>,
    #[validate(length(max = 255))]
    pub operator_name: Option<String>,
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    #[schema(value_type = Option<String>, example = "EXC-01,GEN-02")]
    pub tool_code: Option<Vec<String>>,
    #[validate(range(min = 0, message = "Tool usage cannot be negative"))]
    pub tool_usage: Option<i32>,
}

impl CreateActivity {
    pub fn require_fields(&self) -> AppResult<()> {
        RequiredFields::new()
            .text("activityCode", self.activity_code.as_deref())
            .text("name", self.name.as_deref())
            .text("date", self.date.as_deref())
            .text("operatorName", self.operator_name.as_deref())
            .list("toolCode", normalized(&self.tool_code).as_deref())
            .value("toolUsage", self.tool_usage.as_ref())
            .check()
    }

    pub fn tool_codes(&self) -> Vec<String> {
        normalized(&self.tool_code).unwrap_or_default()
    }
}

/// Update activity request; a present `toolCode` replaces the whole link set
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivity {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    /// YYYY-MM-DD
    pub date: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub operator_name: Option<String>,
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, String>>")]
    #[schema(value_type = Option<String>, example = "EXC-01,GEN-02")]
    pub tool_code: Option<Vec<String>>,
    #[validate(range(min = 0, message = "Tool usage cannot be negative"))]
    pub tool_usage: Option<i32>,
}

impl UpdateActivity {
    pub fn tool_codes(&self) -> Option<Vec<String>> {
        normalized(&self.tool_code)
    }
}

/// Activity list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    /// Inclusive lower bound (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Inclusive upper bound (YYYY-MM-DD)
    pub end_date: Option<String>,
    /// Case-insensitive match on code, name, description or operator
    pub search: Option<String>,
    /// Only activities linked to this tool
    pub tool_code: Option<String>,
    /// date, name, operatorName, activityCode, toolUsage
    pub sort: Option<String>,
    /// asc or desc
    pub order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Trim, drop blanks and de-duplicate while keeping first-seen order
fn normalized(codes: &Option<Vec<String>>) -> Option<Vec<String>> {
    codes.as_ref().map(|codes| {
        let mut out: Vec<String> = Vec::with_capacity(codes.len());
        for code in codes.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
            if !out.iter().any(|c| c == code) {
                out.push(code.to_string());
            }
        }
        out
    })
}

/// Link changes needed to move an activity from `current` to `desired` tools
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LinkChanges {
    pub remove: Vec<String>,
    pub add: Vec<String>,
}

impl LinkChanges {
    pub fn between(current: &[String], desired: &[String]) -> Self {
        Self {
            remove: current
                .iter()
                .filter(|c| !desired.contains(c))
                .cloned()
                .collect(),
            add: desired
                .iter()
                .filter(|d| !current.contains(d))
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_comma_joined_tool_codes() {
        let data: CreateActivity = serde_json::from_str(
            r#"{"activityCode":"KEG-1","name":"Latihan","date":"2024-05-01",
                "operatorName":"Serda Budi","toolCode":"EXC-01, GEN-02,,EXC-01","toolUsage":12}"#,
        )
        .unwrap();
        assert_eq!(data.tool_codes(), codes(&["EXC-01", "GEN-02"]));
        assert!(data.require_fields().is_ok());
    }

    #[test]
    fn test_overlong_activity_code_rejected() {
        let data = CreateActivity {
            activity_code: Some("K".repeat(65)),
            name: Some("Latihan".into()),
            date: Some("2024-05-01".into()),
            operator_name: Some("Serda Budi".into()),
            tool_code: Some(codes(&["EXC-01"])),
            tool_usage: Some(4),
            ..Default::default()
        };
        assert!(data.require_fields().is_ok());
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_missing_tool_codes_reported() {
        let data: CreateActivity = serde_json::from_str(
            r#"{"activityCode":"KEG-1","name":"Latihan","date":"2024-05-01","toolUsage":3}"#,
        )
        .unwrap();
        match data.require_fields() {
            Err(crate::error::AppError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["operatorName", "toolCode"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_link_changes_replace_set() {
        let changes = LinkChanges::between(&codes(&["A", "B"]), &codes(&["B", "C"]));
        assert_eq!(changes.remove, codes(&["A"]));
        assert_eq!(changes.add, codes(&["C"]));

        let mut after: Vec<String> = codes(&["A", "B"])
            .into_iter()
            .filter(|c| !changes.remove.contains(c))
            .collect();
        after.extend(changes.add.iter().cloned());
        after.sort();
        assert_eq!(after, codes(&["B", "C"]));
    }

    #[test]
    fn test_link_changes_noop() {
        assert!(LinkChanges::between(&codes(&["A", "B"]), &codes(&["B", "A"])).is_empty());
    }

    #[test]
    fn test_update_without_tool_code_keeps_links() {
        let data: UpdateActivity = serde_json::from_str(r#"{"name":"Patroli"}"#).unwrap();
        assert!(data.tool_codes().is_none());
    }
}
