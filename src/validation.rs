//! Request validation helpers

use once_cell::sync::Lazy;
use regex::Regex;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Tool and activity codes: no commas (tool codes travel comma-joined) and
/// no slashes (codes are URL path segments)
pub static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid code regex"));

/// Collects the names of required fields that are absent or blank.
///
/// Checks are accumulated so a single rejection lists every missing field.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<String>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a text field to be present and non-blank
    pub fn text(mut self, name: &str, value: Option<&str>) -> Self {
        if value.map(str::trim).map_or(true, str::is_empty) {
            self.missing.push(name.to_string());
        }
        self
    }

    /// Require any value to be present
    pub fn value<T>(mut self, name: &str, value: Option<&T>) -> Self {
        if value.is_none() {
            self.missing.push(name.to_string());
        }
        self
    }

    /// Require a list to be present and non-empty
    pub fn list<T>(mut self, name: &str, value: Option<&[T]>) -> Self {
        if value.map_or(true, <[T]>::is_empty) {
            self.missing.push(name.to_string());
        }
        self
    }

    pub fn check(self) -> AppResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingFields(self.missing))
        }
    }
}

/// Run `validator` derive rules and map failures into `AppError::Validation`
pub fn validate<T: Validate>(payload: &T) -> AppResult<()> {
    payload.validate().map_err(AppError::from)
}

/// Years a stored date may carry; spreadsheets cannot represent earlier ones
pub const DATE_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(field: &str, value: &str) -> AppResult<chrono::NaiveDate> {
    use chrono::Datelike;

    let date = chrono::NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{}: expected a YYYY-MM-DD date", field)))?;
    if !DATE_YEARS.contains(&date.year()) {
        return Err(AppError::Validation(format!(
            "{}: year must be between {} and {}",
            field,
            DATE_YEARS.start(),
            DATE_YEARS.end()
        )));
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_every_missing_field() {
        let err = RequiredFields::new()
            .text("toolCode", None)
            .text("name", Some("   "))
            .text("brand", Some("Caterpillar"))
            .value::<i32>("maxHourUsage", None)
            .check()
            .unwrap_err();

        match err {
            AppError::MissingFields(fields) => {
                assert_eq!(fields, vec!["toolCode", "name", "maxHourUsage"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_list_is_missing() {
        let empty: Vec<String> = Vec::new();
        assert!(RequiredFields::new().list("toolCode", Some(empty.as_slice())).check().is_err());
        assert!(RequiredFields::new()
            .list("toolCode", Some(["EXC-01".to_string()].as_slice()))
            .check()
            .is_ok());
    }

    #[test]
    fn test_code_pattern() {
        assert!(CODE_PATTERN.is_match("EXC-01"));
        assert!(CODE_PATTERN.is_match("GEN-2024.3"));
        assert!(!CODE_PATTERN.is_match("GEN/2024"));
        assert!(!CODE_PATTERN.is_match("A,B"));
        assert!(!CODE_PATTERN.is_match(" A"));
        assert!(!CODE_PATTERN.is_match(""));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("date", "2024-03-05").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert!(matches!(parse_date("date", "05/03/2024"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_parse_date_rejects_years_outside_range() {
        assert!(matches!(parse_date("date", "0024-03-02"), Err(AppError::Validation(_))));
        assert!(matches!(parse_date("startDate", "1899-12-31"), Err(AppError::Validation(_))));
        assert!(parse_date("date", "1900-01-01").is_ok());
        assert!(parse_date("date", "9999-12-31").is_ok());
    }
}
