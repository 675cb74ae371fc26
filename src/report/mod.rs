//! Report formatting: sorted record lists rendered to printable HTML or to
//! an XLSX workbook.

pub mod html;
pub mod sort;
pub mod xlsx;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    validation::{parse_date, RequiredFields},
};

/// Inclusive date range covered by a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Person signing a printed report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    pub name: String,
    /// Service number (NRP/NIP)
    pub identifier: String,
}

/// Activities report request (HTML or spreadsheet)
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityExportRequest {
    /// YYYY-MM-DD
    pub start_date: Option<String>,
    /// YYYY-MM-DD
    pub end_date: Option<String>,
    /// date, name, operatorName, activityCode, toolCode, toolUsage
    pub sort: Option<String>,
    pub order: Option<String>,
    pub signer_name: Option<String>,
    pub signer_id: Option<String>,
}

/// Tool report request (single tool or all tools)
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolExportRequest {
    /// Optional period restricting the activity history of a single-tool report
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// toolCode, name, brand, maxHourUsage, remainingHours, condition
    /// (for a single-tool report the activity keys apply)
    pub sort: Option<String>,
    pub order: Option<String>,
    pub signer_name: Option<String>,
    pub signer_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SpreadsheetKind {
    Tools,
    Activities,
}

/// Generic spreadsheet export request
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetExportRequest {
    pub kind: Option<SpreadsheetKind>,
    /// Required for activities
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

fn bad_request(err: AppError) -> AppError {
    match err {
        AppError::MissingFields(_) | AppError::Validation(_) => AppError::BadRequest(err.to_string()),
        other => other,
    }
}

fn require_period(start: Option<&str>, end: Option<&str>) -> AppResult<Period> {
    RequiredFields::new()
        .text("startDate", start)
        .text("endDate", end)
        .check()
        .map_err(bad_request)?;
    // Both present past this point
    let start = parse_date("startDate", start.unwrap_or_default()).map_err(bad_request)?;
    let end = parse_date("endDate", end.unwrap_or_default()).map_err(bad_request)?;
    if start > end {
        return Err(AppError::BadRequest("startDate must not be after endDate".to_string()));
    }
    Ok(Period { start, end })
}

fn optional_period(start: Option<&str>, end: Option<&str>) -> AppResult<Option<Period>> {
    match (start, end) {
        (None, None) => Ok(None),
        _ => require_period(start, end).map(Some),
    }
}

fn require_signer(name: Option<&str>, identifier: Option<&str>) -> AppResult<Signer> {
    RequiredFields::new()
        .text("signerName", name)
        .text("signerId", identifier)
        .check()
        .map_err(bad_request)?;
    Ok(Signer {
        name: name.unwrap_or_default().trim().to_string(),
        identifier: identifier.unwrap_or_default().trim().to_string(),
    })
}

impl ActivityExportRequest {
    /// Period and signer for a printed report
    pub fn for_print(&self) -> AppResult<(Period, Signer)> {
        // Report every missing field at once before parsing anything
        RequiredFields::new()
            .text("startDate", self.start_date.as_deref())
            .text("endDate", self.end_date.as_deref())
            .text("signerName", self.signer_name.as_deref())
            .text("signerId", self.signer_id.as_deref())
            .check()
            .map_err(bad_request)?;

        let period = require_period(self.start_date.as_deref(), self.end_date.as_deref())?;
        let signer = require_signer(self.signer_name.as_deref(), self.signer_id.as_deref())?;
        Ok((period, signer))
    }

    /// Period for a spreadsheet; no signature block is needed
    pub fn for_spreadsheet(&self) -> AppResult<Period> {
        require_period(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

impl ToolExportRequest {
    pub fn for_print(&self) -> AppResult<(Option<Period>, Signer)> {
        let signer = require_signer(self.signer_name.as_deref(), self.signer_id.as_deref())?;
        let period = optional_period(self.start_date.as_deref(), self.end_date.as_deref())?;
        Ok((period, signer))
    }
}

impl SpreadsheetExportRequest {
    pub fn kind(&self) -> AppResult<SpreadsheetKind> {
        self.kind
            .ok_or_else(|| AppError::BadRequest("Missing fields: kind".to_string()))
    }

    pub fn period(&self) -> AppResult<Period> {
        require_period(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

const MONTHS_ID: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// Long Indonesian date, e.g. `5 Maret 2024`
pub fn format_date_long(date: NaiveDate) -> String {
    format!("{} {} {}", date.day(), MONTHS_ID[date.month0() as usize], date.year())
}

/// Short date, e.g. `05/03/2024`
pub fn format_date_short(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Download file name stem, e.g. `laporan-kegiatan-20240301-20240331`
pub fn file_stem(prefix: &str, period: Option<&Period>) -> String {
    match period {
        Some(p) => format!("{}-{}-{}", prefix, p.start.format("%Y%m%d"), p.end.format("%Y%m%d")),
        None => prefix.to_string(),
    }
}
