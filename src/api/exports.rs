//! Report export endpoints: printable HTML and XLSX downloads

use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::{
    error::AppResult,
    policy::Permission,
    report::{xlsx, ActivityExportRequest, SpreadsheetExportRequest, ToolExportRequest},
    services::reports::Spreadsheet,
    AppState,
};

use super::AuthenticatedUser;

impl IntoResponse for Spreadsheet {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        (
            [
                (header::CONTENT_TYPE, xlsx::CONTENT_TYPE.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Activities report for a period, ready to print
#[utoipa::path(
    post,
    path = "/exports/activities/html",
    tag = "exports",
    security(("bearer_auth" = [])),
    request_body = ActivityExportRequest,
    responses(
        (status = 200, description = "HTML document", content_type = "text/html", body = String),
        (status = 400, description = "Missing period or signer", body = crate::error::ErrorResponse)
    )
)]
pub async fn activities_html(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ActivityExportRequest>,
) -> AppResult<Html<String>> {
    claims.require(Permission::ExportReports)?;

    let document = state.services.reports.activities_html(&request).await?;
    Ok(Html(document))
}

/// Activities spreadsheet for a period
#[utoipa::path(
    post,
    path = "/exports/activities/xlsx",
    tag = "exports",
    security(("bearer_auth" = [])),
    request_body = ActivityExportRequest,
    responses(
        (status = 200, description = "XLSX workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Missing period", body = crate::error::ErrorResponse)
    )
)]
pub async fn activities_xlsx(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ActivityExportRequest>,
) -> AppResult<Spreadsheet> {
    claims.require(Permission::ExportReports)?;

    state.services.reports.activities_xlsx(&request).await
}

/// Usage history of a single tool, ready to print
#[utoipa::path(
    post,
    path = "/exports/tools/{code}/html",
    tag = "exports",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Tool code")),
    request_body = ToolExportRequest,
    responses(
        (status = 200, description = "HTML document", content_type = "text/html", body = String),
        (status = 400, description = "Missing signer", body = crate::error::ErrorResponse),
        (status = 404, description = "Tool not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn tool_html(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
    Json(request): Json<ToolExportRequest>,
) -> AppResult<Html<String>> {
    claims.require(Permission::ExportReports)?;

    let document = state.services.reports.tool_html(&code, &request).await?;
    Ok(Html(document))
}

/// Every tool with its remaining hours, ready to print
#[utoipa::path(
    post,
    path = "/exports/tools/html",
    tag = "exports",
    security(("bearer_auth" = [])),
    request_body = ToolExportRequest,
    responses(
        (status = 200, description = "HTML document", content_type = "text/html", body = String),
        (status = 400, description = "Missing signer", body = crate::error::ErrorResponse)
    )
)]
pub async fn tools_html(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ToolExportRequest>,
) -> AppResult<Html<String>> {
    claims.require(Permission::ExportReports)?;

    let document = state.services.reports.tools_html(&request).await?;
    Ok(Html(document))
}

/// Spreadsheet of tools or activities, selected by `kind`
#[utoipa::path(
    post,
    path = "/exports/xlsx",
    tag = "exports",
    security(("bearer_auth" = [])),
    request_body = SpreadsheetExportRequest,
    responses(
        (status = 200, description = "XLSX workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        (status = 400, description = "Missing kind or period", body = crate::error::ErrorResponse)
    )
)]
pub async fn spreadsheet(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<SpreadsheetExportRequest>,
) -> AppResult<Spreadsheet> {
    claims.require(Permission::ExportReports)?;

    state.services.reports.spreadsheet(&request).await
}
