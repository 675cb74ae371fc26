//! Tool (peralatan) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        tool::{CreateTool, ToolCondition, ToolDetail, ToolQuery, ToolView, UpdateTool},
        Pagination,
    },
    policy::Permission,
    AppState,
};

use super::{AuthenticatedUser, ImageForm, MultipartForm, PaginatedResponse, ToolPage};

/// Multipart body of `POST /tools`
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct CreateToolForm {
    tool_code: String,
    name: String,
    brand: String,
    max_hour_usage: i32,
    condition: ToolCondition,
    /// Optional jpg, jpeg, png, gif or webp file
    #[schema(value_type = Option<String>, format = Binary)]
    image: Option<Vec<u8>>,
}

/// List tools with remaining hours
#[utoipa::path(
    get,
    path = "/tools",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(ToolQuery),
    responses(
        (status = 200, description = "Page of tools", body = ToolPage),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_tools(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ToolQuery>,
) -> AppResult<Json<PaginatedResponse<ToolView>>> {
    claims.require(Permission::ReadInventory)?;

    let (items, total) = state.services.tools.list(&query).await?;
    let page = Pagination::new(query.page, query.per_page);

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: page.page,
        per_page: page.per_page,
    }))
}

/// Get a tool with its activity history
#[utoipa::path(
    get,
    path = "/tools/{code}",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Tool code")),
    responses(
        (status = 200, description = "Tool details", body = ToolDetail),
        (status = 404, description = "Tool not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_tool(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
) -> AppResult<Json<ToolDetail>> {
    claims.require(Permission::ReadInventory)?;

    let tool = state.services.tools.get(&code).await?;
    Ok(Json(tool))
}

/// Create a tool (multipart form, optional `image` file)
#[utoipa::path(
    post,
    path = "/tools",
    tag = "tools",
    security(("bearer_auth" = [])),
    request_body(content = CreateToolForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Tool created", body = ToolView),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 409, description = "Tool code already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_tool(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ToolView>)> {
    claims.require(Permission::WriteInventory)?;

    let form = MultipartForm::read(multipart).await?;
    let data = CreateTool {
        tool_code: form.text("toolCode"),
        name: form.text("name"),
        brand: form.text("brand"),
        max_hour_usage: form.parsed("maxHourUsage")?,
        condition: form.parsed("condition")?,
    };

    let tool = state.services.tools.create(data, form.image).await?;
    Ok((StatusCode::CREATED, Json(tool)))
}

/// Update tool attributes
#[utoipa::path(
    put,
    path = "/tools/{code}",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Tool code")),
    request_body = UpdateTool,
    responses(
        (status = 200, description = "Tool updated", body = ToolView),
        (status = 404, description = "Tool not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_tool(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
    Json(data): Json<UpdateTool>,
) -> AppResult<Json<ToolView>> {
    claims.require(Permission::WriteInventory)?;

    let tool = state.services.tools.update(&code, data).await?;
    Ok(Json(tool))
}

/// Replace a tool's image (multipart field `image`)
#[utoipa::path(
    put,
    path = "/tools/{code}/image",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Tool code")),
    request_body(content = ImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image replaced", body = ToolView),
        (status = 404, description = "Tool not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_tool_image(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<ToolView>> {
    claims.require(Permission::WriteInventory)?;

    let upload = MultipartForm::read(multipart).await?.require_image()?;
    let tool = state.services.tools.update_image(&code, upload).await?;
    Ok(Json(tool))
}

/// Delete a tool, its activity links and its image
#[utoipa::path(
    delete,
    path = "/tools/{code}",
    tag = "tools",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Tool code")),
    responses(
        (status = 204, description = "Tool deleted"),
        (status = 404, description = "Tool not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_tool(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
) -> AppResult<StatusCode> {
    claims.require(Permission::WriteInventory)?;

    state.services.tools.delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
