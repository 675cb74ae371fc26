//! Activity (kegiatan) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        activity::{ActivityQuery, ActivityWithTools, CreateActivity, UpdateActivity},
        Pagination,
    },
    policy::Permission,
    AppState,
};

use super::{ActivityPage, AuthenticatedUser, PaginatedResponse};

/// List activities
#[utoipa::path(
    get,
    path = "/activities",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(ActivityQuery),
    responses(
        (status = 200, description = "Page of activities", body = ActivityPage),
        (status = 400, description = "Invalid date filter", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_activities(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<PaginatedResponse<ActivityWithTools>>> {
    claims.require(Permission::ReadInventory)?;

    let (items, total) = state.services.activities.list(&query).await?;
    let page = Pagination::new(query.page, query.per_page);

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: page.page,
        per_page: page.per_page,
    }))
}

#[utoipa::path(
    get,
    path = "/activities/{code}",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Activity code")),
    responses(
        (status = 200, description = "Activity with linked tools", body = ActivityWithTools),
        (status = 404, description = "Activity not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_activity(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
) -> AppResult<Json<ActivityWithTools>> {
    claims.require(Permission::ReadInventory)?;

    let activity = state.services.activities.get(&code).await?;
    Ok(Json(activity))
}

/// Create an activity charging hours to one or more tools
#[utoipa::path(
    post,
    path = "/activities",
    tag = "activities",
    security(("bearer_auth" = [])),
    request_body = CreateActivity,
    responses(
        (status = 201, description = "Activity created", body = ActivityWithTools),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 404, description = "Tool(s) not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Activity code already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_activity(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateActivity>,
) -> AppResult<(StatusCode, Json<ActivityWithTools>)> {
    claims.require(Permission::WriteInventory)?;

    let activity = state.services.activities.create(data).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// Update an activity; a `toolCode` list replaces the linked tools
#[utoipa::path(
    put,
    path = "/activities/{code}",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Activity code")),
    request_body = UpdateActivity,
    responses(
        (status = 200, description = "Activity updated", body = ActivityWithTools),
        (status = 404, description = "Activity or tool(s) not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_activity(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
    Json(data): Json<UpdateActivity>,
) -> AppResult<Json<ActivityWithTools>> {
    claims.require(Permission::WriteInventory)?;

    let activity = state.services.activities.update(&code, data).await?;
    Ok(Json(activity))
}

#[utoipa::path(
    delete,
    path = "/activities/{code}",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(("code" = String, Path, description = "Activity code")),
    responses(
        (status = 204, description = "Activity deleted"),
        (status = 404, description = "Activity not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_activity(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(code): Path<String>,
) -> AppResult<StatusCode> {
    claims.require(Permission::WriteInventory)?;

    state.services.activities.delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
