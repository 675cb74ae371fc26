//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{activities, auth, exports, health, tools, uploads, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SIYANMAT API",
        version = "1.0.0",
        description = "Equipment usage tracking: tools, activities charged against them, and printable reports"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::register,
        auth::me,
        auth::update_profile,
        auth::update_profile_image,
        auth::update_password,
        // Tools
        tools::list_tools,
        tools::get_tool,
        tools::create_tool,
        tools::update_tool,
        tools::update_tool_image,
        tools::delete_tool,
        // Activities
        activities::list_activities,
        activities::get_activity,
        activities::create_activity,
        activities::update_activity,
        activities::delete_activity,
        // Users
        users::list_users,
        users::get_user,
        users::get_user_by_email,
        users::create_user,
        users::update_user,
        users::update_user_image,
        users::update_user_password,
        users::update_user_role,
        users::delete_user,
        // Exports
        exports::activities_html,
        exports::activities_xlsx,
        exports::tool_html,
        exports::tools_html,
        exports::spreadsheet,
        // Uploads
        uploads::serve_upload,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Tools
            crate::models::tool::Tool,
            crate::models::tool::ToolView,
            crate::models::tool::ToolDetail,
            crate::models::tool::ActivityCharge,
            crate::models::tool::ToolCondition,
            crate::models::tool::CreateTool,
            crate::models::tool::UpdateTool,
            crate::models::tool::ToolQuery,
            // Activities
            crate::models::activity::Activity,
            crate::models::activity::LinkedTool,
            crate::models::activity::ActivityWithTools,
            crate::models::activity::CreateActivity,
            crate::models::activity::UpdateActivity,
            crate::models::activity::ActivityQuery,
            // Users
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::UserQuery,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::UpdatePassword,
            crate::models::user::UpdateRole,
            // Multipart forms
            tools::CreateToolForm,
            super::ImageForm,
            // Pages
            super::ToolPage,
            super::ActivityPage,
            super::UserPage,
            // Exports
            crate::report::ActivityExportRequest,
            crate::report::ToolExportRequest,
            crate::report::SpreadsheetExportRequest,
            crate::report::SpreadsheetKind,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and own profile"),
        (name = "tools", description = "Tool inventory and remaining hours"),
        (name = "activities", description = "Activities charged against tools"),
        (name = "users", description = "User management"),
        (name = "exports", description = "Printable and spreadsheet reports"),
        (name = "uploads", description = "Stored images")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
