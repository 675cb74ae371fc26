//! Tools repository

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{FromRow, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::tool::{ActivityCharge, CreateTool, Tool, ToolUsage, UpdateTool},
};

#[derive(Clone)]
pub struct ToolsRepository {
    pool: Pool<Postgres>,
}

#[derive(FromRow)]
struct ChargeRow {
    tool_code: String,
    #[sqlx(flatten)]
    charge: ActivityCharge,
}

impl ToolsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a tool row by code
    pub async fn get_by_code(&self, code: &str) -> AppResult<Tool> {
        sqlx::query_as::<_, Tool>("SELECT * FROM tools WHERE tool_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", code)))
    }

    /// Get a tool together with its full activity history
    pub async fn get_with_usage(&self, code: &str) -> AppResult<ToolUsage> {
        let tool = self.get_by_code(code).await?;
        let mut charges = self.charges_for(&[tool.tool_code.clone()]).await?;
        let activities = charges.remove(&tool.tool_code).unwrap_or_default();
        Ok(ToolUsage::new(tool, activities))
    }

    /// Every tool with its full activity history, ordered by code
    pub async fn list_with_usage(&self) -> AppResult<Vec<ToolUsage>> {
        let tools = sqlx::query_as::<_, Tool>("SELECT * FROM tools ORDER BY tool_code")
            .fetch_all(&self.pool)
            .await?;

        let codes: Vec<String> = tools.iter().map(|t| t.tool_code.clone()).collect();
        let mut charges = self.charges_for(&codes).await?;

        Ok(tools
            .into_iter()
            .map(|tool| {
                let activities = charges.remove(&tool.tool_code).unwrap_or_default();
                ToolUsage::new(tool, activities)
            })
            .collect())
    }

    /// Activity charges for the given tools, grouped by tool code, in date order
    async fn charges_for(&self, codes: &[String]) -> AppResult<HashMap<String, Vec<ActivityCharge>>> {
        if codes.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ChargeRow>(
            r#"
            SELECT at.tool_code, a.activity_code, a.name, a.date, a.operator_name, a.tool_usage
            FROM activity_tools at
            JOIN activities a ON a.activity_code = at.activity_code
            WHERE at.tool_code = ANY($1)
            ORDER BY a.date, a.activity_code
            "#,
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<ActivityCharge>> = HashMap::new();
        for row in rows {
            grouped.entry(row.tool_code).or_default().push(row.charge);
        }
        Ok(grouped)
    }

    /// Create a tool
    pub async fn create(&self, data: &CreateTool, image: Option<&str>) -> AppResult<Tool> {
        let row = sqlx::query_as::<_, Tool>(
            r#"
            INSERT INTO tools (tool_code, name, brand, max_hour_usage, condition, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.tool_code.as_deref().map(str::trim))
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.brand.as_deref().map(str::trim))
        .bind(data.max_hour_usage)
        .bind(data.condition)
        .bind(image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::Conflict(format!(
                "Tool {} already exists",
                data.tool_code.as_deref().unwrap_or_default()
            )),
            other => AppError::Database(other),
        })?;
        Ok(row)
    }

    /// Update a tool; only fields present in `data` change
    pub async fn update(&self, code: &str, data: &UpdateTool) -> AppResult<Tool> {
        let now = Utc::now();
        let mut sets = vec!["modif_date = $1".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.name, "name");
        add_field!(data.brand, "brand");
        add_field!(data.max_hour_usage, "max_hour_usage");
        add_field!(data.condition, "condition");

        let query = format!(
            "UPDATE tools SET {} WHERE tool_code = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Tool>(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        macro_rules! bind_text {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val.trim());
                }
            };
        }

        bind_text!(data.name);
        bind_text!(data.brand);
        bind_field!(data.max_hour_usage);
        bind_field!(data.condition);

        builder
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", code)))
    }

    /// Replace the stored image path
    pub async fn set_image(&self, code: &str, image: Option<&str>) -> AppResult<Tool> {
        sqlx::query_as::<_, Tool>(
            "UPDATE tools SET image = $1, modif_date = NOW() WHERE tool_code = $2 RETURNING *",
        )
        .bind(image)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", code)))
    }

    /// Delete a tool and, through the foreign key, its activity links
    pub async fn delete(&self, code: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM tools WHERE tool_code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Tool {} not found", code)));
        }
        Ok(())
    }
}
