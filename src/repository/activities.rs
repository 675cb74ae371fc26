//! Activities repository.
//!
//! Writes that touch both an activity and its tool links run inside one
//! transaction, so a failed re-link never leaves a half-updated activity.

use chrono::NaiveDate;
use indexmap::IndexMap;
use sqlx::{FromRow, Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::activity::{Activity, ActivityWithTools, LinkChanges, LinkedTool},
};

/// Validated data for a new activity
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub activity_code: String,
    pub name: String,
    pub description: String,
    pub date: NaiveDate,
    pub operator_name: String,
    pub tool_usage: i32,
    pub tool_codes: Vec<String>,
}

/// Validated partial update; `tool_codes` replaces the link set when present
#[derive(Debug, Clone, Default)]
pub struct ActivityChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub operator_name: Option<String>,
    pub tool_usage: Option<i32>,
    pub tool_codes: Option<Vec<String>>,
}

/// List filter
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tool_code: Option<String>,
}

#[derive(FromRow)]
struct LinkRow {
    activity_code: String,
    #[sqlx(flatten)]
    tool: LinkedTool,
}

#[derive(Clone)]
pub struct ActivitiesRepository {
    pool: Pool<Postgres>,
}

impl ActivitiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List activities in date order with their tools
    pub async fn list(&self, filter: &ActivityFilter) -> AppResult<Vec<ActivityWithTools>> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if filter.start_date.is_some() {
            conditions.push(format!("a.date >= ${}", idx));
            idx += 1;
        }
        if filter.end_date.is_some() {
            conditions.push(format!("a.date <= ${}", idx));
            idx += 1;
        }
        if filter.tool_code.is_some() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM activity_tools l WHERE l.activity_code = a.activity_code AND l.tool_code = ${})",
                idx
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT a.* FROM activities a {} ORDER BY a.date, a.activity_code",
            where_clause
        );
        let mut builder = sqlx::query_as::<_, Activity>(&query);
        if let Some(sd) = filter.start_date {
            builder = builder.bind(sd);
        }
        if let Some(ed) = filter.end_date {
            builder = builder.bind(ed);
        }
        if let Some(ref tc) = filter.tool_code {
            builder = builder.bind(tc);
        }

        let activities = builder.fetch_all(&self.pool).await?;
        self.attach_tools(activities).await
    }

    /// Get one activity with its tools
    pub async fn get_by_code(&self, code: &str) -> AppResult<ActivityWithTools> {
        let activity = sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE activity_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", code)))?;

        self.attach_tools(vec![activity])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("activity vanished while loading tools".to_string()))
    }

    async fn attach_tools(&self, activities: Vec<Activity>) -> AppResult<Vec<ActivityWithTools>> {
        let codes: Vec<String> = activities.iter().map(|a| a.activity_code.clone()).collect();
        let mut links: IndexMap<String, Vec<LinkedTool>> = IndexMap::new();

        if !codes.is_empty() {
            let rows = sqlx::query_as::<_, LinkRow>(
                r#"
                SELECT at.activity_code, t.tool_code, t.name, t.brand
                FROM activity_tools at
                JOIN tools t ON t.tool_code = at.tool_code
                WHERE at.activity_code = ANY($1)
                ORDER BY t.tool_code
                "#,
            )
            .bind(&codes)
            .fetch_all(&self.pool)
            .await?;

            for row in rows {
                links.entry(row.activity_code).or_default().push(row.tool);
            }
        }

        Ok(activities
            .into_iter()
            .map(|activity| {
                let tools = links.swap_remove(&activity.activity_code).unwrap_or_default();
                ActivityWithTools { activity, tools }
            })
            .collect())
    }

    /// Tool codes from `codes` that do not exist
    async fn missing_tools(tx: &mut Transaction<'_, Postgres>, codes: &[String]) -> AppResult<Vec<String>> {
        let found: Vec<String> = sqlx::query_scalar("SELECT tool_code FROM tools WHERE tool_code = ANY($1)")
            .bind(codes)
            .fetch_all(&mut **tx)
            .await?;
        Ok(codes.iter().filter(|c| !found.contains(c)).cloned().collect())
    }

    async fn ensure_tools_exist(tx: &mut Transaction<'_, Postgres>, codes: &[String]) -> AppResult<()> {
        let missing = Self::missing_tools(tx, codes).await?;
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Tool(s) not found: {}", missing.join(", "))))
        }
    }

    async fn link_tools(tx: &mut Transaction<'_, Postgres>, activity_code: &str, codes: &[String]) -> AppResult<()> {
        if codes.is_empty() {
            return Ok(());
        }
        sqlx::query(
            r#"
            INSERT INTO activity_tools (activity_code, tool_code)
            SELECT $1, code FROM UNNEST($2::text[]) AS code
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(activity_code)
        .bind(codes)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Insert an activity and its tool links
    pub async fn create(&self, data: &NewActivity) -> AppResult<ActivityWithTools> {
        let mut tx = self.pool.begin().await?;

        Self::ensure_tools_exist(&mut tx, &data.tool_codes).await?;

        sqlx::query(
            r#"
            INSERT INTO activities (activity_code, name, description, date, operator_name, tool_usage)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&data.activity_code)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.date)
        .bind(&data.operator_name)
        .bind(data.tool_usage)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Activity {} already exists", data.activity_code))
            }
            other => AppError::Database(other),
        })?;

        Self::link_tools(&mut tx, &data.activity_code, &data.tool_codes).await?;
        tx.commit().await?;

        self.get_by_code(&data.activity_code).await
    }

    /// Update an activity; a new tool list replaces the old link set
    pub async fn update(&self, code: &str, changes: &ActivityChanges) -> AppResult<ActivityWithTools> {
        let mut tx = self.pool.begin().await?;

        // Lock the row so concurrent edits of the same activity serialize
        let exists: Option<String> =
            sqlx::query_scalar("SELECT activity_code FROM activities WHERE activity_code = $1 FOR UPDATE")
                .bind(code)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Activity {} not found", code)));
        }

        let mut sets = vec!["modif_date = NOW()".to_string()];
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(changes.name, "name");
        add_field!(changes.description, "description");
        add_field!(changes.date, "date");
        add_field!(changes.operator_name, "operator_name");
        add_field!(changes.tool_usage, "tool_usage");

        let query = format!(
            "UPDATE activities SET {} WHERE activity_code = ${}",
            sets.join(", "),
            idx
        );
        let mut builder = sqlx::query(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(changes.name);
        bind_field!(changes.description);
        bind_field!(changes.date);
        bind_field!(changes.operator_name);
        bind_field!(changes.tool_usage);

        builder.bind(code).execute(&mut *tx).await?;

        if let Some(ref desired) = changes.tool_codes {
            Self::ensure_tools_exist(&mut tx, desired).await?;

            let current: Vec<String> =
                sqlx::query_scalar("SELECT tool_code FROM activity_tools WHERE activity_code = $1")
                    .bind(code)
                    .fetch_all(&mut *tx)
                    .await?;

            let link_changes = LinkChanges::between(&current, desired);
            if !link_changes.remove.is_empty() {
                sqlx::query("DELETE FROM activity_tools WHERE activity_code = $1 AND tool_code = ANY($2)")
                    .bind(code)
                    .bind(&link_changes.remove)
                    .execute(&mut *tx)
                    .await?;
            }
            Self::link_tools(&mut tx, code, &link_changes.add).await?;

            tracing::debug!(
                activity_code = code,
                removed = ?link_changes.remove,
                added = ?link_changes.add,
                "activity tool links replaced"
            );
        }

        tx.commit().await?;
        self.get_by_code(code).await
    }

    /// Delete an activity; its tool links go with it
    pub async fn delete(&self, code: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM activities WHERE activity_code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Activity {} not found", code)));
        }
        Ok(())
    }
}
