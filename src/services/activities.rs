//! Activity service: validation, tool linking and usage warnings

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{ActivityQuery, ActivityWithTools, CreateActivity, UpdateActivity},
        Pagination,
    },
    report::sort::{sort_activities, SortOrder},
    repository::{
        activities::{ActivityChanges, ActivityFilter, NewActivity},
        Repository,
    },
    usage,
    validation::{parse_date, validate},
};

#[derive(Clone)]
pub struct ActivitiesService {
    repository: Repository,
}

impl ActivitiesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &ActivityQuery) -> AppResult<(Vec<ActivityWithTools>, i64)> {
        let filter = ActivityFilter {
            start_date: query
                .start_date
                .as_deref()
                .map(|d| parse_date("startDate", d))
                .transpose()?,
            end_date: query
                .end_date
                .as_deref()
                .map(|d| parse_date("endDate", d))
                .transpose()?,
            tool_code: query
                .tool_code
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
        };

        let mut activities: Vec<ActivityWithTools> = self
            .repository
            .activities
            .list(&filter)
            .await?
            .into_iter()
            .filter(|a| matches_search(a, query.search.as_deref()))
            .collect();

        sort_activities(
            &mut activities,
            query.sort.as_deref(),
            SortOrder::parse(query.order.as_deref()),
        );
        Ok(Pagination::new(query.page, query.per_page).slice(activities))
    }

    pub async fn get(&self, code: &str) -> AppResult<ActivityWithTools> {
        self.repository.activities.get_by_code(code).await
    }

    pub async fn create(&self, data: CreateActivity) -> AppResult<ActivityWithTools> {
        data.require_fields()?;
        validate(&data)?;

        let new = NewActivity {
            activity_code: data.activity_code.as_deref().unwrap_or_default().trim().to_string(),
            name: data.name.as_deref().unwrap_or_default().trim().to_string(),
            description: data.description.as_deref().unwrap_or_default().trim().to_string(),
            date: parse_date("date", data.date.as_deref().unwrap_or_default())?,
            operator_name: data.operator_name.as_deref().unwrap_or_default().trim().to_string(),
            tool_usage: data.tool_usage.unwrap_or_default(),
            tool_codes: data.tool_codes(),
        };

        let activity = self.repository.activities.create(&new).await?;
        tracing::info!(
            activity_code = %new.activity_code,
            tools = ?new.tool_codes,
            hours = new.tool_usage,
            "activity created"
        );
        self.warn_over_allocation(&activity).await;
        Ok(activity)
    }

    pub async fn update(&self, code: &str, data: UpdateActivity) -> AppResult<ActivityWithTools> {
        validate(&data)?;

        let tool_codes = data.tool_codes();
        if matches!(tool_codes, Some(ref codes) if codes.is_empty()) {
            return Err(AppError::MissingFields(vec!["toolCode".to_string()]));
        }

        let changes = ActivityChanges {
            name: data.name.as_deref().map(|s| s.trim().to_string()),
            description: data.description.as_deref().map(|s| s.trim().to_string()),
            date: data.date.as_deref().map(|d| parse_date("date", d)).transpose()?,
            operator_name: data.operator_name.as_deref().map(|s| s.trim().to_string()),
            tool_usage: data.tool_usage,
            tool_codes,
        };

        let activity = self.repository.activities.update(code, &changes).await?;
        tracing::info!(activity_code = code, "activity updated");
        self.warn_over_allocation(&activity).await;
        Ok(activity)
    }

    pub async fn delete(&self, code: &str) -> AppResult<()> {
        self.repository.activities.delete(code).await?;
        tracing::info!(activity_code = code, "activity deleted");
        Ok(())
    }

    /// Over-allocation is accepted, but logged for every linked tool it affects
    async fn warn_over_allocation(&self, activity: &ActivityWithTools) {
        for code in activity.tool_codes() {
            match self.repository.tools.get_with_usage(code).await {
                Ok(tool) if usage::is_over_allocated(&tool) => {
                    tracing::warn!(
                        tool_code = code,
                        activity_code = %activity.activity.activity_code,
                        remaining_hours = usage::remaining_hours(&tool),
                        "tool usage exceeds its maximum hours"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(tool_code = code, error = %e, "usage check skipped"),
            }
        }
    }
}

fn matches_search(item: &ActivityWithTools, search: Option<&str>) -> bool {
    let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) else {
        return true;
    };
    let needle = search.to_lowercase();
    let a = &item.activity;
    [&a.activity_code, &a.name, &a.description, &a.operator_name]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::sort::tests::activity;

    #[test]
    fn test_search_is_case_insensitive() {
        let item = activity("KEG-7", "Patroli Perbatasan", 4, "Serda Wahyu", 6);
        assert!(matches_search(&item, Some("perbatasan")));
        assert!(matches_search(&item, Some("WAHYU")));
        assert!(matches_search(&item, Some("keg-7")));
        assert!(!matches_search(&item, Some("latihan")));
        assert!(matches_search(&item, None));
        assert!(matches_search(&item, Some("  ")));
    }
}
