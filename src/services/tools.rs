//! Tool inventory service

use crate::{
    error::AppResult,
    models::{
        tool::{CreateTool, ToolDetail, ToolQuery, ToolView, UpdateTool},
        Pagination,
    },
    report::sort::{sort_tools, SortOrder},
    repository::Repository,
    services::storage::{ImageCategory, ImageStorage, ImageUpload},
    usage,
    validation::validate,
};

#[derive(Clone)]
pub struct ToolsService {
    repository: Repository,
    storage: ImageStorage,
}

impl ToolsService {
    pub fn new(repository: Repository, storage: ImageStorage) -> Self {
        Self { repository, storage }
    }

    /// Filtered, sorted and paginated tool views
    pub async fn list(&self, query: &ToolQuery) -> AppResult<(Vec<ToolView>, i64)> {
        let mut tools: Vec<ToolView> = self
            .repository
            .tools
            .list_with_usage()
            .await?
            .iter()
            .map(usage::summarize)
            .filter(|view| matches_query(view, query))
            .collect();

        sort_tools(&mut tools, query.sort.as_deref(), SortOrder::parse(query.order.as_deref()));
        Ok(Pagination::new(query.page, query.per_page).slice(tools))
    }

    /// One tool with remaining hours and its activity history
    pub async fn get(&self, code: &str) -> AppResult<ToolDetail> {
        let usage = self.repository.tools.get_with_usage(code).await?;
        Ok(ToolDetail {
            summary: usage::summarize(&usage),
            activities: usage.activities,
        })
    }

    /// Create a tool, storing its image first when one is uploaded
    pub async fn create(&self, data: CreateTool, image: Option<ImageUpload>) -> AppResult<ToolView> {
        data.require_fields()?;
        validate(&data)?;

        let stored = match image {
            Some(upload) => Some(
                self.storage
                    .save(ImageCategory::Tools, &upload.filename, &upload.bytes)
                    .await?,
            ),
            None => None,
        };

        let tool = match self.repository.tools.create(&data, stored.as_deref()).await {
            Ok(tool) => tool,
            Err(e) => {
                self.storage.discard(stored.as_deref()).await;
                return Err(e);
            }
        };

        tracing::info!(tool_code = %tool.tool_code, "tool created");
        self.view(&tool.tool_code).await
    }

    pub async fn update(&self, code: &str, data: UpdateTool) -> AppResult<ToolView> {
        let data = data.normalized();
        validate(&data)?;
        self.repository.tools.update(code, &data).await?;
        let view = self.view(code).await?;
        if data.max_hour_usage.is_some() && view.over_allocated {
            tracing::warn!(
                tool_code = code,
                remaining_hours = view.remaining_hours,
                "maximum hours lowered below hours already used"
            );
        }
        Ok(view)
    }

    /// Replace a tool's image; the previous file is removed once the row points at the new one
    pub async fn update_image(&self, code: &str, upload: ImageUpload) -> AppResult<ToolView> {
        let previous = self.repository.tools.get_by_code(code).await?.image;
        let stored = self
            .storage
            .save(ImageCategory::Tools, &upload.filename, &upload.bytes)
            .await?;

        if let Err(e) = self.repository.tools.set_image(code, Some(&stored)).await {
            self.storage.discard(Some(&stored)).await;
            return Err(e);
        }
        self.storage.discard(previous.as_deref()).await;

        self.view(code).await
    }

    /// Delete a tool, its activity links and its stored image
    pub async fn delete(&self, code: &str) -> AppResult<()> {
        let tool = self.repository.tools.get_by_code(code).await?;
        self.repository.tools.delete(code).await?;
        self.storage.discard(tool.image.as_deref()).await;
        tracing::info!(tool_code = code, "tool deleted");
        Ok(())
    }

    async fn view(&self, code: &str) -> AppResult<ToolView> {
        let usage = self.repository.tools.get_with_usage(code).await?;
        Ok(usage::summarize(&usage))
    }
}

fn matches_query(view: &ToolView, query: &ToolQuery) -> bool {
    let tool = &view.tool;
    if let Some(condition) = query.condition {
        if tool.condition != condition {
            return false;
        }
    }
    match query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(search) => {
            let needle = search.to_lowercase();
            [&tool.tool_code, &tool.name, &tool.brand]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        }
        None => true,
    }
}
