//! Report exports. Every request is validated before the database is touched.

use chrono::{Local, NaiveDate};

use crate::{
    config::ReportConfig,
    error::AppResult,
    models::activity::ActivityWithTools,
    report::{
        file_stem, html,
        sort::{sort_activities, sort_charges, sort_tools, SortOrder},
        xlsx, ActivityExportRequest, Period, SpreadsheetExportRequest, SpreadsheetKind,
        ToolExportRequest,
    },
    repository::{activities::ActivityFilter, Repository},
    usage,
};

/// A rendered spreadsheet and its download name
pub struct Spreadsheet {
    pub bytes: Vec<u8>,
    pub filename: String,
}

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
    config: ReportConfig,
}

impl ReportsService {
    pub fn new(repository: Repository, config: ReportConfig) -> Self {
        Self { repository, config }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    async fn activities_in(&self, period: &Period, sort: Option<&str>, order: Option<&str>) -> AppResult<Vec<ActivityWithTools>> {
        let filter = ActivityFilter {
            start_date: Some(period.start),
            end_date: Some(period.end),
            tool_code: None,
        };
        let mut activities = self.repository.activities.list(&filter).await?;
        sort_activities(&mut activities, sort, SortOrder::parse(order));
        Ok(activities)
    }

    /// Printable activities report for a period
    pub async fn activities_html(&self, request: &ActivityExportRequest) -> AppResult<String> {
        let (period, signer) = request.for_print()?;
        let activities = self
            .activities_in(&period, request.sort.as_deref(), request.order.as_deref())
            .await?;

        tracing::info!(start = %period.start, end = %period.end, rows = activities.len(), "activities report rendered");
        Ok(html::activities_report(&self.config, &period, &activities, &signer, Self::today()))
    }

    /// Activities spreadsheet for a period
    pub async fn activities_xlsx(&self, request: &ActivityExportRequest) -> AppResult<Spreadsheet> {
        let period = request.for_spreadsheet()?;
        let activities = self
            .activities_in(&period, request.sort.as_deref(), request.order.as_deref())
            .await?;

        Ok(Spreadsheet {
            bytes: xlsx::activities_workbook(&activities)?,
            filename: format!("{}.xlsx", file_stem("laporan-kegiatan", Some(&period))),
        })
    }

    /// Printable history of one tool, optionally limited to a period
    pub async fn tool_html(&self, code: &str, request: &ToolExportRequest) -> AppResult<String> {
        let (period, signer) = request.for_print()?;
        let tool = self.repository.tools.get_with_usage(code).await?;
        let view = usage::summarize(&tool);

        let mut charges: Vec<_> = tool
            .activities
            .into_iter()
            .filter(|c| period.map_or(true, |p| p.contains(c.date)))
            .collect();
        sort_charges(&mut charges, request.sort.as_deref(), SortOrder::parse(request.order.as_deref()));

        Ok(html::tool_report(&self.config, &view, &charges, period.as_ref(), &signer, Self::today()))
    }

    /// Printable list of every tool with remaining hours
    pub async fn tools_html(&self, request: &ToolExportRequest) -> AppResult<String> {
        let (_, signer) = request.for_print()?;
        let mut tools: Vec<_> = self
            .repository
            .tools
            .list_with_usage()
            .await?
            .iter()
            .map(usage::summarize)
            .collect();
        sort_tools(&mut tools, request.sort.as_deref(), SortOrder::parse(request.order.as_deref()));

        Ok(html::tools_report(&self.config, &tools, &signer, Self::today()))
    }

    /// Generic spreadsheet export selected by `kind`
    pub async fn spreadsheet(&self, request: &SpreadsheetExportRequest) -> AppResult<Spreadsheet> {
        match request.kind()? {
            SpreadsheetKind::Tools => {
                let mut tools: Vec<_> = self
                    .repository
                    .tools
                    .list_with_usage()
                    .await?
                    .iter()
                    .map(usage::summarize)
                    .collect();
                sort_tools(&mut tools, request.sort.as_deref(), SortOrder::parse(request.order.as_deref()));
                Ok(Spreadsheet {
                    bytes: xlsx::tools_workbook(&tools)?,
                    filename: format!("{}.xlsx", file_stem("data-peralatan", None)),
                })
            }
            SpreadsheetKind::Activities => {
                let period = request.period()?;
                let activities = self
                    .activities_in(&period, request.sort.as_deref(), request.order.as_deref())
                    .await?;
                Ok(Spreadsheet {
                    bytes: xlsx::activities_workbook(&activities)?,
                    filename: format!("{}.xlsx", file_stem("laporan-kegiatan", Some(&period))),
                })
            }
        }
    }
}
