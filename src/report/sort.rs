//! Sort keys for report and list views.
//!
//! All sorts are stable. An unrecognised key leaves the input in its natural
//! order.

use std::cmp::Ordering;

use crate::models::{
    activity::ActivityWithTools,
    tool::{ActivityCharge, ToolView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `desc` sorts ascending
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Lowercase and strip separators so `operatorName`, `operator_name` and
/// `OPERATORNAME` are the same key
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySortKey {
    Date,
    Name,
    OperatorName,
    ActivityCode,
    ToolCode,
    ToolUsage,
}

impl ActivitySortKey {
    pub fn parse(key: &str) -> Option<Self> {
        match normalize_key(key).as_str() {
            "date" => Some(ActivitySortKey::Date),
            "name" => Some(ActivitySortKey::Name),
            "operatorname" | "operator" => Some(ActivitySortKey::OperatorName),
            "activitycode" | "code" => Some(ActivitySortKey::ActivityCode),
            "toolcode" => Some(ActivitySortKey::ToolCode),
            "toolusage" | "hours" => Some(ActivitySortKey::ToolUsage),
            _ => None,
        }
    }

    fn compare(self, a: &ActivityWithTools, b: &ActivityWithTools) -> Ordering {
        let (x, y) = (&a.activity, &b.activity);
        match self {
            ActivitySortKey::Date => x.date.cmp(&y.date),
            ActivitySortKey::Name => x.name.cmp(&y.name),
            ActivitySortKey::OperatorName => x.operator_name.cmp(&y.operator_name),
            ActivitySortKey::ActivityCode => x.activity_code.cmp(&y.activity_code),
            ActivitySortKey::ToolCode => a.tool_codes().cmp(&b.tool_codes()),
            ActivitySortKey::ToolUsage => x.tool_usage.cmp(&y.tool_usage),
        }
    }

    /// Same keys over one tool's history; every charge shares the tool code
    fn compare_charges(self, x: &ActivityCharge, y: &ActivityCharge) -> Ordering {
        match self {
            ActivitySortKey::Date => x.date.cmp(&y.date),
            ActivitySortKey::Name => x.name.cmp(&y.name),
            ActivitySortKey::OperatorName => x.operator_name.cmp(&y.operator_name),
            ActivitySortKey::ActivityCode => x.activity_code.cmp(&y.activity_code),
            ActivitySortKey::ToolCode => Ordering::Equal,
            ActivitySortKey::ToolUsage => x.tool_usage.cmp(&y.tool_usage),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSortKey {
    ToolCode,
    Name,
    Brand,
    MaxHourUsage,
    RemainingHours,
    Condition,
}

impl ToolSortKey {
    pub fn parse(key: &str) -> Option<Self> {
        match normalize_key(key).as_str() {
            "toolcode" | "code" => Some(ToolSortKey::ToolCode),
            "name" => Some(ToolSortKey::Name),
            "brand" => Some(ToolSortKey::Brand),
            "maxhourusage" | "maxhours" => Some(ToolSortKey::MaxHourUsage),
            "remaininghours" | "remaining" => Some(ToolSortKey::RemainingHours),
            "condition" => Some(ToolSortKey::Condition),
            _ => None,
        }
    }

    fn compare(self, a: &ToolView, b: &ToolView) -> Ordering {
        let (x, y) = (&a.tool, &b.tool);
        match self {
            ToolSortKey::ToolCode => x.tool_code.cmp(&y.tool_code),
            ToolSortKey::Name => x.name.cmp(&y.name),
            ToolSortKey::Brand => x.brand.cmp(&y.brand),
            ToolSortKey::MaxHourUsage => x.max_hour_usage.cmp(&y.max_hour_usage),
            ToolSortKey::RemainingHours => a.remaining_hours.cmp(&b.remaining_hours),
            ToolSortKey::Condition => x.condition.cmp(&y.condition),
        }
    }
}

/// Sort activities in place by a caller-supplied key name
pub fn sort_activities(activities: &mut [ActivityWithTools], key: Option<&str>, order: SortOrder) {
    if let Some(key) = key.and_then(ActivitySortKey::parse) {
        activities.sort_by(|a, b| order.apply(key.compare(a, b)));
    }
}

/// Sort a single tool's activity history
pub fn sort_charges(charges: &mut [ActivityCharge], key: Option<&str>, order: SortOrder) {
    if let Some(key) = key.and_then(ActivitySortKey::parse) {
        charges.sort_by(|a, b| order.apply(key.compare_charges(a, b)));
    }
}

/// Sort tools in place by a caller-supplied key name
pub fn sort_tools(tools: &mut [ToolView], key: Option<&str>, order: SortOrder) {
    if let Some(key) = key.and_then(ToolSortKey::parse) {
        tools.sort_by(|a, b| order.apply(key.compare(a, b)));
    }
}
