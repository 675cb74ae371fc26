//! Usage accounting: remaining hours are always derived from the full
//! activity history of a tool, never stored.

use crate::models::tool::{ToolUsage, ToolView};

/// Sum of hours charged by every linked activity
pub fn used_hours(usage: &ToolUsage) -> i64 {
    usage.activities.iter().map(|a| i64::from(a.tool_usage)).sum()
}

/// `max_hour_usage - used_hours`; not clamped, so over-allocation goes negative
pub fn remaining_hours(usage: &ToolUsage) -> i64 {
    i64::from(usage.tool.max_hour_usage) - used_hours(usage)
}

pub fn is_over_allocated(usage: &ToolUsage) -> bool {
    remaining_hours(usage) < 0
}

/// Project a tool and its history into the API view
pub fn summarize(usage: &ToolUsage) -> ToolView {
    let used = used_hours(usage);
    let remaining = i64::from(usage.tool.max_hour_usage) - used;
    ToolView {
        tool: usage.tool.clone(),
        used_hours: used,
        remaining_hours: remaining,
        over_allocated: remaining < 0,
        activity_count: usage.activities.len(),
    }
}
