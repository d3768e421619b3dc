use crate::favorites::{Conflict, SetConflict};

/// Formats one conflict as the alert line shown on the page
pub fn format_conflict_line(conflict: &Conflict) -> String {
    match (conflict.venue1, conflict.venue2) {
        (Some(venue1), Some(venue2)) => format!(
            "{}: {} ({}, {}, {}) clashes with {} ({}, {}, {})",
            conflict.day,
            conflict.artist1,
            conflict.time1,
            conflict.stage1,
            venue1,
            conflict.artist2,
            conflict.time2,
            conflict.stage2,
            venue2,
        ),
        _ => format!(
            "{}: {} ({}, {}) clashes with {} ({}, {})",
            conflict.day,
            conflict.artist1,
            conflict.time1,
            conflict.stage1,
            conflict.artist2,
            conflict.time2,
            conflict.stage2,
        ),
    }
}

/// Joins conflicts into one alert message, or None when there is nothing
/// to alert on
pub fn format_conflict_alert(conflicts: &[Conflict]) -> Option<String> {
    if conflicts.is_empty() {
        return None;
    }
    let mut lines = vec!["Schedule clash between your favorites:".to_string()];
    lines.extend(conflicts.iter().map(format_conflict_line));
    Some(lines.join("\n"))
}

/// Tooltip line for one conflicting counterpart of a specific set
pub fn format_set_conflict_line(conflict: &SetConflict) -> String {
    format!(
        "Clashes with {} ({}-{}, {}, {})",
        conflict.artist, conflict.start, conflict.end, conflict.stage, conflict.venue,
    )
}
