use chrono::NaiveDate;

use crate::models::Item;

pub const CSV_HEADER: &str = "Name,Type,Status,Created Date,Action,Carbon Saved (kg),Reward Points";

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// History export: header plus one fully quoted row per item.
pub fn to_csv(items: &[Item]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(CSV_HEADER.to_string());

    for item in items {
        let best = item.top_recommendation();
        let fields = [
            item.name.clone(),
            item.category.to_string(),
            item.status.to_string(),
            item.created_at.format("%Y-%m-%d").to_string(),
            best.map(|r| r.action.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            best.map(|r| r.carbon_saved.to_string())
                .unwrap_or_else(|| "0".to_string()),
            best.map(|r| r.reward_points.to_string())
                .unwrap_or_else(|| "0".to_string()),
        ];
        lines.push(
            fields
                .iter()
                .map(|f| quote(f))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    lines.join("\n")
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("ecoloop-history-{}.csv", date.format("%Y-%m-%d"))
}
