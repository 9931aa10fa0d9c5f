use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::recommendation::ActionKind;

pub const STATUS_COMPLETED: &str = "completed";

/// Record of a circular action carried out on an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub product_name: String,
    pub action: ActionKind,
    pub carbon_saved: f64,
    pub reward_points: u32,
    pub status: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TransactionRow {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub product_name: String,
    pub action: String,
    pub carbon_saved: f64,
    pub reward_points: i32,
    pub status: String,
    pub date: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = String;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: row.id.to_string(),
            user_id: row.user_id.to_string(),
            product_name: row.product_name,
            action: row.action.parse()?,
            carbon_saved: row.carbon_saved,
            reward_points: u32::try_from(row.reward_points)
                .map_err(|_| format!("negative reward points {}", row.reward_points))?,
            status: row.status,
            date: row.date,
        })
    }
}
