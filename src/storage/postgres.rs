use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ItemStore, TransactionStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{
    Item, ItemStatus, ProductRow, Transaction, TransactionRow, UserRecord, UserRow,
};

const USER_COLUMNS: &str = "id, name, email, password, role, location, created_at";

const PRODUCT_COLUMNS: &str = "id, user_id, type AS category, name, description, condition, \
     age, market_value, status, created_at, recommendations";

const TRANSACTION_COLUMNS: &str =
    "id, user_id, product_name, action, carbon_saved, reward_points, status, date";

/// Relational backend: one statement per operation, no multi-statement transactions.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Ids are UUIDs in the schema; anything else cannot match a row.
fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

fn require_id(id: &str) -> AppResult<Uuid> {
    parse_id(id).ok_or_else(|| AppError::InvalidInput(format!("invalid id '{}'", id)))
}

fn corrupt(table: &str, e: String) -> AppError {
    AppError::Storage(format!("Corrupt {} row: {}", table, e))
}

fn to_item(row: ProductRow) -> AppResult<Item> {
    Item::try_from(row).map_err(|e| corrupt("products", e))
}

#[tonic::async_trait]
impl UserStore for PgStore {
    async fn insert(&self, record: UserRecord) -> AppResult<()> {
        let id = require_id(&record.user.id)?;
        let result = sqlx::query(
            "INSERT INTO users (id, name, email, password, role, location, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(&record.user.name)
        .bind(&record.user.email)
        .bind(&record.password_hash)
        .bind(record.user.role.as_str())
        .bind(record.user.location.as_deref())
        .bind(record.user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from)
            .transpose()
            .map_err(|e| corrupt("users", e))
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserRecord>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from)
            .transpose()
            .map_err(|e| corrupt("users", e))
    }
}

#[tonic::async_trait]
impl ItemStore for PgStore {
    async fn list_for_owner(&self, owner_id: &str) -> AppResult<Vec<Item>> {
        let Some(owner) = parse_id(owner_id) else {
            return Ok(Vec::new());
        };
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE user_id = $1 ORDER BY created_at DESC",
            PRODUCT_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(to_item).collect()
    }

    async fn get_for_owner(&self, owner_id: &str, id: &str) -> AppResult<Option<Item>> {
        let (Some(owner), Some(id)) = (parse_id(owner_id), parse_id(id)) else {
            return Ok(None);
        };
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE id = $1 AND user_id = $2",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_item).transpose()
    }

    async fn insert(&self, item: Item) -> AppResult<()> {
        let id = require_id(&item.id)?;
        let owner = require_id(&item.user_id)?;
        sqlx::query(
            "INSERT INTO products (id, user_id, type, name, description, condition, age, \
             market_value, status, created_at, recommendations) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(id)
        .bind(owner)
        .bind(item.category.as_str())
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.condition.as_str())
        .bind(&item.age)
        .bind(item.market_value)
        .bind(item.status.as_str())
        .bind(item.created_at)
        .bind(item.recommendations.clone().map(Json))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, item: Item, expected: ItemStatus) -> AppResult<Option<Item>> {
        let (Some(id), Some(owner)) = (parse_id(&item.id), parse_id(&item.user_id)) else {
            return Ok(None);
        };
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products SET type = $3, name = $4, description = $5, condition = $6, \
             age = $7, market_value = $8, status = $9, recommendations = $10 \
             WHERE id = $1 AND user_id = $2 AND status = $11 \
             RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .bind(item.category.as_str())
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.condition.as_str())
        .bind(&item.age)
        .bind(item.market_value)
        .bind(item.status.as_str())
        .bind(item.recommendations.clone().map(Json))
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_item).transpose()
    }

    async fn delete_for_owner(&self, owner_id: &str, id: &str) -> AppResult<bool> {
        let (Some(owner), Some(id)) = (parse_id(owner_id), parse_id(id)) else {
            return Ok(false);
        };
        let rows_affected = sqlx::query("DELETE FROM products WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }
}

#[tonic::async_trait]
impl TransactionStore for PgStore {
    async fn insert(&self, transaction: Transaction) -> AppResult<()> {
        let id = require_id(&transaction.id)?;
        let owner = require_id(&transaction.user_id)?;
        let reward_points = i32::try_from(transaction.reward_points).map_err(|_| {
            AppError::InvalidInput(format!(
                "reward points {} out of range",
                transaction.reward_points
            ))
        })?;
        sqlx::query(
            "INSERT INTO transactions (id, user_id, product_name, action, carbon_saved, \
             reward_points, status, date) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(owner)
        .bind(&transaction.product_name)
        .bind(transaction.action.as_str())
        .bind(transaction.carbon_saved)
        .bind(reward_points)
        .bind(&transaction.status)
        .bind(transaction.date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_owner(&self, owner_id: &str) -> AppResult<Vec<Transaction>> {
        let Some(owner) = parse_id(owner_id) else {
            return Ok(Vec::new());
        };
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE user_id = $1 ORDER BY date DESC",
            TRANSACTION_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Transaction::try_from(row).map_err(|e| corrupt("transactions", e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_rejects_non_uuid() {
        assert!(parse_id("abc123").is_none());
        assert!(parse_id(&Uuid::new_v4().to_string()).is_some());
        assert!(matches!(require_id("nope"), Err(AppError::InvalidInput(_))));
    }
}
