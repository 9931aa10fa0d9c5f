// Storage abstraction for the local JSON document and PostgreSQL backends

pub mod local;
pub mod postgres;

pub use local::LocalStore;
pub use postgres::PgStore;

use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{Item, ItemStatus, Transaction, UserRecord};

/// Account persistence.
#[tonic::async_trait]
pub trait UserStore: Send + Sync {
    /// Stores a new account. Fails with `AppError::DuplicateEmail` if the email is taken.
    async fn insert(&self, record: UserRecord) -> AppResult<()>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserRecord>>;
}

/// Item persistence. Every lookup is scoped to an owner.
#[tonic::async_trait]
pub trait ItemStore: Send + Sync {
    /// Owner's items, newest first.
    async fn list_for_owner(&self, owner_id: &str) -> AppResult<Vec<Item>>;

    async fn get_for_owner(&self, owner_id: &str, id: &str) -> AppResult<Option<Item>>;

    async fn insert(&self, item: Item) -> AppResult<()>;

    /// Replaces the stored record with the same id and owner, but only while its
    /// status is still `expected`. `None` if absent or the status has moved on.
    async fn update(&self, item: Item, expected: ItemStatus) -> AppResult<Option<Item>>;

    /// Returns whether a record was removed.
    async fn delete_for_owner(&self, owner_id: &str, id: &str) -> AppResult<bool>;
}

#[tonic::async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert(&self, transaction: Transaction) -> AppResult<()>;

    /// Owner's transactions, newest first.
    async fn list_for_owner(&self, owner_id: &str) -> AppResult<Vec<Transaction>>;
}

/// The three stores, usually backed by one object.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub items: Arc<dyn ItemStore>,
    pub transactions: Arc<dyn TransactionStore>,
}

impl Stores {
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: UserStore + ItemStore + TransactionStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            users: backend.clone(),
            items: backend.clone(),
            transactions: backend,
        }
    }
}
