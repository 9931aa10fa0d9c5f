use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{ItemStore, TransactionStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{Item, ItemStatus, Transaction, UserRecord};

/// Collection keys of the persisted document.
pub const USERS_KEY: &str = "ecoloop_users";
pub const PRODUCTS_KEY: &str = "ecoloop_products";
pub const TRANSACTIONS_KEY: &str = "ecoloop_transactions";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    #[serde(rename = "ecoloop_users", default)]
    users: Vec<UserRecord>,
    /// Newest first.
    #[serde(rename = "ecoloop_products", default)]
    products: Vec<Item>,
    /// Newest first.
    #[serde(rename = "ecoloop_transactions", default)]
    transactions: Vec<Transaction>,
}

/// Single-document store: three JSON collections kept in memory and, when a
/// path is set, rewritten to disk after every mutation.
///
/// Writers are serialised by the lock. Each mutation is staged on a copy of the
/// document and only becomes visible once it has been written to disk. Item
/// updates are guarded by the expected status, see `ItemStore::update`.
pub struct LocalStore {
    doc: RwLock<Document>,
    path: Option<PathBuf>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self {
            doc: RwLock::new(Document::default()),
            path: None,
        }
    }

    /// Loads the document at `path`, starting empty if the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => Document::default(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::Storage(format!("Failed to parse {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Document::default(),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        tracing::info!(
            "Local store opened: path={}, users={}, products={}",
            path.display(),
            doc.users.len(),
            doc.products.len()
        );
        Ok(Self {
            doc: RwLock::new(doc),
            path: Some(path),
        })
    }

    async fn persist(&self, doc: &Document) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| AppError::Storage(format!("Failed to encode document: {}", e)))?;
        // Write-then-rename so a crash never leaves a truncated document behind
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to replace {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Persists `next` and, on success, makes it the live document.
    async fn commit(&self, doc: &mut Document, next: Document) -> AppResult<()> {
        self.persist(&next).await?;
        *doc = next;
        Ok(())
    }
}

#[tonic::async_trait]
impl UserStore for LocalStore {
    async fn insert(&self, record: UserRecord) -> AppResult<()> {
        let mut doc = self.doc.write().await;
        if doc.users.iter().any(|u| u.user.email == record.user.email) {
            return Err(AppError::DuplicateEmail);
        }
        let mut next = doc.clone();
        next.users.push(record);
        self.commit(&mut doc, next).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let doc = self.doc.read().await;
        Ok(doc.users.iter().find(|u| u.user.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserRecord>> {
        let doc = self.doc.read().await;
        Ok(doc.users.iter().find(|u| u.user.id == id).cloned())
    }
}

#[tonic::async_trait]
impl ItemStore for LocalStore {
    async fn list_for_owner(&self, owner_id: &str) -> AppResult<Vec<Item>> {
        let doc = self.doc.read().await;
        Ok(doc
            .products
            .iter()
            .filter(|p| p.user_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_for_owner(&self, owner_id: &str, id: &str) -> AppResult<Option<Item>> {
        let doc = self.doc.read().await;
        Ok(doc
            .products
            .iter()
            .find(|p| p.id == id && p.user_id == owner_id)
            .cloned())
    }

    async fn insert(&self, item: Item) -> AppResult<()> {
        let mut doc = self.doc.write().await;
        let mut next = doc.clone();
        next.products.insert(0, item);
        self.commit(&mut doc, next).await
    }

    async fn update(&self, item: Item, expected: ItemStatus) -> AppResult<Option<Item>> {
        let mut doc = self.doc.write().await;
        let Some(index) = doc.products.iter().position(|p| {
            p.id == item.id && p.user_id == item.user_id && p.status == expected
        }) else {
            return Ok(None);
        };
        let mut next = doc.clone();
        next.products[index] = item.clone();
        self.commit(&mut doc, next).await?;
        Ok(Some(item))
    }

    async fn delete_for_owner(&self, owner_id: &str, id: &str) -> AppResult<bool> {
        let mut doc = self.doc.write().await;
        if !doc.products.iter().any(|p| p.id == id && p.user_id == owner_id) {
            return Ok(false);
        }
        let mut next = doc.clone();
        next.products.retain(|p| !(p.id == id && p.user_id == owner_id));
        self.commit(&mut doc, next).await?;
        Ok(true)
    }
}

#[tonic::async_trait]
impl TransactionStore for LocalStore {
    async fn insert(&self, transaction: Transaction) -> AppResult<()> {
        let mut doc = self.doc.write().await;
        let mut next = doc.clone();
        next.transactions.insert(0, transaction);
        self.commit(&mut doc, next).await
    }

    async fn list_for_owner(&self, owner_id: &str) -> AppResult<Vec<Transaction>> {
        let doc = self.doc.read().await;
        Ok(doc
            .transactions
            .iter()
            .filter(|t| t.user_id == owner_id)
            .cloned()
            .collect())
    }
}
