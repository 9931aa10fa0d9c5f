use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::engine::RecommendationEngine;
use crate::error::{AppError, AppResult};
use crate::export;
use crate::models::{
    sort_by_score, validate_set, ActionKind, Item, ItemDraft, ItemPatch, ItemStatus,
    Recommendation, Transaction, UserStats, STATUS_COMPLETED,
};
use crate::session::Session;
use crate::stats;
use crate::storage::{ItemStore, Stores, TransactionStore};

/// The caller's item catalogue. Every operation is scoped to the session's user.
#[derive(Clone)]
pub struct Inventory {
    items: Arc<dyn ItemStore>,
    transactions: Arc<dyn TransactionStore>,
    engine: Arc<RecommendationEngine>,
}

fn not_found() -> AppError {
    AppError::NotFound("Item not found".to_string())
}

fn already_processed() -> AppError {
    AppError::InvalidInput("Item already processed".to_string())
}

fn check_market_value(value: Option<f64>) -> AppResult<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(AppError::InvalidInput(
            "market_value must be a non-negative number".to_string(),
        )),
        _ => Ok(()),
    }
}

impl Inventory {
    pub fn new(stores: &Stores, engine: Arc<RecommendationEngine>) -> Self {
        Self {
            items: stores.items.clone(),
            transactions: stores.transactions.clone(),
            engine,
        }
    }

    pub async fn list(&self, session: &Session) -> AppResult<Vec<Item>> {
        self.items.list_for_owner(session.user_id()).await
    }

    /// Items owned by someone else are reported as missing.
    pub async fn get(&self, session: &Session, id: &str) -> AppResult<Item> {
        self.items
            .get_for_owner(session.user_id(), id)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn create(&self, session: &Session, draft: ItemDraft) -> AppResult<Item> {
        check_market_value(draft.market_value)?;
        let item = Item::from_draft(
            Uuid::new_v4().to_string(),
            session.user_id().to_string(),
            draft,
            Utc::now(),
        );
        self.items.insert(item.clone()).await?;
        tracing::debug!("Created item {} for user {}", item.id, item.user_id);
        Ok(item)
    }

    /// Merges user-editable fields. Status only moves through `analyze` and `process`.
    pub async fn update(&self, session: &Session, id: &str, patch: ItemPatch) -> AppResult<Item> {
        check_market_value(patch.market_value)?;
        if let Some(recommendations) = &patch.recommendations {
            validate_set(recommendations).map_err(AppError::InvalidInput)?;
        }
        let mut item = self.get(session, id).await?;
        if patch.recommendations.is_some() && item.status == ItemStatus::Processed {
            return Err(already_processed());
        }
        let expected = item.status;
        item.apply(patch);
        if let Some(recommendations) = item.recommendations.as_mut() {
            sort_by_score(recommendations);
        }
        self.write_back(item, expected).await
    }

    /// Missing ids are ignored.
    pub async fn delete(&self, session: &Session, id: &str) -> AppResult<()> {
        if !self.items.delete_for_owner(session.user_id(), id).await? {
            tracing::debug!("Delete of unknown item {} ignored", id);
        }
        Ok(())
    }

    /// Runs the engine and replaces the item's recommendations.
    pub async fn analyze(&self, session: &Session, id: &str) -> AppResult<Vec<Recommendation>> {
        let mut item = self.get(session, id).await?;
        if item.status == ItemStatus::Processed {
            return Err(already_processed());
        }
        let expected = item.status;
        let recommendations = self.engine.analyze(&item).await;
        item.status = ItemStatus::Analyzed;
        item.recommendations = Some(recommendations.clone());
        self.write_back(item, expected).await?;
        Ok(recommendations)
    }

    /// Commits to one of the analyzed actions and records the transaction.
    pub async fn process(
        &self,
        session: &Session,
        id: &str,
        action: ActionKind,
    ) -> AppResult<Transaction> {
        let item = self.get(session, id).await?;
        match item.status {
            ItemStatus::Pending => {
                return Err(AppError::InvalidInput(
                    "Item has not been analyzed".to_string(),
                ))
            }
            ItemStatus::Processed => return Err(already_processed()),
            ItemStatus::Analyzed => {}
        }
        let chosen = item
            .recommendations
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|r| r.action == action)
            .cloned()
            .ok_or_else(|| {
                AppError::InvalidInput(format!("No {} recommendation for this item", action))
            })?;

        // Claim the item first so only one caller can record a transaction for it
        let mut processed = item.clone();
        processed.status = ItemStatus::Processed;
        self.write_back(processed, ItemStatus::Analyzed).await?;

        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            user_id: session.user_id().to_string(),
            product_name: item.name.clone(),
            action,
            carbon_saved: chosen.carbon_saved,
            reward_points: chosen.reward_points,
            status: STATUS_COMPLETED.to_string(),
            date: Utc::now(),
        };
        if let Err(e) = self.transactions.insert(transaction.clone()).await {
            if let Err(revert) = self.items.update(item, ItemStatus::Processed).await {
                tracing::error!("Failed to release item {} after error: {}", id, revert);
            }
            return Err(e);
        }

        tracing::info!(
            "Item {} processed via {}: {} kg CO2, {} points",
            id,
            action,
            transaction.carbon_saved,
            transaction.reward_points
        );
        Ok(transaction)
    }

    /// Stores `item` if its status is still `expected`.
    async fn write_back(&self, item: Item, expected: ItemStatus) -> AppResult<Item> {
        let (owner, id) = (item.user_id.clone(), item.id.clone());
        if let Some(stored) = self.items.update(item, expected).await? {
            return Ok(stored);
        }
        match self.items.get_for_owner(&owner, &id).await? {
            Some(current) if current.status == ItemStatus::Processed => Err(already_processed()),
            Some(_) => Err(AppError::Conflict(
                "Item was changed concurrently".to_string(),
            )),
            None => Err(not_found()),
        }
    }

    pub async fn transactions(&self, session: &Session) -> AppResult<Vec<Transaction>> {
        self.transactions.list_for_owner(session.user_id()).await
    }

    pub async fn stats(&self, session: &Session) -> AppResult<UserStats> {
        Ok(stats::compute(&self.list(session).await?))
    }

    pub async fn export_csv(&self, session: &Session) -> AppResult<String> {
        Ok(export::to_csv(&self.list(session).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{is_well_formed, Category, Condition, Role, User};
    use crate::storage::LocalStore;

    fn session(user_id: &str) -> Session {
        Session {
            id: format!("session-{}", user_id),
            user: User {
                id: user_id.to_string(),
                name: user_id.to_string(),
                email: format!("{}@example.com", user_id),
                role: Role::Consumer,
                location: None,
                created_at: Utc::now(),
            },
        }
    }

    fn inventory() -> Inventory {
        let stores = Stores::from_backend(LocalStore::in_memory());
        Inventory::new(&stores, Arc::new(RecommendationEngine::offline()))
    }

    #[tokio::test]
    async fn test_create_then_get_fills_defaults() {
        let inv = inventory();
        let alice = session("alice");
        let created = inv.create(&alice, ItemDraft::default()).await.unwrap();
        let fetched = inv.get(&alice, &created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "Unknown Item");
        assert_eq!(fetched.category, Category::Electronics);
        assert_eq!(fetched.condition, Condition::Good);
        assert_eq!(fetched.age, "1-2 years");
        assert_eq!(fetched.market_value, 0.0);
        assert_eq!(fetched.status, ItemStatus::Pending);
        assert_eq!(fetched.user_id, "alice");
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_caller() {
        let inv = inventory();
        let item = inv.create(&session("alice"), ItemDraft::default()).await.unwrap();
        let err = inv.get(&session("mallory"), &item.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_merges_and_reports_missing() {
        let inv = inventory();
        let alice = session("alice");
        let item = inv
            .create(
                &alice,
                ItemDraft {
                    name: Some("Sofa".into()),
                    category: Some(Category::Furniture),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = inv
            .update(
                &alice,
                &item.id,
                ItemPatch {
                    market_value: Some(80.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Sofa");
        assert_eq!(updated.category, Category::Furniture);
        assert_eq!(updated.market_value, 80.0);

        let err = inv
            .update(&alice, "missing", ItemPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "Item not found"));
    }

    #[tokio::test]
    async fn test_negative_market_value_rejected() {
        let inv = inventory();
        let err = inv
            .create(
                &session("alice"),
                ItemDraft {
                    market_value: Some(-1.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_then_list_and_missing_delete() {
        let inv = inventory();
        let alice = session("alice");
        let keep = inv.create(&alice, ItemDraft::default()).await.unwrap();
        let gone = inv.create(&alice, ItemDraft::default()).await.unwrap();

        inv.delete(&alice, &gone.id).await.unwrap();
        inv.delete(&alice, "does-not-exist").await.unwrap();
        inv.delete(&session("mallory"), &keep.id).await.unwrap();

        let ids: Vec<_> = inv
            .list(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[tokio::test]
    async fn test_analyze_attaches_sorted_recommendations() {
        let inv = inventory();
        let alice = session("alice");
        let item = inv
            .create(
                &alice,
                ItemDraft {
                    market_value: Some(200.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let recs = inv.analyze(&alice, &item.id).await.unwrap();
        assert!(is_well_formed(&recs));

        let stored = inv.get(&alice, &item.id).await.unwrap();
        assert_eq!(stored.status, ItemStatus::Analyzed);
        assert_eq!(stored.recommendations.as_deref(), Some(recs.as_slice()));

        // Re-analysis replaces the whole list
        inv.analyze(&alice, &item.id).await.unwrap();
        let again = inv.get(&alice, &item.id).await.unwrap();
        assert_eq!(again.recommendations.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_update_rejects_malformed_recommendations() {
        let inv = inventory();
        let alice = session("alice");
        let item = inv.create(&alice, ItemDraft::default()).await.unwrap();
        let err = inv
            .update(
                &alice,
                &item.id,
                ItemPatch {
                    recommendations: Some(Vec::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_process_records_transaction() {
        let inv = inventory();
        let alice = session("alice");
        let item = inv.create(&alice, ItemDraft::default()).await.unwrap();

        let err = inv
            .process(&alice, &item.id, ActionKind::Repair)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        inv.analyze(&alice, &item.id).await.unwrap();
        let tx = inv
            .process(&alice, &item.id, ActionKind::Repair)
            .await
            .unwrap();
        assert_eq!(tx.action, ActionKind::Repair);
        assert_eq!(tx.carbon_saved, 138.0);
        assert_eq!(tx.reward_points, 2070);
        assert_eq!(tx.product_name, "Unknown Item");

        let stored = inv.get(&alice, &item.id).await.unwrap();
        assert_eq!(stored.status, ItemStatus::Processed);
        assert_eq!(inv.transactions(&alice).await.unwrap(), vec![tx]);
        assert!(inv.transactions(&session("bob")).await.unwrap().is_empty());

        let again = inv.process(&alice, &item.id, ActionKind::Reuse).await;
        assert!(matches!(again, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_status_only_moves_forward() {
        let inv = inventory();
        let alice = session("alice");
        let item = inv.create(&alice, ItemDraft::default()).await.unwrap();

        // Editing a pending item cannot skip analysis
        let edited = inv
            .update(
                &alice,
                &item.id,
                ItemPatch {
                    name: Some("Kettle".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.status, ItemStatus::Pending);
        assert!(inv.process(&alice, &item.id, ActionKind::Resale).await.is_err());

        inv.analyze(&alice, &item.id).await.unwrap();
        inv.process(&alice, &item.id, ActionKind::Resale)
            .await
            .unwrap();

        // A processed item can be neither re-analyzed nor processed again
        let err = inv.analyze(&alice, &item.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref msg) if msg == "Item already processed"));

        let edited = inv
            .update(
                &alice,
                &item.id,
                ItemPatch {
                    name: Some("Old kettle".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.status, ItemStatus::Processed);

        let recs = edited.recommendations.clone().unwrap();
        let err = inv
            .update(
                &alice,
                &item.id,
                ItemPatch {
                    recommendations: Some(recs),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        assert!(inv.process(&alice, &item.id, ActionKind::Resale).await.is_err());
        assert_eq!(inv.transactions(&alice).await.unwrap().len(), 1);
        assert_eq!(inv.stats(&alice).await.unwrap().rewards_earned, 2160);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_process_records_one_transaction() {
        let inv = Arc::new(inventory());
        let alice = session("alice");
        let item = inv.create(&alice, ItemDraft::default()).await.unwrap();
        inv.analyze(&alice, &item.id).await.unwrap();

        let handles: Vec<_> = [ActionKind::Resale, ActionKind::Repair, ActionKind::Reuse]
            .into_iter()
            .map(|action| {
                let inv = inv.clone();
                let alice = alice.clone();
                let id = item.id.clone();
                tokio::spawn(async move { inv.process(&alice, &id, action).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 1);
        assert_eq!(inv.transactions(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stats_and_export_cover_callers_items() {
        let inv = inventory();
        let alice = session("alice");
        let analyzed = inv.create(&alice, ItemDraft::default()).await.unwrap();
        inv.create(&alice, ItemDraft::default()).await.unwrap();
        inv.analyze(&alice, &analyzed.id).await.unwrap();

        let stats = inv.stats(&alice).await.unwrap();
        assert_eq!(stats.items_processed, 1);
        assert_eq!(stats.carbon_saved, 144.0);
        assert_eq!(stats.rewards_earned, 2160);
        assert_eq!(stats.breakdown.resale, 1);

        let csv = inv.export_csv(&alice).await.unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(inv.stats(&session("bob")).await.unwrap().total_actions == 0);
    }
}
