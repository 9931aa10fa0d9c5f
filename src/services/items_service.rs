use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use tonic::{Request, Response, Status};

use super::auth_service::get_session;
use crate::export::export_file_name;
use crate::inventory::Inventory;
use crate::models::{
    ActionKind, Item as ItemModel, ItemDraft, ItemPatch, Recommendation as RecommendationModel,
    Transaction as TransactionModel, UserStats,
};
use crate::proto::common::Empty;
use crate::proto::items::items_service_server::ItemsService;
use crate::proto::items::{
    AnalyzeItemRes, CreateItemReq, ExportCsvRes, Item, ItemIdReq, ItemRes, ListItemsRes,
    ListTransactionsRes, ProcessItemReq, Recommendation, StatsRes, Transaction, TransactionRes,
    UpdateItemReq,
};

pub struct ItemsServiceImpl {
    inventory: Arc<Inventory>,
}

impl ItemsServiceImpl {
    pub fn new(inventory: Arc<Inventory>) -> Self {
        Self { inventory }
    }
}

/// Parses an optional enum field, rejecting unknown values.
fn parse_field<T>(field: &str, value: Option<String>) -> Result<Option<T>, Status>
where
    T: FromStr<Err = String>,
{
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| Status::invalid_argument(format!("{}: {}", field, e)))
        })
        .transpose()
}

fn require_id(id: &str) -> Result<&str, Status> {
    if id.trim().is_empty() {
        return Err(Status::invalid_argument("id is required"));
    }
    Ok(id)
}

fn recommendation_to_proto(rec: &RecommendationModel) -> Recommendation {
    Recommendation {
        action: rec.action.to_string(),
        score: rec.score,
        carbon_saved: rec.carbon_saved,
        reward_points: rec.reward_points,
        reasoning: rec.reasoning.clone(),
    }
}

fn item_to_proto(model: &ItemModel) -> Item {
    Item {
        id: model.id.clone(),
        user_id: model.user_id.clone(),
        category: model.category.to_string(),
        name: model.name.clone(),
        description: model.description.clone(),
        condition: model.condition.to_string(),
        age: model.age.clone(),
        market_value: model.market_value,
        status: model.status.to_string(),
        created_at: model.created_at.to_rfc3339(),
        recommendations: model
            .recommendations
            .iter()
            .flatten()
            .map(recommendation_to_proto)
            .collect(),
    }
}

fn transaction_to_proto(model: &TransactionModel) -> Transaction {
    Transaction {
        id: model.id.clone(),
        product_name: model.product_name.clone(),
        action: model.action.to_string(),
        carbon_saved: model.carbon_saved,
        reward_points: model.reward_points,
        status: model.status.clone(),
        date: model.date.to_rfc3339(),
    }
}

fn stats_to_proto(stats: &UserStats) -> StatsRes {
    StatsRes {
        total_actions: stats.total_actions,
        carbon_saved: stats.carbon_saved,
        rewards_earned: stats.rewards_earned,
        items_processed: stats.items_processed,
        breakdown: stats
            .breakdown
            .iter()
            .map(|(kind, count)| (kind.key().to_string(), count))
            .collect(),
    }
}

#[tonic::async_trait]
impl ItemsService for ItemsServiceImpl {
    async fn list_items(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<ListItemsRes>, Status> {
        let session = get_session(&request)?;
        let items = self.inventory.list(&session).await?;
        Ok(Response::new(ListItemsRes {
            items: items.iter().map(item_to_proto).collect(),
        }))
    }

    async fn get_item(&self, request: Request<ItemIdReq>) -> Result<Response<ItemRes>, Status> {
        let session = get_session(&request)?;
        let req = request.into_inner();
        let item = self.inventory.get(&session, require_id(&req.id)?).await?;
        Ok(Response::new(ItemRes {
            item: Some(item_to_proto(&item)),
        }))
    }

    async fn create_item(
        &self,
        request: Request<CreateItemReq>,
    ) -> Result<Response<ItemRes>, Status> {
        let session = get_session(&request)?;
        let req = request.into_inner();
        let draft = ItemDraft {
            name: req.name,
            category: parse_field("category", req.category)?,
            description: req.description,
            condition: parse_field("condition", req.condition)?,
            age: req.age,
            market_value: req.market_value,
        };
        let item = self.inventory.create(&session, draft).await?;
        Ok(Response::new(ItemRes {
            item: Some(item_to_proto(&item)),
        }))
    }

    async fn update_item(
        &self,
        request: Request<UpdateItemReq>,
    ) -> Result<Response<ItemRes>, Status> {
        let session = get_session(&request)?;
        let req = request.into_inner();
        let patch = ItemPatch {
            name: req.name,
            category: parse_field("category", req.category)?,
            description: req.description,
            condition: parse_field("condition", req.condition)?,
            age: req.age,
            market_value: req.market_value,
            recommendations: None,
        };
        let item = self
            .inventory
            .update(&session, require_id(&req.id)?, patch)
            .await?;
        Ok(Response::new(ItemRes {
            item: Some(item_to_proto(&item)),
        }))
    }

    async fn delete_item(&self, request: Request<ItemIdReq>) -> Result<Response<Empty>, Status> {
        let session = get_session(&request)?;
        let req = request.into_inner();
        self.inventory.delete(&session, require_id(&req.id)?).await?;
        Ok(Response::new(Empty {}))
    }

    async fn analyze_item(
        &self,
        request: Request<ItemIdReq>,
    ) -> Result<Response<AnalyzeItemRes>, Status> {
        let session = get_session(&request)?;
        let req = request.into_inner();
        let recommendations = self.inventory.analyze(&session, require_id(&req.id)?).await?;
        Ok(Response::new(AnalyzeItemRes {
            recommendations: recommendations.iter().map(recommendation_to_proto).collect(),
        }))
    }

    async fn process_item(
        &self,
        request: Request<ProcessItemReq>,
    ) -> Result<Response<TransactionRes>, Status> {
        let session = get_session(&request)?;
        let req = request.into_inner();
        let action: ActionKind = req
            .action
            .parse()
            .map_err(|e: String| Status::invalid_argument(format!("action: {}", e)))?;
        let transaction = self
            .inventory
            .process(&session, require_id(&req.id)?, action)
            .await?;
        Ok(Response::new(TransactionRes {
            transaction: Some(transaction_to_proto(&transaction)),
        }))
    }

    async fn list_transactions(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<ListTransactionsRes>, Status> {
        let session = get_session(&request)?;
        let transactions = self.inventory.transactions(&session).await?;
        Ok(Response::new(ListTransactionsRes {
            transactions: transactions.iter().map(transaction_to_proto).collect(),
        }))
    }

    async fn get_stats(&self, request: Request<Empty>) -> Result<Response<StatsRes>, Status> {
        let session = get_session(&request)?;
        let stats = self.inventory.stats(&session).await?;
        Ok(Response::new(stats_to_proto(&stats)))
    }

    async fn export_csv(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<ExportCsvRes>, Status> {
        let session = get_session(&request)?;
        let content = self.inventory.export_csv(&session).await?;
        Ok(Response::new(ExportCsvRes {
            file_name: export_file_name(Utc::now().date_naive()),
            content,
        }))
    }
}
