//! Recommendation engine.
//!
//! `analyze` asks the hosted model first and falls back to the baseline table
//! on any failure. The result always holds one recommendation per action kind,
//! highest score first.

pub mod baseline;
pub mod fallback;
pub mod gemini;
pub mod prompt;

pub use baseline::Baseline;
pub use gemini::GeminiClient;

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::models::{sort_by_score, validate_set, Item, Recommendation};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model API key not configured")]
    NotConfigured,

    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model returned no content")]
    EmptyResponse,

    #[error("malformed model output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid recommendation set: {0}")]
    Invalid(String),
}

/// Text-generation backend constrained by a JSON response schema.
#[tonic::async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, ModelError>;
}

#[derive(Clone)]
pub struct RecommendationEngine {
    model: Option<Arc<dyn ModelClient>>,
}

impl RecommendationEngine {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model: Some(model) }
    }

    /// Engine without a model; every analysis uses the baseline fallback.
    pub fn offline() -> Self {
        Self { model: None }
    }

    pub async fn analyze(&self, item: &Item) -> Vec<Recommendation> {
        let baseline = Baseline::lookup(item.category.as_str());
        match self.ask_model(item, &baseline).await {
            Ok(recommendations) => recommendations,
            Err(e) => {
                tracing::warn!(
                    item_id = %item.id,
                    "Model analysis failed, using baseline fallback: {}",
                    e
                );
                fallback::recommend(&baseline)
            }
        }
    }

    async fn ask_model(
        &self,
        item: &Item,
        baseline: &Baseline,
    ) -> Result<Vec<Recommendation>, ModelError> {
        let model = self.model.as_ref().ok_or(ModelError::NotConfigured)?;
        let prompt = prompt::build_prompt(item, baseline);
        let text = model.generate(&prompt, &prompt::response_schema()).await?;
        parse_recommendations(&text)
    }
}

/// Parses and validates a model reply, returning it sorted by descending score.
pub fn parse_recommendations(text: &str) -> Result<Vec<Recommendation>, ModelError> {
    let mut recommendations: Vec<Recommendation> = serde_json::from_str(strip_fence(text))?;
    validate_set(&recommendations).map_err(ModelError::Invalid)?;
    sort_by_score(&mut recommendations);
    Ok(recommendations)
}

/// Removes a surrounding markdown code fence, if any.
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{is_well_formed, ActionKind, Category, ItemDraft};
    use chrono::Utc;

    struct StubModel(Result<String, ()>);

    #[tonic::async_trait]
    impl ModelClient for StubModel {
        async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<String, ModelError> {
            self.0.clone().map_err(|_| ModelError::EmptyResponse)
        }
    }

    fn laptop() -> Item {
        Item::from_draft(
            "i1".into(),
            "u1".into(),
            ItemDraft {
                name: Some("Laptop".into()),
                category: Some(Category::Electronics),
                market_value: Some(200.0),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    const MODEL_REPLY: &str = r#"[
        {"action":"Repair","score":0.91,"carbonSaved":138,"rewardPoints":2000,"reasoning":"fixable"},
        {"action":"Donation","score":0.4,"carbonSaved":142,"rewardPoints":1400,"reasoning":"ok"},
        {"action":"Resale","score":0.7,"carbonSaved":144,"rewardPoints":2100,"reasoning":"sells"},
        {"action":"Reuse","score":0.5,"carbonSaved":142,"rewardPoints":2000,"reasoning":"reuse"}
    ]"#;

    #[tokio::test]
    async fn test_model_reply_is_sorted() {
        let engine = RecommendationEngine::new(Arc::new(StubModel(Ok(MODEL_REPLY.into()))));
        let recs = engine.analyze(&laptop()).await;
        let order: Vec<_> = recs.iter().map(|r| r.action).collect();
        assert_eq!(
            order,
            vec![
                ActionKind::Repair,
                ActionKind::Resale,
                ActionKind::Reuse,
                ActionKind::Donation
            ]
        );
        assert_eq!(recs[0].score, 0.91);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back() {
        let engine = RecommendationEngine::new(Arc::new(StubModel(Err(()))));
        let recs = engine.analyze(&laptop()).await;
        let scores: Vec<_> = recs.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.82, 0.75, 0.65, 0.55]);
        let carbon: Vec<_> = recs.iter().map(|r| r.carbon_saved).collect();
        assert_eq!(carbon, vec![144.0, 138.0, 142.0, 142.0]);
    }

    #[tokio::test]
    async fn test_incomplete_reply_falls_back() {
        let partial = r#"[{"action":"Repair","score":0.9,"carbonSaved":1,"rewardPoints":1,"reasoning":""}]"#;
        let engine = RecommendationEngine::new(Arc::new(StubModel(Ok(partial.into()))));
        let recs = engine.analyze(&laptop()).await;
        assert!(is_well_formed(&recs));
        assert_eq!(recs[0].action, ActionKind::Resale);
        assert_eq!(recs[0].score, 0.82);
    }

    #[tokio::test]
    async fn test_garbage_reply_falls_back() {
        let engine = RecommendationEngine::new(Arc::new(StubModel(Ok("not json".into()))));
        let recs = engine.analyze(&laptop()).await;
        assert_eq!(recs.len(), 4);
        assert_eq!(recs[0].action, ActionKind::Resale);
    }

    #[tokio::test]
    async fn test_offline_engine_always_well_formed() {
        let engine = RecommendationEngine::offline();
        for category in Category::ALL {
            let mut item = laptop();
            item.category = category;
            let recs = engine.analyze(&item).await;
            assert!(is_well_formed(&recs));
            let baseline = Baseline::for_category(category);
            for rec in &recs {
                assert_eq!(rec.carbon_saved, baseline.new - baseline.path_cost(rec.action));
            }
        }
    }

    #[test]
    fn test_parse_accepts_fenced_reply() {
        let fenced = format!("```json\n{}\n```", MODEL_REPLY);
        let recs = parse_recommendations(&fenced).unwrap();
        assert_eq!(recs.len(), 4);
        assert!(matches!(
            parse_recommendations("[]"),
            Err(ModelError::Invalid(_))
        ));
    }
}
