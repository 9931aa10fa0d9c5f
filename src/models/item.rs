use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use super::recommendation::Recommendation;

pub const DEFAULT_ITEM_NAME: &str = "Unknown Item";
pub const DEFAULT_AGE: &str = "1-2 years";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Electronics,
    Furniture,
    Clothing,
    Appliances,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Electronics,
        Category::Furniture,
        Category::Clothing,
        Category::Appliances,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Furniture => "Furniture",
            Category::Clothing => "Clothing",
            Category::Appliances => "Appliances",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[default]
    Good,
    Fair,
    Damaged,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::Damaged => "damaged",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(Condition::Good),
            "fair" => Ok(Condition::Fair),
            "damaged" => Ok(Condition::Damaged),
            _ => Err(format!("unknown condition '{}'", s)),
        }
    }
}

/// Lifecycle: pending -> analyzed -> processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Analyzed,
    Processed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Analyzed => "analyzed",
            ItemStatus::Processed => "processed",
        }
    }

    /// Analyzed and processed items count towards impact stats.
    pub fn counts_as_action(&self) -> bool {
        matches!(self, ItemStatus::Analyzed | ItemStatus::Processed)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ItemStatus::Pending),
            "analyzed" => Ok(ItemStatus::Analyzed),
            "processed" => Ok(ItemStatus::Processed),
            _ => Err(format!("unknown status '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub name: String,
    pub description: String,
    pub condition: Condition,
    pub age: String,
    pub market_value: f64,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
}

impl Item {
    /// Builds a new pending item, filling every omitted field with its default.
    pub fn from_draft(id: String, user_id: String, draft: ItemDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            category: draft.category.unwrap_or_default(),
            name: draft.name.unwrap_or_else(|| DEFAULT_ITEM_NAME.to_string()),
            description: draft.description.unwrap_or_default(),
            condition: draft.condition.unwrap_or_default(),
            age: draft.age.unwrap_or_else(|| DEFAULT_AGE.to_string()),
            market_value: draft.market_value.unwrap_or(0.0),
            status: ItemStatus::Pending,
            created_at: now,
            recommendations: None,
        }
    }

    /// Merges the fields present in `patch`.
    pub fn apply(&mut self, patch: ItemPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(condition) = patch.condition {
            self.condition = condition;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(market_value) = patch.market_value {
            self.market_value = market_value;
        }
        if let Some(recommendations) = patch.recommendations {
            self.recommendations = Some(recommendations);
        }
    }

    /// Highest-scoring recommendation, if the item has been analyzed.
    pub fn top_recommendation(&self) -> Option<&Recommendation> {
        self.recommendations.as_ref().and_then(|recs| recs.first())
    }
}

/// Fields supplied when creating an item. Anything left `None` takes its default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub condition: Option<Condition>,
    pub age: Option<String>,
    pub market_value: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub condition: Option<Condition>,
    pub age: Option<String>,
    pub market_value: Option<f64>,
    pub recommendations: Option<Vec<Recommendation>>,
}

/// Row of the `products` table. `category` is selected as `type AS category`.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub category: String,
    pub name: String,
    pub description: Option<String>,
    pub condition: String,
    pub age: Option<String>,
    pub market_value: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub recommendations: Option<Json<Vec<Recommendation>>>,
}

impl TryFrom<ProductRow> for Item {
    type Error = String;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Item {
            id: row.id.to_string(),
            user_id: row.user_id.to_string(),
            category: row.category.parse()?,
            name: row.name,
            description: row.description.unwrap_or_default(),
            condition: row.condition.parse()?,
            age: row.age.unwrap_or_else(|| DEFAULT_AGE.to_string()),
            market_value: row.market_value,
            status: row.status.parse()?,
            created_at: row.created_at,
            recommendations: row.recommendations.map(|Json(recs)| recs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_draft_fills_defaults() {
        let now = Utc::now();
        let item = Item::from_draft("i1".into(), "u1".into(), ItemDraft::default(), now);
        assert_eq!(item.name, DEFAULT_ITEM_NAME);
        assert_eq!(item.category, Category::Electronics);
        assert_eq!(item.description, "");
        assert_eq!(item.condition, Condition::Good);
        assert_eq!(item.age, DEFAULT_AGE);
        assert_eq!(item.market_value, 0.0);
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.created_at, now);
        assert!(item.recommendations.is_none());
    }

    #[test]
    fn test_apply_merges_only_present_fields() {
        let mut item = Item::from_draft(
            "i1".into(),
            "u1".into(),
            ItemDraft {
                name: Some("Laptop".into()),
                market_value: Some(200.0),
                ..Default::default()
            },
            Utc::now(),
        );
        item.apply(ItemPatch {
            condition: Some(Condition::Damaged),
            ..Default::default()
        });
        assert_eq!(item.name, "Laptop");
        assert_eq!(item.market_value, 200.0);
        assert_eq!(item.condition, Condition::Damaged);
    }

    #[test]
    fn test_item_json_uses_browser_field_names() {
        let item = Item::from_draft("i1".into(), "u1".into(), ItemDraft::default(), Utc::now());
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "Electronics");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["condition"], "good");
        assert_eq!(value["status"], "pending");
        assert!(value.get("recommendations").is_none());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("furniture".parse::<Category>().unwrap(), Category::Furniture);
        assert!("Toys".parse::<Category>().is_err());
        assert_eq!("Fair".parse::<Condition>().unwrap(), Condition::Fair);
        assert_eq!("processed".parse::<ItemStatus>().unwrap(), ItemStatus::Processed);
    }
}
