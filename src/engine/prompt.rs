use serde_json::{json, Value};

use super::baseline::Baseline;
use crate::models::Item;

/// Natural-language request describing the item and the carbon reference figures.
pub fn build_prompt(item: &Item, baseline: &Baseline) -> String {
    let category = item.category.as_str();
    format!(
        r#"Act as the "EcoLoop Decision Intelligence Model".
Your task is to analyze a product's lifecycle and provide 4 specific circular economy recommendations: Repair, Reuse, Resale, and Donation.

Product Context:
- Name: {name}
- Category: {category}
- Condition: {condition}
- Age: {age}
- Market Value: ${value}
- Description: {description}

Carbon Calculation Reference (kg CO2):
- Production of a NEW {category}: {new}kg
- Impact of Repairing: {repair}kg
- Impact of Reusing/Donating: {reuse}kg
- Impact of Reselling: {resale}kg

Requirements:
1. Calculate "Carbon Saved" for each action by subtracting its impact from the "NEW" baseline.
2. Assign a "Suitability Score" (0.0 to 1.0) based on condition, age, and market value.
3. Assign "Reward Points" (roughly 15 points per kg of CO2 saved, adjusted by score).
4. Provide a technical reasoning string explaining why the score was assigned.

Return the data as a JSON array of recommendation objects, exactly one per action."#,
        name = item.name,
        category = category,
        condition = item.condition,
        age = item.age,
        value = item.market_value,
        description = item.description,
        new = baseline.new,
        repair = baseline.repair,
        reuse = baseline.reuse,
        resale = baseline.resale,
    )
}

/// Structured-output schema: an array of the five recommendation fields.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "action": {
                    "type": "STRING",
                    "description": "One of: Repair, Reuse, Resale, Donation"
                },
                "score": { "type": "NUMBER" },
                "carbonSaved": { "type": "NUMBER" },
                "rewardPoints": { "type": "INTEGER" },
                "reasoning": { "type": "STRING" }
            },
            "required": ["action", "score", "carbonSaved", "rewardPoints", "reasoning"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ItemDraft};
    use chrono::Utc;

    #[test]
    fn test_prompt_contains_item_and_baseline() {
        let item = Item::from_draft(
            "i1".into(),
            "u1".into(),
            ItemDraft {
                name: Some("Oak desk".into()),
                category: Some(Category::Furniture),
                market_value: Some(120.0),
                description: Some("Scratched top".into()),
                ..Default::default()
            },
            Utc::now(),
        );
        let prompt = build_prompt(&item, &Baseline::for_category(Category::Furniture));
        assert!(prompt.contains("- Name: Oak desk"));
        assert!(prompt.contains("- Category: Furniture"));
        assert!(prompt.contains("- Condition: good"));
        assert!(prompt.contains("- Market Value: $120"));
        assert!(prompt.contains("Production of a NEW Furniture: 250kg"));
        assert!(prompt.contains("Impact of Reselling: 10kg"));
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = response_schema();
        let required = schema["items"]["required"].as_array().unwrap();
        assert_eq!(required.len(), 5);
        assert_eq!(schema["type"], "ARRAY");
    }
}
