use crate::models::{Item, UserStats};

/// Rounds to one decimal place.
fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Full rescan of a user's items. Only analyzed and processed items count, and
/// each contributes its highest-scoring recommendation.
pub fn compute(items: &[Item]) -> UserStats {
    let mut stats = UserStats::default();
    let mut carbon = 0.0;

    for item in items.iter().filter(|i| i.status.counts_as_action()) {
        stats.items_processed += 1;
        if let Some(best) = item.top_recommendation() {
            carbon += best.carbon_saved;
            stats.rewards_earned += u64::from(best.reward_points);
            stats.breakdown.increment(best.action);
        }
    }

    stats.total_actions = stats.items_processed;
    stats.carbon_saved = round_tenth(carbon);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionKind, ItemDraft, ItemStatus, Recommendation};
    use chrono::Utc;

    fn item(status: ItemStatus, top: Option<(ActionKind, f64, u32)>) -> Item {
        let mut item = Item::from_draft("i".into(), "u".into(), ItemDraft::default(), Utc::now());
        item.status = status;
        item.recommendations = top.map(|(action, carbon_saved, reward_points)| {
            vec![Recommendation {
                action,
                score: 0.9,
                carbon_saved,
                reward_points,
                reasoning: String::new(),
            }]
        });
        item
    }

    #[test]
    fn test_empty_stats() {
        let stats = compute(&[]);
        assert_eq!(stats, UserStats::default());
        assert!(stats.breakdown.iter().all(|(_, n)| n == 0));
    }

    #[test]
    fn test_only_analyzed_and_processed_count() {
        let items = vec![
            item(ItemStatus::Pending, Some((ActionKind::Repair, 100.0, 1500))),
            item(ItemStatus::Analyzed, Some((ActionKind::Resale, 144.0, 2160))),
            item(ItemStatus::Processed, Some((ActionKind::Repair, 18.25, 274))),
            item(ItemStatus::Analyzed, None),
        ];
        let stats = compute(&items);
        assert_eq!(stats.items_processed, 3);
        assert_eq!(stats.total_actions, 3);
        assert_eq!(stats.rewards_earned, 2434);
        assert_eq!(stats.carbon_saved, 162.3);
        assert_eq!(stats.breakdown.get(ActionKind::Resale), 1);
        assert_eq!(stats.breakdown.get(ActionKind::Repair), 1);
        assert_eq!(stats.breakdown.get(ActionKind::Donation), 0);
    }

    #[test]
    fn test_carbon_rounds_to_one_decimal() {
        let items = vec![
            item(ItemStatus::Analyzed, Some((ActionKind::Reuse, 0.14, 2))),
            item(ItemStatus::Analyzed, Some((ActionKind::Reuse, 0.14, 2))),
        ];
        assert_eq!(compute(&items).carbon_saved, 0.3);
    }
}
