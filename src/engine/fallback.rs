use super::baseline::Baseline;
use crate::models::{sort_by_score, ActionKind, Recommendation};

struct Rule {
    action: ActionKind,
    score: f64,
    points_per_kg: f64,
    reasoning: &'static str,
}

const RULES: [Rule; 4] = [
    Rule {
        action: ActionKind::Resale,
        score: 0.82,
        points_per_kg: 15.0,
        reasoning: "High market value and good condition suggest a strong secondary market.",
    },
    Rule {
        action: ActionKind::Repair,
        score: 0.75,
        points_per_kg: 15.0,
        reasoning: "Repairing extends functional life significantly for this category.",
    },
    Rule {
        action: ActionKind::Reuse,
        score: 0.65,
        points_per_kg: 15.0,
        reasoning: "Functional item can be easily repurposed within the community.",
    },
    Rule {
        action: ActionKind::Donation,
        score: 0.55,
        points_per_kg: 10.0,
        reasoning: "Great social impact candidate if resale interest is low.",
    },
];

/// Deterministic recommendations computed from the baseline table alone.
pub fn recommend(baseline: &Baseline) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = RULES
        .iter()
        .map(|rule| {
            let carbon_saved = baseline.carbon_saved(rule.action);
            Recommendation {
                action: rule.action,
                score: rule.score,
                carbon_saved,
                reward_points: (carbon_saved * rule.points_per_kg).round().max(0.0) as u32,
                reasoning: rule.reasoning.to_string(),
            }
        })
        .collect();
    sort_by_score(&mut recommendations);
    recommendations
}
