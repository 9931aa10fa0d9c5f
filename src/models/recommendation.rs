use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Circular action that keeps an item out of landfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(alias = "repair", alias = "REPAIR")]
    Repair,
    #[serde(alias = "reuse", alias = "REUSE")]
    Reuse,
    #[serde(alias = "resale", alias = "RESALE")]
    Resale,
    #[serde(alias = "donation", alias = "DONATION")]
    Donation,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Repair,
        ActionKind::Reuse,
        ActionKind::Resale,
        ActionKind::Donation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Repair => "Repair",
            ActionKind::Reuse => "Reuse",
            ActionKind::Resale => "Resale",
            ActionKind::Donation => "Donation",
        }
    }

    /// Lowercase key used in stats breakdowns.
    pub fn key(&self) -> &'static str {
        match self {
            ActionKind::Repair => "repair",
            ActionKind::Reuse => "reuse",
            ActionKind::Resale => "resale",
            ActionKind::Donation => "donation",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown action '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub action: ActionKind,
    /// Suitability in [0, 1].
    pub score: f64,
    /// kg CO2 avoided compared to buying new.
    pub carbon_saved: f64,
    pub reward_points: u32,
    pub reasoning: String,
}

/// Orders by non-increasing score. Ties keep their input order.
pub fn sort_by_score(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Checks that a set holds exactly one well-formed entry per action kind.
pub fn validate_set(recommendations: &[Recommendation]) -> Result<(), String> {
    if recommendations.len() != ActionKind::ALL.len() {
        return Err(format!(
            "expected {} recommendations, got {}",
            ActionKind::ALL.len(),
            recommendations.len()
        ));
    }
    for kind in ActionKind::ALL {
        let count = recommendations.iter().filter(|r| r.action == kind).count();
        if count != 1 {
            return Err(format!("expected one {} recommendation, got {}", kind, count));
        }
    }
    for rec in recommendations {
        if !rec.score.is_finite() || !(0.0..=1.0).contains(&rec.score) {
            return Err(format!("{} score {} outside [0, 1]", rec.action, rec.score));
        }
        if !rec.carbon_saved.is_finite() || rec.carbon_saved < 0.0 {
            return Err(format!(
                "{} carbon saved {} is negative",
                rec.action, rec.carbon_saved
            ));
        }
    }
    Ok(())
}

/// True when the list is sorted and holds one entry per action kind.
pub fn is_well_formed(recommendations: &[Recommendation]) -> bool {
    validate_set(recommendations).is_ok()
        && recommendations.windows(2).all(|w| w[0].score >= w[1].score)
}
