use serde::{Deserialize, Serialize};

use super::recommendation::ActionKind;

/// Count of top recommendations per action kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBreakdown {
    pub repair: u64,
    pub reuse: u64,
    pub resale: u64,
    pub donation: u64,
}

impl ActionBreakdown {
    pub fn increment(&mut self, action: ActionKind) {
        *self.slot_mut(action) += 1;
    }

    pub fn get(&self, action: ActionKind) -> u64 {
        match action {
            ActionKind::Repair => self.repair,
            ActionKind::Reuse => self.reuse,
            ActionKind::Resale => self.resale,
            ActionKind::Donation => self.donation,
        }
    }

    fn slot_mut(&mut self, action: ActionKind) -> &mut u64 {
        match action {
            ActionKind::Repair => &mut self.repair,
            ActionKind::Reuse => &mut self.reuse,
            ActionKind::Resale => &mut self.resale,
            ActionKind::Donation => &mut self.donation,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionKind, u64)> + '_ {
        ActionKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_actions: u64,
    /// kg CO2, rounded to one decimal place.
    pub carbon_saved: f64,
    pub rewards_earned: u64,
    pub items_processed: u64,
    pub breakdown: ActionBreakdown,
}
