//! Subscription tier definitions.
//!
//! Represents the box sizes a member can subscribe to for a cave.

use serde::{Deserialize, Serialize};

/// Subscription tier.
///
/// Determines how many bottles ship each billing cycle and how the box
/// is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// Entry tier - a taste of the cave.
    /// - 3 bottles per cycle
    Decouverte,

    /// Mid tier for regular drinkers.
    /// - 6 bottles per cycle
    Amateur,

    /// Full-case tier for collectors.
    /// - 12 bottles per cycle
    Prestige,
}

impl SubscriptionTier {
    /// Returns the number of bottles shipped each billing cycle.
    pub fn bottles_per_cycle(&self) -> u32 {
        match self {
            SubscriptionTier::Decouverte => 3,
            SubscriptionTier::Amateur => 6,
            SubscriptionTier::Prestige => 12,
        }
    }

    /// Returns the display name for this tier.
    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionTier::Decouverte => "Découverte",
            SubscriptionTier::Amateur => "Amateur",
            SubscriptionTier::Prestige => "Prestige",
        }
    }

    /// Returns the numeric rank of this tier for comparison.
    ///
    /// Higher rank = bigger box. Used for upgrade validation.
    pub fn rank(&self) -> u8 {
        match self {
            SubscriptionTier::Decouverte => 0,
            SubscriptionTier::Amateur => 1,
            SubscriptionTier::Prestige => 2,
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
