use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Plan-gated features. Anything not listed here is a basic feature that every
/// plan includes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Feature {
    Analytics,
    PrioritySupport,
    AdvancedFilters,
}

impl Feature {
    /// Returns `None` for names that are not plan-gated.
    pub fn parse(name: &str) -> Option<Self> {
        name.trim().parse().ok()
    }
}
