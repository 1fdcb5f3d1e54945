//! Bot configuration.

use crate::dice::DiceLimits;
use serde::{Deserialize, Serialize};

/// Read-only configuration the core is constructed with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bounds for dice expressions, standalone and embedded alike.
    pub limits: DiceLimits,
    /// Canonical help keyword, also the fallback for empty triggers.
    pub help_keyword: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            limits: DiceLimits::default(),
            help_keyword: "도움말".to_string(),
        }
    }
}

impl BotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the environment, falling back to defaults.
    ///
    /// Honors `BOT_MAX_DICE_COUNT` and `BOT_MAX_DICE_SIDES`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(max) = env_u32("BOT_MAX_DICE_COUNT") {
            config.limits.max_count = max;
        }
        if let Some(max) = env_u32("BOT_MAX_DICE_SIDES") {
            config.limits.max_sides = max;
        }
        config
    }

    /// Set the dice limits.
    pub fn with_limits(mut self, limits: DiceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the help keyword.
    pub fn with_help_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.help_keyword = keyword.into();
        self
    }
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok()?.trim().parse().ok()
}
