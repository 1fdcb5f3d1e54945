//! Command resolution for normalized trigger keywords.
//!
//! Resolution runs a fixed ladder of strategies: the canonical keyword
//! table first (system commands can never be shadowed), then bare dice
//! notation (so `[2d6]` works without the 다이스 keyword), then the
//! user-defined custom keywords, and finally "no match". Each rung
//! carries a fixed confidence so the tie-break policy is data, not
//! control flow.

use crate::dice::DiceExpression;
use crate::store::TemplateStore;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Logical commands the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Dice,
    Card,
    Fortune,
    Help,
    Custom,
    Money,
    Inventory,
    Shop,
    Buy,
    Transfer,
    MoneyTransfer,
    ItemDescription,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Dice => "dice",
            CommandKind::Card => "card",
            CommandKind::Fortune => "fortune",
            CommandKind::Help => "help",
            CommandKind::Custom => "custom",
            CommandKind::Money => "money",
            CommandKind::Inventory => "inventory",
            CommandKind::Shop => "shop",
            CommandKind::Buy => "buy",
            CommandKind::Transfer => "transfer",
            CommandKind::MoneyTransfer => "money_transfer",
            CommandKind::ItemDescription => "item_description",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

lazy_static! {
    /// Canonical keyword and alias table for system commands.
    pub static ref COMMAND_TABLE: HashMap<&'static str, CommandKind> = {
        let mut table = HashMap::new();

        table.insert("다이스", CommandKind::Dice);
        table.insert("d", CommandKind::Dice);

        table.insert("카드뽑기", CommandKind::Card);
        table.insert("카드", CommandKind::Card);
        table.insert("card", CommandKind::Card);

        table.insert("운세", CommandKind::Fortune);
        table.insert("fortune", CommandKind::Fortune);

        table.insert("도움말", CommandKind::Help);
        table.insert("help", CommandKind::Help);

        table.insert("소지금", CommandKind::Money);
        table.insert("돈", CommandKind::Money);
        table.insert("재화", CommandKind::Money);
        table.insert("금액", CommandKind::Money);
        table.insert("money", CommandKind::Money);

        table.insert("인벤토리", CommandKind::Inventory);
        table.insert("소지품", CommandKind::Inventory);
        table.insert("가방", CommandKind::Inventory);
        table.insert("아이템", CommandKind::Inventory);
        table.insert("inventory", CommandKind::Inventory);
        table.insert("inv", CommandKind::Inventory);

        table.insert("상점", CommandKind::Shop);
        table.insert("가게", CommandKind::Shop);
        table.insert("상가", CommandKind::Shop);
        table.insert("shop", CommandKind::Shop);
        table.insert("store", CommandKind::Shop);

        table.insert("구매", CommandKind::Buy);
        table.insert("구입", CommandKind::Buy);
        table.insert("사기", CommandKind::Buy);
        table.insert("buy", CommandKind::Buy);
        table.insert("purchase", CommandKind::Buy);

        table.insert("양도", CommandKind::Transfer);
        table.insert("전달", CommandKind::Transfer);
        table.insert("주기", CommandKind::Transfer);
        table.insert("넘기기", CommandKind::Transfer);
        table.insert("transfer", CommandKind::Transfer);
        table.insert("give", CommandKind::Transfer);

        table.insert("송금", CommandKind::MoneyTransfer);
        table.insert("돈주기", CommandKind::MoneyTransfer);
        table.insert("재화양도", CommandKind::MoneyTransfer);
        table.insert("send_money", CommandKind::MoneyTransfer);
        table.insert("money_transfer", CommandKind::MoneyTransfer);

        table.insert("설명", CommandKind::ItemDescription);
        table.insert("정보", CommandKind::ItemDescription);
        table.insert("상세", CommandKind::ItemDescription);
        table.insert("info", CommandKind::ItemDescription);
        table.insert("desc", CommandKind::ItemDescription);
        table.insert("description", CommandKind::ItemDescription);

        table
    };
}

/// Confidence assigned by each strategy.
pub const EXACT_CONFIDENCE: f64 = 1.0;
pub const DICE_CONFIDENCE: f64 = 0.9;
pub const CUSTOM_CONFIDENCE: f64 = 0.8;

/// Result of resolving one trigger keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMatch {
    /// `None` encodes "no match"; resolution itself never fails.
    pub command: Option<CommandKind>,
    pub confidence: f64,
    pub matched_keyword: String,
    pub is_exact_match: bool,
}

impl CommandMatch {
    fn no_match(keyword: &str) -> Self {
        Self {
            command: None,
            confidence: 0.0,
            matched_keyword: keyword.to_string(),
            is_exact_match: false,
        }
    }
}

/// Resolution strategies, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    ExactTable,
    DiceNotation,
    CustomKeyword,
}

const STRATEGIES: [Strategy; 3] = [
    Strategy::ExactTable,
    Strategy::DiceNotation,
    Strategy::CustomKeyword,
];

/// Resolve a normalized first keyword to a command.
///
/// Total over all inputs: a failing custom-keyword store reads as "not
/// found" and the ladder falls through to no-match.
pub fn resolve(first_keyword: &str, store: &dyn TemplateStore) -> CommandMatch {
    let keyword = first_keyword.trim().to_lowercase();
    for strategy in STRATEGIES {
        if let Some(matched) = apply(strategy, &keyword, store) {
            debug!(
                keyword = keyword.as_str(),
                ?strategy,
                confidence = matched.confidence,
                "command resolved"
            );
            return matched;
        }
    }
    debug!(keyword = keyword.as_str(), "no command matched");
    CommandMatch::no_match(&keyword)
}

fn apply(strategy: Strategy, keyword: &str, store: &dyn TemplateStore) -> Option<CommandMatch> {
    match strategy {
        Strategy::ExactTable => COMMAND_TABLE.get(keyword).map(|kind| CommandMatch {
            command: Some(*kind),
            confidence: EXACT_CONFIDENCE,
            matched_keyword: keyword.to_string(),
            is_exact_match: true,
        }),
        Strategy::DiceNotation => {
            DiceExpression::matches_notation(keyword).then(|| CommandMatch {
                command: Some(CommandKind::Dice),
                confidence: DICE_CONFIDENCE,
                matched_keyword: keyword.to_string(),
                is_exact_match: false,
            })
        }
        Strategy::CustomKeyword => {
            // System keywords are never shadowed by custom commands.
            if COMMAND_TABLE.contains_key(keyword) {
                return None;
            }
            let known = match store.known_custom_keywords() {
                Ok(known) => known,
                Err(err) => {
                    warn!(keyword, %err, "custom keyword lookup failed, treating as not found");
                    return None;
                }
            };
            known.contains(keyword).then(|| CommandMatch {
                command: Some(CommandKind::Custom),
                confidence: CUSTOM_CONFIDENCE,
                matched_keyword: keyword.to_string(),
                is_exact_match: false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingStore, InMemoryTemplates};

    fn store_with(keyword: &str) -> InMemoryTemplates {
        let mut store = InMemoryTemplates::new();
        store.insert(keyword, vec!["문구".to_string()]);
        store
    }

    #[test]
    fn test_exact_table_lookup() {
        let store = InMemoryTemplates::new();
        let matched = resolve("다이스", &store);
        assert_eq!(matched.command, Some(CommandKind::Dice));
        assert_eq!(matched.confidence, EXACT_CONFIDENCE);
        assert!(matched.is_exact_match);
    }

    #[test]
    fn test_exact_lookup_is_case_insensitive() {
        let store = InMemoryTemplates::new();
        let matched = resolve("Card", &store);
        assert_eq!(matched.command, Some(CommandKind::Card));
        assert!(matched.is_exact_match);
    }

    #[test]
    fn test_dice_auto_detection() {
        let store = InMemoryTemplates::new();
        let matched = resolve("2d6", &store);
        assert_eq!(matched.command, Some(CommandKind::Dice));
        assert_eq!(matched.confidence, DICE_CONFIDENCE);
        assert!(!matched.is_exact_match);
    }

    #[test]
    fn test_dice_auto_detection_ignores_limits() {
        // Routing sees only syntax; the dice command reports the range error.
        let store = InMemoryTemplates::new();
        let matched = resolve("9999d6", &store);
        assert_eq!(matched.command, Some(CommandKind::Dice));
    }

    #[test]
    fn test_custom_keyword_lookup() {
        let store = store_with("점수");
        let matched = resolve("점수", &store);
        assert_eq!(matched.command, Some(CommandKind::Custom));
        assert_eq!(matched.confidence, CUSTOM_CONFIDENCE);
        assert!(!matched.is_exact_match);
    }

    #[test]
    fn test_system_keyword_shadows_custom_and_dice() {
        // A keyword that is simultaneously a system keyword, dice
        // notation, and a custom keyword resolves as the system command.
        let store = store_with("d");
        let matched = resolve("d", &store);
        assert_eq!(matched.command, Some(CommandKind::Dice));
        assert_eq!(matched.confidence, EXACT_CONFIDENCE);
        assert!(matched.is_exact_match);
    }

    #[test]
    fn test_dice_notation_beats_custom() {
        let store = store_with("2d6");
        let matched = resolve("2d6", &store);
        assert_eq!(matched.command, Some(CommandKind::Dice));
        assert_eq!(matched.confidence, DICE_CONFIDENCE);
    }

    #[test]
    fn test_no_match() {
        let store = InMemoryTemplates::new();
        let matched = resolve("없는명령어", &store);
        assert_eq!(matched.command, None);
        assert_eq!(matched.confidence, 0.0);
        assert_eq!(matched.matched_keyword, "없는명령어");
    }

    #[test]
    fn test_store_failure_reads_as_not_found() {
        let matched = resolve("점수", &FailingStore);
        assert_eq!(matched.command, None);
        assert_eq!(matched.confidence, 0.0);
    }

    #[test]
    fn test_store_failure_does_not_hide_system_commands() {
        let matched = resolve("운세", &FailingStore);
        assert_eq!(matched.command, Some(CommandKind::Fortune));
    }
}
