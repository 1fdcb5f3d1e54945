//! Command resolution and dice evaluation core for a Korean TRPG chat bot.
//!
//! Incoming messages carry a bracketed trigger like `[다이스/2d6]`,
//! `[2d6]`, or `[점수]`. This crate decides which command a trigger
//! names, evaluates the bot's dice notation, and fills user-authored
//! phrase templates containing embedded tokens like `{2d6+3}`.
//!
//! The transport layer, the spreadsheet-backed template store, and the
//! plugin loader live outside this crate; they plug in through the
//! traits in [`store`] and [`dispatch`].
//!
//! # Quick start
//!
//! ```
//! use dicebot_core::{BotConfig, Dispatcher};
//! use dicebot_core::testing::{InMemoryTemplates, ScriptedHandler};
//!
//! let mut store = InMemoryTemplates::new();
//! store.insert("점수", vec!["오늘의 점수는 {1d100}점입니다.".to_string()]);
//!
//! let dispatcher = Dispatcher::new(
//!     BotConfig::default(),
//!     Box::new(store),
//!     Box::new(ScriptedHandler::new(Vec::new())),
//! );
//!
//! let reply = dispatcher.dispatch(&["점수".to_string()]);
//! assert!(reply.starts_with("오늘의 점수는 "));
//! ```

pub mod config;
pub mod dice;
pub mod dispatch;
pub mod keyword;
pub mod router;
pub mod store;
pub mod template;
pub mod testing;
pub mod text;

// Primary public API
pub use config::BotConfig;
pub use dice::{DiceError, DiceExpression, DiceLimits, DieSource, RollOutcome, ThresholdKind};
pub use dispatch::{
    CommandHandler, CommandReply, Dispatcher, HandlerError, HandlerOutput, ReplyRecord,
};
pub use router::{CommandKind, CommandMatch};
pub use store::{PluginResolver, StoreError, TemplateStore};
pub use template::{substitute, substitute_with, SubstitutionResult};
