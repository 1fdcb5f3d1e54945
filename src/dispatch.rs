//! Dispatch facade: the single entry point the transport layer calls.
//!
//! Composes the normalizer and resolver, executes the dice and custom
//! commands in-process, forwards everything else to the host-supplied
//! handler, and coerces whatever comes back into a plain string. The
//! facade is total: every failure below it, expected or not, becomes a
//! user-readable Korean message.

use crate::config::BotConfig;
use crate::dice::{self, DiceExpression, RollOutcome};
use crate::keyword;
use crate::router::{self, CommandKind, CommandMatch};
use crate::store::{PluginResolver, TemplateStore};
use crate::template;
use crate::text::{particle, Particle};
use rand::seq::SliceRandom;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, warn};

/// Fallback for unclassified failures anywhere below the facade.
pub const TEMPORARY_ERROR_MESSAGE: &str =
    "일시적인 오류가 발생했습니다. 잠시 후 다시 시도해 주세요.";

/// Shown when a handler result defies every coercion rule.
pub const PROCESSED_MESSAGE: &str = "명령어가 처리되었습니다.";

const DICE_USAGE_MESSAGE: &str = "주사위와 개수를 지정해 주세요.\n\
    예시:\n\
    [다이스/1d100] - 100면체 주사위 1개\n\
    [다이스/2d6] - 6면체 주사위 2개\n\
    [다이스/3d6<4] - 6면체 주사위 3개, 4 이하면 성공";

/// Structured reply capability a handler result may expose.
pub trait CommandReply: Send + Sync {
    /// The message shown to the user.
    fn user_message(&self) -> String;
}

/// Bare record shape carrying only a message field.
#[derive(Debug, Clone)]
pub struct ReplyRecord {
    pub message: String,
}

/// What an external handler may hand back.
///
/// A closed set so the coercion order is fixed and exhaustively
/// testable: text as-is, then the reply capability, then the message
/// field, then the first element of a pair, then a generic rendering.
pub enum HandlerOutput {
    Text(String),
    Reply(Box<dyn CommandReply>),
    Record(ReplyRecord),
    /// (message, attachment id); only the message reaches the user.
    Pair(String, Option<String>),
    Value(serde_json::Value),
}

/// Failures an external handler may report.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// Classified failure; the message is shown to the user as-is.
    #[error("{0}")]
    Command(String),
    /// Anything else; the user sees the generic temporary-error message.
    #[error("handler failure: {0}")]
    Internal(String),
}

/// The host-side implementation of the non-core commands.
pub trait CommandHandler: Send + Sync {
    fn invoke(
        &self,
        command: CommandKind,
        keywords: &[String],
    ) -> Result<HandlerOutput, HandlerError>;
}

/// How a command's execution ended, before message rendering.
enum DispatchError {
    /// Message shown to the user verbatim.
    User(String),
    /// Unexpected failure, replaced by the generic message.
    Internal(String),
}

/// Composition root for trigger handling.
pub struct Dispatcher {
    config: BotConfig,
    store: Box<dyn TemplateStore>,
    handler: Box<dyn CommandHandler>,
    plugins: Option<Box<dyn PluginResolver>>,
}

impl Dispatcher {
    pub fn new(
        config: BotConfig,
        store: Box<dyn TemplateStore>,
        handler: Box<dyn CommandHandler>,
    ) -> Self {
        Self {
            config,
            store,
            handler,
            plugins: None,
        }
    }

    /// Attach a plugin resolver consulted before normal resolution.
    pub fn with_plugins(mut self, plugins: Box<dyn PluginResolver>) -> Self {
        self.plugins = Some(plugins);
        self
    }

    /// Handle one trigger. Never fails and never panics outward.
    pub fn dispatch(&self, keywords: &[String]) -> String {
        match catch_unwind(AssertUnwindSafe(|| self.dispatch_inner(keywords))) {
            Ok(reply) => reply,
            Err(_) => {
                warn!("dispatch panicked; answering with the temporary error message");
                TEMPORARY_ERROR_MESSAGE.to_string()
            }
        }
    }

    fn dispatch_inner(&self, keywords: &[String]) -> String {
        // Plugin commands get first refusal, on the raw trigger text.
        if let Some(reply) = self.try_plugins(keywords) {
            return reply;
        }

        let original_first = keywords.first().map(String::as_str).unwrap_or_default();
        let normalized = keyword::normalize_keywords(keywords, &self.config.help_keyword);

        let matched = router::resolve(&normalized[0], self.store.as_ref());
        let Some(command) = matched.command else {
            let shown = if original_first.trim().is_empty() {
                matched.matched_keyword.as_str()
            } else {
                original_first
            };
            return self.not_found_message(shown);
        };
        debug!(%command, confidence = matched.confidence, "dispatching");

        let result = match command {
            CommandKind::Dice => self.run_dice(&matched, &normalized),
            CommandKind::Custom => self.run_custom(&matched),
            other => self.run_external(other, &normalized),
        };

        match result {
            Ok(reply) => reply,
            Err(DispatchError::User(message)) => message,
            Err(DispatchError::Internal(detail)) => {
                warn!(%command, %detail, "command failed; answering with the temporary error message");
                TEMPORARY_ERROR_MESSAGE.to_string()
            }
        }
    }

    fn try_plugins(&self, keywords: &[String]) -> Option<String> {
        let plugins = self.plugins.as_ref()?;
        let message = keywords.join(" ");
        match catch_unwind(AssertUnwindSafe(|| {
            plugins.resolve_plugin_command(&message)
        })) {
            Ok(reply) => reply,
            Err(_) => {
                warn!("plugin resolver panicked; continuing with normal dispatch");
                None
            }
        }
    }

    /// Standalone dice command: `[다이스/2d6]` or a bare `[2d6]`.
    fn run_dice(
        &self,
        matched: &CommandMatch,
        keywords: &[String],
    ) -> Result<String, DispatchError> {
        let expression_text = extract_dice_expression(matched, keywords)?;
        let expr = DiceExpression::parse(&expression_text, self.config.limits)
            .map_err(|err| DispatchError::User(err.to_string()))?;
        let outcome = expr.roll_with(&mut dice::thread_source());
        Ok(format_roll_message(&outcome))
    }

    /// Custom command: pick one of the keyword's phrases and fill it in.
    fn run_custom(&self, matched: &CommandMatch) -> Result<String, DispatchError> {
        let keyword = matched.matched_keyword.as_str();
        let phrases = match self.store.lookup_templates(keyword) {
            Ok(phrases) => phrases,
            Err(err) => {
                warn!(keyword, %err, "template lookup failed, treating keyword as unknown");
                Vec::new()
            }
        };
        let Some(phrase) = phrases.choose(&mut rand::thread_rng()) else {
            let help = self.config.help_keyword.as_str();
            return Err(DispatchError::User(format!(
                "[{keyword}] 명령어{} 찾을 수 없습니다.\n사용 가능한 명령어는 {help}{} 참고해 주세요.",
                particle(keyword, Particle::Object),
                particle(help, Particle::Object),
            )));
        };

        let substituted = template::substitute(phrase, self.config.limits);
        debug!(
            keyword,
            rolls = substituted.roll_outcomes.len(),
            "custom phrase rendered"
        );
        Ok(substituted.rendered_text)
    }

    fn run_external(
        &self,
        command: CommandKind,
        keywords: &[String],
    ) -> Result<String, DispatchError> {
        match self.handler.invoke(command, keywords) {
            Ok(output) => Ok(coerce_output(output)),
            Err(HandlerError::Command(message)) => Err(DispatchError::User(message)),
            Err(err) => Err(DispatchError::Internal(err.to_string())),
        }
    }

    fn not_found_message(&self, keyword: &str) -> String {
        let help = self.config.help_keyword.as_str();
        format!(
            "[{keyword}] 명령어{} 찾을 수 없습니다.\n사용 가능한 명령어는 [{help}]{} 입력해서 확인해주세요.",
            particle(keyword, Particle::Object),
            particle(help, Particle::Object),
        )
    }
}

/// Pull the dice expression out of the trigger keywords.
///
/// `[다이스/2d6]` takes the second keyword; a bare `[2d6]` trigger is
/// the expression itself. Internal spaces are dropped either way.
fn extract_dice_expression(
    matched: &CommandMatch,
    keywords: &[String],
) -> Result<String, DispatchError> {
    let strip = |text: &str| text.chars().filter(|c| !c.is_whitespace()).collect::<String>();

    if matched.is_exact_match {
        return match keywords.get(1) {
            Some(argument) => Ok(strip(argument)),
            None => Err(DispatchError::User(DICE_USAGE_MESSAGE.to_string())),
        };
    }
    Ok(strip(&matched.matched_keyword))
}

/// Render a roll the way the chat bot has always phrased it.
fn format_roll_message(outcome: &RollOutcome) -> String {
    let rolls_text = outcome
        .rolls
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    if let (Some(success), Some(fail)) = (outcome.success_count, outcome.fail_count) {
        if outcome.rolls.len() == 1 {
            return rolls_text;
        }
        return format!(
            "{rolls_text}\n성공 주사위: {success}개\n실패 주사위: {fail}개입니다."
        );
    }

    if outcome.rolls.len() == 1 && outcome.expression.modifier == 0 {
        return rolls_text;
    }
    format!("{rolls_text}\n합계: {}", outcome.total)
}

/// Coerce a handler result into the outbound string.
///
/// The rules run in declaration order and cannot fail; a reply
/// capability that panics degrades to the generic processed message.
pub fn coerce_output(output: HandlerOutput) -> String {
    match output {
        HandlerOutput::Text(text) => text,
        HandlerOutput::Reply(reply) => {
            match catch_unwind(AssertUnwindSafe(|| reply.user_message())) {
                Ok(message) => message,
                Err(_) => {
                    warn!("reply coercion panicked; answering with the processed message");
                    PROCESSED_MESSAGE.to_string()
                }
            }
        }
        HandlerOutput::Record(record) => record.message,
        HandlerOutput::Pair(message, _) => message,
        HandlerOutput::Value(serde_json::Value::String(text)) => text,
        HandlerOutput::Value(value) => {
            serde_json::to_string(&value).unwrap_or_else(|_| PROCESSED_MESSAGE.to_string())
        }
    }
}
