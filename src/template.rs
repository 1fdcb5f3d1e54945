//! Template substitution for user-authored phrases.
//!
//! A phrase like `오늘의 점수는 {1d100}점입니다.` is scanned left to
//! right; each brace-delimited dice token is rolled and replaced by its
//! total. A token that parses but fails validation degrades to an
//! in-band error marker so the rest of the phrase still renders.

use crate::dice::{DiceExpression, DiceLimits, DieSource, RollOutcome};
use tracing::warn;

/// Result of substituting every dice token in one template.
#[derive(Debug, Clone)]
pub struct SubstitutionResult {
    /// The template with every recognized token replaced.
    pub rendered_text: String,
    /// Outcomes for the successfully rolled tokens, left to right.
    pub roll_outcomes: Vec<RollOutcome>,
}

/// Substitute with a fresh thread-local die source.
pub fn substitute(template: &str, limits: DiceLimits) -> SubstitutionResult {
    substitute_with(template, limits, &mut crate::dice::thread_source())
}

/// Substitute against a caller-supplied die source.
///
/// Total over arbitrary input: malformed brace content is left verbatim,
/// out-of-limits tokens become `[<token> 오류]` markers, and scanning
/// always continues to the end of the template.
pub fn substitute_with<S: DieSource + ?Sized>(
    template: &str,
    limits: DiceLimits,
    source: &mut S,
) -> SubstitutionResult {
    let mut rendered = String::with_capacity(template.len());
    let mut outcomes = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open + 1..].find('}').map(|i| open + 1 + i) else {
            break;
        };

        let inner: String = rest[open + 1..close]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if !DiceExpression::matches_notation(&inner) {
            // Not a dice token; keep the brace and rescan just past it.
            rendered.push_str(&rest[..=open]);
            rest = &rest[open + 1..];
            continue;
        }

        rendered.push_str(&rest[..open]);
        match evaluate_token(&inner, limits, source) {
            Ok(outcome) => {
                rendered.push_str(&outcome.total.to_string());
                outcomes.push(outcome);
            }
            Err(marker) => rendered.push_str(&marker),
        }
        rest = &rest[close + 1..];
    }

    rendered.push_str(rest);
    SubstitutionResult {
        rendered_text: rendered,
        roll_outcomes: outcomes,
    }
}

/// Parse and roll one token, or produce its in-band error marker.
fn evaluate_token<S: DieSource + ?Sized>(
    token: &str,
    limits: DiceLimits,
    source: &mut S,
) -> Result<RollOutcome, String> {
    match DiceExpression::parse(token, limits) {
        Ok(expr) => Ok(expr.roll_with(source)),
        Err(err) => {
            warn!(token, %err, "dice token rejected, substituting error marker");
            Err(format!("[{token} 오류]"))
        }
    }
}
