//! Dice notation parsing and rolling.
//!
//! Supports the bot's trigger notation: `NdM` with an optional signed
//! modifier and an optional success threshold, e.g. `2d6`, `1d20+5`,
//! `3d6<4` (success on 4 or lower), `1d20>15` (success on 15 or higher).

use rand::rngs::ThreadRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bounds applied when validating a parsed expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceLimits {
    /// Largest allowed number of dice in one expression.
    pub max_count: u32,
    /// Largest allowed number of sides per die.
    pub max_sides: u32,
}

impl Default for DiceLimits {
    fn default() -> Self {
        Self {
            max_count: 20,
            max_sides: 1000,
        }
    }
}

/// Largest modifier magnitude a parsed expression may carry.
///
/// Far above any real roll, but keeps `sum(rolls) + modifier` safely
/// inside i64 so rolling a parsed expression can never overflow.
pub const MAX_MODIFIER: i64 = 1_000_000;

/// Error type for dice parsing and validation.
///
/// The display strings double as the user-facing Korean messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("'{0}'은(는) 올바른 다이스 표현식이 아닙니다.")]
    MalformedExpression(String),
    #[error("주사위 개수는 1개부터 {max}개까지 가능합니다.")]
    DiceCountOutOfRange { count: u64, max: u32 },
    #[error("주사위 면수는 2면부터 {max}면까지 가능합니다.")]
    DiceSidesOutOfRange { sides: u64, max: u32 },
    #[error("임계값은 1과 {sides} 사이여야 합니다.")]
    ThresholdOutOfRange { threshold: u64, sides: u32 },
    #[error("보정값은 -{max}부터 {max}까지 가능합니다.")]
    ModifierOutOfRange { modifier: i64, max: i64 },
}

/// How individual die values are classified against a threshold.
///
/// Both comparisons are inclusive: `<4` succeeds on a 4, `>15` succeeds
/// on a 15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdKind {
    /// `<T`: a die succeeds when its value is at most T.
    AtMost,
    /// `>T`: a die succeeds when its value is at least T.
    AtLeast,
}

/// A validated dice expression (e.g. `2d6+3`).
///
/// Constructed only by [`DiceExpression::parse`]; the fields always
/// satisfy the configured limits and, when a threshold is present,
/// `1 <= threshold <= sides`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub count: u32,
    pub sides: u32,
    pub modifier: i64,
    pub threshold: Option<u32>,
    pub threshold_kind: Option<ThresholdKind>,
    /// The token as the user wrote it, kept for echoes and errors.
    pub source_text: String,
}

/// Raw fields recognized by the grammar scan, before bounds checks.
struct RawExpr {
    count: u64,
    sides: u64,
    modifier: i64,
    threshold: Option<(ThresholdKind, u64)>,
}

/// Consume a run of ASCII digits, saturating instead of overflowing.
fn take_digits(bytes: &[u8], pos: &mut usize) -> Option<u64> {
    let start = *pos;
    let mut value: u64 = 0;
    while *pos < bytes.len() && bytes[*pos].is_ascii_digit() {
        value = value
            .saturating_mul(10)
            .saturating_add(u64::from(bytes[*pos] - b'0'));
        *pos += 1;
    }
    if *pos == start {
        None
    } else {
        Some(value)
    }
}

/// Strict left-to-right scan of `\d+[dD]\d+([+-]\d+)?([<>]\d+)?`.
fn scan(text: &str) -> Option<RawExpr> {
    let bytes = text.as_bytes();
    let mut pos = 0;

    let count = take_digits(bytes, &mut pos)?;
    if pos >= bytes.len() || !matches!(bytes[pos], b'd' | b'D') {
        return None;
    }
    pos += 1;
    let sides = take_digits(bytes, &mut pos)?;

    let mut modifier = 0i64;
    if pos < bytes.len() && matches!(bytes[pos], b'+' | b'-') {
        let negative = bytes[pos] == b'-';
        pos += 1;
        let offset = take_digits(bytes, &mut pos)?.min(i64::MAX as u64) as i64;
        modifier = if negative { -offset } else { offset };
    }

    let mut threshold = None;
    if pos < bytes.len() && matches!(bytes[pos], b'<' | b'>') {
        let kind = if bytes[pos] == b'<' {
            ThresholdKind::AtMost
        } else {
            ThresholdKind::AtLeast
        };
        pos += 1;
        threshold = Some((kind, take_digits(bytes, &mut pos)?));
    }

    if pos != bytes.len() {
        return None;
    }
    Some(RawExpr {
        count,
        sides,
        modifier,
        threshold,
    })
}

impl DiceExpression {
    /// Whether `text` matches the dice grammar, ignoring bounds.
    ///
    /// The router uses this to recognize a bare `2d6` trigger without
    /// rejecting expressions that will later fail limit validation.
    pub fn matches_notation(text: &str) -> bool {
        scan(text.trim()).is_some()
    }

    /// Parse and validate a dice notation string.
    ///
    /// Validation order: syntax, then dice count, then sides, then
    /// threshold range, then modifier magnitude. Callers are expected to
    /// have stripped internal whitespace; leading/trailing whitespace is
    /// tolerated.
    pub fn parse(text: &str, limits: DiceLimits) -> Result<Self, DiceError> {
        let trimmed = text.trim();
        let raw = scan(trimmed)
            .ok_or_else(|| DiceError::MalformedExpression(trimmed.to_string()))?;

        if raw.count < 1 || raw.count > u64::from(limits.max_count) {
            return Err(DiceError::DiceCountOutOfRange {
                count: raw.count,
                max: limits.max_count,
            });
        }
        if raw.sides < 2 || raw.sides > u64::from(limits.max_sides) {
            return Err(DiceError::DiceSidesOutOfRange {
                sides: raw.sides,
                max: limits.max_sides,
            });
        }
        let sides = raw.sides as u32;

        let (threshold, threshold_kind) = match raw.threshold {
            Some((kind, value)) => {
                if value < 1 || value > u64::from(sides) {
                    return Err(DiceError::ThresholdOutOfRange {
                        threshold: value,
                        sides,
                    });
                }
                (Some(value as u32), Some(kind))
            }
            None => (None, None),
        };

        if raw.modifier.abs() > MAX_MODIFIER {
            return Err(DiceError::ModifierOutOfRange {
                modifier: raw.modifier,
                max: MAX_MODIFIER,
            });
        }

        Ok(DiceExpression {
            count: raw.count as u32,
            sides,
            modifier: raw.modifier,
            threshold,
            threshold_kind,
            source_text: trimmed.to_string(),
        })
    }

    /// Canonical rendering of the parsed fields (lowercase `d`).
    pub fn canonical(&self) -> String {
        let mut text = format!("{}d{}", self.count, self.sides);
        if self.modifier > 0 {
            text.push_str(&format!("+{}", self.modifier));
        } else if self.modifier < 0 {
            text.push_str(&format!("{}", self.modifier));
        }
        if let (Some(threshold), Some(kind)) = (self.threshold, self.threshold_kind) {
            let sigil = match kind {
                ThresholdKind::AtMost => '<',
                ThresholdKind::AtLeast => '>',
            };
            text.push(sigil);
            text.push_str(&threshold.to_string());
        }
        text
    }

    /// Roll using a fresh thread-local generator.
    pub fn roll(&self) -> RollOutcome {
        self.roll_with(&mut thread_source())
    }

    /// Roll against a caller-supplied die source.
    ///
    /// Draws exactly `count` values in `[1, sides]`. Threshold
    /// classification looks at each die alone; the modifier only moves
    /// the total.
    pub fn roll_with<S: DieSource + ?Sized>(&self, source: &mut S) -> RollOutcome {
        let rolls: Vec<u32> = (0..self.count).map(|_| source.roll_die(self.sides)).collect();
        let total = rolls.iter().map(|&r| i64::from(r)).sum::<i64>() + self.modifier;

        let (success_count, fail_count) = match (self.threshold, self.threshold_kind) {
            (Some(threshold), Some(kind)) => {
                let successes = rolls
                    .iter()
                    .filter(|&&roll| match kind {
                        ThresholdKind::AtMost => roll <= threshold,
                        ThresholdKind::AtLeast => roll >= threshold,
                    })
                    .count() as u32;
                (Some(successes), Some(self.count - successes))
            }
            _ => (None, None),
        };

        RollOutcome {
            expression: self.clone(),
            rolls,
            total,
            success_count,
            fail_count,
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s, DiceLimits::default())
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_text)
    }
}

/// Result of executing one dice expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollOutcome {
    pub expression: DiceExpression,
    /// Individual die values, in the order drawn.
    pub rolls: Vec<u32>,
    /// `sum(rolls) + modifier`.
    pub total: i64,
    /// Dice meeting the threshold; present iff a threshold was set.
    pub success_count: Option<u32>,
    pub fail_count: Option<u32>,
}

/// Uniform source of individual die values.
///
/// The roller never owns a generator: call sites inject one, so
/// concurrent requests stay independent and tests can script exact
/// faces. Implementations must return values in `[1, sides]`.
pub trait DieSource {
    fn roll_die(&mut self, sides: u32) -> u32;
}

/// Adapter turning any [`rand::Rng`] into a [`DieSource`].
pub struct RngSource<R: Rng>(pub R);

impl<R: Rng> DieSource for RngSource<R> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.0.gen_range(1..=sides)
    }
}

/// Fresh thread-local source; the default for live rolls.
pub fn thread_source() -> RngSource<ThreadRng> {
    RngSource(rand::thread_rng())
}

/// Convenience: parse a notation string and roll it once.
pub fn roll(notation: &str, limits: DiceLimits) -> Result<RollOutcome, DiceError> {
    let expr = DiceExpression::parse(notation, limits)?;
    Ok(expr.roll())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedRolls;

    fn limits() -> DiceLimits {
        DiceLimits::default()
    }

    #[test]
    fn test_parse_simple() {
        let expr = DiceExpression::parse("2d6", limits()).unwrap();
        assert_eq!(expr.count, 2);
        assert_eq!(expr.sides, 6);
        assert_eq!(expr.modifier, 0);
        assert_eq!(expr.threshold, None);
        assert_eq!(expr.threshold_kind, None);
        assert_eq!(expr.source_text, "2d6");
    }

    #[test]
    fn test_parse_uppercase_d() {
        let expr = DiceExpression::parse("2D6", limits()).unwrap();
        assert_eq!(expr.count, 2);
        assert_eq!(expr.sides, 6);
    }

    #[test]
    fn test_parse_with_modifier() {
        let expr = DiceExpression::parse("1d20+5", limits()).unwrap();
        assert_eq!(expr.modifier, 5);
        assert_eq!(expr.threshold, None);

        let expr = DiceExpression::parse("2d6-2", limits()).unwrap();
        assert_eq!(expr.modifier, -2);
    }

    #[test]
    fn test_parse_with_threshold() {
        let expr = DiceExpression::parse("3d6<4", limits()).unwrap();
        assert_eq!(expr.threshold, Some(4));
        assert_eq!(expr.threshold_kind, Some(ThresholdKind::AtMost));

        let expr = DiceExpression::parse("1d20>15", limits()).unwrap();
        assert_eq!(expr.threshold, Some(15));
        assert_eq!(expr.threshold_kind, Some(ThresholdKind::AtLeast));
    }

    #[test]
    fn test_parse_modifier_and_threshold() {
        let expr = DiceExpression::parse("2d10+3<7", limits()).unwrap();
        assert_eq!(expr.modifier, 3);
        assert_eq!(expr.threshold, Some(7));
        assert_eq!(expr.threshold_kind, Some(ThresholdKind::AtMost));
    }

    #[test]
    fn test_parse_malformed() {
        for bad in ["", "d6", "2d", "2x6", "2d6+", "2d6<", "2d6++1", "2d6<3>4", "2 d6", "2d6 foo"] {
            let result = DiceExpression::parse(bad, limits());
            assert!(
                matches!(result, Err(DiceError::MalformedExpression(_))),
                "expected malformed for {bad:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_parse_count_out_of_range() {
        assert!(matches!(
            DiceExpression::parse("0d6", limits()),
            Err(DiceError::DiceCountOutOfRange { count: 0, .. })
        ));
        assert!(matches!(
            DiceExpression::parse("21d6", limits()),
            Err(DiceError::DiceCountOutOfRange { count: 21, .. })
        ));
        // Digits past u64 still classify as a count problem, not syntax.
        assert!(matches!(
            DiceExpression::parse("99999999999999999999999d6", limits()),
            Err(DiceError::DiceCountOutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_sides_out_of_range() {
        assert!(matches!(
            DiceExpression::parse("1d1", limits()),
            Err(DiceError::DiceSidesOutOfRange { sides: 1, .. })
        ));
        assert!(matches!(
            DiceExpression::parse("1d1001", limits()),
            Err(DiceError::DiceSidesOutOfRange { sides: 1001, .. })
        ));
    }

    #[test]
    fn test_parse_threshold_out_of_range() {
        assert!(matches!(
            DiceExpression::parse("1d6<0", limits()),
            Err(DiceError::ThresholdOutOfRange { threshold: 0, sides: 6 })
        ));
        assert!(matches!(
            DiceExpression::parse("1d6>7", limits()),
            Err(DiceError::ThresholdOutOfRange { threshold: 7, sides: 6 })
        ));
        // Boundary values are fine.
        assert!(DiceExpression::parse("1d6<1", limits()).is_ok());
        assert!(DiceExpression::parse("1d6>6", limits()).is_ok());
    }

    #[test]
    fn test_parse_modifier_out_of_range() {
        assert!(matches!(
            DiceExpression::parse("2d6+9223372036854775807", limits()),
            Err(DiceError::ModifierOutOfRange { .. })
        ));
        // Digits past i64 saturate and still classify as a modifier problem.
        assert!(matches!(
            DiceExpression::parse("2d6-99999999999999999999", limits()),
            Err(DiceError::ModifierOutOfRange { .. })
        ));
        // Boundary values are fine, and rolling them cannot overflow.
        let expr = DiceExpression::parse("2d6+1000000", limits()).unwrap();
        let outcome = expr.roll_with(&mut FixedRolls::new([6, 6]));
        assert_eq!(outcome.total, 1_000_012);
        assert!(DiceExpression::parse("2d6-1000000", limits()).is_ok());
        assert!(matches!(
            DiceExpression::parse("2d6+1000001", limits()),
            Err(DiceError::ModifierOutOfRange { .. })
        ));
    }

    #[test]
    fn test_validation_order_count_before_sides() {
        // Both count and sides are bad; count is reported first.
        assert!(matches!(
            DiceExpression::parse("0d1", limits()),
            Err(DiceError::DiceCountOutOfRange { .. })
        ));
    }

    #[test]
    fn test_matches_notation_ignores_limits() {
        assert!(DiceExpression::matches_notation("2d6"));
        assert!(DiceExpression::matches_notation("9999d6"));
        assert!(DiceExpression::matches_notation("1d100+5<50"));
        assert!(!DiceExpression::matches_notation("다이스"));
        assert!(!DiceExpression::matches_notation("2d6점"));
        assert!(!DiceExpression::matches_notation("d20"));
    }

    #[test]
    fn test_canonical_round_trip() {
        for text in ["2d6", "1d20+5", "2d6-2", "3d6<4", "1d20>15", "2d10+3<7", "2D6"] {
            let expr = DiceExpression::parse(text, limits()).unwrap();
            let again = DiceExpression::parse(&expr.canonical(), limits()).unwrap();
            assert_eq!(expr.count, again.count);
            assert_eq!(expr.sides, again.sides);
            assert_eq!(expr.modifier, again.modifier);
            assert_eq!(expr.threshold, again.threshold);
            assert_eq!(expr.threshold_kind, again.threshold_kind);
        }
    }

    #[test]
    fn test_parse_is_pure() {
        let first = DiceExpression::parse("3d6<4", limits()).unwrap();
        let second = DiceExpression::parse("3d6<4", limits()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_roll_range() {
        let expr = DiceExpression::parse("1d20", limits()).unwrap();
        for _ in 0..100 {
            let outcome = expr.roll();
            assert_eq!(outcome.rolls.len(), 1);
            assert!(outcome.total >= 1 && outcome.total <= 20);
        }
    }

    #[test]
    fn test_roll_total_includes_modifier() {
        let expr = DiceExpression::parse("2d6+3", limits()).unwrap();
        let outcome = expr.roll_with(&mut FixedRolls::new([4, 5]));
        assert_eq!(outcome.rolls, vec![4, 5]);
        assert_eq!(outcome.total, 12);
        assert_eq!(outcome.success_count, None);
        assert_eq!(outcome.fail_count, None);
    }

    #[test]
    fn test_roll_negative_modifier_can_go_below_one() {
        let expr = DiceExpression::parse("1d4-10", limits()).unwrap();
        let outcome = expr.roll_with(&mut FixedRolls::new([2]));
        assert_eq!(outcome.total, -8);
    }

    #[test]
    fn test_threshold_at_most_is_inclusive() {
        let expr = DiceExpression::parse("3d6<4", limits()).unwrap();
        let outcome = expr.roll_with(&mut FixedRolls::new([1, 4, 6]));
        assert_eq!(outcome.success_count, Some(2));
        assert_eq!(outcome.fail_count, Some(1));
        assert_eq!(outcome.total, 11);
    }

    #[test]
    fn test_threshold_at_least_is_inclusive() {
        let expr = DiceExpression::parse("3d20>15", limits()).unwrap();
        let outcome = expr.roll_with(&mut FixedRolls::new([15, 14, 20]));
        assert_eq!(outcome.success_count, Some(2));
        assert_eq!(outcome.fail_count, Some(1));
    }

    #[test]
    fn test_threshold_ignores_modifier() {
        // +10 lifts the total but never flips a die's classification.
        let expr = DiceExpression::parse("2d6+10<3", limits()).unwrap();
        let outcome = expr.roll_with(&mut FixedRolls::new([2, 6]));
        assert_eq!(outcome.success_count, Some(1));
        assert_eq!(outcome.fail_count, Some(1));
        assert_eq!(outcome.total, 18);
    }

    #[test]
    fn test_custom_limits() {
        let tight = DiceLimits {
            max_count: 3,
            max_sides: 6,
        };
        assert!(DiceExpression::parse("3d6", tight).is_ok());
        assert!(matches!(
            DiceExpression::parse("4d6", tight),
            Err(DiceError::DiceCountOutOfRange { .. })
        ));
        assert!(matches!(
            DiceExpression::parse("1d8", tight),
            Err(DiceError::DiceSidesOutOfRange { .. })
        ));
    }

    #[test]
    fn test_from_str_uses_default_limits() {
        let expr: DiceExpression = "2d6".parse().unwrap();
        assert_eq!(expr.sides, 6);
        assert!("21d6".parse::<DiceExpression>().is_err());
    }
}
