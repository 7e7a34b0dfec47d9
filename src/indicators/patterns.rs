//! Candlestick pattern predicates over the trailing bars of a window
//!
//! Every predicate is pure and looks at the last one or two bars only.
//! Bars flagged `defaulted` never match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::Candle;

/// Doji when body < DOJI_BODY_RATIO * (high - low)
pub const DOJI_BODY_RATIO: f64 = 0.1;

/// Pin bar when the dominant wick is at least PIN_WICK_RATIO * body
pub const PIN_WICK_RATIO: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pattern {
    BullishEngulfing,
    BearishEngulfing,
    BullishHarami,
    BearishHarami,
    BullishPinBar,
    BearishPinBar,
    Doji,
}

impl Pattern {
    pub fn name(&self) -> &'static str {
        match self {
            Pattern::BullishEngulfing => "bullish_engulfing",
            Pattern::BearishEngulfing => "bearish_engulfing",
            Pattern::BullishHarami => "bullish_harami",
            Pattern::BearishHarami => "bearish_harami",
            Pattern::BullishPinBar => "bullish_pin_bar",
            Pattern::BearishPinBar => "bearish_pin_bar",
            Pattern::Doji => "doji",
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(
            self,
            Pattern::BullishEngulfing | Pattern::BullishHarami | Pattern::BullishPinBar
        )
    }

    pub fn is_bearish(&self) -> bool {
        matches!(
            self,
            Pattern::BearishEngulfing | Pattern::BearishHarami | Pattern::BearishPinBar
        )
    }
}

/// Last two bars, or None if either is missing or defaulted
fn last_two(candles: &[Candle]) -> Option<(&Candle, &Candle)> {
    let [.., prev, curr] = candles else {
        return None;
    };
    if prev.defaulted || curr.defaulted {
        return None;
    }
    Some((prev, curr))
}

fn last_one(candles: &[Candle]) -> Option<&Candle> {
    candles.last().filter(|c| !c.defaulted)
}

/// Red bar followed by a green bar whose body covers it
pub fn is_bullish_engulfing(candles: &[Candle]) -> bool {
    let Some((prev, curr)) = last_two(candles) else {
        return false;
    };
    prev.is_bearish() && curr.is_bullish() && curr.close > prev.open && curr.open < prev.close
}

/// Green bar followed by a red bar whose body covers it
pub fn is_bearish_engulfing(candles: &[Candle]) -> bool {
    let Some((prev, curr)) = last_two(candles) else {
        return false;
    };
    prev.is_bullish() && curr.is_bearish() && curr.close < prev.open && curr.open > prev.close
}

/// Red bar followed by a smaller green bar inside its body
pub fn is_bullish_harami(candles: &[Candle]) -> bool {
    let Some((prev, curr)) = last_two(candles) else {
        return false;
    };
    prev.is_bearish() && curr.is_bullish() && curr.open > prev.close && curr.close < prev.open
}

/// Green bar followed by a smaller red bar inside its body
pub fn is_bearish_harami(candles: &[Candle]) -> bool {
    let Some((prev, curr)) = last_two(candles) else {
        return false;
    };
    prev.is_bullish() && curr.is_bearish() && curr.open < prev.close && curr.close > prev.open
}

/// Green bar with a long lower wick and a short upper wick
pub fn is_bullish_pin_bar(candles: &[Candle]) -> bool {
    let Some(c) = last_one(candles) else {
        return false;
    };
    let body = c.body();
    c.is_bullish() && c.lower_wick() >= PIN_WICK_RATIO * body && c.upper_wick() < body
}

/// Red bar with a long upper wick and a short lower wick
pub fn is_bearish_pin_bar(candles: &[Candle]) -> bool {
    let Some(c) = last_one(candles) else {
        return false;
    };
    let body = c.body();
    c.is_bearish() && c.upper_wick() >= PIN_WICK_RATIO * body && c.lower_wick() < body
}

pub fn is_doji(candle: &Candle) -> bool {
    !candle.defaulted && candle.body() < DOJI_BODY_RATIO * candle.range()
}

/// All patterns matching at the end of the window
pub fn detect_patterns(candles: &[Candle]) -> BTreeSet<Pattern> {
    let checks: [(Pattern, fn(&[Candle]) -> bool); 6] = [
        (Pattern::BullishEngulfing, is_bullish_engulfing),
        (Pattern::BearishEngulfing, is_bearish_engulfing),
        (Pattern::BullishHarami, is_bullish_harami),
        (Pattern::BearishHarami, is_bearish_harami),
        (Pattern::BullishPinBar, is_bullish_pin_bar),
        (Pattern::BearishPinBar, is_bearish_pin_bar),
    ];

    let mut matched: BTreeSet<Pattern> = checks
        .iter()
        .filter(|(_, check)| check(candles))
        .map(|(pattern, _)| *pattern)
        .collect();

    if candles.last().is_some_and(is_doji) {
        matched.insert(Pattern::Doji);
    }

    matched
}
