//! "Year in review" deck.
//!
//! Builds simulated month-by-month performance for a set of holdings and
//! the ordered card sequence the browser flips through. The monthly path is
//! random (there is no price history), so the RNG is a parameter.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::percentage_of;
use crate::types::HoldingInput;

const MONTHS: [(&str, &str); 12] = [
    ("January", "Jan"),
    ("February", "Feb"),
    ("March", "Mar"),
    ("April", "Apr"),
    ("May", "May"),
    ("June", "Jun"),
    ("July", "Jul"),
    ("August", "Aug"),
    ("September", "Sep"),
    ("October", "Oct"),
    ("November", "Nov"),
    ("December", "Dec"),
];

/// Month indexes (0-based) that get their own card: the end of each quarter.
const QUARTER_ENDS: [usize; 4] = [2, 5, 8, 11];

/// Holdings spotlighted after the quarterly cards.
const SPOTLIGHT_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyData {
    pub month: String,
    pub month_short: String,
    /// Cumulative return since January, one decimal.
    pub percentage_return: f64,
    pub top_performer: String,
    pub worst_performer: String,
    /// Whole currency units.
    pub total_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    ToTheMoon,
    Winning,
    Climbing,
    Hodling,
    Bleeding,
    Rekt,
}

impl Mood {
    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::ToTheMoon => "🚀",
            Mood::Winning => "🎉",
            Mood::Climbing => "📈",
            Mood::Hodling => "😬",
            Mood::Bleeding => "📉",
            Mood::Rekt => "💀",
        }
    }

    pub fn vibe(&self) -> &'static str {
        match self {
            Mood::ToTheMoon => "TO THE MOON",
            Mood::Winning => "WINNING",
            Mood::Climbing => "CLIMBING",
            Mood::Hodling => "HODLING",
            Mood::Bleeding => "BLEEDING",
            Mood::Rekt => "REKT",
        }
    }
}

/// Mood for a cumulative return. Thresholds are exclusive.
pub fn month_mood(percentage_return: f64) -> Mood {
    if percentage_return > 20.0 {
        Mood::ToTheMoon
    } else if percentage_return > 10.0 {
        Mood::Winning
    } else if percentage_return > 0.0 {
        Mood::Climbing
    } else if percentage_return > -10.0 {
        Mood::Hodling
    } else if percentage_return > -20.0 {
        Mood::Bleeding
    } else {
        Mood::Rekt
    }
}

/// A holding highlighted on its own card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spotlight {
    pub ticker: String,
    pub percentage_return: f64,
    pub total_gain: f64,
    pub mood: Mood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedSummary {
    pub final_return: f64,
    pub final_value: f64,
    /// Months that closed above the previous month (January compares to 0).
    pub good_months: usize,
    pub best_month: String,
    pub worst_month: String,
    pub mood: Mood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Card {
    Intro,
    Graph,
    Month { index: usize, data: MonthlyData, mood: Mood },
    Stock(Spotlight),
    Summary(WrappedSummary),
    #[serde(rename_all = "camelCase")]
    Share { final_return: f64, total_value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedDeck {
    pub months: Vec<MonthlyData>,
    pub cards: Vec<Card>,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Round half up (towards +inf), so -6.75 becomes -6.7.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor + 0.5).floor() / factor
}

/// Simulate twelve months of cumulative returns.
///
/// Each month moves by `(u - 0.45) * 15` percent with `u` uniform in `[0, 1)`.
pub fn generate_months<R: Rng + ?Sized>(holdings: &[HoldingInput], rng: &mut R) -> Vec<MonthlyData> {
    let base_value: f64 = holdings.iter().map(|h| h.purchase_price * h.shares).sum();
    let mut cumulative = 0.0;
    let mut shuffled: Vec<&HoldingInput> = holdings.iter().collect();

    MONTHS
        .iter()
        .map(|(month, short)| {
            cumulative += (rng.gen::<f64>() - 0.45) * 15.0;
            shuffled.shuffle(rng);

            let top = shuffled.first().map(|h| h.ticker.clone());
            let worst = shuffled.last().map(|h| h.ticker.clone());

            MonthlyData {
                month: month.to_string(),
                month_short: short.to_string(),
                percentage_return: round_to(cumulative, 1),
                top_performer: top.unwrap_or_else(|| "N/A".to_string()),
                worst_performer: worst.unwrap_or_else(|| "N/A".to_string()),
                total_value: round_to(base_value * (1.0 + cumulative / 100.0), 0),
            }
        })
        .collect()
}

/// Per-holding spotlight, using price return (0% when bought for free).
pub fn spotlight(holding: &HoldingInput) -> Spotlight {
    let per_share = holding.current_price - holding.purchase_price;
    let percentage_return = percentage_of(per_share, holding.purchase_price);
    Spotlight {
        ticker: holding.ticker.clone(),
        percentage_return,
        total_gain: per_share * holding.shares,
        mood: month_mood(percentage_return),
    }
}

/// Summary statistics over the simulated months.
pub fn summarize(months: &[MonthlyData]) -> WrappedSummary {
    let final_return = months.last().map(|m| m.percentage_return).unwrap_or(0.0);
    let final_value = months.last().map(|m| m.total_value).unwrap_or(0.0);

    let mut good_months = 0;
    let mut best = (0usize, f64::NEG_INFINITY);
    let mut worst = (0usize, f64::INFINITY);
    let mut previous = 0.0;

    for (i, m) in months.iter().enumerate() {
        let delta = m.percentage_return - previous;
        if delta > 0.0 {
            good_months += 1;
        }
        if delta > best.1 {
            best = (i, delta);
        }
        if delta < worst.1 {
            worst = (i, delta);
        }
        previous = m.percentage_return;
    }

    let name = |i: usize| months.get(i).map(|m| m.month.clone()).unwrap_or_default();

    WrappedSummary {
        final_return,
        final_value,
        good_months,
        best_month: name(best.0),
        worst_month: name(worst.0),
        mood: month_mood(final_return),
    }
}

/// Build the full card sequence: intro, graph, quarter ends, top holdings,
/// summary, share.
pub fn build_deck<R: Rng + ?Sized>(holdings: &[HoldingInput], rng: &mut R) -> WrappedDeck {
    let months = generate_months(holdings, rng);
    let mut cards = vec![Card::Intro, Card::Graph];

    for index in QUARTER_ENDS {
        if let Some(data) = months.get(index) {
            cards.push(Card::Month {
                index,
                mood: month_mood(data.percentage_return),
                data: data.clone(),
            });
        }
    }

    let mut spotlights: Vec<Spotlight> = holdings.iter().map(spotlight).collect();
    spotlights.sort_by(|a, b| b.percentage_return.total_cmp(&a.percentage_return));
    cards.extend(spotlights.into_iter().take(SPOTLIGHT_COUNT).map(Card::Stock));

    let summary = summarize(&months);
    let (final_return, total_value) = (summary.final_return, summary.final_value);
    cards.push(Card::Summary(summary));
    cards.push(Card::Share {
        final_return,
        total_value,
    });

    WrappedDeck { months, cards }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
