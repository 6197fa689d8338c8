//! Roast selection.
//!
//! Tiers are tested top-down, first match wins; each boundary is lower-bound
//! inclusive and upper-bound exclusive.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Tier;

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoastTier {
    Catastrophic,
    Terrible,
    Bad,
    Meh,
    Decent,
    Good,
    Legendary,
}

impl Tier for RoastTier {
    const ALL: &'static [RoastTier] = &[
        RoastTier::Catastrophic,
        RoastTier::Terrible,
        RoastTier::Bad,
        RoastTier::Meh,
        RoastTier::Decent,
        RoastTier::Good,
        RoastTier::Legendary,
    ];

    /// NaN is treated as a flat return (`Meh`); infinities clamp to the ends.
    fn classify(percentage_return: f64) -> Self {
        if percentage_return.is_nan() {
            return RoastTier::Meh;
        }
        if percentage_return < -50.0 {
            RoastTier::Catastrophic
        } else if percentage_return < -30.0 {
            RoastTier::Terrible
        } else if percentage_return < -10.0 {
            RoastTier::Bad
        } else if percentage_return < 10.0 {
            RoastTier::Meh
        } else if percentage_return < 30.0 {
            RoastTier::Decent
        } else if percentage_return < 100.0 {
            RoastTier::Good
        } else {
            RoastTier::Legendary
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RoastTier::Catastrophic => "catastrophic",
            RoastTier::Terrible => "terrible",
            RoastTier::Bad => "bad",
            RoastTier::Meh => "meh",
            RoastTier::Decent => "decent",
            RoastTier::Good => "good",
            RoastTier::Legendary => "legendary",
        }
    }
}

impl RoastTier {
    /// Roast lines for this tier.
    pub fn lines(&self) -> &'static [&'static str] {
        match self {
            RoastTier::Catastrophic => &[
                "Your portfolio is performing worse than a GameStop short seller's marriage.",
                "At this rate, you could've made more money setting your cash on fire for warmth.",
                "Your financial advisor just updated their LinkedIn to 'Open to Work'.",
                "Even FTX customers are feeling sorry for you right now.",
                "Your portfolio chart looks like it's trying to reach the Earth's core.",
                "Congratulations! You've achieved what Wall Street calls 'generational poverty'.",
            ],
            RoastTier::Terrible => &[
                "Your portfolio has more red than a matador convention.",
                "Have you considered that 'buy high, sell low' isn't actually a strategy?",
                "Your investment thesis is basically 'what if I made every wrong decision possible?'",
                "Even a blindfolded monkey with a dartboard would have done better.",
                "Your portfolio is so bad, it's being used as a case study in what NOT to do.",
            ],
            RoastTier::Bad => &[
                "You're not losing money, you're just aggressively donating to market makers.",
                "Your portfolio is the financial equivalent of stepping on a Lego every day.",
                "Diamond hands? More like lead hands dragging you to the bottom.",
                "At least you can claim these losses on your taxes... for the next decade.",
                "Your portfolio performance would make a financial advisor cry.",
            ],
            RoastTier::Meh => &[
                "Your portfolio is as exciting as watching paint dry, but less profitable.",
                "Congratulations on achieving peak mediocrity.",
                "You've somehow managed to beat inflation... oh wait, no you haven't.",
                "Your returns are flatter than the Earth according to some people.",
                "A savings account would have been revolutionary for you.",
            ],
            RoastTier::Decent => &[
                "Look at you, Mr./Ms. 'I Actually Read The News Before Investing'.",
                "Not bad! Your portfolio is almost keeping up with the S&P... almost.",
                "You're officially doing better than 60% of hedge fund managers. Low bar, but still.",
                "Your portfolio is green! Someone learned that stocks can go up!",
            ],
            RoastTier::Good => &[
                "Okay, we see you! Did you travel back in time with a sports almanac?",
                "Your portfolio is performing better than most relationships last.",
                "Quick, screenshot this before it all goes away like your ex.",
                "Wall Street wants to know your location... for tax purposes.",
            ],
            RoastTier::Legendary => &[
                "Are you a time traveler? Be honest.",
                "Please share your insider trading tips... asking for a friend (who is the SEC).",
                "Your portfolio gains have their own zip code.",
                "Congratulations, you've unlocked: Early Retirement (maybe).",
                "Your returns are so good, I'm checking if this app has a bug.",
            ],
        }
    }
}

impl fmt::Display for RoastTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Ticker suffixes
// ---------------------------------------------------------------------------

/// Extra jab appended when the roasted ticker is one of these.
pub const TICKER_SUFFIXES: &[(&str, &str)] = &[
    ("TSLA", " Elon's tweets aged like milk, huh?"),
    ("GME", " At least you have the memes."),
    ("AMC", " The real movie was the losses we made along the way."),
    ("DOGE", " Much wow. Very loss."),
    ("PEPE", " The frog has hopped away with your money."),
    ("BTC", " HODL they said. It'll be fun they said."),
    ("ETH", " The merge was supposed to fix everything!"),
    ("SOL", " Solana: Sometimes Online, Losses Always."),
];

/// Suffix for a ticker (case-insensitive), if it has one.
pub fn ticker_suffix(ticker: &str) -> Option<&'static str> {
    let upper = ticker.trim().to_uppercase();
    TICKER_SUFFIXES
        .iter()
        .find(|(t, _)| *t == upper)
        .map(|(_, suffix)| *suffix)
}

// ---------------------------------------------------------------------------
// Roast
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roast {
    pub roast: String,
    pub tier: RoastTier,
    pub percentage_return: f64,
}

/// Pick a roast for a return, personalised with a ticker suffix when one matches.
pub fn roast<R: Rng + ?Sized>(percentage_return: f64, ticker: Option<&str>, rng: &mut R) -> Roast {
    let tier = RoastTier::classify(percentage_return);
    let mut text = tier.lines().choose(rng).copied().unwrap_or_default().to_string();

    if let Some(suffix) = ticker.and_then(ticker_suffix) {
        text.push_str(suffix);
    }

    Roast {
        roast: text,
        tier,
        percentage_return,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
