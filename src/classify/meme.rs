//! Meme template selection and caption formatting.
//!
//! Templates declare a `[min_return, max_return)` range and are grouped into
//! three coarse bands by `min_return`. Selection order for a return `r`:
//! 1. templates in `r`'s band whose range contains `r`
//! 2. any template whose range contains `r`
//! 3. any template in `r`'s band (clamp to the nearest band)
//! 4. the template whose range is closest to `r` (first on ties)
//!
//! Each step picks uniformly at random among its candidates.

use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::Tier;
use crate::types::{format_signed_percent, MemeTemplate};

/// Only images from this host are used and proxied.
pub const IMAGE_HOST_PREFIX: &str = "https://i.imgflip.com/";

/// `{ticker}` placeholder value when captioning a whole portfolio.
const PORTFOLIO_LABEL: &str = "my portfolio";

// ---------------------------------------------------------------------------
// Bands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemeBand {
    Losses,
    Moderate,
    Gains,
}

impl Tier for MemeBand {
    const ALL: &'static [MemeBand] = &[MemeBand::Losses, MemeBand::Moderate, MemeBand::Gains];

    /// NaN is treated as moderate.
    fn classify(percentage_return: f64) -> Self {
        if percentage_return.is_nan() {
            MemeBand::Moderate
        } else if percentage_return >= 10.0 {
            MemeBand::Gains
        } else if percentage_return >= -10.0 {
            MemeBand::Moderate
        } else {
            MemeBand::Losses
        }
    }

    fn name(&self) -> &'static str {
        match self {
            MemeBand::Losses => "losses",
            MemeBand::Moderate => "moderate",
            MemeBand::Gains => "gains",
        }
    }
}

impl MemeBand {
    /// Band a template belongs to, by its `min_return`.
    pub fn of_template(template: &MemeTemplate) -> Self {
        Self::classify(template.min_return)
    }
}

impl fmt::Display for MemeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// (id, name, image, min, max, top, bottom)
type TemplateRow = (&'static str, &'static str, &'static str, f64, f64, &'static str, &'static str);

const BUILTIN_TEMPLATES: &[TemplateRow] = &[
    // Losses
    ("this-is-fine", "This Is Fine", "wxica.jpg", -100.0, -50.0,
     "{ticker} is {return}", "This is fine"),
    ("sad-pablo", "Sad Pablo Escobar", "1c1uej.jpg", -100.0, -30.0,
     "Waiting for {ticker} to recover", "{return} later..."),
    ("disaster-girl", "Disaster Girl", "23ls.jpg", -60.0, -25.0,
     "Me watching {ticker}", "burn at {return}"),
    ("hide-the-pain", "Hide the Pain Harold", "gk5el.jpg", -30.0, -10.0,
     "When someone asks about {ticker}", "{return}, I'm fine"),
    // Moderate
    ("change-my-mind", "Change My Mind", "24y43o.jpg", -10.0, 0.0,
     "{return} is basically break-even", "Change my mind"),
    ("one-does-not-simply", "One Does Not Simply", "1bij.jpg", -10.0, 10.0,
     "One does not simply", "get rich with {ticker} at {return}"),
    ("roll-safe", "Roll Safe", "1h7in3.jpg", 0.0, 10.0,
     "Can't lose money", "if {ticker} is only {return}"),
    // Gains
    ("drake", "Drake Hotline Bling", "30b1gx.jpg", 10.0, 30.0,
     "Savings account", "{ticker} at {return}"),
    ("success-kid", "Success Kid", "1bhk.jpg", 10.0, 50.0,
     "Bought {ticker}", "{return}"),
    ("leo-cheers", "Leonardo Dicaprio Cheers", "39t1o.jpg", 30.0, 100.0,
     "Cheers to {ticker}", "{return} baby"),
    ("expanding-brain", "Expanding Brain", "1jwhww.jpg", 50.0, f64::INFINITY,
     "Buying {ticker}", "{return} galaxy brain"),
    ("most-interesting-man", "The Most Interesting Man In The World", "1bh8.jpg", 100.0, f64::INFINITY,
     "I don't always invest", "but when I do it's {return} on {ticker}"),
];

/// The built-in templates, covering every return from -100% upward.
pub fn default_catalog() -> Vec<MemeTemplate> {
    BUILTIN_TEMPLATES
        .iter()
        .map(|(id, name, image, min, max, top, bottom)| MemeTemplate {
            id: id.to_string(),
            name: name.to_string(),
            url: format!("{IMAGE_HOST_PREFIX}{image}"),
            min_return: *min,
            max_return: *max,
            top_text: top.to_string(),
            bottom_text: bottom.to_string(),
        })
        .collect()
}

/// An ordered set of meme templates.
#[derive(Debug, Clone)]
pub struct MemeCatalog {
    templates: Vec<MemeTemplate>,
}

impl Default for MemeCatalog {
    fn default() -> Self {
        Self {
            templates: default_catalog(),
        }
    }
}

impl MemeCatalog {
    /// Build a catalog, rejecting templates hosted elsewhere or with an empty range.
    pub fn new(templates: Vec<MemeTemplate>) -> Result<Self> {
        if templates.is_empty() {
            bail!("Meme catalog must contain at least one template");
        }
        for t in &templates {
            if !t.url.starts_with(IMAGE_HOST_PREFIX) {
                bail!("Template {} uses unsupported image host: {}", t.id, t.url);
            }
            if !(t.min_return < t.max_return) {
                bail!(
                    "Template {} has an empty range [{}, {})",
                    t.id,
                    t.min_return,
                    t.max_return
                );
            }
        }
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &[MemeTemplate] {
        &self.templates
    }

    /// Pick a template for `percentage_return` (see module docs for the order).
    pub fn select<R: Rng + ?Sized>(&self, percentage_return: f64, rng: &mut R) -> &MemeTemplate {
        let band = MemeBand::classify(percentage_return);

        let in_band_matching: Vec<&MemeTemplate> = self
            .templates
            .iter()
            .filter(|t| MemeBand::of_template(t) == band && t.contains(percentage_return))
            .collect();
        if let Some(t) = in_band_matching.choose(rng).copied() {
            return t;
        }

        let matching: Vec<&MemeTemplate> = self
            .templates
            .iter()
            .filter(|t| t.contains(percentage_return))
            .collect();
        if let Some(t) = matching.choose(rng).copied() {
            return t;
        }

        debug!(percentage_return, %band, "No template range matches, falling back");

        let in_band: Vec<&MemeTemplate> = self
            .templates
            .iter()
            .filter(|t| MemeBand::of_template(t) == band)
            .collect();
        if let Some(t) = in_band.choose(rng).copied() {
            return t;
        }

        self.nearest(percentage_return)
    }

    /// Template whose range is closest to `percentage_return`; first wins on ties.
    fn nearest(&self, percentage_return: f64) -> &MemeTemplate {
        let mut best = &self.templates[0];
        let mut best_distance = best.distance_to(percentage_return);
        for t in &self.templates[1..] {
            let d = t.distance_to(percentage_return);
            if d < best_distance {
                best = t;
                best_distance = d;
            }
        }
        best
    }

    /// Select a template and fill in its captions.
    pub fn render<R: Rng + ?Sized>(
        &self,
        percentage_return: f64,
        ticker: Option<&str>,
        rng: &mut R,
    ) -> RenderedMeme {
        let template = self.select(percentage_return, rng);
        RenderedMeme {
            template_id: template.id.clone(),
            name: template.name.clone(),
            image_url: proxied_image_url(template),
            top_text: format_caption(&template.top_text, percentage_return, ticker),
            bottom_text: format_caption(&template.bottom_text, percentage_return, ticker),
            percentage_return,
        }
    }
}

// ---------------------------------------------------------------------------
// Captions
// ---------------------------------------------------------------------------

/// A template with its captions filled in, ready for the browser to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMeme {
    pub template_id: String,
    pub name: String,
    pub image_url: String,
    pub top_text: String,
    pub bottom_text: String,
    pub percentage_return: f64,
}

/// Substitute `{return}` and `{ticker}` in a caption pattern.
pub fn format_caption(pattern: &str, percentage_return: f64, ticker: Option<&str>) -> String {
    pattern
        .replace("{return}", &format_signed_percent(percentage_return))
        .replace("{ticker}", ticker.unwrap_or(PORTFOLIO_LABEL))
}

/// Same-origin URL the browser loads the template image through.
pub fn proxied_image_url(template: &MemeTemplate) -> String {
    format!("/api/meme-image?url={}", urlencoding::encode(&template.url))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
