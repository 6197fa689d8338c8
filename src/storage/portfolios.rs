//! Saved portfolios, newest first.

use anyhow::Result;
use tracing::info;

use super::{load_list, new_id, now_millis, save_list};
use crate::error::ParseError;
use crate::types::{HoldingInput, SavedPortfolio};

pub struct PortfolioStore {
    path: String,
    max_saved: usize,
    items: Vec<SavedPortfolio>,
}

impl PortfolioStore {
    /// Open the store at `path`, loading any existing file.
    pub fn open(path: impl Into<String>, max_saved: usize) -> Result<Self> {
        let path = path.into();
        let mut items: Vec<SavedPortfolio> = load_list(&path)?;
        items.truncate(max_saved);
        Ok(Self {
            path,
            max_saved,
            items,
        })
    }

    pub fn list(&self) -> &[SavedPortfolio] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&SavedPortfolio> {
        self.items.iter().find(|p| p.id == id)
    }

    /// Save a new portfolio at the front; the oldest beyond the cap are dropped.
    pub fn save(&mut self, name: &str, holdings: Vec<HoldingInput>) -> Result<SavedPortfolio> {
        validate_all(&holdings)?;

        let now = now_millis();
        let name = match name.trim() {
            "" => "Untitled portfolio".to_string(),
            n => n.to_string(),
        };
        let saved = SavedPortfolio {
            id: new_id(),
            name,
            holdings,
            created_at: now,
            updated_at: now,
        };

        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.push(saved.clone());
        next.extend(self.items.iter().cloned());
        next.truncate(self.max_saved);
        save_list(&next, &self.path)?;
        self.items = next;

        info!(id = %saved.id, name = %saved.name, holdings = saved.holdings.len(), "Portfolio saved");
        Ok(saved)
    }

    /// Replace the holdings of an existing portfolio. `None` if the id is unknown.
    pub fn update(
        &mut self,
        id: &str,
        holdings: Vec<HoldingInput>,
    ) -> Result<Option<SavedPortfolio>> {
        validate_all(&holdings)?;

        let Some(idx) = self.items.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        let mut next = self.items.clone();
        let existing = &mut next[idx];
        existing.holdings = holdings;
        existing.updated_at = now_millis().max(existing.created_at);
        let updated = existing.clone();

        save_list(&next, &self.path)?;
        self.items = next;
        info!(id, "Portfolio updated");
        Ok(Some(updated))
    }

    /// Remove a portfolio. Returns whether anything was deleted.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        if !self.items.iter().any(|p| p.id == id) {
            return Ok(false);
        }
        let next: Vec<SavedPortfolio> = self.items.iter().filter(|p| p.id != id).cloned().collect();
        save_list(&next, &self.path)?;
        self.items = next;
        info!(id, "Portfolio deleted");
        Ok(true)
    }
}

fn validate_all(holdings: &[HoldingInput]) -> Result<(), ParseError> {
    holdings.iter().try_for_each(HoldingInput::validate)
}
