//! Hall of Shame: the worst returns submitted, worst first.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{load_list, new_id, now_millis, save_list};
use crate::types::LeaderboardEntry;

/// What a client sends to claim a spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSubmission {
    pub percentage_loss: f64,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub meme_text: Option<String>,
}

/// Badge shown next to a leaderboard position (0-based).
pub fn rank_badge(index: usize) -> &'static str {
    match index {
        0 => "🥇",
        1 => "🥈",
        2 => "🥉",
        i if i < 10 => "💀",
        _ => "📉",
    }
}

pub struct LeaderboardStore {
    path: String,
    capacity: usize,
    threshold: f64,
    entries: Vec<LeaderboardEntry>,
}

impl LeaderboardStore {
    pub fn open(path: impl Into<String>, capacity: usize, threshold: f64) -> Result<Self> {
        let path = path.into();
        let mut entries: Vec<LeaderboardEntry> = load_list(&path)?;
        sort_worst_first(&mut entries);
        entries.truncate(capacity);
        Ok(Self {
            path,
            capacity,
            threshold,
            entries,
        })
    }

    /// Only returns strictly below the threshold are shameful enough.
    pub fn qualifies(&self, percentage_return: f64) -> bool {
        percentage_return.is_finite() && percentage_return < self.threshold
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn top(&self, n: usize) -> &[LeaderboardEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Insert a qualifying submission. Returns the stored entry and its
    /// 0-based rank, `None` if the return does not qualify or the board is
    /// full of worse losses.
    pub fn submit(
        &mut self,
        submission: LeaderboardSubmission,
    ) -> Result<Option<(LeaderboardEntry, usize)>> {
        if !self.qualifies(submission.percentage_loss) {
            return Ok(None);
        }

        let entry = LeaderboardEntry {
            id: new_id(),
            percentage_loss: submission.percentage_loss,
            ticker: submission
                .ticker
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty()),
            timestamp: now_millis(),
            meme_text: submission.meme_text.filter(|t| !t.trim().is_empty()),
        };

        let mut next = self.entries.clone();
        next.push(entry.clone());
        sort_worst_first(&mut next);
        next.truncate(self.capacity);

        let Some(rank) = next.iter().position(|e| e.id == entry.id) else {
            return Ok(None);
        };
        save_list(&next, &self.path)?;
        self.entries = next;

        info!(rank, entry = %entry, "Leaderboard entry added");
        Ok(Some((entry, rank)))
    }
}

/// Stable, so earlier submissions keep their place on ties.
fn sort_worst_first(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| a.percentage_loss.total_cmp(&b.percentage_loss));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{delete_file, temp_path};

    fn submission(loss: f64, ticker: &str) -> LeaderboardSubmission {
        LeaderboardSubmission {
            percentage_loss: loss,
            ticker: Some(ticker.to_string()),
            meme_text: None,
        }
    }

    #[test]
    fn test_qualifies_strictly_below_threshold() {
        let path = temp_path("lb_q");
        let store = LeaderboardStore::open(&path, 50, -10.0).unwrap();
        assert!(store.qualifies(-10.01));
        assert!(!store.qualifies(-10.0));
        assert!(!store.qualifies(5.0));
        assert!(!store.qualifies(f64::NAN));
    }

    #[test]
    fn test_submit_sorts_worst_first() {
        let path = temp_path("lb_sort");
        let mut store = LeaderboardStore::open(&path, 50, -10.0).unwrap();
        store.submit(submission(-20.0, "aapl")).unwrap();
        let (entry, rank) = store.submit(submission(-80.0, "gme")).unwrap().unwrap();
        store.submit(submission(-35.0, "tsla")).unwrap();

        assert_eq!(rank, 0);
        assert_eq!(entry.ticker.as_deref(), Some("GME"));
        let losses: Vec<f64> = store.entries().iter().map(|e| e.percentage_loss).collect();
        assert_eq!(losses, vec![-80.0, -35.0, -20.0]);

        let reopened = LeaderboardStore::open(&path, 50, -10.0).unwrap();
        assert_eq!(reopened.entries().len(), 3);
        assert_eq!(reopened.top(1)[0].ticker.as_deref(), Some("GME"));

        delete_file(&path).unwrap();
    }

    #[test]
    fn test_non_qualifying_not_stored() {
        let path = temp_path("lb_nq");
        let mut store = LeaderboardStore::open(&path, 50, -10.0).unwrap();
        assert!(store.submit(submission(-5.0, "SPY")).unwrap().is_none());
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_capacity_truncates() {
        let path = temp_path("lb_cap");
        let mut store = LeaderboardStore::open(&path, 2, -10.0).unwrap();
        store.submit(submission(-50.0, "A")).unwrap();
        store.submit(submission(-60.0, "B")).unwrap();
        // Better than everything on a full board
        assert!(store.submit(submission(-11.0, "C")).unwrap().is_none());
        let (_, rank) = store.submit(submission(-70.0, "D")).unwrap().unwrap();
        assert_eq!(rank, 0);
        assert_eq!(store.entries().len(), 2);
        assert_eq!(store.entries()[1].ticker.as_deref(), Some("B"));

        delete_file(&path).unwrap();
    }

    #[test]
    fn test_failed_write_leaves_board_unchanged() {
        let mut path = std::env::temp_dir();
        path.push(format!("memefolio_missing_dir_{}", uuid::Uuid::new_v4()));
        path.push("leaderboard.json");
        let path = path.to_string_lossy().to_string();

        let mut store = LeaderboardStore::open(path.as_str(), 50, -10.0).unwrap();
        assert!(store.submit(submission(-40.0, "GME")).is_err());
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_top_clamps() {
        let path = temp_path("lb_top");
        let mut store = LeaderboardStore::open(&path, 50, -10.0).unwrap();
        store.submit(submission(-15.0, "X")).unwrap();
        assert_eq!(store.top(10).len(), 1);
        assert!(store.top(0).is_empty());
        delete_file(&path).unwrap();
    }

    #[test]
    fn test_rank_badges() {
        assert_eq!(rank_badge(0), "🥇");
        assert_eq!(rank_badge(1), "🥈");
        assert_eq!(rank_badge(2), "🥉");
        assert_eq!(rank_badge(3), "💀");
        assert_eq!(rank_badge(9), "💀");
        assert_eq!(rank_badge(10), "📉");
    }
}
