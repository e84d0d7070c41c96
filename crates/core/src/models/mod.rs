//! Shared domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-rider scoring breakdown, fed by the overlay source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderStats {
    /// Points collected from stage placings.
    #[serde(default)]
    pub stage_points: i64,
    /// Points from the general classification standing.
    #[serde(default)]
    pub gc_points: i64,
    /// Bonus points for days spent in the leader's jersey.
    #[serde(default)]
    pub leader_bonus: i64,
}

impl RiderStats {
    /// Aggregate score derived from the breakdown.
    pub fn total(&self) -> i64 {
        self.stage_points + self.gc_points + self.leader_bonus
    }
}

/// A rider as listed in the catalog.
///
/// Immutable from a roster's point of view; only the scoring overlay
/// mutates `score` and `stats`, and it does so in place on the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rider {
    /// Sequential id, stable within a session, assigned in source order.
    pub id: u32,
    /// Rider name as it appears in the source data.
    pub name: String,
    /// Short trade-team code (e.g. `UAD`).
    pub team: String,
    /// Draft price in budget points.
    pub price: u32,
    /// Cached aggregate of `stats`; kept equal to `stats.total()`.
    #[serde(default)]
    pub score: i64,
    /// Whether the rider is confirmed as starting.
    #[serde(default)]
    pub confirmed: bool,
    /// Scoring breakdown behind `score`.
    #[serde(default)]
    pub stats: RiderStats,
}

/// One manager's drafted team.
///
/// Riders are stored as value snapshots taken at selection time; a
/// recompute step re-joins them against the live catalog by id or name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// Unique registry key.
    pub manager_id: String,
    /// Human-readable manager name. May be empty for entries persisted
    /// before names were stored; see `Registry::get_or_create`.
    #[serde(default)]
    pub display_name: String,
    /// Snapshot copies of the selected riders.
    pub riders: Vec<Rider>,
    /// Cached sum of the member riders' prices.
    pub total_cost: u32,
    /// Cached sum of the member riders' scores.
    pub score: i64,
    /// Stamped on every mutation.
    pub last_updated: DateTime<Utc>,
}

impl Roster {
    /// Create an empty roster for a manager.
    pub fn new(manager_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            manager_id: manager_id.into(),
            display_name: display_name.into(),
            riders: Vec::new(),
            total_cost: 0,
            score: 0,
            last_updated: Utc::now(),
        }
    }

    /// Whether a rider with the given id is on the roster.
    pub fn contains(&self, rider_id: u32) -> bool {
        self.riders.iter().any(|rider| rider.id == rider_id)
    }

    /// Label for display, falling back to the manager id when no
    /// display name was ever stored.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.manager_id
        } else {
            &self.display_name
        }
    }
}
