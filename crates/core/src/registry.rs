//! Manager registry: one roster per manager, leaderboard ranking, and
//! wholesale import/export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::{
    catalog::Catalog,
    error::CoreError,
    models::{Rider, RiderStats, Roster},
    share::SharePayload,
};

/// Base id for riders materialized from a shared payload, kept clear of
/// catalog ids to avoid collisions.
const SHARED_RIDER_ID_BASE: u32 = 1000;

/// Serializable snapshot of the full registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// All rosters in encounter order.
    pub teams: Vec<Roster>,
    /// When the snapshot was taken.
    pub export_date: DateTime<Utc>,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    /// Registry key of the manager.
    pub manager_id: String,
    /// Display label.
    pub display_name: String,
    /// Cached team score.
    pub score: i64,
    /// Cached team cost.
    pub total_cost: u32,
    /// Last mutation timestamp.
    pub last_updated: DateTime<Utc>,
}

/// All manager state, in encounter order. Owned explicitly by the
/// application and passed to whatever needs it; persistence happens at
/// process boundaries via [`Registry::serialize`] and
/// [`Registry::deserialize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    rosters: Vec<Roster>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// All rosters in encounter order.
    pub fn rosters(&self) -> &[Roster] {
        &self.rosters
    }

    /// Number of managers.
    pub fn len(&self) -> usize {
        self.rosters.len()
    }

    /// Whether no manager has registered yet.
    pub fn is_empty(&self) -> bool {
        self.rosters.is_empty()
    }

    /// Look up a roster by manager id.
    pub fn get(&self, manager_id: &str) -> Option<&Roster> {
        self.rosters
            .iter()
            .find(|roster| roster.manager_id == manager_id)
    }

    /// Mutable lookup by manager id.
    pub fn get_mut(&mut self, manager_id: &str) -> Option<&mut Roster> {
        self.rosters
            .iter_mut()
            .find(|roster| roster.manager_id == manager_id)
    }

    /// Return the existing roster for a manager or create an empty one.
    ///
    /// Entries persisted before display names were stored get theirs
    /// backfilled here, once.
    pub fn get_or_create(&mut self, manager_id: &str, display_name: &str) -> &mut Roster {
        if let Some(index) = self
            .rosters
            .iter()
            .position(|roster| roster.manager_id == manager_id)
        {
            let roster = &mut self.rosters[index];
            if roster.display_name.is_empty() && !display_name.is_empty() {
                roster.display_name = display_name.to_string();
            }
            return roster;
        }

        self.rosters.push(Roster::new(manager_id, display_name));
        self.rosters
            .last_mut()
            .expect("roster was just pushed")
    }

    /// Leaderboard: score descending, ties keep encounter order.
    pub fn rank(&self) -> Vec<RankEntry> {
        let mut entries: Vec<RankEntry> = self
            .rosters
            .iter()
            .map(|roster| RankEntry {
                manager_id: roster.manager_id.clone(),
                display_name: roster.label().to_string(),
                score: roster.score,
                total_cost: roster.total_cost,
                last_updated: roster.last_updated,
            })
            .collect();
        // Vec::sort_by is stable, which keeps tie order.
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    /// Recompute every roster's cached score from the catalog. Run this
    /// after each overlay application.
    pub fn recompute_scores(&mut self, catalog: &Catalog) {
        for roster in &mut self.rosters {
            roster.recompute_score(catalog);
        }
    }

    /// Re-join every roster snapshot against a freshly loaded catalog
    /// by name, preserving each snapshot's roster-local id, then
    /// recompute scores. Names the catalog no longer carries keep their
    /// stale snapshot.
    pub fn reconcile(&mut self, catalog: &Catalog) {
        for roster in &mut self.rosters {
            for snapshot in &mut roster.riders {
                if let Some(current) = catalog.find_by_name(&snapshot.name) {
                    let id = snapshot.id;
                    *snapshot = current.clone();
                    snapshot.id = id;
                }
            }
            roster.recompute_score(catalog);
        }
    }

    /// Materialize a shared roster under a fresh, collision-resistant
    /// manager id. All-or-nothing: a decode failure leaves the registry
    /// untouched.
    pub fn import_shared(&mut self, encoded: &str) -> Result<&Roster, CoreError> {
        let payload = SharePayload::decode(encoded)?;
        let manager_id = format!(
            "{}_shared_{}",
            payload.manager,
            Utc::now().timestamp_millis()
        );

        let riders: Vec<Rider> = payload
            .riders
            .iter()
            .enumerate()
            .map(|(index, shared)| Rider {
                id: SHARED_RIDER_ID_BASE + index as u32,
                name: shared.name.clone(),
                team: shared.team.clone(),
                price: shared.price,
                score: 0,
                confirmed: true,
                stats: RiderStats::default(),
            })
            .collect();

        info!(manager = %payload.manager, riders = riders.len(), "imported shared roster");
        self.rosters.push(Roster {
            manager_id,
            display_name: payload.manager,
            riders,
            total_cost: payload.total_cost,
            score: payload.score,
            last_updated: payload.timestamp,
        });
        Ok(self.rosters.last().expect("roster was just pushed"))
    }

    /// Snapshot the whole registry with an export timestamp.
    pub fn export_all(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            teams: self.rosters.clone(),
            export_date: Utc::now(),
        }
    }

    /// Replace the whole registry from a snapshot blob. This is a full
    /// overwrite, not a merge; a rejected blob changes nothing.
    pub fn import_all(&mut self, blob: &str) -> Result<usize, CoreError> {
        let imported = Self::deserialize(blob)?;
        let count = imported.len();
        *self = imported;
        Ok(count)
    }

    /// Remove one manager's roster, returning it if it existed.
    pub fn remove(&mut self, manager_id: &str) -> Option<Roster> {
        let index = self
            .rosters
            .iter()
            .position(|roster| roster.manager_id == manager_id)?;
        Some(self.rosters.remove(index))
    }

    /// Reset to an empty registry.
    pub fn reset(&mut self) {
        self.rosters.clear();
    }

    /// Serialize the registry to an opaque blob for the persistence
    /// collaborator.
    pub fn serialize(&self) -> String {
        serde_json::to_string_pretty(&self.export_all()).expect("registry snapshot serializes")
    }

    /// Rebuild a registry from a blob produced by
    /// [`Registry::serialize`] or exported by a compatible client.
    /// Fails with `FormatError` when the top-level shape is wrong.
    pub fn deserialize(blob: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(blob)
            .map_err(|err| CoreError::Format(format!("not valid JSON: {err}")))?;
        if value.get("teams").is_none() {
            return Err(CoreError::Format("missing top-level \"teams\"".to_string()));
        }
        let snapshot: RegistrySnapshot = serde_json::from_value(value)
            .map_err(|err| CoreError::Format(format!("bad team data: {err}")))?;
        Ok(Self {
            rosters: snapshot.teams,
        })
    }
}

/// Fresh manager id for a custom (non-preset) manager name.
pub fn custom_manager_id() -> String {
    format!("custom_{}", Utc::now().timestamp_millis())
}
