//! Roster engine: budget and slot enforcement, cost/score upkeep.
//!
//! All checks run strictly before any mutation; a rejected operation
//! leaves the roster untouched.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    error::{CoreError, ValidationError},
    models::{Rider, Roster},
};

/// Default budget cap in points.
pub const DEFAULT_MAX_BUDGET: u32 = 4000;
/// Default roster size cap.
pub const DEFAULT_MAX_RIDERS: usize = 8;

/// Draft constraints. Named configuration, not hardcoded into the
/// engine, so alternate formats can override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRules {
    /// Maximum total cost of a roster.
    pub max_budget: u32,
    /// Maximum number of riders on a roster.
    pub max_riders: usize,
}

impl Default for RosterRules {
    fn default() -> Self {
        Self {
            max_budget: DEFAULT_MAX_BUDGET,
            max_riders: DEFAULT_MAX_RIDERS,
        }
    }
}

impl RosterRules {
    /// Budget left for the given roster.
    pub fn remaining(&self, roster: &Roster) -> u32 {
        self.max_budget.saturating_sub(roster.total_cost)
    }
}

impl Roster {
    /// Add a rider snapshot to the roster.
    ///
    /// Rejected, in check order, when the roster is full, the rider does
    /// not fit the remaining budget, or the rider is already selected.
    pub fn add_rider(&mut self, rider: &Rider, rules: &RosterRules) -> Result<(), ValidationError> {
        if self.riders.len() >= rules.max_riders {
            return Err(ValidationError::TeamFull {
                max_riders: rules.max_riders,
            });
        }
        let fits_budget = self
            .total_cost
            .checked_add(rider.price)
            .map_or(false, |total| total <= rules.max_budget);
        if !fits_budget {
            return Err(ValidationError::TooExpensive {
                name: rider.name.clone(),
                price: rider.price,
                remaining: rules.remaining(self),
            });
        }
        if self.contains(rider.id) {
            return Err(ValidationError::AlreadySelected {
                name: rider.name.clone(),
            });
        }

        self.riders.push(rider.clone());
        self.total_cost += rider.price;
        self.last_updated = Utc::now();
        debug_assert!(self.check_invariants(rules).is_ok());
        Ok(())
    }

    /// Remove a rider by id, returning the removed snapshot.
    pub fn remove_rider(&mut self, rider_id: u32) -> Result<Rider, CoreError> {
        let index = self
            .riders
            .iter()
            .position(|rider| rider.id == rider_id)
            .ok_or_else(|| CoreError::rider_not_found(rider_id))?;

        let removed = self.riders.remove(index);
        self.total_cost -= removed.price;
        self.last_updated = Utc::now();
        Ok(removed)
    }

    /// Recompute the cached score by re-joining against the live
    /// catalog by id, keeping the snapshot score for riders the catalog
    /// no longer knows (stale or shared data).
    pub fn recompute_score(&mut self, catalog: &Catalog) {
        self.score = self
            .riders
            .iter()
            .map(|snapshot| {
                catalog
                    .find_by_id(snapshot.id)
                    .map(|current| current.score)
                    .unwrap_or(snapshot.score)
            })
            .sum();
    }

    /// Re-validate the structural invariants: cached cost equals the
    /// sum of rider prices, and slot/budget caps hold.
    pub fn check_invariants(&self, rules: &RosterRules) -> Result<(), ValidationError> {
        let expected: u32 = self.riders.iter().map(|rider| rider.price).sum();
        if self.total_cost != expected {
            return Err(ValidationError::CostMismatch {
                total_cost: self.total_cost,
                expected,
            });
        }
        if self.riders.len() > rules.max_riders {
            return Err(ValidationError::TeamFull {
                max_riders: rules.max_riders,
            });
        }
        if self.total_cost > rules.max_budget {
            return Err(ValidationError::OverBudget {
                total_cost: self.total_cost,
                max_budget: rules.max_budget,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiderStats;

    fn rider(id: u32, name: &str, price: u32) -> Rider {
        Rider {
            id,
            name: name.to_string(),
            team: "AAA".to_string(),
            price,
            score: 0,
            confirmed: true,
            stats: RiderStats::default(),
        }
    }

    #[test]
    fn add_then_remove_restores_prior_state() {
        let rules = RosterRules::default();
        let mut roster = Roster::new("alice", "Alice");
        roster
            .add_rider(&rider(1, "FIRST Rider", 1200), &rules)
            .expect("first add");

        let before_riders = roster.riders.clone();
        let before_cost = roster.total_cost;

        roster
            .add_rider(&rider(2, "SECOND Rider", 800), &rules)
            .expect("second add");
        roster.remove_rider(2).expect("remove");

        assert_eq!(roster.riders, before_riders);
        assert_eq!(roster.total_cost, before_cost);
        roster.check_invariants(&rules).expect("invariants hold");
    }

    #[test]
    fn budget_is_enforced_exactly() {
        let rules = RosterRules::default();
        let mut roster = Roster::new("bob", "Bob");
        roster
            .add_rider(&rider(1, "BIG Spender", 3950), &rules)
            .expect("base add");

        let err = roster
            .add_rider(&rider(2, "OVER Priced", 100), &rules)
            .expect_err("over budget");
        assert!(matches!(err, ValidationError::TooExpensive { remaining: 50, .. }));
        assert_eq!(roster.total_cost, 3950);

        roster
            .add_rider(&rider(3, "JUST Fits", 50), &rules)
            .expect("exact fit");
        assert_eq!(roster.total_cost, 4000);
    }

    #[test]
    fn extreme_price_cannot_overflow_the_budget_check() {
        let rules = RosterRules::default();
        let mut roster = Roster::new("hank", "Hank");
        roster
            .add_rider(&rider(1, "BASE Pick", 3950), &rules)
            .expect("base add");

        let err = roster
            .add_rider(&rider(2, "ABSURD Price", u32::MAX), &rules)
            .expect_err("rejected");
        assert!(matches!(err, ValidationError::TooExpensive { .. }));
        assert_eq!(roster.total_cost, 3950);
    }

    #[test]
    fn ninth_rider_is_rejected_regardless_of_price() {
        let rules = RosterRules::default();
        let mut roster = Roster::new("carol", "Carol");
        for id in 1..=8 {
            roster
                .add_rider(&rider(id, &format!("RIDER {id}"), 10), &rules)
                .expect("fill roster");
        }

        let err = roster
            .add_rider(&rider(9, "CHEAP Ninth", 1), &rules)
            .expect_err("team full");
        assert_eq!(err, ValidationError::TeamFull { max_riders: 8 });
        assert_eq!(roster.riders.len(), 8);
    }

    #[test]
    fn duplicate_rider_is_rejected_without_mutation() {
        let rules = RosterRules::default();
        let mut roster = Roster::new("dave", "Dave");
        let pick = rider(4, "TWICE Picked", 500);
        roster.add_rider(&pick, &rules).expect("first add");

        let err = roster.add_rider(&pick, &rules).expect_err("duplicate");
        assert_eq!(
            err,
            ValidationError::AlreadySelected {
                name: "TWICE Picked".to_string()
            }
        );
        assert_eq!(roster.riders.len(), 1);
        assert_eq!(roster.total_cost, 500);
    }

    #[test]
    fn removing_unknown_rider_is_a_no_op_error() {
        let mut roster = Roster::new("erin", "Erin");
        assert!(matches!(
            roster.remove_rider(42),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn recompute_prefers_catalog_score_with_snapshot_fallback() {
        let rules = RosterRules { max_budget: 10_000, ..RosterRules::default() };
        let mut catalog = Catalog::builtin();
        crate::overlay::apply_overlay(&mut catalog, "POGACAR Tadej;80;600;20\n");

        let mut roster = Roster::new("frank", "Frank");
        let tadej = catalog.find_by_name("POGACAR Tadej").expect("rider").clone();
        roster.add_rider(&tadej, &rules).expect("add");

        // A snapshot the catalog does not know keeps its stored score.
        let mut ghost = rider(999, "RETIRED Rider", 100);
        ghost.score = 33;
        roster.add_rider(&ghost, &rules).expect("add ghost");

        roster.recompute_score(&catalog);
        assert_eq!(roster.score, 700 + 33);
    }

    #[test]
    fn rules_are_overridable() {
        let rules = RosterRules {
            max_budget: 100,
            max_riders: 1,
        };
        let mut roster = Roster::new("gail", "Gail");
        roster.add_rider(&rider(1, "ONLY Pick", 90), &rules).expect("fits");
        assert!(roster.add_rider(&rider(2, "NO Room", 5), &rules).is_err());
    }
}
