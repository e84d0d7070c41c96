//! Scoring overlay: merges a secondary per-rider points feed onto the
//! catalog, recomputing each matched rider's aggregate score.

use tracing::{debug, info};

use crate::{catalog::Catalog, models::RiderStats};

/// Accounting for one overlay application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayReport {
    /// Riders whose stats were overwritten.
    pub updated: usize,
    /// Non-blank rows skipped for being structurally unusable.
    /// Rows naming an unknown rider are ignored without being counted.
    pub skipped: usize,
}

/// Apply an overlay source to the catalog.
///
/// Rows are `name;stagePoints;gcPoints[;leaderBonus]`. Rows with fewer
/// than three fields or an empty name are skipped; numeric fields that
/// fail to parse default to 0. Matching is by exact name, first match
/// wins. Applying the same overlay twice is idempotent.
///
/// Callers must recompute roster scores afterwards; see
/// [`crate::registry::Registry::recompute_scores`].
pub fn apply_overlay(catalog: &mut Catalog, text: &str) -> OverlayReport {
    let mut report = OverlayReport::default();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let columns: Vec<&str> = line.split(';').collect();
        if columns.len() < 3 {
            report.skipped += 1;
            continue;
        }

        let name = columns[0].trim();
        if name.is_empty() {
            report.skipped += 1;
            continue;
        }

        let stats = RiderStats {
            stage_points: parse_points(columns[1]),
            gc_points: parse_points(columns[2]),
            leader_bonus: columns.get(3).map(|field| parse_points(field)).unwrap_or(0),
        };

        match catalog
            .riders_mut()
            .iter_mut()
            .find(|rider| rider.name == name)
        {
            Some(rider) => {
                rider.stats = stats;
                rider.score = stats.total();
                report.updated += 1;
            }
            None => {
                // Unmatched names are ignored without skip accounting.
                debug!(name, "overlay row matched no catalog rider");
            }
        }
    }

    if report.updated > 0 {
        info!(updated = report.updated, skipped = report.skipped, "scoring overlay applied");
    }
    report
}

fn parse_points(field: &str) -> i64 {
    field.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin()
    }

    #[test]
    fn updates_matched_rider_score() {
        let mut catalog = catalog();
        let report = apply_overlay(&mut catalog, "POGACAR Tadej;80;600;20\n");

        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 0);

        let rider = catalog.find_by_name("POGACAR Tadej").expect("rider");
        assert_eq!(rider.stats.stage_points, 80);
        assert_eq!(rider.stats.gc_points, 600);
        assert_eq!(rider.stats.leader_bonus, 20);
        assert_eq!(rider.score, 700);
    }

    #[test]
    fn missing_leader_bonus_defaults_to_zero() {
        let mut catalog = catalog();
        apply_overlay(&mut catalog, "THOMAS Geraint;5;100\n");
        let rider = catalog.find_by_name("THOMAS Geraint").expect("rider");
        assert_eq!(rider.stats.leader_bonus, 0);
        assert_eq!(rider.score, 105);
    }

    #[test]
    fn non_numeric_points_default_to_zero() {
        let mut catalog = catalog();
        let report = apply_overlay(&mut catalog, "CAVENDISH Mark;dnf;40;x\n");
        assert_eq!(report.updated, 1);
        let rider = catalog.find_by_name("CAVENDISH Mark").expect("rider");
        assert_eq!(rider.stats.stage_points, 0);
        assert_eq!(rider.stats.gc_points, 40);
        assert_eq!(rider.score, 40);
    }

    #[test]
    fn short_rows_are_skipped_and_unknown_names_ignored() {
        let mut catalog = catalog();
        let report = apply_overlay(
            &mut catalog,
            "just-a-name\nNOBODY Known;10;10;10\nVAN AERT Wout;50;200\n",
        );
        assert_eq!(report.skipped, 1);
        assert_eq!(report.updated, 1);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let mut catalog = catalog();
        let overlay = "POGACAR Tadej;80;600;20\nEVENEPOEL Remco;50;450\n";

        apply_overlay(&mut catalog, overlay);
        let first = catalog.clone();
        let report = apply_overlay(&mut catalog, overlay);

        assert_eq!(report.updated, 2);
        assert_eq!(catalog, first);
    }
}
