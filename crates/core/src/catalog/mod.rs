//! The rider catalog: the authoritative list of riders and their
//! current attributes.

pub mod fallback;
pub mod parser;

pub use parser::{CatalogParse, RowOutcome, SkipReason};

use tracing::{info, warn};

use crate::{error::CoreError, models::Rider};

/// Loaded rider catalog. Rosters reference catalog riders by id or name
/// but hold their own snapshots; overlay updates mutate riders here in
/// place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    riders: Vec<Rider>,
}

impl Catalog {
    /// Parse a catalog from raw semicolon-delimited text.
    ///
    /// Bad rows are skipped, never fatal; the whole parse fails only
    /// when no row at all yields a rider.
    pub fn from_text(text: &str) -> Result<Self, CoreError> {
        let parse = parser::parse_catalog(text);
        if parse.riders.is_empty() {
            return Err(CoreError::Parse(format!(
                "no valid rider rows ({} skipped)",
                parse.skipped
            )));
        }

        let catalog = Self {
            riders: parse.riders,
        };
        catalog.log_summary(parse.accepted, parse.skipped);
        Ok(catalog)
    }

    /// Load from an optional source, falling back to the built-in
    /// dataset when the source is absent or unusable.
    pub fn load(source: Option<&str>) -> Self {
        match source {
            Some(text) => match Self::from_text(text) {
                Ok(catalog) => catalog,
                Err(err) => {
                    warn!("using built-in rider data: {err}");
                    Self::builtin()
                }
            },
            None => Self::builtin(),
        }
    }

    /// The fixed built-in dataset.
    pub fn builtin() -> Self {
        Self {
            riders: fallback::builtin_riders(),
        }
    }

    /// All riders in catalog order. Parsed sources are price
    /// descending; the built-in dataset keeps its fixed order.
    pub fn riders(&self) -> &[Rider] {
        &self.riders
    }

    /// Number of riders in the catalog.
    pub fn len(&self) -> usize {
        self.riders.len()
    }

    /// Whether the catalog holds no riders.
    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }

    /// Look up a rider by session id.
    pub fn find_by_id(&self, id: u32) -> Option<&Rider> {
        self.riders.iter().find(|rider| rider.id == id)
    }

    /// Look up a rider by exact name. First match wins; names are not
    /// guaranteed unique across teams, a known limitation of the source
    /// data.
    pub fn find_by_name(&self, name: &str) -> Option<&Rider> {
        self.riders.iter().find(|rider| rider.name == name)
    }

    /// Distinct trade-team codes, sorted, for filter UIs.
    pub fn team_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.riders.iter().map(|rider| rider.team.clone()).collect();
        codes.sort();
        codes.dedup();
        codes
    }

    pub(crate) fn riders_mut(&mut self) -> &mut [Rider] {
        &mut self.riders
    }

    fn log_summary(&self, accepted: usize, skipped: usize) {
        let confirmed = self.riders.iter().filter(|rider| rider.confirmed).count();
        let min_price = self.riders.iter().map(|rider| rider.price).min().unwrap_or(0);
        let max_price = self.riders.iter().map(|rider| rider.price).max().unwrap_or(0);
        info!(
            accepted,
            skipped,
            confirmed,
            price_range = %format!("{min_price}-{max_price}"),
            "catalog loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_falls_back_to_builtin() {
        let catalog = Catalog::load(Some("Budget;4000\n\n"));
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog, Catalog::builtin());
    }

    #[test]
    fn missing_source_uses_builtin() {
        assert_eq!(Catalog::load(None), Catalog::builtin());
    }

    #[test]
    fn from_text_rejects_sources_with_no_riders() {
        assert!(matches!(
            Catalog::from_text(";;;\nBudget;4000\n"),
            Err(CoreError::Parse(_))
        ));
    }

    #[test]
    fn name_lookup_returns_first_match() {
        let catalog =
            Catalog::from_text("SMITH John;AAA;500\nSMITH John;BBB;300\n").expect("two riders");
        let rider = catalog.find_by_name("SMITH John").expect("match");
        assert_eq!(rider.team, "AAA");
    }

    #[test]
    fn team_codes_are_sorted_and_distinct() {
        let catalog = Catalog::builtin();
        let codes = catalog.team_codes();
        assert!(codes.contains(&"ADC".to_string()));
        let mut sorted = codes.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(codes, sorted);
    }
}
