//! Semicolon-delimited rider list parsing.

use tracing::debug;

use crate::models::{Rider, RiderStats};

/// Header and instructional lines carried over from the exported
/// spreadsheet. Any row starting with one of these is skipped.
const HEADER_PREFIXES: &[&str] = &[
    "All riders",
    "Top part",
    "If the team",
    "Lower part",
    "Make trial",
    "IF THIS LINE",
    "If you sort",
    "These prices",
    "Budget",
    "Number of riders",
    "Remaining budget",
    ";;;",
];

/// Hand-maintained exclusion list for rows the source data marks as
/// unusable. Matched on exact (name, price field) pairs; this is a data
/// quirk, not a general parsing rule.
const EXCLUDED_ROWS: &[(&str, &str)] = &[("POGACAR Tadej", "out of budget")];

/// Why a non-blank row was not turned into a rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Recognized header or instructional line.
    Header,
    /// Fewer than three `;`-separated fields.
    TooFewFields,
    /// Name, team, or price empty after trimming.
    MissingField,
    /// Entry on the fixed exclusion list.
    Excluded,
    /// Price not a positive integer.
    InvalidPrice,
}

/// Outcome of classifying a single non-blank row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Row yielded a rider.
    Accepted(Rider),
    /// Row was skipped; skips are counted, never fatal.
    Skipped(SkipReason),
}

/// Result of a full catalog parse.
///
/// `accepted + skipped` equals the number of non-blank input rows.
/// Riders are sorted by price descending; their ids reflect accepted-row
/// order in the input, assigned before sorting.
#[derive(Debug, Clone, Default)]
pub struct CatalogParse {
    /// Accepted riders, price descending.
    pub riders: Vec<Rider>,
    /// Count of rows that produced a rider.
    pub accepted: usize,
    /// Count of non-blank rows that were skipped.
    pub skipped: usize,
}

/// Parse a full catalog source. Individual bad rows are skipped and
/// counted; this function itself never fails.
pub fn parse_catalog(text: &str) -> CatalogParse {
    let mut parse = CatalogParse::default();
    let mut next_id: u32 = 1;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match classify_row(line, next_id) {
            RowOutcome::Accepted(rider) => {
                next_id += 1;
                parse.accepted += 1;
                parse.riders.push(rider);
            }
            RowOutcome::Skipped(reason) => {
                parse.skipped += 1;
                debug!(?reason, line, "skipped catalog row");
            }
        }
    }

    // Display convenience; ids already fixed in file order.
    parse.riders.sort_by(|a, b| b.price.cmp(&a.price));
    parse
}

/// Classify one trimmed, non-blank row, assigning `id` on acceptance.
pub fn classify_row(line: &str, id: u32) -> RowOutcome {
    if HEADER_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
        return RowOutcome::Skipped(SkipReason::Header);
    }

    let columns: Vec<&str> = line.split(';').collect();
    if columns.len() < 3 {
        return RowOutcome::Skipped(SkipReason::TooFewFields);
    }

    let name = columns[0].trim();
    let team = columns[1].trim();
    let price_field = columns[2].trim();
    if name.is_empty() || team.is_empty() || price_field.is_empty() {
        return RowOutcome::Skipped(SkipReason::MissingField);
    }

    if EXCLUDED_ROWS
        .iter()
        .any(|(excluded_name, excluded_price)| *excluded_name == name && *excluded_price == price_field)
    {
        return RowOutcome::Skipped(SkipReason::Excluded);
    }

    let price = match price_field.parse::<u32>() {
        Ok(value) if value > 0 => value,
        _ => return RowOutcome::Skipped(SkipReason::InvalidPrice),
    };

    let confirmed = columns
        .get(3)
        .map(|field| field.trim() == "q")
        .unwrap_or(false);

    RowOutcome::Accepted(Rider {
        id,
        name: name.to_string(),
        team: team.to_string(),
        price,
        score: 0,
        confirmed,
        stats: RiderStats::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_confirmed_and_unconfirmed_rows() {
        let text = "POGACAR Tadej;UAD;5030;q\nTHOMAS Geraint;IGD;57;\n";
        let parse = parse_catalog(text);

        assert_eq!(parse.accepted, 2);
        assert_eq!(parse.skipped, 0);
        assert_eq!(parse.riders.len(), 2);

        // Sorted by price descending, ids in file order.
        assert_eq!(parse.riders[0].id, 1);
        assert_eq!(parse.riders[0].name, "POGACAR Tadej");
        assert_eq!(parse.riders[0].price, 5030);
        assert!(parse.riders[0].confirmed);

        assert_eq!(parse.riders[1].id, 2);
        assert_eq!(parse.riders[1].price, 57);
        assert!(!parse.riders[1].confirmed);
    }

    #[test]
    fn skip_and_accept_counts_cover_all_non_blank_rows() {
        let text = "\
All riders in the list below
POGACAR Tadej;UAD;5030;q

Budget;4000
not-enough-fields
NAMELESS;;100
EVENEPOEL Remco;SOQ;2680;q
BROKEN PRICE;SOQ;abc
";
        let non_blank = text.lines().filter(|line| !line.trim().is_empty()).count();
        let parse = parse_catalog(text);
        assert_eq!(parse.accepted, 2);
        assert_eq!(parse.accepted + parse.skipped, non_blank);
    }

    #[test]
    fn rejects_non_positive_prices() {
        assert_eq!(
            classify_row("A;B;0", 1),
            RowOutcome::Skipped(SkipReason::InvalidPrice)
        );
        assert_eq!(
            classify_row("A;B;-5", 1),
            RowOutcome::Skipped(SkipReason::InvalidPrice)
        );
        // Out of u32 range must skip, not wrap.
        assert_eq!(
            classify_row("A;B;4294967297", 1),
            RowOutcome::Skipped(SkipReason::InvalidPrice)
        );
    }

    #[test]
    fn excluded_row_is_skipped_only_on_exact_match() {
        assert_eq!(
            classify_row("POGACAR Tadej;UAD;out of budget", 1),
            RowOutcome::Skipped(SkipReason::Excluded)
        );
        // Same name with a real price parses normally.
        assert!(matches!(
            classify_row("POGACAR Tadej;UAD;5030;q", 1),
            RowOutcome::Accepted(_)
        ));
    }

    #[test]
    fn fourth_field_other_than_q_is_unconfirmed() {
        match classify_row("VAN AERT Wout;TVL;1596;x", 7) {
            RowOutcome::Accepted(rider) => assert!(!rider.confirmed),
            other => panic!("expected accepted row, got {other:?}"),
        }
    }

    #[test]
    fn ids_are_assigned_before_price_sort() {
        let text = "CHEAP Rider;AAA;10\nDEAR Rider;BBB;900\n";
        let parse = parse_catalog(text);
        assert_eq!(parse.riders[0].name, "DEAR Rider");
        assert_eq!(parse.riders[0].id, 2);
        assert_eq!(parse.riders[1].id, 1);
    }
}
