//! Built-in rider dataset used when no catalog source can be loaded.

use once_cell::sync::Lazy;

use crate::models::{Rider, RiderStats};

/// (name, team, price, confirmed), in id order. This table is fixed;
/// the fallback must reproduce the same riders on every run.
const FALLBACK_ROWS: &[(&str, &str, u32, bool)] = &[
    ("POGACAR Tadej", "UAD", 5030, true),
    ("EVENEPOEL Remco", "SOQ", 2680, true),
    ("VINGEGAARD HANSEN Jonas", "TVL", 1735, true),
    ("PHILIPSEN Jasper", "ADC", 1686, true),
    ("VAN DER POEL Mathieu", "ADC", 1616, true),
    ("VAN AERT Wout", "TVL", 1596, true),
    ("ROGLIC Primoz", "RBH", 1592, true),
    ("GIRMAY HAILU Biniam", "IWA", 1529, true),
    ("MAS NICOLAU Enric", "MOV", 1397, true),
    ("O'CONNOR Ben", "JAY", 1333, true),
    ("THOMAS Geraint", "IGD", 57, false),
    ("CAVENDISH Mark", "ADC", 100, false),
];

static FALLBACK_RIDERS: Lazy<Vec<Rider>> = Lazy::new(|| {
    FALLBACK_ROWS
        .iter()
        .enumerate()
        .map(|(index, (name, team, price, confirmed))| Rider {
            id: index as u32 + 1,
            name: (*name).to_string(),
            team: (*team).to_string(),
            price: *price,
            score: 0,
            confirmed: *confirmed,
            stats: RiderStats::default(),
        })
        .collect()
});

/// Fresh copies of the built-in riders.
pub fn builtin_riders() -> Vec<Rider> {
    FALLBACK_RIDERS.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_dataset_is_stable() {
        let riders = builtin_riders();
        assert_eq!(riders.len(), 12);
        assert_eq!(riders[0].id, 1);
        assert_eq!(riders[0].name, "POGACAR Tadej");
        assert_eq!(riders[0].price, 5030);
        assert!(riders[0].confirmed);
        assert_eq!(riders[10].name, "THOMAS Geraint");
        assert!(!riders[10].confirmed);
        assert_eq!(builtin_riders(), riders);
    }
}
