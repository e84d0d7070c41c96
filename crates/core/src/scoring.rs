//! Point scheme reference tables.
//!
//! Scores arrive pre-aggregated through the overlay feed; these tables
//! exist so frontends can explain where the numbers come from.

/// Points per stage placing, 1st through 10th.
pub const STAGE_POINTS: [i64; 10] = [80, 50, 35, 25, 15, 10, 5, 3, 2, 1];

/// Points per final GC placing, 1st through 50th.
pub const GC_POINTS: [i64; 50] = [
    600, 450, 380, 320, 290, 260, 230, 200, 180, 160, 140, 130, 120, 110, 100, 94, 88, 82, 77, 72,
    67, 65, 63, 61, 59, 57, 55, 53, 51, 49, 47, 45, 43, 41, 39, 37, 35, 33, 32, 31, 30, 29, 28, 27,
    26, 25, 24, 23, 22, 21,
];

/// Bonus per day spent in the leader's jersey.
pub const LEADER_BONUS_PER_DAY: i64 = 20;

/// Lookup helpers over the fixed tables. Ranks are 1-based; placings
/// outside the table score zero.
pub struct PointScheme;

impl PointScheme {
    /// Points for a stage placing.
    pub fn stage_points(rank: usize) -> i64 {
        rank.checked_sub(1)
            .and_then(|index| STAGE_POINTS.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Points for a final GC placing.
    pub fn gc_points(rank: usize) -> i64 {
        rank.checked_sub(1)
            .and_then(|index| GC_POINTS.get(index))
            .copied()
            .unwrap_or(0)
    }

    /// Leader-jersey bonus for a number of days.
    pub fn leader_bonus(days: u32) -> i64 {
        i64::from(days) * LEADER_BONUS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookups_are_one_based() {
        assert_eq!(PointScheme::stage_points(1), 80);
        assert_eq!(PointScheme::stage_points(10), 1);
        assert_eq!(PointScheme::stage_points(11), 0);
        assert_eq!(PointScheme::stage_points(0), 0);

        assert_eq!(PointScheme::gc_points(1), 600);
        assert_eq!(PointScheme::gc_points(50), 21);
        assert_eq!(PointScheme::gc_points(51), 0);
    }

    #[test]
    fn leader_bonus_scales_per_day() {
        assert_eq!(PointScheme::leader_bonus(0), 0);
        assert_eq!(PointScheme::leader_bonus(3), 60);
    }
}
