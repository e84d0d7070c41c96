//! Error taxonomy for the core.
//!
//! Every failure here is recoverable: rejected operations leave prior
//! state intact, and callers surface the message to the user.

use thiserror::Error;

/// Reasons the roster engine rejects a mutation. The `Display` text is
/// shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The roster already holds the maximum number of riders.
    #[error("team is full ({max_riders} riders maximum)")]
    TeamFull {
        /// Slot cap in force when the addition was rejected.
        max_riders: usize,
    },
    /// Adding the rider would exceed the budget.
    #[error("{name} is too expensive ({price} points, only {remaining} remaining)")]
    TooExpensive {
        /// Rider that was rejected.
        name: String,
        /// Price of the rejected rider.
        price: u32,
        /// Budget left before the attempted addition.
        remaining: u32,
    },
    /// The rider is already on the roster.
    #[error("{name} is already selected")]
    AlreadySelected {
        /// Rider that was rejected.
        name: String,
    },
    /// Cached total cost disagrees with the sum of rider prices.
    #[error("roster cost {total_cost} does not match rider prices ({expected})")]
    CostMismatch {
        /// Cached total.
        total_cost: u32,
        /// Sum of the member riders' prices.
        expected: u32,
    },
    /// Total cost exceeds the budget cap.
    #[error("roster cost {total_cost} exceeds budget of {max_budget}")]
    OverBudget {
        /// Cached total.
        total_cost: u32,
        /// Budget cap in force.
        max_budget: u32,
    },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Structurally malformed catalog or overlay input.
    #[error("parse error: {0}")]
    Parse(String),
    /// Budget, slot, or duplicate violation in the roster engine.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Malformed share payload.
    #[error("invalid share payload: {0}")]
    Decode(String),
    /// Registry snapshot lacks the expected shape.
    #[error("invalid data format: {0}")]
    Format(String),
    /// Operation referenced an unknown manager or rider.
    #[error("{kind} not found: {key}")]
    NotFound {
        /// What kind of entity was looked up.
        kind: &'static str,
        /// The key that failed to resolve.
        key: String,
    },
}

impl CoreError {
    /// Shorthand for a rider-id lookup miss.
    pub(crate) fn rider_not_found(id: u32) -> Self {
        CoreError::NotFound {
            kind: "rider",
            key: id.to_string(),
        }
    }
}
