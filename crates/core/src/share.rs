//! Compact, URL-safe share encoding for a single roster.
//!
//! The payload is self-contained: the receiving side reconstructs a
//! registry entry from it without access to the sender's catalog.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::CoreError, models::Roster};

/// Rider subset carried in a share payload. Stats are not shared; the
/// importer zeroes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRider {
    /// Rider name.
    pub name: String,
    /// Trade-team code.
    pub team: String,
    /// Draft price.
    pub price: u32,
}

/// Self-contained snapshot of a roster for sharing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePayload {
    /// Sender's display name.
    pub manager: String,
    /// Selected riders, name/team/price only.
    pub riders: Vec<ShareRider>,
    /// Total cost as reported by the sender.
    pub total_cost: u32,
    /// Score as reported by the sender.
    pub score: i64,
    /// When the share was created.
    pub timestamp: DateTime<Utc>,
}

impl SharePayload {
    /// Build a payload from a roster.
    pub fn from_roster(roster: &Roster) -> Self {
        Self {
            manager: roster.label().to_string(),
            riders: roster
                .riders
                .iter()
                .map(|rider| ShareRider {
                    name: rider.name.clone(),
                    team: rider.team.clone(),
                    price: rider.price,
                })
                .collect(),
            total_cost: roster.total_cost,
            score: roster.score,
            timestamp: Utc::now(),
        }
    }

    /// Encode as URL-safe base64 over JSON.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("share payload serializes");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a payload previously produced by [`SharePayload::encode`].
    pub fn decode(encoded: &str) -> Result<Self, CoreError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|err| CoreError::Decode(format!("not valid base64: {err}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| CoreError::Decode(format!("not a team snapshot: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::Catalog, roster::RosterRules};

    #[test]
    fn encode_decode_round_trips_exactly() {
        let rules = RosterRules::default();
        let catalog = Catalog::builtin();
        let mut roster = Roster::new("alice", "Alice");
        let pick = catalog.find_by_name("EVENEPOEL Remco").expect("rider");
        roster.add_rider(pick, &rules).expect("add");
        roster.score = 450;

        let payload = SharePayload::from_roster(&roster);
        let decoded = SharePayload::decode(&payload.encode()).expect("round trip");
        assert_eq!(decoded, payload);
        assert_eq!(decoded.manager, "Alice");
        assert_eq!(decoded.riders.len(), 1);
        assert_eq!(decoded.total_cost, roster.total_cost);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            SharePayload::decode("not base64 at all!"),
            Err(CoreError::Decode(_))
        ));
        // Valid base64, wrong shape.
        let bogus = URL_SAFE_NO_PAD.encode(b"{\"hello\":1}");
        assert!(matches!(
            SharePayload::decode(&bogus),
            Err(CoreError::Decode(_))
        ));
    }
}
