//! Transport modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The means of travel for an away team's round trip.
///
/// The derived ordering (`Plane < Train`) is the final deterministic
/// tie-break when two modes have identical emissions and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Air travel.
    Plane,
    /// Rail travel.
    Train,
}

impl TransportMode {
    /// Both modes, in tie-break order.
    pub const ALL: [TransportMode; 2] = [TransportMode::Plane, TransportMode::Train];

    /// The other mode.
    pub fn other(self) -> Self {
        match self {
            TransportMode::Plane => TransportMode::Train,
            TransportMode::Train => TransportMode::Plane,
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Plane => f.write_str("plane"),
            TransportMode::Train => f.write_str("train"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_is_involution() {
        for mode in TransportMode::ALL {
            assert_ne!(mode.other(), mode);
            assert_eq!(mode.other().other(), mode);
        }
    }

    #[test]
    fn test_plane_before_train() {
        assert!(TransportMode::Plane < TransportMode::Train);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&TransportMode::Train).unwrap();
        assert_eq!(json, r#""train""#);
        let mode: TransportMode = serde_json::from_str(r#""plane""#).unwrap();
        assert_eq!(mode, TransportMode::Plane);
        assert_eq!(mode.to_string(), "plane");
    }
}
