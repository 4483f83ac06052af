use serde::{Deserialize, Serialize};

/// Aggregate answer of the permission-granting capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    #[default]
    Unknown,
    Denied,
    Granted,
}

/// Individual runtime permissions the tracker needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    FineLocation,
    CoarseLocation,
}

pub const REQUIRED_PERMISSIONS: [Permission; 2] =
    [Permission::FineLocation, Permission::CoarseLocation];

impl PermissionState {
    /// Folds per-permission answers: every one granted means `Granted`, a
    /// single refusal means `Denied`, no answers at all stays `Unknown`.
    pub fn from_grants<I>(grants: I) -> Self
    where
        I: IntoIterator<Item = (Permission, bool)>,
    {
        let mut state = PermissionState::Unknown;
        for (_, granted) in grants {
            if !granted {
                return PermissionState::Denied;
            }
            state = PermissionState::Granted;
        }
        state
    }

    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }

    /// Applies a newly reported state. `Granted` is terminal for the session.
    pub fn advance(self, reported: PermissionState) -> PermissionState {
        match (self, reported) {
            (PermissionState::Granted, _) => PermissionState::Granted,
            (current, PermissionState::Unknown) => current,
            (_, reported) => reported,
        }
    }
}
