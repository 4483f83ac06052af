use crate::generator::route::RouteConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use trackcore::sim::ScriptedPermissionGate;
use trackcore::model::Permission;
use trackcore::{PermissionState, TrackPoint, TrackerConfig};

/// How the simulated permission prompt behaves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionScript {
    pub initial: PermissionState,
    pub prompt_result: PermissionState,
    /// Per-permission answers. When present they replace `prompt_result`.
    pub prompt_grants: BTreeMap<Permission, bool>,
    /// Number of route fixes reported before the user answers the prompt.
    pub prompt_delay_fixes: usize,
}

impl Default for PermissionScript {
    fn default() -> Self {
        Self {
            initial: PermissionState::Unknown,
            prompt_result: PermissionState::Granted,
            prompt_grants: BTreeMap::new(),
            prompt_delay_fixes: 0,
        }
    }
}

impl PermissionScript {
    /// The aggregate answer the user gives to the prompt.
    pub fn prompt_answer(&self) -> PermissionState {
        if self.prompt_grants.is_empty() {
            self.prompt_result
        } else {
            PermissionState::from_grants(self.prompt_grants.iter().map(|(p, g)| (*p, *g)))
        }
    }

    pub fn build_gate(&self) -> ScriptedPermissionGate {
        let gate = if self.prompt_grants.is_empty() {
            ScriptedPermissionGate::new(self.initial, self.prompt_result)
        } else {
            ScriptedPermissionGate::with_grants(
                self.initial,
                self.prompt_grants.iter().map(|(p, g)| (*p, *g)),
            )
        };
        if self.prompt_delay_fixes > 0 {
            gate.deferred()
        } else {
            gate
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tracker: TrackerConfig,
    pub permission: PermissionScript,
    /// Whether the device already knows where it is when the session starts.
    pub initial_fix: bool,
    /// Makes the location source reject subscriptions with this reason.
    pub fail_subscription: Option<String>,
    pub route: RouteConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            permission: PermissionScript::default(),
            initial_fix: true,
            fail_subscription: None,
            route: RouteConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading session config {}", path_ref.display()))?;
        let config: SessionConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing session config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        fixes: usize,
        seed: u64,
        deny: bool,
        coarse_only: bool,
        require_permission: bool,
        initial_fix: bool,
    ) -> Self {
        let mut config = Self::default();
        config.route.fixes = fixes;
        config.route.seed = seed;
        config.tracker.require_permission = require_permission;
        config.initial_fix = initial_fix;
        if deny {
            config.permission.prompt_result = PermissionState::Denied;
        } else if coarse_only {
            config.permission.prompt_grants = BTreeMap::from([
                (Permission::FineLocation, false),
                (Permission::CoarseLocation, true),
            ]);
        }
        config
    }

    /// The last-known fix the simulated device answers with, if any.
    pub fn last_known(&self) -> Option<TrackPoint> {
        self.initial_fix.then_some(self.route.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_sets_permission_script() {
        let cfg = SessionConfig::from_args(30, 9, true, false, true, false);
        assert_eq!(cfg.route.fixes, 30);
        assert_eq!(cfg.permission.prompt_result, PermissionState::Denied);
        assert!(cfg.tracker.require_permission);
        assert_eq!(cfg.last_known(), None);
    }

    #[test]
    fn coarse_only_answer_is_denied() {
        let cfg = SessionConfig::from_args(30, 9, false, true, false, true);
        assert_eq!(cfg.permission.prompt_grants.len(), 2);
        assert_eq!(cfg.permission.prompt_answer(), PermissionState::Denied);
    }

    #[test]
    fn grants_load_from_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"permission:\n  prompt_grants:\n    fine_location: true\n    coarse_location: true\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = SessionConfig::load(&path).unwrap();
        assert_eq!(cfg.permission.prompt_answer(), PermissionState::Granted);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"permission:\n  initial: denied\n  prompt_result: granted\n  prompt_delay_fixes: 4\n\
tracker:\n  updates:\n    update_interval_ms: 1000\nroute:\n  fixes: 12\n  origin: { lat: 51.5, lon: -0.12 }\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = SessionConfig::load(&path).unwrap();
        assert_eq!(cfg.permission.initial, PermissionState::Denied);
        assert_eq!(cfg.permission.prompt_delay_fixes, 4);
        assert_eq!(cfg.tracker.updates.update_interval_ms, 1000);
        assert_eq!(cfg.tracker.updates.min_displacement_meters, 0.5);
        assert_eq!(cfg.route.fixes, 12);
        assert_eq!(cfg.last_known(), Some(TrackPoint { lat: 51.5, lon: -0.12 }));
    }
}
