use anyhow::{bail, Context};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use trackcore::geo::destination_point;
use trackcore::TrackPoint;

/// Upper bound on fixes in one replayed route.
pub const MAX_ROUTE_FIXES: usize = 100_000;

/// Parameters of a synthetic walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub origin: TrackPoint,
    pub fixes: usize,
    pub step_meters: f64,
    pub heading_deg: f64,
    /// Maximum heading change between two steps.
    pub turn_jitter_deg: f64,
    /// Maximum horizontal error added to each reported fix.
    pub position_noise_meters: f64,
    pub tick_ms: u64,
    pub seed: u64,
    pub description: Option<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            origin: TrackPoint {
                lat: -34.9285,
                lon: 138.6007,
            },
            fixes: 120,
            step_meters: 1.4,
            heading_deg: 45.0,
            turn_jitter_deg: 8.0,
            position_noise_meters: 0.3,
            tick_ms: 250,
            seed: 0,
            description: None,
        }
    }
}

/// One reported fix and the session time it is reported at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteFix {
    pub at_ms: u64,
    pub point: TrackPoint,
}

pub fn build_route(config: &RouteConfig) -> anyhow::Result<Vec<RouteFix>> {
    if !config.origin.is_valid() {
        bail!(
            "route origin {}, {} is not a valid coordinate",
            config.origin.lat,
            config.origin.lon
        );
    }
    if config.fixes > MAX_ROUTE_FIXES {
        bail!(
            "route of {} fixes exceeds the limit of {}",
            config.fixes,
            MAX_ROUTE_FIXES
        );
    }
    if !(config.step_meters.is_finite() && config.step_meters >= 0.0) {
        bail!("step_meters must be a non-negative distance");
    }
    if !(config.turn_jitter_deg.is_finite() && config.position_noise_meters.is_finite()) {
        bail!("turn_jitter_deg and position_noise_meters must be finite");
    }
    config
        .tick_ms
        .checked_mul(config.fixes as u64)
        .context("overflow computing route duration")?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut fixes = Vec::new();
    let mut position = config.origin;
    let mut heading = config.heading_deg;

    for index in 0..config.fixes {
        if index > 0 {
            if config.turn_jitter_deg > 0.0 {
                heading += rng.gen_range(-config.turn_jitter_deg..=config.turn_jitter_deg);
            }
            position = destination_point(&position, heading, config.step_meters);
        }

        let reported = if config.position_noise_meters > 0.0 {
            let bearing = rng.gen_range(0.0..360.0);
            let error = rng.gen_range(0.0..=config.position_noise_meters);
            destination_point(&position, bearing, error)
        } else {
            position
        };

        fixes.push(RouteFix {
            at_ms: index as u64 * config.tick_ms,
            point: reported,
        });
    }

    Ok(fixes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackcore::geo::haversine_meters;

    #[test]
    fn route_has_requested_fixes_and_ticks() {
        let config = RouteConfig {
            fixes: 40,
            tick_ms: 100,
            ..Default::default()
        };
        let route = build_route(&config).unwrap();
        assert_eq!(route.len(), 40);
        assert_eq!(route[0].at_ms, 0);
        assert_eq!(route[39].at_ms, 3_900);
        assert!(route.iter().all(|fix| fix.point.is_valid()));
    }

    #[test]
    fn same_seed_same_route() {
        let config = RouteConfig {
            seed: 42,
            ..Default::default()
        };
        assert_eq!(build_route(&config).unwrap(), build_route(&config).unwrap());
    }

    #[test]
    fn noiseless_route_walks_step_length() {
        let config = RouteConfig {
            fixes: 3,
            step_meters: 10.0,
            turn_jitter_deg: 0.0,
            position_noise_meters: 0.0,
            ..Default::default()
        };
        let route = build_route(&config).unwrap();
        assert_eq!(route[0].point, config.origin);
        let step = haversine_meters(&route[0].point, &route[1].point);
        assert!((step - 10.0).abs() < 1e-3, "step {step}");
    }

    #[test]
    fn oversized_route_is_rejected() {
        let config = RouteConfig {
            fixes: MAX_ROUTE_FIXES + 1,
            tick_ms: 0,
            ..Default::default()
        };
        let err = build_route(&config).unwrap_err();
        assert!(err.to_string().contains("exceeds the limit"));
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let config = RouteConfig {
            origin: TrackPoint { lat: 120.0, lon: 0.0 },
            ..Default::default()
        };
        assert!(build_route(&config).is_err());
    }
}
