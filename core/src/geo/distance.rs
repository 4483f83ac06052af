use crate::model::TrackPoint;

/// Mean Earth radius (IUGG).
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Great-circle distance between two fixes.
pub fn haversine_meters(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Point reached by travelling `distance_m` from `origin` on the initial
/// bearing `bearing_deg` (clockwise from north).
pub fn destination_point(origin: &TrackPoint, bearing_deg: f64, distance_m: f64) -> TrackPoint {
    let delta = distance_m / EARTH_RADIUS_METERS;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.lat.to_radians();
    let lambda1 = origin.lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    // normalise to [-180, 180)
    let lon = (lambda2.to_degrees() + 540.0) % 360.0 - 180.0;
    TrackPoint {
        lat: phi2.to_degrees(),
        lon,
    }
}
