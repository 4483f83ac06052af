pub mod distance;

pub use distance::{destination_point, haversine_meters, EARTH_RADIUS_METERS};
