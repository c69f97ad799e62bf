/// Radius of the sphere used for great circle distances (WGS84
/// semi-major axis).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Mean earth radius (IUGG).
#[cfg(test)]
pub const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;
