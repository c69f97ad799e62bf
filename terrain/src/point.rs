use crate::constants::EARTH_RADIUS_M;
use geo::geometry::Coord;
use std::f64::consts::FRAC_PI_2;

/// Spatial reference a [`GeoPoint`]'s coordinates are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Srs {
    /// WGS84 longitude/latitude in degrees.
    Geographic,

    /// Spherical ("web") mercator, EPSG:3857, in meters.
    SphericalMercator,
}

/// A location in some spatial reference.
///
/// Equality is by value: two points are equal when both their
/// reference and coordinates match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub srs: Srs,
    pub coord: Coord<f64>,
}

impl GeoPoint {
    pub fn new(srs: Srs, coord: Coord<f64>) -> Self {
        Self { srs, coord }
    }

    pub fn geographic(lon: f64, lat: f64) -> Self {
        Self::new(Srs::Geographic, Coord { x: lon, y: lat })
    }

    pub fn mercator(x: f64, y: f64) -> Self {
        Self::new(Srs::SphericalMercator, Coord { x, y })
    }

    pub fn x(&self) -> f64 {
        self.coord.x
    }

    pub fn y(&self) -> f64 {
        self.coord.y
    }

    /// Returns this point reprojected to longitude/latitude degrees.
    pub fn to_geographic(&self) -> Self {
        match self.srs {
            Srs::Geographic => *self,
            Srs::SphericalMercator => {
                let Coord { x, y } = self.coord;
                let lon = (x / EARTH_RADIUS_M).to_degrees();
                let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
                Self::geographic(lon, lat)
            }
        }
    }
}
