//! These routines are taken from the [geo] crate, modified to better
//! fit our use-case.
//!
//! [geo](https://github.com/georust/geo/blob/eb0cd98f3ccfa226631af23d94d66d214ea66488/geo/src/algorithm/haversine_intermediate.rs)

use geo::{CoordFloat, Point};
use num_traits::FromPrimitive;

/// Great circle route between two geographic (lon/lat degrees)
/// points.
pub struct GreatCircle<T: CoordFloat = f64> {
    start: Point<T>,
    params: HaversineParams<T>,
}

impl<T> GreatCircle<T>
where
    T: CoordFloat + FromPrimitive,
{
    pub fn new(start: Point<T>, end: Point<T>) -> Self {
        let params = get_params(&start, &end);
        Self { start, params }
    }

    /// Angle (radians) subtended at the sphere's center.
    #[cfg(test)]
    pub fn central_angle(&self) -> T {
        self.params.d
    }

    /// Surface distance along the route on a sphere of `radius`.
    pub fn distance(&self, radius: T) -> T {
        self.params.d * radius
    }

    /// Returns the point a fraction `f` of the way from start to end.
    ///
    /// A zero length route yields the start point for every `f`.
    /// Antipodal endpoints have no unique route and yield NaN.
    pub fn point_at(&self, f: T) -> Point<T> {
        if self.params.d == T::zero() {
            self.start
        } else {
            get_point(&self.params, f)
        }
    }
}

#[allow(clippy::many_single_char_names)]
struct HaversineParams<T> {
    d: T,
    n: T,
    o: T,
    p: T,
    q: T,
    r: T,
    s: T,
}

#[allow(clippy::many_single_char_names)]
fn get_point<T>(params: &HaversineParams<T>, f: T) -> Point<T>
where
    T: CoordFloat,
{
    let one = T::one();

    let HaversineParams {
        d,
        n,
        o,
        p,
        q,
        r,
        s,
    } = *params;

    let a = ((one - f) * d).sin() / d.sin();
    let b = (f * d).sin() / d.sin();

    let x = a * n + b * o;
    let y = a * p + b * q;
    let z = a * r + b * s;

    let lat = z.atan2(x.hypot(y));
    let lon = y.atan2(x);

    Point::new(lon.to_degrees(), lat.to_degrees())
}

#[allow(clippy::many_single_char_names)]
fn get_params<T>(p1: &Point<T>, p2: &Point<T>) -> HaversineParams<T>
where
    T: CoordFloat + FromPrimitive,
{
    let one = T::one();
    let two = one + one;

    let lat1 = p1.y().to_radians();
    let lon1 = p1.x().to_radians();
    let lat2 = p2.y().to_radians();
    let lon2 = p2.x().to_radians();

    let (lat1_sin, lat1_cos) = lat1.sin_cos();
    let (lat2_sin, lat2_cos) = lat2.sin_cos();
    let (lon1_sin, lon1_cos) = lon1.sin_cos();
    let (lon2_sin, lon2_cos) = lon2.sin_cos();

    let m = lat1_cos * lat2_cos;

    let n = lat1_cos * lon1_cos;
    let o = lat2_cos * lon2_cos;
    let p = lat1_cos * lon1_sin;
    let q = lat2_cos * lon2_sin;

    let k = (((lat1 - lat2) / two).sin().powi(2) + m * ((lon1 - lon2) / two).sin().powi(2)).sqrt();

    // Rounding can push `k` a hair past 1 for near antipodal points.
    let d = two * k.min(one).asin();

    HaversineParams {
        d,
        n,
        o,
        p,
        q,
        r: lat1_sin,
        s: lat2_sin,
    }
}

#[cfg(test)]
mod tests {
    use super::GreatCircle;
    use crate::constants::{EARTH_RADIUS_M, MEAN_EARTH_RADIUS};
    use approx::assert_relative_eq;
    use geo::point;

    #[test]
    fn test_great_circle_points() {
        let start = point!(x: -0.5, y: -0.5);
        let end = point!(x: 0.5, y: 0.5);
        let great_circle = GreatCircle::new(start, end);
        assert_relative_eq!(
            great_circle.distance(MEAN_EARTH_RADIUS),
            157_252.592_559_980_9,
            epsilon = 1e-6
        );
        let points = (0..10)
            .map(|i| great_circle.point_at(f64::from(i) / 9.0))
            .collect::<Vec<_>>();
        let expected = vec![
            point!(x: -0.5, y: -0.5),
            point!(x: -0.388_884_988_799_152_34, y: -0.388_890_838_895_255_3),
            point!(x: -0.277_772_902_687_608_4, y: -0.277_780_215_266_485_2),
            point!(x: -0.166_662_905_894_136_8, y: -0.166_668_547_005_197_93),
            point!(x: -0.055_554_162_678_936_12, y: -0.055_556_251_975_400_386),
            point!(x: 0.055_554_162_678_936_12, y: 0.055_556_251_975_400_386),
            point!(x: 0.166_662_905_894_136_7, y: 0.166_668_547_005_197_84),
            point!(x: 0.277_772_902_687_608_24, y: 0.277_780_215_266_485_1),
            point!(x: 0.388_884_988_799_152_3, y: 0.388_890_838_895_255_2),
            point!(x: 0.5, y: 0.5),
        ];
        for (actual, expected) in points.iter().zip(&expected) {
            assert_relative_eq!(actual.x(), expected.x(), epsilon = 1e-12);
            assert_relative_eq!(actual.y(), expected.y(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_equator_distance() {
        let great_circle = GreatCircle::new(point!(x: 0.0, y: 0.0), point!(x: 1.0, y: 0.0));
        assert_relative_eq!(
            great_circle.central_angle(),
            1.0_f64.to_radians(),
            epsilon = 1e-15
        );
        assert_relative_eq!(
            great_circle.distance(EARTH_RADIUS_M),
            111_319.490_793_273_57,
            epsilon = 1e-6
        );
        let midpoint = great_circle.point_at(0.5);
        assert_relative_eq!(midpoint.x(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(midpoint.y(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_route() {
        let start = point!(x: -71.3, y: 44.27);
        let great_circle = GreatCircle::new(start, start);
        assert_eq!(great_circle.distance(EARTH_RADIUS_M), 0.0);
        for f in [0.0, 0.25, 0.99] {
            assert_eq!(great_circle.point_at(f), start);
        }
    }
}
