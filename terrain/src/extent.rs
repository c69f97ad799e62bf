use geo::{
    geometry::{Coord, Rect},
    Intersects,
};

/// A geographic (degree) bounding box which may be empty.
///
/// Longitudes are compared numerically; extents crossing the
/// antimeridian are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoExtent {
    rect: Option<Rect<f64>>,
}

impl GeoExtent {
    /// Returns an extent containing nothing.
    pub fn empty() -> Self {
        Self { rect: None }
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        Self { rect: Some(rect) }
    }

    pub fn is_empty(&self) -> bool {
        self.rect.is_none()
    }

    pub fn rect(&self) -> Option<Rect<f64>> {
        self.rect
    }

    /// Grows this extent just enough to contain `coord`.
    pub fn expand_to_include(&mut self, coord: Coord<f64>) {
        let rect = match self.rect {
            None => Rect::new(coord, coord),
            Some(rect) => Rect::new(
                Coord {
                    x: rect.min().x.min(coord.x),
                    y: rect.min().y.min(coord.y),
                },
                Coord {
                    x: rect.max().x.max(coord.x),
                    y: rect.max().y.max(coord.y),
                },
            ),
        };
        self.rect = Some(rect);
    }

    /// Returns true if the two extents overlap or touch.
    ///
    /// An empty extent intersects nothing.
    pub fn intersects(&self, other: &Self) -> bool {
        match (self.rect, other.rect) {
            (Some(lhs), Some(rhs)) => lhs.intersects(&rhs),
            _ => false,
        }
    }
}

impl From<Rect<f64>> for GeoExtent {
    fn from(rect: Rect<f64>) -> Self {
        Self::from_rect(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, GeoExtent, Rect};

    fn one_degree(x: f64, y: f64) -> GeoExtent {
        GeoExtent::from_rect(Rect::new(
            Coord { x, y },
            Coord {
                x: x + 1.0,
                y: y + 1.0,
            },
        ))
    }

    #[test]
    fn test_expand_to_include() {
        let mut extent = GeoExtent::empty();
        assert!(extent.is_empty());

        extent.expand_to_include(Coord { x: -71.3, y: 44.3 });
        let rect = extent.rect().unwrap();
        assert_eq!(rect.min(), rect.max());

        extent.expand_to_include(Coord { x: -71.2, y: 44.2 });
        let rect = extent.rect().unwrap();
        assert_eq!(rect.min(), Coord { x: -71.3, y: 44.2 });
        assert_eq!(rect.max(), Coord { x: -71.2, y: 44.3 });
    }

    #[test]
    fn test_intersects() {
        let mut path = GeoExtent::empty();
        path.expand_to_include(Coord { x: -71.5, y: 44.5 });
        path.expand_to_include(Coord { x: -70.5, y: 44.8 });

        assert!(one_degree(-72.0, 44.0).intersects(&path));
        assert!(one_degree(-71.0, 44.0).intersects(&path));
        assert!(!one_degree(-70.0, 44.0).intersects(&path));
        assert!(!one_degree(-72.0, 45.5).intersects(&path));
        // Touching edges count.
        assert!(one_degree(-70.5, 44.8).intersects(&path));
    }

    #[test]
    fn test_degenerate_extent_intersects() {
        let mut point = GeoExtent::empty();
        point.expand_to_include(Coord { x: -71.5, y: 44.5 });
        assert!(one_degree(-72.0, 44.0).intersects(&point));
        assert!(!one_degree(-73.0, 44.0).intersects(&point));
    }

    #[test]
    fn test_empty_intersects_nothing() {
        let empty = GeoExtent::empty();
        assert!(!empty.intersects(&one_degree(0.0, 0.0)));
        assert!(!one_degree(0.0, 0.0).intersects(&empty));
        assert!(!empty.intersects(&empty));
    }
}
