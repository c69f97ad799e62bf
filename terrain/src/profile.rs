/// Elevation returned for indices outside a profile.
pub const INVALID_ELEVATION: f64 = f64::MAX;

/// Terrain elevations sampled at a uniform spacing along a path.
///
/// Queries on an empty profile, or with an index outside it, return
/// sentinels rather than failing. Each sentinel-returning method has
/// a checked companion returning an `Option`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationProfile {
    /// Distance between consecutive samples in meters.
    spacing: f64,

    /// Elevation at each sample, ordered from path start to end.
    elevations: Vec<f64>,
}

impl Default for ElevationProfile {
    fn default() -> Self {
        Self {
            spacing: 1.0,
            elevations: Vec::new(),
        }
    }
}

impl ElevationProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Sets the sample spacing. No validation is performed.
    pub fn set_spacing(&mut self, spacing: f64) {
        self.spacing = spacing;
    }

    /// Removes all samples. Spacing is left as is.
    pub fn clear(&mut self) {
        self.elevations.clear();
    }

    pub fn add_elevation(&mut self, elevation: f64) {
        self.elevations.push(elevation);
    }

    /// Returns the elevation of sample `i`, or [`INVALID_ELEVATION`]
    /// when `i` is out of range.
    pub fn elevation(&self, i: isize) -> f64 {
        self.get(i).unwrap_or(INVALID_ELEVATION)
    }

    /// Returns the elevation of sample `i`, if any.
    pub fn get(&self, i: isize) -> Option<f64> {
        usize::try_from(i)
            .ok()
            .and_then(|i| self.elevations.get(i))
            .copied()
    }

    /// Returns `i * spacing`.
    ///
    /// This is pure arithmetic and is defined for indices outside the
    /// profile.
    #[allow(clippy::cast_precision_loss)]
    pub fn distance(&self, i: isize) -> f64 {
        i as f64 * self.spacing
    }

    /// Returns the distance of the last sample.
    ///
    /// For an empty profile this is `-spacing`; check
    /// [`is_empty`](Self::is_empty) first.
    #[allow(clippy::cast_possible_wrap)]
    pub fn total_distance(&self) -> f64 {
        self.distance(self.elevations.len() as isize - 1)
    }

    pub fn num_elevations(&self) -> usize {
        self.elevations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elevations.is_empty()
    }

    pub fn elevations(&self) -> &[f64] {
        &self.elevations
    }

    /// Returns `(min, max)` over all samples.
    ///
    /// An empty profile returns `(+inf, -inf)`, so `min > max` means
    /// there is no data.
    pub fn elevation_ranges(&self) -> (f64, f64) {
        self.elevations
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &elev| {
                (min.min(elev), max.max(elev))
            })
    }

    /// Returns `(min, max)` over all samples, or `None` when empty.
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        let (min, max) = self.elevation_ranges();
        (min <= max).then_some((min, max))
    }

    /// Returns an iterator over `(distance, elevation)` pairs.
    #[allow(clippy::cast_precision_loss)]
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.elevations
            .iter()
            .enumerate()
            .map(move |(i, &elev)| (i as f64 * self.spacing, elev))
    }
}
