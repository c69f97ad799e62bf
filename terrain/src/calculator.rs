//! Terrain profile calculation kept in sync with a terrain source.
//!
//! A [`ProfileCalculator`] samples terrain heights along the great
//! circle between two points and recomputes the whole profile whenever
//! its inputs change or its terrain source announces a tile covering
//! the path. Observers registered with
//! [`add_changed_callback`](ProfileCalculator::add_changed_callback)
//! are told after every recompute.
//!
//! Everything here is single threaded: the calculator is neither
//! `Send` nor `Sync`, and every recompute finishes before the call
//! that triggered it returns.

use crate::{
    constants::EARTH_RADIUS_M,
    math::GreatCircle,
    source::{ListenerId, TerrainSource, TileKey, TileListener},
    ElevationProfile, GeoExtent, GeoPoint, TerrainError,
};
use geo::geometry::Point;
use log::{debug, trace};
use std::{
    cell::{Ref, RefCell},
    ops::Deref,
    rc::{Rc, Weak},
    time::Instant,
};

/// Number of samples a calculator starts with.
pub const DEFAULT_NUM_SAMPLES: usize = 100;

/// Receives notice of every profile recompute.
///
/// Observers are handed a read-only view of the calculator. They must
/// not call back into the calculator itself; doing so panics.
pub trait ChangedCallback {
    fn on_changed(&self, calculator: &ProfileCalculatorState);
}

impl<F> ChangedCallback for F
where
    F: Fn(&ProfileCalculatorState),
{
    fn on_changed(&self, calculator: &ProfileCalculatorState) {
        self(calculator);
    }
}

/// A calculator's inputs and the profile computed from them.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCalculatorState {
    start: GeoPoint,
    end: GeoPoint,
    num_samples: usize,
    profile: ElevationProfile,
}

impl ProfileCalculatorState {
    pub fn start(&self) -> &GeoPoint {
        &self.start
    }

    pub fn end(&self) -> &GeoPoint {
        &self.end
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn profile(&self) -> &ElevationProfile {
        &self.profile
    }
}

pub struct ProfileCalculatorBuilder {
    /// Start point of the path (required).
    start: Option<GeoPoint>,

    /// End point of the path (required).
    end: Option<GeoPoint>,

    /// Samples along the path (defaults to [`DEFAULT_NUM_SAMPLES`]).
    num_samples: usize,
}

impl Default for ProfileCalculatorBuilder {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            num_samples: DEFAULT_NUM_SAMPLES,
        }
    }
}

impl ProfileCalculatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, start: GeoPoint) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: GeoPoint) -> Self {
        self.end = Some(end);
        self
    }

    pub fn num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// Subscribes to `source` and computes the first profile.
    pub fn build<S>(self, source: Rc<S>) -> Result<ProfileCalculator<S>, TerrainError>
    where
        S: TerrainSource + ?Sized + 'static,
    {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(TerrainError::Builder);
        };
        check_num_samples(self.num_samples)?;
        Ok(ProfileCalculator::with_samples(
            source,
            start,
            end,
            self.num_samples,
        ))
    }
}

/// Maintains the terrain profile between two points.
pub struct ProfileCalculator<S: TerrainSource + ?Sized + 'static> {
    source: Rc<S>,
    inner: Rc<RefCell<Inner<S>>>,
    listener_id: ListenerId,
}

struct Inner<S: ?Sized> {
    source: Rc<S>,
    state: ProfileCalculatorState,
    observers: Vec<Rc<dyn ChangedCallback>>,
    /// Tiles announced while the calculator was borrowed.
    deferred: DeferredTiles,
}

type DeferredTiles = Rc<RefCell<Vec<(TileKey, GeoExtent)>>>;

/// Borrow of a calculator's current profile.
///
/// Tiles announced while this is held are applied once it is dropped.
pub struct ProfileRef<'a, S: TerrainSource + ?Sized + 'static> {
    profile: Ref<'a, ElevationProfile>,
    // Dropped after `profile`, once the borrow is released.
    _flush: FlushDeferred<'a, S>,
}

impl<S> Deref for ProfileRef<'_, S>
where
    S: TerrainSource + ?Sized + 'static,
{
    type Target = ElevationProfile;

    fn deref(&self) -> &ElevationProfile {
        &self.profile
    }
}

struct FlushDeferred<'a, S: TerrainSource + ?Sized + 'static>(&'a RefCell<Inner<S>>);

impl<S> Drop for FlushDeferred<'_, S>
where
    S: TerrainSource + ?Sized + 'static,
{
    fn drop(&mut self) {
        // Another outstanding borrow flushes when it is released.
        if let Ok(mut inner) = self.0.try_borrow_mut() {
            inner.flush_deferred();
        }
    }
}

impl<S> ProfileCalculator<S>
where
    S: TerrainSource + ?Sized + 'static,
{
    /// Returns a calculator sampling [`DEFAULT_NUM_SAMPLES`] points
    /// from `start` to `end`.
    ///
    /// The calculator subscribes to `source`'s tile notifications and
    /// computes its first profile before returning.
    pub fn new(source: Rc<S>, start: GeoPoint, end: GeoPoint) -> Self {
        Self::with_samples(source, start, end, DEFAULT_NUM_SAMPLES)
    }

    /// Registers `observer` to be called after every recompute.
    pub fn add_changed_callback(&self, observer: Rc<dyn ChangedCallback>) {
        self.inner.borrow_mut().observers.push(observer);
    }

    /// Unregisters `observer`, matched by identity. Does nothing if it
    /// was never registered.
    pub fn remove_changed_callback(&self, observer: &Rc<dyn ChangedCallback>) {
        let mut inner = self.inner.borrow_mut();
        if let Some(idx) = inner
            .observers
            .iter()
            .position(|registered| same_observer(registered, observer))
        {
            inner.observers.remove(idx);
        }
    }

    /// Returns the most recent profile.
    ///
    /// The guard must be dropped before the calculator is mutated;
    /// clone the profile to keep it across recomputes. Relevant tiles
    /// announced while the guard is held trigger a recompute when it
    /// is dropped.
    pub fn profile(&self) -> ProfileRef<'_, S> {
        ProfileRef {
            profile: Ref::map(self.inner.borrow(), |inner| &inner.state.profile),
            _flush: FlushDeferred(&self.inner),
        }
    }

    pub fn num_samples(&self) -> usize {
        self.inner.borrow().state.num_samples
    }

    /// Changes the number of samples, recomputing if it differs from
    /// the current count.
    ///
    /// Fewer than two samples leaves no spacing to speak of and is
    /// rejected.
    pub fn set_num_samples(&self, num_samples: usize) -> Result<(), TerrainError> {
        check_num_samples(num_samples)?;
        let mut inner = self.inner.borrow_mut();
        if inner.state.num_samples != num_samples {
            inner.state.num_samples = num_samples;
            inner.recompute();
        }
        Ok(())
    }

    pub fn start(&self) -> GeoPoint {
        self.inner.borrow().state.start
    }

    pub fn end(&self) -> GeoPoint {
        self.inner.borrow().state.end
    }

    /// Moves the path, recomputing if either endpoint changed.
    pub fn set_start_end(&self, start: GeoPoint, end: GeoPoint) {
        let mut inner = self.inner.borrow_mut();
        if inner.state.start != start || inner.state.end != end {
            inner.state.start = start;
            inner.state.end = end;
            inner.recompute();
        }
    }

    /// Recomputes the profile if the tile's extent touches the path's
    /// bounding box.
    pub fn on_tile_added(&self, key: &TileKey, extent: &GeoExtent) {
        self.inner.borrow_mut().on_tile_added(key, extent);
    }

    /// Unconditionally recomputes the profile and notifies observers.
    pub fn recompute(&self) {
        self.inner.borrow_mut().recompute();
    }

    /// Returns the terrain source this calculator samples.
    pub fn source(&self) -> &Rc<S> {
        &self.source
    }
}

/// Private API.
impl<S> ProfileCalculator<S>
where
    S: TerrainSource + ?Sized + 'static,
{
    fn with_samples(source: Rc<S>, start: GeoPoint, end: GeoPoint, num_samples: usize) -> Self {
        let deferred = DeferredTiles::default();
        let inner = Rc::new(RefCell::new(Inner {
            source: Rc::clone(&source),
            state: ProfileCalculatorState {
                start,
                end,
                num_samples,
                profile: ElevationProfile::new(),
            },
            observers: Vec::new(),
            deferred: Rc::clone(&deferred),
        }));
        let listener_id =
            source.add_tile_listener(tile_listener(Rc::downgrade(&inner), deferred));
        inner.borrow_mut().recompute();
        Self {
            source,
            inner,
            listener_id,
        }
    }
}

impl<S> Drop for ProfileCalculator<S>
where
    S: TerrainSource + ?Sized + 'static,
{
    fn drop(&mut self) {
        self.source.remove_tile_listener(self.listener_id);
    }
}

impl<S> Inner<S>
where
    S: TerrainSource + ?Sized,
{
    /// Recomputes until no tile announced during the pass (by the
    /// source or by an observer) touches the path.
    fn recompute(&mut self) {
        loop {
            let ProfileCalculatorState {
                start,
                end,
                num_samples,
                ..
            } = self.state;
            self.state.profile = compute_profile(&*self.source, &start, &end, num_samples);
            for observer in &self.observers {
                observer.on_changed(&self.state);
            }
            if !self.take_relevant_deferred() {
                break;
            }
        }
    }

    fn on_tile_added(&mut self, key: &TileKey, extent: &GeoExtent) {
        if self.is_relevant(key, extent) {
            self.recompute();
        }
    }

    fn flush_deferred(&mut self) {
        if self.take_relevant_deferred() {
            self.recompute();
        }
    }

    /// Empties the deferred queue, returning true if any of its tiles
    /// touch the path.
    fn take_relevant_deferred(&mut self) -> bool {
        let deferred = std::mem::take(&mut *self.deferred.borrow_mut());
        let mut relevant = false;
        for (key, extent) in &deferred {
            relevant |= self.is_relevant(key, extent);
        }
        relevant
    }

    fn is_relevant(&self, key: &TileKey, extent: &GeoExtent) -> bool {
        let mut path_extent = GeoExtent::empty();
        path_extent.expand_to_include(self.state.start.to_geographic().coord);
        path_extent.expand_to_include(self.state.end.to_geographic().coord);

        if extent.intersects(&path_extent) {
            debug!("tile {key:?} intersects profile path");
            true
        } else {
            trace!("ignoring tile {key:?}");
            false
        }
    }
}

/// Returns a listener forwarding tile notifications to `inner` for as
/// long as it is alive.
///
/// Notifications arriving while `inner` is borrowed are queued on
/// `deferred`. Whoever holds the borrow drains the queue on release.
fn tile_listener<S>(inner: Weak<RefCell<Inner<S>>>, deferred: DeferredTiles) -> TileListener
where
    S: TerrainSource + ?Sized + 'static,
{
    Rc::new(move |key: &TileKey, extent: &GeoExtent| {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        match inner.try_borrow_mut() {
            Ok(mut inner) => inner.on_tile_added(key, extent),
            Err(_) => {
                debug!("profile busy; deferring tile {key:?}");
                deferred.borrow_mut().push((*key, *extent));
            }
        };
    })
}

/// Samples `num_samples` terrain heights along the great circle from
/// `start` to `end`.
///
/// Sample `i` lies at fraction `i / num_samples` of the route, so the
/// last sample falls one step short of `end` while spacing is
/// `distance / (num_samples - 1)`.
#[allow(clippy::cast_precision_loss)]
fn compute_profile<S>(
    source: &S,
    start: &GeoPoint,
    end: &GeoPoint,
    num_samples: usize,
) -> ElevationProfile
where
    S: TerrainSource + ?Sized,
{
    let now = Instant::now();

    let geo_start = start.to_geographic();
    let geo_end = end.to_geographic();
    let great_circle = GreatCircle::new(Point::from(geo_start.coord), Point::from(geo_end.coord));
    let distance = great_circle.distance(EARTH_RADIUS_M);
    let spacing = distance / (num_samples as f64 - 1.0);

    let mut profile = ElevationProfile::new();
    profile.set_spacing(spacing);
    profile.clear();

    for i in 0..num_samples {
        let t = i as f64 / num_samples as f64;
        let point = great_circle.point_at(t);
        profile.add_elevation(source.height(point.0));
    }

    debug!(
        "profile; len: {}, spacing: {spacing}, exec: {:?}",
        profile.num_elevations(),
        now.elapsed()
    );

    profile
}

fn check_num_samples(num_samples: usize) -> Result<(), TerrainError> {
    if num_samples < 2 {
        Err(TerrainError::SampleCount(num_samples))
    } else {
        Ok(())
    }
}

fn same_observer(a: &Rc<dyn ChangedCallback>, b: &Rc<dyn ChangedCallback>) -> bool {
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}
