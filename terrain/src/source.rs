//! Terrain data source interface.

use crate::GeoExtent;
use geo::geometry::Coord;
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// Height returned for locations without loaded terrain.
pub const NO_DATA: f64 = -f64::MAX;

/// Identifies a unit of terrain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// Level of detail.
    pub lod: u32,
    pub x: i32,
    pub y: i32,
}

/// Invoked with a tile's key and geographic extent when the tile
/// becomes available.
pub type TileListener = Rc<dyn Fn(&TileKey, &GeoExtent)>;

/// Handle returned when registering a [`TileListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A provider of terrain heights which announces newly available
/// tiles.
pub trait TerrainSource {
    /// Returns the height above mean sea level (meters) at `coord`
    /// (longitude/latitude degrees), or [`NO_DATA`].
    fn height(&self, coord: Coord<f64>) -> f64;

    /// Registers `listener` for tile-added notifications.
    fn add_tile_listener(&self, listener: TileListener) -> ListenerId;

    /// Unregisters a listener. Unknown ids are ignored.
    fn remove_tile_listener(&self, id: ListenerId);
}

/// Registered tile listeners, in registration order.
///
/// Sources embed one of these to implement the listener half of
/// [`TerrainSource`].
#[derive(Default)]
pub struct TileListeners {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, TileListener)>>,
}

impl TileListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: TileListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Removes the listener registered as `id`. Returns false if there
    /// was none.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let len_before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != len_before
    }

    /// Calls every registered listener.
    ///
    /// Listeners are snapshotted first so they may add or remove
    /// listeners, including themselves, while being notified.
    pub fn notify(&self, key: &TileKey, extent: &GeoExtent) {
        let snapshot: Vec<TileListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(key, extent);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}
