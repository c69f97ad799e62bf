//! NASADEM file aggregator.

use crate::{
    source::{ListenerId, TerrainSource, TileKey, TileListener, TileListeners, NO_DATA},
    GeoExtent, TerrainError,
};
use geo::geometry::Coord;
use log::debug;
use nasadem::{NasademError, Tile, VOID};
use std::{
    cell::RefCell,
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    rc::Rc,
};

/// Floating point type used for tile lookup.
pub type C = f64;

/// A [`TerrainSource`] backed by a directory of NASADEM HGT tiles.
///
/// Tiles are only consulted once loaded with [`load`](Self::load) or
/// [`load_extent`](Self::load_extent); every load announces the new
/// tile to registered listeners.
pub struct TileSource {
    /// Directory containing NASADEM HGT tile files.
    tile_dir: PathBuf,

    /// How to load tiles (in-memory or mapped).
    tile_mode: TileMode,

    /// Tiles which have been loaded, keyed by SW corner.
    tiles: RefCell<HashMap<Coord<i16>, Rc<Tile>>>,

    /// Interested parties to notify of newly loaded tiles.
    listeners: TileListeners,
}

impl TileSource {
    pub fn new(tile_dir: PathBuf, tile_mode: TileMode) -> Result<Self, TerrainError> {
        let mut has_height_files = false;

        // Let's try to fail early by checking that tile_dir has at
        // least one `hgt` file.
        for entry in std::fs::read_dir(&tile_dir)? {
            let path = entry?.path();
            if path
                .extension()
                .and_then(std::ffi::OsStr::to_str)
                .is_some_and(|ext| ext.eq_ignore_ascii_case("hgt"))
            {
                has_height_files = true;
                break;
            }
        }

        if has_height_files {
            Ok(Self {
                tile_dir,
                tile_mode,
                tiles: RefCell::new(HashMap::new()),
                listeners: TileListeners::new(),
            })
        } else {
            Err(TerrainError::Path(tile_dir))
        }
    }

    /// Loads the tile containing `coord` and notifies listeners.
    ///
    /// Returns `false` if the tile was already loaded or there is no
    /// file for it.
    pub fn load(&self, coord: Coord<C>) -> Result<bool, TerrainError> {
        let sw_corner = sw_corner(coord);
        if self.tiles.borrow().contains_key(&sw_corner) {
            return Ok(false);
        }

        let tile = match self.load_tile(sw_corner) {
            Ok(tile) => Rc::new(tile),
            Err(TerrainError::Nasadem(NasademError::Io(e))) if e.kind() == ErrorKind::NotFound => {
                debug!("no tile on disk for {sw_corner:?}");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        let extent = GeoExtent::from_rect(tile.extent());
        self.tiles.borrow_mut().insert(sw_corner, tile);

        // The map must not be borrowed here; listeners query heights.
        let key = TileKey {
            lod: 0,
            x: i32::from(sw_corner.x),
            y: i32::from(sw_corner.y),
        };
        self.listeners.notify(&key, &extent);
        Ok(true)
    }

    /// Loads every tile touching `extent`, returning the number of
    /// newly loaded tiles.
    pub fn load_extent(&self, extent: &GeoExtent) -> Result<usize, TerrainError> {
        let Some(rect) = extent.rect() else {
            return Ok(0);
        };
        let (min, max) = (sw_corner(rect.min()), sw_corner(rect.max()));
        let mut loaded = 0;
        for lat in min.y..=max.y {
            for lon in min.x..=max.x {
                let center = Coord {
                    x: C::from(lon) + 0.5,
                    y: C::from(lat) + 0.5,
                };
                if self.load(center)? {
                    loaded += 1;
                }
            }
        }
        Ok(loaded)
    }

    /// Returns true if the tile containing `coord` is loaded.
    pub fn is_loaded(&self, coord: Coord<C>) -> bool {
        self.tiles.borrow().contains_key(&sw_corner(coord))
    }

    /// Returns the number of loaded tiles.
    pub fn len(&self) -> usize {
        self.tiles.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.borrow().is_empty()
    }
}

impl TerrainSource for TileSource {
    fn height(&self, coord: Coord<C>) -> f64 {
        if !(coord.x.is_finite() && coord.y.is_finite()) {
            return NO_DATA;
        }
        let Some(tile) = self.tiles.borrow().get(&sw_corner(coord)).map(Rc::clone) else {
            return NO_DATA;
        };
        match tile.get(coord) {
            Some(VOID) | None => NO_DATA,
            Some(elevation) => f64::from(elevation),
        }
    }

    fn add_tile_listener(&self, listener: TileListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_tile_listener(&self, id: ListenerId) {
        self.listeners.remove(id);
    }
}

/// Private API.
impl TileSource {
    fn load_tile(&self, sw_corner: Coord<i16>) -> Result<Tile, TerrainError> {
        let tile_path = {
            let file_name = file_name(sw_corner);
            let mut tile_path: PathBuf = [&self.tile_dir, Path::new(&file_name)].iter().collect();
            if !tile_path.exists() {
                let file_name = file_name.to_lowercase();
                tile_path = [&self.tile_dir, Path::new(&file_name)].iter().collect();
            }
            tile_path
        };
        debug!("loading {tile_path:?}");
        match self.tile_mode {
            TileMode::InMem => Ok(Tile::load(tile_path)?),
            TileMode::MemMap => Ok(Tile::memmap(tile_path)?),
        }
    }
}

/// How to handle tile.
///
/// The trade off between loading tile data into memory versus memory
/// mapping is not obvious, and you should measure both before
/// deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMode {
    /// Parse tile and load into memory.
    ///
    /// Note that this can consume gigabytes of RAM when loading many
    /// tiles.
    InMem,

    /// Memory map file contents.
    MemMap,
}

/// Returns the southwest corner as integers for coord.
#[allow(clippy::cast_possible_truncation)]
fn sw_corner(Coord { x, y }: Coord<C>) -> Coord<i16> {
    Coord {
        x: (x.floor() as i16),
        y: (y.floor() as i16),
    }
}

/// Returns the expected file name for coord
fn file_name(Coord { x, y }: Coord<i16>) -> String {
    let (n_s, lat) = {
        let lat = y.abs();
        let n_s = if y.is_negative() { 'S' } else { 'N' };
        (n_s, lat)
    };
    let (e_w, lon) = {
        let lon = x.abs();
        let e_w = if x.is_negative() { 'W' } else { 'E' };
        (e_w, lon)
    };
    format!("{n_s}{lat:02}{e_w}{lon:03}.hgt")
}
