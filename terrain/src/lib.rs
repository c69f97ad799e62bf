mod calculator;
mod constants;
mod error;
mod extent;
mod math;
mod point;
mod profile;
mod source;
mod tiles;

pub use crate::{
    calculator::{
        ChangedCallback, ProfileCalculator, ProfileCalculatorBuilder, ProfileCalculatorState,
        ProfileRef, DEFAULT_NUM_SAMPLES,
    },
    constants::EARTH_RADIUS_M,
    error::TerrainError,
    extent::GeoExtent,
    point::{GeoPoint, Srs},
    profile::{ElevationProfile, INVALID_ELEVATION},
    source::{ListenerId, TerrainSource, TileKey, TileListener, TileListeners, NO_DATA},
    tiles::{TileMode, TileSource},
};
