use anyhow::{anyhow, Error as AnyError};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, str::FromStr};
use terrain::{GeoPoint, DEFAULT_NUM_SAMPLES};

/// A tool for generating terrain profiles.
#[derive(Parser, Debug)]
pub struct Cli {
    /// Directory containing SRTM hgt tiles.
    #[arg(short, long)]
    pub srtm_dir: PathBuf,

    /// Memory map tiles instead of reading them into memory.
    #[arg(long)]
    pub mem_map: bool,

    /// Start "lat,lon"
    #[arg(long)]
    pub start: LatLon,

    /// Destination "lat,lon"
    #[arg(long)]
    pub dest: LatLon,

    /// Number of samples along the path (at least 2).
    #[arg(short = 'n', long, default_value_t = DEFAULT_NUM_SAMPLES)]
    pub samples: usize,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Clone, Copy, Debug)]
pub struct LatLon(pub GeoPoint);

impl FromStr for LatLon {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (lat_str, lon_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid lat,lon pair"))?;
        let lat = f64::from_str(lat_str.trim())?;
        let lon = f64::from_str(lon_str.trim())?;
        Ok(Self(GeoPoint::geographic(lon, lat)))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print terrain values to screen.
    Display,

    /// Print terrain values as JSON.
    Json,

    /// Plot terrain to the terminal.
    Plot,
}
