//! NASADEM evelation (`.hgt`) file format.
//!
//! # References
//!
//! 1. [30-Meter SRTM Tile Downloader](https://dwtkns.com/srtm30m)
//! 1. [Archive Team](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)

mod error;

pub use crate::error::NasademError;
use byteorder::{BigEndian as BE, ByteOrder, ReadBytesExt};
use geo::geometry::{Coord, Rect};
use memmap2::Mmap;
use std::{fs::File, io::BufReader, mem::size_of, path::Path};

/// Base floating point type used for all coordinates and calculations.
pub type C = f64;

/// Sample value SRTM uses to mark a void (no measurement).
pub const VOID: i16 = i16::MIN;

const ARCSEC_PER_DEG: C = 3600.0;

pub struct Tile {
    /// Southwest corner of the tile in whole degrees, as encoded in
    /// the file name.
    sw_corner: Coord<i16>,

    /// Center of the SW most sample of the tile.
    sw_corner_center: Coord<C>,

    /// Arcseconds per sample.
    resolution: u8,

    /// Number of (columns, rows) in this tile.
    dimensions: (usize, usize),

    /// Elevation samples.
    samples: SampleStore,
}

enum SampleStore {
    InMem(Box<[i16]>),
    MemMap(Mmap),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> i16 {
        match self {
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw) => {
                let start = index * size_of::<u16>();
                BE::read_i16(&raw[start..start + size_of::<u16>()])
            }
        }
    }
}

impl Tile {
    /// Returns a Tile read into memory from the file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NasademError> {
        let (resolution, dimensions @ (cols, rows)) = extract_resolution(&path)?;
        let sw_corner = parse_sw_corner(&path)?;

        let samples = {
            let mut file = BufReader::new(File::open(path)?);
            let mut sample_store = vec![0_i16; cols * rows];
            file.read_i16_into::<BE>(&mut sample_store)?;
            SampleStore::InMem(sample_store.into_boxed_slice())
        };

        Ok(Self::with_samples(sw_corner, resolution, dimensions, samples))
    }

    /// Returns a Tile using the memory-mapped file as storage.
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, NasademError> {
        let (resolution, dimensions) = extract_resolution(&path)?;
        let sw_corner = parse_sw_corner(&path)?;

        let samples = {
            let file = File::open(path)?;
            // The file is never written while we hold the mapping.
            let mmap = unsafe { Mmap::map(&file)? };
            SampleStore::MemMap(mmap)
        };

        Ok(Self::with_samples(sw_corner, resolution, dimensions, samples))
    }

    /// Returns the number of samples in this tile.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let (x, y) = self.dimensions;
        x * y
    }

    /// Returns this tile's resolution in arcseconds per sample.
    pub fn resolution(&self) -> u8 {
        self.resolution
    }

    /// Returns the whole-degree southwest corner named by the file.
    pub fn sw_corner(&self) -> Coord<i16> {
        self.sw_corner
    }

    /// Returns the geographic area covered by this tile's samples.
    ///
    /// Samples are centered on their coordinates, so the footprint
    /// extends half a sample beyond the outermost sample centers.
    pub fn extent(&self) -> Rect<C> {
        let step = C::from(self.resolution) / ARCSEC_PER_DEG;
        let half = step / 2.0;
        let (cols, rows) = self.dimensions;
        #[allow(clippy::cast_precision_loss)]
        let ne_corner_center = Coord {
            x: self.sw_corner_center.x + (cols - 1) as C * step,
            y: self.sw_corner_center.y + (rows - 1) as C * step,
        };
        Rect::new(
            Coord {
                x: self.sw_corner_center.x - half,
                y: self.sw_corner_center.y - half,
            },
            Coord {
                x: ne_corner_center.x + half,
                y: ne_corner_center.y + half,
            },
        )
    }

    /// Returns the sample at the given geo coordinates, or `None` if
    /// `coord` is outside this tile.
    #[allow(clippy::cast_possible_wrap)]
    pub fn get(&self, coord: Coord<C>) -> Option<i16> {
        let (idx_x, idx_y) = self.coord_to_xy(coord);
        if 0 <= idx_x
            && idx_x < self.dimensions.0 as isize
            && 0 <= idx_y
            && idx_y < self.dimensions.1 as isize
        {
            #[allow(clippy::cast_sign_loss)]
            let idx_1d = self.xy_to_linear_index((idx_x as usize, idx_y as usize));
            Some(self.samples.get_unchecked(idx_1d))
        } else {
            None
        }
    }
}

/// Private API
impl Tile {
    fn with_samples(
        sw_corner: Coord<i16>,
        resolution: u8,
        dimensions: (usize, usize),
        samples: SampleStore,
    ) -> Self {
        let sw_corner_center = Coord {
            x: C::from(sw_corner.x),
            y: C::from(sw_corner.y),
        };
        Self {
            sw_corner,
            sw_corner_center,
            resolution,
            dimensions,
            samples,
        }
    }

    #[cfg(test)]
    fn get_xy(&self, (x, y): (usize, usize)) -> i16 {
        let idx_1d = self.xy_to_linear_index((x, y));
        self.samples.get_unchecked(idx_1d)
    }

    fn coord_to_xy(&self, coord: Coord<C>) -> (isize, isize) {
        let c = ARCSEC_PER_DEG / C::from(self.resolution);
        // Shift by half a sample so each sample owns the cell centered
        // on it.
        #[allow(clippy::cast_possible_truncation)]
        let x = ((coord.x - self.sw_corner_center.x) * c + 0.5).floor() as isize;
        #[allow(clippy::cast_possible_truncation)]
        let y = ((coord.y - self.sw_corner_center.y) * c + 0.5).floor() as isize;
        (x, y)
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        self.dimensions.0 * (self.dimensions.1 - y - 1) + x
    }
}

fn extract_resolution<P: AsRef<Path>>(path: P) -> Result<(u8, (usize, usize)), NasademError> {
    const RES_1_ARCSECONDS_FILE_LEN: u64 = 3601 * 3601 * size_of::<u16>() as u64;
    const RES_3_ARCSECONDS_FILE_LEN: u64 = 1201 * 1201 * size_of::<u16>() as u64;
    match path.as_ref().metadata().map(|m| m.len())? {
        RES_1_ARCSECONDS_FILE_LEN => Ok((1, (3601, 3601))),
        RES_3_ARCSECONDS_FILE_LEN => Ok((3, (1201, 1201))),
        invalid_len => Err(NasademError::HgtLen(
            invalid_len,
            path.as_ref().to_owned(),
        )),
    }
}

fn parse_sw_corner<P: AsRef<Path>>(path: P) -> Result<Coord<i16>, NasademError> {
    let mk_err = || NasademError::HgtName(path.as_ref().to_owned());
    let name = path
        .as_ref()
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 || !name.is_ascii() {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord { x: lon, y: lat })
}
