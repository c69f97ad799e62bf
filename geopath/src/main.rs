mod options;

use anyhow::{anyhow, Error as AnyError};
use clap::Parser;
use log::info;
use options::{Cli, Command as CliCmd, LatLon};
use serde::Serialize;
use std::{io::Write, rc::Rc};
use terrain::{
    ChangedCallback, ElevationProfile, GeoExtent, ProfileCalculatorBuilder,
    ProfileCalculatorState, TileMode, TileSource, NO_DATA,
};
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    env_logger::init();

    let Cli {
        srtm_dir,
        mem_map,
        start: LatLon(start),
        dest: LatLon(dest),
        samples,
        cmd,
    } = Cli::parse();

    let tile_mode = if mem_map {
        TileMode::MemMap
    } else {
        TileMode::InMem
    };
    let tile_src = Rc::new(TileSource::new(srtm_dir, tile_mode)?);

    // No tiles are loaded yet, so this first profile has no terrain.
    let calculator = ProfileCalculatorBuilder::new()
        .start(start)
        .end(dest)
        .num_samples(samples)
        .build(Rc::clone(&tile_src))?;

    let progress: Rc<dyn ChangedCallback> = Rc::new(|state: &ProfileCalculatorState| {
        let profile = state.profile();
        let with_terrain = profile
            .elevations()
            .iter()
            .filter(|elev| **elev != NO_DATA)
            .count();
        info!(
            "profile updated; {with_terrain}/{} samples have terrain",
            profile.num_elevations()
        );
    });
    calculator.add_changed_callback(Rc::clone(&progress));

    let mut path_extent = GeoExtent::empty();
    path_extent.expand_to_include(start.to_geographic().coord);
    path_extent.expand_to_include(dest.to_geographic().coord);
    let loaded = tile_src.load_extent(&path_extent)?;
    info!("loaded {loaded} tiles");

    calculator.remove_changed_callback(&progress);

    let profile = calculator.profile().clone();
    match cmd {
        CliCmd::Display => display(&profile),
        CliCmd::Json => json(&profile),
        CliCmd::Plot => plot(&profile),
    }
}

fn display(profile: &ElevationProfile) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    for (i, (distance, elevation)) in profile.iter().enumerate() {
        if elevation == NO_DATA {
            writeln!(stdout, "{i:4}: {distance:10.1}m: no data")?;
        } else {
            writeln!(stdout, "{i:4}: {distance:10.1}m: {elevation}")?;
        }
    }
    Ok(())
}

fn json(profile: &ElevationProfile) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct JsonEntry {
        distance: f64,
        elevation: Option<f64>,
    }

    let reshaped: Vec<JsonEntry> = profile
        .iter()
        .map(|(distance, elevation)| JsonEntry {
            distance,
            elevation: (elevation != NO_DATA).then_some(elevation),
        })
        .collect();
    let json = serde_json::to_string(&reshaped)?;
    println!("{json}");
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn plot(profile: &ElevationProfile) -> Result<(), AnyError> {
    let points: Vec<(f32, f32)> = profile
        .iter()
        .filter(|(_, elevation)| *elevation != NO_DATA)
        .map(|(distance, elevation)| (distance as f32, elevation as f32))
        .collect();
    if points.is_empty() {
        return Err(anyhow!("no terrain along path"));
    }
    let x_max = profile.total_distance().max(1.0) as f32;
    Chart::new(180, 60, 0.0, x_max)
        .lineplot(&Shape::Lines(&points))
        .display();
    Ok(())
}
