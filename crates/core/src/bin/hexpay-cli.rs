//! HexPay CLI Tool
//!
//! Command-line interface for parsing coordinates, inspecting grid cells,
//! building geofences from coordinate lists and validating locations against
//! a committed geofence without running the service.

use clap::{Parser, Subcommand};
use hexpay_core::coordinate::{self, CoordinateOrder};
use hexpay_core::{
    BatchAddReport, Cell, Config, GeofenceRecord, GeofenceSet, GridIndexer, H3Grid, LatLng,
    LocationValidator, LockedGeofence, Resolution,
};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "hexpay-cli")]
#[command(about = "Build and check hexagonal payment geofences", long_about = None)]
struct Args {
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a "lat, lng" text the way the search box does
    Parse {
        /// Coordinate text
        text: String,
    },
    /// Grid cell containing a point
    Cell {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Grid resolution (0-15)
        #[arg(long)]
        resolution: Option<u8>,
    },
    /// Cells within `ring` steps of a cell, origin included
    Neighbors {
        /// Cell index in hex
        cell: String,
        /// Ring distance
        #[arg(long, default_value = "1")]
        ring: u32,
    },
    /// Build and commit a geofence from a file of coordinates, one per line
    Build {
        /// Input file ('#' starts a comment)
        #[arg(long, short)]
        input: PathBuf,
        /// Grid resolution (0-15)
        #[arg(long)]
        resolution: Option<u8>,
        /// Expand the picked cells by this many rings
        #[arg(long)]
        expand: Option<u32>,
        /// Owner recorded in the committed geofence
        #[arg(long)]
        owner: Option<String>,
        /// Write the committed geofence here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Check a location against a committed geofence
    Validate {
        /// Geofence JSON file
        #[arg(long, short)]
        geofence: PathBuf,
        /// Coordinate text, e.g. "24.7136, 46.6753"
        coordinates: String,
    },
}

/// JSON output for cell command
#[derive(Debug, Serialize)]
struct CellOutput {
    cell: String,
    resolution: u8,
    center: LatLng,
}

/// JSON output for build command
#[derive(Debug, Serialize)]
struct BuildOutput {
    cell_count: usize,
    resolution: u8,
    added: usize,
    duplicates: usize,
    expanded: usize,
    skipped_lines: usize,
    success: bool,
}

fn read_points_from_file(path: &PathBuf) -> io::Result<(Vec<LatLng>, usize)> {
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let mut points = Vec::new();
    let mut skipped = 0;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match coordinate::parse(line) {
            Some(point) => points.push(point),
            None => {
                eprintln!("Skipping unparsable line: {}", line);
                skipped += 1;
            }
        }
    }

    Ok((points, skipped))
}

fn load_config(path: Option<PathBuf>) -> Result<Config, String> {
    match path {
        Some(path) => Config::from_file(&path)
            .map_err(|e| format!("Failed to load config {}: {}", path.display(), e)),
        None => Ok(Config::default_config()),
    }
}

/// Read a stored geofence in any of its shapes, checking every cell.
fn load_geofence(content: &str) -> Result<LockedGeofence, String> {
    let record = GeofenceRecord::from_json(content)
        .map_err(|e| format!("Failed to parse geofence: {}", e))?;
    record
        .into_locked(&H3Grid::new())
        .map_err(|e| format!("Invalid geofence: {}", e))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn cmd_parse(text: &str, json: bool) -> Result<(), String> {
    let point = coordinate::parse(text)
        .ok_or_else(|| format!("'{}' is not a 'lat, lng' pair", text))?;

    if json {
        print_json(&point)
    } else {
        println!("{}", coordinate::format(&point, CoordinateOrder::LatLng));
        Ok(())
    }
}

fn cmd_cell(lat: f64, lng: f64, resolution: u8, json: bool) -> Result<(), String> {
    let grid = H3Grid::new();
    let resolution = Resolution::new(resolution).map_err(|e| e.to_string())?;
    let cell = grid
        .point_to_cell(lat, lng, resolution)
        .map_err(|e| e.to_string())?;
    let center = grid.cell_center(cell).map_err(|e| e.to_string())?;

    if json {
        print_json(&CellOutput {
            cell: cell.to_string(),
            resolution: resolution.value(),
            center,
        })
    } else {
        println!("Cell:       {}", cell);
        println!("Resolution: {}", resolution);
        println!("Center:     {}", center);
        Ok(())
    }
}

fn cmd_neighbors(cell: &str, ring: u32, json: bool) -> Result<(), String> {
    let cell: Cell = cell.parse().map_err(|e: hexpay_core::GeofenceError| e.to_string())?;
    let mut neighbors = H3Grid::new()
        .neighbors(cell, ring)
        .map_err(|e| e.to_string())?;
    neighbors.sort();

    if json {
        print_json(&neighbors)
    } else {
        for neighbor in neighbors {
            println!("{}", neighbor);
        }
        Ok(())
    }
}

fn cmd_build(
    input: PathBuf,
    resolution: u8,
    expand: u32,
    max_ring: u32,
    owner: Option<String>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), String> {
    let (points, skipped_lines) =
        read_points_from_file(&input).map_err(|e| format!("Failed to read input: {}", e))?;

    if points.is_empty() {
        return Err("No coordinates found in input file".to_string());
    }

    let mut set = GeofenceSet::new().with_max_ring(max_ring);
    let BatchAddReport { added, duplicates } = set
        .add_points(points, resolution)
        .map_err(|e| e.to_string())?;

    let expanded = if expand > 0 {
        set.expand_neighbors(expand).map_err(|e| e.to_string())?
    } else {
        Vec::new()
    };

    let locked = set.commit(owner).map_err(|e| e.to_string())?;
    let geofence_json = serde_json::to_string_pretty(&locked)
        .map_err(|e| format!("Failed to serialize geofence: {}", e))?;

    match &output {
        Some(path) => fs::write(path, &geofence_json)
            .map_err(|e| format!("Failed to write output: {}", e))?,
        None if !json => println!("{}", geofence_json),
        None => {}
    }

    if json {
        print_json(&BuildOutput {
            cell_count: locked.len(),
            resolution: locked.resolution().value(),
            added: added.len(),
            duplicates: duplicates.len(),
            expanded: expanded.len(),
            skipped_lines,
            success: true,
        })?;
    } else if let Some(path) = output {
        println!(
            "Committed {} cells at resolution {} ({} picked, {} duplicates, {} from expansion)",
            locked.len(),
            locked.resolution(),
            added.len(),
            duplicates.len(),
            expanded.len()
        );
        println!("Geofence written to {}", path.display());
    }

    Ok(())
}

fn cmd_validate(
    geofence: PathBuf,
    coordinates: &str,
    config: &Config,
    json: bool,
) -> Result<(), String> {
    let content =
        fs::read_to_string(&geofence).map_err(|e| format!("Failed to read geofence: {}", e))?;
    let locked = load_geofence(&content)?;
    let point = coordinate::parse(coordinates)
        .ok_or_else(|| format!("'{}' is not a 'lat, lng' pair", coordinates))?;

    let validator = LocationValidator::new().with_messages(config.verdict_messages());
    let result = validator
        .validate(&locked, point.lat, point.lng)
        .map_err(|e| e.to_string())?;

    if json {
        print_json(&result)?;
    } else {
        println!("{}", result.message);
        println!("Candidate cell: {}", result.candidate_cell);
    }

    if result.is_valid {
        Ok(())
    } else {
        process::exit(2);
    }
}

fn main() {
    let args = Args::parse();

    let config = match load_config(args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let default_resolution = config.grid.default_resolution;

    let result = match args.command {
        Command::Parse { text } => cmd_parse(&text, args.json),
        Command::Cell {
            lat,
            lng,
            resolution,
        } => cmd_cell(lat, lng, resolution.unwrap_or(default_resolution), args.json),
        Command::Neighbors { cell, ring } => cmd_neighbors(&cell, ring, args.json),
        Command::Build {
            input,
            resolution,
            expand,
            owner,
            output,
        } => cmd_build(
            input,
            resolution.unwrap_or(default_resolution),
            expand.unwrap_or(config.grid.expansion_ring),
            config.grid.max_expansion_ring,
            owner,
            output,
            args.json,
        ),
        Command::Validate {
            geofence,
            coordinates,
        } => cmd_validate(geofence, &coordinates, &config, args.json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
