mod options;

use anyhow::{anyhow, bail, Context, Error as AnyError};
use clap::Parser;
use geo::geometry::Coord;
use geoid::{to_dms, Cell, GridMeta, Hemisphere, ScalarGrid};
use log::{debug, warn};
use options::{Cli, Command as CliCmd, GridArgs, GridFormat, LatLon};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
};

fn main() -> Result<(), AnyError> {
    let Cli { grid, cmd } = Cli::parse();

    env_logger::init();

    match cmd {
        CliCmd::Lookup {
            location,
            lat_hemisphere,
            lon_hemisphere,
            json,
        } => {
            let query = query_coord(&location, lat_hemisphere, lon_hemisphere)?;
            lookup(&load_grid(&grid)?, query, json)
        }
        CliCmd::Batch { input } => batch(&load_grid(&grid)?, input),
        CliCmd::Info => info(&load_grid(&grid)?),
        CliCmd::Dms { decimal } => {
            println!("{}", to_dms(decimal));
            Ok(())
        }
        CliCmd::Decimal { dms, hemisphere } => {
            let dms = hemisphere.map_or(dms, |h| dms.with_hemisphere(h));
            println!("{}", dms.to_decimal());
            Ok(())
        }
    }
}

fn load_grid(args: &GridArgs) -> Result<ScalarGrid, AnyError> {
    let path = args
        .grid
        .as_ref()
        .ok_or_else(|| anyhow!("no grid file, pass --grid or set UNDULATION_GRID"))?;
    let meta = grid_meta(args)?;
    debug!("grid {path:?}, {meta:?}");
    let grid = match args.format {
        GridFormat::Text => ScalarGrid::load(path, meta)?,
        GridFormat::Binary => ScalarGrid::load_binary(path, meta, binary_dimensions(args)?)?,
        GridFormat::Memmap => ScalarGrid::memmap(path, meta, binary_dimensions(args)?)?,
    };
    Ok(grid)
}

fn grid_meta(args: &GridArgs) -> Result<GridMeta, AnyError> {
    match &args.meta {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {path:?}"))?;
            let meta = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("parsing {path:?}"))?;
            Ok(meta)
        }
        None => Ok(GridMeta {
            origin_lat: args.origin_lat,
            origin_lon: args.origin_lon,
            resolution: args.resolution,
        }),
    }
}

fn binary_dimensions(args: &GridArgs) -> Result<(usize, usize), AnyError> {
    match (args.rows, args.cols) {
        (Some(rows), Some(cols)) => Ok((rows, cols)),
        _ => bail!("binary grids need --rows and --cols"),
    }
}

/// Returns the query coordinate, signing each component by its
/// hemisphere when one is given, either written into the location or
/// passed as an option.
fn query_coord(
    location: &LatLon,
    lat_hemisphere: Option<Hemisphere>,
    lon_hemisphere: Option<Hemisphere>,
) -> Result<Coord<f64>, AnyError> {
    let lat = signed(location.lat, location.lat_hemisphere, lat_hemisphere, true)?;
    let lon = signed(location.lon, location.lon_hemisphere, lon_hemisphere, false)?;
    Ok(Coord { x: lon, y: lat })
}

fn signed(
    value: f64,
    written: Option<Hemisphere>,
    requested: Option<Hemisphere>,
    latitude: bool,
) -> Result<f64, AnyError> {
    let axis = if latitude { "latitude" } else { "longitude" };
    for h in written.iter().chain(requested.iter()) {
        if h.is_latitude() != latitude {
            bail!("{h} is not a {axis} hemisphere");
        }
    }
    match (written, requested) {
        (Some(w), Some(r)) if w != r => {
            bail!("{axis} written as {w} conflicts with requested hemisphere {r}")
        }
        (_, Some(r)) => Ok(r.apply(value)),
        _ => Ok(value),
    }
}

#[derive(Serialize)]
struct LookupEntry {
    lat: f64,
    lon: f64,
    lat_dms: String,
    lon_dms: String,
    /// [row, col] of the cell's northwest sample.
    cell: [usize; 2],
    /// [nw, ne, sw, se]
    neighbors: [f64; 4],
    undulation: f64,
}

impl LookupEntry {
    fn new(query: Coord<f64>, cell: &Cell) -> Self {
        Self {
            lat: query.y,
            lon: query.x,
            lat_dms: to_dms(query.y).to_string(),
            lon_dms: to_dms(query.x).to_string(),
            cell: [cell.row, cell.col],
            neighbors: cell.samples(),
            undulation: cell.interpolate(query),
        }
    }
}

fn lookup(grid: &ScalarGrid, query: Coord<f64>, json: bool) -> Result<(), AnyError> {
    let cell = grid.cell(query)?;
    let entry = LookupEntry::new(query, &cell);
    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer(&mut stdout, &entry)?;
        writeln!(stdout)?;
    } else {
        let [nw, ne, sw, se] = entry.neighbors;
        writeln!(stdout, "latitude:   {:>12} ({})", entry.lat, entry.lat_dms)?;
        writeln!(stdout, "longitude:  {:>12} ({})", entry.lon, entry.lon_dms)?;
        writeln!(stdout, "cell:       {:?}", entry.cell)?;
        writeln!(stdout, "neighbors:  {nw} {ne}")?;
        writeln!(stdout, "            {sw} {se}")?;
        writeln!(stdout, "undulation: {} m", entry.undulation)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct BatchEntry {
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    undulation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BatchEntry {
    fn new(grid: &ScalarGrid, line: usize, text: &str) -> Self {
        let result = text.parse::<LatLon>().and_then(|location| {
            let query = query_coord(&location, None, None)?;
            Ok((query, grid.interpolate(query)?))
        });
        match result {
            Ok((query, undulation)) => Self {
                line,
                lat: Some(query.y),
                lon: Some(query.x),
                undulation: Some(undulation),
                error: None,
            },
            Err(e) => {
                warn!("line {line}: {e}");
                Self {
                    line,
                    lat: None,
                    lon: None,
                    undulation: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn batch(grid: &ScalarGrid, input: Option<PathBuf>) -> Result<(), AnyError> {
    let rdr: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(
            File::open(&path).with_context(|| format!("opening {path:?}"))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let mut stdout = io::stdout().lock();
    for (idx, line) in rdr.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let entry = BatchEntry::new(grid, idx + 1, text);
        serde_json::to_writer(&mut stdout, &entry)?;
        writeln!(stdout)?;
    }
    Ok(())
}

fn info(grid: &ScalarGrid) -> Result<(), AnyError> {
    let (rows, cols) = grid.dimensions();
    let bounds = grid.bounds();
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "dimensions: {rows} x {cols}")?;
    writeln!(stdout, "resolution: {}°", grid.meta().resolution)?;
    writeln!(
        stdout,
        "north-west: {}, {}",
        bounds.max().y,
        bounds.min().x
    )?;
    writeln!(
        stdout,
        "south-east: {}, {}",
        bounds.min().y,
        bounds.max().x
    )?;
    writeln!(stdout, "range:      {} .. {}", grid.min(), grid.max())?;
    Ok(())
}
