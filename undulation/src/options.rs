use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use geoid::{Dms, Hemisphere};
use std::{path::PathBuf, str::FromStr};

/// Look up geoid undulation from a gridded model.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub grid: GridArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Clone, Args)]
pub struct GridArgs {
    /// Undulation grid file.
    #[arg(short, long, global = true, env = "UNDULATION_GRID")]
    pub grid: Option<PathBuf>,

    /// Grid file layout.
    #[arg(long, global = true, value_enum, default_value_t = GridFormat::Text)]
    pub format: GridFormat,

    /// JSON file with `origin_lat`, `origin_lon` and `resolution`.
    /// Overrides the individual flags.
    #[arg(long, global = true)]
    pub meta: Option<PathBuf>,

    /// Latitude of the northernmost row.
    #[arg(long, global = true, default_value_t = 14.983333, allow_hyphen_values = true)]
    pub origin_lat: f64,

    /// Longitude of the westernmost column.
    #[arg(long, global = true, default_value_t = -79.983333, allow_hyphen_values = true)]
    pub origin_lon: f64,

    /// Degrees per sample.
    #[arg(long, global = true, default_value_t = 1.0 / 30.0)]
    pub resolution: f64,

    /// Number of rows, required for binary grids.
    #[arg(long, global = true)]
    pub rows: Option<usize>,

    /// Number of columns, required for binary grids.
    #[arg(long, global = true)]
    pub cols: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GridFormat {
    /// Whitespace-separated text, one row per line.
    Text,
    /// Big-endian f32 samples read into memory.
    Binary,
    /// Big-endian f32 samples, memory mapped.
    Memmap,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interpolate undulation at a point.
    Lookup {
        /// Query "lat,lon" in decimal degrees or DMS.
        #[arg(allow_hyphen_values = true)]
        location: LatLon,

        /// Hemisphere of the latitude; the entered value is taken as
        /// a magnitude.
        #[arg(long)]
        lat_hemisphere: Option<Hemisphere>,

        /// Hemisphere of the longitude; the entered value is taken as
        /// a magnitude.
        #[arg(long)]
        lon_hemisphere: Option<Hemisphere>,

        /// Print a JSON object instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Interpolate every "lat,lon" line of a file (or stdin) to JSON
    /// lines.
    Batch {
        input: Option<PathBuf>,
    },

    /// Print grid dimensions, bounds and value range.
    Info,

    /// Convert decimal degrees to DMS.
    Dms {
        #[arg(allow_hyphen_values = true)]
        decimal: f64,
    },

    /// Convert DMS to decimal degrees.
    Decimal {
        #[arg(allow_hyphen_values = true)]
        dms: Dms,

        #[arg(long)]
        hemisphere: Option<Hemisphere>,
    },
}

/// A "lat,lon" pair, each either decimal degrees or DMS.
#[derive(Clone, Debug, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,

    /// Hemisphere letter written after the latitude, if any.
    pub lat_hemisphere: Option<Hemisphere>,

    /// Hemisphere letter written after the longitude, if any.
    pub lon_hemisphere: Option<Hemisphere>,
}

impl FromStr for LatLon {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (lat_str, lon_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid lat,lon pair"))?;
        let (lat, lat_hemisphere) = parse_angle(lat_str)?;
        let (lon, lon_hemisphere) = parse_angle(lon_str)?;
        Ok(Self {
            lat,
            lon,
            lat_hemisphere,
            lon_hemisphere,
        })
    }
}

fn parse_angle(s: &str) -> Result<(f64, Option<Hemisphere>), AnyError> {
    let s = s.trim();
    if let Ok(decimal) = f64::from_str(s) {
        return Ok((decimal, None));
    }
    let hemisphere = s
        .chars()
        .last()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_string().parse::<Hemisphere>())
        .transpose()?;
    Ok((s.parse::<Dms>()?.to_decimal(), hemisphere))
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, GridFormat, LatLon};
    use clap::Parser;
    use geoid::Hemisphere;

    #[test]
    fn test_parse_latlon() {
        let decimal: LatLon = "4.43,-75.21".parse().unwrap();
        assert_eq!(
            decimal,
            LatLon {
                lat: 4.43,
                lon: -75.21,
                lat_hemisphere: None,
                lon_hemisphere: None,
            }
        );
        let dms: LatLon = "4°30'00\"N, 75°15'00\"W".parse().unwrap();
        assert_eq!(
            dms,
            LatLon {
                lat: 4.5,
                lon: -75.25,
                lat_hemisphere: Some(Hemisphere::North),
                lon_hemisphere: Some(Hemisphere::West),
            }
        );
        assert!("4.43".parse::<LatLon>().is_err());
        assert!("4.43,abc".parse::<LatLon>().is_err());
    }

    #[test]
    fn test_cli_lookup() {
        let cli = Cli::try_parse_from([
            "undulation",
            "--grid",
            "geoid.txt",
            "lookup",
            "4.43,75.21",
            "--lon-hemisphere",
            "W",
        ])
        .unwrap();
        assert_eq!(cli.grid.format, GridFormat::Text);
        assert_eq!(cli.grid.origin_lon, -79.983333);
        match cli.cmd {
            Command::Lookup {
                location,
                lat_hemisphere,
                lon_hemisphere,
                json,
            } => {
                assert_eq!(location.lon, 75.21);
                assert_eq!(lat_hemisphere, None);
                assert_eq!(lon_hemisphere, Some(Hemisphere::West));
                assert!(!json);
            }
            cmd => panic!("unexpected {cmd:?}"),
        }
    }

    #[test]
    fn test_cli_binary_grid() {
        let cli = Cli::try_parse_from([
            "undulation",
            "info",
            "--grid",
            "geoid.f32be",
            "--format",
            "memmap",
            "--rows",
            "600",
            "--cols",
            "450",
            "--origin-lon",
            "-80.0",
        ])
        .unwrap();
        assert_eq!(cli.grid.format, GridFormat::Memmap);
        assert_eq!((cli.grid.rows, cli.grid.cols), (Some(600), Some(450)));
        assert_eq!(cli.grid.origin_lon, -80.0);
    }
}
