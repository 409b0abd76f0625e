//! Geoid undulation grids.
//!
//! A [ScalarGrid] is a north-up raster of scalar samples on a regular
//! lat/lon lattice. The typical payload is geoid undulation (the
//! separation between the geoid and the reference ellipsoid, in
//! meters), but nothing here cares what the samples mean.
//!
//! Lookups are bilinear over the four samples enclosing the query.
//! The [dms] module converts between decimal degrees and
//! degrees/minutes/seconds for presenting coordinates.

mod error;
mod grid;
mod interp;
mod source;

pub mod dms;

pub use crate::{
    dms::{to_decimal, to_dms, Dms, Hemisphere, Sign},
    error::{DataSourceError, GeoidError},
    grid::{GridMeta, Sample, ScalarGrid},
    interp::{interpolate, Cell},
};
pub use geo;

/// Base floating point type used for all coordinates and samples.
pub type C = f64;

#[cfg(test)]
fn data_dir() -> std::path::PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "..", "data", "geoid"]
        .iter()
        .collect()
}
