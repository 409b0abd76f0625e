//! Grid loaders.
//!
//! Two on-disk layouts are understood:
//!
//! 1. Plain text: one row per line, whitespace-separated samples,
//!    north to south. Blank lines and `#` comments are skipped.
//! 1. Raw binary: row-major big-endian `f32` samples with no header.
//!    Dimensions must be supplied by the caller and are checked
//!    against the file length.

use crate::{grid::SampleStore, DataSourceError, GeoidError, GridMeta, ScalarGrid, C};
use byteorder::{BigEndian as BE, ReadBytesExt};
use log::debug;
use memmap2::Mmap;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    mem::size_of,
    path::Path,
};

impl ScalarGrid {
    /// Returns a grid read from the text file at `path`.
    pub fn load<P: AsRef<Path>>(path: P, meta: GridMeta) -> Result<Self, GeoidError> {
        debug!("loading text grid {:?}", path.as_ref());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), meta)
    }

    /// Returns a grid parsed from whitespace-separated text.
    pub fn from_reader<R: BufRead>(rdr: R, meta: GridMeta) -> Result<Self, GeoidError> {
        let (samples, dimensions) = parse_text(rdr)?;
        debug!("parsed {}x{} text grid", dimensions.0, dimensions.1);
        Self::new(samples, dimensions, meta)
    }

    /// Returns a grid read into memory from the binary file at `path`.
    pub fn load_binary<P: AsRef<Path>>(
        path: P,
        meta: GridMeta,
        dimensions: (usize, usize),
    ) -> Result<Self, GeoidError> {
        check_len(&path, dimensions)?;
        debug!("loading binary grid {:?}", path.as_ref());
        let (rows, cols) = dimensions;
        let mut file = BufReader::new(File::open(path)?);
        let mut samples = Vec::with_capacity(rows * cols);
        for _ in 0..(rows * cols) {
            let sample = file.read_f32::<BE>()?;
            samples.push(C::from(sample));
        }
        Self::new(samples, dimensions, meta)
    }

    /// Returns a grid using the memory-mapped binary file at `path`
    /// as storage.
    pub fn memmap<P: AsRef<Path>>(
        path: P,
        meta: GridMeta,
        dimensions: (usize, usize),
    ) -> Result<Self, GeoidError> {
        check_len(&path, dimensions)?;
        debug!("mapping binary grid {:?}", path.as_ref());
        let file = File::open(path)?;
        // The grid is read-only; the file must not be truncated while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::with_store(SampleStore::MemMap(mmap), dimensions, meta)
    }
}

fn parse_text<R: BufRead>(rdr: R) -> Result<(Vec<C>, (usize, usize)), DataSourceError> {
    let mut samples = Vec::new();
    let mut rows = 0;
    let mut cols = 0;
    for (idx, line) in rdr.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let data = line.split('#').next().unwrap_or_default().trim();
        if data.is_empty() {
            continue;
        }
        let start = samples.len();
        for token in data.split_whitespace() {
            let sample = token.parse::<C>().map_err(|_| DataSourceError::Parse {
                line: line_no,
                token: token.to_owned(),
            })?;
            samples.push(sample);
        }
        let found = samples.len() - start;
        if rows == 0 {
            cols = found;
        } else if found != cols {
            return Err(DataSourceError::Ragged {
                line: line_no,
                expected: cols,
                found,
            });
        }
        rows += 1;
    }
    if rows == 0 {
        return Err(DataSourceError::Empty);
    }
    Ok((samples, (rows, cols)))
}

fn check_len<P: AsRef<Path>>(path: P, (rows, cols): (usize, usize)) -> Result<(), DataSourceError> {
    let expected = (rows * cols * size_of::<f32>()) as u64;
    match path.as_ref().metadata().map(|m| m.len())? {
        len if len == expected => Ok(()),
        len => Err(DataSourceError::Len {
            len,
            path: path.as_ref().to_owned(),
        }),
    }
}
