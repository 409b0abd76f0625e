//! Bilinear lookup.

use crate::{GeoidError, GridMeta, ScalarGrid, C};
use geo::geometry::{Coord, Polygon, Rect};

/// The grid cell enclosing a query coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Row of the northwest sample.
    pub row: usize,

    /// Column of the northwest sample.
    pub col: usize,

    pub nw: C,
    pub ne: C,
    pub sw: C,
    pub se: C,

    /// Position of the northwest sample.
    pub nw_corner: Coord<C>,

    /// Position of the southeast sample.
    pub se_corner: Coord<C>,
}

impl Cell {
    /// Bilinearly interpolates `query` from this cell's corners.
    ///
    /// Interpolates along latitude first, independently for the west
    /// and east edges, then along longitude between the two.
    pub fn interpolate(&self, query: Coord<C>) -> C {
        let Coord { x: lon1, y: lat1 } = self.nw_corner;
        let Coord { x: lon2, y: lat2 } = self.se_corner;
        let t = (query.y - lat1) / (lat2 - lat1);
        let west = self.nw + t * (self.sw - self.nw);
        let east = self.ne + t * (self.se - self.ne);
        let u = (query.x - lon1) / (lon2 - lon1);
        west + u * (east - west)
    }

    /// Returns the four corner samples as `[nw, ne, sw, se]`.
    pub fn samples(&self) -> [C; 4] {
        [self.nw, self.ne, self.sw, self.se]
    }

    pub fn polygon(&self) -> Polygon<C> {
        Rect::new(self.nw_corner, self.se_corner).to_polygon()
    }
}

impl ScalarGrid {
    /// Returns the cell enclosing `query`.
    ///
    /// Fails with [GeoidError::OutOfBounds] unless all four corners
    /// of the cell are inside the grid. Queries on the southern or
    /// eastern edge are therefore out of bounds.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn cell(&self, query: Coord<C>) -> Result<Cell, GeoidError> {
        check_coord(query)?;
        let GridMeta {
            origin_lat,
            origin_lon,
            resolution,
        } = *self.meta();
        let (rows, cols) = self.dimensions();

        let row = (origin_lat - query.y) / resolution;
        let col = (query.x - origin_lon) / resolution;
        // Saturating casts: anything absurdly far away fails the
        // bounds check below.
        let r0 = row.floor() as isize;
        let c0 = col.floor() as isize;
        if r0 < 0 || c0 < 0 || r0 >= rows as isize - 1 || c0 >= cols as isize - 1 {
            return Err(GeoidError::OutOfBounds { row: r0, col: c0 });
        }
        let (r0, c0) = (r0 as usize, c0 as usize);

        let lat1 = origin_lat - r0 as C * resolution;
        let lon1 = origin_lon + c0 as C * resolution;
        Ok(Cell {
            row: r0,
            col: c0,
            nw: self.get_unchecked(r0, c0),
            ne: self.get_unchecked(r0, c0 + 1),
            sw: self.get_unchecked(r0 + 1, c0),
            se: self.get_unchecked(r0 + 1, c0 + 1),
            nw_corner: Coord { x: lon1, y: lat1 },
            se_corner: Coord {
                x: lon1 + resolution,
                y: lat1 - resolution,
            },
        })
    }

    /// Returns the bilinearly interpolated value at `query`.
    pub fn interpolate(&self, query: Coord<C>) -> Result<C, GeoidError> {
        Ok(self.cell(query)?.interpolate(query))
    }

    /// Returns the sample of the node nearest to `query`.
    ///
    /// Unlike [ScalarGrid::interpolate], every node including those on
    /// the southern and eastern edges can be looked up.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub fn nearest(&self, query: Coord<C>) -> Result<C, GeoidError> {
        check_coord(query)?;
        let GridMeta {
            origin_lat,
            origin_lon,
            resolution,
        } = *self.meta();
        let (rows, cols) = self.dimensions();
        let row = ((origin_lat - query.y) / resolution).round() as isize;
        let col = ((query.x - origin_lon) / resolution).round() as isize;
        if row < 0 || col < 0 || row >= rows as isize || col >= cols as isize {
            return Err(GeoidError::OutOfBounds { row, col });
        }
        Ok(self.get_unchecked(row as usize, col as usize))
    }
}

/// Returns the bilinearly interpolated value of `grid` at `query`.
pub fn interpolate(grid: &ScalarGrid, query: Coord<C>) -> Result<C, GeoidError> {
    grid.interpolate(query)
}

fn check_coord(coord: Coord<C>) -> Result<(), GeoidError> {
    if (-90.0..=90.0).contains(&coord.y) && (-180.0..=180.0).contains(&coord.x) {
        Ok(())
    } else {
        Err(GeoidError::InvalidCoordinate {
            lat: coord.y,
            lon: coord.x,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{interpolate, Cell, Coord};
    use crate::{GeoidError, GridMeta, ScalarGrid, C};
    use approx::assert_relative_eq;

    const META: GridMeta = GridMeta {
        origin_lat: 10.0,
        origin_lon: -80.0,
        resolution: 0.25,
    };

    fn sample_grid() -> ScalarGrid {
        let mut path = crate::data_dir();
        path.push("sample.txt");
        ScalarGrid::load(path, META).unwrap()
    }

    fn coord(lat: C, lon: C) -> Coord<C> {
        Coord { x: lon, y: lat }
    }

    #[test]
    fn test_nw_corner_of_two_by_two() {
        let meta = GridMeta {
            origin_lat: 14.983333,
            origin_lon: -79.983333,
            resolution: 0.0333333333,
        };
        let grid = ScalarGrid::from_rows(vec![vec![10.0, 20.0], vec![30.0, 40.0]], meta).unwrap();
        assert_eq!(
            interpolate(&grid, coord(14.983333, -79.983333)).unwrap(),
            10.0
        );
        let centroid = coord(
            14.983333 - 0.5 * 0.0333333333,
            -79.983333 + 0.5 * 0.0333333333,
        );
        assert_relative_eq!(grid.interpolate(centroid).unwrap(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cell_neighbors() {
        let grid = sample_grid();
        let cell = grid.cell(coord(9.6, -79.4)).unwrap();
        assert_eq!((cell.row, cell.col), (1, 2));
        assert_eq!(cell.samples(), [13.5, 14.75, 11.0, 12.5]);
        assert_eq!(cell.nw_corner, coord(9.75, -79.5));
        assert_eq!(cell.se_corner, coord(9.5, -79.25));
    }

    #[test]
    fn test_known_value() {
        let grid = sample_grid();
        // Quarter of the way south and half way east inside cell (0, 1).
        let value = grid.interpolate(coord(9.9375, -79.625)).unwrap();
        // west = 13.25 + 0.25 * (12.0 - 13.25) = 12.9375
        // east = 14.0 + 0.25 * (13.5 - 14.0) = 13.875
        assert_relative_eq!(value, 13.40625);
    }

    #[test]
    fn test_exact_nodes() {
        let grid = sample_grid();
        let (rows, cols) = grid.dimensions();
        for row in 0..rows - 1 {
            for col in 0..cols - 1 {
                let node = grid.node_coord(row, col).unwrap();
                assert_eq!(grid.interpolate(node).unwrap(), grid.get(row, col).unwrap());
            }
        }
    }

    #[test]
    fn test_bounded_by_corners() {
        let grid = sample_grid();
        let (rows, cols) = grid.dimensions();
        for row in 0..rows - 1 {
            for col in 0..cols - 1 {
                let nw = grid.node_coord(row, col).unwrap();
                for i in 1..10 {
                    for j in 1..10 {
                        let query = coord(
                            nw.y - C::from(i) * 0.025,
                            nw.x + C::from(j) * 0.025,
                        );
                        let cell = grid.cell(query).unwrap();
                        assert_eq!((cell.row, cell.col), (row, col));
                        let lo = cell.samples().into_iter().fold(C::INFINITY, C::min);
                        let hi = cell.samples().into_iter().fold(C::NEG_INFINITY, C::max);
                        let value = cell.interpolate(query);
                        assert!(lo - 1e-12 <= value && value <= hi + 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_monotonic_along_edges() {
        let grid = sample_grid();
        let (rows, cols) = grid.dimensions();
        // Along each row, between horizontally adjacent nodes.
        for row in 0..rows - 1 {
            for col in 0..cols - 1 {
                let start = grid.node_coord(row, col).unwrap();
                let (a, b) = (grid.get(row, col).unwrap(), grid.get(row, col + 1).unwrap());
                let values: Vec<C> = (0..50)
                    .map(|k| {
                        let query = coord(start.y, start.x + C::from(k) * 0.005);
                        grid.interpolate(query).unwrap()
                    })
                    .collect();
                for pair in values.windows(2) {
                    if b >= a {
                        assert!(pair[0] <= pair[1] + 1e-12);
                    } else {
                        assert!(pair[0] + 1e-12 >= pair[1]);
                    }
                }
            }
        }
        // Along each column, between vertically adjacent nodes.
        for row in 0..rows - 1 {
            for col in 0..cols - 1 {
                let start = grid.node_coord(row, col).unwrap();
                let (a, b) = (grid.get(row, col).unwrap(), grid.get(row + 1, col).unwrap());
                let values: Vec<C> = (0..50)
                    .map(|k| {
                        let query = coord(start.y - C::from(k) * 0.005, start.x);
                        grid.interpolate(query).unwrap()
                    })
                    .collect();
                for pair in values.windows(2) {
                    if b >= a {
                        assert!(pair[0] <= pair[1] + 1e-12);
                    } else {
                        assert!(pair[0] + 1e-12 >= pair[1]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let grid = sample_grid();
        // Assert coordinate a smidge north of grid is out of bounds.
        assert!(matches!(
            grid.interpolate(coord(10.01, -79.5)),
            Err(GeoidError::OutOfBounds { row: -1, col: 2 })
        ));
        // A smidge west.
        assert!(matches!(
            grid.interpolate(coord(9.5, -80.01)),
            Err(GeoidError::OutOfBounds { row: 2, col: -1 })
        ));
        // Exactly on the southern edge: no row below to pair with.
        assert!(matches!(
            grid.interpolate(coord(9.25, -79.5)),
            Err(GeoidError::OutOfBounds { row: 3, col: 2 })
        ));
        // Exactly on the eastern edge.
        assert!(matches!(
            grid.interpolate(coord(9.5, -79.0)),
            Err(GeoidError::OutOfBounds { row: 2, col: 4 })
        ));
        // Far away.
        assert!(matches!(
            grid.interpolate(coord(-45.0, 170.0)),
            Err(GeoidError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_invalid_coordinate() {
        let grid = sample_grid();
        for query in [
            coord(90.5, -79.5),
            coord(9.5, -180.5),
            coord(C::NAN, -79.5),
            coord(9.5, C::INFINITY),
        ] {
            assert!(matches!(
                grid.interpolate(query),
                Err(GeoidError::InvalidCoordinate { .. })
            ));
        }
    }

    #[test]
    fn test_nearest() {
        let grid = sample_grid();
        assert_eq!(grid.nearest(coord(9.26, -79.01)).unwrap(), 3.0);
        assert_eq!(grid.nearest(coord(9.8, -79.8)).unwrap(), 12.0);
        assert!(matches!(
            grid.nearest(coord(9.0, -79.0)),
            Err(GeoidError::OutOfBounds { row: 4, col: 4 })
        ));
    }

    #[test]
    fn test_cell_polygon() {
        let grid = sample_grid();
        let cell: Cell = grid.cell(coord(9.9, -79.9)).unwrap();
        let polygon = cell.polygon();
        assert_eq!(polygon.exterior().0.len(), 5);
        assert!(polygon
            .exterior()
            .0
            .iter()
            .any(|c| *c == cell.nw_corner));
    }

    #[test]
    fn test_shared_between_threads() {
        let grid = sample_grid();
        let query = coord(9.6, -79.4);
        let expected = grid.interpolate(query).unwrap();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| assert_eq!(grid.interpolate(query).unwrap(), expected));
            }
        });
    }
}
