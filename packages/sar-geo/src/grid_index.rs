//! grid_index.rs — Geographic point / box → integer grid row & column
//!
//! The current grid has a fixed origin at its north-west corner and a fixed
//! resolution. Rows grow southward, columns grow eastward. Indices are signed
//! and may fall outside the grid; clamping is the sampler's job.

use serde::{Deserialize, Serialize};

use sar_types::GeoPoint;

use crate::transform::GeoBounds;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridIndexer {
    pub origin_lon: f64,
    pub origin_lat_max: f64,
    pub cells_per_degree: f64,
}

impl Default for GridIndexer {
    fn default() -> Self {
        Self {
            origin_lon: 121.0,
            origin_lat_max: 26.0,
            cells_per_degree: 100.0,
        }
    }
}

/// Inclusive row/column rectangle, `min_* <= max_*` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub min_row: i64,
    pub min_col: i64,
    pub max_row: i64,
    pub max_col: i64,
}

impl IndexRange {
    pub fn rows(&self) -> i64 {
        self.max_row - self.min_row + 1
    }

    pub fn cols(&self) -> i64 {
        self.max_col - self.min_col + 1
    }
}

impl GridIndexer {
    pub fn new(origin_lon: f64, origin_lat_max: f64, cells_per_degree: f64) -> Self {
        Self { origin_lon, origin_lat_max, cells_per_degree }
    }

    /// `(row, col)` of the cell nearest to `p`.
    pub fn point_to_index(&self, p: &GeoPoint) -> (i64, i64) {
        let col = ((p.lon - self.origin_lon) * self.cells_per_degree).round() as i64;
        let row = ((self.origin_lat_max - p.lat) * self.cells_per_degree).round() as i64;
        (row, col)
    }

    /// Index rectangle covering the box. Corner order does not matter.
    pub fn range_to_indices(&self, min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> IndexRange {
        let (r1, c1) = self.point_to_index(&GeoPoint::new(min_lat, min_lon));
        let (r2, c2) = self.point_to_index(&GeoPoint::new(max_lat, max_lon));
        IndexRange {
            min_row: r1.min(r2),
            min_col: c1.min(c2),
            max_row: r1.max(r2),
            max_col: c1.max(c2),
        }
    }

    pub fn bounds_to_indices(&self, bounds: &GeoBounds) -> IndexRange {
        self.range_to_indices(bounds.lat_min, bounds.lon_min, bounds.lat_max, bounds.lon_max)
    }
}
