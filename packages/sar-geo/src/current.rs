//! current.rs — Ocean-current grid and its moving-window sampler
//!
//! Speed and direction come as two row-major tables of equal shape. The first
//! few rows are metadata (declared extent in row 0, columns 3..=6) and are
//! stripped before indexing. The sampler clamps an index range to the grid,
//! slices it and keeps roughly `target_per_axis` cells per axis.
//!
//! Directions are compass bearings: 0° = north (+Z), clockwise, so 90° = east (+X).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sar_types::{GeoPoint, WorldPoint};

use crate::error::{GeoError, Result};
use crate::grid_index::{GridIndexer, IndexRange};
use crate::transform::{CoordinateTransformer, GeoBounds};

/// Parsed cell; `None` when the source text was not a finite number.
pub type Cell = Option<f64>;

// ── Layout ────────────────────────────────────────────────────────────────────

/// Where the metadata sits in the raw tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// Leading rows discarded before row 0 of the grid proper.
    pub header_rows: usize,
    pub metadata_row: usize,
    pub lon_min_col: usize,
    pub lat_min_col: usize,
    pub lon_max_col: usize,
    pub lat_max_col: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            header_rows: 3,
            metadata_row: 0,
            lon_min_col: 3,
            lat_min_col: 4,
            lon_max_col: 5,
            lat_max_col: 6,
        }
    }
}

impl GridLayout {
    /// Declared extent from the metadata row, if present and sane.
    pub fn parse_metadata(&self, raw: &[Vec<String>]) -> Option<GeoBounds> {
        let row = raw.get(self.metadata_row)?;
        let field = |col: usize| row.get(col).and_then(|s| parse_cell(s));
        let bounds = GeoBounds {
            lon_min: field(self.lon_min_col)?,
            lat_min: field(self.lat_min_col)?,
            lon_max: field(self.lon_max_col)?,
            lat_max: field(self.lat_max_col)?,
        };
        bounds.is_valid().then_some(bounds)
    }
}

fn parse_cell(s: &str) -> Cell {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_table(raw: &[Vec<String>]) -> (Vec<Vec<Cell>>, usize) {
    let mut invalid = 0;
    let rows = raw
        .iter()
        .map(|row| {
            row.iter()
                .map(|s| {
                    let cell = parse_cell(s);
                    if cell.is_none() {
                        invalid += 1;
                    }
                    cell
                })
                .collect()
        })
        .collect();
    (rows, invalid)
}

// ── Grid ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentGrid {
    speed: Vec<Vec<Cell>>,
    direction: Vec<Vec<Cell>>,
    bounds: GeoBounds,
    width: usize,
    height: usize,
}

impl CurrentGrid {
    /// Build from already-stripped numeric tables.
    pub fn new(speed: Vec<Vec<Cell>>, direction: Vec<Vec<Cell>>, bounds: GeoBounds) -> Result<Self> {
        let height = speed.len();
        let width = speed.iter().map(Vec::len).max().unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(GeoError::EmptyGrid("speed table has no data rows".into()));
        }

        let dir_height = direction.len();
        let dir_width = direction.iter().map(Vec::len).max().unwrap_or(0);
        if dir_height != height || dir_width != width {
            warn!(
                "Direction grid is {}x{}, speed grid is {}x{}; unmatched cells are skipped",
                dir_height, dir_width, height, width
            );
        }

        Ok(Self { speed, direction, bounds, width, height })
    }

    /// Build from raw CSV tables (metadata rows included). Invalid metadata
    /// falls back to `fallback`; unparseable cells are kept as gaps.
    pub fn from_tables(
        speed_raw: &[Vec<String>],
        direction_raw: &[Vec<String>],
        layout: &GridLayout,
        fallback: GeoBounds,
    ) -> Result<Self> {
        let bounds = layout.parse_metadata(speed_raw).unwrap_or_else(|| {
            warn!("Current grid metadata missing or invalid, using {:?}", fallback);
            fallback
        });

        let skip = layout.header_rows;
        let (speed, bad_speed) = parse_table(speed_raw.get(skip..).unwrap_or_default());
        let (direction, bad_dir) = parse_table(direction_raw.get(skip..).unwrap_or_default());
        if bad_speed + bad_dir > 0 {
            warn!("Current grid has {} speed and {} direction cells that are not numbers", bad_speed, bad_dir);
        }

        Self::new(speed, direction, bounds)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    pub fn speed_at(&self, row: usize, col: usize) -> Cell {
        self.speed.get(row)?.get(col).copied().flatten()
    }

    pub fn direction_at(&self, row: usize, col: usize) -> Cell {
        self.direction.get(row)?.get(col).copied().flatten()
    }

    /// Geographic position of a global cell, interpolated across the full grid.
    pub fn cell_geo(&self, row: usize, col: usize) -> GeoPoint {
        let frac = |i: usize, n: usize| if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
        GeoPoint::new(
            self.bounds.lat_max - frac(row, self.height) * self.bounds.lat_span(),
            self.bounds.lon_min + frac(col, self.width) * self.bounds.lon_span(),
        )
    }

    /// Intersect `range` with the grid. `None` when nothing overlaps.
    pub fn clamp_range(&self, range: &IndexRange) -> Option<GridWindow> {
        let min_row = range.min_row.max(0);
        let min_col = range.min_col.max(0);
        let max_row = range.max_row.min(self.height as i64 - 1);
        let max_col = range.max_col.min(self.width as i64 - 1);
        if min_row > max_row || min_col > max_col {
            return None;
        }
        Some(GridWindow {
            min_row: min_row as usize,
            min_col: min_col as usize,
            max_row: max_row as usize,
            max_col: max_col as usize,
        })
    }

    /// Inclusive copy of both tables over `window`.
    pub fn slice(&self, window: &GridWindow) -> GridSlice {
        let take = |table: &[Vec<Cell>]| -> Vec<Vec<Cell>> {
            (window.min_row..=window.max_row)
                .map(|r| {
                    (window.min_col..=window.max_col)
                        .map(|c| table.get(r).and_then(|row| row.get(c)).copied().flatten())
                        .collect()
                })
                .collect()
        };
        GridSlice {
            window: *window,
            speed: take(&self.speed),
            direction: take(&self.direction),
        }
    }
}

/// Clamped, in-grid index rectangle (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridWindow {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

impl GridWindow {
    pub fn rows(&self) -> usize {
        self.max_row - self.min_row + 1
    }

    pub fn cols(&self) -> usize {
        self.max_col - self.min_col + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSlice {
    pub window: GridWindow,
    pub speed: Vec<Vec<Cell>>,
    pub direction: Vec<Vec<Cell>>,
}

// ── Samples ───────────────────────────────────────────────────────────────────

/// One arrow of the rendered current field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentSample {
    /// Global grid row / column.
    pub row: usize,
    pub col: usize,
    pub geo: GeoPoint,
    pub world: WorldPoint,
    pub speed: f64,
    /// Bearing in `[0, 360)`.
    pub direction_deg: f64,
}

impl CurrentSample {
    /// Flow vector in the world frame `(dx east, dz north)`.
    pub fn world_vector(&self) -> WorldPoint {
        let rad = self.direction_deg.to_radians();
        WorldPoint::new(self.speed * rad.sin(), self.speed * rad.cos())
    }

    /// CSS-style clockwise rotation for an arrow glyph pointing up at 0°.
    pub fn screen_rotation_deg(&self) -> f64 {
        self.direction_deg
    }
}

/// Step so that about `target` cells survive along an axis of `len` cells.
pub fn sample_step(len: usize, target: usize) -> usize {
    if target == 0 {
        return 1;
    }
    (len / target).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSampler {
    indexer: GridIndexer,
    transformer: CoordinateTransformer,
    target_per_axis: usize,
}

impl CurrentSampler {
    pub const DEFAULT_TARGET: usize = 20;

    pub fn new(indexer: GridIndexer, transformer: CoordinateTransformer, target_per_axis: usize) -> Self {
        Self { indexer, transformer, target_per_axis }
    }

    pub fn indexer(&self) -> &GridIndexer {
        &self.indexer
    }

    /// Sample the part of `grid` covered by a geographic box.
    pub fn sample_bbox(&self, grid: &CurrentGrid, bbox: &GeoBounds) -> Vec<CurrentSample> {
        let range = self.indexer.bounds_to_indices(bbox);
        self.sample_range(grid, &range)
    }

    /// Clamp, slice and down-sample. Out-of-grid ranges give an empty field.
    pub fn sample_range(&self, grid: &CurrentGrid, range: &IndexRange) -> Vec<CurrentSample> {
        let Some(window) = grid.clamp_range(range) else {
            debug!("Index range {:?} lies outside the {}x{} grid", range, grid.height(), grid.width());
            return Vec::new();
        };
        let slice = grid.slice(&window);
        let row_step = sample_step(window.rows(), self.target_per_axis);
        let col_step = sample_step(window.cols(), self.target_per_axis);

        let mut samples = Vec::new();
        let mut skipped = 0usize;
        for r in (0..window.rows()).step_by(row_step) {
            for c in (0..window.cols()).step_by(col_step) {
                let (Some(speed), Some(direction)) = (slice.speed[r][c], slice.direction[r][c]) else {
                    skipped += 1;
                    continue;
                };
                let row = window.min_row + r;
                let col = window.min_col + c;
                let geo = grid.cell_geo(row, col);
                samples.push(CurrentSample {
                    row,
                    col,
                    geo,
                    world: self.transformer.geo_to_world(&geo),
                    speed,
                    direction_deg: direction.rem_euclid(360.0),
                });
            }
        }

        debug!(
            "Sampled {} current cells from window {:?} (step {}x{}, {} skipped)",
            samples.len(),
            window,
            row_step,
            col_step,
            skipped
        );
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect()
    }

    fn uniform(h: usize, w: usize, v: f64) -> Vec<Vec<Cell>> {
        vec![vec![Some(v); w]; h]
    }

    fn small_grid() -> CurrentGrid {
        let speed = raw(&[
            &["id", "t", "x", "121.6", "25.1", "122.0", "25.3"],
            &["hdr"],
            &["hdr"],
            &["0.5", "0.6", "0.7"],
            &["0.8", "n/a", "1.0"],
            &["1.1", "1.2", "1.3"],
        ]);
        let direction = raw(&[&["meta"], &["hdr"], &["hdr"], &["0", "90", "180"], &["270", "45", "-90"], &["360", "10", "20"]]);
        CurrentGrid::from_tables(&speed, &direction, &GridLayout::default(), GeoBounds::DEFAULT).unwrap()
    }

    #[test]
    fn metadata_row_sets_extent_and_headers_are_stripped() {
        let grid = small_grid();
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.bounds().lon_min, 121.6);
        assert_eq!(grid.bounds().lat_max, 25.3);
        assert_eq!(grid.speed_at(0, 0), Some(0.5));
        assert_eq!(grid.speed_at(1, 1), None);
    }

    #[test]
    fn bad_metadata_falls_back() {
        let speed = raw(&[&["a", "b", "c", "x", "y"], &[], &[], &["1.0"]]);
        let direction = raw(&[&[], &[], &[], &["0"]]);
        let grid = CurrentGrid::from_tables(&speed, &direction, &GridLayout::default(), GeoBounds::DEFAULT).unwrap();
        assert_eq!(*grid.bounds(), GeoBounds::DEFAULT);
    }

    #[test]
    fn empty_table_is_an_error() {
        let speed = raw(&[&["meta"], &[], &[]]);
        let err = CurrentGrid::from_tables(&speed, &speed, &GridLayout::default(), GeoBounds::DEFAULT);
        assert!(matches!(err, Err(GeoError::EmptyGrid(_))));
    }

    #[test]
    fn cell_geo_spans_full_grid() {
        let grid = small_grid();
        let nw = grid.cell_geo(0, 0);
        let se = grid.cell_geo(2, 2);
        assert!((nw.lat - 25.3).abs() < 1e-12 && (nw.lon - 121.6).abs() < 1e-12);
        assert!((se.lat - 25.1).abs() < 1e-12 && (se.lon - 122.0).abs() < 1e-12);
    }

    #[test]
    fn clamp_partial_overlap() {
        let grid = small_grid();
        let w = grid
            .clamp_range(&IndexRange { min_row: -5, min_col: 1, max_row: 1, max_col: 40 })
            .unwrap();
        assert_eq!(w, GridWindow { min_row: 0, min_col: 1, max_row: 1, max_col: 2 });
        assert!(grid.clamp_range(&IndexRange { min_row: 3, min_col: 0, max_row: 9, max_col: 2 }).is_none());
        assert!(grid.clamp_range(&IndexRange { min_row: 0, min_col: -9, max_row: 2, max_col: -1 }).is_none());
    }

    #[test]
    fn sampler_skips_gaps_and_normalizes_bearing() {
        let grid = small_grid();
        let sampler = CurrentSampler::new(GridIndexer::default(), CoordinateTransformer::default(), 20);
        let samples = sampler.sample_range(&grid, &IndexRange { min_row: 0, min_col: 0, max_row: 2, max_col: 2 });
        assert_eq!(samples.len(), 8, "one non-numeric cell skipped");
        assert!(samples.iter().all(|s| (0.0..360.0).contains(&s.direction_deg)));
        let west = samples.iter().find(|s| s.row == 1 && s.col == 2).unwrap();
        assert_eq!(west.direction_deg, 270.0);
    }

    #[test]
    fn smaller_direction_table_limits_sampled_cells() {
        let grid = CurrentGrid::new(uniform(3, 3, 0.4), uniform(2, 2, 30.0), GeoBounds::DEFAULT).unwrap();
        assert_eq!((grid.height(), grid.width()), (3, 3));
        assert_eq!(grid.direction_at(2, 2), None);

        let sampler = CurrentSampler::new(GridIndexer::default(), CoordinateTransformer::default(), 20);
        let samples = sampler.sample_range(&grid, &IndexRange { min_row: 0, min_col: 0, max_row: 2, max_col: 2 });
        assert_eq!(samples.len(), 4, "only the 2x2 overlap has both speed and direction");
        assert!(samples.iter().all(|s| s.row < 2 && s.col < 2), "{samples:?}");
        assert!(samples.iter().all(|s| s.direction_deg == 30.0));
    }

    #[test]
    fn sample_step_targets_about_twenty() {
        assert_eq!(sample_step(5, 20), 1);
        assert_eq!(sample_step(20, 20), 1);
        assert_eq!(sample_step(45, 20), 2);
        assert_eq!(sample_step(200, 20), 10);
    }

    #[test]
    fn large_window_is_downsampled() {
        let grid = CurrentGrid::new(uniform(100, 100, 0.3), uniform(100, 100, 45.0), GeoBounds::DEFAULT).unwrap();
        let sampler = CurrentSampler::new(GridIndexer::default(), CoordinateTransformer::default(), 20);
        let samples = sampler.sample_range(&grid, &IndexRange { min_row: 10, min_col: 10, max_row: 89, max_col: 89 });
        // 80 cells per axis, step 4 → 20 per axis
        assert_eq!(samples.len(), 400);
        assert_eq!(samples[0].row, 10);
        assert_eq!(samples[1].col, 14);
    }

    #[test]
    fn bearing_vector_points_east_at_ninety() {
        let s = CurrentSample {
            row: 0,
            col: 0,
            geo: GeoPoint::default(),
            world: WorldPoint::default(),
            speed: 2.0,
            direction_deg: 90.0,
        };
        let v = s.world_vector();
        assert!((v.x - 2.0).abs() < 1e-12 && v.z.abs() < 1e-12, "got {v:?}");
    }
}
