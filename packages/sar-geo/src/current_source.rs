//! current_source.rs — Loading the speed/direction CSVs and caching the grid
//!
//! The cache is an owned value handed to whoever samples; there is no global
//! "last fetched grid". A failed fetch never clobbers a good grid.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use tracing::{info, warn};

use crate::current::{CurrentGrid, CurrentSample, CurrentSampler, GridLayout};
use crate::error::{GeoError, Result};
use crate::transform::GeoBounds;

/// Anything that can produce a fresh current grid.
pub trait GridSource {
    fn fetch(&self) -> Result<CurrentGrid>;
}

/// Read a header-less CSV into string rows. Record lengths may vary.
pub fn read_table<R: io::Read>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// `speed.csv` + `direction.csv` on disk.
#[derive(Debug, Clone)]
pub struct CsvGridSource {
    speed_path: PathBuf,
    direction_path: PathBuf,
    layout: GridLayout,
    fallback: GeoBounds,
}

impl CsvGridSource {
    pub fn new(speed_path: impl Into<PathBuf>, direction_path: impl Into<PathBuf>) -> Self {
        Self {
            speed_path: speed_path.into(),
            direction_path: direction_path.into(),
            layout: GridLayout::default(),
            fallback: GeoBounds::DEFAULT,
        }
    }

    /// Both files inside `dir` under their conventional names.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("speed.csv"), dir.join("direction.csv"))
    }

    pub fn with_layout(mut self, layout: GridLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_fallback(mut self, fallback: GeoBounds) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn speed_path(&self) -> &Path {
        &self.speed_path
    }

    pub fn direction_path(&self) -> &Path {
        &self.direction_path
    }

    fn read_file(path: &Path) -> Result<Vec<Vec<String>>> {
        let file = std::fs::File::open(path)?;
        read_table(io::BufReader::new(file))
    }
}

impl GridSource for CsvGridSource {
    fn fetch(&self) -> Result<CurrentGrid> {
        let speed = Self::read_file(&self.speed_path)?;
        let direction = Self::read_file(&self.direction_path)?;
        CurrentGrid::from_tables(&speed, &direction, &self.layout, self.fallback)
    }
}

// ── Cache ─────────────────────────────────────────────────────────────────────

pub struct CurrentCache<S> {
    source: S,
    grid: Option<CurrentGrid>,
    fetched_at: Option<DateTime<Utc>>,
}

impl<S: GridSource> CurrentCache<S> {
    pub fn new(source: S) -> Self {
        Self { source, grid: None, fetched_at: None }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Cached grid, fetching it first if nothing is cached yet.
    pub fn get_or_fetch(&mut self) -> Result<&CurrentGrid> {
        if self.grid.is_none() {
            self.refresh()?;
        }
        self.grid
            .as_ref()
            .ok_or_else(|| GeoError::EmptyGrid("current grid not loaded".into()))
    }

    /// Refetch unconditionally. On failure the previous grid stays cached.
    pub fn force_refresh(&mut self) -> Result<&CurrentGrid> {
        self.refresh()?;
        self.grid
            .as_ref()
            .ok_or_else(|| GeoError::EmptyGrid("current grid not loaded".into()))
    }

    pub fn cached(&self) -> Option<&CurrentGrid> {
        self.grid.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.grid = None;
        self.fetched_at = None;
    }

    /// Time of the last successful fetch.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    fn refresh(&mut self) -> Result<()> {
        match self.source.fetch() {
            Ok(grid) => {
                info!("Current grid loaded: {}x{} cells", grid.height(), grid.width());
                self.grid = Some(grid);
                self.fetched_at = Some(Utc::now());
                Ok(())
            }
            Err(e) => {
                warn!("Current grid fetch failed: {}", e);
                Err(e)
            }
        }
    }
}

impl CurrentSampler {
    /// Sample `bbox` from the cache, loading the grid on first use.
    pub fn sample_cached<S: GridSource>(
        &self,
        cache: &mut CurrentCache<S>,
        bbox: &GeoBounds,
    ) -> Result<Vec<CurrentSample>> {
        let grid = cache.get_or_fetch()?;
        Ok(self.sample_bbox(grid, bbox))
    }
}
