//! config.rs — Dashboard configuration (TOML)
//!
//! Every section is optional; a missing section takes the Keelung scenario
//! defaults. The binary reads `--config`, falling back to its bundled
//! `config.toml`, then applies environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sar_types::{NamedRoute, ScreenPoint};

use crate::current::{CurrentSampler, GridLayout};
use crate::current_source::CsvGridSource;
use crate::error::{GeoError, Result};
use crate::grid_index::GridIndexer;
use crate::rescue::{RescuePlanner, DEFAULT_FORWARD_FACTOR, DEFAULT_INTERMEDIATE_COUNT};
use crate::transform::{CoordinateTransformer, GeoBounds, WorldBounds};
use crate::viewport::{ScaleLimits, ViewportState};
use crate::waypoint::validate_route;

/// Directory holding `speed.csv` / `direction.csv`, overrides `[grid].data_dir`.
pub const CURRENT_DIR_ENV: &str = "SAR_CURRENT_DIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub map: MapConfig,
    pub viewport: ViewportConfig,
    pub pip: PipConfig,
    pub grid: GridConfig,
    pub rescue: RescueConfig,
    pub routes: Vec<NamedRoute>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub world: WorldBounds,
    pub geo: GeoBounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub initial_scale: f64,
    /// `[x, y]` in screen pixels
    pub initial_pan: [f64; 2],
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.001,
            max_scale: 5.0,
            initial_scale: 1.0,
            initial_pan: [-4000.0, -7000.0],
        }
    }
}

/// Picture-in-picture follow camera. Its pan is set by each follow, so only
/// the zoom range and starting zoom are configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub initial_scale: f64,
}

impl Default for PipConfig {
    fn default() -> Self {
        Self { min_scale: 1.0, max_scale: 4.0, initial_scale: 2.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub origin_lon: f64,
    pub origin_lat_max: f64,
    pub cells_per_degree: f64,
    pub samples_per_axis: usize,
    pub data_dir: PathBuf,
    pub layout: GridLayout,
}

impl Default for GridConfig {
    fn default() -> Self {
        let indexer = GridIndexer::default();
        Self {
            origin_lon: indexer.origin_lon,
            origin_lat_max: indexer.origin_lat_max,
            cells_per_degree: indexer.cells_per_degree,
            samples_per_axis: CurrentSampler::DEFAULT_TARGET,
            data_dir: PathBuf::from("data/currents"),
            layout: GridLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RescueConfig {
    pub intermediate_count: usize,
    /// Distance past the area center, in radii
    pub forward_factor: f64,
    pub departure_route: String,
}

impl Default for RescueConfig {
    fn default() -> Self {
        Self {
            intermediate_count: DEFAULT_INTERMEDIATE_COUNT,
            forward_factor: DEFAULT_FORWARD_FACTOR,
            departure_route: "route_001".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: DashboardConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read `path` if given and readable, otherwise parse `bundled`.
    /// A file that exists but fails to parse is an error, not a fallback.
    pub fn load(path: Option<&Path>, bundled: &str) -> Result<Self> {
        let text = match path {
            Some(p) => match std::fs::read_to_string(p) {
                Ok(text) => {
                    info!("Loaded config from {}", p.display());
                    text
                }
                Err(e) => {
                    warn!("Failed to read {}: {e}, using bundled config", p.display());
                    bundled.to_string()
                }
            },
            None => bundled.to_string(),
        };

        let mut cfg = Self::from_toml_str(&text)?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(CURRENT_DIR_ENV) {
            info!("{CURRENT_DIR_ENV}={dir}");
            self.grid.data_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        ScaleLimits::new(self.viewport.min_scale, self.viewport.max_scale)?;
        if !(self.viewport.initial_scale.is_finite() && self.viewport.initial_scale > 0.0) {
            return Err(GeoError::InvalidConfig(format!(
                "viewport.initial_scale must be positive, got {}",
                self.viewport.initial_scale
            )));
        }
        ScaleLimits::new(self.pip.min_scale, self.pip.max_scale)?;
        if !(self.pip.initial_scale.is_finite() && self.pip.initial_scale > 0.0) {
            return Err(GeoError::InvalidConfig(format!(
                "pip.initial_scale must be positive, got {}",
                self.pip.initial_scale
            )));
        }
        if !self.map.world.is_valid() {
            return Err(GeoError::InvalidConfig(format!("degenerate world rectangle {:?}", self.map.world)));
        }
        if !self.map.geo.is_valid() {
            return Err(GeoError::InvalidConfig(format!("degenerate geo rectangle {:?}", self.map.geo)));
        }
        if !(self.grid.cells_per_degree.is_finite() && self.grid.cells_per_degree > 0.0) {
            return Err(GeoError::InvalidConfig(format!(
                "grid.cells_per_degree must be positive, got {}",
                self.grid.cells_per_degree
            )));
        }
        if self.grid.samples_per_axis == 0 {
            return Err(GeoError::InvalidConfig("grid.samples_per_axis must be at least 1".into()));
        }
        if !(self.rescue.forward_factor.is_finite() && self.rescue.forward_factor >= 0.0) {
            return Err(GeoError::InvalidConfig(format!(
                "rescue.forward_factor must be non-negative, got {}",
                self.rescue.forward_factor
            )));
        }
        for route in &self.routes {
            validate_route(&route.waypoints)
                .map_err(|e| GeoError::InvalidConfig(format!("route {}: {e}", route.name)))?;
        }
        if self.departure_route().is_none() {
            warn!("Departure route {} is not configured; rescue planning disabled", self.rescue.departure_route);
        }
        Ok(())
    }

    pub fn departure_route(&self) -> Option<&NamedRoute> {
        self.routes.iter().find(|r| r.name == self.rescue.departure_route)
    }

    // ── Builders ──────────────────────────────────────────────────────────────

    pub fn transformer(&self) -> CoordinateTransformer {
        CoordinateTransformer::new(self.map.world, self.map.geo)
    }

    pub fn viewport_state(&self) -> Result<ViewportState> {
        ViewportState::from_config(&self.viewport)
    }

    pub fn pip_viewport_state(&self) -> Result<ViewportState> {
        let limits = ScaleLimits::new(self.pip.min_scale, self.pip.max_scale)?;
        Ok(ViewportState::new(limits, self.pip.initial_scale, ScreenPoint::new(0.0, 0.0)))
    }

    pub fn indexer(&self) -> GridIndexer {
        GridIndexer::new(self.grid.origin_lon, self.grid.origin_lat_max, self.grid.cells_per_degree)
    }

    pub fn sampler(&self) -> CurrentSampler {
        CurrentSampler::new(self.indexer(), self.transformer(), self.grid.samples_per_axis)
    }

    pub fn planner(&self) -> RescuePlanner {
        RescuePlanner::new(self.rescue.clone())
    }

    pub fn grid_source(&self) -> CsvGridSource {
        CsvGridSource::in_dir(&self.grid.data_dir)
            .with_layout(self.grid.layout)
            .with_fallback(self.map.geo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.viewport.min_scale, 0.001);
        assert_eq!(cfg.grid.layout.header_rows, 3);
        assert_eq!(cfg.rescue.departure_route, "route_001");
    }

    #[test]
    fn sections_and_routes_parse() {
        let cfg = DashboardConfig::from_toml_str(
            r#"
            [viewport]
            min_scale = 0.5
            max_scale = 50.0

            [grid]
            cells_per_degree = 50.0

            [grid.layout]
            header_rows = 2

            [[routes]]
            name = "route_001"
            waypoints = [[0.0, 0.0, 0.0], [100.0, 0.0, 250.0]]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.viewport.max_scale, 50.0);
        assert_eq!(cfg.viewport.initial_scale, 1.0);
        assert_eq!(cfg.grid.layout.header_rows, 2);
        assert_eq!(cfg.grid.layout.lat_max_col, 6);
        assert_eq!(cfg.indexer().cells_per_degree, 50.0);
        let route = cfg.departure_route().unwrap();
        assert_eq!(route.end_point().map(|p| (p.x, p.z)), Some((100.0, 250.0)));
    }

    #[test]
    fn rejects_bad_scale_limits() {
        let err = DashboardConfig::from_toml_str("[viewport]\nmin_scale = 0.0\n");
        assert!(matches!(err, Err(GeoError::InvalidConfig(_))));
        let err = DashboardConfig::from_toml_str("[viewport]\nmin_scale = 6.0\nmax_scale = 5.0\n");
        assert!(matches!(err, Err(GeoError::InvalidConfig(_))));
    }

    #[test]
    fn pip_section_has_its_own_zoom_range() {
        let cfg = DashboardConfig::from_toml_str("").unwrap();
        let pip = cfg.pip_viewport_state().unwrap();
        assert_eq!(pip.scale(), 2.5);
        assert_eq!((pip.limits().min(), pip.limits().max()), (1.0, 4.0));

        let cfg = DashboardConfig::from_toml_str("[pip]\ninitial_scale = 9.0\n").unwrap();
        assert_eq!(cfg.pip_viewport_state().unwrap().scale(), 4.0);
        let err = DashboardConfig::from_toml_str("[pip]\nmin_scale = 3.0\nmax_scale = 2.0\n");
        assert!(matches!(err, Err(GeoError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_degenerate_rectangles() {
        let toml = "[map.geo]\nlat_min = 25.2\nlat_max = 25.2\nlon_min = 121.6\nlon_max = 121.9\n";
        assert!(matches!(DashboardConfig::from_toml_str(toml), Err(GeoError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_empty_route() {
        let toml = "[[routes]]\nname = \"route_002\"\nwaypoints = []\n";
        assert!(matches!(DashboardConfig::from_toml_str(toml), Err(GeoError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(DashboardConfig::from_toml_str("[viewport"), Err(GeoError::Toml(_))));
    }

    #[test]
    fn unreadable_path_uses_bundled() {
        let cfg = DashboardConfig::load(
            Some(Path::new("/nonexistent/sar.toml")),
            "[rescue]\nintermediate_count = 5\n",
        )
        .unwrap();
        assert_eq!(cfg.rescue.intermediate_count, 5);
    }
}
