//! transform.rs — World / geographic / screen coordinate conversions
//!
//! The background map image is the common basis: its pixel rectangle spans the
//! world rectangle and the geographic rectangle exactly, so
//!   screen → image pixel → normalized [0,1]² → world or geo
//! gives the same answer whichever target frame is chosen.
//!
//! Axis conventions:
//! - world X and longitude grow to the right of the image
//! - world Z and latitude grow toward the top of the image (image Y is inverted)
//! - world ↔ geo is a direct affine remap, latitude proportional to world Z

use serde::{Deserialize, Serialize};

use sar_types::{GeoPoint, ScreenPoint, WorldPoint};

use crate::viewport::Viewport;

// ── Fixed rectangles ──────────────────────────────────────────────────────────

/// Simulator world extent covered by the background image (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl WorldBounds {
    pub const DEFAULT: WorldBounds = WorldBounds {
        min_x: -6200.0,
        max_x: 8800.0,
        min_z: -1500.0,
        max_z: 13500.0,
    };

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    pub fn contains(&self, p: &WorldPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.z >= self.min_z && p.z <= self.max_z
    }

    pub fn is_valid(&self) -> bool {
        self.width().is_finite() && self.depth().is_finite() && self.width() > 0.0 && self.depth() > 0.0
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Geographic extent in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl GeoBounds {
    /// Keelung coast scenario extent.
    pub const DEFAULT: GeoBounds = GeoBounds {
        lat_min: 25.1228,
        lat_max: 25.2588,
        lon_min: 121.6140,
        lon_max: 121.9649,
    };

    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.lat >= self.lat_min && p.lat <= self.lat_max && p.lon >= self.lon_min && p.lon <= self.lon_max
    }

    /// Finite, strictly positive spans.
    pub fn is_valid(&self) -> bool {
        self.lat_span().is_finite()
            && self.lon_span().is_finite()
            && self.lat_span() > 0.0
            && self.lon_span() > 0.0
    }

    /// Smallest box containing both points, whatever their order.
    pub fn from_corners(a: GeoPoint, b: GeoPoint) -> Self {
        Self {
            lat_min: a.lat.min(b.lat),
            lat_max: a.lat.max(b.lat),
            lon_min: a.lon.min(b.lon),
            lon_max: a.lon.max(b.lon),
        }
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ── Transformer ───────────────────────────────────────────────────────────────

/// Single source of truth for every coordinate conversion in the dashboard.
///
/// Holds only the two immutable rectangles; the viewport is passed per call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateTransformer {
    world: WorldBounds,
    geo: GeoBounds,
}

impl CoordinateTransformer {
    pub fn new(world: WorldBounds, geo: GeoBounds) -> Self {
        Self { world, geo }
    }

    pub fn world_bounds(&self) -> &WorldBounds {
        &self.world
    }

    pub fn geo_bounds(&self) -> &GeoBounds {
        &self.geo
    }

    /// World point → screen pixel under `viewport`.
    /// Returns the origin while the background image size is still unknown.
    pub fn world_to_screen(&self, world: &WorldPoint, viewport: &Viewport) -> ScreenPoint {
        let image = viewport.image;
        if !image.is_ready() {
            return ScreenPoint::default();
        }
        let nx = (world.x - self.world.min_x) / self.world.width();
        let nz = (world.z - self.world.min_z) / self.world.depth();

        let img_x = nx * image.width;
        let img_y = (1.0 - nz) * image.height;

        ScreenPoint::new(
            img_x * viewport.scale + viewport.pan.x,
            img_y * viewport.scale + viewport.pan.y,
        )
    }

    /// Inverse of [`world_to_screen`](Self::world_to_screen). `None` until the image is ready.
    pub fn screen_to_world(&self, screen: &ScreenPoint, viewport: &Viewport) -> Option<WorldPoint> {
        let (nx, ny) = self.screen_to_normalized(screen, viewport)?;
        let nz = 1.0 - ny;
        Some(WorldPoint::new(
            self.world.min_x + nx * self.world.width(),
            self.world.min_z + nz * self.world.depth(),
        ))
    }

    /// Screen pixel → lat/lon, straight from the image rectangle.
    pub fn screen_to_geo(&self, screen: &ScreenPoint, viewport: &Viewport) -> Option<GeoPoint> {
        let (nx, ny) = self.screen_to_normalized(screen, viewport)?;
        Some(GeoPoint::new(
            self.geo.lat_max - ny * self.geo.lat_span(),
            self.geo.lon_min + nx * self.geo.lon_span(),
        ))
    }

    /// World → geo. Longitude follows X, latitude follows Z.
    pub fn world_to_geo(&self, world: &WorldPoint) -> GeoPoint {
        let nx = (world.x - self.world.min_x) / self.world.width();
        let nz = (world.z - self.world.min_z) / self.world.depth();
        GeoPoint::new(
            self.geo.lat_min + nz * self.geo.lat_span(),
            self.geo.lon_min + nx * self.geo.lon_span(),
        )
    }

    /// Geo → world, exact inverse of [`world_to_geo`](Self::world_to_geo).
    pub fn geo_to_world(&self, geo: &GeoPoint) -> WorldPoint {
        let nx = (geo.lon - self.geo.lon_min) / self.geo.lon_span();
        let nz = (geo.lat - self.geo.lat_min) / self.geo.lat_span();
        WorldPoint::new(
            self.world.min_x + nx * self.world.width(),
            self.world.min_z + nz * self.world.depth(),
        )
    }

    /// World point → unscaled image pixel (before pan/zoom).
    pub fn world_to_image(&self, world: &WorldPoint, viewport: &Viewport) -> Option<ScreenPoint> {
        let image = viewport.image;
        if !image.is_ready() {
            return None;
        }
        let nx = (world.x - self.world.min_x) / self.world.width();
        let nz = (world.z - self.world.min_z) / self.world.depth();
        Some(ScreenPoint::new(nx * image.width, (1.0 - nz) * image.height))
    }

    /// World meters → screen pixels at the current zoom (detection-range circles).
    pub fn world_length_to_screen(&self, meters: f64, viewport: &Viewport) -> f64 {
        if !viewport.image.is_ready() {
            return 0.0;
        }
        meters / self.world.width() * viewport.image.width * viewport.scale
    }

    fn screen_to_normalized(&self, screen: &ScreenPoint, viewport: &Viewport) -> Option<(f64, f64)> {
        let image = viewport.image;
        if !image.is_ready() {
            return None;
        }
        let map_x = (screen.x - viewport.pan.x) / viewport.scale;
        let map_y = (screen.y - viewport.pan.y) / viewport.scale;
        Some((map_x / image.width, map_y / image.height))
    }
}
