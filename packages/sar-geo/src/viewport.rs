//! viewport.rs — Pan/zoom state of the dashboard map
//!
//! The map image is drawn with `translate(pan) scale(scale)` and transform
//! origin at the top-left, so an image pixel `p` lands on screen at
//! `p * scale + pan`. Only the owning session mutates this state.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sar_types::{ImageSize, ScreenPoint, WorldPoint};

use crate::config::ViewportConfig;
use crate::error::{GeoError, Result};
use crate::transform::{CoordinateTransformer, GeoBounds};

/// Read-only view of the current affine map → screen mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Always inside the owning state's [`ScaleLimits`], hence > 0.
    pub scale: f64,
    pub pan: ScreenPoint,
    /// Natural size of the background image; zero until loaded.
    pub image: ImageSize,
}

/// Pixel size of the element hosting the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Inclusive zoom range with a strictly positive floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleLimits {
    min: f64,
    max: f64,
}

impl ScaleLimits {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min > max {
            return Err(GeoError::InvalidConfig(format!(
                "scale limits must satisfy 0 < min <= max, got [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        scale.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone)]
pub struct ViewportState {
    current: Viewport,
    limits: ScaleLimits,
    initial_scale: f64,
    initial_pan: ScreenPoint,
}

impl ViewportState {
    /// A non-finite or non-positive `initial_scale` falls back to the limits' floor.
    pub fn new(limits: ScaleLimits, initial_scale: f64, initial_pan: ScreenPoint) -> Self {
        let initial_scale = if initial_scale.is_finite() && initial_scale > 0.0 {
            limits.clamp(initial_scale)
        } else {
            warn!("Initial scale {initial_scale} is not positive, using {}", limits.min());
            limits.min()
        };
        Self {
            current: Viewport {
                scale: initial_scale,
                pan: initial_pan,
                image: ImageSize::default(),
            },
            limits,
            initial_scale,
            initial_pan,
        }
    }

    pub fn from_config(cfg: &ViewportConfig) -> Result<Self> {
        let limits = ScaleLimits::new(cfg.min_scale, cfg.max_scale)?;
        Ok(Self::new(
            limits,
            cfg.initial_scale,
            ScreenPoint::new(cfg.initial_pan[0], cfg.initial_pan[1]),
        ))
    }

    pub fn viewport(&self) -> &Viewport {
        &self.current
    }

    pub fn scale(&self) -> f64 {
        self.current.scale
    }

    pub fn pan(&self) -> ScreenPoint {
        self.current.pan
    }

    pub fn limits(&self) -> &ScaleLimits {
        &self.limits
    }

    /// Record the background image's natural size. Once known it stays fixed;
    /// later calls with a different size are ignored. Returns true if stored.
    pub fn set_image_size(&mut self, size: ImageSize) -> bool {
        if !size.is_ready() {
            return false;
        }
        if self.current.image.is_ready() {
            if self.current.image != size {
                debug!(
                    "Ignoring image size {}x{}, already fixed at {}x{}",
                    size.width, size.height, self.current.image.width, self.current.image.height
                );
            }
            return false;
        }
        self.current.image = size;
        true
    }

    /// Zoom by `factor` keeping whatever lies under `focus` in place.
    /// Returns false (state untouched) when clamping leaves the scale unchanged.
    pub fn zoom_at(&mut self, focus: ScreenPoint, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let old = self.current.scale;
        let new = self.limits.clamp(old * factor);
        let actual = new / old;
        if actual == 1.0 {
            return false;
        }

        let pan = self.current.pan;
        self.current.pan = ScreenPoint::new(
            focus.x * (1.0 - actual) + pan.x * actual,
            focus.y * (1.0 - actual) + pan.y * actual,
        );
        self.current.scale = new;
        true
    }

    /// Zoom around the middle of the container (toolbar +/- buttons).
    pub fn zoom_centered(&mut self, factor: f64, container: ContainerSize) -> bool {
        self.zoom_at(container.center(), factor)
    }

    /// Drag. Panning past the map edge is allowed.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.current.pan.x += dx;
        self.current.pan.y += dy;
    }

    /// Back to the configured initial scale and pan. The image size is kept.
    pub fn reset(&mut self) {
        self.current.scale = self.initial_scale;
        self.current.pan = self.initial_pan;
    }

    /// Follow camera: pan so `world` sits at the container center at the current zoom.
    pub fn center_on(
        &mut self,
        world: &WorldPoint,
        container: ContainerSize,
        transformer: &CoordinateTransformer,
    ) -> bool {
        let Some(img) = transformer.world_to_image(world, &self.current) else {
            return false;
        };
        let center = container.center();
        self.current.pan = ScreenPoint::new(
            center.x - img.x * self.current.scale,
            center.y - img.y * self.current.scale,
        );
        true
    }

    /// Geographic box currently visible in the container.
    pub fn visible_geo_bounds(
        &self,
        container: ContainerSize,
        transformer: &CoordinateTransformer,
    ) -> Option<GeoBounds> {
        let top_left = transformer.screen_to_geo(&ScreenPoint::new(0.0, 0.0), &self.current)?;
        let bottom_right = transformer
            .screen_to_geo(&ScreenPoint::new(container.width, container.height), &self.current)?;
        Some(GeoBounds::from_corners(top_left, bottom_right))
    }
}
