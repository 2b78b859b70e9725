//! waypoint.rs — Click-to-record custom routes

use tracing::{debug, info};

use sar_types::{ScreenPoint, Waypoint};

use crate::error::{GeoError, Result};
use crate::transform::CoordinateTransformer;
use crate::viewport::Viewport;

/// Waypoints are snapped to this resolution in world meters.
const SNAP: f64 = 0.1;

fn snap(v: f64) -> f64 {
    (v / SNAP).round() * SNAP
}

/// Non-empty and every coordinate finite.
pub fn validate_route(waypoints: &[Waypoint]) -> Result<()> {
    if waypoints.is_empty() {
        return Err(GeoError::InvalidRoute("no waypoints".into()));
    }
    if let Some(i) = waypoints.iter().position(|w| w.iter().any(|v| !v.is_finite())) {
        return Err(GeoError::InvalidRoute(format!("waypoint {i} is not finite: {:?}", waypoints[i])));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct WaypointRecorder {
    recording: bool,
    waypoints: Vec<Waypoint>,
}

impl WaypointRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fresh route, dropping anything recorded before.
    pub fn start(&mut self) {
        self.recording = true;
        self.waypoints.clear();
    }

    /// Stop recording; the collected waypoints are kept.
    pub fn stop(&mut self) {
        if self.recording {
            info!("Recorded {} waypoints", self.waypoints.len());
        }
        self.recording = false;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Hand the route over and reset.
    pub fn take(&mut self) -> Vec<Waypoint> {
        self.recording = false;
        std::mem::take(&mut self.waypoints)
    }

    /// Map click → `[x, 0, z]` snapped to 0.1 m. Ignored when not recording or
    /// while the map image is not loaded.
    pub fn record_click(
        &mut self,
        screen: &ScreenPoint,
        viewport: &Viewport,
        transformer: &CoordinateTransformer,
    ) -> Option<Waypoint> {
        if !self.recording {
            return None;
        }
        let world = transformer.screen_to_world(screen, viewport)?;
        let wp = [snap(world.x), 0.0, snap(world.z)];
        debug!("Waypoint {} at ({:.1}, {:.1})", self.waypoints.len() + 1, wp[0], wp[2]);
        self.waypoints.push(wp);
        Some(wp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sar_types::{ImageSize, WorldPoint};

    fn viewport() -> Viewport {
        Viewport {
            scale: 1.0,
            pan: ScreenPoint::new(0.0, 0.0),
            image: ImageSize::new(1500.0, 1500.0),
        }
    }

    #[test]
    fn clicks_ignored_unless_recording() {
        let t = CoordinateTransformer::default();
        let mut rec = WaypointRecorder::new();
        assert!(rec.record_click(&ScreenPoint::new(10.0, 10.0), &viewport(), &t).is_none());
        assert!(rec.waypoints().is_empty());
    }

    #[test]
    fn click_maps_to_snapped_world_point() {
        let t = CoordinateTransformer::default();
        let mut rec = WaypointRecorder::new();
        rec.start();
        // 10 m per pixel with a 1500 px image over 15 km
        let wp = rec.record_click(&ScreenPoint::new(620.0, 1350.0), &viewport(), &t).unwrap();
        assert!((wp[0] - 0.0).abs() < 1e-9, "x {}", wp[0]);
        assert_eq!(wp[1], 0.0);
        assert!((wp[2] - 0.0).abs() < 1e-9, "z {}", wp[2]);

        let wp = rec.record_click(&ScreenPoint::new(620.333, 1350.0), &viewport(), &t).unwrap();
        assert!((wp[0] - 3.3).abs() < 1e-9, "x {}", wp[0]);
        assert_eq!(rec.waypoints().len(), 2);
    }

    #[test]
    fn image_not_ready_ignores_click() {
        let t = CoordinateTransformer::default();
        let mut rec = WaypointRecorder::new();
        rec.start();
        let vp = Viewport { image: ImageSize::default(), ..viewport() };
        assert!(rec.record_click(&ScreenPoint::new(1.0, 1.0), &vp, &t).is_none());
    }

    #[test]
    fn restart_clears_and_take_resets() {
        let t = CoordinateTransformer::default();
        let mut rec = WaypointRecorder::new();
        rec.start();
        rec.record_click(&ScreenPoint::new(5.0, 5.0), &viewport(), &t);
        rec.start();
        assert!(rec.waypoints().is_empty());
        rec.record_click(&ScreenPoint::new(5.0, 5.0), &viewport(), &t);
        rec.stop();
        assert!(!rec.is_recording());
        let route = rec.take();
        assert_eq!(route.len(), 1);
        assert!(rec.waypoints().is_empty());
        assert!(validate_route(&route).is_ok());
    }

    #[test]
    fn validate_rejects_empty_and_non_finite() {
        assert!(matches!(validate_route(&[]), Err(GeoError::InvalidRoute(_))));
        let bad = [WorldPoint::new(0.0, 0.0).to_waypoint(), [f64::NAN, 0.0, 1.0]];
        assert!(matches!(validate_route(&bad), Err(GeoError::InvalidRoute(_))));
    }
}
