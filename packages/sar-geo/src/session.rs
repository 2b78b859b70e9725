//! session.rs — Single-owner dashboard state
//!
//! Owns the main viewport, the picture-in-picture camera, the ship trails, the waypoint recorder and the last
//! status snapshot. Everything here is driven from one polling task; nothing
//! is shared across threads.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use sar_types::{ImageSize, NamedRoute, PersonSnapshot, RescueArea, ScreenPoint, StatusSnapshot, WorldPoint};

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::rescue::{compute_rescue_area, RescuePlan, RescuePlanner};
use crate::track::TrackHistory;
use crate::transform::CoordinateTransformer;
use crate::viewport::{ContainerSize, ViewportState};
use crate::waypoint::WaypointRecorder;

/// Ship marker colours, assigned by position in the snapshot's ship list.
pub const SHIP_COLORS: [&str; 8] = [
    "#FF5252", "#2196F3", "#4CAF50", "#FFC107", "#9C27B0", "#FF9800", "#00BCD4", "#E91E63",
];
pub const UNKNOWN_SHIP_COLOR: &str = "#FFFFFF";

/// Status-panel figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapStats {
    /// Mean distance over every ship × saved-person pair, if both exist.
    pub avg_distance: Option<f64>,
    /// Extent of ships and saved persons in world X / Z (0 when empty).
    pub range_x: f64,
    pub range_z: f64,
}

pub struct DashboardSession {
    id: Uuid,
    transformer: CoordinateTransformer,
    viewport: ViewportState,
    pip: ViewportState,
    tracks: TrackHistory,
    recorder: WaypointRecorder,
    planner: RescuePlanner,
    routes: Vec<NamedRoute>,
    latest: Option<StatusSnapshot>,
}

impl DashboardSession {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let id = Uuid::new_v4();
        info!("Session {id} started ({} base routes)", config.routes.len());
        Ok(Self {
            id,
            transformer: config.transformer(),
            viewport: config.viewport_state()?,
            pip: config.pip_viewport_state()?,
            tracks: TrackHistory::new(),
            recorder: WaypointRecorder::new(),
            planner: config.planner(),
            routes: config.routes.clone(),
            latest: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transformer(&self) -> &CoordinateTransformer {
        &self.transformer
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportState {
        &mut self.viewport
    }

    /// Follow camera shown in the inset; independent of the main map.
    pub fn pip_viewport(&self) -> &ViewportState {
        &self.pip
    }

    pub fn pip_viewport_mut(&mut self) -> &mut ViewportState {
        &mut self.pip
    }

    /// Natural size of the shared background image, for both cameras.
    pub fn set_image_size(&mut self, size: ImageSize) -> bool {
        let main = self.viewport.set_image_size(size);
        let pip = self.pip.set_image_size(size);
        main || pip
    }

    pub fn tracks(&self) -> &TrackHistory {
        &self.tracks
    }

    pub fn recorder(&self) -> &WaypointRecorder {
        &self.recorder
    }

    pub fn latest(&self) -> Option<&StatusSnapshot> {
        self.latest.as_ref()
    }

    /// Take in one polling cycle's snapshot.
    pub fn ingest(&mut self, snapshot: StatusSnapshot) {
        self.tracks.observe_all(&snapshot.ships);
        debug!(
            "Session {}: {} ships, {} persons",
            self.id,
            snapshot.ships.len(),
            snapshot.persons().len()
        );
        self.latest = Some(snapshot);
    }

    fn persons(&self) -> &[PersonSnapshot] {
        self.latest.as_ref().map(StatusSnapshot::persons).unwrap_or_default()
    }

    pub fn saved_persons(&self) -> Vec<&PersonSnapshot> {
        self.persons().iter().filter(|p| p.is_saved).collect()
    }

    pub fn unsaved_persons(&self) -> Vec<&PersonSnapshot> {
        self.persons().iter().filter(|p| !p.is_saved).collect()
    }

    pub fn rescue_area(&self) -> Option<RescueArea> {
        compute_rescue_area(self.persons())
    }

    pub fn map_stats(&self) -> MapStats {
        let ships: Vec<WorldPoint> = self
            .latest
            .iter()
            .flat_map(|s| s.ships.iter().map(|ship| ship.position.world()))
            .collect();
        let saved: Vec<WorldPoint> = self.saved_persons().iter().map(|p| p.position.world()).collect();

        let avg_distance = (!ships.is_empty() && !saved.is_empty()).then(|| {
            let total: f64 = ships
                .iter()
                .flat_map(|a| saved.iter().map(move |b| a.distance_to(b)))
                .sum();
            total / (ships.len() * saved.len()) as f64
        });

        let all = ships.iter().chain(saved.iter());
        let (range_x, range_z) = if ships.is_empty() && saved.is_empty() {
            (0.0, 0.0)
        } else {
            let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
            let (mut min_z, mut max_z) = (f64::INFINITY, f64::NEG_INFINITY);
            for p in all {
                min_x = min_x.min(p.x);
                max_x = max_x.max(p.x);
                min_z = min_z.min(p.z);
                max_z = max_z.max(p.z);
            }
            (max_x - min_x, max_z - min_z)
        };

        MapStats { avg_distance, range_x, range_z }
    }

    /// Palette colour by the ship's index in the latest snapshot; white if unknown.
    pub fn ship_color(&self, name: &str) -> &'static str {
        self.latest
            .as_ref()
            .and_then(|s| s.ships.iter().position(|ship| ship.name == name))
            .map(|i| SHIP_COLORS[i % SHIP_COLORS.len()])
            .unwrap_or(UNKNOWN_SHIP_COLOR)
    }

    /// Where a ship is drawn under the current viewport.
    pub fn ship_screen_position(&self, name: &str) -> Option<ScreenPoint> {
        let ship = self.latest.as_ref()?.ship(name)?;
        Some(self.transformer.world_to_screen(&ship.position.world(), self.viewport.viewport()))
    }

    /// Picture-in-picture camera: center the named ship in `container` at the
    /// inset's own zoom. The main viewport is not touched.
    pub fn follow(&mut self, name: &str, container: ContainerSize) -> bool {
        let Some(pos) = self.latest.as_ref().and_then(|s| s.ship(name)).map(|s| s.position.world()) else {
            return false;
        };
        self.pip.center_on(&pos, container, &self.transformer)
    }

    /// Map click while recording a custom route.
    pub fn click(&mut self, screen: &ScreenPoint) -> bool {
        self.recorder
            .record_click(screen, self.viewport.viewport(), &self.transformer)
            .is_some()
    }

    pub fn recorder_mut(&mut self) -> &mut WaypointRecorder {
        &mut self.recorder
    }

    /// Both cameras back to their initial framing, trails dropped.
    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.pip.reset();
        self.tracks.clear();
        info!("Session {}: view reset", self.id);
    }

    pub fn plan_rescue(&self) -> Option<RescuePlan> {
        let snapshot = self.latest.as_ref()?;
        self.planner.plan(snapshot.persons(), &snapshot.ships, &self.routes)
    }
}
