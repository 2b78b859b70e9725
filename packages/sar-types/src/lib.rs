//! # sar-types
//!
//! Shared geometry and wire structures for the SAR dashboard.
//!
//! These types are used by:
//! - `sar-geo`: coordinate transforms, current sampling, rescue planning
//! - `dashboard-rust`: decoding simulator status snapshots and encoding commands
//!
//! ## Coordinate Conventions
//!
//! - **World frame**: simulator plane, X = east, Z = north, Y = up (always 0 for routes)
//! - **Geographic frame**: WGS84 degrees, latitude grows north, longitude grows east
//! - **Screen frame**: pixels, X = right, Y = down, origin at the container's top-left
//!
//! Field names on the wire follow the simulator's camelCase JSON (`isWaiting`,
//! `detectionRange`, `personsInDistress`, `isSaved`, `centerX`).

use serde::{Deserialize, Serialize};

// ── Planar Points ─────────────────────────────────────────────────────────────

/// Point in the simulator's planar world frame (meters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub z: f64,
}

impl WorldPoint {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Euclidean distance in the X/Z plane.
    pub fn distance_to(&self, other: &WorldPoint) -> f64 {
        (other.x - self.x).hypot(other.z - self.z)
    }

    /// Linear interpolation toward `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(&self, other: &WorldPoint, t: f64) -> WorldPoint {
        WorldPoint::new(
            self.x + (other.x - self.x) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    /// Waypoint form `[x, 0, z]`.
    pub fn to_waypoint(&self) -> Waypoint {
        [self.x, 0.0, self.z]
    }
}

/// WGS84 latitude / longitude in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Pixel position inside the dashboard's map container. Unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Natural pixel size of the background map image.
/// Zero (or negative) until the image has loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True once both dimensions are known.
    pub fn is_ready(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

// ── Status Snapshot (simulator → dashboard) ──────────────────────────────────

/// 3D position as reported by the simulator. `y` is ignored by the planar core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn world(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.z)
    }
}

impl From<WorldPoint> for Position {
    fn from(p: WorldPoint) -> Self {
        Self { x: p.x, y: 0.0, z: p.z }
    }
}

/// One ship as seen in a single polling cycle. `name` is unique per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipSnapshot {
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub is_waiting: bool,
    /// Sensor footprint radius in world meters (≥ 0)
    #[serde(default)]
    pub detection_range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSnapshot {
    pub id: u32,
    pub position: Position,
    #[serde(default)]
    pub is_saved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonsInDistress {
    #[serde(default)]
    pub persons: Vec<PersonSnapshot>,
}

/// Full `/status` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default)]
    pub ships: Vec<ShipSnapshot>,
    #[serde(default)]
    pub persons_in_distress: PersonsInDistress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl StatusSnapshot {
    pub fn persons(&self) -> &[PersonSnapshot] {
        &self.persons_in_distress.persons
    }

    pub fn ship(&self, name: &str) -> Option<&ShipSnapshot> {
        self.ships.iter().find(|s| s.name == name)
    }
}

// ── Routes ────────────────────────────────────────────────────────────────────

/// Route waypoint `[x, y, z]` in world meters. Synthesised waypoints carry y = 0.
pub type Waypoint = [f64; 3];

/// Predefined route shipped with the scenario (e.g. `route_001`, the departure lane).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRoute {
    pub name: String,
    pub waypoints: Vec<Waypoint>,
}

impl NamedRoute {
    /// Planar position of the final waypoint.
    pub fn end_point(&self) -> Option<WorldPoint> {
        self.waypoints.last().map(|w| WorldPoint::new(w[0], w[2]))
    }
}

/// Bounding disc over the persons still awaiting rescue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescueArea {
    pub center_x: f64,
    pub center_z: f64,
    pub radius: f64,
}

impl RescueArea {
    pub fn center(&self) -> WorldPoint {
        WorldPoint::new(self.center_x, self.center_z)
    }

    pub fn contains(&self, p: &WorldPoint) -> bool {
        self.center().distance_to(p) <= self.radius
    }
}

// ── Commands (dashboard → simulator) ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipCommand {
    Start,
    Stop,
}

/// `POST /command` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: ShipCommand,
    pub ships: Vec<String>,
}

/// `POST /waypoint` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointRequest {
    pub ship: String,
    pub waypoints: Vec<Waypoint>,
}

/// `POST /spawn_persons` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPersonsRequest {
    pub count: u32,
    pub radius: f64,
    pub center: Position,
}

/// Generic `{ success, message }` reply from the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_snapshot_decodes_simulator_json() {
        let json = r#"{
            "ships": [
                {"name": "RescueBoat_1", "position": {"x": 10.5, "y": 0.0, "z": 20.3},
                 "isWaiting": false, "detectionRange": 150.0}
            ],
            "personsInDistress": {
                "persons": [
                    {"id": 7, "position": {"x": 50.0, "z": 100.0}, "isSaved": true}
                ]
            }
        }"#;
        let status: StatusSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(status.ships.len(), 1);
        assert!(!status.ships[0].is_waiting);
        assert_eq!(status.ships[0].detection_range, 150.0);
        assert_eq!(status.persons()[0].id, 7);
        assert!(status.persons()[0].is_saved);
        assert_eq!(status.persons()[0].position.world(), WorldPoint::new(50.0, 100.0));
    }

    #[test]
    fn commands_use_simulator_field_names() {
        let cmd = CommandRequest { command: ShipCommand::Start, ships: vec!["A".into()] };
        let v = serde_json::to_value(&cmd).unwrap();
        assert_eq!(v["command"], "START");

        let area = RescueArea { center_x: 1.0, center_z: 2.0, radius: 3.0 };
        let v = serde_json::to_value(area).unwrap();
        assert_eq!(v["centerX"], 1.0);
        assert_eq!(v["centerZ"], 2.0);
    }

    #[test]
    fn world_point_lerp_endpoints() {
        let a = WorldPoint::new(0.0, 0.0);
        let b = WorldPoint::new(10.0, -4.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), WorldPoint::new(5.0, -2.0));
    }

    #[test]
    fn image_size_readiness() {
        assert!(!ImageSize::default().is_ready());
        assert!(!ImageSize::new(1024.0, 0.0).is_ready());
        assert!(ImageSize::new(1024.0, 768.0).is_ready());
    }
}
