//! rescue.rs — Search area and fleet approach routes
//!
//! 1. Bound the persons still in the water with a disc (centroid + max distance).
//! 2. Fan the fleet out on a line perpendicular to the approach, beyond the disc.
//! 3. Stitch each ship's route: departure lane, evenly spaced legs, target.

use serde::Serialize;
use tracing::{debug, info, warn};

use sar_types::{NamedRoute, PersonSnapshot, RescueArea, ShipSnapshot, Waypoint, WaypointRequest, WorldPoint};

use crate::config::RescueConfig;

/// Targets sit this many radii past the area center.
pub const DEFAULT_FORWARD_FACTOR: f64 = 3.0;
pub const DEFAULT_INTERMEDIATE_COUNT: usize = 20;

/// Heading used when the ship already sits on the area center: due north (+Z).
const FALLBACK_FORWARD: WorldPoint = WorldPoint { x: 0.0, z: 1.0 };

/// Disc over every unsaved person. `None` if nobody is left to rescue.
pub fn compute_rescue_area(persons: &[PersonSnapshot]) -> Option<RescueArea> {
    let unsaved: Vec<WorldPoint> = persons
        .iter()
        .filter(|p| !p.is_saved)
        .map(|p| p.position.world())
        .collect();
    if unsaved.is_empty() {
        return None;
    }

    let n = unsaved.len() as f64;
    let center = WorldPoint::new(
        unsaved.iter().map(|p| p.x).sum::<f64>() / n,
        unsaved.iter().map(|p| p.z).sum::<f64>() / n,
    );
    let radius = unsaved
        .iter()
        .map(|p| center.distance_to(p))
        .fold(0.0, f64::max);

    Some(RescueArea { center_x: center.x, center_z: center.z, radius })
}

/// One target per ship with the default forward distance.
pub fn generate_targets(start: &WorldPoint, area: &RescueArea, ship_count: usize) -> Vec<WorldPoint> {
    fan_out(start, area, ship_count, DEFAULT_FORWARD_FACTOR)
}

/// Targets on a lateral line through `center + forward * factor * radius`,
/// spread evenly over `2 * radius`.
pub fn fan_out(start: &WorldPoint, area: &RescueArea, ship_count: usize, forward_factor: f64) -> Vec<WorldPoint> {
    if ship_count == 0 {
        return Vec::new();
    }

    let center = area.center();
    let (dx, dz) = (center.x - start.x, center.z - start.z);
    let len = dx.hypot(dz);
    let forward = if len > f64::EPSILON {
        WorldPoint::new(dx / len, dz / len)
    } else {
        debug!("Start coincides with rescue center, heading north");
        FALLBACK_FORWARD
    };
    let lateral = WorldPoint::new(-forward.z, forward.x);

    let reach = forward_factor * area.radius;
    let mid = WorldPoint::new(center.x + forward.x * reach, center.z + forward.z * reach);
    if ship_count == 1 {
        return vec![mid];
    }

    let spacing = 2.0 * area.radius / (ship_count - 1) as f64;
    (0..ship_count)
        .map(|i| {
            let offset = -area.radius + i as f64 * spacing;
            WorldPoint::new(mid.x + lateral.x * offset, mid.z + lateral.z * offset)
        })
        .collect()
}

/// `base ++ intermediates ++ [target]`, interpolating from the base's last point.
/// An empty base yields just the target.
pub fn build_route(base: &[Waypoint], target: &WorldPoint, intermediate_count: usize) -> Vec<Waypoint> {
    let Some(last) = base.last() else {
        return vec![target.to_waypoint()];
    };
    let start = WorldPoint::new(last[0], last[2]);

    let mut route = Vec::with_capacity(base.len() + intermediate_count + 1);
    route.extend_from_slice(base);
    let steps = (intermediate_count + 1) as f64;
    for i in 1..=intermediate_count {
        route.push(start.lerp(target, i as f64 / steps).to_waypoint());
    }
    route.push(target.to_waypoint());
    route
}

// ── Planner ───────────────────────────────────────────────────────────────────

/// Area plus one ready-to-send waypoint list per ship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RescuePlan {
    pub area: RescueArea,
    pub routes: Vec<WaypointRequest>,
}

#[derive(Debug, Clone, Default)]
pub struct RescuePlanner {
    config: RescueConfig,
}

impl RescuePlanner {
    pub fn new(config: RescueConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RescueConfig {
        &self.config
    }

    /// Plan for every ship in snapshot order. `None` when there is nobody to
    /// rescue, no ship, or no usable departure route.
    pub fn plan(
        &self,
        persons: &[PersonSnapshot],
        ships: &[ShipSnapshot],
        routes: &[NamedRoute],
    ) -> Option<RescuePlan> {
        let area = compute_rescue_area(persons)?;
        if ships.is_empty() {
            debug!("No ships available for rescue");
            return None;
        }

        let Some(departure) = routes.iter().find(|r| r.name == self.config.departure_route) else {
            warn!("Departure route {} not found", self.config.departure_route);
            return None;
        };
        let Some(start) = departure.end_point() else {
            warn!("Departure route {} has no waypoints", departure.name);
            return None;
        };

        let targets = fan_out(&start, &area, ships.len(), self.config.forward_factor);
        let routes: Vec<WaypointRequest> = ships
            .iter()
            .zip(&targets)
            .map(|(ship, target)| WaypointRequest {
                ship: ship.name.clone(),
                waypoints: build_route(&departure.waypoints, target, self.config.intermediate_count),
            })
            .collect();

        info!(
            "Rescue planned: center ({:.1}, {:.1}) radius {:.1} m, {} ships",
            area.center_x,
            area.center_z,
            area.radius,
            routes.len()
        );
        Some(RescuePlan { area, routes })
    }
}
