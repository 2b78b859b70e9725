//! dispatch.rs — Outbound simulator commands
//!
//! The transport lives outside the core. Implementors turn these calls into
//! the simulator's `/command`, `/waypoint` and `/spawn_persons` payloads.

use tracing::info;

use sar_types::{CommandResponse, ShipCommand, Waypoint, WaypointRequest, WorldPoint};

use crate::error::{GeoError, Result};
use crate::rescue::RescuePlan;
use crate::waypoint::validate_route;

pub trait CommandDispatcher {
    fn send_command(&mut self, command: ShipCommand, ships: &[String]) -> Result<CommandResponse>;

    fn set_waypoints(&mut self, ship: &str, waypoints: &[Waypoint]) -> Result<CommandResponse>;

    fn spawn_persons(&mut self, count: u32, radius: f64, center: WorldPoint) -> Result<CommandResponse>;
}

fn check(resp: CommandResponse, what: &str) -> Result<CommandResponse> {
    if resp.success {
        Ok(resp)
    } else {
        Err(GeoError::Dispatch(format!(
            "{what} rejected: {}",
            resp.message.as_deref().unwrap_or("no message")
        )))
    }
}

/// Validate and send one route. A rejected reply becomes an error.
pub fn send_route<D: CommandDispatcher + ?Sized>(dispatcher: &mut D, route: &WaypointRequest) -> Result<CommandResponse> {
    validate_route(&route.waypoints)?;
    let resp = dispatcher.set_waypoints(&route.ship, &route.waypoints)?;
    check(resp, &format!("waypoints for {}", route.ship))
}

/// Send every route of the plan, then start the ships that received one.
/// Stops at the first failure.
pub fn dispatch_plan<D: CommandDispatcher + ?Sized>(dispatcher: &mut D, plan: &RescuePlan) -> Result<usize> {
    for route in &plan.routes {
        send_route(dispatcher, route)?;
    }
    let ships: Vec<String> = plan.routes.iter().map(|r| r.ship.clone()).collect();
    if !ships.is_empty() {
        let resp = dispatcher.send_command(ShipCommand::Start, &ships)?;
        check(resp, "start")?;
    }
    info!("Dispatched rescue plan to {} ships", ships.len());
    Ok(ships.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sar_types::RescueArea;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        reject_waypoints: bool,
    }

    impl CommandDispatcher for Recorder {
        fn send_command(&mut self, command: ShipCommand, ships: &[String]) -> Result<CommandResponse> {
            self.calls.push(format!("{command:?} {}", ships.join(",")));
            Ok(CommandResponse { success: true, message: None })
        }

        fn set_waypoints(&mut self, ship: &str, waypoints: &[Waypoint]) -> Result<CommandResponse> {
            self.calls.push(format!("waypoints {ship} {}", waypoints.len()));
            Ok(CommandResponse {
                success: !self.reject_waypoints,
                message: Some("ship busy".into()),
            })
        }

        fn spawn_persons(&mut self, count: u32, _radius: f64, _center: WorldPoint) -> Result<CommandResponse> {
            self.calls.push(format!("spawn {count}"));
            Ok(CommandResponse { success: true, message: None })
        }
    }

    fn plan() -> RescuePlan {
        RescuePlan {
            area: RescueArea { center_x: 0.0, center_z: 0.0, radius: 10.0 },
            routes: vec![
                WaypointRequest { ship: "A".into(), waypoints: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 1.0]] },
                WaypointRequest { ship: "B".into(), waypoints: vec![[0.0, 0.0, 0.0]] },
            ],
        }
    }

    #[test]
    fn plan_sends_routes_then_start() {
        let mut d = Recorder::default();
        assert_eq!(dispatch_plan(&mut d, &plan()).unwrap(), 2);
        assert_eq!(d.calls, vec!["waypoints A 2", "waypoints B 1", "Start A,B"]);
    }

    #[test]
    fn rejected_route_stops_dispatch() {
        let mut d = Recorder { reject_waypoints: true, ..Recorder::default() };
        let err = dispatch_plan(&mut d, &plan()).unwrap_err();
        assert!(matches!(err, GeoError::Dispatch(ref m) if m.contains("ship busy")), "got {err}");
        assert_eq!(d.calls.len(), 1);
    }

    #[test]
    fn invalid_route_never_sent() {
        let mut d = Recorder::default();
        let route = WaypointRequest { ship: "A".into(), waypoints: vec![] };
        assert!(matches!(send_route(&mut d, &route), Err(GeoError::InvalidRoute(_))));
        assert!(d.calls.is_empty());
    }
}
