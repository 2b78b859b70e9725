//! dispatch.rs — Newline-delimited JSON command sink
//!
//! Writes each command as `{"endpoint": "/waypoint", "body": {...}}` on its own
//! line, so the output can be replayed against the simulator's HTTP API.

use std::io::Write;

use serde::Serialize;
use serde_json::json;

use sar_geo::dispatch::CommandDispatcher;
use sar_geo::Result;
use sar_types::{
    CommandRequest, CommandResponse, ShipCommand, SpawnPersonsRequest, Waypoint, WaypointRequest, WorldPoint,
};

pub struct JsonLinesDispatcher<W: Write> {
    out: W,
    sent: usize,
}

impl<W: Write> JsonLinesDispatcher<W> {
    pub fn new(out: W) -> Self {
        Self { out, sent: 0 }
    }

    pub fn sent(&self) -> usize {
        self.sent
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit<T: Serialize>(&mut self, endpoint: &str, body: &T) -> Result<CommandResponse> {
        let line = json!({ "endpoint": endpoint, "body": body });
        serde_json::to_writer(&mut self.out, &line)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        self.sent += 1;
        Ok(CommandResponse { success: true, message: Some(format!("queued {endpoint}")) })
    }
}

impl<W: Write> CommandDispatcher for JsonLinesDispatcher<W> {
    fn send_command(&mut self, command: ShipCommand, ships: &[String]) -> Result<CommandResponse> {
        self.emit("/command", &CommandRequest { command, ships: ships.to_vec() })
    }

    fn set_waypoints(&mut self, ship: &str, waypoints: &[Waypoint]) -> Result<CommandResponse> {
        self.emit(
            "/waypoint",
            &WaypointRequest { ship: ship.to_string(), waypoints: waypoints.to_vec() },
        )
    }

    fn spawn_persons(&mut self, count: u32, radius: f64, center: WorldPoint) -> Result<CommandResponse> {
        self.emit("/spawn_persons", &SpawnPersonsRequest { count, radius, center: center.into() })
    }
}
