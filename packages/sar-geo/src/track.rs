//! track.rs — Per-ship trail of world positions
//!
//! A ship leaving the waiting state starts a fresh trail; while it keeps
//! moving each new position is appended unless it equals the last one.
//! Going back to waiting freezes the trail until the next departure.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use sar_types::{ShipSnapshot, WorldPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackState {
    Idle,
    Active,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipTrack {
    pub state: TrackState,
    pub points: Vec<WorldPoint>,
}

/// What one observation did to a ship's trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackUpdate {
    /// Trail restarted at the current position.
    Started,
    Appended,
    /// Active but stationary; nothing appended.
    Unchanged,
    Idle,
}

#[derive(Debug, Clone, Default)]
pub struct TrackHistory {
    tracks: HashMap<String, ShipTrack>,
}

impl TrackHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, ship: &ShipSnapshot) -> TrackUpdate {
        let pos = ship.position.world();
        let active = !ship.is_waiting;

        match self.tracks.get_mut(&ship.name) {
            None if active => {
                info!("Ship {} first seen underway, starting trail", ship.name);
                self.tracks.insert(
                    ship.name.clone(),
                    ShipTrack { state: TrackState::Active, points: vec![pos] },
                );
                TrackUpdate::Started
            }
            None => {
                self.tracks.insert(
                    ship.name.clone(),
                    ShipTrack { state: TrackState::Idle, points: Vec::new() },
                );
                TrackUpdate::Idle
            }
            Some(track) => match (track.state, active) {
                (TrackState::Idle, true) => {
                    info!("Ship {} departed, trail reset", ship.name);
                    track.state = TrackState::Active;
                    track.points.clear();
                    track.points.push(pos);
                    TrackUpdate::Started
                }
                (TrackState::Active, true) => {
                    if track.points.last() == Some(&pos) {
                        TrackUpdate::Unchanged
                    } else {
                        track.points.push(pos);
                        TrackUpdate::Appended
                    }
                }
                (TrackState::Active, false) => {
                    debug!("Ship {} waiting, trail kept ({} points)", ship.name, track.points.len());
                    track.state = TrackState::Idle;
                    TrackUpdate::Idle
                }
                (TrackState::Idle, false) => TrackUpdate::Idle,
            },
        }
    }

    /// Feed one polling cycle. Ships missing from the snapshot keep their trails.
    pub fn observe_all(&mut self, ships: &[ShipSnapshot]) {
        for ship in ships {
            self.observe(ship);
        }
    }

    pub fn trail(&self, name: &str) -> Option<&[WorldPoint]> {
        self.tracks.get(name).map(|t| t.points.as_slice())
    }

    pub fn state(&self, name: &str) -> Option<TrackState> {
        self.tracks.get(name).map(|t| t.state)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShipTrack)> {
        self.tracks.iter().map(|(name, track)| (name.as_str(), track))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sar_types::Position;

    fn ship(x: f64, z: f64, waiting: bool) -> ShipSnapshot {
        ShipSnapshot {
            name: "RescueBoat_1".into(),
            position: Position { x, y: 0.0, z },
            is_waiting: waiting,
            detection_range: 200.0,
        }
    }

    #[test]
    fn departure_resets_and_appends() {
        let mut h = TrackHistory::new();
        assert_eq!(h.observe(&ship(0.0, 0.0, true)), TrackUpdate::Idle);
        assert_eq!(h.trail("RescueBoat_1").map(<[_]>::len), Some(0));

        assert_eq!(h.observe(&ship(1.0, 0.0, false)), TrackUpdate::Started);
        assert_eq!(h.observe(&ship(2.0, 0.0, false)), TrackUpdate::Appended);
        assert_eq!(h.observe(&ship(2.0, 0.0, false)), TrackUpdate::Unchanged);
        assert_eq!(h.observe(&ship(2.0, 1.0, false)), TrackUpdate::Appended);
        assert_eq!(h.trail("RescueBoat_1").unwrap().len(), 3);
    }

    #[test]
    fn waiting_keeps_trail_until_next_departure() {
        let mut h = TrackHistory::new();
        h.observe(&ship(0.0, 0.0, false));
        h.observe(&ship(5.0, 5.0, false));
        h.observe(&ship(9.0, 9.0, true));
        assert_eq!(h.state("RescueBoat_1"), Some(TrackState::Idle));
        assert_eq!(h.trail("RescueBoat_1").unwrap().len(), 2);

        h.observe(&ship(9.0, 9.0, true));
        assert_eq!(h.trail("RescueBoat_1").unwrap().len(), 2);

        h.observe(&ship(10.0, 10.0, false));
        assert_eq!(h.trail("RescueBoat_1").unwrap(), &[WorldPoint::new(10.0, 10.0)]);
    }

    #[test]
    fn first_seen_active_starts_trail() {
        let mut h = TrackHistory::new();
        assert_eq!(h.observe(&ship(3.0, 4.0, false)), TrackUpdate::Started);
        assert_eq!(h.trail("RescueBoat_1").unwrap(), &[WorldPoint::new(3.0, 4.0)]);
        assert!(h.trail("Unknown").is_none());
    }

    #[test]
    fn clear_forgets_everything() {
        let mut h = TrackHistory::new();
        h.observe(&ship(3.0, 4.0, false));
        h.clear();
        assert!(h.is_empty());
    }
}
