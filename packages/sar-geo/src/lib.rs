//! # sar-geo
//!
//! Geospatial core of the SAR dashboard: one coordinate transformer shared by
//! every call site, the pan/zoom viewport, the ocean-current grid sampler,
//! per-ship trails and the rescue route planner.
//!
//! The math is synchronous and infallible; "not ready" comes back as `None`
//! or an empty result. Only loading, config and dispatch return [`GeoError`].

pub mod config;
pub mod current;
pub mod current_source;
pub mod dispatch;
pub mod error;
pub mod grid_index;
pub mod rescue;
pub mod session;
pub mod track;
pub mod transform;
pub mod viewport;
pub mod waypoint;

pub use config::DashboardConfig;
pub use current::{CurrentGrid, CurrentSample, CurrentSampler};
pub use current_source::{CsvGridSource, CurrentCache, GridSource};
pub use dispatch::CommandDispatcher;
pub use error::{GeoError, Result};
pub use grid_index::{GridIndexer, IndexRange};
pub use rescue::{RescuePlan, RescuePlanner};
pub use session::DashboardSession;
pub use track::TrackHistory;
pub use transform::{CoordinateTransformer, GeoBounds, WorldBounds};
pub use viewport::{ContainerSize, Viewport, ViewportState};
pub use waypoint::WaypointRecorder;
