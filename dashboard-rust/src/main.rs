//! main.rs — SAR dashboard command-line entry point
//!
//! Subcommands:
//!   plan      compute the rescue area and per-ship routes from a status snapshot
//!   currents  sample the ocean-current field over a geographic box
//!   convert   world / geo / screen coordinate conversions
//!   spawn     emit a spawn-persons command
//!   watch     poll a status snapshot file and track ships until Ctrl-C

mod dispatch;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::time::interval;
use tracing::{debug, info, warn};

use sar_geo::dispatch::{dispatch_plan, CommandDispatcher};
use sar_geo::{CurrentCache, DashboardConfig, DashboardSession, GeoBounds, Viewport};
use sar_types::{GeoPoint, ImageSize, ScreenPoint, StatusSnapshot, WorldPoint};

use dispatch::JsonLinesDispatcher;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sar-dash", about = "Maritime SAR dashboard geospatial core")]
struct Args {
    /// Config file path (falls back to the bundled config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan rescue routes from a status snapshot (JSON)
    Plan {
        #[arg(long)]
        status: PathBuf,
        /// Write waypoint + START commands as JSON lines ("-" for stdout)
        #[arg(long)]
        dispatch: Option<PathBuf>,
    },
    /// Sample the current field; defaults to the whole map extent
    Currents {
        /// lat_min,lon_min,lat_max,lon_max
        #[arg(long, value_delimiter = ',', num_args = 4, allow_negative_numbers = true)]
        bbox: Option<Vec<f64>>,
        /// Directory with speed.csv and direction.csv
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Coordinate conversions
    #[command(subcommand)]
    Convert(Convert),
    /// Spawn persons in distress around a world point
    Spawn {
        #[arg(long, default_value = "10")]
        count: u32,
        #[arg(long, default_value = "500")]
        radius: f64,
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, allow_negative_numbers = true)]
        z: f64,
        #[arg(long, default_value = "-")]
        dispatch: PathBuf,
    },
    /// Poll a status snapshot file, tracking ships and the rescue area
    Watch {
        #[arg(long)]
        status: PathBuf,
        #[arg(long, default_value = "100")]
        interval_ms: u64,
    },
}

#[derive(Subcommand, Debug)]
enum Convert {
    /// World (x, z) → lat/lon
    #[command(allow_negative_numbers = true)]
    WorldToGeo { x: f64, z: f64 },
    /// lat/lon → world (x, z)
    #[command(allow_negative_numbers = true)]
    GeoToWorld { lat: f64, lon: f64 },
    /// Screen pixel → world and lat/lon under an explicit viewport
    #[command(allow_negative_numbers = true)]
    ScreenToWorld {
        x: f64,
        y: f64,
        #[arg(long)]
        image_width: f64,
        #[arg(long)]
        image_height: f64,
        #[arg(long, default_value = "1.0")]
        scale: f64,
        #[arg(long, default_value = "0.0")]
        pan_x: f64,
        #[arg(long, default_value = "0.0")]
        pan_y: f64,
    },
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sar_dashboard=info,sar_geo=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let cfg = DashboardConfig::load(args.config.as_deref(), include_str!("../config.toml"))
        .context("loading dashboard config")?;

    match args.command {
        Command::Plan { status, dispatch } => plan(&cfg, &status, dispatch.as_deref()),
        Command::Currents { bbox, dir } => currents(cfg, bbox, dir),
        Command::Convert(c) => convert(&cfg, c),
        Command::Spawn { count, radius, x, z, dispatch } => {
            let mut d = JsonLinesDispatcher::new(open_sink(&dispatch)?);
            d.spawn_persons(count, radius, WorldPoint::new(x, z))?;
            info!("Spawn of {count} persons within {radius} m of ({x}, {z}) queued");
            Ok(())
        }
        Command::Watch { status, interval_ms } => watch(&cfg, &status, interval_ms).await,
    }
}

fn read_snapshot(path: &Path) -> Result<StatusSnapshot> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing status snapshot {}", path.display()))
}

fn open_sink(path: &Path) -> Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdout()));
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn plan(cfg: &DashboardConfig, status: &Path, dispatch: Option<&Path>) -> Result<()> {
    let mut session = DashboardSession::new(cfg)?;
    session.ingest(read_snapshot(status)?);

    let Some(plan) = session.plan_rescue() else {
        info!(
            "Nothing to plan: {} unsaved persons, departure route {}",
            session.unsaved_persons().len(),
            if cfg.departure_route().is_some() { "present" } else { "missing" }
        );
        return Ok(());
    };

    let stats = session.map_stats();
    info!(
        "Map range {:.0} m × {:.0} m, avg ship↔saved distance {}",
        stats.range_x,
        stats.range_z,
        stats.avg_distance.map_or("--".to_string(), |d| format!("{d:.1} m"))
    );

    match dispatch {
        Some(path) => {
            let mut d = JsonLinesDispatcher::new(open_sink(path)?);
            let n = dispatch_plan(&mut d, &plan)?;
            info!("{} commands written for {n} ships", d.sent());
        }
        None => println!("{}", serde_json::to_string_pretty(&plan)?),
    }
    Ok(())
}

fn currents(mut cfg: DashboardConfig, bbox: Option<Vec<f64>>, dir: Option<PathBuf>) -> Result<()> {
    if let Some(dir) = dir {
        cfg.grid.data_dir = dir;
    }
    let bbox = match bbox.as_deref() {
        Some(&[lat_min, lon_min, lat_max, lon_max]) => GeoBounds::from_corners(
            GeoPoint::new(lat_min, lon_min),
            GeoPoint::new(lat_max, lon_max),
        ),
        Some(other) => bail!("--bbox needs 4 values, got {}", other.len()),
        None => cfg.map.geo,
    };

    let sampler = cfg.sampler();
    let mut cache = CurrentCache::new(cfg.grid_source());
    let samples = sampler
        .sample_cached(&mut cache, &bbox)
        .with_context(|| format!("loading currents from {}", cfg.grid.data_dir.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for s in &samples {
        serde_json::to_writer(&mut out, s)?;
        out.write_all(b"\n")?;
    }
    if let Some(at) = cache.fetched_at() {
        info!("{} current samples (grid fetched {})", samples.len(), at.to_rfc3339());
    }
    Ok(())
}

fn convert(cfg: &DashboardConfig, c: Convert) -> Result<()> {
    let t = cfg.transformer();
    let value = match c {
        Convert::WorldToGeo { x, z } => serde_json::to_value(t.world_to_geo(&WorldPoint::new(x, z)))?,
        Convert::GeoToWorld { lat, lon } => serde_json::to_value(t.geo_to_world(&GeoPoint::new(lat, lon)))?,
        Convert::ScreenToWorld { x, y, image_width, image_height, scale, pan_x, pan_y } => {
            if scale.is_nan() || scale <= 0.0 {
                bail!("--scale must be positive");
            }
            let vp = Viewport {
                scale,
                pan: ScreenPoint::new(pan_x, pan_y),
                image: ImageSize::new(image_width, image_height),
            };
            let screen = ScreenPoint::new(x, y);
            let (Some(world), Some(geo)) = (t.screen_to_world(&screen, &vp), t.screen_to_geo(&screen, &vp)) else {
                bail!("image size must be positive");
            };
            serde_json::json!({ "world": world, "geo": geo })
        }
    };
    println!("{value}");
    Ok(())
}

// ── Watch loop ────────────────────────────────────────────────────────────────

async fn watch(cfg: &DashboardConfig, status: &Path, interval_ms: u64) -> Result<()> {
    let mut session = DashboardSession::new(cfg)?;
    let mut ticker = interval(Duration::from_millis(interval_ms.max(1)));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!("Watching {} every {interval_ms} ms (session {})", status.display(), session.id());
    let mut last_area = None;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Stopping watch, {} ships tracked", session.tracks().len());
                break;
            }
            _ = ticker.tick() => {
                let text = match tokio::fs::read_to_string(status).await {
                    Ok(text) => text,
                    Err(e) => {
                        debug!("Status file unavailable: {e}");
                        continue;
                    }
                };
                let snapshot: StatusSnapshot = match serde_json::from_str(&text) {
                    Ok(s) => s,
                    Err(e) => {
                        warn!("Bad status snapshot, keeping last good one: {e}");
                        continue;
                    }
                };
                session.ingest(snapshot);

                let area = session.rescue_area();
                if area != last_area {
                    match &area {
                        Some(a) => info!(
                            "Rescue area ({:.1}, {:.1}) r={:.1} m, {} unsaved",
                            a.center_x,
                            a.center_z,
                            a.radius,
                            session.unsaved_persons().len()
                        ),
                        None => info!("All persons saved"),
                    }
                    last_area = area;
                }
            }
        }
    }
    Ok(())
}
