//! nextbot CLI - navigation mesh tooling.
//!
//! - `nextbot inspect` - summarize a mesh description
//! - `nextbot path` - compute a path and print its segments
//! - `nextbot follow` - compute a path and walk a simulated bot along it

mod config;
mod sim;

use std::path::{Path as FsPath, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use nextbot_nav::{
    ActorState, ComputeOptions, MeshTraversal, NavDir, NavMesh, NavSettings, Path, PathContext,
    PathOutcome, SearchScratch, Segment, ShortestPathCost, Team, Vec3,
};
use nextbot_core::EntityHandle;

use crate::sim::{SimEnd, SimSetup};

#[derive(Parser)]
#[command(name = "nextbot")]
#[command(about = "Navigation mesh pathfinding tools", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a mesh description
    Inspect {
        /// Mesh description (JSON or YAML)
        mesh: PathBuf,
    },

    /// Compute a path between two points
    Path {
        #[command(flatten)]
        route: RouteArgs,

        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },

    /// Walk a simulated bot along a computed path
    Follow {
        #[command(flatten)]
        route: RouteArgs,

        /// Seconds per tick
        #[arg(long, default_value_t = 0.05)]
        dt: f32,

        /// Give up after this many ticks
        #[arg(long, default_value_t = 10_000)]
        max_ticks: u64,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Args)]
struct RouteArgs {
    /// Mesh description (JSON or YAML)
    mesh: PathBuf,

    /// Start position as x,y,z
    #[arg(long, value_parser = parse_vec3)]
    from: Vec3,

    /// Goal position as x,y,z
    #[arg(long, value_parser = parse_vec3)]
    to: Vec3,

    /// Navigation settings (JSON or YAML); defaults when omitted
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Search on behalf of this team (0 or 1)
    #[arg(long)]
    team: Option<u8>,

    /// Fail instead of returning a partial route
    #[arg(long)]
    strict: bool,
}

fn parse_vec3(s: &str) -> std::result::Result<Vec3, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        [x, y] => Ok(Vec3::new(*x, *y, 0.0)),
        _ => Err(format!("expected x,y,z but got {s:?}")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Inspect { mesh } => inspect(&mesh),
        Commands::Path { route, json } => show_path(&route, json),
        Commands::Follow {
            route,
            dt,
            max_ticks,
            seed,
        } => follow(&route, dt, max_ticks, seed),
    }
}

fn inspect(mesh_path: &FsPath) -> Result<()> {
    let mesh = config::load_mesh(mesh_path)?;

    println!("Navigation mesh: {}", mesh_path.display());
    println!("Areas: {}", mesh.area_count());
    for area in mesh.areas() {
        let exits: usize = NavDir::ALL
            .iter()
            .map(|dir| area.adjacent(*dir).len())
            .sum();
        println!(
            "  {} center ({:.1}, {:.1}, {:.1}) size {:.0}x{:.0} exits {} flags {:#x}",
            area.id(),
            area.center().x,
            area.center().y,
            area.center().z,
            area.size_x(),
            area.size_y(),
            exits,
            area.flags().bits(),
        );
    }
    println!("Ladders: {}", mesh.ladders().len());
    for ladder in mesh.ladders() {
        println!(
            "  {} length {:.0} bottom {:?} top {:?}",
            ladder.id(),
            ladder.length(),
            ladder.bottom_area(),
            ladder.top_areas().all().collect::<Vec<_>>(),
        );
    }
    Ok(())
}

struct Loaded {
    mesh: NavMesh,
    settings: NavSettings,
}

fn load(route: &RouteArgs) -> Result<Loaded> {
    let mesh = config::load_mesh(&route.mesh)?;
    let settings = config::load_settings(route.settings.as_deref())?;
    Ok(Loaded { mesh, settings })
}

fn team(route: &RouteArgs) -> Result<Team> {
    match route.team {
        None => Ok(Team::Any),
        Some(t @ (0 | 1)) => Ok(Team::Team(t)),
        Some(t) => bail!("unknown team {t}; expected 0 or 1"),
    }
}

fn compute(loaded: &Loaded, route: &RouteArgs, path: &mut Path) -> Result<PathOutcome> {
    let Loaded { mesh, settings } = loaded;
    let world = MeshTraversal::new(mesh, settings.mover.step_height);
    let cx = PathContext {
        now: 0.0,
        mesh,
        world: &world,
        mover: &settings.mover,
        config: &settings.path,
    };
    let agent = ActorState::new(EntityHandle::new(0, 0), route.from).located(mesh);
    let cost = ShortestPathCost::new(&settings.mover, team(route)?);
    let options = ComputeOptions {
        allow_partial: !route.strict,
        ..ComputeOptions::default()
    };

    let outcome = path
        .compute_to_position(&cx, &mut SearchScratch::new(), &agent, route.to, &cost, &options)
        .with_context(|| format!("No path from {:?} to {:?}", route.from, route.to))?;
    tracing::info!(
        outcome = ?outcome,
        segments = path.segment_count(),
        length = path.length(),
        "Computed path"
    );
    Ok(outcome)
}

#[derive(Serialize)]
struct SegmentRow {
    index: usize,
    area: u32,
    kind: String,
    pos: [f32; 3],
    distance: f32,
    curvature: f32,
    ladder: Option<u32>,
}

impl SegmentRow {
    fn new(index: usize, seg: &Segment) -> Self {
        Self {
            index,
            area: seg.area.0,
            kind: format!("{:?}", seg.kind),
            pos: [seg.pos.x, seg.pos.y, seg.pos.z],
            distance: seg.distance_from_start,
            curvature: seg.curvature,
            ladder: seg.ladder.map(|l| l.0),
        }
    }
}

fn show_path(route: &RouteArgs, json: bool) -> Result<()> {
    let loaded = load(route)?;
    let mut path = Path::with_capacity(loaded.settings.path.capacity());
    let outcome = compute(&loaded, route, &mut path)?;

    let rows: Vec<SegmentRow> = path
        .segments()
        .iter()
        .enumerate()
        .map(|(i, seg)| SegmentRow::new(i, seg))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Path ({outcome:?}): {} segments, length {:.1}", rows.len(), path.length());
    for row in &rows {
        println!(
            "  [{:>3}] area #{:<5} {:<12} ({:.1}, {:.1}, {:.1}) at {:.1}",
            row.index, row.area, row.kind, row.pos[0], row.pos[1], row.pos[2], row.distance
        );
    }
    Ok(())
}

fn follow(route: &RouteArgs, dt: f32, max_ticks: u64, seed: u64) -> Result<()> {
    if dt.is_nan() || dt <= 0.0 {
        bail!("tick length must be positive, got {dt}");
    }
    let loaded = load(route)?;
    let setup = SimSetup {
        mesh: &loaded.mesh,
        settings: &loaded.settings,
        from: route.from,
        dt_seconds: dt,
        seed,
        max_ticks,
    };

    let mut bot = sim::spawn_bot(&setup);
    let mut follower = nextbot_nav::PathFollower::new(loaded.settings.follower.clone());
    let mut path = Path::with_capacity(loaded.settings.path.capacity());
    let outcome = compute(&loaded, route, &mut path)?;
    follower.set_path(&path);

    let summary = sim::run(&setup, &mut follower, &mut bot);
    let end = match summary.end {
        SimEnd::Arrived => "arrived",
        SimEnd::Failed => "failed",
        SimEnd::TimedOut => "timed out",
    };
    println!(
        "Follow ({outcome:?} path): {end} after {} ticks ({:.2}s), travelled {:.1}, at ({:.1}, {:.1}, {:.1})",
        summary.ticks,
        summary.time_seconds,
        summary.distance_travelled,
        summary.final_position.x,
        summary.final_position.y,
        summary.final_position.z,
    );
    if summary.end != SimEnd::Arrived {
        bail!("bot did not reach {:?}", route.to);
    }
    Ok(())
}
