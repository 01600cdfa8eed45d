#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Fogline scenario frame by frame.

mod scenario;
mod session;
mod snapshot_transfer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fogline_system_pathfinding::PathResponse;

use crate::{
    scenario::Scenario,
    session::{FrameReport, Session},
    snapshot_transfer::SessionSnapshot,
};

/// Runs a map scenario and prints fog, exploration and path results.
#[derive(Debug, Parser)]
#[command(name = "fogline", version)]
struct CliArgs {
    /// TOML scenario to run; the built-in outpost scenario is used when omitted.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 3)]
    frames: u32,

    /// Maximum number of path searches per frame.
    #[arg(long, default_value_t = 8)]
    path_budget: usize,

    /// Print a snapshot string after the last frame.
    #[arg(long)]
    export: bool,

    /// Resume map, occupancy and fog from a snapshot string.
    #[arg(long, value_name = "SNAPSHOT")]
    import: Option<String>,
}

/// Entry point for the Fogline command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::builtin()?,
    };

    let mut session = Session::from_scenario(&scenario)?;
    if let Some(encoded) = &args.import {
        let snapshot = SessionSnapshot::decode(encoded).context("invalid snapshot string")?;
        session.restore(&snapshot)?;
    }

    for _ in 0..args.frames {
        let report = session.step(args.path_budget);
        print_frame(&report, session.exploration());
    }

    print!("{}", session.render_fog());
    if session.pending_requests() > 0 {
        println!("{} path request(s) still pending", session.pending_requests());
    }

    if args.export {
        let encoded = session
            .snapshot()
            .encode()
            .context("failed to export snapshot")?;
        println!("{encoded}");
    }
    Ok(())
}

fn print_frame(report: &FrameReport, (explored, total): (usize, usize)) {
    println!(
        "frame {}: revealed {}, dimmed {}, newly explored {}, explored {explored}/{total}, searches {}",
        report.frame,
        report.fog.revealed.len(),
        report.fog.dimmed.len(),
        report.fog.newly_explored.len(),
        report.searches,
    );
    for response in &report.responses {
        match response {
            PathResponse::Found { requester, path } => {
                let waypoints: Vec<String> = path
                    .waypoints()
                    .iter()
                    .map(|point| format!("({}, {})", point.x, point.y))
                    .collect();
                println!(
                    "  entity {}: {} waypoint(s) {}",
                    requester.get(),
                    path.len(),
                    waypoints.join(" -> ")
                );
            }
            PathResponse::Rejected { requester, reason } => {
                println!("  entity {}: rejected, {reason}", requester.get());
            }
        }
    }
}
