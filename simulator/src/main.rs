use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use std::fs;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::SessionConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Route replay driver for the location tracking core")]
struct Args {
    /// Replay the route once and write a GeoJSON report of the tracked path
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a session config from YAML
    #[arg(long)]
    session: Option<PathBuf>,
    #[arg(long, default_value_t = 120)]
    fixes: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Answer the permission prompt with a refusal
    #[arg(long, default_value_t = false)]
    deny: bool,
    /// Refuse fine location but grant coarse location at the prompt
    #[arg(long, default_value_t = false)]
    coarse_only: bool,
    /// Only track once permission has been granted
    #[arg(long, default_value_t = false)]
    require_permission: bool,
    /// Start without a last-known position
    #[arg(long, default_value_t = false)]
    no_initial_fix: bool,
    /// Keep the HTTP bridge alive for live fixes
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let session_config = if let Some(path) = args.session {
        SessionConfig::load(path)?
    } else {
        SessionConfig::from_args(
            args.fixes,
            args.seed,
            args.deny,
            args.coarse_only,
            args.require_permission,
            !args.no_initial_fix,
        )
    };

    let gui_bridge = GuiBridge::new();

    if args.offline {
        let runner = Runner::new(session_config.clone());
        let result = runner.execute(gui_bridge.sink())?;

        println!(
            "Offline run -> tracked {} of {} fixes, {:.1} m, state {:?}, permission {:?}",
            result.points.len(),
            result.reported_fixes,
            result.distance_meters,
            result.final_state,
            result.permission
        );
        gui_bridge.publish_metrics(&result);
        gui_bridge.publish_status("Offline session results ready.");

        let report = serde_json::to_string_pretty(&result.overlay(&session_config).to_geojson())
            .context("encoding track report")?;
        let report_path = PathBuf::from("tools/data/offline_track.geojson");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&report_path, report)
            .with_context(|| format!("writing {}", report_path.display()))?;
    }
    if args.serve {
        gui_bridge
            .spawn_server(session_config)
            .context("starting HTTP bridge")?;
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
