//! Load generator for the observability demo API.
//!
//! Each simulated user waits 1 to 2.5 seconds, then requests `/api/data`
//! three times as often as `/health`. A summary table prints on exit.

use std::time::Duration;

use clap::Parser;

use observability_demo::lifecycle::{signals, Shutdown};
use observability_demo::loadgen::{render_report, LoadProfile, LoadRunner, WaitTime};
use observability_demo::observability::logging;

#[derive(Parser)]
#[command(name = "loadgen")]
#[command(about = "Drive traffic at the observability demo API", long_about = None)]
struct Cli {
    /// Base URL of the service under test
    #[arg(long, default_value = "http://localhost:5000")]
    host: String,

    /// Number of concurrent simulated users
    #[arg(short, long, default_value_t = 10)]
    users: usize,

    /// Users started per second
    #[arg(short = 'r', long, default_value_t = 1.0)]
    spawn_rate: f64,

    /// Stop after this many seconds (runs until Ctrl+C when omitted)
    #[arg(short = 't', long)]
    run_time: Option<u64>,

    /// Minimum think time between requests, in seconds
    #[arg(long, default_value_t = 1.0)]
    min_wait: f64,

    /// Maximum think time between requests, in seconds
    #[arg(long, default_value_t = 2.5)]
    max_wait: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_console("observability_demo=info,loadgen=info")?;

    let mut profile = LoadProfile::new(&cli.host)?;
    profile.users = cli.users;
    profile.spawn_rate = cli.spawn_rate;
    profile.wait = WaitTime::between(cli.min_wait, cli.max_wait)?;
    profile.run_time = cli.run_time.map(Duration::from_secs);

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_ctrl_c(shutdown.clone()));

    let snapshots = LoadRunner::new(profile)?.run(shutdown).await;
    println!("\n{}", render_report(&snapshots));
    Ok(())
}
