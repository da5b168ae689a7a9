mod alloc;
mod cgroup;
mod config;
mod error;
mod gradual;
mod interrupt;
mod logging;
mod phase;
mod procfs;
mod size;

use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};

use crate::{
    config::Config,
    phase::{Controller, RunOutcome},
};

#[derive(Parser, Debug)]
#[command(name = "ramen")]
#[command(about = "Consume a given amount of memory, optionally ramping up over time")]
#[command(version)]
struct Cli {
    /// Amount of memory to consume (e.g. 500, 500M, 1G). Defaults to MB
    #[arg(short, long, env = "RAMEN_SIZE", default_value = "", allow_hyphen_values = true)]
    size: String,

    /// Wait time in seconds before starting memory allocation
    #[arg(short, long, env = "RAMEN_WAIT", default_value_t = 0, allow_negative_numbers = true)]
    wait: i64,

    /// Time in seconds to gradually grow memory to the target size (0 = allocate instantly)
    #[arg(short, long, env = "RAMEN_TIME", default_value_t = 0, allow_negative_numbers = true)]
    time: i64,
}

fn usage() -> String {
    let prog = std::env::args().next().unwrap_or_else(|| "ramen".to_string());
    format!("Usage: {prog} --size <size> [-w <wait_seconds>] [-t <grow_seconds>]")
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    let cfg = match Config::new(&cli.size, cli.wait, cli.time) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {e}");
            println!("{}", usage());
            return ExitCode::FAILURE;
        }
    };

    // signály musí být nachystané dřív, než začne cokoliv blokovat
    let (handle, interrupt) = interrupt::channel();
    if let Err(e) = interrupt::spawn_signal_listener(handle) {
        log_anyhow_with_source!(e, "failed to set up signal handling");
        return ExitCode::FAILURE;
    }

    info!(
        size_mb = cfg.size.megabytes(),
        wait_secs = cfg.wait.as_secs(),
        grow_secs = cfg.grow.as_secs(),
        "starting ramen"
    );

    let mut controller = Controller::new(cfg, interrupt);
    match controller.run().await {
        RunOutcome::InterruptedWaiting => {}
        RunOutcome::InterruptedGrowing {
            allocated_mb,
            total_mb,
        } => warn!(allocated_mb, total_mb, "stopped before reaching target size"),
        RunOutcome::Released { size_mb } => info!(size_mb, "released memory"),
    }

    ExitCode::SUCCESS
}
