#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Linkwar matches headlessly.

mod headless;
mod scenario;
mod session;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result as AnyResult};
use clap::Parser;
use linkwar_core::Balance;
use linkwar_rendering::{Color, Presentation, RenderingBackend};
use tracing::info;
use tracing_subscriber::EnvFilter;

use headless::HeadlessBackend;
use scenario::Scenario;
use session::Session;

/// Runs a Linkwar match without a window and prints the final board.
#[derive(Parser, Debug)]
#[command(name = "linkwar", version, about)]
struct Args {
    /// Balance TOML file; omitted fields keep their defaults.
    #[arg(long)]
    balance: Option<PathBuf>,

    /// Scenario TOML file; the built-in three-tower map is used when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Maximum number of frames to simulate.
    #[arg(long, default_value_t = 7_500)]
    frames: u32,

    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Seed for the AI source picker.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Let the AI play the pointer-driven faction too.
    #[arg(long)]
    autoplay: bool,
}

/// Entry point for the Linkwar command-line interface.
fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    ensure!(args.frame_ms > 0, "--frame-ms must be positive");

    let balance = match &args.balance {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("reading balance {}", path.display()))?;
            Balance::from_toml_str(&source)
                .with_context(|| format!("loading balance {}", path.display()))?
        }
        None => Balance::default(),
    };
    let scenario = match &args.scenario {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("reading scenario {}", path.display()))?;
            Scenario::from_toml_str(&source)
                .with_context(|| format!("loading scenario {}", path.display()))?
        }
        None => Scenario::default(),
    };
    info!(
        towers = scenario.towers.len(),
        obstacles = scenario.obstacles.len(),
        player = scenario.player.get(),
        autoplay = args.autoplay,
        seed = args.seed,
        "starting match"
    );

    let mut session = Session::new(balance, &scenario, args.seed, args.autoplay);
    let presentation = Presentation::new(
        "Linkwar",
        Color::from_rgb_u8(0xf8, 0xfa, 0xfc),
        session.scene(),
    );
    let backend = HeadlessBackend::new(args.frames, Duration::from_millis(args.frame_ms));

    backend.run(presentation, move |dt, input, scene| {
        session.frame(dt, input);
        *scene = session.scene();
    })
}
