mod client;
mod config;
mod events;
mod server;
mod session;

use anyhow::Result;
use clap::Parser;

use qnet::{LinkConditions, SimulationConfig};

use config::SessionConfig;
use session::Session;

#[derive(Parser)]
#[command(name = "qnet-server")]
#[command(about = "Replays a lag-compensated session between an authoritative peer and a client")]
struct Args {
    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long, default_value_t = 1, help = "Frames between snapshot broadcasts")]
    send_rate: u32,

    #[arg(long, default_value_t = 100.0, help = "Interpolation delay in ms")]
    interpolation_delay: f64,

    #[arg(long, default_value_t = 100.0, help = "Extrapolation limit in ms")]
    extrapolation: f64,

    #[arg(long)]
    no_smoothing: bool,

    #[arg(short, long, default_value_t = 10.0, help = "Session length in seconds")]
    duration: f64,

    #[arg(short, long, default_value_t = 2)]
    bots: usize,

    #[arg(short, long, default_value_t = 1)]
    agents: usize,

    #[arg(long, default_value_t = 0.5, help = "Seconds between client shots")]
    shot_interval: f64,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, default_value_t = 50, help = "Minimum latency in ms")]
    min_latency: u32,

    #[arg(long, default_value_t = 50, help = "Maximum latency in ms")]
    max_latency: u32,

    #[arg(long, default_value_t = 0, help = "Jitter in ms")]
    jitter: u32,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    #[arg(long, help = "Sleep between frames instead of running flat out")]
    realtime: bool,
}

impl Args {
    fn link(&self) -> LinkConditions {
        LinkConditions {
            loss_percent: self.loss_percent,
            min_latency_ms: self.min_latency,
            max_latency_ms: self.max_latency.max(self.min_latency),
            jitter_ms: self.jitter,
        }
    }

    fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            tick_rate: self.tick_rate,
            send_rate: self.send_rate,
            interpolation_delay_ms: self.interpolation_delay,
            extrapolation_ms: self.extrapolation,
            smoothing_enabled: !self.no_smoothing,
            ..Default::default()
        }
    }

    fn session(&self) -> SessionConfig {
        SessionConfig {
            duration_secs: self.duration,
            bots: self.bots,
            agents: self.agents,
            shot_interval_secs: self.shot_interval,
            downlink: self.link(),
            uplink: self.link(),
            seed: self.seed,
            realtime: self.realtime,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let simulation = args.simulation();
    let validated = simulation.validated();
    if validated.tick_rate != simulation.tick_rate {
        log::warn!(
            "tick rate {} clamped to {}",
            simulation.tick_rate,
            validated.tick_rate
        );
    }

    let report = Session::new(&validated, args.session())?.run()?;
    log::info!("session finished");
    println!("{}", report);

    Ok(())
}
