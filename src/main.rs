use clap::{Parser, Subcommand};
use tracing::info;

use wealth_projection::anim::{RevealPhase, RevealSession, SessionConfig};
use wealth_projection::api::{self, Cli};
use wealth_projection::telemetry;

const FRAME_MS: f64 = 1000.0 / 60.0;
const MAX_REVEAL_MS: f64 = 120_000.0;

#[derive(Parser, Debug)]
#[command(
    name = "wealth-projection",
    about = "Retirement wealth projection with Monte Carlo envelopes and an animated reveal"
)]
struct App {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API.
    Serve {
        #[arg(default_value_t = 8080)]
        port: u16,
    },
    /// Print one projection as JSON.
    Project(Cli),
    /// Replay the reveal animation on a virtual 60 Hz clock.
    Reveal {
        #[arg(long, default_value_t = 500.0, help = "Print a frame every N ms")]
        sample_every: f64,
        #[arg(long, default_value_t = 1200.0, help = "When the result is delivered, in ms")]
        result_delay: f64,
    },
}

#[tokio::main]
async fn main() {
    telemetry::init_logging();

    let app = App::parse();
    let outcome = match app.command {
        Command::Serve { port } => api::run_http_server(port)
            .await
            .map_err(|e| format!("Server error: {e}")),
        Command::Project(cli) => print_projection(&cli),
        Command::Reveal {
            sample_every,
            result_delay,
        } => replay_reveal(sample_every, result_delay),
    };

    if let Err(msg) = outcome {
        eprintln!("{msg}");
        std::process::exit(1);
    }
}

fn print_projection(cli: &Cli) -> Result<(), String> {
    let request = api::build_inputs(cli).map_err(|e| e.to_string())?;
    let response = api::run_projection(&request).map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&response).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn replay_reveal(sample_every: f64, result_delay: f64) -> Result<(), String> {
    if !(sample_every.is_finite() && sample_every > 0.0) {
        return Err("--sample-every must be > 0".to_string());
    }

    let mut session = RevealSession::new(SessionConfig::default()).map_err(|e| e.to_string())?;
    session.start_calculation(0.0);

    let mut delivered = false;
    let mut next_sample = 0.0;
    let mut t = 0.0;
    while t <= MAX_REVEAL_MS {
        if !delivered && t >= result_delay {
            session.deliver_result(t);
            delivered = true;
        }
        let frame = session.frame(t);
        if t >= next_sample {
            let json = serde_json::to_string(&frame).map_err(|e| e.to_string())?;
            println!("{json}");
            next_sample += sample_every;
        }
        if delivered && frame.phase == RevealPhase::Final && !session.is_running() {
            info!(elapsed_ms = t, "reveal finished");
            break;
        }
        t += FRAME_MS;
    }

    session.teardown();
    Ok(())
}
