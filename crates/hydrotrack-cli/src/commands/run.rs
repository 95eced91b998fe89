//! Interactive tracking session.
//!
//! This is the host's composition root: one engine, one presenter, one
//! gateway. Commands are read from stdin one per line and each reply is
//! written to stdout as a JSON line. The status surface goes to stderr.

use std::io::{self, BufRead, Write};

use clap::Args;
use hydrotrack_core::{Command, CommandGateway, Config, TrackingEngine};

#[derive(Args)]
pub struct RunArgs {
    /// Begin tracking immediately
    #[arg(long)]
    start: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("hydrotrack-decay")
        .enable_time()
        .build()?;
    let _guard = runtime.enter();

    let engine = TrackingEngine::new(config.engine_settings(), config.presenter())?;
    let gateway = CommandGateway::new(engine);
    tracing::info!(settings = ?config.engine_settings(), "session ready");

    let mut stdout = io::stdout().lock();

    if args.start || config.tracking.start_on_launch {
        let reply = gateway.dispatch(Command::Start)?;
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "quit" | "exit") {
            break;
        }
        let out = match gateway.handle(input) {
            Ok(reply) => serde_json::to_string(&reply)?,
            Err(e) => serde_json::json!({ "error": e.to_string(), "input": input }).to_string(),
        };
        writeln!(stdout, "{out}")?;
        stdout.flush()?;
    }

    gateway.dispatch(Command::Stop)?;
    tracing::info!(level_ml = gateway.query().level_ml, "session ended");
    Ok(())
}
