mod cli;
mod format;
mod output;
mod shutdown;

use std::sync::Arc;

use clap::Parser as _;

use pressroom_engine::{Emitter, SinkMode, start_simulation};

use crate::cli::{Cli, OutputMode};
use crate::output::{JsonSink, TerminalSink};
use crate::shutdown::{ShutdownController, ShutdownEvent, spawn_ctrl_c_handler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Help and version are clean exits; everything else is an
            // invalid-parameter failure.
            std::process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    let mut params = cli.to_parameters();
    params.normalize();
    if let Err(err) = params.validate() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    let mut emitter = Emitter::new();
    match cli.output {
        OutputMode::Terminal => {
            emitter.register_terminal(Arc::new(TerminalSink::new()));
            emitter.select(SinkMode::Terminal);
        }
        OutputMode::Json => {
            emitter.register_server(Arc::new(JsonSink::new()));
            emitter.select(SinkMode::Server);
        }
    }

    let handle = start_simulation(params, emitter);
    let stopper = handle.stopper();

    let shutdown = Arc::new(ShutdownController::new());
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::unbounded_channel::<ShutdownEvent>();
    spawn_ctrl_c_handler(shutdown, shutdown_tx);

    tokio::spawn(async move {
        while let Some(event) = shutdown_rx.recv().await {
            match event {
                ShutdownEvent::Graceful => {
                    eprintln!(
                        "Stop requested — draining the queue before exiting (press CTRL+C again to exit immediately)."
                    );
                    stopper.request_stop();
                }
                ShutdownEvent::Immediate => {
                    eprintln!("Stop requested again — exiting immediately.");
                    std::process::exit(130);
                }
            }
        }
    });

    handle.wait().await?;
    Ok(())
}
