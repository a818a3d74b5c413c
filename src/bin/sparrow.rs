//! Thin CLI entry point driving [`sparrow::Manager`] or, under `--worker`, a
//! single [`sparrow::Server`] directly (spec §10.6).

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use sparrow::{Config, Manager, Server};

/// A minimal ASGI-style application server.
#[derive(Parser, Debug)]
#[command(name = "sparrow", about = "A minimal ASGI-style application server")]
struct Cli {
    /// Application reference, "<module>:<attribute>", resolved against the
    /// in-process application registry.
    #[arg(long)]
    app: String,

    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Number of worker processes to spawn. Ignored under --worker.
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Informational only; not used to configure the listener (spec §6).
    #[arg(long, default_value_t = 100)]
    backlog: u32,

    /// Internal: marks this process as a re-exec'd worker rather than the
    /// manager. Set by the Manager when it spawns each child; not meant to
    /// be passed on the command line by users.
    #[arg(long, hide = true)]
    worker: bool,
}

fn main() -> ExitCode {
    sparrow::logging::init();

    let cli = Cli::parse();
    let config = Config {
        app: cli.app,
        host: cli.host,
        port: cli.port,
        workers: cli.workers,
        backlog: cli.backlog,
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start the async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = if cli.worker {
        runtime.block_on(run_worker(config))
    } else {
        runtime.block_on(Manager::new(config).run())
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "sparrow exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run_worker(config: Config) -> sparrow::Result<()> {
    let server = Server::new(config);
    install_exit_handler(server.should_exit_handle());
    server.run().await
}

/// Installs the worker's own SIGINT/SIGTERM handler, independent of the
/// Manager's: it only flips `should_exit`, it does not cancel in-flight
/// cycles (spec §4.2 "Signal semantics").
#[cfg(unix)]
fn install_exit_handler(should_exit: Arc<AtomicBool>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigint =
            signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
        should_exit.store(true, Ordering::SeqCst);
    });
}

#[cfg(not(unix))]
fn install_exit_handler(should_exit: Arc<AtomicBool>) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        should_exit.store(true, Ordering::SeqCst);
    });
}
