//! The root process: spawns and supervises the worker cohort, each sharing
//! one listening port, and owns process-level signal handling (spec §4.4).

use std::path::Path;
use std::process::{Child, Command};

use crate::config::Config;
use crate::error::Error;
use crate::server::tcp;
use crate::Result;

/// An opaque worker process handle plus a liveness flag, created on spawn
/// and destroyed once the process has been joined.
struct WorkerHandle {
    child: Child,
    alive: bool,
}

impl WorkerHandle {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Requests termination. Does not wait for the process to exit; that is
    /// [`WorkerHandle::join`]'s job. A worker's own signal handler is what
    /// turns this into its graceful `should_exit` shutdown (spec §4.2); this
    /// is purely the Manager-side half of that handshake.
    fn terminate(&mut self) {
        if !self.alive {
            return;
        }
        #[cfg(unix)]
        unsafe {
            let _ = libc::kill(self.pid() as libc::pid_t, libc::SIGTERM);
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.kill();
        }
    }

    /// Blocks until the process has exited. Crash policy: a worker that
    /// exits for any reason, at any time, is not respawned (spec §4.4).
    fn join(&mut self) {
        match self.child.wait() {
            Ok(status) => {
                tracing::info!(pid = self.pid(), %status, "worker process exited");
            }
            Err(err) => {
                tracing::warn!(pid = self.pid(), %err, "error waiting on worker process");
            }
        }
        self.alive = false;
    }
}

/// Supervises `config.workers` worker processes bound to the same
/// `(host, port)`.
#[derive(Debug)]
pub struct Manager {
    config: Config,
}

impl Manager {
    pub fn new(config: Config) -> Manager {
        Manager { config }
    }

    /// Installs signal handlers, spawns the worker cohort, blocks until a
    /// termination signal arrives, then terminates and reaps every worker.
    pub async fn run(self) -> Result<()> {
        let requested = self.config.workers.max(1);
        let workers = if requested > 1 && !tcp::supports_port_sharing() {
            tracing::warn!(
                requested,
                "this platform has no shared-port listening facility; running a single worker"
            );
            1
        } else {
            requested
        };

        let exe = std::env::current_exe().map_err(Error::new_spawn)?;
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let child = spawn_worker(&exe, &self.config)?;
            tracing::info!(pid = child.id(), "spawned worker process");
            handles.push(WorkerHandle { child, alive: true });
        }

        wait_for_signal().await;
        tracing::info!(workers = handles.len(), "manager received shutdown signal");

        for handle in handles.iter_mut() {
            handle.terminate();
        }
        for handle in handles.iter_mut() {
            handle.join();
        }

        Ok(())
    }
}

/// Spawns one worker with a freshly re-executed copy of this binary: no
/// address space, file descriptors (beyond the standard three), or heap
/// state is inherited. Rust has no `multiprocessing.Process(target=...)`
/// equivalent, so re-exec is the fresh-process model spec §4.4 calls for
/// (see DESIGN.md's Open Question resolutions).
fn spawn_worker(exe: &Path, config: &Config) -> Result<Child> {
    Command::new(exe)
        .arg("--worker")
        .arg("--app")
        .arg(&config.app)
        .arg("--host")
        .arg(&config.host)
        .arg("--port")
        .arg(config.port.to_string())
        .arg("--backlog")
        .arg(config.backlog.to_string())
        .spawn()
        .map_err(Error::new_spawn)
}

/// Blocks until SIGINT or SIGTERM arrives (spec §6 "Signals" — both
/// initiate graceful shutdown, there is no reload signal).
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint =
        signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sigterm =
        signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
