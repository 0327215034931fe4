//! Server/client process pair launching
//!
//! One cycle starts the server without waiting for it, then starts the
//! client and waits for it to exit. The server is owned by a
//! [`ServerGuard`] for the whole cycle: once the client is done it gets a
//! grace period to exit by itself, after which it is terminated. No server
//! outlives the cycle that started it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use super::invocation::RunInvocation;
use crate::common::config::{resolve_executable, SweepConfig};
use crate::common::{Error, Result};

/// Which side of the process pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => f.write_str("server"),
            Role::Client => f.write_str("client"),
        }
    }
}

/// Position of a cycle within the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleId {
    /// 1-based data row
    pub row: usize,
    /// 1-based repeat within the row
    pub repeat: u32,
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} run {}", self.row, self.repeat)
    }
}

/// Progress of a single cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    ServerStarted,
    ClientStarted,
    ClientFinished,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CycleState::Idle => "idle",
            CycleState::ServerStarted => "server started",
            CycleState::ClientStarted => "client started",
            CycleState::ClientFinished => "client finished",
        };
        f.write_str(s)
    }
}

/// How the client run ended
///
/// Recorded for the summary only; the sweep continues in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientOutcome {
    /// Exit code 0
    Success,
    /// Non-zero exit code, or killed by a signal (`code` is `None`)
    Failed { code: Option<i32> },
    /// The client could not be started
    SpawnFailed(String),
    /// The client exceeded the configured timeout and was killed
    TimedOut,
}

impl ClientOutcome {
    fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            ClientOutcome::Success
        } else {
            ClientOutcome::Failed {
                code: status.code(),
            }
        }
    }
}

/// How the server's part of the cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerOutcome {
    /// Exited within the grace period
    Exited { code: Option<i32> },
    /// Still running after the grace period and stopped by us
    Terminated,
}

/// Result of one completed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    pub client: ClientOutcome,
    pub server: ServerOutcome,
}

/// Runs one server/client cycle for an invocation
///
/// An `Err` means the server could not be started; everything that happens
/// to the client is reported through [`CycleOutcome`].
#[async_trait]
pub trait PairLauncher: Send {
    async fn run_cycle(&mut self, invocation: &RunInvocation, cycle: CycleId)
        -> Result<CycleOutcome>;
}

/// Scoped owner of a running server process
///
/// Dropping the guard kills the server; [`ServerGuard::finish`] is the
/// orderly path.
pub struct ServerGuard {
    child: Child,
}

impl ServerGuard {
    /// Start the server without waiting for it
    pub fn spawn(program: &Path, args: &[String]) -> Result<Self> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::spawn(Role::Server, program, e))?;
        Ok(Self { child })
    }

    /// OS process id, if the server has not been reaped yet
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Give the server `grace` to exit on its own, then stop it
    pub async fn finish(mut self, grace: Duration) -> ServerOutcome {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => ServerOutcome::Exited {
                code: status.code(),
            },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to wait for server, killing it");
                let _ = self.child.kill().await;
                ServerOutcome::Terminated
            }
            Err(_) => {
                self.terminate(grace).await;
                ServerOutcome::Terminated
            }
        }
    }

    /// SIGTERM, then SIGKILL if the server ignores it for `grace`
    async fn terminate(&mut self, grace: Duration) {
        tracing::debug!(pid = ?self.child.id(), "Server still running, terminating");

        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            // SAFETY: pid belongs to our unreaped child, so it cannot have been recycled
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            if tokio::time::timeout(grace, self.child.wait()).await.is_ok() {
                return;
            }
            tracing::warn!(pid, "Server ignored SIGTERM, killing it");
        }

        let _ = self.child.kill().await;
    }
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        // Best-effort since we can't await in drop; fails harmlessly once reaped
        let _ = self.child.start_kill();
    }
}

/// Launches real server and client executables
#[derive(Debug, Clone)]
pub struct ProcessPairLauncher {
    server: PathBuf,
    client: PathBuf,
    client_timeout: Option<Duration>,
    server_grace: Duration,
    settle: Duration,
}

impl ProcessPairLauncher {
    /// Resolve both executables and capture the timing settings
    pub fn from_config(config: &SweepConfig) -> Result<Self> {
        Ok(Self {
            server: resolve_executable(Role::Server, &config.server)?,
            client: resolve_executable(Role::Client, &config.client)?,
            client_timeout: config.client_timeout,
            server_grace: config.server_grace,
            settle: config.settle,
        })
    }

    pub fn server(&self) -> &Path {
        &self.server
    }

    pub fn client(&self) -> &Path {
        &self.client
    }

    /// Start the client and wait for it to finish
    async fn run_client(&self, args: &[String]) -> ClientOutcome {
        let mut child = match Command::new(&self.client)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let err = Error::spawn(Role::Client, &self.client, e);
                tracing::warn!("{}", err);
                return ClientOutcome::SpawnFailed(err.to_string());
            }
        };

        tracing::debug!(pid = ?child.id(), state = %CycleState::ClientStarted, "Client started");

        let waited = match self.client_timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    tracing::warn!(
                        "Client did not finish within {}s, killing it",
                        limit.as_secs()
                    );
                    let _ = child.kill().await;
                    return ClientOutcome::TimedOut;
                }
            },
            None => child.wait().await,
        };

        match waited {
            Ok(status) => ClientOutcome::from_status(status),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to wait for client");
                ClientOutcome::Failed { code: None }
            }
        }
    }
}

#[async_trait]
impl PairLauncher for ProcessPairLauncher {
    async fn run_cycle(
        &mut self,
        invocation: &RunInvocation,
        cycle: CycleId,
    ) -> Result<CycleOutcome> {
        tracing::debug!(
            row = cycle.row,
            repeat = cycle.repeat,
            state = %CycleState::Idle,
            "Starting cycle"
        );

        let server = ServerGuard::spawn(&self.server, invocation.args())?;
        tracing::debug!(pid = ?server.id(), state = %CycleState::ServerStarted, "Server started");

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let client = self.run_client(invocation.args()).await;
        tracing::debug!(outcome = ?client, state = %CycleState::ClientFinished, "Client finished");

        let server = server.finish(self.server_grace).await;
        Ok(CycleOutcome { client, server })
    }
}
