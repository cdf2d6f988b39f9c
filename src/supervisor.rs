//! Subprocess supervision for an autostarted `lightrag-server`.
//!
//! The gateway owns at most one child process at a time. Spawning goes
//! through the [`Spawner`] trait so lifecycle tests can count spawn
//! calls without launching real processes; the production
//! [`TokioSpawner`] uses `kill_on_drop` so the child is reaped even if
//! gateway startup fails partway.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Grace period between SIGTERM and SIGKILL on shutdown.
const TERMINATE_GRACE: Duration = Duration::from_secs(3);

/// Description of the external service process to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCommand {
    /// Program name or path.
    pub program: String,
    /// Command-line arguments.
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
}

impl ServiceCommand {
    /// Builds the `lightrag-server` launch command from gateway
    /// configuration. Model-binding variables are forwarded through the
    /// environment, never interpreted locally.
    #[must_use]
    pub fn lightrag_server(config: &GatewayConfig) -> Self {
        let mut args = vec![
            "--host".to_string(),
            config.api_host.clone(),
            "--port".to_string(),
            config.api_port.to_string(),
        ];
        if let Some(key) = &config.api_key {
            args.push("--key".to_string());
            args.push(key.clone());
        }
        Self {
            program: "lightrag-server".to_string(),
            args,
            env: config.forwarded_env(),
        }
    }
}

/// Handle to a spawned service process.
#[async_trait]
pub trait ServiceProcess: Send {
    /// OS process id, when still available.
    fn pid(&self) -> Option<u32>;

    /// Whether the process is still running.
    fn is_running(&mut self) -> bool;

    /// Terminates the process: graceful signal first, then a hard kill
    /// after the grace period.
    async fn terminate(&mut self, grace: Duration) -> std::io::Result<()>;
}

/// Spawns service processes. Implemented by [`TokioSpawner`] in
/// production and by recording mocks in tests.
pub trait Spawner: Send + Sync {
    /// Spawns the described process.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the program cannot be
    /// started (missing binary, permissions).
    fn spawn(&self, command: &ServiceCommand) -> std::io::Result<Box<dyn ServiceProcess>>;
}

/// Production spawner backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, command: &ServiceCommand) -> std::io::Result<Box<dyn ServiceProcess>> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            // Stdout must stay clear for the MCP stdio transport, so the
            // child's output is piped into our logs instead.
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "lightrag_server", "{line}");
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(target: "lightrag_server", "{line}");
                }
            });
        }

        Ok(Box::new(TokioProcess { child }))
    }
}

/// A child process spawned by [`TokioSpawner`].
struct TokioProcess {
    child: tokio::process::Child,
}

#[async_trait]
impl ServiceProcess for TokioProcess {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn terminate(&mut self, grace: Duration) -> std::io::Result<()> {
        #[cfg(unix)]
        if let Some(pid) = self.child.id().and_then(|p| i32::try_from(p).ok()) {
            // SIGTERM first so the server can flush its storage backends.
            #[allow(unsafe_code)]
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
            match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(result) => return result.map(|_| ()),
                Err(_) => warn!("lightrag-server did not exit within grace period, killing"),
            }
        }
        #[cfg(not(unix))]
        let _ = grace;

        self.child.kill().await
    }
}

/// Single-owner lifecycle for the optional `lightrag-server` subprocess.
///
/// Invariant: at most one child is active at a time. Start and stop are
/// called once each from the gateway's startup/shutdown routine, never
/// concurrently with in-flight calls.
pub struct Supervisor {
    spawner: Box<dyn Spawner>,
    child: Option<Box<dyn ServiceProcess>>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    /// Creates a supervisor using the production spawner.
    #[must_use]
    pub fn new() -> Self {
        Self::with_spawner(Box::new(TokioSpawner))
    }

    /// Creates a supervisor with an injected spawner.
    #[must_use]
    pub fn with_spawner(spawner: Box<dyn Spawner>) -> Self {
        Self {
            spawner,
            child: None,
        }
    }

    /// Spawns `lightrag-server` with host/port/key arguments from the
    /// configuration. A no-op with a warning if a child is already
    /// running.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Spawn`] when the process cannot be
    /// started. This is fatal to gateway startup.
    pub fn start(&mut self, config: &GatewayConfig) -> Result<(), GatewayError> {
        if let Some(child) = &mut self.child
            && child.is_running()
        {
            warn!(pid = ?child.pid(), "lightrag-server already running, not spawning again");
            return Ok(());
        }

        let command = ServiceCommand::lightrag_server(config);
        info!(program = %command.program, args = ?command.args, "starting lightrag-server");
        let child = self.spawner.spawn(&command).map_err(GatewayError::Spawn)?;
        info!(pid = ?child.pid(), "lightrag-server started");
        self.child = Some(child);
        Ok(())
    }

    /// Terminates the supervised child, if any: SIGTERM, a grace wait,
    /// then SIGKILL. No action when nothing was spawned.
    pub async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let pid = child.pid();
            info!(?pid, "stopping lightrag-server");
            if let Err(e) = child.terminate(TERMINATE_GRACE).await {
                warn!(?pid, error = %e, "failed to terminate lightrag-server");
            }
        }
    }

    /// Whether a supervised child is currently running.
    pub fn is_running(&mut self) -> bool {
        self.child.as_mut().is_some_and(|c| c.is_running())
    }

    /// PID of the supervised child, when running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.pid())
    }
}

/// Recording spawner doubles shared between supervisor and gateway
/// lifecycle tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::{ServiceCommand, ServiceProcess, Spawner};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    pub(crate) struct MockState {
        pub(crate) commands: Mutex<Vec<ServiceCommand>>,
        pub(crate) terminated: AtomicBool,
    }

    impl MockState {
        pub(crate) fn spawn_count(&self) -> usize {
            self.commands.lock().unwrap().len()
        }

        pub(crate) fn was_terminated(&self) -> bool {
            self.terminated.load(Ordering::SeqCst)
        }
    }

    pub(crate) struct MockSpawner {
        pub(crate) state: Arc<MockState>,
    }

    pub(crate) struct MockProcess {
        state: Arc<MockState>,
        running: bool,
    }

    impl Spawner for MockSpawner {
        fn spawn(&self, command: &ServiceCommand) -> std::io::Result<Box<dyn ServiceProcess>> {
            self.state.commands.lock().unwrap().push(command.clone());
            Ok(Box::new(MockProcess {
                state: Arc::clone(&self.state),
                running: true,
            }))
        }
    }

    #[async_trait]
    impl ServiceProcess for MockProcess {
        fn pid(&self) -> Option<u32> {
            Some(4242)
        }

        fn is_running(&mut self) -> bool {
            self.running
        }

        async fn terminate(&mut self, _grace: Duration) -> std::io::Result<()> {
            self.running = false;
            self.state.terminated.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    pub(crate) struct FailingSpawner;

    impl Spawner for FailingSpawner {
        fn spawn(&self, _command: &ServiceCommand) -> std::io::Result<Box<dyn ServiceProcess>> {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "lightrag-server not on PATH",
            ))
        }
    }
}
