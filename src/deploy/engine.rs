// ABOUTME: Phase machinery shared by every transfer strategy.
// ABOUTME: Opens and closes node sessions, pushes sources and runs remote scripts in fan-outs.

use super::error::DeployError;
use super::inflate::Inflation;
use super::plan::TransferPlan;
use crate::diagnostics::{Phase, StrategyReport, Warning};
use crate::fanout::{FanOut, FanOutReport};
use crate::remote::{
    CommandOutput, Connection, ConnectionProvider, RemoteScript, RemoteTask, run_script,
};
use crate::reservation::Node;
use crate::types::{NodeId, RemotePath};
use std::path::PathBuf;
use std::sync::Arc;

/// A phase recorded failures; later phases must not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseFailed;

pub type PhaseResult = Result<(), PhaseFailed>;

/// Open sessions, one per node, in connection order.
pub struct Sessions {
    connections: Vec<Arc<dyn Connection>>,
}

impl Sessions {
    pub fn all(&self) -> &[Arc<dyn Connection>] {
        &self.connections
    }

    pub fn get(&self, id: NodeId) -> Option<&Arc<dyn Connection>> {
        self.connections.iter().find(|c| c.node().id == id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// Runs the phases of a strategy against a connection provider.
#[derive(Clone)]
pub struct Engine {
    provider: Arc<dyn ConnectionProvider>,
    max_workers: Option<usize>,
}

impl Engine {
    pub fn new(provider: Arc<dyn ConnectionProvider>, max_workers: Option<usize>) -> Self {
        Self {
            provider,
            max_workers,
        }
    }

    /// Worker pool sized to `unit`, capped by the configured maximum.
    pub fn pool(&self, unit: usize) -> FanOut {
        FanOut::new(unit).capped(self.max_workers)
    }

    /// Open a session to every node.
    ///
    /// If any node is unreachable the sessions that did open are closed again
    /// and every connectivity failure is recorded.
    pub async fn connect(
        &self,
        nodes: &[&Node],
        report: &mut StrategyReport,
    ) -> Result<Sessions, PhaseFailed> {
        tracing::info!("connecting to {} node(s)", nodes.len());

        let tasks = nodes.iter().map(|node| {
            let provider = Arc::clone(&self.provider);
            let node = (*node).clone();
            async move {
                provider
                    .open(&node)
                    .await
                    .map_err(|e| DeployError::connectivity(node.id, e))
            }
        });
        let (opened, errors) = self.pool(nodes.len()).run(tasks).await.partition();

        let sessions = Sessions {
            connections: opened,
        };
        if errors.is_empty() {
            return Ok(sessions);
        }

        for error in errors {
            report.fail(Phase::Connect, error);
        }
        self.close(sessions, report).await;
        Err(PhaseFailed)
    }

    /// Close every session. Close failures are warnings, not failures.
    pub async fn close(&self, sessions: Sessions, report: &mut StrategyReport) {
        let count = sessions.len();
        let tasks = sessions.connections.into_iter().map(|connection| async move {
            connection
                .close()
                .await
                .map_err(|e| DeployError::transport(connection.node().id, e))
        });

        for error in self.pool(count).run(tasks).await.failures() {
            report.warn(Warning::session_close(format!("session close failed: {}", error)));
        }
    }

    /// Run one script per connection.
    pub async fn run_scripts(
        &self,
        phase: Phase,
        pool: FanOut,
        jobs: Vec<(Arc<dyn Connection>, RemoteScript)>,
        report: &mut StrategyReport,
    ) -> PhaseResult {
        tracing::info!("{}: running {} remote task(s)", phase, jobs.len());

        let tasks = jobs.into_iter().map(|(connection, script)| async move {
            let node = connection.node().id;
            let output = run_script(connection.as_ref(), &script)
                .await
                .map_err(|e| DeployError::transport(node, e))?;
            check_exit(node, output)
        });

        record(phase, pool.run(tasks).await, report)
    }

    /// Run the same script on each of `connections`, one task per node.
    pub async fn run_on_each(
        &self,
        phase: Phase,
        connections: &[Arc<dyn Connection>],
        script: &RemoteScript,
        report: &mut StrategyReport,
    ) -> PhaseResult {
        let jobs = connections
            .iter()
            .map(|c| (Arc::clone(c), script.clone()))
            .collect::<Vec<_>>();
        self.run_scripts(phase, self.pool(connections.len()), jobs, report)
            .await
    }

    /// Push each local source to its node from the control machine.
    pub async fn push(
        &self,
        pool: FanOut,
        jobs: Vec<(Node, PathBuf)>,
        dest: &RemotePath,
        report: &mut StrategyReport,
    ) -> PhaseResult {
        tracing::info!("transfer: {} push(es) into {}", jobs.len(), dest);

        let tasks = jobs.into_iter().map(|(node, source)| {
            let provider = Arc::clone(&self.provider);
            let dest = dest.clone();
            async move {
                let output = provider
                    .push(&node, &source, &dest)
                    .await
                    .map_err(|e| DeployError::transport(node.id, e))?;
                check_exit(node.id, output)
            }
        });

        record(Phase::Transfer, pool.run(tasks).await, report)
    }

    /// Create the destination directory on each node.
    pub async fn make_dest(
        &self,
        connections: &[Arc<dyn Connection>],
        dest: &RemotePath,
        sudo: bool,
        report: &mut StrategyReport,
    ) -> PhaseResult {
        let script = RemoteScript::from(RemoteTask::MakeDir {
            path: dest.as_str().to_string(),
        })
        .sudo(sudo);
        self.run_on_each(Phase::Prepare, connections, &script, report)
            .await
    }

    /// Remove whatever an earlier deployment left inside the destination.
    pub async fn clear_dest(
        &self,
        connections: &[Arc<dyn Connection>],
        dest: &RemotePath,
        sudo: bool,
        report: &mut StrategyReport,
    ) -> PhaseResult {
        let script = RemoteScript::from(RemoteTask::ClearDir {
            path: dest.as_str().to_string(),
        })
        .sudo(sudo);
        self.run_on_each(Phase::Prepare, connections, &script, report)
            .await
    }

    /// Inflate every file of the plan on each node with one invocation per node.
    pub async fn inflate(
        &self,
        connections: &[Arc<dyn Connection>],
        plan: &TransferPlan,
        inflation: Inflation,
        sudo: bool,
        report: &mut StrategyReport,
    ) -> PhaseResult {
        if inflation.is_noop() {
            return Ok(());
        }
        let script = inflation.script(plan.remote_files(), sudo);
        self.run_on_each(Phase::Inflate, connections, &script, report)
            .await
    }
}

fn check_exit(node: NodeId, output: CommandOutput) -> Result<CommandOutput, DeployError> {
    if output.success() {
        Ok(output)
    } else {
        Err(DeployError::RemoteCommand {
            node,
            exit_code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        })
    }
}

fn record<T>(
    phase: Phase,
    results: FanOutReport<T, DeployError>,
    report: &mut StrategyReport,
) -> PhaseResult {
    if results.all_succeeded() {
        return Ok(());
    }
    let (_, errors) = results.partition();
    for error in errors {
        report.fail(phase, error);
    }
    Err(PhaseFailed)
}
