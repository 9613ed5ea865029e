// ABOUTME: Outcome accumulator for deploy and clean runs.
// ABOUTME: Collects every per-node failure and the non-fatal warnings shown to users.

use crate::deploy::{DeployError, DeployErrorKind};
use crate::types::NodeId;
use std::fmt;

/// Step of a strategy run a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolve,
    Connect,
    Prepare,
    Transfer,
    Inflate,
    Clean,
    /// Work done by an external strategy executable.
    Plugin,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Resolve => "resolve",
            Phase::Connect => "connect",
            Phase::Prepare => "prepare",
            Phase::Transfer => "transfer",
            Phase::Inflate => "inflate",
            Phase::Clean => "clean",
            Phase::Plugin => "plugin",
        };
        f.write_str(name)
    }
}

/// One failed task.
#[derive(Debug)]
pub struct Failure {
    pub phase: Phase,
    pub error: DeployError,
}

impl Failure {
    pub fn node(&self) -> Option<NodeId> {
        self.error.node()
    }

    pub fn kind(&self) -> DeployErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.phase, self.error)
    }
}

/// Result of running a strategy or a clean.
///
/// Success means no failure was recorded. Failures are kept in full, never
/// truncated to the first one.
#[derive(Debug)]
pub struct StrategyReport {
    strategy: String,
    failures: Vec<Failure>,
    warnings: Vec<Warning>,
}

impl StrategyReport {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A report that failed before any remote work.
    pub fn rejected(strategy: impl Into<String>, phase: Phase, error: DeployError) -> Self {
        let mut report = Self::new(strategy);
        report.fail(phase, error);
        report
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Record a failure, auto-logging it via tracing.
    pub fn fail(&mut self, phase: Phase, error: DeployError) {
        tracing::warn!("{} failed: {}", phase, error);
        self.failures.push(Failure { phase, error });
    }

    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Phase of the first recorded failure.
    pub fn failed_phase(&self) -> Option<Phase> {
        self.failures.first().map(|f| f.phase)
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create a session close warning.
    pub fn session_close(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::SessionClose,
            message: message.into(),
        }
    }

    /// Create a warning for a strategy attempt that will be retried.
    pub fn retry(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Retry,
            message: message.into(),
        }
    }

    /// Create a warning for a request that had nothing to do.
    pub fn nothing_to_do(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::NothingToDo,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Failed to cleanly close a node session.
    SessionClose,
    /// A failed attempt is about to be re-run.
    Retry,
    /// The request was empty, so nothing was done.
    NothingToDo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_starts_successful() {
        let report = StrategyReport::new("direct");
        assert!(report.success());
        assert!(!report.has_warnings());
        assert_eq!(report.failed_phase(), None);
    }

    #[test]
    fn report_keeps_every_failure() {
        let mut report = StrategyReport::new("direct");
        for node in 1..=3 {
            report.fail(
                Phase::Transfer,
                DeployError::RemoteCommand {
                    node: NodeId::new(node),
                    exit_code: 23,
                    stderr: "rsync error".to_string(),
                },
            );
        }

        assert!(!report.success());
        assert_eq!(report.failures().len(), 3);
        assert_eq!(report.failures()[2].node(), Some(NodeId::new(3)));
        assert_eq!(report.failed_phase(), Some(Phase::Transfer));
    }

    #[test]
    fn warnings_do_not_fail_report() {
        let mut report = StrategyReport::new("clean");
        report.warn(Warning::session_close("connection reset"));
        report.warn(Warning::nothing_to_do("no paths"));

        assert!(report.success());
        assert_eq!(report.warnings().len(), 2);
        assert_eq!(report.warnings()[0].kind, WarningKind::SessionClose);
    }

    #[test]
    fn failure_display_names_phase() {
        let report = StrategyReport::rejected("gateway", Phase::Resolve, DeployError::NoSources);
        assert_eq!(report.failures()[0].to_string(), "[resolve] no source paths given");
    }
}
