// ABOUTME: Removal of deployed data from every node of a reservation.
// ABOUTME: Paths are sanitized before connecting; removing absent paths succeeds.

use super::engine::{Engine, PhaseResult, Sessions};
use super::error::DeployError;
use crate::diagnostics::{Phase, StrategyReport, Warning};
use crate::remote::{ConnectionProvider, RemoteScript, RemoteTask};
use crate::reservation::{Node, Reservation};
use crate::types::RemotePath;
use std::sync::Arc;

/// Report name of clean runs.
pub const CLEAN: &str = "clean";

#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    pub sudo: bool,
    pub silent: bool,
    pub max_workers: Option<usize>,
}

/// Validate a path for removal.
///
/// Besides the rules every remote path follows, the filesystem root is refused.
pub fn sanitize_clean_path(path: &str) -> Result<RemotePath, DeployError> {
    let sanitized = RemotePath::new(path)?;
    if sanitized.as_str() == "/" {
        return Err(DeployError::config_error(
            "refusing to remove the filesystem root",
        ));
    }
    Ok(sanitized)
}

/// Remove `paths` on every node, one task per (node, path).
pub async fn clean(
    provider: Arc<dyn ConnectionProvider>,
    reservation: &Reservation,
    paths: &[String],
    options: &CleanOptions,
) -> StrategyReport {
    let mut report = StrategyReport::new(CLEAN);
    if paths.is_empty() {
        report.warn(Warning::nothing_to_do("no paths given to clean"));
        return report;
    }

    let sanitized = match paths
        .iter()
        .map(|p| sanitize_clean_path(p))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(sanitized) => sanitized,
        Err(e) => return StrategyReport::rejected(CLEAN, Phase::Resolve, e),
    };

    let engine = Engine::new(provider, options.max_workers);
    let nodes: Vec<&Node> = reservation.nodes().collect();
    let Ok(sessions) = engine.connect(&nodes, &mut report).await else {
        return report;
    };

    if remove(&engine, &sessions, &sanitized, options, &mut report)
        .await
        .is_err()
    {
        tracing::debug!("clean finished with failures");
    }
    engine.close(sessions, &mut report).await;
    report
}

async fn remove(
    engine: &Engine,
    sessions: &Sessions,
    paths: &[RemotePath],
    options: &CleanOptions,
    report: &mut StrategyReport,
) -> PhaseResult {
    let jobs = sessions
        .all()
        .iter()
        .flat_map(|connection| {
            paths.iter().map(move |path| {
                let script = RemoteScript::from(RemoteTask::Remove {
                    path: path.as_str().to_string(),
                })
                .sudo(options.sudo);
                (Arc::clone(connection), script)
            })
        })
        .collect();

    engine
        .run_scripts(Phase::Clean, engine.pool(sessions.len()), jobs, report)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RemotePathError;

    #[test]
    fn home_directory_is_refused() {
        assert!(matches!(
            sanitize_clean_path("~"),
            Err(DeployError::InvalidPath(RemotePathError::HomeDirectory))
        ));
        assert!(matches!(
            sanitize_clean_path("~/"),
            Err(DeployError::InvalidPath(RemotePathError::HomeDirectory))
        ));
    }

    #[test]
    fn root_is_refused() {
        assert!(matches!(
            sanitize_clean_path("/"),
            Err(DeployError::Config(_))
        ));
        assert!(matches!(
            sanitize_clean_path("/a/.."),
            Err(DeployError::Config(_))
        ));
    }

    #[test]
    fn home_prefix_is_stripped() {
        assert_eq!(sanitize_clean_path("~/data/*").unwrap().as_str(), "data/*");
        assert_eq!(sanitize_clean_path("/abs/data").unwrap().as_str(), "/abs/data");
    }
}
