// ABOUTME: Relay strategy: push once to an admin node, which fans the data out to the others.
// ABOUTME: Keeps control-machine upload to a single copy of the dataset.

use super::admin::{AdminSelection, select_admin};
use super::engine::{Engine, PhaseFailed, PhaseResult, Sessions};
use super::error::DeployError;
use super::inflate::Inflation;
use super::options::DeployRequest;
use super::plan::TransferPlan;
use crate::diagnostics::{Phase, StrategyReport};
use crate::plugin::{BUILTIN_ORIGIN, PluginArgs, Strategy};
use crate::remote::{ConnectionProvider, ForwardTarget, RemoteScript, RemoteTask};
use crate::reservation::Node;
use crate::types::NodeId;
use async_trait::async_trait;
use clap::Parser;
use std::sync::Arc;

pub const RELAY: &str = "relay";

#[derive(Debug, Parser)]
#[command(name = RELAY, no_binary_name = true)]
struct RelayArgs {
    /// Node that receives the data first (default: lowest public address)
    #[arg(long)]
    admin: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Relay;

#[async_trait]
impl Strategy for Relay {
    fn name(&self) -> &str {
        RELAY
    }

    fn description(&self) -> &str {
        "Push the dataset to one admin node, which forwards it to all other nodes."
    }

    fn origin(&self) -> &str {
        BUILTIN_ORIGIN
    }

    async fn parse(&self, argv: &[String]) -> Result<PluginArgs, DeployError> {
        let parsed =
            RelayArgs::try_parse_from(argv).map_err(|e| DeployError::InvalidArgs(e.to_string()))?;
        let mut args = PluginArgs::default();
        if let Some(admin) = parsed.admin {
            args = args.option("admin", admin);
        }
        Ok(args)
    }

    async fn execute(
        &self,
        provider: Arc<dyn ConnectionProvider>,
        request: &DeployRequest,
        args: &PluginArgs,
    ) -> StrategyReport {
        let options = &request.options;
        let resolved = args.get::<NodeId>("admin").and_then(|admin| {
            let selection = select_admin(&request.reservation, admin.or(options.admin))?;
            let plan = TransferPlan::resolve(&request.sources, &options.dest)?;
            Ok((selection, plan))
        });
        let (selection, plan) = match resolved {
            Ok(resolved) => resolved,
            Err(e) => return StrategyReport::rejected(RELAY, Phase::Resolve, e),
        };

        let mut report = StrategyReport::new(RELAY);
        let engine = Engine::new(provider, options.max_workers);
        let nodes: Vec<&Node> = request.reservation.nodes().collect();
        let Ok(sessions) = engine.connect(&nodes, &mut report).await else {
            return report;
        };

        if run(&engine, &sessions, &selection, &plan, request, &mut report)
            .await
            .is_err()
        {
            tracing::debug!("relay deploy stopped after a failed phase");
        }
        engine.close(sessions, &mut report).await;
        report
    }
}

async fn run(
    engine: &Engine,
    sessions: &Sessions,
    selection: &AdminSelection<'_>,
    plan: &TransferPlan,
    request: &DeployRequest,
    report: &mut StrategyReport,
) -> PhaseResult {
    let options = &request.options;
    let admin = sessions.get(selection.admin.id).ok_or(PhaseFailed)?;

    engine
        .make_dest(sessions.all(), &options.dest, options.sudo, report)
        .await?;

    tracing::info!("relay: uploading to admin node {}", selection.admin.id);
    let jobs = plan
        .roots()
        .iter()
        .map(|root| (selection.admin.clone(), root.clone()))
        .collect();
    engine
        .push(engine.pool(plan.roots().len()), jobs, &options.dest, report)
        .await?;

    if !selection.others.is_empty() {
        tracing::info!(
            "relay: forwarding from node {} to {} node(s)",
            selection.admin.id,
            selection.others.len()
        );
        let forward = RemoteScript::from(RemoteTask::Push {
            sources: remote_roots(plan, request),
            targets: selection
                .others
                .iter()
                .map(|node| ForwardTarget {
                    host: node.hostname.clone(),
                    port: node.port,
                    user: node.user().map(str::to_string),
                })
                .collect(),
            dest: options.dest.as_str().to_string(),
        });
        engine
            .run_scripts(
                Phase::Transfer,
                engine.pool(1),
                vec![(Arc::clone(admin), forward)],
                report,
            )
            .await?;
    }

    engine
        .inflate(
            sessions.all(),
            plan,
            Inflation::from_options(options),
            options.sudo,
            report,
        )
        .await
}

/// Where each pushed source ended up on the admin node.
fn remote_roots(plan: &TransferPlan, request: &DeployRequest) -> Vec<String> {
    plan.roots()
        .iter()
        .filter_map(|root| root.file_name())
        .map(|name| request.options.dest.join(&name.to_string_lossy()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_admin_id() {
        let args = Relay
            .parse(&["--admin".to_string(), "4".to_string()])
            .await
            .unwrap();
        assert_eq!(args.get::<NodeId>("admin").unwrap(), Some(NodeId::new(4)));
    }

    #[tokio::test]
    async fn rejects_non_numeric_admin() {
        assert!(matches!(
            Relay
                .parse(&["--admin".to_string(), "head".to_string()])
                .await,
            Err(DeployError::InvalidArgs(_))
        ));
    }
}
