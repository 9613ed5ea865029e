// ABOUTME: Direct strategy: push the dataset from the control machine to every node.
// ABOUTME: Each node receives every source over its own connection, then inflates locally.

use super::engine::{Engine, PhaseResult, Sessions};
use super::error::DeployError;
use super::inflate::Inflation;
use super::options::{DeployOptions, DeployRequest};
use super::plan::TransferPlan;
use crate::diagnostics::{Phase, StrategyReport};
use crate::plugin::{BUILTIN_ORIGIN, PluginArgs, Strategy};
use crate::remote::ConnectionProvider;
use crate::reservation::Node;
use async_trait::async_trait;
use clap::Parser;
use std::sync::Arc;

pub const DIRECT: &str = "direct";

/// Takes no arguments of its own.
#[derive(Debug, Parser)]
#[command(name = DIRECT, no_binary_name = true)]
struct DirectArgs {}

#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

#[async_trait]
impl Strategy for Direct {
    fn name(&self) -> &str {
        DIRECT
    }

    fn description(&self) -> &str {
        "Push the dataset from this machine to every node in parallel."
    }

    fn origin(&self) -> &str {
        BUILTIN_ORIGIN
    }

    async fn parse(&self, argv: &[String]) -> Result<PluginArgs, DeployError> {
        DirectArgs::try_parse_from(argv).map_err(|e| DeployError::InvalidArgs(e.to_string()))?;
        Ok(PluginArgs::default())
    }

    async fn execute(
        &self,
        provider: Arc<dyn ConnectionProvider>,
        request: &DeployRequest,
        _args: &PluginArgs,
    ) -> StrategyReport {
        let options = &request.options;
        let plan = match resolve(request) {
            Ok(plan) => plan,
            Err(e) => return StrategyReport::rejected(DIRECT, Phase::Resolve, e),
        };

        let mut report = StrategyReport::new(DIRECT);
        let engine = Engine::new(provider, options.max_workers);
        let nodes: Vec<&Node> = request.reservation.nodes().collect();
        let Ok(sessions) = engine.connect(&nodes, &mut report).await else {
            return report;
        };

        if run(&engine, &sessions, &plan, options, &mut report).await.is_err() {
            tracing::debug!("direct deploy stopped after a failed phase");
        }
        engine.close(sessions, &mut report).await;
        report
    }
}

/// The destination is emptied before the upload, so the filesystem root is refused.
fn resolve(request: &DeployRequest) -> Result<TransferPlan, DeployError> {
    if request.options.dest.as_str() == "/" {
        return Err(DeployError::config_error(
            "refusing to clear the filesystem root as destination",
        ));
    }
    TransferPlan::resolve(&request.sources, &request.options.dest)
}

async fn run(
    engine: &Engine,
    sessions: &Sessions,
    plan: &TransferPlan,
    options: &DeployOptions,
    report: &mut StrategyReport,
) -> PhaseResult {
    engine
        .make_dest(sessions.all(), &options.dest, options.sudo, report)
        .await?;
    engine
        .clear_dest(sessions.all(), &options.dest, options.sudo, report)
        .await?;

    let jobs = sessions
        .all()
        .iter()
        .flat_map(|connection| {
            plan.roots()
                .iter()
                .map(|root| (connection.node().clone(), root.clone()))
        })
        .collect();
    engine
        .push(engine.pool(sessions.len()), jobs, &options.dest, report)
        .await?;

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
