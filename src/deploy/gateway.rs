// ABOUTME: Gateway strategy for shared object storage mounted on every node.
// ABOUTME: Lays out files on the gateway before upload so each file fits in one object.

use super::admin::select_admin;
use super::engine::{Engine, PhaseFailed, PhaseResult, Sessions};
use super::error::DeployError;
use super::inflate::Inflation;
use super::options::DeployRequest;
use super::plan::TransferPlan;
use crate::diagnostics::{Phase, StrategyReport};
use crate::plugin::{BUILTIN_ORIGIN, PluginArgs, Strategy};
use crate::remote::{ConnectionProvider, RemoteScript, RemoteTask};
use crate::reservation::Node;
use crate::types::NodeId;
use async_trait::async_trait;
use clap::Parser;
use std::sync::Arc;

pub const GATEWAY: &str = "gateway";

/// Default object size in MiB.
pub const DEFAULT_STRIPE_MIB: u64 = 64;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Parser)]
#[command(name = GATEWAY, no_binary_name = true)]
struct GatewayArgs {
    /// Node that uploads into the shared storage (default: lowest public address)
    #[arg(long)]
    admin: Option<NodeId>,

    /// Object size in MiB; at least 4 and a multiple of 4
    #[arg(long, default_value_t = DEFAULT_STRIPE_MIB)]
    stripe: u64,
}

/// Object size in bytes for a stripe given in MiB.
pub fn object_size(stripe_mib: u64) -> Result<u64, DeployError> {
    if stripe_mib < 4 || stripe_mib % 4 != 0 {
        return Err(DeployError::InvalidStripe(stripe_mib));
    }
    stripe_mib
        .checked_mul(MIB)
        .ok_or(DeployError::InvalidStripe(stripe_mib))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Gateway;

#[async_trait]
impl Strategy for Gateway {
    fn name(&self) -> &str {
        GATEWAY
    }

    fn description(&self) -> &str {
        "Upload once through a gateway node into shared object storage, one object per file."
    }

    fn origin(&self) -> &str {
        BUILTIN_ORIGIN
    }

    async fn parse(&self, argv: &[String]) -> Result<PluginArgs, DeployError> {
        let parsed = GatewayArgs::try_parse_from(argv)
            .map_err(|e| DeployError::InvalidArgs(e.to_string()))?;
        object_size(parsed.stripe)?;

        let mut args = PluginArgs::default().option("stripe", parsed.stripe);
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
        let resolved = resolve(request, args);
        let (gateway, plan, object_size) = match resolved {
            Ok(resolved) => resolved,
            Err(e) => return StrategyReport::rejected(GATEWAY, Phase::Resolve, e),
        };

        let mut report = StrategyReport::new(GATEWAY);
        let engine = Engine::new(provider, options.max_workers);
        let Ok(sessions) = engine.connect(&[gateway], &mut report).await else {
            return report;
        };

        if run(&engine, &sessions, gateway, &plan, object_size, request, &mut report)
            .await
            .is_err()
        {
            tracing::debug!("gateway deploy stopped after a failed phase");
        }
        engine.close(sessions, &mut report).await;
        report
    }
}

/// Everything checked before a connection is opened.
fn resolve<'a>(
    request: &'a DeployRequest,
    args: &PluginArgs,
) -> Result<(&'a Node, TransferPlan, u64), DeployError> {
    let stripe = args.get::<u64>("stripe")?.unwrap_or(DEFAULT_STRIPE_MIB);
    let object_size = object_size(stripe)?;
    let admin = args.get::<NodeId>("admin")?.or(request.options.admin);
    let selection = select_admin(&request.reservation, admin)?;

    let plan = TransferPlan::resolve(&request.sources, &request.options.dest)?;
    plan.check_size(object_size)?;
    Ok((selection.admin, plan, object_size))
}

async fn run(
    engine: &Engine,
    sessions: &Sessions,
    gateway: &Node,
    plan: &TransferPlan,
    object_size: u64,
    request: &DeployRequest,
    report: &mut StrategyReport,
) -> PhaseResult {
    let options = &request.options;
    let connection = sessions.get(gateway.id).ok_or(PhaseFailed)?;
    let inflation = Inflation::from_options(options);

    tracing::info!(
        "gateway: laying out {} file(s) with {} byte objects on node {}",
        plan.entries().len(),
        object_size,
        gateway.id
    );
    engine
        .run_scripts(
            Phase::Prepare,
            engine.pool(1),
            vec![(
                Arc::clone(connection),
                layout_script(plan, inflation, object_size, request),
            )],
            report,
        )
        .await?;

    let jobs = plan
        .roots()
        .iter()
        .map(|root| (gateway.clone(), root.clone()))
        .collect();
    engine
        .push(engine.pool(plan.roots().len()), jobs, &options.dest, report)
        .await?;

    engine
        .inflate(
            std::slice::from_ref(connection),
            plan,
            inflation,
            options.sudo,
            report,
        )
        .await
}

/// Create every file and its copies empty, with the object-size layout set.
fn layout_script(
    plan: &TransferPlan,
    inflation: Inflation,
    object_size: u64,
    request: &DeployRequest,
) -> RemoteScript {
    let options = &request.options;
    RemoteScript::new()
        .sudo(options.sudo)
        .files(plan.remote_files())
        .task(RemoteTask::EnsureLayoutTool)
        .task(RemoteTask::MakeDir {
            path: options.dest.as_str().to_string(),
        })
        .task(RemoteTask::Touch {
            copies: inflation.copies(),
        })
        .task(RemoteTask::SetLayout {
            copies: inflation.copies(),
            object_size,
        })
}
