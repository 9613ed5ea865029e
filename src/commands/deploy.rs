// ABOUTME: Deploy command implementation.
// ABOUTME: Builds the request from flags and config, runs the strategy and reports the outcome.

use super::Context;
use crate::cli::DeployArgs;
use data_deploy::deploy::{DeployError, DeployOptions, DeployRequest, Orchestrator};
use data_deploy::error::{Error, Result};
use data_deploy::output::Output;
use data_deploy::types::RemotePath;

/// Deploy local paths to every node of the reservation.
pub async fn deploy(args: DeployArgs, ctx: &Context, mut output: Output) -> Result<()> {
    output.start_timer();

    let dest = args.dest.as_deref().unwrap_or(&ctx.config.dest);
    let dest = RemotePath::new(dest).map_err(DeployError::from)?;
    let reservation = ctx.reservation(args.reservation.as_deref())?;

    let options = DeployOptions::new(dest)
        .copies(args.copy_multiplier)
        .links(args.link_multiplier)
        .sudo(args.sudo)
        .silent(args.silent)
        .admin(args.admin)
        .retries(args.retries.unwrap_or(ctx.config.retries))
        .max_workers(ctx.config.max_workers);

    output.progress(&format!(
        "Deploying {} path(s) to {} node(s) at {} with '{}'",
        args.paths.len(),
        reservation.len(),
        options.dest,
        args.plugin
    ));
    if options.inflates() {
        output.progress(&format!(
            "  → Inflating x{} copies, x{} links",
            options.copy_multiplier, options.link_multiplier
        ));
    }

    let request =
        DeployRequest::new(reservation, args.paths, options).key_path(ctx.key_path.clone());
    let registry = ctx.registry();
    let report = Orchestrator::new(&registry, ctx.provider())
        .deploy(&args.plugin, &args.plugin_args, &request)
        .await;

    output.report(&report);
    if !report.success() {
        return Err(Error::Failed {
            strategy: report.strategy().to_string(),
            failures: report.into_failures(),
        });
    }

    output.success("Deployment complete!");
    Ok(())
}
