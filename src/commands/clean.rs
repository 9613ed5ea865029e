// ABOUTME: Clean command implementation.
// ABOUTME: Removes deployed paths from every node of the reservation.

use super::Context;
use crate::cli::CleanArgs;
use data_deploy::deploy::{CleanOptions, Orchestrator};
use data_deploy::error::{Error, Result};
use data_deploy::output::Output;

pub async fn clean(args: CleanArgs, ctx: &Context, mut output: Output) -> Result<()> {
    output.start_timer();

    let reservation = ctx.reservation(args.reservation.as_deref())?;
    let options = CleanOptions {
        sudo: args.sudo,
        silent: args.silent,
        max_workers: ctx.config.max_workers,
    };

    // An explicit `--paths` with no values stays empty.
    let paths = args
        .paths
        .unwrap_or_else(|| vec![ctx.config.dest.clone()]);

    output.progress(&format!(
        "Removing {} from {} node(s)",
        paths.join(", "),
        reservation.len()
    ));

    let registry = ctx.registry();
    let report = Orchestrator::new(&registry, ctx.provider())
        .clean(&reservation, &paths, &options)
        .await;

    output.report(&report);
    if !report.success() {
        return Err(Error::Failed {
            strategy: report.strategy().to_string(),
            failures: report.into_failures(),
        });
    }

    output.success("Clean complete!");
    Ok(())
}
