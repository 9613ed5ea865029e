// ABOUTME: Entry points for deploy and clean that sit between the CLI and the strategies.
// ABOUTME: Validates requests, resolves plugins and re-runs failed attempts.

use super::clean::{CleanOptions, clean};
use super::error::DeployError;
use super::options::DeployRequest;
use crate::diagnostics::{Phase, StrategyReport, Warning};
use crate::plugin::{Registry, RegistryError};
use crate::remote::ConnectionProvider;
use crate::reservation::Reservation;
use std::sync::Arc;

/// Drives deploy and clean runs with one registry and one connection provider.
pub struct Orchestrator<'a> {
    registry: &'a Registry,
    provider: Arc<dyn ConnectionProvider>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(registry: &'a Registry, provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { registry, provider }
    }

    /// Deploy with the named strategy.
    ///
    /// Everything that can be checked locally is checked before the first
    /// connection. A failed attempt is re-run up to `options.retries` times.
    pub async fn deploy(
        &self,
        plugin: &str,
        plugin_args: &[String],
        request: &DeployRequest,
    ) -> StrategyReport {
        if request.sources.is_empty() {
            return StrategyReport::rejected(plugin, Phase::Resolve, DeployError::NoSources);
        }
        if let Some(admin) = request.options.admin
            && !request.reservation.contains(admin)
        {
            return StrategyReport::rejected(plugin, Phase::Resolve, DeployError::UnknownAdmin(admin));
        }

        let strategy = match self.registry.strategy(plugin).await {
            Ok(strategy) => strategy,
            Err(RegistryError::NotFound(name)) => {
                return StrategyReport::rejected(
                    plugin,
                    Phase::Resolve,
                    DeployError::UnknownPlugin(name),
                );
            }
            Err(e) => {
                return StrategyReport::rejected(
                    plugin,
                    Phase::Resolve,
                    DeployError::config_error(e.to_string()),
                );
            }
        };
        let args = match strategy.parse(plugin_args).await {
            Ok(args) => args,
            Err(e) => return StrategyReport::rejected(plugin, Phase::Resolve, e),
        };

        let attempts = request.options.retries.saturating_add(1);
        let mut warnings = Vec::new();
        let mut attempt = 1;
        loop {
            tracing::info!(
                "deploying with '{}' to {} node(s), attempt {}/{}",
                plugin,
                request.reservation.len(),
                attempt,
                attempts
            );
            let mut report = strategy
                .execute(Arc::clone(&self.provider), request, &args)
                .await;

            if report.success() || attempt >= attempts || rejected_locally(&report) {
                for warning in warnings {
                    report.warn(warning);
                }
                return report;
            }

            warnings.push(Warning::retry(format!(
                "attempt {}/{} with '{}' failed in {} phase, retrying",
                attempt,
                attempts,
                plugin,
                report
                    .failed_phase()
                    .map(|p| p.to_string())
                    .unwrap_or_default()
            )));
            attempt += 1;
        }
    }

    /// Remove `paths` from every node of the reservation.
    pub async fn clean(
        &self,
        reservation: &Reservation,
        paths: &[String],
        options: &CleanOptions,
    ) -> StrategyReport {
        tracing::info!("cleaning {} path(s) on {} node(s)", paths.len(), reservation.len());
        clean(Arc::clone(&self.provider), reservation, paths, options).await
    }
}

/// Failures found before remote work will not go away on a retry.
fn rejected_locally(report: &StrategyReport) -> bool {
    report.failed_phase() == Some(Phase::Resolve)
}
