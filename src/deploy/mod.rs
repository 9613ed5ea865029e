// ABOUTME: Dataset deployment: transfer plans, strategies, inflation and clean-up.
// ABOUTME: Strategies run as phases over a fan-out of per-node sessions.

mod admin;
mod clean;
mod direct;
mod engine;
mod error;
mod gateway;
mod inflate;
mod options;
mod orchestrator;
mod plan;
mod relay;

pub use admin::{AdminSelection, select_admin};
pub use clean::{CLEAN, CleanOptions, clean, sanitize_clean_path};
pub use direct::{DIRECT, Direct};
pub use engine::{Engine, PhaseFailed, PhaseResult, Sessions};
pub use error::{DeployError, DeployErrorKind, SizeViolation, SizeViolations};
pub use gateway::{DEFAULT_STRIPE_MIB, GATEWAY, Gateway, object_size};
pub use inflate::Inflation;
pub use options::{DeployOptions, DeployRequest};
pub use orchestrator::Orchestrator;
pub use plan::{PlanEntry, TransferPlan};
pub use relay::{RELAY, Relay};
