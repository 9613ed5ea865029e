// ABOUTME: Static table of the strategies compiled into this binary.
// ABOUTME: Maps each built-in plugin name to its constructor.

use super::Strategy;
use std::sync::Arc;

pub use crate::deploy::{Direct, Gateway, Relay};
use crate::deploy::{DIRECT, GATEWAY, RELAY};

fn direct() -> Arc<dyn Strategy> {
    Arc::new(Direct)
}

fn relay() -> Arc<dyn Strategy> {
    Arc::new(Relay)
}

fn gateway() -> Arc<dyn Strategy> {
    Arc::new(Gateway)
}

/// Built-in strategies in registration order.
pub static BUILTINS: &[(&str, fn() -> Arc<dyn Strategy>)] =
    &[(DIRECT, direct), (RELAY, relay), (GATEWAY, gateway)];
