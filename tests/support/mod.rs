// ABOUTME: Test support utilities.
// ABOUTME: Provides in-process clusters standing in for reserved nodes.

use data_deploy::reservation::{Node, Reservation};
use std::path::Path;
use std::sync::Once;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod local_cluster;
#[allow(dead_code)]
pub mod scripted_cluster;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("data_deploy=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// `count` nodes with ids 1.., public addresses 10.0.0.<id> and hostnames node<id>.
#[allow(dead_code)]
pub fn nodes(count: u32) -> Vec<Node> {
    (1..=count)
        .map(|id| Node::new(id, format!("10.0.0.{id}"), format!("node{id}")))
        .collect()
}

#[allow(dead_code)]
pub fn reservation(count: u32) -> Reservation {
    Reservation::new(nodes(count)).unwrap()
}

/// Write `contents` to `dir/name`, creating parent directories.
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}
