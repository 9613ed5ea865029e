// ABOUTME: Tests of removing deployed data from every node.
// ABOUTME: Clean is idempotent and refuses unsafe paths before connecting.

mod support;

use data_deploy::deploy::{CleanOptions, DeployErrorKind, Orchestrator};
use data_deploy::diagnostics::WarningKind;
use data_deploy::plugin::Registry;
use std::sync::Arc;
use support::local_cluster::LocalCluster;
use support::scripted_cluster::ScriptedCluster;
use support::write_file;

#[tokio::test]
async fn removes_paths_and_is_idempotent() {
    let cluster = LocalCluster::new(2);
    for id in 1..=2 {
        write_file(&cluster.node_dir(id), "data/f", "x");
        write_file(&cluster.node_dir(id), "keep/g", "y");
    }

    let registry = Registry::with_builtins();
    let orchestrator = Orchestrator::new(&registry, cluster.clone());
    let paths = vec!["~/data".to_string()];

    for _ in 0..2 {
        let report = orchestrator
            .clean(&cluster.reservation(), &paths, &CleanOptions::default())
            .await;
        assert!(report.success(), "failures: {:?}", report.failures());
    }
    for id in 1..=2 {
        assert!(!cluster.exists(id, "data"));
        assert!(cluster.exists(id, "keep/g"));
    }
}

#[tokio::test]
async fn glob_patterns_expand_remotely() {
    let cluster = LocalCluster::new(1);
    write_file(&cluster.node_dir(1), "data/a.copy.0", "x");
    write_file(&cluster.node_dir(1), "data/a", "x");

    let registry = Registry::with_builtins();
    let report = Orchestrator::new(&registry, cluster.clone())
        .clean(
            &cluster.reservation(),
            &["data/*.copy.*".to_string()],
            &CleanOptions::default(),
        )
        .await;

    assert!(report.success());
    assert_eq!(cluster.list(1, "data"), vec!["a"]);
}

#[tokio::test]
async fn empty_path_list_warns_without_connecting() {
    let cluster = Arc::new(ScriptedCluster::with_nodes(2));
    let registry = Registry::with_builtins();
    let report = Orchestrator::new(&registry, cluster.clone())
        .clean(&cluster.reservation(), &[], &CleanOptions::default())
        .await;

    assert!(report.success());
    assert_eq!(report.warnings()[0].kind, WarningKind::NothingToDo);
    assert!(cluster.events().is_empty());
}

#[tokio::test]
async fn unsafe_paths_rejected_before_connecting() {
    let cluster = Arc::new(ScriptedCluster::with_nodes(2));
    let registry = Registry::with_builtins();
    let orchestrator = Orchestrator::new(&registry, cluster.clone());

    for path in ["~", "/", "", "."] {
        let report = orchestrator
            .clean(&cluster.reservation(), &[path.to_string()], &CleanOptions::default())
            .await;
        assert!(!report.success(), "{path:?} should be refused");
        assert_eq!(report.failures()[0].kind(), DeployErrorKind::Configuration);
    }
    assert!(cluster.events().is_empty());
}

#[tokio::test]
async fn one_task_per_node_and_path() {
    let cluster = Arc::new(ScriptedCluster::with_nodes(3));
    let registry = Registry::with_builtins();
    let paths = vec!["data".to_string(), "/scratch/tmp".to_string()];
    let report = Orchestrator::new(&registry, cluster.clone())
        .clean(&cluster.reservation(), &paths, &CleanOptions::default())
        .await;

    assert!(report.success());
    for id in 1..=3 {
        let commands = cluster.commands(id);
        assert_eq!(commands.len(), 2);
        assert!(commands.iter().all(|c| c.contains("rm -rf")));
    }
}
