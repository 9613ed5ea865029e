// ABOUTME: Integration tests for the SSH transport that need no SSH server.
// ABOUTME: Covers connection failures and how they surface through the provider.

use data_deploy::remote::{ConnectionProvider, SshProvider, SshSettings, TransportError};
use data_deploy::reservation::Node;
use data_deploy::ssh::{Error, Session, SessionConfig};
use std::time::Duration;

/// Test: Connection to invalid host fails with connection error.
#[tokio::test]
async fn invalid_host_returns_connection_error() {
    let config = SessionConfig::new("nonexistent.invalid.host.example", "testuser");

    let result = Session::connect(config).await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::Connection(_)),
        "expected Connection error, got: {:?}",
        err
    );
}

/// Test: A closed port on localhost is a connection error, not a hang.
#[tokio::test]
async fn refused_port_returns_connection_error() {
    let config = SessionConfig::new("127.0.0.1", "testuser")
        .port(1)
        .command_timeout(Duration::from_secs(5));

    let err = Session::connect(config).await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)), "got: {:?}", err);
}

/// Test: The provider names the node it could not reach.
#[tokio::test]
async fn provider_open_failure_names_node() {
    let provider = SshProvider::new(SshSettings::default());
    let mut node = Node::new(4, "127.0.0.1", "node4");
    node.port = 1;

    let err = match provider.open(&node).await {
        Ok(_) => panic!("connection to a closed port should fail"),
        Err(e) => e,
    };
    assert!(matches!(err, TransportError::Open(_)));
    assert!(err.to_string().contains("node 4"));
}
