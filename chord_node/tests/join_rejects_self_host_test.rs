mod common;
use common::start_node;

/// A process must refuse to join a ring through its own host — bootstrap
/// and joiner being the same address is not a valid ring formation.
#[tokio::test]
async fn process_rejects_bootstrap_equal_to_own_host() {
    let (node, _handle) = start_node("127.0.0.1:51201").await;
    let process = chord_node::Process::new(node.clone());

    let own_host = node.reference().host().to_string();
    let result = process.join(&own_host).await;
    assert!(result.is_err(), "joining against one's own host must be rejected");
}
