use std::time::Duration;

mod common;
use common::{stabilize_ring, start_node};

const DEADLINE: Duration = Duration::from_millis(500);

/// A new node can still join through a bootstrap whose old successor has
/// died and been dropped by the alive stabilizer.
#[tokio::test]
async fn join_succeeds_after_a_ring_member_dies() {
    let (node1, _h1) = start_node("127.0.0.1:51101").await;
    node1.create_ring();

    let (node2, h2) = start_node("127.0.0.1:51102").await;
    node2.join_ring(node1.reference(), DEADLINE).await.unwrap();

    let (node3, _h3) = start_node("127.0.0.1:51103").await;
    node3.join_ring(node1.reference(), DEADLINE).await.unwrap();

    let nodes = vec![node1.clone(), node2.clone(), node3.clone()];
    stabilize_ring(&nodes, 10).await;

    h2.abort();
    tokio::time::sleep(Duration::from_millis(300)).await;
    stabilize_ring(&[node1.clone(), node3.clone()], 10).await;

    let (node4, _h4) = start_node("127.0.0.1:51104").await;
    node4
        .join_ring(node1.reference(), DEADLINE)
        .await
        .expect("node 4 should be able to join through node 1 after node 2 died");
}
