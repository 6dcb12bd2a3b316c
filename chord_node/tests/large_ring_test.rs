use std::collections::HashSet;
use std::time::Duration;

use chord_node::hash_id::HashId;

mod common;
use common::{stabilize_ring, start_node};

const DEADLINE: Duration = Duration::from_millis(500);
const NUM_NODES: usize = 20;
const BASE_PORT: u16 = 52000;

#[tokio::test]
async fn large_ring_converges_and_agrees_on_lookups() {
    let mut nodes = Vec::new();
    for i in 0..NUM_NODES {
        let addr = format!("127.0.0.1:{}", BASE_PORT + i as u16);
        let (node, _handle) = start_node(&addr).await;
        nodes.push(node);
    }

    nodes[0].create_ring();
    for node in &nodes[1..] {
        node.join_ring(nodes[0].reference(), DEADLINE)
            .await
            .expect("join should succeed");
        stabilize_ring(&nodes, 2).await;
    }

    stabilize_ring(&nodes, 30).await;

    // The ring should be a single cycle covering every node.
    let mut visited = HashSet::new();
    let mut current = nodes[0].reference();
    for _ in 0..NUM_NODES {
        visited.insert(current.id());
        current = nodes
            .iter()
            .find(|n| n.reference().id() == current.id())
            .unwrap()
            .routing_head()
            .expect("converged ring should always have a successor");
    }
    assert_eq!(current.id(), nodes[0].reference().id());
    assert_eq!(visited.len(), NUM_NODES);

    // Every node should agree on who owns a given key, regardless of which
    // node the lookup started from.
    let keys = ["key1", "key2", "hello", "distributed-hash-table"];
    for key in keys {
        let id = HashId::from_label(key);
        let mut owners = HashSet::new();
        for node in &nodes {
            let owner = node
                .find_successor_by_table(id, DEADLINE)
                .await
                .unwrap_or_else(|e| panic!("lookup for '{key}' failed from some node: {e}"));
            owners.insert(owner.id());
        }
        assert_eq!(owners.len(), 1, "nodes disagree on the owner of '{key}'");
    }
}
