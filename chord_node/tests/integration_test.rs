use chord_node::hash_id::HashId;

mod common;
use common::{stabilize_ring, start_node};

const DEADLINE: std::time::Duration = std::time::Duration::from_millis(500);

#[tokio::test]
async fn ring_of_three_forms_and_routes() {
    let (node1, _h1) = start_node("127.0.0.1:50101").await;
    node1.create_ring();

    let (node2, _h2) = start_node("127.0.0.1:50102").await;
    node2
        .join_ring(node1.reference(), DEADLINE)
        .await
        .expect("node 2 failed to join");

    let (node3, _h3) = start_node("127.0.0.1:50103").await;
    node3
        .join_ring(node1.reference(), DEADLINE)
        .await
        .expect("node 3 failed to join");

    let nodes = vec![node1.clone(), node2.clone(), node3.clone()];
    stabilize_ring(&nodes, 10).await;

    // Walking successors from any node should visit every node exactly once
    // and return to the start.
    let mut visited = std::collections::HashSet::new();
    let mut current = node1.reference();
    for _ in 0..nodes.len() {
        visited.insert(current.id());
        current = nodes
            .iter()
            .find(|n| n.reference().id() == current.id())
            .unwrap()
            .routing_head()
            .expect("every node should have a successor after stabilizing");
    }
    assert_eq!(current.id(), node1.reference().id(), "ring did not close");
    assert_eq!(visited.len(), nodes.len(), "not every node is on the ring");
}

#[tokio::test]
async fn find_successor_by_list_and_by_table_agree() {
    let (node1, _h1) = start_node("127.0.0.1:50104").await;
    node1.create_ring();

    let (node2, _h2) = start_node("127.0.0.1:50105").await;
    node2.join_ring(node1.reference(), DEADLINE).await.unwrap();

    let (node3, _h3) = start_node("127.0.0.1:50106").await;
    node3.join_ring(node1.reference(), DEADLINE).await.unwrap();

    let nodes = vec![node1.clone(), node2.clone(), node3.clone()];
    stabilize_ring(&nodes, 15).await;

    let target = HashId::from_label("some-arbitrary-key");
    let by_list = node1.find_successor_by_list(target, DEADLINE).await.unwrap();
    let by_table = node1.find_successor_by_table(target, DEADLINE).await.unwrap();
    assert_eq!(by_list, by_table);
}

#[tokio::test]
async fn find_host_for_key_resolves_to_a_ring_member() {
    let (node1, _h1) = start_node("127.0.0.1:50107").await;
    node1.create_ring();

    let (node2, _h2) = start_node("127.0.0.1:50108").await;
    node2.join_ring(node1.reference(), DEADLINE).await.unwrap();

    stabilize_ring(&[node1.clone(), node2.clone()], 10).await;

    let owner = node1
        .find_host_for_key("some-document", DEADLINE)
        .await
        .unwrap();
    assert!(owner == node1.reference() || owner == node2.reference());
}

#[tokio::test]
async fn ping_fails_once_shut_down() {
    let (node1, _h1) = start_node("127.0.0.1:50109").await;
    node1.create_ring();
    assert!(node1.ping(DEADLINE).await.is_ok());
    node1.shutdown();
    assert!(node1.ping(DEADLINE).await.is_err());
}
