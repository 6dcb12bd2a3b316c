use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tonic::transport::Server;

use chord_node::local_node::LocalNode;
use chord_node::server::ChordService;
use chord_node::stabilizer::{AliveStabilizer, FingerStabilizer, Stabilizer, SuccessorStabilizer};
use chord_node::transport::GrpcTransport;
use chord_proto::chord::chord_server::ChordServer;

const TEST_DEADLINE: Duration = Duration::from_millis(500);

/// Starts a node bound to `addr` serving on a background task. Returns the
/// node and a handle that can be aborted to simulate a crash.
pub async fn start_node(addr: &str) -> (Arc<LocalNode>, tokio::task::JoinHandle<()>) {
    let socket_addr: SocketAddr = addr.parse().unwrap();
    let listener = TcpListener::bind(socket_addr).await.unwrap();
    let local_addr = listener.local_addr().unwrap().to_string();

    let transport = Arc::new(GrpcTransport::new());
    let node = LocalNode::new(local_addr, transport);
    let node_for_server = node.clone();

    let handle = tokio::spawn(async move {
        Server::builder()
            .add_service(ChordServer::new(ChordService::new(node_for_server)))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    (node, handle)
}

/// Bundles the three independent stabilizers for one node so tests can
/// drive them on their own schedule instead of spawning the periodic tasks
/// `Process::spawn_stabilizers` would.
struct NodeStabilizers {
    alive: AliveStabilizer,
    successor: SuccessorStabilizer,
    finger: FingerStabilizer,
}

impl NodeStabilizers {
    fn new(node: Arc<LocalNode>) -> Self {
        NodeStabilizers {
            alive: AliveStabilizer::new(node.clone()),
            successor: SuccessorStabilizer::new(node.clone()),
            finger: FingerStabilizer::new(node),
        }
    }

    async fn run_once(&self) {
        self.alive.stabilize(TEST_DEADLINE).await;
        self.successor.stabilize(TEST_DEADLINE).await;
        self.finger.stabilize(TEST_DEADLINE).await;
    }
}

pub async fn stabilize_ring(nodes: &[Arc<LocalNode>], rounds: usize) {
    let groups: Vec<NodeStabilizers> = nodes.iter().cloned().map(NodeStabilizers::new).collect();
    for _ in 0..rounds {
        for g in &groups {
            g.run_once().await;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
