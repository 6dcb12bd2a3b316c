//! Local node operations: `find_successor`, `closest_preceding_node`,
//! `notify`, `join`, `create`, running against the owning node's own
//! routing state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::debug;

use crate::constants::RPC_TIMEOUT_MS;
use crate::error::ChordError;
use crate::hash_id::HashId;
use crate::node::{Deadline, NodeHandle, RingNode};
use crate::node_ref::NodeRef;
use crate::remote_node::RemoteNode;
use crate::routing::RoutingState;
use crate::transport::Transport;

pub struct LocalNode {
    reference: NodeRef,
    routing: Mutex<RoutingState>,
    shutdown: AtomicBool,
    transport: Arc<dyn Transport>,
    weak_self: Weak<LocalNode>,
    rpc_timeout_ms: AtomicU64,
}

impl LocalNode {
    /// Constructs a node with empty routing state — neither `create_ring`
    /// nor `join_ring` has run yet.
    pub fn new(host: impl Into<String>, transport: Arc<dyn Transport>) -> Arc<Self> {
        let reference = NodeRef::new(host);
        Arc::new_cyclic(|weak_self| LocalNode {
            routing: Mutex::new(RoutingState::new(reference.id())),
            reference,
            shutdown: AtomicBool::new(false),
            transport,
            weak_self: weak_self.clone(),
            rpc_timeout_ms: AtomicU64::new(RPC_TIMEOUT_MS),
        })
    }

    fn handle(&self) -> NodeHandle {
        NodeHandle::Local(
            self.weak_self
                .upgrade()
                .expect("LocalNode outlives its own Arc"),
        )
    }

    /// Maps a `NodeRef` to the right role: `self` if it names this node,
    /// otherwise a `RemoteNode` proxy over the shared transport — callers
    /// never branch on role themselves.
    pub fn resolve(&self, peer: NodeRef) -> NodeHandle {
        if peer.id() == self.reference.id() {
            self.handle()
        } else {
            NodeHandle::Remote(RemoteNode::new(peer, self.transport.clone()))
        }
    }

    fn check_alive(&self) -> Result<(), ChordError> {
        if self.shutdown.load(Ordering::SeqCst) {
            Err(ChordError::NodeUnavailable)
        } else {
            Ok(())
        }
    }

    /// `create_ring()`: predecessor and sole successor are self, every
    /// finger points at self.
    pub fn create_ring(&self) {
        let mut routing = self.routing.lock().unwrap();
        routing.set_predecessor(self.reference.clone());
        routing.put_successor(self.reference.clone());
        for i in 0..routing.finger_count() {
            routing.set_finger_node(i, self.reference.clone());
        }
    }

    /// `join_ring(bootstrap)`. Predecessor is left unset — the first
    /// `notify` received fills it.
    pub async fn join_ring(
        &self,
        bootstrap: NodeRef,
        deadline: Deadline,
    ) -> Result<(), ChordError> {
        let bootstrap_handle = self.resolve(bootstrap);
        let successor = bootstrap_handle
            .find_successor_by_table(self.reference.id(), deadline)
            .await?;

        {
            let mut routing = self.routing.lock().unwrap();
            routing.put_successor(successor.clone());
        }

        let successor_handle = self.resolve(successor.clone());
        successor_handle
            .notify(self.reference.clone(), deadline)
            .await?;

        let succ_list = successor_handle.successors(deadline).await?;
        let mut routing = self.routing.lock().unwrap();
        routing.join_successors(1, &succ_list);
        Ok(())
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.transport.shutdown();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    pub fn default_deadline(&self) -> Deadline {
        std::time::Duration::from_millis(self.rpc_timeout_ms.load(Ordering::Relaxed))
    }

    /// Overrides the per-rpc deadline used by `default_deadline`; defaults
    /// to `RPC_TIMEOUT_MS`.
    pub fn set_rpc_timeout_ms(&self, ms: u64) {
        self.rpc_timeout_ms.store(ms, Ordering::Relaxed);
    }

    // --- routing-state accessors used by stabilizers ---

    pub fn routing_head(&self) -> Result<NodeRef, ChordError> {
        self.routing.lock().unwrap().head()
    }

    pub fn routing_successors_snapshot(&self) -> Vec<NodeRef> {
        self.routing.lock().unwrap().successors_snapshot()
    }

    pub fn routing_len(&self) -> usize {
        self.routing.lock().unwrap().len()
    }

    pub fn routing_put_successor(&self, n: NodeRef) {
        self.routing.lock().unwrap().put_successor(n);
    }

    pub fn routing_join_successors(&self, offset: usize, candidates: &[NodeRef]) {
        self.routing.lock().unwrap().join_successors(offset, candidates);
    }

    pub fn routing_finger_target(&self, i: usize) -> HashId {
        self.routing.lock().unwrap().finger_target(i)
    }

    pub fn routing_set_finger_node(&self, i: usize, node: NodeRef) {
        self.routing.lock().unwrap().set_finger_node(i, node);
    }

    pub fn routing_finger_count(&self) -> usize {
        self.routing.lock().unwrap().finger_count()
    }

    // --- lookup algorithms ---

    /// `find_successor_by_list(id)` — the list-only baseline.
    pub async fn find_successor_by_list(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        self.check_alive()?;
        let head = self.routing.lock().unwrap().head()?;

        if head.id() == self.reference.id() {
            // Ring of one.
            return Ok(self.reference.clone());
        }
        if id == self.reference.id() {
            return Ok(self.reference.clone());
        }

        let successors = self.routing.lock().unwrap().successors_snapshot();
        let mut live = None;
        for candidate in successors {
            let handle = self.resolve(candidate.clone());
            if handle.ping(deadline).await.is_ok() {
                live = Some(candidate);
                break;
            }
        }
        let s = live.ok_or(ChordError::NoSuccessorAlive)?;

        if id.is_between_inclusive_right(&self.reference.id(), &s.id()) {
            return Ok(s);
        }
        self.resolve(s).find_successor_by_list(id, deadline).await
    }

    /// `find_successor_by_table(id)` — finger-accelerated, falling back to
    /// the baseline when an intermediate node hasn't stabilized yet.
    pub async fn find_successor_by_table(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        self.check_alive()?;
        match self.find_predecessor(id, deadline).await {
            Ok(pred) => {
                let succs = pred.successors(deadline).await?;
                for candidate in succs {
                    let handle = self.resolve(candidate.clone());
                    if handle.ping(deadline).await.is_ok() {
                        return Ok(candidate);
                    }
                }
                Err(ChordError::NoSuccessorAlive)
            }
            Err(e) => {
                debug!(
                    "node {}: find_predecessor failed ({e}), falling back to list lookup",
                    self.reference
                );
                self.find_successor_by_list(id, deadline).await
            }
        }
    }

    /// `find_predecessor(id)`.
    async fn find_predecessor(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeHandle, ChordError> {
        let mut target = self.handle();
        loop {
            let succs = target.successors(deadline).await?;
            let s = succs.first().cloned().ok_or(ChordError::NotFound)?;

            if target.reference().id() == s.id() {
                // Single-node ring at this point.
                break;
            }
            if id.is_between(&target.reference().id(), &s.id().next()) {
                break;
            }
            match target.closest_preceding_node(id, deadline).await {
                Ok(next_ref) => target = self.resolve(next_ref),
                Err(_) => return Err(ChordError::NotFound),
            }
        }
        Ok(target)
    }

    /// `closest_preceding_node(id)`.
    pub async fn closest_preceding_node(
        &self,
        id: HashId,
        _deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        self.check_alive()?;
        let routing = self.routing.lock().unwrap();
        match routing.closest_preceding_node(self.reference.id(), id)? {
            Some(n) => Ok(n),
            None => Ok(self.reference.clone()),
        }
    }

    /// `notify(peer)`, invoked by a peer's stabilizer rather than scheduled
    /// locally.
    pub async fn notify(&self, peer: NodeRef, _deadline: Deadline) -> Result<(), ChordError> {
        self.check_alive()?;
        let mut routing = self.routing.lock().unwrap();
        let should_update = match routing.predecessor() {
            None => true,
            Some(pred) => peer.id().is_between(&pred.id(), &self.reference.id()),
        };
        if should_update {
            routing.set_predecessor(peer);
        }
        Ok(())
    }

    pub async fn ping(&self, _deadline: Deadline) -> Result<(), ChordError> {
        self.check_alive()
    }

    pub fn reference(&self) -> NodeRef {
        self.reference.clone()
    }

    pub async fn successors(&self, _deadline: Deadline) -> Result<Vec<NodeRef>, ChordError> {
        self.check_alive()?;
        Ok(self.routing.lock().unwrap().successors_snapshot())
    }

    pub async fn predecessor(&self, _deadline: Deadline) -> Result<NodeRef, ChordError> {
        self.check_alive()?;
        self.routing.lock().unwrap().predecessor().ok_or(ChordError::NotFound)
    }

    /// `find_host_for_key`: the optional public wrapper that hashes `key`
    /// and resolves its owner. Not part of the polymorphic node operation
    /// set — it never crosses the wire recursively, it just runs one
    /// lookup.
    pub async fn find_host_for_key(
        &self,
        key: &str,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        let id = HashId::from_label(key);
        self.find_successor_by_table(id, deadline).await
    }

    /// Snapshot of this node's routing state in the collector's wire shape.
    fn node_state_snapshot(&self) -> chord_proto::chord::NodeState {
        let routing = self.routing.lock().unwrap();
        chord_proto::chord::NodeState {
            id: self.reference.id().to_vec(),
            address: self.reference.host().to_string(),
            predecessor: routing.predecessor().map(Into::into),
            successors: routing.successors_snapshot().into_iter().map(Into::into).collect(),
            finger_table: (0..routing.finger_count())
                .filter_map(|i| routing.finger_node(i))
                .map(Into::into)
                .collect(),
        }
    }

    /// Fire-and-forget report to the monitor collector.
    pub async fn report_to_monitor(&self, monitor_host: &str) {
        use chord_proto::chord::chord_monitor_client::ChordMonitorClient;

        let state = self.node_state_snapshot();
        let endpoint = format!("http://{monitor_host}");
        match ChordMonitorClient::connect(endpoint).await {
            Ok(mut client) => {
                if let Err(e) = client.report_state(state).await {
                    debug!("node {}: report to monitor failed ({e})", self.reference);
                }
            }
            Err(e) => debug!("node {}: couldn't reach monitor ({e})", self.reference),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct NoopTransport;
    #[async_trait::async_trait]
    impl Transport for NoopTransport {
        async fn ping(&self, _: &NodeRef, _: Duration) -> Result<(), ChordError> {
            Err(ChordError::NodeUnavailable)
        }
        async fn successors(&self, _: &NodeRef, _: Duration) -> Result<Vec<NodeRef>, ChordError> {
            Err(ChordError::NodeUnavailable)
        }
        async fn predecessor(&self, _: &NodeRef, _: Duration) -> Result<NodeRef, ChordError> {
            Err(ChordError::NodeUnavailable)
        }
        async fn find_successor_by_table(
            &self,
            _: &NodeRef,
            _: HashId,
            _: Duration,
        ) -> Result<NodeRef, ChordError> {
            Err(ChordError::NodeUnavailable)
        }
        async fn find_successor_by_list(
            &self,
            _: &NodeRef,
            _: HashId,
            _: Duration,
        ) -> Result<NodeRef, ChordError> {
            Err(ChordError::NodeUnavailable)
        }
        async fn closest_preceding_node(
            &self,
            _: &NodeRef,
            _: HashId,
            _: Duration,
        ) -> Result<NodeRef, ChordError> {
            Err(ChordError::NodeUnavailable)
        }
        async fn notify(&self, _: &NodeRef, _: &NodeRef, _: Duration) -> Result<(), ChordError> {
            Err(ChordError::NodeUnavailable)
        }
        fn shutdown(&self) {}
    }

    fn make_node(host: &str) -> Arc<LocalNode> {
        LocalNode::new(host, Arc::new(NoopTransport))
    }

    #[tokio::test]
    async fn create_ring_is_a_ring_of_one() {
        let node = make_node("127.0.0.1:9000");
        node.create_ring();
        assert_eq!(node.routing_head().unwrap(), node.reference());
        assert!(node.predecessor(Duration::from_millis(10)).await.is_ok());
    }

    #[tokio::test]
    async fn find_successor_by_list_ring_of_one_returns_self() {
        let node = make_node("127.0.0.1:9001");
        node.create_ring();
        let some_id = HashId::from_label("arbitrary-key");
        let found = node
            .find_successor_by_list(some_id, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(found, node.reference());
    }

    #[tokio::test]
    async fn find_successor_by_list_self_id_returns_self() {
        let node = make_node("127.0.0.1:9002");
        node.create_ring();
        let found = node
            .find_successor_by_list(node.reference().id(), Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(found, node.reference());
    }

    #[tokio::test]
    async fn shutdown_fails_every_operation() {
        let node = make_node("127.0.0.1:9003");
        node.create_ring();
        node.shutdown();
        assert!(matches!(
            node.ping(Duration::from_millis(10)).await,
            Err(ChordError::NodeUnavailable)
        ));
        assert!(matches!(
            node.successors(Duration::from_millis(10)).await,
            Err(ChordError::NodeUnavailable)
        ));
        assert!(matches!(
            node.notify(node.reference(), Duration::from_millis(10)).await,
            Err(ChordError::NodeUnavailable)
        ));
    }

    #[tokio::test]
    async fn notify_sets_unset_predecessor() {
        let fresh = make_node("127.0.0.1:9006");
        let peer = NodeRef::new("127.0.0.1:9005");
        fresh.notify(peer.clone(), Duration::from_millis(10)).await.unwrap();
        assert_eq!(
            fresh.predecessor(Duration::from_millis(10)).await.unwrap(),
            peer
        );
    }
}
