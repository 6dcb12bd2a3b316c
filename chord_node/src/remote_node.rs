//! Remote node proxy: holds only an immutable reference plus a shared,
//! non-owning handle to the transport. Forwards every operation through
//! it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ChordError;
use crate::hash_id::HashId;
use crate::node::Deadline;
use crate::node_ref::NodeRef;
use crate::transport::Transport;

#[derive(Clone)]
pub struct RemoteNode {
    reference: NodeRef,
    transport: Arc<dyn Transport>,
}

impl RemoteNode {
    pub fn new(reference: NodeRef, transport: Arc<dyn Transport>) -> Self {
        RemoteNode {
            reference,
            transport,
        }
    }

    pub fn reference(&self) -> NodeRef {
        self.reference.clone()
    }

    pub async fn ping(&self, deadline: Deadline) -> Result<(), ChordError> {
        self.transport.ping(&self.reference, deadline).await
    }

    pub async fn successors(&self, deadline: Deadline) -> Result<Vec<NodeRef>, ChordError> {
        self.transport.successors(&self.reference, deadline).await
    }

    pub async fn predecessor(&self, deadline: Deadline) -> Result<NodeRef, ChordError> {
        self.transport.predecessor(&self.reference, deadline).await
    }

    pub async fn find_successor_by_table(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        self.transport
            .find_successor_by_table(&self.reference, id, deadline)
            .await
    }

    pub async fn find_successor_by_list(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        self.transport
            .find_successor_by_list(&self.reference, id, deadline)
            .await
    }

    pub async fn closest_preceding_node(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        self.transport
            .closest_preceding_node(&self.reference, id, deadline)
            .await
    }

    pub async fn notify(&self, peer: NodeRef, deadline: Deadline) -> Result<(), ChordError> {
        self.transport.notify(&self.reference, &peer, deadline).await
    }
}

#[async_trait]
impl crate::node::RingNode for RemoteNode {
    async fn ping(&self, deadline: Deadline) -> Result<(), ChordError> {
        RemoteNode::ping(self, deadline).await
    }
    fn reference(&self) -> NodeRef {
        RemoteNode::reference(self)
    }
    async fn successors(&self, deadline: Deadline) -> Result<Vec<NodeRef>, ChordError> {
        RemoteNode::successors(self, deadline).await
    }
    async fn predecessor(&self, deadline: Deadline) -> Result<NodeRef, ChordError> {
        RemoteNode::predecessor(self, deadline).await
    }
    async fn find_successor_by_table(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        RemoteNode::find_successor_by_table(self, id, deadline).await
    }
    async fn find_successor_by_list(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        RemoteNode::find_successor_by_list(self, id, deadline).await
    }
    async fn closest_preceding_node(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        RemoteNode::closest_preceding_node(self, id, deadline).await
    }
    async fn notify(&self, peer: NodeRef, deadline: Deadline) -> Result<(), ChordError> {
        RemoteNode::notify(self, peer, deadline).await
    }
}
