//! The polymorphic node operation set: local and remote nodes are
//! dispatched through the same trait; callers never branch on role.
//! `NodeHandle` is a tagged variant rather than an inheritance hierarchy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ChordError;
use crate::hash_id::HashId;
use crate::local_node::LocalNode;
use crate::node_ref::NodeRef;
use crate::remote_node::RemoteNode;

/// Every remote call is a suspension point bounded by a per-call deadline;
/// this is that deadline, threaded through every operation.
pub type Deadline = Duration;

#[async_trait]
pub trait RingNode: Send + Sync {
    async fn ping(&self, deadline: Deadline) -> Result<(), ChordError>;
    fn reference(&self) -> NodeRef;
    async fn successors(&self, deadline: Deadline) -> Result<Vec<NodeRef>, ChordError>;
    async fn predecessor(&self, deadline: Deadline) -> Result<NodeRef, ChordError>;
    async fn find_successor_by_table(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError>;
    async fn find_successor_by_list(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError>;
    async fn closest_preceding_node(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError>;
    async fn notify(&self, peer: NodeRef, deadline: Deadline) -> Result<(), ChordError>;
}

/// Local vs. remote role, dispatched without the caller ever knowing which
/// variant it holds.
#[derive(Clone)]
pub enum NodeHandle {
    Local(Arc<LocalNode>),
    Remote(RemoteNode),
}

impl NodeHandle {
    pub fn reference(&self) -> NodeRef {
        match self {
            NodeHandle::Local(n) => n.reference(),
            NodeHandle::Remote(n) => n.reference(),
        }
    }
}

#[async_trait]
impl RingNode for NodeHandle {
    async fn ping(&self, deadline: Deadline) -> Result<(), ChordError> {
        match self {
            NodeHandle::Local(n) => n.ping(deadline).await,
            NodeHandle::Remote(n) => n.ping(deadline).await,
        }
    }

    fn reference(&self) -> NodeRef {
        NodeHandle::reference(self)
    }

    async fn successors(&self, deadline: Deadline) -> Result<Vec<NodeRef>, ChordError> {
        match self {
            NodeHandle::Local(n) => n.successors(deadline).await,
            NodeHandle::Remote(n) => n.successors(deadline).await,
        }
    }

    async fn predecessor(&self, deadline: Deadline) -> Result<NodeRef, ChordError> {
        match self {
            NodeHandle::Local(n) => n.predecessor(deadline).await,
            NodeHandle::Remote(n) => n.predecessor(deadline).await,
        }
    }

    async fn find_successor_by_table(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        match self {
            NodeHandle::Local(n) => n.find_successor_by_table(id, deadline).await,
            NodeHandle::Remote(n) => n.find_successor_by_table(id, deadline).await,
        }
    }

    async fn find_successor_by_list(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        match self {
            NodeHandle::Local(n) => n.find_successor_by_list(id, deadline).await,
            NodeHandle::Remote(n) => n.find_successor_by_list(id, deadline).await,
        }
    }

    async fn closest_preceding_node(
        &self,
        id: HashId,
        deadline: Deadline,
    ) -> Result<NodeRef, ChordError> {
        match self {
            NodeHandle::Local(n) => n.closest_preceding_node(id, deadline).await,
            NodeHandle::Remote(n) => n.closest_preceding_node(id, deadline).await,
        }
    }

    async fn notify(&self, peer: NodeRef, deadline: Deadline) -> Result<(), ChordError> {
        match self {
            NodeHandle::Local(n) => n.notify(peer, deadline).await,
            NodeHandle::Remote(n) => n.notify(peer, deadline).await,
        }
    }
}
