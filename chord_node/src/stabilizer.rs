//! Stabilization: three independent periodic checks, each owning a fixed
//! slice of a node's routing state and running on its own schedule rather
//! than one another's.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::local_node::LocalNode;
use crate::node::{Deadline, RingNode};

#[async_trait]
pub trait Stabilizer: Send + Sync {
    async fn stabilize(&self, deadline: Deadline);
}

/// Pings every entry in the successor list and drops the ones that don't
/// answer.
pub struct AliveStabilizer {
    node: Arc<LocalNode>,
}

impl AliveStabilizer {
    pub fn new(node: Arc<LocalNode>) -> Self {
        AliveStabilizer { node }
    }
}

#[async_trait]
impl Stabilizer for AliveStabilizer {
    async fn stabilize(&self, deadline: Deadline) {
        let successors = self.node.routing_successors_snapshot();
        let mut alive = Vec::with_capacity(successors.len());
        for s in &successors {
            let handle = self.node.resolve(s.clone());
            if handle.ping(deadline).await.is_ok() {
                alive.push(s.clone());
            } else {
                warn!("node {}: successor {} is dead", self.node.reference(), s);
            }
        }
        if alive.len() < successors.len() {
            self.node.routing_join_successors(0, &alive);
        }
    }
}

/// Checks the current successor's predecessor for a closer candidate, adopts
/// it if it qualifies, notifies the successor, and refreshes the tail of the
/// successor list from it.
pub struct SuccessorStabilizer {
    node: Arc<LocalNode>,
}

impl SuccessorStabilizer {
    pub fn new(node: Arc<LocalNode>) -> Self {
        SuccessorStabilizer { node }
    }
}

#[async_trait]
impl Stabilizer for SuccessorStabilizer {
    async fn stabilize(&self, deadline: Deadline) {
        let successor = match self.node.routing_head() {
            Ok(s) => s,
            Err(e) => {
                warn!("node {}: no successor alive ({e})", self.node.reference());
                return;
            }
        };

        let successor_handle = self.node.resolve(successor.clone());

        match successor_handle.predecessor(deadline).await {
            Ok(candidate)
                if candidate
                    .id()
                    .is_between(&self.node.reference().id(), &successor.id()) =>
            {
                let candidate_handle = self.node.resolve(candidate.clone());
                if candidate_handle.ping(deadline).await.is_ok() {
                    debug!("node {}: adopting closer successor {}", self.node.reference(), candidate);
                    self.node.routing_put_successor(candidate);
                }
            }
            Ok(_) => {}
            Err(e) if matches!(e, crate::error::ChordError::NotFound) => {}
            Err(e) => {
                warn!(
                    "node {}: couldn't read successor {}'s predecessor ({e})",
                    self.node.reference(),
                    successor
                );
                return;
            }
        }

        let successor = match self.node.routing_head() {
            Ok(s) => s,
            Err(_) => return,
        };
        let successor_handle = self.node.resolve(successor.clone());

        if let Err(e) = successor_handle
            .notify(self.node.reference(), deadline)
            .await
        {
            warn!(
                "node {}: couldn't notify successor {} ({e})",
                self.node.reference(),
                successor
            );
            return;
        }

        if successor.id() == self.node.reference().id() {
            return;
        }

        match successor_handle.successors(deadline).await {
            Ok(list) => self.node.routing_join_successors(1, &list),
            Err(e) => warn!(
                "node {}: couldn't read successor {}'s successor list ({e})",
                self.node.reference(),
                successor
            ),
        }
    }
}

/// Refreshes one finger-table entry per tick, starting from the one after
/// the last it touched, and carries the resolved node forward into every
/// later entry it still dominates. A monotonic cursor rather than the
/// random index some Chord write-ups use.
pub struct FingerStabilizer {
    node: Arc<LocalNode>,
    last_index: std::sync::atomic::AtomicUsize,
}

impl FingerStabilizer {
    pub fn new(node: Arc<LocalNode>) -> Self {
        FingerStabilizer {
            node,
            last_index: std::sync::atomic::AtomicUsize::new(usize::MAX),
        }
    }
}

#[async_trait]
impl Stabilizer for FingerStabilizer {
    async fn stabilize(&self, deadline: Deadline) {
        use std::sync::atomic::Ordering;

        let count = self.node.routing_finger_count();
        let last = self.last_index.load(Ordering::Relaxed);
        let index = last.wrapping_add(1) % count;

        let target = self.node.routing_finger_target(index);
        let succ = match self.node.find_successor_by_table(target, deadline).await {
            Ok(s) => s,
            Err(e) => {
                debug!(
                    "node {}: finger[{index}] lookup failed ({e})",
                    self.node.reference()
                );
                return;
            }
        };

        self.node.routing_set_finger_node(index, succ.clone());
        self.last_index.store(index, Ordering::Relaxed);

        for i in (index + 1)..count {
            let finger_target = self.node.routing_finger_target(i);
            if finger_target > succ.id() {
                break;
            }
            self.node.routing_set_finger_node(i, succ.clone());
            self.last_index.store(i, Ordering::Relaxed);
        }
    }
}
