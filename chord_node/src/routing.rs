//! Per-node routing state container: successor list, predecessor, finger
//! table, mutated exclusively under the owning local node's mutex.

use crate::constants::{FINGER_TABLE_SIZE, SUCCESSOR_LIST_CAP};
use crate::error::ChordError;
use crate::hash_id::HashId;
use crate::node_ref::NodeRef;

/// Finger table entry `i`: the target identifier `(self.id + 2^i) mod 2^m`
/// and the node currently believed responsible for it, if known.
pub struct FingerEntry {
    pub target: HashId,
    pub node: Option<NodeRef>,
}

pub struct RoutingState {
    successors: Vec<NodeRef>,
    predecessor: Option<NodeRef>,
    fingers: Vec<FingerEntry>,
}

impl RoutingState {
    /// Fresh routing state for a node that has not yet joined or created a
    /// ring: no successor, no predecessor, fingers targeted but unresolved.
    pub fn new(self_id: HashId) -> Self {
        let fingers = (0..FINGER_TABLE_SIZE as u32)
            .map(|i| FingerEntry {
                target: self_id.add_pow2(i),
                node: None,
            })
            .collect();
        RoutingState {
            successors: Vec::new(),
            predecessor: None,
            fingers,
        }
    }

    /// Prepend `n` at the head if its host isn't already present, shift the
    /// rest right, drop overflow at the tail; keeps finger[0] in sync with
    /// the new head. The caller holds the node's routing mutex for the
    /// whole read-modify-write.
    pub fn put_successor(&mut self, n: NodeRef) {
        self.successors.retain(|s| s.host() != n.host());
        self.successors.insert(0, n.clone());
        self.successors.truncate(SUCCESSOR_LIST_CAP);
        self.fingers[0].node = Some(n);
    }

    /// Replaces the tail `[offset, R)` with de-duplicated entries from
    /// `candidates`, stopping at capacity.
    pub fn join_successors(&mut self, offset: usize, candidates: &[NodeRef]) {
        self.successors.truncate(offset);
        for cand in candidates {
            if self.successors.len() >= SUCCESSOR_LIST_CAP {
                break;
            }
            if self.successors.iter().any(|s| s.host() == cand.host()) {
                continue;
            }
            self.successors.push(cand.clone());
        }
        if let Some(head) = self.successors.first() {
            self.fingers[0].node = Some(head.clone());
        }
    }

    pub fn head(&self) -> Result<NodeRef, ChordError> {
        self.successors
            .first()
            .cloned()
            .ok_or(ChordError::NoSuccessorAlive)
    }

    pub fn successors_snapshot(&self) -> Vec<NodeRef> {
        self.successors.clone()
    }

    pub fn len(&self) -> usize {
        self.successors.len()
    }

    pub fn predecessor(&self) -> Option<NodeRef> {
        self.predecessor.clone()
    }

    pub fn set_predecessor(&mut self, n: NodeRef) {
        self.predecessor = Some(n);
    }

    pub fn finger_target(&self, i: usize) -> HashId {
        self.fingers[i].target
    }

    pub fn finger_node(&self, i: usize) -> Option<NodeRef> {
        self.fingers[i].node.clone()
    }

    pub fn set_finger_node(&mut self, i: usize, node: NodeRef) {
        self.fingers[i].node = Some(node);
    }

    pub fn finger_count(&self) -> usize {
        self.fingers.len()
    }

    /// Scans index `m-1` down to `0`; fails `StabilizeNotCompleted` on the
    /// first uninitialised entry (the stricter of the two ways an
    /// incomplete finger table can be handled), otherwise returns the
    /// first finger whose node id lies in `(self_id, id)`, or `self` if none
    /// qualifies (signalled by returning `Ok(None)`).
    pub fn closest_preceding_node(
        &self,
        self_id: HashId,
        id: HashId,
    ) -> Result<Option<NodeRef>, ChordError> {
        for entry in self.fingers.iter().rev() {
            let node = entry.node.as_ref().ok_or(ChordError::StabilizeNotCompleted)?;
            if node.id().is_between(&self_id, &id) {
                return Ok(Some(node.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(host: &str) -> NodeRef {
        NodeRef::new(host)
    }

    #[test]
    fn put_successor_dedups_by_host_and_updates_finger_zero() {
        let mut rs = RoutingState::new(NodeRef::new("self").id());
        rs.put_successor(node("a"));
        rs.put_successor(node("b"));
        rs.put_successor(node("a"));
        let snap = rs.successors_snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0], node("a"));
        assert_eq!(rs.finger_node(0), Some(node("a")));
    }

    #[test]
    fn put_successor_respects_capacity() {
        let mut rs = RoutingState::new(NodeRef::new("self").id());
        for i in 0..SUCCESSOR_LIST_CAP + 5 {
            rs.put_successor(node(&format!("h{i}")));
        }
        assert_eq!(rs.len(), SUCCESSOR_LIST_CAP);
    }

    #[test]
    fn join_successors_preserves_head_at_offset_one() {
        let mut rs = RoutingState::new(NodeRef::new("self").id());
        rs.put_successor(node("head"));
        rs.join_successors(1, &[node("b"), node("c"), node("head")]);
        let snap = rs.successors_snapshot();
        assert_eq!(snap[0], node("head"));
        assert_eq!(snap.len(), 3);
        assert_eq!(snap[1], node("b"));
        assert_eq!(snap[2], node("c"));
    }

    #[test]
    fn head_fails_when_empty() {
        let rs = RoutingState::new(NodeRef::new("self").id());
        assert!(matches!(rs.head(), Err(ChordError::NoSuccessorAlive)));
    }

    #[test]
    fn closest_preceding_node_fails_on_uninitialised_finger() {
        let rs = RoutingState::new(NodeRef::new("self").id());
        let id = NodeRef::new("target").id();
        assert!(matches!(
            rs.closest_preceding_node(NodeRef::new("self").id(), id),
            Err(ChordError::StabilizeNotCompleted)
        ));
    }
}
