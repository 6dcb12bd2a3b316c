//! Node reference: an immutable `(id, host)` pair. Two references are
//! equal iff their identifiers are equal.

use std::fmt;

use chord_proto::chord::NodeMsg;

use crate::hash_id::HashId;

#[derive(Clone)]
pub struct NodeRef {
    id: HashId,
    host: String,
}

impl NodeRef {
    /// Derives `id` by hashing `host`.
    pub fn new(host: impl Into<String>) -> Self {
        let host = host.into();
        let id = HashId::from_label(&host);
        NodeRef { id, host }
    }

    pub fn id(&self) -> HashId {
        self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({}, {})", self.id, self.host)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.host)
    }
}

impl From<&NodeRef> for NodeMsg {
    fn from(r: &NodeRef) -> Self {
        NodeMsg {
            host: r.host.clone(),
        }
    }
}

impl From<NodeRef> for NodeMsg {
    fn from(r: NodeRef) -> Self {
        NodeMsg { host: r.host }
    }
}

impl From<NodeMsg> for NodeRef {
    fn from(msg: NodeMsg) -> Self {
        NodeRef::new(msg.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_by_id() {
        let a = NodeRef::new("127.0.0.1:5000");
        let b = NodeRef::new("127.0.0.1:5000");
        let c = NodeRef::new("127.0.0.1:5001");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn roundtrips_through_proto() {
        let r = NodeRef::new("127.0.0.1:5000");
        let msg: NodeMsg = r.clone().into();
        let back: NodeRef = msg.into();
        assert_eq!(r, back);
    }
}
