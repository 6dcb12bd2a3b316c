pub mod constants;
pub mod error;
pub mod hash_id;
pub mod local_node;
pub mod node;
pub mod node_ref;
pub mod process;
pub mod remote_node;
pub mod routing;
pub mod server;
pub mod stabilizer;
pub mod transport;

pub use error::ChordError;
pub use hash_id::HashId;
pub use local_node::LocalNode;
pub use node::{Deadline, NodeHandle, RingNode};
pub use node_ref::NodeRef;
pub use process::{Process, StabilizerIntervals};
pub use server::ChordService;
pub use transport::{GrpcTransport, Transport};
