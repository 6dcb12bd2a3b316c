//! Process orchestration: brings a node up as the first member of a ring
//! or as a joiner, then keeps three stabilizers running independently for
//! as long as the process lives.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::constants::{ALIVE_INTERVAL_MS, FINGER_INTERVAL_MS, SUCCESSOR_INTERVAL_MS};
use crate::local_node::LocalNode;
use crate::node_ref::NodeRef;
use crate::stabilizer::{AliveStabilizer, FingerStabilizer, Stabilizer, SuccessorStabilizer};

/// The three stabilizer periods, in milliseconds. Defaults to the
/// `*_INTERVAL_MS` constants; a process can override any subset of them.
pub struct StabilizerIntervals {
    pub alive_ms: u64,
    pub successor_ms: u64,
    pub finger_ms: u64,
}

impl Default for StabilizerIntervals {
    fn default() -> Self {
        StabilizerIntervals {
            alive_ms: ALIVE_INTERVAL_MS,
            successor_ms: SUCCESSOR_INTERVAL_MS,
            finger_ms: FINGER_INTERVAL_MS,
        }
    }
}

pub struct Process {
    node: Arc<LocalNode>,
}

impl Process {
    pub fn new(node: Arc<LocalNode>) -> Self {
        Process { node }
    }

    pub fn node(&self) -> Arc<LocalNode> {
        self.node.clone()
    }

    /// Creates a new ring with `self.node` as the sole member.
    pub fn create(&self) {
        self.node.create_ring();
        info!("node {}: started a new ring", self.node.reference());
    }

    /// Joins the ring reachable through `bootstrap`. Rejects a bootstrap
    /// naming this node's own host — joining against yourself isn't a valid
    /// ring formation.
    pub async fn join(&self, bootstrap: &str) -> anyhow::Result<()> {
        if bootstrap == self.node.reference().host() {
            anyhow::bail!("cannot join against own host {bootstrap}");
        }
        let bootstrap_ref = NodeRef::new(bootstrap);
        self.node
            .join_ring(bootstrap_ref, self.node.default_deadline())
            .await?;
        info!(
            "node {}: joined ring via {}",
            self.node.reference(),
            bootstrap
        );
        Ok(())
    }

    /// Spawns the alive, successor, and finger stabilizers as independent
    /// periodic tasks and returns their join handles.
    pub fn spawn_stabilizers(&self) -> Vec<tokio::task::JoinHandle<()>> {
        self.spawn_stabilizers_with(StabilizerIntervals::default())
    }

    /// Like `spawn_stabilizers`, with each period overridable (process
    /// inputs).
    pub fn spawn_stabilizers_with(
        &self,
        intervals: StabilizerIntervals,
    ) -> Vec<tokio::task::JoinHandle<()>> {
        let deadline = self.node.default_deadline();
        let alive = Arc::new(AliveStabilizer::new(self.node.clone()));
        let successor = Arc::new(SuccessorStabilizer::new(self.node.clone()));
        let finger = Arc::new(FingerStabilizer::new(self.node.clone()));

        vec![
            spawn_loop(self.node.clone(), alive, deadline, intervals.alive_ms),
            spawn_loop(self.node.clone(), successor, deadline, intervals.successor_ms),
            spawn_loop(self.node.clone(), finger, deadline, intervals.finger_ms),
        ]
    }
}

/// Runs `stabilizer` once per period on its own clock: the next pass is
/// scheduled one period after the previous one *completes*, not on a fixed
/// wall-clock cadence. Stops rescheduling once the node shuts down.
fn spawn_loop(
    node: Arc<LocalNode>,
    stabilizer: Arc<dyn Stabilizer>,
    deadline: Duration,
    period_ms: u64,
) -> tokio::task::JoinHandle<()> {
    let period = Duration::from_millis(period_ms);
    tokio::spawn(async move {
        loop {
            if node.is_shutdown() {
                break;
            }
            stabilizer.stabilize(deadline).await;
            tokio::time::sleep(period).await;
        }
    })
}
