//! Transport contract consumed by the core and its gRPC realization: a
//! shared, thread-safe connection pool keyed by host, plus the `Transport`
//! trait a `RemoteNode` calls through.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::Channel;
use tonic::Request;

use chord_proto::chord::chord_client::ChordClient;
use chord_proto::chord::{Empty, FindReq, NodeMsg};

use crate::constants::CONN_POOL_CAP;
use crate::error::ChordError;
use crate::hash_id::HashId;
use crate::node_ref::NodeRef;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn ping(&self, to: &NodeRef, deadline: Duration) -> Result<(), ChordError>;
    async fn successors(&self, to: &NodeRef, deadline: Duration) -> Result<Vec<NodeRef>, ChordError>;
    async fn predecessor(&self, to: &NodeRef, deadline: Duration) -> Result<NodeRef, ChordError>;
    async fn find_successor_by_table(
        &self,
        to: &NodeRef,
        id: HashId,
        deadline: Duration,
    ) -> Result<NodeRef, ChordError>;
    async fn find_successor_by_list(
        &self,
        to: &NodeRef,
        id: HashId,
        deadline: Duration,
    ) -> Result<NodeRef, ChordError>;
    async fn closest_preceding_node(
        &self,
        to: &NodeRef,
        id: HashId,
        deadline: Duration,
    ) -> Result<NodeRef, ChordError>;
    async fn notify(&self, to: &NodeRef, from: &NodeRef, deadline: Duration) -> Result<(), ChordError>;
    fn shutdown(&self);
}

/// Connections are created lazily, reused freely, and closed only at
/// shutdown. Keyed by host, guarded by a single map-level mutex held only
/// during lookup/insert. Caps the number of distinct channels kept open,
/// evicting the least-recently-used entry beyond that bound.
pub struct GrpcTransport {
    pool: tokio::sync::Mutex<Pool>,
}

struct Pool {
    channels: HashMap<String, Channel>,
    // Most-recently-used hosts at the back; used to evict on overflow.
    lru: Vec<String>,
}

impl GrpcTransport {
    pub fn new() -> Self {
        GrpcTransport {
            pool: tokio::sync::Mutex::new(Pool {
                channels: HashMap::new(),
                lru: Vec::new(),
            }),
        }
    }

    async fn channel(&self, host: &str) -> Result<Channel, ChordError> {
        let mut pool = self.pool.lock().await;
        if let Some(ch) = pool.channels.get(host).cloned() {
            pool.lru.retain(|h| h != host);
            pool.lru.push(host.to_string());
            return Ok(ch);
        }
        drop(pool);

        let endpoint = format!("http://{host}");
        let channel = Channel::from_shared(endpoint)
            .map_err(|e| ChordError::Transport(e.to_string()))?
            .connect()
            .await?;

        let mut pool = self.pool.lock().await;
        if pool.channels.len() >= CONN_POOL_CAP {
            if let Some(oldest) = pool.lru.first().cloned() {
                pool.channels.remove(&oldest);
                pool.lru.remove(0);
            }
        }
        pool.channels.insert(host.to_string(), channel.clone());
        pool.lru.push(host.to_string());
        Ok(channel)
    }

    async fn client(&self, host: &str) -> Result<ChordClient<Channel>, ChordError> {
        Ok(ChordClient::new(self.channel(host).await?))
    }
}

impl Default for GrpcTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn with_deadline<T>(req: T, deadline: Duration) -> Request<T> {
    let mut request = Request::new(req);
    request.set_timeout(deadline);
    request
}

#[async_trait]
impl Transport for GrpcTransport {
    async fn ping(&self, to: &NodeRef, deadline: Duration) -> Result<(), ChordError> {
        let mut client = self.client(to.host()).await?;
        client.ping(with_deadline(Empty {}, deadline)).await?;
        Ok(())
    }

    async fn successors(&self, to: &NodeRef, deadline: Duration) -> Result<Vec<NodeRef>, ChordError> {
        let mut client = self.client(to.host()).await?;
        let resp = client
            .successors(with_deadline(Empty {}, deadline))
            .await?
            .into_inner();
        Ok(resp.nodes.into_iter().map(NodeRef::from).collect())
    }

    async fn predecessor(&self, to: &NodeRef, deadline: Duration) -> Result<NodeRef, ChordError> {
        let mut client = self.client(to.host()).await?;
        let resp = client
            .predecessor(with_deadline(Empty {}, deadline))
            .await?
            .into_inner();
        Ok(NodeRef::from(resp))
    }

    async fn find_successor_by_table(
        &self,
        to: &NodeRef,
        id: HashId,
        deadline: Duration,
    ) -> Result<NodeRef, ChordError> {
        let mut client = self.client(to.host()).await?;
        let resp = client
            .find_successor_by_table(with_deadline(FindReq { id: id.to_vec() }, deadline))
            .await?
            .into_inner();
        Ok(NodeRef::from(resp))
    }

    async fn find_successor_by_list(
        &self,
        to: &NodeRef,
        id: HashId,
        deadline: Duration,
    ) -> Result<NodeRef, ChordError> {
        let mut client = self.client(to.host()).await?;
        let resp = client
            .find_successor_by_list(with_deadline(FindReq { id: id.to_vec() }, deadline))
            .await?
            .into_inner();
        Ok(NodeRef::from(resp))
    }

    async fn closest_preceding_node(
        &self,
        to: &NodeRef,
        id: HashId,
        deadline: Duration,
    ) -> Result<NodeRef, ChordError> {
        let mut client = self.client(to.host()).await?;
        let resp = client
            .closest_preceding_node(with_deadline(FindReq { id: id.to_vec() }, deadline))
            .await
            .map_err(ChordError::from_closest_preceding_status)?
            .into_inner();
        Ok(NodeRef::from(resp))
    }

    async fn notify(&self, to: &NodeRef, from: &NodeRef, deadline: Duration) -> Result<(), ChordError> {
        let mut client = self.client(to.host()).await?;
        let msg: NodeMsg = from.into();
        client.notify(with_deadline(msg, deadline)).await?;
        Ok(())
    }

    fn shutdown(&self) {
        if let Ok(mut pool) = self.pool.try_lock() {
            pool.channels.clear();
            pool.lru.clear();
        }
    }
}
