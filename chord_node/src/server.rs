//! Wire-facing service glue: translates `ChordError` to/from `tonic::Status`
//! and forwards every rpc to the underlying `LocalNode`.

use std::sync::Arc;
use std::time::Duration;

use tonic::{Request, Response, Status};

use chord_proto::chord::chord_server::Chord;
use chord_proto::chord::{
    Empty, FindHostForKeyReq, FindReq, NodeMsg, NodesMsg,
};

use crate::hash_id::HashId;
use crate::local_node::LocalNode;

pub struct ChordService {
    node: Arc<LocalNode>,
}

impl ChordService {
    pub fn new(node: Arc<LocalNode>) -> Self {
        ChordService { node }
    }

    fn deadline(&self) -> Duration {
        self.node.default_deadline()
    }
}

fn parse_id(bytes: &[u8]) -> Result<HashId, Status> {
    HashId::from_slice(bytes).ok_or_else(|| Status::invalid_argument("malformed identifier"))
}

#[tonic::async_trait]
impl Chord for ChordService {
    async fn ping(&self, _request: Request<Empty>) -> Result<Response<Empty>, Status> {
        self.node.ping(self.deadline()).await?;
        Ok(Response::new(Empty {}))
    }

    async fn successors(&self, _request: Request<Empty>) -> Result<Response<NodesMsg>, Status> {
        let list = self.node.successors(self.deadline()).await?;
        Ok(Response::new(NodesMsg {
            nodes: list.into_iter().map(Into::into).collect(),
        }))
    }

    async fn predecessor(&self, _request: Request<Empty>) -> Result<Response<NodeMsg>, Status> {
        let pred = self.node.predecessor(self.deadline()).await?;
        Ok(Response::new(pred.into()))
    }

    async fn find_successor_by_table(
        &self,
        request: Request<FindReq>,
    ) -> Result<Response<NodeMsg>, Status> {
        let id = parse_id(&request.into_inner().id)?;
        let succ = self
            .node
            .find_successor_by_table(id, self.deadline())
            .await?;
        Ok(Response::new(succ.into()))
    }

    async fn find_successor_by_list(
        &self,
        request: Request<FindReq>,
    ) -> Result<Response<NodeMsg>, Status> {
        let id = parse_id(&request.into_inner().id)?;
        let succ = self
            .node
            .find_successor_by_list(id, self.deadline())
            .await?;
        Ok(Response::new(succ.into()))
    }

    async fn closest_preceding_node(
        &self,
        request: Request<FindReq>,
    ) -> Result<Response<NodeMsg>, Status> {
        let id = parse_id(&request.into_inner().id)?;
        let node = self
            .node
            .closest_preceding_node(id, self.deadline())
            .await?;
        Ok(Response::new(node.into()))
    }

    async fn notify(&self, request: Request<NodeMsg>) -> Result<Response<Empty>, Status> {
        let peer = request.into_inner().into();
        self.node.notify(peer, self.deadline()).await?;
        Ok(Response::new(Empty {}))
    }

    async fn find_host_for_key(
        &self,
        request: Request<FindHostForKeyReq>,
    ) -> Result<Response<NodeMsg>, Status> {
        let key = request.into_inner().key;
        let owner = self
            .node
            .find_host_for_key(&key, self.deadline())
            .await?;
        Ok(Response::new(owner.into()))
    }
}
