use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chord_proto::chord::{
    chord_client::ChordClient,
    chord_monitor_server::{ChordMonitor, ChordMonitorServer},
    Empty, NodeMsg, NodeState,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::process::Command;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tonic::{transport::Server, Request, Response, Status};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct MonitorState {
    nodes: HashMap<String, NodeState>,
    next_port: u16,
}

impl MonitorState {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            // Start allocating node ports from 5010 to avoid conflicting
            // with a manually-started node on the default port.
            next_port: 5010,
        }
    }
}

type SharedState = Arc<Mutex<MonitorState>>;

struct MonitorService {
    state: SharedState,
}

#[tonic::async_trait]
impl ChordMonitor for MonitorService {
    async fn report_state(&self, request: Request<NodeState>) -> Result<Response<Empty>, Status> {
        let node_state = request.into_inner();
        tracing::debug!(address = %node_state.address, "received state report");
        let mut state = self.state.lock().unwrap();
        state.nodes.insert(node_state.address.clone(), node_state);
        Ok(Response::new(Empty {}))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let state = Arc::new(Mutex::new(MonitorState::new()));

    let grpc_state = state.clone();
    tokio::spawn(async move {
        let addr: SocketAddr = "0.0.0.0:50051".parse().unwrap();
        tracing::info!(%addr, "monitor grpc listening");
        Server::builder()
            .add_service(ChordMonitorServer::new(MonitorService {
                state: grpc_state,
            }))
            .serve(addr)
            .await
            .unwrap();
    });

    let app = Router::new()
        .route("/api/state", get(get_state))
        .route("/api/add_node", post(handle_add_node))
        .route("/api/leave_node", post(handle_leave_node))
        .nest_service("/", tower_http::services::ServeDir::new("frontend/dist"))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!(%addr, "monitor web listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize, Clone)]
struct NodeMsgDto {
    host: String,
}

impl From<NodeMsg> for NodeMsgDto {
    fn from(msg: NodeMsg) -> Self {
        Self { host: msg.host }
    }
}

#[derive(Serialize, Clone)]
struct NodeStateDto {
    id_hex: String,
    address: String,
    predecessor: Option<NodeMsgDto>,
    successors: Vec<NodeMsgDto>,
    finger_table: Vec<NodeMsgDto>,
}

impl From<NodeState> for NodeStateDto {
    fn from(state: NodeState) -> Self {
        Self {
            id_hex: state.id.iter().map(|b| format!("{b:02x}")).collect(),
            address: state.address,
            predecessor: state.predecessor.map(Into::into),
            successors: state.successors.into_iter().map(Into::into).collect(),
            finger_table: state.finger_table.into_iter().map(Into::into).collect(),
        }
    }
}

async fn get_state(State(state): State<SharedState>) -> Json<Vec<NodeStateDto>> {
    let state = state.lock().unwrap();
    let nodes: Vec<NodeStateDto> = state.nodes.values().cloned().map(Into::into).collect();
    Json(nodes)
}

#[derive(Serialize)]
struct ApiStatusResponse {
    success: bool,
    message: String,
}

async fn handle_add_node(State(state): State<SharedState>) -> Json<ApiStatusResponse> {
    let (port, bootstrap_addr) = {
        let mut state_guard = state.lock().unwrap();
        let port = state_guard.next_port;
        state_guard.next_port += 1;

        let bootstrap_addr = state_guard
            .nodes
            .values()
            .next()
            .map(|first_node| first_node.address.clone());
        (port, bootstrap_addr)
    };

    let mut cmd = Command::new("cargo");
    cmd.current_dir(".."); // Run from workspace root.
    cmd.arg("run")
        .arg("--bin")
        .arg("chord_node")
        .arg("--")
        .arg("--port")
        .arg(port.to_string())
        .arg("--monitor")
        .arg("127.0.0.1:50051");

    if let Some(bootstrap) = bootstrap_addr {
        cmd.arg("--bootstrap").arg(bootstrap);
    }

    match cmd.spawn() {
        Ok(_) => Json(ApiStatusResponse {
            success: true,
            message: format!("spawned node on port {port}"),
        }),
        Err(e) => Json(ApiStatusResponse {
            success: false,
            message: format!("failed to spawn node: {e}"),
        }),
    }
}

#[derive(Deserialize)]
struct ApiLeaveRequest {
    address: String,
}

async fn handle_leave_node(
    State(state): State<SharedState>,
    Json(payload): Json<ApiLeaveRequest>,
) -> Json<ApiStatusResponse> {
    let found = {
        let state = state.lock().unwrap();
        state.nodes.contains_key(&payload.address)
    };
    if !found {
        return Json(ApiStatusResponse {
            success: false,
            message: "node not found".into(),
        });
    }

    // There is no graceful-leave rpc in the ring protocol; dropping the
    // node from the dashboard's view is all the monitor can do here, the
    // ring itself relies on the alive stabilizer to notice the process is
    // gone.
    let endpoint = format!("http://{}", payload.address);
    if let Ok(mut client) = ChordClient::connect(endpoint).await {
        let _ = client.ping(Request::new(Empty {})).await;
    }

    let mut state = state.lock().unwrap();
    state.nodes.remove(&payload.address);
    Json(ApiStatusResponse {
        success: true,
        message: "node removed from dashboard".into(),
    })
}
