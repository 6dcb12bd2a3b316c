use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tonic::transport::Server;

use chord_node::constants::{
    ALIVE_INTERVAL_MS, DEFAULT_PORT, FINGER_INTERVAL_MS, LOCALHOST, RPC_TIMEOUT_MS,
    SUCCESSOR_INTERVAL_MS,
};
use chord_node::server::ChordService;
use chord_node::transport::GrpcTransport;
use chord_node::{LocalNode, Process, StabilizerIntervals};

use chord_proto::chord::chord_server::ChordServer;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Host:port of an existing ring member to join through. Omit to start
    /// a new ring.
    #[arg(short, long)]
    bootstrap: Option<String>,

    /// Host:port of a chord_monitor instance to report state to.
    #[arg(short, long)]
    monitor: Option<String>,

    /// Per-rpc timeout, in milliseconds.
    #[arg(long, default_value_t = RPC_TIMEOUT_MS)]
    rpc_timeout_ms: u64,

    /// How often the alive stabilizer runs, in milliseconds.
    #[arg(long, default_value_t = ALIVE_INTERVAL_MS)]
    alive_interval_ms: u64,

    /// How often the successor stabilizer runs, in milliseconds.
    #[arg(long, default_value_t = SUCCESSOR_INTERVAL_MS)]
    successor_interval_ms: u64,

    /// How often the finger stabilizer runs, in milliseconds.
    #[arg(long, default_value_t = FINGER_INTERVAL_MS)]
    finger_interval_ms: u64,

    /// How often the monitor report fires, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    monitor_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let host = format!("{LOCALHOST}:{}", args.port);
    let addr = host.parse()?;

    let transport = Arc::new(GrpcTransport::new());
    let node = LocalNode::new(host.clone(), transport);
    node.set_rpc_timeout_ms(args.rpc_timeout_ms);
    let process = Process::new(node.clone());

    log::info!("node starting at {host} with id {}", node.reference().id());

    match &args.bootstrap {
        Some(bootstrap) => process.join(bootstrap).await?,
        None => process.create(),
    }

    let _stabilizer_handles = process.spawn_stabilizers_with(StabilizerIntervals {
        alive_ms: args.alive_interval_ms,
        successor_ms: args.successor_interval_ms,
        finger_ms: args.finger_interval_ms,
    });

    if let Some(monitor_host) = args.monitor.clone() {
        let node_for_monitor = node.clone();
        let interval = Duration::from_millis(args.monitor_interval_ms);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                node_for_monitor.report_to_monitor(&monitor_host).await;
            }
        });
    }

    log::info!("server listening on {addr}");

    Server::builder()
        .add_service(ChordServer::new(ChordService::new(node)))
        .serve(addr)
        .await?;

    Ok(())
}
