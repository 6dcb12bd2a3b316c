use clap::{Parser, Subcommand};
use tonic::Request;

use chord_proto::chord::chord_client::ChordClient;
use chord_proto::chord::{Empty, FindHostForKeyReq, FindReq};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address of the node to connect to.
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    node: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the owner of a key using the finger-accelerated lookup.
    Lookup { key: String },
    /// Resolve the successor of a raw 256-bit identifier (hex-encoded).
    FindSuccessor { id_hex: String },
    /// Print the node's current successor list.
    Successors,
    /// Print the node's current predecessor, if any.
    Predecessor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut client = ChordClient::connect(cli.node).await?;

    match cli.command {
        Commands::Lookup { key } => {
            let request = Request::new(FindHostForKeyReq { key: key.clone() });
            let response = client.find_host_for_key(request).await?;
            println!("key '{key}' owned by {}", response.into_inner().host);
        }
        Commands::FindSuccessor { id_hex } => {
            let id = hex_to_bytes(&id_hex)?;
            let request = Request::new(FindReq { id });
            let response = client.find_successor_by_table(request).await?;
            println!("successor: {}", response.into_inner().host);
        }
        Commands::Successors => {
            let response = client.successors(Request::new(Empty {})).await?;
            for (i, node) in response.into_inner().nodes.into_iter().enumerate() {
                println!("{i}: {}", node.host);
            }
        }
        Commands::Predecessor => match client.predecessor(Request::new(Empty {})).await {
            Ok(response) => println!("predecessor: {}", response.into_inner().host),
            Err(status) if status.code() == tonic::Code::NotFound => {
                println!("no predecessor set");
            }
            Err(status) => return Err(status.into()),
        },
    }

    Ok(())
}

fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() != 64 {
        return Err(format!(
            "expected a 64-character hex identifier, got {} characters",
            hex.len()
        ));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}
