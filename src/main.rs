//! MCP server for the Labellerr annotation platform.
//!
//! Run with `labellerr-mcp`; credentials come from flags, the environment or a
//! `.env` file in the working directory.

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use labellerr_mcp::{
    Credentials, LabellerrClient, McpServer, McpSession, API_KEY_ENV, API_SECRET_ENV, BASE_URL_ENV,
    CLIENT_ID_ENV, DEFAULT_BASE_URL,
};

/// MCP server for the Labellerr annotation platform.
///
/// Exposes Labellerr project, dataset, annotation and export operations as
/// MCP tools for AI agents. Communicates via JSON-RPC 2.0 over stdin/stdout.
#[derive(Parser)]
#[command(name = "labellerr-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Labellerr API key.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Labellerr API secret.
    #[arg(long, env = API_SECRET_ENV, hide_env_values = true)]
    api_secret: Option<String>,

    /// Labellerr client id.
    #[arg(long, env = CLIENT_ID_ENV)]
    client_id: Option<String>,

    /// Base URL of the Labellerr API.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        "labellerr_mcp=debug"
    } else {
        "labellerr_mcp=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the protocol; logs must go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(args.verbose);

    let client = match Credentials::from_parts(args.api_key, args.api_secret, args.client_id) {
        Some(credentials) => Some(LabellerrClient::connect(&args.base_url, credentials)),
        None => {
            warn!(
                "Labellerr credentials missing; set LABELLERR_API_KEY, LABELLERR_API_SECRET \
                 and LABELLERR_CLIENT_ID. Tool calls will fail until restarted with them."
            );
            None
        }
    };

    let session = McpSession::new(client);
    let mut server = McpServer::new(session);

    info!(base_url = %args.base_url, "Labellerr MCP server running on stdio");
    if let Err(e) = server.run().await {
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}
