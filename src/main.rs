//! modelmap server.
//!
//! ```text
//!     Client Request
//!     ──▶ request id / trace / timeout layers
//!     ──▶ /<segment>/ route (one per provider)
//!     ──▶ dispatch: session → filters → body → provider → session save
//!     ◀── JSON reply (+ Set-Cookie)
//! ```
//!
//! Ships with the `Echo` provider mounted at `/echos/`.

use std::path::PathBuf;

use clap::Parser;

use modelmap::config::{load_config, validate_config, ConfigError};
use modelmap::observability::logging::init_logging;
use modelmap::provider::EchoProvider;
use modelmap::Registry;

#[derive(Parser, Debug)]
#[command(name = "modelmap", version, about = "Convention-based REST dispatch for resource providers")]
struct Args {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long, env = "MODELMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.limits.request_timeout_secs,
        max_body_size = config.limits.max_body_size,
        "modelmap starting"
    );

    let registry = Registry::new();
    registry.register(EchoProvider)?;

    modelmap::lifecycle::serve(config, &registry).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
