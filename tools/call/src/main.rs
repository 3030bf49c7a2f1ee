//! Single-shot RPC command-line tool.
//!
//! Performs one call against an endpoint and prints the outcome to standard
//! error:
//!
//! ```text
//! zenith-call call tcp://127.0.0.1:5000 echo.Echo '{"text": "hi"}' \
//!     --schema echo.schema.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use zenith_core::{SchemaRegistry, Status};
use zenith_rpc::{Call, Channel, Connection, Endpoint};

#[derive(Parser, Debug)]
#[command(author, version, about = "Sends RPCs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Perform one call and print the result.
    Call(CallArgs),
}

#[derive(Args, Debug)]
struct CallArgs {
    /// Endpoint to call, tcp://host:port or unix://path.
    endpoint: String,
    /// Method to call, as service.method.
    method: String,
    /// JSON-encoded request payload.
    payload: String,
    /// JSON schema file describing the target services.
    #[arg(long)]
    schema: PathBuf,
    /// Connect timeout and call deadline, in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

async fn handle_call_command(args: CallArgs) -> Result<()> {
    let endpoint: Endpoint = args.endpoint.parse().context("invalid endpoint")?;
    let timeout = Duration::from_secs(args.timeout);

    let Some((service_name, method_name)) = args.method.rsplit_once('.') else {
        bail!("<service.method> must contain a dot: '{}'", args.method);
    };

    let registry = SchemaRegistry::from_json_file(&args.schema)
        .with_context(|| format!("could not load schema from '{}'", args.schema.display()))?;
    if registry.resolve(service_name, method_name).is_none() {
        bail!("could not find method '{}' in the schema", args.method);
    }

    let request: Value = serde_json::from_str(&args.payload)
        .context("could not parse the request payload as JSON")?;

    let connection = Connection::connect_timeout(&endpoint, timeout)
        .await
        .with_context(|| format!("could not connect to {endpoint}"))?;
    debug!(%endpoint, "connected");
    let channel = connection.create_channel(Arc::new(registry));

    let call = Call::with_deadline(timeout);
    channel.call_raw(service_name, method_name, &call, &request, None);
    call.wait().await;

    match call.status() {
        Some(Status::Ok) => {
            let response = call.response_value().unwrap_or(Value::Null);
            eprintln!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Some(status) => {
            eprintln!("status: {status}");
            match (call.application_error(), call.error_message()) {
                (Some(code), message) => {
                    eprintln!("error {}: {}", code, message.unwrap_or_default())
                }
                (None, Some(message)) if !message.is_empty() => eprintln!("{message}"),
                _ => {}
            }
            bail!("call finished with status {status}");
        }
        None => bail!("call did not complete"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Call(args) => handle_call_command(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
