//! OpenAPI Mock - CLI Entry Point
//!
//! Registers documents, serves a list of requests from them and prints the
//! responses.

use anyhow::{Context, Result};
use clap::Parser;
use openapi_mock::{InterceptedRequest, MockConfig};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "openapi-mock",
    about = "Answer HTTP requests from OpenAPI documents - response synthesis and call recording",
    version
)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OpenAPI document to register (repeatable)
    #[arg(short, long = "spec", value_name = "PATH")]
    specs: Vec<PathBuf>,

    /// Request to serve, as "METHOD URL" (repeatable)
    #[arg(short, long = "request", value_name = "REQUEST")]
    requests: Vec<String>,

    /// Force this status code on every registered document
    #[arg(long)]
    status: Option<u16>,

    /// Seed for reproducible responses
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Print the recorded calls as JSON after serving
    #[arg(long)]
    print_calls: bool,
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join(path))
}

fn parse_request(line: &str) -> Result<InterceptedRequest> {
    let (method, url) = line
        .trim()
        .split_once(char::is_whitespace)
        .with_context(|| format!("Expected \"METHOD URL\", got {:?}", line))?;
    Ok(InterceptedRequest::new(method, url.trim())?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let (mut config, base_dir) = match &args.config {
        Some(path) => {
            info!(path = ?path, "Loading configuration");
            let config = MockConfig::from_file(path)?;
            let base_dir = absolute(path)?
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            (config, base_dir)
        }
        None => (MockConfig::default(), std::env::current_dir()?),
    };

    if args.validate {
        config.validate()?;
        println!(
            "Configuration is valid ({} specs defined)",
            config.specs.len()
        );
        return Ok(());
    }

    if args.seed.is_some() {
        config.settings.seed = args.seed;
    }

    let registry = config.build_registry();
    let mut apis = config.apply(&registry, &base_dir).await?;
    for spec in &args.specs {
        apis.push(registry.register(absolute(spec)?).await?);
    }
    if let Some(status) = args.status {
        for api in &apis {
            api.set_status(status);
        }
    }

    for line in &args.requests {
        let request = parse_request(line)?;
        let response = registry.respond(request);
        println!("{}", response.status);
        if let Some(content_type) = &response.content_type {
            println!("Content-Type: {}", content_type);
        }
        println!();
        println!("{}", response.body);
    }

    if args.print_calls {
        for api in registry.apis() {
            for call in api.all() {
                let line = serde_json::json!({
                    "document": api.path().display().to_string(),
                    "method": call.request.method,
                    "url": call.request.url.as_str(),
                    "parameters": call.request.parameters,
                    "query": call.request.query,
                    "code": call.code,
                    "response": call.response,
                });
                println!("{}", line);
            }
        }
    }

    info!(
        requests = registry.total_requests(),
        matched = registry.total_matched(),
        unmatched = registry.total_unmatched(),
        "Done"
    );

    Ok(())
}
