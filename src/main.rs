//! S3 Gateway command line tool
//!
//! This binary loads a properties file (with environment overrides), builds
//! a gateway, and runs it until interrupted. Any configuration or transport
//! failure is printed to standard error and exits with code 1.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::info;

use s3_gateway::common::init_logger;
use s3_gateway::config::{properties, AuthMode};
use s3_gateway::gateway::GatewayBuilder;
use s3_gateway::{storage, GatewayError, APP_NAME, VERSION};

/// S3-compatible gateway for provider-agnostic object storage
#[derive(Parser, Debug)]
#[clap(about, long_about = None, disable_version_flag = true)]
struct Args {
    /// Print the implementation version to standard error and exit
    #[clap(long)]
    version: bool,

    /// Path to the gateway properties file
    properties: Option<PathBuf>,

    /// Log level
    #[clap(long, default_value = "info")]
    log_level: String,
}

fn usage() -> ExitCode {
    eprintln!("Usage: {} PROPERTIES_FILE", APP_NAME);
    ExitCode::from(1)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(_) => return usage(),
    };

    if args.version {
        eprintln!("{}", VERSION);
        return ExitCode::SUCCESS;
    }

    let Some(properties_path) = args.properties else {
        return usage();
    };

    init_logger(&args.log_level);

    match run(&properties_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(properties_path: &Path) -> s3_gateway::Result<()> {
    info!("starting {} v{}", APP_NAME, VERSION);

    let resolved = properties::resolve(properties_path)?;

    let store = storage::connect(
        &resolved.provider,
        &resolved.backend_identity,
        &resolved.backend_credential,
        resolved.backend_endpoint.as_deref(),
    )?;

    let mut builder = GatewayBuilder::new()
        .store(store)
        .endpoint(&resolved.endpoint)?;

    if resolved.authorization == AuthMode::AwsV2 {
        // resolve() guarantees the pair is present for aws-v2.
        if let (Some(identity), Some(credential)) =
            (&resolved.gateway_identity, &resolved.gateway_credential)
        {
            builder = builder.aws_authentication(identity, credential)?;
        }
    }
    if let (Some(path), Some(password)) =
        (&resolved.keystore_path, &resolved.keystore_password)
    {
        builder = builder.keystore(path, password)?;
    }
    if let Some(virtual_host) = &resolved.virtual_host {
        builder = builder.virtual_host(virtual_host)?;
    }

    let mut gateway = builder.build()?;
    gateway.start().await?;
    info!(
        "{} provider bound on port {}, press Ctrl+C to stop",
        resolved.provider,
        gateway.local_port()?
    );

    tokio::signal::ctrl_c().await.map_err(GatewayError::Io)?;
    info!("shutdown signal received");
    gateway.stop().await?;

    Ok(())
}
