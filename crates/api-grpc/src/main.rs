//! Standalone gRPC server binary.
//!
//! Runs only the gRPC API. The workspace's main `openhealth-run` binary runs gRPC and REST
//! together.

use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic_reflection::server::Builder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_grpc::{auth_interceptor, pb::triage_server::TriageServer, TriageGrpc};
use api_shared::FILE_DESCRIPTOR_SET;
use triage_core::{CoreConfig, TriageService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_grpc=info".parse()?)
                .add_directive("triage_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = std::env::var("TRIAGE_GRPC_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".into())
        .parse()?;

    let cfg = Arc::new(CoreConfig::from_env()?);
    let service = TriageService::from_config(cfg.clone());

    tracing::info!("-- Starting triage gRPC on {}", addr);

    let interceptor = auth_interceptor(cfg.api_key().map(str::to_owned));
    let mut server_builder = Server::builder().add_service(TriageServer::with_interceptor(
        TriageGrpc::new(service),
        interceptor,
    ));

    if std::env::var("TRIAGE_ENABLE_REFLECTION").unwrap_or_else(|_| "false".to_string()) == "true"
    {
        let reflection_service = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        server_builder = server_builder.add_service(reflection_service);
        tracing::info!("gRPC server reflection enabled");
    } else {
        tracing::info!("gRPC server reflection disabled");
    }

    server_builder.serve(addr).await?;

    Ok(())
}
