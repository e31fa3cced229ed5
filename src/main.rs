use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic_reflection::server::Builder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_grpc::{TriageGrpc, auth_interceptor};
use api_rest::{AppState, router};
use api_shared::FILE_DESCRIPTOR_SET;
use api_shared::pb::triage_server::TriageServer;
use triage_core::{CoreConfig, TriageService};

/// Main entry point for the OpenHealth triage service
///
/// Starts both gRPC and REST servers concurrently over one shared [`TriageService`], so
/// sessions and live history feeds are the same on both:
/// - gRPC server on port 50051 (configurable via TRIAGE_GRPC_ADDR)
/// - REST server on port 3000 (configurable via TRIAGE_REST_ADDR)
///
/// The gRPC server requires an `x-api-key` header when store credentials are configured.
///
/// # Environment Variables
/// - `TRIAGE_GRPC_ADDR`: gRPC server address (default: "0.0.0.0:50051")
/// - `TRIAGE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `TRIAGE_ENABLE_REFLECTION`: "true" to serve gRPC reflection
/// - `TRIAGE_DATA_DIR`: Record store directory (default: "triage_data")
/// - `TRIAGE_PROCESSING_LATENCY_MS`: Delay before a submission is scored (default: 1500)
/// - Store credentials: `TRIAGE_HOSTED_CONFIG` + `TRIAGE_APP_ID`, or `API_KEY` + `PROJECT_ID`
///
/// # Returns
/// * `Ok(())` - If servers start and run successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("openhealth_run=info".parse()?)
                .add_directive("triage_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let grpc_addr: SocketAddr = std::env::var("TRIAGE_GRPC_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".into())
        .parse()?;
    let rest_addr = std::env::var("TRIAGE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::from_env()?);
    let service = TriageService::from_config(cfg.clone());

    tracing::info!("++ Starting triage gRPC on {}", grpc_addr);
    tracing::info!("++ Starting triage REST on {}", rest_addr);

    // Start REST server
    let rest_app = router(AppState {
        service: service.clone(),
    });
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let rest_server = tokio::spawn(async move { axum::serve(listener, rest_app).await });

    // Start gRPC server
    let mut grpc_builder = Server::builder().add_service(TriageServer::with_interceptor(
        TriageGrpc::new(service),
        auth_interceptor(cfg.api_key().map(str::to_owned)),
    ));
    if std::env::var("TRIAGE_ENABLE_REFLECTION").unwrap_or_else(|_| "false".to_string()) == "true"
    {
        let reflection_service = Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        grpc_builder = grpc_builder.add_service(reflection_service);
        tracing::info!("gRPC server reflection enabled");
    }
    let grpc_server = grpc_builder.serve(grpc_addr);

    // Run both
    let (rest_result, grpc_result) = tokio::join!(rest_server, grpc_server);
    rest_result??;
    grpc_result?;

    Ok(())
}
