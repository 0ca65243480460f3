mod db;
mod services;
pub mod model;
pub mod utils;

use db::mongo;
use tokio::signal;
use dotenv::dotenv;
use std::sync::Arc;
use utils::health;
use std::time::Duration;
use utils::crypto::BlobCipher;
use utils::errors::WardenError;
use model::policy::SecurityPolicy;
use utils::context::ServiceContext;
use utils::config::{Configuration, self};
use crate::utils::errors::ErrorCode;
use grpc::api::warden_server::WardenServer;
use tokio::sync::oneshot::{self};
use grpc::internal::internal_server::InternalServer;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use opentelemetry::{global, sdk::{propagation::TraceContextPropagator,trace,trace::Sampler}};
use tracing_subscriber::{prelude::__tracing_subscriber_SubscriberExt, Registry, util::SubscriberInitExt};

///
/// These are the generated gRPC/protobuf modules which give us access to the message structures, services,
/// servers and clients to talk to our APIs. The services are implemented in services/mod.rs
///
pub mod grpc {
    pub mod common {
        tonic::include_proto!("grpc.common");
    }

    pub mod api {
        tonic::include_proto!("grpc.warden");
    }

    pub mod internal {
        tonic::include_proto!("grpc.internal");
    }
}

pub const APP_NAME: &str = "Warden";

// How often the hygiene sweep evicts expired sessions. Expiry is enforced
// lazily on every request - the sweep just stops dead rows accumulating.
const SESSION_SWEEP_SECONDS: u64 = 300;

///
/// Entry point to start the app.
///
pub async fn lib_main() -> Result<(), WardenError> {

    // Load any local dev settings as environment variables from a .env file.
    dotenv().ok();

    // Default log level to INFO if it's not specified.
    config::default_env("RUST_LOG", "INFO");

    // SIGINT/ctrl+c handling for graceful shutdown.
    let (signal_tx, signal_rx) = oneshot::channel();
    let _signal = tokio::spawn(wait_for_signal(signal_tx));

    // Load the service configuration into struct and initialise any lazy statics.
    let config = Configuration::from_env().expect("The service configuration is not correct");

    // Initialise open-telemetry distributed tracing.
    let tracing = init_tracing(&config);

    tracing::info!("{}\n{}", BANNER, config.fmt_console()?);

    // The timing/threshold policy shared by the lockout, session and two-factor components.
    let policy = SecurityPolicy::from(&config);

    // The cipher for two-factor secrets and recovery codes at rest.
    let cipher = BlobCipher::from_hex_key(&config.master_key)?;

    // Create a MongoDB client and connect to it before proceeding.
    let db = mongo::get_mongo_db(APP_NAME, &config).await?;

    // Ensure the schema is in sync with the code.
    mongo::update_mongo(&db).await?;

    // The service context allows any gRPC service access to shared stuff (database, clock, policy, etc.).
    let ctx = Arc::new(ServiceContext::new(config.clone(), db, policy, cipher));

    let (health_reporter, health_service) = health::start(ctx.clone()).await;

    tokio::spawn(session_sweeper(ctx.clone()));

    // The port we'll serve on.
    let addr = format!("[::1]:{}", config.port).parse()
        .map_err(|e| ErrorCode::TonicStartError.with_msg(&format!("Bad listen address: {}", e)))?;

    let mut builder = Server::builder();

    if config.tls {
        let identity = init_tls(&config).await?;
        builder = builder.tls_config(ServerTlsConfig::new().identity(identity))?;
        tracing::info!("{} listening on {} and using tls", APP_NAME, addr);
    } else {
        tracing::info!("{} listening on {}", APP_NAME, addr);
    }

    let server = builder
        .add_service(WardenServer::new(ctx.clone()))
        .add_service(InternalServer::new(ctx.clone()))
        .add_service(health_service)
        .serve_with_shutdown(addr, async {
            signal_rx.await.ok();
            tracing::info!("Graceful shutdown");
        });

    server.await?;

    health::shutdown(health_reporter).await;

    if tracing {
        opentelemetry::global::shutdown_tracer_provider(); // sending remaining spans
    }

    Ok(())
}

///
/// Sends a oneshot signal when a SIGINT is received (Ctrl+C)
///
async fn wait_for_signal(tx: oneshot::Sender<()>) {
    let _ = signal::ctrl_c().await;
    tracing::info!("SIGINT received: shutting down");
    let _ = tx.send(());
}

///
/// Bind to the server-side key and certificate.
///
async fn init_tls(config: &Configuration) -> Result<Identity, WardenError> {

    tracing::info!("Initialising TLS config");

    let cert = tokio::fs::read(&config.tls_cert)
        .await
        .map_err(|e| ErrorCode::IOError.with_msg(&format!("Failed to open pem {}: {}", config.tls_cert, e)))?;

    let key = tokio::fs::read(&config.tls_key)
        .await
        .map_err(|e| ErrorCode::IOError.with_msg(&format!("Failed to open key {}: {}", config.tls_key, e)))?;

    Ok(Identity::from_pem(cert, key))
}

///
/// Periodically evict sessions that have sat idle past the timeout.
///
async fn session_sweeper(ctx: Arc<ServiceContext>) {
    loop {
        tokio::time::sleep(Duration::from_secs(SESSION_SWEEP_SECONDS)).await;

        match db::session::purge_expired(&ctx).await {
            Ok(0)      => {},
            Ok(swept)  => tracing::debug!("Swept {} expired session(s)", swept),
            Err(err)   => tracing::warn!("Session sweep failed: {:?}", err),
        }
    }
}

///
/// Initialise tracing and plug-in the Jaeger feature if enabled.
///
fn init_tracing(config: &Configuration) -> bool {
    global::set_text_map_propagator(TraceContextPropagator::new());

    match config.distributed_tracing {
        true => { // Install the Jaeger pipeline.
            let tracer = opentelemetry_jaeger::new_pipeline()
                .with_service_name(APP_NAME)
                .with_trace_config(trace::config().with_sampler(Sampler::AlwaysOn))
                .with_agent_endpoint(config.jaeger_endpoint.clone().unwrap_or_default())
                .install_batch(opentelemetry::runtime::Tokio)
                .expect("Unable to build Jaeger pipeline");

            if let Err(err) = Registry::default()
                .with(tracing_subscriber::EnvFilter::from_default_env()) // Set the tracing level to match RUST_LOG env variable.
                .with(tracing_subscriber::fmt::layer().with_test_writer().with_ansi(true))
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init() {
                    tracing::info!("Tracing already initialised: {}", err.to_string()); // Allowed error here - tests call this fn repeatedly.
            }

            return true
        },
        false => {
            if let Err(err) = Registry::default()
                .with(tracing_subscriber::EnvFilter::from_default_env()) // Set the tracing level to match RUST_LOG env variable.
                .with(tracing_subscriber::fmt::layer().with_test_writer().with_ansi(true))
                .try_init() {
                    tracing::info!("Tracing already initialised: {}", err.to_string()); // Allowed error here - tests call this fn repeatedly.
            }

            return false
        }
    }
}

const BANNER: &str = r#"
 __      __                 .___
/  \    /  \_____ _______  __| _/____   ____
\   \/\/   /\__  \\_  __ \/ __ |/ __ \ /    \
 \        /  / __ \|  | \/ /_/ \  ___/|   |  \
  \__/\  /  (____  /__|  \____ |\___  >___|  /
       \/        \/           \/    \/     \/
"#;
