use std::sync::Arc;

use eyre::WrapErr;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use almoner_api::config::{JwtKey, ServerConfig, StoreConfig};
use almoner_api::router;
use almoner_api::state::AppState;
use almoner_auth::jwt::TokenVerifier;
use almoner_search::flush::flush;
use almoner_search::index::PatientIndex;
use almoner_storage::memory::MemoryStore;
use almoner_storage::s3::S3Store;
use almoner_storage::store::DocumentStore;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = ServerConfig::from_env()?;

    let store: Arc<dyn DocumentStore> = match &config.store {
        StoreConfig::S3 {
            bucket,
            region,
            endpoint,
        } => {
            let client =
                almoner_storage::client::build_client(region.as_deref(), endpoint.as_deref())
                    .await;
            tracing::info!(bucket = %bucket, "using S3 document store");
            Arc::new(S3Store::new(client, bucket.clone()))
        }
        StoreConfig::Memory => {
            tracing::warn!("using in-memory document store, data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let verifier = match &config.jwt_key {
        JwtKey::Hs256Secret(secret) => TokenVerifier::hs256(secret.as_bytes(), &config.jwt_issuer),
        JwtKey::Rs256PublicKey(path) => {
            let pem = std::fs::read(path)
                .wrap_err_with(|| format!("reading ALMONER_JWT_PUBLIC_KEY {}", path.display()))?;
            TokenVerifier::rs256_pem(&pem, &config.jwt_issuer)?
        }
    };
    let verifier = match &config.jwt_audience {
        Some(audience) => verifier.with_audience(audience),
        None => verifier,
    };

    let index = PatientIndex::load_or_create(store.as_ref(), config.index_dir.as_deref()).await?;
    let state = AppState::new(Arc::clone(&store), verifier, index);
    let app = router(state.clone());

    let listener = TcpListener::bind(config.bind)
        .await
        .wrap_err_with(|| format!("binding {}", config.bind))?;
    tracing::info!(addr = %config.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Persist index changes made since start-up.
    let mut index = state.index.lock().await;
    match flush(store.as_ref(), &mut index).await {
        Ok(etag) => tracing::info!(etag = %etag, "patient index persisted"),
        Err(e) => tracing::error!(error = %e, "failed to persist patient index"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
