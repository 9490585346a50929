use crate::modules::{
    handlers::{
        get_heatmap, get_profile, get_rating_counts, get_tag_counts, get_unsolved, liveness,
        refresh_profile,
    },
    store::ProfileStore,
};
use anyhow::{Context, Result};
use axum::{extract::Extension, routing, Router, Server};
use clap::Args;
use codeforces_profile_libs::codeforces::client::RestCodeforcesApi;
use http::header::{HeaderValue, CONTENT_TYPE};
use std::{env, net::SocketAddr, sync::Arc};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Debug, Args)]
pub struct ServerArgs {
    #[arg(long)]
    port: Option<u16>,
}

pub async fn run(args: ServerArgs) -> Result<()> {
    let api_url = env::var("CODEFORCES_API_URL").unwrap_or_else(|_| {
        tracing::warn!("CODEFORCES_API_URL environment variable is not set. Default value `https://codeforces.com/api` will be used.");
        String::from("https://codeforces.com/api")
    });

    let client = RestCodeforcesApi::new(&api_url).with_context(|| {
        let message = "couldn't create Codeforces API client. check the value of the CODEFORCES_API_URL environment variable.";
        tracing::error!(message);
        format!("{}", message)
    })?;

    let app = create_router(client, ProfileStore::new());

    let port = match args.port {
        Some(port) => port,
        None => {
            tracing::warn!("API server will be launched at default port number 8000");
            8000u16
        }
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Server start at port {}", port);
    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to bind server.");

    Ok(())
}

fn create_router(client: RestCodeforcesApi, store: ProfileStore) -> Router {
    let mut app = Router::new()
        .route("/api/profile", routing::get(get_profile))
        .route("/api/profile/refresh", routing::post(refresh_profile))
        .route("/api/profile/tags", routing::get(get_tag_counts))
        .route("/api/profile/ratings", routing::get(get_rating_counts))
        .route("/api/profile/heatmap", routing::get(get_heatmap))
        .route("/api/profile/unsolved", routing::get(get_unsolved))
        .route("/api/liveness", routing::get(liveness))
        .layer(Extension(Arc::new(client)))
        .layer(Extension(Arc::new(store)));

    if let Ok(origin) = env::var("FRONTEND_ORIGIN_URL") {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                app = app.layer(
                    CorsLayer::new()
                        .allow_origin(AllowOrigin::exact(origin))
                        .allow_methods(Any)
                        .allow_headers(vec![CONTENT_TYPE]),
                );
            }
            Err(e) => {
                tracing::warn!("invalid FRONTEND_ORIGIN_URL is ignored cause: {}", e);
            }
        }
    }

    app
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler.");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("SIGINT signal received, starting graceful shutdown.");
}
