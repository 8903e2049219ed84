#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code; a bad submission must never panic the server.
// Test code is allowed to use unwrap() for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use launcher::{FormValues, LauncherConfig, convert_post_to_token};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
struct AppState {
    /// Launcher configuration, shared read-only by every request.
    config: Arc<LauncherConfig>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "launcher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match LauncherConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: signing_key={}, encryption_key={}, survey_runner_url={}, listen_port={}",
        config.key_paths.signing.display(),
        config.key_paths.encryption.display(),
        config.survey_runner_url,
        config.listen_port
    );

    let listen_port = config.listen_port;
    let state = AppState {
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/", post(launch_handler))
        .route("/status", get(status_handler))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}

async fn status_handler() -> &'static str {
    "OK"
}

/// Issue a token for the submitted form and send the browser to the survey runner.
async fn launch_handler(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let values: FormValues = pairs.into_iter().collect();
    let key_paths = state.config.key_paths.clone();

    // Key loading and RSA work block; keep them off the async workers.
    let result =
        tokio::task::spawn_blocking(move || convert_post_to_token(&values, &key_paths)).await;

    match result {
        Ok(Ok(token)) => {
            Redirect::to(&session_url(&state.config.survey_runner_url, &token)).into_response()
        }
        Ok(Err(e)) => {
            tracing::error!("Failed to issue token: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::error!("Token task failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Survey runner URL that starts a session with `token`.
///
/// Compact tokens only contain base64url characters and dots, so no escaping
/// is needed.
fn session_url(survey_runner_url: &str, token: &str) -> String {
    format!("{survey_runner_url}/session?token={token}")
}
