//! `esmdev dev` command implementation.
//!
//! A thin HTTP adapter: every GET request is handed to the core dispatcher
//! and its response is written back unchanged, plus `Cache-Control: no-cache`.
//!
//! ```text
//! Browser requests GET /src/App.vue
//!   → Request { path: "/src/App.vue", query: {} }
//!   → DevServer::respond (route table → transform)
//!   → ModuleResponse { status, content_type, body }
//! ```

use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use esmdev_core::{DevConfig, DevServer, Request};
use miette::{IntoDiagnostic, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Dev server action. `None` fields fall back to the config file, then to
/// the built-in defaults.
#[derive(Debug, Clone)]
pub struct DevAction {
    /// Project root.
    pub cwd: PathBuf,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub deps_dir: Option<PathBuf>,
    pub entry: Option<PathBuf>,
    pub mode: Option<String>,
    /// Explicit config file path (overrides auto-discovery).
    pub config: Option<PathBuf>,
}

/// Run the dev server on a single-threaded runtime until Ctrl+C.
pub fn run(action: DevAction) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;
    runtime.block_on(serve(action))
}

/// Merge the config file with command-line overrides.
pub fn resolve_config(action: &DevAction) -> Result<DevConfig> {
    let root = action.cwd.canonicalize().into_diagnostic()?;
    let mut config = DevConfig::load(&root, action.config.as_deref()).into_diagnostic()?;

    if let Some(port) = action.port {
        config = config.with_port(port);
    }
    if let Some(host) = &action.host {
        config = config.with_host(host.clone());
    }
    if let Some(deps_dir) = &action.deps_dir {
        config = config.with_deps_dir(deps_dir.clone());
    }
    if let Some(entry) = &action.entry {
        config = config.with_entry(entry.clone());
    }
    if let Some(mode) = &action.mode {
        config = config.with_mode(mode.clone());
    }
    Ok(config)
}

async fn serve(action: DevAction) -> Result<()> {
    let config = resolve_config(&action)?;

    let host_ip = if config.host == "localhost" {
        "127.0.0.1"
    } else {
        config.host.as_str()
    };
    let addr: SocketAddr = format!("{host_ip}:{}", config.port)
        .parse()
        .into_diagnostic()?;

    let server = Arc::new(DevServer::new(config));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()?;
    let local = listener.local_addr().into_diagnostic()?;

    let config = server.config();
    info!(
        address = %local,
        root = %config.root.display(),
        deps = %config.deps_path().display(),
        mode = %config.mode,
        "dev server listening"
    );
    println!();
    println!("  esmdev dev server running at http://{local}");
    println!("  Press Ctrl+C to stop");
    println!();

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    info!("dev server stopped");
    Ok(())
}

/// Every path goes through the dispatcher; there are no axum routes of its own.
pub fn router(server: Arc<DevServer>) -> Router {
    Router::new()
        .fallback(serve_request)
        .layer(CorsLayer::permissive())
        .with_state(server)
}

async fn serve_request(
    State(server): State<Arc<DevServer>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
            "method not allowed\n",
        )
            .into_response();
    }

    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string());
    let response = server.respond(&Request::from_uri(&target)).await;

    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [
            (header::CONTENT_TYPE, response.content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        response.body,
    )
        .into_response()
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        // Without a signal handler the server runs until killed.
        Err(_) => std::future::pending::<()>().await,
    }
}
