//! ServerBuilder for fluent API to build HTTP servers

use super::rest::{assessment_routes, entity_routes};
use crate::core::record::Record;
use crate::core::repository::Repository;
use crate::core::store::RecordStore;
use crate::entities::Assessment;
use anyhow::Result;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for creating HTTP servers from repositories
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_repository(aircraft_repository)
///     .with_repository(flight_repository)
///     .with_custom_routes(auth_routes)
///     .build();
/// ```
pub struct ServerBuilder {
    resources: Vec<&'static str>,
    routers: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
            routers: Vec::new(),
        }
    }

    /// Expose the list, get and delete routes of a repository
    pub fn with_repository<T, S>(mut self, repository: Repository<T, S>) -> Self
    where
        T: Record,
        S: RecordStore<T> + 'static,
    {
        self.resources.push(T::resource_name());
        self.routers.push(entity_routes(repository));
        self
    }

    /// Expose assessments, whose delete route retires instead of removing
    pub fn with_assessments<S>(mut self, repository: Repository<Assessment, S>) -> Self
    where
        S: RecordStore<Assessment> + 'static,
    {
        self.resources.push(Assessment::resource_name());
        self.routers.push(assessment_routes(repository));
        self
    }

    /// Add custom routes to the server
    ///
    /// Typically the authentication layer's own endpoints, or a middleware
    /// that inserts the `AuthContext` extension.
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.routers.push(routes);
        self
    }

    /// Resource names registered so far
    pub fn resources(&self) -> &[&'static str] {
        &self.resources
    }

    /// Build the complete router
    ///
    /// Includes `/health` and `/healthz` and an HTTP trace layer.
    pub fn build(self) -> Router {
        tracing::info!(resources = ?self.resources, "building router");

        let mut app = Router::new()
            .route("/health", get(health_check))
            .route("/healthz", get(health_check));

        for router in self.routers {
            app = app.merge(router);
        }

        app.layer(TraceLayer::new_for_http())
    }

    /// Serve the application with graceful shutdown
    ///
    /// Stops on SIGTERM or Ctrl+C after in-flight requests complete.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
