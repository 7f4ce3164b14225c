pub mod app;
pub mod config;
pub mod routes;

#[cfg(test)]
mod test_util;

use app::App;
use profiles_domain::fixture::{self, SeedUsers};

use anyhow::Context;
use entrait::Impl;
use std::path::Path;
use tower::ServiceBuilder;

pub async fn serve(app: App) -> anyhow::Result<()> {
    let listen_addr = app.config.listen_addr;

    let router = routes::api_router().layer(
        ServiceBuilder::new()
            .layer(axum::extract::Extension(Impl::new(app)))
            // Enables logging. Use `RUST_LOG=tower_http=debug`
            .layer(tower_http::trace::TraceLayer::new_for_http()),
    );

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to listen on {listen_addr}"))?;

    tracing::info!(%listen_addr, "listening");

    axum::serve(listener, router)
        .await
        .context("error running HTTP server")
}

/// Create the users listed in a fixture file. Returns how many were new.
pub async fn seed_fixtures(app: &Impl<App>, path: &Path) -> anyhow::Result<usize> {
    let fixtures = fixture::load_fixtures(path)?;
    let created = app.seed_users(fixtures).await?;

    tracing::info!(created, path = %path.display(), "loaded fixtures");
    Ok(created)
}
