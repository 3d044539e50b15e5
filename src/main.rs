use anyhow::{Context, Result};
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use s3_file_manager::{
    config,
    models::entry::format_size,
    routes,
    services::{
        navigator::{NodeState, TreeNavigator},
        store::S3Store,
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Load .env before reading configuration ---
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config + tree flag ---
    let (cfg, tree) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting s3-file-manager with config: {:?}", cfg);

    // --- Initialize object store ---
    let s3 = S3Store::new(&cfg.s3);
    tracing::info!("Using bucket {}", s3.bucket());
    let app_state = AppState::new(Arc::new(s3));

    // --- Handle tree mode ---
    if let Some(mode) = tree {
        print_tree(&app_state, mode.depth).await?;
        return Ok(()); // exit after printing
    }

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(app_state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Walk the bucket with the tree navigator and print it, `depth` folder
/// levels deep.
async fn print_tree(app_state: &AppState, depth: usize) -> Result<()> {
    let navigator = TreeNavigator::start(app_state.resolver.clone(), app_state.issuer.clone())
        .await
        .context("listing bucket root")?;

    for (folder, err) in navigator.expand_to_depth(depth).await {
        tracing::warn!("Could not list {}: {}", folder, err);
    }

    let rows = navigator.rows();
    if rows.is_empty() {
        println!("(empty)");
    }
    for row in rows {
        let indent = "  ".repeat(row.depth);
        let name = row.entry.display_name();
        match (&row.state, row.entry.size) {
            (Some(NodeState::Failed(_)), _) => println!("{indent}{name}/  (unavailable)"),
            (Some(_), _) => println!("{indent}{name}/"),
            (None, Some(size)) if size > 0 => println!("{indent}{name}  ({})", format_size(size)),
            (None, _) => println!("{indent}{name}"),
        }
    }

    Ok(())
}
