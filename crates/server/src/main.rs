// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod caller;
mod directory;
mod error;
mod reconciler;
mod routes;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::Parser;
use company_assoc_api::NotificationTransport;
use company_assoc_persistence::Persistence;
use tokio::sync::Mutex;
use tracing::info;

use crate::directory::{DirectoryFile, TracingTransport};

/// Company Associations Server - HTTP server for user/company associations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// `MySQL`/`MariaDB` connection URL. Requires the `mysql` feature.
    #[arg(long, conflicts_with = "database")]
    mysql_url: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// JSON file of users and companies backing the identity and company lookups.
    #[arg(long)]
    directory: Option<String>,

    /// Seconds between migration reconciliation runs. 0 disables them.
    #[arg(long, default_value_t = 0)]
    reconcile_interval_secs: u64,

    /// Migrated associations examined per reconciliation page.
    #[arg(long, default_value_t = 50)]
    reconcile_page_size: i64,
}

/// Application state shared across handlers.
///
/// The store sits behind a Mutex; every api call runs with it held.
#[derive(Clone)]
pub struct AppState {
    /// The association store.
    pub persistence: Arc<Mutex<Persistence>>,
    /// Identity and company lookups.
    pub directory: Arc<DirectoryFile>,
    /// Outbound email.
    pub transport: Arc<dyn NotificationTransport + Send + Sync>,
    /// Page size for reconciliation runs triggered over HTTP.
    pub reconcile_page_size: i64,
}

#[cfg(feature = "mysql")]
fn open_mysql(url: &str) -> Result<Persistence, Box<dyn std::error::Error>> {
    info!("Using MySQL database");
    Ok(Persistence::new_with_mysql(url)?)
}

#[cfg(not(feature = "mysql"))]
fn open_mysql(_url: &str) -> Result<Persistence, Box<dyn std::error::Error>> {
    Err("--mysql-url requires the server to be built with the 'mysql' feature".into())
}

fn open_persistence(args: &Args) -> Result<Persistence, Box<dyn std::error::Error>> {
    if let Some(url) = &args.mysql_url {
        return open_mysql(url);
    }

    if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Ok(Persistence::new_with_file(db_path)?)
    } else {
        info!("Using in-memory database");
        Ok(Persistence::new_in_memory()?)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Company Associations Server");

    let persistence: Persistence = open_persistence(&args)?;

    let directory: DirectoryFile = match &args.directory {
        Some(path) => {
            let directory = DirectoryFile::load(path)?;
            info!(
                path = %path,
                users = directory.users.len(),
                companies = directory.companies.len(),
                "Loaded directory"
            );
            directory
        }
        None => {
            info!("No directory file given, every lookup will miss");
            DirectoryFile::default()
        }
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        directory: Arc::new(directory),
        transport: Arc::new(TracingTransport),
        reconcile_page_size: args.reconcile_page_size,
    };

    if args.reconcile_interval_secs > 0 {
        reconciler::spawn_periodic(
            app_state.clone(),
            Duration::from_secs(args.reconcile_interval_secs),
            args.reconcile_page_size,
        );
    }

    // Build router
    let app: Router = routes::build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
