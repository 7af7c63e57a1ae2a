pub mod app;
pub mod clients;
pub mod config;
mod error;
pub mod issuer;
pub mod utils;
pub mod web;

// re-exports
pub use app::{App, AppState};
pub use error::{Error, Result};
pub use web::serve;

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "vouchomat=debug,tower_http=debug";

/// Human readable output for development, filtered by `RUST_LOG` if set.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES)),
        )
        .compact()
        .init();
}

/// One JSON object per event, for log collectors.
pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vouchomat=info")),
        )
        .json()
        .init();
}
