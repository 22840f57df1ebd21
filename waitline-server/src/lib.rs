//! Waitline Server - restaurant waitlist queue engine
//!
//! Customers check in (at the host stand, a kiosk, or their phone), receive
//! a ticket number and an opaque personal token, and move through a strict
//! lifecycle: `waiting -> notified -> seated`, with `archived` and
//! `cancelled` as the other exits. Queue positions and wait estimates are
//! always derived by query, never stored.
//!
//! # Module structure
//!
//! ```text
//! waitline-server/src/
//! ├── core/      # config, state, HTTP server
//! ├── storage/   # redb persistence, atomic ticket counters
//! ├── queue/     # manager (lifecycle), estimator, read-side views
//! ├── notify/    # provider abstraction, quota, dispatch service
//! ├── bus/       # advisory fan-out pub/sub
//! ├── auth/      # operator JWT
//! ├── api/       # HTTP routes and handlers
//! └── utils/     # errors, logging, tokens, validation
//! ```

pub mod api;
pub mod auth;
pub mod bus;
pub mod core;
pub mod notify;
pub mod queue;
pub mod storage;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use bus::FanoutBus;
pub use core::{Config, Server, ServerState};
pub use notify::NotifierService;
pub use queue::WaitlistManager;
pub use storage::WaitlistStorage;
pub use utils::{AppError, AppResult};

pub use utils::logger::init_logger_with_file;

/// Load `.env`, ensure the working directory layout exists, start logging
pub fn setup_environment() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/waitline".into());
    let log_dir = std::path::Path::new(&work_dir).join("logs");
    std::fs::create_dir_all(&log_dir)?;

    init_logger_with_file(None, log_dir.to_str());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
 _      __      _ __  __
| | /| / /___ _(_) /_/ /(_)___  ___
| |/ |/ // _ `/ / __/ // / _ \/ -_)
|__/|__/ \_,_/_/\__/_//_/_//_/\__/
    "#
    );
}
