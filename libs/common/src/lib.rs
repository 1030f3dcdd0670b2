//! Common library for the Tubely upload service
//!
//! This crate provides shared functionality used across the services,
//! including settings loading, database connectivity and error types.
//!
//! ```rust,no_run
//! use common::database::{health_check, init_pool};
//! use common::settings::Settings;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load()?;
//!     let pool = init_pool(&settings.database).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod settings;
