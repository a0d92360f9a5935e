//! Common library for the Campus Market services
//!
//! This crate provides infrastructure shared by the workspace: PostgreSQL
//! connectivity, the Redis cache client, cancel-and-replace debouncing and
//! the error types that go with them.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod debounce;
pub mod error;
