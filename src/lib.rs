//! rds-qa - Smoke-test harness for a managed RDS PostgreSQL instance.
//!
//! A [`Session`] looks up one instance by identifier in the RDS directory,
//! exposes its configuration through total accessors ([`Attributes`]), resolves
//! the instance's master-user credentials from Secrets Manager, and opens a
//! certificate-verified connection to run a single diagnostic query.
//!
//! # Features
//!
//! - **Lazy caching**: each remote lookup runs at most once per successful resolution
//! - **Total accessors**: probing a missing instance returns defaults, never errors
//! - **Fail-closed TLS**: connections always use `verify-full`
//! - **Pluggable backends**: AWS/Postgres in production, in-memory mocks in tests
//!
//! # Quick Start
//!
//! ```no_run
//! # #[cfg(all(feature = "aws", feature = "postgres"))]
//! # async fn run() -> rds_qa::Result<()> {
//! use rds_qa::checks::{run_checks, Expectations};
//! use rds_qa::{Config, Session};
//!
//! let config = Config::new()
//!     .with_region("eu-central-1")
//!     .with_ssl_root_cert("/etc/ssl/rds-global-bundle.pem");
//!
//! let mut session = Session::from_config(config).await;
//!
//! let report = run_checks(&mut session, &Expectations::default()).await;
//! println!("{}", report);
//!
//! let outcome = session.connect().await?;
//! assert!(outcome.is_verified());
//! # Ok(())
//! # }
//! ```
//!
//! # Backends
//!
//! | Backend | Feature Flag | Role |
//! |---------|-------------|------|
//! | Mock | `mock` (default) | In-memory directory, secret store, and driver |
//! | RDS + Secrets Manager | `aws` | SDK-based directory and secret store |
//! | PostgreSQL | `postgres` | sqlx driver with verify-full TLS |
//!
//! Enable everything needed for a live run with `full`:
//!
//! ```toml
//! [dependencies]
//! rds-qa = { version = "0.1", features = ["full"] }
//! ```

pub mod arn;
pub mod attributes;
pub mod backend;
pub mod backends;
pub mod cache;
pub mod checks;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod record;
pub mod secret;
pub mod session;

pub use attributes::{Attributes, NOT_REPORTED};
pub use backend::{Connector, DbConnection, Directory, SecretStore};
pub use config::Config;
pub use connection::{DiagnosticOutcome, StatementError};
pub use error::{QaError, Result};
pub use record::{EndpointInfo, InstanceRecord};
pub use secret::SecretPayload;
pub use session::Session;
