//! SDCP Client Library
//!
//! A [`Session`] owns one persistent WebSocket connection to one printer: it
//! correlates responses with outstanding requests, caches the status and
//! attributes the printer pushes, and keeps both fresh in the background.
//! A [`Registry`] owns the set of live sessions keyed by mainboard id.
//!
//! # Example
//!
//! ```ignore
//! use sdcp_client::{Registry, SessionConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Registry::new(SessionConfig::default());
//!     let session = registry.register("A1B2", "10.0.0.5").await?;
//!
//!     let status = session.refresh_status_and_wait(&CancellationToken::new()).await?;
//!     println!("UV LED at {}°C", status.temp_of_uvled);
//!
//!     registry.close_all().await;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod cache;
pub mod error;
mod inflight;
pub mod registry;
pub mod session;

pub use builder::{SessionBuilder, SessionConfig};
pub use cache::StateCache;
pub use error::{ClientError, Result};
pub use registry::Registry;
pub use session::Session;

/// Re-exported so callers do not need a direct `tokio-util` dependency
pub use tokio_util::sync::CancellationToken;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::{SessionBuilder, SessionConfig};
    pub use crate::error::{ClientError, Result};
    pub use crate::registry::Registry;
    pub use crate::session::Session;
    pub use sdcp_core::{Attributes, Command, Status};
    pub use tokio_util::sync::CancellationToken;
}
