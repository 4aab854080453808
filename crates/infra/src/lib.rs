//! # OpenCircle Infra
//!
//! Infrastructure adapters for the OpenCircle client:
//! - HTTP stack (retrying reqwest wrapper, API client, account gateway)
//! - Periodic session check scheduler
//! - File-backed session persistence
//! - Configuration loading (environment + config files)
//!
//! ## Architecture
//! - Implements the ports defined in `opencircle-core`
//! - All I/O lives here; core and domain stay pure

pub mod api;
pub mod config;
pub mod http;
pub mod scheduling;
pub mod storage;

// Re-export commonly used items
pub use api::client::{ApiClient, ApiClientConfig};
pub use api::gateway::HttpAccountGateway;
pub use api::notifications::{Notification, NotificationCommands};
pub use http::client::{HttpClient, HttpClientBuilder};
pub use scheduling::session_scheduler::{SessionScheduler, SessionSchedulerConfig};
pub use scheduling::SchedulerError;
pub use storage::file_store::FileSessionStorage;
