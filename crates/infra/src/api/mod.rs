//! Backend API adapters

pub mod client;
pub mod gateway;
pub mod notifications;

pub use client::{ApiClient, ApiClientConfig};
pub use gateway::HttpAccountGateway;
pub use notifications::{Notification, NotificationCommands};
