//! Session lifecycle: store, ports, and backend reconciliation

pub mod ports;
pub mod store;
pub mod validator;

pub use ports::{AccountGateway, NoopRequestCache, RequestCache, SessionStorage};
pub use store::AuthStore;
pub use validator::{FailurePolicy, SessionValidation, SessionValidator};
