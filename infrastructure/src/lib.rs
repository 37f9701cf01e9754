//! Infrastructure layer: adapters for the application ports.
//!
//! Everything here implements a trait from `planwright_application::ports`
//! against something concrete: the filesystem, a child process, tokio
//! channels.

pub mod config;
pub mod context;
pub mod diff;
pub mod events;
pub mod gateway;
pub mod store;

pub use config::{ConfigLoader, FileConfig};
pub use context::LocalFileContext;
pub use diff::GatewayDiffApplier;
pub use events::RuntimeBridgePublisher;
pub use gateway::CommandLlmGateway;
pub use store::JsonStateStore;
