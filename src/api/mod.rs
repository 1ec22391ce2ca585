//! This mod is meant to hold most of the code for the library's client-facing API.
mod config;
mod event_bus;
mod options;
mod store;
mod wiring;

pub use config::ConfigError;
pub use config::CoordinatorLeaseConfig;
pub use config::NodeConfig;
pub use config::StaticLeaseConfig;
pub use event_bus::Event;
pub use event_bus::EventListener;
pub use event_bus::StoreRole;
pub use options::StoreOptions;
pub use options::StoreOptionsError;
pub use store::Store;
pub use store::StoreConfig;
pub use wiring::run_coordinator_server;
pub use wiring::try_create_node;
pub use wiring::CoordinatorServerHandle;
pub use wiring::Node;
pub use wiring::NodeCreationError;
