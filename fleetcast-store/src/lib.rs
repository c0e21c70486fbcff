pub mod app_config;
pub mod pending_store;
pub mod ride_log;
pub mod zones;

pub use pending_store::PendingStore;
pub use ride_log::RideLog;
pub use zones::ZoneRegistry;
