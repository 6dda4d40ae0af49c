pub mod config_flow;
pub mod coordinator;
pub mod device_registry;
pub mod error;
pub mod sensor;
pub mod setup;

#[cfg(test)]
pub(crate) mod test_support;

pub use config_flow::{ConfigFlow, FlowResult, UserInput};
pub use coordinator::{CoordinatorState, DataUpdateCoordinator};
pub use device_registry::{DeviceEntry, DeviceRegistry};
pub use error::{SetupError, UpdateFailed};
pub use sensor::{MediaWikiSensor, SensorState};
pub use setup::{Hub, LoadedEntry};
