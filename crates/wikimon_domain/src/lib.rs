pub mod device;
pub mod entry;
pub mod sensor;
pub mod types;

pub use device::{DeviceEntryType, DeviceInfo};
pub use entry::{ConfigEntry, EntryData, InstanceConfig};
pub use sensor::{SENSOR_DESCRIPTIONS, SensorDescription, SensorValue};
pub use types::{DOMAIN, FALLBACK_UPDATE_INTERVAL, Instance, Snapshot};
