//! Device registry: the authoritative map of every configured device.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{AnyDriver, Config, Control as ControlTrait, DeviceCapabilities, DeviceConfig, Error};

/// Holds one driver per configured device, keyed by the device's stable
/// identifier. Drivers sit behind an async [Mutex] so that at most one
/// job sequence talks to a device at a time; capabilities are kept
/// alongside so routing never has to lock a driver.
pub struct Registry {
    drivers: HashMap<String, Arc<Mutex<AnyDriver>>>,
    capabilities: HashMap<String, DeviceCapabilities>,
}

impl Registry {
    /// Build a registry from a parsed fleet configuration. Does not
    /// connect to any device.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self {
            drivers: HashMap::new(),
            capabilities: HashMap::new(),
        };
        for (id, device) in &config.devices {
            let driver: AnyDriver = match device {
                DeviceConfig::Strata(config) => crate::strata::Driver::new(config.clone()).into(),
                DeviceConfig::Printhost(config) => {
                    crate::printhost::Driver::new(config.clone()).into()
                }
                DeviceConfig::Fablink(config) => crate::fablink::Driver::new(config.clone()).into(),
                DeviceConfig::Noop(config) => crate::noop::Noop::new(config.clone()).into(),
            };
            registry.insert(id.clone(), driver);
        }
        registry
    }

    /// Register one driver under an identifier. Replaces any existing
    /// entry with the same id.
    pub fn insert(&mut self, id: String, driver: AnyDriver) {
        self.capabilities.insert(id.clone(), driver.capabilities().clone());
        self.drivers.insert(id, Arc::new(Mutex::new(driver)));
    }

    /// The driver for a device, or [Error::UnknownDevice].
    pub fn get_driver(&self, id: &str) -> Result<Arc<Mutex<AnyDriver>>, Error> {
        self.drivers
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownDevice(id.to_owned()))
    }

    /// The declared capabilities of a device, or [Error::UnknownDevice].
    pub fn capabilities(&self, id: &str) -> Result<&DeviceCapabilities, Error> {
        self.capabilities
            .get(id)
            .ok_or_else(|| Error::UnknownDevice(id.to_owned()))
    }

    /// All device identifiers, sorted for stable iteration.
    pub fn list_devices(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.drivers.keys().cloned().collect();
        ids.sort();
        ids
    }
}
