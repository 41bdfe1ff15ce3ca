//! Code for the configuration of the fleet.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::DeviceCapabilities;

/// The configuration of the fleet: every device the orchestrator may
/// route to, keyed by its stable identifier.
#[derive(Default, Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// The configured devices.
    pub devices: HashMap<String, DeviceConfig>,
}

impl Config {
    /// Parse a configuration from a toml file.
    pub fn from_file(file: &PathBuf) -> Result<Self> {
        let config = std::fs::read_to_string(file)?;
        Self::from_str(&config)
    }

    /// Parse a configuration from a toml string.
    pub fn from_str(config: &str) -> Result<Self> {
        Ok(toml::from_str(config)?)
    }
}

/// The configuration for a single device, tagged by its protocol.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceConfig {
    /// A broker-connected printer.
    Strata(crate::strata::Config),

    /// An http print host.
    Printhost(crate::printhost::Config),

    /// A multi-mode fabricator on the binary tcp protocol.
    Fablink(crate::fablink::Config),

    /// A no-op device for tests.
    Noop(crate::noop::Config),
}

impl DeviceConfig {
    /// The declared capabilities of this device.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        match self {
            DeviceConfig::Strata(config) => &config.capabilities,
            DeviceConfig::Printhost(config) => &config.capabilities,
            DeviceConfig::Fablink(config) => &config.capabilities,
            DeviceConfig::Noop(config) => &config.capabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{DeviceClass, JobMode};

    #[test]
    fn test_config_from_str_mixed_fleet() -> TestResult {
        let config = r#"
            [devices.workshop-small]
            type = "strata"
            host = "10.0.0.20"
            access_code = "12345678"
            serial = "STR-001"
            capabilities = { class = "strata", modes = ["additive-print"], envelope = { width = 250.0, depth = 250.0, height = 250.0 }, quality_tier = 3 }

            [devices.workshop-large]
            type = "printhost"
            endpoint = "http://10.0.0.21:7125"
            capabilities = { class = "print_host", modes = ["additive-print"], envelope = { width = 800.0, depth = 800.0, height = 800.0 }, quality_tier = 1 }

            [devices.mill]
            type = "fablink"
            host = "10.0.0.22"
            port = "not-a-port"
        "#;
        // The bad port must fail to parse, not panic.
        assert!(Config::from_str(config).is_err());

        let config = r#"
            [devices.workshop-small]
            type = "strata"
            host = "10.0.0.20"
            access_code = "12345678"
            serial = "STR-001"
            capabilities = { class = "strata", modes = ["additive-print"], envelope = { width = 250.0, depth = 250.0, height = 250.0 }, quality_tier = 3 }

            [devices.mill]
            type = "fablink"
            host = "10.0.0.22"
            port = 9400
            token = "secret"
            capabilities = { class = "fab_link", modes = ["subtractive-mill", "laser-etch"], envelope = { width = 600.0, depth = 600.0, height = 200.0 }, quality_tier = 2 }
        "#;
        let config = Config::from_str(config)?;
        assert_eq!(config.devices.len(), 2);

        let small = config.devices.get("workshop-small").unwrap();
        assert_eq!(small.capabilities().class, DeviceClass::Strata);
        assert!(small.capabilities().supports(JobMode::AdditivePrint));
        assert_eq!(small.capabilities().envelope.width, 250.0);

        let mill = config.devices.get("mill").unwrap();
        assert_eq!(mill.capabilities().class, DeviceClass::FabLink);
        assert!(mill.capabilities().supports(JobMode::LaserEtch));
        assert!(!mill.capabilities().supports(JobMode::AdditivePrint));
        Ok(())
    }

    #[test]
    fn test_config_round_trips() -> TestResult {
        let config = r#"
            [devices.bench]
            type = "noop"
            capabilities = { class = "noop", modes = ["additive-print"], envelope = { width = 100.0, depth = 100.0, height = 100.0 }, quality_tier = 1 }
        "#;
        let parsed = Config::from_str(config)?;
        let reparsed = Config::from_str(&toml::to_string(&parsed)?)?;
        assert_eq!(
            parsed.devices.get("bench").unwrap().capabilities(),
            reparsed.devices.get("bench").unwrap().capabilities()
        );
        Ok(())
    }
}
