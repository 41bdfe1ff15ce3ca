use std::path::Path;

use crate::{Control as ControlTrait, DeviceCapabilities, DeviceStatus, Error, JobSpec};

/// AnyDriver is any supported device driver behind one concrete type,
/// so the registry can hold a mixed fleet in one map.
pub enum AnyDriver {
    /// Broker-connected printer.
    Strata(crate::strata::Driver),

    /// Stateless http print host.
    PrintHost(crate::printhost::Driver),

    /// Multi-mode fabricator on the binary tcp protocol.
    FabLink(crate::fablink::Driver),

    /// No-op device.
    Noop(crate::noop::Noop),
}

impl std::fmt::Debug for AnyDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strata(_) => f.write_str("Strata"),
            Self::PrintHost(_) => f.write_str("PrintHost"),
            Self::FabLink(_) => f.write_str("FabLink"),
            Self::Noop(_) => f.write_str("Noop"),
        }
    }
}

macro_rules! def_driver_stubs {
    ($name:ident($driver:path)) => {
        impl From<$driver> for AnyDriver {
            fn from(driver: $driver) -> Self {
                Self::$name(driver)
            }
        }
    };
}

def_driver_stubs!(Strata(crate::strata::Driver));
def_driver_stubs!(PrintHost(crate::printhost::Driver));
def_driver_stubs!(FabLink(crate::fablink::Driver));
def_driver_stubs!(Noop(crate::noop::Noop));

macro_rules! for_all {
    (|$slf:ident, $driver:ident| $body:block) => {
        match $slf {
            Self::Strata($driver) => $body,
            Self::PrintHost($driver) => $body,
            Self::FabLink($driver) => $body,
            Self::Noop($driver) => $body,
        }
    };
}

impl ControlTrait for AnyDriver {
    type Error = Error;

    fn capabilities(&self) -> &DeviceCapabilities {
        for_all!(|self, driver| { driver.capabilities() })
    }

    async fn connect(&mut self) -> Result<(), Error> {
        for_all!(|self, driver| { driver.connect().await })
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        for_all!(|self, driver| { driver.disconnect().await })
    }

    async fn status(&mut self) -> Result<DeviceStatus, Error> {
        for_all!(|self, driver| { driver.status().await })
    }

    async fn upload_file(&mut self, path: &Path) -> Result<String, Error> {
        for_all!(|self, driver| { driver.upload_file(path).await })
    }

    async fn start_job(&mut self, job: &JobSpec) -> Result<(), Error> {
        for_all!(|self, driver| { driver.start_job(job).await })
    }

    async fn pause(&mut self) -> Result<(), Error> {
        for_all!(|self, driver| { driver.pause().await })
    }

    async fn resume(&mut self) -> Result<(), Error> {
        for_all!(|self, driver| { driver.resume().await })
    }

    async fn cancel(&mut self) -> Result<(), Error> {
        for_all!(|self, driver| { driver.cancel().await })
    }
}
