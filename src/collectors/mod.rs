pub mod scrutiny;
pub mod summary_file;

use crate::error::Result;
use crate::models::device::DeviceEntry;

/// Where device identities and SMART histories come from.
pub trait DeviceSource: Sync {
    /// Every known device, identity only.
    fn summary(&self) -> Result<Vec<DeviceEntry>>;

    /// Full SMART history and attribute metadata for one device.
    fn details(&self, wwn: &str) -> Result<DeviceEntry>;
}
