use crate::models::smart::{AttributeMetadata, AttributeSnapshot};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Protocol {
    #[serde(rename = "NVMe")]
    NVMe,
    #[serde(rename = "SATA")]
    Sata,
}

impl Protocol {
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::NVMe => "NVMe",
            Protocol::Sata => "SATA",
        }
    }
}

/// Identity of one monitored drive as reported by the monitoring service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Device {
    pub wwn:            String,
    pub model_name:     Option<String>,
    pub serial_number:  Option<String>,
    pub device_node:    Option<String>,
    /// Raw protocol tag (`device_protocol`), e.g. "NVMe" or "ATA".
    pub protocol_tag:   Option<String>,
    pub capacity_bytes: Option<u64>,
}

impl Device {
    #[cfg(test)]
    pub fn new(wwn: impl Into<String>) -> Self {
        Self { wwn: wwn.into(), ..Self::default() }
    }

    /// NVMe when the protocol tag says so or the model name mentions it.
    pub fn protocol(&self) -> Protocol {
        let tag   = self.protocol_tag.as_deref().unwrap_or("").to_lowercase();
        let model = self.model_name.as_deref().unwrap_or("").to_lowercase();
        if tag == "nvme" || model.contains("nvme") {
            Protocol::NVMe
        } else {
            Protocol::Sata
        }
    }

    /// Borrowed view of the fields the rule engine matches against.
    /// Absent fields match as empty strings.
    pub fn identity(&self) -> DeviceIdentity<'_> {
        DeviceIdentity {
            model:       self.model_name.as_deref().unwrap_or(""),
            serial:      self.serial_number.as_deref().unwrap_or(""),
            wwn:         &self.wwn,
            device_node: self.device_node.as_deref().unwrap_or(""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity<'a> {
    pub model:       &'a str,
    pub serial:      &'a str,
    pub wwn:         &'a str,
    pub device_node: &'a str,
}

/// Everything the service returns for one drive: identity, SMART history and
/// attribute display names.
#[derive(Debug, Clone, Default)]
pub struct DeviceEntry {
    pub device:        Device,
    pub smart_results: Vec<AttributeSnapshot>,
    pub metadata:      AttributeMetadata,
}

impl DeviceEntry {
    pub fn without_data(device: Device) -> Self {
        Self { device, smart_results: Vec::new(), metadata: AttributeMetadata::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_from_tag_or_model() {
        let mut dev = Device::new("0x5000");
        assert_eq!(dev.protocol(), Protocol::Sata);

        dev.protocol_tag = Some("NVMe".into());
        assert_eq!(dev.protocol(), Protocol::NVMe);

        dev.protocol_tag = Some("ATA".into());
        dev.model_name = Some("Samsung SSD 980 PRO NVMe".into());
        assert_eq!(dev.protocol(), Protocol::NVMe);
    }

    #[test]
    fn identity_defaults_absent_fields_to_empty() {
        let dev = Device::new("0xabc");
        let id = dev.identity();
        assert_eq!(id.model, "");
        assert_eq!(id.serial, "");
        assert_eq!(id.wwn, "0xabc");
        assert_eq!(id.device_node, "");
    }
}
