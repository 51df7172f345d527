use crate::collectors::scrutiny::parse_entry;
use crate::collectors::DeviceSource;
use crate::error::{FetchError, Result};
use crate::models::device::DeviceEntry;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Offline source: a JSON object mapping WWN → `{device, smart_results, metadata}`.
#[derive(Debug, Clone, Default)]
pub struct SummaryFile {
    entries: Vec<DeviceEntry>,
}

impl SummaryFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let v: Value = serde_json::from_str(&text)?;
        let file = Self::from_value(&v);
        if file.is_empty() {
            log::warn!("no devices in {}", path.display());
        } else {
            log::info!("loaded {} device(s) from {}", file.len(), path.display());
        }
        Ok(file)
    }

    pub fn from_value(v: &Value) -> Self {
        let entries = v.as_object()
            .map(|m| m.iter().map(|(wwn, e)| parse_entry(e, wwn)).collect())
            .unwrap_or_default();
        Self { entries }
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl DeviceSource for SummaryFile {
    fn summary(&self) -> Result<Vec<DeviceEntry>> {
        Ok(self.entries.iter()
            .map(|e| DeviceEntry::without_data(e.device.clone()))
            .collect())
    }

    fn details(&self, wwn: &str) -> Result<DeviceEntry> {
        self.entries.iter()
            .find(|e| e.device.wwn == wwn)
            .cloned()
            .ok_or_else(|| FetchError::DeviceNotFound(wwn.to_string()))
    }
}
