use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;

/// Overall SMART status as the service reports it: a numeric code or free text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawStatus {
    Code(f64),
    Text(String),
}

/// One attribute reading. Any field may be missing on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttrValue {
    pub raw_value: Option<f64>,
    pub value:     Option<f64>,
    pub thresh:    Option<f64>,
}

#[cfg(test)]
impl AttrValue {
    pub fn raw(raw_value: f64) -> Self {
        Self { raw_value: Some(raw_value), ..Self::default() }
    }

    pub fn normalized(value: f64) -> Self {
        Self { value: Some(value), ..Self::default() }
    }
}

/// One point-in-time SMART/NVMe reading for a device.
///
/// `attrs` is keyed by the attribute id as a string: numeric SATA ids
/// ("241") and semantic NVMe keys ("percentage_used") share one map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSnapshot {
    pub date:              Option<String>,
    pub status:            Option<RawStatus>,
    pub power_on_hours:    Option<f64>,
    pub power_cycle_count: Option<f64>,
    pub temperature_c:     Option<f64>,
    pub attrs:             HashMap<String, AttrValue>,
}

impl AttributeSnapshot {
    pub fn parsed_date(&self) -> Option<DateTime<FixedOffset>> {
        self.date.as_deref().and_then(parse_date)
    }

    /// Unix timestamp used to order snapshots; unparsable dates sort as the epoch.
    pub fn sort_key(&self) -> i64 {
        self.parsed_date().map(|d| d.timestamp()).unwrap_or(0)
    }

    pub fn attr(&self, id: &str) -> Option<&AttrValue> {
        self.attrs.get(id)
    }
}

/// Pick the most recent snapshot by parsed date. The first of several equal
/// dates wins.
pub fn latest(snapshots: &[AttributeSnapshot]) -> Option<&AttributeSnapshot> {
    snapshots.iter().fold(None, |best: Option<&AttributeSnapshot>, s| match best {
        Some(b) if b.sort_key() >= s.sort_key() => Some(b),
        _ => Some(s),
    })
}

/// Accepts RFC 3339, "YYYY-MM-DD HH:MM:SS", "YYYY-MM-DDTHH:MM:SS" and plain
/// "YYYY-MM-DD". Naive forms are taken as UTC.
pub fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc().fixed_offset())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub id:           String,
    pub display_name: String,
}

/// Attribute id → display name, in the order the service listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMetadata {
    pub entries: Vec<MetadataEntry>,
}

impl AttributeMetadata {
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn push(&mut self, id: impl Into<String>, display_name: impl Into<String>) {
        self.entries.push(MetadataEntry { id: id.into(), display_name: display_name.into() });
    }

    #[cfg(test)]
    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.display_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: Option<&str>, temp: f64) -> AttributeSnapshot {
        AttributeSnapshot {
            date: date.map(str::to_string),
            temperature_c: Some(temp),
            ..AttributeSnapshot::default()
        }
    }

    #[test]
    fn parses_supported_date_forms() {
        assert!(parse_date("2024-03-01T10:20:30Z").is_some());
        assert!(parse_date("2024-03-01T10:20:30.123456+09:00").is_some());
        assert!(parse_date("2024-03-01 10:20:30").is_some());
        assert_eq!(
            parse_date("2024-03-01").map(|d| d.date_naive().to_string()),
            Some("2024-03-01".to_string())
        );
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn latest_picks_max_date() {
        let snaps = vec![
            at(Some("2024-03-01T00:00:00Z"), 30.0),
            at(Some("2024-03-03T00:00:00Z"), 33.0),
            at(Some("2024-03-02T00:00:00Z"), 32.0),
        ];
        assert_eq!(latest(&snaps).and_then(|s| s.temperature_c), Some(33.0));
    }

    #[test]
    fn unparsable_date_sorts_as_epoch() {
        let snaps = vec![at(Some("garbage"), 1.0), at(Some("1971-01-01"), 2.0), at(None, 3.0)];
        assert_eq!(latest(&snaps).and_then(|s| s.temperature_c), Some(2.0));
        assert_eq!(snaps[0].sort_key(), 0);
    }

    #[test]
    fn latest_of_empty_is_none() {
        assert!(latest(&[]).is_none());
    }

    #[test]
    fn metadata_keeps_order_and_looks_up_names() {
        let mut meta = AttributeMetadata::default();
        meta.push("177", "Wear Leveling Count");
        meta.push("241", "Total LBAs Written");
        assert_eq!(meta.entries[0].id, "177");
        assert_eq!(meta.display_name("241"), Some("Total LBAs Written"));
        assert_eq!(meta.display_name("9"), None);
    }
}
