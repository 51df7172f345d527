use crate::collectors::DeviceSource;
use crate::config::GeneralConfig;
use crate::error::{FetchError, Result};
use crate::models::device::{Device, DeviceEntry};
use crate::models::smart::{AttrValue, AttributeMetadata, AttributeSnapshot, RawStatus};
use serde_json::Value;
use std::collections::HashMap;
use std::process::Command;
use std::thread;
use std::time::Duration;

/// Client for the Scrutiny REST API. Requests go through the `curl` binary.
#[derive(Debug, Clone)]
pub struct ScrutinyClient {
    pub base:    String,
    pub timeout: Duration,
    pub retry:   u32,
    pub backoff: Duration,
}

impl ScrutinyClient {
    pub fn new(base: &str, general: &GeneralConfig) -> Self {
        Self {
            base:    crate::config::normalize_base_url(base),
            timeout: general.timeout(),
            retry:   general.retry,
            backoff: general.backoff(),
        }
    }

    pub fn summary_url(&self) -> String {
        format!("{}/api/summary", self.base)
    }

    pub fn details_url(&self, wwn: &str) -> String {
        format!("{}/api/device/{}/details", self.base, encode_path_segment(wwn))
    }

    /// GET `url` and parse JSON, making `retry + 1` attempts with a fixed
    /// pause between them.
    pub fn get_json(&self, url: &str) -> Result<Value> {
        let attempts = self.retry.saturating_add(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match self.get_once(url) {
                Ok(v) => return Ok(v),
                Err(e) => {
                    log::warn!("GET {} attempt {}/{} failed: {}", url, attempt, attempts, e);
                    last_err = Some(e);
                    if attempt < attempts {
                        thread::sleep(self.backoff);
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| FetchError::Transport {
            url:    url.to_string(),
            reason: "no attempt made".to_string(),
        }))
    }

    fn get_once(&self, url: &str) -> Result<Value> {
        let secs = self.timeout.as_secs().max(1).to_string();
        let out = Command::new("curl")
            .args([
                "-s", "-L",
                "--connect-timeout", &secs,
                "--max-time", &secs,
                "-H", "Accept: application/json",
                "-w", "\n%{http_code}",
                url,
            ])
            .output()
            .map_err(|e| FetchError::Transport { url: url.to_string(), reason: e.to_string() })?;

        if !out.status.success() {
            let reason = String::from_utf8_lossy(&out.stderr).trim().to_string();
            let reason = if reason.is_empty() { format!("curl exited with {}", out.status) } else { reason };
            return Err(FetchError::Transport { url: url.to_string(), reason });
        }

        let (body, code) = split_status_line(&out.stdout);
        if !(200..300).contains(&code) {
            return Err(FetchError::Status { url: url.to_string(), code });
        }
        Ok(serde_json::from_slice(body)?)
    }
}

impl DeviceSource for ScrutinyClient {
    fn summary(&self) -> Result<Vec<DeviceEntry>> {
        let v = self.get_json(&self.summary_url())?;
        Ok(parse_summary(&v))
    }

    fn details(&self, wwn: &str) -> Result<DeviceEntry> {
        let v = self.get_json(&self.details_url(wwn))?;
        Ok(parse_details(&v, wwn))
    }
}

/// curl's `-w "\n%{http_code}"` appends the status on its own final line.
fn split_status_line(stdout: &[u8]) -> (&[u8], u16) {
    match stdout.iter().rposition(|b| *b == b'\n') {
        Some(i) => {
            let code = std::str::from_utf8(&stdout[i + 1..])
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0);
            (&stdout[..i], code)
        }
        None => (stdout, 0),
    }
}

pub fn encode_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

// ── Wire parsing ─────────────────────────────────────────────────────

/// A JSON number, or a string that parses as one.
pub fn loose_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn loose_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

static NULL: Value = Value::Null;

fn first<'a>(v: &'a Value, keys: &[&str]) -> &'a Value {
    keys.iter().map(|k| &v[*k]).find(|x| !x.is_null()).unwrap_or(&NULL)
}

pub fn parse_device(v: &Value) -> Device {
    Device {
        wwn:            loose_string(&v["wwn"]).unwrap_or_default(),
        model_name:     loose_string(&v["model_name"]),
        serial_number:  loose_string(&v["serial_number"]),
        device_node:    loose_string(first(v, &["device_node", "device_name"])),
        protocol_tag:   loose_string(&v["device_protocol"]),
        capacity_bytes: loose_number(&v["capacity"]).filter(|c| *c >= 0.0).map(|c| c as u64),
    }
}

fn parse_attr(v: &Value) -> AttrValue {
    AttrValue {
        raw_value: loose_number(&v["raw_value"]),
        value:     loose_number(&v["value"]),
        thresh:    loose_number(first(v, &["thresh", "threshold"])),
    }
}

pub fn parse_snapshot(v: &Value) -> AttributeSnapshot {
    let status = match first(v, &["Status", "status"]) {
        Value::Number(n) => n.as_f64().map(RawStatus::Code),
        Value::String(s) => Some(RawStatus::Text(s.clone())),
        _ => None,
    };
    let attrs: HashMap<String, AttrValue> = v["attrs"].as_object()
        .map(|m| m.iter()
            .filter(|(_, a)| a.is_object())
            .map(|(k, a)| (k.clone(), parse_attr(a)))
            .collect())
        .unwrap_or_default();

    AttributeSnapshot {
        date:              loose_string(first(v, &["date", "collector_date"])),
        status,
        power_on_hours:    loose_number(&v["power_on_hours"]),
        power_cycle_count: loose_number(&v["power_cycle_count"]),
        temperature_c:     loose_number(first(v, &["temp", "temperature"])),
        attrs,
    }
}

/// Metadata object in document order; entries without a display name are
/// dropped.
pub fn parse_metadata(v: &Value) -> AttributeMetadata {
    let mut meta = AttributeMetadata::default();
    if let Some(m) = v.as_object() {
        for (id, entry) in m {
            if let Some(name) = entry["display_name"].as_str() {
                meta.push(id.clone(), name);
            }
        }
    }
    meta
}

/// One `{device, smart_results, metadata}` object.
pub fn parse_entry(v: &Value, wwn: &str) -> DeviceEntry {
    let mut device = parse_device(&v["device"]);
    if device.wwn.is_empty() {
        device.wwn = wwn.to_string();
    }
    let smart_results = v["smart_results"].as_array()
        .map(|a| a.iter().filter(|s| s.is_object()).map(parse_snapshot).collect())
        .unwrap_or_default();
    DeviceEntry { device, smart_results, metadata: parse_metadata(&v["metadata"]) }
}

/// `/api/summary`: `data.summary` or `summary`, keyed by WWN.
pub fn parse_summary(v: &Value) -> Vec<DeviceEntry> {
    let summary = first(&v["data"], &["summary"]);
    let summary = if summary.is_null() { &v["summary"] } else { summary };
    let Some(map) = summary.as_object() else { return Vec::new() };

    map.iter().filter_map(|(key, entry)| {
        let wwn = if key.is_empty() {
            loose_string(&entry["device"]["wwn"])?
        } else {
            key.clone()
        };
        let mut device = parse_device(&entry["device"]);
        device.wwn = wwn;
        Some(DeviceEntry::without_data(device))
    }).collect()
}

/// `/api/device/{wwn}/details`: payload under `data`, metadata under
/// `data.metadata` or top-level `metadata`.
pub fn parse_details(v: &Value, wwn: &str) -> DeviceEntry {
    let data = &v["data"];
    let mut entry = parse_entry(data, wwn);
    if entry.metadata.is_empty() {
        entry.metadata = parse_metadata(&v["metadata"]);
    }
    entry
}
