//! Turn resolved raw attributes into health metrics: wear polarity,
//! written bytes, spare area, gauge positions and end-of-life projection.

use crate::config::Thresholds;
use crate::models::device::DeviceIdentity;
use crate::rules::{RuleCategory, RuleStore};
use crate::util::attr_names::{
    is_data_units_written_name, is_host_writes_name, is_percentage_used_name,
    is_total_lbas_written_name, ID_TOTAL_LBAS_WRITTEN,
};
use crate::util::human::{fmt_gb_tb, fmt_thousands, NO_DATA};
use crate::util::resolver::ResolvedAttribute;
use chrono::{DateTime, TimeDelta, TimeZone};
use std::fmt::Display;

/// Bytes per NVMe data unit (1000 × 512).
pub const DATA_UNIT_BYTES: f64 = 512_000.0;
/// Bytes per logical block for LBA counters.
pub const LBA_BYTES: f64 = 512.0;

// ── Wear ─────────────────────────────────────────────────────────────

/// Remaining/consumed life after polarity correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WearReading {
    pub remaining:      u8,
    pub consumed:       u8,
    /// Raw value was read as percent consumed.
    pub need_convert:   bool,
    /// Text leads with the consumed figure.
    pub invert_display: bool,
}

impl WearReading {
    /// Apply polarity to a raw wear value. The raw value is clamped to
    /// 0..=100 and truncated.
    pub fn from_raw(raw: f64, need_convert: bool, invert_display: bool) -> Self {
        let raw = raw.clamp(0.0, 100.0) as u8;
        let remaining = if need_convert { 100 - raw } else { raw };
        Self { remaining, consumed: 100 - remaining, need_convert, invert_display }
    }

    pub fn text(&self) -> String {
        if self.invert_display {
            format!("consumed {}% (remaining {}%)", self.consumed, self.remaining)
        } else {
            format!("remaining {}% (consumed {}%)", self.remaining, self.consumed)
        }
    }
}

/// Interpret a resolved wear attribute for one device.
///
/// An attribute named "Percentage Used" is consumed life by definition and
/// forces both conversion and inverted display, whatever the rules say.
/// Otherwise conversion and display order come from independent rule
/// categories.
pub fn wear_reading(
    attr:  &ResolvedAttribute,
    id:    &DeviceIdentity<'_>,
    rules: &RuleStore,
) -> Option<WearReading> {
    let raw = attr.raw().filter(|r| r.is_finite())?;
    let is_pct_used = attr.name.as_deref().is_some_and(is_percentage_used_name);
    let need_convert   = is_pct_used || rules.matches(id, RuleCategory::Convert);
    let invert_display = is_pct_used || rules.matches(id, RuleCategory::DisplayInvert);
    Some(WearReading::from_raw(raw, need_convert, invert_display))
}

// ── Writes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteVolume {
    Bytes(f64),
    /// Vendor "Host Writes" counter with no known unit.
    RawCount(f64),
    /// Resolved, but the unit could not be determined.
    Unknown,
}

impl WriteVolume {
    pub fn bytes(&self) -> Option<f64> {
        match self {
            WriteVolume::Bytes(b) => Some(*b),
            _ => None,
        }
    }

    pub fn formatted(&self) -> String {
        match self {
            WriteVolume::Bytes(b)    => fmt_gb_tb(*b),
            WriteVolume::RawCount(n) => format!("{} (raw)", fmt_thousands(*n)),
            WriteVolume::Unknown     => NO_DATA.to_string(),
        }
    }
}

/// Convert a resolved write counter to bytes according to its name or id.
pub fn write_volume(attr: &ResolvedAttribute) -> Option<WriteVolume> {
    let raw = attr.raw().filter(|r| r.is_finite())?;
    let label = attr.label();
    Some(if is_data_units_written_name(&label) {
        WriteVolume::Bytes(raw * DATA_UNIT_BYTES)
    } else if is_total_lbas_written_name(&label) || attr.id == ID_TOTAL_LBAS_WRITTEN {
        WriteVolume::Bytes(raw * LBA_BYTES)
    } else if is_host_writes_name(&label) {
        WriteVolume::RawCount(raw)
    } else {
        WriteVolume::Unknown
    })
}

// ── Spare area ───────────────────────────────────────────────────────

/// Spare area as reported: normalized value and threshold, unconverted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpareReading {
    pub value:  Option<f64>,
    pub thresh: Option<f64>,
}

pub fn spare_reading(attr: &ResolvedAttribute) -> SpareReading {
    SpareReading { value: attr.value.value, thresh: attr.value.thresh }
}

// ── Gauges ───────────────────────────────────────────────────────────

/// Temperature gauge position, 0–100 across `temp_min..temp_max`.
pub fn temp_bar(temp_c: f64, thr: &Thresholds) -> f64 {
    let span = (thr.temp_max - thr.temp_min).max(1.0);
    ((temp_c - thr.temp_min) / span * 100.0).clamp(0.0, 100.0)
}

pub fn is_hot(temp_c: f64, thr: &Thresholds) -> bool {
    temp_c >= thr.temp_crit
}

pub fn life_bar(remaining: u8) -> f64 {
    (remaining as f64).clamp(0.0, 100.0)
}

// ── End of life ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct EolProjection {
    /// "YYYY-MM"; `None` when the projection overflows the calendar.
    pub date: Option<String>,
    pub days: f64,
}

/// Linear projection from the lifetime average wear rate: hours per
/// consumed percent times remaining percent. No smoothing or trend fit.
/// Requires some consumed life and some power-on time.
pub fn project_eol<Tz>(wear: &WearReading, power_on_hours: Option<f64>, now: DateTime<Tz>) -> Option<EolProjection>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let poh = power_on_hours.filter(|h| h.is_finite() && *h > 0.0)?;
    if wear.consumed == 0 {
        return None;
    }
    let hours_per_pct   = poh / wear.consumed as f64;
    let remaining_hours = wear.remaining as f64 * hours_per_pct;
    let days = remaining_hours / 24.0;

    let date = TimeDelta::try_seconds((days * 86_400.0) as i64)
        .and_then(|delta| now.checked_add_signed(delta))
        .map(|eol| eol.format("%Y-%m").to_string());
    Some(EolProjection { date, days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::smart::AttrValue;
    use chrono::Utc;

    fn attr(id: &str, name: Option<&str>, raw: f64) -> ResolvedAttribute {
        ResolvedAttribute { id: id.into(), name: name.map(str::to_string), value: AttrValue::raw(raw) }
    }

    fn dev() -> DeviceIdentity<'static> {
        DeviceIdentity { model: "M", serial: "S", wwn: "W", device_node: "/dev/sda" }
    }

    #[test]
    fn remaining_plus_consumed_is_100() {
        for raw in 0..=100 {
            for conv in [false, true] {
                let w = WearReading::from_raw(raw as f64, conv, false);
                assert_eq!(w.remaining as u32 + w.consumed as u32, 100);
            }
        }
    }

    #[test]
    fn raw_is_clamped_and_truncated() {
        assert_eq!(WearReading::from_raw(250.0, false, false).remaining, 100);
        assert_eq!(WearReading::from_raw(-5.0, false, false).remaining, 0);
        assert_eq!(WearReading::from_raw(97.9, false, false).remaining, 97);
    }

    #[test]
    fn percentage_used_overrides_rules() {
        let rules = RuleStore::parse("display_invert_model=Other\nconvert_model=Other");
        let w = wear_reading(&attr("202", Some("Percentage Used"), 3.0), &dev(), &rules).unwrap();
        assert!(w.need_convert);
        assert!(w.invert_display);
        assert_eq!(w.remaining, 97);
        assert_eq!(w.text(), "consumed 3% (remaining 97%)");

        let w = wear_reading(&attr("202", Some("PERCENTAGE USED"), 3.0), &dev(), &RuleStore::default()).unwrap();
        assert!(w.need_convert && w.invert_display);
    }

    #[test]
    fn convert_and_display_are_independent() {
        let plain = wear_reading(&attr("177", None, 90.0), &dev(), &RuleStore::default()).unwrap();
        assert_eq!(plain.text(), "remaining 90% (consumed 10%)");

        let conv = RuleStore::parse("convert_serial=S");
        let w = wear_reading(&attr("177", None, 90.0), &dev(), &conv).unwrap();
        assert_eq!(w.text(), "remaining 10% (consumed 90%)");

        let disp = RuleStore::parse("display_invert_wwn=W");
        let w = wear_reading(&attr("177", None, 90.0), &dev(), &disp).unwrap();
        assert!(!w.need_convert);
        assert_eq!(w.text(), "consumed 10% (remaining 90%)");
    }

    #[test]
    fn wear_reading_is_deterministic() {
        let rules = RuleStore::parse("convert_regex_model=/^M$/");
        let a = wear_reading(&attr("173", None, 42.0), &dev(), &rules);
        let b = wear_reading(&attr("173", None, 42.0), &dev(), &rules);
        assert_eq!(a, b);
    }

    #[test]
    fn write_units() {
        let v = write_volume(&attr("data_units_written", Some("Data Units Written"), 1.0)).unwrap();
        assert_eq!(v.bytes(), Some(512_000.0));

        let v = write_volume(&attr("241", Some("Total LBAs Written"), 1.0)).unwrap();
        assert_eq!(v.bytes(), Some(512.0));

        let v = write_volume(&attr("241", None, 1.0)).unwrap();
        assert_eq!(v.bytes(), Some(512.0));

        let v = write_volume(&attr("241", None, 2_147_483_648.0)).unwrap();
        assert_eq!(v.formatted(), "1024.0 GB (1.00 TB)");
    }

    #[test]
    fn host_writes_stay_raw() {
        let v = write_volume(&attr("246", Some("Host Writes"), 1_234_567.0)).unwrap();
        assert_eq!(v.bytes(), None);
        assert_eq!(v.formatted(), "1,234,567 (raw)");
    }

    #[test]
    fn unknown_write_unit() {
        let v = write_volume(&attr("999", Some("Mystery Counter"), 5.0)).unwrap();
        assert_eq!(v, WriteVolume::Unknown);
        assert_eq!(v.formatted(), "-");
    }

    #[test]
    fn gauges() {
        let thr = Thresholds::default();
        assert_eq!(temp_bar(45.0, &thr), 50.0);
        assert_eq!(temp_bar(10.0, &thr), 0.0);
        assert_eq!(temp_bar(90.0, &thr), 100.0);
        assert!(is_hot(65.0, &thr));
        assert!(!is_hot(64.9, &thr));
        assert_eq!(life_bar(87), 87.0);

        let flat = Thresholds { temp_min: 40.0, temp_max: 40.0, temp_crit: 65.0 };
        assert_eq!(temp_bar(40.5, &flat), 50.0);
    }

    #[test]
    fn eol_one_year_out() {
        let wear = WearReading::from_raw(50.0, false, false);
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let eol = project_eol(&wear, Some(8760.0), now).unwrap();
        assert!((eol.days - 365.0).abs() < 1e-9);
        assert_eq!(eol.date.as_deref(), Some("2026-01"));
    }

    #[test]
    fn eol_requires_wear_and_hours() {
        let now = Utc::now();
        let fresh = WearReading::from_raw(100.0, false, false);
        assert!(project_eol(&fresh, Some(1000.0), now).is_none());

        let worn = WearReading::from_raw(60.0, false, false);
        assert!(project_eol(&worn, None, now).is_none());
        assert!(project_eol(&worn, Some(0.0), now).is_none());
    }

    #[test]
    fn eol_overflow_keeps_days() {
        let wear = WearReading::from_raw(99.0, false, false);
        let eol = project_eol(&wear, Some(1e15), Utc::now()).unwrap();
        assert!(eol.date.is_none());
        assert!(eol.days > 0.0);
    }

    #[test]
    fn spare_is_verbatim() {
        let a = ResolvedAttribute {
            id: "available_spare".into(),
            name: None,
            value: AttrValue { raw_value: None, value: Some(100.0), thresh: Some(10.0) },
        };
        assert_eq!(spare_reading(&a), SpareReading { value: Some(100.0), thresh: Some(10.0) });
    }
}
