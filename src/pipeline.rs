//! Snapshot → resolved attribute → rule-adjusted metric, per device.

use crate::collectors::scrutiny::encode_path_segment;
use crate::collectors::DeviceSource;
use crate::config::Thresholds;
use crate::error::Result;
use crate::models::device::DeviceEntry;
use crate::models::metric::{DeviceStatus, HistoryPoint, ResolvedMetric};
use crate::models::smart::{self, AttributeSnapshot};
use crate::rules::RuleStore;
use crate::util::attr_names::{SPARE_CANDIDATES, WEAR_CANDIDATES, WRITE_CANDIDATES};
use crate::util::convert::{
    is_hot, life_bar, project_eol, spare_reading, temp_bar, wear_reading, write_volume,
};
use crate::util::history;
use crate::util::human::{fmt_bytes, fmt_hours, fmt_temp, fmt_thousands, NO_DATA};
use crate::util::resolver::resolve;
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::thread;

/// Read-only inputs shared by every device's derivation.
#[derive(Debug, Clone, Copy)]
pub struct MetricContext<'a> {
    pub rules:      &'a RuleStore,
    pub thresholds: &'a Thresholds,
    pub base_url:   &'a str,
}

/// Derive the health record for one device from its latest snapshot.
/// Missing data yields `None` fields and "-" text, never an error.
pub fn derive_metric<Tz>(entry: &DeviceEntry, ctx: &MetricContext<'_>, now: DateTime<Tz>) -> ResolvedMetric
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let dev = &entry.device;
    let empty = AttributeSnapshot::default();
    let snap = smart::latest(&entry.smart_results).unwrap_or(&empty);
    let meta = &entry.metadata;
    let identity = dev.identity();

    let wear = resolve(snap, meta, WEAR_CANDIDATES)
        .and_then(|a| wear_reading(&a, &identity, ctx.rules));
    let writes = resolve(snap, meta, WRITE_CANDIDATES).and_then(|a| write_volume(&a));
    let spare = resolve(snap, meta, SPARE_CANDIDATES)
        .map(|a| spare_reading(&a))
        .unwrap_or_default();
    let eol = wear.as_ref().and_then(|w| project_eol(w, snap.power_on_hours, now));
    let temp = snap.temperature_c;

    ResolvedMetric {
        wwn:                dev.wwn.clone(),
        model:              dev.model_name.clone().unwrap_or_else(|| NO_DATA.to_string()),
        serial:             dev.serial_number.clone().unwrap_or_else(|| NO_DATA.to_string()),
        protocol:           dev.protocol(),
        status:             DeviceStatus::from_raw(snap.status.as_ref()),

        remaining_pct:      wear.map(|w| w.remaining),
        consumed_pct:       wear.map(|w| w.consumed),
        need_convert:       wear.is_some_and(|w| w.need_convert),
        invert_display:     wear.is_some_and(|w| w.invert_display),
        formatted_text:     wear.map(|w| w.text()).unwrap_or_else(|| NO_DATA.to_string()),
        life_bar_pct:       wear.map(|w| life_bar(w.remaining)),

        tbw_bytes:          writes.and_then(|w| w.bytes()),
        tbw_formatted:      writes.map(|w| w.formatted()).unwrap_or_else(|| NO_DATA.to_string()),

        eol_date:           eol.as_ref().and_then(|e| e.date.clone()),
        eol_days_remaining: eol.as_ref().map(|e| e.days),

        temperature_c:      temp,
        temp_label:         fmt_temp(temp),
        temp_bar_pct:       temp.map(|t| temp_bar(t, ctx.thresholds)),
        is_hot:             temp.is_some_and(|t| is_hot(t, ctx.thresholds)),

        spare_pct:          spare.value,
        spare_threshold:    spare.thresh,

        power_on_hours:     fmt_hours(snap.power_on_hours),
        power_cycle_count:  snap.power_cycle_count.map(fmt_thousands).unwrap_or_else(|| NO_DATA.to_string()),
        capacity:           fmt_bytes(dev.capacity_bytes.map(|c| c as f64)),
        detail_url:         format!("{}/web/device/{}", ctx.base_url, encode_path_segment(&dev.wwn)),
    }
}

/// Worst status first, then model, then WWN.
pub fn sort_for_display(metrics: &mut [ResolvedMetric]) {
    metrics.sort_by(|a, b| {
        b.status.weight.cmp(&a.status.weight)
            .then_with(|| a.model.cmp(&b.model))
            .then_with(|| a.wwn.cmp(&b.wwn))
    });
}

/// Fetch and derive every device in `source`, one worker thread per device.
///
/// A device whose details cannot be fetched (or whose worker panics) is
/// reported from its summary identity with no data.
pub fn derive_fleet(source: &dyn DeviceSource, ctx: &MetricContext<'_>) -> Result<Vec<ResolvedMetric>> {
    let summary = source.summary()?;
    let now = Local::now();

    let mut metrics: Vec<ResolvedMetric> = thread::scope(|s| {
        let workers: Vec<_> = summary.iter().map(|base| {
            let handle = s.spawn(move || {
                let entry = merge_details(base, source.details(&base.device.wwn));
                derive_metric(&entry, ctx, now)
            });
            (base, handle)
        }).collect();

        workers.into_iter().map(|(base, handle)| {
            handle.join().unwrap_or_else(|_| {
                log::warn!("metric worker for {} panicked; reporting without data", base.device.wwn);
                derive_metric(base, ctx, now)
            })
        }).collect()
    });

    sort_for_display(&mut metrics);
    log::info!("derived metrics for {} device(s)", metrics.len());
    Ok(metrics)
}

/// Prefer the details payload; fall back to summary identity fields it lacks.
fn merge_details(base: &DeviceEntry, fetched: Result<DeviceEntry>) -> DeviceEntry {
    match fetched {
        Ok(mut entry) => {
            let (d, b) = (&mut entry.device, &base.device);
            if d.model_name.is_none()     { d.model_name = b.model_name.clone(); }
            if d.serial_number.is_none()  { d.serial_number = b.serial_number.clone(); }
            if d.device_node.is_none()    { d.device_node = b.device_node.clone(); }
            if d.protocol_tag.is_none()   { d.protocol_tag = b.protocol_tag.clone(); }
            if d.capacity_bytes.is_none() { d.capacity_bytes = b.capacity_bytes; }
            if d.wwn.is_empty()           { d.wwn = b.wwn.clone(); }
            entry
        }
        Err(e) => {
            log::warn!("no details for {}: {}", base.device.wwn, e);
            DeviceEntry::without_data(base.device.clone())
        }
    }
}

/// Date-ascending history series for one device.
pub fn device_history(source: &dyn DeviceSource, wwn: &str) -> Result<Vec<HistoryPoint>> {
    let entry = source.details(wwn)?;
    Ok(history::aggregate(&entry.smart_results))
}
