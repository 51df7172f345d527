use crate::models::metric::{FleetStats, ResolvedMetric};
use crate::util::human::{fmt_pct, fmt_temp, fmt_thousands, NO_DATA};

/// Generate a human-readable wear report to a String.
pub fn generate(metrics: &[ResolvedMetric], stats: &FleetStats) -> String {
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let mut out = String::new();

    out.push_str("═══════════════════════════════════════════════\n");
    out.push_str(&format!("  Drive Life Report  {}\n", now));
    out.push_str("═══════════════════════════════════════════════\n\n");

    // ── Fleet ──────────────────────────────────────────────────────────
    out.push_str("── Fleet ──────────────────────────────────────\n");
    out.push_str(&format!(
        "  Devices: {}   OK: {}   WARN: {}   FAIL: {}\n",
        stats.total, stats.ok, stats.warn, stats.fail
    ));
    out.push_str(&format!(
        "  Avg temp: {}   Avg life: {}\n\n",
        fmt_temp(stats.avg_temp_c), fmt_pct(stats.avg_life_pct)
    ));

    // ── Devices ────────────────────────────────────────────────────────
    out.push_str(&format!("── Devices ({}) ────────────────────────────────\n", metrics.len()));
    if metrics.is_empty() {
        out.push_str("  (no devices reported)\n");
    }
    for m in metrics {
        out.push_str(&format!(
            "  [{}]  {:4}  {}  ({})\n",
            m.status.class.label(), m.protocol.label(), m.model, m.serial
        ));
        out.push_str(&format!("  WWN: {}   Capacity: {}\n", m.wwn, m.capacity));
        out.push_str(&format!("  Life: {}\n", m.formatted_text));
        out.push_str(&format!("  Written: {}\n", m.tbw_formatted));

        let eol = match (&m.eol_date, m.eol_days_remaining) {
            (Some(date), Some(days)) => format!("{} ({} days left)", date, fmt_thousands(days)),
            (None, Some(days))       => format!("{} days left", fmt_thousands(days)),
            _                        => NO_DATA.to_string(),
        };
        let hot = if m.is_hot { "  HOT" } else { "" };
        out.push_str(&format!("  Temp: {}{}   EOL: {}\n", m.temp_label, hot, eol));

        if m.spare_pct.is_some() {
            out.push_str(&format!(
                "  Spare: {} (threshold {})\n",
                fmt_pct(m.spare_pct), fmt_pct(m.spare_threshold)
            ));
        }
        out.push_str(&format!(
            "  POH: {}   Power cycles: {}\n",
            m.power_on_hours, m.power_cycle_count
        ));
        out.push_str(&format!("  {}\n\n", m.detail_url));
    }

    out.push_str("═══════════════════════════════════════════════\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::Protocol;
    use crate::models::metric::{DeviceStatus, StatusClass};

    fn metric() -> ResolvedMetric {
        ResolvedMetric {
            wwn:                "0x5000".into(),
            model:              "CT500MX500SSD1".into(),
            serial:             "1234ABCD".into(),
            protocol:           Protocol::Sata,
            status:             DeviceStatus { text: "WARN".into(), class: StatusClass::Warn, weight: 1 },
            remaining_pct:      Some(90),
            consumed_pct:       Some(10),
            need_convert:       true,
            invert_display:     false,
            formatted_text:     "remaining 90% (consumed 10%)".into(),
            life_bar_pct:       Some(90.0),
            tbw_bytes:          None,
            tbw_formatted:      "-".into(),
            eol_date:           Some("2031-04".into()),
            eol_days_remaining: Some(2300.4),
            temperature_c:      Some(68.0),
            temp_label:         "68°C".into(),
            temp_bar_pct:       Some(96.0),
            is_hot:             true,
            spare_pct:          None,
            spare_threshold:    None,
            power_on_hours:     "-".into(),
            power_cycle_count:  "-".into(),
            capacity:           "465.76 GB".into(),
            detail_url:         "http://nas:6090/web/device/0x5000".into(),
        }
    }

    #[test]
    fn report_lists_fleet_and_devices() {
        let metrics = vec![metric()];
        let stats = FleetStats::from_metrics(&metrics);
        let out = generate(&metrics, &stats);

        assert!(out.contains("Devices: 1   OK: 0   WARN: 1   FAIL: 0"));
        assert!(out.contains("[WARN]  SATA  CT500MX500SSD1  (1234ABCD)"));
        assert!(out.contains("Life: remaining 90% (consumed 10%)"));
        assert!(out.contains("Temp: 68°C  HOT   EOL: 2031-04 (2,300 days left)"));
        assert!(!out.contains("Spare:"));
    }

    #[test]
    fn empty_fleet() {
        let out = generate(&[], &FleetStats::default());
        assert!(out.contains("(no devices reported)"));
        assert!(out.contains("Avg temp: -   Avg life: -"));
    }
}
