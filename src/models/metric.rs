use crate::models::device::Protocol;
use crate::models::smart::RawStatus;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Ok,
    Warn,
    Fail,
    Neutral,
}

impl StatusClass {
    pub fn label(&self) -> &'static str {
        match self {
            StatusClass::Ok      => "  OK",
            StatusClass::Warn    => "WARN",
            StatusClass::Fail    => "FAIL",
            StatusClass::Neutral => "   -",
        }
    }
}

/// Display status derived from the raw SMART status of the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    #[serde(rename = "status_text")]
    pub text:   String,
    #[serde(rename = "status_class")]
    pub class:  StatusClass,
    /// Sort weight: higher is worse.
    #[serde(rename = "status_weight")]
    pub weight: u8,
}

impl DeviceStatus {
    fn of(text: &str, class: StatusClass, weight: u8) -> Self {
        Self { text: text.to_string(), class, weight }
    }

    pub fn unknown() -> Self {
        Self::of("-", StatusClass::Neutral, 0)
    }

    pub fn from_raw(raw: Option<&RawStatus>) -> Self {
        match raw {
            None => Self::unknown(),
            Some(RawStatus::Code(code)) => Self::from_code(*code),
            Some(RawStatus::Text(text)) => match text.trim().parse::<f64>() {
                Ok(code) => Self::from_code(code),
                Err(_)   => Self::from_text(text),
            },
        }
    }

    fn from_code(code: f64) -> Self {
        if code == 0.0 {
            Self::of("OK", StatusClass::Ok, 0)
        } else if code == 1.0 {
            Self::of("WARN", StatusClass::Warn, 1)
        } else if code >= 2.0 {
            Self::of("FAIL", StatusClass::Fail, 2)
        } else {
            Self::unknown()
        }
    }

    fn from_text(text: &str) -> Self {
        let s = text.to_lowercase();
        if s.contains("ok") || s.contains("pass") {
            Self::of("OK", StatusClass::Ok, 0)
        } else if s.contains("warn") || s.contains("advis") {
            Self::of("WARN", StatusClass::Warn, 1)
        } else if s.contains("fail") || s.contains("crit") {
            Self::of("FAIL", StatusClass::Fail, 2)
        } else {
            Self { text: text.to_uppercase(), class: StatusClass::Neutral, weight: 1 }
        }
    }
}

/// Per-device health record. `None` fields render as "-".
///
/// Whenever both are present, `remaining_pct + consumed_pct == 100`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMetric {
    pub wwn:                String,
    pub model:              String,
    pub serial:             String,
    pub protocol:           Protocol,
    #[serde(flatten)]
    pub status:             DeviceStatus,

    pub remaining_pct:      Option<u8>,
    pub consumed_pct:       Option<u8>,
    pub need_convert:       bool,
    pub invert_display:     bool,
    pub formatted_text:     String,
    pub life_bar_pct:       Option<f64>,

    pub tbw_bytes:          Option<f64>,
    pub tbw_formatted:      String,

    pub eol_date:           Option<String>,
    pub eol_days_remaining: Option<f64>,

    pub temperature_c:      Option<f64>,
    pub temp_label:         String,
    pub temp_bar_pct:       Option<f64>,
    pub is_hot:             bool,

    pub spare_pct:          Option<f64>,
    pub spare_threshold:    Option<f64>,

    pub power_on_hours:     String,
    pub power_cycle_count:  String,
    pub capacity:           String,
    pub detail_url:         String,
}

/// One point of a device's write/life history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    /// "YYYY-MM-DD"
    pub date:          String,
    #[serde(rename = "life")]
    pub life_pct:      Option<i64>,
    #[serde(rename = "tbw_tb")]
    pub cumulative_tb: Option<f64>,
}

/// Fleet-wide roll-up shown above the device list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FleetStats {
    pub total:         usize,
    pub ok:            usize,
    pub warn:          usize,
    pub fail:          usize,
    pub avg_temp_c:    Option<f64>,
    pub avg_life_pct:  Option<f64>,
}

impl FleetStats {
    pub fn from_metrics(metrics: &[ResolvedMetric]) -> Self {
        let mut stats = FleetStats { total: metrics.len(), ..Self::default() };
        let (mut t_acc, mut t_n) = (0.0, 0usize);
        let (mut l_acc, mut l_n) = (0.0, 0usize);
        for m in metrics {
            match m.status.class {
                StatusClass::Ok      => stats.ok += 1,
                StatusClass::Warn    => stats.warn += 1,
                StatusClass::Fail    => stats.fail += 1,
                StatusClass::Neutral => {}
            }
            if let Some(t) = m.temperature_c { t_acc += t; t_n += 1; }
            if let Some(r) = m.remaining_pct { l_acc += r as f64; l_n += 1; }
        }
        stats.avg_temp_c   = (t_n > 0).then(|| round1(t_acc / t_n as f64));
        stats.avg_life_pct = (l_n > 0).then(|| round1(l_acc / l_n as f64));
        stats
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_status_codes() {
        assert_eq!(DeviceStatus::from_raw(Some(&RawStatus::Code(0.0))).class, StatusClass::Ok);
        assert_eq!(DeviceStatus::from_raw(Some(&RawStatus::Code(1.0))).class, StatusClass::Warn);
        assert_eq!(DeviceStatus::from_raw(Some(&RawStatus::Code(3.0))).class, StatusClass::Fail);
        assert_eq!(DeviceStatus::from_raw(Some(&RawStatus::Code(-1.0))), DeviceStatus::unknown());
        assert_eq!(DeviceStatus::from_raw(None), DeviceStatus::unknown());
    }

    #[test]
    fn numeric_string_status_is_a_code() {
        let s = DeviceStatus::from_raw(Some(&RawStatus::Text("2".into())));
        assert_eq!(s.text, "FAIL");
        assert_eq!(s.weight, 2);
    }

    #[test]
    fn text_status_keywords() {
        let from = |t: &str| DeviceStatus::from_raw(Some(&RawStatus::Text(t.into())));
        assert_eq!(from("Passed").class, StatusClass::Ok);
        assert_eq!(from("advisory").class, StatusClass::Warn);
        assert_eq!(from("CRITICAL").class, StatusClass::Fail);

        let other = from("degraded");
        assert_eq!(other.text, "DEGRADED");
        assert_eq!(other.class, StatusClass::Neutral);
        assert_eq!(other.weight, 1);
    }
}
