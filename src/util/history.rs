use crate::models::metric::HistoryPoint;
use crate::models::smart::AttributeSnapshot;
use crate::util::attr_names::{KEY_DATA_UNITS_WRITTEN, KEY_PERCENTAGE_USED, ID_TOTAL_LBAS_WRITTEN, LIFE_IDS};
use crate::util::convert::{DATA_UNIT_BYTES, LBA_BYTES};
use crate::util::human::TIB;
use serde::Serialize;

/// Minimum number of points in any window, so a delta can always be drawn.
pub const MIN_WINDOW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    Day,
    #[default]
    Week,
    Month,
    Year,
}

impl Period {
    pub fn points(&self) -> usize {
        match self {
            Period::Day   => 1,
            Period::Week  => 7,
            Period::Month => 30,
            Period::Year  => 365,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "1d" | "day"   => Some(Period::Day),
            "1w" | "week"  => Some(Period::Week),
            "1m" | "month" => Some(Period::Month),
            "1y" | "year"  => Some(Period::Year),
            _ => None,
        }
    }
}

fn round_to(v: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (v * f).round() / f
}

/// Cumulative bytes written for one snapshot: NVMe data units (normalized
/// `value`), else SATA id 241 (`raw_value`).
fn written_bytes(snap: &AttributeSnapshot) -> Option<f64> {
    if let Some(a) = snap.attr(KEY_DATA_UNITS_WRITTEN) {
        return a.value.map(|v| v * DATA_UNIT_BYTES);
    }
    snap.attr(ID_TOTAL_LBAS_WRITTEN)
        .and_then(|a| a.raw_value)
        .map(|v| v * LBA_BYTES)
}

/// Remaining life for one snapshot: 100 - NVMe percentage used, else the
/// normalized value of the first SATA life attribute present.
fn life_pct(snap: &AttributeSnapshot) -> Option<i64> {
    if let Some(a) = snap.attr(KEY_PERCENTAGE_USED) {
        return a.value.map(|v| 100 - v.trunc() as i64);
    }
    LIFE_IDS.iter()
        .find_map(|id| snap.attr(id))
        .and_then(|a| a.value)
        .map(|v| v.trunc() as i64)
}

/// Build the date-ascending history series for one device.
///
/// Snapshots without a parseable date, or with neither a write nor a life
/// attribute, are skipped. Dates are compared as "YYYY-MM-DD" strings.
pub fn aggregate(snapshots: &[AttributeSnapshot]) -> Vec<HistoryPoint> {
    let mut points: Vec<HistoryPoint> = snapshots.iter().filter_map(|snap| {
        let date = snap.parsed_date()?.format("%Y-%m-%d").to_string();
        let cumulative_tb = written_bytes(snap).map(|b| round_to(b / TIB, 4));
        let life = life_pct(snap);
        if cumulative_tb.is_none() && life.is_none() {
            return None;
        }
        Some(HistoryPoint { date, life_pct: life, cumulative_tb })
    }).collect();

    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}

/// The trailing `n` points (at least [`MIN_WINDOW`]).
pub fn window(points: &[HistoryPoint], n: usize) -> &[HistoryPoint] {
    let n = n.max(MIN_WINDOW).min(points.len());
    &points[points.len() - n..]
}

/// Per-point write volume in GB since the previous point. The first point is
/// 0; decreases and gaps are 0.
pub fn delta_gb(points: &[HistoryPoint]) -> Vec<f64> {
    points.iter().enumerate().map(|(i, p)| {
        if i == 0 { return 0.0; }
        match (points[i - 1].cumulative_tb, p.cumulative_tb) {
            (Some(prev), Some(cur)) => round_to(((cur - prev) * 1024.0).max(0.0), 2),
            _ => 0.0,
        }
    }).collect()
}

/// The three chart series for a window: cumulative TB, delta GB and life %.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels:        Vec<String>,
    pub cumulative_tb: Vec<Option<f64>>,
    pub delta_gb:      Vec<f64>,
    pub life_pct:      Vec<Option<i64>>,
}

impl ChartSeries {
    pub fn from_points(points: &[HistoryPoint]) -> Self {
        Self {
            labels:        points.iter().map(|p| p.date.clone()).collect(),
            cumulative_tb: points.iter().map(|p| p.cumulative_tb).collect(),
            delta_gb:      delta_gb(points),
            life_pct:      points.iter().map(|p| p.life_pct).collect(),
        }
    }
}
