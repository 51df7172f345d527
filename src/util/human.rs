pub const GIB: f64 = 1_073_741_824.0;
pub const TIB: f64 = 1_099_511_627_776.0;

/// Placeholder for any value that could not be derived.
pub const NO_DATA: &str = "-";

/// Format a capacity: "512 MB", "931.51 GB". Units are binary; two decimals
/// from GB upward.
pub fn fmt_bytes(bytes: Option<f64>) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    let Some(mut b) = bytes else { return NO_DATA.to_string() };
    let mut i = 0;
    while b >= 1024.0 && i < UNITS.len() - 1 {
        b /= 1024.0;
        i += 1;
    }
    if i >= 3 { format!("{:.2} {}", b, UNITS[i]) } else { format!("{:.0} {}", b, UNITS[i]) }
}

/// Format written volume: "1536.0 GB (1.50 TB)".
pub fn fmt_gb_tb(bytes: f64) -> String {
    format!("{:.1} GB ({:.2} TB)", bytes / GIB, bytes / TIB)
}

/// Format power-on hours: "365d 0h (1.0y)".
pub fn fmt_hours(hours: Option<f64>) -> String {
    let Some(hours) = hours else { return NO_DATA.to_string() };
    let hours = hours.trunc() as i64;
    let (d, h) = (hours / 24, hours % 24);
    let years = hours as f64 / (24.0 * 365.0);
    if d > 0 {
        format!("{}d {}h ({:.1}y)", d, h, years)
    } else {
        format!("{}h ({:.1}y)", h, years)
    }
}

/// Round to an integer and group thousands: "1,234,567".
pub fn fmt_thousands(v: f64) -> String {
    let n = v.round() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 { format!("-{}", out) } else { out }
}

/// Temperature label: "41°C".
pub fn fmt_temp(temp_c: Option<f64>) -> String {
    match temp_c {
        Some(t) => format!("{:.0}°C", t),
        None    => NO_DATA.to_string(),
    }
}

/// Format an optional percentage: "84%".
pub fn fmt_pct(pct: Option<f64>) -> String {
    match pct {
        Some(p) => format!("{:.0}%", p),
        None    => NO_DATA.to_string(),
    }
}
