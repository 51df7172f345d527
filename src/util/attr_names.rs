//! Attribute name predicates and the candidate lists used to locate each
//! logical quantity. All name checks are case-insensitive substring checks.

use crate::util::resolver::Selector;

/// Wear / remaining-life candidates, highest priority first.
pub const WEAR_CANDIDATES: &[Selector<'static>] = &[
    Selector::DisplayName("Wear Range Delta"),
    Selector::Id(173),
    Selector::Id(177),
    Selector::DisplayName("Wear Leveling Count"),
    Selector::DisplayName("Percentage Used"),
];

/// Host write volume candidates.
pub const WRITE_CANDIDATES: &[Selector<'static>] = &[
    Selector::DisplayName("Total LBAs Written"),
    Selector::Id(241),
    Selector::DisplayName("Data Units Written"),
    Selector::DisplayName("Host Writes"),
];

/// Spare area: NVMe Available Spare, then vendor-specific SATA proxies
/// (232 Available Reserved Space, 179 Used Reserved Block Count,
/// 251 Minimum Spares Remaining).
pub const SPARE_CANDIDATES: &[Selector<'static>] = &[
    Selector::DisplayName("Available Spare"),
    Selector::Key("available_spare"),
    Selector::Id(232),
    Selector::Id(179),
    Selector::Id(251),
    Selector::DisplayName("Available Reserved Space"),
    Selector::DisplayName("Minimum Spares Remaining"),
];

/// Semantic NVMe key for data units written (1 unit = 512,000 bytes).
pub const KEY_DATA_UNITS_WRITTEN: &str = "data_units_written";
/// Semantic NVMe key for percentage of endurance consumed.
pub const KEY_PERCENTAGE_USED: &str = "percentage_used";
/// SATA Total LBAs Written (1 unit = 512 bytes).
pub const ID_TOTAL_LBAS_WRITTEN: &str = "241";
/// SATA ids whose normalized value is remaining life, in lookup order.
pub const LIFE_IDS: &[&str] = &["177", "231", "173"];

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// "Percentage Used" is consumed endurance by definition.
pub fn is_percentage_used_name(name: &str) -> bool {
    contains_ci(name, "percentage used")
}

pub fn is_data_units_written_name(name: &str) -> bool {
    contains_ci(name, "data units written")
}

pub fn is_total_lbas_written_name(name: &str) -> bool {
    contains_ci(name, "total lbas written")
}

pub fn is_host_writes_name(name: &str) -> bool {
    contains_ci(name, "host writes")
}
