use crate::models::smart::{AttrValue, AttributeMetadata, AttributeSnapshot};

/// One way of naming the attribute we are looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    /// Match against the metadata display name (case-insensitive).
    DisplayName(&'a str),
    /// Numeric SMART id, looked up directly in `attrs`.
    Id(i64),
    /// Semantic or string id, looked up directly in `attrs`.
    Key(&'a str),
}

impl Selector<'_> {
    /// Direct `attrs` keys to try for an id selector: the string form, then
    /// the integer-cast form ("0241" → "241").
    fn keys(&self) -> Vec<String> {
        match self {
            Selector::DisplayName(_) => Vec::new(),
            Selector::Id(n)          => vec![n.to_string()],
            Selector::Key(s) => {
                let mut keys = vec![s.to_string()];
                if let Ok(n) = s.trim().parse::<i64>() {
                    let cast = n.to_string();
                    if cast != *s { keys.push(cast); }
                }
                keys
            }
        }
    }

    fn id_label(&self) -> Option<String> {
        match self {
            Selector::DisplayName(_) => None,
            Selector::Id(n)          => Some(n.to_string()),
            Selector::Key(s)         => Some(s.to_string()),
        }
    }
}

/// An attribute located by [`resolve`], annotated with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttribute {
    pub id:    String,
    /// Display name when resolved through metadata; `None` on the id path.
    pub name:  Option<String>,
    pub value: AttrValue,
}

impl ResolvedAttribute {
    /// The counter to interpret: `raw_value`, falling back to `value`.
    pub fn raw(&self) -> Option<f64> {
        self.value.raw_value.or(self.value.value)
    }

    /// Lower-cased display name, or "id <id>" when resolved by id.
    pub fn label(&self) -> String {
        match &self.name {
            Some(n) => n.to_lowercase(),
            None    => format!("id {}", self.id),
        }
    }
}

/// Find the first attribute in `snapshot` matching `candidates`.
///
/// Metadata display names win over direct ids: metadata entries are walked
/// in order and each is compared against every name candidate. Only when no
/// metadata entry matches are id candidates tried as direct keys.
pub fn resolve(
    snapshot:   &AttributeSnapshot,
    metadata:   &AttributeMetadata,
    candidates: &[Selector<'_>],
) -> Option<ResolvedAttribute> {
    if snapshot.attrs.is_empty() {
        return None;
    }

    for entry in &metadata.entries {
        let meta_name = entry.display_name.to_lowercase();
        for cand in candidates {
            let Selector::DisplayName(want) = cand else { continue };
            if want.to_lowercase() != meta_name { continue; }
            if let Some(v) = snapshot.attrs.get(&entry.id) {
                return Some(ResolvedAttribute {
                    id:    entry.id.clone(),
                    name:  Some(entry.display_name.clone()),
                    value: v.clone(),
                });
            }
        }
    }

    for cand in candidates {
        let Some(id) = cand.id_label() else { continue };
        for key in cand.keys() {
            if let Some(v) = snapshot.attrs.get(&key) {
                return Some(ResolvedAttribute { id, name: None, value: v.clone() });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(attrs: &[(&str, f64)]) -> AttributeSnapshot {
        let mut s = AttributeSnapshot::default();
        for (k, v) in attrs {
            s.attrs.insert(k.to_string(), AttrValue::raw(*v));
        }
        s
    }

    #[test]
    fn metadata_name_beats_earlier_id_candidate() {
        let snap = snapshot(&[("173", 40.0), ("202", 7.0)]);
        let mut meta = AttributeMetadata::default();
        meta.push("202", "Percentage Used");
        let cands = [Selector::Id(173), Selector::DisplayName("percentage used")];

        let got = resolve(&snap, &meta, &cands).unwrap();
        assert_eq!(got.id, "202");
        assert_eq!(got.name.as_deref(), Some("Percentage Used"));
        assert_eq!(got.raw(), Some(7.0));
    }

    #[test]
    fn metadata_order_decides_between_names() {
        let snap = snapshot(&[("177", 90.0), ("233", 80.0)]);
        let mut meta = AttributeMetadata::default();
        meta.push("233", "Wear Leveling Count");
        meta.push("177", "Wear Range Delta");
        let cands = [Selector::DisplayName("Wear Range Delta"), Selector::DisplayName("Wear Leveling Count")];

        assert_eq!(resolve(&snap, &meta, &cands).unwrap().id, "233");
    }

    #[test]
    fn duplicate_display_names_take_first_metadata_entry() {
        let snap = snapshot(&[("1", 1.0), ("2", 2.0)]);
        let mut meta = AttributeMetadata::default();
        meta.push("1", "Host Writes");
        meta.push("2", "Host Writes");
        let got = resolve(&snap, &meta, &[Selector::DisplayName("Host Writes")]).unwrap();
        assert_eq!(got.id, "1");
    }

    #[test]
    fn metadata_hit_without_attr_falls_through_to_ids() {
        let snap = snapshot(&[("241", 100.0)]);
        let mut meta = AttributeMetadata::default();
        meta.push("999", "Total LBAs Written");
        let cands = [Selector::DisplayName("Total LBAs Written"), Selector::Id(241)];

        let got = resolve(&snap, &meta, &cands).unwrap();
        assert_eq!(got.id, "241");
        assert!(got.name.is_none());
        assert_eq!(got.label(), "id 241");
    }

    #[test]
    fn semantic_key_without_metadata() {
        let snap = snapshot(&[("available_spare", 100.0)]);
        let got = resolve(&snap, &AttributeMetadata::default(), &[Selector::Key("available_spare")]).unwrap();
        assert_eq!(got.id, "available_spare");
    }

    #[test]
    fn string_id_is_also_tried_integer_cast() {
        let snap = snapshot(&[("241", 5.0)]);
        let got = resolve(&snap, &AttributeMetadata::default(), &[Selector::Key("0241")]).unwrap();
        assert_eq!(got.id, "0241");
        assert_eq!(got.raw(), Some(5.0));
    }

    #[test]
    fn raw_falls_back_to_normalized_value() {
        let mut snap = AttributeSnapshot::default();
        snap.attrs.insert("percentage_used".into(), AttrValue::normalized(3.0));
        let got = resolve(&snap, &AttributeMetadata::default(), &[Selector::Key("percentage_used")]).unwrap();
        assert_eq!(got.raw(), Some(3.0));
    }

    #[test]
    fn nothing_found() {
        let meta = AttributeMetadata::default();
        assert!(resolve(&AttributeSnapshot::default(), &meta, &[Selector::Id(9)]).is_none());
        assert!(resolve(&snapshot(&[("5", 0.0)]), &meta, &[Selector::Id(9)]).is_none());
    }
}
