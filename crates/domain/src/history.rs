use serde::{Deserialize, Serialize};

pub const HISTORY_CAPACITY: usize = 20;
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub name: String,
    pub data_url: String,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub data_url: String,
    pub name: String,
    pub mime_type: String,
}

impl HistoryEntry {
    pub fn stamp(entry: NewHistoryEntry, now_ms: i64) -> Self {
        let name = if entry.name.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            entry.name
        };
        let size = estimate_encoded_size(&entry.data_url);
        Self {
            id: now_ms.to_string(),
            name,
            data_url: entry.data_url,
            timestamp: now_ms,
            mime_type: entry.mime_type,
            size,
        }
    }

    /// Entries stamped in the same millisecond share a timestamp; later ones
    /// get a `-N` suffix so every id in the ledger stays distinct.
    pub fn disambiguate(&mut self, existing: &[HistoryEntry]) {
        let base = self.timestamp.to_string();
        let taken = |id: &str| existing.iter().any(|entry| entry.id == id);
        let mut id = base.clone();
        let mut suffix = 1;
        while taken(&id) {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }
        self.id = id;
    }
}

/// Approximates the decoded byte size of a base64 data url. The prefix is
/// counted too, so the figure is a rough upper estimate.
pub fn estimate_encoded_size(data_url: &str) -> u64 {
    (data_url.len() as f64 * 0.75).round() as u64
}

/// Prepends `entry` and drops the oldest entries beyond the capacity.
pub fn push_newest(entries: Vec<HistoryEntry>, entry: HistoryEntry) -> Vec<HistoryEntry> {
    let mut updated = Vec::with_capacity(HISTORY_CAPACITY);
    updated.push(entry);
    updated.extend(entries.into_iter().take(HISTORY_CAPACITY - 1));
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entry(name: &str) -> NewHistoryEntry {
        NewHistoryEntry {
            data_url: "data:image/png;base64,AAAA".to_string(),
            name: name.to_string(),
            mime_type: "image/png".to_string(),
        }
    }

    #[test]
    fn stamp_uses_clock_for_id_and_estimates_size() {
        let entry = HistoryEntry::stamp(new_entry("cutout"), 1_700_000_000_123);
        assert_eq!(entry.id, "1700000000123");
        assert_eq!(entry.timestamp, 1_700_000_000_123);
        // 26 chars * 0.75 = 19.5, rounded half away from zero
        assert_eq!(entry.size, 20);
    }

    #[test]
    fn blank_name_becomes_untitled() {
        let entry = HistoryEntry::stamp(new_entry("  "), 1);
        assert_eq!(entry.name, UNTITLED);
    }

    #[test]
    fn same_millisecond_entries_get_distinct_ids() {
        let first = HistoryEntry::stamp(new_entry("a"), 42);
        let mut second = HistoryEntry::stamp(new_entry("b"), 42);
        second.disambiguate(std::slice::from_ref(&first));
        assert_eq!(second.id, "42-1");
        assert_eq!(second.timestamp, 42);

        let mut third = HistoryEntry::stamp(new_entry("c"), 42);
        third.disambiguate(&[second.clone(), first.clone()]);
        assert_eq!(third.id, "42-2");

        let mut fresh = HistoryEntry::stamp(new_entry("d"), 43);
        fresh.disambiguate(&[first, second]);
        assert_eq!(fresh.id, "43");
    }

    #[test]
    fn push_newest_caps_and_orders() {
        let mut entries = Vec::new();
        for i in 0..25 {
            entries = push_newest(entries, HistoryEntry::stamp(new_entry(&i.to_string()), i));
        }
        assert_eq!(entries.len(), HISTORY_CAPACITY);
        assert_eq!(entries[0].name, "24");
        assert_eq!(entries[HISTORY_CAPACITY - 1].name, "5");
    }

    #[test]
    fn serializes_mime_type_as_type() {
        let entry = HistoryEntry::stamp(new_entry("x"), 7);
        let json = serde_json::to_value(&entry).expect("json");
        assert_eq!(json["type"], "image/png");
        assert_eq!(json["dataUrl"], "data:image/png;base64,AAAA");
    }
}
