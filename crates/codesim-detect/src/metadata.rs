//! Line-oriented metadata sidecar parsing.
//!
//! Format: `id,key1=value1,key2=value2,...` — one submission per line, no
//! header. Parsing is lenient: lines without a comma, parts without `=`, and
//! blank lines are skipped silently, and a missing file yields no metadata.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Opaque per-submission metadata record.
pub type MetadataRecord = BTreeMap<String, String>;

/// Parse a metadata sidecar file into per-submission records.
pub fn load_metadata_file(path: &Path) -> BTreeMap<String, MetadataRecord> {
    let mut records = BTreeMap::new();
    let Ok(content) = fs::read_to_string(path) else {
        return records;
    };

    for line in content.lines() {
        let parts: Vec<&str> = line.trim().split(',').collect();
        if parts.len() < 2 {
            continue;
        }
        let id = parts[0];
        let mut record = MetadataRecord::new();
        for part in &parts[1..] {
            // Greedy split: values may contain `=` after the first one.
            if let Some((key, value)) = part.split_once('=') {
                record.insert(key.to_string(), value.to_string());
            }
        }
        records.insert(id.to_string(), record);
    }
    records
}
