//! Line-set readers: imputed-site lists and sample keep-lists, both one
//! name per line.

use anyhow::Result;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

/// Markers typed as imputed; everything else renders as genotyped.
pub fn load_imputed_sites<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    load_line_set(path)
}

/// Samples to keep for the LD calculation.
pub fn load_sample_list<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    load_line_set(path)
}

fn load_line_set<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let reader = crate::open_text(path)?;
    let mut set = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            set.insert(trimmed.to_string());
        }
    }
    Ok(set)
}
