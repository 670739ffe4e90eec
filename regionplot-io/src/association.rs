//! Association-table reader.
//!
//! Accepts whitespace-, tab- or comma-delimited tables with a header row.
//! Column names are configurable; the defaults match common association
//! output (`snp`, `chr`, `pos`, `p`, `minor`, `major`).

use anyhow::Result;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use regionplot_core::{AssociationRecord, RegionError};

/// Column names expected in the association table.
#[derive(Clone, Debug)]
pub struct AssocColumns {
    pub marker: String,
    pub chrom: String,
    pub pos: String,
    pub p_value: String,
    pub allele1: String,
    pub allele2: String,
}

impl Default for AssocColumns {
    fn default() -> Self {
        Self {
            marker: "snp".to_string(),
            chrom: "chr".to_string(),
            pos: "pos".to_string(),
            p_value: "p".to_string(),
            allele1: "minor".to_string(),
            allele2: "major".to_string(),
        }
    }
}

/// Load association records, enforcing the identity-key uniqueness
/// invariant (marker plus sorted allele pair).
pub fn load_associations<P: AsRef<Path>>(
    path: P,
    columns: &AssocColumns,
) -> Result<Vec<AssociationRecord>> {
    let path = path.as_ref();
    let reader = crate::open_text(path)?;
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => {
            return Err(RegionError::data(format!("{}: empty file", path.display())).into());
        }
    };
    let fields = split_row(&header);

    let find_col = |name: &str| -> Result<usize> {
        fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| {
                RegionError::config(format!("{}: no column named {}", path.display(), name)).into()
            })
    };

    let idx_marker = find_col(&columns.marker)?;
    let idx_chrom = find_col(&columns.chrom)?;
    let idx_pos = find_col(&columns.pos)?;
    let idx_p = find_col(&columns.p_value)?;
    let idx_a1 = find_col(&columns.allele1)?;
    let idx_a2 = find_col(&columns.allele2)?;

    let mut records = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (line_no, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_row(&line);

        let get = |idx: usize, what: &str| -> Result<&str> {
            fields.get(idx).map(|s| s.as_str()).ok_or_else(|| {
                RegionError::data(format!(
                    "{}: line {}: missing {} field",
                    path.display(),
                    line_no + 2,
                    what
                ))
                .into()
            })
        };

        let marker = get(idx_marker, "marker")?;
        let chrom = get(idx_chrom, "chromosome")?;
        let pos_raw = get(idx_pos, "position")?;
        let p_raw = get(idx_p, "p-value")?;
        let a1 = get(idx_a1, "allele")?;
        let a2 = get(idx_a2, "allele")?;

        // Positions may be written as floats (e.g. 1e6).
        let pos = pos_raw
            .parse::<u64>()
            .or_else(|_| pos_raw.parse::<f64>().map(|f| f.round() as u64))
            .map_err(|_| {
                RegionError::data(format!(
                    "{}: line {}: invalid position '{}'",
                    path.display(),
                    line_no + 2,
                    pos_raw
                ))
            })?;

        let p_value: f64 = p_raw.parse().map_err(|_| {
            RegionError::data(format!(
                "{}: line {}: invalid p-value '{}'",
                path.display(),
                line_no + 2,
                p_raw
            ))
        })?;
        if !p_value.is_finite() || p_value <= 0.0 || p_value > 1.0 {
            return Err(RegionError::data(format!(
                "{}: line {}: p-value {} outside (0, 1]",
                path.display(),
                line_no + 2,
                p_value
            ))
            .into());
        }

        let record = AssociationRecord::new(marker, chrom, pos, p_value, a1, a2);
        if !seen.insert(record.id.clone()) {
            return Err(RegionError::data(format!(
                "{}: duplicated marker identity '{}'",
                path.display(),
                record.id
            ))
            .into());
        }
        records.push(record);
    }

    Ok(records)
}

/// Tokenize one row: tab or comma when present, otherwise any run of
/// whitespace.
fn split_row(line: &str) -> Vec<String> {
    if line.contains('\t') {
        line.split('\t').map(|s| s.trim().to_string()).collect()
    } else if line.contains(',') {
        line.split(',').map(|s| s.trim().to_string()).collect()
    } else {
        line.split_whitespace().map(|s| s.to_string()).collect()
    }
}
