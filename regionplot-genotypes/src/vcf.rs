//! VCF genotype source.
//!
//! Dosages come from the DS field when present, otherwise from GT allele
//! counts. Rows that cannot be parsed are skipped with a warning; the
//! resulting matrix is what the LD engine computes on.

use anyhow::{anyhow, bail, Result};
use flate2::read::MultiGzDecoder;
use log::warn;
use ndarray::Array2;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::dosage::DosageMatrix;

/// Buffered reader over a genotype text file, transparently decoding
/// `.gz`/`.bgz`.
pub(crate) fn open_genotype_text<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file =
        File::open(path).map_err(|e| anyhow!("opening {}: {}", path.display(), e))?;
    let lower = path.to_string_lossy().to_ascii_lowercase();
    if lower.ends_with(".gz") || lower.ends_with(".bgz") {
        Ok(Box::new(BufReader::with_capacity(
            64 * 1024,
            MultiGzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(64 * 1024, file)))
    }
}

/// Load a VCF into a dosage matrix. Markers without an ID get a
/// `chrom:pos` name so LD lookups still have a stable key.
pub fn load_vcf_dosages<P: AsRef<Path>>(path: P) -> Result<DosageMatrix> {
    let path = path.as_ref();
    let reader = open_genotype_text(path)?;

    let mut sample_ids: Option<Vec<String>> = None;
    let mut marker_ids: Vec<String> = Vec::new();
    let mut values: Vec<f64> = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.starts_with("##") || line.trim().is_empty() {
            continue;
        }
        if line.starts_with('#') {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() <= 9 {
                bail!("{}: VCF header has no sample columns", path.display());
            }
            sample_ids = Some(fields[9..].iter().map(|s| s.to_string()).collect());
            continue;
        }

        let Some(samples) = sample_ids.as_ref() else {
            bail!("{}: data line before #CHROM header", path.display());
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 9 + samples.len() {
            warn!(
                "{}: line {}: expected {} fields, got {}; skipping",
                path.display(),
                line_no + 1,
                9 + samples.len(),
                fields.len()
            );
            continue;
        }

        let id = if fields[2].is_empty() || fields[2] == "." {
            format!("{}:{}", fields[0], fields[1])
        } else {
            fields[2].to_string()
        };

        let (ds_idx, gt_idx) = format_indices(fields[8]);
        if ds_idx.is_none() && gt_idx.is_none() {
            warn!(
                "{}: line {}: FORMAT '{}' has neither DS nor GT; skipping",
                path.display(),
                line_no + 1,
                fields[8]
            );
            continue;
        }

        marker_ids.push(id);
        values.extend(
            fields[9..]
                .iter()
                .map(|sample| sample_dosage(sample, ds_idx, gt_idx)),
        );
    }

    let sample_ids =
        sample_ids.ok_or_else(|| anyhow!("{}: missing #CHROM header", path.display()))?;
    let dosages = Array2::from_shape_vec((marker_ids.len(), sample_ids.len()), values)
        .map_err(|e| anyhow!("{}: inconsistent matrix shape: {}", path.display(), e))?;
    Ok(DosageMatrix::new(sample_ids, marker_ids, dosages))
}

/// Positions of the DS and GT keys within a FORMAT string.
fn format_indices(format: &str) -> (Option<usize>, Option<usize>) {
    let mut ds_idx = None;
    let mut gt_idx = None;
    for (i, key) in format.split(':').enumerate() {
        match key {
            "DS" => ds_idx = Some(i),
            "GT" => gt_idx = Some(i),
            _ => {}
        }
    }
    (ds_idx, gt_idx)
}

/// Dosage for one sample field; DS preferred, GT fallback, NaN when
/// neither is usable.
fn sample_dosage(sample: &str, ds_idx: Option<usize>, gt_idx: Option<usize>) -> f64 {
    let fields: Vec<&str> = sample.split(':').collect();

    if let Some(i) = ds_idx {
        if let Some(raw) = fields.get(i) {
            if !raw.is_empty() && *raw != "." {
                if let Ok(dosage) = raw.parse::<f64>() {
                    return dosage;
                }
            }
        }
    }

    if let Some(i) = gt_idx {
        if let Some(gt) = fields.get(i) {
            return gt_dosage(gt);
        }
    }

    f64::NAN
}

/// Count of non-reference alleles in a GT value; NaN when any allele is
/// missing or unparseable.
fn gt_dosage(gt: &str) -> f64 {
    let mut dosage = 0.0;
    for allele in gt.split(['/', '|']) {
        match allele {
            "." => return f64::NAN,
            "0" => {}
            other if other.parse::<u32>().is_ok() => dosage += 1.0,
            _ => return f64::NAN,
        }
    }
    dosage
}
