//! Annotation sources: GTF files and plain feature tables.
//!
//! Both produce [`GeneFeature`]s for a locus window. Fetched features are
//! also written back as a tab-separated table (`start end strand label`)
//! so a run's annotations can be inspected or re-used as input.

use anyhow::{Context, Result};
use log::warn;
use std::io::BufRead;
use std::path::Path;

use regionplot_core::{GeneFeature, Strand};

/// Default attribute preference for GTF labels.
pub const DEFAULT_LABEL_PREFERENCE: [&str; 4] =
    ["gene_name", "gene_id", "transcript_id", "exon_number"];

/// Read gene features overlapping `chrom:start-end` from a GTF file
/// (optionally gzipped).
///
/// Rows with feature type `gene` are used; files without gene rows fall
/// back to `transcript` rows. The label is the first attribute present
/// from `label_preference`. Unparseable rows are skipped with a warning.
pub fn load_gtf_features<P: AsRef<Path>>(
    path: P,
    chrom: &str,
    start: u64,
    end: u64,
    label_preference: &[String],
) -> Result<Vec<GeneFeature>> {
    let path = path.as_ref();
    let reader = crate::open_text(path)?;

    let mut genes = Vec::new();
    let mut transcripts = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 9 {
            warn!(
                "{}: line {}: expected 9 GTF fields, got {}",
                path.display(),
                line_no + 1,
                fields.len()
            );
            continue;
        }

        let feature_type = fields[2];
        if feature_type != "gene" && feature_type != "transcript" {
            continue;
        }
        if !crate::chrom_matches(fields[0], chrom) {
            continue;
        }

        let (Ok(f_start), Ok(f_end)) = (fields[3].parse::<u64>(), fields[4].parse::<u64>())
        else {
            warn!(
                "{}: line {}: invalid coordinates '{}'-'{}'",
                path.display(),
                line_no + 1,
                fields[3],
                fields[4]
            );
            continue;
        };
        if f_end < start || f_start > end {
            continue;
        }

        let Some(strand) = Strand::parse(fields[6]) else {
            warn!(
                "{}: line {}: invalid strand '{}'",
                path.display(),
                line_no + 1,
                fields[6]
            );
            continue;
        };

        let Some(label) = pick_label(fields[8], label_preference) else {
            warn!(
                "{}: line {}: none of the preferred label attributes present",
                path.display(),
                line_no + 1
            );
            continue;
        };

        let feature = GeneFeature {
            start: f_start,
            end: f_end,
            strand,
            label,
        };
        if feature_type == "gene" {
            genes.push(feature);
        } else {
            transcripts.push(feature);
        }
    }

    Ok(if genes.is_empty() { transcripts } else { genes })
}

/// First attribute from the preference list found in a GTF attribute
/// column (`key "value"; key "value";`).
fn pick_label(attributes: &str, preference: &[String]) -> Option<String> {
    let mut parsed: Vec<(String, String)> = Vec::new();
    for chunk in attributes.split(';') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let Some((key, value)) = chunk.split_once(char::is_whitespace) else {
            continue;
        };
        parsed.push((key.to_string(), value.trim().trim_matches('"').to_string()));
    }
    for wanted in preference {
        if let Some((_, value)) = parsed.iter().find(|(key, _)| key == wanted) {
            if !value.is_empty() {
                return Some(value.clone());
            }
        }
    }
    None
}

/// Read a plain feature table (`start end strand label`, tab-separated
/// with a header), keeping features overlapping `start-end`.
pub fn load_feature_table<P: AsRef<Path>>(
    path: P,
    start: u64,
    end: u64,
) -> Result<Vec<GeneFeature>> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(crate::open_text(path)?);

    let mut features = Vec::new();
    for result in reader.deserialize() {
        let feature: GeneFeature =
            result.with_context(|| format!("parsing feature table {}", path.display()))?;
        if feature.end >= start && feature.start <= end {
            features.push(feature);
        }
    }
    Ok(features)
}

/// Write features as a tab-separated table with a header, mirroring the
/// shape `load_feature_table` accepts.
pub fn save_feature_table<P: AsRef<Path>>(path: P, features: &[GeneFeature]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for feature in features {
        writer.serialize(feature)?;
    }
    writer.flush()?;
    Ok(())
}
