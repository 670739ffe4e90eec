//! Dosage-matrix genotype source.
//!
//! Markers in rows, samples in columns; entries are allele dosages with
//! NaN marking missing calls. This is the storage every other backend is
//! converted into, and the thing the LD engine actually computes on.

use anyhow::{anyhow, Result};
use ndarray::{Array2, ArrayView1};
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use regionplot_core::{LdEngine, RegionError, RegionResult};

/// Genotype dosages for a set of markers and samples.
#[derive(Clone, Debug)]
pub struct DosageMatrix {
    pub sample_ids: Vec<String>,
    pub marker_ids: Vec<String>,
    /// Shape: (n_markers, n_samples).
    pub dosages: Array2<f64>,
    /// Marker name → first row carrying it. Duplicate marker rows stay in
    /// `marker_ids` and are surfaced through the engine contract.
    marker_index: HashMap<String, usize>,
}

impl DosageMatrix {
    pub fn new(sample_ids: Vec<String>, marker_ids: Vec<String>, dosages: Array2<f64>) -> Self {
        let mut marker_index = HashMap::with_capacity(marker_ids.len());
        for (i, id) in marker_ids.iter().enumerate() {
            marker_index.entry(id.clone()).or_insert(i);
        }
        Self {
            sample_ids,
            marker_ids,
            dosages,
            marker_index,
        }
    }

    pub fn n_markers(&self) -> usize {
        self.marker_ids.len()
    }

    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Column indices for a sample keep-list; `None` keeps everything.
    fn sample_columns(&self, keep: Option<&HashSet<String>>) -> Option<Vec<usize>> {
        keep.map(|keep| {
            self.sample_ids
                .iter()
                .enumerate()
                .filter(|(_, id)| keep.contains(*id))
                .map(|(i, _)| i)
                .collect()
        })
    }
}

impl LdEngine for DosageMatrix {
    fn compute_ld(
        &self,
        anchor: &str,
        markers: &HashSet<String>,
        keep_samples: Option<&HashSet<String>>,
    ) -> RegionResult<Vec<(String, f64)>> {
        let anchor_row = *self.marker_index.get(anchor).ok_or_else(|| {
            RegionError::resolution(format!("anchor marker '{}' not in genotype source", anchor))
        })?;
        let columns = self.sample_columns(keep_samples);
        let anchor_dosages = subset(self.dosages.row(anchor_row), columns.as_deref());

        let mut pairs = Vec::new();
        for (row, id) in self.marker_ids.iter().enumerate() {
            if !markers.contains(id) {
                continue;
            }
            let dosages = subset(self.dosages.row(row), columns.as_deref());
            pairs.push((id.clone(), r_squared(&anchor_dosages, &dosages)));
        }
        Ok(pairs)
    }
}

fn subset(row: ArrayView1<'_, f64>, columns: Option<&[usize]>) -> Vec<f64> {
    match columns {
        Some(columns) => columns.iter().map(|&c| row[c]).collect(),
        None => row.to_vec(),
    }
}

/// Squared Pearson correlation between two dosage vectors over
/// pairwise-complete samples. NaN when fewer than two complete pairs
/// exist; 0 when either vector has no variance.
pub fn r_squared(x: &[f64], y: &[f64]) -> f64 {
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;
    let mut count = 0usize;

    for (&xi, &yi) in x.iter().zip(y.iter()) {
        if xi.is_finite() && yi.is_finite() {
            sum_x += xi;
            sum_y += yi;
            sum_xy += xi * yi;
            sum_x2 += xi * xi;
            sum_y2 += yi * yi;
            count += 1;
        }
    }

    if count < 2 {
        return f64::NAN;
    }

    let n = count as f64;
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;
    let var_x = sum_x2 / n - mean_x * mean_x;
    let var_y = sum_y2 / n - mean_y * mean_y;
    let cov_xy = sum_xy / n - mean_x * mean_y;

    if var_x <= 0.0 || var_y <= 0.0 {
        return 0.0;
    }

    let r = cov_xy / (var_x.sqrt() * var_y.sqrt());
    r * r
}

/// Load a markers × samples dosage matrix from a tab-separated file with
/// a `marker_id sample1 sample2 ...` header. `NA` and empty cells become
/// NaN.
pub fn load_dosage_matrix<P: AsRef<Path>>(path: P) -> Result<DosageMatrix> {
    let path = path.as_ref();
    let reader = crate::vcf::open_genotype_text(path)?;
    let mut lines = reader.lines();

    let header = lines
        .next()
        .ok_or_else(|| anyhow!("{}: empty file", path.display()))??;
    let sample_ids: Vec<String> = header
        .split('\t')
        .skip(1)
        .map(|s| s.trim().to_string())
        .collect();
    if sample_ids.is_empty() {
        anyhow::bail!("{}: header has no sample columns", path.display());
    }

    let mut marker_ids = Vec::new();
    let mut values: Vec<f64> = Vec::new();

    for (line_no, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let marker = fields
            .next()
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if marker.is_empty() {
            continue;
        }

        let row: Vec<f64> = fields
            .map(|s| {
                let s = s.trim();
                if s.is_empty() || s.eq_ignore_ascii_case("na") || s == "." {
                    f64::NAN
                } else {
                    s.parse().unwrap_or(f64::NAN)
                }
            })
            .collect();
        if row.len() != sample_ids.len() {
            anyhow::bail!(
                "{}: line {}: expected {} dosages, got {}",
                path.display(),
                line_no + 2,
                sample_ids.len(),
                row.len()
            );
        }

        marker_ids.push(marker);
        values.extend(row);
    }

    let dosages = Array2::from_shape_vec((marker_ids.len(), sample_ids.len()), values)
        .map_err(|e| anyhow!("{}: inconsistent matrix shape: {}", path.display(), e))?;
    Ok(DosageMatrix::new(sample_ids, marker_ids, dosages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionplot_core::resolve_ld;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_r_squared_perfect_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!((r_squared(&x, &x) - 1.0).abs() < 1e-12);
        // Perfect negative correlation still gives r² = 1.
        assert!((r_squared(&x, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_r_squared_handles_missing_and_constant() {
        let x = [1.0, f64::NAN, 3.0, 4.0];
        let y = [2.0, 9.0, 6.0, 8.0];
        assert!(r_squared(&x, &y).is_finite());

        let constant = [2.0, 2.0, 2.0, 2.0];
        assert_eq!(r_squared(&constant, &y), 0.0);

        let sparse = [1.0, f64::NAN, f64::NAN, f64::NAN];
        assert!(r_squared(&sparse, &y).is_nan());
    }

    fn toy_matrix() -> DosageMatrix {
        // rs2 tracks rs1 exactly; rs3 does not.
        let dosages = Array2::from_shape_vec(
            (3, 4),
            vec![
                0.0, 1.0, 2.0, 1.0, // rs1
                0.0, 1.0, 2.0, 1.0, // rs2
                2.0, 0.0, 1.0, 1.0, // rs3
            ],
        )
        .unwrap();
        DosageMatrix::new(
            vec!["s1".into(), "s2".into(), "s3".into(), "s4".into()],
            vec!["rs1".into(), "rs2".into(), "rs3".into()],
            dosages,
        )
    }

    #[test]
    fn test_engine_computes_r2_against_anchor() {
        let matrix = toy_matrix();
        let markers: HashSet<String> =
            ["rs1", "rs2", "rs3"].iter().map(|s| s.to_string()).collect();
        let res = resolve_ld(&matrix, "rs1", &markers, None).unwrap();
        assert!((res.r2["rs1"] - 1.0).abs() < 1e-12);
        assert!((res.r2["rs2"] - 1.0).abs() < 1e-12);
        assert!(res.r2["rs3"] < 0.5);
    }

    #[test]
    fn test_engine_missing_anchor_is_resolution_error() {
        let matrix = toy_matrix();
        let markers: HashSet<String> = ["rs1".to_string()].into_iter().collect();
        let err = matrix.compute_ld("rs99", &markers, None).unwrap_err();
        assert!(matches!(err, RegionError::Resolution { .. }));
    }

    #[test]
    fn test_sample_filter_changes_result() {
        // Over all four samples rs1/rs3 disagree; restricted to s1 and s3
        // only two pairs remain and they correlate perfectly.
        let matrix = toy_matrix();
        let markers: HashSet<String> = ["rs3".to_string()].into_iter().collect();
        let keep: HashSet<String> = ["s1".to_string(), "s3".to_string()].into_iter().collect();

        let all = matrix.compute_ld("rs1", &markers, None).unwrap();
        let kept = matrix.compute_ld("rs1", &markers, Some(&keep)).unwrap();
        assert!(all[0].1 < 0.5);
        assert!((kept[0].1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_marker_rows_surface_in_order() {
        let dosages = Array2::from_shape_vec(
            (2, 3),
            vec![0.0, 1.0, 2.0, 2.0, 1.0, 0.0],
        )
        .unwrap();
        let matrix = DosageMatrix::new(
            vec!["s1".into(), "s2".into(), "s3".into()],
            vec!["rs1".into(), "rs1".into()],
            dosages,
        );
        let markers: HashSet<String> = ["rs1".to_string()].into_iter().collect();
        let res = resolve_ld(&matrix, "rs1", &markers, None).unwrap();
        assert_eq!(res.duplicates, vec!["rs1".to_string()]);
        // Keep-first: the anchor row correlates with itself.
        assert!((res.r2["rs1"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_dosage_matrix() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"marker_id\ts1\ts2\ts3\n\
              rs1\t0\t1\t2\n\
              rs2\tNA\t1\t0\n",
        )
        .unwrap();
        file.flush().unwrap();

        let matrix = load_dosage_matrix(file.path()).unwrap();
        assert_eq!(matrix.n_markers(), 2);
        assert_eq!(matrix.n_samples(), 3);
        assert_eq!(matrix.dosages[[0, 2]], 2.0);
        assert!(matrix.dosages[[1, 0]].is_nan());
    }
}
