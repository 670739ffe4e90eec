//! Genetic-map reader.
//!
//! The map is consumed as a read-only recombination-rate series for one
//! locus window; nothing downstream operates on it beyond rendering.

use anyhow::Result;
use std::io::BufRead;
use std::path::Path;

use regionplot_core::{GeneticMapPoint, RegionError};

/// Column names expected in the genetic-map table.
#[derive(Clone, Debug)]
pub struct MapColumns {
    pub chrom: String,
    pub pos: String,
    pub rate: String,
}

impl Default for MapColumns {
    fn default() -> Self {
        Self {
            chrom: "chromosome".to_string(),
            pos: "position".to_string(),
            rate: "rate".to_string(),
        }
    }
}

/// Read the recombination-rate points for `chrom:start-end`.
///
/// The file is tab-delimited with a header, optionally gzipped. Points are
/// returned in file order.
pub fn load_genetic_map_window<P: AsRef<Path>>(
    path: P,
    columns: &MapColumns,
    chrom: &str,
    start: u64,
    end: u64,
) -> Result<Vec<GeneticMapPoint>> {
    let path = path.as_ref();
    let reader = crate::open_text(path)?;
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => {
            return Err(RegionError::data(format!("{}: empty file", path.display())).into());
        }
    };
    let fields: Vec<&str> = header.split('\t').map(|s| s.trim()).collect();

    let find_col = |name: &str| -> Result<usize> {
        fields.iter().position(|f| *f == name).ok_or_else(|| {
            RegionError::config(format!("{}: no column named {}", path.display(), name)).into()
        })
    };

    let idx_chrom = find_col(&columns.chrom)?;
    let idx_pos = find_col(&columns.pos)?;
    let idx_rate = find_col(&columns.rate)?;

    let mut points = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(|s| s.trim()).collect();

        let row_chrom = match fields.get(idx_chrom) {
            Some(c) => *c,
            None => continue,
        };
        if !crate::chrom_matches(row_chrom, chrom) {
            continue;
        }

        let pos = fields
            .get(idx_pos)
            .and_then(|s| s.parse::<u64>().ok())
            .or_else(|| {
                fields
                    .get(idx_pos)
                    .and_then(|s| s.parse::<f64>().ok())
                    .map(|f| f.round() as u64)
            });
        let rate = fields.get(idx_rate).and_then(|s| s.parse::<f64>().ok());

        if let (Some(pos), Some(rate)) = (pos, rate) {
            if start <= pos && pos <= end {
                points.push(GeneticMapPoint { pos, rate });
            }
        }
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MAP: &str = "chromosome\tposition\trate\n\
                       1\t100\t1.5\n\
                       1\t200\t2.5\n\
                       1\t900\t0.5\n\
                       2\t150\t9.0\n";

    #[test]
    fn test_window_and_chromosome_filter() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MAP.as_bytes()).unwrap();
        file.flush().unwrap();

        let points =
            load_genetic_map_window(file.path(), &MapColumns::default(), "1", 50, 500).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].pos, 100);
        assert_eq!(points[1].rate, 2.5);
    }

    #[test]
    fn test_gzipped_map() {
        let file = tempfile::Builder::new().suffix(".gz").tempfile().unwrap();
        {
            let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
            encoder.write_all(MAP.as_bytes()).unwrap();
            encoder.finish().unwrap();
        }
        let points =
            load_genetic_map_window(file.path(), &MapColumns::default(), "2", 0, 1_000).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].rate, 9.0);
    }

    #[test]
    fn test_missing_rate_column_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"chromosome\tposition\n1\t100\n").unwrap();
        file.flush().unwrap();

        let err = load_genetic_map_window(file.path(), &MapColumns::default(), "1", 0, 500)
            .unwrap_err();
        let region = err.downcast_ref::<RegionError>().unwrap();
        assert!(matches!(region, RegionError::Config { .. }));
    }
}
