//! regionplot-io: input readers for the regionplot toolkit.
//!
//! - Association tables (whitespace/TSV/CSV, configurable column names)
//! - Genetic maps (TSV, optionally gzipped)
//! - Imputed-site lists (one marker per line)
//! - Annotations (GTF or plain feature tables)
//!
//! Genotype files are handled by regionplot-genotypes.

pub mod annotation;
pub mod association;
pub mod genetic_map;
pub mod imputed;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub use annotation::{load_feature_table, load_gtf_features, save_feature_table};
pub use association::{load_associations, AssocColumns};
pub use genetic_map::{load_genetic_map_window, MapColumns};
pub use imputed::{load_imputed_sites, load_sample_list};

/// Open a text file for buffered reading, transparently decoding `.gz`.
pub(crate) fn open_text<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
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

/// Chromosome name comparison tolerant of a `chr` prefix.
pub(crate) fn chrom_matches(a: &str, b: &str) -> bool {
    let strip = |s: &str| {
        s.trim_start_matches("chr")
            .trim_start_matches("Chr")
            .trim_start_matches("CHR")
            .to_string()
    };
    strip(a) == strip(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrom_matches_strips_prefix() {
        assert!(chrom_matches("chr1", "1"));
        assert!(chrom_matches("1", "1"));
        assert!(chrom_matches("Chr2", "chr2"));
        assert!(!chrom_matches("chr1", "2"));
    }
}
