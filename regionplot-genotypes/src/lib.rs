//! regionplot-genotypes: genotype storage backends for LD computation.
//!
//! The core pipeline only sees [`regionplot_core::LdEngine`]; this crate
//! provides the concrete engines:
//! - Dosage matrices (markers × samples TSV)
//! - VCF (dosages derived from DS or GT fields, plain or gzipped)

pub mod dosage;
pub mod vcf;

pub use dosage::DosageMatrix;

use anyhow::Result;
use std::path::Path;

/// Genotype file formats the pipeline understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenotypeFormat {
    /// Markers × samples dosage matrix, tab-separated.
    Dosage,
    /// VCF with DS or GT per-sample fields.
    Vcf,
}

impl GenotypeFormat {
    /// Guess the format from the file name. An explicit format option
    /// takes precedence over this.
    pub fn guess<P: AsRef<Path>>(path: P) -> Option<Self> {
        let lower = path.as_ref().to_string_lossy().to_ascii_lowercase();
        let base = lower.trim_end_matches(".gz").trim_end_matches(".bgz");
        if base.ends_with(".vcf") {
            Some(GenotypeFormat::Vcf)
        } else if base.ends_with(".tsv") || base.ends_with(".txt") || base.ends_with(".dosage") {
            Some(GenotypeFormat::Dosage)
        } else {
            None
        }
    }
}

/// Load genotypes into a dosage matrix, guessing the format when not
/// forced by the caller.
pub fn load_genotypes<P: AsRef<Path>>(
    path: P,
    format: Option<GenotypeFormat>,
) -> Result<DosageMatrix> {
    let path = path.as_ref();
    let format = match format.or_else(|| GenotypeFormat::guess(path)) {
        Some(f) => f,
        None => anyhow::bail!(
            "{}: cannot guess genotype format; specify it explicitly",
            path.display()
        ),
    };
    match format {
        GenotypeFormat::Dosage => dosage::load_dosage_matrix(path),
        GenotypeFormat::Vcf => vcf::load_vcf_dosages(path),
    }
}
