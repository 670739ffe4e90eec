//! Shared data structures for regional plots.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type MarkerId = String;

/// One row of an association scan.
///
/// The identity key (`id`) is the marker name plus the sorted allele pair
/// (e.g. `rs123:A/G`) and must be unique within a dataset; the bare
/// `marker_id` is what genotype sources know the marker by.
#[derive(Clone, Debug, PartialEq)]
pub struct AssociationRecord {
    pub id: String,
    pub marker_id: MarkerId,
    pub chrom: String,
    pub pos: u64,
    pub p_value: f64,
    pub allele1: String,
    pub allele2: String,
}

impl AssociationRecord {
    pub fn new(
        marker_id: impl Into<String>,
        chrom: impl Into<String>,
        pos: u64,
        p_value: f64,
        allele1: impl Into<String>,
        allele2: impl Into<String>,
    ) -> Self {
        let marker_id = marker_id.into();
        let allele1 = allele1.into();
        let allele2 = allele2.into();
        let id = Self::identity(&marker_id, &allele1, &allele2);
        Self {
            id,
            marker_id,
            chrom: chrom.into(),
            pos,
            p_value,
            allele1,
            allele2,
        }
    }

    /// Identity key: marker name plus sorted allele pair.
    pub fn identity(marker_id: &str, allele1: &str, allele2: &str) -> String {
        if allele1 <= allele2 {
            format!("{}:{}/{}", marker_id, allele1, allele2)
        } else {
            format!("{}:{}/{}", marker_id, allele2, allele1)
        }
    }
}

/// Strand of a genomic feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Parse the strand notations found in annotation files.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "+" | "1" | "+1" => Some(Strand::Forward),
            "-" | "-1" => Some(Strand::Reverse),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
        }
    }
}

impl Serialize for Strand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Strand {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Strand::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid strand '{}'", s)))
    }
}

/// A gene or transcript model visible in a locus window.
///
/// Immutable once fetched for a window; `end >= start`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneFeature {
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    pub label: String,
}

impl GeneFeature {
    /// Label with the strand marker attached, as drawn on the track.
    /// This happens before text measurement, not during collision search.
    pub fn decorated_label(&self) -> String {
        match self.strand {
            Strand::Forward => format!("{} ->", self.label),
            Strand::Reverse => format!("<- {}", self.label),
        }
    }
}

/// One point of the recombination-rate series; consumed read-only by the
/// renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeneticMapPoint {
    pub pos: u64,
    /// Recombination rate in cM/Mb.
    pub rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_sorts_alleles() {
        let a = AssociationRecord::new("rs1", "1", 100, 0.5, "T", "A");
        let b = AssociationRecord::new("rs1", "1", 100, 0.5, "A", "T");
        assert_eq!(a.id, "rs1:A/T");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_strand_parse() {
        assert_eq!(Strand::parse("+"), Some(Strand::Forward));
        assert_eq!(Strand::parse("1"), Some(Strand::Forward));
        assert_eq!(Strand::parse("-"), Some(Strand::Reverse));
        assert_eq!(Strand::parse("-1"), Some(Strand::Reverse));
        assert_eq!(Strand::parse("."), None);
    }

    #[test]
    fn test_decorated_label_direction() {
        let fwd = GeneFeature {
            start: 0,
            end: 10,
            strand: Strand::Forward,
            label: "BRCA2".to_string(),
        };
        let rev = GeneFeature {
            strand: Strand::Reverse,
            ..fwd.clone()
        };
        assert_eq!(fwd.decorated_label(), "BRCA2 ->");
        assert_eq!(rev.decorated_label(), "<- BRCA2");
    }
}
