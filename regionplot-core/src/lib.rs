//! regionplot-core: algorithms behind regional GWAS plots.
//!
//! This crate holds the parts of regionplot that need real design rather
//! than plumbing:
//! - Locus discovery: greedy peak-calling with exclusion windows
//! - LD resolution: normalizing an external genotype/LD engine's output
//! - Annotation layout: packing gene labels into non-colliding rows
//!
//! File parsing lives in regionplot-io, genotype backends in
//! regionplot-genotypes, and drawing in regionplot-plotting; this crate
//! only sees those collaborators through narrow traits.

pub mod cancel;
pub mod error;
pub mod layout;
pub mod ld;
pub mod locus;
pub mod record;

pub use cancel::CancelToken;
pub use error::{RegionError, RegionResult};
pub use layout::{layout_features, LayoutParams, PlacedFeature, TextMeasure, TrackLayout};
pub use ld::{resolve_ld, LdEngine, LdResolution};
pub use locus::{find_loci, Locus, LocusMode};
pub use record::{AssociationRecord, GeneFeature, GeneticMapPoint, MarkerId, Strand};
