//! regionplot-plotting: rendering for regional GWAS plots.
//!
//! One figure per locus: a −log10(p) scatter colored by LD with the
//! anchor marker, the recombination-rate series on a secondary axis, a
//! dashed significance line, and the packed gene-annotation track below.
//!
//! ## Output
//! - SVG (default)
//! - PNG (optional, requires the `png` feature)

pub mod measure;
pub mod region;
pub mod themes;

use regionplot_core::{GeneticMapPoint, TrackLayout};

pub use measure::LabelMeasure;
pub use region::{layout_annotation_track, render_region};
pub use themes::Theme;

/// r² bin edges; a marker falls into the bin whose upper edge it does
/// not exceed. Unknown LD (r² = 0) lands in the first bin.
pub const R2_THRESHOLDS: [f64; 6] = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

/// One marker of a locus, ready for drawing.
#[derive(Clone, Debug)]
pub struct RegionMarker {
    pub pos: u64,
    pub p_value: f64,
    /// LD with the locus anchor; never NaN by the resolution policy.
    pub r2: f64,
    pub imputed: bool,
}

/// Everything the renderer needs for one locus.
#[derive(Clone, Debug)]
pub struct RegionScene {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub markers: Vec<RegionMarker>,
    pub genetic_map: Vec<GeneticMapPoint>,
    /// Row-packed annotation track; `None` renders without the track
    /// (e.g. after a layout failure).
    pub annotations: Option<TrackLayout>,
}

/// Configuration for plot appearance.
#[derive(Debug, Clone)]
pub struct RegionPlotConfig {
    /// Plot width in pixels
    pub width: u32,
    /// Plot height in pixels
    pub height: u32,
    /// Significance threshold as a p-value; drawn at −log10(p)
    pub significance: f64,
    /// Genotyped marker radius in pixels
    pub point_size: u32,
    /// Font size used for annotation labels, in pixels
    pub annotation_font_size: f64,
    /// Plot title
    pub title: Option<String>,
    /// Color theme
    pub theme: Theme,
}

impl Default for RegionPlotConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            significance: 5e-8,
            point_size: 3,
            annotation_font_size: 11.0,
            title: None,
            theme: Theme::default(),
        }
    }
}

/// Bin index for an r² value, clamped into [0, 4].
pub(crate) fn r2_bin(r2: f64) -> usize {
    for (i, window) in R2_THRESHOLDS.windows(2).enumerate() {
        if r2 <= window[1] {
            return i;
        }
    }
    R2_THRESHOLDS.len() - 2
}
