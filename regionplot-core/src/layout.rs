//! Annotation track layout: packs gene features into rows so that no two
//! rendered labels collide.
//!
//! Candidate rows are pruned cheaply in genomic coordinates first (per-row
//! end trackers), then checked against the last label placed in the row
//! using rendered bounding boxes. The second pass is what makes the layout
//! correct: a label can be far wider than the genomic interval it
//! annotates, so genomic pruning alone is not enough.

use std::collections::BTreeMap;

use crate::error::{RegionError, RegionResult};
use crate::record::GeneFeature;

/// Rendered-size collaborator, exposed by the drawing backend.
pub trait TextMeasure {
    /// Width and height of `label` in device units.
    fn measure(&self, label: &str) -> (f64, f64);
}

/// Geometry of one layout invocation.
#[derive(Clone, Debug)]
pub struct LayoutParams {
    pub window_start: u64,
    pub window_end: u64,
    /// Device width the window maps onto.
    pub plot_width: f64,
    /// Genomic margin kept after each feature before the next may share
    /// its row.
    pub row_gap: u64,
    /// How far below row 0 the collision search may go before failing
    /// with a Layout error.
    pub max_row_excursion: u32,
}

impl LayoutParams {
    pub fn new(window_start: u64, window_end: u64, plot_width: f64) -> Self {
        Self {
            window_start,
            window_end,
            plot_width,
            row_gap: 3_000,
            max_row_excursion: 64,
        }
    }
}

/// A feature with its assigned row and rendered label geometry.
#[derive(Clone, Debug)]
pub struct PlacedFeature {
    pub feature: GeneFeature,
    /// Row index; 0 is the top of the track, deeper rows are negative.
    pub row: i32,
    /// Feature extent clipped to the window, in bp.
    pub start: u64,
    pub end: u64,
    /// Strand-decorated label exactly as measured.
    pub label: String,
    /// Horizontal device extent of the label box.
    pub label_x0: f64,
    pub label_x1: f64,
    pub label_height: f64,
}

/// Row assignments for one window, plus diagnostics for the caller.
#[derive(Clone, Debug, Default)]
pub struct TrackLayout {
    pub placed: Vec<PlacedFeature>,
    /// Features whose extent had to be clipped to the window.
    pub clipped: usize,
    /// Deepest row used; 0 when the track is empty.
    pub min_row: i32,
}

/// Per-row registry entry; owned by a single layout invocation.
#[derive(Clone, Debug)]
struct RowState {
    /// Genomic end of the last feature placed here, plus the row gap.
    last_end: u64,
    /// Device extent of the last label placed here.
    last_box: (f64, f64),
}

/// Assign each visible feature a row such that rendered labels never
/// collide within a row.
pub fn layout_features(
    features: &[GeneFeature],
    params: &LayoutParams,
    measure: &dyn TextMeasure,
) -> RegionResult<TrackLayout> {
    if params.window_end <= params.window_start {
        return Err(RegionError::layout(format!(
            "degenerate window {}-{}",
            params.window_start, params.window_end
        )));
    }
    let span = (params.window_end - params.window_start) as f64;
    let x_of =
        |pos: u64| (pos.saturating_sub(params.window_start)) as f64 / span * params.plot_width;
    let floor = -(params.max_row_excursion as i32);

    let mut sorted: Vec<&GeneFeature> = features.iter().collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

    let mut rows: BTreeMap<i32, RowState> = BTreeMap::new();
    let mut layout = TrackLayout::default();

    for feature in sorted {
        if feature.end < params.window_start || feature.start > params.window_end {
            // Out-of-window features clip to nothing.
            layout.clipped += 1;
            continue;
        }
        let start = feature.start.max(params.window_start);
        let end = feature.end.min(params.window_end);
        if start != feature.start || end != feature.end {
            layout.clipped += 1;
        }

        let label = feature.decorated_label();
        let (width, height) = measure.measure(&label);
        let center = (x_of(start) + x_of(end)) / 2.0;
        let label_box = (center - width / 2.0, center + width / 2.0);

        // First pass: scan 0, -1, -2, ... for a row whose genomic tracker
        // is clear of this feature.
        let mut row = 0;
        while let Some(state) = rows.get(&row) {
            if state.last_end < start {
                break;
            }
            row -= 1;
            if row < floor {
                return Err(excursion_error(&label, floor));
            }
        }

        // Second pass: keep descending while the rendered box overlaps the
        // last label already in the candidate row.
        while let Some(state) = rows.get(&row) {
            if !boxes_overlap(label_box, state.last_box) {
                break;
            }
            row -= 1;
            if row < floor {
                return Err(excursion_error(&label, floor));
            }
        }

        rows.insert(
            row,
            RowState {
                last_end: end.saturating_add(params.row_gap),
                last_box: label_box,
            },
        );
        layout.min_row = layout.min_row.min(row);
        layout.placed.push(PlacedFeature {
            feature: feature.clone(),
            row,
            start,
            end,
            label,
            label_x0: label_box.0,
            label_x1: label_box.1,
            label_height: height,
        });
    }

    Ok(layout)
}

fn boxes_overlap(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

fn excursion_error(label: &str, floor: i32) -> RegionError {
    RegionError::layout(format!(
        "label '{}' pushed below row {}; collision search did not converge",
        label, floor
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Strand;
    use std::cell::RefCell;

    /// Fixed-size boxes, independent of the label.
    struct FixedMeasure {
        width: f64,
        height: f64,
    }

    impl TextMeasure for FixedMeasure {
        fn measure(&self, _label: &str) -> (f64, f64) {
            (self.width, self.height)
        }
    }

    /// Records every label it is asked to measure.
    struct RecordingMeasure {
        seen: RefCell<Vec<String>>,
    }

    impl TextMeasure for RecordingMeasure {
        fn measure(&self, label: &str) -> (f64, f64) {
            self.seen.borrow_mut().push(label.to_string());
            (10.0, 5.0)
        }
    }

    fn feature(start: u64, end: u64, label: &str) -> GeneFeature {
        GeneFeature {
            start,
            end,
            strand: Strand::Forward,
            label: label.to_string(),
        }
    }

    fn params(start: u64, end: u64) -> LayoutParams {
        LayoutParams::new(start, end, 1000.0)
    }

    #[test]
    fn test_disjoint_features_share_row_zero() {
        let features = vec![
            feature(0, 100_000, "a"),
            feature(300_000, 400_000, "b"),
            feature(600_000, 700_000, "c"),
        ];
        let measure = FixedMeasure {
            width: 20.0,
            height: 5.0,
        };
        let layout = layout_features(&features, &params(0, 1_000_000), &measure).unwrap();
        assert_eq!(layout.placed.len(), 3);
        assert!(layout.placed.iter().all(|p| p.row == 0));
        assert_eq!(layout.min_row, 0);
    }

    #[test]
    fn test_no_same_row_collisions() {
        // Tight cluster of point features with wide labels: every placement
        // must still satisfy the no-overlap invariant.
        let features: Vec<_> = (0..12)
            .map(|i| feature(100_000 + i * 10_000, 101_000 + i * 10_000, &format!("g{}", i)))
            .collect();
        let measure = FixedMeasure {
            width: 200.0,
            height: 5.0,
        };
        let layout = layout_features(&features, &params(0, 1_000_000), &measure).unwrap();
        assert_eq!(layout.placed.len(), 12);
        for (i, a) in layout.placed.iter().enumerate() {
            for b in layout.placed.iter().skip(i + 1) {
                if a.row == b.row {
                    assert!(
                        a.label_x1 <= b.label_x0 || b.label_x1 <= a.label_x0,
                        "labels '{}' and '{}' overlap in row {}",
                        a.label,
                        b.label,
                        a.row
                    );
                }
            }
        }
        assert!(layout.min_row < 0);
    }

    #[test]
    fn test_wide_label_forces_lower_row_despite_genomic_gap() {
        // Genomically disjoint, but labels wider than the gap between them.
        let features = vec![feature(100_000, 110_000, "a"), feature(200_000, 210_000, "b")];
        let measure = FixedMeasure {
            width: 400.0,
            height: 5.0,
        };
        let layout = layout_features(&features, &params(0, 1_000_000), &measure).unwrap();
        assert_eq!(layout.placed[0].row, 0);
        assert_eq!(layout.placed[1].row, -1);
    }

    #[test]
    fn test_features_clip_to_window() {
        let features = vec![feature(0, 500_000, "a")];
        let layout = layout_features(
            &features,
            &params(100_000, 400_000),
            &FixedMeasure {
                width: 10.0,
                height: 5.0,
            },
        )
        .unwrap();
        assert_eq!(layout.clipped, 1);
        assert_eq!(layout.placed[0].start, 100_000);
        assert_eq!(layout.placed[0].end, 400_000);
    }

    #[test]
    fn test_excursion_bound_reports_layout_error() {
        // Identical point features with labels spanning the plot: nothing
        // can ever share a row, and a tiny excursion bound must trip.
        let features: Vec<_> = (0u64..10)
            .map(|i| feature(500_000, 500_000 + i, &format!("g{}", i)))
            .collect();
        let mut p = params(0, 1_000_000);
        p.max_row_excursion = 3;
        let err = layout_features(
            &features,
            &p,
            &FixedMeasure {
                width: 2_000.0,
                height: 5.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, RegionError::Layout { .. }));
    }

    #[test]
    fn test_measure_sees_decorated_labels() {
        let features = vec![GeneFeature {
            start: 100,
            end: 200,
            strand: Strand::Reverse,
            label: "GENE1".to_string(),
        }];
        let measure = RecordingMeasure {
            seen: RefCell::new(Vec::new()),
        };
        layout_features(&features, &params(0, 1_000), &measure).unwrap();
        assert_eq!(measure.seen.borrow().as_slice(), ["<- GENE1"]);
    }

    #[test]
    fn test_degenerate_window_is_layout_error() {
        let err = layout_features(
            &[],
            &params(500, 500),
            &FixedMeasure {
                width: 1.0,
                height: 1.0,
            },
        )
        .unwrap_err();
        assert!(matches!(err, RegionError::Layout { .. }));
    }
}
