//! Text measurement for annotation layout.

use plotters::style::{FontDesc, IntoFont};
use regionplot_core::TextMeasure;

/// Measures labels with the same font the renderer draws them with, so
/// layout collision boxes match what ends up on screen. Falls back to a
/// character-count estimate when font metrics are unavailable (e.g. no
/// system fonts in a build sandbox).
pub struct LabelMeasure {
    font: FontDesc<'static>,
}

impl LabelMeasure {
    pub fn new(size: f64) -> Self {
        Self {
            font: ("sans-serif", size).into_font(),
        }
    }
}

impl TextMeasure for LabelMeasure {
    fn measure(&self, label: &str) -> (f64, f64) {
        let size = self.font.get_size();
        match self.font.box_size(label) {
            Ok((w, h)) if w > 0 => (w as f64, h as f64),
            _ => (label.chars().count() as f64 * size * 0.6, size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_is_positive_and_monotonic() {
        let measure = LabelMeasure::new(12.0);
        let (w_short, h_short) = measure.measure("AB");
        let (w_long, h_long) = measure.measure("ABCDEFGHIJ");
        assert!(w_short > 0.0 && h_short > 0.0);
        assert!(w_long > w_short);
        assert!((h_long - h_short).abs() < 12.0);
    }
}
