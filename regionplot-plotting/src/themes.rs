//! Color themes for regional plots.

use plotters::style::RGBColor;

/// Color theme for regional plots.
///
/// The five r² colors map onto the bins (0–0.2, 0.2–0.4, 0.4–0.6,
/// 0.6–0.8, 0.8–1.0]; imputed markers use the lighter companion palette.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Background color
    pub background: RGBColor,
    /// Text color
    pub text: RGBColor,
    /// Axis color
    pub axis: RGBColor,
    /// Significance threshold line color
    pub significance_line: RGBColor,
    /// Recombination-rate series color
    pub recombination_line: RGBColor,
    /// Gene/feature track color
    pub annotation: RGBColor,
    /// r² bin colors for genotyped markers, low LD first
    pub r2_colors: [RGBColor; 5],
    /// r² bin colors for imputed markers, low LD first
    pub imputed_r2_colors: [RGBColor; 5],
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Classic regional-plot palette.
    pub fn classic() -> Self {
        Self {
            background: RGBColor(255, 255, 255),
            text: RGBColor(0, 0, 0),
            axis: RGBColor(100, 100, 100),
            significance_line: RGBColor(0, 0, 0),
            recombination_line: RGBColor(0, 0, 0),
            annotation: RGBColor(0, 0, 0),
            r2_colors: [
                RGBColor(0, 153, 204),   // Cyan
                RGBColor(153, 51, 204),  // Purple
                RGBColor(102, 153, 0),   // Green
                RGBColor(255, 136, 0),   // Orange
                RGBColor(204, 0, 0),     // Red
            ],
            imputed_r2_colors: [
                RGBColor(138, 213, 240),
                RGBColor(214, 173, 235),
                RGBColor(197, 226, 109),
                RGBColor(255, 217, 128),
                RGBColor(255, 148, 148),
            ],
        }
    }

    /// Dark theme for presentations.
    pub fn dark() -> Self {
        Self {
            background: RGBColor(30, 30, 30),
            text: RGBColor(220, 220, 220),
            axis: RGBColor(150, 150, 150),
            significance_line: RGBColor(220, 220, 220),
            recombination_line: RGBColor(200, 200, 200),
            annotation: RGBColor(220, 220, 220),
            r2_colors: [
                RGBColor(102, 194, 165), // Teal
                RGBColor(141, 160, 203), // Slate
                RGBColor(166, 216, 84),  // Green
                RGBColor(252, 141, 98),  // Coral
                RGBColor(231, 138, 195), // Pink
            ],
            imputed_r2_colors: [
                RGBColor(60, 120, 104),
                RGBColor(84, 96, 130),
                RGBColor(100, 130, 54),
                RGBColor(150, 86, 60),
                RGBColor(140, 84, 118),
            ],
        }
    }
}
