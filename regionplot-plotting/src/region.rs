//! Regional plot rendering.
//!
//! The figure is split into an association panel (−log10(p) scatter plus
//! the recombination series on a secondary axis) and an annotation panel
//! with the row-packed gene track underneath.

use anyhow::{Context, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use regionplot_core::{layout_features, GeneFeature, LayoutParams, RegionResult, TrackLayout};

use crate::{r2_bin, LabelMeasure, RegionMarker, RegionPlotConfig, RegionScene, R2_THRESHOLDS};

/// Features shorter than this render as a point marker instead of a bar.
const SMALL_FEATURE_BP: u64 = 3_000;

/// Horizontal space reserved for the two y-label areas, in pixels.
const LABEL_AREA_PX: u32 = 130;

/// Pack the annotation track for a locus window, measuring labels with
/// the renderer's own font so collision boxes match the final figure.
///
/// A Layout error here is fatal for the track only; callers may still
/// render the locus with `annotations: None`.
pub fn layout_annotation_track(
    features: &[GeneFeature],
    window_start: u64,
    window_end: u64,
    config: &RegionPlotConfig,
) -> RegionResult<TrackLayout> {
    let plot_width = config.width.saturating_sub(LABEL_AREA_PX).max(1) as f64;
    let params = LayoutParams::new(window_start, window_end, plot_width);
    let measure = LabelMeasure::new(config.annotation_font_size);
    layout_features(features, &params, &measure)
}

/// Render one locus to `output_path` (SVG, or PNG with the `png`
/// feature, chosen by extension).
pub fn render_region<P: AsRef<Path>>(
    scene: &RegionScene,
    output_path: P,
    config: &RegionPlotConfig,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let ext = output_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("svg")
        .to_lowercase();

    match ext.as_str() {
        "svg" => draw_region_svg(output_path, scene, config),
        #[cfg(feature = "png")]
        "png" => draw_region_png(output_path, scene, config),
        _ => anyhow::bail!("Unsupported output format: {}", ext),
    }
}

fn draw_region_svg(output_path: &Path, scene: &RegionScene, config: &RegionPlotConfig) -> Result<()> {
    let root =
        SVGBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    draw_region_impl(&root, scene, config).context("Failed to draw regional plot")?;
    root.present().context("Failed to write SVG")?;
    Ok(())
}

#[cfg(feature = "png")]
fn draw_region_png(output_path: &Path, scene: &RegionScene, config: &RegionPlotConfig) -> Result<()> {
    let root =
        BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
    draw_region_impl(&root, scene, config).context("Failed to draw regional plot")?;
    root.present().context("Failed to write PNG")?;
    Ok(())
}

fn draw_region_impl<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    scene: &RegionScene,
    config: &RegionPlotConfig,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let theme = &config.theme;
    root.fill(&theme.background)?;

    let x_range = (scene.start as f64 / 1e6)..(scene.end as f64 / 1e6);
    let sig_score = -config.significance.log10();
    let max_score = scene
        .markers
        .iter()
        .map(|m| -m.p_value.log10())
        .fold(0.0_f64, f64::max);
    let y_max = (max_score * 1.1).max(sig_score + 1.0);

    let (upper, lower) = root.split_vertically((config.height as f64 * 0.72) as u32);

    // Association panel with the recombination series on a secondary axis.
    let mut chart = {
        let mut builder = ChartBuilder::on(&upper);
        builder
            .margin(10)
            .x_label_area_size(0)
            .y_label_area_size(60)
            .right_y_label_area_size(70);
        if let Some(ref title) = config.title {
            builder.caption(title, ("sans-serif", 20).into_font().color(&theme.text));
        }
        builder
            .build_cartesian_2d(x_range.clone(), 0.0..y_max)?
            .set_secondary_coord(x_range.clone(), 0.0..100.0)
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_desc("-log10(p)")
        .axis_style(&theme.axis)
        .y_label_style(("sans-serif", 13).into_font().color(&theme.text))
        .axis_desc_style(("sans-serif", 15).into_font().color(&theme.text))
        .draw()?;

    chart
        .configure_secondary_axes()
        .y_desc("Recombination Rate (cM/Mb)")
        .label_style(("sans-serif", 13).into_font().color(&theme.text))
        .axis_desc_style(("sans-serif", 15).into_font().color(&theme.text))
        .draw()?;

    if !scene.genetic_map.is_empty() {
        chart.draw_secondary_series(LineSeries::new(
            scene
                .genetic_map
                .iter()
                .map(|p| (p.pos as f64 / 1e6, p.rate)),
            theme.recombination_line.stroke_width(1),
        ))?;
    }

    chart.draw_series(DashedLineSeries::new(
        vec![(x_range.start, sig_score), (x_range.end, sig_score)],
        8,
        4,
        theme.significance_line.stroke_width(1),
    ))?;

    // Imputed markers first so genotyped calls sit on top of them.
    let imputed: Vec<&RegionMarker> = scene.markers.iter().filter(|m| m.imputed).collect();
    let genotyped: Vec<&RegionMarker> = scene.markers.iter().filter(|m| !m.imputed).collect();

    chart.draw_series(imputed.iter().map(|m| {
        let color = theme.imputed_r2_colors[r2_bin(m.r2)];
        TriangleMarker::new(
            (m.pos as f64 / 1e6, -m.p_value.log10()),
            config.point_size,
            color.filled(),
        )
    }))?;

    chart.draw_series(genotyped.iter().map(|m| {
        let color = theme.r2_colors[r2_bin(m.r2)];
        Circle::new(
            (m.pos as f64 / 1e6, -m.p_value.log10()),
            config.point_size,
            color.filled(),
        )
    }))?;

    // Legend: one swatch per r² bin, plus marker shapes when the scatter
    // distinguishes genotyped from imputed calls.
    for (i, edge) in R2_THRESHOLDS.iter().skip(1).enumerate() {
        let color = theme.r2_colors[i];
        chart
            .draw_series(std::iter::once(Circle::new(
                (x_range.start, -1.0),
                0,
                color.filled(),
            )))?
            .label(format!("r² ≤ {:.1}", edge))
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 4), (x + 8, y + 4)], color.filled())
            });
    }
    if !imputed.is_empty() {
        let text = theme.text;
        chart
            .draw_series(std::iter::once(Circle::new(
                (x_range.start, -1.0),
                0,
                text.filled(),
            )))?
            .label("Genotyped")
            .legend(move |(x, y)| Circle::new((x + 4, y), 3, text.filled()));
        chart
            .draw_series(std::iter::once(TriangleMarker::new(
                (x_range.start, -1.0),
                0,
                text.filled(),
            )))?
            .label("Imputed")
            .legend(move |(x, y)| TriangleMarker::new((x + 4, y), 3, text.filled()));
    }
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(theme.background.mix(0.85))
        .border_style(&theme.axis)
        .label_font(("sans-serif", 11).into_font().color(&theme.text))
        .draw()?;

    // Annotation panel.
    let min_row = scene
        .annotations
        .as_ref()
        .map(|t| t.min_row)
        .unwrap_or(0);
    let y_bottom = (min_row as f64 - 1.0).min(-1.0);

    let mut track = ChartBuilder::on(&lower)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(70)
        .build_cartesian_2d(x_range.clone(), y_bottom..1.0)?;

    track
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_y_axis()
        .x_desc(format!("Position on chr{} (Mb)", scene.chrom))
        .axis_style(&theme.axis)
        .x_label_style(("sans-serif", 12).into_font().color(&theme.text))
        .axis_desc_style(("sans-serif", 14).into_font().color(&theme.text))
        .draw()?;

    if let Some(layout) = &scene.annotations {
        let label_style = ("sans-serif", config.annotation_font_size)
            .into_font()
            .color(&theme.annotation)
            .pos(Pos::new(HPos::Center, VPos::Top));

        for placed in &layout.placed {
            let x0 = placed.start as f64 / 1e6;
            let x1 = placed.end as f64 / 1e6;
            let y = placed.row as f64;

            if placed.end - placed.start < SMALL_FEATURE_BP {
                track.draw_series(std::iter::once(Circle::new(
                    ((x0 + x1) / 2.0, y),
                    2,
                    theme.annotation.filled(),
                )))?;
            } else {
                track.draw_series(LineSeries::new(
                    vec![(x0, y), (x1, y)],
                    theme.annotation.stroke_width(2),
                ))?;
            }

            track.draw_series(std::iter::once(Text::new(
                placed.label.clone(),
                ((x0 + x1) / 2.0, y - 0.15),
                label_style.clone(),
            )))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionplot_core::{GeneticMapPoint, Strand};

    fn toy_scene(annotations: Option<TrackLayout>) -> RegionScene {
        RegionScene {
            chrom: "1".to_string(),
            start: 0,
            end: 1_000_000,
            markers: vec![
                RegionMarker {
                    pos: 500_000,
                    p_value: 1e-10,
                    r2: 1.0,
                    imputed: false,
                },
                RegionMarker {
                    pos: 520_000,
                    p_value: 1e-4,
                    r2: 0.5,
                    imputed: true,
                },
                RegionMarker {
                    pos: 700_000,
                    p_value: 0.2,
                    r2: 0.0,
                    imputed: false,
                },
            ],
            genetic_map: vec![
                GeneticMapPoint { pos: 0, rate: 12.0 },
                GeneticMapPoint {
                    pos: 1_000_000,
                    rate: 35.0,
                },
            ],
            annotations,
        }
    }

    #[test]
    fn test_layout_uses_renderer_measure() {
        let features = vec![
            GeneFeature {
                start: 200_000,
                end: 400_000,
                strand: Strand::Forward,
                label: "GENE1".to_string(),
            },
            GeneFeature {
                start: 600_000,
                end: 800_000,
                strand: Strand::Reverse,
                label: "GENE2".to_string(),
            },
        ];
        let layout =
            layout_annotation_track(&features, 0, 1_000_000, &RegionPlotConfig::default())
                .unwrap();
        assert_eq!(layout.placed.len(), 2);
        assert!(layout.placed.iter().all(|p| p.row == 0));
    }

    #[test]
    fn test_render_svg_smoke() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chr1_0-1000000.svg");

        let features = vec![GeneFeature {
            start: 200_000,
            end: 400_000,
            strand: Strand::Forward,
            label: "GENE1".to_string(),
        }];
        let config = RegionPlotConfig::default();
        let layout = layout_annotation_track(&features, 0, 1_000_000, &config).unwrap();

        render_region(&toy_scene(Some(layout)), &path, &config).unwrap();
        let data = std::fs::read_to_string(&path).unwrap();
        assert!(data.starts_with("<svg") || data.contains("<svg"));
    }

    #[test]
    fn test_render_without_annotation_track() {
        // A locus whose layout failed still renders, just without genes.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.svg");
        render_region(&toy_scene(None), &path, &RegionPlotConfig::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let scene = toy_scene(None);
        let err = render_region(&scene, "plot.gif", &RegionPlotConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported output format"));
    }
}
