//! SVG charts for batch results

use plotters::prelude::*;

use crate::core::component::ComponentError;
use crate::model::{RiskDistribution, RiskLevel, ScoreBin};

const CHART_SIZE: (u32, u32) = (560, 360);
const SCORE_BAR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);

/// Bar chart of account counts per risk level
pub fn render_level_chart(distribution: &RiskDistribution) -> Result<String, ComponentError> {
    let max_count = RiskLevel::ALL
        .iter()
        .map(|level| distribution.count(*level))
        .max()
        .unwrap_or(0)
        .max(1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Accounts by Risk Level", ("sans-serif", 20))
            .margin(12)
            .x_label_area_size(36)
            .y_label_area_size(44)
            .build_cartesian_2d((0u32..3u32).into_segmented(), 0u64..max_count + max_count / 10 + 1)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc("Accounts")
            .x_label_formatter(&|value| match value {
                SegmentValue::CenterOf(index) => RiskLevel::ALL
                    .get(*index as usize)
                    .map(|level| level.label().to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(RiskLevel::ALL.iter().enumerate().map(|(index, level)| {
                let (r, g, b) = level.color_rgb();
                let index = index as u32;
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(index), 0),
                        (SegmentValue::Exact(index + 1), distribution.count(*level)),
                    ],
                    RGBColor(r, g, b).filled(),
                );
                bar.set_margin(0, 0, 18, 18);
                bar
            }))
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    Ok(svg)
}

/// Histogram of risk scores
pub fn render_score_histogram(bins: &[ScoreBin]) -> Result<String, ComponentError> {
    let max_count = bins.iter().map(|bin| bin.count).max().unwrap_or(0).max(1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Distribution of Risk Scores", ("sans-serif", 20))
            .margin(12)
            .x_label_area_size(36)
            .y_label_area_size(44)
            .build_cartesian_2d(0f64..100f64, 0u64..max_count + 1)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Risk Score")
            .y_desc("Accounts")
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(bins.iter().filter(|bin| bin.count > 0).map(|bin| {
                let mut bar = Rectangle::new([(bin.lower, 0), (bin.upper, bin.count)], SCORE_BAR.filled());
                bar.set_margin(0, 0, 1, 1);
                bar
            }))
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    Ok(svg)
}

fn chart_error(e: impl std::fmt::Display) -> ComponentError {
    ComponentError::ProcessingError(format!("Chart rendering failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_chart_is_svg() {
        let distribution = RiskDistribution {
            high_risk: 3,
            moderate_risk: 1,
            low_risk: 6,
            total: 10,
            avg_score: 37.5,
        };
        let svg = render_level_chart(&distribution).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Accounts by Risk Level"));
    }

    #[test]
    fn test_histogram_handles_empty_batch() {
        let bins: Vec<ScoreBin> = (0..20)
            .map(|i| ScoreBin { lower: i as f64 * 5.0, upper: (i + 1) as f64 * 5.0, count: 0 })
            .collect();
        let svg = render_score_histogram(&bins).unwrap();
        assert!(svg.contains("</svg>"));
    }
}
