//! SVG chart rendering for the insights summary.
//!
//! Every chart is drawn on its own: a chart with no data is skipped and a
//! chart that fails to render is logged, neither stops the rest.

use super::insights::Insights;
use std::path::{Path, PathBuf};

/// Outcome of one rendering pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartSummary {
    pub written: Vec<PathBuf>,
    /// (chart name, reason)
    pub skipped: Vec<(String, String)>,
}

#[cfg(feature = "charts")]
pub fn render_charts(insights: &Insights, dir: &Path) -> ChartSummary {
    let mut summary = ChartSummary::default();
    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "cannot create chart directory");
        summary.skipped.push(("all".to_string(), e.to_string()));
        return summary;
    }

    for (name, draw) in svg::CHARTS {
        let path = dir.join(format!("{name}.svg"));
        match draw(insights, &path) {
            Ok(true) => summary.written.push(path),
            Ok(false) => {
                tracing::debug!(chart = name, "no data, chart skipped");
                summary.skipped.push((name.to_string(), "no data".to_string()));
            }
            Err(e) => {
                tracing::warn!(chart = name, error = %e, "chart rendering failed");
                summary.skipped.push((name.to_string(), e.to_string()));
            }
        }
    }

    summary
}

#[cfg(not(feature = "charts"))]
pub fn render_charts(_insights: &Insights, dir: &Path) -> ChartSummary {
    tracing::warn!(dir = %dir.display(), "built without the `charts` feature, chart output skipped");
    ChartSummary {
        written: Vec::new(),
        skipped: vec![("all".to_string(), "charts feature disabled".to_string())],
    }
}

#[cfg(feature = "charts")]
mod svg {
    use super::super::insights::Insights;
    use anyhow::Result;
    use plotters::prelude::*;
    use std::path::Path;

    const SIZE: (u32, u32) = (960, 540);
    const CAPTION_FONT: (&str, u32) = ("sans-serif", 24);

    const PRIMARY: RGBColor = RGBColor(0x3A, 0x7F, 0xDB);
    const SECONDARY: RGBColor = RGBColor(0x34, 0xA8, 0x53);
    const TERTIARY: RGBColor = RGBColor(0xF4, 0xB4, 0x00);
    const DANGER: RGBColor = RGBColor(0xEA, 0x43, 0x35);
    const PURPLE: RGBColor = RGBColor(0x9B, 0x59, 0xB6);
    const CYAN: RGBColor = RGBColor(0x17, 0xA2, 0xB8);

    /// A chart writer returns Ok(false) when it has nothing to draw.
    type DrawFn = fn(&Insights, &Path) -> Result<bool>;

    pub(super) const CHARTS: [(&str, DrawFn); 10] = [
        ("top_ingredients", top_ingredients),
        ("difficulty_distribution", difficulty_distribution),
        ("likes_vs_views", likes_vs_views),
        ("engagement_score", engagement_score),
        ("prep_time_vs_likes", prep_time_vs_likes),
        ("tags_distribution", tags_distribution),
        ("difficulty_vs_rating", difficulty_vs_rating),
        ("active_users", active_users),
        ("hourly_trend", hourly_trend),
        ("attempts_vs_likes", attempts_vs_likes),
    ];

    fn top_ingredients(insights: &Insights, path: &Path) -> Result<bool> {
        let bars = as_bars(&insights.top_ingredients);
        bar_chart(path, "Top Ingredients", "Recipes", &bars, PRIMARY)
    }

    fn difficulty_distribution(insights: &Insights, path: &Path) -> Result<bool> {
        let bars = as_bars(&insights.difficulty_distribution);
        bar_chart(path, "Difficulty Distribution", "Recipes", &bars, TERTIARY)
    }

    fn likes_vs_views(insights: &Insights, path: &Path) -> Result<bool> {
        let points: Vec<(f64, f64)> = insights
            .engagement
            .values()
            .filter(|e| e.views > 0 || e.likes > 0)
            .map(|e| (e.views as f64, e.likes as f64))
            .collect();
        scatter_chart(path, "Likes vs Views", ("Views", "Likes"), &points, PRIMARY)
    }

    fn engagement_score(insights: &Insights, path: &Path) -> Result<bool> {
        let mut bars: Vec<(String, f64)> = insights
            .engagement
            .iter()
            .map(|(id, e)| (id.clone(), e.total as f64))
            .collect();
        bars.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        bar_chart(path, "Recipe Engagement Score", "Interactions", &bars, SECONDARY)
    }

    fn prep_time_vs_likes(insights: &Insights, path: &Path) -> Result<bool> {
        scatter_chart(
            path,
            "Prep Time vs Likes",
            ("Prep time (minutes)", "Likes"),
            &insights.prep_vs_likes,
            TERTIARY,
        )
    }

    fn tags_distribution(insights: &Insights, path: &Path) -> Result<bool> {
        let bars = as_bars(&insights.tag_distribution);
        bar_chart(path, "Recipe Tags Distribution", "Count", &bars, PURPLE)
    }

    fn difficulty_vs_rating(insights: &Insights, path: &Path) -> Result<bool> {
        bar_chart(
            path,
            "Difficulty vs Average Rating",
            "Avg rating",
            &insights.difficulty_ratings,
            CYAN,
        )
    }

    fn active_users(insights: &Insights, path: &Path) -> Result<bool> {
        let bars = as_bars(&insights.active_users);
        bar_chart(path, "Most Active Users", "Activity count", &bars, DANGER)
    }

    fn hourly_trend(insights: &Insights, path: &Path) -> Result<bool> {
        if insights.hourly_trend.is_empty() {
            return Ok(false);
        }
        let max = insights
            .hourly_trend
            .iter()
            .map(|(_, n)| *n as f64)
            .fold(0.0, f64::max);

        let root = SVGBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Hourly Interaction Trend", CAPTION_FONT)
            .margin(16)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0u32..23u32, 0f64..headroom(max))?;
        chart
            .configure_mesh()
            .x_desc("Hour")
            .y_desc("Interactions")
            .draw()?;
        chart.draw_series(LineSeries::new(
            insights.hourly_trend.iter().map(|(hour, n)| (*hour, *n as f64)),
            PRIMARY.stroke_width(2),
        ))?;
        root.present()?;
        Ok(true)
    }

    fn attempts_vs_likes(insights: &Insights, path: &Path) -> Result<bool> {
        let rows: Vec<(&str, f64, f64)> = insights
            .engagement
            .iter()
            .filter(|(_, e)| e.attempts > 0 || e.likes > 0)
            .map(|(id, e)| (id.as_str(), e.attempts as f64, e.likes as f64))
            .collect();
        if rows.is_empty() {
            return Ok(false);
        }
        let max = rows.iter().map(|(_, a, l)| a + l).fold(0.0, f64::max);
        let labels: Vec<&str> = rows.iter().map(|(id, _, _)| *id).collect();

        let root = SVGBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Attempts vs Likes per Recipe", CAPTION_FONT)
            .margin(16)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d((0..rows.len()).into_segmented(), 0f64..headroom(max))?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc("Count")
            .x_labels(rows.len())
            .x_label_formatter(&|v: &SegmentValue<usize>| segment_label(&labels, v))
            .draw()?;

        chart
            .draw_series(rows.iter().enumerate().map(|(i, (_, attempts, _))| {
                segment_bar(i, 0.0, *attempts, SECONDARY)
            }))?
            .label("attempts")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], SECONDARY.filled()));
        chart
            .draw_series(rows.iter().enumerate().map(|(i, (_, attempts, likes))| {
                segment_bar(i, *attempts, attempts + likes, PRIMARY)
            }))?
            .label("likes")
            .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], PRIMARY.filled()));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        root.present()?;
        Ok(true)
    }

    fn bar_chart(
        path: &Path,
        title: &str,
        y_desc: &str,
        bars: &[(String, f64)],
        color: RGBColor,
    ) -> Result<bool> {
        if bars.is_empty() {
            return Ok(false);
        }
        let max = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max);
        let labels: Vec<&str> = bars.iter().map(|(label, _)| label.as_str()).collect();

        let root = SVGBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, CAPTION_FONT)
            .margin(16)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d((0..bars.len()).into_segmented(), 0f64..headroom(max))?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(y_desc)
            .x_labels(bars.len())
            .x_label_formatter(&|v: &SegmentValue<usize>| segment_label(&labels, v))
            .draw()?;
        chart.draw_series(
            bars.iter()
                .enumerate()
                .map(|(i, (_, value))| segment_bar(i, 0.0, *value, color)),
        )?;
        root.present()?;
        Ok(true)
    }

    fn scatter_chart(
        path: &Path,
        title: &str,
        (x_desc, y_desc): (&str, &str),
        points: &[(f64, f64)],
        color: RGBColor,
    ) -> Result<bool> {
        if points.is_empty() {
            return Ok(false);
        }
        let max_x = points.iter().map(|(x, _)| *x).fold(0.0, f64::max);
        let max_y = points.iter().map(|(_, y)| *y).fold(0.0, f64::max);

        let root = SVGBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, CAPTION_FONT)
            .margin(16)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..headroom(max_x), 0f64..headroom(max_y))?;
        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .draw()?;
        chart.draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 5, color.mix(0.7).filled())),
        )?;
        root.present()?;
        Ok(true)
    }

    fn segment_bar(
        index: usize,
        from: f64,
        to: f64,
        color: RGBColor,
    ) -> Rectangle<(SegmentValue<usize>, f64)> {
        let mut bar = Rectangle::new(
            [
                (SegmentValue::Exact(index), from),
                (SegmentValue::Exact(index + 1), to),
            ],
            color.filled(),
        );
        bar.set_margin(0, 0, 6, 6);
        bar
    }

    fn segment_label(labels: &[&str], value: &SegmentValue<usize>) -> String {
        match value {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                labels.get(*i).map(|l| l.to_string()).unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        }
    }

    fn as_bars(counts: &[(String, usize)]) -> Vec<(String, f64)> {
        counts
            .iter()
            .map(|(label, count)| (label.clone(), *count as f64))
            .collect()
    }

    /// Upper axis bound with a little room above the tallest value
    fn headroom(max: f64) -> f64 {
        if max <= 0.0 {
            1.0
        } else {
            max * 1.1
        }
    }
}

#[cfg(all(test, feature = "charts"))]
mod tests {
    use super::*;
    use crate::analytics::insights::RecipeAnalytics;
    use crate::types::*;

    fn tables() -> NormalizedTables {
        let recipe = |id: &str, prep: &str, difficulty: &str| RecipeRow {
            recipe_id: id.to_string(),
            title: id.to_string(),
            prep_minutes: prep.to_string(),
            difficulty: difficulty.to_string(),
            tags: "quick".to_string(),
            ..Default::default()
        };
        let interaction = |recipe_id: &str, kind: &str, rating: &str| InteractionRow {
            recipe_id: recipe_id.to_string(),
            kind: kind.to_string(),
            user_id: "u1".to_string(),
            timestamp: "2024-05-01T10:00:00Z".to_string(),
            rating: rating.to_string(),
            ..Default::default()
        };
        NormalizedTables {
            recipes: vec![recipe("r1", "10", "easy"), recipe("r2", "25", "hard")],
            ingredients: vec![IngredientRow {
                recipe_id: "r1".to_string(),
                name: "salt".to_string(),
                ..Default::default()
            }],
            interactions: vec![
                interaction("r1", "view", ""),
                interaction("r1", "like", ""),
                interaction("r2", "attempt", "4"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_all_charts_written() {
        let dir = tempfile::tempdir().unwrap();
        let insights = RecipeAnalytics::compute(&tables(), 10);
        let summary = render_charts(&insights, dir.path());

        assert!(summary.skipped.is_empty(), "skipped: {:?}", summary.skipped);
        assert_eq!(summary.written.len(), 10);
        for path in &summary.written {
            let svg = std::fs::read_to_string(path).unwrap();
            assert!(svg.contains("<svg"));
        }
    }

    #[test]
    fn test_empty_insights_skip_every_chart() {
        let dir = tempfile::tempdir().unwrap();
        let summary = render_charts(&Insights::default(), dir.path());
        assert!(summary.written.is_empty());
        assert_eq!(summary.skipped.len(), 10);
    }
}
