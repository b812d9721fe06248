// Descriptive analytics over the normalized tables
// - stats.rs: frequency, mean, correlation and ranking helpers
// - insights.rs: the aggregate computations
// - report.rs: markdown summary
// - charts.rs: SVG charts (behind the `charts` feature)

pub mod charts;
pub mod insights;
pub mod report;
pub mod stats;

pub use charts::{render_charts, ChartSummary};
pub use insights::{Insights, RecipeAnalytics, RecipeEngagement, ViewsPerMinute};
pub use report::render_markdown;

use anyhow::{Context, Result};
use std::path::Path;

/// Write the markdown summary, creating its directory as needed.
pub fn write_insights(insights: &Insights, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_markdown(insights))
        .with_context(|| format!("Failed to write {}", path.display()))
}
