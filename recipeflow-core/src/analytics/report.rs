use super::insights::Insights;
use std::fmt::Display;
use std::fmt::Write;

const NO_DATA: &str = "_No data available._";

/// Render the insights summary as markdown.
pub fn render_markdown(insights: &Insights) -> String {
    let mut md = String::new();
    md.push_str("# Recipe Insights\n\n");
    let _ = writeln!(md, "Recipes analysed: {}  ", insights.recipe_count);
    let _ = writeln!(md, "Interactions analysed: {}\n", insights.interaction_count);

    section(&mut md, "1. Most common ingredients");
    table(&mut md, ["ingredient", "count"], &insights.top_ingredients);

    section(&mut md, "2. Average preparation time (minutes)");
    scalar(&mut md, insights.average_prep_minutes);

    section(&mut md, "3. Difficulty distribution");
    table(&mut md, ["difficulty", "count"], &insights.difficulty_distribution);

    section(&mut md, "4. Correlation between prep time and likes");
    match insights.prep_likes_correlation {
        Some(r) => {
            let _ = writeln!(md, "Correlation (Pearson) = {r:.3}\n");
        }
        None => md.push_str("Correlation (Pearson) = n/a (not enough varied data)\n\n"),
    }

    section(&mut md, "5. Most frequently viewed recipes");
    table(&mut md, ["recipe_id", "views"], &insights.most_viewed);

    section(
        &mut md,
        "6. Ingredients associated with high engagement (avg interactions per recipe containing the ingredient)",
    );
    let engagement: Vec<(String, String)> = insights
        .ingredient_engagement
        .iter()
        .map(|(name, score)| (name.clone(), format!("{score:.2}")))
        .collect();
    table(&mut md, ["ingredient", "engagement"], &engagement);

    section(&mut md, "7. Top liked recipes");
    table(&mut md, ["recipe_id", "likes"], &insights.top_liked);

    section(&mut md, "8. Average rating per recipe");
    let ratings: Vec<(String, String)> = insights
        .average_ratings
        .iter()
        .map(|(id, rating)| (id.clone(), format!("{rating:.2}")))
        .collect();
    table(&mut md, ["recipe_id", "rating"], &ratings);

    section(&mut md, "9. Views per minute (per recipe)");
    if insights.views_per_minute.is_empty() {
        no_data(&mut md);
    } else {
        md.push_str("| recipe_id | views | total_minutes | views_per_min |\n");
        md.push_str("| --- | --- | --- | --- |\n");
        for row in &insights.views_per_minute {
            let _ = writeln!(
                md,
                "| {} | {} | {} | {} |",
                row.recipe_id,
                row.views,
                optional(row.total_minutes, 0),
                optional(row.views_per_minute, 3),
            );
        }
        md.push('\n');
    }

    section(&mut md, "10. Users with most attempts");
    table(&mut md, ["user_id", "attempts"], &insights.top_attempters);

    section(&mut md, "11. Tag distribution");
    table(&mut md, ["tag", "count"], &insights.tag_distribution);

    section(&mut md, "12. Most active users");
    table(&mut md, ["user_id", "interactions"], &insights.active_users);

    section(&mut md, "13. Interactions by hour of day");
    table(&mut md, ["hour", "interactions"], &insights.hourly_trend);

    md
}

fn section(md: &mut String, title: &str) {
    let _ = writeln!(md, "## {title}\n");
}

fn no_data(md: &mut String) {
    md.push_str(NO_DATA);
    md.push_str("\n\n");
}

fn scalar(md: &mut String, value: Option<f64>) {
    match value {
        Some(value) => {
            let _ = writeln!(md, "{value:.2}\n");
        }
        None => no_data(md),
    }
}

fn table<K: Display, V: Display>(md: &mut String, headers: [&str; 2], rows: &[(K, V)]) {
    if rows.is_empty() {
        no_data(md);
        return;
    }
    let _ = writeln!(md, "| {} | {} |", headers[0], headers[1]);
    md.push_str("| --- | --- |\n");
    for (key, value) in rows {
        let _ = writeln!(md, "| {key} | {value} |");
    }
    md.push('\n');
}

fn optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}
