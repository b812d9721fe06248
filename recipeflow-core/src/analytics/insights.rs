use super::stats::{frequency, mean, pearson, ranked};
use crate::rules::NumericCell;
use crate::types::*;
use chrono::{DateTime, NaiveDateTime, Timelike};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

const HOURS_PER_DAY: u32 = 24;
const NAIVE_TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Interaction tallies for one recipe
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecipeEngagement {
    pub views: usize,
    pub likes: usize,
    pub attempts: usize,
    /// Every interaction, whatever its type
    pub total: usize,
    pub rating_sum: f64,
    pub rating_count: usize,
}

impl RecipeEngagement {
    pub fn average_rating(&self) -> Option<f64> {
        (self.rating_count > 0).then(|| self.rating_sum / self.rating_count as f64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewsPerMinute {
    pub recipe_id: String,
    pub views: usize,
    pub total_minutes: Option<f64>,
    /// None when total_minutes is absent or zero
    pub views_per_minute: Option<f64>,
}

/// Every aggregate of the insights summary plus the per-recipe series the charts draw.
///
/// Aggregates are computed independently; one without usable input comes out
/// as `None` or an empty list and the others are unaffected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insights {
    pub recipe_count: usize,
    pub interaction_count: usize,
    pub top_ingredients: Vec<(String, usize)>,
    pub average_prep_minutes: Option<f64>,
    pub difficulty_distribution: Vec<(String, usize)>,
    pub prep_likes_correlation: Option<f64>,
    pub most_viewed: Vec<(String, usize)>,
    pub ingredient_engagement: Vec<(String, f64)>,
    pub top_liked: Vec<(String, usize)>,
    pub average_ratings: Vec<(String, f64)>,
    pub views_per_minute: Vec<ViewsPerMinute>,
    pub top_attempters: Vec<(String, usize)>,
    pub tag_distribution: Vec<(String, usize)>,
    pub active_users: Vec<(String, usize)>,
    /// Interactions per hour of day, all 24 hours once any timestamp parses
    pub hourly_trend: Vec<(u32, usize)>,

    // Chart series
    pub engagement: BTreeMap<String, RecipeEngagement>,
    /// (prep minutes, likes) per recipe with a numeric prep time
    pub prep_vs_likes: Vec<(f64, f64)>,
    /// Mean of per-recipe average ratings, by difficulty
    pub difficulty_ratings: Vec<(String, f64)>,
}

/// Computes the insights aggregates over normalized tables
pub struct RecipeAnalytics;

impl RecipeAnalytics {
    pub fn compute(tables: &NormalizedTables, top_n: usize) -> Insights {
        let engagement = Self::engagement_by_recipe(&tables.interactions);
        let prep_vs_likes = Self::prep_vs_likes(&tables.recipes, &engagement);
        let most_viewed = ranked(
            engagement
                .iter()
                .filter(|(_, e)| e.views > 0)
                .map(|(id, e)| (id.clone(), e.views)),
            top_n,
        );

        Insights {
            recipe_count: tables.recipes.len(),
            interaction_count: tables.interactions.len(),
            top_ingredients: ranked(
                frequency(tables.ingredients.iter().map(|i| i.name.as_str())),
                top_n,
            ),
            average_prep_minutes: Self::average_prep(&tables.recipes),
            difficulty_distribution: Self::difficulty_distribution(&tables.recipes),
            prep_likes_correlation: pearson(&prep_vs_likes),
            views_per_minute: Self::views_per_minute(&most_viewed, &tables.recipes, top_n),
            most_viewed,
            ingredient_engagement: Self::ingredient_engagement(tables, &engagement, top_n),
            top_liked: ranked(
                engagement
                    .iter()
                    .filter(|(_, e)| e.likes > 0)
                    .map(|(id, e)| (id.clone(), e.likes)),
                top_n,
            ),
            average_ratings: ranked(
                engagement
                    .iter()
                    .filter_map(|(id, e)| e.average_rating().map(|r| (id.clone(), r))),
                top_n,
            ),
            top_attempters: ranked(
                frequency(
                    tables
                        .interactions
                        .iter()
                        .filter(|i| i.interaction_type() == Some(InteractionType::Attempt))
                        .map(|i| i.user_id.as_str()),
                ),
                top_n,
            ),
            tag_distribution: ranked(
                frequency(tables.recipes.iter().flat_map(|r| r.tag_list())),
                usize::MAX,
            ),
            active_users: ranked(
                frequency(tables.interactions.iter().map(|i| i.user_id.as_str())),
                top_n,
            ),
            hourly_trend: Self::hourly_trend(&tables.interactions),
            difficulty_ratings: Self::difficulty_ratings(&tables.recipes, &engagement),
            prep_vs_likes,
            engagement,
        }
    }

    fn engagement_by_recipe(interactions: &[InteractionRow]) -> BTreeMap<String, RecipeEngagement> {
        let mut engagement: BTreeMap<String, RecipeEngagement> = BTreeMap::new();

        for interaction in interactions {
            let recipe_id = interaction.recipe_id.trim();
            if recipe_id.is_empty() {
                continue;
            }

            let entry = engagement.entry(recipe_id.to_string()).or_default();
            entry.total += 1;
            match interaction.interaction_type() {
                Some(InteractionType::View) => entry.views += 1,
                Some(InteractionType::Like) => entry.likes += 1,
                Some(InteractionType::Attempt) => entry.attempts += 1,
                None => {}
            }
            if let Some(rating) = NumericCell::parse(&interaction.rating).finite() {
                entry.rating_sum += rating;
                entry.rating_count += 1;
            }
        }

        engagement
    }

    fn average_prep(recipes: &[RecipeRow]) -> Option<f64> {
        let prep: Vec<f64> = recipes
            .iter()
            .filter_map(|r| NumericCell::parse(&r.prep_minutes).finite())
            .collect();
        mean(&prep)
    }

    fn difficulty_distribution(recipes: &[RecipeRow]) -> Vec<(String, usize)> {
        let difficulties: Vec<String> = recipes
            .iter()
            .map(|r| r.difficulty.trim().to_lowercase())
            .collect();
        ranked(frequency(difficulties.iter().map(String::as_str)), usize::MAX)
    }

    /// Recipes without likes count as zero likes.
    fn prep_vs_likes(
        recipes: &[RecipeRow],
        engagement: &BTreeMap<String, RecipeEngagement>,
    ) -> Vec<(f64, f64)> {
        recipes
            .iter()
            .filter_map(|recipe| {
                let prep = NumericCell::parse(&recipe.prep_minutes).finite()?;
                let likes = engagement
                    .get(recipe.recipe_id.trim())
                    .map_or(0, |e| e.likes);
                Some((prep, likes as f64))
            })
            .collect()
    }

    /// Mean interaction count of the recipes each ingredient appears in.
    /// Ingredients whose recipe is not in the recipe table are ignored.
    fn ingredient_engagement(
        tables: &NormalizedTables,
        engagement: &BTreeMap<String, RecipeEngagement>,
        top_n: usize,
    ) -> Vec<(String, f64)> {
        let known: HashSet<&str> = tables.recipes.iter().map(|r| r.recipe_id.trim()).collect();
        let mut scores: HashMap<String, Vec<f64>> = HashMap::new();

        for ingredient in &tables.ingredients {
            let name = ingredient.name.trim();
            let recipe_id = ingredient.recipe_id.trim();
            if name.is_empty() || !known.contains(recipe_id) {
                continue;
            }
            let total = engagement.get(recipe_id).map_or(0, |e| e.total);
            scores.entry(name.to_string()).or_default().push(total as f64);
        }

        ranked(
            scores
                .into_iter()
                .filter_map(|(name, totals)| mean(&totals).map(|m| (name, m))),
            top_n,
        )
    }

    fn views_per_minute(
        most_viewed: &[(String, usize)],
        recipes: &[RecipeRow],
        top_n: usize,
    ) -> Vec<ViewsPerMinute> {
        let mut total_minutes: HashMap<&str, f64> = HashMap::new();
        for recipe in recipes {
            if let Some(total) = NumericCell::parse(&recipe.total_minutes).finite() {
                total_minutes.entry(recipe.recipe_id.trim()).or_insert(total);
            }
        }

        let mut rows: Vec<ViewsPerMinute> = most_viewed
            .iter()
            .map(|(recipe_id, views)| {
                let total = total_minutes.get(recipe_id.as_str()).copied();
                ViewsPerMinute {
                    recipe_id: recipe_id.clone(),
                    views: *views,
                    total_minutes: total,
                    views_per_minute: total.filter(|t| *t != 0.0).map(|t| *views as f64 / t),
                }
            })
            .collect();

        // Highest rate first, unknown rates last
        rows.sort_by(|a, b| {
            match (a.views_per_minute, b.views_per_minute) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| a.recipe_id.cmp(&b.recipe_id))
        });
        rows.truncate(top_n);
        rows
    }

    fn hourly_trend(interactions: &[InteractionRow]) -> Vec<(u32, usize)> {
        let mut per_hour = [0usize; HOURS_PER_DAY as usize];
        let mut parsed = 0;
        for hour in interactions.iter().filter_map(|i| hour_of(&i.timestamp)) {
            per_hour[hour as usize] += 1;
            parsed += 1;
        }

        if parsed == 0 {
            return Vec::new();
        }
        (0..HOURS_PER_DAY).zip(per_hour).collect()
    }

    fn difficulty_ratings(
        recipes: &[RecipeRow],
        engagement: &BTreeMap<String, RecipeEngagement>,
    ) -> Vec<(String, f64)> {
        let mut by_difficulty: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for recipe in recipes {
            let difficulty = recipe.difficulty.trim().to_lowercase();
            let rating = engagement
                .get(recipe.recipe_id.trim())
                .and_then(RecipeEngagement::average_rating);
            if let Some(rating) = rating.filter(|_| !difficulty.is_empty()) {
                by_difficulty.entry(difficulty).or_default().push(rating);
            }
        }

        by_difficulty
            .into_iter()
            .filter_map(|(difficulty, ratings)| mean(&ratings).map(|m| (difficulty, m)))
            .collect()
    }
}

/// Hour of day of a timestamp cell, in the timestamp's own offset.
fn hour_of(timestamp: &str) -> Option<u32> {
    let timestamp = timestamp.trim();
    if timestamp.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(parsed.hour());
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(timestamp, format).ok())
        .map(|parsed| parsed.hour())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: &str, prep: &str, total: &str, difficulty: &str, tags: &str) -> RecipeRow {
        RecipeRow {
            recipe_id: id.to_string(),
            title: id.to_uppercase(),
            prep_minutes: prep.to_string(),
            total_minutes: total.to_string(),
            difficulty: difficulty.to_string(),
            tags: tags.to_string(),
            ..Default::default()
        }
    }

    fn ingredient(recipe_id: &str, name: &str) -> IngredientRow {
        IngredientRow {
            recipe_id: recipe_id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn interaction(recipe_id: &str, kind: &str, user: &str, timestamp: &str, rating: &str) -> InteractionRow {
        InteractionRow {
            recipe_id: recipe_id.to_string(),
            kind: kind.to_string(),
            user_id: user.to_string(),
            timestamp: timestamp.to_string(),
            rating: rating.to_string(),
            ..Default::default()
        }
    }

    fn sample_tables() -> NormalizedTables {
        NormalizedTables {
            recipes: vec![
                recipe("r1", "10", "20", "easy", "quick|vegan"),
                recipe("r2", "30", "60", "Hard", "dinner"),
                recipe("r3", "", "0", "easy", "quick"),
            ],
            ingredients: vec![
                ingredient("r1", "salt"),
                ingredient("r1", "flour"),
                ingredient("r2", "salt"),
                ingredient("r3", "pepper"),
                ingredient("ghost", "saffron"),
            ],
            interactions: vec![
                interaction("r1", "view", "u1", "2024-05-01T09:15:00Z", ""),
                interaction("r1", "view", "u2", "2024-05-01T09:45:00Z", ""),
                interaction("r1", "like", "u1", "2024-05-02T18:00:00Z", ""),
                interaction("r2", "view", "u2", "2024-05-03 18:30:00", ""),
                interaction("r2", "like", "u2", "", ""),
                interaction("r2", "like", "u3", "not a time", ""),
                interaction("r2", "attempt", "u2", "", "4"),
                interaction("r2", "attempt", "u3", "", "2"),
                interaction("r3", "view", "u1", "", ""),
                interaction("r3", "attempt", "u2", "", "5"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_rankings_and_counts() {
        let insights = RecipeAnalytics::compute(&sample_tables(), 10);
        assert_eq!(insights.recipe_count, 3);
        assert_eq!(insights.interaction_count, 10);
        assert_eq!(insights.top_ingredients[0], ("salt".to_string(), 2));
        assert_eq!(
            insights.most_viewed,
            vec![("r1".to_string(), 2), ("r2".to_string(), 1), ("r3".to_string(), 1)]
        );
        assert_eq!(insights.top_liked, vec![("r2".to_string(), 2), ("r1".to_string(), 1)]);
        assert_eq!(insights.top_attempters, vec![("u2".to_string(), 2), ("u3".to_string(), 1)]);
        assert_eq!(insights.active_users[0], ("u2".to_string(), 5));
    }

    #[test]
    fn test_difficulty_distribution_is_case_insensitive() {
        let insights = RecipeAnalytics::compute(&sample_tables(), 10);
        assert_eq!(
            insights.difficulty_distribution,
            vec![("easy".to_string(), 2), ("hard".to_string(), 1)]
        );
    }

    #[test]
    fn test_average_prep_ignores_empty_cells() {
        let insights = RecipeAnalytics::compute(&sample_tables(), 10);
        assert_eq!(insights.average_prep_minutes, Some(20.0));
    }

    #[test]
    fn test_prep_likes_correlation() {
        let insights = RecipeAnalytics::compute(&sample_tables(), 10);
        // (10, 1) and (30, 2): two points on a rising line
        assert_eq!(insights.prep_vs_likes, vec![(10.0, 1.0), (30.0, 2.0)]);
        assert!((insights.prep_likes_correlation.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ingredient_engagement_skips_unknown_recipes() {
        let insights = RecipeAnalytics::compute(&sample_tables(), 10);
        let scores: HashMap<_, _> = insights.ingredient_engagement.iter().cloned().collect();
        // salt appears in r1 (3 interactions) and r2 (5 interactions)
        assert_eq!(scores.get("salt"), Some(&4.0));
        assert_eq!(scores.get("flour"), Some(&3.0));
        assert_eq!(scores.get("pepper"), Some(&2.0));
        assert!(!scores.contains_key("saffron"));
        assert_eq!(insights.ingredient_engagement[0].0, "salt");
    }

    #[test]
    fn test_ratings_average_per_recipe_and_difficulty() {
        let insights = RecipeAnalytics::compute(&sample_tables(), 10);
        assert_eq!(
            insights.average_ratings,
            vec![("r3".to_string(), 5.0), ("r2".to_string(), 3.0)]
        );
        assert_eq!(
            insights.difficulty_ratings,
            vec![("easy".to_string(), 5.0), ("hard".to_string(), 3.0)]
        );
    }

    #[test]
    fn test_views_per_minute_handles_zero_total() {
        let insights = RecipeAnalytics::compute(&sample_tables(), 10);
        let ids: Vec<&str> = insights.views_per_minute.iter().map(|v| v.recipe_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
        assert_eq!(insights.views_per_minute[0].views_per_minute, Some(0.1));
        assert_eq!(insights.views_per_minute[2].total_minutes, Some(0.0));
        assert_eq!(insights.views_per_minute[2].views_per_minute, None);
    }

    #[test]
    fn test_tags_and_hourly_trend() {
        let insights = RecipeAnalytics::compute(&sample_tables(), 10);
        assert_eq!(insights.tag_distribution[0], ("quick".to_string(), 2));
        assert_eq!(insights.hourly_trend.len(), 24);
        assert_eq!(insights.hourly_trend[9], (9, 2));
        assert_eq!(insights.hourly_trend[18], (18, 2));
        assert_eq!(insights.hourly_trend.iter().map(|(_, n)| n).sum::<usize>(), 4);
    }

    #[test]
    fn test_top_n_truncates() {
        let insights = RecipeAnalytics::compute(&sample_tables(), 1);
        assert_eq!(insights.most_viewed.len(), 1);
        assert_eq!(insights.top_ingredients.len(), 1);
        assert_eq!(insights.views_per_minute.len(), 1);
    }

    #[test]
    fn test_malformed_cells_only_affect_their_own_rows() {
        let clean = RecipeAnalytics::compute(&sample_tables(), 10);

        let mut tables = sample_tables();
        tables.recipes.push(recipe("bad_prep", "NaN", "inf", "easy", ""));
        tables.recipes.push(recipe("junk", "soon", "-inf", "", ""));
        tables.interactions.push(interaction("r2", "attempt", "u9", "yesterday", "NaN"));
        tables.interactions.push(interaction("r3", "attempt", "u9", "25:99", "inf"));
        tables.interactions.push(interaction("bad_prep", "view", "u9", "", "lots"));

        let insights = RecipeAnalytics::compute(&tables, 10);
        assert_eq!(insights.average_prep_minutes, clean.average_prep_minutes);
        assert_eq!(insights.prep_vs_likes, clean.prep_vs_likes);
        assert_eq!(insights.prep_likes_correlation, clean.prep_likes_correlation);
        assert_eq!(insights.average_ratings, clean.average_ratings);
        assert_eq!(insights.difficulty_ratings, clean.difficulty_ratings);
        assert_eq!(insights.hourly_trend, clean.hourly_trend);
        assert_eq!(insights.top_ingredients, clean.top_ingredients);

        // the bad rows still count where their other cells are usable
        assert_eq!(insights.recipe_count, 5);
        let bad = insights
            .views_per_minute
            .iter()
            .find(|v| v.recipe_id == "bad_prep")
            .unwrap();
        assert_eq!(bad.total_minutes, None);
        assert_eq!(bad.views_per_minute, None);
        assert!(insights.top_attempters.contains(&("u9".to_string(), 2)));
    }

    #[test]
    fn test_many_nan_ratings_do_not_break_rankings() {
        let interactions = (0..200)
            .map(|i| {
                let rating = if i % 3 == 0 { "NaN".to_string() } else { (i % 5 + 1).to_string() };
                interaction(&format!("r{}", i % 40), "attempt", "u1", "", &rating)
            })
            .collect();
        let tables = NormalizedTables {
            interactions,
            ..Default::default()
        };

        let insights = RecipeAnalytics::compute(&tables, 10);
        assert_eq!(insights.average_ratings.len(), 10);
        assert!(insights.average_ratings.iter().all(|(_, r)| r.is_finite()));
        assert!(insights
            .average_ratings
            .windows(2)
            .all(|pair| pair[0].1 >= pair[1].1));
    }

    #[test]
    fn test_empty_tables_degrade_gracefully() {
        let insights = RecipeAnalytics::compute(&NormalizedTables::default(), 10);
        assert_eq!(insights.average_prep_minutes, None);
        assert_eq!(insights.prep_likes_correlation, None);
        assert!(insights.top_ingredients.is_empty());
        assert!(insights.hourly_trend.is_empty());
    }
}
