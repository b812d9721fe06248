//! Synthetic data generator for the document store.
//!
//! Generation and writing are separate steps: [`Seeder::generate`] builds
//! every document in memory, [`seed_store`] upserts them. Fix
//! `seed.rng_seed` in the config to get the same dataset on every run.

use crate::config::{CountRange, SeedConfig};
use crate::normalize::synthesize_id;
use crate::store::DocumentStore;
use crate::types::{collections, Difficulty, Document, InteractionType};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::path::Path;

/// Ingredients synthetic recipes draw from
const BASE_INGREDIENTS: &[(&str, u32, &str)] = &[
    ("flour", 100, "g"),
    ("sugar", 50, "g"),
    ("salt", 1, "tsp"),
    ("butter", 20, "g"),
    ("milk", 100, "ml"),
];

const TAGS: &[&str] = &[
    "breakfast",
    "lunch",
    "dinner",
    "dessert",
    "quick",
    "vegan",
    "vegetarian",
];

const SERVINGS: &[u32] = &[1, 2, 4];

/// Documents ready to upsert, keyed by document id
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub recipes: Vec<(String, Document)>,
    pub users: Vec<(String, Document)>,
    pub interactions: Vec<(String, Document)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub recipes: usize,
    pub users: usize,
    pub interactions: usize,
}

pub struct Seeder {
    config: SeedConfig,
    rng: StdRng,
}

impl Seeder {
    pub fn new(config: SeedConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    /// Read the hand-written candidate recipe. A missing file is not fatal:
    /// seeding goes ahead with synthetic recipes only.
    pub fn load_candidate(&self) -> Result<Option<Document>> {
        load_candidate_recipe(&self.config.candidate_recipe)
    }

    /// Build every recipe, user and interaction document.
    pub fn generate(&mut self, candidate: Option<Document>, now: DateTime<Utc>) -> SeedData {
        let mut data = SeedData::default();

        if let Some(mut candidate) = candidate {
            let total = sum_minutes(candidate.get("prep_minutes"), candidate.get("cook_minutes"));
            candidate.insert("total_minutes".to_string(), total);
            let id = candidate
                .get("id")
                .and_then(Value::as_str)
                .filter(|id| !id.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| synthesize_id("recipe", 0, &candidate));
            candidate.insert("id".to_string(), Value::String(id.clone()));
            data.recipes.push((id, candidate));
        }

        for index in 1..=self.config.synthetic_recipes {
            data.recipes.push(self.synthetic_recipe(index));
        }

        for index in 1..=self.config.users {
            let uid = format!("user_{index:03}");
            let user = json!({
                "uid": uid,
                "name": format!("User {index}"),
                "joined_at": now.to_rfc3339_opts(SecondsFormat::Secs, true),
            });
            data.users.push((uid, to_document(user)));
        }

        let user_ids: Vec<String> = data.users.iter().map(|(id, _)| id.clone()).collect();
        let recipe_ids: Vec<String> = data.recipes.iter().map(|(id, _)| id.clone()).collect();
        for recipe_id in &recipe_ids {
            let mut batch = self.interactions_for(recipe_id, &user_ids, now);
            data.interactions.append(&mut batch);
        }

        data
    }

    fn synthetic_recipe(&mut self, index: u32) -> (String, Document) {
        let id = format!("synthetic_{index:03}");
        let title = format!("Synthetic Recipe {index}");
        let prep: u32 = self.rng.gen_range(5..=40);
        let cook: u32 = self.rng.gen_range(5..=60);
        let servings = SERVINGS.choose(&mut self.rng).copied().unwrap_or(2);
        let difficulty = Difficulty::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Difficulty::Medium);

        let ingredient_count = self.rng.gen_range(2..=BASE_INGREDIENTS.len());
        let ingredients: Vec<Value> = BASE_INGREDIENTS
            .choose_multiple(&mut self.rng, ingredient_count)
            .map(|(name, quantity, unit)| json!({ "name": name, "quantity": quantity, "unit": unit }))
            .collect();

        let step_count = self.rng.gen_range(2..=6);
        let steps: Vec<String> = (1..=step_count)
            .map(|n| format!("Step {n} for {title}"))
            .collect();

        let tag_count = self.rng.gen_range(1..=3);
        let tags: Vec<&str> = TAGS
            .choose_multiple(&mut self.rng, tag_count)
            .copied()
            .collect();

        let recipe = json!({
            "id": id,
            "title": title,
            "description": format!("Auto-generated recipe {index}"),
            "servings": servings,
            "prep_minutes": prep,
            "cook_minutes": cook,
            "total_minutes": prep + cook,
            "difficulty": difficulty,
            "ingredients": ingredients,
            "steps": steps,
            "tags": tags,
        });
        (id, to_document(recipe))
    }

    fn interactions_for(
        &mut self,
        recipe_id: &str,
        user_ids: &[String],
        now: DateTime<Utc>,
    ) -> Vec<(String, Document)> {
        let mut interactions = Vec::new();

        let views = self.count_in(self.config.views_per_recipe);
        for _ in 0..views {
            let at = self.past_instant(now, true);
            let doc = self.interaction(recipe_id, InteractionType::View, user_ids, at);
            interactions.push(doc);
        }

        let likes = self.count_in(self.config.likes_per_recipe);
        for _ in 0..likes {
            let at = self.past_instant(now, false);
            let doc = self.interaction(recipe_id, InteractionType::Like, user_ids, at);
            interactions.push(doc);
        }

        let attempts = self.count_in(self.config.attempts_per_recipe);
        for _ in 0..attempts {
            let at = self.past_instant(now, false);
            let (id, mut doc) = self.interaction(recipe_id, InteractionType::Attempt, user_ids, at);
            if let Some(difficulty) = Difficulty::ALL.choose(&mut self.rng) {
                doc.insert("difficulty_used".to_string(), json!(difficulty));
            }
            // one attempt in six goes unrated
            let rating: u32 = self.rng.gen_range(0..=5);
            if rating > 0 {
                doc.insert("rating".to_string(), json!(rating));
            }
            interactions.push((id, doc));
        }

        interactions
    }

    fn interaction(
        &mut self,
        recipe_id: &str,
        kind: InteractionType,
        user_ids: &[String],
        at: DateTime<Utc>,
    ) -> (String, Document) {
        let id = uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid().to_string();
        let mut doc = Document::new();
        doc.insert("recipe_id".to_string(), json!(recipe_id));
        if let Some(user) = user_ids.choose(&mut self.rng) {
            doc.insert("user_id".to_string(), json!(user));
        }
        doc.insert("type".to_string(), json!(kind));
        doc.insert(
            "timestamp".to_string(),
            json!(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        (id, doc)
    }

    fn count_in(&mut self, range: CountRange) -> u32 {
        let (low, high) = (range.min.min(range.max), range.max.max(range.min));
        self.rng.gen_range(low..=high)
    }

    /// A moment within the configured history window; views also vary by hour.
    fn past_instant(&mut self, now: DateTime<Utc>, with_hours: bool) -> DateTime<Utc> {
        let days = self.rng.gen_range(0..=i64::from(self.config.history_days));
        let hours = if with_hours { self.rng.gen_range(0..=23) } else { 0 };
        now - Duration::days(days) - Duration::hours(hours)
    }
}

/// Upsert every generated document into the store.
pub fn seed_store(store: &dyn DocumentStore, data: &SeedData) -> Result<SeedSummary> {
    let batches = [
        (collections::RECIPES, &data.recipes),
        (collections::USERS, &data.users),
        (collections::INTERACTIONS, &data.interactions),
    ];
    for (collection, documents) in batches {
        for (id, document) in documents.iter() {
            store
                .put(collection, id, document)
                .with_context(|| format!("Failed to seed {collection}/{id}"))?;
        }
        println!("✔ Seeded {} {} into {}", documents.len(), collection, store.name());
    }

    Ok(SeedSummary {
        recipes: data.recipes.len(),
        users: data.users.len(),
        interactions: data.interactions.len(),
    })
}

fn load_candidate_recipe(path: &Path) -> Result<Option<Document>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "candidate recipe not found, seeding synthetic recipes only");
        return Ok(None);
    }
    let json_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read candidate recipe {}", path.display()))?;
    match serde_json::from_str::<Value>(&json_str)? {
        Value::Object(fields) => Ok(Some(fields)),
        _ => Err(anyhow!("Candidate recipe {} is not a JSON object", path.display())),
    }
}

/// prep + cook, keeping integers integral; absent or non-numeric parts count as zero.
fn sum_minutes(prep: Option<&Value>, cook: Option<&Value>) -> Value {
    let as_int = |v: Option<&Value>| v.map_or(Some(0), Value::as_i64);
    match (as_int(prep), as_int(cook)) {
        (Some(p), Some(c)) => json!(p + c),
        _ => {
            let as_float = |v: Option<&Value>| v.and_then(Value::as_f64).unwrap_or(0.0);
            json!(as_float(prep) + as_float(cook))
        }
    }
}

fn to_document(value: Value) -> Document {
    match value {
        Value::Object(fields) => fields,
        _ => Document::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalizer;
    use crate::rules::Validator;
    use crate::store::LocalStore;
    use chrono::TimeZone;

    fn seeded_config() -> SeedConfig {
        SeedConfig {
            rng_seed: Some(7),
            synthetic_recipes: 4,
            users: 3,
            ..Default::default()
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_counts_follow_config() {
        let data = Seeder::new(seeded_config()).generate(None, fixed_now());
        assert_eq!(data.recipes.len(), 4);
        assert_eq!(data.users.len(), 3);
        assert_eq!(data.recipes[0].0, "synthetic_001");
        assert_eq!(data.users[2].0, "user_003");

        // at least 10 views per recipe by default
        assert!(data.interactions.len() >= 4 * 10);
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let first = Seeder::new(seeded_config()).generate(None, fixed_now());
        let second = Seeder::new(seeded_config()).generate(None, fixed_now());
        assert_eq!(first.recipes, second.recipes);
        assert_eq!(first.interactions, second.interactions);
    }

    #[test]
    fn test_synthetic_recipe_shape() {
        let data = Seeder::new(seeded_config()).generate(None, fixed_now());
        for (_, recipe) in &data.recipes {
            let prep = recipe["prep_minutes"].as_i64().unwrap();
            let cook = recipe["cook_minutes"].as_i64().unwrap();
            assert!((5..=40).contains(&prep));
            assert!((5..=60).contains(&cook));
            assert_eq!(recipe["total_minutes"].as_i64().unwrap(), prep + cook);

            let ingredients = recipe["ingredients"].as_array().unwrap().len();
            assert!((2..=5).contains(&ingredients));
            let steps = recipe["steps"].as_array().unwrap().len();
            assert!((2..=6).contains(&steps));
            let tags = recipe["tags"].as_array().unwrap().len();
            assert!((1..=3).contains(&tags));
        }
    }

    #[test]
    fn test_interactions_stay_in_history_window() {
        let now = fixed_now();
        let data = Seeder::new(seeded_config()).generate(None, now);
        let earliest = now - Duration::days(30) - Duration::hours(23);
        for (_, doc) in &data.interactions {
            let at = DateTime::parse_from_rfc3339(doc["timestamp"].as_str().unwrap())
                .unwrap()
                .with_timezone(&Utc);
            assert!(at <= now && at >= earliest);
            if doc["type"] != json!("attempt") {
                assert!(doc.get("rating").is_none());
            }
        }
    }

    #[test]
    fn test_candidate_recipe_gets_total_minutes() {
        let candidate = to_document(json!({
            "id": "my_recipe",
            "title": "Grandma's Soup",
            "prep_minutes": 15,
            "cook_minutes": 45
        }));
        let data = Seeder::new(seeded_config()).generate(Some(candidate), fixed_now());
        assert_eq!(data.recipes.len(), 5);
        assert_eq!(data.recipes[0].0, "my_recipe");
        assert_eq!(data.recipes[0].1["total_minutes"], json!(60));
    }

    #[test]
    fn test_sum_minutes_mixed_types() {
        assert_eq!(sum_minutes(Some(&json!(10)), None), json!(10));
        assert_eq!(sum_minutes(Some(&json!(1.5)), Some(&json!(2))), json!(3.5));
    }

    #[test]
    fn test_missing_candidate_file_is_skipped() {
        let config = SeedConfig {
            candidate_recipe: "/nonexistent/candidate_recipe.json".into(),
            ..seeded_config()
        };
        assert!(Seeder::new(config).load_candidate().unwrap().is_none());
    }

    #[test]
    fn test_seeded_data_passes_validation() {
        let data = Seeder::new(seeded_config()).generate(None, fixed_now());
        let recipes: Vec<Document> = data.recipes.iter().map(|(_, d)| d.clone()).collect();
        let interactions: Vec<Document> = data.interactions.iter().map(|(_, d)| d.clone()).collect();

        let tables = Normalizer::new().normalize(&recipes, &interactions);
        let report = Validator::default().validate(&tables);
        assert!(report.is_clean(), "seeded data should be valid: {report:?}");
    }

    #[test]
    fn test_seed_store_writes_all_collections() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();
        let data = Seeder::new(seeded_config()).generate(None, fixed_now());

        let summary = seed_store(&store, &data).unwrap();
        assert_eq!(summary.recipes, 4);
        assert_eq!(store.count(collections::RECIPES).unwrap(), 4);
        assert_eq!(store.count(collections::USERS).unwrap(), 3);
        assert_eq!(store.count(collections::INTERACTIONS).unwrap(), summary.interactions);
    }
}
