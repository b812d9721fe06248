use super::validation::{IngredientRules, InteractionRules, RecipeRules, StepRules};
use super::violation::Violation;
use crate::config::ValidationConfig;
use crate::types::NormalizedTables;
use anyhow::Result;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::path::Path;

/// A fixed set of per-row predicates for one entity table
pub trait RowRules {
    type Row;

    /// Report key naming the row identifier, e.g. `recipe_id`
    const ID_FIELD: &'static str;

    fn row_id<'r>(&self, row: &'r Self::Row) -> &'r str;

    /// Every rule the row breaks, in reporting order. Empty means valid.
    fn check(&self, row: &Self::Row) -> Vec<Violation>;

    fn name(&self) -> &str;
}

/// A rejected row: its identifier and every rule it broke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRow {
    pub id_field: &'static str,
    /// None when the identifier cell itself is empty
    pub id: Option<String>,
    pub problems: Vec<Violation>,
}

impl Serialize for InvalidRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.id_field, &self.id)?;
        map.serialize_entry("problems", &self.problems)?;
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityOutcome {
    pub valid_count: usize,
    pub invalid: Vec<InvalidRow>,
}

/// Partition rows into a valid count and a list of invalid rows.
pub fn apply_rules<R: RowRules>(rules: &R, rows: &[R::Row]) -> EntityOutcome {
    let mut outcome = EntityOutcome::default();

    for row in rows {
        let problems = rules.check(row);
        if problems.is_empty() {
            outcome.valid_count += 1;
            continue;
        }

        let id = rules.row_id(row).trim();
        tracing::debug!(rules = rules.name(), id, ?problems, "row rejected");
        outcome.invalid.push(InvalidRow {
            id_field: R::ID_FIELD,
            id: (!id.is_empty()).then(|| id.to_string()),
            problems,
        });
    }

    outcome
}

/// Aggregate validation result, serialized with one valid count and one
/// invalid list per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub recipes_valid_count: usize,
    pub recipes_invalid: Vec<InvalidRow>,
    pub ingredients_valid_count: usize,
    pub ingredients_invalid: Vec<InvalidRow>,
    pub steps_valid_count: usize,
    pub steps_invalid: Vec<InvalidRow>,
    pub interactions_valid_count: usize,
    pub interactions_invalid: Vec<InvalidRow>,
}

impl ValidationReport {
    pub fn total_valid(&self) -> usize {
        self.recipes_valid_count
            + self.ingredients_valid_count
            + self.steps_valid_count
            + self.interactions_valid_count
    }

    pub fn total_invalid(&self) -> usize {
        self.recipes_invalid.len()
            + self.ingredients_invalid.len()
            + self.steps_invalid.len()
            + self.interactions_invalid.len()
    }

    pub fn is_clean(&self) -> bool {
        self.total_invalid() == 0
    }

    /// (entity, valid count, invalid count) per table, in report order
    pub fn summary(&self) -> [(&'static str, usize, usize); 4] {
        [
            ("recipes", self.recipes_valid_count, self.recipes_invalid.len()),
            ("ingredients", self.ingredients_valid_count, self.ingredients_invalid.len()),
            ("steps", self.steps_valid_count, self.steps_invalid.len()),
            ("interactions", self.interactions_valid_count, self.interactions_invalid.len()),
        ]
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    /// Print the report summary to console
    pub fn print_summary(&self) {
        println!("   📊 Validation Report:");
        for (entity, valid, invalid) in self.summary() {
            println!("      {:<13} {:>6} valid {:>6} invalid", entity, valid, invalid);
        }

        if self.is_clean() {
            println!("      ✅ No rule violations detected!");
        } else {
            println!("      ⚠️  {} rows violate at least one rule", self.total_invalid());
        }
    }
}

/// Runs the four entity rule sets over normalized tables
pub struct Validator {
    recipes: RecipeRules,
    ingredients: IngredientRules,
    steps: StepRules,
    interactions: InteractionRules,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&ValidationConfig::default())
    }
}

impl Validator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            recipes: RecipeRules::new(config.allowed_difficulties.clone()),
            ingredients: IngredientRules,
            steps: StepRules,
            interactions: InteractionRules::new(config.allowed_difficulties.clone()),
        }
    }

    pub fn validate(&self, tables: &NormalizedTables) -> ValidationReport {
        let recipes = apply_rules(&self.recipes, &tables.recipes);
        let ingredients = apply_rules(&self.ingredients, &tables.ingredients);
        let steps = apply_rules(&self.steps, &tables.steps);
        let interactions = apply_rules(&self.interactions, &tables.interactions);

        ValidationReport {
            recipes_valid_count: recipes.valid_count,
            recipes_invalid: recipes.invalid,
            ingredients_valid_count: ingredients.valid_count,
            ingredients_invalid: ingredients.invalid,
            steps_valid_count: steps.valid_count,
            steps_invalid: steps.invalid,
            interactions_valid_count: interactions.valid_count,
            interactions_invalid: interactions.invalid,
        }
    }
}
