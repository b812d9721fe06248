//! Normalizer: raw documents → flat row sequences
//!
//! Recipe documents carry nested ingredient and step lists; these are
//! denormalized into their own rows tagged with the parent recipe id.
//! Absent optional fields become empty cells. Nothing here fails on a
//! malformed document: whatever is missing is left for the validator to report.

use crate::types::*;
use sha2::{Digest, Sha256};
use serde_json::Value;

/// Hex digits of the digest kept in synthesized ids
const SYNTHETIC_ID_HEX_LEN: usize = 16;
const TAG_SEPARATOR: &str = "|";

/// Rows produced from the recipe collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeTables {
    pub recipes: Vec<RecipeRow>,
    pub ingredients: Vec<IngredientRow>,
    pub steps: Vec<StepRow>,
}

pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize both document sequences into the four tables.
    pub fn normalize(&self, recipes: &[Document], interactions: &[Document]) -> NormalizedTables {
        let RecipeTables {
            recipes,
            ingredients,
            steps,
        } = self.normalize_recipes(recipes);

        NormalizedTables {
            recipes,
            ingredients,
            steps,
            interactions: self.normalize_interactions(interactions),
        }
    }

    pub fn normalize_recipes(&self, documents: &[Document]) -> RecipeTables {
        let mut tables = RecipeTables::default();

        for (index, doc) in documents.iter().enumerate() {
            let recipe_id = first_present(doc, &["id", EXPORT_ID_FIELD])
                .unwrap_or_else(|| synthesize_id("recipe", index, doc));

            tables.recipes.push(RecipeRow {
                recipe_id: recipe_id.clone(),
                title: cell(doc.get("title")),
                description: cell(doc.get("description")),
                servings: cell(doc.get("servings")),
                prep_minutes: cell(doc.get("prep_minutes")),
                cook_minutes: cell(doc.get("cook_minutes")),
                total_minutes: cell(doc.get("total_minutes")),
                difficulty: cell(doc.get("difficulty")),
                tags: tags_cell(doc.get("tags")),
            });

            for (position, ingredient) in list_items(doc.get("ingredients")).enumerate() {
                tables
                    .ingredients
                    .push(ingredient_row(&recipe_id, position + 1, ingredient));
            }

            for (position, step) in list_items(doc.get("steps")).enumerate() {
                let number = position + 1;
                tables.steps.push(StepRow {
                    step_id: format!("{recipe_id}_step_{number}"),
                    recipe_id: recipe_id.clone(),
                    step_number: number.to_string(),
                    instruction: step_instruction(step),
                });
            }
        }

        tables
    }

    pub fn normalize_interactions(&self, documents: &[Document]) -> Vec<InteractionRow> {
        documents
            .iter()
            .enumerate()
            .map(|(index, doc)| InteractionRow {
                interaction_id: first_present(doc, &[EXPORT_ID_FIELD, "id"])
                    .unwrap_or_else(|| synthesize_id("interaction", index, doc)),
                recipe_id: cell(doc.get("recipe_id")),
                kind: cell(doc.get("type")),
                user_id: cell(doc.get("user_id")),
                timestamp: cell(doc.get("timestamp")),
                rating: cell(doc.get("rating")),
                difficulty_used: cell(doc.get("difficulty_used")),
            })
            .collect()
    }
}

fn ingredient_row(recipe_id: &str, position: usize, ingredient: &Value) -> IngredientRow {
    let mut row = IngredientRow {
        ingredient_id: format!("{recipe_id}_ing_{position}"),
        recipe_id: recipe_id.to_string(),
        ..Default::default()
    };

    match ingredient {
        Value::Object(fields) => {
            row.name = cell(fields.get("name"));
            row.quantity = cell(fields.get("quantity"));
            row.unit = cell(fields.get("unit"));
            row.notes = cell(fields.get("notes"));
        }
        // A bare string is just the ingredient name
        Value::String(name) => row.name = name.clone(),
        Value::Null => {}
        other => row.name = cell(Some(other)),
    }

    row
}

fn step_instruction(step: &Value) -> String {
    match step {
        Value::Object(fields) => cell(fields.get("instruction").or_else(|| fields.get("text"))),
        other => cell(Some(other)),
    }
}

/// Items of a nested list; a missing or non-array value yields nothing.
fn list_items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

/// Render one JSON value as table cell text.
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(nested) => nested.to_string(),
    }
}

fn tags_cell(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(tags)) => tags
            .iter()
            .map(|tag| cell(Some(tag)))
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>()
            .join(TAG_SEPARATOR),
        other => cell(other),
    }
}

fn first_present(doc: &Document, keys: &[&str]) -> Option<String> {
    keys.iter()
        .map(|key| cell(doc.get(*key)))
        .find(|id| !id.trim().is_empty())
}

/// Deterministic id for a document that has none: same position and content, same id.
pub fn synthesize_id(prefix: &str, index: usize, doc: &Document) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_le_bytes());
    // serde_json maps are key-ordered, so this serialization is canonical
    hasher.update(Value::Object(doc.clone()).to_string().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{prefix}_{}", &digest[..SYNTHETIC_ID_HEX_LEN])
}
