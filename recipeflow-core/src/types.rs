use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A loosely-structured document as held by the document store.
pub type Document = Map<String, Value>;

/// Field added to every exported document carrying its store identifier.
pub const EXPORT_ID_FIELD: &str = "_id";

/// Collection names used by the pipeline
pub mod collections {
    pub const RECIPES: &str = "recipes";
    pub const USERS: &str = "users";
    pub const INTERACTIONS: &str = "interactions";

    pub const ALL: [&str; 3] = [RECIPES, USERS, INTERACTIONS];
}

/// One document read back from a store, with its identifier kept apart from its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, fields: Document) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Fields augmented with the internal `_id` field, as written to the JSON dump.
    pub fn into_export(self) -> Document {
        let mut fields = self.fields;
        fields.insert(EXPORT_ID_FIELD.to_string(), Value::String(self.id));
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    View,
    Like,
    Attempt,
}

impl InteractionType {
    pub const ALL: [InteractionType; 3] = [
        InteractionType::View,
        InteractionType::Like,
        InteractionType::Attempt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::View => "view",
            InteractionType::Like => "like",
            InteractionType::Attempt => "attempt",
        }
    }

    /// Parse a table cell; surrounding whitespace and case are ignored.
    pub fn from_cell(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(cell))
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== TABULAR ROWS =====
// Every cell is text. Interpretation of numbers and enumerations belongs to the
// validator and to analytics, so a malformed cell never prevents a table from loading.

/// A row type persisted as one delimited file with a fixed column order.
pub trait TableRow: Serialize + DeserializeOwned {
    /// File name under the csv output directory
    const FILE_NAME: &'static str;
    /// Column names, in file order (must match the struct field order)
    const HEADERS: &'static [&'static str];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeRow {
    pub recipe_id: String,
    pub title: String,
    pub description: String,
    pub servings: String,
    pub prep_minutes: String,
    pub cook_minutes: String,
    pub total_minutes: String,
    pub difficulty: String,
    pub tags: String,
}

impl TableRow for RecipeRow {
    const FILE_NAME: &'static str = "recipe.csv";
    const HEADERS: &'static [&'static str] = &[
        "recipe_id",
        "title",
        "description",
        "servings",
        "prep_minutes",
        "cook_minutes",
        "total_minutes",
        "difficulty",
        "tags",
    ];
}

impl RecipeRow {
    /// Tags split back out of their `|`-joined cell. Commas are accepted as well.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(['|', ','])
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngredientRow {
    pub ingredient_id: String,
    pub recipe_id: String,
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub notes: String,
}

impl TableRow for IngredientRow {
    const FILE_NAME: &'static str = "ingredients.csv";
    const HEADERS: &'static [&'static str] =
        &["ingredient_id", "recipe_id", "name", "quantity", "unit", "notes"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepRow {
    pub step_id: String,
    pub recipe_id: String,
    pub step_number: String,
    pub instruction: String,
}

impl TableRow for StepRow {
    const FILE_NAME: &'static str = "steps.csv";
    const HEADERS: &'static [&'static str] = &["step_id", "recipe_id", "step_number", "instruction"];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionRow {
    pub interaction_id: String,
    pub recipe_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub user_id: String,
    pub timestamp: String,
    pub rating: String,
    pub difficulty_used: String,
}

impl TableRow for InteractionRow {
    const FILE_NAME: &'static str = "interactions.csv";
    const HEADERS: &'static [&'static str] = &[
        "interaction_id",
        "recipe_id",
        "type",
        "user_id",
        "timestamp",
        "rating",
        "difficulty_used",
    ];
}

impl InteractionRow {
    pub fn interaction_type(&self) -> Option<InteractionType> {
        InteractionType::from_cell(&self.kind)
    }
}

/// The four aligned row sequences produced by normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTables {
    pub recipes: Vec<RecipeRow>,
    pub ingredients: Vec<IngredientRow>,
    pub steps: Vec<StepRow>,
    pub interactions: Vec<InteractionRow>,
}

impl NormalizedTables {
    pub fn total_rows(&self) -> usize {
        self.recipes.len() + self.ingredients.len() + self.steps.len() + self.interactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_type_from_cell() {
        assert_eq!(InteractionType::from_cell("like"), Some(InteractionType::Like));
        assert_eq!(InteractionType::from_cell(" VIEW "), Some(InteractionType::View));
        assert_eq!(InteractionType::from_cell("share"), None);
        assert_eq!(InteractionType::from_cell(""), None);
    }

    #[test]
    fn test_tag_list_accepts_both_delimiters() {
        let row = RecipeRow {
            tags: "quick|vegan, dessert||".to_string(),
            ..Default::default()
        };
        assert_eq!(row.tag_list(), vec!["quick", "vegan", "dessert"]);
    }

    #[test]
    fn test_export_adds_internal_id() {
        let mut fields = Document::new();
        fields.insert("title".to_string(), Value::from("Soup"));
        let exported = StoredDocument::new("r1", fields).into_export();
        assert_eq!(exported["_id"], Value::from("r1"));
        assert_eq!(exported["title"], Value::from("Soup"));
    }
}
