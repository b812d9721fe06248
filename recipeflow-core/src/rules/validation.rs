use super::engine::RowRules;
use super::violation::{non_negative, one_of, require, within, Violation};
use crate::types::*;

const RATING_MIN: f64 = 1.0;
const RATING_MAX: f64 = 5.0;

// RecipeRules - presence, non-negative quantities, difficulty enumeration
pub struct RecipeRules {
    allowed_difficulties: Vec<String>,
}

impl RecipeRules {
    pub fn new(allowed_difficulties: Vec<String>) -> Self {
        Self {
            allowed_difficulties,
        }
    }
}

impl RowRules for RecipeRules {
    type Row = RecipeRow;
    const ID_FIELD: &'static str = "recipe_id";

    fn row_id<'r>(&self, row: &'r RecipeRow) -> &'r str {
        &row.recipe_id
    }

    fn check(&self, row: &RecipeRow) -> Vec<Violation> {
        let mut problems = Vec::new();
        require("recipe_id", &row.recipe_id, &mut problems);
        require("title", &row.title, &mut problems);
        non_negative("servings", &row.servings, &mut problems);
        non_negative("prep_minutes", &row.prep_minutes, &mut problems);
        non_negative("cook_minutes", &row.cook_minutes, &mut problems);
        non_negative("total_minutes", &row.total_minutes, &mut problems);
        one_of("difficulty", &row.difficulty, &self.allowed_difficulties, &mut problems);
        problems
    }

    fn name(&self) -> &str {
        "RecipeRules"
    }
}

pub struct IngredientRules;

impl RowRules for IngredientRules {
    type Row = IngredientRow;
    const ID_FIELD: &'static str = "ingredient_id";

    fn row_id<'r>(&self, row: &'r IngredientRow) -> &'r str {
        &row.ingredient_id
    }

    fn check(&self, row: &IngredientRow) -> Vec<Violation> {
        let mut problems = Vec::new();
        require("recipe_id", &row.recipe_id, &mut problems);
        require("ingredient name", &row.name, &mut problems);
        problems
    }

    fn name(&self) -> &str {
        "IngredientRules"
    }
}

pub struct StepRules;

impl RowRules for StepRules {
    type Row = StepRow;
    const ID_FIELD: &'static str = "step_id";

    fn row_id<'r>(&self, row: &'r StepRow) -> &'r str {
        &row.step_id
    }

    fn check(&self, row: &StepRow) -> Vec<Violation> {
        let mut problems = Vec::new();
        require("recipe_id", &row.recipe_id, &mut problems);
        require("instruction", &row.instruction, &mut problems);
        problems
    }

    fn name(&self) -> &str {
        "StepRules"
    }
}

// InteractionRules - presence plus enumeration of type, optional rating and difficulty_used
pub struct InteractionRules {
    allowed_difficulties: Vec<String>,
}

impl InteractionRules {
    pub fn new(allowed_difficulties: Vec<String>) -> Self {
        Self {
            allowed_difficulties,
        }
    }
}

impl RowRules for InteractionRules {
    type Row = InteractionRow;
    const ID_FIELD: &'static str = "interaction_id";

    fn row_id<'r>(&self, row: &'r InteractionRow) -> &'r str {
        &row.interaction_id
    }

    fn check(&self, row: &InteractionRow) -> Vec<Violation> {
        let mut problems = Vec::new();
        require("recipe_id", &row.recipe_id, &mut problems);
        require("type", &row.kind, &mut problems);
        let kinds = InteractionType::ALL.map(|kind| kind.as_str());
        one_of("type", &row.kind, &kinds, &mut problems);
        within("rating", &row.rating, RATING_MIN, RATING_MAX, &mut problems);
        one_of(
            "difficulty_used",
            &row.difficulty_used,
            &self.allowed_difficulties,
            &mut problems,
        );
        problems
    }

    fn name(&self) -> &str {
        "InteractionRules"
    }
}
