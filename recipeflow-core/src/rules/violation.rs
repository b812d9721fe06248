use serde::{Serialize, Serializer};
use std::fmt;

/// One named rule failure attached to a row. `Display` gives the rule name
/// recorded in the validation report, e.g. `missing title` or `prep_minutes negative`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A required cell is empty
    Missing(&'static str),
    /// A numeric cell holds a value below zero
    Negative(&'static str),
    /// A numeric cell does not parse as a number
    NotNumeric(&'static str),
    /// A numeric cell is outside its allowed bounds
    OutOfRange(&'static str),
    /// A cell is not one of its enumerated values (value is lowercased)
    InvalidValue { field: &'static str, value: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing(field) => write!(f, "missing {field}"),
            Violation::Negative(field) => write!(f, "{field} negative"),
            Violation::NotNumeric(field) => write!(f, "{field} not numeric"),
            Violation::OutOfRange(field) => write!(f, "{field} out of range"),
            Violation::InvalidValue { field, value } => write!(f, "invalid {field}: {value}"),
        }
    }
}

impl Serialize for Violation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of reading an optional numeric cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericCell {
    Empty,
    Number(f64),
    NotNumeric,
}

impl NumericCell {
    pub fn parse(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            return NumericCell::Empty;
        }
        match cell.parse::<f64>() {
            Ok(value) => NumericCell::Number(value),
            Err(_) => NumericCell::NotNumeric,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            NumericCell::Number(value) => Some(value),
            _ => None,
        }
    }

    /// The number when it is finite. Analytics reads cells through this so a
    /// `NaN` or `inf` cell is skipped like an empty one.
    pub fn finite(self) -> Option<f64> {
        self.value().filter(|value| value.is_finite())
    }
}

pub(crate) fn require(field: &'static str, cell: &str, problems: &mut Vec<Violation>) {
    if cell.trim().is_empty() {
        problems.push(Violation::Missing(field));
    }
}

/// Empty cells pass; anything else must be a number no lower than zero.
pub(crate) fn non_negative(field: &'static str, cell: &str, problems: &mut Vec<Violation>) {
    match NumericCell::parse(cell) {
        NumericCell::Number(value) if value < 0.0 => problems.push(Violation::Negative(field)),
        NumericCell::NotNumeric => problems.push(Violation::NotNumeric(field)),
        _ => {}
    }
}

/// Empty cells pass; anything else must be a number within `min..=max`.
pub(crate) fn within(field: &'static str, cell: &str, min: f64, max: f64, problems: &mut Vec<Violation>) {
    match NumericCell::parse(cell) {
        NumericCell::Number(value) if !(min..=max).contains(&value) => {
            problems.push(Violation::OutOfRange(field))
        }
        NumericCell::NotNumeric => problems.push(Violation::NotNumeric(field)),
        _ => {}
    }
}

/// Empty cells pass; anything else must match one of `allowed`, ignoring case.
pub(crate) fn one_of<S: AsRef<str>>(
    field: &'static str,
    cell: &str,
    allowed: &[S],
    problems: &mut Vec<Violation>,
) {
    let value = cell.trim().to_lowercase();
    if value.is_empty() {
        return;
    }
    if !allowed.iter().any(|a| a.as_ref().eq_ignore_ascii_case(&value)) {
        problems.push(Violation::InvalidValue { field, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_names() {
        assert_eq!(Violation::Missing("title").to_string(), "missing title");
        assert_eq!(Violation::Negative("prep_minutes").to_string(), "prep_minutes negative");
        assert_eq!(Violation::NotNumeric("cook_minutes").to_string(), "cook_minutes not numeric");
        assert_eq!(Violation::OutOfRange("rating").to_string(), "rating out of range");
        assert_eq!(
            Violation::InvalidValue {
                field: "difficulty",
                value: "extreme".to_string()
            }
            .to_string(),
            "invalid difficulty: extreme"
        );
    }

    #[test]
    fn test_violation_serializes_as_rule_name() {
        let json = serde_json::to_string(&vec![Violation::Missing("type")]).unwrap();
        assert_eq!(json, "[\"missing type\"]");
    }

    #[test]
    fn test_numeric_cell_parse() {
        assert_eq!(NumericCell::parse(""), NumericCell::Empty);
        assert_eq!(NumericCell::parse("  "), NumericCell::Empty);
        assert_eq!(NumericCell::parse("12"), NumericCell::Number(12.0));
        assert_eq!(NumericCell::parse(" -3.5 "), NumericCell::Number(-3.5));
        assert_eq!(NumericCell::parse("ten"), NumericCell::NotNumeric);
    }

    #[test]
    fn test_finite_drops_nan_and_infinity() {
        assert_eq!(NumericCell::parse("7.5").finite(), Some(7.5));
        assert_eq!(NumericCell::parse("").finite(), None);
        for cell in ["NaN", "inf", "-inf", "infinity"] {
            assert!(NumericCell::parse(cell).value().is_some(), "{cell}");
            assert_eq!(NumericCell::parse(cell).finite(), None, "{cell}");
        }
    }

    #[test]
    fn test_non_negative_accepts_zero() {
        let mut problems = Vec::new();
        non_negative("total_minutes", "0", &mut problems);
        non_negative("total_minutes", "", &mut problems);
        assert!(problems.is_empty());

        non_negative("total_minutes", "-0.1", &mut problems);
        assert_eq!(problems, vec![Violation::Negative("total_minutes")]);
    }

    #[test]
    fn test_cells_are_trimmed_before_checks() {
        let mut problems = Vec::new();
        require("title", "   ", &mut problems);
        assert_eq!(problems, vec![Violation::Missing("title")]);

        problems.clear();
        one_of("difficulty", " Medium ", &["easy", "medium", "hard"], &mut problems);
        non_negative("prep_minutes", "  ", &mut problems);
        assert!(problems.is_empty());
    }

    #[test]
    fn test_one_of_is_case_insensitive() {
        let allowed = ["easy", "medium", "hard"];
        let mut problems = Vec::new();
        one_of("difficulty", "Hard", &allowed, &mut problems);
        assert!(problems.is_empty());

        one_of("difficulty", "Brutal", &allowed, &mut problems);
        assert_eq!(
            problems,
            vec![Violation::InvalidValue {
                field: "difficulty",
                value: "brutal".to_string()
            }]
        );
    }
}
