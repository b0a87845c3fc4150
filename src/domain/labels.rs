//! The fixed, ordered food label table.
//!
//! The classification model's output is a score vector whose index `i`
//! corresponds to the `i`-th name in this table. The order is an external
//! contract fixed at model-training time: reordering the table invalidates
//! every label and is a breaking schema change requiring a
//! [`LabelTable::SCHEMA_VERSION`] bump.

use crate::core::errors::{FoodLensError, FoodLensResult};
use std::path::Path;
use std::sync::Arc;

/// Sentinel label returned when a score vector cannot be resolved to a
/// trained class.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// An ordered, closed set of food category names.
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: Vec<Arc<str>>,
    unknown: Arc<str>,
}

impl LabelTable {
    /// Version of the label ordering contract. Bump on any reorder.
    pub const SCHEMA_VERSION: u32 = 1;

    /// Builds a table from an ordered list of names.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the list is empty.
    pub fn from_names<I, S>(names: I) -> FoodLensResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<Arc<str>> = names
            .into_iter()
            .map(|name| Arc::from(name.into()))
            .collect();
        if labels.is_empty() {
            return Err(FoodLensError::config(
                "label table must contain at least one label".to_string(),
            ));
        }
        Ok(Self {
            labels,
            unknown: Arc::from(UNKNOWN_LABEL),
        })
    }

    /// Builds a table from newline-delimited text, skipping blank lines and
    /// preserving order.
    pub fn from_text(text: &str) -> FoodLensResult<Self> {
        Self::from_names(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        )
    }

    /// Loads a table from a newline-delimited label file shipped alongside
    /// the model artifact.
    pub fn from_file(path: impl AsRef<Path>) -> FoodLensResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_text(&content)
    }

    /// The default table of the bundled food classifier, in training order.
    pub fn default_food_labels() -> Self {
        Self {
            labels: ["Pizza", "Burger", "Sushi", "Fries"]
                .into_iter()
                .map(Arc::from)
                .collect(),
            unknown: Arc::from(UNKNOWN_LABEL),
        }
    }

    /// Returns the label at `index`, if it names a trained class.
    pub fn get(&self, index: usize) -> Option<Arc<str>> {
        self.labels.get(index).cloned()
    }

    /// The sentinel label for unresolvable scores. Not a member of the
    /// ordered table.
    pub fn unknown(&self) -> Arc<str> {
        self.unknown.clone()
    }

    /// Number of trained classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the table has no classes. Construction rejects this, so a
    /// built table always returns `false`.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn preserves_training_order() {
        let table = LabelTable::from_names(["Pizza", "Burger", "Sushi", "Fries"]).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(0).as_deref(), Some("Pizza"));
        assert_eq!(table.get(3).as_deref(), Some("Fries"));
        assert_eq!(table.get(4), None);
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(LabelTable::from_names(Vec::<String>::new()).is_err());
    }

    #[test]
    fn text_parsing_skips_blank_lines() {
        let table = LabelTable::from_text("Pizza\n\n  Burger  \n\nSushi\n").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(1).as_deref(), Some("Burger"));
    }

    #[test]
    fn loads_from_label_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Pizza\nBurger\nSushi\nFries").unwrap();
        let table = LabelTable::from_file(file.path()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(2).as_deref(), Some("Sushi"));
    }

    #[test]
    fn unknown_is_not_a_class() {
        let table = LabelTable::default_food_labels();
        assert_eq!(&*table.unknown(), "Unknown");
        assert!(!table.labels.iter().any(|l| &**l == "Unknown"));
    }
}
