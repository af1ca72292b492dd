use std::collections::BTreeSet;

use crate::error::{PredictionError, Result};

// ---------------------------------------------------------------------------
// Column – one model's output over the store's row universe
// ---------------------------------------------------------------------------

/// A single named column of prediction values.  Always exactly as long as
/// the owning store's row-id list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Column {
    pub(crate) name: String,
    pub(crate) values: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ColumnStore – row-aligned named columns
// ---------------------------------------------------------------------------

/// Ordered row-id universe plus insertion-ordered named `f64` columns.
///
/// Invariants:
/// * row ids are unique; their order is fixed at creation
/// * every column covers exactly the row universe
/// * column names are unique; iteration order is insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnStore {
    row_ids: Vec<String>,
    columns: Vec<Column>,
}

impl ColumnStore {
    /// Store with no rows and no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store around a single model's output.  The row ids define
    /// the universe every later column must match.
    pub fn from_column(
        row_ids: Vec<String>,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if row_ids.len() != values.len() {
            return Err(PredictionError::ShapeMismatch(format!(
                "{} row ids but {} values",
                row_ids.len(),
                values.len()
            )));
        }
        let mut seen = BTreeSet::new();
        for id in &row_ids {
            if !seen.insert(id.as_str()) {
                return Err(PredictionError::DuplicateRowId(id.clone()));
            }
        }
        Ok(Self {
            row_ids,
            columns: vec![Column {
                name: name.into(),
                values,
            }],
        })
    }

    /// Insert a column covering the existing row universe.
    ///
    /// Fails with [`PredictionError::ShapeMismatch`] on a length mismatch
    /// and [`PredictionError::DuplicateModelName`] if `name` is already
    /// present and `overwrite` is false.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
        overwrite: bool,
    ) -> Result<()> {
        let name = name.into();
        if values.len() != self.row_ids.len() {
            return Err(PredictionError::ShapeMismatch(format!(
                "column '{}' has {} values but the store holds {} rows",
                name,
                values.len(),
                self.row_ids.len()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) if overwrite => {
                existing.values = values;
                Ok(())
            }
            Some(_) => Err(PredictionError::DuplicateModelName(name)),
            None => {
                self.columns.push(Column { name, values });
                Ok(())
            }
        }
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| PredictionError::UnknownModelName(name.to_string()))
    }

    /// Remove a column, preserving the order of the rest.
    pub fn remove_column(&mut self, name: &str) -> Result<()> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| PredictionError::UnknownModelName(name.to_string()))?;
        self.columns.remove(idx);
        Ok(())
    }

    /// Rename a column in place.
    pub fn rename_column(&mut self, from: &str, to: impl Into<String>) -> Result<()> {
        let to = to.into();
        if from != to && self.columns.iter().any(|c| c.name == to) {
            return Err(PredictionError::DuplicateModelName(to));
        }
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.name == from)
            .ok_or_else(|| PredictionError::UnknownModelName(from.to_string()))?;
        col.name = to;
        Ok(())
    }

    /// The row-id universe, in creation order.
    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    /// Column names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub(crate) fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.row_ids.len()
    }

    /// True when the store holds no rows and no columns.
    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty() && self.columns.is_empty()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("index{i}")).collect()
    }

    #[test]
    fn from_column_rejects_length_mismatch() {
        let err = ColumnStore::from_column(ids(3), "m", vec![0.5; 4]).unwrap_err();
        assert!(matches!(err, PredictionError::ShapeMismatch(_)));
    }

    #[test]
    fn from_column_rejects_duplicate_ids() {
        let mut row_ids = ids(3);
        row_ids[2] = "index0".to_string();
        let err = ColumnStore::from_column(row_ids, "m", vec![0.5; 3]).unwrap_err();
        match err {
            PredictionError::DuplicateRowId(id) => assert_eq!(id, "index0"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn add_column_enforces_universe() {
        let mut store = ColumnStore::from_column(ids(3), "a", vec![0.1, 0.2, 0.3]).unwrap();
        let err = store.add_column("b", vec![0.5; 2], false).unwrap_err();
        assert!(matches!(err, PredictionError::ShapeMismatch(_)));

        store.add_column("b", vec![0.5; 3], false).unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn add_column_duplicate_name_needs_overwrite() {
        let mut store = ColumnStore::from_column(ids(2), "a", vec![0.1, 0.2]).unwrap();
        let err = store.add_column("a", vec![0.3, 0.4], false).unwrap_err();
        assert!(matches!(err, PredictionError::DuplicateModelName(_)));

        store.add_column("a", vec![0.3, 0.4], true).unwrap();
        assert_eq!(store.column("a").unwrap(), [0.3, 0.4]);
        assert_eq!(store.column_count(), 1);
    }

    #[test]
    fn rename_preserves_order() {
        let mut store = ColumnStore::from_column(ids(2), "a", vec![0.1, 0.2]).unwrap();
        store.add_column("b", vec![0.3, 0.4], false).unwrap();
        store.rename_column("a", "z").unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), ["z", "b"]);

        let err = store.rename_column("z", "b").unwrap_err();
        assert!(matches!(err, PredictionError::DuplicateModelName(_)));
    }

    #[test]
    fn unknown_column_lookup_fails() {
        let store = ColumnStore::from_column(ids(2), "a", vec![0.1, 0.2]).unwrap();
        assert!(matches!(
            store.column("missing").unwrap_err(),
            PredictionError::UnknownModelName(_)
        ));
    }
}
