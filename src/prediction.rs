use std::collections::HashMap;
use std::path::Path;

use crate::codec;
use crate::error::{PredictionError, Result};
use crate::score::{self, Dominance, ModelScore, ValidationTargets};
use crate::store::ColumnStore;

// ---------------------------------------------------------------------------
// Prediction – named model outputs over a shared row universe
// ---------------------------------------------------------------------------

/// One or more named model-output columns aligned to row identifiers.
///
/// A `Prediction` owns its data outright; `get`, `subset`, and `iter` all
/// return owned copies rather than views, so nothing mutates behind the
/// caller's back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    store: ColumnStore,
}

impl Prediction {
    /// Prediction with no rows and no models.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap one model run: row ids plus that model's values.
    pub fn from_model(
        row_ids: Vec<String>,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self> {
        Ok(Self {
            store: ColumnStore::from_column(row_ids, name, values)?,
        })
    }

    pub(crate) fn from_store(store: ColumnStore) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &ColumnStore {
        &self.store
    }

    // -- introspection --

    /// Model names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.store.names().collect()
    }

    /// True iff `name` is one of [`Prediction::names`].
    pub fn contains(&self, name: &str) -> bool {
        self.store.names().any(|n| n == name)
    }

    /// Row ids in stored order.
    pub fn row_ids(&self) -> &[String] {
        self.store.row_ids()
    }

    /// One model's values, in row order.
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.store.column(name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// True when no rows and no models are stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// (rows, models).
    pub fn shape(&self) -> (usize, usize) {
        (self.store.len(), self.store.column_count())
    }

    // -- mutation --

    /// Union of columns: add every model of `other` to `self`.
    ///
    /// An empty receiver adopts `other` wholesale.  Otherwise both sides
    /// must cover the same row-id set (columns are realigned by id when the
    /// orders differ); a name collision fails with
    /// [`PredictionError::DuplicateModelName`] before anything is inserted.
    pub fn merge(&mut self, other: &Prediction) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            self.store = other.store.clone();
            return Ok(());
        }
        for name in other.store.names() {
            if self.contains(name) {
                return Err(PredictionError::DuplicateModelName(name.to_string()));
            }
        }
        let perm = self.alignment(other)?;
        for col in other.store.columns() {
            let values = apply_permutation(&col.values, perm.as_deref());
            self.store.add_column(col.name.clone(), values, false)?;
        }
        Ok(())
    }

    /// Named assignment: insert or replace the column `name` with the single
    /// model held by `single`, re-keying it.
    ///
    /// Unlike [`Prediction::merge`], an existing `name` is overwritten
    /// without error.  Row alignment is validated unless the receiver is
    /// empty, in which case `single`'s row universe is adopted.
    pub fn set(&mut self, name: impl Into<String>, single: &Prediction) -> Result<()> {
        let count = single.store.column_count();
        if count != 1 {
            return Err(PredictionError::SingleModelRequired(count));
        }
        let name = name.into();
        if self.is_empty() {
            let mut store = single.store.clone();
            let old = store.names().next().unwrap_or_default().to_string();
            if old != name {
                store.rename_column(&old, name)?;
            }
            self.store = store;
            return Ok(());
        }
        let perm = self.alignment(single)?;
        let col = &single.store.columns()[0];
        let values = apply_permutation(&col.values, perm.as_deref());
        self.store.add_column(name, values, true)
    }

    /// Rename one model, keeping its position.
    pub fn rename(&mut self, from: &str, to: impl Into<String>) -> Result<()> {
        self.store.rename_column(from, to)
    }

    /// Remove one model, keeping the order of the rest.
    pub fn drop_model(&mut self, name: &str) -> Result<()> {
        self.store.remove_column(name)
    }

    // -- views (owned copies) --

    /// Owned single-model copy of `name`.
    pub fn get(&self, name: &str) -> Result<Prediction> {
        let values = self.store.column(name)?.to_vec();
        Self::from_model(self.store.row_ids().to_vec(), name, values)
    }

    /// Owned copy holding exactly the requested models, in the requested
    /// order.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Result<Prediction> {
        let mut out = Prediction::empty();
        for name in names {
            let name = name.as_ref();
            let single = self.get(name)?;
            out.set(name, &single)?;
        }
        Ok(out)
    }

    /// Yield each model as an owned single-model prediction, in stored
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = Prediction> + '_ {
        self.store.columns().iter().map(|col| {
            Prediction::from_model(
                self.store.row_ids().to_vec(),
                col.name.clone(),
                col.values.clone(),
            )
            .expect("columns are aligned by construction")
        })
    }

    // -- persistence --

    /// Write all models to a Parquet archive.  Lossless: values survive a
    /// round trip bit-for-bit.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        codec::save_parquet(self, path.as_ref())
    }

    /// Load a Parquet archive written by [`Prediction::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        codec::load_parquet(path.as_ref())
    }

    /// Write a single-model submission CSV.  Lossy: values are rounded to
    /// six decimal places.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        codec::save_csv(self, path.as_ref())
    }

    /// Read a submission CSV back as a single model named `name`.
    pub fn from_csv(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        codec::load_csv(path.as_ref(), name)
    }

    // -- scoring --

    /// Per-model metrics against held-out validation targets.
    pub fn performance(&self, targets: &ValidationTargets) -> Result<Vec<ModelScore>> {
        score::performance(self, targets)
    }

    /// Pairwise comparison of exactly two models against validation
    /// targets.
    pub fn dominance(&self, targets: &ValidationTargets) -> Result<Dominance> {
        score::dominance(self, targets)
    }

    /// Permutation mapping `other`'s rows onto `self`'s row order, or
    /// `None` when the orders already agree.  Fails when the id sets
    /// differ.
    fn alignment(&self, other: &Prediction) -> Result<Option<Vec<usize>>> {
        let mine = self.store.row_ids();
        let theirs = other.store.row_ids();
        if mine == theirs {
            return Ok(None);
        }
        if mine.len() != theirs.len() {
            return Err(PredictionError::ShapeMismatch(format!(
                "{} rows here but {} rows in the merged prediction",
                mine.len(),
                theirs.len()
            )));
        }
        let positions: HashMap<&str, usize> = theirs
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        mine.iter()
            .map(|id| {
                positions.get(id.as_str()).copied().ok_or_else(|| {
                    PredictionError::ShapeMismatch(format!(
                        "row id '{id}' missing from the merged prediction"
                    ))
                })
            })
            .collect::<Result<Vec<usize>>>()
            .map(Some)
    }
}

fn apply_permutation(values: &[f64], perm: Option<&[usize]>) -> Vec<f64> {
    match perm {
        Some(perm) => perm.iter().map(|&i| values[i]).collect(),
        None => values.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("index{i}")).collect()
    }

    fn run(name: &str, values: Vec<f64>) -> Prediction {
        Prediction::from_model(ids(values.len()), name, values).unwrap()
    }

    #[test]
    fn empty_prediction() {
        let p = Prediction::empty();
        assert!(p.names().is_empty());
        assert!(p.is_empty());
        assert_eq!(p.shape(), (0, 0));
        assert_eq!(p.len(), 0);
        assert!(!p.contains("a"));
    }

    #[test]
    fn merge_preserves_insertion_order() {
        let mut p = run("a", vec![0.1, 0.2, 0.3]);
        p.merge(&run("b", vec![0.4, 0.5, 0.6])).unwrap();
        p.merge(&run("c", vec![0.7, 0.8, 0.9])).unwrap();
        assert_eq!(p.names(), ["a", "b", "c"]);
        assert_eq!(p.shape(), (3, 3));
    }

    #[test]
    fn merge_duplicate_name_fails() {
        let mut p = run("a", vec![0.1, 0.2]);
        let err = p.merge(&run("a", vec![0.3, 0.4])).unwrap_err();
        assert!(matches!(err, PredictionError::DuplicateModelName(_)));
        // receiver untouched
        assert_eq!(p.column("a").unwrap(), [0.1, 0.2]);
    }

    #[test]
    fn merge_realigns_by_row_id() {
        let mut p = run("a", vec![0.1, 0.2, 0.3]);
        let shuffled = Prediction::from_model(
            vec!["index2".into(), "index0".into(), "index1".into()],
            "b",
            vec![0.9, 0.7, 0.8],
        )
        .unwrap();
        p.merge(&shuffled).unwrap();
        assert_eq!(p.column("b").unwrap(), [0.7, 0.8, 0.9]);
    }

    #[test]
    fn merge_differing_universe_fails() {
        let mut p = run("a", vec![0.1, 0.2]);
        let other = Prediction::from_model(
            vec!["other0".into(), "other1".into()],
            "b",
            vec![0.3, 0.4],
        )
        .unwrap();
        let err = p.merge(&other).unwrap_err();
        assert!(matches!(err, PredictionError::ShapeMismatch(_)));
    }

    #[test]
    fn set_overwrites_without_error() {
        let mut p = run("a", vec![0.1, 0.2]);
        p.set("a", &run("whatever", vec![0.8, 0.9])).unwrap();
        assert_eq!(p.names(), ["a"]);
        assert_eq!(p.column("a").unwrap(), [0.8, 0.9]);
    }

    #[test]
    fn set_rejects_multi_model_rhs() {
        let mut multi = run("a", vec![0.1, 0.2]);
        multi.merge(&run("b", vec![0.3, 0.4])).unwrap();

        let mut p = Prediction::empty();
        let err = p.set("x", &multi).unwrap_err();
        assert!(matches!(err, PredictionError::SingleModelRequired(2)));
    }

    #[test]
    fn set_on_empty_adopts_and_rekeys() {
        let mut p = Prediction::empty();
        p.set("a", &run("model_a", vec![0.1, 0.2])).unwrap();
        assert_eq!(p.names(), ["a"]);
        assert_eq!(p.row_ids(), ids(2));
    }

    #[test]
    fn subset_orders_as_requested() {
        let mut p = run("a", vec![0.1, 0.2]);
        p.merge(&run("b", vec![0.3, 0.4])).unwrap();
        p.merge(&run("c", vec![0.5, 0.6])).unwrap();

        let s = p.subset(&["c", "a"]).unwrap();
        assert_eq!(s.names(), ["c", "a"]);

        let err = p.subset(&["nope"]).unwrap_err();
        assert!(matches!(err, PredictionError::UnknownModelName(_)));
    }

    #[test]
    fn membership_follows_names() {
        let mut p = run("a", vec![0.1]);
        p.merge(&run("b", vec![0.2])).unwrap();
        assert!(p.contains("a"));
        assert!(p.contains("b"));
        assert!(!p.contains("c"));
    }

    #[test]
    fn iter_yields_singles_in_order() {
        let mut p = run("a", vec![0.1, 0.2]);
        p.merge(&run("b", vec![0.3, 0.4])).unwrap();

        let names: Vec<String> = p
            .iter()
            .map(|single| {
                assert_eq!(single.shape().1, 1);
                single.names()[0].to_string()
            })
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn rename_and_drop() {
        let mut p = run("a", vec![0.1]);
        p.merge(&run("b", vec![0.2])).unwrap();
        p.rename("a", "z").unwrap();
        assert_eq!(p.names(), ["z", "b"]);

        p.drop_model("z").unwrap();
        assert_eq!(p.names(), ["b"]);
        assert!(matches!(
            p.drop_model("z").unwrap_err(),
            PredictionError::UnknownModelName(_)
        ));
    }

    #[test]
    fn scenario_build_merge_subset() {
        let mut p = Prediction::empty();
        p.set("a", &run("model_a", vec![0.1, 0.2, 0.3])).unwrap();
        assert_eq!(p.names(), ["a"]);

        p.merge(&run("b", vec![0.4, 0.5, 0.6])).unwrap();
        assert_eq!(p.names(), ["a", "b"]);

        assert_eq!(p.subset(&["b"]).unwrap().names(), ["b"]);
    }
}
